//! A client for the [Airtable](https://airtable.com) REST API.
//!
//! [AirtableClient] maps CRUD-style operations onto records in the tables of
//! one base: it builds authenticated requests, turns criteria into
//! `filterByFormula` expressions, follows pagination, and turns failed
//! responses into typed [Error]s. Calls are blocking and nothing is cached.
//!
//! # Example
//!
//! ```no_run
//! use airtable::{AirtableClient, Criteria, Profile};
//! use serde_json::json;
//!
//! # fn main() -> anyhow::Result<()> {
//! let profile = Profile::from_default_env()?;
//! let client = AirtableClient::from_profile(profile)?;
//!
//! let tasks = client.table("Tasks");
//! let mut criteria = Criteria::new();
//! criteria.insert("Status".to_string(), json!("Open"));
//!
//! for record in tasks.find_records(&criteria)? {
//!     println!("{}: {:?}", record.id(), record.get("Name"));
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # HTTP Requests and Responses
//!
//! The request types in [record] work with any HTTP client that uses the
//! [`http`] crate. Use [`ApiRequest::into_request`] to create a request, and
//! [`ApiResponse::from_response`] to parse the response, or implement
//! [Transport] and hand it to [AirtableClient::with_transport].

#![warn(
    anonymous_parameters,
    missing_copy_implementations,
    missing_debug_implementations,
    missing_docs,
    nonstandard_style,
    rust_2018_idioms,
    single_use_lifetimes,
    trivial_casts,
    trivial_numeric_casts,
    unreachable_pub,
    unused_extern_crates,
    unused_qualifications,
    variant_size_differences
)]

mod api;
mod client;
mod config;
mod table;

pub use api::*;
pub use client::{AirtableClient, Transport, UreqTransport};
pub use config::{Error as ConfigError, Profile};
pub use table::TableManipulator;
