use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{error, warn};

use crate::Profile;

mod endpoint;
mod error;
mod formula;
mod paginate;
pub mod record;

#[cfg(test)]
pub(crate) mod testutil;

pub use endpoint::*;
pub use error::*;
pub use formula::*;
pub use paginate::*;
pub use record::{Fields, Record, SearchSpec};

/// Implemented by types that can be sent as requests to the Airtable API.
pub trait ApiRequest: Sized {
    /// The corresponding response type.
    type Response: ApiResponse;

    /// The table the request concerns. Used to give errors context.
    fn table(&self) -> &str;

    /// The method to use.
    fn method(&self) -> http::Method {
        http::Method::GET
    }

    /// The full URL, including the query string.
    fn endpoint(&self, profile: &Profile) -> Endpoint;

    /// The serializable request body.
    fn body(&self) -> Option<impl Serialize> {
        None::<&()>
    }

    /// Consume the request and return an [http::Request] suitable for passing
    /// to your favorite HTTP client.
    ///
    /// The request carries no credentials; the transport is expected to add
    /// the `Authorization` header.
    fn into_request(self, profile: &Profile) -> Result<http::Request<String>, Error> {
        let req = http::Request::builder()
            .method(self.method())
            .uri(String::from(self.endpoint(profile)))
            .header(http::header::USER_AGENT, &profile.user_agent)
            .header(http::header::CONTENT_TYPE, "application/json");

        let req = if let Some(body) = self.body() {
            let body_str = serde_json::to_string(&body)?;
            req.header(http::header::CONTENT_LENGTH, body_str.len())
                .body(body_str)?
        } else {
            req.body(String::new())?
        };

        Ok(req)
    }

    /// Add an `offset` cursor to the request.
    fn paginate(self, offset: Option<&str>) -> PaginatedRequest<'_, Self> {
        PaginatedRequest { base: self, offset }
    }
}

/// Implemented by types that can be read as responses from the Airtable API.
pub trait ApiResponse: Sized {
    /// Read the response from an [http::Response] object. The status is
    /// checked with [guard_response] first.
    fn from_response(resp: http::Response<Vec<u8>>, target: Target<'_>) -> Result<Self, Error> {
        let (parts, body) = resp.into_parts();
        let value = guard_response(parts.status, &body, target)?;
        Self::from_json(value, target)
    }

    /// Read the response from an already-decoded, successful payload.
    fn from_json(value: Value, target: Target<'_>) -> Result<Self, Error>;
}

/// A private trait for types that deserialize directly from the payload.
pub(crate) trait DataResponse: for<'de> Deserialize<'de> {}

impl<T: DataResponse> ApiResponse for T {
    fn from_json(value: Value, target: Target<'_>) -> Result<Self, Error> {
        serde_json::from_value(value).map_err(|e| target.malformed(e))
    }
}

// For endpoints whose payload is passed through as-is.
impl ApiResponse for Value {
    fn from_json(value: Value, _target: Target<'_>) -> Result<Self, Error> {
        Ok(value)
    }
}

/// Check the status of a response and decode its body.
///
/// - 429 is [Error::RateLimited].
/// - Any other status but 200 is [Error::Api], with the message taken from
///   the body if there is one.
/// - An empty body decodes to an empty object.
pub fn guard_response(
    status: http::StatusCode,
    body: &[u8],
    target: Target<'_>,
) -> Result<Value, Error> {
    if status == http::StatusCode::TOO_MANY_REQUESTS {
        warn!(%target, "rate limited");
        return Err(target.rate_limited());
    }

    if status != http::StatusCode::OK {
        let raw = serde_json::from_slice::<RawErrorBody>(body)
            .ok()
            .map(|b| b.error);
        return Err(target.api_error(status, raw));
    }

    if body.trim_ascii().is_empty() {
        return Ok(Value::Object(Default::default()));
    }

    serde_json::from_slice(body).map_err(|e| {
        error!(%target, "Failed to parse API response: {e:#?}");
        target.malformed(e)
    })
}
