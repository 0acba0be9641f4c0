//! The blocking client and its HTTP transport.

use tracing::{debug, info};
use ureq::{
    Body, SendBody,
    middleware::{Middleware, MiddlewareNext},
};

use crate::{
    ApiRequest, ApiResponse, Criteria, Error, Fields, Profile, Record, SearchSpec, Target,
    TableManipulator, endpoint, equality_formula, paginate,
    record::{
        CreateRecord, CreateRecords, DeleteRecord, DeletedRecord, GetBase, GetRecord,
        ListRecords, MAX_BATCH_SIZE, ReplaceRecord, UpdateRecord,
    },
    search_formula,
};

/// Sends a fully-built request and returns the raw response.
///
/// Implementations must return non-2xx responses as `Ok`; status handling
/// happens in the client. They are also responsible for authentication and
/// timeouts.
pub trait Transport {
    /// Execute a single request.
    fn send(&self, req: http::Request<String>) -> Result<http::Response<Vec<u8>>, Error>;
}

/// The default transport, built on a [ureq::Agent].
///
/// The bearer token is attached to every request by a middleware installed
/// when the transport is built. The agent keeps a connection pool and is
/// `Send + Sync`, so the transport (and a client using it) can be shared
/// between threads.
#[derive(Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl std::fmt::Debug for UreqTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UreqTransport").finish_non_exhaustive()
    }
}

struct BearerAuth(http::HeaderValue);

impl Middleware for BearerAuth {
    fn handle(
        &self,
        mut request: http::Request<SendBody>,
        next: MiddlewareNext,
    ) -> Result<http::Response<Body>, ureq::Error> {
        request
            .headers_mut()
            .insert(http::header::AUTHORIZATION, self.0.clone());
        next.handle(request)
    }
}

impl UreqTransport {
    /// Build a transport that authenticates with the profile's access token
    /// and applies its timeout to every request.
    pub fn new(profile: &Profile) -> Result<Self, Error> {
        let mut auth = http::HeaderValue::try_from(format!("Bearer {}", profile.access_token))
            .map_err(http::Error::from)?;
        auth.set_sensitive(true);

        // Allows error responses to be parsed.
        let cfg = ureq::config::Config::builder()
            .http_status_as_error(false)
            .timeout_global(profile.timeout)
            .middleware(BearerAuth(auth))
            .build();

        Ok(Self {
            agent: ureq::Agent::new_with_config(cfg),
        })
    }
}

impl Transport for UreqTransport {
    fn send(&self, req: http::Request<String>) -> Result<http::Response<Vec<u8>>, Error> {
        let resp = self.agent.run(req)?;
        let (parts, mut body) = resp.into_parts();
        let body = body.read_to_vec()?;
        Ok(http::Response::from_parts(parts, body))
    }
}

/// A blocking client for one Airtable base.
///
/// Every operation makes one or more HTTP requests, strictly one after the
/// other, and nothing is cached between operations. Errors are never
/// retried.
#[derive(Debug, Clone)]
pub struct AirtableClient<T = UreqTransport> {
    profile: Profile,
    transport: T,
}

impl AirtableClient<UreqTransport> {
    /// A client for `base`, with the default 10 second timeout.
    pub fn new(access_token: &str, base: &str) -> Result<Self, Error> {
        Self::from_profile(Profile::new(access_token, base))
    }

    /// A client for `base` with the given timeout. `None` disables it.
    pub fn with_timeout(
        access_token: &str,
        base: &str,
        timeout: Option<std::time::Duration>,
    ) -> Result<Self, Error> {
        Self::from_profile(Profile::new(access_token, base).with_timeout(timeout))
    }

    /// A client configured from a loaded profile.
    pub fn from_profile(profile: Profile) -> Result<Self, Error> {
        let transport = UreqTransport::new(&profile)?;
        Ok(Self::with_transport(profile, transport))
    }
}

impl<T: Transport> AirtableClient<T> {
    /// A client using a custom transport. The transport is responsible for
    /// adding the `Authorization` header.
    pub fn with_transport(profile: Profile, transport: T) -> Self {
        Self { profile, transport }
    }

    /// The profile this client was built from.
    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    /// The base this client talks to.
    pub fn base(&self) -> &str {
        &self.profile.base
    }

    /// The underlying transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// The URL of a table, or of a record within it.
    pub fn endpoint(&self, table: &str, id: Option<&str>) -> String {
        endpoint(&self.profile.api_root, &self.profile.base, table, id)
    }

    /// A view of this client bound to a single table.
    pub fn table<'a>(&'a self, table: &'a str) -> TableManipulator<'a, T> {
        TableManipulator::new(self, table)
    }

    /// Execute a request and parse the response.
    pub fn roundtrip<R: ApiRequest>(&self, req: R) -> Result<R::Response, Error> {
        let table = req.table().to_owned();
        let req = req.into_request(&self.profile)?;
        debug!(method = %req.method(), uri = %req.uri(), "sending request");

        let resp = self.transport.send(req)?;
        R::Response::from_response(resp, self.target(&table))
    }

    fn target<'a>(&'a self, table: &'a str) -> Target<'a> {
        Target {
            base: &self.profile.base,
            table,
        }
    }

    fn list(&self, req: ListRecords<'_>) -> Result<Vec<Record>, Error> {
        paginate(req, |r| self.roundtrip(r))?.collect()
    }

    /// Create a record with the given fields.
    pub fn create_record(&self, table: &str, fields: &Fields) -> Result<Record, Error> {
        self.roundtrip(CreateRecord { table, fields })
    }

    /// Create several records. The API takes at most ten at a time, so
    /// larger inputs are sent in consecutive batches; the created records
    /// are returned in input order. A failed batch aborts the remaining
    /// ones.
    pub fn create_records(&self, table: &str, records: &[Fields]) -> Result<Vec<Record>, Error> {
        let mut created = Vec::with_capacity(records.len());
        for chunk in records.chunks(MAX_BATCH_SIZE) {
            let batch = self.roundtrip(CreateRecords {
                table,
                records: chunk,
            })?;
            created.extend(batch.0);
        }

        Ok(created)
    }

    /// Fetch a record by ID.
    pub fn get_record(&self, table: &str, id: &str) -> Result<Record, Error> {
        self.roundtrip(GetRecord { table, id })
    }

    /// Fetch every record matching all the criteria, following pagination.
    /// Empty criteria match every record.
    pub fn find_records(&self, table: &str, criteria: &Criteria) -> Result<Vec<Record>, Error> {
        self.list(ListRecords {
            table,
            formula: equality_formula(criteria),
            ..Default::default()
        })
    }

    /// Fetch every record matching a raw formula, optionally restricted to
    /// a view, following pagination.
    pub fn find_records_by_formula(
        &self,
        table: &str,
        formula: &str,
        view: Option<&str>,
    ) -> Result<Vec<Record>, Error> {
        self.list(ListRecords {
            table,
            formula: Some(crate::encode_fragment(formula)).filter(|f| !f.is_empty()),
            view,
            ..Default::default()
        })
    }

    /// Fetch the single record matching the criteria, if there is one. More
    /// than one match is an [Error::AmbiguousResult].
    pub fn find_record(&self, table: &str, criteria: &Criteria) -> Result<Option<Record>, Error> {
        let mut records = self.find_records(table, criteria)?;
        match records.len() {
            0 => Ok(None),
            1 => Ok(records.pop()),
            n => Err(self.target(table).ambiguous(n)),
        }
    }

    /// True if exactly one record matches the criteria.
    pub fn contains_record(&self, table: &str, criteria: &Criteria) -> Result<bool, Error> {
        Ok(self.find_record(table, criteria)?.is_some())
    }

    fn resolve(&self, table: &str, criteria: &Criteria) -> Result<Record, Error> {
        self.find_record(table, criteria)?
            .ok_or_else(|| self.target(table).not_found())
    }

    /// Replace all fields of the record matching the criteria. Fields that
    /// aren't included are cleared.
    pub fn set_record(
        &self,
        table: &str,
        criteria: &Criteria,
        fields: &Fields,
    ) -> Result<Record, Error> {
        let record = self.resolve(table, criteria)?;
        self.roundtrip(ReplaceRecord {
            table,
            id: record.id(),
            fields,
        })
    }

    /// Update some fields of the record matching the criteria. Fields that
    /// aren't included are left untouched.
    pub fn update_record(
        &self,
        table: &str,
        criteria: &Criteria,
        fields: &Fields,
    ) -> Result<Record, Error> {
        let record = self.resolve(table, criteria)?;
        self.update_record_by_id(table, record.id(), fields)
    }

    /// Update some fields of a record by ID.
    pub fn update_record_by_id(
        &self,
        table: &str,
        id: &str,
        fields: &Fields,
    ) -> Result<Record, Error> {
        self.roundtrip(UpdateRecord { table, id, fields })
    }

    /// Delete the record matching the criteria.
    pub fn delete_record(&self, table: &str, criteria: &Criteria) -> Result<DeletedRecord, Error> {
        let record = self.resolve(table, criteria)?;
        self.roundtrip(DeleteRecord {
            table,
            id: record.id(),
        })
    }

    /// Delete every record matching the criteria, one request per record.
    ///
    /// The first failure aborts the loop. There is no rollback: records
    /// deleted before the failure stay deleted. A record that disappeared
    /// between the lookup and its deletion is reported as
    /// [Error::NotFound].
    pub fn delete_records(&self, table: &str, criteria: &Criteria) -> Result<(), Error> {
        let records = self.find_records(table, criteria)?;
        self.delete_each(table, &records)
    }

    /// Delete every record in the table. Same caveats as
    /// [delete_records](Self::delete_records).
    pub fn flush_records(&self, table: &str) -> Result<(), Error> {
        let records = self.find_records(table, &Criteria::new())?;
        self.delete_each(table, &records)
    }

    fn delete_each(&self, table: &str, records: &[Record]) -> Result<(), Error> {
        info!(table, count = records.len(), "deleting records");
        for record in records {
            match self.roundtrip(DeleteRecord {
                table,
                id: record.id(),
            }) {
                Ok(_) => (),
                Err(e) if e.is_not_found() => return Err(self.target(table).not_found()),
                Err(e) => return Err(e),
            }
        }

        Ok(())
    }

    /// Search for records containing a term in any of the given fields.
    pub fn search_records(&self, table: &str, spec: &SearchSpec) -> Result<Vec<Record>, Error> {
        let formula = search_formula(
            &spec.fields,
            &spec.search_term,
            spec.extra_formula.as_deref(),
        );

        self.list(ListRecords {
            table,
            formula,
            view: spec.view.as_deref(),
            max_records: Some(spec.max_rows),
            json_cell_format: true,
        })
    }

    /// Fetch the metadata of the base, including collaborators and invite
    /// links, as raw JSON.
    pub fn get_base(&self) -> Result<serde_json::Value, Error> {
        self.roundtrip(GetBase)
    }
}
