//! API operations concerning records.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    Endpoint, PaginatedResponse, Profile,
    api::{ApiRequest, ApiResponse, DataResponse, Error, Target},
};

/// The fields of a record, keyed by field name.
pub type Fields = serde_json::Map<String, Value>;

/// The maximum number of records the API accepts in a single create call.
pub const MAX_BATCH_SIZE: usize = 10;

/// A record (row) in a table, as last read from the API.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
    id: String,
    fields: Fields,
    #[serde(rename = "createdTime", skip_serializing_if = "Option::is_none")]
    created_time: Option<String>,
}

impl Record {
    /// The record ID, e.g. `recXXXXXXXXXXXXXX`.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The record's fields. Fields that are empty in Airtable are usually
    /// omitted by the API.
    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    /// A single field by name.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// When the record was created, as an ISO 8601 timestamp.
    pub fn created_time(&self) -> Option<&str> {
        self.created_time.as_deref()
    }

    /// Consumes the record, returning its fields.
    pub fn into_fields(self) -> Fields {
        self.fields
    }
}

#[derive(Deserialize)]
struct RawRecord {
    id: Option<String>,
    fields: Option<Fields>,
    #[serde(rename = "createdTime")]
    created_time: Option<String>,
}

impl ApiResponse for Record {
    fn from_json(value: Value, target: Target<'_>) -> Result<Self, Error> {
        let raw: RawRecord = serde_json::from_value(value).map_err(|e| target.malformed(e))?;

        let Some(id) = raw.id.filter(|id| !id.is_empty()) else {
            return Err(target.malformed("record not found: no id in response"));
        };

        let Some(fields) = raw.fields else {
            return Err(target.malformed(format!("record {id} not found: no fields in response")));
        };

        Ok(Record {
            id,
            fields,
            created_time: raw.created_time,
        })
    }
}

/// Several records, as returned by a batch create.
#[derive(Debug, Clone)]
pub struct RecordBatch(pub Vec<Record>);

impl ApiResponse for RecordBatch {
    fn from_json(value: Value, target: Target<'_>) -> Result<Self, Error> {
        let PaginatedResponse { page, .. } = PaginatedResponse::<Record>::from_json(value, target)?;
        Ok(RecordBatch(page))
    }
}

/// The response to a delete.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct DeletedRecord {
    /// The ID of the deleted record.
    pub id: String,
    /// Always true on success.
    pub deleted: bool,
}

impl DataResponse for DeletedRecord {}

/// List records in a table, optionally filtered by a formula.
#[derive(Debug, Clone, Default)]
pub struct ListRecords<'a> {
    /// The table name or ID.
    pub table: &'a str,
    /// A formula from [equality_formula](crate::equality_formula) or
    /// [search_formula](crate::search_formula).
    pub formula: Option<String>,
    /// Only return records visible in this view, in the view's order.
    pub view: Option<&'a str>,
    /// The maximum number of records to return, across all pages.
    pub max_records: Option<usize>,
    /// Request `cellFormat=json`.
    pub json_cell_format: bool,
}

impl ApiRequest for ListRecords<'_> {
    type Response = PaginatedResponse<Record>;

    fn table(&self) -> &str {
        self.table
    }

    fn endpoint(&self, profile: &Profile) -> Endpoint {
        let mut url = Endpoint::table(&profile.api_root, &profile.base, self.table);
        if self.json_cell_format {
            url = url.param("cellFormat", "json");
        }

        if let Some(max) = self.max_records {
            url = url.param("maxRecords", max);
        }

        if let Some(view) = self.view.filter(|v| !v.is_empty()) {
            url = url.param("view", view);
        }

        if let Some(formula) = &self.formula {
            url = url.formula(formula);
        }

        url
    }
}

/// Get a single record by ID.
#[derive(Debug, Clone)]
pub struct GetRecord<'a> {
    /// The table name or ID.
    pub table: &'a str,
    /// The record ID.
    pub id: &'a str,
}

impl ApiRequest for GetRecord<'_> {
    type Response = Record;

    fn table(&self) -> &str {
        self.table
    }

    fn endpoint(&self, profile: &Profile) -> Endpoint {
        Endpoint::record(&profile.api_root, &profile.base, self.table, self.id)
    }
}

#[derive(Debug, Clone, Serialize)]
struct FieldsBody<'a> {
    fields: &'a Fields,
}

#[derive(Debug, Clone, Serialize)]
struct BatchBody<'a> {
    records: Vec<FieldsBody<'a>>,
}

/// Create a record.
#[derive(Debug, Clone)]
pub struct CreateRecord<'a> {
    /// The table name or ID.
    pub table: &'a str,
    /// The fields of the new record.
    pub fields: &'a Fields,
}

impl ApiRequest for CreateRecord<'_> {
    type Response = Record;

    fn table(&self) -> &str {
        self.table
    }

    fn method(&self) -> http::Method {
        http::Method::POST
    }

    fn endpoint(&self, profile: &Profile) -> Endpoint {
        Endpoint::table(&profile.api_root, &profile.base, self.table)
    }

    fn body(&self) -> Option<impl Serialize> {
        Some(FieldsBody {
            fields: self.fields,
        })
    }
}

/// Create up to [MAX_BATCH_SIZE] records in one call.
#[derive(Debug, Clone)]
pub struct CreateRecords<'a> {
    /// The table name or ID.
    pub table: &'a str,
    /// The fields of each new record.
    pub records: &'a [Fields],
}

impl ApiRequest for CreateRecords<'_> {
    type Response = RecordBatch;

    fn table(&self) -> &str {
        self.table
    }

    fn method(&self) -> http::Method {
        http::Method::POST
    }

    fn endpoint(&self, profile: &Profile) -> Endpoint {
        Endpoint::table(&profile.api_root, &profile.base, self.table)
    }

    fn body(&self) -> Option<impl Serialize> {
        Some(BatchBody {
            records: self
                .records
                .iter()
                .map(|fields| FieldsBody { fields })
                .collect(),
        })
    }
}

/// Replace all fields of a record. Fields that aren't included are cleared.
#[derive(Debug, Clone)]
pub struct ReplaceRecord<'a> {
    /// The table name or ID.
    pub table: &'a str,
    /// The record ID.
    pub id: &'a str,
    /// The new fields.
    pub fields: &'a Fields,
}

impl ApiRequest for ReplaceRecord<'_> {
    type Response = Record;

    fn table(&self) -> &str {
        self.table
    }

    fn method(&self) -> http::Method {
        http::Method::PUT
    }

    fn endpoint(&self, profile: &Profile) -> Endpoint {
        Endpoint::record(&profile.api_root, &profile.base, self.table, self.id)
    }

    fn body(&self) -> Option<impl Serialize> {
        Some(FieldsBody {
            fields: self.fields,
        })
    }
}

/// Update some fields of a record. Fields that aren't included are left
/// untouched.
#[derive(Debug, Clone)]
pub struct UpdateRecord<'a> {
    /// The table name or ID.
    pub table: &'a str,
    /// The record ID.
    pub id: &'a str,
    /// The fields to change.
    pub fields: &'a Fields,
}

impl ApiRequest for UpdateRecord<'_> {
    type Response = Record;

    fn table(&self) -> &str {
        self.table
    }

    fn method(&self) -> http::Method {
        http::Method::PATCH
    }

    fn endpoint(&self, profile: &Profile) -> Endpoint {
        Endpoint::record(&profile.api_root, &profile.base, self.table, self.id)
    }

    fn body(&self) -> Option<impl Serialize> {
        Some(FieldsBody {
            fields: self.fields,
        })
    }
}

/// Delete a record.
#[derive(Debug, Clone)]
pub struct DeleteRecord<'a> {
    /// The table name or ID.
    pub table: &'a str,
    /// The record ID.
    pub id: &'a str,
}

impl ApiRequest for DeleteRecord<'_> {
    type Response = DeletedRecord;

    fn table(&self) -> &str {
        self.table
    }

    fn method(&self) -> http::Method {
        http::Method::DELETE
    }

    fn endpoint(&self, profile: &Profile) -> Endpoint {
        Endpoint::record(&profile.api_root, &profile.base, self.table, self.id)
    }
}

/// Fetch the metadata of the configured base, including collaborators and
/// invite links.
#[derive(Debug, Clone, Copy, Default)]
pub struct GetBase;

impl ApiRequest for GetBase {
    type Response = Value;

    fn table(&self) -> &str {
        "meta"
    }

    fn endpoint(&self, profile: &Profile) -> Endpoint {
        Endpoint::base_meta(&profile.api_root, &profile.base)
    }
}

/// A full-text search over some fields of a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchSpec {
    /// The fields to search in.
    pub fields: Vec<String>,
    /// The text to look for. Matching is case-sensitive, as with `FIND()`.
    pub search_term: String,
    /// An extra raw formula that records must also satisfy.
    pub extra_formula: Option<String>,
    /// Only search records visible in this view.
    pub view: Option<String>,
    /// The maximum number of records to return.
    pub max_rows: usize,
}

impl SearchSpec {
    /// The default for [SearchSpec::max_rows].
    pub const DEFAULT_MAX_ROWS: usize = 5;

    /// Search for `term` in the given fields.
    pub fn new<S: Into<String>>(fields: impl IntoIterator<Item = S>, term: &str) -> Self {
        Self {
            fields: fields.into_iter().map(Into::into).collect(),
            search_term: term.to_owned(),
            extra_formula: None,
            view: None,
            max_rows: Self::DEFAULT_MAX_ROWS,
        }
    }

    /// Only return records that also satisfy the given raw formula.
    pub fn with_formula(self, formula: &str) -> Self {
        Self {
            extra_formula: Some(formula.to_owned()),
            ..self
        }
    }

    /// Only search records visible in the given view.
    pub fn with_view(self, view: &str) -> Self {
        Self {
            view: Some(view.to_owned()),
            ..self
        }
    }

    /// Return at most `max_rows` records.
    pub fn with_max_rows(self, max_rows: usize) -> Self {
        Self { max_rows, ..self }
    }
}
