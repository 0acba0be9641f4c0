//! URL construction for the record and metadata endpoints.

use std::fmt;

use percent_encoding::{AsciiSet, CONTROLS, NON_ALPHANUMERIC, utf8_percent_encode};

/// The root of the public Airtable REST API.
pub const API_ROOT: &str = "https://api.airtable.com/v0";

/// Everything but RFC 3986 unreserved characters. Matches what PHP's
/// `rawurlencode` and JavaScript's `encodeURIComponent` produce.
pub(crate) const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Characters that can't appear literally in a query string. `%` is left
/// alone, so that formulas which are already partially escaped aren't
/// escaped twice.
const QUERY_UNSAFE: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'&')
    .add(b'+')
    .add(b'<')
    .add(b'>')
    .add(b'[')
    .add(b'\\')
    .add(b']')
    .add(b'^')
    .add(b'`')
    .add(b'{')
    .add(b'|')
    .add(b'}');

/// Returns the URL for a table, or for a single record if `id` is set:
/// `{api_root}/{base}/{table}[/{id}]`. The table name is percent-encoded; the
/// record ID is inserted as-is.
pub fn endpoint(api_root: &str, base: &str, table: &str, id: Option<&str>) -> String {
    let table = utf8_percent_encode(table, COMPONENT);
    match id {
        Some(id) => format!("{api_root}/{base}/{table}/{id}"),
        None => format!("{api_root}/{base}/{table}"),
    }
}

/// A URL under construction, with query parameters appended one at a time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    url: String,
}

impl Endpoint {
    /// The endpoint for listing or creating records in a table.
    pub fn table(api_root: &str, base: &str, table: &str) -> Self {
        Self {
            url: endpoint(api_root, base, table, None),
        }
    }

    /// The endpoint for a single record.
    pub fn record(api_root: &str, base: &str, table: &str, id: &str) -> Self {
        Self {
            url: endpoint(api_root, base, table, Some(id)),
        }
    }

    /// The metadata endpoint for a base, including collaborators and invite
    /// links.
    pub fn base_meta(api_root: &str, base: &str) -> Self {
        Self {
            url: format!("{api_root}/meta/bases/{base}"),
        }
        .param("include", "collaborators")
        .param("include", "inviteLinks")
    }

    /// Appends `key=value`, percent-encoding the value.
    pub fn param(self, key: &str, value: impl fmt::Display) -> Self {
        let value = value.to_string();
        let encoded = utf8_percent_encode(&value, COMPONENT).to_string();
        self.push(key, &encoded)
    }

    /// Appends `filterByFormula=<formula>`. The formula is expected to come
    /// from the [formula builders](crate::equality_formula), which escape the
    /// parts that need it; only characters that can't appear in a query at
    /// all are escaped here.
    pub fn formula(self, formula: &str) -> Self {
        let encoded = utf8_percent_encode(formula, QUERY_UNSAFE).to_string();
        self.push("filterByFormula", &encoded)
    }

    fn push(mut self, key: &str, encoded: &str) -> Self {
        let sep = if self.url.contains('?') { '&' } else { '?' };
        self.url.push(sep);
        self.url.push_str(key);
        self.url.push('=');
        self.url.push_str(encoded);
        self
    }

    /// The URL as a string.
    pub fn as_str(&self) -> &str {
        &self.url
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url)
    }
}

impl From<Endpoint> for String {
    fn from(value: Endpoint) -> Self {
        value.url
    }
}
