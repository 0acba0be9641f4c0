//! Builders for `filterByFormula` expressions.
//!
//! The formulas produced here are partially percent-encoded already, the
//! way the API has always been called: field names in equality criteria
//! have their spaces escaped, and search expressions are escaped as a whole.
//! Pass the result to [Endpoint::formula](crate::Endpoint::formula), which
//! won't escape them a second time.

use std::collections::BTreeMap;

use percent_encoding::utf8_percent_encode;
use serde_json::Value;

use super::endpoint::COMPONENT;

/// Equality constraints on record fields, combined with `AND`.
pub type Criteria = BTreeMap<String, Value>;

/// Builds `({field}='value' AND ...)` from the criteria, or `None` if there
/// are no criteria.
///
/// Spaces in field names are written as `%20`. Values are rendered with
/// [format_value], with `\` and `'` backslash-escaped. A literal `%` in a
/// name or value is written as `%25`, since the query string is decoded once
/// more by the server.
pub fn equality_formula(criteria: &Criteria) -> Option<String> {
    if criteria.is_empty() {
        return None;
    }

    let clauses = criteria
        .iter()
        .map(|(field, value)| {
            let value = quote_literal(&format_value(value), '\'').replace('%', "%25");
            format!("{{{}}}='{}'", encode_field_name(field), value)
        })
        .collect::<Vec<_>>();

    Some(format!("({})", clauses.join(" AND ")))
}

/// Builds `OR(FIND("term",{field})>0,...)` over the given fields, with the
/// inner list percent-encoded once. `\` and `"` in the term are
/// backslash-escaped. If `criteria` is set, the result is
/// `AND(<criteria>,<search>)`, with the criteria fragment percent-encoded
/// too.
///
/// Returns `None` if there are neither fields nor criteria.
pub fn search_formula<S: AsRef<str>>(
    fields: &[S],
    term: &str,
    criteria: Option<&str>,
) -> Option<String> {
    let search = if fields.is_empty() {
        None
    } else {
        let term = quote_literal(term, '"');
        let finds = fields
            .iter()
            .map(|field| format!("FIND(\"{term}\",{{{}}})>0", field.as_ref()))
            .collect::<Vec<_>>()
            .join(",");

        Some(format!("OR({})", encode_fragment(&finds)))
    };

    match (criteria.filter(|c| !c.is_empty()), search) {
        (Some(criteria), Some(search)) => {
            Some(format!("AND({},{search})", encode_fragment(criteria)))
        }
        (Some(criteria), None) => Some(encode_fragment(criteria)),
        (None, search) => search,
    }
}

/// Percent-encodes a raw formula fragment, so that it can be embedded in a
/// formula from this module.
pub fn encode_fragment(raw: &str) -> String {
    utf8_percent_encode(raw, COMPONENT).to_string()
}

/// Escapes `%` and spaces in a field name.
pub fn encode_field_name(name: &str) -> String {
    name.replace('%', "%25").replace(' ', "%20")
}

/// Backslash-escapes `quote` and backslashes, so that `raw` can sit between
/// a pair of `quote`s in a formula string literal.
fn quote_literal(raw: &str, quote: char) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        if c == '\\' || c == quote {
            out.push('\\');
        }
        out.push(c);
    }

    out
}

/// Renders a criteria value as it should appear between quotes in a formula.
///
/// Strings are used verbatim, numbers and booleans are written out, `null`
/// is empty, arrays are comma-joined element by element, and objects are
/// written as compact JSON.
pub fn format_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        Value::Array(values) => values.iter().map(format_value).collect::<Vec<_>>().join(","),
        Value::Object(_) => value.to_string(),
    }
}
