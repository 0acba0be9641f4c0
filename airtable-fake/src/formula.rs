//! Evaluation of the small subset of `filterByFormula` that the client
//! produces: quoted equality clauses joined with `AND`, `FIND(...)>0`
//! clauses joined with `OR`, and an `AND(<equality>,<search>)` wrapper.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};

static EQUALS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{([^}]*)\}\s*=\s*(?:'((?:[^'\\]|\\.)*)'|(-?\d+(?:\.\d+)?))")
        .expect("valid regex")
});

static FIND: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"FIND\("((?:[^"\\]|\\.)*)",\s*\{([^}]*)\}\)\s*>\s*0"#).expect("valid regex")
});

/// A parsed formula. Every equality must hold, and if there are any
/// searches, at least one of them must match.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Filter {
    equals: Vec<(String, String)>,
    finds: Vec<(String, String)>,
}

impl Filter {
    /// Returns `None` if nothing in the formula is understood.
    pub(crate) fn parse(formula: &str) -> Option<Self> {
        let equals = EQUALS
            .captures_iter(formula)
            .map(|c| {
                let value = c
                    .get(2)
                    .or_else(|| c.get(3))
                    .map_or("", |m| m.as_str());
                (c[1].to_owned(), unescape(value))
            })
            .collect::<Vec<_>>();

        let finds = FIND
            .captures_iter(formula)
            .map(|c| (c[2].to_owned(), unescape(&c[1])))
            .collect::<Vec<_>>();

        if equals.is_empty() && finds.is_empty() {
            return None;
        }

        Some(Self { equals, finds })
    }

    pub(crate) fn matches(&self, fields: &Map<String, Value>) -> bool {
        let text = |name: &str| fields.get(name).map(cell_text).unwrap_or_default();

        let equal = self.equals.iter().all(|(name, value)| text(name) == *value);
        let found = self.finds.is_empty()
            || self
                .finds
                .iter()
                .any(|(name, term)| text(name).contains(term.as_str()));

        equal && found
    }
}

/// Resolves backslash escapes in a string literal.
fn unescape(literal: &str) -> String {
    let mut out = String::with_capacity(literal.len());
    let mut chars = literal.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => out.extend(chars.next()),
            c => out.push(c),
        }
    }

    out
}

/// How a cell reads when compared in a formula.
fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Array(values) => values.iter().map(cell_text).collect::<Vec<_>>().join(","),
        other => other.to_string(),
    }
}
