use std::fmt;

use serde::Deserialize;

/// An error encountered while talking to the Airtable API.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A lookup by criteria matched no record where exactly one was required.
    #[error("No record found in \"{base}:{table}\"")]
    NotFound {
        /// The base that was queried.
        base: String,
        /// The table that was queried.
        table: String,
    },
    /// A lookup by criteria matched several records where exactly one was
    /// required.
    #[error("{count} records found in \"{base}:{table}\" where one was expected")]
    AmbiguousResult {
        /// The base that was queried.
        base: String,
        /// The table that was queried.
        table: String,
        /// The number of matching records.
        count: usize,
    },
    /// The API responded with 429.
    #[error("Rate limit reached on \"{base}:{table}\"")]
    RateLimited {
        /// The base that was queried.
        base: String,
        /// The table that was queried.
        table: String,
    },
    /// The API responded with a status other than 200 or 429.
    #[error("A \"{status}\" error occurred on \"{base}:{table}\": {message}")]
    Api {
        /// The HTTP status on the response.
        status: http::StatusCode,
        /// The base that was queried.
        base: String,
        /// The table that was queried.
        table: String,
        /// The error type reported by the API, e.g. `NOT_FOUND`.
        kind: Option<String>,
        /// The message reported by the API, or "No details". A bare error
        /// code doubles as the message.
        message: String,
    },
    /// The API responded with 200, but the payload wasn't what we expected.
    #[error("Malformed response from \"{base}:{table}\": {reason}")]
    MalformedResponse {
        /// The base that was queried.
        base: String,
        /// The table that was queried.
        table: String,
        /// What was wrong with the payload.
        reason: String,
    },
    /// The request could not be sent, or the response could not be read.
    /// Timeouts end up here.
    #[error("Transport error")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),
    /// The request could not be built.
    #[error("Invalid request")]
    InvalidRequest(#[from] http::Error),
    /// The request body could not be serialized.
    #[error("Failed to encode request body")]
    Json(#[from] serde_json::Error),
}

impl From<ureq::Error> for Error {
    fn from(err: ureq::Error) -> Self {
        Error::Transport(Box::new(err))
    }
}

impl Error {
    /// True if the record (or the table) doesn't exist, either because a
    /// lookup by criteria came up empty or because the API returned 404.
    pub fn is_not_found(&self) -> bool {
        match self {
            Error::NotFound { .. } => true,
            Error::Api { status, .. } => *status == http::StatusCode::NOT_FOUND,
            _ => false,
        }
    }

    /// The HTTP status of the response, if the error came from one.
    pub fn status(&self) -> Option<http::StatusCode> {
        match self {
            Error::RateLimited { .. } => Some(http::StatusCode::TOO_MANY_REQUESTS),
            Error::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// The base and table a request was made against. Used to give errors
/// context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Target<'a> {
    /// The base ID.
    pub base: &'a str,
    /// The table name or ID.
    pub table: &'a str,
}

impl fmt::Display for Target<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.base, self.table)
    }
}

impl Target<'_> {
    pub(crate) fn not_found(&self) -> Error {
        Error::NotFound {
            base: self.base.to_owned(),
            table: self.table.to_owned(),
        }
    }

    pub(crate) fn ambiguous(&self, count: usize) -> Error {
        Error::AmbiguousResult {
            base: self.base.to_owned(),
            table: self.table.to_owned(),
            count,
        }
    }

    pub(crate) fn rate_limited(&self) -> Error {
        Error::RateLimited {
            base: self.base.to_owned(),
            table: self.table.to_owned(),
        }
    }

    pub(crate) fn malformed(&self, reason: impl fmt::Display) -> Error {
        Error::MalformedResponse {
            base: self.base.to_owned(),
            table: self.table.to_owned(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn api_error(&self, status: http::StatusCode, raw: Option<RawApiError>) -> Error {
        let (kind, message) = match raw {
            Some(RawApiError::Detailed { r#type, message }) => (r#type, message),
            Some(RawApiError::Code(code)) => (Some(code.clone()), Some(code)),
            None => (None, None),
        };

        Error::Api {
            status,
            base: self.base.to_owned(),
            table: self.table.to_owned(),
            kind,
            message: message.unwrap_or_else(|| "No details".to_owned()),
        }
    }
}

/// The body of an error response. The API uses either
/// `{"error": {"type": ..., "message": ...}}` or `{"error": "CODE"}`.
#[derive(Debug, Deserialize)]
pub(crate) struct RawErrorBody {
    pub(crate) error: RawApiError,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum RawApiError {
    Detailed {
        r#type: Option<String>,
        message: Option<String>,
    },
    Code(String),
}
