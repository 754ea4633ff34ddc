//! Failures of the CouchDB state backend, keyed by the state document involved.

use std::fmt;

use reqwest::StatusCode;
use thiserror::Error;

/// Convenient result alias returning [`CouchDaoError`] failures.
pub type CouchResult<T> = Result<T, CouchDaoError>;

/// What the backend was doing with a state document when it failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentAction {
    /// Fetching the stored value or its revision.
    Read,
    /// Overwriting the stored value.
    Write,
}

impl fmt::Display for DocumentAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DocumentAction::Read => "read",
            DocumentAction::Write => "write",
        })
    }
}

/// Failures that can occur while reading or writing state in CouchDB.
#[derive(Debug, Error)]
pub enum CouchDaoError {
    #[error("failed to build CouchDB HTTP client")]
    Client {
        #[source]
        source: reqwest::Error,
    },
    /// The database endpoint could not be reached at all.
    #[error("CouchDB database `{database}` is unreachable")]
    Unreachable {
        database: String,
        #[source]
        source: reqwest::Error,
    },
    /// The database exists (or should) but answered with an error status.
    #[error("CouchDB database `{database}` answered {status}")]
    DatabaseStatus { database: String, status: StatusCode },
    #[error("could not {action} the `{document}` state document")]
    Document {
        document: &'static str,
        action: DocumentAction,
        #[source]
        source: reqwest::Error,
    },
    /// CouchDB refused a document request, e.g. a 409 on a stale revision.
    #[error("CouchDB answered {status} to a {action} of the `{document}` state document")]
    Rejected {
        document: &'static str,
        action: DocumentAction,
        status: StatusCode,
    },
    #[error("the stored `{document}` state document has an unexpected shape")]
    Decode {
        document: &'static str,
        #[source]
        source: reqwest::Error,
    },
}
