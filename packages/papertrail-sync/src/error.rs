//! Typed errors for reconciliation and event retrieval.

use papertrail_client::ClientError;
use thiserror::Error;

/// Invalid option combinations. Raised before any remote call is made.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error(
        "invalid action '{0}', the only valid values are 'c'/'create', 'o'/'obtain' and 'd'/'delete'"
    )]
    InvalidAction(String),

    #[error("invalid system type '{0}', the only valid values are 'h'/'hostname' and 'i'/'ip-address'")]
    InvalidSystemType(String),

    #[error("a hostname system takes either a destination id or a destination port, not both")]
    AmbiguousDestination,

    #[error("a hostname system needs a destination id or a destination port distinct from 0")]
    MissingDestination,

    #[error("the IP address provided, '{0}', is not a valid IPv4 address")]
    InvalidIpAddress(String),

    #[error("cannot parse {field} '{value}', expected MM/DD/YYYY hh:mm:ss")]
    InvalidDate { field: &'static str, value: String },

    #[error("startdate > enddate - please set proper date boundaries")]
    InvalidDateBoundaries,
}

/// Errors that abort a reconciliation run.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Config, transport, parse and non-200 responses from the remote service
    #[error(transparent)]
    Client(#[from] ClientError),

    #[error("group '{name}' not found")]
    GroupNotFound { name: String },

    #[error("search '{name}' not found in group {group_id}")]
    SearchNotFound { name: String, group_id: i64 },

    #[error("destination {id} not found")]
    DestinationNotFound { id: i64 },

    #[error("cannot write events to {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, SyncError>;
