use std::path::PathBuf;

use thiserror::Error;

use crate::dates::{DateInputError, DateToken};

/// Failures that end a run.
#[derive(Debug, Error)]
pub enum Error {
    #[error("request for {date} failed: {source}")]
    Http {
        date: DateToken,
        #[source]
        source: ureq::Error,
    },

    #[error("exchange rate service answered {status} for {date}")]
    Status { date: DateToken, status: u16 },

    #[error("failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed exchange document {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("console: {0}")]
    Console(#[from] std::io::Error),

    #[error(transparent)]
    DateInput(#[from] DateInputError),
}
