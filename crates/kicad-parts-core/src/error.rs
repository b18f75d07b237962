use std::io;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0} environment variable is not set")]
    MissingEnvVar(&'static str),

    #[error("Invalid LCSC ID format: {0}. Expected format: C<number> (e.g., C2040)")]
    InvalidLcscId(String),

    #[error("Part not found: {0}")]
    PartNotFound(String),

    #[error("No staged parts found")]
    NoStagedParts,

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, Error>;
