use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum FetchError {
    #[error("invalid product type: {0}")]
    InvalidProductType(String),

    #[error("missing config file s2-archiver.json in current directory")]
    MissingConfig,

    #[error("failed to read config file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("invalid area of interest: {0}")]
    InvalidAoi(String),

    #[error("catalog request failed: {0}")]
    CatalogHttp(String),

    #[error("remote product not found at {0}")]
    ProductNotFound(String),

    #[error("transfer timed out for {0}")]
    Timeout(String),

    #[error("transfer failed: {0}")]
    TransferHttp(String),

    #[error("remote returned status {status}: {message}")]
    TransferStatus { status: u16, message: String },

    #[error("filesystem error: {0}")]
    Filesystem(String),
}
