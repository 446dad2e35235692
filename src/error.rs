use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum FetchError {
    #[error("unknown dataset: {0}")]
    #[diagnostic(help(
        "expected one of: train-claims, dev-claims, test-claims, dev-baseline, evidence"
    ))]
    UnknownDataset(String),

    #[error("failed to read config file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("GET {url} returned status {status}")]
    HttpStatus { url: String, status: u16 },

    #[error("Google Drive request failed: {0}")]
    DriveHttp(String),

    #[error("Google Drive returned status {status}: {message}")]
    DriveStatus { status: u16, message: String },

    #[error("Google Drive did not provide a download link for {file_id}: {reason}")]
    #[diagnostic(help(
        "the file may be private, or its download quota may be exceeded; try again later"
    ))]
    DriveConfirm { file_id: String, reason: String },

    #[error("filesystem error: {0}")]
    Filesystem(String),
}
