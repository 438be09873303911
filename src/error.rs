//! Error types for the pipeline stages.

use thiserror::Error;

/// Errors that can end a pipeline stage.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The request could not be sent or timed out.
    #[error("request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The server answered with a non-success status.
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    /// The payload was not valid JSON.
    #[error("malformed JSON: {0}")]
    Decode(#[from] serde_json::Error),

    /// The payload was valid JSON but not a list of records.
    #[error("expected a list of student records, got {0}")]
    NotAList(&'static str),

    /// An input file with an extension we cannot read.
    #[error("unsupported input file: {0}")]
    UnsupportedInput(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Chart rendering failed.
    #[error("chart error: {0}")]
    Chart(String),
}

/// Errors raised by field encryption and decryption.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CryptoError {
    /// The key is not 32 bytes of hex.
    #[error("invalid key: {0}")]
    InvalidKey(String),

    /// The stored value is not `hex(iv) + hex(ciphertext)`.
    #[error("malformed ciphertext: {0}")]
    MalformedCiphertext(String),

    /// Decryption produced bytes that are not UTF-8, usually a wrong key.
    #[error("decrypted value is not valid UTF-8 (wrong key?)")]
    InvalidUtf8,
}

pub type PipelineResult<T> = Result<T, PipelineError>;
