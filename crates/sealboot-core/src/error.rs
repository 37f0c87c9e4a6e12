use sealboot_store::StoreError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, SealbootError>;

#[derive(Debug, Error)]
pub enum SealbootError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("write to '{prefix}' aborted after {committed} committed chunk(s): {source}")]
    PartialWrite {
        prefix: String,
        committed: u32,
        #[source]
        source: StoreError,
    },

    #[error("failed to delete {} chunk(s) under '{prefix}': {}", .failures.len(), join_errors(.failures))]
    Cleanup {
        prefix: String,
        failures: Vec<StoreError>,
    },

    #[error("base64 decode error: {0}")]
    Encoding(String),

    #[error("decompression error: {0}")]
    Decompression(String),

    #[error("apply step failed: {0}")]
    Apply(String),

    #[error("bootstrap payload is empty")]
    EmptyPayload,

    #[error("invalid prefix '{0}'")]
    InvalidPrefix(String),

    #[error("secret prefix '{0}' is recorded but its chunk count is not set")]
    MissingSecretCount(String),

    #[error("bootstrap stub is {size} bytes, exceeding the {limit}-byte launch metadata limit")]
    StubTooLarge { size: usize, limit: usize },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SealbootError {
    /// Chunks known to be written when this error was raised. Lets callers
    /// record an exact range for later deletion.
    pub fn committed_chunks(&self) -> Option<u32> {
        match self {
            SealbootError::PartialWrite { committed, .. } => Some(*committed),
            _ => None,
        }
    }
}

fn join_errors(errors: &[StoreError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}
