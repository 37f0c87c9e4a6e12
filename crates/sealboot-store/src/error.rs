use thiserror::Error;

pub type Result<T> = std::result::Result<T, StoreError>;

/// Error codes that signal store-side throttling. Worth retrying with backoff.
const RETRYABLE_CODES: &[&str] = &[
    "ThrottlingException",
    "TooManyUpdates",
    "ParameterLimitExceeded",
    "RequestLimitExceeded",
];

/// Error codes meaning the named entry does not exist.
const NOT_FOUND_CODES: &[&str] = &["ParameterNotFound", "ParameterVersionNotFound"];

/// Coarse classification of a store failure, derived once at the client boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Retryable,
    NotFound,
    Terminal,
}

impl ErrorKind {
    /// Map a store error code onto its kind. Unknown codes are terminal.
    pub fn from_code(code: &str) -> Self {
        if RETRYABLE_CODES.contains(&code) {
            ErrorKind::Retryable
        } else if NOT_FOUND_CODES.contains(&code) {
            ErrorKind::NotFound
        } else {
            ErrorKind::Terminal
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store throttled {op} '{name}' ({code}): {message}")]
    Retryable {
        op: &'static str,
        name: String,
        code: String,
        message: String,
    },

    #[error("secret entry not found: '{0}'")]
    NotFound(String),

    #[error("store {op} '{name}' failed ({code}): {message}")]
    Terminal {
        op: &'static str,
        name: String,
        code: String,
        message: String,
    },

    #[error("invalid secret name '{name}': {reason}")]
    InvalidName { name: String, reason: String },

    #[error("store configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    /// Build an error from a store error code, routing it through the closed
    /// code table. `code` is `None` for transport failures that never reached
    /// the service; those are terminal.
    pub fn from_code(
        op: &'static str,
        name: &str,
        code: Option<&str>,
        message: impl Into<String>,
    ) -> Self {
        let message = message.into();
        let Some(code) = code else {
            return StoreError::Terminal {
                op,
                name: name.to_string(),
                code: "Unknown".into(),
                message,
            };
        };
        match ErrorKind::from_code(code) {
            ErrorKind::Retryable => StoreError::Retryable {
                op,
                name: name.to_string(),
                code: code.to_string(),
                message,
            },
            ErrorKind::NotFound => StoreError::NotFound(name.to_string()),
            ErrorKind::Terminal => StoreError::Terminal {
                op,
                name: name.to_string(),
                code: code.to_string(),
                message,
            },
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            StoreError::Retryable { .. } => ErrorKind::Retryable,
            StoreError::NotFound(_) => ErrorKind::NotFound,
            _ => ErrorKind::Terminal,
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::Retryable
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }
}
