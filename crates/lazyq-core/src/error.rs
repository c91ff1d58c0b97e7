use thiserror::Error;

/// Canonical result for lazyq.
pub type Result<T> = std::result::Result<T, Error>;

/// Broad families of failures. Callers can match on the kind to catch one
/// family (say, enumeration failures) and let everything else propagate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed configuration of an operator: bad lambda text, arity, bind target.
    Argument,
    /// Detected while draining a sequence: not found, multiple matches, length mismatch.
    Enumeration,
    /// Raised by dictionary/set builders for a rejected key or item.
    Validation,
    /// Operation the target cannot perform (reset of a single-pass sequence, ...).
    Unsupported,
    /// Encoding a value into an external representation failed.
    Serialization,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    #[error("invalid expression: {0}")]
    InvalidExpression(String),

    #[error("callable `{callable}` takes {declared} arguments, at most {supported} supported here")]
    Arity {
        callable: String,
        declared: usize,
        supported: usize,
    },

    #[error("invalid bind target: {0}")]
    InvalidBind(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("element not found: {0}")]
    NotFound(String),

    #[error("sequence contains more than one matching element")]
    MultipleMatches,

    #[error("sequence length mismatch: {0}")]
    LengthMismatch(String),

    #[error("enumerator has no current element")]
    NoCurrent,

    #[error("cannot convert {from} to {to}")]
    Conversion { from: String, to: String },

    #[error("evaluation error: {0}")]
    Evaluation(String),

    #[error("invalid key: {0}")]
    InvalidKey(String),

    #[error("invalid item: {0}")]
    InvalidItem(String),

    #[error("key already exists: {0}")]
    AlreadyExists(String),

    #[error("unsupported operation: {0}")]
    Unsupported(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidExpression(_)
            | Error::Arity { .. }
            | Error::InvalidBind(_)
            | Error::InvalidArgument(_) => ErrorKind::Argument,
            Error::NotFound(_)
            | Error::MultipleMatches
            | Error::LengthMismatch(_)
            | Error::NoCurrent
            | Error::Conversion { .. }
            | Error::Evaluation(_) => ErrorKind::Enumeration,
            Error::InvalidKey(_) | Error::InvalidItem(_) | Error::AlreadyExists(_) => {
                ErrorKind::Validation
            }
            Error::Unsupported(_) => ErrorKind::Unsupported,
            Error::Serialization(_) => ErrorKind::Serialization,
        }
    }

    pub fn conversion(from: &str, to: &str) -> Self {
        Error::Conversion {
            from: from.to_string(),
            to: to.to_string(),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}
