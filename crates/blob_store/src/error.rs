use std::fmt;

pub type BlobResult<T> = Result<T, BlobError>;

/// Failure of a blob store call.
#[derive(Debug)]
pub enum BlobError {
    /// No object exists at the requested path.
    NotFound { path: String },

    /// Invalid storage URL or object path.
    InvalidPath { path: String, reason: String },

    /// Backend failure (S3, local filesystem, ...).
    Backend { source: object_store::Error },

    /// Generic error.
    Other { source: anyhow::Error },
}

impl BlobError {
    /// Existence-check predicate. Callers use it to tell "object is absent"
    /// apart from every other failure.
    pub fn is_not_found(&self) -> bool {
        matches!(self, BlobError::NotFound { .. })
    }
}

impl fmt::Display for BlobError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlobError::NotFound { path } => write!(f, "object not found: {}", path),
            BlobError::InvalidPath { path, reason } => {
                write!(f, "invalid path '{}': {}", path, reason)
            }
            BlobError::Backend { source } => write!(f, "object store error: {}", source),
            BlobError::Other { source } => write!(f, "blob store error: {}", source),
        }
    }
}

impl std::error::Error for BlobError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BlobError::Backend { source } => Some(source),
            BlobError::Other { source } => Some(source.as_ref()),
            _ => None,
        }
    }
}

impl From<anyhow::Error> for BlobError {
    fn from(err: anyhow::Error) -> Self {
        BlobError::Other { source: err }
    }
}

impl From<object_store::Error> for BlobError {
    fn from(err: object_store::Error) -> Self {
        match err {
            object_store::Error::NotFound { path, .. } => BlobError::NotFound { path },
            _ => BlobError::Backend { source: err },
        }
    }
}

impl From<url::ParseError> for BlobError {
    fn from(err: url::ParseError) -> Self {
        BlobError::InvalidPath {
            path: String::new(),
            reason: err.to_string(),
        }
    }
}
