/// Errors from file storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The collection id or filename fails the path grammar, or the resolved
    /// path would leave the storage root.
    #[error("invalid path: {0}")]
    InvalidPath(String),

    /// The upload grew past the configured maximum object size.
    #[error("upload exceeds maximum size of {limit} bytes")]
    LimitExceeded { limit: u64 },

    /// The requested object does not exist.
    #[error("object not found")]
    NotFound,

    /// Reading the upload stream failed (client disconnect, malformed body).
    #[error("upload stream failed: {0}")]
    Source(#[source] std::io::Error),

    /// I/O error from the underlying filesystem.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    /// Returns `true` for errors caused by the client rather than the store.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, Self::Io(_))
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
