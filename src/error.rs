use std::sync::Arc;

/// Boxed error a producer may fail with.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Error type for cache operations.
///
/// `Clone` so a single producer outcome can be handed to every caller joined to it.
#[derive(Debug, Clone, thiserror::Error)]
pub enum CacheError {
    /// A storage operation failed.
    #[error("[{tier}] cache error for key '{key}': {message}")]
    Operation {
        tier: String,
        key: String,
        message: String,
    },
    /// A storage backend failed. The transport's own error is kept as the source.
    #[error("[{tier}] cache error for key '{key}': {source}")]
    Backend {
        tier: String,
        key: String,
        #[source]
        source: Arc<dyn std::error::Error + Send + Sync>,
    },
    /// Serialization or deserialization failed.
    #[error("Serialization error: {0}")]
    Serialization(String),
    /// The producer failed. The original error is kept as the source.
    #[error("producer failed: {0}")]
    Producer(#[source] Arc<dyn std::error::Error + Send + Sync>),
    /// The producer task ended without settling (it panicked).
    #[error("producer for key '{key}' aborted before settling")]
    Aborted { key: String },
}

impl CacheError {
    /// Create a new operation error.
    pub fn operation(
        tier: impl Into<String>,
        key: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        CacheError::Operation {
            tier: tier.into(),
            key: key.into(),
            message: message.into(),
        }
    }

    /// Wrap a transport error raised by a storage backend.
    pub fn backend(
        tier: impl Into<String>,
        key: impl Into<String>,
        err: impl Into<BoxError>,
    ) -> Self {
        CacheError::Backend {
            tier: tier.into(),
            key: key.into(),
            source: Arc::from(err.into()),
        }
    }

    /// Borrow the backend's original error, if this is a backend failure.
    ///
    /// Unlike `source()`, the returned error can be downcast to the transport's type.
    pub fn backend_error(&self) -> Option<&(dyn std::error::Error + Send + Sync + 'static)> {
        match self {
            CacheError::Backend { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }

    /// Wrap a producer failure.
    pub fn producer(err: impl Into<BoxError>) -> Self {
        CacheError::Producer(Arc::from(err.into()))
    }

    /// Borrow the producer's original error, if this is a producer failure.
    pub fn producer_error(&self) -> Option<&(dyn std::error::Error + Send + Sync + 'static)> {
        match self {
            CacheError::Producer(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}
