use bdex_transport::SinkError;

/// Why a stream became invalid.
///
/// The stream itself only exposes [`Validity`](crate::Validity); this is the
/// first recorded cause, available through `failure()` and `finish()`.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// The source ran dry before a value was complete.
    #[error("truncated input ({needed} bytes needed, {available} available)")]
    Truncated { needed: usize, available: usize },

    /// The sink rejected a write.
    #[error("sink write failed: {0}")]
    Sink(#[from] SinkError),

    /// A decoded string length exceeds the configured limit.
    #[error("string length {len} exceeds limit {max}")]
    LengthLimit { len: usize, max: usize },

    /// A decoded string is not valid UTF-8.
    #[error("string is not valid UTF-8: {0}")]
    InvalidUtf8(#[source] std::str::Utf8Error),

    /// The caller invalidated the stream explicitly.
    #[error("stream invalidated by caller")]
    Invalidated,
}

pub type Result<T> = std::result::Result<T, CodecError>;
