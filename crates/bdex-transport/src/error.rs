/// Errors a [`ByteSink`](crate::ByteSink) can report.
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    /// A fixed-capacity sink has no room for the requested write.
    #[error("sink full ({needed} bytes requested, {available} available)")]
    Full { needed: usize, available: usize },

    /// The underlying stream accepted zero bytes.
    #[error("sink closed")]
    Closed,

    /// An I/O error occurred on the underlying stream.
    #[error("sink I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, SinkError>;
