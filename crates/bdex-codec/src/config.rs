use crate::wire::MAX_LENGTH;

/// Configuration for the decoder.
#[derive(Debug, Clone)]
pub struct DecoderConfig {
    /// Largest string the decoder will materialize, in bytes.
    ///
    /// A decoded length above this invalidates the stream before anything is
    /// allocated. Default: the largest length the wire can express.
    pub max_string_len: usize,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            max_string_len: MAX_LENGTH,
        }
    }
}
