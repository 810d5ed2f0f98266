//! Platform-neutral binary value codec.
//!
//! bdex externalizes scalars, fixed-count arrays and length-prefixed strings
//! into a compact network-order wire format and reads them back on any host.
//!
//! # Crate Structure
//!
//! - [`transport`] — Byte sink/source capabilities and their implementations
//! - [`codec`] — The encoder, the decoder and the wire-format rules

/// Re-export transport types.
pub mod transport {
    pub use bdex_transport::*;
}

/// Re-export codec types.
pub mod codec {
    pub use bdex_codec::*;
}
