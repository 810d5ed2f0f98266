//! BDEX: a network-order binary codec for scalars, fixed-count arrays and
//! length-prefixed strings.
//!
//! An [`Encoder`] appends values to a [`ByteSink`]; a [`Decoder`] reads the
//! same sequence back from a [`ByteSource`]. The wire carries no type tags,
//! so both sides must agree on the order, kinds and widths of the values.
//!
//! Wire format:
//! ```text
//! ┌──────────────────┬──────────────────────────────────┬───────────┐
//! │ Kind             │ Bytes                            │ Decode    │
//! ├──────────────────┼──────────────────────────────────┼───────────┤
//! │ version          │ 1                                │ zero-ext  │
//! │ length <= 127    │ 1 (bit 7 clear)                  │ zero-ext  │
//! │ length > 127     │ 4 BE (bit 7 of byte 0 set)       │ 31 bits   │
//! │ iN / uN          │ N/8 BE, N in 8..=64 step 8       │ sign/zero │
//! │ f32 / f64        │ 4 / 8 BE IEEE-754                │ -         │
//! │ string           │ length + raw bytes               │ -         │
//! │ array of T       │ count x width(T), no count       │ per T     │
//! └──────────────────┴──────────────────────────────────┴───────────┘
//! ```
//!
//! Failure is sticky: a stream that cannot complete a request becomes
//! [`Validity::Invalid`] and ignores every later request. Check once at the
//! end of a sequence with [`Decoder::is_valid`] or [`Decoder::finish`].
//!
//! ```
//! use bdex_codec::{Decoder, Encoder};
//! use bdex_transport::SliceSource;
//!
//! let mut wire = Vec::new();
//! Encoder::new(&mut wire)
//!     .put_version(2)
//!     .put_i24(-70_000)
//!     .put_string("sensor-7");
//!
//! let (mut version, mut reading, mut name) = (0u8, 0i32, String::new());
//! let mut decoder = Decoder::new(SliceSource::new(&wire));
//! decoder
//!     .get_version(&mut version)
//!     .get_i24(&mut reading)
//!     .get_string(&mut name);
//!
//! assert!(decoder.is_valid());
//! assert_eq!((version, reading, name.as_str()), (2, -70_000, "sensor-7"));
//! ```

pub mod config;
pub mod decoder;
pub mod encoder;
pub mod error;
pub mod state;
pub mod wire;

pub use bdex_transport::{ByteSink, ByteSource};
pub use config::DecoderConfig;
pub use decoder::Decoder;
pub use encoder::Encoder;
pub use error::{CodecError, Result};
pub use state::Validity;
pub use wire::{MAX_LENGTH, MAX_SHORT_LENGTH};
