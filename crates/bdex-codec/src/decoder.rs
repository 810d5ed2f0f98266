use bdex_transport::ByteSource;

use crate::config::DecoderConfig;
use crate::error::{CodecError, Result};
use crate::state::{StreamState, Validity};
use crate::wire;

const READ_CHUNK_SIZE: usize = 8 * 1024;

macro_rules! get_integers {
    ($($(#[$meta:meta])* $get:ident, $get_array:ident: $narrow:ty, $extend:ident => $width:literal;)*) => {
        $(
            $(#[$meta])*
            pub fn $get<T: From<$narrow>>(&mut self, out: &mut T) -> &mut Self {
                if let Some(bytes) = self.take::<$width>() {
                    *out = T::from(wire::$extend(bytes) as $narrow);
                }
                self
            }

            #[doc = concat!("Read `count` elements as [`Self::", stringify!($get), "`] would, in one pull.")]
            ///
            /// # Panics
            ///
            /// Panics if `count` exceeds `out.len()`.
            pub fn $get_array<T: From<$narrow>>(&mut self, out: &mut [T], count: usize) -> &mut Self {
                self.take_elements(out, count, |bytes: [u8; $width]| {
                    T::from(wire::$extend(bytes) as $narrow)
                })
            }
        )*
    };
}

/// Reads BDEX wire-format values from a [`ByteSource`].
///
/// The decoder is `Valid` until a request cannot be satisfied in full, then
/// `Invalid` for good. While invalid every `get_*` returns immediately
/// without touching its output or the source. Getters chain, so a record is
/// read in one expression and checked once.
pub struct Decoder<S> {
    source: S,
    config: DecoderConfig,
    state: StreamState,
    consumed: usize,
}

impl<S: ByteSource> Decoder<S> {
    /// Create a decoder with default configuration.
    pub fn new(source: S) -> Self {
        Self::with_config(source, DecoderConfig::default())
    }

    /// Create a decoder with explicit configuration.
    pub fn with_config(source: S, config: DecoderConfig) -> Self {
        Self {
            source,
            config,
            state: StreamState::default(),
            consumed: 0,
        }
    }

    get_integers! {
        /// Read one byte and sign-extend it into `out`.
        get_i8, get_i8_array: i8, decode_signed => 1;
        get_i16, get_i16_array: i16, decode_signed => 2;
        /// Read 3 bytes and sign-extend them into `out`.
        get_i24, get_i24_array: i32, decode_signed => 3;
        get_i32, get_i32_array: i32, decode_signed => 4;
        get_i40, get_i40_array: i64, decode_signed => 5;
        get_i48, get_i48_array: i64, decode_signed => 6;
        get_i56, get_i56_array: i64, decode_signed => 7;
        get_i64, get_i64_array: i64, decode_signed => 8;
        /// Read one byte and zero-extend it into `out`.
        get_u8, get_u8_array: u8, decode_unsigned => 1;
        get_u16, get_u16_array: u16, decode_unsigned => 2;
        get_u24, get_u24_array: u32, decode_unsigned => 3;
        get_u32, get_u32_array: u32, decode_unsigned => 4;
        get_u40, get_u40_array: u64, decode_unsigned => 5;
        get_u48, get_u48_array: u64, decode_unsigned => 6;
        get_u56, get_u56_array: u64, decode_unsigned => 7;
        get_u64, get_u64_array: u64, decode_unsigned => 8;
    }

    pub fn get_f32<T: From<f32>>(&mut self, out: &mut T) -> &mut Self {
        if let Some(bytes) = self.take::<4>() {
            *out = T::from(f32::from_bits(u32::from_be_bytes(bytes)));
        }
        self
    }

    pub fn get_f64(&mut self, out: &mut f64) -> &mut Self {
        if let Some(bytes) = self.take::<8>() {
            *out = f64::from_bits(u64::from_be_bytes(bytes));
        }
        self
    }

    /// # Panics
    ///
    /// Panics if `count` exceeds `out.len()`.
    pub fn get_f32_array<T: From<f32>>(&mut self, out: &mut [T], count: usize) -> &mut Self {
        self.take_elements(out, count, |bytes: [u8; 4]| {
            T::from(f32::from_bits(u32::from_be_bytes(bytes)))
        })
    }

    /// # Panics
    ///
    /// Panics if `count` exceeds `out.len()`.
    pub fn get_f64_array(&mut self, out: &mut [f64], count: usize) -> &mut Self {
        self.take_elements(out, count, |bytes: [u8; 8]| {
            f64::from_bits(u64::from_be_bytes(bytes))
        })
    }

    /// Read a self-describing length (one or four bytes).
    pub fn get_length(&mut self, out: &mut usize) -> &mut Self {
        if let Some(len) = self.take_length() {
            *out = len;
        }
        self
    }

    /// Read a one-byte version, zero-extended into `out`.
    pub fn get_version<T: From<u8>>(&mut self, out: &mut T) -> &mut Self {
        if let Some([version]) = self.take::<1>() {
            *out = T::from(version);
        }
        self
    }

    /// Read a length-prefixed byte string, replacing the contents of `out`.
    pub fn get_byte_string(&mut self, out: &mut Vec<u8>) -> &mut Self {
        if let Some(bytes) = self.take_byte_string() {
            *out = bytes;
        }
        self
    }

    /// Read a length-prefixed string, replacing the contents of `out`.
    ///
    /// The bytes must be UTF-8; anything else invalidates the stream. Use
    /// [`Self::get_byte_string`] for arbitrary bytes.
    pub fn get_string(&mut self, out: &mut String) -> &mut Self {
        let Some(bytes) = self.take_byte_string() else {
            return self;
        };
        match String::from_utf8(bytes) {
            Ok(text) => *out = text,
            Err(err) => self.state.fail(CodecError::InvalidUtf8(err.utf8_error())),
        }
        self
    }

    /// Current state of the stream.
    pub fn validity(&self) -> Validity {
        self.state.validity()
    }

    pub fn is_valid(&self) -> bool {
        self.state.is_valid()
    }

    /// The cause of invalidation, if the stream is invalid.
    pub fn failure(&self) -> Option<&CodecError> {
        self.state.failure()
    }

    /// Force the stream into the invalid state.
    ///
    /// For callers that spot a problem the codec cannot see, such as an
    /// unsupported record version.
    pub fn invalidate(&mut self) -> &mut Self {
        self.state.fail(CodecError::Invalidated);
        self
    }

    /// Bytes pulled from the source so far.
    pub fn bytes_read(&self) -> usize {
        self.consumed
    }

    /// Current decoder configuration.
    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    /// Update the string length limit for subsequent reads.
    pub fn set_max_string_len(&mut self, max_string_len: usize) {
        self.config.max_string_len = max_string_len;
    }

    /// Borrow the underlying source.
    pub fn get_ref(&self) -> &S {
        &self.source
    }

    /// Mutably borrow the underlying source.
    pub fn get_mut(&mut self) -> &mut S {
        &mut self.source
    }

    /// Consume the decoder and return the source, whatever its state.
    pub fn into_inner(self) -> S {
        self.source
    }

    /// Consume the decoder, returning the source if every read succeeded.
    pub fn finish(self) -> Result<S> {
        self.state.into_result()?;
        Ok(self.source)
    }

    fn take_length(&mut self) -> Option<usize> {
        let [first] = self.take::<1>()?;
        if !wire::is_long_length(first) {
            return Some(usize::from(first));
        }
        let [b1, b2, b3] = self.take::<3>()?;
        Some(wire::decode_long_length([first, b1, b2, b3]))
    }

    fn take_byte_string(&mut self) -> Option<Vec<u8>> {
        let len = self.take_length()?;
        if len > self.config.max_string_len {
            self.state.fail(CodecError::LengthLimit {
                len,
                max: self.config.max_string_len,
            });
            return None;
        }
        if let Some(available) = self.source.remaining_hint() {
            if available < len {
                self.state.fail(CodecError::Truncated {
                    needed: len,
                    available,
                });
                return None;
            }
        }

        let mut bytes = Vec::with_capacity(len.min(READ_CHUNK_SIZE));
        let mut chunk = [0u8; READ_CHUNK_SIZE];
        while bytes.len() < len {
            let want = (len - bytes.len()).min(READ_CHUNK_SIZE);
            let got = self.pull(&mut chunk[..want]);
            bytes.extend_from_slice(&chunk[..got]);
            if got < want {
                self.state.fail(CodecError::Truncated {
                    needed: len,
                    available: bytes.len(),
                });
                return None;
            }
        }
        Some(bytes)
    }

    fn take<const N: usize>(&mut self) -> Option<[u8; N]> {
        if !self.state.is_valid() {
            return None;
        }
        let mut bytes = [0u8; N];
        let got = self.pull(&mut bytes);
        if got < N {
            self.state.fail(CodecError::Truncated {
                needed: N,
                available: got,
            });
            return None;
        }
        Some(bytes)
    }

    fn take_elements<T, const N: usize>(
        &mut self,
        out: &mut [T],
        count: usize,
        decode: impl Fn([u8; N]) -> T,
    ) -> &mut Self {
        assert!(
            count <= out.len(),
            "array count {count} exceeds destination capacity {}",
            out.len()
        );
        if !self.state.is_valid() || count == 0 {
            return self;
        }

        let available = self.source.remaining_hint();
        let needed = match count.checked_mul(N) {
            Some(needed) if available.is_none_or(|available| available >= needed) => needed,
            _ => {
                self.state.fail(CodecError::Truncated {
                    needed: count.saturating_mul(N),
                    available: available.unwrap_or(0),
                });
                return self;
            }
        };

        let mut buf = vec![0u8; needed];
        let got = self.pull(&mut buf);
        if got < buf.len() {
            self.state.fail(CodecError::Truncated {
                needed: buf.len(),
                available: got,
            });
            return self;
        }

        for (slot, chunk) in out[..count].iter_mut().zip(buf.chunks_exact(N)) {
            let mut bytes = [0u8; N];
            bytes.copy_from_slice(chunk);
            *slot = decode(bytes);
        }
        self
    }

    fn pull(&mut self, dst: &mut [u8]) -> usize {
        let got = self.source.pull_bytes(dst);
        self.consumed += got;
        got
    }
}

impl<S> std::fmt::Debug for Decoder<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Decoder")
            .field("validity", &self.state.validity())
            .field("consumed", &self.consumed)
            .field("config", &self.config)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use bdex_transport::{IoSource, SliceSource};

    use super::*;
    use crate::encoder::Encoder;

    fn encode(f: impl FnOnce(&mut Encoder<&mut Vec<u8>>)) -> Vec<u8> {
        let mut out = Vec::new();
        let mut encoder = Encoder::new(&mut out);
        f(&mut encoder);
        out
    }

    #[test]
    fn narrow_signed_extends_into_wider_host() {
        let wire = encode(|e| {
            e.put_i8(-1);
        });
        let mut value = 0i32;
        let mut decoder = Decoder::new(SliceSource::new(&wire));
        decoder.get_i8(&mut value);

        assert!(decoder.is_valid());
        assert_eq!(value, -1);
    }

    #[test]
    fn narrow_unsigned_zero_extends_into_wider_host() {
        let wire = encode(|e| {
            e.put_u8(0xFF);
        });
        let mut value = 0u32;
        Decoder::new(SliceSource::new(&wire)).get_u8(&mut value);
        assert_eq!(value, 255);
    }

    #[test]
    fn odd_widths_sign_extend() {
        let wire = encode(|e| {
            e.put_i24(-5).put_i40(-(1 << 39)).put_i56(123);
        });
        let (mut a, mut b, mut c) = (0i64, 0i64, 0i64);
        let mut decoder = Decoder::new(SliceSource::new(&wire));
        decoder.get_i24(&mut a).get_i40(&mut b).get_i56(&mut c);

        assert!(decoder.is_valid());
        assert_eq!((a, b, c), (-5, -(1 << 39), 123));
    }

    #[test]
    fn odd_widths_zero_extend() {
        let wire = [0xFF, 0xFF, 0xFF, 0x80, 0x00, 0x00, 0x00, 0x00, 0x01];
        let (mut a, mut b) = (0u32, 0u64);
        Decoder::new(SliceSource::new(&wire))
            .get_u24(&mut a)
            .get_u48(&mut b);
        assert_eq!(a, 0xFF_FFFF);
        assert_eq!(b, 0x8000_0000_0001);
    }

    #[test]
    fn length_boundary_roundtrip() {
        let wire = encode(|e| {
            e.put_length(127).put_length(128);
        });
        assert_eq!(wire.len(), 5);

        let (mut short, mut long) = (0usize, 0usize);
        let mut decoder = Decoder::new(SliceSource::new(&wire));
        decoder.get_length(&mut short).get_length(&mut long);

        assert!(decoder.is_valid());
        assert_eq!((short, long), (127, 128));
    }

    #[test]
    fn version_zero_extends() {
        let mut version = 0u32;
        Decoder::new(SliceSource::new(&[0xFE])).get_version(&mut version);
        assert_eq!(version, 0xFE);
    }

    #[test]
    fn truncated_read_invalidates_permanently() {
        let wire = [1u8, 2, 3];
        let mut source = SliceSource::new(&wire);
        let mut decoder = Decoder::new(&mut source);

        let mut wide = 0i64;
        decoder.get_i64(&mut wide);
        assert_eq!(decoder.validity(), Validity::Invalid);

        let consumed = decoder.bytes_read();
        let mut narrow = 42i32;
        decoder.get_i8(&mut narrow);

        assert_eq!(narrow, 42);
        assert_eq!(decoder.bytes_read(), consumed);
        assert!(matches!(
            decoder.failure(),
            Some(CodecError::Truncated {
                needed: 8,
                available: 3
            })
        ));
    }

    #[test]
    fn invalid_stream_leaves_source_untouched() {
        let wire = [9u8, 8, 7];
        let mut source = SliceSource::new(&wire);
        {
            let mut decoder = Decoder::new(&mut source);
            let mut value = 0u8;
            decoder.invalidate().get_u8(&mut value);
            assert_eq!(value, 0);
        }
        assert_eq!(source.position(), 0);
    }

    #[test]
    fn array_roundtrip() {
        let wire = encode(|e| {
            e.put_i32_array(&[1, -2, 3]);
        });
        let mut buf = [0i32; 3];
        let mut decoder = Decoder::new(SliceSource::new(&wire));
        decoder.get_i32_array(&mut buf, 3);

        assert!(decoder.is_valid());
        assert_eq!(buf, [1, -2, 3]);
    }

    #[test]
    fn array_partial_count_leaves_tail() {
        let wire = encode(|e| {
            e.put_u16_array(&[10, 20]);
        });
        let mut buf = [0u32; 4];
        Decoder::new(SliceSource::new(&wire)).get_u16_array(&mut buf, 2);
        assert_eq!(buf, [10, 20, 0, 0]);
    }

    #[test]
    fn truncated_array_invalidates_without_writing() {
        let wire = [0u8, 1, 0];
        let mut buf = [7u16; 2];
        let mut decoder = Decoder::new(SliceSource::new(&wire));
        decoder.get_u16_array(&mut buf, 2);

        assert!(!decoder.is_valid());
        assert_eq!(buf, [7, 7]);
    }

    #[derive(Clone, Copy, Debug, PartialEq)]
    struct Discard;

    impl From<u64> for Discard {
        fn from(_: u64) -> Self {
            Discard
        }
    }

    #[test]
    fn array_longer_than_source_fails_before_reading() {
        let wire = [1u8, 2, 3];
        let mut out = vec![Discard; 1_000_000];
        let mut decoder = Decoder::new(SliceSource::new(&wire));
        decoder.get_u64_array(&mut out, 1_000_000);

        assert!(matches!(
            decoder.failure(),
            Some(CodecError::Truncated {
                needed: 8_000_000,
                available: 3
            })
        ));
        assert_eq!(decoder.bytes_read(), 0);
    }

    #[test]
    fn array_byte_count_overflow_invalidates() {
        // Zero-sized elements make a destination of any length free.
        let out: &mut [Discard] = unsafe {
            std::slice::from_raw_parts_mut(std::ptr::NonNull::dangling().as_ptr(), usize::MAX)
        };
        let wire = [0u8; 16];
        let mut decoder = Decoder::new(SliceSource::new(&wire));
        decoder.get_u64_array(out, usize::MAX);

        assert!(matches!(
            decoder.failure(),
            Some(CodecError::Truncated {
                needed: usize::MAX,
                ..
            })
        ));
        assert_eq!(decoder.bytes_read(), 0);
    }

    #[test]
    #[should_panic(expected = "exceeds destination capacity")]
    fn array_count_beyond_capacity_panics() {
        let wire = [0u8; 16];
        let mut buf = [0u8; 2];
        Decoder::new(SliceSource::new(&wire)).get_u8_array(&mut buf, 3);
    }

    #[test]
    fn float_arrays_roundtrip() {
        let wire = encode(|e| {
            e.put_f32_array(&[0.5, -1.25]).put_f64_array(&[f64::MAX]);
        });
        let mut singles = [0f64; 2];
        let mut doubles = [0f64; 1];
        let mut decoder = Decoder::new(SliceSource::new(&wire));
        decoder
            .get_f32_array(&mut singles, 2)
            .get_f64_array(&mut doubles, 1);

        assert!(decoder.is_valid());
        assert_eq!(singles, [0.5, -1.25]);
        assert_eq!(doubles, [f64::MAX]);
    }

    #[test]
    fn empty_string_leaves_cursor_after_length() {
        let wire = encode(|e| {
            e.put_string("").put_u8(0xAB);
        });
        let mut source = SliceSource::new(&wire);
        let mut text = String::from("stale");
        {
            let mut decoder = Decoder::new(&mut source);
            decoder.get_string(&mut text);
            assert!(decoder.is_valid());
        }

        assert!(text.is_empty());
        assert_eq!(source.position(), 1);
        assert_eq!(source.rest(), &[0xAB]);
    }

    #[test]
    fn string_replaces_previous_contents() {
        let wire = encode(|e| {
            e.put_string("bdex");
        });
        let mut text = String::from("previous value");
        Decoder::new(SliceSource::new(&wire)).get_string(&mut text);
        assert_eq!(text, "bdex");
    }

    #[test]
    fn long_byte_string_over_stream_source() {
        let payload: Vec<u8> = (0..20_000u32).map(|i| (i % 251) as u8).collect();
        let wire = encode(|e| {
            e.put_byte_string(&payload);
        });

        let mut out = Vec::new();
        let mut decoder = Decoder::new(IoSource::new(Cursor::new(wire)));
        decoder.get_byte_string(&mut out);

        assert!(decoder.is_valid());
        assert_eq!(out, payload);
    }

    #[test]
    fn truncated_string_over_stream_source() {
        let mut wire = encode(|e| {
            e.put_string("truncated payload");
        });
        wire.truncate(6);

        let mut out = String::from("keep");
        let mut decoder = Decoder::new(IoSource::new(Cursor::new(wire)));
        decoder.get_string(&mut out);

        assert!(!decoder.is_valid());
        assert_eq!(out, "keep");
        assert!(matches!(
            decoder.failure(),
            Some(CodecError::Truncated {
                needed: 17,
                available: 5
            })
        ));
    }

    #[test]
    fn string_longer_than_slice_fails_before_reading() {
        let wire = [0x80, 0x10, 0x00, 0x00, b'a'];
        let mut source = SliceSource::new(&wire);
        let mut out = Vec::new();
        {
            let mut decoder = Decoder::new(&mut source);
            decoder.get_byte_string(&mut out);
            assert!(matches!(
                decoder.failure(),
                Some(CodecError::Truncated { available: 1, .. })
            ));
        }
        assert_eq!(source.position(), 4);
    }

    #[test]
    fn string_over_configured_limit_invalidates() {
        let wire = encode(|e| {
            e.put_string("too long");
        });
        let config = DecoderConfig { max_string_len: 4 };
        let mut text = String::new();
        let mut decoder = Decoder::with_config(SliceSource::new(&wire), config);
        decoder.get_string(&mut text);

        assert!(matches!(
            decoder.failure(),
            Some(CodecError::LengthLimit { len: 8, max: 4 })
        ));
    }

    #[test]
    fn non_utf8_string_invalidates() {
        let wire = [0x02, 0xC3, 0x28];
        let mut text = String::new();
        let mut decoder = Decoder::new(SliceSource::new(&wire));
        decoder.get_string(&mut text);

        assert!(matches!(decoder.failure(), Some(CodecError::InvalidUtf8(_))));

        let mut raw = Vec::new();
        Decoder::new(SliceSource::new(&wire)).get_byte_string(&mut raw);
        assert_eq!(raw, [0xC3, 0x28]);
    }

    #[test]
    fn mismatched_order_decodes_wrong_values() {
        let wire = encode(|e| {
            e.put_u16(0x0102).put_u32(0x0A0B_0C0D);
        });
        let (mut first, mut second) = (0u32, 0u16);
        let mut decoder = Decoder::new(SliceSource::new(&wire));
        decoder.get_u32(&mut first).get_u16(&mut second);

        assert!(decoder.is_valid());
        assert_eq!(first, 0x0102_0A0B);
        assert_eq!(second, 0x0C0D);
    }

    #[test]
    fn caller_invalidation_is_sticky() {
        let wire = [0u8; 4];
        let mut decoder = Decoder::new(SliceSource::new(&wire));
        let mut version = 0u8;
        decoder.get_version(&mut version);
        if version != 1 {
            decoder.invalidate();
        }

        let mut value = 5u16;
        decoder.get_u16(&mut value);
        assert_eq!(value, 5);
        assert!(matches!(decoder.finish(), Err(CodecError::Invalidated)));
    }

    #[test]
    fn finish_returns_source_when_valid() {
        let wire = [0u8, 1, 2];
        let mut value = 0u16;
        let mut decoder = Decoder::new(SliceSource::new(&wire));
        decoder.get_u16(&mut value);

        let source = decoder.finish().unwrap();
        assert_eq!(source.rest(), &[2]);
    }

    #[test]
    fn set_max_string_len_applies() {
        let mut decoder = Decoder::new(SliceSource::new(&[]));
        decoder.set_max_string_len(16);
        assert_eq!(decoder.config().max_string_len, 16);
    }
}
