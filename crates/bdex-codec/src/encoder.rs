use bdex_transport::ByteSink;

use crate::error::{CodecError, Result};
use crate::state::{StreamState, Validity};
use crate::wire;

macro_rules! put_integers {
    ($($(#[$meta:meta])* $put:ident, $put_array:ident: $ty:ty => $width:literal;)*) => {
        $(
            $(#[$meta])*
            pub fn $put(&mut self, value: $ty) -> &mut Self {
                self.put_wire(&wire::encode_bits::<$width>(value as u64))
            }

            #[doc = concat!("Write every element as [`Self::", stringify!($put), "`] would, packed, with no count.")]
            pub fn $put_array(&mut self, values: &[$ty]) -> &mut Self {
                self.put_elements(values, |v: $ty| wire::encode_bits::<$width>(v as u64))
            }
        )*
    };
}

/// Appends BDEX wire-format values to a [`ByteSink`].
///
/// Every `put_*` returns `&mut Self` so a record can be written as one chain
/// and checked once at the end. Once the sink rejects a write the encoder is
/// invalid and every later `put_*` is a no-op; bytes already accepted by the
/// sink stay there.
pub struct Encoder<S> {
    sink: S,
    state: StreamState,
    written: usize,
}

impl<S: ByteSink> Encoder<S> {
    pub fn new(sink: S) -> Self {
        Self {
            sink,
            state: StreamState::default(),
            written: 0,
        }
    }

    put_integers! {
        /// Write one byte of a signed value.
        put_i8, put_i8_array: i8 => 1;
        put_i16, put_i16_array: i16 => 2;
        /// Write the low 3 bytes of `value`; the caller guarantees it fits in 24 bits.
        put_i24, put_i24_array: i32 => 3;
        put_i32, put_i32_array: i32 => 4;
        /// Write the low 5 bytes of `value`; the caller guarantees it fits in 40 bits.
        put_i40, put_i40_array: i64 => 5;
        put_i48, put_i48_array: i64 => 6;
        put_i56, put_i56_array: i64 => 7;
        put_i64, put_i64_array: i64 => 8;
        put_u8, put_u8_array: u8 => 1;
        put_u16, put_u16_array: u16 => 2;
        /// Write the low 3 bytes of `value`; the caller guarantees it fits in 24 bits.
        put_u24, put_u24_array: u32 => 3;
        put_u32, put_u32_array: u32 => 4;
        put_u40, put_u40_array: u64 => 5;
        put_u48, put_u48_array: u64 => 6;
        put_u56, put_u56_array: u64 => 7;
        put_u64, put_u64_array: u64 => 8;
    }

    /// Write an IEEE-754 single in network order.
    pub fn put_f32(&mut self, value: f32) -> &mut Self {
        self.put_wire(&value.to_bits().to_be_bytes())
    }

    /// Write an IEEE-754 double in network order.
    pub fn put_f64(&mut self, value: f64) -> &mut Self {
        self.put_wire(&value.to_bits().to_be_bytes())
    }

    pub fn put_f32_array(&mut self, values: &[f32]) -> &mut Self {
        self.put_elements(values, |v: f32| v.to_bits().to_be_bytes())
    }

    pub fn put_f64_array(&mut self, values: &[f64]) -> &mut Self {
        self.put_elements(values, |v: f64| v.to_bits().to_be_bytes())
    }

    /// Write a self-describing length: one byte up to 127, four bytes with
    /// the top bit set above that.
    ///
    /// `len` must fit in 31 bits. Larger values trip a debug assertion and
    /// are masked to 31 bits in release builds.
    pub fn put_length(&mut self, len: usize) -> &mut Self {
        let mut buf = [0u8; wire::LONG_LENGTH_SIZE];
        let bytes = wire::encode_length(len, &mut buf);
        self.put_wire(bytes)
    }

    /// Write the low 8 bits of `version` as a single byte.
    pub fn put_version(&mut self, version: u32) -> &mut Self {
        self.put_wire(&[version as u8])
    }

    /// Write `value` as a length followed by its UTF-8 bytes.
    pub fn put_string(&mut self, value: &str) -> &mut Self {
        self.put_byte_string(value.as_bytes())
    }

    /// Write `value` as a length followed by the bytes verbatim.
    pub fn put_byte_string(&mut self, value: &[u8]) -> &mut Self {
        self.put_length(value.len());
        if !value.is_empty() {
            self.put_wire(value);
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
    pub fn invalidate(&mut self) -> &mut Self {
        self.state.fail(CodecError::Invalidated);
        self
    }

    /// Bytes accepted by the sink so far.
    pub fn bytes_written(&self) -> usize {
        self.written
    }

    /// Borrow the underlying sink.
    pub fn get_ref(&self) -> &S {
        &self.sink
    }

    /// Mutably borrow the underlying sink.
    pub fn get_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// Consume the encoder and return the sink, whatever its state.
    pub fn into_inner(self) -> S {
        self.sink
    }

    /// Consume the encoder, returning the sink if every write succeeded.
    pub fn finish(self) -> Result<S> {
        self.state.into_result()?;
        Ok(self.sink)
    }

    fn put_elements<T: Copy, const N: usize>(
        &mut self,
        values: &[T],
        encode: impl Fn(T) -> [u8; N],
    ) -> &mut Self {
        if !self.state.is_valid() || values.is_empty() {
            return self;
        }
        let mut buf = Vec::with_capacity(values.len() * N);
        for &value in values {
            buf.extend_from_slice(&encode(value));
        }
        self.put_wire(&buf)
    }

    fn put_wire(&mut self, bytes: &[u8]) -> &mut Self {
        if !self.state.is_valid() {
            return self;
        }
        match self.sink.put_bytes(bytes) {
            Ok(()) => self.written += bytes.len(),
            Err(err) => self.state.fail(CodecError::Sink(err)),
        }
        self
    }
}

impl<S> std::fmt::Debug for Encoder<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Encoder")
            .field("validity", &self.state.validity())
            .field("written", &self.written)
            .finish()
    }
}
