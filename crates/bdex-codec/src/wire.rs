//! Wire-format constants and the width/endianness routines every typed
//! operation is built from.
//!
//! All multi-byte values travel in network (big-endian) order. An integer of
//! width `N` bytes is the low `N` bytes of its 64-bit two's complement form.

/// Largest length that fits the one-byte form.
pub const MAX_SHORT_LENGTH: usize = 0x7F;

/// Largest length the four-byte form can carry (31 bits).
pub const MAX_LENGTH: usize = 0x7FFF_FFFF;

/// Marker bit in the first byte of a four-byte length.
pub const LONG_LENGTH_FLAG: u8 = 0x80;

/// Wire size of a length in its long form.
pub const LONG_LENGTH_SIZE: usize = 4;

/// Network-order bytes of the low `N` bytes of `value`.
///
/// High-order bytes that do not fit are dropped.
#[inline]
pub fn encode_bits<const N: usize>(value: u64) -> [u8; N] {
    const { assert!(N >= 1 && N <= 8, "wire integers are 1 to 8 bytes wide") };
    let full = value.to_be_bytes();
    let mut out = [0u8; N];
    out.copy_from_slice(&full[8 - N..]);
    out
}

/// Zero-extend `N` network-order bytes to 64 bits.
#[inline]
pub fn decode_unsigned<const N: usize>(bytes: [u8; N]) -> u64 {
    const { assert!(N >= 1 && N <= 8, "wire integers are 1 to 8 bytes wide") };
    let mut full = [0u8; 8];
    full[8 - N..].copy_from_slice(&bytes);
    u64::from_be_bytes(full)
}

/// Sign-extend `N` network-order bytes to 64 bits.
#[inline]
pub fn decode_signed<const N: usize>(bytes: [u8; N]) -> i64 {
    let shift = 64 - 8 * N as u32;
    ((decode_unsigned(bytes) << shift) as i64) >> shift
}

/// Number of bytes `len` occupies on the wire.
#[inline]
pub fn length_size(len: usize) -> usize {
    if len <= MAX_SHORT_LENGTH {
        1
    } else {
        LONG_LENGTH_SIZE
    }
}

/// Encode a length into `dst`, returning the used prefix.
///
/// `len` must not exceed [`MAX_LENGTH`]; bits above 31 are dropped.
#[inline]
pub fn encode_length(len: usize, dst: &mut [u8; LONG_LENGTH_SIZE]) -> &[u8] {
    debug_assert!(len <= MAX_LENGTH, "length {len} does not fit in 31 bits");
    if len <= MAX_SHORT_LENGTH {
        dst[0] = len as u8;
        return &dst[..1];
    }
    *dst = encode_bits::<LONG_LENGTH_SIZE>((len & MAX_LENGTH) as u64);
    dst[0] |= LONG_LENGTH_FLAG;
    &dst[..]
}

/// Whether the first byte of a length announces the four-byte form.
#[inline]
pub fn is_long_length(first: u8) -> bool {
    first & LONG_LENGTH_FLAG != 0
}

/// Recover the magnitude of a four-byte length.
#[inline]
pub fn decode_long_length(bytes: [u8; LONG_LENGTH_SIZE]) -> usize {
    let mut bytes = bytes;
    bytes[0] &= !LONG_LENGTH_FLAG;
    decode_unsigned(bytes) as usize
}
