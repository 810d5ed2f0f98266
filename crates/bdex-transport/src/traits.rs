use crate::error::Result;

/// Destination for encoded bytes.
///
/// A sink either accepts the whole run or reports an error. Partial writes are
/// an implementation detail of the sink and never surface to the caller.
pub trait ByteSink {
    /// Append `bytes` to the sink.
    fn put_bytes(&mut self, bytes: &[u8]) -> Result<()>;
}

/// Origin of bytes to decode.
pub trait ByteSource {
    /// Copy up to `dst.len()` bytes into `dst`, consuming them.
    ///
    /// Returns the number of bytes actually copied. A short count means the
    /// source ran dry; the copied prefix is still consumed.
    fn pull_bytes(&mut self, dst: &mut [u8]) -> usize;

    /// Number of bytes still available, when the source knows it up front.
    ///
    /// Streaming sources return `None`.
    fn remaining_hint(&self) -> Option<usize> {
        None
    }
}

impl<S: ByteSink + ?Sized> ByteSink for &mut S {
    fn put_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        (**self).put_bytes(bytes)
    }
}

impl<S: ByteSink + ?Sized> ByteSink for Box<S> {
    fn put_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        (**self).put_bytes(bytes)
    }
}

impl<S: ByteSource + ?Sized> ByteSource for &mut S {
    fn pull_bytes(&mut self, dst: &mut [u8]) -> usize {
        (**self).pull_bytes(dst)
    }

    fn remaining_hint(&self) -> Option<usize> {
        (**self).remaining_hint()
    }
}

impl<S: ByteSource + ?Sized> ByteSource for Box<S> {
    fn pull_bytes(&mut self, dst: &mut [u8]) -> usize {
        (**self).pull_bytes(dst)
    }

    fn remaining_hint(&self) -> Option<usize> {
        (**self).remaining_hint()
    }
}
