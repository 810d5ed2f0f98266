//! Byte sink and byte source abstraction.
//!
//! The BDEX codec never talks to a concrete transport. It needs exactly two
//! capabilities:
//! - [`ByteSink`]: append a run of bytes, optionally reporting failure
//! - [`ByteSource`]: pull up to N bytes, reporting how many were available
//!
//! This crate defines those traits and implements them for in-memory buffers
//! and for any [`std::io::Read`] / [`std::io::Write`] stream.

pub mod error;
pub mod io;
pub mod memory;
pub mod traits;

pub use error::{Result, SinkError};
pub use io::{IoSink, IoSource};
pub use memory::{SliceSink, SliceSource};
pub use traits::{ByteSink, ByteSource};
