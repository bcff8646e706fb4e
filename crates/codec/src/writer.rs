//! The output target owned by an [`Encoder`](crate::Encoder).

use std::{
    fmt::Debug,
    io::{self, BufWriter, Write},
    mem,
};

enum Target {
    Unset,
    Bytes(Vec<u8>),
    Direct(Box<dyn Write + Send>),
    Buffered(BufWriter<Box<dyn Write + Send>>),
}

/// The byte sink drivers write into.
///
/// An `EncWriter` either accumulates into an in-memory buffer or forwards to
/// a boxed [`Write`] stream, optionally through a [`BufWriter`] sized by
/// [`CodecOptions::writer_buffer_size`](crate::CodecOptions).
pub struct EncWriter {
    target: Target,
}

impl EncWriter {
    /// Creates a writer with no target. Writes fail until one is set.
    #[must_use]
    pub const fn unset() -> Self { Self { target: Target::Unset } }

    /// Creates a writer that appends to `buf`.
    #[must_use]
    pub const fn bytes(buf: Vec<u8>) -> Self {
        Self { target: Target::Bytes(buf) }
    }

    /// Creates a writer over a stream, buffered when `buffer_size > 0`.
    #[must_use]
    pub fn stream(writer: Box<dyn Write + Send>, buffer_size: usize) -> Self {
        let target = if buffer_size == 0 {
            Target::Direct(writer)
        } else {
            Target::Buffered(BufWriter::with_capacity(buffer_size, writer))
        };

        Self { target }
    }

    /// Returns `true` if an output target has been configured.
    #[must_use]
    pub const fn is_set(&self) -> bool { !matches!(self.target, Target::Unset) }

    /// Returns the accumulated bytes of an in-memory target.
    #[must_use]
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match &self.target {
            Target::Bytes(buf) => Some(buf),
            _ => None,
        }
    }

    /// Takes the accumulated bytes of an in-memory target, leaving it empty.
    pub fn take_bytes(&mut self) -> Option<Vec<u8>> {
        match &mut self.target {
            Target::Bytes(buf) => Some(mem::take(buf)),
            _ => None,
        }
    }

    /// Writes a single byte.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying target fails or none is set.
    pub fn write_u8(&mut self, b: u8) -> io::Result<()> { self.write_all(&[b]) }

    /// Flushes buffered output at the end of an encode.
    ///
    /// # Errors
    ///
    /// Returns an error if flushing the stream fails.
    pub fn end(&mut self) -> io::Result<()> { self.flush() }
}

impl Write for EncWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match &mut self.target {
            Target::Unset => Err(io::Error::new(
                io::ErrorKind::NotConnected,
                "encoder output target is not set",
            )),
            Target::Bytes(out) => {
                out.extend_from_slice(buf);
                Ok(buf.len())
            }
            Target::Direct(w) => w.write(buf),
            Target::Buffered(w) => w.write(buf),
        }
    }

    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        match &mut self.target {
            Target::Bytes(out) => {
                out.extend_from_slice(buf);
                Ok(())
            }
            Target::Direct(w) => w.write_all(buf),
            Target::Buffered(w) => w.write_all(buf),
            Target::Unset => self.write(buf).map(|_| ()),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match &mut self.target {
            Target::Unset | Target::Bytes(_) => Ok(()),
            Target::Direct(w) => w.flush(),
            Target::Buffered(w) => w.flush(),
        }
    }
}

impl Debug for EncWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match &self.target {
            Target::Unset => "unset",
            Target::Bytes(_) => "bytes",
            Target::Direct(_) => "direct",
            Target::Buffered(_) => "buffered",
        };

        f.debug_struct("EncWriter").field("target", &kind).finish()
    }
}
