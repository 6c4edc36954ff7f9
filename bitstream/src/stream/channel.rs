//! Byte-oriented channels underneath a [`BitStream`](super::BitStream).
//!
//! A channel moves whole bytes and can report, without consuming anything,
//! whether another byte follows. [`Source`] adapts any [`BufRead`] and
//! [`Sink`] adapts any [`Write`]; both accept borrowed handles such as
//! `&[u8]` or `&mut Vec<u8>`, so the caller keeps ownership of the
//! underlying file or buffer.

use std::io::{self, BufRead, Write};

pub trait ByteChannel {
    /// Consumes the next byte, `None` once the channel is exhausted.
    fn take(&mut self) -> io::Result<Option<u8>>;

    /// Non-consuming look-ahead: true when no byte follows.
    fn at_end(&mut self) -> io::Result<bool>;

    fn put(&mut self, byte: u8) -> io::Result<()>;
}

/// Read side of a channel.
#[derive(Debug)]
pub struct Source<R: BufRead> {
    inner: R,
}

impl<R: BufRead> Source<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }

    pub fn get_ref(&self) -> &R {
        &self.inner
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: BufRead> ByteChannel for Source<R> {
    #[inline(always)]
    fn take(&mut self) -> io::Result<Option<u8>> {
        let byte = match self.inner.fill_buf()?.first() {
            Some(&byte) => byte,
            None => return Ok(None),
        };
        self.inner.consume(1);

        Ok(Some(byte))
    }

    #[inline(always)]
    fn at_end(&mut self) -> io::Result<bool> {
        self.inner.fill_buf().map(|buf| buf.is_empty())
    }

    fn put(&mut self, _byte: u8) -> io::Result<()> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "put: channel is read-only",
        ))
    }
}

/// Write side of a channel.
#[derive(Debug)]
pub struct Sink<W: Write> {
    inner: W,
    written: u64,
}

impl<W: Write> Sink<W> {
    pub fn new(inner: W) -> Self {
        Self { inner, written: 0 }
    }

    /// Number of bytes handed to the underlying writer so far.
    pub fn written(&self) -> u64 {
        self.written
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> ByteChannel for Sink<W> {
    fn take(&mut self) -> io::Result<Option<u8>> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "take: channel is write-only",
        ))
    }

    fn at_end(&mut self) -> io::Result<bool> {
        Ok(true)
    }

    #[inline(always)]
    fn put(&mut self, byte: u8) -> io::Result<()> {
        self.inner.write_all(&[byte])?;
        self.written += 1;

        Ok(())
    }
}

impl<C: ByteChannel + ?Sized> ByteChannel for &mut C {
    fn take(&mut self) -> io::Result<Option<u8>> {
        (**self).take()
    }

    fn at_end(&mut self) -> io::Result<bool> {
        (**self).at_end()
    }

    fn put(&mut self, byte: u8) -> io::Result<()> {
        (**self).put(byte)
    }
}
