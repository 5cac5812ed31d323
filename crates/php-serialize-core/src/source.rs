//! Byte sources feeding the decoder.
//!
//! The grammar engine is written once against [`Source`]; the slice
//! implementation backs `loads` with `memchr`-accelerated scanning and
//! input previews in errors, while the reader implementation backs
//! `load` with plain synchronous reads and a single byte of lookahead.

use std::io::Read;

use memchr::memchr;

use crate::error::{input_preview, ErrorKind, PhpSerializeError, Result};

/// A positioned stream of bytes for the recursive-descent decoder.
pub(crate) trait Source {
    /// Byte offset of the next unconsumed byte.
    fn position(&self) -> usize;

    /// Look at the next byte without consuming it.
    fn peek_byte(&mut self) -> Result<u8>;

    /// Consume and return the next byte.
    fn read_byte(&mut self) -> Result<u8>;

    /// Consume exactly `len` bytes. A short read fails with
    /// `StringLengthMismatch`, never a truncated result.
    fn take(&mut self, len: usize) -> Result<Vec<u8>>;

    /// Consume bytes up to (not including) the delimiter.
    fn read_until(&mut self, delimiter: u8) -> Result<Vec<u8>>;

    /// Render the input around `pos` for error messages, when the
    /// source can look back.
    fn preview(&self, pos: usize) -> Option<String> {
        let _ = pos;
        None
    }
}

/// In-memory source over a byte slice.
pub(crate) struct SliceSource<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> SliceSource<'a> {
    pub(crate) fn new(data: &'a [u8]) -> Self {
        Self::starting_at(data, 0)
    }

    /// Start mid-slice; positions stay absolute within `data`, which
    /// keeps session-segment errors pointing into the full input.
    pub(crate) fn starting_at(data: &'a [u8], pos: usize) -> Self {
        Self { data, pos }
    }
}

impl Source for SliceSource<'_> {
    #[inline(always)]
    fn position(&self) -> usize {
        self.pos
    }

    #[inline(always)]
    fn peek_byte(&mut self) -> Result<u8> {
        self.data
            .get(self.pos)
            .copied()
            .ok_or_else(|| PhpSerializeError::new(ErrorKind::UnexpectedEof, self.pos))
    }

    #[inline(always)]
    fn read_byte(&mut self) -> Result<u8> {
        let byte = self.peek_byte()?;
        self.pos += 1;
        Ok(byte)
    }

    fn take(&mut self, len: usize) -> Result<Vec<u8>> {
        let available = self.data.len() - self.pos;
        if len > available {
            return Err(PhpSerializeError::new(
                ErrorKind::StringLengthMismatch {
                    expected: len,
                    found: available,
                },
                self.pos,
            ));
        }
        let bytes = self.data[self.pos..self.pos + len].to_vec();
        self.pos += len;
        Ok(bytes)
    }

    #[inline]
    fn read_until(&mut self, delimiter: u8) -> Result<Vec<u8>> {
        match memchr(delimiter, &self.data[self.pos..]) {
            Some(offset) => {
                let bytes = self.data[self.pos..self.pos + offset].to_vec();
                self.pos += offset;
                Ok(bytes)
            }
            None => Err(PhpSerializeError::new(
                ErrorKind::UnexpectedChar {
                    expected: delimiter as char,
                    found: '\0',
                },
                self.pos,
            )
            .with_preview(self.preview(self.pos))),
        }
    }

    fn preview(&self, pos: usize) -> Option<String> {
        input_preview(self.data, pos)
    }
}

/// Streaming source over any [`Read`], with one byte of lookahead.
///
/// Never reads past the node being decoded, so the reader is left
/// positioned exactly after it.
pub(crate) struct ReadSource<R: Read> {
    inner: R,
    pos: usize,
    peeked: Option<u8>,
}

impl<R: Read> ReadSource<R> {
    pub(crate) fn new(inner: R) -> Self {
        Self {
            inner,
            pos: 0,
            peeked: None,
        }
    }

    /// Pull one byte from the reader, `None` at end of stream.
    fn pull(&mut self) -> Result<Option<u8>> {
        let mut buf = [0u8; 1];
        loop {
            match self.inner.read(&mut buf) {
                Ok(0) => return Ok(None),
                Ok(_) => return Ok(Some(buf[0])),
                Err(ref e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
    }
}

impl<R: Read> Source for ReadSource<R> {
    fn position(&self) -> usize {
        self.pos
    }

    fn peek_byte(&mut self) -> Result<u8> {
        if self.peeked.is_none() {
            self.peeked = self.pull()?;
        }
        self.peeked
            .ok_or_else(|| PhpSerializeError::new(ErrorKind::UnexpectedEof, self.pos))
    }

    fn read_byte(&mut self) -> Result<u8> {
        let byte = self.peek_byte()?;
        self.peeked = None;
        self.pos += 1;
        Ok(byte)
    }

    fn take(&mut self, len: usize) -> Result<Vec<u8>> {
        let start = self.pos;
        let mut bytes = Vec::with_capacity(len);
        if len > 0 {
            if let Some(byte) = self.peeked.take() {
                bytes.push(byte);
                self.pos += 1;
            }
        }
        while bytes.len() < len {
            match self.pull()? {
                Some(byte) => {
                    bytes.push(byte);
                    self.pos += 1;
                }
                None => {
                    return Err(PhpSerializeError::new(
                        ErrorKind::StringLengthMismatch {
                            expected: len,
                            found: bytes.len(),
                        },
                        start,
                    ));
                }
            }
        }
        Ok(bytes)
    }

    fn read_until(&mut self, delimiter: u8) -> Result<Vec<u8>> {
        let mut bytes = Vec::new();
        loop {
            let byte = self.peek_byte()?;
            if byte == delimiter {
                return Ok(bytes);
            }
            self.read_byte()?;
            bytes.push(byte);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_slice_take_short_input() {
        let mut src = SliceSource::new(b"abc");
        let err = src.take(5).unwrap_err();
        assert_eq!(
            err.kind,
            ErrorKind::StringLengthMismatch {
                expected: 5,
                found: 3
            }
        );
    }

    #[test]
    fn test_slice_read_until_leaves_delimiter() {
        let mut src = SliceSource::new(b"42;rest");
        assert_eq!(src.read_until(b';').unwrap(), b"42");
        assert_eq!(src.read_byte().unwrap(), b';');
        assert_eq!(src.position(), 3);
    }

    #[test]
    fn test_reader_peek_does_not_advance_position() {
        let mut src = ReadSource::new(Cursor::new(b"ab".to_vec()));
        assert_eq!(src.peek_byte().unwrap(), b'a');
        assert_eq!(src.position(), 0);
        assert_eq!(src.read_byte().unwrap(), b'a');
        assert_eq!(src.position(), 1);
    }

    #[test]
    fn test_reader_take_drains_lookahead_first() {
        let mut src = ReadSource::new(Cursor::new(b"hello".to_vec()));
        assert_eq!(src.peek_byte().unwrap(), b'h');
        assert_eq!(src.take(5).unwrap(), b"hello");
        assert_eq!(src.position(), 5);
    }

    #[test]
    fn test_reader_take_short_stream() {
        let mut src = ReadSource::new(Cursor::new(b"ab".to_vec()));
        let err = src.take(4).unwrap_err();
        assert_eq!(
            err.kind,
            ErrorKind::StringLengthMismatch {
                expected: 4,
                found: 2
            }
        );
    }
}
