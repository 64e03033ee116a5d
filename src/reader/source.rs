//! Character sources from which a [`JsonStreamReader`](super::JsonStreamReader) pulls its input

use std::{
    fmt::Debug,
    io::{ErrorKind, Read},
    str::Chars,
};

use super::IoError;
use crate::utf8;

/// A forward-only source of characters
///
/// The JSON reader only requires "read the next character, or signal the end of the input".
/// Implementations exist for string slices ([`StrSource`]) and UTF-8 byte streams
/// ([`Utf8Source`]). A custom implementation can for example observe a cancellation flag
/// and return an error once cancellation was requested.
pub trait CharSource {
    /// Reads the next character
    ///
    /// Returns `None` if the end of the input has been reached.
    fn read_char(&mut self) -> Result<Option<char>, IoError>;

    /// Reads characters into `buf` until it is full or the end of the input has been reached
    ///
    /// Returns the number of characters which were read; it is only smaller than the length
    /// of `buf` if the end of the input has been reached.
    fn read_chars(&mut self, buf: &mut [char]) -> Result<usize, IoError> {
        let mut count = 0;
        for slot in buf.iter_mut() {
            match self.read_char()? {
                Some(c) => *slot = c,
                None => break,
            }
            count += 1;
        }
        Ok(count)
    }
}

impl<S: CharSource + ?Sized> CharSource for &mut S {
    fn read_char(&mut self) -> Result<Option<char>, IoError> {
        (**self).read_char()
    }

    fn read_chars(&mut self, buf: &mut [char]) -> Result<usize, IoError> {
        (**self).read_chars(buf)
    }
}

/// Character source for a string slice
#[derive(Clone, Debug)]
pub struct StrSource<'a> {
    chars: Chars<'a>,
}

impl<'a> StrSource<'a> {
    /// Creates a source providing the characters of `s`
    pub fn new(s: &'a str) -> Self {
        StrSource { chars: s.chars() }
    }

    /// Gets the remaining, not yet read part of the string
    pub fn remaining(&self) -> &'a str {
        self.chars.as_str()
    }
}

impl CharSource for StrSource<'_> {
    fn read_char(&mut self) -> Result<Option<char>, IoError> {
        Ok(self.chars.next())
    }
}

const READER_BUF_SIZE: usize = 1024;

/// Character source which decodes UTF-8 data from a [`Read`]
///
/// This source internally buffers data so it is normally not necessary to wrap the provided
/// reader in a [`std::io::BufReader`]. Malformed UTF-8 data is reported as IO error of kind
/// [`ErrorKind::InvalidData`]. If the underlying reader returns an error of kind
/// [`ErrorKind::Interrupted`], this source will keep retrying to read data.
pub struct Utf8Source<R: Read> {
    reader: R,
    /// Buffer containing some bytes read from [`reader`](Self::reader)
    buf: [u8; READER_BUF_SIZE],
    /// Start index (inclusive) at which data in [`buf`](Self::buf) starts
    buf_pos: usize,
    /// Index (exclusive) up to which [`buf`](Self::buf) is filled
    buf_end_pos: usize,
    reached_eof: bool,
}

impl<R: Read + Debug> Debug for Utf8Source<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Utf8Source")
            .field("reader", &self.reader)
            .field("buf_count", &(self.buf_end_pos - self.buf_pos))
            .field("reached_eof", &self.reached_eof)
            .finish()
    }
}

impl<R: Read> Utf8Source<R> {
    /// Creates a source decoding the UTF-8 data provided by `reader`
    pub fn new(reader: R) -> Self {
        Utf8Source {
            reader,
            buf: [0; READER_BUF_SIZE],
            buf_pos: 0,
            buf_end_pos: 0,
            reached_eof: false,
        }
    }

    /// Returns the underlying reader
    ///
    /// Due to internal buffering the reader might have been advanced further than the
    /// characters returned by this source.
    pub fn into_inner(self) -> R {
        self.reader
    }

    /// Refills the buffer; returns `false` if the end of the input has been reached
    fn fill_buffer(&mut self) -> Result<bool, IoError> {
        if self.reached_eof {
            return Ok(false);
        }
        debug_assert!(self.buf_pos >= self.buf_end_pos);

        let read_bytes_count = loop {
            match self.reader.read(&mut self.buf) {
                Ok(read_bytes_count) => break read_bytes_count,
                // Retry if interrupted
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        };
        self.buf_pos = 0;
        self.buf_end_pos = read_bytes_count;
        if read_bytes_count == 0 {
            self.reached_eof = true;
            Ok(false)
        } else {
            Ok(true)
        }
    }

    fn read_byte(&mut self) -> Result<Option<u8>, IoError> {
        if self.buf_pos >= self.buf_end_pos && !self.fill_buffer()? {
            return Ok(None);
        }
        let byte = self.buf[self.buf_pos];
        self.buf_pos += 1;
        Ok(Some(byte))
    }
}

fn invalid_utf8_err() -> IoError {
    IoError::new(ErrorKind::InvalidData, "invalid UTF-8 data")
}

impl<R: Read> CharSource for Utf8Source<R> {
    fn read_char(&mut self) -> Result<Option<char>, IoError> {
        let byte0 = match self.read_byte()? {
            None => return Ok(None),
            Some(byte0) => byte0,
        };
        // Fast path for ASCII
        if byte0 <= 0x7F {
            return Ok(Some(char::from(byte0)));
        }

        let len = utf8::char_len(byte0).ok_or_else(invalid_utf8_err)?;
        let mut bytes = [0_u8; utf8::MAX_BYTES_PER_CHAR];
        bytes[0] = byte0;
        for b in &mut bytes[1..len] {
            // End of input in the middle of a multi-byte char is malformed UTF-8 as well
            *b = self.read_byte()?.ok_or_else(invalid_utf8_err)?;
        }
        utf8::decode_char(&bytes[..len])
            .map(Some)
            .ok_or_else(invalid_utf8_err)
    }
}
