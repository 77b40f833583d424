use std::io::{self, Read};

use crate::error::Error;

/// A thin stateful reader over a byte source.
///
/// The scanner hands out one byte at a time, supports a single byte of
/// look-ahead, tracks the number of the line currently being read, and knows
/// how HTTP terminates its lines: a carriage-return line-feed pair, or a bare
/// line-feed when the scanner was built to accept one.  A bare
/// carriage-return is never a terminator and stays part of the line.
pub struct ByteScanner<R> {
    source: R,
    peeked: Option<u8>,
    line_number: usize,
    allow_new_line_without_return: bool,
}

impl<R: Read> ByteScanner<R> {
    #[must_use]
    pub fn new(source: R, allow_new_line_without_return: bool) -> Self {
        Self {
            source,
            peeked: None,
            line_number: 0,
            allow_new_line_without_return,
        }
    }

    /// The number of the line most recently started, 1-based.  0 before any
    /// byte has been read.
    #[must_use]
    pub fn line_number(&self) -> usize {
        self.line_number
    }

    /// Consume and return the next byte, or `None` at end of input.
    pub fn read_byte(&mut self) -> Result<Option<u8>, Error> {
        if let Some(byte) = self.peeked.take() {
            return Ok(Some(byte));
        }
        self.next_from_source()
    }

    /// Look at the next byte without consuming it.
    pub fn peek(&mut self) -> Result<Option<u8>, Error> {
        if self.peeked.is_none() {
            self.peeked = self.next_from_source()?;
        }
        Ok(self.peeked)
    }

    /// Fill `buffer` with raw bytes, honoring any pending peeked byte.  Used
    /// by body readers that continue from where line scanning stopped.
    pub fn read_into(&mut self, buffer: &mut [u8]) -> io::Result<usize> {
        if buffer.is_empty() {
            return Ok(0);
        }
        if let Some(byte) = self.peeked.take() {
            buffer[0] = byte;
            if buffer.len() == 1 {
                return Ok(1);
            }
            let read = self.source.read(&mut buffer[1..])?;
            return Ok(read + 1);
        }
        self.source.read(buffer)
    }

    /// Read the bytes up to (but not including) the next line terminator and
    /// consume the terminator.
    ///
    /// Returns `None` when the source is exhausted before any byte is read;
    /// a line cut short by end of input is returned as-is.  A line longer
    /// than `max_length` bytes fails through `make_error`, as does a bare
    /// line-feed when the scanner does not accept one.
    pub fn read_line<F>(&mut self, max_length: usize, make_error: &F) -> Result<Option<Vec<u8>>, Error>
    where
        F: Fn(String, usize) -> Error,
    {
        let first = match self.read_byte()? {
            Some(byte) => byte,
            None => return Ok(None),
        };
        self.line_number += 1;
        let mut line = Vec::new();
        let mut byte = first;
        loop {
            match byte {
                b'\r' => {
                    if self.peek()? == Some(b'\n') {
                        self.peeked = None;
                        return Ok(Some(line));
                    }
                    line.push(b'\r');
                }
                b'\n' => {
                    if self.allow_new_line_without_return {
                        return Ok(Some(line));
                    }
                    return Err(make_error(
                        "Illegal new-line character without preceding return".to_string(),
                        self.line_number,
                    ));
                }
                other => line.push(other),
            }
            if line.len() > max_length {
                return Err(make_error("Line is too long".to_string(), self.line_number));
            }
            byte = match self.read_byte()? {
                Some(next) => next,
                None => return Ok(Some(line)),
            };
        }
    }

    fn next_from_source(&mut self) -> Result<Option<u8>, Error> {
        let mut buffer = [0_u8; 1];
        loop {
            match self.source.read(&mut buffer) {
                Ok(0) => return Ok(None),
                Ok(_) => return Ok(Some(buffer[0])),
                Err(source) if source.kind() == io::ErrorKind::Interrupted => continue,
                Err(source) => return Err(Error::Io(source)),
            }
        }
    }
}
