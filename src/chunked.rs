use std::io::{self, Read};

use crate::error::Error;
use crate::headers::RawHttpHeaders;
use crate::parser::HttpMetadataParser;
use crate::scanner::ByteScanner;

// A chunk size line carries a hex number and optional extensions; this is
// plenty for both.
const MAX_CHUNK_SIZE_LINE: usize = 1024;

/// A pull decoder for chunked transfer framing.
///
/// Reading yields the de-chunked data bytes.  After the terminal zero-size
/// chunk, any trailer field lines are parsed as headers and kept available
/// through [`ChunkedDecoder::trailer`].
pub struct ChunkedDecoder<R> {
    scanner: ByteScanner<R>,
    state: State,
    remaining: usize,
    trailer: Option<RawHttpHeaders>,
}

enum State {
    Size,
    Data,
    DataEnd,
    Trailer,
    Complete,
}

impl<R: Read> ChunkedDecoder<R> {
    #[must_use]
    pub fn new(source: R) -> Self {
        Self {
            scanner: ByteScanner::new(source, true),
            state: State::Size,
            remaining: 0,
            trailer: None,
        }
    }

    /// The trailer headers, available once the body has been read to its
    /// end.
    #[must_use]
    pub fn trailer(&self) -> Option<&RawHttpHeaders> {
        self.trailer.as_ref()
    }

    fn read_chunk_size(&mut self) -> Result<usize, Error> {
        let line = self
            .scanner
            .read_line(MAX_CHUNK_SIZE_LINE, &|_, _| Error::InvalidChunkSize)?
            .ok_or(Error::InvalidChunkSize)?;
        parse_chunk_size(&line)
    }

    fn read_chunk_terminator(&mut self) -> Result<(), Error> {
        if self.scanner.read_byte()? == Some(b'\r') && self.scanner.read_byte()? == Some(b'\n') {
            Ok(())
        } else {
            Err(Error::InvalidChunkTerminator)
        }
    }

    fn read_trailer(&mut self) -> Result<RawHttpHeaders, Error> {
        let parser = HttpMetadataParser::default();
        parser.read_headers(&mut self.scanner, |message, line_number| {
            Error::InvalidHttpHeader {
                message,
                line_number,
            }
        })
    }
}

impl<R: Read> Read for ChunkedDecoder<R> {
    fn read(&mut self, buffer: &mut [u8]) -> io::Result<usize> {
        loop {
            match self.state {
                State::Size => {
                    let size = self.read_chunk_size().map_err(to_io_error)?;
                    if size == 0 {
                        self.state = State::Trailer;
                    } else {
                        self.remaining = size;
                        self.state = State::Data;
                    }
                }
                State::Data => {
                    if buffer.is_empty() {
                        return Ok(0);
                    }
                    let want = buffer.len().min(self.remaining);
                    let read = self.scanner.read_into(&mut buffer[..want])?;
                    if read == 0 {
                        return Err(io::Error::new(
                            io::ErrorKind::UnexpectedEof,
                            "chunk data ended early",
                        ));
                    }
                    self.remaining -= read;
                    if self.remaining == 0 {
                        self.state = State::DataEnd;
                    }
                    return Ok(read);
                }
                State::DataEnd => {
                    self.read_chunk_terminator().map_err(to_io_error)?;
                    self.state = State::Size;
                }
                State::Trailer => {
                    let trailer = self.read_trailer().map_err(to_io_error)?;
                    self.trailer = Some(trailer);
                    self.state = State::Complete;
                }
                State::Complete => return Ok(0),
            }
        }
    }
}

fn parse_chunk_size(line: &[u8]) -> Result<usize, Error> {
    let text = std::str::from_utf8(line).map_err(|_| Error::InvalidChunkSize)?;
    // extensions after ';' are tolerated and ignored
    let size_text = text.split(';').next().unwrap_or("").trim();
    usize::from_str_radix(size_text, 16).map_err(|_| Error::InvalidChunkSize)
}

fn to_io_error(error: Error) -> io::Error {
    match error {
        Error::Io(source) => source,
        other => io::Error::new(io::ErrorKind::InvalidData, other),
    }
}
