use std::fmt;
use std::fs;
use std::io::{self, Cursor, Read};
use std::path::PathBuf;

use flate2::read::{DeflateDecoder, GzDecoder};

use crate::chunked::ChunkedDecoder;
use crate::error::Error;
use crate::headers::RawHttpHeaders;

/// An ordered chain of transfer and content encoding identifiers, listed in
/// the order they were applied to produce the wire body from the logical
/// body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BodyDecoder {
    encodings: Vec<String>,
}

impl BodyDecoder {
    #[must_use]
    pub fn new(encodings: Vec<String>) -> Self {
        Self { encodings }
    }

    #[must_use]
    pub fn encodings(&self) -> &[String] {
        &self.encodings
    }

    /// Wrap a reader over the wire bytes so that reading from the result
    /// yields the logical body, undoing the encodings in reverse order of
    /// application.
    pub fn decoding_reader(
        &self,
        input: Box<dyn Read + Send>,
    ) -> Result<Box<dyn Read + Send>, Error> {
        let mut reader = input;
        for encoding in self.encodings.iter().rev() {
            reader = match encoding.as_str() {
                "chunked" => Box::new(ChunkedDecoder::new(reader)),
                "gzip" | "x-gzip" => Box::new(GzDecoder::new(reader)),
                "deflate" => Box::new(DeflateDecoder::new(reader)),
                "identity" => reader,
                other => return Err(Error::UnknownEncoding(other.to_string())),
            };
        }
        Ok(reader)
    }

    /// Decode an in-memory wire body in one go.
    pub fn decode(&self, body: &[u8]) -> Result<Vec<u8>, Error> {
        let mut reader = self.decoding_reader(Box::new(Cursor::new(body.to_vec())))?;
        let mut decoded = Vec::new();
        reader
            .read_to_end(&mut decoded)
            .map_err(Error::BadContentEncoding)?;
        Ok(decoded)
    }
}

/// An HTTP message's body.
///
/// Each variant knows its optional content type, its content length when one
/// is knowable, and how to hand its bytes out as a one-shot
/// [`LazyBodyReader`].  Bodies whose wire form is encoded also carry the
/// [`BodyDecoder`] describing the encoding chain.
pub enum HttpMessageBody {
    /// Eager in-memory bytes.
    Bytes {
        content: Vec<u8>,
        content_type: Option<String>,
    },
    /// The contents of a file, opened only when the reader is first read.
    File {
        path: PathBuf,
        content_type: Option<String>,
    },
    /// A stream already carrying chunked transfer framing.
    Chunked {
        source: Box<dyn Read + Send>,
        content_type: Option<String>,
    },
    /// A body whose wire bytes are encoded with a chain of codings.
    Encoded {
        decoder: BodyDecoder,
        inner: Box<HttpMessageBody>,
    },
}

impl fmt::Debug for HttpMessageBody {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bytes {
                content,
                content_type,
            } => formatter
                .debug_struct("Bytes")
                .field("content", content)
                .field("content_type", content_type)
                .finish(),
            Self::File { path, content_type } => formatter
                .debug_struct("File")
                .field("path", path)
                .field("content_type", content_type)
                .finish(),
            Self::Chunked { content_type, .. } => formatter
                .debug_struct("Chunked")
                .field("source", &"<dyn Read>")
                .field("content_type", content_type)
                .finish(),
            Self::Encoded { decoder, inner } => formatter
                .debug_struct("Encoded")
                .field("decoder", decoder)
                .field("inner", inner)
                .finish(),
        }
    }
}

impl HttpMessageBody {
    #[must_use]
    pub fn bytes(content: Vec<u8>, content_type: Option<String>) -> Self {
        Self::Bytes {
            content,
            content_type,
        }
    }

    #[must_use]
    pub fn file(path: impl Into<PathBuf>, content_type: Option<String>) -> Self {
        Self::File {
            path: path.into(),
            content_type,
        }
    }

    #[must_use]
    pub fn chunked(source: Box<dyn Read + Send>, content_type: Option<String>) -> Self {
        Self::Chunked {
            source,
            content_type,
        }
    }

    #[must_use]
    pub fn encoded(inner: HttpMessageBody, decoder: BodyDecoder) -> Self {
        Self::Encoded {
            decoder,
            inner: Box::new(inner),
        }
    }

    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        match self {
            Self::Bytes { content_type, .. }
            | Self::File { content_type, .. }
            | Self::Chunked { content_type, .. } => content_type.as_deref(),
            Self::Encoded { inner, .. } => inner.content_type(),
        }
    }

    /// The content length, when it is knowable without consuming the body.
    #[must_use]
    pub fn content_length(&self) -> Option<u64> {
        match self {
            Self::Bytes { content, .. } => Some(content.len() as u64),
            Self::File { path, .. } => fs::metadata(path).ok().map(|metadata| metadata.len()),
            Self::Chunked { .. } | Self::Encoded { .. } => None,
        }
    }

    /// The decoder describing this body's encoding chain; empty when the
    /// bytes are already in their logical form.
    #[must_use]
    pub fn decoder(&self) -> BodyDecoder {
        match self {
            Self::Chunked { .. } => BodyDecoder::new(vec!["chunked".to_string()]),
            Self::Encoded { decoder, .. } => decoder.clone(),
            Self::Bytes { .. } | Self::File { .. } => BodyDecoder::default(),
        }
    }

    /// Derive the headers a message carrying this body should have.
    ///
    /// `Content-Type` and `Content-Length` are overwritten when the body
    /// knows them, and `Transfer-Encoding` is overwritten when the encoding
    /// chain is not empty.  An inherited `Content-Length` is deliberately
    /// not removed when `Transfer-Encoding` is set.
    #[must_use]
    pub fn headers_from(&self, headers: &RawHttpHeaders) -> RawHttpHeaders {
        let mut builder = headers.to_builder();
        if let Some(content_type) = self.content_type() {
            builder = builder.overwrite("Content-Type", content_type);
        }
        if let Some(length) = self.content_length() {
            builder = builder.overwrite("Content-Length", length.to_string());
        }
        let decoder = self.decoder();
        if !decoder.encodings().is_empty() {
            builder = builder.overwrite("Transfer-Encoding", decoder.encodings().join(","));
        }
        builder.build()
    }

    /// Turn this body into a one-shot reader over its wire bytes.
    ///
    /// Building the reader performs no I/O; a file is opened only when the
    /// reader is first read.
    #[must_use]
    pub fn to_body_reader(self) -> LazyBodyReader {
        match self {
            Self::Bytes { content, .. } => LazyBodyReader {
                state: ReaderState::Bytes(Cursor::new(content)),
            },
            Self::File { path, .. } => LazyBodyReader {
                state: ReaderState::File { path, open: None },
            },
            Self::Chunked { source, .. } => LazyBodyReader {
                state: ReaderState::Stream(source),
            },
            Self::Encoded { inner, .. } => inner.to_body_reader(),
        }
    }
}

/// A single-use forward stream over a body's bytes.  I/O is deferred to the
/// first read; reading consumes the source.
pub struct LazyBodyReader {
    state: ReaderState,
}

enum ReaderState {
    Bytes(Cursor<Vec<u8>>),
    File {
        path: PathBuf,
        open: Option<fs::File>,
    },
    Stream(Box<dyn Read + Send>),
}

impl LazyBodyReader {
    /// Drain the reader into memory.
    pub fn eager(mut self) -> io::Result<Vec<u8>> {
        let mut content = Vec::new();
        self.read_to_end(&mut content)?;
        Ok(content)
    }
}

impl Read for LazyBodyReader {
    fn read(&mut self, buffer: &mut [u8]) -> io::Result<usize> {
        match &mut self.state {
            ReaderState::Bytes(cursor) => cursor.read(buffer),
            ReaderState::File { path, open } => {
                if let Some(file) = open {
                    file.read(buffer)
                } else {
                    let mut file = fs::File::open(path)?;
                    let read = file.read(buffer)?;
                    *open = Some(file);
                    Ok(read)
                }
            }
            ReaderState::Stream(source) => source.read(buffer),
        }
    }
}

#[cfg(test)]
mod tests {

    use std::io::Write;

    use super::*;

    #[test]
    fn bytes_body_knows_its_length() {
        let body = HttpMessageBody::bytes(b"Hello, World!".to_vec(), None);
        assert_eq!(Some(13), body.content_length());
        assert_eq!(None, body.content_type());
        assert!(body.decoder().encodings().is_empty());
        assert_eq!(b"Hello, World!".to_vec(), body.to_body_reader().eager().unwrap());
    }

    #[test]
    fn file_body_defers_opening_until_read() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"file body").unwrap();
        let body = HttpMessageBody::file(file.path(), Some("text/plain".to_string()));
        assert_eq!(Some(9), body.content_length());
        let reader = body.to_body_reader();
        assert_eq!(b"file body".to_vec(), reader.eager().unwrap());
    }

    #[test]
    fn missing_file_surfaces_at_first_read() {
        let body = HttpMessageBody::file("/no/such/file", None);
        assert_eq!(None, body.content_length());
        let mut reader = body.to_body_reader();
        let mut buffer = [0_u8; 8];
        assert!(reader.read(&mut buffer).is_err());
    }

    #[test]
    fn chunked_body_reports_chunked_decoder() {
        let body = HttpMessageBody::chunked(Box::new(&b"0\r\n\r\n"[..]), None);
        assert_eq!(None, body.content_length());
        assert_eq!(&["chunked".to_string()], body.decoder().encodings());
    }

    #[test]
    fn headers_from_overwrites_derived_headers() {
        let headers = RawHttpHeaders::builder()
            .with("Content-Type", "text/html")
            .with("Content-Length", "999")
            .with("Host", "example.com")
            .build();
        let body = HttpMessageBody::bytes(b"hi".to_vec(), Some("text/plain".to_string()));
        let derived = body.headers_from(&headers);
        assert_eq!(vec!["text/plain"], derived.get("Content-Type"));
        assert_eq!(vec!["2"], derived.get("Content-Length"));
        assert_eq!(vec!["example.com"], derived.get("Host"));
    }

    #[test]
    fn headers_from_joins_encodings_without_spaces() {
        let inner = HttpMessageBody::bytes(b"wire".to_vec(), None);
        let body = HttpMessageBody::encoded(
            inner,
            BodyDecoder::new(vec!["chunked".to_string(), "gzip".to_string()]),
        );
        let derived = body.headers_from(&RawHttpHeaders::empty());
        assert_eq!(vec!["chunked,gzip"], derived.get("Transfer-Encoding"));
    }

    #[test]
    fn headers_from_keeps_inherited_content_length_with_transfer_encoding() {
        let headers = RawHttpHeaders::builder()
            .with("Content-Length", "42")
            .build();
        let body = HttpMessageBody::chunked(Box::new(&b"0\r\n\r\n"[..]), None);
        let derived = body.headers_from(&headers);
        assert_eq!(vec!["chunked"], derived.get("Transfer-Encoding"));
        assert_eq!(vec!["42"], derived.get("Content-Length"));
    }

    #[test]
    fn encoded_body_exposes_inner_content_type_and_wire_bytes() {
        let inner = HttpMessageBody::bytes(b"raw wire".to_vec(), Some("text/plain".to_string()));
        let body = HttpMessageBody::encoded(inner, BodyDecoder::new(vec!["gzip".to_string()]));
        assert_eq!(Some("text/plain"), body.content_type());
        assert_eq!(None, body.content_length());
        assert_eq!(b"raw wire".to_vec(), body.to_body_reader().eager().unwrap());
    }

    #[test]
    fn decoder_reverses_chunked_framing() {
        let decoder = BodyDecoder::new(vec!["chunked".to_string()]);
        let wire = b"4\r\nWiki\r\n5\r\npedia\r\n0\r\n\r\n";
        assert_eq!(b"Wikipedia".to_vec(), decoder.decode(wire).unwrap());
    }

    #[test]
    fn decoder_reverses_gzip() {
        let decoder = BodyDecoder::new(vec!["gzip".to_string()]);
        let wire: &[u8] = &[
            0x1F, 0x8B, 0x08, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x0A, 0xF3, 0x48, 0xCD, 0xC9,
            0xC9, 0xD7, 0x51, 0x08, 0xCF, 0x2F, 0xCA, 0x49, 0x51, 0x04, 0x00, 0xD0, 0xC3, 0x4A,
            0xEC, 0x0D, 0x00, 0x00, 0x00,
        ];
        assert_eq!(b"Hello, World!".to_vec(), decoder.decode(wire).unwrap());
    }

    #[test]
    fn decoder_rejects_unknown_encoding() {
        let decoder = BodyDecoder::new(vec!["zstd-custom".to_string()]);
        assert!(matches!(
            decoder.decode(b"anything"),
            Err(Error::UnknownEncoding(name)) if name == "zstd-custom"
        ));
    }
}
