//! Byte-faithful parsing of HTTP/1.x metadata.
//!
//! This crate parses request lines, status lines, headers, and request
//! targets exactly as they appear on the wire, with configurable leniency
//! toward the slightly-off messages real clients and servers produce.
//! Headers keep their original casing and insertion order while supporting
//! case-insensitive lookup, and re-serializing a parsed message yields the
//! bytes it was parsed from.
//!
//! ```rust
//! use httpwire::HttpMetadataParser;
//!
//! # fn main() -> Result<(), httpwire::Error> {
//! let parser = HttpMetadataParser::default();
//! let line = parser.parse_request_line("GET /hello.txt")?;
//! assert_eq!("GET /hello.txt HTTP/1.1", line.to_string());
//!
//! let headers = parser.parse_headers("X-Color: red\r\nX-Color: blue\r\n")?;
//! assert_eq!(vec!["red", "blue"], headers.get("x-color"));
//! # Ok(())
//! # }
//! ```

#![warn(clippy::pedantic)]
#![allow(clippy::non_ascii_literal)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::module_name_repetitions)]

mod body;
mod chunked;
mod coding;
mod error;
mod headers;
mod options;
mod parser;
mod request;
mod response;
mod scanner;
mod uri;
mod version;

pub use crate::body::{BodyDecoder, HttpMessageBody, LazyBodyReader};
pub use crate::chunked::ChunkedDecoder;
pub use crate::coding::{decode_body, decode_body_as_text};
pub use crate::error::Error;
pub use crate::headers::{HeadersBuilder, RawHttpHeaders};
pub use crate::options::{HeaderValidator, ParserOptions};
pub use crate::parser::HttpMetadataParser;
pub use crate::request::{RawHttpRequest, RequestLine};
pub use crate::response::{RawHttpResponse, StatusLine};
pub use crate::scanner::ByteScanner;
pub use crate::uri::{Uri, UriComponent};
pub use crate::version::HttpVersion;

// This is the character sequence corresponding to a carriage return (CR)
// followed by a line feed (LF), which officially delimits each line of an
// HTTP message.
pub(crate) const CRLF: &str = "\r\n";
