use crate::uri::UriComponent;

/// This is the enumeration of all the different kinds of errors which this
/// crate generates.
///
/// The message text carried by the parsing variants is part of this crate's
/// public contract: it is what tests and callers match against, and it is
/// stable across releases.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A request or status line could not be parsed.  The line number is
    /// 1-based; it is 0 only when the input was completely empty.
    #[error("{message}")]
    InvalidHttpRequest {
        message: String,
        line_number: usize,
    },

    /// A header field line was malformed, contained an illegal character, or
    /// was rejected by the configured header validator.
    #[error("{message}({line_number})")]
    InvalidHttpHeader {
        message: String,
        line_number: usize,
    },

    /// A request target contained a character that is not legal in the URI
    /// component where it appeared.  The index is the 0-based byte offset of
    /// the character within that component; the snippet shows the input from
    /// the start of the component onwards.
    #[error("Illegal character in {component} at index {index}: '{snippet}'")]
    InvalidRequestTarget {
        component: UriComponent,
        index: usize,
        snippet: String,
    },

    /// A chunk size line in a chunked message body was not valid.
    #[error("invalid chunk size line")]
    InvalidChunkSize,

    /// Something other than a carriage-return and line-feed followed the data
    /// of a chunk.
    #[error("unexpected bytes at the end of a chunk")]
    InvalidChunkTerminator,

    /// An encoding chain named a coding this crate does not know how to
    /// reverse.
    #[error("unknown body encoding: {0}")]
    UnknownEncoding(String),

    /// There was an error attempting to decode the message body.
    #[error("unable to decode message body")]
    BadContentEncoding(#[source] std::io::Error),

    /// The underlying byte source failed.
    #[error("error reading from the byte source")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// The line number the error was raised on, for the variants which carry
    /// one.
    #[must_use]
    pub fn line_number(&self) -> Option<usize> {
        match self {
            Self::InvalidHttpRequest { line_number, .. }
            | Self::InvalidHttpHeader { line_number, .. } => Some(*line_number),
            _ => None,
        }
    }
}
