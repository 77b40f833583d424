use std::fmt;
use std::io::{self, Write};

use crate::body::HttpMessageBody;
use crate::headers::RawHttpHeaders;
use crate::version::HttpVersion;
use crate::CRLF;

/// The first line of an HTTP response: protocol version, status code, and
/// reason phrase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLine {
    http_version: HttpVersion,
    status_code: u16,
    reason_phrase: String,
}

impl StatusLine {
    #[must_use]
    pub fn new(http_version: HttpVersion, status_code: u16, reason_phrase: String) -> Self {
        Self {
            http_version,
            status_code,
            reason_phrase,
        }
    }

    #[must_use]
    pub fn http_version(&self) -> HttpVersion {
        self.http_version
    }

    #[must_use]
    pub fn status_code(&self) -> u16 {
        self.status_code
    }

    /// The reason phrase, taken verbatim from the wire; possibly empty.
    #[must_use]
    pub fn reason_phrase(&self) -> &str {
        &self.reason_phrase
    }
}

impl fmt::Display for StatusLine {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.reason_phrase.is_empty() {
            write!(formatter, "{} {}", self.http_version, self.status_code)
        } else {
            write!(
                formatter,
                "{} {} {}",
                self.http_version, self.status_code, self.reason_phrase
            )
        }
    }
}

/// An HTTP response: status line, headers, and an optional body value.
pub struct RawHttpResponse {
    status_line: StatusLine,
    headers: RawHttpHeaders,
    body: Option<HttpMessageBody>,
}

impl RawHttpResponse {
    #[must_use]
    pub fn new(status_line: StatusLine, headers: RawHttpHeaders) -> Self {
        Self {
            status_line,
            headers,
            body: None,
        }
    }

    /// Attach a body, deriving the `Content-Type`, `Content-Length`, and
    /// `Transfer-Encoding` headers the body implies.
    #[must_use]
    pub fn with_body(self, body: HttpMessageBody) -> Self {
        let headers = body.headers_from(&self.headers);
        Self {
            status_line: self.status_line,
            headers,
            body: Some(body),
        }
    }

    #[must_use]
    pub fn status_line(&self) -> &StatusLine {
        &self.status_line
    }

    #[must_use]
    pub fn headers(&self) -> &RawHttpHeaders {
        &self.headers
    }

    #[must_use]
    pub fn body(&self) -> Option<&HttpMessageBody> {
        self.body.as_ref()
    }

    /// Take the body out of the response, leaving the metadata behind.
    #[must_use]
    pub fn into_body(self) -> Option<HttpMessageBody> {
        self.body
    }

    /// Write the response metadata, terminated by the empty line that
    /// separates headers from any body.
    pub fn write_to<W: Write>(&self, mut output: W) -> io::Result<()> {
        write!(output, "{}{}{}{}", self.status_line, CRLF, self.headers, CRLF)
    }
}

impl fmt::Display for RawHttpResponse {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}{}{}{}", self.status_line, CRLF, self.headers, CRLF)
    }
}
