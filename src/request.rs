use std::fmt;
use std::io::{self, Write};

use crate::body::HttpMessageBody;
use crate::headers::RawHttpHeaders;
use crate::uri::Uri;
use crate::version::HttpVersion;
use crate::CRLF;

/// The first line of an HTTP request: method, target, and protocol version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestLine {
    method: String,
    uri: Uri,
    http_version: HttpVersion,
}

impl RequestLine {
    #[must_use]
    pub fn new(method: String, uri: Uri, http_version: HttpVersion) -> Self {
        Self {
            method,
            uri,
            http_version,
        }
    }

    #[must_use]
    pub fn method(&self) -> &str {
        &self.method
    }

    #[must_use]
    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    #[must_use]
    pub fn http_version(&self) -> HttpVersion {
        self.http_version
    }
}

impl fmt::Display for RequestLine {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{} {} {}", self.method, self.uri, self.http_version)
    }
}

/// An HTTP request: request line, headers, and an optional body value.
///
/// The metadata serializes byte-identically to how it would appear on the
/// wire; transferring the body bytes themselves is the concern of whoever
/// owns the connection.
#[derive(Debug)]
pub struct RawHttpRequest {
    request_line: RequestLine,
    headers: RawHttpHeaders,
    body: Option<HttpMessageBody>,
}

impl RawHttpRequest {
    #[must_use]
    pub fn new(request_line: RequestLine, headers: RawHttpHeaders) -> Self {
        Self {
            request_line,
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
            request_line: self.request_line,
            headers,
            body: Some(body),
        }
    }

    #[must_use]
    pub fn request_line(&self) -> &RequestLine {
        &self.request_line
    }

    #[must_use]
    pub fn headers(&self) -> &RawHttpHeaders {
        &self.headers
    }

    #[must_use]
    pub fn body(&self) -> Option<&HttpMessageBody> {
        self.body.as_ref()
    }

    /// Take the body out of the request, leaving the metadata behind.
    #[must_use]
    pub fn into_body(self) -> Option<HttpMessageBody> {
        self.body
    }

    /// Write the request metadata, terminated by the empty line that
    /// separates headers from any body.
    pub fn write_to<W: Write>(&self, mut output: W) -> io::Result<()> {
        write!(output, "{}{}{}{}", self.request_line, CRLF, self.headers, CRLF)
    }
}

impl fmt::Display for RawHttpRequest {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}{}{}{}", self.request_line, CRLF, self.headers, CRLF)
    }
}
