use std::collections::HashMap;
use std::io::Read;

use crate::error::Error;
use crate::headers::{is_tchar, RawHttpHeaders};
use crate::options::ParserOptions;
use crate::request::{RawHttpRequest, RequestLine};
use crate::response::{RawHttpResponse, StatusLine};
use crate::scanner::ByteScanner;
use crate::uri::{Uri, UriComponent};
use crate::version::HttpVersion;

/// The configurable parser for HTTP/1.x metadata: start lines, headers, and
/// request targets.
///
/// A parser holds nothing but its immutable options, so one value may be
/// shared freely between threads; each call works on its own byte source.
pub struct HttpMetadataParser {
    options: ParserOptions,
}

impl Default for HttpMetadataParser {
    fn default() -> Self {
        Self::new(ParserOptions::default())
    }
}

impl HttpMetadataParser {
    #[must_use]
    pub fn new(options: ParserOptions) -> Self {
        Self { options }
    }

    #[must_use]
    pub fn options(&self) -> &ParserOptions {
        &self.options
    }

    /// Parse a request line such as `GET /hello HTTP/1.1`.
    pub fn parse_request_line(&self, line: &str) -> Result<RequestLine, Error> {
        let mut scanner = self.scanner_for(line.as_bytes());
        self.read_request_line(&mut scanner)
    }

    /// Parse a status line such as `HTTP/1.1 200 OK`.
    pub fn parse_response_line(&self, line: &str) -> Result<StatusLine, Error> {
        let mut scanner = self.scanner_for(line.as_bytes());
        self.read_status_line(&mut scanner)
    }

    /// Parse a block of header field lines, raising header errors.
    ///
    /// Parsing stops at an empty line or at the end of the input; an empty
    /// input yields an empty container.
    pub fn parse_headers<T>(&self, text: T) -> Result<RawHttpHeaders, Error>
    where
        T: AsRef<[u8]>,
    {
        let mut scanner = self.scanner_for(text.as_ref());
        self.read_headers(&mut scanner, header_error_factory)
    }

    /// Parse a request target or URI reference, repairing illegal
    /// characters by percent-encoding them.
    pub fn parse_uri(&self, target: &str) -> Result<Uri, Error> {
        Uri::parse(target)
    }

    /// Split a raw query string into its keys and values.
    ///
    /// Pairs are split on `&`, then once on `=`.  A pair without `=` maps
    /// its key to no value at all, while `key=` maps it to one empty value.
    /// Duplicate keys accumulate their values in insertion order.  Nothing
    /// is percent-decoded.
    #[must_use]
    pub fn parse_query_string(&self, query: &str) -> HashMap<String, Vec<String>> {
        let mut map: HashMap<String, Vec<String>> = HashMap::new();
        for pair in query.split('&') {
            if pair.is_empty() {
                continue;
            }
            match pair.split_once('=') {
                Some((key, value)) => map
                    .entry(key.to_string())
                    .or_default()
                    .push(value.to_string()),
                None => {
                    map.entry(pair.to_string()).or_default();
                }
            }
        }
        map
    }

    /// Read the metadata of a request (start line and headers) from a byte
    /// source.  The body, if any, is left unread on the source.
    pub fn parse_request<R: Read>(&self, source: R) -> Result<RawHttpRequest, Error> {
        let mut scanner = ByteScanner::new(source, self.options.allow_new_line_without_return);
        let request_line = self.read_request_line(&mut scanner)?;
        let headers = self.read_headers(&mut scanner, header_error_factory)?;
        Ok(RawHttpRequest::new(request_line, headers))
    }

    /// Read the metadata of a response (status line and headers) from a byte
    /// source.  The body, if any, is left unread on the source.
    pub fn parse_response<R: Read>(&self, source: R) -> Result<RawHttpResponse, Error> {
        let mut scanner = ByteScanner::new(source, self.options.allow_new_line_without_return);
        let status_line = self.read_status_line(&mut scanner)?;
        let headers = self.read_headers(&mut scanner, header_error_factory)?;
        Ok(RawHttpResponse::new(status_line, headers))
    }

    /// Read a request line from an open scanner.
    pub fn read_request_line<R: Read>(
        &self,
        scanner: &mut ByteScanner<R>,
    ) -> Result<RequestLine, Error> {
        let line = self.read_start_line(scanner)?;
        let line_number = scanner.line_number();
        let tokens: Vec<&[u8]> = line.split(|&byte| byte == b' ').collect();

        let method = tokens[0];
        if method.is_empty() {
            return Err(request_error("Invalid request line", line_number));
        }
        if let Some(index) = method.iter().position(|&byte| !is_tchar(byte)) {
            return Err(request_error(
                format!(
                    "Invalid method name: illegal character at index {}: '{}'",
                    index,
                    String::from_utf8_lossy(method)
                ),
                line_number,
            ));
        }

        if tokens.len() == 1 {
            return Err(request_error("Invalid request line", line_number));
        }
        // The last token is the version literal; everything between the
        // first and last space belongs to the target.
        let (target_bytes, version_token) = if tokens.len() == 2 {
            (tokens[1].to_vec(), None)
        } else {
            let middle = &tokens[1..tokens.len() - 1];
            (middle.join(&b' '), Some(tokens[tokens.len() - 1]))
        };

        if target_bytes.is_empty() {
            return Err(request_error("Missing request target", line_number));
        }
        if version_token.is_none() && !self.options.insert_http_version_if_missing {
            return Err(request_error("Missing HTTP version", line_number));
        }

        let target = String::from_utf8_lossy(&target_bytes).into_owned();
        if target.starts_with(' ') {
            // Two consecutive spaces after the method, rejected even when
            // illegal start-line characters are tolerated.
            let cause = Error::InvalidRequestTarget {
                component: UriComponent::Authority,
                index: 0,
                snippet: target,
            };
            return Err(request_error(
                format!("Invalid request target: {}", cause),
                line_number,
            ));
        }

        let uri = Uri::parse_request_target(
            &target,
            self.options.allow_illegal_start_line_characters,
        )
        .map_err(|cause| {
            request_error(format!("Invalid request target: {}", cause), line_number)
        })?;

        let http_version = match version_token {
            Some(token) => HttpVersion::parse(&String::from_utf8_lossy(token), line_number)?,
            None => HttpVersion::Http11,
        };

        let method = String::from_utf8_lossy(method).into_owned();
        Ok(RequestLine::new(method, uri, http_version))
    }

    /// Read a status line from an open scanner.
    pub fn read_status_line<R: Read>(
        &self,
        scanner: &mut ByteScanner<R>,
    ) -> Result<StatusLine, Error> {
        let line = self.read_start_line(scanner)?;
        let line_number = scanner.line_number();
        let text = String::from_utf8_lossy(&line).into_owned();
        if text.trim().is_empty() {
            return Err(request_error("Invalid status line", line_number));
        }

        let (first, rest) = match text.split_once(' ') {
            Some((first, rest)) => (first, rest),
            None => (text.as_str(), ""),
        };
        let (version_token, code_and_reason) = if first.starts_with("HTTP/") {
            (Some(first), rest)
        } else if self.options.insert_http_version_if_missing {
            (None, text.as_str())
        } else {
            return Err(request_error("Missing HTTP version", line_number));
        };
        let http_version = match version_token {
            Some(token) => HttpVersion::parse(token, line_number)?,
            None => HttpVersion::Http11,
        };

        let (code_token, reason_phrase) = match code_and_reason.split_once(' ') {
            Some((code, reason)) => (code, reason),
            None => (code_and_reason, ""),
        };
        if code_token.is_empty() {
            return Err(request_error("Invalid status line", line_number));
        }
        let status_code = code_token
            .parse::<u16>()
            .ok()
            .filter(|code| *code <= 999)
            .ok_or_else(|| request_error("Invalid status code", line_number))?;

        Ok(StatusLine::new(
            http_version,
            status_code,
            reason_phrase.to_string(),
        ))
    }

    /// Read header field lines from an open scanner until an empty line or
    /// the end of the input, raising failures through `make_error`.
    pub fn read_headers<R, F>(
        &self,
        scanner: &mut ByteScanner<R>,
        make_error: F,
    ) -> Result<RawHttpHeaders, Error>
    where
        R: Read,
        F: Fn(String, usize) -> Error,
    {
        let mut builder = RawHttpHeaders::builder();
        loop {
            let line = match scanner.read_line(usize::MAX, &make_error)? {
                Some(line) => line,
                None => break,
            };
            if line.is_empty() {
                break;
            }
            let line_number = scanner.line_number();

            let (name, value) = match line.iter().position(|&byte| byte == b':') {
                Some(colon) => (&line[..colon], &line[colon + 1..]),
                None => (&line[..], &line[line.len()..]),
            };

            if name.len() > self.options.max_header_name_length {
                return Err(make_error("Header name is too long".to_string(), line_number));
            }
            if name.is_empty() || name.iter().any(|&byte| !is_tchar(byte)) {
                return Err(make_error(
                    format!(
                        "Illegal character in HTTP header name: '{}'",
                        latin1_string(name)
                    ),
                    line_number,
                ));
            }

            let value = trim_whitespace(value);
            if value.len() > self.options.max_header_value_length {
                return Err(make_error(
                    "Header value is too long".to_string(),
                    line_number,
                ));
            }
            if value.iter().any(|&byte| !is_legal_value_byte(byte)) {
                return Err(make_error(
                    format!(
                        "Illegal character in HTTP header value: '{}'",
                        latin1_string(value)
                    ),
                    line_number,
                ));
            }

            builder = builder.with(latin1_string(name), latin1_string(value));
        }
        let headers = builder.build();
        if let Some(validator) = &self.options.header_validator {
            validator(&headers)?;
        }
        Ok(headers)
    }

    /// Pull the start line, discarding one leading empty line when the
    /// options ask for it.
    fn read_start_line<R: Read>(&self, scanner: &mut ByteScanner<R>) -> Result<Vec<u8>, Error> {
        let line = match scanner.read_line(usize::MAX, &request_error_factory)? {
            Some(line) => line,
            None => return Err(request_error("No content", scanner.line_number())),
        };
        if line.is_empty() && self.options.ignore_leading_empty_line {
            match scanner.read_line(usize::MAX, &request_error_factory)? {
                Some(next) => Ok(next),
                None => Err(request_error("No content", scanner.line_number())),
            }
        } else {
            Ok(line)
        }
    }

    fn scanner_for<'a>(&self, bytes: &'a [u8]) -> ByteScanner<&'a [u8]> {
        ByteScanner::new(bytes, self.options.allow_new_line_without_return)
    }
}

fn request_error(message: impl Into<String>, line_number: usize) -> Error {
    Error::InvalidHttpRequest {
        message: message.into(),
        line_number,
    }
}

fn request_error_factory(message: String, line_number: usize) -> Error {
    Error::InvalidHttpRequest {
        message,
        line_number,
    }
}

fn header_error_factory(message: String, line_number: usize) -> Error {
    Error::InvalidHttpHeader {
        message,
        line_number,
    }
}

/// Interpret bytes as ISO-8859-1 text, mapping each byte to the code point
/// of the same value.
fn latin1_string(bytes: &[u8]) -> String {
    bytes.iter().map(|&byte| char::from(byte)).collect()
}

fn trim_whitespace(bytes: &[u8]) -> &[u8] {
    let start = bytes
        .iter()
        .position(|&byte| byte != b' ' && byte != b'\t')
        .unwrap_or(bytes.len());
    let end = bytes
        .iter()
        .rposition(|&byte| byte != b' ' && byte != b'\t')
        .map_or(start, |index| index + 1);
    &bytes[start..end]
}

fn is_legal_value_byte(byte: u8) -> bool {
    byte == b'\t' || (0x20..=0x7E).contains(&byte) || byte >= 0x80
}
