use std::fmt;

use percent_encoding::{percent_decode, percent_encode_byte};

use crate::error::Error;

/// The URI component inside which an illegal character was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UriComponent {
    Authority,
    Path,
    Query,
    Fragment,
}

impl fmt::Display for UriComponent {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(match self {
            Self::Authority => "authority",
            Self::Path => "path",
            Self::Query => "query",
            Self::Fragment => "fragment",
        })
    }
}

/// A parsed request target or URI reference.
///
/// The `raw_*` accessors return the stored bytes exactly as they appeared on
/// the wire (after any percent-encoding repair); `path`, `query`, and
/// `fragment` percent-decode for display.  A bracketed IPv6 host is kept
/// verbatim, brackets included.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Uri {
    scheme: Option<String>,
    userinfo: Option<String>,
    host: Option<String>,
    port: Option<u16>,
    raw_path: String,
    raw_query: Option<String>,
    raw_fragment: Option<String>,
}

impl Uri {
    /// Parse a request target or URI reference, percent-encoding any bytes
    /// that are not legal in the component where they appear.
    ///
    /// A target that has no scheme and does not begin with `/` is taken to
    /// be in authority form, and the scheme is inferred to be `http`.
    pub fn parse(target: &str) -> Result<Self, Error> {
        Self::parse_request_target(target, true)
    }

    /// Parse a request target, repairing illegal characters only when
    /// `repair` is set; otherwise they are reported as errors.
    pub(crate) fn parse_request_target(target: &str, repair: bool) -> Result<Self, Error> {
        if repair {
            decompose(&repair_target(target))
        } else {
            decompose(target)
        }
    }

    #[must_use]
    pub fn scheme(&self) -> Option<&str> {
        self.scheme.as_deref()
    }

    #[must_use]
    pub fn userinfo(&self) -> Option<&str> {
        self.userinfo.as_deref()
    }

    #[must_use]
    pub fn host(&self) -> Option<&str> {
        self.host.as_deref()
    }

    /// The port, or `None` when the target did not name one.
    #[must_use]
    pub fn port(&self) -> Option<u16> {
        self.port
    }

    /// The path exactly as stored; possibly empty.
    #[must_use]
    pub fn raw_path(&self) -> &str {
        &self.raw_path
    }

    #[must_use]
    pub fn raw_query(&self) -> Option<&str> {
        self.raw_query.as_deref()
    }

    #[must_use]
    pub fn raw_fragment(&self) -> Option<&str> {
        self.raw_fragment.as_deref()
    }

    /// The path, percent-decoded for display.
    #[must_use]
    pub fn path(&self) -> String {
        decode(&self.raw_path)
    }

    #[must_use]
    pub fn query(&self) -> Option<String> {
        self.raw_query.as_deref().map(decode)
    }

    #[must_use]
    pub fn fragment(&self) -> Option<String> {
        self.raw_fragment.as_deref().map(decode)
    }
}

impl fmt::Display for Uri {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(scheme) = &self.scheme {
            write!(formatter, "{}://", scheme)?;
            if let Some(userinfo) = &self.userinfo {
                write!(formatter, "{}@", userinfo)?;
            }
            if let Some(host) = &self.host {
                formatter.write_str(host)?;
            }
            if let Some(port) = self.port {
                write!(formatter, ":{}", port)?;
            }
        }
        formatter.write_str(&self.raw_path)?;
        if let Some(query) = &self.raw_query {
            write!(formatter, "?{}", query)?;
        }
        if let Some(fragment) = &self.raw_fragment {
            write!(formatter, "#{}", fragment)?;
        }
        Ok(())
    }
}

fn decode(text: &str) -> String {
    percent_decode(text.as_bytes()).decode_utf8_lossy().into_owned()
}

fn decompose(target: &str) -> Result<Uri, Error> {
    // asterisk-form target, as in `OPTIONS * HTTP/1.1`
    if target == "*" {
        return Ok(Uri {
            raw_path: "*".to_string(),
            ..Uri::default()
        });
    }

    let scheme_boundary = scheme_end(target);
    let mut scheme = scheme_boundary.map(|end| target[..end].to_string());
    let after_scheme = scheme_boundary.map_or(0, |end| end + 3);

    let has_authority = scheme.is_some() || !target.starts_with('/');
    let rest = &target[after_scheme..];
    let authority_length = if has_authority {
        rest.find(['/', '?', '#']).unwrap_or(rest.len())
    } else {
        0
    };
    let authority = &rest[..authority_length];
    let authority_start = after_scheme;

    let path_start = authority_start + authority_length;
    let after_authority = &target[path_start..];
    let path_length = after_authority.find(['?', '#']).unwrap_or(after_authority.len());
    let raw_path = &after_authority[..path_length];

    let tail = &target[path_start + path_length..];
    let mut query: Option<(&str, usize)> = None;
    let mut fragment: Option<(&str, usize)> = None;
    if let Some(stripped) = tail.strip_prefix('?') {
        let query_start = path_start + path_length + 1;
        if let Some(hash) = stripped.find('#') {
            query = Some((&stripped[..hash], query_start));
            fragment = Some((&stripped[hash + 1..], query_start + hash + 1));
        } else {
            query = Some((stripped, query_start));
        }
    } else if let Some(stripped) = tail.strip_prefix('#') {
        fragment = Some((stripped, path_start + path_length + 1));
    }

    if has_authority {
        check_component(
            authority,
            authority_start,
            target,
            UriComponent::Authority,
            is_authority_byte,
        )?;
    }
    check_component(raw_path, path_start, target, UriComponent::Path, is_path_byte)?;
    if let Some((text, start)) = query {
        check_component(text, start, target, UriComponent::Query, is_query_byte)?;
    }
    if let Some((text, start)) = fragment {
        check_component(text, start, target, UriComponent::Fragment, is_query_byte)?;
    }

    let (userinfo, host, port) = if has_authority && !authority.is_empty() {
        let parsed = parse_authority(authority, authority_start, target)?;
        if scheme.is_none() {
            scheme = Some("http".to_string());
        }
        parsed
    } else {
        (None, None, None)
    };

    Ok(Uri {
        scheme,
        userinfo,
        host,
        port,
        raw_path: raw_path.to_string(),
        raw_query: query.map(|(text, _)| text.to_string()),
        raw_fragment: fragment.map(|(text, _)| text.to_string()),
    })
}

/// Byte offset of the end of the scheme, when the target begins with a valid
/// scheme followed by `://`.
fn scheme_end(target: &str) -> Option<usize> {
    let end = target.find("://")?;
    let candidate = target[..end].as_bytes();
    let first = *candidate.first()?;
    if first.is_ascii_alphabetic() && candidate.iter().all(|&byte| is_scheme_byte(byte)) {
        Some(end)
    } else {
        None
    }
}

fn check_component(
    component: &str,
    start: usize,
    target: &str,
    which: UriComponent,
    allowed: fn(u8) -> bool,
) -> Result<(), Error> {
    for (index, byte) in component.bytes().enumerate() {
        if !allowed(byte) {
            return Err(Error::InvalidRequestTarget {
                component: which,
                index,
                snippet: target[start..].to_string(),
            });
        }
    }
    Ok(())
}

type AuthorityParts = (Option<String>, Option<String>, Option<u16>);

fn parse_authority(authority: &str, start: usize, target: &str) -> Result<AuthorityParts, Error> {
    let illegal = |offset: usize| Error::InvalidRequestTarget {
        component: UriComponent::Authority,
        index: offset,
        snippet: target[start..].to_string(),
    };

    let (userinfo, host_offset) = match authority.find('@') {
        Some(at) => {
            let userinfo = &authority[..at];
            // userinfo may contain a single ':'
            if let Some(second) = second_colon(userinfo) {
                return Err(illegal(second));
            }
            (Some(userinfo.to_string()), at + 1)
        }
        None => (None, 0),
    };
    let host_port = &authority[host_offset..];

    let (host, port_text, port_offset) = if host_port.starts_with('[') {
        match host_port.find(']') {
            Some(close) => {
                let host = &host_port[..=close];
                let after = &host_port[close + 1..];
                if after.is_empty() {
                    (host, None, 0)
                } else if let Some(port) = after.strip_prefix(':') {
                    (host, Some(port), host_offset + close + 2)
                } else {
                    return Err(illegal(host_offset + close + 1));
                }
            }
            None => return Err(illegal(host_offset)),
        }
    } else {
        match host_port.rfind(':') {
            Some(colon) => (
                &host_port[..colon],
                Some(&host_port[colon + 1..]),
                host_offset + colon + 1,
            ),
            None => (host_port, None, 0),
        }
    };

    if !host.starts_with('[') {
        for (index, byte) in host.bytes().enumerate() {
            if !is_registered_name_byte(byte) {
                return Err(illegal(host_offset + index));
            }
        }
    }

    let port = match port_text {
        None | Some("") => None,
        Some(port_text) => {
            for (index, byte) in port_text.bytes().enumerate() {
                if !byte.is_ascii_digit() {
                    return Err(illegal(port_offset + index));
                }
            }
            match port_text.parse::<u16>() {
                Ok(port) => Some(port),
                Err(_) => return Err(illegal(port_offset)),
            }
        }
    };

    let host = if host.is_empty() {
        None
    } else {
        Some(host.to_string())
    };
    Ok((userinfo, host, port))
}

fn second_colon(userinfo: &str) -> Option<usize> {
    let first = userinfo.find(':')?;
    userinfo[first + 1..]
        .find(':')
        .map(|second| first + 1 + second)
}

enum RepairState {
    Authority,
    Path,
    Query,
    Fragment,
}

/// Percent-encode every byte that is not legal in the component it lies in,
/// leaving existing escapes and component separators alone.
///
/// Component tracking is a single forward scan: a `?` seen in the authority
/// or path starts the query, and a `#` seen there starts the fragment.  A
/// `#` seen once inside the query is encoded rather than treated as a
/// fragment delimiter, and a `?` inside the fragment stays as it is.
fn repair_target(target: &str) -> String {
    let mut repaired = String::with_capacity(target.len());
    let mut state;
    let start = match scheme_end(target) {
        Some(end) => {
            repaired.push_str(&target[..end + 3]);
            state = RepairState::Authority;
            end + 3
        }
        None if target.starts_with('/') => {
            state = RepairState::Path;
            0
        }
        None => {
            state = RepairState::Authority;
            0
        }
    };
    for &byte in target[start..].as_bytes() {
        match state {
            RepairState::Authority => match byte {
                b'/' => {
                    state = RepairState::Path;
                    repaired.push('/');
                }
                b'?' => {
                    state = RepairState::Query;
                    repaired.push('?');
                }
                b'#' => {
                    state = RepairState::Fragment;
                    repaired.push('#');
                }
                byte if is_authority_byte(byte) => repaired.push(char::from(byte)),
                byte => repaired.push_str(percent_encode_byte(byte)),
            },
            RepairState::Path => match byte {
                b'?' => {
                    state = RepairState::Query;
                    repaired.push('?');
                }
                b'#' => {
                    state = RepairState::Fragment;
                    repaired.push('#');
                }
                byte if is_path_byte(byte) => repaired.push(char::from(byte)),
                byte => repaired.push_str(percent_encode_byte(byte)),
            },
            RepairState::Query | RepairState::Fragment => match byte {
                byte if is_query_byte(byte) => repaired.push(char::from(byte)),
                byte => repaired.push_str(percent_encode_byte(byte)),
            },
        }
    }
    repaired
}

fn is_scheme_byte(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || matches!(byte, b'+' | b'-' | b'.')
}

fn is_unreserved_byte(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'.' | b'_' | b'~')
}

fn is_sub_delimiter_byte(byte: u8) -> bool {
    matches!(
        byte,
        b'!' | b'$' | b'&' | b'\'' | b'(' | b')' | b'*' | b'+' | b',' | b';' | b'='
    )
}

fn is_registered_name_byte(byte: u8) -> bool {
    is_unreserved_byte(byte) || is_sub_delimiter_byte(byte) || byte == b'%'
}

fn is_authority_byte(byte: u8) -> bool {
    is_registered_name_byte(byte) || matches!(byte, b':' | b'@' | b'[' | b']')
}

fn is_pchar_byte(byte: u8) -> bool {
    is_unreserved_byte(byte) || is_sub_delimiter_byte(byte) || matches!(byte, b':' | b'@' | b'%')
}

fn is_path_byte(byte: u8) -> bool {
    is_pchar_byte(byte) || byte == b'/'
}

fn is_query_byte(byte: u8) -> bool {
    is_path_byte(byte) || byte == b'?'
}

#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    fn parse_origin_form() {
        let uri = Uri::parse("/hello.txt").unwrap();
        assert_eq!(None, uri.scheme());
        assert_eq!(None, uri.host());
        assert_eq!("/hello.txt", uri.raw_path());
        assert_eq!(None, uri.raw_query());
        assert_eq!("/hello.txt", uri.to_string());
    }

    #[test]
    fn parse_origin_form_with_query_and_fragment() {
        let uri = Uri::parse("/search?q=rust#results").unwrap();
        assert_eq!("/search", uri.raw_path());
        assert_eq!(Some("q=rust"), uri.raw_query());
        assert_eq!(Some("results"), uri.raw_fragment());
        assert_eq!("/search?q=rust#results", uri.to_string());
    }

    #[test]
    fn parse_absolute_form() {
        let uri = Uri::parse("http://user:pw@example.com:8080/a/b?x=1#top").unwrap();
        assert_eq!(Some("http"), uri.scheme());
        assert_eq!(Some("user:pw"), uri.userinfo());
        assert_eq!(Some("example.com"), uri.host());
        assert_eq!(Some(8080), uri.port());
        assert_eq!("/a/b", uri.raw_path());
        assert_eq!(Some("x=1"), uri.raw_query());
        assert_eq!(Some("top"), uri.raw_fragment());
        assert_eq!("http://user:pw@example.com:8080/a/b?x=1#top", uri.to_string());
    }

    #[test]
    fn asterisk_form_is_kept_as_path() {
        let uri = Uri::parse("*").unwrap();
        assert_eq!(None, uri.scheme());
        assert_eq!(None, uri.host());
        assert_eq!("*", uri.raw_path());
        assert_eq!("*", uri.to_string());
    }

    #[test]
    fn authority_form_infers_http_scheme() {
        let uri = Uri::parse("example.com:8080").unwrap();
        assert_eq!(Some("http"), uri.scheme());
        assert_eq!(Some("example.com"), uri.host());
        assert_eq!(Some(8080), uri.port());
        assert_eq!("", uri.raw_path());
    }

    #[test]
    fn bracketed_ipv6_host_is_kept_verbatim() {
        let uri = Uri::parse("[::8a2e:370:7334]:43").unwrap();
        assert_eq!(Some("http"), uri.scheme());
        assert_eq!(Some("[::8a2e:370:7334]"), uri.host());
        assert_eq!(Some(43), uri.port());
    }

    #[test]
    fn repairs_illegal_path_bytes_and_keeps_query() {
        let uri = Uri::parse("/id/{0x0}?encoded=%2F%2F%2E%2E").unwrap();
        assert_eq!("/id/%7B0x0%7D", uri.raw_path());
        assert_eq!(Some("encoded=%2F%2F%2E%2E"), uri.raw_query());
    }

    #[test]
    fn repairs_space_in_path() {
        let uri = Uri::parse("/hi there").unwrap();
        assert_eq!("/hi%20there", uri.raw_path());
    }

    #[test]
    fn repair_encodes_hash_inside_query() {
        let uri = Uri::parse("/p?color=#aabbcc").unwrap();
        assert_eq!(Some("color=%23aabbcc"), uri.raw_query());
        assert_eq!(None, uri.raw_fragment());
    }

    #[test]
    fn repair_leaves_question_mark_in_fragment() {
        let uri = Uri::parse("/p#what?").unwrap();
        assert_eq!(Some("what?"), uri.raw_fragment());
    }

    #[test]
    fn strict_rejects_space_in_path() {
        let error = Uri::parse_request_target("/hi there", false).unwrap_err();
        assert_eq!(
            "Illegal character in path at index 3: '/hi there'",
            error.to_string()
        );
    }

    #[test]
    fn strict_rejects_leading_space_as_authority() {
        let error = Uri::parse_request_target(" /", false).unwrap_err();
        assert_eq!(
            "Illegal character in authority at index 0: ' /'",
            error.to_string()
        );
    }

    #[test]
    fn strict_rejects_illegal_query_byte() {
        let error = Uri::parse_request_target("/p?a b", false).unwrap_err();
        assert_eq!(
            "Illegal character in query at index 1: 'a b'",
            error.to_string()
        );
    }

    #[test]
    fn rejects_non_numeric_port() {
        let error = Uri::parse_request_target("example.com:8x", false).unwrap_err();
        assert_eq!(
            "Illegal character in authority at index 13: 'example.com:8x'",
            error.to_string()
        );
    }

    #[test]
    fn rejects_missing_ipv6_closing_bracket() {
        let error = Uri::parse_request_target("[::1", false).unwrap_err();
        assert!(matches!(
            error,
            Error::InvalidRequestTarget {
                component: UriComponent::Authority,
                index: 0,
                ..
            }
        ));
    }

    #[test]
    fn percent_decodes_display_accessors() {
        let uri = Uri::parse("/hi%20there?q=%2Fusr#%C3%A5").unwrap();
        assert_eq!("/hi there", uri.path());
        assert_eq!(Some("q=/usr".to_string()), uri.query());
        assert_eq!(Some("å".to_string()), uri.fragment());
    }

    #[test]
    fn scheme_inside_query_is_not_a_scheme() {
        let uri = Uri::parse("/redirect?to=http://example.com/x").unwrap();
        assert_eq!(None, uri.scheme());
        assert_eq!("/redirect", uri.raw_path());
        assert_eq!(Some("to=http://example.com/x"), uri.raw_query());
    }

    #[test]
    fn display_round_trips_through_parse() {
        for target in ["/a/b?c=d#e", "http://h:1/p", "[::1]:8080", "/id/%7B0x0%7D"] {
            let uri = Uri::parse(target).unwrap();
            assert_eq!(uri, Uri::parse(&uri.to_string()).unwrap());
        }
    }
}
