use std::fmt;

use crate::error::Error;

/// The HTTP protocol versions this crate understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpVersion {
    Http10,
    Http11,
}

impl HttpVersion {
    /// Parse the version literal from a start line.  Only the exact strings
    /// `HTTP/1.0` and `HTTP/1.1` are accepted.
    pub(crate) fn parse(token: &str, line_number: usize) -> Result<Self, Error> {
        match token {
            "HTTP/1.0" => Ok(Self::Http10),
            "HTTP/1.1" => Ok(Self::Http11),
            _ => Err(Error::InvalidHttpRequest {
                message: "Unknown HTTP version".to_string(),
                line_number,
            }),
        }
    }
}

impl fmt::Display for HttpVersion {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(match self {
            Self::Http10 => "HTTP/1.0",
            Self::Http11 => "HTTP/1.1",
        })
    }
}

#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    fn parse_known_versions() {
        assert!(matches!(
            HttpVersion::parse("HTTP/1.0", 1),
            Ok(HttpVersion::Http10)
        ));
        assert!(matches!(
            HttpVersion::parse("HTTP/1.1", 1),
            Ok(HttpVersion::Http11)
        ));
    }

    #[test]
    fn reject_unknown_versions() {
        for token in ["HTTP/1.2", "HTTP/2.0", "http/1.1", "FOO", ""] {
            let error = HttpVersion::parse(token, 3).unwrap_err();
            assert_eq!("Unknown HTTP version", error.to_string());
            assert_eq!(Some(3), error.line_number());
        }
    }

    #[test]
    fn display_round_trip() {
        assert_eq!("HTTP/1.0", HttpVersion::Http10.to_string());
        assert_eq!("HTTP/1.1", HttpVersion::Http11.to_string());
    }
}
