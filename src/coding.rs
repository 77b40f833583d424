//! Helper functions for decoding the bodies of HTTP messages.  Content
//! coding changes the bytes of the body to represent it differently, for
//! example compressing it to a smaller size; text coding is how the bytes of
//! a decoded body are interpreted as text.

use std::io::Read as _;

use flate2::bufread::{DeflateDecoder, GzDecoder};

use crate::error::Error;
use crate::headers::RawHttpHeaders;

/// Reverse any content coding performed on the given message body, as listed
/// in the `Content-Encoding` header of the given headers.
///
/// The codings are listed in the order they were applied, so decoding works
/// through them in reverse.  Decoding stops at the first unrecognized
/// coding.  Codings successfully decoded are dropped from the returned
/// headers' `Content-Encoding` (the header disappears once every coding is
/// decoded), and `Content-Length` is updated to the decoded length.
pub fn decode_body(
    headers: &RawHttpHeaders,
    body: &[u8],
) -> Result<(RawHttpHeaders, Vec<u8>), Error> {
    let mut codings: Vec<String> = headers
        .get("Content-Encoding")
        .iter()
        .flat_map(|value| value.split(','))
        .map(|coding| coding.trim().to_string())
        .filter(|coding| !coding.is_empty())
        .collect();
    let mut body = body.to_vec();
    while let Some(coding) = codings.last() {
        match coding.as_str() {
            "gzip" | "x-gzip" => body = gzip_decode(&body)?,
            "deflate" => body = deflate_decode(&body)?,
            _ => break,
        }
        codings.pop();
    }
    let mut builder = headers.to_builder();
    builder = if codings.is_empty() {
        builder.remove("Content-Encoding")
    } else {
        builder.overwrite("Content-Encoding", codings.join(", "))
    };
    builder = builder.overwrite("Content-Length", body.len().to_string());
    Ok((builder.build(), body))
}

/// Decode the given message body as text.
///
/// This only works when the headers carry a `Content-Type` whose type is
/// `text`, and its `charset` parameter (`iso-8859-1` when absent) names an
/// encoding the [`encoding_rs`](https://crates.io/crates/encoding_rs) crate
/// recognizes, and the body decodes cleanly under it.
#[must_use]
pub fn decode_body_as_text(headers: &RawHttpHeaders, body: &[u8]) -> Option<String> {
    let content_type = headers.get_first("Content-Type")?;
    let (type_subtype, parameters) = match content_type.find(';') {
        Some(delimiter) => (&content_type[..delimiter], &content_type[delimiter + 1..]),
        None => (content_type, ""),
    };
    let media_type = type_subtype.split('/').next()?;
    if !media_type.eq_ignore_ascii_case("text") {
        return None;
    }
    let charset = parameters
        .split(';')
        .map(str::trim)
        .filter_map(|parameter| parameter.split_once('='))
        .find_map(|(name, value)| name.eq_ignore_ascii_case("charset").then_some(value))
        .unwrap_or("iso-8859-1");
    let encoding = encoding_rs::Encoding::for_label(charset.as_bytes())?;
    encoding
        .decode_without_bom_handling_and_without_replacement(body)
        .map(String::from)
}

fn gzip_decode(body: &[u8]) -> Result<Vec<u8>, Error> {
    let mut decoder = GzDecoder::new(body);
    let mut decoded = Vec::new();
    decoder
        .read_to_end(&mut decoded)
        .map_err(Error::BadContentEncoding)?;
    Ok(decoded)
}

fn deflate_decode(body: &[u8]) -> Result<Vec<u8>, Error> {
    let mut decoder = DeflateDecoder::new(body);
    let mut decoded = Vec::new();
    decoder
        .read_to_end(&mut decoded)
        .map_err(Error::BadContentEncoding)?;
    Ok(decoded)
}

#[cfg(test)]
mod tests {

    #![allow(clippy::non_ascii_literal)]

    use super::*;

    const GZIPPED_HELLO: &[u8] = &[
        0x1F, 0x8B, 0x08, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x0A, 0xF3, 0x48, 0xCD, 0xC9, 0xC9,
        0xD7, 0x51, 0x08, 0xCF, 0x2F, 0xCA, 0x49, 0x51, 0x04, 0x00, 0xD0, 0xC3, 0x4A, 0xEC, 0x0D,
        0x00, 0x00, 0x00,
    ];

    fn headers_with(entries: &[(&str, &str)]) -> RawHttpHeaders {
        let mut builder = RawHttpHeaders::builder();
        for (name, value) in entries {
            builder = builder.with(*name, *value);
        }
        builder.build()
    }

    #[test]
    fn gzip_decode_junk_fails() {
        assert!(matches!(
            gzip_decode(b"certainly not gzipped data"),
            Err(Error::BadContentEncoding(_))
        ));
    }

    #[test]
    fn deflate_decode_non_empty_input() {
        let body: &[u8] = &[
            0xF3, 0x48, 0xCD, 0xC9, 0xC9, 0xD7, 0x51, 0x08, 0xCF, 0x2F, 0xCA, 0x49, 0x51, 0x04,
            0x00,
        ];
        assert_eq!(b"Hello, World!".to_vec(), deflate_decode(body).unwrap());
    }

    #[test]
    fn decode_body_without_coding_is_identity() {
        let headers = headers_with(&[("Content-Length", "13")]);
        let (headers, body) = decode_body(&headers, b"Hello, World!").unwrap();
        assert_eq!(b"Hello, World!".to_vec(), body);
        assert_eq!(Some("13"), headers.get_first("Content-Length"));
        assert!(!headers.contains("Content-Encoding"));
    }

    #[test]
    fn decode_body_gzipped() {
        let headers = headers_with(&[
            ("Content-Length", "33"),
            ("Content-Encoding", "gzip"),
        ]);
        let (headers, body) = decode_body(&headers, GZIPPED_HELLO).unwrap();
        assert_eq!(b"Hello, World!".to_vec(), body);
        assert_eq!(Some("13"), headers.get_first("Content-Length"));
        assert!(!headers.contains("Content-Encoding"));
    }

    #[test]
    fn decode_body_stops_at_unknown_coding() {
        let headers = headers_with(&[("Content-Encoding", "foobar, gzip")]);
        let (headers, body) = decode_body(&headers, GZIPPED_HELLO).unwrap();
        assert_eq!(b"Hello, World!".to_vec(), body);
        assert_eq!(Some("foobar"), headers.get_first("Content-Encoding"));
        assert_eq!(Some("13"), headers.get_first("Content-Length"));
    }

    #[test]
    fn text_decoding_defaults_to_latin1() {
        let headers = headers_with(&[("Content-Type", "text/plain")]);
        let body = b"Platform 9\xbe costs \xa310";
        assert_eq!(
            Some("Platform 9¾ costs £10".to_string()),
            decode_body_as_text(&headers, body)
        );
    }

    #[test]
    fn text_decoding_honors_charset_parameter() {
        let headers = headers_with(&[("Content-Type", "text/plain; charset=utf-8")]);
        let body = "Platform 9¾ costs £10".as_bytes();
        assert_eq!(
            Some("Platform 9¾ costs £10".to_string()),
            decode_body_as_text(&headers, body)
        );
    }

    #[test]
    fn text_decoding_rejects_invalid_bytes_for_charset() {
        let headers = headers_with(&[("Content-Type", "text/plain; charset=utf-8")]);
        let body = b"Platform 9\xbe";
        assert_eq!(None, decode_body_as_text(&headers, body));
    }

    #[test]
    fn text_decoding_requires_text_media_type() {
        let headers = headers_with(&[("Content-Type", "application/json")]);
        assert_eq!(None, decode_body_as_text(&headers, b"{}"));
    }
}
