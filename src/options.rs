use std::sync::Arc;

use crate::error::Error;
use crate::headers::RawHttpHeaders;

/// A predicate run over the complete header set after parsing.  Any error it
/// returns is propagated to the caller unchanged.
pub type HeaderValidator = Arc<dyn Fn(&RawHttpHeaders) -> Result<(), Error> + Send + Sync>;

/// The leniency switches of the metadata parser.
///
/// Values are immutable once handed to a parser.  The defaults are lenient,
/// accepting the kind of slightly-off messages real clients and servers
/// produce; [`ParserOptions::strict`] turns all leniency off.
#[derive(Clone)]
pub struct ParserOptions {
    /// Accept a bare line-feed as a line terminator, rather than requiring
    /// the carriage-return line-feed pair.
    pub allow_new_line_without_return: bool,

    /// Discard one empty line appearing before the start line.
    pub ignore_leading_empty_line: bool,

    /// Treat a two-token request line as an HTTP/1.1 request rather than
    /// failing with a missing version.
    pub insert_http_version_if_missing: bool,

    /// Percent-encode bytes that are not legal in a request target, and
    /// tolerate spaces inside the target, rather than rejecting the line.
    pub allow_illegal_start_line_characters: bool,

    /// Upper bound on the byte length of a header name.
    pub max_header_name_length: usize,

    /// Upper bound on the byte length of a header value.
    pub max_header_value_length: usize,

    /// Optional predicate over the whole header set, run after all field
    /// lines have been parsed.
    pub header_validator: Option<HeaderValidator>,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            allow_new_line_without_return: true,
            ignore_leading_empty_line: true,
            insert_http_version_if_missing: true,
            allow_illegal_start_line_characters: false,
            max_header_name_length: i32::MAX as usize,
            max_header_value_length: i32::MAX as usize,
            header_validator: None,
        }
    }
}

impl ParserOptions {
    /// Options with every leniency switch turned off.
    #[must_use]
    pub fn strict() -> Self {
        Self {
            allow_new_line_without_return: false,
            ignore_leading_empty_line: false,
            insert_http_version_if_missing: false,
            ..Self::default()
        }
    }

    /// Install a predicate to run over the complete header set after
    /// parsing.
    #[must_use]
    pub fn with_header_validator<F>(mut self, validator: F) -> Self
    where
        F: Fn(&RawHttpHeaders) -> Result<(), Error> + Send + Sync + 'static,
    {
        self.header_validator = Some(Arc::new(validator));
        self
    }
}

#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    fn defaults_are_lenient() {
        let options = ParserOptions::default();
        assert!(options.allow_new_line_without_return);
        assert!(options.ignore_leading_empty_line);
        assert!(options.insert_http_version_if_missing);
        assert!(!options.allow_illegal_start_line_characters);
        assert_eq!(i32::MAX as usize, options.max_header_name_length);
        assert_eq!(i32::MAX as usize, options.max_header_value_length);
        assert!(options.header_validator.is_none());
    }

    #[test]
    fn strict_turns_leniency_off() {
        let options = ParserOptions::strict();
        assert!(!options.allow_new_line_without_return);
        assert!(!options.ignore_leading_empty_line);
        assert!(!options.insert_http_version_if_missing);
        assert!(!options.allow_illegal_start_line_characters);
    }
}
