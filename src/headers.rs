use std::collections::HashMap;
use std::fmt;

/// Whether a byte is a `tchar`, the RFC 7230 token character set used for
/// header names and request methods.
pub(crate) fn is_tchar(byte: u8) -> bool {
    byte.is_ascii_alphanumeric()
        || matches!(
            byte,
            b'!' | b'#'
                | b'$'
                | b'%'
                | b'&'
                | b'\''
                | b'*'
                | b'+'
                | b'-'
                | b'.'
                | b'^'
                | b'_'
                | b'`'
                | b'|'
                | b'~'
        )
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct HeaderEntry {
    name: String,
    value: String,
}

/// An ordered multi-map of HTTP headers.
///
/// Lookup is case-insensitive, but iteration and serialization preserve the
/// original casing and the exact insertion order, including repeated names.
/// Values are built through [`HeadersBuilder`] and frozen on
/// [`HeadersBuilder::build`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawHttpHeaders {
    entries: Vec<HeaderEntry>,
    index: HashMap<String, Vec<usize>>,
}

impl RawHttpHeaders {
    /// A container with no headers in it.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn builder() -> HeadersBuilder {
        HeadersBuilder::default()
    }

    /// A builder seeded with every entry of this container, in order.
    #[must_use]
    pub fn to_builder(&self) -> HeadersBuilder {
        HeadersBuilder {
            entries: self.entries.clone(),
        }
    }

    /// All values whose name matches `name` case-insensitively, in insertion
    /// order.  Empty when the header is absent.
    #[must_use]
    pub fn get(&self, name: &str) -> Vec<&str> {
        self.index
            .get(&name.to_uppercase())
            .map(|positions| {
                positions
                    .iter()
                    .map(|&position| self.entries[position].value.as_str())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// The first value for `name`, when there is one.
    #[must_use]
    pub fn get_first(&self, name: &str) -> Option<&str> {
        self.index
            .get(&name.to_uppercase())
            .and_then(|positions| positions.first())
            .map(|&position| self.entries[position].value.as_str())
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(&name.to_uppercase())
    }

    /// The number of entries, counting repeats.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The entries as `(name, value)` pairs in insertion order, names in
    /// their original casing.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|entry| (entry.name.as_str(), entry.value.as_str()))
    }

    /// The headers as a map from upper-cased name to the ordered list of
    /// values for that name.
    #[must_use]
    pub fn as_map(&self) -> HashMap<String, Vec<String>> {
        let mut map: HashMap<String, Vec<String>> = HashMap::new();
        for entry in &self.entries {
            map.entry(entry.name.to_uppercase())
                .or_default()
                .push(entry.value.clone());
        }
        map
    }
}

impl fmt::Display for RawHttpHeaders {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        for entry in &self.entries {
            write!(formatter, "{}: {}\r\n", entry.name, entry.value)?;
        }
        Ok(())
    }
}

/// The mutable stage of a [`RawHttpHeaders`] value.
#[derive(Debug, Clone, Default)]
pub struct HeadersBuilder {
    entries: Vec<HeaderEntry>,
}

impl HeadersBuilder {
    /// Append an entry, keeping any existing entries for the same name.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.entries.push(HeaderEntry {
            name: name.into(),
            value: value.into(),
        });
        self
    }

    /// Remove every entry matching `name` case-insensitively, then append a
    /// single entry carrying the supplied casing of the name.
    #[must_use]
    pub fn overwrite(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        let upper = name.to_uppercase();
        self.entries.retain(|entry| entry.name.to_uppercase() != upper);
        self.entries.push(HeaderEntry {
            name,
            value: value.into(),
        });
        self
    }

    /// Remove every entry matching `name` case-insensitively.
    #[must_use]
    pub fn remove(mut self, name: &str) -> Self {
        let upper = name.to_uppercase();
        self.entries.retain(|entry| entry.name.to_uppercase() != upper);
        self
    }

    /// Freeze the entries into an immutable container.
    #[must_use]
    pub fn build(self) -> RawHttpHeaders {
        let mut index: HashMap<String, Vec<usize>> = HashMap::new();
        for (position, entry) in self.entries.iter().enumerate() {
            index.entry(entry.name.to_uppercase()).or_default().push(position);
        }
        RawHttpHeaders {
            entries: self.entries,
            index,
        }
    }
}
