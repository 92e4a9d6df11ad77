//! Nested document values built from scalars, lists and ordered dictionaries.

use indexmap::IndexMap;

/// Leaf payload of a document.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Scalar {
    /// Signed integer.
    Integer(i64),
    /// UTF-8 text.
    Text(String),
    /// Raw bytes that are not valid UTF-8 (piece hashes, binary blobs).
    Bytes(Vec<u8>),
}

impl Scalar {
    /// Short machine-friendly type name.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Integer(_) => "integer",
            Self::Text(_) => "text",
            Self::Bytes(_) => "bytes",
        }
    }

    /// Integer payload, if this is an integer.
    #[must_use]
    pub const fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(value) => Some(*value),
            _ => None,
        }
    }

    /// Text payload, if this is text.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(value) => Some(value),
            _ => None,
        }
    }

    /// Byte view of a string-like scalar; `None` for integers.
    #[must_use]
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Text(value) => Some(value.as_bytes()),
            Self::Bytes(value) => Some(value),
            Self::Integer(_) => None,
        }
    }
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<Vec<u8>> for Scalar {
    fn from(value: Vec<u8>) -> Self {
        Self::Bytes(value)
    }
}

/// A nested key/value document.
///
/// Equality is order-sensitive for dictionaries: two dictionaries are equal only
/// when they hold equal pairs in the same order.
#[derive(Debug, Clone)]
pub enum Document {
    /// Leaf value.
    Scalar(Scalar),
    /// Ordered sequence.
    List(Vec<Document>),
    /// Dictionary with unique keys in insertion order.
    Dict(IndexMap<String, Document>),
}

impl Document {
    /// Build a dictionary from ordered pairs. Later duplicates replace the value
    /// in place and keep the first key position.
    pub fn dict<K, I>(entries: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Self)>,
    {
        Self::Dict(
            entries
                .into_iter()
                .map(|(key, value)| (key.into(), value))
                .collect(),
        )
    }

    /// Build a list from items.
    pub fn list<I>(items: I) -> Self
    where
        I: IntoIterator<Item = Self>,
    {
        Self::List(items.into_iter().collect())
    }

    /// Short machine-friendly shape name.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Scalar(scalar) => scalar.type_name(),
            Self::List(_) => "list",
            Self::Dict(_) => "dict",
        }
    }

    /// Scalar payload, if this is a leaf.
    #[must_use]
    pub const fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            Self::Scalar(scalar) => Some(scalar),
            _ => None,
        }
    }

    /// List items, if this is a list.
    #[must_use]
    pub fn as_list(&self) -> Option<&[Self]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// Dictionary entries, if this is a dictionary.
    #[must_use]
    pub const fn as_dict(&self) -> Option<&IndexMap<String, Self>> {
        match self {
            Self::Dict(entries) => Some(entries),
            _ => None,
        }
    }

    /// Look up a dictionary entry.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Self> {
        self.as_dict().and_then(|entries| entries.get(key))
    }

    /// Nesting depth: scalars are 0, a container adds one level over its deepest child.
    ///
    /// Computed without recursion so hostile inputs cannot exhaust the stack.
    #[must_use]
    pub fn depth(&self) -> usize {
        let mut deepest = 0;
        let mut stack = vec![(self, 0_usize)];
        while let Some((document, level)) = stack.pop() {
            match document {
                Self::Scalar(_) => deepest = deepest.max(level),
                Self::List(items) => {
                    deepest = deepest.max(level + 1);
                    stack.extend(items.iter().map(|item| (item, level + 1)));
                }
                Self::Dict(entries) => {
                    deepest = deepest.max(level + 1);
                    stack.extend(entries.values().map(|value| (value, level + 1)));
                }
            }
        }
        deepest
    }
}

impl PartialEq for Document {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Scalar(left), Self::Scalar(right)) => left == right,
            (Self::List(left), Self::List(right)) => left == right,
            (Self::Dict(left), Self::Dict(right)) => {
                left.len() == right.len()
                    && left
                        .iter()
                        .zip(right.iter())
                        .all(|((lk, lv), (rk, rv))| lk == rk && lv == rv)
            }
            _ => false,
        }
    }
}

impl Eq for Document {}

impl From<Scalar> for Document {
    fn from(value: Scalar) -> Self {
        Self::Scalar(value)
    }
}

impl From<i64> for Document {
    fn from(value: i64) -> Self {
        Self::Scalar(Scalar::Integer(value))
    }
}

impl From<&str> for Document {
    fn from(value: &str) -> Self {
        Self::Scalar(Scalar::from(value))
    }
}

impl From<String> for Document {
    fn from(value: String) -> Self {
        Self::Scalar(Scalar::Text(value))
    }
}

impl From<Vec<u8>> for Document {
    fn from(value: Vec<u8>) -> Self {
        Self::Scalar(Scalar::Bytes(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dict_equality_respects_key_order() {
        let forward = Document::dict([("a", Document::from(1)), ("b", Document::from(2))]);
        let reversed = Document::dict([("b", Document::from(2)), ("a", Document::from(1))]);
        assert_ne!(forward, reversed);
        assert_eq!(forward, forward.clone());
    }

    #[test]
    fn empty_containers_are_distinct() {
        assert_ne!(Document::list([]), Document::Dict(IndexMap::new()));
        assert_eq!(Document::list([]).type_name(), "list");
    }

    #[test]
    fn depth_counts_container_levels() {
        assert_eq!(Document::from("x").depth(), 0);
        assert_eq!(Document::list([]).depth(), 1);
        let nested = Document::dict([(
            "files",
            Document::list([Document::dict([("length", Document::from(10))])]),
        )]);
        assert_eq!(nested.depth(), 3);
    }

    #[test]
    fn scalar_byte_views() {
        assert_eq!(Scalar::from("ab").as_bytes(), Some(&b"ab"[..]));
        assert_eq!(Scalar::Integer(3).as_bytes(), None);
        assert_eq!(Scalar::Integer(3).as_integer(), Some(3));
    }
}
