use core::fmt::{Display, Formatter, Result as FmtResult};
use serde::{Serialize, Serializer};
use std::sync::Arc;

/// One element of a [`QueryKey`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum KeyPart {
    Str(String),
    Null,
}

impl From<&str> for KeyPart {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for KeyPart {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<Option<&str>> for KeyPart {
    fn from(value: Option<&str>) -> Self {
        value.map_or(Self::Null, Self::from)
    }
}

impl Serialize for KeyPart {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Str(s) => serializer.serialize_str(s),
            Self::Null => serializer.serialize_none(),
        }
    }
}

/// An ordered, immutable tuple identifying a cacheable query.
///
/// Keys compare structurally: two keys are equal exactly when every part is equal.
/// Clones share the same backing storage.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QueryKey(Arc<[KeyPart]>);

impl QueryKey {
    pub fn new<I, P>(parts: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<KeyPart>,
    {
        Self(parts.into_iter().map(Into::into).collect())
    }

    #[must_use]
    pub fn parts(&self) -> &[KeyPart] {
        &self.0
    }

    /// Returns `true` if `prefix` matches the leading parts of this key.
    #[must_use]
    pub fn starts_with(&self, prefix: &Self) -> bool {
        self.0.starts_with(&prefix.0)
    }
}

impl Serialize for QueryKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.0.iter())
    }
}

impl Display for QueryKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "[")?;
        for (i, part) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            match part {
                KeyPart::Str(s) => write!(f, "{s:?}")?,
                KeyPart::Null => write!(f, "null")?,
            }
        }
        write!(f, "]")
    }
}
