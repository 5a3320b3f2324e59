use std::fmt;

use super::CategoryId;
use crate::constants::ALL_TAG;

/// Active filter: every category, or exactly one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum Tag {
    #[default]
    All,
    Category(CategoryId),
}

impl Tag {
    /// Parses a raw tag value. Does not check the category exists.
    pub fn parse(value: &str) -> Self {
        let value = value.trim();
        if value.is_empty() || value == ALL_TAG {
            Tag::All
        } else {
            Tag::Category(CategoryId::new(value))
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Tag::All => ALL_TAG,
            Tag::Category(id) => id.as_str(),
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Tag::All)
    }

    /// Whether a record from `category` belongs under this tag.
    pub fn admits(&self, category: &CategoryId) -> bool {
        match self {
            Tag::All => true,
            Tag::Category(id) => id == category,
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<CategoryId> for Tag {
    fn from(id: CategoryId) -> Self {
        Tag::Category(id)
    }
}
