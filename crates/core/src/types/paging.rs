//! Catalog paging parameters.

use serde::{Deserialize, Serialize};

/// Page sizes the catalog grid supports.
///
/// The grid renders rows of four cards, so every allowed size is a multiple
/// of four. Wire representation is the bare number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(into = "u32", try_from = "u32")]
pub enum PageSize {
    Four,
    #[default]
    Eight,
    Twelve,
    Sixteen,
}

impl PageSize {
    /// Every allowed page size, smallest first.
    pub const ALLOWED: [Self; 4] = [Self::Four, Self::Eight, Self::Twelve, Self::Sixteen];

    /// The numeric page size.
    #[must_use]
    pub const fn get(self) -> u32 {
        match self {
            Self::Four => 4,
            Self::Eight => 8,
            Self::Twelve => 12,
            Self::Sixteen => 16,
        }
    }
}

/// Error parsing a [`PageSize`] from a number.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("page size {0} is not one of 4, 8, 12, 16")]
pub struct PageSizeError(pub u32);

impl TryFrom<u32> for PageSize {
    type Error = PageSizeError;

    fn try_from(n: u32) -> Result<Self, Self::Error> {
        match n {
            4 => Ok(Self::Four),
            8 => Ok(Self::Eight),
            12 => Ok(Self::Twelve),
            16 => Ok(Self::Sixteen),
            other => Err(PageSizeError(other)),
        }
    }
}

impl From<PageSize> for u32 {
    fn from(size: PageSize) -> Self {
        size.get()
    }
}

impl std::fmt::Display for PageSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.get())
    }
}

/// Sort direction for the catalog price ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    /// The opposite direction.
    #[must_use]
    pub const fn reversed(self) -> Self {
        match self {
            Self::Ascending => Self::Descending,
            Self::Descending => Self::Ascending,
        }
    }
}
