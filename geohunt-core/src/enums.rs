//! Enum types for GeoHunt entities

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Entity type discriminator used in storage errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityType {
    Treasure,
    PlayerProgress,
}

// ============================================================================
// CATEGORY
// ============================================================================

/// Treasure category. The set is closed; badge rules key off it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Academic,
    Social,
    Sports,
    History,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Academic,
        Category::Social,
        Category::Sports,
        Category::History,
    ];

    /// Convert to database string representation.
    pub fn as_db_str(&self) -> &'static str {
        match self {
            Category::Academic => "academic",
            Category::Social => "social",
            Category::Sports => "sports",
            Category::History => "history",
        }
    }

    /// Parse from database string representation.
    pub fn from_db_str(s: &str) -> Result<Self, CategoryParseError> {
        match s.to_lowercase().as_str() {
            "academic" => Ok(Category::Academic),
            "social" => Ok(Category::Social),
            "sports" => Ok(Category::Sports),
            "history" => Ok(Category::History),
            _ => Err(CategoryParseError(s.to_string())),
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_db_str())
    }
}

impl FromStr for Category {
    type Err = CategoryParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_db_str(s)
    }
}

/// Error when parsing an invalid category string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryParseError(pub String);

impl fmt::Display for CategoryParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid category: {}", self.0)
    }
}

impl std::error::Error for CategoryParseError {}
