//! Order book configuration

use common::BookType;
use serde::{Deserialize, Serialize};

/// Order book settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrderBookConfig {
    /// Granularity of both ladders
    pub book_type: BookType,
    /// Require strictly consecutive sequence numbers
    pub sequence_check: bool,
    /// Levels per side reported by depth views
    pub max_depth: usize,
}

impl Default for OrderBookConfig {
    fn default() -> Self {
        Self {
            book_type: BookType::L3Mbo,
            sequence_check: true,
            max_depth: 10,
        }
    }
}

impl OrderBookConfig {
    /// Settings for a given granularity, other fields defaulted
    #[must_use]
    pub fn with_book_type(book_type: BookType) -> Self {
        Self {
            book_type,
            ..Self::default()
        }
    }

    /// Parse from JSON, missing fields take their defaults
    ///
    /// # Errors
    ///
    /// Returns the parser error for malformed input.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}
