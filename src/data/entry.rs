//! List entries

use serde::{Deserialize, Serialize};

/// A list item and the number of attempts made to complete it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListEntry {
    pub item: String,
    pub attempts: i64,
}

impl ListEntry {
    pub fn new(item: impl Into<String>, attempts: i64) -> Self {
        Self {
            item: item.into(),
            attempts,
        }
    }
}
