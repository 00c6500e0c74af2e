use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::fs::entry::Entry;

/// Sort criteria for entry lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    #[default]
    Name,
    Size,
    Date,
}

impl SortKey {
    /// Parse a sort key from a config or command string. Unknown values fall
    /// back to `Name`.
    pub fn parse(s: &str) -> Self {
        match s {
            "size" => SortKey::Size,
            "date" | "modified" => SortKey::Date,
            _ => SortKey::Name,
        }
    }

    /// Get the display label for the key.
    pub fn label(&self) -> &'static str {
        match self {
            SortKey::Name => "Name",
            SortKey::Size => "Size",
            SortKey::Date => "Date",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn parse(s: &str) -> Self {
        match s {
            "desc" | "descending" => SortDirection::Descending,
            _ => SortDirection::Ascending,
        }
    }

    fn flipped(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SortConfig {
    pub key: SortKey,
    pub direction: SortDirection,
}

impl SortConfig {
    pub fn new(key: SortKey, direction: SortDirection) -> Self {
        Self { key, direction }
    }

    /// Choosing the active key flips the direction; a new key resets to
    /// ascending.
    pub fn select_key(&mut self, key: SortKey) {
        if self.key == key {
            self.direction = self.direction.flipped();
        } else {
            self.key = key;
            self.direction = SortDirection::Ascending;
        }
    }

    pub fn label(&self) -> String {
        let arrow = match self.direction {
            SortDirection::Ascending => "asc",
            SortDirection::Descending => "desc",
        };
        format!("{} ({})", self.key.label(), arrow)
    }
}

/// Return `entries` ordered by `config`, directories first.
///
/// Stable for ties. The direction only reverses the key comparison; the
/// directories-first grouping never flips.
pub fn sort_entries(entries: &[Entry], config: SortConfig) -> Vec<Entry> {
    let mut sorted = entries.to_vec();
    sorted.sort_by(|a, b| {
        b.is_directory.cmp(&a.is_directory).then_with(|| {
            let cmp = match config.key {
                SortKey::Name => compare_names(&a.name, &b.name),
                SortKey::Size => a.size.cmp(&b.size),
                SortKey::Date => a.modification_time.cmp(&b.modification_time),
            };
            match config.direction {
                SortDirection::Ascending => cmp,
                SortDirection::Descending => cmp.reverse(),
            }
        })
    });
    sorted
}

/// Case-insensitive name order; names equal ignoring case put lowercase
/// before uppercase, then fall back to raw comparison.
pub fn compare_names(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| {
            let upper = |s: &str| s.chars().map(char::is_uppercase).collect::<Vec<_>>();
            upper(a).cmp(&upper(b))
        })
        .then_with(|| a.cmp(b))
}
