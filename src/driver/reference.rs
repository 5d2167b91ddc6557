//! Record references.
//!
//! A reference is either `table` (every record in the table) or `table:id`
//! (one record). The client treats references as opaque strings; only
//! drivers that need to build paths or keys look inside them.

use std::fmt;

/// A parsed record or table reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RecordRef {
    raw: String,
    split: Option<usize>,
}

impl RecordRef {
    /// Parse a reference. Never fails: anything without a `:` is a table name.
    pub fn parse(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let split = raw.find(':');
        Self { raw, split }
    }

    /// Build a reference to a single record.
    pub fn record(table: &str, id: &str) -> Self {
        Self::parse(format!("{}:{}", table, id))
    }

    pub fn table(&self) -> &str {
        match self.split {
            Some(idx) => &self.raw[..idx],
            None => &self.raw,
        }
    }

    /// The record id, with surrounding `⟨⟩` or backticks stripped.
    pub fn id(&self) -> Option<&str> {
        let idx = self.split?;
        let id = &self.raw[idx + 1..];
        let id = id
            .strip_prefix('⟨')
            .and_then(|s| s.strip_suffix('⟩'))
            .or_else(|| id.strip_prefix('`').and_then(|s| s.strip_suffix('`')))
            .unwrap_or(id);
        Some(id)
    }

    /// True when the reference names a whole table.
    pub fn is_table(&self) -> bool {
        self.split.is_none()
    }

    pub fn is_empty(&self) -> bool {
        self.table().is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl fmt::Display for RecordRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl From<&str> for RecordRef {
    fn from(raw: &str) -> Self {
        Self::parse(raw)
    }
}

impl From<String> for RecordRef {
    fn from(raw: String) -> Self {
        Self::parse(raw)
    }
}
