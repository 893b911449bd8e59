//! Tab identifiers
//!
//! Ids are allocated from a per-process counter and rendered as `tab-<n>`,
//! which is also their persisted form.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::TabError;

const PREFIX: &str = "tab-";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TabId(u64);

impl TabId {
    /// Largest id accepted from persisted data; the allocator must always
    /// be able to hand out a successor.
    pub const MAX: u64 = i64::MAX as u64;

    pub fn new(value: u64) -> Self {
        Self(value)
    }

    /// Numeric suffix used by the id allocator.
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for TabId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", PREFIX, self.0)
    }
}

impl FromStr for TabId {
    type Err = TabError;

    /// Accepts `tab-<n>` as well as a bare number.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let digits = trimmed.strip_prefix(PREFIX).unwrap_or(trimmed);
        match digits.parse::<u64>() {
            Ok(value) if value <= Self::MAX => Ok(TabId(value)),
            _ => Err(TabError::InvalidId(s.to_string())),
        }
    }
}

impl TryFrom<String> for TabId {
    type Error = TabError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TabId> for String {
    fn from(id: TabId) -> Self {
        id.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_and_parse() {
        let id = TabId::new(7);
        assert_eq!(id.to_string(), "tab-7");
        assert_eq!("tab-7".parse::<TabId>().unwrap(), id);
        assert_eq!("7".parse::<TabId>().unwrap(), id);
    }

    #[test]
    fn test_invalid_ids_rejected() {
        assert!("tab-".parse::<TabId>().is_err());
        assert!("tab-x".parse::<TabId>().is_err());
        assert!("window-1".parse::<TabId>().is_err());
    }

    #[test]
    fn test_ids_without_successor_rejected() {
        assert!("tab-18446744073709551615".parse::<TabId>().is_err());
        assert!(format!("tab-{}", TabId::MAX + 1).parse::<TabId>().is_err());
        assert_eq!(
            format!("tab-{}", TabId::MAX).parse::<TabId>().unwrap().value(),
            TabId::MAX
        );
    }

    #[test]
    fn test_serde_uses_string_form() {
        let json = serde_json::to_string(&TabId::new(12)).unwrap();
        assert_eq!(json, "\"tab-12\"");

        let id: TabId = serde_json::from_str("\"tab-12\"").unwrap();
        assert_eq!(id.value(), 12);

        assert!(serde_json::from_str::<TabId>("\"bogus\"").is_err());
    }
}
