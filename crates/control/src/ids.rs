//! Identifier types shared by every layer.
//!
//! Application identifiers are opaque strings handed out by the host. An
//! empty string or `"0"` means the host did not know the identity when it
//! produced the value, which is common for non-native applications at launch.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Operating-system process identifier. `0` means unresolved.
pub type Pid = u32;

/// Opaque external identifier. Hosts send it as a string or a number.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "WireId", into = "String")]
pub struct ExternalId(String);

#[derive(Deserialize)]
#[serde(untagged)]
enum WireId {
    Text(String),
    Number(u64),
}

impl From<WireId> for ExternalId {
    fn from(value: WireId) -> Self {
        match value {
            WireId::Text(text) => Self::new(text),
            WireId::Number(number) => Self::from(number),
        }
    }
}

impl From<ExternalId> for String {
    fn from(value: ExternalId) -> Self {
        value.0
    }
}

/// Application identifier as reported by the host.
pub type AppId = ExternalId;

/// Secondary identifier only present for non-native applications.
pub type GameId = ExternalId;

impl ExternalId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into().trim().to_string())
    }

    /// The placeholder value used when the identity is not known.
    pub fn unknown() -> Self {
        Self::default()
    }

    /// True when the value carries an actual identity (not empty, not `"0"`).
    pub fn is_known(&self) -> bool {
        !self.0.is_empty() && self.0 != "0"
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Both sides known and equal. Placeholders never match each other.
    pub fn matches(&self, other: &Self) -> bool {
        self.is_known() && other.is_known() && self.0 == other.0
    }
}

impl fmt::Display for ExternalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ExternalId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ExternalId {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<u64> for ExternalId {
    fn from(value: u64) -> Self {
        Self(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholders_are_unknown() {
        assert!(!ExternalId::unknown().is_known());
        assert!(!ExternalId::from("0").is_known());
        assert!(!ExternalId::from("  ").is_known());
        assert!(ExternalId::from("100").is_known());
    }

    #[test]
    fn test_placeholders_never_match() {
        assert!(!ExternalId::from("0").matches(&ExternalId::from("0")));
        assert!(!ExternalId::unknown().matches(&ExternalId::unknown()));
        assert!(ExternalId::from("42").matches(&ExternalId::from(42u64)));
    }

    #[test]
    fn test_serializes_as_plain_string() {
        let json = serde_json::to_string(&ExternalId::from("730")).unwrap();
        assert_eq!(json, "\"730\"");
        let back: ExternalId = serde_json::from_str("\"730\"").unwrap();
        assert_eq!(back.as_str(), "730");
    }

    #[test]
    fn test_deserialize_trims_and_accepts_numbers() {
        let padded: ExternalId = serde_json::from_str("\" 730 \"").unwrap();
        assert_eq!(padded.as_str(), "730");

        let numeric: ExternalId = serde_json::from_str("730").unwrap();
        assert_eq!(numeric.as_str(), "730");

        let placeholder: ExternalId = serde_json::from_str("0").unwrap();
        assert!(!placeholder.is_known());

        assert!(serde_json::from_str::<ExternalId>("true").is_err());
    }
}
