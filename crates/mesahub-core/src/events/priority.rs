//! Notification priority levels.

use serde::{Deserialize, Serialize};

/// Priority of a notification.
///
/// High-priority notifications interrupt the user (toast) in addition to
/// landing in the inbox; normal and low priority update the list silently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    /// Background events.
    Low,
    /// Standard events.
    Normal,
    /// Events that should interrupt the user.
    High,
}

impl Priority {
    /// Parse from a stored string, defaulting to `Normal`.
    pub fn from_str_value(s: &str) -> Self {
        match s {
            "low" => Self::Low,
            "high" => Self::High,
            _ => Self::Normal,
        }
    }

    /// Convert to the stored string form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Normal => "normal",
            Self::High => "high",
        }
    }

    /// Whether a notification of this priority interrupts the user.
    pub fn interrupts(&self) -> bool {
        matches!(self, Self::High)
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_roundtrip() {
        for p in [Priority::Low, Priority::Normal, Priority::High] {
            assert_eq!(Priority::from_str_value(p.as_str()), p);
        }
    }

    #[test]
    fn unknown_string_defaults_to_normal() {
        assert_eq!(Priority::from_str_value("urgent"), Priority::Normal);
    }
}
