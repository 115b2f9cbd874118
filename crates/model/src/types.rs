//! Shared value types

use serde::{Deserialize, Serialize};
use std::fmt;

/// Connection speed preset chosen at login
///
/// The preset tunes how much image data the client requests up front. Its
/// numeric index is what gets persisted in the user's preferences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionSpeed {
    /// LAN or fast broadband
    #[default]
    High,
    /// Typical broadband
    Medium,
    /// Slow or metered links
    Low,
}

impl ConnectionSpeed {
    /// All presets in index order
    pub const ALL: [ConnectionSpeed; 3] = [Self::High, Self::Medium, Self::Low];

    /// Persisted index of the preset
    pub fn index(self) -> u8 {
        match self {
            Self::High => 0,
            Self::Medium => 1,
            Self::Low => 2,
        }
    }

    /// Preset for a persisted index
    pub fn from_index(index: u8) -> Option<Self> {
        match index {
            0 => Some(Self::High),
            1 => Some(Self::Medium),
            2 => Some(Self::Low),
            _ => None,
        }
    }

    /// Parse a persisted preference value
    ///
    /// Blank values mean the preference was never written and yield `None`,
    /// as do values that are not a known index.
    pub fn from_preference(value: &str) -> Option<Self> {
        let value = value.trim();
        if value.is_empty() {
            return None;
        }
        value.parse::<u8>().ok().and_then(Self::from_index)
    }

    /// Label shown next to the server name, e.g. `" [High]"`
    pub fn label(self) -> &'static str {
        match self {
            Self::High => " [High]",
            Self::Medium => " [Medium]",
            Self::Low => " [Low]",
        }
    }

    /// Next preset, wrapping around after `Low`
    pub fn next(self) -> Self {
        match self {
            Self::High => Self::Medium,
            Self::Medium => Self::Low,
            Self::Low => Self::High,
        }
    }
}

impl fmt::Display for ConnectionSpeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::High => write!(f, "High"),
            Self::Medium => write!(f, "Medium"),
            Self::Low => write!(f, "Low"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_mapping() {
        for speed in ConnectionSpeed::ALL {
            assert_eq!(ConnectionSpeed::from_index(speed.index()), Some(speed));
        }
        assert_eq!(ConnectionSpeed::from_index(3), None);
    }

    #[test]
    fn test_from_preference() {
        assert_eq!(ConnectionSpeed::from_preference("1"), Some(ConnectionSpeed::Medium));
        assert_eq!(ConnectionSpeed::from_preference(" 2 "), Some(ConnectionSpeed::Low));
        assert_eq!(ConnectionSpeed::from_preference(""), None);
        assert_eq!(ConnectionSpeed::from_preference("fast"), None);
        assert_eq!(ConnectionSpeed::from_preference("7"), None);
    }

    #[test]
    fn test_labels() {
        assert_eq!(ConnectionSpeed::High.label(), " [High]");
        assert_eq!(ConnectionSpeed::Medium.label(), " [Medium]");
        assert_eq!(ConnectionSpeed::Low.label(), " [Low]");
    }

    #[test]
    fn test_next_wraps() {
        assert_eq!(ConnectionSpeed::Low.next(), ConnectionSpeed::High);
        assert_eq!(ConnectionSpeed::default(), ConnectionSpeed::High);
    }
}
