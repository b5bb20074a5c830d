//! Conversion families and unit identifiers

use std::fmt;
use serde::{Serialize, Deserialize};

/// Opaque unit identifier, assigned by the store at creation
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UnitId(pub u64);

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A closed category of mutually convertible units
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Family {
    Weight,
    Length,
    Area,
    Volume,
    Time,
    Speed,
    Energy,
    Power,
    Pressure,
    DataStorage,
    Currency,
    Quantity,
}

impl Family {
    /// Every family, in listing order
    pub const ALL: [Family; 12] = [
        Family::Weight,
        Family::Length,
        Family::Area,
        Family::Volume,
        Family::Time,
        Family::Speed,
        Family::Energy,
        Family::Power,
        Family::Pressure,
        Family::DataStorage,
        Family::Currency,
        Family::Quantity,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Family::Weight => "weight",
            Family::Length => "length",
            Family::Area => "area",
            Family::Volume => "volume",
            Family::Time => "time",
            Family::Speed => "speed",
            Family::Energy => "energy",
            Family::Power => "power",
            Family::Pressure => "pressure",
            Family::DataStorage => "data_storage",
            Family::Currency => "currency",
            Family::Quantity => "quantity",
        }
    }

    /// Look up a family by tag, case-insensitive
    pub fn parse(tag: &str) -> Option<Family> {
        let tag = tag.trim().to_lowercase().replace(&['-', ' '][..], "_");
        Self::ALL.into_iter().find(|f| f.as_str() == tag)
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tags() {
        assert_eq!(Family::parse("weight"), Some(Family::Weight));
        assert_eq!(Family::parse(" Data-Storage "), Some(Family::DataStorage));
        assert_eq!(Family::parse("temperature"), None);
    }

    #[test]
    fn test_as_str_matches_serde() {
        for family in Family::ALL {
            let json = serde_json::to_string(&family).unwrap();
            assert_eq!(json, format!("\"{}\"", family.as_str()));
        }
    }
}
