//! Unit records and their localized display metadata

use std::fmt;
use chrono::{DateTime, Utc};
use serde::{Serialize, Deserialize};
use tally_core::{Family, Number, UnitId};

/// Where a unit's code is printed relative to a magnitude ("$ 5" vs "5 kg")
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Placement {
    Left,
    #[default]
    Right,
}

impl Placement {
    pub fn as_str(&self) -> &'static str {
        match self {
            Placement::Left => "left",
            Placement::Right => "right",
        }
    }
}

/// Display metadata for one locale
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Translation {
    pub locale: String,
    pub name: String,
    pub code: String,
    #[serde(default)]
    pub placement: Placement,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Translation {
    pub fn new(locale: &str, name: &str, code: &str) -> Self {
        Translation {
            locale: locale.to_string(),
            name: name.to_string(),
            code: code.to_string(),
            placement: Placement::Right,
            description: None,
        }
    }

    pub fn placed(mut self, placement: Placement) -> Self {
        self.placement = placement;
        self
    }

    pub fn described(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }
}

/// A measurement unit belonging to exactly one family
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Unit {
    pub id: UnitId,
    /// Family tag, immutable after creation
    #[serde(rename = "type")]
    pub family: Family,
    /// Size of this unit in base units of its family (base unit = 1)
    pub value: Number,
    pub status: bool,
    #[serde(default)]
    pub translations: Vec<Translation>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Unit {
    /// Check if this is the base unit of its family
    pub fn is_base(&self) -> bool {
        self.value.is_one()
    }

    /// Check if two units belong to the same family (can be converted)
    pub fn is_compatible(&self, other: &Unit) -> bool {
        self.family == other.family
    }

    /// Translation for `locale`, then `fallback`, then the first one stored
    pub fn translation(&self, locale: &str, fallback: &str) -> Option<&Translation> {
        self.translations.iter().find(|t| t.locale == locale)
            .or_else(|| self.translations.iter().find(|t| t.locale == fallback))
            .or_else(|| self.translations.first())
    }

    pub fn name(&self, locale: &str, fallback: &str) -> String {
        self.translation(locale, fallback)
            .map(|t| t.name.clone())
            .unwrap_or_else(|| format!("#{}", self.id))
    }

    pub fn code(&self, locale: &str, fallback: &str) -> Option<&str> {
        self.translation(locale, fallback).map(|t| t.code.as_str())
    }

    /// Check if any locale uses `code`
    pub fn has_code(&self, code: &str) -> bool {
        self.translations.iter().any(|t| t.code == code)
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.translations.first() {
            Some(t) => write!(f, "{}", t.code),
            None => write!(f, "#{}", self.id),
        }
    }
}

/// Fields accepted when creating a unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewUnit {
    #[serde(rename = "type")]
    pub family: Family,
    pub value: Number,
    #[serde(default = "default_status")]
    pub status: bool,
    #[serde(default)]
    pub translations: Vec<Translation>,
}

fn default_status() -> bool {
    true
}

impl NewUnit {
    pub fn new(family: Family, value: Number) -> Self {
        NewUnit { family, value, status: true, translations: Vec::new() }
    }

    pub fn with_status(mut self, status: bool) -> Self {
        self.status = status;
        self
    }

    pub fn with_translation(mut self, translation: Translation) -> Self {
        self.translations.push(translation);
        self
    }
}

/// Partial update; `None` leaves the field untouched
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UnitPatch {
    #[serde(default)]
    pub value: Option<Number>,
    #[serde(default)]
    pub status: Option<bool>,
    /// Replaces the whole translation set when present
    #[serde(default)]
    pub translations: Option<Vec<Translation>>,
}

impl UnitPatch {
    pub fn value(value: Number) -> Self {
        UnitPatch { value: Some(value), ..Default::default() }
    }

    pub fn status(status: bool) -> Self {
        UnitPatch { status: Some(status), ..Default::default() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gram() -> Unit {
        let now = Utc::now();
        Unit {
            id: UnitId(1),
            family: Family::Weight,
            value: Number::one(),
            status: true,
            translations: vec![
                Translation::new("en", "gram", "g"),
                Translation::new("it", "grammo", "g"),
            ],
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_is_base() {
        let mut g = gram();
        assert!(g.is_base());
        g.value = Number::from_i64(1000);
        assert!(!g.is_base());
    }

    #[test]
    fn test_translation_fallback() {
        let g = gram();
        assert_eq!(g.name("it", "en"), "grammo");
        assert_eq!(g.name("fr", "en"), "gram");
        assert_eq!(g.name("fr", "de"), "gram");
    }

    #[test]
    fn test_name_without_translations() {
        let mut g = gram();
        g.translations.clear();
        assert_eq!(g.name("en", "en"), "#1");
        assert_eq!(g.code("en", "en"), None);
    }

    #[test]
    fn test_serializes_family_as_type() {
        let json = serde_json::to_value(gram()).unwrap();
        assert_eq!(json["type"], "weight");
        assert_eq!(json["value"], "1");
        assert_eq!(json["translations"][0]["placement"], "right");
    }

    #[test]
    fn test_new_unit_defaults_status() {
        let draft: NewUnit = serde_json::from_str(r#"{"type": "length", "value": "1000"}"#).unwrap();
        assert!(draft.status);
        assert_eq!(draft.value, Number::from_i64(1000));
    }
}
