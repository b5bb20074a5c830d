//! Human and machine readable views of the registry
//!
//! - conversion sentence: `"1 kilogram = 2.2046 pound"`
//! - listing grouped by family
//! - export of every unit as JSON or CSV

use std::fmt::Write as _;
use serde::Serialize;
use tally_core::{Family, Number, RegistryError, UnitId};
use crate::Unit;

/// Default decimal places for displayed conversion results
pub const DEFAULT_PRECISION: u32 = 4;

/// Most decimal places a caller may ask for
pub const MAX_PRECISION: u32 = 64;

/// Locale names and codes are looked up in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locale<'a> {
    pub requested: &'a str,
    pub fallback: &'a str,
}

impl<'a> Locale<'a> {
    pub fn new(requested: &'a str, fallback: &'a str) -> Self {
        Locale { requested, fallback }
    }
}

/// `"{amount} {from} = {rounded result} {to}"`
pub fn conversion_sentence(
    amount: &Number,
    from: &Unit,
    to: &Unit,
    result: &Number,
    precision: u32,
    locale: &Locale<'_>,
) -> String {
    format!(
        "{} {} = {} {}",
        amount,
        from.name(locale.requested, locale.fallback),
        result.to_decimal(precision),
        to.name(locale.requested, locale.fallback),
    )
}

/// One unit in a family listing
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListedUnit {
    pub id: UnitId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    pub name: String,
    pub value: Number,
    pub status: bool,
    pub base: bool,
}

/// Units of one family
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FamilyListing {
    pub family: Family,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base: Option<UnitId>,
    pub units: Vec<ListedUnit>,
}

/// Group units by family, families in `Family::ALL` order, empty ones skipped
pub fn list_by_family(units: &[Unit], locale: &Locale<'_>) -> Vec<FamilyListing> {
    Family::ALL.into_iter()
        .filter_map(|family| {
            let listed: Vec<ListedUnit> = units.iter()
                .filter(|u| u.family == family)
                .map(|u| ListedUnit {
                    id: u.id,
                    code: u.code(locale.requested, locale.fallback).map(str::to_string),
                    name: u.name(locale.requested, locale.fallback),
                    value: u.value.clone(),
                    status: u.status,
                    base: u.is_base(),
                })
                .collect();

            if listed.is_empty() {
                return None;
            }
            let base = listed.iter().find(|u| u.base).map(|u| u.id);
            Some(FamilyListing { family, base, units: listed })
        })
        .collect()
}

/// Plain-text rendering of a listing
pub fn render_listing(listing: &[FamilyListing]) -> String {
    let mut out = String::new();
    for group in listing {
        let _ = writeln!(out, "## {}", group.family);
        for unit in &group.units {
            let _ = writeln!(
                out,
                "- #{} {}{}: {}{}{}",
                unit.id,
                unit.name,
                unit.code.as_ref().map(|c| format!(" ({})", c)).unwrap_or_default(),
                unit.value,
                if unit.base { " [base]" } else { "" },
                if unit.status { "" } else { " [inactive]" },
            );
        }
        out.push('\n');
    }
    out
}

/// Export serialization format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Csv,
}

impl ExportFormat {
    pub fn parse(s: &str) -> Option<ExportFormat> {
        match s.trim().to_lowercase().as_str() {
            "json" => Some(ExportFormat::Json),
            "csv" => Some(ExportFormat::Csv),
            _ => None,
        }
    }
}

const CSV_HEADER: &str = "id,type,value,status,locale,name,code,placement,description,created_at,updated_at";

/// Serialize every unit with translations and timestamps
pub fn export(units: &[Unit], format: ExportFormat) -> Result<String, RegistryError> {
    match format {
        ExportFormat::Json => serde_json::to_string_pretty(units)
            .map_err(|e| RegistryError::Export(e.to_string())),
        ExportFormat::Csv => Ok(export_csv(units)),
    }
}

/// One row per translation; units without translations get one row with empty columns
fn export_csv(units: &[Unit]) -> String {
    let mut out = String::from(CSV_HEADER);
    out.push('\n');

    for unit in units {
        let head = [
            unit.id.to_string(),
            unit.family.to_string(),
            unit.value.to_string(),
            unit.status.to_string(),
        ];
        let tail = [unit.created_at.to_rfc3339(), unit.updated_at.to_rfc3339()];

        let rows: Vec<[String; 5]> = if unit.translations.is_empty() {
            vec![Default::default()]
        } else {
            unit.translations.iter()
                .map(|t| [
                    t.locale.clone(),
                    t.name.clone(),
                    t.code.clone(),
                    t.placement.as_str().to_string(),
                    t.description.clone().unwrap_or_default(),
                ])
                .collect()
        };

        for row in rows {
            let fields: Vec<String> = head.iter()
                .chain(row.iter())
                .chain(tail.iter())
                .map(|f| csv_field(f))
                .collect();
            out.push_str(&fields.join(","));
            out.push('\n');
        }
    }

    out
}

/// Quote a field when it contains a delimiter, quote or line break
fn csv_field(field: &str) -> String {
    if field.contains(&[',', '"', '\n', '\r'][..]) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
