//! Registry errors
//!
//! Every invariant breach is a distinct variant so callers can tell
//! "unit 7 not found" apart from "cannot convert weight to length".
//! `ErrorReport` is the serializable form handed to clients.

use crate::{Family, NumberError, UnitId};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Standard error codes (machine-readable)
pub mod codes {
    pub const INVALID_BASE_VALUE: &str = "INVALID_BASE_VALUE";
    pub const BASE_VALUE_ALREADY_ASSIGNED: &str = "BASE_VALUE_ALREADY_ASSIGNED";
    pub const CANNOT_CHANGE_BASE_VALUE: &str = "CANNOT_CHANGE_BASE_VALUE";
    pub const CANNOT_DELETE_BASE: &str = "CANNOT_DELETE_BASE";
    pub const ZERO_VALUE_BASE: &str = "ZERO_VALUE_BASE";
    pub const NOT_FOUND: &str = "NOT_FOUND";
    pub const TYPE_MISMATCH: &str = "TYPE_MISMATCH";
    pub const DIV_ZERO: &str = "DIV_ZERO";
    pub const UNIT_IN_USE: &str = "UNIT_IN_USE";
    pub const INVALID_VALUE: &str = "INVALID_VALUE";
    pub const STORAGE: &str = "STORAGE";
    pub const EXPORT: &str = "EXPORT";
}

/// How a missing unit was looked up
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnitLookup {
    Id(UnitId),
    Code(String),
}

impl fmt::Display for UnitLookup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnitLookup::Id(id) => write!(f, "#{}", id),
            UnitLookup::Code(code) => write!(f, "with code '{}'", code),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("the first unit of family '{family}' must have value 1, got {value}")]
    InvalidBaseValue { family: Family, value: String },

    #[error("family '{family}' already has a base unit (#{base})")]
    BaseValueAlreadyAssigned { family: Family, base: UnitId },

    #[error("unit #{id} is the base of its family, its value must stay 1")]
    CannotChangeBaseValue { id: UnitId },

    #[error("unit #{id} is the base of '{family}' and {siblings} other unit(s) still exist")]
    CannotDeleteBaseWhileSiblingsExist { id: UnitId, family: Family, siblings: usize },

    #[error("unit #{id} has value 0 and cannot become the base")]
    ZeroValueCannotBeBase { id: UnitId },

    #[error("unit {0} not found")]
    NotFound(UnitLookup),

    #[error("cannot convert between families '{from}' and '{to}'")]
    TypeMismatch { from: Family, to: Family },

    #[error("division by zero: unit #{id} has value 0")]
    DivisionByZero { id: UnitId },

    #[error("unit #{id} is used in {count} place(s)")]
    UnitInUse { id: UnitId, count: u64 },

    #[error("invalid value: {0}")]
    InvalidValue(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("export failed: {0}")]
    Export(String),
}

impl RegistryError {
    pub fn not_found(id: UnitId) -> Self {
        Self::NotFound(UnitLookup::Id(id))
    }

    pub fn code_not_found(code: impl Into<String>) -> Self {
        Self::NotFound(UnitLookup::Code(code.into()))
    }

    /// Machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidBaseValue { .. } => codes::INVALID_BASE_VALUE,
            Self::BaseValueAlreadyAssigned { .. } => codes::BASE_VALUE_ALREADY_ASSIGNED,
            Self::CannotChangeBaseValue { .. } => codes::CANNOT_CHANGE_BASE_VALUE,
            Self::CannotDeleteBaseWhileSiblingsExist { .. } => codes::CANNOT_DELETE_BASE,
            Self::ZeroValueCannotBeBase { .. } => codes::ZERO_VALUE_BASE,
            Self::NotFound(_) => codes::NOT_FOUND,
            Self::TypeMismatch { .. } => codes::TYPE_MISMATCH,
            Self::DivisionByZero { .. } => codes::DIV_ZERO,
            Self::UnitInUse { .. } => codes::UNIT_IN_USE,
            Self::InvalidValue(_) => codes::INVALID_VALUE,
            Self::Storage(_) => codes::STORAGE,
            Self::Export(_) => codes::EXPORT,
        }
    }

    /// Suggestion for fixing the error
    pub fn suggestion(&self) -> Option<String> {
        match self {
            Self::InvalidBaseValue { .. } => Some("Create the family's base unit first, with value 1".to_string()),
            Self::BaseValueAlreadyAssigned { base, .. } => {
                Some(format!("Use rebase to make another unit the base instead of #{}", base))
            }
            Self::CannotChangeBaseValue { .. } => Some("Use rebase to promote a different unit".to_string()),
            Self::CannotDeleteBaseWhileSiblingsExist { .. } => {
                Some("Delete the other units of the family first, or rebase to another unit".to_string())
            }
            Self::ZeroValueCannotBeBase { .. } => Some("Give the unit a non-zero value before promoting it".to_string()),
            Self::NotFound(_) => Some("Use list_units to see available units".to_string()),
            Self::TypeMismatch { .. } => Some("Pick two units of the same family".to_string()),
            Self::DivisionByZero { .. } => Some("Give the target unit a non-zero value".to_string()),
            Self::UnitInUse { .. } => Some("Detach the unit from its entities first".to_string()),
            Self::InvalidValue(_) | Self::Storage(_) | Self::Export(_) => None,
        }
    }

    /// Reference count carried by usage conflicts
    pub fn usage_count(&self) -> Option<u64> {
        match self {
            Self::UnitInUse { count, .. } => Some(*count),
            _ => None,
        }
    }

    pub fn report(&self) -> ErrorReport {
        ErrorReport {
            code: self.code().to_string(),
            message: self.to_string(),
            suggestion: self.suggestion(),
            usage_count: self.usage_count(),
        }
    }
}

impl From<NumberError> for RegistryError {
    fn from(err: NumberError) -> Self {
        Self::InvalidValue(err.to_string())
    }
}

/// Structured error for clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorReport {
    /// Machine-readable error code
    pub code: String,

    /// Human-readable error message
    pub message: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage_count: Option<u64>,
}

impl fmt::Display for ErrorReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)?;
        if let Some(ref suggestion) = self.suggestion {
            write!(f, " (suggestion: {})", suggestion)?;
        }
        Ok(())
    }
}
