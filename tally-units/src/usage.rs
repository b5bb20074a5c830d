//! External references to units (the "has-unit" association)
//!
//! A reference stores a magnitude in the referenced unit's own scale,
//! never in base units, so rebasing a family leaves it valid.

use serde::{Serialize, Deserialize};
use tally_core::{Number, UnitId};

/// Answers "how many external entities point at this unit"
///
/// Consulted inside the same transaction as the mutation it gates.
pub trait UsageGuard {
    fn usage_count(&self, unit: UnitId) -> u64;
}

/// An external entity's association to a unit and a magnitude in that unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitReference {
    pub entity_type: String,
    pub entity_id: String,
    pub unit_id: UnitId,
    pub value: Number,
}

impl UnitReference {
    pub fn new(entity_type: &str, entity_id: &str, unit_id: UnitId, value: Number) -> Self {
        UnitReference {
            entity_type: entity_type.to_string(),
            entity_id: entity_id.to_string(),
            unit_id,
            value,
        }
    }

    pub fn belongs_to(&self, entity_type: &str, entity_id: &str) -> bool {
        self.entity_type == entity_type && self.entity_id == entity_id
    }
}

impl UsageGuard for [UnitReference] {
    fn usage_count(&self, unit: UnitId) -> u64 {
        self.iter().filter(|r| r.unit_id == unit).count() as u64
    }
}
