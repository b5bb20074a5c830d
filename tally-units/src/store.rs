//! Storage interface for unit records
//!
//! Mutations run inside `UnitStore::transaction`: the closure sees a
//! consistent working state, and its effects are committed only if it
//! returns `Ok`. Any error leaves the store untouched.

use tally_core::{Family, RegistryError, UnitId};
use crate::{NewUnit, Unit, UnitReference, UsageGuard};

/// Working state handed to a transaction
pub trait UnitTransaction: UsageGuard {
    fn get(&self, id: UnitId) -> Option<Unit>;

    /// All units of a family, ordered by id
    fn units_of(&self, family: Family) -> Vec<Unit>;

    /// Insert a new record, assigning its id and timestamps
    fn insert(&mut self, draft: NewUnit) -> Result<Unit, RegistryError>;

    /// Overwrite an existing record, bumping `updated_at`
    fn save(&mut self, unit: Unit) -> Result<Unit, RegistryError>;

    fn remove(&mut self, id: UnitId) -> Result<Unit, RegistryError>;

    fn attach(&mut self, reference: UnitReference) -> Result<(), RegistryError>;

    /// Remove every reference held by one entity, returning how many went
    fn detach_all(&mut self, entity_type: &str, entity_id: &str) -> usize;

    /// The unit with `value == 1`, if the family has one
    fn base_of(&self, family: Family) -> Option<Unit> {
        self.units_of(family).into_iter().find(Unit::is_base)
    }
}

/// Owner of unit records and their references
pub trait UnitStore: Send + Sync {
    /// Run `work` atomically; concurrent transactions are serialized
    fn transaction<T>(
        &self,
        work: impl FnOnce(&mut dyn UnitTransaction) -> Result<T, RegistryError>,
    ) -> Result<T, RegistryError>;

    fn get(&self, id: UnitId) -> Option<Unit>;

    /// Snapshot of every unit, ordered by id
    fn units(&self) -> Vec<Unit>;

    fn references_for(&self, entity_type: &str, entity_id: &str) -> Vec<UnitReference>;

    fn usage_count(&self, id: UnitId) -> u64;
}
