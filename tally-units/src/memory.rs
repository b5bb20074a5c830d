//! In-memory storage implementation
//!
//! Provides BTreeMap-based storage without external dependencies.
//! A transaction works on a clone of the committed state while holding
//! the write lock, then swaps it in once the closure and the constraint
//! check both succeed.

use std::collections::{BTreeMap, HashMap};
use chrono::Utc;
use parking_lot::Mutex;
use tally_core::{Family, RegistryError, UnitId};
use crate::store::{UnitStore, UnitTransaction};
use crate::{NewUnit, Unit, UnitReference, UsageGuard};

#[derive(Debug, Clone)]
struct State {
    units: BTreeMap<UnitId, Unit>,
    references: Vec<UnitReference>,
    next_id: u64,
}

impl Default for State {
    fn default() -> Self {
        State { units: BTreeMap::new(), references: Vec::new(), next_id: 1 }
    }
}

impl State {
    /// Storage-level constraints checked before every commit:
    /// unique (family, base) and references pointing at live units
    fn check_constraints(&self) -> Result<(), RegistryError> {
        let mut bases: HashMap<Family, usize> = HashMap::new();
        for unit in self.units.values().filter(|u| u.is_base()) {
            *bases.entry(unit.family).or_default() += 1;
        }
        if let Some((family, count)) = bases.into_iter().find(|(_, count)| *count > 1) {
            return Err(RegistryError::Storage(format!(
                "unique constraint violated: family '{}' would have {} base units", family, count
            )));
        }

        if let Some(dangling) = self.references.iter().find(|r| !self.units.contains_key(&r.unit_id)) {
            return Err(RegistryError::Storage(format!(
                "foreign key violated: {} {} references missing unit #{}",
                dangling.entity_type, dangling.entity_id, dangling.unit_id
            )));
        }

        Ok(())
    }
}

impl UsageGuard for State {
    fn usage_count(&self, unit: UnitId) -> u64 {
        self.references.as_slice().usage_count(unit)
    }
}

impl UnitTransaction for State {
    fn get(&self, id: UnitId) -> Option<Unit> {
        self.units.get(&id).cloned()
    }

    fn units_of(&self, family: Family) -> Vec<Unit> {
        self.units.values().filter(|u| u.family == family).cloned().collect()
    }

    fn insert(&mut self, draft: NewUnit) -> Result<Unit, RegistryError> {
        let id = UnitId(self.next_id);
        self.next_id += 1;

        let now = Utc::now();
        let unit = Unit {
            id,
            family: draft.family,
            value: draft.value,
            status: draft.status,
            translations: draft.translations,
            created_at: now,
            updated_at: now,
        };
        self.units.insert(id, unit.clone());
        Ok(unit)
    }

    fn save(&mut self, mut unit: Unit) -> Result<Unit, RegistryError> {
        let existing = self.units.get(&unit.id).ok_or_else(|| RegistryError::not_found(unit.id))?;
        if existing.family != unit.family {
            return Err(RegistryError::Storage(format!("unit #{} cannot change family", unit.id)));
        }

        unit.created_at = existing.created_at;
        unit.updated_at = Utc::now();
        self.units.insert(unit.id, unit.clone());
        Ok(unit)
    }

    fn remove(&mut self, id: UnitId) -> Result<Unit, RegistryError> {
        self.units.remove(&id).ok_or_else(|| RegistryError::not_found(id))
    }

    fn attach(&mut self, reference: UnitReference) -> Result<(), RegistryError> {
        if !self.units.contains_key(&reference.unit_id) {
            return Err(RegistryError::not_found(reference.unit_id));
        }
        self.references.push(reference);
        Ok(())
    }

    fn detach_all(&mut self, entity_type: &str, entity_id: &str) -> usize {
        let before = self.references.len();
        self.references.retain(|r| !r.belongs_to(entity_type, entity_id));
        before - self.references.len()
    }
}

/// In-memory unit store
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get number of stored units
    pub fn len(&self) -> usize {
        self.state.lock().units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().units.is_empty()
    }
}

impl UnitStore for MemoryStore {
    fn transaction<T>(
        &self,
        work: impl FnOnce(&mut dyn UnitTransaction) -> Result<T, RegistryError>,
    ) -> Result<T, RegistryError> {
        let mut committed = self.state.lock();
        let mut working = committed.clone();

        let out = work(&mut working)?;
        working.check_constraints()?;

        *committed = working;
        Ok(out)
    }

    fn get(&self, id: UnitId) -> Option<Unit> {
        self.state.lock().units.get(&id).cloned()
    }

    fn units(&self) -> Vec<Unit> {
        self.state.lock().units.values().cloned().collect()
    }

    fn references_for(&self, entity_type: &str, entity_id: &str) -> Vec<UnitReference> {
        self.state.lock().references.iter()
            .filter(|r| r.belongs_to(entity_type, entity_id))
            .cloned()
            .collect()
    }

    fn usage_count(&self, id: UnitId) -> u64 {
        self.state.lock().usage_count(id)
    }
}
