//! Unit registry: CRUD with family invariant enforcement
//!
//! Within a family at most one unit has `value == 1` (the base unit).
//! The first unit of a family must be its base, the base can only move
//! through `rebase`, and a base with siblings cannot be deleted.

use tracing::{debug, info};
use tally_core::{Family, Number, RegistryError, UnitId};
use crate::convert;
use crate::memory::MemoryStore;
use crate::store::{UnitStore, UnitTransaction};
use crate::{NewUnit, Unit, UnitPatch, UnitReference};

/// Registry of units backed by an injected store
pub struct Registry<S: UnitStore = MemoryStore> {
    store: S,
}

impl Registry<MemoryStore> {
    /// Registry over a fresh in-memory store
    pub fn in_memory() -> Self {
        Registry::new(MemoryStore::new())
    }
}

impl<S: UnitStore> Registry<S> {
    pub fn new(store: S) -> Self {
        Registry { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    // ========== Mutations ==========

    /// Create a unit, validated against the family invariant
    pub fn create(&self, draft: NewUnit) -> Result<Unit, RegistryError> {
        ensure_non_negative(&draft.value)?;

        let unit = self.store.transaction(|tx| {
            let family = draft.family;

            match tx.base_of(family) {
                Some(base) if draft.value.is_one() => {
                    return Err(RegistryError::BaseValueAlreadyAssigned { family, base: base.id });
                }
                None if tx.units_of(family).is_empty() && !draft.value.is_one() => {
                    return Err(RegistryError::InvalidBaseValue {
                        family,
                        value: draft.value.to_string(),
                    });
                }
                _ => {}
            }

            tx.insert(draft)
        })?;

        info!(id = %unit.id, family = %unit.family, value = %unit.value, "unit created");
        Ok(unit)
    }

    /// Update value, status or translations of a unit
    pub fn update(&self, id: UnitId, patch: UnitPatch) -> Result<Unit, RegistryError> {
        if let Some(ref value) = patch.value {
            ensure_non_negative(value)?;
        }

        let unit = self.store.transaction(|tx| {
            let mut unit = tx.get(id).ok_or_else(|| RegistryError::not_found(id))?;

            if let Some(value) = patch.value {
                if unit.is_base() && !value.is_one() {
                    return Err(RegistryError::CannotChangeBaseValue { id });
                }
                if !unit.is_base() && value.is_one() {
                    // A non-empty family always has its base already
                    let base = tx.base_of(unit.family)
                        .map(|b| b.id)
                        .unwrap_or(id);
                    return Err(RegistryError::BaseValueAlreadyAssigned { family: unit.family, base });
                }
                unit.value = value;
            }
            if let Some(status) = patch.status {
                unit.status = status;
            }
            if let Some(translations) = patch.translations {
                unit.translations = translations;
            }

            tx.save(unit)
        })?;

        debug!(id = %unit.id, value = %unit.value, status = unit.status, "unit updated");
        Ok(unit)
    }

    /// Delete an unreferenced unit
    pub fn delete(&self, id: UnitId) -> Result<(), RegistryError> {
        let removed = self.store.transaction(|tx| {
            let unit = tx.get(id).ok_or_else(|| RegistryError::not_found(id))?;

            let count = tx.usage_count(id);
            if count > 0 {
                return Err(RegistryError::UnitInUse { id, count });
            }

            if unit.is_base() {
                let siblings = tx.units_of(unit.family).len() - 1;
                if siblings > 0 {
                    return Err(RegistryError::CannotDeleteBaseWhileSiblingsExist {
                        id,
                        family: unit.family,
                        siblings,
                    });
                }
            }

            tx.remove(id)
        })?;

        info!(id = %removed.id, family = %removed.family, "unit deleted");
        Ok(())
    }

    /// Promote `id` to base of `family`, rescaling every sibling
    ///
    /// Returns the family's units after the rebase, ordered by id.
    pub fn rebase(&self, family: Family, id: UnitId) -> Result<Vec<Unit>, RegistryError> {
        let units = self.store.transaction(|tx| rebase_in(tx, family, id))?;
        info!(%family, id = %id, units = units.len(), "family rebased");
        Ok(units)
    }

    /// Attach a unit and a magnitude (in that unit's scale) to an entity
    pub fn attach(
        &self,
        entity_type: &str,
        entity_id: &str,
        unit_id: UnitId,
        value: Number,
    ) -> Result<UnitReference, RegistryError> {
        let reference = UnitReference::new(entity_type, entity_id, unit_id, value);
        self.store.transaction(|tx| tx.attach(reference.clone()))?;
        debug!(entity_type, entity_id, unit = %unit_id, "unit attached");
        Ok(reference)
    }

    /// Drop every unit reference held by an entity
    pub fn detach_all(&self, entity_type: &str, entity_id: &str) -> Result<usize, RegistryError> {
        let removed = self.store.transaction(|tx| Ok(tx.detach_all(entity_type, entity_id)))?;
        debug!(entity_type, entity_id, removed, "unit references removed");
        Ok(removed)
    }

    // ========== Queries ==========

    pub fn get(&self, id: UnitId) -> Result<Unit, RegistryError> {
        self.store.get(id).ok_or_else(|| RegistryError::not_found(id))
    }

    /// Find a unit by its code in any locale; the lowest id wins
    pub fn find_by_code(&self, code: &str) -> Result<Unit, RegistryError> {
        self.store.units()
            .into_iter()
            .find(|u| u.has_code(code))
            .ok_or_else(|| RegistryError::code_not_found(code))
    }

    pub fn units(&self) -> Vec<Unit> {
        self.store.units()
    }

    pub fn units_of(&self, family: Family) -> Vec<Unit> {
        self.store.units().into_iter().filter(|u| u.family == family).collect()
    }

    pub fn base_of(&self, family: Family) -> Option<Unit> {
        self.units_of(family).into_iter().find(Unit::is_base)
    }

    pub fn usage_count(&self, id: UnitId) -> u64 {
        self.store.usage_count(id)
    }

    pub fn references_for(&self, entity_type: &str, entity_id: &str) -> Vec<UnitReference> {
        self.store.references_for(entity_type, entity_id)
    }

    /// Convert between two stored units
    pub fn convert(&self, from: UnitId, to: UnitId, amount: &Number) -> Result<Number, RegistryError> {
        let from = self.get(from)?;
        let to = self.get(to)?;
        convert::convert(&from, &to, amount)
    }

    /// Convert between two units looked up by code
    pub fn convert_codes(&self, from: &str, to: &str, amount: &Number) -> Result<(Unit, Unit, Number), RegistryError> {
        let from = self.find_by_code(from)?;
        let to = self.find_by_code(to)?;
        let result = convert::convert(&from, &to, amount)?;
        Ok((from, to, result))
    }
}

fn ensure_non_negative(value: &Number) -> Result<(), RegistryError> {
    if value.is_negative() {
        return Err(RegistryError::InvalidValue(format!("unit value must be >= 0, got {}", value)));
    }
    Ok(())
}

fn rebase_in(tx: &mut dyn UnitTransaction, family: Family, id: UnitId) -> Result<Vec<Unit>, RegistryError> {
    let promoted = tx.get(id).ok_or_else(|| RegistryError::not_found(id))?;
    if promoted.family != family {
        return Err(RegistryError::TypeMismatch { from: promoted.family, to: family });
    }
    if promoted.value.is_zero() {
        return Err(RegistryError::ZeroValueCannotBeBase { id });
    }

    let count = tx.usage_count(id);
    if count > 0 {
        return Err(RegistryError::UnitInUse { id, count });
    }

    let units = tx.units_of(family);
    if promoted.is_base() {
        return Ok(units);
    }

    let rescaled = convert::rescale(&units, &promoted)?;
    let mut saved = Vec::with_capacity(units.len());
    for (mut unit, (unit_id, value)) in units.into_iter().zip(rescaled) {
        debug_assert_eq!(unit.id, unit_id);
        unit.value = if unit_id == id { Number::one() } else { value };
        saved.push(tx.save(unit)?);
    }

    Ok(saved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Translation;

    fn n(s: &str) -> Number {
        Number::from_str(s).unwrap()
    }

    fn weight(value: &str, code: &str) -> NewUnit {
        NewUnit::new(Family::Weight, n(value)).with_translation(Translation::new("en", code, code))
    }

    /// gram=1, kilogram=1000, ton=1000000
    fn weights() -> (Registry, Unit, Unit, Unit) {
        let registry = Registry::in_memory();
        let g = registry.create(weight("1", "g")).unwrap();
        let kg = registry.create(weight("1000", "kg")).unwrap();
        let t = registry.create(weight("1000000", "t")).unwrap();
        (registry, g, kg, t)
    }

    fn base_count(registry: &Registry, family: Family) -> usize {
        registry.units_of(family).iter().filter(|u| u.is_base()).count()
    }

    #[test]
    fn test_first_unit_must_be_base() {
        let registry = Registry::in_memory();
        let err = registry.create(weight("1000", "kg")).unwrap_err();
        assert_eq!(err, RegistryError::InvalidBaseValue { family: Family::Weight, value: "1000".to_string() });
        assert!(registry.units().is_empty());
    }

    #[test]
    fn test_second_base_rejected() {
        let (registry, g, _, _) = weights();
        let draft = weight("1", "lb").with_status(false);
        let err = registry.create(draft).unwrap_err();
        assert_eq!(err, RegistryError::BaseValueAlreadyAssigned { family: Family::Weight, base: g.id });
        assert_eq!(base_count(&registry, Family::Weight), 1);
    }

    #[test]
    fn test_families_are_independent() {
        let (registry, _, _, _) = weights();
        let m = registry.create(NewUnit::new(Family::Length, n("1"))).unwrap();
        assert!(m.is_base());
        assert_eq!(base_count(&registry, Family::Length), 1);
    }

    #[test]
    fn test_non_base_values_may_collide() {
        let (registry, _, kg, _) = weights();
        let twin = registry.create(weight("1000", "kg2")).unwrap();
        assert_eq!(twin.value, kg.value);
    }

    #[test]
    fn test_zero_and_negative_values() {
        let (registry, _, _, _) = weights();
        let zero = registry.create(weight("0", "void")).unwrap();
        assert!(zero.value.is_zero());

        let err = registry.create(weight("-5", "neg")).unwrap_err();
        assert!(matches!(err, RegistryError::InvalidValue(_)));
    }

    #[test]
    fn test_base_value_is_immutable() {
        let (registry, g, _, _) = weights();
        let err = registry.update(g.id, UnitPatch::value(n("2"))).unwrap_err();
        assert_eq!(err, RegistryError::CannotChangeBaseValue { id: g.id });

        // Re-submitting 1 and toggling status is fine
        let mut patch = UnitPatch::value(n("1.0"));
        patch.status = Some(false);
        let g = registry.update(g.id, patch).unwrap();
        assert!(g.is_base());
        assert!(!g.status);
    }

    #[test]
    fn test_non_base_cannot_become_base_by_update() {
        let (registry, g, kg, _) = weights();
        let err = registry.update(kg.id, UnitPatch::value(n("1"))).unwrap_err();
        assert_eq!(err, RegistryError::BaseValueAlreadyAssigned { family: Family::Weight, base: g.id });
        assert_eq!(base_count(&registry, Family::Weight), 1);
    }

    #[test]
    fn test_update_non_base_value_and_translations() {
        let (registry, _, kg, _) = weights();
        let patch = UnitPatch {
            value: Some(n("999.5")),
            status: None,
            translations: Some(vec![Translation::new("it", "chilogrammo", "kg")]),
        };
        let kg = registry.update(kg.id, patch).unwrap();
        assert_eq!(kg.value, n("999.5"));
        assert_eq!(kg.name("it", "en"), "chilogrammo");
        assert_eq!(kg.translations.len(), 1);
    }

    #[test]
    fn test_update_missing_unit() {
        let registry = Registry::in_memory();
        let err = registry.update(UnitId(42), UnitPatch::status(false)).unwrap_err();
        assert_eq!(err, RegistryError::not_found(UnitId(42)));
    }

    #[test]
    fn test_delete_unit_in_use_reports_count() {
        let (registry, _, kg, _) = weights();
        registry.attach("product", "1", kg.id, n("2")).unwrap();
        registry.attach("product", "2", kg.id, n("3")).unwrap();
        registry.attach("recipe", "9", kg.id, n("0.5")).unwrap();

        let err = registry.delete(kg.id).unwrap_err();
        assert_eq!(err, RegistryError::UnitInUse { id: kg.id, count: 3 });
        assert_eq!(err.usage_count(), Some(registry.usage_count(kg.id)));

        registry.detach_all("product", "1").unwrap();
        registry.detach_all("product", "2").unwrap();
        registry.detach_all("recipe", "9").unwrap();
        registry.delete(kg.id).unwrap();
        assert!(registry.get(kg.id).is_err());
    }

    #[test]
    fn test_delete_base_only_after_siblings() {
        let (registry, g, kg, t) = weights();

        let err = registry.delete(g.id).unwrap_err();
        assert_eq!(err, RegistryError::CannotDeleteBaseWhileSiblingsExist {
            id: g.id,
            family: Family::Weight,
            siblings: 2,
        });

        registry.delete(kg.id).unwrap();
        registry.delete(t.id).unwrap();
        registry.delete(g.id).unwrap();
        assert!(registry.units_of(Family::Weight).is_empty());

        // Family is brand new again
        let err = registry.create(weight("1000", "kg")).unwrap_err();
        assert!(matches!(err, RegistryError::InvalidBaseValue { .. }));
    }

    #[test]
    fn test_delete_missing_unit() {
        let registry = Registry::in_memory();
        assert_eq!(registry.delete(UnitId(1)), Err(RegistryError::not_found(UnitId(1))));
    }

    #[test]
    fn test_rebase_to_kilogram() {
        let (registry, g, kg, t) = weights();
        let units = registry.rebase(Family::Weight, kg.id).unwrap();
        assert_eq!(units.len(), 3);

        assert_eq!(registry.get(g.id).unwrap().value, n("0.001"));
        assert_eq!(registry.get(kg.id).unwrap().value, n("1"));
        assert_eq!(registry.get(t.id).unwrap().value, n("1000"));
        assert_eq!(registry.base_of(Family::Weight).unwrap().id, kg.id);
        assert_eq!(base_count(&registry, Family::Weight), 1);
    }

    #[test]
    fn test_rebase_keeps_conversions() {
        let (registry, g, kg, t) = weights();
        let before = registry.convert(t.id, g.id, &n("2.5")).unwrap();
        registry.rebase(Family::Weight, kg.id).unwrap();
        let after = registry.convert(t.id, g.id, &n("2.5")).unwrap();
        assert_eq!(before, after);
    }

    #[test]
    fn test_rebase_leaves_other_families() {
        let (registry, _, kg, _) = weights();
        let km = {
            registry.create(NewUnit::new(Family::Length, n("1"))).unwrap();
            registry.create(NewUnit::new(Family::Length, n("1000"))).unwrap()
        };
        registry.rebase(Family::Weight, kg.id).unwrap();
        assert_eq!(registry.get(km.id).unwrap().value, n("1000"));
    }

    #[test]
    fn test_rebase_current_base_is_noop() {
        let (registry, g, kg, _) = weights();
        registry.rebase(Family::Weight, g.id).unwrap();
        assert_eq!(registry.get(kg.id).unwrap().value, n("1000"));
    }

    #[test]
    fn test_rebase_guards() {
        let (registry, _, kg, _) = weights();

        let zero = registry.create(weight("0", "void")).unwrap();
        assert_eq!(
            registry.rebase(Family::Weight, zero.id),
            Err(RegistryError::ZeroValueCannotBeBase { id: zero.id })
        );

        assert_eq!(
            registry.rebase(Family::Length, kg.id),
            Err(RegistryError::TypeMismatch { from: Family::Weight, to: Family::Length })
        );

        assert_eq!(
            registry.rebase(Family::Weight, UnitId(99)),
            Err(RegistryError::not_found(UnitId(99)))
        );

        registry.attach("product", "1", kg.id, n("1")).unwrap();
        assert_eq!(
            registry.rebase(Family::Weight, kg.id),
            Err(RegistryError::UnitInUse { id: kg.id, count: 1 })
        );
        assert_eq!(registry.get(kg.id).unwrap().value, n("1000"));
    }

    #[test]
    fn test_rebase_ignores_sibling_references() {
        let (registry, g, kg, _) = weights();
        let reference = registry.attach("product", "1", g.id, n("250")).unwrap();
        registry.rebase(Family::Weight, kg.id).unwrap();

        // Stored in gram's own scale, still 250 g
        assert_eq!(registry.references_for("product", "1"), vec![reference]);
    }

    #[test]
    fn test_base_count_after_operation_sequence() {
        let (registry, g, kg, t) = weights();
        let lb = registry.create(weight("453.59237", "lb")).unwrap();
        registry.rebase(Family::Weight, lb.id).unwrap();
        assert_eq!(base_count(&registry, Family::Weight), 1);

        registry.update(g.id, UnitPatch::value(n("0.002"))).unwrap();
        assert_eq!(
            registry.update(lb.id, UnitPatch::value(n("3"))),
            Err(RegistryError::CannotChangeBaseValue { id: lb.id })
        );
        assert_eq!(
            registry.create(weight("1", "dup")),
            Err(RegistryError::BaseValueAlreadyAssigned { family: Family::Weight, base: lb.id })
        );
        registry.delete(t.id).unwrap();
        registry.rebase(Family::Weight, kg.id).unwrap();
        assert_eq!(base_count(&registry, Family::Weight), 1);
        assert!(registry.get(kg.id).unwrap().is_base());
    }

    #[test]
    fn test_find_by_code() {
        let (registry, _, kg, _) = weights();
        assert_eq!(registry.find_by_code("kg").unwrap().id, kg.id);
        assert_eq!(registry.find_by_code("stone"), Err(RegistryError::code_not_found("stone")));
    }

    #[test]
    fn test_convert_by_id_and_code() {
        let (registry, g, kg, _) = weights();
        assert_eq!(registry.convert(g.id, kg.id, &n("1")).unwrap(), n("0.001"));
        assert_eq!(registry.convert(kg.id, g.id, &n("500")).unwrap(), n("500000"));

        let (from, to, result) = registry.convert_codes("t", "kg", &n("2")).unwrap();
        assert_eq!((from.value, to.value, result), (n("1000000"), n("1000"), n("2000")));
    }

    #[test]
    fn test_convert_across_families_fails() {
        let (registry, g, _, _) = weights();
        let m = registry.create(NewUnit::new(Family::Length, n("1"))).unwrap();
        assert_eq!(
            registry.convert(g.id, m.id, &n("1")),
            Err(RegistryError::TypeMismatch { from: Family::Weight, to: Family::Length })
        );
    }

    #[test]
    fn test_concurrent_first_units_leave_one_base() {
        use std::sync::Arc;
        use std::thread;

        let registry = Arc::new(Registry::in_memory());
        let handles: Vec<_> = (0..8).map(|_| {
            let registry = Arc::clone(&registry);
            thread::spawn(move || registry.create(NewUnit::new(Family::Time, n("1"))).is_ok())
        }).collect();

        let created = handles.into_iter().map(|h| h.join().unwrap()).filter(|ok| *ok).count();
        assert_eq!(created, 1);
        assert_eq!(base_count(&registry, Family::Time), 1);
    }
}
