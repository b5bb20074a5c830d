//! Tally Units - Unit Registry and Ratio Conversion
//!
//! Units are grouped into families (weight, length, currency, ...).
//! Each unit's `value` is its size in base units of its family, and
//! exactly one unit per non-empty family is the base (`value == 1`).
//!
//! - `Registry`: create/update/delete/rebase with family invariants
//! - `convert`: stateless ratio conversion between two units
//! - `UnitStore` / `MemoryStore`: transactional storage
//! - `catalog`: seed data for common families
//! - `report`: conversion sentences, listings, JSON/CSV export

mod unit;
mod usage;
mod convert;
mod registry;
pub mod store;
pub mod memory;
pub mod catalog;
pub mod report;

pub use unit::{Unit, NewUnit, UnitPatch, Translation, Placement};
pub use usage::{UsageGuard, UnitReference};
pub use convert::{convert, convert_f64, rescale};
pub use registry::Registry;
pub use store::{UnitStore, UnitTransaction};
pub use memory::MemoryStore;
pub use catalog::{Catalog, seed};

pub use tally_core::{Family, Number, RegistryError, UnitId};
