//! Seed catalog - common units organized by family
//!
//! Values are sizes in the family's base unit, which is always listed
//! first so it is created with value 1. Seeding goes through
//! `Registry::create`, so the catalog obeys the same invariants as
//! any caller.

use tracing::{debug, info};
use tally_core::{Family, Number, RegistryError};
use crate::store::UnitStore;
use crate::{NewUnit, Placement, Registry, Translation};

/// One catalog line: value in base units, code, English name
#[derive(Debug, Clone)]
pub struct CatalogEntry {
    pub family: Family,
    pub value: &'static str,
    pub code: &'static str,
    pub name: &'static str,
    pub placement: Placement,
}

impl CatalogEntry {
    fn draft(&self) -> Result<NewUnit, RegistryError> {
        let value = Number::from_str(self.value)?;
        let translation = Translation::new("en", self.name, self.code).placed(self.placement);
        Ok(NewUnit::new(self.family, value).with_translation(translation))
    }
}

/// Ordered list of seed units
pub struct Catalog {
    entries: Vec<CatalogEntry>,
}

impl Catalog {
    pub fn new() -> Self {
        let mut catalog = Catalog { entries: Vec::new() };
        catalog.register_all_units();
        catalog
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    /// Entries of one family, base first
    pub fn by_family(&self, family: Family) -> Vec<&CatalogEntry> {
        self.entries.iter().filter(|e| e.family == family).collect()
    }

    fn register(&mut self, family: Family, value: &'static str, code: &'static str, name: &'static str) {
        self.entries.push(CatalogEntry { family, value, code, name, placement: Placement::Right });
    }

    fn register_left(&mut self, family: Family, value: &'static str, code: &'static str, name: &'static str) {
        self.entries.push(CatalogEntry { family, value, code, name, placement: Placement::Left });
    }

    fn register_all_units(&mut self) {
        self.register_weight_units();
        self.register_length_units();
        self.register_area_units();
        self.register_volume_units();
        self.register_time_units();
        self.register_speed_units();
        self.register_energy_units();
        self.register_power_units();
        self.register_pressure_units();
        self.register_data_units();
        self.register_currency_units();
        self.register_quantity_units();
    }

    fn register_weight_units(&mut self) {
        let f = Family::Weight;
        self.register(f, "1", "g", "gram");
        self.register(f, "0.001", "mg", "milligram");
        self.register(f, "1000", "kg", "kilogram");
        self.register(f, "1000000", "t", "ton");
        self.register(f, "0.2", "ct", "carat");

        // Avoirdupois
        self.register(f, "453.59237", "lb", "pound");
        self.register(f, "28.349523125", "oz", "ounce");
        self.register(f, "6350.29318", "st", "stone");
    }

    fn register_length_units(&mut self) {
        let f = Family::Length;
        self.register(f, "1", "m", "meter");
        self.register(f, "0.001", "mm", "millimeter");
        self.register(f, "0.01", "cm", "centimeter");
        self.register(f, "1000", "km", "kilometer");

        // Imperial/US
        self.register(f, "0.0254", "in", "inch");
        self.register(f, "0.3048", "ft", "foot");
        self.register(f, "0.9144", "yd", "yard");
        self.register(f, "1609.344", "mi", "mile");
        self.register(f, "1852", "nmi", "nautical mile");
    }

    fn register_area_units(&mut self) {
        let f = Family::Area;
        self.register(f, "1", "m²", "square meter");
        self.register(f, "0.0001", "cm²", "square centimeter");
        self.register(f, "1000000", "km²", "square kilometer");
        self.register(f, "10000", "ha", "hectare");
        self.register(f, "4046.8564224", "ac", "acre");
        self.register(f, "0.09290304", "ft²", "square foot");
    }

    fn register_volume_units(&mut self) {
        let f = Family::Volume;
        self.register(f, "1", "l", "liter");
        self.register(f, "0.001", "ml", "milliliter");
        self.register(f, "1000", "m³", "cubic meter");
        self.register(f, "3.785411784", "gal", "gallon");
        self.register(f, "0.946352946", "qt", "quart");
        self.register(f, "0.2365882365", "cup", "cup");
        self.register(f, "0.0295735295625", "fl oz", "fluid ounce");
    }

    fn register_time_units(&mut self) {
        let f = Family::Time;
        self.register(f, "1", "s", "second");
        self.register(f, "0.001", "ms", "millisecond");
        self.register(f, "60", "min", "minute");
        self.register(f, "3600", "h", "hour");
        self.register(f, "86400", "d", "day");
        self.register(f, "604800", "wk", "week");
    }

    fn register_speed_units(&mut self) {
        let f = Family::Speed;
        self.register(f, "1", "m/s", "meter per second");
        self.register(f, "1000/3600", "km/h", "kilometer per hour");
        self.register(f, "0.44704", "mph", "mile per hour");
        self.register(f, "1852/3600", "kn", "knot");
    }

    fn register_energy_units(&mut self) {
        let f = Family::Energy;
        self.register(f, "1", "J", "joule");
        self.register(f, "1000", "kJ", "kilojoule");
        self.register(f, "4.184", "cal", "calorie");
        self.register(f, "4184", "kcal", "kilocalorie");
        self.register(f, "3600", "Wh", "watt hour");
        self.register(f, "3600000", "kWh", "kilowatt hour");
    }

    fn register_power_units(&mut self) {
        let f = Family::Power;
        self.register(f, "1", "W", "watt");
        self.register(f, "1000", "kW", "kilowatt");
        self.register(f, "1000000", "MW", "megawatt");
        self.register(f, "745.69987158227022", "hp", "horsepower");
    }

    fn register_pressure_units(&mut self) {
        let f = Family::Pressure;
        self.register(f, "1", "Pa", "pascal");
        self.register(f, "1000", "kPa", "kilopascal");
        self.register(f, "100000", "bar", "bar");
        self.register(f, "101325", "atm", "atmosphere");
        self.register(f, "6894.757293168", "psi", "pound per square inch");
    }

    fn register_data_units(&mut self) {
        let f = Family::DataStorage;
        self.register(f, "1", "B", "byte");
        self.register(f, "0.125", "bit", "bit");
        self.register(f, "1000", "KB", "kilobyte");
        self.register(f, "1000000", "MB", "megabyte");
        self.register(f, "1000000000", "GB", "gigabyte");
        self.register(f, "1024", "KiB", "kibibyte");
        self.register(f, "1048576", "MiB", "mebibyte");
    }

    fn register_currency_units(&mut self) {
        // Sample rates against USD; real deployments update them via `update`
        let f = Family::Currency;
        self.register_left(f, "1", "USD", "US dollar");
        self.register_left(f, "1.08", "EUR", "euro");
        self.register_left(f, "1.27", "GBP", "pound sterling");
        self.register_left(f, "0.0067", "JPY", "yen");
        self.register_left(f, "1.13", "CHF", "Swiss franc");
    }

    fn register_quantity_units(&mut self) {
        let f = Family::Quantity;
        self.register(f, "1", "pc", "piece");
        self.register(f, "2", "pair", "pair");
        self.register(f, "12", "dz", "dozen");
        self.register(f, "144", "gr", "gross");
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new()
    }
}

/// Load the catalog into `registry`, skipping families that already have units
///
/// Returns the number of units created.
pub fn seed<S: UnitStore>(registry: &Registry<S>) -> Result<usize, RegistryError> {
    let catalog = Catalog::new();
    let mut created = 0;

    for family in Family::ALL {
        if !registry.units_of(family).is_empty() {
            debug!(%family, "family already populated, not seeding");
            continue;
        }
        for entry in catalog.by_family(family) {
            registry.create(entry.draft()?)?;
            created += 1;
        }
    }

    info!(created, "catalog seeded");
    Ok(created)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_family_starts_with_its_base() {
        let catalog = Catalog::new();
        for family in Family::ALL {
            let entries = catalog.by_family(family);
            assert!(!entries.is_empty(), "{} has no catalog units", family);
            assert_eq!(entries[0].value, "1", "{} must list its base first", family);
            let bases = entries.iter()
                .filter(|e| Number::from_str(e.value).unwrap().is_one())
                .count();
            assert_eq!(bases, 1, "{} must have exactly one base", family);
        }
    }

    #[test]
    fn test_all_values_parse_and_are_positive() {
        for entry in Catalog::new().entries() {
            let value = Number::from_str(entry.value)
                .unwrap_or_else(|_| panic!("bad value for {}", entry.code));
            assert!(!value.is_negative() && !value.is_zero(), "{}", entry.code);
        }
    }

    #[test]
    fn test_codes_are_unique() {
        let catalog = Catalog::new();
        let mut codes: Vec<_> = catalog.entries().iter().map(|e| e.code).collect();
        let total = codes.len();
        codes.sort();
        codes.dedup();
        assert_eq!(codes.len(), total);
    }

    #[test]
    fn test_seed_populates_registry() {
        let registry = Registry::in_memory();
        let created = seed(&registry).unwrap();
        assert_eq!(created, Catalog::new().entries().len());

        let kg = registry.find_by_code("kg").unwrap();
        let lb = registry.find_by_code("lb").unwrap();
        let result = registry.convert(kg.id, lb.id, &Number::one()).unwrap();
        assert_eq!(result.to_decimal(4), "2.2046");

        let usd = registry.find_by_code("USD").unwrap();
        assert_eq!(usd.translations[0].placement, Placement::Left);
    }

    #[test]
    fn test_seed_skips_populated_families() {
        let registry = Registry::in_memory();
        registry.create(NewUnit::new(Family::Weight, Number::one())).unwrap();

        let created = seed(&registry).unwrap();
        assert_eq!(created, Catalog::new().entries().len() - Catalog::new().by_family(Family::Weight).len());
        assert_eq!(registry.units_of(Family::Weight).len(), 1);

        // Second run is a no-op
        assert_eq!(seed(&registry).unwrap(), 0);
    }

    #[test]
    fn test_speed_fractions_are_exact() {
        let registry = Registry::in_memory();
        seed(&registry).unwrap();
        let (_, _, result) = registry.convert_codes("km/h", "m/s", &Number::from_i64(36)).unwrap();
        assert_eq!(result, Number::from_i64(10));
    }
}
