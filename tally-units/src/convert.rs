//! Ratio conversion between units of one family
//!
//! A unit's `value` is its size in base units, so an amount in `from`
//! is `amount * from.value` base units, which is
//! `amount * from.value / to.value` in `to`. No pivot through the base
//! unit is needed and nothing is rounded here.

use tally_core::{Family, Number, RegistryError, UnitId};
use crate::Unit;

/// Convert `amount` expressed in `from` into `to`
pub fn convert(from: &Unit, to: &Unit, amount: &Number) -> Result<Number, RegistryError> {
    if !from.is_compatible(to) {
        return Err(RegistryError::TypeMismatch { from: from.family, to: to.family });
    }

    amount.mul(&from.value)
        .checked_div(&to.value)
        .map_err(|_| RegistryError::DivisionByZero { id: to.id })
}

/// Same as `convert`, for callers that work in floating point
pub fn convert_f64(from: &Unit, to: &Unit, amount: f64) -> Result<f64, RegistryError> {
    let amount = Number::from_str(&format!("{}", amount))?;
    convert(from, to, &amount).map(|n| n.to_f64())
}

/// New values for `pivot`'s family once `pivot` becomes its base
///
/// Each value only depends on its own old value, so order is irrelevant.
/// `pivot` itself comes out as exactly 1; a zero-valued pivot cannot be a base.
pub fn rescale(units: &[Unit], pivot: &Unit) -> Result<Vec<(UnitId, Number)>, RegistryError> {
    if pivot.value.is_zero() {
        return Err(RegistryError::ZeroValueCannotBeBase { id: pivot.id });
    }

    units.iter()
        .filter(|u| u.family == pivot.family)
        .map(|u| {
            u.value.checked_div(&pivot.value)
                .map(|value| (u.id, value))
                .map_err(RegistryError::from)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn unit(id: u64, family: Family, value: &str) -> Unit {
        let now = Utc::now();
        Unit {
            id: UnitId(id),
            family,
            value: Number::from_str(value).unwrap(),
            status: true,
            translations: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    fn n(s: &str) -> Number {
        Number::from_str(s).unwrap()
    }

    #[test]
    fn test_convert_follows_formula() {
        let a = unit(1, Family::Weight, "1");
        let b = unit(2, Family::Weight, "1000");

        assert_eq!(convert(&a, &b, &n("1")).unwrap(), n("0.001"));
        assert_eq!(convert(&b, &a, &n("500")).unwrap(), n("500000"));
    }

    #[test]
    fn test_identity_conversion() {
        let mile = unit(1, Family::Length, "1609.344");
        for x in ["0", "1", "-3.5", "1/3", "123456789.123"] {
            assert_eq!(convert(&mile, &mile, &n(x)).unwrap(), n(x));
        }
    }

    #[test]
    fn test_round_trip_is_exact() {
        let inch = unit(1, Family::Length, "0.0254");
        let foot = unit(2, Family::Length, "0.3048");
        let x = n("17.25");

        let there = convert(&inch, &foot, &x).unwrap();
        let back = convert(&foot, &inch, &there).unwrap();
        assert_eq!(back, x);
    }

    #[test]
    fn test_cross_family_is_type_mismatch() {
        let kg = unit(1, Family::Weight, "1000");
        let m = unit(2, Family::Length, "1");

        assert_eq!(
            convert(&kg, &m, &n("1")),
            Err(RegistryError::TypeMismatch { from: Family::Weight, to: Family::Length })
        );
    }

    #[test]
    fn test_zero_target_is_division_by_zero() {
        let g = unit(1, Family::Weight, "1");
        let broken = unit(9, Family::Weight, "0");

        assert_eq!(
            convert(&g, &broken, &n("1")),
            Err(RegistryError::DivisionByZero { id: UnitId(9) })
        );
        // Converting *from* a zero unit is fine, it just yields 0
        assert_eq!(convert(&broken, &g, &n("5")).unwrap(), Number::zero());
    }

    #[test]
    fn test_convert_f64() {
        let a = unit(1, Family::Weight, "1");
        let b = unit(2, Family::Weight, "1000");
        assert_eq!(convert_f64(&a, &b, 1.0).unwrap(), 0.001);
        assert_eq!(convert_f64(&b, &a, 500.0).unwrap(), 500000.0);
    }

    #[test]
    fn test_rescale_gram_kilogram_ton() {
        let units = vec![
            unit(1, Family::Weight, "1"),
            unit(2, Family::Weight, "1000"),
            unit(3, Family::Weight, "1000000"),
            unit(4, Family::Length, "1000"),
        ];

        let rescaled = rescale(&units, &units[1]).unwrap();
        assert_eq!(rescaled, vec![
            (UnitId(1), n("0.001")),
            (UnitId(2), n("1")),
            (UnitId(3), n("1000")),
        ]);
    }

    #[test]
    fn test_rescale_preserves_ratios() {
        let units = vec![
            unit(1, Family::Length, "1"),
            unit(2, Family::Length, "0.3048"),
            unit(3, Family::Length, "1609.344"),
        ];
        let rescaled = rescale(&units, &units[1]).unwrap();

        // mile / foot ratio unchanged
        let before = n("1609.344").checked_div(&n("0.3048")).unwrap();
        let after = rescaled[2].1.checked_div(&rescaled[1].1).unwrap();
        assert_eq!(before, after);
        assert!(rescaled[1].1.is_one());
    }

    #[test]
    fn test_rescale_zero_pivot() {
        let units = vec![unit(1, Family::Weight, "1"), unit(2, Family::Weight, "0")];
        assert_eq!(
            rescale(&units, &units[1]),
            Err(RegistryError::ZeroValueCannotBeBase { id: UnitId(2) })
        );
    }
}
