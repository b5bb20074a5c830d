//! Exact rational numbers using dashu
//!
//! Unit ratios are stored as exact rationals (dashu-ratio's RBig) so that
//! base-unit checks (`value == 1`) and rebase division never drift.
//! Floating point only appears at the edges: `to_f64` and `to_decimal`.

use dashu_base::Approximation;
use dashu_int::{IBig, UBig};
use dashu_ratio::RBig;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Largest accepted decimal exponent magnitude in parsed input
pub const MAX_EXPONENT: i64 = 1000;

/// Error type for number operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NumberError {
    #[error("Invalid number format: {0}")]
    ParseError(String),

    #[error("Division by zero")]
    DivisionByZero,
}

/// Exact rational number
///
/// All operations return Results or new Numbers - never panic.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Number {
    inner: RBig,
}

impl Number {
    // ========== Construction ==========

    /// Create from string representation
    /// Supports: "123", "-0.001", "1/3", "1.5e3", "2E-4"
    /// Exponents beyond `MAX_EXPONENT` in magnitude are rejected
    pub fn from_str(s: &str) -> Result<Self, NumberError> {
        let s = s.trim();

        if let Some((num, den)) = s.split_once('/') {
            let num = Self::parse_decimal(num.trim()).ok_or_else(|| NumberError::ParseError(s.to_string()))?;
            let den = Self::parse_decimal(den.trim()).ok_or_else(|| NumberError::ParseError(s.to_string()))?;
            return num.checked_div(&den);
        }

        Self::parse_decimal(s).ok_or_else(|| NumberError::ParseError(s.to_string()))
    }

    /// Parse `[-+]digits[.digits][(e|E)[-+]digits]` exactly (no f64 intermediary)
    fn parse_decimal(s: &str) -> Option<Self> {
        let (mantissa, exponent) = match s.find(&['e', 'E'][..]) {
            Some(pos) => (&s[..pos], s[pos + 1..].parse::<i64>().ok()?),
            None => (s, 0),
        };
        if exponent.unsigned_abs() > MAX_EXPONENT as u64 {
            return None;
        }

        let (negative, mantissa) = match mantissa.as_bytes().first()? {
            b'-' => (true, &mantissa[1..]),
            b'+' => (false, &mantissa[1..]),
            _ => (false, mantissa),
        };

        let (int_part, frac_part) = mantissa.split_once('.').unwrap_or((mantissa, ""));
        if int_part.is_empty() && frac_part.is_empty() {
            return None;
        }
        let digits = format!("{}{}", int_part, frac_part);
        if !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }

        let mut numerator: IBig = digits.parse().ok()?;
        if negative {
            numerator = -numerator;
        }

        // value = digits * 10^(exponent - frac_len)
        let shift = exponent.checked_sub(frac_part.len() as i64)?;
        let ten = UBig::from(10u8);
        let inner = if shift >= 0 {
            let factor = IBig::from(ten.pow(usize::try_from(shift).ok()?));
            RBig::from_parts(numerator * factor, UBig::ONE)
        } else {
            let denominator = ten.pow(usize::try_from(-shift).ok()?);
            RBig::from_parts(numerator, denominator)
        };

        Some(Self { inner })
    }

    pub fn zero() -> Self {
        Self { inner: RBig::ZERO }
    }

    pub fn one() -> Self {
        Self { inner: RBig::ONE }
    }

    pub fn from_i64(n: i64) -> Self {
        Self { inner: RBig::from(n) }
    }

    /// Create from ratio (exact division)
    pub fn from_ratio(num: i64, den: i64) -> Result<Self, NumberError> {
        Self::from_i64(num).checked_div(&Self::from_i64(den))
    }

    // ========== Predicates ==========

    pub fn is_zero(&self) -> bool {
        self.inner == RBig::ZERO
    }

    /// True for exactly 1, the ratio that marks a family's base unit
    pub fn is_one(&self) -> bool {
        self.inner == RBig::ONE
    }

    pub fn is_negative(&self) -> bool {
        self.inner < RBig::ZERO
    }

    pub fn is_integer(&self) -> bool {
        *self.inner.denominator() == UBig::ONE
    }

    // ========== Arithmetic ==========

    pub fn add(&self, other: &Self) -> Self {
        Self { inner: &self.inner + &other.inner }
    }

    pub fn sub(&self, other: &Self) -> Self {
        Self { inner: &self.inner - &other.inner }
    }

    pub fn mul(&self, other: &Self) -> Self {
        Self { inner: &self.inner * &other.inner }
    }

    pub fn checked_div(&self, other: &Self) -> Result<Self, NumberError> {
        if other.is_zero() {
            return Err(NumberError::DivisionByZero);
        }
        Ok(Self { inner: &self.inner / &other.inner })
    }

    // ========== Conversion ==========

    /// Nearest f64 (may lose precision)
    pub fn to_f64(&self) -> f64 {
        match self.inner.to_f64() {
            Approximation::Exact(v) => v,
            Approximation::Inexact(v, _) => v,
        }
    }

    /// Decimal string rounded half away from zero to `places` digits,
    /// trailing zeros trimmed ("0.0010" -> "0.001", "2.0000" -> "2")
    pub fn to_decimal(&self, places: u32) -> String {
        let numerator = self.inner.numerator().clone();
        let denominator = IBig::from(self.inner.denominator().clone());
        let scale = IBig::from(UBig::from(10u8).pow(places as usize));

        let scaled = numerator * scale;
        let negative = scaled < IBig::ZERO;
        let mut quotient = &scaled / &denominator;
        let remainder = &scaled % &denominator;
        let remainder = if remainder < IBig::ZERO { -remainder } else { remainder };
        if remainder * IBig::from(2u8) >= denominator {
            quotient = if negative { quotient - IBig::ONE } else { quotient + IBig::ONE };
        }

        let negative = quotient < IBig::ZERO;
        let magnitude = if negative { -quotient } else { quotient };
        let mut digits = magnitude.to_string();
        let places = places as usize;
        if digits.len() <= places {
            digits = format!("{}{}", "0".repeat(places + 1 - digits.len()), digits);
        }

        let (int_part, frac_part) = digits.split_at(digits.len() - places);
        let frac_part = frac_part.trim_end_matches('0');
        let body = if frac_part.is_empty() {
            int_part.to_string()
        } else {
            format!("{}.{}", int_part, frac_part)
        };

        if negative && body != "0" {
            format!("-{}", body)
        } else {
            body
        }
    }

    /// Exact decimal representation, if the denominator only has factors 2 and 5
    pub fn exact_decimal(&self) -> Option<String> {
        let two = UBig::from(2u8);
        let five = UBig::from(5u8);
        let mut rest = self.inner.denominator().clone();
        let mut twos = 0u32;
        let mut fives = 0u32;

        while &rest % &two == UBig::ZERO {
            rest = &rest / &two;
            twos += 1;
        }
        while &rest % &five == UBig::ZERO {
            rest = &rest / &five;
            fives += 1;
        }

        (rest == UBig::ONE).then(|| self.to_decimal(twos.max(fives)))
    }
}

impl Default for Number {
    fn default() -> Self {
        Self::zero()
    }
}

impl std::fmt::Display for Number {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.exact_decimal() {
            Some(decimal) => write!(f, "{}", decimal),
            None => write!(f, "{}/{}", self.inner.numerator(), self.inner.denominator()),
        }
    }
}

impl Serialize for Number {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Number {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_str(&s).map_err(serde::de::Error::custom)
    }
}
