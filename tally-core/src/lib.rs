//! Tally Core - Fundamental types
//!
//! This crate provides the core types used throughout Tally:
//! - `Number`: Exact rational magnitudes for unit ratios
//! - `Family`, `UnitId`: Conversion families and unit identifiers
//! - `RegistryError`: One variant per invariant breach, with `ErrorReport`

mod number;
mod family;
mod error;

pub use number::{Number, NumberError, MAX_EXPONENT};
pub use family::{Family, UnitId};
pub use error::{RegistryError, ErrorReport, UnitLookup, codes};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{Number, Family, UnitId, RegistryError, ErrorReport};
    pub use crate::error::codes;
}
