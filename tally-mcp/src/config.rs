//! Server configuration from environment variables
//!
//! - `TALLY_PRECISION`: decimal places for conversion results (default 4, at most 64)
//! - `TALLY_LOCALE`: locale used for unit names (default "en")
//! - `TALLY_FALLBACK_LOCALE`: locale tried when a unit lacks the requested one (default "en")
//! - `TALLY_SEED`: load the built-in catalog at start-up (default true)

use std::env;
use tally_units::report::{DEFAULT_PRECISION, MAX_PRECISION};
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub precision: u32,
    pub locale: String,
    pub fallback_locale: String,
    pub seed: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            precision: DEFAULT_PRECISION,
            locale: "en".to_string(),
            fallback_locale: "en".to_string(),
            seed: true,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup; unparsable values fall back to defaults
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Config::default();

        if let Some(raw) = lookup("TALLY_PRECISION") {
            match raw.trim().parse::<u32>() {
                Ok(p) if p <= MAX_PRECISION => config.precision = p,
                Ok(_) => warn!(value = %raw, max = MAX_PRECISION, "ignoring TALLY_PRECISION above maximum"),
                Err(_) => warn!(value = %raw, "ignoring invalid TALLY_PRECISION"),
            }
        }
        if let Some(locale) = lookup("TALLY_LOCALE").filter(|s| !s.trim().is_empty()) {
            config.locale = locale.trim().to_string();
        }
        if let Some(locale) = lookup("TALLY_FALLBACK_LOCALE").filter(|s| !s.trim().is_empty()) {
            config.fallback_locale = locale.trim().to_string();
        }
        if let Some(raw) = lookup("TALLY_SEED") {
            match raw.trim().to_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => config.seed = true,
                "0" | "false" | "no" | "off" => config.seed = false,
                _ => warn!(value = %raw, "ignoring invalid TALLY_SEED"),
            }
        }

        config
    }
}
