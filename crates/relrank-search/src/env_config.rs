//! Environment overrides for ranking defaults.
//!
//! Deployments tune the gate and bonuses without code changes. Every value
//! is optional; a value that does not parse is logged and ignored.

use std::env;
use std::str::FromStr;

use tracing::warn;

use relrank_core::defaults;
use relrank_core::{Comparator, SearchConfig};

pub const ENV_SEARCH_FIELDS_AVERAGE: &str = "RELRANK_SEARCH_FIELDS_AVERAGE";
pub const ENV_SEARCH_FIELDS_FILTER: &str = "RELRANK_SEARCH_FIELDS_FILTER";
pub const ENV_VECTOR_LANGUAGE: &str = "RELRANK_VECTOR_LANGUAGE";
pub const ENV_BONUS_ICONTAINS: &str = "RELRANK_BONUS_ICONTAINS";
pub const ENV_BONUS_STARTSWITH: &str = "RELRANK_BONUS_STARTSWITH";
pub const ENV_FIELD_BONUS: &str = "RELRANK_FIELD_BONUS";

/// Process-wide ranking defaults.
///
/// # Example
/// ```
/// use relrank_search::env_config::SearchDefaults;
/// use relrank_core::SearchConfig;
///
/// let defaults = SearchDefaults::default();
/// assert_eq!(defaults.threshold, 0.35);
///
/// let config = defaults.apply_to(SearchConfig::default());
/// assert_eq!(config.bonus_startswith, 1.5);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct SearchDefaults {
    pub threshold: f64,
    pub comparator: Comparator,
    pub vector_language: String,
    pub bonus_icontains: f64,
    pub bonus_startswith: f64,
    pub field_bonus: f64,
}

impl Default for SearchDefaults {
    fn default() -> Self {
        Self {
            threshold: defaults::SEARCH_FIELDS_AVERAGE,
            comparator: Comparator::Gte,
            vector_language: defaults::VECTOR_LANGUAGE.to_string(),
            bonus_icontains: defaults::BONUS_ICONTAINS,
            bonus_startswith: defaults::BONUS_STARTSWITH,
            field_bonus: defaults::FIELD_BONUS,
        }
    }
}

impl SearchDefaults {
    /// Read defaults from the environment.
    ///
    /// Environment variables:
    /// - `RELRANK_SEARCH_FIELDS_AVERAGE` (default: 0.35)
    /// - `RELRANK_SEARCH_FIELDS_FILTER` (default: gte)
    /// - `RELRANK_VECTOR_LANGUAGE` (default: spanish)
    /// - `RELRANK_BONUS_ICONTAINS` (default: 0.5)
    /// - `RELRANK_BONUS_STARTSWITH` (default: 1.5)
    /// - `RELRANK_FIELD_BONUS` (default: 0.1)
    pub fn from_env() -> Self {
        let fallback = Self::default();
        Self {
            threshold: parse_float_env(ENV_SEARCH_FIELDS_AVERAGE, fallback.threshold),
            comparator: parse_env(ENV_SEARCH_FIELDS_FILTER, fallback.comparator),
            vector_language: parse_language_env(ENV_VECTOR_LANGUAGE, fallback.vector_language),
            bonus_icontains: parse_float_env(ENV_BONUS_ICONTAINS, fallback.bonus_icontains),
            bonus_startswith: parse_float_env(ENV_BONUS_STARTSWITH, fallback.bonus_startswith),
            field_bonus: parse_float_env(ENV_FIELD_BONUS, fallback.field_bonus),
        }
    }

    /// Overlay these defaults on `config`; groups and weights are kept.
    pub fn apply_to(&self, config: SearchConfig) -> SearchConfig {
        SearchConfig {
            threshold: self.threshold,
            comparator: self.comparator,
            vector_language: self.vector_language.clone(),
            bonus_icontains: self.bonus_icontains,
            bonus_startswith: self.bonus_startswith,
            field_bonus: self.field_bonus,
            ..config
        }
    }
}

fn parse_env<T>(key: &str, default: T) -> T
where
    T: FromStr + std::fmt::Debug,
{
    match env::var(key) {
        Ok(raw) => match raw.parse::<T>() {
            Ok(value) => value,
            Err(_) => {
                warn!(
                    subsystem = "search",
                    component = "env_config",
                    key = key,
                    value = %raw,
                    "Invalid value, using default {:?}",
                    default
                );
                default
            }
        },
        Err(_) => default,
    }
}

fn parse_float_env(key: &str, default: f64) -> f64 {
    let value = parse_env(key, default);
    if value.is_finite() {
        value
    } else {
        warn!(
            subsystem = "search",
            component = "env_config",
            key = key,
            "Non-finite value, using default {}",
            default
        );
        default
    }
}

fn parse_language_env(key: &str, default: String) -> String {
    match env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw.trim().to_string(),
        Ok(_) => {
            warn!(
                subsystem = "search",
                component = "env_config",
                key = key,
                "Empty language, using default {}",
                default
            );
            default
        }
        Err(_) => default,
    }
}
