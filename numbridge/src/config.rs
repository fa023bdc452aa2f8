//! Configuration for the host boundary.
//!
//! [`BridgeConfig`] controls how host exception types are named and how much
//! of a native error is carried across the boundary.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Environment variable toggling cause chaining.
pub const CHAIN_CAUSES_ENV: &str = "NUMBRIDGE_CHAIN_CAUSES";
/// Environment variable bounding the translated cause chain.
pub const MAX_CAUSE_DEPTH_ENV: &str = "NUMBRIDGE_MAX_CAUSE_DEPTH";
/// Environment variable toggling panic capture.
pub const CATCH_PANICS_ENV: &str = "NUMBRIDGE_CATCH_PANICS";

/// Configuration for exception registration and translation.
///
/// # Example
///
/// ```
/// use numbridge::BridgeConfig;
///
/// let config = BridgeConfig::default()
///     .with_module_name("tensorlib")
///     .with_max_cause_depth(4);
/// assert!(config.chain_causes);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Module qualifier of the host type names (`<module_name>.DimensionError`).
    pub module_name: String,

    /// Translate the error's `source()` chain and attach it as the host cause.
    pub chain_causes: bool,

    /// Maximum number of cause levels attached below the raised exception.
    pub max_cause_depth: usize,

    /// Catch panics inside guarded calls and raise them as the generic type.
    pub catch_panics: bool,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            module_name: "numbridge".to_owned(),
            chain_causes: true,
            max_cause_depth: 16,
            catch_panics: true,
        }
    }
}

impl BridgeConfig {
    /// Default configuration with overrides from the process environment.
    ///
    /// Reads `NUMBRIDGE_CHAIN_CAUSES`, `NUMBRIDGE_MAX_CAUSE_DEPTH` and
    /// `NUMBRIDGE_CATCH_PANICS`. Unparsable values are ignored.
    #[must_use]
    pub fn from_env() -> Self {
        Self::default().with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides fetched through `lookup`.
    #[must_use]
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(value) = read_override(&lookup, CHAIN_CAUSES_ENV, parse_flag) {
            self.chain_causes = value;
        }
        if let Some(value) = read_override(&lookup, MAX_CAUSE_DEPTH_ENV, |raw| usize::from_str(raw.trim()).ok()) {
            self.max_cause_depth = value;
        }
        if let Some(value) = read_override(&lookup, CATCH_PANICS_ENV, parse_flag) {
            self.catch_panics = value;
        }
        self
    }

    /// Set the module qualifier.
    #[must_use]
    pub fn with_module_name(mut self, module_name: impl Into<String>) -> Self {
        self.module_name = module_name.into();
        self
    }

    /// Set whether causes are chained.
    #[must_use]
    pub fn with_cause_chaining(mut self, chain_causes: bool) -> Self {
        self.chain_causes = chain_causes;
        self
    }

    /// Set the maximum cause depth.
    #[must_use]
    pub fn with_max_cause_depth(mut self, depth: usize) -> Self {
        self.max_cause_depth = depth;
        self
    }

    /// Set whether panics are caught.
    #[must_use]
    pub fn with_panic_capture(mut self, catch_panics: bool) -> Self {
        self.catch_panics = catch_panics;
        self
    }
}

fn read_override<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    parse: impl Fn(&str) -> Option<T>,
) -> Option<T> {
    let raw = lookup(key)?;
    let parsed = parse(&raw);
    if parsed.is_none() {
        warn!(key, value = %raw, "ignoring unparsable configuration override");
    }
    parsed
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_in(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = BridgeConfig::default();
        assert_eq!(config.module_name, "numbridge");
        assert!(config.chain_causes);
        assert_eq!(config.max_cause_depth, 16);
        assert!(config.catch_panics);
    }

    #[test]
    fn test_overrides_apply() {
        let config = BridgeConfig::default().with_overrides(lookup_in(&[
            (CHAIN_CAUSES_ENV, "off"),
            (MAX_CAUSE_DEPTH_ENV, " 3 "),
            (CATCH_PANICS_ENV, "FALSE"),
        ]));

        assert!(!config.chain_causes);
        assert_eq!(config.max_cause_depth, 3);
        assert!(!config.catch_panics);
    }

    #[test]
    fn test_unparsable_overrides_are_ignored() {
        let config = BridgeConfig::default().with_overrides(lookup_in(&[
            (CHAIN_CAUSES_ENV, "maybe"),
            (MAX_CAUSE_DEPTH_ENV, "-1"),
        ]));

        assert_eq!(config, BridgeConfig::default());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: BridgeConfig =
            serde_json::from_str(r#"{"module_name": "tensorlib", "catch_panics": false}"#).unwrap();

        assert_eq!(config.module_name, "tensorlib");
        assert!(!config.catch_panics);
        assert!(config.chain_causes);
        assert_eq!(config.max_cause_depth, 16);
    }
}
