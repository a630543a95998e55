//! File-based generator configuration.
//!
//! Covers the options that can be described as data. Hooks, replacers and
//! custom increments are code and are added to the resulting
//! [`GeneratorOptions`] by the caller.
//!
//! ```yaml
//! pattern: "[A-Z]{3}-<+ddd>"
//! counter_init: 100
//! increment_step: 5
//! fallback_string: "N/A"
//! number_format: en-US
//! seed: 42
//! tuning:
//!   max_repetition: 10
//!   range_subtract: [["a", "z"]]
//! ```

use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::counter::CounterValue;
use crate::format::GroupedNumberFormat;
use crate::options::GeneratorOptions;
use crate::random::GeneratorTuning;

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Error reading config file
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    /// Error parsing YAML
    #[error("Failed to parse YAML: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// Error parsing JSON
    #[error("Failed to parse JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Locale tag without a known grouping convention
    #[error("Unknown number format locale: {0}")]
    UnknownLocale(String),
}

/// Serializable subset of [`GeneratorOptions`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeneratorConfig {
    /// Pattern source
    pub pattern: Option<String>,
    pub counter_init: Option<CounterValue>,
    pub increment_step: Option<i64>,
    pub fallback_string: Option<String>,
    /// Locale tag for grouped number formatting (e.g. `en-US`)
    pub number_format: Option<String>,
    pub tuning: GeneratorTuning,
    pub seed: Option<u64>,
}

impl GeneratorConfig {
    /// Parse a config from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Parse a config from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a config file; `.json` files are read as JSON, anything else as
    /// YAML.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::from_json(&content),
            _ => Self::from_yaml(&content),
        }
    }

    /// Build construction options from this config.
    pub fn to_options(&self) -> Result<GeneratorOptions, ConfigError> {
        let mut options = GeneratorOptions::new().with_tuning(self.tuning.clone());
        if let Some(init) = &self.counter_init {
            options = options.with_counter_init(init.clone());
        }
        if let Some(step) = self.increment_step {
            options = options.with_increment_step(step);
        }
        if let Some(fallback) = &self.fallback_string {
            options = options.with_fallback_string(fallback.clone());
        }
        if let Some(locale) = &self.number_format {
            let format = GroupedNumberFormat::for_locale(locale)
                .ok_or_else(|| ConfigError::UnknownLocale(locale.clone()))?;
            options = options.with_number_format(Arc::new(format));
        }
        if let Some(seed) = self.seed {
            options = options.with_seed(seed);
        }
        Ok(options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const YAML: &str = r#"
pattern: "[A-Z]{3}-<+ddd>"
counter_init: 100
increment_step: 5
fallback_string: "N/A"
number_format: en-US
seed: 42
tuning:
  max_repetition: 10
  range_subtract: [["a", "z"]]
"#;

    #[test]
    fn test_from_yaml() {
        let config = GeneratorConfig::from_yaml(YAML).unwrap();
        assert_eq!(config.pattern.as_deref(), Some("[A-Z]{3}-<+ddd>"));
        assert_eq!(config.counter_init, Some(CounterValue::Number(100)));
        assert_eq!(config.tuning.max_repetition, 10);
        assert_eq!(config.tuning.range_subtract, vec![('a', 'z')]);
        assert!(config.tuning.range_add.is_empty());

        let options = config.to_options().unwrap();
        assert_eq!(options.counter_init, CounterValue::Number(100));
        assert_eq!(options.increment_step, 5);
        assert_eq!(options.fallback_string, "N/A");
        assert!(options.number_format.is_some());
        assert_eq!(options.seed, Some(42));
    }

    #[test]
    fn test_text_counter_init() {
        let config = GeneratorConfig::from_json(r#"{"counter_init": "AAA100"}"#).unwrap();
        assert_eq!(
            config.counter_init,
            Some(CounterValue::Text("AAA100".to_string()))
        );
        assert_eq!(config.tuning, GeneratorTuning::default());
    }

    #[test]
    fn test_unknown_locale() {
        let config = GeneratorConfig::from_yaml("number_format: xx-XX").unwrap();
        assert!(matches!(
            config.to_options(),
            Err(ConfigError::UnknownLocale(_))
        ));
    }

    #[test]
    fn test_unknown_field_rejected() {
        assert!(GeneratorConfig::from_yaml("countr_init: 1").is_err());
    }

    #[test]
    fn test_from_file_by_extension() {
        let dir = tempfile::tempdir().unwrap();

        let json_path = dir.path().join("gen.json");
        std::fs::File::create(&json_path)
            .unwrap()
            .write_all(br#"{"increment_step": 3}"#)
            .unwrap();
        assert_eq!(
            GeneratorConfig::from_file(&json_path).unwrap().increment_step,
            Some(3)
        );

        let yaml_path = dir.path().join("gen.yaml");
        std::fs::write(&yaml_path, YAML).unwrap();
        assert_eq!(
            GeneratorConfig::from_file(&yaml_path).unwrap().seed,
            Some(42)
        );
    }
}
