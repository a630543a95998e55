//! patgen library
//!
//! Command-line plumbing around the `pattern_generator` crate: argument
//! types, config merging and the replacers available from the command line.
//!
//! # CLI Usage
//!
//! ```bash
//! # Ten serials starting at 100
//! patgen generate '[A-Z]{3}-<+ddd>' --count 10 --counter-init 100
//!
//! # Card-like numbers with a Luhn check digit over the generated groups
//! patgen generate '(4[0-9]{3})([0-9]{11})<?luhn(1,2)>' --count 5
//!
//! # Data lookups
//! patgen generate 'Hi <user.name>' --data user.json --fallback anonymous
//!
//! # Show how a pattern is compiled
//! patgen inspect '<?upper(1)>_([a-z]{4})'
//! ```

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, bail, Context};
use clap::Parser;
use counter_store::FileStore;
use pattern_generator::{
    arg_text, CounterValue, GenerateOptions, GeneratorConfig, GeneratorOptions,
    PatternGenerator, ReplacerRegistry,
};
use serde_json::Value;

#[derive(Parser, Clone, Debug, Default)]
pub struct GenerateOpts {
    /// Pattern to generate from (may also come from --config)
    pub pattern: Option<String>,

    /// Number of strings to generate
    #[arg(long, default_value = "1")]
    pub count: usize,

    /// Initial counter value
    #[arg(long)]
    pub counter_init: Option<i64>,

    /// Counter increment step
    #[arg(long)]
    pub step: Option<i64>,

    /// Reuse the current counter value instead of advancing it
    #[arg(long)]
    pub no_increment: bool,

    /// JSON file with the data object for `<dotted.path>` placeholders
    #[arg(long, value_name = "FILE")]
    pub data: Option<PathBuf>,

    /// Function arguments override (format: name=json, repeatable)
    #[arg(long = "arg", value_name = "NAME=JSON")]
    pub args: Vec<String>,

    /// Locale for grouped counter formatting (e.g. en-US, de-DE)
    #[arg(long, value_name = "LOCALE")]
    pub number_format: Option<String>,

    /// Text substituted when a data path is missing
    #[arg(long)]
    pub fallback: Option<String>,

    /// Extra repetitions allowed for unbounded quantifiers
    #[arg(long)]
    pub max_repetition: Option<u32>,

    /// Seed for reproducible output
    #[arg(long, env = "PATGEN_SEED")]
    pub seed: Option<u64>,

    /// Persist the counter in this JSON file between runs
    #[arg(long, value_name = "PATH")]
    pub counter_file: Option<PathBuf>,

    /// YAML or JSON generator config file; command-line flags take precedence
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

impl GenerateOpts {
    /// Merge the config file (if any) with the command-line flags.
    pub fn load_config(&self) -> anyhow::Result<GeneratorConfig> {
        let mut config = match &self.config {
            Some(path) => GeneratorConfig::from_file(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => GeneratorConfig::default(),
        };

        if let Some(pattern) = &self.pattern {
            config.pattern = Some(pattern.clone());
        }
        if let Some(init) = self.counter_init {
            config.counter_init = Some(CounterValue::Number(init));
        }
        if let Some(step) = self.step {
            config.increment_step = Some(step);
        }
        if let Some(locale) = &self.number_format {
            config.number_format = Some(locale.clone());
        }
        if let Some(fallback) = &self.fallback {
            config.fallback_string = Some(fallback.clone());
        }
        if let Some(max) = self.max_repetition {
            config.tuning.max_repetition = max;
        }
        if let Some(seed) = self.seed {
            config.seed = Some(seed);
        }
        Ok(config)
    }

    /// Build the generator described by the flags and config.
    pub fn build_generator(&self) -> anyhow::Result<PatternGenerator> {
        let config = self.load_config()?;
        let pattern = config
            .pattern
            .clone()
            .ok_or_else(|| anyhow!("No pattern given on the command line or in the config"))?;

        let mut options = config.to_options()?.with_replacers(builtin_replacers());
        if let Some(path) = &self.counter_file {
            let initial = config
                .counter_init
                .clone()
                .unwrap_or(CounterValue::Number(1));
            let store = Arc::new(FileStore::new(path, initial));
            options = options.with_counter_store(store);
        }

        tracing::debug!(pattern = %pattern, ?options, "Building generator");
        Ok(PatternGenerator::new(&pattern, options)?)
    }

    /// Per-call options: increment flag, argument overrides and data.
    pub fn generate_options(&self) -> anyhow::Result<GenerateOptions> {
        let mut options = GenerateOptions::new();
        if self.no_increment {
            options = options.without_increment();
        }

        let mut custom_args: HashMap<String, Vec<Value>> = HashMap::new();
        for raw in &self.args {
            let (name, values) = parse_arg(raw)?;
            custom_args.entry(name).or_default().extend(values);
        }
        for (name, values) in custom_args {
            options = options.with_args(name, values);
        }

        if let Some(path) = &self.data {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read data file {}", path.display()))?;
            let data: Value = serde_json::from_str(&content)
                .with_context(|| format!("Invalid JSON in data file {}", path.display()))?;
            options = options.with_data(data);
        }
        Ok(options)
    }
}

/// Run `generate` with the given options and return every output.
pub async fn run_generate(opts: &GenerateOpts) -> anyhow::Result<Vec<String>> {
    let mut generator = opts.build_generator()?;
    let call = opts.generate_options()?;
    let outputs = generator.generate_many(opts.count, &call).await?;
    tracing::info!(
        count = outputs.len(),
        counter = %generator.counter_value(),
        "Generation complete"
    );
    Ok(outputs)
}

/// Describe how `pattern` compiles: the plain pattern and the placeholder
/// table.
pub fn inspect(pattern: &str) -> anyhow::Result<String> {
    let generator = PatternGenerator::new(pattern, GeneratorOptions::new())?;
    let compiled = generator.pattern();
    let report = serde_json::json!({
        "source": compiled.source(),
        "plain_pattern": compiled.display_pattern(),
        "capture_groups": compiled.group_count(),
        "substitutions": compiled.substitutions(),
    });
    Ok(serde_json::to_string_pretty(&report)?)
}

/// Parse a `name=json` argument override.
///
/// A JSON array supplies several arguments; any other JSON value is one
/// argument; text that is not JSON is passed as a string.
pub fn parse_arg(raw: &str) -> anyhow::Result<(String, Vec<Value>)> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| anyhow!("Invalid --arg '{raw}': expected NAME=JSON"))?;
    let name = name.trim();
    if name.is_empty() {
        bail!("Invalid --arg '{raw}': empty function name");
    }
    let values = match serde_json::from_str::<Value>(value) {
        Ok(Value::Array(items)) => items,
        Ok(other) => vec![other],
        Err(_) => vec![Value::String(value.to_string())],
    };
    Ok((name.to_string(), values))
}

/// Replacers available to command-line patterns.
pub fn builtin_replacers() -> ReplacerRegistry {
    let mut registry = ReplacerRegistry::new();
    registry
        .register_fn("upper", |args: Vec<Value>| {
            Ok(args.iter().map(arg_text).collect::<String>().to_uppercase())
        })
        .register_fn("lower", |args: Vec<Value>| {
            Ok(args.iter().map(arg_text).collect::<String>().to_lowercase())
        })
        .register_fn("luhn", |args: Vec<Value>| {
            let digits: String = args.iter().map(arg_text).collect();
            luhn_check_digit(&digits)
                .map(|digit| digit.to_string())
                .ok_or_else(|| anyhow!("luhn needs at least one digit, got {digits:?}"))
        });
    registry
}

/// Luhn check digit for the digits in `payload`; other characters are
/// ignored. `None` when there are no digits.
pub fn luhn_check_digit(payload: &str) -> Option<u32> {
    let digits: Vec<u32> = payload.chars().filter_map(|c| c.to_digit(10)).collect();
    if digits.is_empty() {
        return None;
    }
    let sum: u32 = digits
        .iter()
        .rev()
        .enumerate()
        .map(|(i, &d)| {
            if i % 2 == 0 {
                let doubled = d * 2;
                if doubled > 9 {
                    doubled - 9
                } else {
                    doubled
                }
            } else {
                d
            }
        })
        .sum();
    Some((10 - sum % 10) % 10)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_luhn_check_digit() {
        assert_eq!(luhn_check_digit("7992739871"), Some(3));
        assert_eq!(luhn_check_digit("4111-1111-1111-111"), Some(1));
        assert_eq!(luhn_check_digit("abc"), None);
    }

    #[test]
    fn test_parse_arg() {
        assert_eq!(
            parse_arg("f=[1,\"a\"]").unwrap(),
            ("f".to_string(), vec![json!(1), json!("a")])
        );
        assert_eq!(parse_arg("f=10").unwrap().1, vec![json!(10)]);
        assert_eq!(parse_arg("f=hello").unwrap().1, vec![json!("hello")]);
        assert!(parse_arg("novalue").is_err());
        assert!(parse_arg("=1").is_err());
    }

    #[test]
    fn test_flags_override_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gen.yaml");
        std::fs::write(&path, "pattern: \"A<+d>\"\ncounter_init: 5\nseed: 1\n").unwrap();

        let opts = GenerateOpts {
            config: Some(path),
            counter_init: Some(9),
            max_repetition: Some(3),
            ..Default::default()
        };
        let config = opts.load_config().unwrap();
        assert_eq!(config.pattern.as_deref(), Some("A<+d>"));
        assert_eq!(config.counter_init, Some(CounterValue::Number(9)));
        assert_eq!(config.seed, Some(1));
        assert_eq!(config.tuning.max_repetition, 3);
    }
}
