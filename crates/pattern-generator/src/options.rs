//! Construction, mutation and per-call options.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::counter::{step_increment, CounterGet, CounterSet, CounterValue, IncrementFn};
use crate::format::NumberFormat;
use crate::random::{GeneratorTuning, HirGeneratorFactory, MatchGeneratorFactory};
use crate::replacer::ReplacerRegistry;

/// Options fixed when a generator is constructed.
///
/// `counter_init`, `increment_step` and `increment_function` cannot be
/// changed afterwards; everything else can be replaced through
/// [`SetOptions`].
#[derive(Clone)]
pub struct GeneratorOptions {
    /// First value of the internal sequence, and the value reused by a
    /// non-advancing call before any advancing one (default 1)
    pub counter_init: CounterValue,
    /// Step of the default increment (default 1)
    pub increment_step: i64,
    /// Custom increment; overrides `increment_step`
    pub increment_function: Option<IncrementFn>,
    pub get_counter: Option<Arc<dyn CounterGet>>,
    pub set_counter: Option<Arc<dyn CounterSet>>,
    pub custom_replacers: ReplacerRegistry,
    /// Formatter taking precedence over zero-padding
    pub number_format: Option<Arc<dyn NumberFormat>>,
    /// Substituted when a data path misses (default empty)
    pub fallback_string: String,
    pub tuning: GeneratorTuning,
    pub match_generator: Arc<dyn MatchGeneratorFactory>,
    /// Seed for reproducible random output; entropy when `None`
    pub seed: Option<u64>,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        Self {
            counter_init: CounterValue::Number(1),
            increment_step: 1,
            increment_function: None,
            get_counter: None,
            set_counter: None,
            custom_replacers: ReplacerRegistry::new(),
            number_format: None,
            fallback_string: String::new(),
            tuning: GeneratorTuning::default(),
            match_generator: Arc::new(HirGeneratorFactory),
            seed: None,
        }
    }
}

impl GeneratorOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_counter_init(mut self, init: impl Into<CounterValue>) -> Self {
        self.counter_init = init.into();
        self
    }

    pub fn with_increment_step(mut self, step: i64) -> Self {
        self.increment_step = step;
        self
    }

    pub fn with_increment_function<F>(mut self, f: F) -> Self
    where
        F: Fn(&CounterValue) -> Option<CounterValue> + Send + Sync + 'static,
    {
        self.increment_function = Some(Arc::new(f));
        self
    }

    pub fn with_get_counter(mut self, get: Arc<dyn CounterGet>) -> Self {
        self.get_counter = Some(get);
        self
    }

    pub fn with_set_counter(mut self, set: Arc<dyn CounterSet>) -> Self {
        self.set_counter = Some(set);
        self
    }

    /// Use one store for both counter hooks.
    pub fn with_counter_store<S>(self, store: Arc<S>) -> Self
    where
        S: CounterGet + CounterSet + 'static,
    {
        self.with_get_counter(store.clone()).with_set_counter(store)
    }

    pub fn with_replacers(mut self, replacers: ReplacerRegistry) -> Self {
        self.custom_replacers = replacers;
        self
    }

    pub fn with_number_format(mut self, format: Arc<dyn NumberFormat>) -> Self {
        self.number_format = Some(format);
        self
    }

    pub fn with_fallback_string(mut self, fallback: impl Into<String>) -> Self {
        self.fallback_string = fallback.into();
        self
    }

    pub fn with_tuning(mut self, tuning: GeneratorTuning) -> Self {
        self.tuning = tuning;
        self
    }

    pub fn with_match_generator(mut self, factory: Arc<dyn MatchGeneratorFactory>) -> Self {
        self.match_generator = factory;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// The increment in effect: the custom function, or `+ increment_step`.
    pub(crate) fn increment(&self) -> IncrementFn {
        self.increment_function
            .clone()
            .unwrap_or_else(|| step_increment(self.increment_step))
    }
}

impl fmt::Debug for GeneratorOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeneratorOptions")
            .field("counter_init", &self.counter_init)
            .field("increment_step", &self.increment_step)
            .field("custom_increment", &self.increment_function.is_some())
            .field("get_counter", &self.get_counter.is_some())
            .field("set_counter", &self.set_counter.is_some())
            .field("custom_replacers", &self.custom_replacers)
            .field("number_format", &self.number_format)
            .field("fallback_string", &self.fallback_string)
            .field("tuning", &self.tuning)
            .field("seed", &self.seed)
            .finish()
    }
}

/// Partial update applied by
/// [`PatternGenerator::set_options`](crate::PatternGenerator::set_options).
///
/// `None` leaves the current setting unchanged.
#[derive(Clone, Default)]
pub struct SetOptions {
    pub get_counter: Option<Arc<dyn CounterGet>>,
    pub set_counter: Option<Arc<dyn CounterSet>>,
    pub custom_replacers: Option<ReplacerRegistry>,
    pub number_format: Option<Arc<dyn NumberFormat>>,
    pub fallback_string: Option<String>,
    /// Changing the tuning recompiles the pattern
    pub tuning: Option<GeneratorTuning>,
}

impl SetOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_counter(mut self, get: Arc<dyn CounterGet>) -> Self {
        self.get_counter = Some(get);
        self
    }

    pub fn set_counter(mut self, set: Arc<dyn CounterSet>) -> Self {
        self.set_counter = Some(set);
        self
    }

    pub fn custom_replacers(mut self, replacers: ReplacerRegistry) -> Self {
        self.custom_replacers = Some(replacers);
        self
    }

    pub fn number_format(mut self, format: Arc<dyn NumberFormat>) -> Self {
        self.number_format = Some(format);
        self
    }

    pub fn fallback_string(mut self, fallback: impl Into<String>) -> Self {
        self.fallback_string = Some(fallback.into());
        self
    }

    pub fn tuning(mut self, tuning: GeneratorTuning) -> Self {
        self.tuning = Some(tuning);
        self
    }
}

/// Options for a single generation call.
#[derive(Debug, Clone)]
pub struct GenerateOptions {
    /// Advance the counter (default `true`); otherwise reuse the last value
    pub should_increment: bool,
    /// Per-function argument overrides, taking precedence over capture groups
    pub custom_args: HashMap<String, Vec<Value>>,
    /// Object for `<dotted.path>` placeholders
    pub data: Option<Value>,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            should_increment: true,
            custom_args: HashMap::new(),
            data: None,
        }
    }
}

impl GenerateOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reuse the previous counter value.
    pub fn without_increment(mut self) -> Self {
        self.should_increment = false;
        self
    }

    pub fn with_args(mut self, name: impl Into<String>, args: Vec<Value>) -> Self {
        self.custom_args.insert(name.into(), args);
        self
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }
}
