//! Counter engine.
//!
//! By default the counter is an internal sequence starting at
//! `counter_init` and advanced by the increment function. Callers can plug
//! in an external store through [`CounterGet`] and [`CounterSet`]:
//!
//! ```text
//!   advance = true                       advance = false
//!   ──────────────                       ───────────────
//!   value ← get_counter()  (or internal) value ← last value
//!   set_counter(increment(value))        (no hook calls)
//!   last  ← value
//! ```
//!
//! The get/advance/set sequence is not atomic. Two overlapping calls against
//! a shared non-atomic store can read the same value; back the hooks with
//! an atomic store (see the `counter-store` crate) or serialize calls when
//! strict ordering matters.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{GenerateError, Result};

/// A counter value: numeric, or text for non-numeric sequences such as
/// licence plates (`AAA100`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CounterValue {
    Number(i64),
    Text(String),
}

impl CounterValue {
    /// Numeric view of the value; numeric text parses.
    pub fn as_number(&self) -> Option<i64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(s) => s.trim().parse().ok(),
        }
    }

    /// JSON representation passed to external stores.
    pub fn to_json(&self) -> Value {
        match self {
            Self::Number(n) => Value::from(*n),
            Self::Text(s) => Value::from(s.as_str()),
        }
    }
}

impl fmt::Display for CounterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for CounterValue {
    fn from(n: i64) -> Self {
        Self::Number(n)
    }
}

impl From<&str> for CounterValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for CounterValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

/// Pure function producing the value after `current`.
///
/// Returns `None` when `current` cannot be advanced.
pub type IncrementFn = Arc<dyn Fn(&CounterValue) -> Option<CounterValue> + Send + Sync>;

/// Increment adding `step` to the numeric view of the value.
pub fn step_increment(step: i64) -> IncrementFn {
    Arc::new(move |current: &CounterValue| {
        current
            .as_number()
            .and_then(|n| n.checked_add(step))
            .map(CounterValue::Number)
    })
}

fn advance(increment: &IncrementFn, current: &CounterValue) -> Result<CounterValue> {
    increment(current).ok_or_else(|| {
        let reason = match current.as_number() {
            Some(_) => "the increment overflowed i64 or was rejected by the increment function",
            None => "the value is not numeric and the increment function rejected it",
        };
        GenerateError::InvalidCounterSource(format!(
            "counter value '{current}' cannot be advanced: {reason}"
        ))
    })
}

/// Normalize a raw value returned by `get_counter`.
///
/// Integers and strings pass through. A wrapped "next" result
/// (`{"value": v, "done": false}`) is unwrapped. Anything else, including an
/// exhausted sequence (`"done": true`), is rejected.
pub fn normalize_counter(raw: Value) -> Result<CounterValue> {
    match raw {
        Value::Number(n) => n.as_i64().map(CounterValue::Number).ok_or_else(|| {
            GenerateError::InvalidCounterSource(format!("counter value {n} is not an integer"))
        }),
        Value::String(s) => Ok(CounterValue::Text(s)),
        Value::Object(mut map) => match map.remove("value") {
            Some(_) if map.get("done") == Some(&Value::Bool(true)) => {
                Err(GenerateError::InvalidCounterSource(
                    "counter sequence has reached its limit".to_string(),
                ))
            }
            Some(inner @ (Value::Number(_) | Value::String(_))) => normalize_counter(inner),
            Some(other) => Err(GenerateError::InvalidCounterSource(format!(
                "unsupported wrapped counter value {other}"
            ))),
            None => Err(GenerateError::InvalidCounterSource(format!(
                "unsupported counter value {}",
                Value::Object(map)
            ))),
        },
        other => Err(GenerateError::InvalidCounterSource(format!(
            "unsupported counter value {other}"
        ))),
    }
}

/// Hook reading the current counter from an external store.
#[async_trait]
pub trait CounterGet: Send + Sync {
    async fn get_counter(&self) -> anyhow::Result<Value>;
}

/// Hook persisting the advanced counter to an external store.
#[async_trait]
pub trait CounterSet: Send + Sync {
    async fn set_counter(&self, value: &CounterValue) -> anyhow::Result<()>;
}

struct GetFn<F>(F);

#[async_trait]
impl<F, Fut> CounterGet for GetFn<F>
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<Value>> + Send + 'static,
{
    async fn get_counter(&self) -> anyhow::Result<Value> {
        (self.0)().await
    }
}

struct SetFn<F>(F);

#[async_trait]
impl<F, Fut> CounterSet for SetFn<F>
where
    F: Fn(CounterValue) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    async fn set_counter(&self, value: &CounterValue) -> anyhow::Result<()> {
        (self.0)(value.clone()).await
    }
}

/// Wrap an async closure as a `get_counter` hook.
pub fn get_counter_fn<F, Fut>(f: F) -> Arc<dyn CounterGet>
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<Value>> + Send + 'static,
{
    Arc::new(GetFn(f))
}

/// Wrap an async closure as a `set_counter` hook.
pub fn set_counter_fn<F, Fut>(f: F) -> Arc<dyn CounterSet>
where
    F: Fn(CounterValue) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    Arc::new(SetFn(f))
}

/// Internal sequence producing `init`, `increment(init)`, ...
pub struct Sequence {
    init: CounterValue,
    last: Option<CounterValue>,
    increment: IncrementFn,
}

impl Sequence {
    pub fn new(init: CounterValue, increment: IncrementFn) -> Self {
        Self {
            init,
            last: None,
            increment,
        }
    }

    /// Produce the next value of the sequence.
    pub fn next_value(&mut self) -> Result<CounterValue> {
        let next = match &self.last {
            None => self.init.clone(),
            Some(last) => advance(&self.increment, last)?,
        };
        self.last = Some(next.clone());
        Ok(next)
    }
}

/// Counter state owned by a generator.
pub struct Counter {
    sequence: Sequence,
    increment: IncrementFn,
    get: Option<Arc<dyn CounterGet>>,
    set: Option<Arc<dyn CounterSet>>,
    last: CounterValue,
}

impl Counter {
    pub fn new(init: CounterValue, increment: IncrementFn) -> Self {
        Self {
            sequence: Sequence::new(init.clone(), increment.clone()),
            increment,
            get: None,
            set: None,
            last: init,
        }
    }

    pub fn set_get_hook(&mut self, get: Option<Arc<dyn CounterGet>>) {
        self.get = get;
    }

    pub fn set_set_hook(&mut self, set: Option<Arc<dyn CounterSet>>) {
        self.set = set;
    }

    /// The value embedded by the most recent call (`counter_init` before the
    /// first one).
    pub fn last(&self) -> &CounterValue {
        &self.last
    }

    /// Resolve the value for one generation call.
    ///
    /// With `advance_counter == false` the previous value is reused and no hook is
    /// invoked.
    pub async fn resolve(&mut self, advance_counter: bool) -> Result<CounterValue> {
        if !advance_counter {
            return Ok(self.last.clone());
        }

        let value = match &self.get {
            Some(get) => {
                let raw = get
                    .get_counter()
                    .await
                    .map_err(GenerateError::CounterHook)?;
                normalize_counter(raw)?
            }
            None => self.sequence.next_value()?,
        };

        if let Some(set) = &self.set {
            let next = advance(&self.increment, &value)?;
            set.set_counter(&next)
                .await
                .map_err(GenerateError::CounterHook)?;
        }

        tracing::debug!(counter = %value, "Resolved counter value");
        self.last = value.clone();
        Ok(value)
    }
}
