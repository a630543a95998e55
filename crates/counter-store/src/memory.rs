//! In-memory counter storage.

use anyhow::Result;
use async_trait::async_trait;
use pattern_generator::{CounterGet, CounterSet, CounterValue, IncrementFn};
use serde_json::Value;
use tokio::sync::Mutex;

/// Counter held in process memory.
///
/// Useful to share one sequence between several generators.
pub struct MemoryStore {
    value: Mutex<CounterValue>,
}

impl MemoryStore {
    pub fn new(initial: impl Into<CounterValue>) -> Self {
        Self {
            value: Mutex::new(initial.into()),
        }
    }

    /// Current value.
    pub async fn current(&self) -> CounterValue {
        self.value.lock().await.clone()
    }

    /// Return the current value and store `increment(current)`, under one
    /// lock.
    pub async fn next_value(&self, increment: &IncrementFn) -> Result<CounterValue> {
        let mut value = self.value.lock().await;
        let next = increment(&*value)
            .ok_or_else(|| anyhow::anyhow!("counter value '{}' cannot be advanced", *value))?;
        Ok(std::mem::replace(&mut *value, next))
    }
}

#[async_trait]
impl CounterGet for MemoryStore {
    async fn get_counter(&self) -> Result<Value> {
        Ok(self.value.lock().await.to_json())
    }
}

#[async_trait]
impl CounterSet for MemoryStore {
    async fn set_counter(&self, value: &CounterValue) -> Result<()> {
        *self.value.lock().await = value.clone();
        Ok(())
    }
}
