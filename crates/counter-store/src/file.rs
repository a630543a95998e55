//! Filesystem-based counter storage.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pattern_generator::{CounterGet, CounterSet, CounterValue};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::PathBuf;

/// Counter record written to disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredCounter {
    /// Counter name, for humans reading the file
    pub name: String,
    pub value: CounterValue,
    /// Timestamp of the last write
    pub updated_at: DateTime<Utc>,
}

/// Counter persisted as a pretty-printed JSON file.
///
/// Until the first write, reads return the initial value.
pub struct FileStore {
    path: PathBuf,
    name: String,
    initial: CounterValue,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>, initial: impl Into<CounterValue>) -> Self {
        let path = path.into();
        let name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "counter".to_string());
        Self {
            path,
            name,
            initial: initial.into(),
        }
    }

    /// Override the name recorded in the file.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// Read the stored record, if the file exists.
    pub fn read(&self) -> Result<Option<StoredCounter>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read counter file {}", self.path.display()))?;
        let stored = serde_json::from_str(&content)
            .with_context(|| format!("Invalid counter file {}", self.path.display()))?;
        Ok(Some(stored))
    }
}

#[async_trait]
impl CounterGet for FileStore {
    async fn get_counter(&self) -> Result<Value> {
        let value = match self.read()? {
            Some(stored) => stored.value,
            None => self.initial.clone(),
        };
        Ok(value.to_json())
    }
}

#[async_trait]
impl CounterSet for FileStore {
    async fn set_counter(&self, value: &CounterValue) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let stored = StoredCounter {
            name: self.name.clone(),
            value: value.clone(),
            updated_at: Utc::now(),
        };
        std::fs::write(&self.path, serde_json::to_string_pretty(&stored)?)?;
        tracing::info!("Stored counter {} to {}", value, self.path.display());
        Ok(())
    }
}
