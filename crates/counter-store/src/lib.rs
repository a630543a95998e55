//! Counter storage backends for pattern-generator.
//!
//! Both stores implement the generator's `CounterGet` and `CounterSet`
//! hooks, so one instance can be wired in with
//! `GeneratorOptions::with_counter_store`.
//!
//! ## Storage Backends
//!
//! - `MemoryStore` - Keeps the counter in process memory
//! - `FileStore` - Persists the counter as a JSON file, surviving restarts

mod file;
mod memory;

#[cfg(test)]
mod tests;

pub use file::{FileStore, StoredCounter};
pub use memory::MemoryStore;
