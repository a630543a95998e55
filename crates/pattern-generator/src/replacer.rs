//! Custom replacer functions and their registry.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

/// A named function invoked for `<?name(...)>` placeholders.
///
/// Arguments are either capture groups (as JSON strings, or `null` for a
/// group that did not participate) or the caller's per-call override.
#[async_trait]
pub trait Replacer: Send + Sync {
    async fn replace(&self, args: Vec<Value>) -> anyhow::Result<String>;
}

struct SyncFn<F>(F);

#[async_trait]
impl<F> Replacer for SyncFn<F>
where
    F: Fn(Vec<Value>) -> anyhow::Result<String> + Send + Sync + 'static,
{
    async fn replace(&self, args: Vec<Value>) -> anyhow::Result<String> {
        (self.0)(args)
    }
}

struct AsyncFn<F>(F);

#[async_trait]
impl<F, Fut> Replacer for AsyncFn<F>
where
    F: Fn(Vec<Value>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<String>> + Send + 'static,
{
    async fn replace(&self, args: Vec<Value>) -> anyhow::Result<String> {
        (self.0)(args).await
    }
}

/// Name → replacer map supplied at construction.
#[derive(Clone, Default)]
pub struct ReplacerRegistry {
    replacers: HashMap<String, Arc<dyn Replacer>>,
}

impl ReplacerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a replacer object.
    pub fn insert(&mut self, name: impl Into<String>, replacer: Arc<dyn Replacer>) -> &mut Self {
        self.replacers.insert(name.into(), replacer);
        self
    }

    /// Register a synchronous function.
    pub fn register_fn<F>(&mut self, name: impl Into<String>, f: F) -> &mut Self
    where
        F: Fn(Vec<Value>) -> anyhow::Result<String> + Send + Sync + 'static,
    {
        self.insert(name, Arc::new(SyncFn(f)))
    }

    /// Register an asynchronous function.
    pub fn register_async<F, Fut>(&mut self, name: impl Into<String>, f: F) -> &mut Self
    where
        F: Fn(Vec<Value>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<String>> + Send + 'static,
    {
        self.insert(name, Arc::new(AsyncFn(f)))
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Replacer>> {
        self.replacers.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.replacers.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.replacers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.replacers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.replacers.is_empty()
    }
}

impl fmt::Debug for ReplacerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReplacerRegistry")
            .field("names", &self.names())
            .finish()
    }
}

/// Text of a JSON argument as a replacer would usually want it: strings
/// without quotes, `null` as empty.
pub fn arg_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_sync_and_async_replacers() {
        let mut registry = ReplacerRegistry::new();
        registry
            .register_fn("upper", |args| {
                Ok(args.iter().map(arg_text).collect::<String>().to_uppercase())
            })
            .register_async("count", |args| async move {
                Ok::<_, anyhow::Error>(args.len().to_string())
            });

        assert_eq!(registry.names(), vec!["count", "upper"]);

        let upper = registry.get("upper").unwrap();
        assert_eq!(upper.replace(vec![json!("_end")]).await.unwrap(), "_END");

        let count = registry.get("count").unwrap();
        assert_eq!(
            count.replace(vec![json!(1), json!("a")]).await.unwrap(),
            "2"
        );
    }

    #[test]
    fn test_arg_text() {
        assert_eq!(arg_text(&json!("ab")), "ab");
        assert_eq!(arg_text(&json!(10)), "10");
        assert_eq!(arg_text(&Value::Null), "");
    }

    #[test]
    fn test_debug_lists_names() {
        let mut registry = ReplacerRegistry::new();
        registry.register_fn("b", |_| Ok(String::new()));
        registry.register_fn("a", |_| Ok(String::new()));
        assert_eq!(
            format!("{registry:?}"),
            r#"ReplacerRegistry { names: ["a", "b"] }"#
        );
    }
}
