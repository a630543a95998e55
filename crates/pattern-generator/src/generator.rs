//! Generation orchestrator.

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use futures::future::try_join_all;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_json::Value;

use crate::compiler::CompiledPattern;
use crate::counter::{Counter, CounterValue};
use crate::data;
use crate::error::{CompileError, GenerateError, Result};
use crate::escape::{readable, splice_tokens, Token};
use crate::format::{format_counter, NumberFormat};
use crate::options::{GenerateOptions, GeneratorOptions, SetOptions};
use crate::random::{GeneratorTuning, MatchGeneratorFactory};
use crate::replacer::ReplacerRegistry;
use crate::substitution::Placeholder;

/// Generates strings from one compiled pattern.
///
/// Each [`generate`](Self::generate) call runs, in order:
///
/// 1. resolve the counter value (may await an external store)
/// 2. generate one random string matching the plain pattern
/// 3. re-match it to recover capture groups
/// 4. format counter placeholders
/// 5. resolve function arguments (override > capture groups > none)
/// 6. run every function replacer concurrently and await them all
/// 7. look up data paths, falling back on a miss
/// 8. splice every value and escaped literal into the text in one pass
///
/// Capture groups come from the text produced in step 2, so function
/// arguments never observe substituted counter or data text.
///
/// The generator is single-writer: `generate` and the mutators take
/// `&mut self`. Share one behind a `tokio::sync::Mutex` if several tasks
/// need it.
pub struct PatternGenerator {
    compiled: CompiledPattern,
    counter: Counter,
    replacers: ReplacerRegistry,
    number_format: Option<Arc<dyn NumberFormat>>,
    fallback: String,
    tuning: GeneratorTuning,
    factory: Arc<dyn MatchGeneratorFactory>,
    rng: StdRng,
}

impl PatternGenerator {
    /// Compile `pattern` and build a generator around it.
    pub fn new(pattern: &str, options: GeneratorOptions) -> Result<Self, CompileError> {
        let compiled =
            CompiledPattern::compile(pattern, &options.tuning, options.match_generator.as_ref())?;

        let mut counter = Counter::new(options.counter_init.clone(), options.increment());
        counter.set_get_hook(options.get_counter);
        counter.set_set_hook(options.set_counter);

        let rng = match options.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Ok(Self {
            compiled,
            counter,
            replacers: options.custom_replacers,
            number_format: options.number_format,
            fallback: options.fallback_string,
            tuning: options.tuning,
            factory: options.match_generator,
            rng,
        })
    }

    /// The compiled pattern currently in use.
    pub fn pattern(&self) -> &CompiledPattern {
        &self.compiled
    }

    /// Counter value embedded by the most recent call.
    pub fn counter_value(&self) -> &CounterValue {
        self.counter.last()
    }

    /// Replace the pattern, recompiling from scratch.
    ///
    /// Counter state is preserved. On error the previous pattern stays in
    /// place.
    pub fn set_pattern(&mut self, pattern: &str) -> Result<(), CompileError> {
        self.compiled = CompiledPattern::compile(pattern, &self.tuning, self.factory.as_ref())?;
        Ok(())
    }

    /// Apply a partial options update.
    ///
    /// A tuning change recompiles the current pattern; if that fails nothing
    /// is changed.
    pub fn set_options(&mut self, options: SetOptions) -> Result<(), CompileError> {
        if let Some(tuning) = options.tuning {
            self.compiled =
                CompiledPattern::compile(self.compiled.source(), &tuning, self.factory.as_ref())?;
            self.tuning = tuning;
        }
        if let Some(get) = options.get_counter {
            self.counter.set_get_hook(Some(get));
        }
        if let Some(set) = options.set_counter {
            self.counter.set_set_hook(Some(set));
        }
        if let Some(replacers) = options.custom_replacers {
            self.replacers = replacers;
        }
        if let Some(format) = options.number_format {
            self.number_format = Some(format);
        }
        if let Some(fallback) = options.fallback_string {
            self.fallback = fallback;
        }
        Ok(())
    }

    /// Generate one string.
    pub async fn generate(&mut self, options: &GenerateOptions) -> Result<String> {
        let substitutions = self.compiled.substitutions();

        // Fail before touching the counter when a replacer is missing.
        if let Some((_, name, _)) = substitutions
            .functions()
            .find(|(_, name, _)| !self.replacers.contains(name))
        {
            return Err(GenerateError::MissingReplacer {
                name: name.to_string(),
            });
        }

        let counter = if substitutions.has_counter() {
            Some(self.counter.resolve(options.should_increment).await?)
        } else {
            None
        };

        let substitutions = self.compiled.substitutions();
        let text = self.compiled.generator().generate(&mut self.rng);
        tracing::trace!(text = %readable(&text), "Generated random match");

        let groups = if substitutions
            .functions()
            .any(|(_, _, arg_indices)| !arg_indices.is_empty())
        {
            self.compiled.capture_groups(&text)
        } else {
            Vec::new()
        };

        let mut values: Vec<Option<String>> = vec![None; substitutions.len()];

        if let Some(counter) = &counter {
            for (index, placeholder) in substitutions.iter() {
                if let Placeholder::Counter { width } = placeholder {
                    values[index] =
                        Some(format_counter(counter, *width, self.number_format.as_deref()));
                }
            }
        }

        let mut calls = Vec::new();
        for (index, name, arg_indices) in substitutions.functions() {
            let replacer = self
                .replacers
                .get(name)
                .cloned()
                .ok_or_else(|| GenerateError::MissingReplacer {
                    name: name.to_string(),
                })?;
            let args = resolve_args(name, arg_indices, options, &groups);
            calls.push(async move {
                replacer
                    .replace(args)
                    .await
                    .map(|value| (index, value))
                    .map_err(|source| GenerateError::Replacer {
                        name: name.to_string(),
                        source,
                    })
            });
        }
        for (index, value) in try_join_all(calls).await? {
            values[index] = Some(value);
        }

        for (index, placeholder) in substitutions.iter() {
            if let Placeholder::DataPath { path } = placeholder {
                values[index] = Some(data::get_or_fallback(
                    options.data.as_ref(),
                    path,
                    &self.fallback,
                ));
            }
        }

        let escapes = self.compiled.escapes();
        let output = splice_tokens(&text, |token| match token {
            Token::Placeholder(index) => values
                .get(index)
                .and_then(|value| value.as_deref())
                .map(Cow::Borrowed),
            Token::Escape(index) => escapes.get(index).map(|c| Cow::Owned(c.to_string())),
        })
        .into_owned();

        tracing::debug!(output = %output, "Generated string");
        Ok(output)
    }

    /// Generate `count` strings with the same call options.
    pub async fn generate_many(
        &mut self,
        count: usize,
        options: &GenerateOptions,
    ) -> Result<Vec<String>> {
        let mut out = Vec::with_capacity(count);
        for _ in 0..count {
            out.push(self.generate(options).await?);
        }
        Ok(out)
    }
}

/// Arguments for one function placeholder: the caller's override if any,
/// otherwise the capture groups at the declared indices.
fn resolve_args(
    name: &str,
    arg_indices: &[usize],
    options: &GenerateOptions,
    groups: &[Option<String>],
) -> Vec<Value> {
    if let Some(args) = options.custom_args.get(name) {
        return args.clone();
    }
    arg_indices
        .iter()
        .map(|&i| match groups.get(i - 1) {
            Some(Some(group)) => Value::String(group.clone()),
            _ => Value::Null,
        })
        .collect()
}

impl fmt::Debug for PatternGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PatternGenerator")
            .field("pattern", &self.compiled)
            .field("counter", self.counter.last())
            .field("replacers", &self.replacers)
            .field("number_format", &self.number_format)
            .field("fallback", &self.fallback)
            .field("tuning", &self.tuning)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_resolve_args_precedence() {
        let groups = vec![Some("45".to_string()), None, Some("x".to_string())];

        let options = GenerateOptions::new();
        assert_eq!(
            resolve_args("f", &[1, 2, 3], &options, &groups),
            vec![json!("45"), Value::Null, json!("x")]
        );
        assert!(resolve_args("f", &[], &options, &groups).is_empty());

        let options = GenerateOptions::new().with_args("f", vec![json!(10)]);
        assert_eq!(resolve_args("f", &[1], &options, &groups), vec![json!(10)]);
        assert_eq!(resolve_args("g", &[3], &options, &groups), vec![json!("x")]);
    }
}
