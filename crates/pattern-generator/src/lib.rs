//! Regex-driven string generator for realistic sample data.
//!
//! A pattern is an ordinary regular expression that may embed placeholders:
//!
//! - `<+ddd>` - an auto-incrementing counter, zero-padded to the number of
//!   `d` markers
//! - `<?name>` / `<?name(1,2)>` - a custom (sync or async) replacer, fed by
//!   capture groups or by per-call arguments
//! - `<user.firstName>` - a dotted-path lookup into per-call data
//!
//! Escaped `\<` and `\>` are literal angle brackets in the output.
//!
//! # Architecture
//!
//! ```text
//! pattern source
//!        │
//!        ▼
//! ┌──────────────────┐      ┌──────────────────────┐
//! │ CompiledPattern  │─────▶│ SubstitutionMap      │ index → placeholder
//! │  - plain pattern │      │ EscapeTable          │ index → literal
//! │  - matcher       │      └──────────────────────┘
//! │  - generator     │
//! └────────┬─────────┘
//!          │             ┌─────────────┐
//!          ▼             │ Counter     │ internal sequence or get/set hooks
//! ┌──────────────────┐◀──┤ Replacers   │ name → async fn
//! │ PatternGenerator │   │ Data lookup │ dotted path → fallback
//! └────────┬─────────┘   └─────────────┘
//!          ▼
//!       String
//! ```
//!
//! # Example
//!
//! ```rust
//! use pattern_generator::{compile, GenerateOptions, GeneratorOptions};
//!
//! # tokio_test::block_on(async {
//! let mut generator = compile("[A-Z]{3}-<+ddd>", GeneratorOptions::new()).unwrap();
//! let first = generator.generate(&GenerateOptions::new()).await.unwrap();
//! assert!(first.ends_with("-001"));
//! # });
//! ```

pub mod compiler;
pub mod config;
pub mod counter;
pub mod data;
pub mod error;
pub mod escape;
pub mod format;
pub mod generator;
pub mod options;
pub mod random;
pub mod replacer;
pub mod substitution;


// Re-exports for convenience
pub use compiler::CompiledPattern;
pub use config::{ConfigError, GeneratorConfig};
pub use counter::{
    get_counter_fn, normalize_counter, set_counter_fn, step_increment, CounterGet, CounterSet,
    CounterValue, IncrementFn,
};
pub use error::{CompileError, GenerateError};
pub use escape::EscapeTable;
pub use format::{format_counter, GroupedNumberFormat, NumberFormat};
pub use generator::PatternGenerator;
pub use options::{GenerateOptions, GeneratorOptions, SetOptions};
pub use random::{
    GeneratorTuning, HirGenerator, HirGeneratorFactory, MatchGenerator, MatchGeneratorFactory,
};
pub use replacer::{arg_text, Replacer, ReplacerRegistry};
pub use substitution::{Placeholder, SubstitutionMap};

/// Compile `pattern` into a generator.
pub fn compile(
    pattern: &str,
    options: GeneratorOptions,
) -> Result<PatternGenerator, CompileError> {
    PatternGenerator::new(pattern, options)
}
