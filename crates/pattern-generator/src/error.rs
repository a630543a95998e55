//! Error types for pattern compilation and generation.

/// Error raised while compiling a pattern source.
///
/// Compilation is synchronous, so these surface directly from
/// [`PatternGenerator::new`](crate::PatternGenerator::new) and
/// [`PatternGenerator::set_pattern`](crate::PatternGenerator::set_pattern).
#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    /// `<?...>` token with nothing (or only an argument list) after the `?`
    #[error("Empty function name in placeholder '<{token}>'")]
    EmptyFunctionName { token: String },

    /// Function name containing characters other than `[A-Za-z0-9_]`
    #[error("Malformed function placeholder '<{token}>': {reason}")]
    MalformedFunction { token: String, reason: String },

    /// `<+...>` token containing something other than digit markers
    #[error("Malformed counter placeholder '<{token}>': only 'd' digit markers may follow '+'")]
    MalformedCounter { token: String },

    /// Function argument that is not a 1-based integer
    #[error("Invalid argument '{argument}' in placeholder '<{token}>': expected a 1-based capture group index")]
    InvalidArgument { token: String, argument: String },

    /// Function argument pointing past the last capture group of the pattern
    #[error("Placeholder '<{token}>' requests capture group {index} but the pattern only has {available}")]
    CaptureGroupOutOfRange {
        token: String,
        index: usize,
        available: usize,
    },

    /// Literal use of a code point reserved for neutral tokens
    #[error("Pattern may not contain the reserved character U+{:04X}", u32::from(*character))]
    ReservedCharacter { character: char },

    /// The placeholder-free pattern is not valid regex syntax
    #[error("Invalid regex: {0}")]
    Regex(String),
}

impl From<regex::Error> for CompileError {
    fn from(err: regex::Error) -> Self {
        Self::Regex(err.to_string())
    }
}

impl From<regex_syntax::Error> for CompileError {
    fn from(err: regex_syntax::Error) -> Self {
        Self::Regex(err.to_string())
    }
}

/// Error raised by a single generation call.
///
/// Any of these aborts the call; no partial output is produced.
#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    /// A function placeholder names a replacer that is not registered
    #[error("Missing custom replacer function: {name}")]
    MissingReplacer { name: String },

    /// The counter source produced a value of an unrecognized shape
    #[error("Invalid counter source: {0}")]
    InvalidCounterSource(String),

    /// The external `get_counter` / `set_counter` hook failed
    #[error("Counter hook failed: {0:#}")]
    CounterHook(#[source] anyhow::Error),

    /// A custom replacer returned an error
    #[error("Custom replacer '{name}' failed: {source:#}")]
    Replacer {
        name: String,
        #[source]
        source: anyhow::Error,
    },
}

/// Result alias for generation calls.
pub type Result<T, E = GenerateError> = std::result::Result<T, E>;
