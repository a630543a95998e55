//! Random-match generation for placeholder-free patterns.
//!
//! The orchestrator only needs "give me one string matching this regex".
//! That contract is the [`MatchGenerator`] trait; [`MatchGeneratorFactory`]
//! binds a generator to a compiled plain pattern. The default factory walks
//! the `regex-syntax` HIR of the pattern:
//!
//! - literals are emitted verbatim
//! - classes pick a uniformly random code point
//! - alternations pick a uniformly random branch
//! - repetitions pick a count in `[min, max]`; an unbounded max becomes
//!   `min + max_repetition`
//! - anchors and other look-around assertions emit nothing
//!
//! Wide classes such as `.`, `\w` or `[^a]` are narrowed to the default
//! range (printable ASCII, adjusted by the tuning knobs) so that output stays
//! readable. No class ever yields a reserved token delimiter; the only
//! delimiters in generated text come from the literal tokens themselves.

use rand::{Rng, RngCore};
use regex_syntax::hir::{Class, ClassBytes, ClassUnicode, ClassUnicodeRange, Hir, HirKind};
use serde::{Deserialize, Serialize};

use crate::error::CompileError;
use crate::escape::{TOKEN_CLOSE, TOKEN_OPEN};

/// Classes covering more code points than this are narrowed to the default
/// range.
const WIDE_CLASS_THRESHOLD: u32 = 256;

/// Tunable knobs passed to the random-match generator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorTuning {
    /// Inclusive character ranges added to the default range
    pub range_add: Vec<(char, char)>,
    /// Inclusive character ranges removed from the default range
    pub range_subtract: Vec<(char, char)>,
    /// Extra repetitions allowed for unbounded quantifiers (`*`, `+`, `{n,}`)
    pub max_repetition: u32,
}

impl Default for GeneratorTuning {
    fn default() -> Self {
        Self {
            range_add: Vec::new(),
            range_subtract: Vec::new(),
            max_repetition: 100,
        }
    }
}

impl GeneratorTuning {
    /// Printable ASCII adjusted by `range_add` / `range_subtract`.
    pub fn default_range(&self) -> ClassUnicode {
        let mut class = ClassUnicode::new([ClassUnicodeRange::new(' ', '~')]);
        class.union(&to_class(&self.range_add));
        class.difference(&to_class(&self.range_subtract));
        class.difference(&reserved_class());
        class
    }
}

fn reserved_class() -> ClassUnicode {
    ClassUnicode::new([ClassUnicodeRange::new(TOKEN_OPEN, TOKEN_CLOSE)])
}

fn to_class(ranges: &[(char, char)]) -> ClassUnicode {
    ClassUnicode::new(
        ranges
            .iter()
            .map(|&(start, end)| ClassUnicodeRange::new(start, end)),
    )
}

/// Produces random strings matching one bound pattern.
///
/// Implementations must emit literals verbatim and must never draw the
/// reserved token delimiters (`U+E000`, `U+E001`) from a class.
pub trait MatchGenerator: Send + Sync {
    /// Return one random string matching the bound pattern.
    fn generate(&self, rng: &mut dyn RngCore) -> String;
}

/// Binds a [`MatchGenerator`] to a plain pattern.
///
/// Called on every (re)compilation.
pub trait MatchGeneratorFactory: Send + Sync {
    fn bind(
        &self,
        plain_pattern: &str,
        tuning: &GeneratorTuning,
    ) -> Result<Box<dyn MatchGenerator>, CompileError>;
}

/// Factory for [`HirGenerator`].
#[derive(Debug, Clone, Copy, Default)]
pub struct HirGeneratorFactory;

impl MatchGeneratorFactory for HirGeneratorFactory {
    fn bind(
        &self,
        plain_pattern: &str,
        tuning: &GeneratorTuning,
    ) -> Result<Box<dyn MatchGenerator>, CompileError> {
        Ok(Box::new(HirGenerator::new(plain_pattern, tuning)?))
    }
}

/// Default random-match generator driven by the pattern's HIR.
#[derive(Debug, Clone)]
pub struct HirGenerator {
    hir: Hir,
    default_range: ClassUnicode,
    max_repetition: u32,
}

impl HirGenerator {
    pub fn new(pattern: &str, tuning: &GeneratorTuning) -> Result<Self, CompileError> {
        let hir = regex_syntax::ParserBuilder::new().build().parse(pattern)?;
        Ok(Self {
            hir,
            default_range: tuning.default_range(),
            max_repetition: tuning.max_repetition,
        })
    }

    fn emit(&self, hir: &Hir, rng: &mut dyn RngCore, out: &mut String) {
        match hir.kind() {
            HirKind::Empty | HirKind::Look(_) => {}
            HirKind::Literal(literal) => out.push_str(&String::from_utf8_lossy(&literal.0)),
            HirKind::Class(Class::Unicode(class)) => {
                if let Some(c) = pick_char(&self.narrow(class), rng) {
                    out.push(c);
                }
            }
            HirKind::Class(Class::Bytes(class)) => {
                if let Some(b) = pick_byte(class, rng) {
                    out.push(char::from(b));
                }
            }
            HirKind::Repetition(rep) => {
                let max = rep
                    .max
                    .unwrap_or_else(|| rep.min.saturating_add(self.max_repetition));
                let count = rng.gen_range(rep.min..=max.max(rep.min));
                for _ in 0..count {
                    self.emit(&rep.sub, rng, out);
                }
            }
            HirKind::Capture(capture) => self.emit(&capture.sub, rng, out),
            HirKind::Concat(subs) => {
                for sub in subs {
                    self.emit(sub, rng, out);
                }
            }
            HirKind::Alternation(subs) => {
                let branch = rng.gen_range(0..subs.len());
                self.emit(&subs[branch], rng, out);
            }
        }
    }

    /// Intersect a wide class with the default range, keeping the original
    /// class when nothing would remain. Reserved delimiters are always
    /// removed.
    fn narrow(&self, class: &ClassUnicode) -> ClassUnicode {
        let mut allowed = class.clone();
        allowed.difference(&reserved_class());
        if class_size(&allowed) <= WIDE_CLASS_THRESHOLD {
            return allowed;
        }
        let mut narrowed = allowed.clone();
        narrowed.intersect(&self.default_range);
        if narrowed.ranges().is_empty() {
            allowed
        } else {
            narrowed
        }
    }
}

impl MatchGenerator for HirGenerator {
    fn generate(&self, rng: &mut dyn RngCore) -> String {
        let mut out = String::new();
        self.emit(&self.hir, rng, &mut out);
        out
    }
}

fn class_size(class: &ClassUnicode) -> u32 {
    class
        .ranges()
        .iter()
        .map(|r| u32::from(r.end()) - u32::from(r.start()) + 1)
        .sum()
}

fn pick_char(class: &ClassUnicode, rng: &mut dyn RngCore) -> Option<char> {
    let total = class_size(class);
    if total == 0 {
        return None;
    }
    let mut offset = rng.gen_range(0..total);
    for range in class.ranges() {
        let start = u32::from(range.start());
        let len = u32::from(range.end()) - start + 1;
        if offset < len {
            // Ranges spanning the surrogate block can land on a non-char.
            return Some(char::from_u32(start + offset).unwrap_or(range.start()));
        }
        offset -= len;
    }
    None
}

fn pick_byte(class: &ClassBytes, rng: &mut dyn RngCore) -> Option<u8> {
    let total: u32 = class
        .ranges()
        .iter()
        .map(|r| u32::from(r.end()) - u32::from(r.start()) + 1)
        .sum();
    if total == 0 {
        return None;
    }
    let mut offset = rng.gen_range(0..total);
    for range in class.ranges() {
        let len = u32::from(range.end()) - u32::from(range.start()) + 1;
        if offset < len {
            return u8::try_from(u32::from(range.start()) + offset).ok();
        }
        offset -= len;
    }
    None
}
