//! Pattern compiler.
//!
//! Turns an annotated pattern source into:
//!
//! - a [`SubstitutionMap`] describing every placeholder,
//! - a plain pattern where each placeholder is a neutral token and each
//!   escaped `\<` / `\>` is an escape token recorded in an [`EscapeTable`]
//!   (see [`crate::escape`] for the token format),
//! - a random-match generator bound to the plain pattern, and an anchored
//!   regex used to recover capture groups from generated text.
//!
//! Placeholder syntax:
//!
//! | Token              | Placeholder                                  |
//! |--------------------|----------------------------------------------|
//! | `<+ddd>`           | counter, zero-padded to 3 digits             |
//! | `<?name>`          | custom function, no arguments                |
//! | `<?name(1, 3)>`    | custom function fed capture groups 1 and 3   |
//! | `<user.firstName>` | dotted-path lookup in the call's data object |
//!
//! `<` inside a bracket class and the `<name>` of `(?P<name>...)` /
//! `(?<name>...)` are regex syntax and left alone.

use std::borrow::Cow;
use std::fmt;

use regex::Regex;
use regex_syntax::hir::{Hir, HirKind};

use crate::error::CompileError;
use crate::escape::{is_reserved, readable, splice_tokens, EscapeTable, Token};
use crate::random::{GeneratorTuning, MatchGenerator, MatchGeneratorFactory};
use crate::substitution::{Placeholder, SubstitutionMap};

/// Output of the placeholder scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedPattern {
    pub plain: String,
    pub substitutions: SubstitutionMap,
    pub escapes: EscapeTable,
}

/// Tracks whether the scanner is right after `(?` or `(?P`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GroupPrefix {
    None,
    Open,
    Question,
    NamedP,
}

/// Scan `source` for placeholders and escaped delimiters.
///
/// Fails on the reserved token delimiters appearing in `source`.
pub fn scan(source: &str) -> Result<ScannedPattern, CompileError> {
    if let Some(character) = source.chars().find(|&c| is_reserved(c)) {
        return Err(CompileError::ReservedCharacter { character });
    }

    let mut plain = String::with_capacity(source.len());
    let mut substitutions = SubstitutionMap::new();
    let mut escapes = EscapeTable::new();
    let mut class_depth = 0usize;
    let mut prefix = GroupPrefix::None;
    let mut chars = source.char_indices().peekable();

    while let Some((pos, c)) = chars.next() {
        let was_prefix = prefix;
        prefix = GroupPrefix::None;

        match c {
            '\\' => match chars.next() {
                Some((_, d @ ('<' | '>'))) if class_depth > 0 => plain.push(d),
                Some((_, d @ ('<' | '>'))) => plain.push_str(&escapes.push(d).pattern()),
                Some((_, d)) => {
                    plain.push('\\');
                    plain.push(d);
                }
                None => plain.push('\\'),
            },
            '[' => {
                plain.push('[');
                class_depth += 1;
                if class_depth == 1 {
                    // A leading `^` and a leading `]` are part of the class.
                    if let Some(&(_, '^')) = chars.peek() {
                        plain.push('^');
                        chars.next();
                    }
                    if let Some(&(_, ']')) = chars.peek() {
                        plain.push(']');
                        chars.next();
                    }
                }
            }
            ']' if class_depth > 0 => {
                plain.push(']');
                class_depth -= 1;
            }
            '(' if class_depth == 0 => {
                plain.push('(');
                prefix = GroupPrefix::Open;
            }
            '?' if was_prefix == GroupPrefix::Open => {
                plain.push('?');
                prefix = GroupPrefix::Question;
            }
            'P' if was_prefix == GroupPrefix::Question => {
                plain.push('P');
                prefix = GroupPrefix::NamedP;
            }
            '<' if class_depth == 0
                && !matches!(was_prefix, GroupPrefix::Question | GroupPrefix::NamedP) =>
            {
                match placeholder_body(&source[pos + 1..]) {
                    Some(body) => {
                        let placeholder = classify(body)?;
                        tracing::trace!(token = body, kind = placeholder.kind(), "Found placeholder");
                        let index = substitutions.push(placeholder);
                        plain.push_str(&Token::Placeholder(index).pattern());
                        // Skip the body and the closing `>`.
                        for _ in 0..=body.chars().count() {
                            chars.next();
                        }
                    }
                    None => plain.push('<'),
                }
            }
            _ => plain.push(c),
        }
    }

    Ok(ScannedPattern {
        plain,
        substitutions,
        escapes,
    })
}

/// Body of a placeholder starting right after `<`, if one is there.
///
/// The body runs to the first `>` and must be non-empty and free of `<`
/// and `\`; otherwise the `<` is an ordinary literal.
fn placeholder_body(rest: &str) -> Option<&str> {
    let end = rest.find('>')?;
    let body = &rest[..end];
    if body.is_empty() || body.contains(['<', '\\']) {
        None
    } else {
        Some(body)
    }
}

/// Classify a placeholder body by its leading marker.
fn classify(body: &str) -> Result<Placeholder, CompileError> {
    if let Some(markers) = body.strip_prefix('+') {
        if markers.chars().all(|c| c == 'd') {
            Ok(Placeholder::Counter {
                width: markers.len(),
            })
        } else {
            Err(CompileError::MalformedCounter {
                token: body.to_string(),
            })
        }
    } else if let Some(call) = body.strip_prefix('?') {
        parse_function(body, call)
    } else {
        Ok(Placeholder::DataPath {
            path: body.trim().to_string(),
        })
    }
}

fn parse_function(body: &str, call: &str) -> Result<Placeholder, CompileError> {
    let malformed = |reason: &str| CompileError::MalformedFunction {
        token: body.to_string(),
        reason: reason.to_string(),
    };

    let (name, args) = match call.find('(') {
        Some(open) => {
            let list = call[open + 1..]
                .strip_suffix(')')
                .ok_or_else(|| malformed("unterminated argument list"))?;
            (&call[..open], Some(list))
        }
        None => (call, None),
    };

    let name = name.trim();
    if name.is_empty() {
        return Err(CompileError::EmptyFunctionName {
            token: body.to_string(),
        });
    }
    if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(malformed(
            "function names may only contain ASCII letters, digits and '_'",
        ));
    }

    let arg_indices = match args.map(str::trim) {
        None | Some("") => Vec::new(),
        Some(list) => list
            .split(',')
            .map(|arg| {
                let arg = arg.trim();
                arg.parse::<usize>()
                    .ok()
                    .filter(|&i| i > 0)
                    .ok_or_else(|| CompileError::InvalidArgument {
                        token: body.to_string(),
                        argument: arg.to_string(),
                    })
            })
            .collect::<Result<_, _>>()?,
    };

    Ok(Placeholder::Function {
        name: name.to_string(),
        arg_indices,
    })
}

/// A fully compiled pattern.
///
/// Immutable: any change to the source or the generator tuning requires a
/// new compilation.
pub struct CompiledPattern {
    source: String,
    scanned: ScannedPattern,
    matcher: Regex,
    group_count: usize,
    generator: Box<dyn MatchGenerator>,
}

impl CompiledPattern {
    /// Compile `source`, binding a random-match generator from `factory`.
    pub fn compile(
        source: &str,
        tuning: &GeneratorTuning,
        factory: &dyn MatchGeneratorFactory,
    ) -> Result<Self, CompileError> {
        let scanned = scan(source)?;
        reject_reserved_literals(&scanned.plain)?;
        let matcher = Regex::new(&format!("^(?:{})$", scanned.plain))?;
        let group_count = matcher.captures_len() - 1;

        for (_, name, arg_indices) in scanned.substitutions.functions() {
            if let Some(&index) = arg_indices.iter().find(|&&i| i > group_count) {
                return Err(CompileError::CaptureGroupOutOfRange {
                    token: format!("?{name}"),
                    index,
                    available: group_count,
                });
            }
        }

        let generator = factory.bind(&scanned.plain, tuning)?;

        tracing::debug!(
            plain = %readable(&scanned.plain),
            placeholders = scanned.substitutions.len(),
            escapes = scanned.escapes.len(),
            groups = group_count,
            "Compiled pattern"
        );

        Ok(Self {
            source: source.to_string(),
            scanned,
            matcher,
            group_count,
            generator,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// The placeholder-free pattern fed to the random-match generator.
    pub fn plain_pattern(&self) -> &str {
        &self.scanned.plain
    }

    /// The plain pattern with tokens shown as `<N>` / `<!N>`.
    pub fn display_pattern(&self) -> String {
        readable(&self.scanned.plain).into_owned()
    }

    pub fn substitutions(&self) -> &SubstitutionMap {
        &self.scanned.substitutions
    }

    pub fn escapes(&self) -> &EscapeTable {
        &self.scanned.escapes
    }

    /// Number of capture groups in the plain pattern.
    pub fn group_count(&self) -> usize {
        self.group_count
    }

    pub fn generator(&self) -> &dyn MatchGenerator {
        self.generator.as_ref()
    }

    /// Recover capture groups 1..=N from a generated string.
    ///
    /// Escape tokens inside a group are restored and placeholder tokens are
    /// dropped. A group that did not participate in the match is `None`.
    pub fn capture_groups(&self, text: &str) -> Vec<Option<String>> {
        match self.matcher.captures(text) {
            Some(caps) => caps
                .iter()
                .skip(1)
                .map(|group| {
                    group.map(|m| self.scanned.escapes.restore(m.as_str()).into_owned())
                })
                .collect(),
            None => {
                tracing::warn!(
                    text,
                    pattern = %readable(&self.scanned.plain),
                    "Generated text does not re-match its pattern; capture groups are empty"
                );
                vec![None; self.group_count]
            }
        }
    }
}

/// Reject regex escapes such as `\x{E000}` that would put a token delimiter
/// into generated text.
fn reject_reserved_literals(plain: &str) -> Result<(), CompileError> {
    let bare = splice_tokens(plain, |_| Some(Cow::Borrowed("")));
    let hir = regex_syntax::ParserBuilder::new().build().parse(&bare)?;
    match reserved_literal(&hir) {
        Some(character) => Err(CompileError::ReservedCharacter { character }),
        None => Ok(()),
    }
}

fn reserved_literal(hir: &Hir) -> Option<char> {
    match hir.kind() {
        HirKind::Literal(literal) => String::from_utf8_lossy(&literal.0)
            .chars()
            .find(|&c| is_reserved(c)),
        HirKind::Repetition(rep) => reserved_literal(&rep.sub),
        HirKind::Capture(capture) => reserved_literal(&capture.sub),
        HirKind::Concat(subs) | HirKind::Alternation(subs) => subs.iter().find_map(reserved_literal),
        HirKind::Empty | HirKind::Look(_) | HirKind::Class(_) => None,
    }
}

impl fmt::Debug for CompiledPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledPattern")
            .field("source", &self.source)
            .field("plain", &readable(&self.scanned.plain))
            .field("substitutions", &self.scanned.substitutions)
            .field("escapes", &self.scanned.escapes)
            .field("group_count", &self.group_count)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::HirGeneratorFactory;

    fn compile(source: &str) -> Result<CompiledPattern, CompileError> {
        CompiledPattern::compile(source, &GeneratorTuning::default(), &HirGeneratorFactory)
    }

    #[test]
    fn test_scan_counter() {
        let scanned = scan("[A-Z]{3}-<+ddd>").unwrap();
        assert_eq!(readable(&scanned.plain), "[A-Z]{3}-(?:<0>)");
        assert_eq!(
            scanned.substitutions.get(0),
            Some(&Placeholder::Counter { width: 3 })
        );
    }

    #[test]
    fn test_scan_all_kinds_in_order() {
        let scanned = scan("<+>_(green|blue)_<?r1>_<user.firstName>").unwrap();
        assert_eq!(
            readable(&scanned.plain),
            "(?:<0>)_(green|blue)_(?:<1>)_(?:<2>)"
        );
        let kinds: Vec<_> = scanned.substitutions.iter().map(|(i, p)| (i, p.kind())).collect();
        assert_eq!(kinds, vec![(0, "counter"), (1, "function"), (2, "data")]);
        assert_eq!(
            scanned.substitutions.get(2),
            Some(&Placeholder::DataPath {
                path: "user.firstName".to_string()
            })
        );
    }

    #[test]
    fn test_scan_function_arguments() {
        let scanned = scan("(4[0-9])([0-9]{2})<?checksum(1, 2)> (<?whichCard(1)>)").unwrap();
        assert_eq!(
            scanned.substitutions.get(0),
            Some(&Placeholder::Function {
                name: "checksum".to_string(),
                arg_indices: vec![1, 2]
            })
        );
        assert_eq!(
            scanned.substitutions.get(1),
            Some(&Placeholder::Function {
                name: "whichCard".to_string(),
                arg_indices: vec![1]
            })
        );
        assert_eq!(
            readable(&scanned.plain),
            "(4[0-9])([0-9]{2})(?:<0>) ((?:<1>))"
        );
    }

    #[test]
    fn test_scan_escaped_delimiters() {
        let scanned = scan(r"\<1\>-[A-Z]{3}-<+dd>").unwrap();
        assert_eq!(
            readable(&scanned.plain),
            "(?:<!0>)1(?:<!1>)-[A-Z]{3}-(?:<0>)"
        );
        assert_eq!(scanned.escapes.get(0), Some('<'));
        assert_eq!(scanned.escapes.get(1), Some('>'));
        assert_eq!(scanned.substitutions.len(), 1);
    }

    #[test]
    fn test_scan_leaves_regex_syntax_alone() {
        let scanned = scan(r"(?P<year>\d{4})-(?<month>\d{2})[<>]\\<+d>").unwrap();
        assert_eq!(
            readable(&scanned.plain),
            r"(?P<year>\d{4})-(?<month>\d{2})[<>]\\(?:<0>)"
        );
        assert_eq!(scanned.substitutions.len(), 1);
    }

    #[test]
    fn test_scan_literal_angle_brackets() {
        let scanned = scan("a<b <> c<d<+d>").unwrap();
        assert_eq!(readable(&scanned.plain), "a<b <> c<d(?:<0>)");
        assert_eq!(scanned.substitutions.len(), 1);
    }

    #[test]
    fn test_scan_class_edge_cases() {
        let scanned = scan(r"[]<][^]>][\<]<+d>").unwrap();
        assert_eq!(readable(&scanned.plain), "[]<][^]>][<](?:<0>)");
    }

    #[test]
    fn test_compile_errors() {
        assert!(matches!(
            scan("<?>"),
            Err(CompileError::EmptyFunctionName { .. })
        ));
        assert!(matches!(
            scan("<?(1)>"),
            Err(CompileError::EmptyFunctionName { .. })
        ));
        assert!(matches!(
            scan("<?bad-name>"),
            Err(CompileError::MalformedFunction { .. })
        ));
        assert!(matches!(
            scan("<?f(1>"),
            Err(CompileError::MalformedFunction { .. })
        ));
        assert!(matches!(
            scan("<?f(1,x)>"),
            Err(CompileError::InvalidArgument { .. })
        ));
        assert!(matches!(
            scan("<?f(0)>"),
            Err(CompileError::InvalidArgument { .. })
        ));
        assert!(matches!(
            scan("<+dx>"),
            Err(CompileError::MalformedCounter { .. })
        ));
    }

    #[test]
    fn test_compile_rejects_out_of_range_groups() {
        let err = compile("([A-Z])<?f(1,2)>").unwrap_err();
        assert!(matches!(
            err,
            CompileError::CaptureGroupOutOfRange {
                index: 2,
                available: 1,
                ..
            }
        ));
    }

    #[test]
    fn test_compile_rejects_invalid_regex() {
        assert!(matches!(compile("([A-Z]<+d>"), Err(CompileError::Regex(_))));
    }

    #[test]
    fn test_compile_is_deterministic() {
        let source = "(a|b)<+dd>-<?f(1)>-<x.y>";
        let first = compile(source).unwrap();
        let second = compile(source).unwrap();
        assert_eq!(first.substitutions(), second.substitutions());
        assert_eq!(first.plain_pattern(), second.plain_pattern());
    }

    #[test]
    fn test_capture_groups() {
        let compiled = compile(r"(\d{2})-(x)?\<(y)\><+d>").unwrap();
        assert_eq!(compiled.group_count(), 3);
        let text = format!(
            "42-{}y{}{}",
            Token::Escape(0).render(),
            Token::Escape(1).render(),
            Token::Placeholder(0).render()
        );
        let groups = compiled.capture_groups(&text);
        assert_eq!(
            groups,
            vec![Some("42".to_string()), None, Some("y".to_string())]
        );
    }

    #[test]
    fn test_quantified_tokens_stay_atomic() {
        let compiled = compile(r"ID-<+ddd>?<+d>{2}\<?").unwrap();
        assert_eq!(
            compiled.display_pattern(),
            "ID-(?:<0>)?(?:<1>){2}(?:<!0>)?"
        );

        let p0 = Token::Placeholder(0).render();
        let p1 = Token::Placeholder(1).render();
        let open = Token::Escape(0).render();
        let matcher = &compiled.matcher;
        assert!(matcher.is_match(&format!("ID-{p1}{p1}")));
        assert!(matcher.is_match(&format!("ID-{p0}{p1}{p1}{open}")));
        assert!(!matcher.is_match(&format!("ID-{}", &p0[..p0.len() - 3])));
    }

    #[test]
    fn test_reserved_characters_rejected() {
        for source in ["a\u{E000}b", "\u{E001}<+d>", r"x\x{E000}", r"(\u{E001})+"] {
            assert!(
                matches!(
                    compile(source),
                    Err(CompileError::ReservedCharacter { .. })
                ),
                "{source:?}"
            );
        }
        // A class merely containing the range is harmless.
        assert!(compile(r"[\x{E000}-\x{E0FF}]<+d>").is_ok());
    }

    #[test]
    fn test_capture_group_drops_placeholder_tokens() {
        let compiled = compile(r"(a<+d>\>)<?f(1)>").unwrap();
        let text = format!(
            "a{}{}{}",
            Token::Placeholder(0).render(),
            Token::Escape(0).render(),
            Token::Placeholder(1).render()
        );
        assert_eq!(compiled.capture_groups(&text), vec![Some("a>".to_string())]);
    }
}
