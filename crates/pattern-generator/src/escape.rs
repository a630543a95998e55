//! Neutral tokens and the out-of-band escape table.
//!
//! Placeholders and escaped delimiters are both replaced in the working copy
//! of the pattern by neutral tokens delimited with private-use code points
//! (`U+E000` and `U+E001`, shown here as `⟨` and `⟩`):
//!
//! - placeholder `N` → `⟨N⟩`
//! - escaped literal `N` → `⟨!N⟩`
//!
//! In the plain pattern each token is wrapped in `(?:...)` so a quantifier
//! written after a placeholder applies to the whole token. The delimiters
//! are reserved: patterns may not contain them as literals and the random
//! generator never draws them from a class, so generated text cannot forge
//! a token.
//!
//! The escape table records which character each escape token stands for,
//! so restoring it never depends on a sentinel string being absent from the
//! user's input.

use std::borrow::Cow;

/// Opening delimiter of a neutral token.
pub const TOKEN_OPEN: char = '\u{E000}';
/// Closing delimiter of a neutral token.
pub const TOKEN_CLOSE: char = '\u{E001}';

/// True for the code points reserved as token delimiters.
pub fn is_reserved(c: char) -> bool {
    c == TOKEN_OPEN || c == TOKEN_CLOSE
}

/// A neutral token found while scanning generated text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token {
    /// `⟨N⟩`: index into the substitution map
    Placeholder(usize),
    /// `⟨!N⟩`: index into the escape table
    Escape(usize),
}

impl Token {
    /// Render the token as it appears in generated text.
    pub fn render(self) -> String {
        match self {
            Self::Placeholder(index) => format!("{TOKEN_OPEN}{index}{TOKEN_CLOSE}"),
            Self::Escape(index) => format!("{TOKEN_OPEN}!{index}{TOKEN_CLOSE}"),
        }
    }

    /// Render the token as an atomic plain-pattern fragment.
    pub fn pattern(self) -> String {
        format!("(?:{})", self.render())
    }

    /// Human-readable form (`<N>` / `<!N>`) for logs and reports.
    pub fn label(self) -> String {
        match self {
            Self::Placeholder(index) => format!("<{index}>"),
            Self::Escape(index) => format!("<!{index}>"),
        }
    }
}

/// Literal delimiters shielded from the placeholder scanner.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EscapeTable {
    literals: Vec<char>,
}

impl EscapeTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a literal and return the token that stands for it.
    pub fn push(&mut self, literal: char) -> Token {
        self.literals.push(literal);
        Token::Escape(self.literals.len() - 1)
    }

    /// Look up the literal for an escape index.
    pub fn get(&self, index: usize) -> Option<char> {
        self.literals.get(index).copied()
    }

    pub fn len(&self) -> usize {
        self.literals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.literals.is_empty()
    }

    /// Replace every escape token in `text` with its original literal and
    /// drop placeholder tokens, whose values are not known yet.
    pub fn restore<'a>(&self, text: &'a str) -> Cow<'a, str> {
        splice_tokens(text, |token| match token {
            Token::Escape(index) => self.get(index).map(|c| Cow::Owned(c.to_string())),
            Token::Placeholder(_) => Some(Cow::Borrowed("")),
        })
    }
}

/// Parse a token starting at byte offset `start` (which must hold
/// [`TOKEN_OPEN`]).
///
/// Returns the token and the byte offset just past its closing delimiter.
fn parse_token(text: &str, start: usize) -> Option<(Token, usize)> {
    let body_start = start + TOKEN_OPEN.len_utf8();
    let body_len = text[body_start..].find(TOKEN_CLOSE)?;
    let body = &text[body_start..body_start + body_len];
    let end = body_start + body_len + TOKEN_CLOSE.len_utf8();

    let (escape, digits) = match body.strip_prefix('!') {
        Some(digits) => (true, digits),
        None => (false, body),
    };
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let index: usize = digits.parse().ok()?;
    let token = if escape {
        Token::Escape(index)
    } else {
        Token::Placeholder(index)
    };
    Some((token, end))
}

/// Scan `text` once, replacing every token for which `resolve` returns a
/// value.
///
/// Replacement text is never rescanned, so values containing token-shaped
/// text are emitted verbatim.
pub fn splice_tokens<'a, 'v, F>(text: &'a str, mut resolve: F) -> Cow<'a, str>
where
    F: FnMut(Token) -> Option<Cow<'v, str>>,
{
    let mut out: Option<String> = None;
    let mut copied = 0;
    let mut search = 0;

    while let Some(offset) = text[search..].find(TOKEN_OPEN) {
        let start = search + offset;
        match parse_token(text, start) {
            Some((token, end)) => {
                if let Some(value) = resolve(token) {
                    let buf = out.get_or_insert_with(|| String::with_capacity(text.len()));
                    buf.push_str(&text[copied..start]);
                    buf.push_str(&value);
                    copied = end;
                }
                search = end;
            }
            None => search = start + TOKEN_OPEN.len_utf8(),
        }
    }

    match out {
        Some(mut buf) => {
            buf.push_str(&text[copied..]);
            Cow::Owned(buf)
        }
        None => Cow::Borrowed(text),
    }
}

/// Rewrite every token in `text` into its readable `<N>` / `<!N>` label.
pub fn readable(text: &str) -> Cow<'_, str> {
    splice_tokens(text, |token| Some(Cow::Owned(token.label())))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(index: usize) -> String {
        Token::Placeholder(index).render()
    }

    #[test]
    fn test_token_render() {
        assert_eq!(Token::Placeholder(3).render(), "\u{E000}3\u{E001}");
        assert_eq!(Token::Escape(0).render(), "\u{E000}!0\u{E001}");
        assert_eq!(Token::Placeholder(3).pattern(), "(?:\u{E000}3\u{E001})");
        assert_eq!(readable(&Token::Escape(1).pattern()), "(?:<!1>)");
    }

    #[test]
    fn test_restore_escapes() {
        let mut table = EscapeTable::new();
        let open = table.push('<');
        let close = table.push('>');
        let text = format!("{}1{}-{}", open.render(), close.render(), p(0));

        assert_eq!(table.restore(&text), "<1>-");
    }

    #[test]
    fn test_restore_without_tokens_borrows() {
        let table = EscapeTable::new();
        assert!(matches!(table.restore("abc<0>"), Cow::Borrowed("abc<0>")));
    }

    #[test]
    fn test_splice_ignores_look_alikes() {
        let text = format!("a<0> <!1> \u{E000}x\u{E001} \u{E000} {}", p(12));
        let out = splice_tokens(&text, |token| match token {
            Token::Placeholder(12) => Some(Cow::Borrowed("twelve")),
            _ => None,
        });
        assert_eq!(out, "a<0> <!1> \u{E000}x\u{E001} \u{E000} twelve");
    }

    #[test]
    fn test_splice_does_not_rescan_values() {
        let text = format!("{}|{}", p(0), p(1));
        let one = p(1);
        let out = splice_tokens(&text, |token| match token {
            Token::Placeholder(0) => Some(Cow::Owned(one.clone())),
            Token::Placeholder(1) => Some(Cow::Borrowed("one")),
            _ => None,
        });
        assert_eq!(out, format!("{}|one", p(1)));
    }
}
