//! Counter formatting.

use std::fmt::Debug;

use crate::counter::CounterValue;

/// Locale-aware formatter for counter values.
///
/// When configured, it takes precedence over zero-padding.
pub trait NumberFormat: Send + Sync + Debug {
    fn format(&self, value: &CounterValue) -> String;
}

/// Integer formatter inserting a group separator every three digits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupedNumberFormat {
    separator: String,
}

impl GroupedNumberFormat {
    pub fn new(separator: impl Into<String>) -> Self {
        Self {
            separator: separator.into(),
        }
    }

    /// Formatter for a BCP 47 locale tag.
    ///
    /// Recognizes the common grouping conventions; returns `None` for
    /// unknown tags.
    pub fn for_locale(locale: &str) -> Option<Self> {
        let separator = match locale {
            "en" | "en-US" | "en-GB" | "en-AU" | "en-NZ" | "ja-JP" | "zh-CN" => ",",
            "de" | "de-DE" | "es-ES" | "it-IT" | "nl-NL" | "pt-BR" | "id-ID" => ".",
            "fr" | "fr-FR" | "nb-NO" | "sv-SE" | "pl-PL" | "ru-RU" => "\u{202F}",
            "de-CH" => "\u{2019}",
            "none" => "",
            _ => return None,
        };
        Some(Self::new(separator))
    }

    fn group(&self, n: i64) -> String {
        let digits = n.unsigned_abs().to_string();
        let mut out =
            String::with_capacity(digits.len() + digits.len() / 3 * self.separator.len() + 1);
        if n < 0 {
            out.push('-');
        }
        for (i, c) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                out.push_str(&self.separator);
            }
            out.push(c);
        }
        out
    }
}

impl NumberFormat for GroupedNumberFormat {
    fn format(&self, value: &CounterValue) -> String {
        match value.as_number() {
            Some(n) => self.group(n),
            None => value.to_string(),
        }
    }
}

/// Render a counter value for a placeholder of the given width.
///
/// A formatter takes precedence; otherwise the value is left-padded with
/// `0` to `width` characters.
pub fn format_counter(
    value: &CounterValue,
    width: usize,
    number_format: Option<&dyn NumberFormat>,
) -> String {
    if let Some(formatter) = number_format {
        return formatter.format(value);
    }
    let text = value.to_string();
    let len = text.chars().count();
    if len >= width {
        text
    } else {
        let mut padded = "0".repeat(width - len);
        padded.push_str(&text);
        padded
    }
}
