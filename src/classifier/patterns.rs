use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

static DIGIT_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d{6,}").unwrap());
static KEYBOARD_WALK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)qwert|asdf|zxcv|12345|abcde").unwrap());
static CONSONANT_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)[bcdfghjklmnpqrstvwxz]{6,}").unwrap());
static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(test|testing|example|sample|fake|dummy|null|nobody|asdf|foo|bar)\d*$")
        .unwrap()
});

/// Suspicious shapes of a local part.
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "with-serde", serde(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PatternFlag {
    DigitRun,
    KeyboardWalk,
    Gibberish,
    RepeatedChars,
    Placeholder,
}

impl PatternFlag {
    /// Placeholders are common for legitimate test inboxes; the other flags
    /// point at generated or mistyped addresses.
    pub fn is_suspicious(self) -> bool {
        !matches!(self, Self::Placeholder)
    }
}

impl fmt::Display for PatternFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::DigitRun => "long digit sequence",
            Self::KeyboardWalk => "keyboard pattern",
            Self::Gibberish => "random-looking characters",
            Self::RepeatedChars => "repeated characters",
            Self::Placeholder => "placeholder name",
        };
        f.write_str(text)
    }
}

pub(crate) fn analyze_local(local: &str) -> Vec<PatternFlag> {
    let mut flags = Vec::new();
    if DIGIT_RUN.is_match(local) {
        flags.push(PatternFlag::DigitRun);
    }
    if KEYBOARD_WALK.is_match(local) {
        flags.push(PatternFlag::KeyboardWalk);
    }
    if CONSONANT_RUN.is_match(local) {
        flags.push(PatternFlag::Gibberish);
    }
    if has_char_run(local, 4) {
        flags.push(PatternFlag::RepeatedChars);
    }
    if PLACEHOLDER.is_match(local) {
        flags.push(PatternFlag::Placeholder);
    }
    flags
}

// pas de backreference dans `regex`
fn has_char_run(s: &str, run: usize) -> bool {
    let mut count = 0usize;
    let mut prev = None;
    for ch in s.chars() {
        if Some(ch) == prev {
            count += 1;
        } else {
            count = 1;
            prev = Some(ch);
        }
        if count >= run {
            return true;
        }
    }
    false
}
