//! Regex grammar: stateless factories for every line shape asmlens
//! recognizes. All patterns are case-insensitive.
//!
//! Capture groups are named instead of numbered:
//! - `pre`: text before the symbol (listing columns, indentation)
//! - `label` / `name`: the symbol text
//! - `keyword`: the directive keyword
//!
//! The same source string drives both the `regex` engine (captures) and the
//! `grep-regex` line matcher used for cross-file search.

pub mod blocks;
pub mod labels;

use std::sync::LazyLock;

use grep_regex::{RegexMatcher, RegexMatcherBuilder};
use regex::Regex;

use crate::error::AsmLensError;

/// Identifier body shared by every label-like pattern. Dotted names are one unit.
pub(crate) const IDENT: &str = r"[a-z_][\w.]*";

/// How a search word is turned into a pattern fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WordMatch {
    /// The word itself, or the word qualified by leading dot-segments.
    Exact,
    /// In-order subsequence of the word's characters.
    Fuzzy,
}

/// An immutable compiled pattern. Cloning is cheap.
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    source: String,
    regex: Regex,
}

impl CompiledPattern {
    /// Compile `body` case-insensitively.
    pub fn new(body: &str) -> Result<Self, AsmLensError> {
        let source = format!("(?i){body}");
        let regex = Regex::new(&source).map_err(|e| AsmLensError::InvalidQuery {
            query: body.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self { source, regex })
    }

    /// For the grammar's own constant patterns.
    pub(crate) fn fixed(body: &str) -> Self {
        Self::new(body).expect("built-in pattern must compile")
    }

    #[must_use]
    pub fn regex(&self) -> &Regex {
        &self.regex
    }

    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    #[must_use]
    pub fn is_match(&self, line: &str) -> bool {
        self.regex.is_match(line)
    }

    /// Line matcher for `grep-searcher`, built from the same source. `^` and
    /// `$` anchor at line boundaries.
    pub fn line_matcher(&self) -> Result<RegexMatcher, AsmLensError> {
        RegexMatcherBuilder::new()
            .multi_line(true)
            .build(&self.source)
            .map_err(|e| AsmLensError::InvalidQuery {
                query: self.source.clone(),
                reason: e.to_string(),
            })
    }
}

/// Fuzzy word: `snd` becomes `\w*s\w*n\w*d\w*`. The empty word matches any identifier.
#[must_use]
pub fn fuzzy(word: &str) -> String {
    fuzzy_with(word, r"\w")
}

/// Fuzzy word over a custom character class, e.g. `[\w.]` for dotted labels.
pub(crate) fn fuzzy_with(word: &str, class: &str) -> String {
    let gap = format!("{class}*");
    let mut out = gap.clone();
    let mut buf = [0u8; 4];
    for c in word.chars() {
        out.push_str(&regex_syntax::escape(c.encode_utf8(&mut buf)));
        out.push_str(&gap);
    }
    out
}

/// The part of a searched word that is matched literally: the last
/// dot-segment without `.`/`@` markers. `main.loop` and `.loop` both give `loop`.
#[must_use]
pub fn last_segment(word: &str) -> &str {
    let bare = word.trim_start_matches(['.', '@']);
    bare.rsplit('.').find(|s| !s.is_empty()).unwrap_or(bare)
}

/// Symbol fragment for word searches in label position.
pub(crate) fn label_body(word: &str, mode: WordMatch) -> String {
    match mode {
        WordMatch::Exact => format!(
            r"[.@]?(?:[\w.]*\.)?{}",
            regex_syntax::escape(last_segment(word))
        ),
        WordMatch::Fuzzy => match word.trim_start_matches(['.', '@']) {
            // Any label at all, but never the empty string.
            "" => format!("[.@]?{IDENT}"),
            bare => format!("[.@]?{}", fuzzy_with(bare, r"[\w.]")),
        },
    }
}

static WORD_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\w.@]+$").expect("built-in pattern must compile"));

/// Whether `text` could be a label at all (used to validate rename targets).
#[must_use]
pub fn is_label_text(text: &str) -> bool {
    WORD_CHARS.is_match(text) && last_segment(text).chars().next().is_some_and(|c| c.is_alphabetic() || c == '_')
}
