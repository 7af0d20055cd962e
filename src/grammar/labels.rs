//! Label patterns: declarations with and without a trailing colon, and the
//! plain-occurrence pattern used for references.

use std::sync::LazyLock;

use super::{CompiledPattern, IDENT, WordMatch, label_body};
use crate::config::{Config, label_excluded};
use crate::error::AsmLensError;
use crate::grammar::blocks::is_directive_keyword;
use crate::types::{Dialect, Label, LabelKind};

// Listing lines carry address/byte columns first; the label is the first
// identifier that ends in a single colon.
static LISTING_COLON: LazyLock<CompiledPattern> = LazyLock::new(|| {
    CompiledPattern::fixed(&format!(
        r"^(?P<pre>(?:.*?[^\w.@])?)(?P<label>[.@]?{IDENT}):(?:[^:]|$)"
    ))
});

static SOURCE_COLON: LazyLock<CompiledPattern> = LazyLock::new(|| {
    CompiledPattern::fixed(&format!(r"^(?P<pre>\s*)(?P<label>@?\.?{IDENT}):"))
});

// The trailing class stands in for a negative lookahead: the identifier
// must not run on into `:`, `.`, `@` or more word characters.
static WITHOUT_COLON: LazyLock<CompiledPattern> = LazyLock::new(|| {
    CompiledPattern::fixed(&format!(r"^(?P<label>[.@]?{IDENT})(?:[^\w.:@]|$)"))
});

/// Label declared with a colon.
#[must_use]
pub fn label_colon(dialect: Dialect) -> CompiledPattern {
    match dialect {
        Dialect::Source => SOURCE_COLON.clone(),
        Dialect::Listing => LISTING_COLON.clone(),
    }
}

/// Label declared at column 0 without a colon.
#[must_use]
pub fn label_without_colon() -> CompiledPattern {
    WITHOUT_COLON.clone()
}

/// Every colon label declaration matching `word`.
pub fn every_label_colon_for_word(
    word: &str,
    mode: WordMatch,
    dialect: Dialect,
) -> Result<CompiledPattern, AsmLensError> {
    let body = label_body(word, mode);
    match dialect {
        Dialect::Source => CompiledPattern::new(&format!(r"^(?P<pre>\s*)(?P<label>{body}):")),
        Dialect::Listing => CompiledPattern::new(&format!(
            r"^(?P<pre>(?:.*?[^\w.@])?)(?P<label>{body}):(?:[^:]|$)"
        )),
    }
}

/// Every colon-less label declaration matching `word`.
pub fn every_label_without_colon_for_word(
    word: &str,
    mode: WordMatch,
) -> Result<CompiledPattern, AsmLensError> {
    let body = label_body(word, mode);
    CompiledPattern::new(&format!(r"^(?P<label>{body})(?:[^\w.:@]|$)"))
}

/// Any textual occurrence of the word's last segment. Whether an occurrence
/// really designates the label is decided later by reduction.
pub fn any_reference_for_word(word: &str) -> Result<CompiledPattern, AsmLensError> {
    let seg = regex_syntax::escape(super::last_segment(word));
    CompiledPattern::new(&format!(r"(?P<pre>^|[^\w])(?P<label>{seg})(?:[^\w]|$)"))
}

/// Finds the label declared on a line, honouring the colon toggles, the
/// exclusion list and reserved directive keywords.
#[derive(Debug, Clone)]
pub struct LabelMatcher {
    colon: Option<CompiledPattern>,
    without_colon: Option<CompiledPattern>,
    excludes: Vec<String>,
}

impl LabelMatcher {
    #[must_use]
    pub fn new(config: &Config, dialect: Dialect) -> Self {
        Self {
            colon: config.labels_with_colons.then(|| label_colon(dialect)),
            // Listing columns make column-0 detection meaningless.
            without_colon: (config.labels_without_colons && dialect == Dialect::Source)
                .then(label_without_colon),
            excludes: config.labels_excludes.clone(),
        }
    }

    #[must_use]
    pub fn find(&self, line: &str) -> Option<Label> {
        let label = self
            .colon
            .as_ref()
            .and_then(|p| capture_label(p, line, true))
            .or_else(|| {
                self.without_colon
                    .as_ref()
                    .and_then(|p| capture_label(p, line, false))
                    .filter(|l| !is_directive_keyword(l.text.trim_start_matches('.')))
            })?;
        if label_excluded(&self.excludes, &label.text) {
            return None;
        }
        Some(label)
    }
}

fn capture_label(pattern: &CompiledPattern, line: &str, trailing_colon: bool) -> Option<Label> {
    let caps = pattern.regex().captures(line)?;
    let m = caps.name("label")?;
    Some(Label {
        text: m.as_str().to_string(),
        kind: LabelKind::of(m.as_str()),
        trailing_colon,
        start: m.start() as u32,
        end: m.end() as u32,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matcher() -> LabelMatcher {
        LabelMatcher::new(&Config::default(), Dialect::Source)
    }

    fn label_of(p: &CompiledPattern, line: &str) -> Option<String> {
        p.regex()
            .captures(line)
            .and_then(|c| c.name("label").map(|m| m.as_str().to_string()))
    }

    #[test]
    fn source_colon_label_with_indent_and_cheap_marker() {
        let p = label_colon(Dialect::Source);
        assert_eq!(label_of(&p, "start: nop").as_deref(), Some("start"));
        assert_eq!(label_of(&p, "   @tmp: nop").as_deref(), Some("@tmp"));
        assert_eq!(label_of(&p, ".loop:").as_deref(), Some(".loop"));
        assert_eq!(label_of(&p, "mod.entry:").as_deref(), Some("mod.entry"));
        assert_eq!(label_of(&p, "  ld a,(hl)"), None);
    }

    #[test]
    fn listing_colon_label_skips_columns() {
        let p = label_colon(Dialect::Listing);
        let line = "0010 3E 05        start: ld a,5";
        let caps = p.regex().captures(line).unwrap();
        assert_eq!(&caps["label"], "start");
        assert_eq!(&caps["pre"], "0010 3E 05        ");
    }

    #[test]
    fn listing_colon_rejects_double_colon() {
        let p = label_colon(Dialect::Listing);
        assert_eq!(label_of(&p, "8000 00  a::b"), None);
    }

    #[test]
    fn without_colon_needs_column_zero_and_no_colon() {
        let p = label_without_colon();
        assert_eq!(label_of(&p, "start nop").as_deref(), Some("start"));
        assert_eq!(label_of(&p, "start").as_deref(), Some("start"));
        assert_eq!(label_of(&p, " start nop"), None);
        assert_eq!(label_of(&p, "start: nop"), None);
    }

    #[test]
    fn matcher_prefers_colon_form() {
        let l = matcher().find("VAL: EQU 5").unwrap();
        assert_eq!(l.text, "VAL");
        assert!(l.trailing_colon);
        assert_eq!((l.start, l.end), (0, 3));
    }

    #[test]
    fn matcher_skips_keywords_and_excluded_words() {
        let m = matcher();
        assert!(m.find("MODULE foo").is_none());
        assert!(m.find("ENDMODULE").is_none());
        assert!(m.find(".proc main").is_none());
        assert!(m.find("include \"x.inc\"").is_none());
        assert!(m.find("IF 1").is_none());
        assert_eq!(m.find("table defb 1").unwrap().text, "table");
    }

    #[test]
    fn matcher_honours_colon_toggles() {
        let cfg = Config {
            labels_without_colons: false,
            ..Config::default()
        };
        let m = LabelMatcher::new(&cfg, Dialect::Source);
        assert!(m.find("start nop").is_none());
        assert!(m.find("start: nop").is_some());
    }

    #[test]
    fn word_search_finds_plain_relative_and_qualified_declarations() {
        let p = every_label_colon_for_word("loop", WordMatch::Exact, Dialect::Source).unwrap();
        assert_eq!(label_of(&p, "loop:").as_deref(), Some("loop"));
        assert_eq!(label_of(&p, ".loop:").as_deref(), Some(".loop"));
        assert_eq!(label_of(&p, "main.loop:").as_deref(), Some("main.loop"));
        assert_eq!(label_of(&p, "loops:"), None);
    }

    #[test]
    fn fuzzy_label_search_lands_on_any_segment() {
        let p = every_label_colon_for_word("sn", WordMatch::Fuzzy, Dialect::Source).unwrap();
        assert!(p.is_match("SetAndReturn:"));
        assert!(p.is_match("util.sync:"));
        assert!(!p.is_match("Other:"));
    }

    #[test]
    fn reference_pattern_is_plain_occurrence() {
        let p = any_reference_for_word("foo").unwrap();
        assert!(p.is_match("  call foo"));
        assert!(p.is_match("  jp @foo"));
        assert!(p.is_match("  ld hl,foo.bar"));
        assert!(!p.is_match("  call food"));
    }
}
