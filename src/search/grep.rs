//! Cross-file search: run compiled patterns over every accepted file of every
//! workspace root and keep each hit as a [`Candidate`].

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use grep_regex::RegexMatcher;
use grep_searcher::Searcher;
use grep_searcher::sinks::Lossy;
use rayon::prelude::*;

use crate::cancel::CancelToken;
use crate::comments;
use crate::config::Config;
use crate::error::AsmLensError;
use crate::grammar::CompiledPattern;
use crate::types::{Dialect, Location, Range};

/// Files above this size are generated blobs, not hand-written sources.
const MAX_SEARCH_FILE_SIZE: u64 = 8_000_000;

/// One textual match. Never mutated after creation, only filtered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub path: PathBuf,
    pub dialect: Dialect,
    /// 0-based line.
    pub line: u32,
    /// Byte columns of the symbol capture on the line.
    pub start: u32,
    pub end: u32,
    /// Symbol text (the `label`/`name` capture, or the whole match).
    pub text: String,
    pub keyword: Option<String>,
    pub line_text: String,
    /// Absolute label in force on this line.
    pub scope_label: Option<String>,
    pub in_comment: bool,
}

impl Candidate {
    #[must_use]
    pub fn range(&self) -> Range {
        Range::on_line(self.line, self.start, self.end)
    }

    #[must_use]
    pub fn location(&self) -> Location {
        Location {
            path: self.path.clone(),
            range: self.range(),
        }
    }
}

/// Patterns to apply, per dialect. Label patterns differ between source and
/// listing files, so a query carries both sets.
#[derive(Debug, Clone, Default)]
pub struct PatternSet {
    source: Vec<CompiledPattern>,
    listing: Vec<CompiledPattern>,
}

impl PatternSet {
    /// Build both sets from a per-dialect factory.
    pub fn build<F>(mut make: F) -> Result<Self, AsmLensError>
    where
        F: FnMut(Dialect) -> Result<Vec<CompiledPattern>, AsmLensError>,
    {
        Ok(Self {
            source: make(Dialect::Source)?,
            listing: make(Dialect::Listing)?,
        })
    }

    /// The same patterns for both dialects.
    #[must_use]
    pub fn uniform(patterns: Vec<CompiledPattern>) -> Self {
        Self {
            listing: patterns.clone(),
            source: patterns,
        }
    }

    #[must_use]
    pub fn for_dialect(&self, dialect: Dialect) -> &[CompiledPattern] {
        match dialect {
            Dialect::Source => &self.source,
            Dialect::Listing => &self.listing,
        }
    }
}

/// A workspace root with the configuration that governs it.
#[derive(Debug, Clone)]
pub struct SearchRoot {
    pub path: PathBuf,
    pub config: Arc<Config>,
}

struct Prepared<'a> {
    pattern: &'a CompiledPattern,
    matcher: RegexMatcher,
}

/// Apply every pattern to every line of every file under `roots`.
///
/// Results are in file-then-line-then-column order regardless of which
/// read finished first. Unreadable files are skipped. Once `cancel` fires
/// the whole search yields [`AsmLensError::Cancelled`].
pub fn search(
    patterns: &PatternSet,
    roots: &[SearchRoot],
    cancel: &CancelToken,
) -> Result<Vec<Candidate>, AsmLensError> {
    let source = prepare(patterns.for_dialect(Dialect::Source))?;
    let listing = prepare(patterns.for_dialect(Dialect::Listing))?;

    // A file reachable from two roots belongs to the first.
    let mut seen = HashSet::new();
    let mut jobs: Vec<(PathBuf, &Config)> = Vec::new();
    for root in roots {
        cancel.check()?;
        for path in super::files_for(&root.path, &root.config)? {
            if seen.insert(path.clone()) {
                jobs.push((path, root.config.as_ref()));
            }
        }
    }

    let per_file: Vec<Vec<Candidate>> = jobs
        .par_iter()
        .map(|(path, config)| {
            cancel.check()?;
            let dialect = config.dialect_for(path);
            let prepared = match dialect {
                Dialect::Source => &source,
                Dialect::Listing => &listing,
            };
            search_file(path, dialect, config, prepared, cancel)
        })
        .collect::<Result<Vec<_>, AsmLensError>>()
        .inspect_err(|e| tracing::debug!(error = %e, "search aborted"))?;

    Ok(per_file.into_iter().flatten().collect())
}

fn prepare(patterns: &[CompiledPattern]) -> Result<Vec<Prepared<'_>>, AsmLensError> {
    patterns
        .iter()
        .map(|pattern| {
            Ok(Prepared {
                pattern,
                matcher: pattern.line_matcher()?,
            })
        })
        .collect()
}

fn search_file(
    path: &Path,
    dialect: Dialect,
    config: &Config,
    patterns: &[Prepared<'_>],
    cancel: &CancelToken,
) -> Result<Vec<Candidate>, AsmLensError> {
    if patterns.is_empty() {
        return Ok(Vec::new());
    }
    if fs::metadata(path).is_ok_and(|m| m.len() > MAX_SEARCH_FILE_SIZE) {
        tracing::debug!(path = %path.display(), "skipping oversized file");
        return Ok(Vec::new());
    }
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "skipping unreadable file");
            return Ok(Vec::new());
        }
    };

    // (0-based line, pattern index) for every hit line.
    let mut hits: Vec<(u32, usize)> = Vec::new();
    let mut searcher = Searcher::new();
    for (index, p) in patterns.iter().enumerate() {
        cancel.check()?;
        let result = searcher.search_slice(
            &p.matcher,
            &bytes,
            Lossy(|line_num, _line| {
                hits.push((line_num.saturating_sub(1) as u32, index));
                Ok(true)
            }),
        );
        if let Err(e) = result {
            tracing::debug!(path = %path.display(), error = %e, "search failed");
            return Ok(Vec::new());
        }
        tracing::trace!(path = %path.display(), pattern = p.pattern.source(), "pattern applied");
    }
    if hits.is_empty() {
        return Ok(Vec::new());
    }

    let text = String::from_utf8_lossy(&bytes);
    let lines: Vec<&str> = text.lines().collect();
    let stripped = comments::strip_all(&lines);
    let scopes = super::scope_labels(&stripped, dialect, config);

    let mut out = Vec::new();
    for (line, index) in hits {
        let Some(line_text) = lines.get(line as usize) else {
            continue;
        };
        let visible = stripped.get(line as usize).map_or("", String::as_str);
        let scope_label = scopes.get(line as usize).cloned().flatten();
        collect_matches(
            patterns[index].pattern,
            line_text,
            |text, start, end, keyword| {
                let in_comment = visible.get(start..end) != Some(text);
                out.push(Candidate {
                    path: path.to_path_buf(),
                    dialect,
                    line,
                    start: start as u32,
                    end: end as u32,
                    text: text.to_string(),
                    keyword,
                    line_text: (*line_text).to_string(),
                    scope_label: scope_label.clone(),
                    in_comment,
                });
            },
        );
    }

    out.sort_by_key(|c| (c.line, c.start, c.end));
    out.dedup_by_key(|c| (c.line, c.start, c.end));
    Ok(out)
}

/// Every non-overlapping match of `pattern` on `line`, as
/// `(symbol, start, end, keyword)`. The scan resumes right after the symbol
/// so a trailing delimiter consumed by one match can lead the next.
fn collect_matches<F>(pattern: &CompiledPattern, line: &str, mut emit: F)
where
    F: FnMut(&str, usize, usize, Option<String>),
{
    let regex = pattern.regex();
    let mut at = 0;
    while at <= line.len() {
        let Some(caps) = regex.captures_at(line, at) else {
            break;
        };
        let Some(whole) = caps.get(0) else {
            break;
        };
        let symbol = caps.name("label").or_else(|| caps.name("name")).unwrap_or(whole);
        let keyword = caps.name("keyword").map(|k| k.as_str().to_string());
        emit(symbol.as_str(), symbol.start(), symbol.end(), keyword);

        let next = symbol.end().max(whole.start() + 1);
        if next <= at {
            break;
        }
        at = next;
        while at < line.len() && !line.is_char_boundary(at) {
            at += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::WordMatch;
    use crate::grammar::labels;

    fn root(dir: &Path) -> Vec<SearchRoot> {
        vec![SearchRoot {
            path: dir.to_path_buf(),
            config: Arc::new(Config::default()),
        }]
    }

    fn refs(word: &str) -> PatternSet {
        PatternSet::uniform(vec![labels::any_reference_for_word(word).unwrap()])
    }

    #[test]
    fn finds_every_occurrence_in_file_then_line_order() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b.asm"), "  call foo\n").unwrap();
        fs::write(dir.path().join("a.asm"), "foo: nop\n  jp foo,foo\n").unwrap();

        let found = search(&refs("foo"), &root(dir.path()), &CancelToken::new()).unwrap();
        let spots: Vec<_> = found
            .iter()
            .map(|c| {
                (
                    c.path.file_name().unwrap().to_string_lossy().into_owned(),
                    c.line,
                    c.start,
                )
            })
            .collect();
        assert_eq!(
            spots,
            vec![
                ("a.asm".to_string(), 0, 0),
                ("a.asm".to_string(), 1, 5),
                ("a.asm".to_string(), 1, 9),
                ("b.asm".to_string(), 0, 7),
            ]
        );
    }

    #[test]
    fn marks_hits_inside_comments() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("a.asm"),
            "  call foo ; foo again\n/* foo\n foo */ call foo\n",
        )
        .unwrap();
        let found = search(&refs("foo"), &root(dir.path()), &CancelToken::new()).unwrap();
        let live: Vec<_> = found.iter().map(|c| (c.line, c.in_comment)).collect();
        assert_eq!(
            live,
            vec![(0, false), (0, true), (1, true), (2, true), (2, false)]
        );
    }

    #[test]
    fn records_scope_label_and_captures() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.asm"), "main:\n.loop: djnz .loop\n").unwrap();
        let patterns = PatternSet::build(|d| {
            Ok(vec![labels::every_label_colon_for_word(".loop", WordMatch::Exact, d)?])
        })
        .unwrap();
        let found = search(&patterns, &root(dir.path()), &CancelToken::new()).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].text, ".loop");
        assert_eq!(found[0].scope_label.as_deref(), Some("main"));
    }

    #[test]
    fn listing_files_use_listing_patterns() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("out.list"), "0010 3E 05   start: ld a,5\n").unwrap();
        fs::write(dir.path().join("a.asm"), "0010 3E 05   start: ld a,5\n").unwrap();
        let patterns = PatternSet::build(|d| {
            Ok(vec![labels::every_label_colon_for_word("start", WordMatch::Exact, d)?])
        })
        .unwrap();
        let found = search(&patterns, &root(dir.path()), &CancelToken::new()).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].dialect, Dialect::Listing);
        assert_eq!(found[0].start, 13);
    }

    #[test]
    fn cancelled_search_yields_nothing() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.asm"), "foo: nop\n").unwrap();
        let cancel = CancelToken::new();
        cancel.cancel();
        let err = search(&refs("foo"), &root(dir.path()), &cancel).unwrap_err();
        assert!(matches!(err, AsmLensError::Cancelled));
    }

    #[test]
    fn unreadable_and_binary_files_do_not_fail_the_search() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.asm"), b"foo:\xff\xfe nop\n").unwrap();
        let found = search(&refs("foo"), &root(dir.path()), &CancelToken::new()).unwrap();
        assert_eq!(found.len(), 1);
    }
}
