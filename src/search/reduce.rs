//! Location reduction: turn raw textual candidates into the locations that
//! really designate the searched label.

use std::collections::HashSet;
use std::path::Path;

use super::grep::{Candidate, PatternSet};
use crate::types::{Location, Position};

/// Which characters continue a token when a candidate is widened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Boundary {
    /// `[\w.@]`: dotted and marked labels are one token.
    Label,
    /// `\w`: plain words.
    Word,
}

impl Boundary {
    fn continues(self, c: char) -> bool {
        match self {
            Self::Label => c.is_alphanumeric() || c == '_' || c == '.' || c == '@',
            Self::Word => c.is_alphanumeric() || c == '_',
        }
    }
}

/// Where the request came from.
#[derive(Debug, Clone, Copy)]
pub struct Origin<'a> {
    pub path: &'a Path,
    pub position: Position,
    /// Searched label as written at the cursor, e.g. `.loop` or `main.loop`.
    pub word: &'a str,
    /// Absolute label in force at the cursor line.
    pub scope_label: Option<&'a str>,
}

#[derive(Debug, Clone, Copy)]
pub struct ReduceOptions {
    pub include_declaration: bool,
    pub unique_only: bool,
    pub boundary: Boundary,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reduction {
    pub locations: Vec<Location>,
    /// Candidates that tied with the chosen one in unique mode.
    pub ambiguous: Vec<Location>,
}

/// Keep the candidates that designate `origin.word`.
///
/// `declarations` recognizes declaring lines; with `include_declaration`
/// off, those and the origin itself are dropped.
#[must_use]
pub fn reduce(
    declarations: &PatternSet,
    candidates: Vec<Candidate>,
    origin: &Origin<'_>,
    options: ReduceOptions,
) -> Reduction {
    let searched_scope = scope_of(origin.word, origin.scope_label);
    // A MODULE/STRUCT name is also used as the qualifier of its members.
    let names_scope = candidates
        .iter()
        .any(|c| !c.in_comment && declares_scope(c, declarations));
    let mut seen = HashSet::new();

    let kept: Vec<Candidate> = candidates
        .into_iter()
        .filter(|c| !c.in_comment)
        .filter(|c| {
            let mut token = widen(c, options.boundary);
            if !labels_match(token, origin.word) {
                match qualifier(c, options.boundary) {
                    Some(head) if names_scope && labels_match(head, origin.word) => token = head,
                    _ => return false,
                }
            }
            match (scope_of(token, c.scope_label.as_deref()), searched_scope) {
                (Some(found), Some(searched)) => same_scope(found, searched),
                _ => true,
            }
        })
        .filter(|c| {
            options.include_declaration
                || !(is_origin(c, origin) || is_declaration(c, declarations))
        })
        .filter(|c| seen.insert((c.path.clone(), c.line, c.start, c.end)))
        .collect();

    if !options.unique_only || kept.len() <= 1 {
        return Reduction {
            locations: kept.iter().map(Candidate::location).collect(),
            ambiguous: Vec::new(),
        };
    }

    // Same-file candidates are preferred, closest line first, earlier line on a tie.
    let same_file: Vec<&Candidate> = kept.iter().filter(|c| c.path == origin.path).collect();
    let tier: Vec<&Candidate> = if same_file.is_empty() {
        kept.iter().collect()
    } else {
        same_file
    };
    let winner = if tier.iter().any(|c| c.path == origin.path) {
        tier.iter()
            .copied()
            .min_by_key(|c| (c.line.abs_diff(origin.position.line), c.line, c.start))
    } else {
        tier.first().copied()
    };
    let Some(winner) = winner else {
        return Reduction::default();
    };

    let ambiguous: Vec<Location> = tier
        .iter()
        .filter(|c| !std::ptr::eq(**c, winner))
        .map(|c| c.location())
        .collect();
    if !ambiguous.is_empty() {
        tracing::debug!(
            word = origin.word,
            chosen = %winner.path.display(),
            line = winner.line,
            others = ambiguous.len(),
            "ambiguous definition"
        );
    }

    Reduction {
        locations: vec![winner.location()],
        ambiguous,
    }
}

/// Byte span of the full token around a candidate's match.
fn token_span(c: &Candidate, boundary: Boundary) -> Option<(usize, usize)> {
    let line = c.line_text.as_str();
    let (start, end) = (c.start as usize, c.end as usize);
    if end > line.len() || !line.is_char_boundary(start) || !line.is_char_boundary(end) {
        return None;
    }
    let from = line[..start]
        .char_indices()
        .rev()
        .take_while(|(_, ch)| boundary.continues(*ch))
        .last()
        .map_or(start, |(i, _)| i);
    let to = line[end..]
        .char_indices()
        .find(|(_, ch)| !boundary.continues(*ch))
        .map_or(line.len(), |(i, _)| end + i);
    Some((from, to))
}

/// The full token around a candidate's match.
fn widen(c: &Candidate, boundary: Boundary) -> &str {
    token_span(c, boundary).map_or(c.text.as_str(), |(from, to)| &c.line_text[from..to])
}

/// The token cut right after the candidate when a member follows it:
/// `gfx` in `gfx.draw`, `outer.gfx` in `outer.gfx.draw`.
fn qualifier(c: &Candidate, boundary: Boundary) -> Option<&str> {
    let (from, _) = token_span(c, boundary)?;
    let end = c.end as usize;
    c.line_text[end..]
        .starts_with('.')
        .then(|| &c.line_text[from..end])
}

/// Whether a found token and the searched label name the same thing: equal,
/// or one is the other qualified by leading dot-segments (`main.loop` and
/// `.loop`, `gfx.draw` and `draw`). Case-insensitive.
#[must_use]
pub fn labels_match(found: &str, searched: &str) -> bool {
    let found = found.to_lowercase();
    let searched = searched.to_lowercase();
    found == searched || qualifies(&found, &searched) || qualifies(&searched, &found)
}

fn qualifies(long: &str, short: &str) -> bool {
    let tail = short.trim_start_matches(['.', '@']);
    if tail.is_empty() || long.len() <= tail.len() + 1 {
        return false;
    }
    long.ends_with(tail) && long.as_bytes()[long.len() - tail.len() - 1] == b'.'
}

/// The absolute label a token is bound to. `.x` is bound to the label in
/// force on its line, `outer.x` to `outer`; plain names are unbound (`None`).
fn scope_of<'a>(token: &'a str, line_scope: Option<&'a str>) -> Option<Option<&'a str>> {
    if token.starts_with('.') {
        return Some(line_scope);
    }
    token
        .rsplit_once('.')
        .map(|(qualifier, _)| Some(qualifier.rsplit('.').next().unwrap_or(qualifier)))
}

fn same_scope(a: Option<&str>, b: Option<&str>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => a.eq_ignore_ascii_case(b),
        (None, None) => true,
        _ => false,
    }
}

fn is_origin(c: &Candidate, origin: &Origin<'_>) -> bool {
    c.path == origin.path
        && c.line == origin.position.line
        && (c.start..=c.end).contains(&origin.position.column)
}

fn is_declaration(c: &Candidate, declarations: &PatternSet) -> bool {
    declarations.for_dialect(c.dialect).iter().any(|p| {
        p.regex().captures(&c.line_text).is_some_and(|caps| {
            caps.name("label")
                .or_else(|| caps.name("name"))
                .is_some_and(|m| m.start() <= c.start as usize && c.end as usize <= m.end())
        })
    })
}

/// Whether the candidate is the name of a MODULE or STRUCT declaration.
fn declares_scope(c: &Candidate, declarations: &PatternSet) -> bool {
    declarations.for_dialect(c.dialect).iter().any(|p| {
        p.regex().captures(&c.line_text).is_some_and(|caps| {
            let scope_keyword = caps.name("keyword").is_some_and(|k| {
                k.as_str().eq_ignore_ascii_case("module") || k.as_str().eq_ignore_ascii_case("struct")
            });
            scope_keyword
                && caps
                    .name("name")
                    .is_some_and(|m| m.start() <= c.start as usize && c.end as usize <= m.end())
        })
    })
}
