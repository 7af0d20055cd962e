//! Provider adapters: one function per editor capability, each mapping
//! grammar, search and reduction output onto a plain result shape.
//!
//! Every provider takes an explicit [`Context`] built per request. Soft
//! failures (feature off, cancellation, nothing under the cursor) produce an
//! empty result, never an error.

mod code_lens;
mod completion;
mod definition;
mod hover;
mod references;
mod rename;
mod symbols;

pub use code_lens::code_lenses;
pub use completion::completions;
pub use definition::definitions;
pub use hover::hover;
pub use references::references;
pub use rename::rename;
pub use symbols::{document_symbols, workspace_symbols};

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::cancel::CancelToken;
use crate::comments;
use crate::config::Config;
use crate::document::Document;
use crate::error::AsmLensError;
use crate::grammar::blocks::{self, is_directive_keyword};
use crate::grammar::labels;
use crate::grammar::{CompiledPattern, WordMatch};
use crate::search::{self, Candidate, Origin, PatternSet, SearchRoot};
use crate::types::{Dialect, Position, SymbolKind};

/// The configured workspace roots, each with its own configuration.
///
/// Immutable: a configuration change builds a new `Workspace`.
#[derive(Debug, Clone, Default)]
pub struct Workspace {
    roots: Vec<SearchRoot>,
}

impl Workspace {
    /// Load `asmlens.toml` from each root.
    pub fn open(paths: &[PathBuf]) -> Result<Self, AsmLensError> {
        let roots = paths
            .iter()
            .map(|path| {
                let path = fs::canonicalize(path).map_err(|e| AsmLensError::io(path, e))?;
                let config = Config::load(&path)?;
                Ok(SearchRoot {
                    path,
                    config: Arc::new(config),
                })
            })
            .collect::<Result<Vec<_>, AsmLensError>>()?;
        Ok(Self { roots })
    }

    #[must_use]
    pub fn new(roots: Vec<SearchRoot>) -> Self {
        Self { roots }
    }

    #[must_use]
    pub fn roots(&self) -> &[SearchRoot] {
        &self.roots
    }

    /// Context for a request about `path`: the configuration of the innermost
    /// root containing it. `None` when the file lies outside every root.
    #[must_use]
    pub fn context_for(&self, path: &Path, cancel: CancelToken) -> Option<Context> {
        let path = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
        let owner = self
            .roots
            .iter()
            .filter(|root| path.starts_with(&root.path))
            .max_by_key(|root| root.path.components().count())?;
        Some(Context {
            config: Arc::clone(&owner.config),
            roots: self.roots.clone(),
            cancel,
        })
    }
}

/// Everything one request needs. Built per request, dropped after it.
#[derive(Debug, Clone)]
pub struct Context {
    pub config: Arc<Config>,
    pub roots: Vec<SearchRoot>,
    pub cancel: CancelToken,
}

impl Context {
    /// Open a document under this context's configuration.
    pub fn open(&self, path: &Path) -> Result<Document, AsmLensError> {
        Document::open(path, &self.config)
    }
}

/// Patterns for every declaration form of `word`, per dialect.
pub(crate) fn declaration_patterns(
    config: &Config,
    word: &str,
    mode: WordMatch,
) -> Result<PatternSet, AsmLensError> {
    PatternSet::build(|dialect| {
        let mut patterns: Vec<CompiledPattern> = Vec::with_capacity(5);
        if config.labels_with_colons {
            patterns.push(labels::every_label_colon_for_word(word, mode, dialect)?);
        }
        if config.labels_without_colons && dialect == Dialect::Source {
            patterns.push(labels::every_label_without_colon_for_word(word, mode)?);
        }
        patterns.push(blocks::every_module_for_word(word, mode, dialect)?);
        patterns.push(blocks::every_macro_for_word(word, mode, dialect)?);
        patterns.push(blocks::every_ca65_block_for_word(word, mode, dialect)?);
        Ok(patterns)
    })
}

/// Plain occurrences of `word`.
pub(crate) fn reference_patterns(word: &str) -> Result<PatternSet, AsmLensError> {
    Ok(PatternSet::uniform(vec![labels::any_reference_for_word(word)?]))
}

/// A declaration hit that really declares something: not commented out,
/// not an excluded word, not a directive keyword caught by the colon-less form.
pub(crate) fn is_declaration(c: &Candidate, config: &Config) -> bool {
    if c.in_comment || config.is_excluded(&c.text) {
        return false;
    }
    c.keyword.is_some() || !is_directive_keyword(c.text.trim_start_matches('.'))
}

/// Symbol kind implied by the directive that declared a candidate.
pub(crate) fn declared_kind(c: &Candidate) -> SymbolKind {
    match c.keyword.as_deref() {
        Some(k) if k.eq_ignore_ascii_case("module") => SymbolKind::Module,
        Some(k) if k.eq_ignore_ascii_case("struct") => SymbolKind::Struct,
        Some(_) => SymbolKind::Method,
        None => SymbolKind::Function,
    }
}

/// The searched word at the cursor plus the absolute label in force there.
pub(crate) struct Cursor {
    pub word: String,
    pub scope_label: Option<String>,
    pub position: Position,
}

impl Cursor {
    pub fn at(doc: &Document, position: Position, config: &Config) -> Option<Self> {
        let (word, _) = doc.word_at(position)?;
        if config.is_excluded(&word) {
            return None;
        }
        let stripped = comments::strip_all(&doc.lines);
        let scope_label = search::scope_labels(&stripped, doc.dialect, config)
            .into_iter()
            .nth(position.line as usize)
            .flatten();
        Some(Self {
            word,
            scope_label,
            position,
        })
    }

    pub fn origin<'a>(&'a self, doc: &'a Document) -> Origin<'a> {
        Origin {
            path: &doc.path,
            position: self.position,
            word: &self.word,
            scope_label: self.scope_label.as_deref(),
        }
    }
}

/// Collapse a provider result: cancellation and search failures become an
/// empty answer.
pub(crate) fn soften<T: Default>(what: &str, result: Result<T, AsmLensError>) -> T {
    match result {
        Ok(value) => value,
        Err(AsmLensError::Cancelled) => {
            tracing::debug!(provider = what, "cancelled");
            T::default()
        }
        Err(e) => {
            tracing::debug!(provider = what, error = %e, "no result");
            T::default()
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    /// A temporary workspace built from `(relative path, text)` pairs.
    pub struct Fixture {
        pub dir: tempfile::TempDir,
        pub workspace: Workspace,
    }

    impl Fixture {
        pub fn new(files: &[(&str, &str)]) -> Self {
            let dir = tempfile::tempdir().unwrap();
            for (name, text) in files {
                let path = dir.path().join(name);
                if let Some(parent) = path.parent() {
                    fs::create_dir_all(parent).unwrap();
                }
                fs::write(path, text).unwrap();
            }
            let workspace = Workspace::open(&[dir.path().to_path_buf()]).unwrap();
            Self { dir, workspace }
        }

        pub fn path(&self, name: &str) -> PathBuf {
            fs::canonicalize(self.dir.path().join(name)).unwrap()
        }

        pub fn context(&self, name: &str) -> Context {
            self.workspace
                .context_for(&self.path(name), CancelToken::new())
                .unwrap()
        }

        pub fn doc(&self, name: &str) -> (Context, Document) {
            let ctx = self.context(name);
            let doc = ctx.open(&self.path(name)).unwrap();
            (ctx, doc)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::Fixture;
    use super::*;

    #[test]
    fn context_is_absent_outside_every_root() {
        let fx = Fixture::new(&[("a.asm", "start: nop\n")]);
        let outside = tempfile::tempdir().unwrap();
        fs::write(outside.path().join("b.asm"), "x: nop\n").unwrap();
        assert!(
            fx.workspace
                .context_for(&outside.path().join("b.asm"), CancelToken::new())
                .is_none()
        );
        assert!(
            fx.workspace
                .context_for(&fx.path("a.asm"), CancelToken::new())
                .is_some()
        );
    }

    #[test]
    fn innermost_root_config_wins() {
        let outer = Fixture::new(&[
            ("main.asm", "start: nop\n"),
            ("lib/asmlens.toml", "nest_cheap_labels = true\n"),
            ("lib/util.asm", "util: ret\n"),
        ]);
        let ws = Workspace::open(&[outer.dir.path().to_path_buf(), outer.dir.path().join("lib")])
            .unwrap();
        let ctx = ws
            .context_for(&outer.path("lib/util.asm"), CancelToken::new())
            .unwrap();
        assert!(ctx.config.nest_cheap_labels);
        let ctx = ws
            .context_for(&outer.path("main.asm"), CancelToken::new())
            .unwrap();
        assert!(!ctx.config.nest_cheap_labels);
    }

    #[test]
    fn malformed_root_config_fails_to_open() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("asmlens.toml"), "labels_excludes = 3\n").unwrap();
        let err = Workspace::open(&[dir.path().to_path_buf()]).unwrap_err();
        assert!(matches!(err, AsmLensError::Config { .. }));
    }
}
