pub mod grep;
pub mod reduce;

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use ignore::WalkBuilder;

use crate::config::{Config, FileFilter};
use crate::error::AsmLensError;
use crate::grammar::blocks;
use crate::grammar::labels::LabelMatcher;
use crate::types::{Dialect, LabelKind};

pub use grep::{Candidate, PatternSet, SearchRoot, search};
pub use reduce::{Boundary, Origin, ReduceOptions, Reduction, reduce};

// Directories that are always skipped: build artifacts, dependencies, VCS internals.
// We skip these explicitly instead of relying on .gitignore so that gitignored
// listings and generated includes are still searchable.
pub(crate) const SKIP_DIRS: &[&str] = &[
    ".git",
    ".hg",
    ".svn",
    "node_modules",
    "target",
    "__pycache__",
    ".cache",
    ".venv",
    ".vscode",
    ".idea",
];

/// Build a parallel directory walker over everything but known junk directories.
/// Does NOT respect .gitignore.
pub(crate) fn walker(root: &Path) -> ignore::WalkParallel {
    WalkBuilder::new(root)
        .hidden(false)
        .git_ignore(false)
        .git_global(false)
        .git_exclude(false)
        .ignore(false)
        .parents(false)
        .filter_entry(|entry| {
            if entry.file_type().is_some_and(|ft| ft.is_dir()) {
                if let Some(name) = entry.file_name().to_str() {
                    return !SKIP_DIRS.contains(&name);
                }
            }
            true
        })
        .build_parallel()
}

/// Every file under `root` accepted by `filter`, sorted by path.
pub fn files(root: &Path, filter: &FileFilter) -> Vec<PathBuf> {
    let found: Mutex<Vec<PathBuf>> = Mutex::new(Vec::new());

    walker(root).run(|| {
        let found = &found;
        Box::new(move |entry| {
            let Ok(entry) = entry else {
                return ignore::WalkState::Continue;
            };
            if !entry.file_type().is_some_and(|ft| ft.is_file()) {
                return ignore::WalkState::Continue;
            }
            let path = entry.path();
            let relative = path.strip_prefix(root).unwrap_or(path);
            if filter.accepts(relative) {
                found
                    .lock()
                    .unwrap_or_else(std::sync::PoisonError::into_inner)
                    .push(path.to_path_buf());
            }
            ignore::WalkState::Continue
        })
    });

    let mut files = found
        .into_inner()
        .unwrap_or_else(std::sync::PoisonError::into_inner);
    files.sort();
    files
}

/// Files for `root` using the root's own include/exclude settings.
pub fn files_for(root: &Path, config: &Config) -> Result<Vec<PathBuf>, AsmLensError> {
    Ok(files(root, &config.file_filter()?))
}

/// For each line, the absolute label in force there: the latest absolute
/// label at or above it, forgotten at MODULE/STRUCT boundaries. Lines must be
/// comment-stripped.
pub(crate) fn scope_labels<S: AsRef<str>>(
    lines: &[S],
    dialect: Dialect,
    config: &Config,
) -> Vec<Option<String>> {
    let labels = LabelMatcher::new(config, dialect);
    let open = blocks::module_struct(dialect);
    let close = blocks::end_module_struct(dialect);

    let mut current: Option<String> = None;
    lines
        .iter()
        .map(|line| {
            let line = line.as_ref();
            match labels.find(line) {
                Some(label) if label.kind == LabelKind::Absolute => current = Some(label.text),
                Some(_) => {}
                None if open.is_match(line) || close.is_match(line) => current = None,
                None => {}
            }
            current.clone()
        })
        .collect()
}
