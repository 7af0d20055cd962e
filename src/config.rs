//! Workspace configuration, read from `asmlens.toml` at a workspace root.

use std::fs;
use std::path::Path;

use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::{Deserialize, Serialize};

use crate::error::AsmLensError;
use crate::types::Dialect;

pub const CONFIG_FILE: &str = "asmlens.toml";

/// Default configuration as TOML
pub const DEFAULT_CONFIG: &str = r#"# asmlens configuration

# Files searched for labels, modules and macros (root-relative glob).
include_files = "**/*.{asm,inc,s,a80,z80,list,lis}"
# Files never searched. Empty means nothing is excluded.
exclude_files = ""

labels_with_colons = true
labels_without_colons = true
# Column-0 words that look like colon-less labels but are not.
labels_excludes = ["include", "if", "endif", "else"]
# Attach @cheap labels to the enclosing MODULE instead of the document root.
nest_cheap_labels = false

completion_required_length = 1
workspace_symbol_required_length = 2

# Extensions treated as assembler listings.
listing_extensions = ["list", "lis"]

[features]
definitions = true
references = true
completions = true
workspace_symbols = true
document_symbols = true
hover = true
rename = true
code_lens = true
"#;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub include_files: String,
    pub exclude_files: String,
    pub labels_with_colons: bool,
    pub labels_without_colons: bool,
    pub labels_excludes: Vec<String>,
    pub nest_cheap_labels: bool,
    pub completion_required_length: usize,
    pub workspace_symbol_required_length: usize,
    pub listing_extensions: Vec<String>,
    pub features: Features,
}

/// One switch per provider. A disabled provider answers with an empty result.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[allow(clippy::struct_excessive_bools)]
pub struct Features {
    pub definitions: bool,
    pub references: bool,
    pub completions: bool,
    pub workspace_symbols: bool,
    pub document_symbols: bool,
    pub hover: bool,
    pub rename: bool,
    pub code_lens: bool,
}

impl Default for Features {
    fn default() -> Self {
        Self {
            definitions: true,
            references: true,
            completions: true,
            workspace_symbols: true,
            document_symbols: true,
            hover: true,
            rename: true,
            code_lens: true,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            include_files: "**/*.{asm,inc,s,a80,z80,list,lis}".to_string(),
            exclude_files: String::new(),
            labels_with_colons: true,
            labels_without_colons: true,
            labels_excludes: ["include", "if", "endif", "else"]
                .into_iter()
                .map(String::from)
                .collect(),
            nest_cheap_labels: false,
            completion_required_length: 1,
            workspace_symbol_required_length: 2,
            listing_extensions: vec!["list".to_string(), "lis".to_string()],
            features: Features::default(),
        }
    }
}

impl Config {
    /// Load `asmlens.toml` from `root`. A missing file yields the defaults.
    pub fn load(root: &Path) -> Result<Self, AsmLensError> {
        let path = root.join(CONFIG_FILE);
        match fs::read_to_string(&path) {
            Ok(text) => Self::parse(&text, &path),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(AsmLensError::io(path, e)),
        }
    }

    pub fn parse(text: &str, path: &Path) -> Result<Self, AsmLensError> {
        toml::from_str(text).map_err(|e| AsmLensError::Config {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Label exclusion check. Case-insensitive, ignores a leading `@`.
    #[must_use]
    pub fn is_excluded(&self, label: &str) -> bool {
        label_excluded(&self.labels_excludes, label)
    }

    #[must_use]
    pub fn dialect_for(&self, path: &Path) -> Dialect {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        if self
            .listing_extensions
            .iter()
            .any(|l| l.eq_ignore_ascii_case(ext))
        {
            Dialect::Listing
        } else {
            Dialect::Source
        }
    }

    /// Compile the include/exclude globs.
    pub fn file_filter(&self) -> Result<FileFilter, AsmLensError> {
        let include = glob_set(&self.include_files)?;
        let exclude = if self.exclude_files.trim().is_empty() {
            None
        } else {
            Some(glob_set(&self.exclude_files)?)
        };
        Ok(FileFilter { include, exclude })
    }
}

/// Compiled include/exclude globs, matched against root-relative paths.
#[derive(Debug, Clone)]
pub struct FileFilter {
    include: GlobSet,
    exclude: Option<GlobSet>,
}

impl FileFilter {
    #[must_use]
    pub fn accepts(&self, relative: &Path) -> bool {
        self.include.is_match(relative)
            && !self.exclude.as_ref().is_some_and(|ex| ex.is_match(relative))
    }
}

pub(crate) fn label_excluded(excludes: &[String], label: &str) -> bool {
    let bare = label.strip_prefix('@').unwrap_or(label);
    excludes.iter().any(|ex| ex.eq_ignore_ascii_case(bare))
}

fn glob_set(pattern: &str) -> Result<GlobSet, AsmLensError> {
    let err = |e: globset::Error| AsmLensError::Glob {
        pattern: pattern.to_string(),
        reason: e.to_string(),
    };
    let mut builder = GlobSetBuilder::new();
    builder.add(Glob::new(pattern.trim()).map_err(err)?);
    builder.build().map_err(err)
}
