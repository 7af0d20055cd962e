use std::path::PathBuf;

use serde::Serialize;

/// Which flavour of text a file holds. Carried through the type system so
/// pattern factories never re-detect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// Hand-written assembly source.
    Source,
    /// Assembler-generated listing: every line carries address/byte columns
    /// before the source text.
    Listing,
}

/// Zero-based line and byte column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

impl Position {
    #[must_use]
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
pub struct Range {
    pub start: Position,
    pub end: Position,
}

impl Range {
    #[must_use]
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    /// Range on a single line.
    #[must_use]
    pub fn on_line(line: u32, start: u32, end: u32) -> Self {
        Self::new(Position::new(line, start), Position::new(line, end))
    }

    #[must_use]
    pub fn contains(&self, pos: Position) -> bool {
        self.start <= pos && pos <= self.end
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Location {
    pub path: PathBuf,
    pub range: Range,
}

/// How a label scopes, decided by its first character.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelKind {
    Absolute,
    /// `.name`: lives under the nearest preceding absolute label.
    Relative,
    /// `@name`: cheap local label.
    Cheap,
}

impl LabelKind {
    #[must_use]
    pub fn of(text: &str) -> Self {
        match text.as_bytes().first() {
            Some(b'.') => Self::Relative,
            Some(b'@') => Self::Cheap,
            _ => Self::Absolute,
        }
    }
}

/// A label as found on one line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Label {
    pub text: String,
    pub kind: LabelKind,
    pub trailing_colon: bool,
    /// Byte columns of `text` within the line.
    pub start: u32,
    pub end: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SymbolKind {
    /// Code label.
    Function,
    Constant,
    /// Data label.
    Field,
    /// Macro or CA65 block directive.
    Method,
    Module,
    Struct,
}

impl std::fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Function => write!(f, "code"),
            Self::Constant => write!(f, "constant"),
            Self::Field => write!(f, "data"),
            Self::Method => write!(f, "macro"),
            Self::Module => write!(f, "module"),
            Self::Struct => write!(f, "struct"),
        }
    }
}

/// A node of the document outline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Symbol {
    pub name: String,
    pub kind: SymbolKind,
    /// Operand text for constants and data, e.g. `EQU 5`.
    pub detail: Option<String>,
    pub range: Range,
    pub selection_range: Range,
    pub children: Vec<Symbol>,
}

/// A flat workspace-symbol hit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SymbolInformation {
    pub name: String,
    pub kind: SymbolKind,
    pub location: Location,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompletionItem {
    pub label: String,
    pub kind: SymbolKind,
    /// File the suggestion was declared in.
    pub detail: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Hover {
    pub location: Location,
    /// Comment lines with their markers removed.
    pub lines: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextEdit {
    pub range: Range,
    pub new_text: String,
}

/// Edits grouped per file, in path order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WorkspaceEdit {
    pub changes: std::collections::BTreeMap<PathBuf, Vec<TextEdit>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CodeLens {
    pub name: String,
    pub range: Range,
    pub references: usize,
}

/// UTF-8 safe string truncation. Never panics on multi-byte characters.
#[must_use]
pub fn truncate_str(s: &str, max: usize) -> &str {
    if s.len() <= max {
        s
    } else {
        &s[..s.floor_char_boundary(max)]
    }
}
