use std::fs;
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::error::AsmLensError;
use crate::types::{Dialect, Position, Range};

/// Label characters: word characters plus `.` (relative/dotted) and `@` (cheap).
#[must_use]
pub fn is_label_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '.' || c == '@'
}

/// One file's text, split into lines, with its dialect decided up front.
#[derive(Debug, Clone)]
pub struct Document {
    pub path: PathBuf,
    pub dialect: Dialect,
    pub lines: Vec<String>,
}

impl Document {
    /// Read a file. The stored path is canonical so it compares equal to the
    /// paths search produces under canonical workspace roots.
    pub fn open(path: &Path, config: &Config) -> Result<Self, AsmLensError> {
        let bytes = fs::read(path).map_err(|e| AsmLensError::io(path, e))?;
        let text = String::from_utf8_lossy(&bytes);
        let path = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
        let dialect = config.dialect_for(&path);
        Ok(Self::from_text(path, &text, dialect))
    }

    #[must_use]
    pub fn from_text(path: impl Into<PathBuf>, text: &str, dialect: Dialect) -> Self {
        Self {
            path: path.into(),
            dialect,
            lines: text.lines().map(str::to_string).collect(),
        }
    }

    #[must_use]
    pub fn line(&self, line: u32) -> Option<&str> {
        self.lines.get(line as usize).map(String::as_str)
    }

    /// The full label token under the cursor, e.g. `main.loop` or `@tmp`.
    /// A cursor right after the last character still counts.
    #[must_use]
    pub fn word_at(&self, pos: Position) -> Option<(String, Range)> {
        let text = self.line(pos.line)?;
        let col = (pos.column as usize).min(text.len());
        if !text.is_char_boundary(col) {
            return None;
        }

        let start = text[..col]
            .char_indices()
            .rev()
            .take_while(|(_, c)| is_label_char(*c))
            .last()
            .map_or(col, |(i, _)| i);
        let end = text[col..]
            .char_indices()
            .find(|(_, c)| !is_label_char(*c))
            .map_or(text.len(), |(i, _)| col + i);

        if start == end {
            return None;
        }
        let word = &text[start..end];
        // Pure numbers and trailing-dot fragments are never labels.
        if !word.trim_start_matches(['.', '@']).starts_with(|c: char| c.is_alphabetic() || c == '_') {
            return None;
        }
        Some((
            word.to_string(),
            Range::on_line(pos.line, start as u32, end as u32),
        ))
    }

    /// The label characters typed so far, left of the cursor.
    #[must_use]
    pub fn prefix_at(&self, pos: Position) -> String {
        let Some(text) = self.line(pos.line) else {
            return String::new();
        };
        let col = (pos.column as usize).min(text.len());
        if !text.is_char_boundary(col) {
            return String::new();
        }
        let start = text[..col]
            .char_indices()
            .rev()
            .take_while(|(_, c)| is_label_char(*c))
            .last()
            .map_or(col, |(i, _)| i);
        text[start..col].to_string()
    }
}
