#![warn(clippy::pedantic)]
#![allow(
    clippy::cast_possible_truncation,  // line and column numbers as u32
    clippy::cast_sign_loss,            // same
    clippy::cast_possible_wrap,        // column shifts computed as i64
    clippy::module_name_repetitions,   // Rust naming conventions
    clippy::similar_names,             // common in scanner/search code
    clippy::too_many_lines,            // the per-line scanner transition
    clippy::struct_excessive_bools,    // feature switches
    clippy::missing_errors_doc,        // internal pub(crate) fns don't need error docs
    clippy::missing_panics_doc,        // same
)]

pub mod cancel;
pub mod comments;
pub mod config;
pub mod document;
pub mod error;
pub(crate) mod format;
pub mod grammar;
pub mod outline;
pub mod providers;
pub mod search;
pub mod types;

use std::path::{Path, PathBuf};

use cancel::CancelToken;
use error::AsmLensError;
use providers::Workspace;
use types::Position;

/// One CLI request.
#[derive(Debug, Clone)]
pub enum Request {
    Outline { file: PathBuf },
    Definition { file: PathBuf, position: Position },
    References { file: PathBuf, position: Position, include_declaration: bool },
    Complete { file: PathBuf, position: Position },
    Symbols { query: String },
    Hover { file: PathBuf, position: Position },
    Rename { file: PathBuf, position: Position, new_name: String },
    Lens { file: PathBuf },
}

impl Request {
    fn file(&self) -> Option<&Path> {
        match self {
            Self::Outline { file }
            | Self::Definition { file, .. }
            | Self::References { file, .. }
            | Self::Complete { file, .. }
            | Self::Hover { file, .. }
            | Self::Rename { file, .. }
            | Self::Lens { file } => Some(file.as_path()),
            Self::Symbols { .. } => None,
        }
    }
}

/// Answer one request against `workspace`, formatted as text or JSON.
///
/// A file outside every workspace root has no configuration and yields an
/// empty answer, not an error.
pub fn run(
    request: &Request,
    workspace: &Workspace,
    json: bool,
    cancel: &CancelToken,
) -> Result<String, AsmLensError> {
    let scope = workspace
        .roots()
        .first()
        .map_or_else(PathBuf::new, |r| r.path.clone());

    if let Request::Symbols { query } = request {
        let found = providers::workspace_symbols(workspace, query, cancel);
        return Ok(if json {
            format::json(&found)
        } else {
            format::workspace_symbols(query, &found, &scope)
        });
    }

    let Some(file) = request.file() else {
        return Ok(String::new());
    };
    if !file.is_file() {
        return Err(AsmLensError::NotFound {
            path: file.to_path_buf(),
        });
    }
    let Some(ctx) = workspace.context_for(file, cancel.clone()) else {
        tracing::debug!(path = %file.display(), "outside every workspace root");
        return Ok(if json { "[]".to_string() } else { String::new() });
    };
    let doc = ctx.open(file)?;

    let output = match request {
        Request::Outline { .. } => {
            let symbols = providers::document_symbols(&ctx, &doc);
            if json {
                format::json(&symbols)
            } else {
                format::outline(&doc.path, &symbols, &scope)
            }
        }
        Request::Definition { position, .. } => {
            let found = providers::definitions(&ctx, &doc, *position);
            if json {
                format::json(&found)
            } else {
                format::locations("Definitions", &found, &scope)
            }
        }
        Request::References {
            position,
            include_declaration,
            ..
        } => {
            let found = providers::references(&ctx, &doc, *position, *include_declaration);
            if json {
                format::json(&found)
            } else {
                format::locations("References", &found, &scope)
            }
        }
        Request::Complete { position, .. } => {
            let items = providers::completions(&ctx, &doc, *position);
            if json {
                format::json(&items)
            } else {
                format::completions(&items)
            }
        }
        Request::Hover { position, .. } => {
            let found = providers::hover(&ctx, &doc, *position);
            if json {
                format::json(&found)
            } else {
                format::hovers(&found, &scope)
            }
        }
        Request::Rename {
            position, new_name, ..
        } => {
            let edit = providers::rename(&ctx, &doc, *position, new_name)?;
            if json {
                format::json(&edit)
            } else {
                format::workspace_edit(&edit, &scope)
            }
        }
        Request::Lens { .. } => {
            let found = providers::code_lenses(&ctx, &doc);
            if json {
                format::json(&found)
            } else {
                format::lenses(&doc.path, &found, &scope)
            }
        }
        Request::Symbols { .. } => String::new(),
    };
    Ok(output)
}
