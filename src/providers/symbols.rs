use std::collections::HashSet;

use super::{Context, Workspace, declaration_patterns, declared_kind, is_declaration};
use crate::cancel::CancelToken;
use crate::document::Document;
use crate::error::AsmLensError;
use crate::grammar::WordMatch;
use crate::outline;
use crate::search::{self, SearchRoot};
use crate::types::{Symbol, SymbolInformation};

/// Hierarchical outline of one document.
#[must_use]
pub fn document_symbols(ctx: &Context, doc: &Document) -> Vec<Symbol> {
    if !ctx.config.features.document_symbols {
        return Vec::new();
    }
    outline::outline(&doc.lines, doc.dialect, &ctx.config)
}

/// Fuzzy search for declarations across every workspace root, each root
/// under its own configuration. Cancellation stops the roots not yet
/// searched; results from finished roots are kept.
#[must_use]
pub fn workspace_symbols(
    workspace: &Workspace,
    query: &str,
    cancel: &CancelToken,
) -> Vec<SymbolInformation> {
    gather(workspace.roots(), |root| root_symbols(root, query, cancel))
}

/// Per-root results in root order, first location wins.
fn gather<F>(roots: &[SearchRoot], mut per_root: F) -> Vec<SymbolInformation>
where
    F: FnMut(&SearchRoot) -> Result<Vec<SymbolInformation>, AsmLensError>,
{
    let mut out = Vec::new();
    let mut seen = HashSet::new();
    for root in roots {
        match per_root(root) {
            Ok(found) => out.extend(
                found
                    .into_iter()
                    .filter(|s| seen.insert(s.location.clone())),
            ),
            Err(AsmLensError::Cancelled) => {
                tracing::debug!(root = %root.path.display(), "workspace symbols cancelled");
                break;
            }
            Err(e) => {
                tracing::debug!(root = %root.path.display(), error = %e, "root skipped");
            }
        }
    }
    out
}

fn root_symbols(
    root: &SearchRoot,
    query: &str,
    cancel: &CancelToken,
) -> Result<Vec<SymbolInformation>, AsmLensError> {
    let config = &root.config;
    if !config.features.workspace_symbols
        || query.chars().count() < config.workspace_symbol_required_length
    {
        return Ok(Vec::new());
    }
    let patterns = declaration_patterns(config, query, WordMatch::Fuzzy)?;
    let candidates = search::search(&patterns, std::slice::from_ref(root), cancel)?;
    Ok(candidates
        .into_iter()
        .filter(|c| is_declaration(c, config))
        .map(|c| SymbolInformation {
            kind: declared_kind(&c),
            location: c.location(),
            name: c.text,
        })
        .collect())
}
