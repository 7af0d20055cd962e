use std::fmt::Write;
use std::path::Path;

use serde::Serialize;

use crate::types::{
    CodeLens, CompletionItem, Hover, Location, Symbol, SymbolInformation, WorkspaceEdit,
    truncate_str,
};

/// Strip the scope prefix from a path to produce a relative display path.
/// Falls back to the full path if stripping fails.
pub fn rel(path: &Path, scope: &Path) -> String {
    path.strip_prefix(scope)
        .unwrap_or(path)
        .display()
        .to_string()
}

/// `path:line:column`, 1-based like compiler diagnostics.
fn spot(location: &Location, scope: &Path) -> String {
    format!(
        "{}:{}:{}",
        rel(&location.path, scope),
        location.range.start.line + 1,
        location.range.start.column + 1
    )
}

fn header(out: &mut String, title: &str, count: usize, noun: &str) {
    let plural = if count == 1 { "" } else { "s" };
    let _ = writeln!(out, "# {title}: {count} {noun}{plural}");
}

/// Pretty JSON for `--json`.
pub fn json<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string_pretty(value)
        .unwrap_or_else(|e| format!("{{\"error\": \"{e}\"}}"))
}

pub fn locations(title: &str, found: &[Location], scope: &Path) -> String {
    let mut out = String::new();
    header(&mut out, title, found.len(), "location");
    for location in found {
        let _ = writeln!(out, "{}", spot(location, scope));
    }
    out
}

/// Indented outline, one symbol per line:
/// `name [kind] L3-9  detail`.
pub fn outline(path: &Path, symbols: &[Symbol], scope: &Path) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# {}", rel(path, scope));
    write_symbols(&mut out, symbols, 0);
    out
}

fn write_symbols(out: &mut String, symbols: &[Symbol], depth: usize) {
    for s in symbols {
        let (start, end) = (s.range.start.line + 1, s.range.end.line + 1);
        let lines = if start == end {
            format!("L{start}")
        } else {
            format!("L{start}-{end}")
        };
        let _ = write!(out, "{:indent$}{} [{}] {lines}", "", s.name, s.kind, indent = depth * 2);
        if let Some(detail) = &s.detail {
            if detail.len() > 60 {
                let _ = write!(out, "  {}...", truncate_str(detail, 57));
            } else {
                let _ = write!(out, "  {detail}");
            }
        }
        out.push('\n');
        write_symbols(out, &s.children, depth + 1);
    }
}

pub fn completions(items: &[CompletionItem]) -> String {
    let mut out = String::new();
    header(&mut out, "Completions", items.len(), "item");
    let width = items.iter().map(|i| i.label.len()).max().unwrap_or(0);
    for item in items {
        let _ = write!(out, "{:width$}  {}", item.label, item.kind);
        if let Some(detail) = &item.detail {
            let _ = write!(out, "  {detail}");
        }
        out.push('\n');
    }
    out
}

pub fn workspace_symbols(query: &str, found: &[SymbolInformation], scope: &Path) -> String {
    let mut out = String::new();
    header(&mut out, &format!("Symbols \"{query}\""), found.len(), "match");
    for s in found {
        let _ = writeln!(out, "{} [{}] {}", s.name, s.kind, spot(&s.location, scope));
    }
    out
}

pub fn hovers(found: &[Hover], scope: &Path) -> String {
    let mut out = String::new();
    for (i, hover) in found.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        let _ = writeln!(out, "# {}", spot(&hover.location, scope));
        for line in &hover.lines {
            let _ = writeln!(out, "{line}");
        }
    }
    if found.is_empty() {
        out.push_str("# No documentation\n");
    }
    out
}

pub fn workspace_edit(edit: &WorkspaceEdit, scope: &Path) -> String {
    let mut out = String::new();
    let total: usize = edit.changes.values().map(Vec::len).sum();
    header(&mut out, "Rename", total, "edit");
    for (path, edits) in &edit.changes {
        let _ = writeln!(out, "{}", rel(path, scope));
        for e in edits {
            let _ = writeln!(
                out,
                "  {}:{}-{} -> {}",
                e.range.start.line + 1,
                e.range.start.column + 1,
                e.range.end.column + 1,
                e.new_text
            );
        }
    }
    out
}

pub fn lenses(path: &Path, found: &[CodeLens], scope: &Path) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# {}", rel(path, scope));
    let width = found.iter().map(|l| l.name.len()).max().unwrap_or(0);
    for lens in found {
        let plural = if lens.references == 1 { "" } else { "s" };
        let _ = writeln!(
            out,
            "L{:<5} {:width$}  {} reference{plural}",
            lens.range.start.line + 1,
            lens.name,
            lens.references
        );
    }
    out
}
