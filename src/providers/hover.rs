use super::{Context, definition, soften};
use crate::comments;
use crate::document::Document;
use crate::error::AsmLensError;
use crate::types::{Hover, Position};

/// Hover: the documentation comments of every definition of the label
/// under the cursor. A definition without comments gives no hover.
#[must_use]
pub fn hover(ctx: &Context, doc: &Document, position: Position) -> Vec<Hover> {
    if !ctx.config.features.hover {
        return Vec::new();
    }
    soften("hover", find(ctx, doc, position))
}

fn find(ctx: &Context, doc: &Document, position: Position) -> Result<Vec<Hover>, AsmLensError> {
    let mut out = Vec::new();
    for location in definition::find(ctx, doc, position)? {
        ctx.cancel.check()?;
        let source = if location.path == doc.path {
            doc.clone()
        } else {
            match ctx.open(&location.path) {
                Ok(d) => d,
                Err(e) => {
                    tracing::debug!(path = %location.path.display(), error = %e, "hover source unreadable");
                    continue;
                }
            }
        };
        let lines = doc_comment(&source.lines, location.range.start.line as usize);
        if !lines.is_empty() {
            out.push(Hover { location, lines });
        }
    }
    Ok(out)
}

/// The run of full-line comments directly above `line`, then the trailing
/// comment of `line` itself. Markers removed.
fn doc_comment(lines: &[String], line: usize) -> Vec<String> {
    let above = lines[..line.min(lines.len())]
        .iter()
        .rev()
        .take_while(|l| comments::is_comment_line(l))
        .filter_map(|l| comments::line_comment(l))
        .collect::<Vec<_>>();

    let mut out: Vec<String> = above.into_iter().rev().map(str::to_string).collect();
    if let Some(trailing) = lines
        .get(line)
        .and_then(|l| comments::line_comment(l))
        .filter(|t| !t.is_empty())
    {
        out.push(trailing.to_string());
    }
    out
}
