use super::{Context, references};
use crate::document::Document;
use crate::error::AsmLensError;
use crate::grammar::{is_label_text, last_segment};
use crate::types::{Position, TextEdit, WorkspaceEdit};

/// Rename the label under the cursor everywhere it is referenced,
/// declarations included. Only the searched segment is rewritten, so
/// `gfx.draw` stays qualified and renaming module `gfx` touches `gfx.` only.
///
/// An empty edit means nothing renameable was found or the feature is off.
pub fn rename(
    ctx: &Context,
    doc: &Document,
    position: Position,
    new_name: &str,
) -> Result<WorkspaceEdit, AsmLensError> {
    if !ctx.config.features.rename {
        return Ok(WorkspaceEdit::default());
    }
    if !is_label_text(new_name) {
        return Err(AsmLensError::InvalidQuery {
            query: new_name.to_string(),
            reason: "not a label name".to_string(),
        });
    }
    let replacement = last_segment(new_name);

    let locations = match references::find(ctx, doc, position, true) {
        Ok(found) => found,
        Err(AsmLensError::Cancelled) => return Ok(WorkspaceEdit::default()),
        Err(e) => return Err(e),
    };

    let mut edit = WorkspaceEdit::default();
    for location in locations {
        edit.changes.entry(location.path).or_default().push(TextEdit {
            range: location.range,
            new_text: replacement.to_string(),
        });
    }
    Ok(edit)
}
