use super::{Context, references};
use crate::document::Document;
use crate::outline;
use crate::types::{CodeLens, Symbol};

/// One lens per symbol declared in the document, counting its references
/// across the workspace (declarations not counted).
#[must_use]
pub fn code_lenses(ctx: &Context, doc: &Document) -> Vec<CodeLens> {
    if !ctx.config.features.code_lens {
        return Vec::new();
    }
    let tree = outline::outline(&doc.lines, doc.dialect, &ctx.config);
    let mut symbols = Vec::new();
    flatten(&tree, &mut symbols);

    let mut out = Vec::with_capacity(symbols.len());
    for symbol in symbols {
        if ctx.cancel.is_cancelled() {
            tracing::debug!(path = %doc.path.display(), "code lens cancelled");
            return Vec::new();
        }
        let at = symbol.selection_range.start;
        match references::find(ctx, doc, at, false) {
            Ok(found) => out.push(CodeLens {
                name: symbol.name.clone(),
                range: symbol.selection_range,
                references: found.len(),
            }),
            Err(e) => {
                tracing::debug!(symbol = %symbol.name, error = %e, "no lens");
                return Vec::new();
            }
        }
    }
    out
}

fn flatten<'a>(symbols: &'a [Symbol], out: &mut Vec<&'a Symbol>) {
    for s in symbols {
        out.push(s);
        flatten(&s.children, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cancel::CancelToken;
    use crate::providers::testing::Fixture;

    #[test]
    fn counts_references_per_declared_symbol() {
        let fx = Fixture::new(&[
            ("a.asm", "start:\n  call draw\n  call draw\ndraw:\n.loop: djnz .loop\n  ret\n"),
            ("b.asm", "  jp draw\n"),
        ]);
        let (ctx, doc) = fx.doc("a.asm");
        let lenses = code_lenses(&ctx, &doc);
        let counts: Vec<(&str, usize)> = lenses
            .iter()
            .map(|l| (l.name.as_str(), l.references))
            .collect();
        assert_eq!(counts, vec![("start", 0), ("draw", 3), (".loop", 1)]);
    }

    #[test]
    fn cancelled_request_has_no_lenses() {
        let fx = Fixture::new(&[("a.asm", "start:\n  jp start\n")]);
        let ctx = fx
            .workspace
            .context_for(&fx.path("a.asm"), CancelToken::new())
            .unwrap();
        let doc = ctx.open(&fx.path("a.asm")).unwrap();
        ctx.cancel.cancel();
        assert!(code_lenses(&ctx, &doc).is_empty());
    }
}
