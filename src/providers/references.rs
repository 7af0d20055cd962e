use super::{Context, Cursor, declaration_patterns, reference_patterns, soften};
use crate::document::Document;
use crate::error::AsmLensError;
use crate::grammar::WordMatch;
use crate::search::{self, Boundary, ReduceOptions};
use crate::types::{Location, Position};

/// Find references to the label under the cursor. Each location covers the
/// label's last dot-segment.
#[must_use]
pub fn references(
    ctx: &Context,
    doc: &Document,
    position: Position,
    include_declaration: bool,
) -> Vec<Location> {
    if !ctx.config.features.references {
        return Vec::new();
    }
    soften("references", find(ctx, doc, position, include_declaration))
}

/// Reference lookup without the feature switch, shared with rename and code lens.
pub(crate) fn find(
    ctx: &Context,
    doc: &Document,
    position: Position,
    include_declaration: bool,
) -> Result<Vec<Location>, AsmLensError> {
    let Some(cursor) = Cursor::at(doc, position, &ctx.config) else {
        return Ok(Vec::new());
    };
    let occurrences = reference_patterns(&cursor.word)?;
    let declarations = declaration_patterns(&ctx.config, &cursor.word, WordMatch::Exact)?;
    let candidates = search::search(&occurrences, &ctx.roots, &ctx.cancel)?;

    let reduction = search::reduce(
        &declarations,
        candidates,
        &cursor.origin(doc),
        ReduceOptions {
            include_declaration,
            unique_only: false,
            boundary: Boundary::Label,
        },
    );
    Ok(reduction.locations)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::testing::Fixture;

    fn lines(found: &[Location]) -> Vec<u32> {
        found.iter().map(|l| l.range.start.line).collect()
    }

    #[test]
    fn declaration_excluded_leaves_only_the_call() {
        let fx = Fixture::new(&[("a.asm", "foo: nop\n  call foo\n")]);
        let (ctx, doc) = fx.doc("a.asm");
        let found = references(&ctx, &doc, Position::new(0, 1), false);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].range, crate::types::Range::on_line(1, 7, 10));
    }

    #[test]
    fn declaration_included_on_request() {
        let fx = Fixture::new(&[("a.asm", "foo: nop\n  call foo\n")]);
        let (ctx, doc) = fx.doc("a.asm");
        let found = references(&ctx, &doc, Position::new(1, 8), true);
        assert_eq!(lines(&found), vec![0, 1]);
    }

    #[test]
    fn spans_files_and_skips_lookalikes() {
        let fx = Fixture::new(&[
            ("a.asm", "foo: nop\n  call food\n  call foo ; foo\n"),
            ("b.inc", "  jp foo\n  ld hl,foo_tab\n"),
            ("c.txt", "  jp foo\n"),
        ]);
        let (ctx, doc) = fx.doc("a.asm");
        let found = references(&ctx, &doc, Position::new(0, 0), false);
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].path, fx.path("a.asm"));
        assert_eq!(found[0].range.start.line, 2);
        assert_eq!(found[1].path, fx.path("b.inc"));
    }

    #[test]
    fn qualified_uses_count_for_the_plain_label() {
        let fx = Fixture::new(&[(
            "a.asm",
            "  MODULE gfx\ndraw:\n  ret\n  ENDMODULE\n  call gfx.draw\n",
        )]);
        let (ctx, doc) = fx.doc("a.asm");
        let found = references(&ctx, &doc, Position::new(1, 0), false);
        assert_eq!(lines(&found), vec![4]);
        assert_eq!(found[0].range.start.column, 11);
    }

    #[test]
    fn relative_references_stay_under_their_parent() {
        let fx = Fixture::new(&[(
            "a.asm",
            "one:\n.loop:\n  djnz .loop\ntwo:\n.loop:\n  djnz .loop\n",
        )]);
        let (ctx, doc) = fx.doc("a.asm");
        let found = references(&ctx, &doc, Position::new(2, 8), true);
        assert_eq!(lines(&found), vec![1, 2]);
    }

    #[test]
    fn excluded_word_has_no_references() {
        let fx = Fixture::new(&[
            ("asmlens.toml", "labels_excludes = [\"skip\"]\n"),
            ("a.asm", "skip: nop\n  jp skip\n"),
        ]);
        let (ctx, doc) = fx.doc("a.asm");
        assert!(references(&ctx, &doc, Position::new(1, 5), true).is_empty());
    }
}
