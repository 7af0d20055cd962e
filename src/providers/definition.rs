use super::{Context, Cursor, declaration_patterns, is_declaration, soften};
use crate::document::Document;
use crate::error::AsmLensError;
use crate::grammar::WordMatch;
use crate::search::{self, Boundary, ReduceOptions};
use crate::types::{Location, Position};

/// Go to definition: the best declaration of the label under the cursor,
/// followed by every other declaration that tied with it.
#[must_use]
pub fn definitions(ctx: &Context, doc: &Document, position: Position) -> Vec<Location> {
    if !ctx.config.features.definitions {
        return Vec::new();
    }
    soften("definitions", find(ctx, doc, position))
}

/// Definition lookup without the feature switch, shared with hover.
pub(crate) fn find(
    ctx: &Context,
    doc: &Document,
    position: Position,
) -> Result<Vec<Location>, AsmLensError> {
    let Some(cursor) = Cursor::at(doc, position, &ctx.config) else {
        return Ok(Vec::new());
    };
    let patterns = declaration_patterns(&ctx.config, &cursor.word, WordMatch::Exact)?;
    let candidates: Vec<_> = search::search(&patterns, &ctx.roots, &ctx.cancel)?
        .into_iter()
        .filter(|c| is_declaration(c, &ctx.config))
        .collect();

    let reduction = search::reduce(
        &patterns,
        candidates,
        &cursor.origin(doc),
        ReduceOptions {
            include_declaration: true,
            unique_only: true,
            boundary: Boundary::Label,
        },
    );
    let mut out = reduction.locations;
    out.extend(reduction.ambiguous);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::testing::Fixture;

    #[test]
    fn finds_label_in_other_file() {
        let fx = Fixture::new(&[
            ("main.asm", "start:\n  call print\n  ret\n"),
            ("lib/io.asm", "; print a char\nprint:\n  rst 16\n  ret\n"),
        ]);
        let (ctx, doc) = fx.doc("main.asm");
        let found = definitions(&ctx, &doc, Position::new(1, 8));
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].path, fx.path("lib/io.asm"));
        assert_eq!(found[0].range.start, Position::new(1, 0));
    }

    #[test]
    fn relative_label_resolves_under_its_parent() {
        let fx = Fixture::new(&[(
            "a.asm",
            "first:\n.loop: djnz .loop\nsecond:\n.loop:\n  djnz .loop\n",
        )]);
        let (ctx, doc) = fx.doc("a.asm");
        let found = definitions(&ctx, &doc, Position::new(4, 9));
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].range.start.line, 3);
    }

    #[test]
    fn module_and_macro_names_are_definitions() {
        let fx = Fixture::new(&[(
            "a.asm",
            "  MACRO push_all\n  ENDM\n  MODULE gfx\n  ENDMODULE\n  push_all\n  call gfx.draw\n",
        )]);
        let (ctx, doc) = fx.doc("a.asm");
        let found = definitions(&ctx, &doc, Position::new(4, 4));
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].range.start.line, 0);
        assert_eq!(found[0].range.start.column, 8);
    }

    #[test]
    fn same_file_declaration_wins_and_ties_follow() {
        let fx = Fixture::new(&[
            ("a.asm", "draw:\n  ret\n  call draw\n"),
            ("b.asm", "draw:\n  ret\n"),
        ]);
        let (ctx, doc) = fx.doc("a.asm");
        let found = definitions(&ctx, &doc, Position::new(2, 8));
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].path, fx.path("a.asm"));

        let (ctx, doc) = fx.doc("b.asm");
        let found = definitions(&ctx, &doc, Position::new(0, 1));
        assert_eq!(found[0].path, fx.path("b.asm"));
    }

    #[test]
    fn ambiguity_across_other_files_is_reported() {
        let fx = Fixture::new(&[
            ("a.asm", "draw:\n  ret\n"),
            ("b.asm", "draw:\n  ret\n"),
            ("main.asm", "  call draw\n"),
        ]);
        let (ctx, doc) = fx.doc("main.asm");
        let found = definitions(&ctx, &doc, Position::new(0, 8));
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].path, fx.path("a.asm"));
        assert_eq!(found[1].path, fx.path("b.asm"));
    }

    #[test]
    fn disabled_feature_and_cancellation_yield_nothing() {
        let fx = Fixture::new(&[
            ("asmlens.toml", "[features]\ndefinitions = false\n"),
            ("a.asm", "draw:\n  call draw\n"),
        ]);
        let (ctx, doc) = fx.doc("a.asm");
        assert!(definitions(&ctx, &doc, Position::new(1, 8)).is_empty());

        let fx = Fixture::new(&[("a.asm", "draw:\n  call draw\n")]);
        let (ctx, doc) = fx.doc("a.asm");
        ctx.cancel.cancel();
        assert!(definitions(&ctx, &doc, Position::new(1, 8)).is_empty());
    }

    #[test]
    fn commented_declarations_are_ignored() {
        let fx = Fixture::new(&[("a.asm", "; draw: old\n/*\ndraw:\n*/\ndraw:\n  call draw\n")]);
        let (ctx, doc) = fx.doc("a.asm");
        let found = definitions(&ctx, &doc, Position::new(5, 8));
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].range.start.line, 4);
    }
}
