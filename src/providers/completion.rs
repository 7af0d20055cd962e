use std::collections::BTreeMap;

use super::{Context, declaration_patterns, declared_kind, is_declaration, soften};
use crate::document::Document;
use crate::error::AsmLensError;
use crate::grammar::WordMatch;
use crate::search;
use crate::types::{CompletionItem, Position};

/// Completion: every declared label, module or macro that fuzzy-matches the
/// text typed so far. One item per name, sorted by name.
#[must_use]
pub fn completions(ctx: &Context, doc: &Document, position: Position) -> Vec<CompletionItem> {
    if !ctx.config.features.completions {
        return Vec::new();
    }
    let prefix = doc.prefix_at(position);
    let typed = prefix.trim_start_matches(['.', '@']);
    if typed.chars().count() < ctx.config.completion_required_length {
        return Vec::new();
    }
    soften("completions", find(ctx, &prefix))
}

fn find(ctx: &Context, prefix: &str) -> Result<Vec<CompletionItem>, AsmLensError> {
    let patterns = declaration_patterns(&ctx.config, prefix, WordMatch::Fuzzy)?;
    let mut items: BTreeMap<String, CompletionItem> = BTreeMap::new();
    for c in search::search(&patterns, &ctx.roots, &ctx.cancel)? {
        if !is_declaration(&c, &ctx.config) {
            continue;
        }
        let detail = c
            .path
            .file_name()
            .map(|name| format!("{}:{}", name.to_string_lossy(), c.line + 1));
        let kind = declared_kind(&c);
        items.entry(c.text.clone()).or_insert_with(|| CompletionItem {
            label: c.text,
            kind,
            detail,
        });
    }
    Ok(items.into_values().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::testing::Fixture;
    use crate::types::SymbolKind;

    fn labels(items: &[CompletionItem]) -> Vec<&str> {
        items.iter().map(|i| i.label.as_str()).collect()
    }

    #[test]
    fn fuzzy_prefix_finds_declarations_everywhere() {
        let fx = Fixture::new(&[
            (
                "a.asm",
                "SetAndReturn:\n  ret\nSync: ret\nOther: ret\n  call sn\n",
            ),
            ("b.asm", "  MACRO snd_beep\n  ENDM\n"),
        ]);
        let (ctx, doc) = fx.doc("a.asm");
        let items = completions(&ctx, &doc, Position::new(4, 9));
        assert_eq!(labels(&items), vec!["SetAndReturn", "Sync", "snd_beep"]);
        let beep = items.iter().find(|i| i.label == "snd_beep").unwrap();
        assert_eq!(beep.kind, SymbolKind::Method);
        assert_eq!(beep.detail.as_deref(), Some("b.asm:1"));
    }

    #[test]
    fn duplicates_collapse_and_excluded_words_vanish() {
        let fx = Fixture::new(&[
            ("asmlens.toml", "labels_excludes = [\"drawx\"]\n"),
            ("a.asm", "draw: ret\ndrawx: ret\n  call dr\n"),
            ("b.asm", "draw: ret\n"),
        ]);
        let (ctx, doc) = fx.doc("a.asm");
        let items = completions(&ctx, &doc, Position::new(2, 9));
        assert_eq!(labels(&items), vec!["draw"]);
    }

    #[test]
    fn short_prefix_yields_nothing() {
        let fx = Fixture::new(&[
            ("asmlens.toml", "completion_required_length = 3\n"),
            ("a.asm", "draw: ret\n  call dr\n"),
        ]);
        let (ctx, doc) = fx.doc("a.asm");
        assert!(completions(&ctx, &doc, Position::new(1, 9)).is_empty());
    }
}
