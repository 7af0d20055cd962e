//! Block-shaped directives: MODULE/STRUCT, MACRO, CA65 `.proc`-style blocks,
//! and the operand shapes that classify a label as constant or data.

use std::sync::LazyLock;

use super::{CompiledPattern, IDENT, WordMatch, label_body};
use crate::error::AsmLensError;
use crate::types::Dialect;

const CA65_OPEN: &str = r"\.(?:proc|scope|struct|union|enum|macro|mac|define)";
const CA65_CLOSE: &str = r"\.(?:endproc|endscope|endstruct|endunion|endenum|endmacro|endmac)";
const DATA_DIRECTIVES: &str = "defb|defw|defd|defs|defm|db|dw|dd|ds|dm|byte|word|dword|block|res|asciiz|ascii|addr|dbyte|faraddr|lobytes|hibytes|incbin";

/// Keywords that can sit at column 0 but never declare a label.
const RESERVED: &[&str] = &[
    "module", "endmodule", "struct", "ends", "macro", "endm", "equ", "defl", "proc",
    "endproc", "scope", "endscope", "endstruct", "union", "endunion", "enum", "endenum",
    "endmacro", "mac", "endmac", "define",
];

/// Source lines need the keyword as first token; listing lines may carry any
/// column prefix as long as whitespace separates it from the keyword.
fn lead(dialect: Dialect) -> &'static str {
    match dialect {
        Dialect::Source => r"^(?P<pre>\s*)",
        Dialect::Listing => r"^(?P<pre>(?:.*?\s)?)",
    }
}

fn opener(dialect: Dialect, keyword: &str) -> CompiledPattern {
    CompiledPattern::fixed(&format!(
        r"{}(?P<keyword>{keyword})\s+(?P<name>[.@]?{IDENT})",
        lead(dialect)
    ))
}

/// CA65 scopes, enums, structs and unions may be anonymous.
fn optional_name_opener(dialect: Dialect, keyword: &str) -> CompiledPattern {
    CompiledPattern::fixed(&format!(
        r"{}(?P<keyword>{keyword})(?:\s+(?P<name>[.@]?{IDENT}))?(?:[^\w.]|$)",
        lead(dialect)
    ))
}

fn closer(dialect: Dialect, keyword: &str) -> CompiledPattern {
    CompiledPattern::fixed(&format!(r"{}(?P<keyword>{keyword})(?:[^\w.]|$)", lead(dialect)))
}

struct PerDialect {
    source: LazyLock<CompiledPattern>,
    listing: LazyLock<CompiledPattern>,
}

impl PerDialect {
    fn get(&self, dialect: Dialect) -> CompiledPattern {
        match dialect {
            Dialect::Source => (*self.source).clone(),
            Dialect::Listing => (*self.listing).clone(),
        }
    }
}

static MODULE_STRUCT: PerDialect = PerDialect {
    source: LazyLock::new(|| opener(Dialect::Source, "MODULE|STRUCT")),
    listing: LazyLock::new(|| opener(Dialect::Listing, "MODULE|STRUCT")),
};

static END_MODULE_STRUCT: PerDialect = PerDialect {
    source: LazyLock::new(|| closer(Dialect::Source, "ENDMODULE|ENDS")),
    listing: LazyLock::new(|| closer(Dialect::Listing, "ENDMODULE|ENDS")),
};

static MACRO: PerDialect = PerDialect {
    source: LazyLock::new(|| opener(Dialect::Source, "MACRO")),
    listing: LazyLock::new(|| opener(Dialect::Listing, "MACRO")),
};

static CA65_BLOCK: PerDialect = PerDialect {
    source: LazyLock::new(|| optional_name_opener(Dialect::Source, CA65_OPEN)),
    listing: LazyLock::new(|| optional_name_opener(Dialect::Listing, CA65_OPEN)),
};

static CA65_BLOCK_END: PerDialect = PerDialect {
    source: LazyLock::new(|| closer(Dialect::Source, CA65_CLOSE)),
    listing: LazyLock::new(|| closer(Dialect::Listing, CA65_CLOSE)),
};

static CONST_DEFINITION: LazyLock<CompiledPattern> =
    LazyLock::new(|| CompiledPattern::fixed(r"^\s*(?:(?:\.?equ|defl|\.set)(?:\s|$)|:?=)"));

static DATA_DEFINITION: LazyLock<CompiledPattern> = LazyLock::new(|| {
    CompiledPattern::fixed(&format!(r"^\s*\.?(?:{DATA_DIRECTIVES})(?:\s|$)"))
});

/// `MODULE name` or `STRUCT name`.
#[must_use]
pub fn module_struct(dialect: Dialect) -> CompiledPattern {
    MODULE_STRUCT.get(dialect)
}

/// `ENDMODULE` or `ENDS`.
#[must_use]
pub fn end_module_struct(dialect: Dialect) -> CompiledPattern {
    END_MODULE_STRUCT.get(dialect)
}

/// `MACRO name`.
#[must_use]
pub fn macro_decl(dialect: Dialect) -> CompiledPattern {
    MACRO.get(dialect)
}

/// CA65 `.proc`, `.scope`, `.struct`, `.union`, `.enum`, `.macro`/`.mac`, `.define`.
/// The `name` group is absent for an anonymous block.
#[must_use]
pub fn ca65_block(dialect: Dialect) -> CompiledPattern {
    CA65_BLOCK.get(dialect)
}

/// CA65 block terminators.
#[must_use]
pub fn ca65_block_end(dialect: Dialect) -> CompiledPattern {
    CA65_BLOCK_END.get(dialect)
}

/// Operand text that makes the preceding label a constant.
#[must_use]
pub fn const_definition() -> CompiledPattern {
    CONST_DEFINITION.clone()
}

/// Operand text that makes the preceding label data.
#[must_use]
pub fn data_definition() -> CompiledPattern {
    DATA_DEFINITION.clone()
}

/// `.define` declares a name but never opens a body.
#[must_use]
pub fn is_non_block_directive(keyword: &str) -> bool {
    keyword.eq_ignore_ascii_case(".define")
}

#[must_use]
pub fn is_directive_keyword(word: &str) -> bool {
    RESERVED.iter().any(|k| k.eq_ignore_ascii_case(word))
        || DATA_DIRECTIVES
            .split('|')
            .any(|k| k.eq_ignore_ascii_case(word))
}

fn word_opener(
    dialect: Dialect,
    keyword: &str,
    word: &str,
    mode: WordMatch,
) -> Result<CompiledPattern, AsmLensError> {
    let body = label_body(word, mode);
    CompiledPattern::new(&format!(
        r"{}(?P<keyword>{keyword})\s+(?P<name>{body})(?:[^\w.]|$)",
        lead(dialect)
    ))
}

/// Every MODULE/STRUCT declaration whose name matches `word`.
pub fn every_module_for_word(
    word: &str,
    mode: WordMatch,
    dialect: Dialect,
) -> Result<CompiledPattern, AsmLensError> {
    word_opener(dialect, "MODULE|STRUCT", word, mode)
}

/// Every MACRO declaration whose name matches `word`.
pub fn every_macro_for_word(
    word: &str,
    mode: WordMatch,
    dialect: Dialect,
) -> Result<CompiledPattern, AsmLensError> {
    word_opener(dialect, "MACRO", word, mode)
}

/// Every CA65 block directive whose name matches `word`.
pub fn every_ca65_block_for_word(
    word: &str,
    mode: WordMatch,
    dialect: Dialect,
) -> Result<CompiledPattern, AsmLensError> {
    word_opener(dialect, CA65_OPEN, word, mode)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cap(p: &CompiledPattern, line: &str, group: &str) -> Option<String> {
        p.regex()
            .captures(line)
            .and_then(|c| c.name(group).map(|m| m.as_str().to_string()))
    }

    #[test]
    fn module_and_struct_openers() {
        let p = module_struct(Dialect::Source);
        assert_eq!(cap(&p, "  MODULE foo", "name").as_deref(), Some("foo"));
        assert_eq!(cap(&p, "struct point", "keyword").as_deref(), Some("struct"));
        assert_eq!(cap(&p, "  ld a, MODULE foo", "name"), None);
    }

    #[test]
    fn listing_module_allows_column_prefix() {
        let p = module_struct(Dialect::Listing);
        assert_eq!(
            cap(&p, "  12  0000            MODULE gfx", "name").as_deref(),
            Some("gfx")
        );
    }

    #[test]
    fn end_keywords_are_whole_words() {
        let p = end_module_struct(Dialect::Source);
        assert!(p.is_match("ENDMODULE"));
        assert!(p.is_match("  ends ; done"));
        assert!(!p.is_match("  endsection"));
    }

    #[test]
    fn macro_declaration() {
        let p = macro_decl(Dialect::Source);
        assert_eq!(cap(&p, " MACRO add16 a,b", "name").as_deref(), Some("add16"));
    }

    #[test]
    fn ca65_blocks_and_terminators() {
        let open = ca65_block(Dialect::Source);
        assert_eq!(cap(&open, ".proc main", "name").as_deref(), Some("main"));
        assert_eq!(cap(&open, "  .macro ldax arg", "keyword").as_deref(), Some(".macro"));
        assert_eq!(cap(&open, "  .mac inc16 addr", "keyword").as_deref(), Some(".mac"));
        assert!(is_non_block_directive(&cap(&open, ".define SCREEN $0400", "keyword").unwrap()));
        let close = ca65_block_end(Dialect::Source);
        assert!(close.is_match(".endproc"));
        assert!(close.is_match("  .endmacro"));
        assert!(!close.is_match(".endprocx"));
    }

    #[test]
    fn anonymous_ca65_blocks_still_open() {
        let open = ca65_block(Dialect::Source);
        assert_eq!(cap(&open, "  .enum", "keyword").as_deref(), Some(".enum"));
        assert_eq!(cap(&open, "  .enum", "name"), None);
        assert_eq!(cap(&open, ".scope  ", "keyword").as_deref(), Some(".scope"));
        assert_eq!(cap(&open, ".enum colors", "name").as_deref(), Some("colors"));
        assert!(!open.is_match(".procx"));
        assert!(!open.is_match(".enumerate"));
    }

    #[test]
    fn operand_classification() {
        assert!(const_definition().is_match(" EQU 5"));
        assert!(const_definition().is_match(" = $10"));
        assert!(const_definition().is_match(" .set 3"));
        // Z80 `set b,r` is an instruction.
        assert!(!const_definition().is_match(" set 3,a"));
        assert!(!const_definition().is_match(" equal"));
        assert!(data_definition().is_match("  defb 1,2,3"));
        assert!(data_definition().is_match(" .byte $00"));
        assert!(!data_definition().is_match(" dbg_trace"));
        assert!(!data_definition().is_match(" ld a,5"));
    }

    #[test]
    fn directive_keywords() {
        assert!(is_directive_keyword("ENDMODULE"));
        assert!(is_directive_keyword("defb"));
        assert!(is_directive_keyword("proc"));
        assert!(!is_directive_keyword("set"));
        assert!(!is_directive_keyword("start"));
    }

    #[test]
    fn word_openers_match_exact_names_only() {
        let p = every_module_for_word("gfx", WordMatch::Exact, Dialect::Source).unwrap();
        assert!(p.is_match("MODULE gfx"));
        assert!(!p.is_match("MODULE gfxlib"));
        let p = every_macro_for_word("ad", WordMatch::Fuzzy, Dialect::Source).unwrap();
        assert!(p.is_match("  MACRO add16"));
        let p = every_ca65_block_for_word("main", WordMatch::Exact, Dialect::Source).unwrap();
        assert!(p.is_match(".proc main"));
    }
}
