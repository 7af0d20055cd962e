//! Document outline: a single pass over comment-stripped lines that tracks
//! MODULE/STRUCT/CA65 scopes and classifies every label as code, constant
//! or data.
//!
//! Per line, in priority order:
//! 1. label detection (independent of the rest; strips the label from the line)
//! 2. CA65 block directive, or its terminator
//! 3. MACRO declaration
//! 4. MODULE/STRUCT, or ENDMODULE/ENDS
//! 5. classification of pending labels from the remaining operand text
//!
//! Steps 2-5 are mutually exclusive: the first one that matches ends the line.

mod tree;

use regex::Captures;

use crate::comments;
use crate::config::Config;
use crate::grammar::CompiledPattern;
use crate::grammar::blocks;
use crate::grammar::labels::LabelMatcher;
use crate::types::{Dialect, Label, LabelKind, Position, Range, Symbol, SymbolKind};
use tree::{Arena, Node, NodeId};

/// Outline of raw document lines: strips comments, then scans.
pub fn outline<S: AsRef<str>>(lines: &[S], dialect: Dialect, config: &Config) -> Vec<Symbol> {
    scan(&comments::strip_all(lines), dialect, config)
}

/// Scan lines whose comments are already stripped.
pub fn scan<S: AsRef<str>>(lines: &[S], dialect: Dialect, config: &Config) -> Vec<Symbol> {
    let mut scanner = Scanner::new(dialect, config);
    for (n, line) in lines.iter().enumerate() {
        scanner.line(n as u32, line.as_ref());
    }
    scanner.finish(lines.len().saturating_sub(1) as u32, lines.last().map_or(0, |l| l.as_ref().len()))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FrameKind {
    Module,
    Struct,
    Ca65Block,
}

impl FrameKind {
    /// The frame kind a closing keyword ends.
    fn closed_by(keyword: &str) -> Self {
        if keyword.eq_ignore_ascii_case("endmodule") {
            Self::Module
        } else if keyword.eq_ignore_ascii_case("ends") {
            Self::Struct
        } else {
            Self::Ca65Block
        }
    }
}

/// An open MODULE/STRUCT/CA65 block. Anonymous CA65 blocks have no node.
#[derive(Debug)]
struct Frame {
    node: Option<NodeId>,
    kind: FrameKind,
}

struct Patterns {
    ca65_block: CompiledPattern,
    ca65_block_end: CompiledPattern,
    macro_decl: CompiledPattern,
    module_struct: CompiledPattern,
    end_module_struct: CompiledPattern,
    const_definition: CompiledPattern,
    data_definition: CompiledPattern,
}

struct Scanner {
    arena: Arena,
    labels: LabelMatcher,
    patterns: Patterns,
    nest_cheap_labels: bool,
    scope_stack: Vec<Frame>,
    /// Most recent absolute label: parent of `.relative` labels.
    relative_parent: Option<NodeId>,
    /// Labels still waiting for an operand line to classify them.
    pending: Vec<NodeId>,
    /// Kind given to a label before its operand is seen.
    default_kind: SymbolKind,
}

impl Scanner {
    fn new(dialect: Dialect, config: &Config) -> Self {
        Self {
            arena: Arena::default(),
            labels: LabelMatcher::new(config, dialect),
            patterns: Patterns {
                ca65_block: blocks::ca65_block(dialect),
                ca65_block_end: blocks::ca65_block_end(dialect),
                macro_decl: blocks::macro_decl(dialect),
                module_struct: blocks::module_struct(dialect),
                end_module_struct: blocks::end_module_struct(dialect),
                const_definition: blocks::const_definition(),
                data_definition: blocks::data_definition(),
            },
            nest_cheap_labels: config.nest_cheap_labels,
            scope_stack: Vec::new(),
            relative_parent: None,
            pending: Vec::new(),
            default_kind: SymbolKind::Function,
        }
    }

    /// Innermost named scope.
    fn scope_top(&self) -> Option<NodeId> {
        self.scope_stack.iter().rev().find_map(|f| f.node)
    }

    fn line(&mut self, n: u32, text: &str) {
        let line_range = Range::on_line(n, 0, text.len() as u32);

        // `rest` is what later steps see; `shift` maps its columns back onto `text`.
        let mut rest = text.to_string();
        let mut shift = 0i64;
        if let Some(label) = self.labels.find(text) {
            self.label(n, line_range, &label);
            let cut = label.end as usize + usize::from(label.trailing_colon);
            rest = format!(" {}", &text[cut..]);
            shift = cut as i64 - 1;
        }

        let selection = |caps: &Captures| {
            caps.name("name").map_or(line_range, |m| {
                Range::on_line(
                    n,
                    (m.start() as i64 + shift) as u32,
                    (m.end() as i64 + shift) as u32,
                )
            })
        };

        if let Some(caps) = self.patterns.ca65_block.regex().captures(&rest) {
            let keyword = caps.name("keyword").map_or("", |m| m.as_str());
            let node = match caps.name("name") {
                Some(m) => {
                    let node = Node::new(m.as_str(), SymbolKind::Method, line_range, selection(&caps));
                    let parent = self.scope_top();
                    Some(self.arena.attach(parent, node))
                }
                None => None,
            };
            if !blocks::is_non_block_directive(keyword) {
                self.scope_stack.push(Frame {
                    node,
                    kind: FrameKind::Ca65Block,
                });
            }
            self.pending.clear();
            return;
        }
        if let Some(caps) = self.patterns.ca65_block_end.regex().captures(&rest) {
            self.close_frame(n, text.len() as u32, FrameKind::closed_by(&caps["keyword"]));
            self.pending.clear();
            return;
        }

        if let Some(caps) = self.patterns.macro_decl.regex().captures(&rest) {
            // Macros always live at the document root.
            let node = Node::new(&caps["name"], SymbolKind::Method, line_range, selection(&caps));
            self.arena.attach(None, node);
            self.pending.clear();
            return;
        }

        if let Some(caps) = self.patterns.module_struct.regex().captures(&rest) {
            let is_struct = caps["keyword"].eq_ignore_ascii_case("struct");
            let (kind, frame_kind) = if is_struct {
                (SymbolKind::Struct, FrameKind::Struct)
            } else {
                (SymbolKind::Module, FrameKind::Module)
            };
            let node = Node::new(&caps["name"], kind, line_range, selection(&caps));
            let parent = self.scope_top();
            let id = self.arena.attach(parent, node);
            self.scope_stack.push(Frame {
                node: Some(id),
                kind: frame_kind,
            });
            self.relative_parent = None;
            self.pending.clear();
            return;
        }
        if let Some(caps) = self.patterns.end_module_struct.regex().captures(&rest) {
            self.close_frame(n, text.len() as u32, FrameKind::closed_by(&caps["keyword"]));
            self.relative_parent = None;
            self.pending.clear();
            return;
        }

        self.classify(rest.trim());
    }

    fn label(&mut self, n: u32, line_range: Range, label: &Label) {
        let node = Node::new(
            &label.text,
            self.default_kind,
            line_range,
            Range::on_line(n, label.start, label.end),
        );
        match label.kind {
            LabelKind::Absolute => {
                // A new absolute label closes the previous pending group.
                self.pending.clear();
                let parent = self.scope_top();
                let id = self.arena.attach(parent, node);
                self.relative_parent = Some(id);
                self.pending.push(id);
            }
            LabelKind::Relative => {
                let parent = self.relative_parent.or_else(|| self.scope_top());
                let id = self.arena.attach(parent, node);
                self.pending.push(id);
            }
            LabelKind::Cheap => {
                let parent = if self.nest_cheap_labels {
                    self.scope_top()
                } else {
                    None
                };
                let id = self.arena.attach(parent, node);
                self.pending.push(id);
            }
        }
    }

    fn classify(&mut self, operand: &str) {
        if operand.is_empty() {
            self.default_kind = SymbolKind::Function;
            return;
        }
        if self.pending.is_empty() {
            return;
        }

        let kind = if self.patterns.const_definition.is_match(operand) {
            SymbolKind::Constant
        } else if self.patterns.data_definition.is_match(operand) {
            SymbolKind::Field
        } else {
            SymbolKind::Function
        };

        for id in self.pending.drain(..) {
            let node = self.arena.node_mut(id);
            node.kind = kind;
            if kind != SymbolKind::Function {
                node.detail = Some(operand.to_string());
            }
        }
        self.default_kind = kind;
    }

    /// Pop the innermost frame if `kind` closes it, extending its range to
    /// this line. A closer that matches no open frame is ignored.
    fn close_frame(&mut self, n: u32, end_col: u32, kind: FrameKind) {
        match self.scope_stack.last() {
            Some(top) if top.kind == kind => {}
            top => {
                tracing::trace!(line = n, closer = ?kind, open = ?top.map(|f| f.kind), "unmatched closer");
                return;
            }
        }
        if let Some(Frame {
            node: Some(node), ..
        }) = self.scope_stack.pop()
        {
            self.arena.node_mut(node).range.end = Position::new(n, end_col);
        }
    }

    fn finish(mut self, last_line: u32, last_len: usize) -> Vec<Symbol> {
        while let Some(frame) = self.scope_stack.pop() {
            if let Some(node) = frame.node {
                self.arena.node_mut(node).range.end = Position::new(last_line, last_len as u32);
            }
        }
        self.arena.into_symbols()
    }
}

/// Frames still open after scanning `lines`.
#[cfg(test)]
fn open_frames<S: AsRef<str>>(lines: &[S]) -> usize {
    let config = Config::default();
    let mut scanner = Scanner::new(Dialect::Source, &config);
    for (n, line) in lines.iter().enumerate() {
        scanner.line(n as u32, line.as_ref());
    }
    scanner.scope_stack.len()
}
