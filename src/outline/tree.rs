//! Index-based symbol arena. The scanner holds plain indices for its scope
//! stack, relative-label parent and pending labels; nested [`Symbol`]s are
//! only built once the whole document has been scanned.

use crate::types::{Range, Symbol, SymbolKind};

pub(crate) type NodeId = usize;

#[derive(Debug)]
pub(crate) struct Node {
    pub name: String,
    pub kind: SymbolKind,
    pub detail: Option<String>,
    pub range: Range,
    pub selection_range: Range,
    children: Vec<NodeId>,
}

impl Node {
    pub fn new(name: impl Into<String>, kind: SymbolKind, range: Range, selection_range: Range) -> Self {
        Self {
            name: name.into(),
            kind,
            detail: None,
            range,
            selection_range,
            children: Vec::new(),
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct Arena {
    nodes: Vec<Node>,
    roots: Vec<NodeId>,
}

impl Arena {
    /// Append `node` under `parent`, or at the document root.
    pub fn attach(&mut self, parent: Option<NodeId>, node: Node) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(node);
        match parent {
            Some(p) => self.nodes[p].children.push(id),
            None => self.roots.push(id),
        }
        id
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id]
    }

    pub fn into_symbols(self) -> Vec<Symbol> {
        let mut slots: Vec<Option<Node>> = self.nodes.into_iter().map(Some).collect();
        self.roots
            .iter()
            .filter_map(|&id| build(&mut slots, id))
            .collect()
    }
}

fn build(slots: &mut [Option<Node>], id: NodeId) -> Option<Symbol> {
    let node = slots.get_mut(id)?.take()?;
    let children = node
        .children
        .iter()
        .filter_map(|&child| build(slots, child))
        .collect();
    Some(Symbol {
        name: node.name,
        kind: node.kind,
        detail: node.detail,
        range: node.range,
        selection_range: node.selection_range,
        children,
    })
}
