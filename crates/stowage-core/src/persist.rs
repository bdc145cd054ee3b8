use crate::{context::AstContext, node::Node, node::NodeId};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::Path;

/// Flat exchange format for a typed tree: every node with its identity and parent link.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeDocument {
    pub root: NodeId,
    #[serde(default)]
    pub next_id: u32,
    pub nodes: Vec<Node>,
}

impl TreeDocument {
    /// Snapshot of the nodes reachable from `root`, in pre-order.
    pub fn capture(ctx: &AstContext, root: NodeId) -> crate::Result<Self> {
        let mut nodes = Vec::new();
        let mut stack = vec![root];
        while let Some(current) = stack.pop() {
            let node = ctx.try_node(current)?;
            let mut children = node.kind.children();
            children.reverse();
            stack.extend(children);
            nodes.push(node.clone());
        }
        Ok(Self {
            root,
            next_id: ctx.peek_next_id(),
            nodes,
        })
    }

    /// Rebuilds a context from the document and checks that the tree is consistent.
    pub fn into_context(self) -> crate::Result<(AstContext, NodeId)> {
        let mut ctx = AstContext::with_next_id(self.next_id);
        for node in self.nodes {
            ctx.register(node)?;
        }
        ctx.verify(self.root)?;
        Ok((ctx, self.root))
    }
}

fn invalid_data(err: impl std::fmt::Display) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, err.to_string())
}

pub fn tree_from_str(json: &str) -> io::Result<(AstContext, NodeId)> {
    let document: TreeDocument = serde_json::from_str(json).map_err(invalid_data)?;
    document.into_context().map_err(invalid_data)
}

pub fn tree_to_string(ctx: &AstContext, root: NodeId) -> io::Result<String> {
    let document = TreeDocument::capture(ctx, root).map_err(invalid_data)?;
    serde_json::to_string_pretty(&document).map_err(invalid_data)
}

pub fn load_tree(path: impl AsRef<Path>) -> io::Result<(AstContext, NodeId)> {
    let json = fs::read_to_string(path)?;
    tree_from_str(&json)
}

pub fn save_tree(ctx: &AstContext, root: NodeId, path: impl AsRef<Path>) -> io::Result<()> {
    let json = tree_to_string(ctx, root)?;
    fs::write(path, json)?;
    Ok(())
}
