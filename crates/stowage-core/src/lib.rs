/*! Typed syntax trees that passes can rewrite in place.
 *
 * Contract state in the source language hides behind `self.x` attribute access, while the target
 * language only knows explicit storage reads and writes. Getting from one to the other means
 * editing a typed tree over and over without ever losing track of who owns which node. This crate
 * provides the arena that owns every node, the primitives that keep parent and child links in
 * agreement, and the visitor that passes use to walk the tree while they change it.
 */

pub mod builder;
pub mod context;
pub mod edit;
pub mod node;
pub mod persist;
pub mod search;
pub mod types;
pub mod visitor;

pub use context::AstContext;
pub use node::{BinOpKind, BoolOpKind, CompareKind, Node, NodeId, NodeKind, NodeTag, UnaryOpKind};
pub use persist::TreeDocument;
pub use types::{FunctionType, Mutability, Type, Visibility};
pub use visitor::{walk, Visitor};

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StructuralError {
    #[error("Node {0} is not registered in this compilation")]
    UnknownNode(NodeId),
    #[error("Node {0} is already registered")]
    DuplicateId(NodeId),
    #[error("Node {0} has no parent")]
    Detached(NodeId),
    #[error("Node {child} is not a child of its claimed parent {parent}")]
    NotAChild { child: NodeId, parent: NodeId },
    #[error("Node {child} is still owned by {owner}")]
    AlreadyOwned { child: NodeId, owner: NodeId },
    #[error("Statement {anchor} is not a direct statement of block {block}")]
    AnchorNotFound { anchor: NodeId, block: NodeId },
    #[error("Node {0} ({1:?}) does not hold a statement list")]
    NotABlock(NodeId, NodeTag),
    #[error("Node {0} is not a module")]
    NotAModule(NodeId),
    #[error("Inconsistent tree at node {node}: {reason}")]
    Inconsistent { node: NodeId, reason: String },
}

pub type Result<T> = std::result::Result<T, StructuralError>;

#[cfg(test)]
mod tests;
