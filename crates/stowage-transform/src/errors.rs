use stowage_core::{NodeId, StructuralError};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LoweringError {
    #[error(
        "Storage access `self.{var}` at node {node} supplies {found} of the {expected} keys its mapping declares"
    )]
    UnresolvedKeyChain {
        var: String,
        node: NodeId,
        expected: usize,
        found: usize,
    },

    #[error("Cannot assign into part of the value stored in `self.{var}` (node {node})")]
    UnsupportedTarget { var: String, node: NodeId },

    #[error("Public getter `{0}` collides with an existing function")]
    GetterCollision(String),

    #[error("Storage access `self.{var}` at node {node} is not inside a function body")]
    OutsideFunction { var: String, node: NodeId },

    #[error("Storage declaration `{var}` (node {node}) carries no type annotation")]
    MissingType { var: String, node: NodeId },
}

#[derive(Error, Debug)]
pub enum TransformError {
    #[error("Structural error: {0}")]
    Structural(#[from] StructuralError),

    #[error("Lowering error: {0}")]
    Lowering(#[from] LoweringError),

    #[error("Unknown pass key: {0}")]
    UnknownPass(String),

    #[error("Pass {pass} left the tree inconsistent: {source}")]
    Verification {
        pass: String,
        source: StructuralError,
    },
}
