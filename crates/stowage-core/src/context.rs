use crate::{
    node::{Node, NodeId, NodeKind},
    types::Type,
    Result, StructuralError,
};
use indexmap::IndexMap;
use std::collections::HashMap;

/// Per-compilation owner of every node.
///
/// Identities come from a monotonic counter and are never handed out twice, so a node that is
/// discarded leaves a hole rather than a reusable slot. Parent and child links are stored as
/// identities, which keeps every edit an index rewrite.
#[derive(Debug, Default, Clone)]
pub struct AstContext {
    next_id: u32,
    nodes: IndexMap<NodeId, Node>,
    replacements: HashMap<NodeId, NodeId>,
}

impl AstContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resumes numbering after `next_id`, for trees that were numbered by the front end.
    pub fn with_next_id(next_id: u32) -> Self {
        Self {
            next_id,
            ..Self::default()
        }
    }

    pub fn reserve_id(&mut self) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        id
    }

    pub fn peek_next_id(&self) -> u32 {
        self.next_id
    }

    pub fn register(&mut self, node: Node) -> Result<NodeId> {
        let id = node.id;
        if self.nodes.contains_key(&id) {
            return Err(StructuralError::DuplicateId(id));
        }
        if id.0 >= self.next_id {
            self.next_id = id.0 + 1;
        }
        self.nodes.insert(id, node);
        Ok(id)
    }

    /// Creates a node and adopts every child named by `kind`.
    ///
    /// A child may be taken from a detached owner (that is how subtrees move between statements),
    /// but not from an owner that still lists it.
    pub fn alloc(&mut self, kind: NodeKind, ty: Option<Type>) -> Result<NodeId> {
        let children = kind.children();
        for child in &children {
            let child_node = self.try_node(*child)?;
            if let Some(owner) = child_node.parent {
                let still_listed = self
                    .nodes
                    .get(&owner)
                    .map(|o| o.kind.children().contains(child))
                    .unwrap_or(false);
                if still_listed && self.is_attached(owner) {
                    return Err(StructuralError::AlreadyOwned {
                        child: *child,
                        owner,
                    });
                }
            }
        }

        let id = self.reserve_id();
        let mut node = Node::new(id, kind);
        node.ty = ty;
        self.nodes.insert(id, node);
        for child in children {
            if let Some(child_node) = self.nodes.get_mut(&child) {
                child_node.parent = Some(id);
            }
        }
        Ok(id)
    }

    /// Registers a node that has no children, which cannot fail.
    pub fn alloc_leaf(&mut self, kind: NodeKind, ty: Option<Type>) -> NodeId {
        debug_assert!(kind.children().is_empty());
        let id = self.reserve_id();
        let mut node = Node::new(id, kind);
        node.ty = ty;
        self.nodes.insert(id, node);
        id
    }

    pub fn alloc_temp(&mut self, ty: Option<Type>) -> NodeId {
        let id = self.reserve_id();
        let mut node = Node::new(
            id,
            NodeKind::Name {
                id: Self::temp_name(id),
            },
        );
        node.ty = ty;
        self.nodes.insert(id, node);
        id
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn try_node(&self, id: NodeId) -> Result<&Node> {
        self.nodes.get(&id).ok_or(StructuralError::UnknownNode(id))
    }

    pub fn try_node_mut(&mut self, id: NodeId) -> Result<&mut Node> {
        self.nodes
            .get_mut(&id)
            .ok_or(StructuralError::UnknownNode(id))
    }

    pub fn kind(&self, id: NodeId) -> Result<&NodeKind> {
        Ok(&self.try_node(id)?.kind)
    }

    pub fn ty(&self, id: NodeId) -> Option<&Type> {
        self.nodes.get(&id).and_then(|n| n.ty.as_ref())
    }

    pub fn set_ty(&mut self, id: NodeId, ty: Option<Type>) -> Result<()> {
        self.try_node_mut(id)?.ty = ty;
        Ok(())
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(&id).and_then(|n| n.parent)
    }

    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        self.nodes
            .get(&id)
            .map(|n| n.kind.children())
            .unwrap_or_default()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// True when the node reaches a parentless root through links its ancestors agree with.
    pub fn is_attached(&self, id: NodeId) -> bool {
        let mut current = id;
        loop {
            let Some(node) = self.nodes.get(&current) else {
                return false;
            };
            match node.parent {
                None => return matches!(node.kind, NodeKind::Module { .. }),
                Some(parent) => {
                    let listed = self
                        .nodes
                        .get(&parent)
                        .map(|p| p.kind.children().contains(&current))
                        .unwrap_or(false);
                    if !listed {
                        return false;
                    }
                    current = parent;
                }
            }
        }
    }

    /// Drops a detached subtree. Descendants that were adopted by another node are kept.
    pub fn discard(&mut self, id: NodeId) -> Result<()> {
        let node = self.try_node(id)?;
        if let Some(parent) = node.parent {
            if self.kind(parent)?.children().contains(&id) && self.is_attached(parent) {
                return Err(StructuralError::AlreadyOwned { child: id, owner: parent });
            }
        }

        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let Some(node) = self.nodes.shift_remove(&current) else {
                continue;
            };
            for child in node.kind.children() {
                if self.parent(child) == Some(current) {
                    stack.push(child);
                }
            }
        }
        Ok(())
    }

    /// Clones a subtree with fresh identities. The copy is detached.
    pub fn deep_copy(&mut self, id: NodeId) -> Result<NodeId> {
        let node = self.try_node(id)?.clone();
        let mut kind = node.kind.clone();
        for child in node.kind.children() {
            let copy = self.deep_copy(child)?;
            kind.replace_child(child, copy);
        }
        self.alloc(kind, node.ty)
    }

    pub(crate) fn record_replacement(&mut self, old: NodeId, new: NodeId) {
        self.replacements.insert(old, new);
    }

    /// Follows the chain of `replace` calls starting at `id`.
    pub fn replacement_of(&self, id: NodeId) -> Option<NodeId> {
        let mut current = *self.replacements.get(&id)?;
        let mut hops = 0;
        while let Some(next) = self.replacements.get(&current) {
            current = *next;
            hops += 1;
            if hops > self.replacements.len() {
                break;
            }
        }
        Some(current)
    }

    pub fn temp_name(id: NodeId) -> String {
        format!("__tmp_{}", id.0)
    }

    /// Checks that every node reachable from `root` is registered and that child and parent
    /// links agree in both directions.
    pub fn verify(&self, root: NodeId) -> Result<()> {
        let root_node = self.try_node(root)?;
        if let Some(parent) = root_node.parent {
            return Err(StructuralError::Inconsistent {
                node: root,
                reason: format!("root has parent {}", parent),
            });
        }

        let mut stack = vec![root];
        let mut seen = std::collections::HashSet::new();
        while let Some(current) = stack.pop() {
            if !seen.insert(current) {
                return Err(StructuralError::Inconsistent {
                    node: current,
                    reason: "reachable through more than one path".to_string(),
                });
            }
            let node = self.try_node(current)?;
            for child in node.kind.children() {
                let child_node =
                    self.get(child)
                        .ok_or_else(|| StructuralError::Inconsistent {
                            node: current,
                            reason: format!("child {} is not registered", child),
                        })?;
                if child_node.parent != Some(current) {
                    return Err(StructuralError::Inconsistent {
                        node: child,
                        reason: format!(
                            "listed by {} but parent link is {:?}",
                            current, child_node.parent
                        ),
                    });
                }
                stack.push(child);
            }
        }
        Ok(())
    }

    pub fn clear(&mut self) {
        self.next_id = 0;
        self.nodes.clear();
        self.replacements.clear();
    }
}
