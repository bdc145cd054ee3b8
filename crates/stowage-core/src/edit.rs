/*! In-place tree edits.
 *
 * Every primitive here leaves the tree consistent when it returns: the node that gains a position
 * points at its new parent, and the node that loses one is detached.
 */

use crate::{context::AstContext, node::NodeId, node::NodeKind, Result, StructuralError};

impl AstContext {
    /// Puts `new` where `old` is, in the same role. `old` ends up detached.
    pub fn replace(&mut self, old: NodeId, new: NodeId) -> Result<()> {
        let parent = self.try_node(old)?.parent.ok_or(StructuralError::Detached(old))?;
        self.ensure_movable(new, Some(old))?;

        let parent_node = self.try_node_mut(parent)?;
        if !parent_node.kind.replace_child(old, new) {
            return Err(StructuralError::NotAChild { child: old, parent });
        }

        self.try_node_mut(new)?.parent = Some(parent);
        self.try_node_mut(old)?.parent = None;
        self.record_replacement(old, new);
        Ok(())
    }

    pub fn insert_before(&mut self, new_stmt: NodeId, anchor: NodeId, block: NodeId) -> Result<()> {
        self.ensure_movable(new_stmt, None)?;

        let block_node = self.try_node_mut(block)?;
        let tag = block_node.kind.tag();
        let mut lists = block_node.kind.statement_lists_mut();
        if lists.is_empty() {
            return Err(StructuralError::NotABlock(block, tag));
        }

        let mut inserted = false;
        for list in lists.iter_mut() {
            if let Some(index) = list.iter().position(|s| *s == anchor) {
                list.insert(index, new_stmt);
                inserted = true;
                break;
            }
        }
        if !inserted {
            return Err(StructuralError::AnchorNotFound { anchor, block });
        }

        self.try_node_mut(new_stmt)?.parent = Some(block);
        Ok(())
    }

    pub fn append_declaration(&mut self, module: NodeId, decl: NodeId) -> Result<()> {
        self.ensure_movable(decl, None)?;

        match &mut self.try_node_mut(module)?.kind {
            NodeKind::Module { body } => body.push(decl),
            _ => return Err(StructuralError::NotAModule(module)),
        }
        self.try_node_mut(decl)?.parent = Some(module);
        Ok(())
    }

    /// The nearest node at or above `id` that sits directly in a statement list, paired with the
    /// owner of that list.
    pub fn enclosing_statement(&self, id: NodeId) -> Option<(NodeId, NodeId)> {
        let mut current = id;
        loop {
            let parent = self.parent(current)?;
            if self.get(parent)?.kind.holds_statement(current) {
                return Some((current, parent));
            }
            current = parent;
        }
    }

    /// A node may take a new position only if no attached owner still lists it. `leaving` is the
    /// node being vacated by the same edit, which may own the node that replaces it.
    fn ensure_movable(&self, id: NodeId, leaving: Option<NodeId>) -> Result<()> {
        let node = self.try_node(id)?;
        if let Some(owner) = node.parent {
            if Some(owner) == leaving {
                return Ok(());
            }
            let listed = self
                .get(owner)
                .map(|o| o.kind.children().contains(&id))
                .unwrap_or(false);
            if listed && self.is_attached(owner) {
                return Err(StructuralError::AlreadyOwned { child: id, owner });
            }
        }
        Ok(())
    }
}
