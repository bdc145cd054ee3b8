use super::{StorageVar, StorageVarLowering};
use crate::errors::LoweringError;
use stowage_core::{AstContext, NodeId, NodeKind};

/// A complete access to one storage slot: `self.<var>` followed by exactly as many subscripts as
/// the variable has mapping levels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct SlotAccess {
    pub var: StorageVar,
    /// Outermost node covered by the access; this is what gets replaced.
    pub top: NodeId,
    /// The subscripts of the chain, innermost first, so their slices are the keys in source order.
    pub subscripts: Vec<NodeId>,
}

impl SlotAccess {
    pub fn keys(&self, ctx: &AstContext) -> Vec<NodeId> {
        self.subscripts
            .iter()
            .filter_map(|s| match ctx.kind(*s) {
                Ok(NodeKind::Subscript { slice, .. }) => Some(*slice),
                _ => None,
            })
            .collect()
    }
}

/// Subscripts from `node` down to the receiver of the chain, outermost first, and that receiver.
fn unwind_subscripts(ctx: &AstContext, node: NodeId) -> (Vec<NodeId>, NodeId) {
    let mut subscripts = Vec::new();
    let mut current = node;
    while let Ok(NodeKind::Subscript { value, .. }) = ctx.kind(current) {
        subscripts.push(current);
        current = *value;
    }
    (subscripts, current)
}

fn is_subscript_value(ctx: &AstContext, node: NodeId) -> bool {
    ctx.parent(node)
        .and_then(|p| ctx.get(p))
        .map(|p| matches!(p.kind, NodeKind::Subscript { value, .. } if value == node))
        .unwrap_or(false)
}

impl StorageVarLowering {
    /// The catalog entry named by `self.<attr>` at `node`, if any.
    pub(super) fn storage_receiver(&self, ctx: &AstContext, node: NodeId) -> Option<&StorageVar> {
        match ctx.kind(node).ok()? {
            NodeKind::Attribute { value, attr } => {
                let receiver = ctx.get(*value)?;
                if receiver.is_name("self") {
                    self.catalog.get(attr)
                } else {
                    None
                }
            }
            _ => None,
        }
    }

    /// The access whose outermost node is `node`, when `node` reads a storage slot.
    ///
    /// Subscripts beyond the mapping depth index the stored value and are not part of the access,
    /// so only the node at exactly the mapping depth qualifies. A chain that stops short of the
    /// depth is an error unless an enclosing subscript continues it.
    pub(super) fn access_at(
        &self,
        ctx: &AstContext,
        node: NodeId,
    ) -> Result<Option<SlotAccess>, LoweringError> {
        let (mut subscripts, receiver) = unwind_subscripts(ctx, node);
        let Some(var) = self.storage_receiver(ctx, receiver) else {
            return Ok(None);
        };
        let depth = var.depth();
        let found = subscripts.len();

        if found > depth {
            return Ok(None);
        }
        if found < depth {
            if is_subscript_value(ctx, node) {
                return Ok(None);
            }
            return Err(LoweringError::UnresolvedKeyChain {
                var: var.name.clone(),
                node,
                expected: depth,
                found,
            });
        }

        subscripts.reverse();
        Ok(Some(SlotAccess {
            var: var.clone(),
            top: node,
            subscripts,
        }))
    }

    /// The access named by an assignment target. Unlike reads, a target must name the slot
    /// itself: extra subscripts would write into part of a stored value.
    pub(super) fn target_access(
        &self,
        ctx: &AstContext,
        target: NodeId,
    ) -> Result<Option<SlotAccess>, LoweringError> {
        let (mut subscripts, receiver) = unwind_subscripts(ctx, target);
        let Some(var) = self.storage_receiver(ctx, receiver) else {
            return Ok(None);
        };
        let depth = var.depth();
        let found = subscripts.len();

        if found > depth {
            return Err(LoweringError::UnsupportedTarget {
                var: var.name.clone(),
                node: target,
            });
        }
        if found < depth {
            return Err(LoweringError::UnresolvedKeyChain {
                var: var.name.clone(),
                node: target,
                expected: depth,
                found,
            });
        }

        subscripts.reverse();
        Ok(Some(SlotAccess {
            var: var.clone(),
            top: target,
            subscripts,
        }))
    }

    /// First storage read at or below `root`, in pre-order.
    pub(super) fn first_access_within(
        &self,
        ctx: &AstContext,
        root: NodeId,
    ) -> Result<Option<SlotAccess>, LoweringError> {
        let mut stack = vec![root];
        while let Some(current) = stack.pop() {
            if let Some(access) = self.access_at(ctx, current)? {
                return Ok(Some(access));
            }
            let mut children = ctx.children(current);
            children.reverse();
            stack.extend(children);
        }
        Ok(None)
    }
}
