use super::access::SlotAccess;
use super::StorageVarLowering;
use crate::errors::{LoweringError, TransformError};
use stowage_core::{builder::TreeBuilder, AstContext, NodeId, NodeKind};
use tracing::debug;

pub(super) fn slice_of(kind: &NodeKind) -> Option<NodeId> {
    match kind {
        NodeKind::Subscript { slice, .. } => Some(*slice),
        _ => None,
    }
}

impl StorageVarLowering {
    pub(super) fn lower_read_at(
        &mut self,
        node: NodeId,
        ctx: &mut AstContext,
    ) -> Result<(), TransformError> {
        let Some(access) = self.access_at(ctx, node)? else {
            return Ok(());
        };
        let (stmt, block) = statement_context(ctx, &access)?;
        self.lower_read(ctx, access, stmt, block)?;
        Ok(())
    }

    /// Lowers every storage read under the child of `parent` that `pick` selects, re-selecting
    /// after each rewrite because the child itself may be the access that gets replaced.
    pub(super) fn lower_reads_below(
        &mut self,
        ctx: &mut AstContext,
        parent: NodeId,
        pick: fn(&NodeKind) -> Option<NodeId>,
        stmt: NodeId,
        block: NodeId,
    ) -> Result<(), TransformError> {
        loop {
            let Some(root) = pick(ctx.kind(parent)?) else {
                return Ok(());
            };
            let Some(access) = self.first_access_within(ctx, root)? else {
                return Ok(());
            };
            self.lower_read(ctx, access, stmt, block)?;
        }
    }

    /// Hoists `temp = storage_read slot[keys]` in front of `stmt` and puts `temp` where the access
    /// was. Returns the temporary.
    pub(super) fn lower_read(
        &mut self,
        ctx: &mut AstContext,
        access: SlotAccess,
        stmt: NodeId,
        block: NodeId,
    ) -> Result<NodeId, TransformError> {
        for subscript in &access.subscripts {
            self.lower_reads_below(ctx, *subscript, slice_of, stmt, block)?;
        }

        let var = &access.var;
        let ty = ctx
            .ty(access.top)
            .cloned()
            .unwrap_or_else(|| var.value.clone());
        let temp = ctx.alloc_temp(Some(ty.clone()));
        let temp_name = AstContext::temp_name(temp);
        let reference = TreeBuilder::new(ctx).name(&temp_name, Some(ty));
        ctx.replace(access.top, reference)?;

        let keys = access.keys(ctx);
        let slot = self.slot_operand(ctx, var);
        let read = TreeBuilder::new(ctx).storage_read(temp, slot, keys)?;
        ctx.insert_before(read, stmt, block)?;
        ctx.discard(access.top)?;

        self.stats.reads += 1;
        debug!(
            var = %var.name,
            node = %access.top,
            temp = %temp_name,
            "Lowered storage read"
        );
        Ok(temp)
    }
}

/// The statement a rewrite of `access` hoists in front of, and the block holding it.
pub(super) fn statement_context(
    ctx: &AstContext,
    access: &SlotAccess,
) -> Result<(NodeId, NodeId), LoweringError> {
    let outside = || LoweringError::OutsideFunction {
        var: access.var.name.clone(),
        node: access.top,
    };
    let (stmt, block) = ctx.enclosing_statement(access.top).ok_or_else(outside)?;
    if matches!(ctx.kind(block), Ok(NodeKind::Module { .. })) {
        return Err(outside());
    }
    Ok((stmt, block))
}
