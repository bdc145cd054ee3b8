use super::reads::{slice_of, statement_context};
use super::StorageVarLowering;
use crate::errors::TransformError;
use stowage_core::{builder::TreeBuilder, AstContext, NodeId, NodeKind};
use tracing::debug;

fn value_of(kind: &NodeKind) -> Option<NodeId> {
    match kind {
        NodeKind::Assign { value, .. } | NodeKind::AugAssign { value, .. } => Some(*value),
        _ => None,
    }
}

/// Keys that can be evaluated twice without changing the program.
fn is_trivial_key(ctx: &AstContext, key: NodeId) -> bool {
    matches!(
        ctx.kind(key),
        Ok(NodeKind::Name { .. } | NodeKind::Int { .. } | NodeKind::Bool { .. } | NodeKind::Str { .. })
    )
}

/// Takes `stmt` out of its block, leaving a placeholder in its position so its children can be
/// moved into new statements.
fn vacate(ctx: &mut AstContext, stmt: NodeId) -> Result<NodeId, TransformError> {
    let hole = TreeBuilder::new(ctx).pass_stmt();
    ctx.replace(stmt, hole)?;
    Ok(hole)
}

impl StorageVarLowering {
    /// `self.x[k] = e` becomes `t = e` followed by `storage_write x_STORAGE[k](t)`.
    pub(super) fn lower_assign(
        &mut self,
        node: NodeId,
        ctx: &mut AstContext,
    ) -> Result<(), TransformError> {
        let NodeKind::Assign { target, .. } = ctx.kind(node)? else {
            return Ok(());
        };
        let Some(access) = self.target_access(ctx, *target)? else {
            return Ok(());
        };
        let (stmt, block) = statement_context(ctx, &access)?;

        // Right-hand side first, then the keys of the target.
        self.lower_reads_below(ctx, node, value_of, stmt, block)?;
        for subscript in &access.subscripts {
            self.lower_reads_below(ctx, *subscript, slice_of, stmt, block)?;
        }

        let Some(value) = value_of(ctx.kind(node)?) else {
            return Ok(());
        };
        let keys = access.keys(ctx);
        let var = &access.var;
        let hole = vacate(ctx, node)?;

        let temp = ctx.alloc_temp(Some(var.value.clone()));
        let temp_name = AstContext::temp_name(temp);
        let slot = self.slot_operand(ctx, var);
        let mut b = TreeBuilder::new(ctx);
        let evaluate = b.assign(temp, value)?;
        let operand = b.name(&temp_name, Some(var.value.clone()));
        let write = b.storage_write(slot, keys, operand)?;

        ctx.replace(hole, write)?;
        ctx.insert_before(evaluate, write, block)?;
        ctx.discard(hole)?;
        ctx.discard(node)?;

        self.stats.writes += 1;
        debug!(var = %var.name, node = %node, temp = %temp_name, "Lowered storage write");
        Ok(())
    }

    /// `self.x[k] op= e` becomes a read of the slot, the combination in a second temporary, and a
    /// write of that temporary back to the same slot and keys.
    pub(super) fn lower_aug_assign(
        &mut self,
        node: NodeId,
        ctx: &mut AstContext,
    ) -> Result<(), TransformError> {
        let NodeKind::AugAssign { target, op, .. } = ctx.kind(node)? else {
            return Ok(());
        };
        let op = *op;
        let Some(access) = self.target_access(ctx, *target)? else {
            return Ok(());
        };
        let (stmt, block) = statement_context(ctx, &access)?;

        self.lower_reads_below(ctx, node, value_of, stmt, block)?;
        for subscript in &access.subscripts {
            self.lower_reads_below(ctx, *subscript, slice_of, stmt, block)?;
        }

        let Some(value) = value_of(ctx.kind(node)?) else {
            return Ok(());
        };
        let keys = access.keys(ctx);
        let var = &access.var;
        let hole = vacate(ctx, node)?;

        let mut read_keys = Vec::with_capacity(keys.len());
        let mut write_keys = Vec::with_capacity(keys.len());
        for key in keys {
            if is_trivial_key(ctx, key) {
                write_keys.push(ctx.deep_copy(key)?);
                read_keys.push(key);
                continue;
            }
            let key_ty = ctx.ty(key).cloned();
            let held = ctx.alloc_temp(key_ty.clone());
            let held_name = AstContext::temp_name(held);
            let mut b = TreeBuilder::new(ctx);
            let bind = b.assign(held, key)?;
            read_keys.push(b.name(&held_name, key_ty.clone()));
            write_keys.push(b.name(&held_name, key_ty));
            ctx.insert_before(bind, hole, block)?;
        }

        let ty = Some(var.value.clone());
        let current = ctx.alloc_temp(ty.clone());
        let combined = ctx.alloc_temp(ty.clone());
        let read_slot = self.slot_operand(ctx, var);
        let write_slot = self.slot_operand(ctx, var);

        let mut b = TreeBuilder::new(ctx);
        let read = b.storage_read(current, read_slot, read_keys)?;
        let current_ref = b.name(&AstContext::temp_name(current), ty.clone());
        let combination = b.binop(current_ref, op, value, ty.clone())?;
        let compute = b.assign(combined, combination)?;
        let combined_ref = b.name(&AstContext::temp_name(combined), ty);
        let write = b.storage_write(write_slot, write_keys, combined_ref)?;

        ctx.insert_before(read, hole, block)?;
        ctx.insert_before(compute, hole, block)?;
        ctx.replace(hole, write)?;
        ctx.discard(hole)?;
        ctx.discard(node)?;

        self.stats.aug_writes += 1;
        debug!(
            var = %var.name,
            node = %node,
            op = op.symbol(),
            "Lowered augmented storage write"
        );
        Ok(())
    }
}
