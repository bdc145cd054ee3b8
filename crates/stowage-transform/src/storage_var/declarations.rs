use super::{StorageVar, StorageVarLowering};
use crate::errors::{LoweringError, TransformError};
use stowage_core::{
    builder::TreeBuilder, AstContext, Mutability, NodeId, NodeKind, StructuralError, Type,
    Visibility,
};
use tracing::debug;

impl StorageVarLowering {
    pub(super) fn collect_catalog(
        &mut self,
        module: NodeId,
        ctx: &AstContext,
    ) -> Result<(), TransformError> {
        self.catalog.clear();
        let NodeKind::Module { body } = ctx.kind(module)? else {
            return Err(StructuralError::NotAModule(module).into());
        };

        for &decl in body {
            let NodeKind::VariableDecl {
                target,
                is_public,
                is_constant,
                is_immutable,
                ..
            } = ctx.kind(decl)?
            else {
                continue;
            };
            if *is_constant || *is_immutable {
                continue;
            }

            let name = ctx
                .try_node(*target)?
                .name()
                .ok_or_else(|| StructuralError::Inconsistent {
                    node: decl,
                    reason: "declaration target is not a name".to_string(),
                })?
                .to_string();
            let declared = ctx
                .ty(decl)
                .or_else(|| ctx.ty(*target))
                .cloned()
                .ok_or_else(|| LoweringError::MissingType {
                    var: name.clone(),
                    node: decl,
                })?;

            let var = StorageVar::new(&name, decl, declared, *is_public);
            self.catalog.insert(name, var);
        }
        Ok(())
    }

    /// Retypes a storage declaration to its slot type and synthesizes the getter of a public one.
    /// A declaration that already carries a slot type has been lowered and is left alone.
    pub(super) fn lower_declaration(
        &mut self,
        node: NodeId,
        module: NodeId,
        ctx: &mut AstContext,
    ) -> Result<(), TransformError> {
        let Some(var) = self.catalog.values().find(|v| v.decl == node).cloned() else {
            return Ok(());
        };
        if matches!(ctx.ty(node), Some(Type::Storage { .. })) {
            return Ok(());
        }

        let slot_ty = var.slot_type();
        ctx.set_ty(node, Some(slot_ty.clone()))?;
        if let NodeKind::VariableDecl { target, .. } = ctx.kind(node)? {
            let target = *target;
            ctx.set_ty(target, Some(slot_ty.clone()))?;
        }
        debug!(var = %var.name, slot = %var.slot_name(), ty = %slot_ty, "Retyped storage declaration");

        if var.is_public {
            self.synthesize_getter(&var, module, ctx)?;
        }
        Ok(())
    }

    fn synthesize_getter(
        &mut self,
        var: &StorageVar,
        module: NodeId,
        ctx: &mut AstContext,
    ) -> Result<NodeId, TransformError> {
        if let NodeKind::Module { body } = ctx.kind(module)? {
            let collides = body.iter().any(|id| {
                matches!(ctx.get(*id).map(|n| &n.kind),
                    Some(NodeKind::FunctionDef { name, .. }) if *name == var.name)
            });
            if collides {
                return Err(LoweringError::GetterCollision(var.name.clone()).into());
            }
        }

        let temp = ctx.alloc_temp(Some(var.value.clone()));
        let slot = self.slot_operand(ctx, var);
        let mut b = TreeBuilder::new(ctx);

        let mut args = Vec::with_capacity(var.keys.len());
        let mut key_refs = Vec::with_capacity(var.keys.len());
        for (i, key_ty) in var.keys.iter().enumerate() {
            let arg_name = format!("key{}", i);
            args.push(b.arg(&arg_name, key_ty.clone()));
            key_refs.push(b.name(&arg_name, Some(key_ty.clone())));
        }

        let read = b.storage_read(temp, slot, key_refs)?;
        let returned = b.name(&AstContext::temp_name(temp), Some(var.value.clone()));
        let ret = b.return_stmt(Some(returned))?;
        let getter = b.function(
            &var.name,
            args,
            vec![read, ret],
            Visibility::External,
            Mutability::View,
        )?;
        b.set_returns(getter, var.value.clone())?;
        ctx.append_declaration(module, getter)?;

        self.stats.getters += 1;
        debug!(var = %var.name, getter = %getter, keys = var.keys.len(), "Synthesized public getter");
        Ok(getter)
    }
}
