/*! Kind-keyed traversal for rewriting passes.
 *
 * A pass implements only the handlers it cares about. [`walk`] visits the tree in pre-order over
 * the child lists as they are at the moment each subtree is entered, so a pass can edit the tree
 * while it is being walked:
 *
 * - when a handler replaces the node it is visiting, the replacement is visited next;
 * - statements inserted before the traversal cursor are not visited;
 * - nodes appended beyond the cursor (for example a synthesized function at the end of the
 *   module) are visited when the cursor reaches them.
 *
 * The first handler error aborts the walk.
 */

use crate::{
    context::AstContext,
    node::{NodeId, NodeTag},
    StructuralError,
};

macro_rules! handlers {
    ($($method:ident),* $(,)?) => {
        $(
            fn $method(
                &mut self,
                node: NodeId,
                module: NodeId,
                ctx: &mut AstContext,
            ) -> Result<(), Self::Error> {
                let _ = (node, module, ctx);
                Ok(())
            }
        )*
    };
}

pub trait Visitor {
    type Error: From<StructuralError>;

    handlers!(
        visit_module,
        visit_variable_decl,
        visit_function_def,
        visit_arg,
        visit_assign,
        visit_aug_assign,
        visit_ann_assign,
        visit_return,
        visit_expr,
        visit_if,
        visit_for,
        visit_assert,
        visit_pass,
        visit_storage_read,
        visit_storage_write,
        visit_name,
        visit_attribute,
        visit_subscript,
        visit_binop,
        visit_boolop,
        visit_compare,
        visit_unaryop,
        visit_call,
        visit_int,
        visit_bool,
        visit_str,
    );
}

pub fn dispatch<V: Visitor + ?Sized>(
    visitor: &mut V,
    node: NodeId,
    module: NodeId,
    ctx: &mut AstContext,
) -> Result<(), V::Error> {
    let tag = ctx.try_node(node)?.tag();
    match tag {
        NodeTag::Module => visitor.visit_module(node, module, ctx),
        NodeTag::VariableDecl => visitor.visit_variable_decl(node, module, ctx),
        NodeTag::FunctionDef => visitor.visit_function_def(node, module, ctx),
        NodeTag::Arg => visitor.visit_arg(node, module, ctx),
        NodeTag::Assign => visitor.visit_assign(node, module, ctx),
        NodeTag::AugAssign => visitor.visit_aug_assign(node, module, ctx),
        NodeTag::AnnAssign => visitor.visit_ann_assign(node, module, ctx),
        NodeTag::Return => visitor.visit_return(node, module, ctx),
        NodeTag::Expr => visitor.visit_expr(node, module, ctx),
        NodeTag::If => visitor.visit_if(node, module, ctx),
        NodeTag::For => visitor.visit_for(node, module, ctx),
        NodeTag::Assert => visitor.visit_assert(node, module, ctx),
        NodeTag::Pass => visitor.visit_pass(node, module, ctx),
        NodeTag::StorageRead => visitor.visit_storage_read(node, module, ctx),
        NodeTag::StorageWrite => visitor.visit_storage_write(node, module, ctx),
        NodeTag::Name => visitor.visit_name(node, module, ctx),
        NodeTag::Attribute => visitor.visit_attribute(node, module, ctx),
        NodeTag::Subscript => visitor.visit_subscript(node, module, ctx),
        NodeTag::BinOp => visitor.visit_binop(node, module, ctx),
        NodeTag::BoolOp => visitor.visit_boolop(node, module, ctx),
        NodeTag::Compare => visitor.visit_compare(node, module, ctx),
        NodeTag::UnaryOp => visitor.visit_unaryop(node, module, ctx),
        NodeTag::Call => visitor.visit_call(node, module, ctx),
        NodeTag::Int => visitor.visit_int(node, module, ctx),
        NodeTag::Bool => visitor.visit_bool(node, module, ctx),
        NodeTag::Str => visitor.visit_str(node, module, ctx),
    }
}

pub fn walk<V: Visitor + ?Sized>(
    visitor: &mut V,
    module: NodeId,
    ctx: &mut AstContext,
) -> Result<(), V::Error> {
    if ctx.try_node(module)?.tag() != NodeTag::Module {
        return Err(StructuralError::NotAModule(module).into());
    }
    walk_node(visitor, module, module, ctx)?;
    Ok(())
}

/// Visits `node` and its subtree. Returns the identity that ended up in `node`'s position, or
/// `None` when the handler removed it without a replacement.
fn walk_node<V: Visitor + ?Sized>(
    visitor: &mut V,
    node: NodeId,
    module: NodeId,
    ctx: &mut AstContext,
) -> Result<Option<NodeId>, V::Error> {
    let mut current = node;
    loop {
        dispatch(visitor, current, module, ctx)?;
        if ctx.is_attached(current) {
            break;
        }
        match ctx.replacement_of(current) {
            Some(next) if ctx.is_attached(next) => current = next,
            _ => return Ok(None),
        }
    }

    let mut index = 0;
    loop {
        let children = ctx.children(current);
        let Some(&child) = children.get(index) else {
            break;
        };
        let next_sibling = children.get(index + 1).copied();

        let visited = walk_node(visitor, child, module, ctx)?;

        if !ctx.is_attached(current) {
            // A descendant's handler replaced this node; the replacement is not re-entered.
            return Ok(ctx.replacement_of(current));
        }

        let children = ctx.children(current);
        let position_of = |id: NodeId| children.iter().position(|c| *c == id);
        index = match visited.and_then(position_of) {
            Some(pos) => pos + 1,
            None => next_sibling.and_then(position_of).unwrap_or(children.len()),
        };
    }

    Ok(Some(current))
}
