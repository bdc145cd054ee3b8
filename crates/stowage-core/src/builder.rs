use crate::{
    context::AstContext,
    node::{BinOpKind, BoolOpKind, CompareKind, NodeId, NodeKind, UnaryOpKind},
    types::{FunctionType, Mutability, Type, Visibility},
    Result,
};
use num_bigint::BigInt;

/// Fabricates well-formed nodes in an [`AstContext`].
///
/// Leaves are infallible. Composite constructors adopt their children and fail only when a child
/// is unknown or still owned by an attached parent.
pub struct TreeBuilder<'a> {
    ctx: &'a mut AstContext,
}

impl<'a> TreeBuilder<'a> {
    pub fn new(ctx: &'a mut AstContext) -> Self {
        Self { ctx }
    }

    pub fn ctx(&mut self) -> &mut AstContext {
        &mut *self.ctx
    }

    pub fn name(&mut self, id: &str, ty: Option<Type>) -> NodeId {
        self.ctx
            .alloc_leaf(NodeKind::Name { id: id.to_string() }, ty)
    }

    /// A fresh temporary named after its own identity.
    pub fn temp(&mut self, ty: Option<Type>) -> NodeId {
        self.ctx.alloc_temp(ty)
    }

    pub fn int(&mut self, value: impl Into<BigInt>) -> NodeId {
        self.ctx.alloc_leaf(
            NodeKind::Int {
                value: value.into(),
            },
            None,
        )
    }

    pub fn int_typed(&mut self, value: impl Into<BigInt>, ty: Type) -> NodeId {
        self.ctx.alloc_leaf(
            NodeKind::Int {
                value: value.into(),
            },
            Some(ty),
        )
    }

    pub fn bool_lit(&mut self, value: bool) -> NodeId {
        self.ctx
            .alloc_leaf(NodeKind::Bool { value }, Some(Type::Bool))
    }

    pub fn str_lit(&mut self, value: &str) -> NodeId {
        self.ctx.alloc_leaf(
            NodeKind::Str {
                value: value.to_string(),
            },
            Some(Type::String),
        )
    }

    pub fn pass_stmt(&mut self) -> NodeId {
        self.ctx.alloc_leaf(NodeKind::Pass, None)
    }

    pub fn arg(&mut self, name: &str, ty: Type) -> NodeId {
        self.ctx.alloc_leaf(
            NodeKind::Arg {
                name: name.to_string(),
            },
            Some(ty),
        )
    }

    pub fn attribute(&mut self, value: NodeId, attr: &str, ty: Option<Type>) -> Result<NodeId> {
        self.ctx.alloc(
            NodeKind::Attribute {
                value,
                attr: attr.to_string(),
            },
            ty,
        )
    }

    /// `self.<attr>`
    pub fn self_attr(&mut self, attr: &str, ty: Option<Type>) -> Result<NodeId> {
        let receiver = self.name("self", None);
        self.attribute(receiver, attr, ty)
    }

    pub fn subscript(&mut self, value: NodeId, slice: NodeId, ty: Option<Type>) -> Result<NodeId> {
        self.ctx.alloc(NodeKind::Subscript { value, slice }, ty)
    }

    /// `self.<attr>[k0][k1]...` with the value type at the outermost subscript.
    pub fn storage_index(
        &mut self,
        attr: &str,
        declared: &Type,
        keys: Vec<NodeId>,
    ) -> Result<NodeId> {
        let mut current = self.self_attr(attr, Some(declared.clone()))?;
        let mut level_ty = declared.clone();
        for key in keys {
            level_ty = match level_ty {
                Type::Mapping(_, value) => *value,
                other => other,
            };
            current = self.subscript(current, key, Some(level_ty.clone()))?;
        }
        Ok(current)
    }

    pub fn binop(
        &mut self,
        left: NodeId,
        op: BinOpKind,
        right: NodeId,
        ty: Option<Type>,
    ) -> Result<NodeId> {
        self.ctx.alloc(NodeKind::BinOp { left, op, right }, ty)
    }

    pub fn boolop(&mut self, op: BoolOpKind, values: Vec<NodeId>) -> Result<NodeId> {
        self.ctx
            .alloc(NodeKind::BoolOp { op, values }, Some(Type::Bool))
    }

    pub fn compare(&mut self, left: NodeId, op: CompareKind, right: NodeId) -> Result<NodeId> {
        self.ctx
            .alloc(NodeKind::Compare { left, op, right }, Some(Type::Bool))
    }

    pub fn unary(&mut self, op: UnaryOpKind, operand: NodeId, ty: Option<Type>) -> Result<NodeId> {
        self.ctx.alloc(NodeKind::UnaryOp { op, operand }, ty)
    }

    pub fn call(&mut self, func: &str, args: Vec<NodeId>, ty: Option<Type>) -> Result<NodeId> {
        let func = self.name(func, None);
        self.ctx.alloc(NodeKind::Call { func, args }, ty)
    }

    pub fn assign(&mut self, target: NodeId, value: NodeId) -> Result<NodeId> {
        self.ctx.alloc(NodeKind::Assign { target, value }, None)
    }

    pub fn aug_assign(&mut self, target: NodeId, op: BinOpKind, value: NodeId) -> Result<NodeId> {
        self.ctx
            .alloc(NodeKind::AugAssign { target, op, value }, None)
    }

    pub fn ann_assign(&mut self, target: NodeId, value: Option<NodeId>) -> Result<NodeId> {
        self.ctx.alloc(NodeKind::AnnAssign { target, value }, None)
    }

    pub fn return_stmt(&mut self, value: Option<NodeId>) -> Result<NodeId> {
        self.ctx.alloc(NodeKind::Return { value }, None)
    }

    pub fn expr_stmt(&mut self, value: NodeId) -> Result<NodeId> {
        self.ctx.alloc(NodeKind::Expr { value }, None)
    }

    pub fn expr_stmt_name(&mut self, name: &str) -> Result<NodeId> {
        let value = self.name(name, None);
        self.expr_stmt(value)
    }

    pub fn if_stmt(
        &mut self,
        test: NodeId,
        body: Vec<NodeId>,
        orelse: Vec<NodeId>,
    ) -> Result<NodeId> {
        self.ctx.alloc(NodeKind::If { test, body, orelse }, None)
    }

    pub fn for_stmt(&mut self, target: NodeId, iter: NodeId, body: Vec<NodeId>) -> Result<NodeId> {
        self.ctx.alloc(NodeKind::For { target, iter, body }, None)
    }

    pub fn assert_stmt(&mut self, test: NodeId) -> Result<NodeId> {
        self.ctx.alloc(NodeKind::Assert { test }, None)
    }

    pub fn storage_read(
        &mut self,
        target: NodeId,
        slot: NodeId,
        keys: Vec<NodeId>,
    ) -> Result<NodeId> {
        let ty = self.ctx.ty(target).cloned();
        self.ctx
            .alloc(NodeKind::StorageRead { target, slot, keys }, ty)
    }

    pub fn storage_write(
        &mut self,
        slot: NodeId,
        keys: Vec<NodeId>,
        value: NodeId,
    ) -> Result<NodeId> {
        let ty = self.ctx.ty(value).cloned();
        self.ctx
            .alloc(NodeKind::StorageWrite { slot, keys, value }, ty)
    }

    fn declaration(
        &mut self,
        name: &str,
        ty: Type,
        value: Option<NodeId>,
        flags: (bool, bool, bool),
    ) -> Result<NodeId> {
        let target = self.name(name, Some(ty.clone()));
        let (is_public, is_constant, is_immutable) = flags;
        self.ctx.alloc(
            NodeKind::VariableDecl {
                target,
                value,
                is_public,
                is_constant,
                is_immutable,
            },
            Some(ty),
        )
    }

    pub fn storage_decl(&mut self, name: &str, ty: Type, is_public: bool) -> Result<NodeId> {
        self.declaration(name, ty, None, (is_public, false, false))
    }

    pub fn constant_decl(&mut self, name: &str, ty: Type, value: NodeId) -> Result<NodeId> {
        self.declaration(name, ty, Some(value), (false, true, false))
    }

    pub fn immutable_decl(&mut self, name: &str, ty: Type, is_public: bool) -> Result<NodeId> {
        self.declaration(name, ty, None, (is_public, false, true))
    }

    /// The type annotation lists the argument types; use [`TreeBuilder::set_returns`] to add a
    /// return type.
    pub fn function(
        &mut self,
        name: &str,
        args: Vec<NodeId>,
        body: Vec<NodeId>,
        visibility: Visibility,
        mutability: Mutability,
    ) -> Result<NodeId> {
        let params = args
            .iter()
            .filter_map(|a| self.ctx.ty(*a).cloned())
            .collect();
        let ty = Type::Function(Box::new(FunctionType {
            params,
            returns: None,
            visibility,
            mutability,
        }));
        self.ctx.alloc(
            NodeKind::FunctionDef {
                name: name.to_string(),
                args,
                body,
                visibility,
                mutability,
            },
            Some(ty),
        )
    }

    pub fn set_returns(&mut self, func: NodeId, returns: Type) -> Result<()> {
        let node = self.ctx.try_node_mut(func)?;
        if let Some(Type::Function(ft)) = node.ty.as_mut() {
            ft.returns = Some(returns);
        }
        Ok(())
    }

    pub fn module(&mut self, body: Vec<NodeId>) -> Result<NodeId> {
        self.ctx.alloc(NodeKind::Module { body }, None)
    }
}
