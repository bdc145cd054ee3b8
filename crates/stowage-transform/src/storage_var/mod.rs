/*! Storage variable lowering.
 *
 * Every non-constant, non-immutable module variable becomes a storage slot named
 * `<name>_STORAGE`. Accesses through `self` are rewritten into explicit slot operations:
 *
 * - a read of `self.x` or `self.m[a][b]` becomes a `StorageRead` into a fresh temporary, hoisted
 *   in front of the enclosing statement, and the expression is replaced by the temporary;
 * - `self.x = e` evaluates `e` into a temporary and then writes it with a `StorageWrite`;
 * - `self.x op= e` reads the slot, combines in a temporary and writes the result back;
 * - a public variable gains an external view getter with the variable's own name.
 *
 * Reads nested inside keys or right-hand sides are lowered first, so each hoisted statement only
 * ever refers to temporaries defined above it.
 */

mod access;
mod declarations;
mod reads;
mod writes;


use crate::errors::TransformError;
use crate::pipeline::TransformPass;
use indexmap::IndexMap;
use stowage_core::{walk, AstContext, NodeId, Type, Visitor};
use tracing::{debug, info};

/// A module variable that lives in a storage slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageVar {
    pub name: String,
    pub decl: NodeId,
    /// The type as written in the source, before the declaration was retyped to a slot.
    pub declared: Type,
    pub keys: Vec<Type>,
    pub value: Type,
    pub is_public: bool,
}

impl StorageVar {
    pub fn new(name: &str, decl: NodeId, declared: Type, is_public: bool) -> Self {
        let (keys, value) = match declared.storage_slot() {
            Type::Storage { keys, value } => (keys, *value),
            other => (Vec::new(), other),
        };
        Self {
            name: name.to_string(),
            decl,
            declared,
            keys,
            value,
            is_public,
        }
    }

    pub fn slot_name(&self) -> String {
        format!("{}_STORAGE", self.name)
    }

    pub fn slot_type(&self) -> Type {
        self.declared.storage_slot()
    }

    /// Number of subscripts a complete access applies to `self.<name>`.
    pub fn depth(&self) -> usize {
        self.keys.len()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoweringStats {
    pub reads: usize,
    pub writes: usize,
    pub aug_writes: usize,
    pub getters: usize,
}

#[derive(Debug, Default)]
pub struct StorageVarLowering {
    catalog: IndexMap<String, StorageVar>,
    stats: LoweringStats,
}

impl StorageVarLowering {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn catalog(&self) -> &IndexMap<String, StorageVar> {
        &self.catalog
    }

    pub fn stats(&self) -> LoweringStats {
        self.stats
    }

    fn slot_operand(&self, ctx: &mut AstContext, var: &StorageVar) -> NodeId {
        ctx.alloc_leaf(
            stowage_core::NodeKind::Name {
                id: var.slot_name(),
            },
            Some(var.slot_type()),
        )
    }
}

impl Visitor for StorageVarLowering {
    type Error = TransformError;

    fn visit_module(
        &mut self,
        node: NodeId,
        _module: NodeId,
        ctx: &mut AstContext,
    ) -> Result<(), TransformError> {
        self.collect_catalog(node, ctx)?;
        debug!(
            variables = self.catalog.len(),
            "Collected storage variables"
        );
        Ok(())
    }

    fn visit_variable_decl(
        &mut self,
        node: NodeId,
        module: NodeId,
        ctx: &mut AstContext,
    ) -> Result<(), TransformError> {
        self.lower_declaration(node, module, ctx)
    }

    fn visit_assign(
        &mut self,
        node: NodeId,
        _module: NodeId,
        ctx: &mut AstContext,
    ) -> Result<(), TransformError> {
        self.lower_assign(node, ctx)
    }

    fn visit_aug_assign(
        &mut self,
        node: NodeId,
        _module: NodeId,
        ctx: &mut AstContext,
    ) -> Result<(), TransformError> {
        self.lower_aug_assign(node, ctx)
    }

    fn visit_attribute(
        &mut self,
        node: NodeId,
        _module: NodeId,
        ctx: &mut AstContext,
    ) -> Result<(), TransformError> {
        self.lower_read_at(node, ctx)
    }

    fn visit_subscript(
        &mut self,
        node: NodeId,
        _module: NodeId,
        ctx: &mut AstContext,
    ) -> Result<(), TransformError> {
        self.lower_read_at(node, ctx)
    }
}

impl TransformPass for StorageVarLowering {
    fn key(&self) -> &'static str {
        "Sv"
    }

    fn name(&self) -> &'static str {
        "storage-var-lowering"
    }

    fn description(&self) -> &'static str {
        "Rewrites `self.<var>` accesses into explicit storage reads and writes"
    }

    fn run(&mut self, ctx: &mut AstContext, module: NodeId) -> Result<(), TransformError> {
        self.stats = LoweringStats::default();
        walk(self, module, ctx)?;
        info!(
            reads = self.stats.reads,
            writes = self.stats.writes,
            aug_writes = self.stats.aug_writes,
            getters = self.stats.getters,
            "Lowered storage accesses"
        );
        Ok(())
    }
}
