#![allow(dead_code)]

use num_traits::ToPrimitive;
use std::collections::BTreeMap;
use stowage_core::{
    builder::TreeBuilder, AstContext, BinOpKind, Mutability, NodeId, NodeKind, Type, Visibility,
};

pub fn uint() -> Type {
    Type::Uint(256)
}

/// A small token: `total` and `balances` are public, `paused` is private.
///
/// ```text
/// def transfer(to: address, amount: uint256):
///     self.balances[msg_sender] -= amount
///     self.balances[to] += amount
///
/// def mint(to: address, amount: uint256):
///     self.total = self.total + amount
///     self.balances[to] = self.balances[to] + amount
/// ```
pub fn token_contract(ctx: &mut AstContext) -> NodeId {
    let balances_ty = Type::mapping(Type::Address, uint());
    let mut b = TreeBuilder::new(ctx);
    let total = b.storage_decl("total", uint(), true).unwrap();
    let balances = b.storage_decl("balances", balances_ty.clone(), true).unwrap();
    let paused = b.storage_decl("paused", Type::Bool, false).unwrap();

    let sender = b.name("msg_sender", Some(Type::Address));
    let from = b.storage_index("balances", &balances_ty, vec![sender]).unwrap();
    let amount = b.name("amount", Some(uint()));
    let debit = b.aug_assign(from, BinOpKind::Sub, amount).unwrap();
    let to = b.name("to", Some(Type::Address));
    let into = b.storage_index("balances", &balances_ty, vec![to]).unwrap();
    let amount = b.name("amount", Some(uint()));
    let credit = b.aug_assign(into, BinOpKind::Add, amount).unwrap();
    let to_arg = b.arg("to", Type::Address);
    let amount_arg = b.arg("amount", uint());
    let transfer = b
        .function(
            "transfer",
            vec![to_arg, amount_arg],
            vec![debit, credit],
            Visibility::External,
            Mutability::NonPayable,
        )
        .unwrap();

    let target = b.self_attr("total", Some(uint())).unwrap();
    let current = b.self_attr("total", Some(uint())).unwrap();
    let amount = b.name("amount", Some(uint()));
    let sum = b.binop(current, BinOpKind::Add, amount, Some(uint())).unwrap();
    let bump = b.assign(target, sum).unwrap();
    let to = b.name("to", Some(Type::Address));
    let target = b.storage_index("balances", &balances_ty, vec![to]).unwrap();
    let to = b.name("to", Some(Type::Address));
    let current = b.storage_index("balances", &balances_ty, vec![to]).unwrap();
    let amount = b.name("amount", Some(uint()));
    let sum = b.binop(current, BinOpKind::Add, amount, Some(uint())).unwrap();
    let credit = b.assign(target, sum).unwrap();
    let to_arg = b.arg("to", Type::Address);
    let amount_arg = b.arg("amount", uint());
    let mint = b
        .function(
            "mint",
            vec![to_arg, amount_arg],
            vec![bump, credit],
            Visibility::External,
            Mutability::NonPayable,
        )
        .unwrap();

    b.module(vec![total, balances, paused, transfer, mint])
        .unwrap()
}

pub fn function_named(ctx: &AstContext, module: NodeId, name: &str) -> Option<NodeId> {
    match ctx.kind(module).ok()? {
        NodeKind::Module { body } => body.iter().copied().find(|id| {
            matches!(ctx.get(*id).map(|n| &n.kind),
                Some(NodeKind::FunctionDef { name: n, .. }) if n == name)
        }),
        _ => None,
    }
}

pub fn body_of(ctx: &AstContext, func: NodeId) -> Vec<NodeId> {
    match ctx.kind(func).unwrap() {
        NodeKind::FunctionDef { body, .. } => body.clone(),
        other => panic!("expected a function, got {:?}", other.tag()),
    }
}

/// Reference interpreter for straight-line function bodies, before or after lowering.
///
/// Storage is keyed by variable name; a lowered slot name `x_STORAGE` addresses variable `x`.
/// Unwritten slots hold a value derived from their address so reads are distinguishable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Machine {
    pub storage: BTreeMap<(String, Vec<u64>), u64>,
    pub locals: BTreeMap<String, u64>,
}

enum Place {
    Local(String),
    Slot(String, Vec<u64>),
}

impl Machine {
    pub fn new(locals: &[(&str, u64)]) -> Self {
        Self {
            storage: BTreeMap::new(),
            locals: locals
                .iter()
                .map(|(name, value)| (name.to_string(), *value))
                .collect(),
        }
    }

    /// Locals the source program can name, without the temporaries lowering introduces.
    pub fn visible_locals(&self) -> BTreeMap<String, u64> {
        self.locals
            .iter()
            .filter(|(name, _)| !name.starts_with("__tmp_"))
            .map(|(name, value)| (name.clone(), *value))
            .collect()
    }

    pub fn run(&mut self, ctx: &AstContext, func: NodeId) {
        for stmt in body_of(ctx, func) {
            self.exec(ctx, stmt);
        }
    }

    fn load(&self, var: &str, keys: &[u64]) -> u64 {
        self.storage
            .get(&(var.to_string(), keys.to_vec()))
            .copied()
            .unwrap_or_else(|| initial_value(var, keys))
    }

    fn exec(&mut self, ctx: &AstContext, stmt: NodeId) {
        match ctx.kind(stmt).unwrap().clone() {
            NodeKind::Assign { target, value } => {
                let value = self.eval(ctx, value);
                let place = self.place(ctx, target);
                self.store(place, value);
            }
            NodeKind::AugAssign { target, op, value } => {
                let place = self.place(ctx, target);
                let current = match &place {
                    Place::Local(name) => self.locals[name],
                    Place::Slot(var, keys) => self.load(var, keys),
                };
                let operand = self.eval(ctx, value);
                self.store(place, apply(op, current, operand));
            }
            NodeKind::StorageRead { target, slot, keys } => {
                let keys: Vec<u64> = keys.iter().map(|k| self.eval(ctx, *k)).collect();
                let value = self.load(&slot_var(ctx, slot), &keys);
                let name = ctx.get(target).unwrap().name().unwrap().to_string();
                self.locals.insert(name, value);
            }
            NodeKind::StorageWrite { slot, keys, value } => {
                let keys: Vec<u64> = keys.iter().map(|k| self.eval(ctx, *k)).collect();
                let value = self.eval(ctx, value);
                self.storage.insert((slot_var(ctx, slot), keys), value);
            }
            NodeKind::Pass => {}
            other => panic!("interpreter does not run {:?}", other.tag()),
        }
    }

    fn place(&self, ctx: &AstContext, target: NodeId) -> Place {
        match ctx.kind(target).unwrap() {
            NodeKind::Name { id } => Place::Local(id.clone()),
            _ => {
                let (var, keys) = storage_path(ctx, target);
                let keys = keys.iter().map(|k| self.eval(ctx, *k)).collect();
                Place::Slot(var, keys)
            }
        }
    }

    fn store(&mut self, place: Place, value: u64) {
        match place {
            Place::Local(name) => {
                self.locals.insert(name, value);
            }
            Place::Slot(var, keys) => {
                self.storage.insert((var, keys), value);
            }
        }
    }

    fn eval(&self, ctx: &AstContext, id: NodeId) -> u64 {
        match ctx.kind(id).unwrap() {
            NodeKind::Int { value } => value.to_u64().unwrap(),
            NodeKind::Name { id } => *self
                .locals
                .get(id)
                .unwrap_or_else(|| panic!("unbound local {}", id)),
            NodeKind::Attribute { .. } | NodeKind::Subscript { .. } => {
                let (var, keys) = storage_path(ctx, id);
                let keys: Vec<u64> = keys.iter().map(|k| self.eval(ctx, *k)).collect();
                self.load(&var, &keys)
            }
            NodeKind::BinOp { left, op, right } => {
                apply(*op, self.eval(ctx, *left), self.eval(ctx, *right))
            }
            other => panic!("interpreter does not evaluate {:?}", other.tag()),
        }
    }
}

fn initial_value(var: &str, keys: &[u64]) -> u64 {
    let base = var.bytes().map(u64::from).sum::<u64>();
    keys.iter()
        .fold(base, |acc, k| acc.wrapping_mul(31).wrapping_add(*k))
}

fn apply(op: BinOpKind, left: u64, right: u64) -> u64 {
    match op {
        BinOpKind::Add => left.wrapping_add(right),
        BinOpKind::Sub => left.wrapping_sub(right),
        BinOpKind::Mult => left.wrapping_mul(right),
        BinOpKind::BitXor => left ^ right,
        other => panic!("interpreter does not apply {:?}", other),
    }
}

fn slot_var(ctx: &AstContext, slot: NodeId) -> String {
    let name = ctx.get(slot).unwrap().name().unwrap();
    name.strip_suffix("_STORAGE").unwrap_or(name).to_string()
}

/// `self.v[k0][k1]` to `("v", [k0, k1])`.
fn storage_path(ctx: &AstContext, node: NodeId) -> (String, Vec<NodeId>) {
    let mut keys = Vec::new();
    let mut current = node;
    while let NodeKind::Subscript { value, slice } = ctx.kind(current).unwrap() {
        keys.push(*slice);
        current = *value;
    }
    keys.reverse();
    match ctx.kind(current).unwrap() {
        NodeKind::Attribute { attr, .. } => (attr.clone(), keys),
        other => panic!("not a storage path: {:?}", other.tag()),
    }
}
