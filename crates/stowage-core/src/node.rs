use crate::types::{Mutability, Type, Visibility};
use num_bigint::BigInt;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u32);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    #[serde(rename = "node_id")]
    pub id: NodeId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<NodeId>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub ty: Option<Type>,
    #[serde(flatten)]
    pub kind: NodeKind,
}

impl Node {
    pub fn new(id: NodeId, kind: NodeKind) -> Self {
        Self {
            id,
            parent: None,
            ty: None,
            kind,
        }
    }

    pub fn tag(&self) -> NodeTag {
        self.kind.tag()
    }

    pub fn is_name(&self, name: &str) -> bool {
        matches!(&self.kind, NodeKind::Name { id } if id == name)
    }

    pub fn name(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Name { id } => Some(id),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "ast_type")]
pub enum NodeKind {
    Module {
        body: Vec<NodeId>,
    },
    VariableDecl {
        target: NodeId,
        #[serde(default)]
        value: Option<NodeId>,
        #[serde(default)]
        is_public: bool,
        #[serde(default)]
        is_constant: bool,
        #[serde(default)]
        is_immutable: bool,
    },
    FunctionDef {
        name: String,
        args: Vec<NodeId>,
        body: Vec<NodeId>,
        visibility: Visibility,
        mutability: Mutability,
    },
    Arg {
        name: String,
    },
    Assign {
        target: NodeId,
        value: NodeId,
    },
    AugAssign {
        target: NodeId,
        op: BinOpKind,
        value: NodeId,
    },
    AnnAssign {
        target: NodeId,
        #[serde(default)]
        value: Option<NodeId>,
    },
    Return {
        #[serde(default)]
        value: Option<NodeId>,
    },
    Expr {
        value: NodeId,
    },
    If {
        test: NodeId,
        body: Vec<NodeId>,
        #[serde(default)]
        orelse: Vec<NodeId>,
    },
    For {
        target: NodeId,
        iter: NodeId,
        body: Vec<NodeId>,
    },
    Assert {
        test: NodeId,
    },
    Pass,
    StorageRead {
        target: NodeId,
        slot: NodeId,
        keys: Vec<NodeId>,
    },
    StorageWrite {
        slot: NodeId,
        keys: Vec<NodeId>,
        value: NodeId,
    },
    Name {
        id: String,
    },
    Attribute {
        value: NodeId,
        attr: String,
    },
    Subscript {
        value: NodeId,
        slice: NodeId,
    },
    BinOp {
        left: NodeId,
        op: BinOpKind,
        right: NodeId,
    },
    BoolOp {
        op: BoolOpKind,
        values: Vec<NodeId>,
    },
    Compare {
        left: NodeId,
        op: CompareKind,
        right: NodeId,
    },
    UnaryOp {
        op: UnaryOpKind,
        operand: NodeId,
    },
    Call {
        func: NodeId,
        args: Vec<NodeId>,
    },
    Int {
        #[serde(with = "decimal")]
        value: BigInt,
    },
    Bool {
        value: bool,
    },
    Str {
        value: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeTag {
    Module,
    VariableDecl,
    FunctionDef,
    Arg,
    Assign,
    AugAssign,
    AnnAssign,
    Return,
    Expr,
    If,
    For,
    Assert,
    Pass,
    StorageRead,
    StorageWrite,
    Name,
    Attribute,
    Subscript,
    BinOp,
    BoolOp,
    Compare,
    UnaryOp,
    Call,
    Int,
    Bool,
    Str,
}

impl NodeTag {
    pub fn is_statement(self) -> bool {
        matches!(
            self,
            NodeTag::Assign
                | NodeTag::AugAssign
                | NodeTag::AnnAssign
                | NodeTag::Return
                | NodeTag::Expr
                | NodeTag::If
                | NodeTag::For
                | NodeTag::Assert
                | NodeTag::Pass
                | NodeTag::StorageRead
                | NodeTag::StorageWrite
        )
    }
}

impl NodeKind {
    pub fn tag(&self) -> NodeTag {
        match self {
            NodeKind::Module { .. } => NodeTag::Module,
            NodeKind::VariableDecl { .. } => NodeTag::VariableDecl,
            NodeKind::FunctionDef { .. } => NodeTag::FunctionDef,
            NodeKind::Arg { .. } => NodeTag::Arg,
            NodeKind::Assign { .. } => NodeTag::Assign,
            NodeKind::AugAssign { .. } => NodeTag::AugAssign,
            NodeKind::AnnAssign { .. } => NodeTag::AnnAssign,
            NodeKind::Return { .. } => NodeTag::Return,
            NodeKind::Expr { .. } => NodeTag::Expr,
            NodeKind::If { .. } => NodeTag::If,
            NodeKind::For { .. } => NodeTag::For,
            NodeKind::Assert { .. } => NodeTag::Assert,
            NodeKind::Pass => NodeTag::Pass,
            NodeKind::StorageRead { .. } => NodeTag::StorageRead,
            NodeKind::StorageWrite { .. } => NodeTag::StorageWrite,
            NodeKind::Name { .. } => NodeTag::Name,
            NodeKind::Attribute { .. } => NodeTag::Attribute,
            NodeKind::Subscript { .. } => NodeTag::Subscript,
            NodeKind::BinOp { .. } => NodeTag::BinOp,
            NodeKind::BoolOp { .. } => NodeTag::BoolOp,
            NodeKind::Compare { .. } => NodeTag::Compare,
            NodeKind::UnaryOp { .. } => NodeTag::UnaryOp,
            NodeKind::Call { .. } => NodeTag::Call,
            NodeKind::Int { .. } => NodeTag::Int,
            NodeKind::Bool { .. } => NodeTag::Bool,
            NodeKind::Str { .. } => NodeTag::Str,
        }
    }

    /// Child links in source order.
    pub fn children(&self) -> Vec<NodeId> {
        match self {
            NodeKind::Module { body } => body.clone(),
            NodeKind::VariableDecl { target, value, .. } => {
                std::iter::once(*target).chain(*value).collect()
            }
            NodeKind::FunctionDef { args, body, .. } => {
                args.iter().chain(body.iter()).copied().collect()
            }
            NodeKind::Assign { target, value }
            | NodeKind::AugAssign { target, value, .. } => vec![*target, *value],
            NodeKind::AnnAssign { target, value } => {
                std::iter::once(*target).chain(*value).collect()
            }
            NodeKind::Return { value } => value.iter().copied().collect(),
            NodeKind::Expr { value } => vec![*value],
            NodeKind::If { test, body, orelse } => std::iter::once(*test)
                .chain(body.iter().copied())
                .chain(orelse.iter().copied())
                .collect(),
            NodeKind::For { target, iter, body } => [*target, *iter]
                .into_iter()
                .chain(body.iter().copied())
                .collect(),
            NodeKind::Assert { test } => vec![*test],
            NodeKind::StorageRead { target, slot, keys } => [*target, *slot]
                .into_iter()
                .chain(keys.iter().copied())
                .collect(),
            NodeKind::StorageWrite { slot, keys, value } => std::iter::once(*slot)
                .chain(keys.iter().copied())
                .chain(std::iter::once(*value))
                .collect(),
            NodeKind::Attribute { value, .. } => vec![*value],
            NodeKind::Subscript { value, slice } => vec![*value, *slice],
            NodeKind::BinOp { left, right, .. } | NodeKind::Compare { left, right, .. } => {
                vec![*left, *right]
            }
            NodeKind::BoolOp { values, .. } => values.clone(),
            NodeKind::UnaryOp { operand, .. } => vec![*operand],
            NodeKind::Call { func, args } => std::iter::once(*func)
                .chain(args.iter().copied())
                .collect(),
            NodeKind::Arg { .. }
            | NodeKind::Pass
            | NodeKind::Name { .. }
            | NodeKind::Int { .. }
            | NodeKind::Bool { .. }
            | NodeKind::Str { .. } => Vec::new(),
        }
    }

    /// Swaps `old` for `new` in whichever field holds it. Returns false when `old` is not a child.
    pub fn replace_child(&mut self, old: NodeId, new: NodeId) -> bool {
        for slot in self.child_slots_mut() {
            if *slot == old {
                *slot = new;
                return true;
            }
        }
        false
    }

    fn child_slots_mut(&mut self) -> Vec<&mut NodeId> {
        match self {
            NodeKind::Module { body } => body.iter_mut().collect(),
            NodeKind::VariableDecl { target, value, .. } => {
                std::iter::once(target).chain(value.as_mut()).collect()
            }
            NodeKind::FunctionDef { args, body, .. } => {
                args.iter_mut().chain(body.iter_mut()).collect()
            }
            NodeKind::Assign { target, value }
            | NodeKind::AugAssign { target, value, .. } => vec![target, value],
            NodeKind::AnnAssign { target, value } => {
                std::iter::once(target).chain(value.as_mut()).collect()
            }
            NodeKind::Return { value } => value.as_mut().into_iter().collect(),
            NodeKind::Expr { value } => vec![value],
            NodeKind::If { test, body, orelse } => std::iter::once(test)
                .chain(body.iter_mut())
                .chain(orelse.iter_mut())
                .collect(),
            NodeKind::For { target, iter, body } => std::iter::once(target)
                .chain(std::iter::once(iter))
                .chain(body.iter_mut())
                .collect(),
            NodeKind::Assert { test } => vec![test],
            NodeKind::StorageRead { target, slot, keys } => std::iter::once(target)
                .chain(std::iter::once(slot))
                .chain(keys.iter_mut())
                .collect(),
            NodeKind::StorageWrite { slot, keys, value } => std::iter::once(slot)
                .chain(keys.iter_mut())
                .chain(std::iter::once(value))
                .collect(),
            NodeKind::Attribute { value, .. } => vec![value],
            NodeKind::Subscript { value, slice } => vec![value, slice],
            NodeKind::BinOp { left, right, .. } | NodeKind::Compare { left, right, .. } => {
                vec![left, right]
            }
            NodeKind::BoolOp { values, .. } => values.iter_mut().collect(),
            NodeKind::UnaryOp { operand, .. } => vec![operand],
            NodeKind::Call { func, args } => {
                std::iter::once(func).chain(args.iter_mut()).collect()
            }
            NodeKind::Arg { .. }
            | NodeKind::Pass
            | NodeKind::Name { .. }
            | NodeKind::Int { .. }
            | NodeKind::Bool { .. }
            | NodeKind::Str { .. } => Vec::new(),
        }
    }

    pub fn statement_lists(&self) -> Vec<&Vec<NodeId>> {
        match self {
            NodeKind::Module { body }
            | NodeKind::FunctionDef { body, .. }
            | NodeKind::For { body, .. } => vec![body],
            NodeKind::If { body, orelse, .. } => vec![body, orelse],
            _ => Vec::new(),
        }
    }

    pub fn statement_lists_mut(&mut self) -> Vec<&mut Vec<NodeId>> {
        match self {
            NodeKind::Module { body }
            | NodeKind::FunctionDef { body, .. }
            | NodeKind::For { body, .. } => vec![body],
            NodeKind::If { body, orelse, .. } => vec![body, orelse],
            _ => Vec::new(),
        }
    }

    pub fn holds_statement(&self, stmt: NodeId) -> bool {
        self.statement_lists()
            .iter()
            .any(|list| list.contains(&stmt))
    }

    /// Operand list of a storage write: keys in order, then the value.
    pub fn storage_operands(&self) -> Option<Vec<NodeId>> {
        match self {
            NodeKind::StorageWrite { keys, value, .. } => {
                Some(keys.iter().copied().chain(std::iter::once(*value)).collect())
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinOpKind {
    Add,
    Sub,
    Mult,
    Div,
    Mod,
    Pow,
    BitAnd,
    BitOr,
    BitXor,
    LShift,
    RShift,
}

impl BinOpKind {
    pub fn symbol(self) -> &'static str {
        match self {
            BinOpKind::Add => "+",
            BinOpKind::Sub => "-",
            BinOpKind::Mult => "*",
            BinOpKind::Div => "/",
            BinOpKind::Mod => "%",
            BinOpKind::Pow => "**",
            BinOpKind::BitAnd => "&",
            BinOpKind::BitOr => "|",
            BinOpKind::BitXor => "^",
            BinOpKind::LShift => "<<",
            BinOpKind::RShift => ">>",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BoolOpKind {
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CompareKind {
    Eq,
    NotEq,
    Lt,
    LtE,
    Gt,
    GtE,
}

impl CompareKind {
    pub fn symbol(self) -> &'static str {
        match self {
            CompareKind::Eq => "==",
            CompareKind::NotEq => "!=",
            CompareKind::Lt => "<",
            CompareKind::LtE => "<=",
            CompareKind::Gt => ">",
            CompareKind::GtE => ">=",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnaryOpKind {
    Not,
    USub,
    Invert,
}

mod decimal {
    use num_bigint::BigInt;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &BigInt, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<BigInt, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse::<BigInt>().map_err(serde::de::Error::custom)
    }
}
