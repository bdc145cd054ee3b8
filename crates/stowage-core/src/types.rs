use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Type {
    Bool,
    Uint(u16),
    Int(u16),
    Address,
    Bytes(u8),
    String,
    DynArray(Box<Type>, usize),
    Mapping(Box<Type>, Box<Type>),
    Storage { keys: Vec<Type>, value: Box<Type> },
    Function(Box<FunctionType>),
}

impl Type {
    pub fn mapping(key: Type, value: Type) -> Self {
        Type::Mapping(Box::new(key), Box::new(value))
    }

    /// Flattens `HashMap[a, HashMap[b, v]]` into `([a, b], v)`.
    pub fn mapping_levels(&self) -> (Vec<Type>, Type) {
        let mut keys = Vec::new();
        let mut current = self;
        while let Type::Mapping(key, value) = current {
            keys.push((**key).clone());
            current = value;
        }
        (keys, current.clone())
    }

    pub fn storage_slot(&self) -> Type {
        match self {
            Type::Storage { .. } => self.clone(),
            _ => {
                let (keys, value) = self.mapping_levels();
                Type::Storage {
                    keys,
                    value: Box::new(value),
                }
            }
        }
    }

    /// Type of the value held in a slot, looking through both source mappings and lowered slots.
    pub fn slot_value(&self) -> Type {
        match self {
            Type::Storage { value, .. } => (**value).clone(),
            _ => self.mapping_levels().1,
        }
    }

    pub fn key_depth(&self) -> usize {
        match self {
            Type::Storage { keys, .. } => keys.len(),
            _ => self.mapping_levels().0.len(),
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Bool => write!(f, "bool"),
            Type::Uint(bits) => write!(f, "uint{}", bits),
            Type::Int(bits) => write!(f, "int{}", bits),
            Type::Address => write!(f, "address"),
            Type::Bytes(n) => write!(f, "bytes{}", n),
            Type::String => write!(f, "String"),
            Type::DynArray(elem, max) => write!(f, "DynArray[{}, {}]", elem, max),
            Type::Mapping(key, value) => write!(f, "HashMap[{}, {}]", key, value),
            Type::Storage { keys, value } => {
                let keys = keys
                    .iter()
                    .map(|t| t.to_string())
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(f, "storage<[{}] => {}>", keys, value)
            }
            Type::Function(ft) => write!(f, "function{}", ft),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Visibility {
    External,
    Internal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mutability {
    Pure,
    View,
    NonPayable,
    Payable,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FunctionType {
    pub params: Vec<Type>,
    pub returns: Option<Type>,
    pub visibility: Visibility,
    pub mutability: Mutability,
}

impl fmt::Display for FunctionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let params = self
            .params
            .iter()
            .map(|t| t.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        match &self.returns {
            Some(ret) => write!(f, "({}) -> {}", params, ret),
            None => write!(f, "({})", params),
        }
    }
}
