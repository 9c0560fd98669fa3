//! Function identity and argument-type descriptions.
//!
//! A [`FunctionHandle`] identifies a device function by identity, not value:
//! two handles are equal only if they refer to the same registration, even
//! when their display names collide.

use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identity of a device function known to the backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionHandle {
    id: Uuid,
    name: String,
}

impl FunctionHandle {
    /// Register a fresh function identity under the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl PartialEq for FunctionHandle {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for FunctionHandle {}

impl Hash for FunctionHandle {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for FunctionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Static description of one argument type in a specialization signature.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeDesc {
    Bool,
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F16,
    F32,
    F64,
    /// Device pointer to the element type.
    Ptr(Box<TypeDesc>),
    /// An opaque named type the backend resolves.
    Named(String),
}

impl TypeDesc {
    /// Device pointer to `elem`.
    pub fn ptr(elem: TypeDesc) -> Self {
        TypeDesc::Ptr(Box::new(elem))
    }
}

impl fmt::Display for TypeDesc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeDesc::Bool => write!(f, "bool"),
            TypeDesc::I8 => write!(f, "i8"),
            TypeDesc::I16 => write!(f, "i16"),
            TypeDesc::I32 => write!(f, "i32"),
            TypeDesc::I64 => write!(f, "i64"),
            TypeDesc::U8 => write!(f, "u8"),
            TypeDesc::U16 => write!(f, "u16"),
            TypeDesc::U32 => write!(f, "u32"),
            TypeDesc::U64 => write!(f, "u64"),
            TypeDesc::F16 => write!(f, "f16"),
            TypeDesc::F32 => write!(f, "f32"),
            TypeDesc::F64 => write!(f, "f64"),
            TypeDesc::Ptr(elem) => write!(f, "*{elem}"),
            TypeDesc::Named(name) => write!(f, "{name}"),
        }
    }
}

/// Render an argument-type list as a signature fragment, e.g. `(*f32, *f32, u32)`.
pub fn signature(arg_types: &[TypeDesc]) -> String {
    let parts: Vec<String> = arg_types.iter().map(|t| t.to_string()).collect();
    format!("({})", parts.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handle_equality_is_identity() {
        let a = FunctionHandle::new("vadd");
        let b = FunctionHandle::new("vadd");
        assert_ne!(a, b);
        assert_eq!(a, a.clone());
    }

    #[test]
    fn type_display() {
        assert_eq!(TypeDesc::ptr(TypeDesc::F32).to_string(), "*f32");
        assert_eq!(
            TypeDesc::ptr(TypeDesc::ptr(TypeDesc::I64)).to_string(),
            "**i64"
        );
        assert_eq!(TypeDesc::Named("Quat".into()).to_string(), "Quat");
    }

    #[test]
    fn signature_rendering() {
        let sig = signature(&[TypeDesc::ptr(TypeDesc::F32), TypeDesc::U32]);
        assert_eq!(sig, "(*f32, u32)");
        assert_eq!(signature(&[]), "()");
    }
}
