//! This module defines the type-safe description of an exposed native type:
//! its name, its (single, optional) base, and the signatures of its methods.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A C-compatible value type that can appear in a boundary signature.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
#[serde(tag = "kind", content = "of", rename_all = "snake_case")]
pub enum CType {
    /// No native return value. At the boundary this becomes a status code.
    Void,
    Bool,
    I32,
    I64,
    F64,
    Size,
    /// A borrowed, NUL-terminated string.
    CStr,
    /// An opaque handle to an instance of the named exposed type. Spelled
    /// `void*` in C so a subtype handle passes to its bases' symbols unchanged.
    Handle(String),
    /// The `int32_t` status code returned in place of `Void`.
    Status,
}

impl CType {
    /// The spelling of this type in a C header.
    pub fn c_name(&self) -> String {
        match self {
            Self::Void => "void".to_string(),
            Self::Bool => "bool".to_string(),
            Self::I32 | Self::Status => "int32_t".to_string(),
            Self::I64 => "int64_t".to_string(),
            Self::F64 => "double".to_string(),
            Self::Size => "size_t".to_string(),
            Self::CStr => "const char*".to_string(),
            Self::Handle(_) => "void*".to_string(),
        }
    }

    /// The type actually returned across the boundary. A native `void` is
    /// replaced by a status code so failures always have a return channel.
    pub fn at_boundary(&self) -> CType {
        match self {
            Self::Void => Self::Status,
            other => other.clone(),
        }
    }
}

impl fmt::Display for CType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.c_name())
    }
}

/// How a method participates in dispatch, which also picks its naming band.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum MethodKind {
    /// Resolved on the dynamic type of the instance; may be overridden.
    Virtual,
    /// Declared by this type only; never reachable through a base symbol.
    Own,
    /// An own method in the operator band (e.g. `Cat___mul_number`).
    Operator,
}

/// One method signature. `params` excludes the implicit `self` handle.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct MethodSig {
    pub name: String,
    pub kind: MethodKind,
    #[serde(default)]
    pub params: Vec<CType>,
    pub returns: CType,
}

impl MethodSig {
    pub fn new(name: &str, kind: MethodKind, params: Vec<CType>, returns: CType) -> Self {
        Self {
            name: name.to_string(),
            kind,
            params,
            returns,
        }
    }

    /// Two declarations are override-compatible when everything but the kind
    /// of the overriding declaration matches.
    pub fn same_signature(&self, other: &MethodSig) -> bool {
        self.params == other.params && self.returns == other.returns
    }
}

/// A native type made callable from outside its own language runtime.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ExposedType {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base: Option<String>,
    #[serde(default)]
    pub methods: Vec<MethodSig>,
}

impl ExposedType {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            base: None,
            methods: Vec::new(),
        }
    }

    pub fn with_base(mut self, base: &str) -> Self {
        self.base = Some(base.to_string());
        self
    }

    pub fn with_method(mut self, method: MethodSig) -> Self {
        self.methods.push(method);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_void_becomes_status_at_boundary() {
        assert_eq!(CType::Void.at_boundary(), CType::Status);
        assert_eq!(CType::I64.at_boundary(), CType::I64);
        assert_eq!(CType::Status.c_name(), "int32_t");
        assert_eq!(CType::Handle("Cat".into()).c_name(), "void*");
        assert_eq!(
            CType::Handle("Cat".into()).c_name(),
            CType::Handle("Animal".into()).c_name()
        );
    }
}
