//! Descriptors for the types a bridge exposes.
//!
//! These are plain data: they say *what* a type looks like from the boundary
//! (name, base, method signatures) and carry no behavior of their own. The
//! binding generator consumes them; the `species` module publishes the manifest
//! for the built-in hierarchy.

mod exposed_type;

pub use exposed_type::{CType, ExposedType, MethodKind, MethodSig};
