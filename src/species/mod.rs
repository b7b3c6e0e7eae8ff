//! The concrete exposed hierarchy: `Animal` and its subtype `Cat`.
//!
//! `Species` is the runtime variant tag carried by each instance. It also knows
//! the base chain, which is what the bridge consults to decide whether a handle
//! may be passed to a given type's symbols.

mod animal;
mod cat;

pub use animal::Animal;
pub use cat::Cat;

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::traits::Creature;
use crate::types::{CType, ExposedType, MethodKind, MethodSig};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Species {
    Animal,
    Cat,
}

impl Species {
    pub const ALL: [Species; 2] = [Species::Animal, Species::Cat];

    /// The exposed type name, which is also the symbol prefix.
    pub fn name(self) -> &'static str {
        match self {
            Species::Animal => "Animal",
            Species::Cat => "Cat",
        }
    }

    pub fn base(self) -> Option<Species> {
        match self {
            Species::Animal => None,
            Species::Cat => Some(Species::Animal),
        }
    }

    /// Returns `true` if `self` is `other` or derives from it.
    pub fn is_a(self, other: Species) -> bool {
        let mut current = Some(self);
        while let Some(species) = current {
            if species == other {
                return true;
            }
            current = species.base();
        }
        false
    }

    /// Heap-allocates and constructs a fresh instance of this species.
    pub fn instantiate(self) -> Box<dyn Creature> {
        match self {
            Species::Animal => Box::new(Animal::new()),
            Species::Cat => Box::new(Cat::new()),
        }
    }
}

impl fmt::Display for Species {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Descriptors for the built-in hierarchy, in declaration order (bases first).
/// The binding table generated from this manifest is exactly the set of symbols
/// exported by `ffi::c_abi`.
pub fn manifest() -> Vec<ExposedType> {
    vec![
        ExposedType::new(Species::Animal.name()).with_method(MethodSig::new(
            "eat",
            MethodKind::Virtual,
            vec![],
            CType::Void,
        )),
        ExposedType::new(Species::Cat.name())
            .with_base(Species::Animal.name())
            .with_method(MethodSig::new("eat", MethodKind::Virtual, vec![], CType::Void))
            .with_method(MethodSig::new("scratch", MethodKind::Own, vec![], CType::Void))
            .with_method(MethodSig::new(
                "mul_number",
                MethodKind::Operator,
                vec![CType::I64],
                CType::I64,
            )),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subtype_relation() {
        assert!(Species::Cat.is_a(Species::Animal));
        assert!(Species::Cat.is_a(Species::Cat));
        assert!(Species::Animal.is_a(Species::Animal));
        assert!(!Species::Animal.is_a(Species::Cat));
    }

    #[test]
    fn test_instantiate_carries_dynamic_tag() {
        for species in Species::ALL {
            assert_eq!(species.instantiate().species(), species);
        }
    }

    #[test]
    fn test_manifest_names_match_species() {
        let names: Vec<String> = manifest().into_iter().map(|t| t.name).collect();
        let expected: Vec<String> = Species::ALL.iter().map(|s| s.name().to_string()).collect();
        assert_eq!(names, expected);
    }
}
