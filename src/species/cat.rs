use std::any::Any;

use crate::error::BridgeError;
use crate::species::{Animal, Species};
use crate::traits::Creature;

/// The number every cat carries; `mul_number` scales it.
const CAT_NUMBER: i64 = 42;

/// A subtype of `Animal` that overrides `eat` and adds two own methods.
///
/// The base part is held by value, so dropping a `Cat` runs its own `Drop`
/// first and the `Animal` one after it (derived-to-base).
#[derive(Debug)]
pub struct Cat {
    _base: Animal,
    number: i64,
}

impl Cat {
    pub fn new() -> Self {
        Self {
            _base: Animal::new(),
            number: CAT_NUMBER,
        }
    }

    pub fn scratch(&self) -> &'static str {
        "Cat scratching."
    }

    /// Multiplies the cat's number by `factor`, failing on `i64` overflow.
    pub fn mul_number(&self, factor: i64) -> Result<i64, BridgeError> {
        self.number
            .checked_mul(factor)
            .ok_or(BridgeError::Overflow("Cat___mul_number"))
    }
}

impl Default for Cat {
    fn default() -> Self {
        Self::new()
    }
}

impl Creature for Cat {
    fn species(&self) -> Species {
        Species::Cat
    }

    fn eat(&self) -> &'static str {
        "Cat eating."
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for Cat {
    fn drop(&mut self) {
        log::trace!("Cat destroyed");
    }
}
