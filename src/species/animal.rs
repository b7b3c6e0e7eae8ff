use std::any::Any;

use crate::species::Species;
use crate::traits::Creature;

/// The base exposed type.
#[derive(Debug, Default)]
pub struct Animal {
    // Keeps construction going through `new`.
    _private: (),
}

impl Animal {
    pub fn new() -> Self {
        Self { _private: () }
    }
}

impl Creature for Animal {
    fn species(&self) -> Species {
        Species::Animal
    }

    fn eat(&self) -> &'static str {
        "Animal eating."
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for Animal {
    fn drop(&mut self) {
        log::trace!("Animal destroyed");
    }
}
