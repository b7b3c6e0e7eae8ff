//! This module defines the capability trait shared by every exposed species.

use std::any::Any;
use std::fmt;

use crate::species::Species;

/// The polymorphic capability set {eat} plus the runtime tag the bridge
/// dispatches on.
///
/// Every live instance sits in the handle table as a `Box<dyn Creature>`, so a
/// call through any symbol resolves `eat` on the instance's dynamic type. Methods
/// that are not part of this trait (a species' own methods) are reached by
/// downcasting through [`Creature::as_any`].
pub trait Creature: Any + Send + fmt::Debug {
    /// The dynamic type of this instance.
    fn species(&self) -> Species;

    /// Returns the line this creature prints when it eats.
    fn eat(&self) -> &'static str;

    fn as_any(&self) -> &dyn Any;
}
