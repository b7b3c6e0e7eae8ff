//! This file is the root of the `animal_bridge` Rust crate.
//!
//! Its responsibilities are strictly limited to:
//! 1.  Declaring all the top-level modules of our library (`bridge`, `ffi`, etc.)
//!     so the Rust compiler knows they exist.
//! 2.  Re-exporting the safe Rust API. The C API is the set of `#[no_mangle]`
//!     symbols in `ffi::c_abi`, which the `cdylib` build exports directly.

//==================================================================================
// 0. Constants
//==================================================================================
/// The crate version, automatically set from Cargo.toml at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
//==================================================================================
// 1. Module Declarations
//==================================================================================
pub mod bridge;
pub mod config;
pub mod error;
pub mod ffi;
pub mod species;
pub mod traits;
pub mod types;

//==================================================================================
// 2. Public Re-exports
//==================================================================================
pub use bridge::{generate, BindingTable, Bridge, HandleKey};
pub use config::{BridgeConfig, OutputTarget};
pub use error::{BridgeError, BridgeStatus};
pub use species::{Animal, Cat, Species};
pub use traits::Creature;
pub use types::{CType, ExposedType, MethodKind, MethodSig};
