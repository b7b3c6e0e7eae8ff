// In: src/bridge/mod.rs

// ====================================================================================
// ARCHITECTURAL OVERVIEW: The Bridge Layer
// ====================================================================================
//
// The `bridge` owns every bridged instance and decides what each exported symbol
// means. The `ffi` layer is a thin, panic-guarded translation of C arguments into
// calls on this module; it holds no logic of its own.
//
// Call Flow (one method thunk, e.g. `Animal_eat(h)`):
//
//   1. [ffi::c_abi]          -> receives `void* h`
//         |
//         `-> `Bridge::key_from_raw` : null / never-issued values rejected here
//
//   2. [Bridge (dispatch)]   -> `eat(key, via = Animal)`
//         |
//         `-> a. `HandleTable::get`   : generation check (stale handles rejected)
//         |
//         `-> b. `Species::is_a`      : the symbol's type must be a base of the
//         |                             instance's dynamic type
//         |
//         `-> c. `dyn Creature::eat`  : dynamic dispatch on the instance itself
//
//   3. [ffi::c_abi]          -> writes the line, returns a status code
//
// Lifecycle: `T_new` moves a fresh `Box<dyn Creature>` into the table and returns
// the packed key as an opaque pointer. `T_delete` removes it (bumping the slot's
// generation) and drops it. Ownership crosses the boundary exactly once each way.
//
// Binding generation (`binding`) is independent of the live table: it derives the
// symbol table from `ExposedType` descriptors using the `naming` bands, and is
// what the C header and the JSON manifest are rendered from.
//
// ====================================================================================
pub mod binding;
pub(crate) mod dispatch;
pub mod handle_table;
pub mod naming;

pub use binding::{generate, Binding, BindingTable, ExportedSymbol, SymbolRole};
pub use dispatch::Bridge;
pub use handle_table::{HandleKey, HandleTable};
