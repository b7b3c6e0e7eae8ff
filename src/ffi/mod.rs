//! The C boundary: exported symbols, the per-thread error channel, and logger setup.

pub mod c_abi;
pub(crate) mod last_error;
pub mod logging;
