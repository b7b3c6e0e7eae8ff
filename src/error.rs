// In: src/error.rs

//! This module defines the single, unified error type for the animal-bridge library,
//! plus the stable integer status codes that stand in for it at the C boundary.
//! It uses the `thiserror` crate to provide ergonomic, context-aware error handling.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BridgeError {
    // =========================================================================
    // === Handle Misuse (caller contract violations, detected by the table)
    // =========================================================================
    #[error("Null handle passed to `{0}`")]
    NullHandle(&'static str),

    #[error("Handle {0:#x} was never issued by this bridge")]
    UnknownHandle(usize),

    /// The slot exists but its generation moved on: double free or use-after-free.
    #[error("Handle {0:#x} is stale (already destroyed)")]
    StaleHandle(usize),

    #[error("Type mismatch: `{symbol}` expects a {expected} handle, got a {actual}")]
    TypeMismatch {
        symbol: &'static str,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("Handle table is full ({0} live handles)")]
    CapacityExhausted(usize),

    #[error("Cannot reconfigure the bridge while {0} handles are live")]
    Busy(usize),

    // =========================================================================
    // === Method & Boundary Errors
    // =========================================================================
    #[error("Arithmetic overflow in `{0}`")]
    Overflow(&'static str),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A logger already owns the `log` facade, so the requested target cannot take effect.
    #[error("Logger already installed: {0}")]
    LoggerInstalled(String),

    #[error("Panic caught at the C boundary in `{symbol}`: {message}")]
    Panic {
        symbol: &'static str,
        message: String,
    },

    // =========================================================================
    // === Binding Generator Errors
    // =========================================================================
    #[error("Exposed type `{0}` is declared more than once")]
    DuplicateType(String),

    #[error("Exposed type `{ty}` names unknown base type `{base}`")]
    UnknownBaseType { ty: String, base: String },

    #[error("Inheritance cycle through exposed type `{0}`")]
    InheritanceCycle(String),

    #[error("`{0}` is not a valid C identifier")]
    InvalidIdentifier(String),

    #[error("Symbol `{symbol}` collides: {reason}")]
    NameCollision { symbol: String, reason: String },

    // =========================================================================
    // === External Error Wrappers (Using #[from] for automatic conversion)
    // =========================================================================
    /// An error originating from writing method output (stdout/stderr/log file).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An error from the Serde JSON library, during config parsing or manifest rendering.
    #[error("Configuration error: {0}")]
    Config(#[from] serde_json::Error),
}

/// Integer status codes returned across the C boundary. `Ok` is zero, every
/// failure is negative. The values are part of the ABI and must never be renumbered.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeStatus {
    Ok = 0,
    NullHandle = -1,
    UnknownHandle = -2,
    StaleHandle = -3,
    TypeMismatch = -4,
    CapacityExhausted = -5,
    Overflow = -6,
    Io = -7,
    InvalidArgument = -8,
    Config = -9,
    Busy = -10,
    Generator = -11,
    Panic = -12,
}

impl BridgeError {
    /// Maps the error onto its boundary status code.
    pub fn status(&self) -> BridgeStatus {
        match self {
            BridgeError::NullHandle(_) => BridgeStatus::NullHandle,
            BridgeError::UnknownHandle(_) => BridgeStatus::UnknownHandle,
            BridgeError::StaleHandle(_) => BridgeStatus::StaleHandle,
            BridgeError::TypeMismatch { .. } => BridgeStatus::TypeMismatch,
            BridgeError::CapacityExhausted(_) => BridgeStatus::CapacityExhausted,
            BridgeError::Busy(_) => BridgeStatus::Busy,
            BridgeError::Overflow(_) => BridgeStatus::Overflow,
            BridgeError::InvalidArgument(_) => BridgeStatus::InvalidArgument,
            BridgeError::Panic { .. } => BridgeStatus::Panic,
            BridgeError::DuplicateType(_)
            | BridgeError::UnknownBaseType { .. }
            | BridgeError::InheritanceCycle(_)
            | BridgeError::InvalidIdentifier(_)
            | BridgeError::NameCollision { .. } => BridgeStatus::Generator,
            BridgeError::Io(_) => BridgeStatus::Io,
            BridgeError::Config(_) | BridgeError::LoggerInstalled(_) => BridgeStatus::Config,
        }
    }

    /// True for the errors that mean the caller broke the handle contract.
    pub fn is_handle_misuse(&self) -> bool {
        matches!(
            self,
            BridgeError::NullHandle(_)
                | BridgeError::UnknownHandle(_)
                | BridgeError::StaleHandle(_)
                | BridgeError::TypeMismatch { .. }
        )
    }
}

impl From<BridgeStatus> for i32 {
    fn from(status: BridgeStatus) -> i32 {
        status as i32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes_are_stable() {
        assert_eq!(i32::from(BridgeStatus::Ok), 0);
        assert_eq!(i32::from(BridgeStatus::StaleHandle), -3);
        assert_eq!(i32::from(BridgeStatus::Panic), -12);
    }

    #[test]
    fn test_misuse_classification() {
        assert!(BridgeError::StaleHandle(0x10).is_handle_misuse());
        assert!(!BridgeError::Overflow("Cat___mul_number").is_handle_misuse());
        assert_eq!(
            BridgeError::InheritanceCycle("Cat".into()).status(),
            BridgeStatus::Generator
        );
    }
}
