// In: src/ffi/c_abi.rs

//! The exported C symbol table.
//!
//! Every function here is a thin thunk: decode arguments, lock the process-wide
//! `Bridge`, call one facade method, translate the outcome into the C return
//! channel. No panic and no Rust error ever crosses the boundary:
//!
//! * status-returning symbols return `BridgeStatus as i32` (0 = ok);
//! * value-returning symbols return a sentinel (null / 0) and leave the details
//!   in the thread-local last-error slot.
//!
//! Every guarded call clears the slot on entry, so `bridge_last_status` always
//! describes the most recent call on the thread. That is what tells a real 0
//! from `Cat___mul_number` apart from its failure sentinel.
//!
//! Handles are opaque: callers must only pass them back to this type's own
//! symbols. Concurrent calls on *different* handles are safe. Calls on the same
//! handle from several threads are serialized by the bridge lock, but their
//! relative order is the caller's responsibility.
#![allow(non_snake_case)]

use std::ffi::{c_char, c_void, CStr, CString};
use std::io::{self, Write};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::ptr;

use once_cell::sync::Lazy;
use parking_lot::Mutex;

use crate::bridge::{self, Bridge};
use crate::config::{BridgeConfig, OutputTarget, CONFIG_ENV_VAR};
use crate::error::{BridgeError, BridgeStatus};
use crate::ffi::{last_error, logging};
use crate::species::{self, Species};

static BRIDGE: Lazy<Mutex<Bridge>> = Lazy::new(|| {
    let config = BridgeConfig::from_env().unwrap_or_else(|err| {
        log::warn!("ignoring {}: {}", CONFIG_ENV_VAR, err);
        BridgeConfig::default()
    });
    Mutex::new(Bridge::new(config))
});

//==================================================================================
// I. Boundary Guards
//==================================================================================

/// Runs `body`, catching panics. The last-error slot is cleared first; on
/// failure the error is recorded there and `None` is returned.
fn run<R>(symbol: &'static str, body: impl FnOnce() -> Result<R, BridgeError>) -> Option<R> {
    last_error::clear();
    let err = match catch_unwind(AssertUnwindSafe(body)) {
        Ok(Ok(value)) => return Some(value),
        Ok(Err(err)) => err,
        Err(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "non-string panic payload".to_string());
            log::error!("panic in {}: {}", symbol, message);
            BridgeError::Panic { symbol, message }
        }
    };

    if err.is_handle_misuse() {
        log::warn!("{}: caller misuse: {}", symbol, err);
    } else {
        log::debug!("{}: {}", symbol, err);
    }
    last_error::record(&err);
    None
}

fn run_status(symbol: &'static str, body: impl FnOnce() -> Result<(), BridgeError>) -> i32 {
    match run(symbol, body) {
        Some(()) => BridgeStatus::Ok as i32,
        None => last_error::status() as i32,
    }
}

fn emit(line: &str, target: OutputTarget) -> Result<(), BridgeError> {
    match target {
        OutputTarget::Stdout => {
            let mut out = io::stdout().lock();
            writeln!(out, "{}", line)?;
            out.flush()?;
        }
        OutputTarget::Stderr => {
            let mut out = io::stderr().lock();
            writeln!(out, "{}", line)?;
        }
    }
    Ok(())
}

/// Resolves the line under the lock, then writes it after releasing it.
fn print_with(
    symbol: &'static str,
    handle: *mut c_void,
    call: impl FnOnce(&Bridge, bridge::HandleKey) -> Result<&'static str, BridgeError>,
) -> i32 {
    run_status(symbol, || {
        let key = Bridge::key_from_raw(handle as usize, symbol)?;
        let (line, target) = {
            let bridge = BRIDGE.lock();
            (call(&*bridge, key)?, bridge.config().output)
        };
        emit(line, target)
    })
}

fn construct(symbol: &'static str, species: Species) -> *mut c_void {
    run(symbol, || {
        let key = BRIDGE.lock().create(species)?;
        Ok(key.to_raw() as *mut c_void)
    })
    .unwrap_or(ptr::null_mut())
}

fn destruct(symbol: &'static str, handle: *mut c_void, via: Species) -> i32 {
    run_status(symbol, || {
        let key = Bridge::key_from_raw(handle as usize, symbol)?;
        BRIDGE.lock().destroy(key, via)
    })
}

/// Borrows a C string argument. Null maps to `None`.
///
/// # Safety
/// `ptr` must be null or point to a NUL-terminated string that stays valid for `'a`.
unsafe fn str_arg<'a>(ptr: *const c_char, what: &str) -> Result<Option<&'a str>, BridgeError> {
    if ptr.is_null() {
        return Ok(None);
    }
    CStr::from_ptr(ptr)
        .to_str()
        .map(Some)
        .map_err(|e| BridgeError::InvalidArgument(format!("{} is not valid UTF-8: {}", what, e)))
}

fn into_c_string(text: String) -> Result<*mut c_char, BridgeError> {
    CString::new(text)
        .map(CString::into_raw)
        .map_err(|e| BridgeError::InvalidArgument(e.to_string()))
}

//==================================================================================
// II. Animal
//==================================================================================

#[no_mangle]
pub extern "C" fn Animal_new() -> *mut c_void {
    construct("Animal_new", Species::Animal)
}

#[no_mangle]
pub extern "C" fn Animal_eat(handle: *mut c_void) -> i32 {
    print_with("Animal_eat", handle, |bridge, key| {
        bridge.eat(key, Species::Animal)
    })
}

#[no_mangle]
pub extern "C" fn Animal_delete(handle: *mut c_void) -> i32 {
    destruct("Animal_delete", handle, Species::Animal)
}

//==================================================================================
// III. Cat
//==================================================================================

#[no_mangle]
pub extern "C" fn Cat_new() -> *mut c_void {
    construct("Cat_new", Species::Cat)
}

#[no_mangle]
pub extern "C" fn Cat_eat(handle: *mut c_void) -> i32 {
    print_with("Cat_eat", handle, |bridge, key| bridge.eat(key, Species::Cat))
}

#[no_mangle]
pub extern "C" fn Cat_scratch(handle: *mut c_void) -> i32 {
    print_with("Cat_scratch", handle, |bridge, key| bridge.scratch(key))
}

/// Returns the cat's number times `factor`. On failure returns 0 and sets the
/// last error; a successful 0 leaves `bridge_last_status` at 0.
#[no_mangle]
pub extern "C" fn Cat___mul_number(handle: *mut c_void, factor: i64) -> i64 {
    run("Cat___mul_number", || {
        let key = Bridge::key_from_raw(handle as usize, "Cat___mul_number")?;
        BRIDGE.lock().mul_number(key, factor)
    })
    .unwrap_or(0)
}

#[no_mangle]
pub extern "C" fn Cat_delete(handle: *mut c_void) -> i32 {
    destruct("Cat_delete", handle, Species::Cat)
}

//==================================================================================
// IV. Runtime Support
//==================================================================================

/// Message of the last call on this thread if it failed, or null. The pointer
/// is owned by the bridge and valid until the next boundary call on this thread.
#[no_mangle]
pub extern "C" fn bridge_last_error() -> *const c_char {
    last_error::message_ptr()
}

#[no_mangle]
pub extern "C" fn bridge_last_status() -> i32 {
    last_error::status() as i32
}

#[no_mangle]
pub extern "C" fn bridge_clear_error() {
    last_error::clear();
}

#[no_mangle]
pub extern "C" fn bridge_live_handles() -> usize {
    run("bridge_live_handles", || Ok(BRIDGE.lock().live_handles())).unwrap_or(0)
}

/// Destroys every live instance. All outstanding handles become stale.
#[no_mangle]
pub extern "C" fn bridge_shutdown() -> usize {
    run("bridge_shutdown", || Ok(BRIDGE.lock().drain())).unwrap_or(0)
}

/// Replaces the bridge config with the given JSON document (null resets to
/// defaults). Fails with `Busy` while any handle is live.
///
/// # Safety
/// `json` must be null or a valid NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn bridge_configure(json: *const c_char) -> i32 {
    run_status("bridge_configure", || {
        let config = match str_arg(json, "config JSON")? {
            Some(text) => BridgeConfig::from_json_str(text)?,
            None => BridgeConfig::default(),
        };
        BRIDGE.lock().reconfigure(config)
    })
}

/// # Safety
/// `log_file` must be null or a valid NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn bridge_enable_verbose_logging(log_file: *const c_char) -> i32 {
    run_status("bridge_enable_verbose_logging", || {
        logging::enable_verbose_logging(str_arg(log_file, "log file path")?)
    })
}

/// The generated C header for every exported symbol. Free with `bridge_string_free`.
#[no_mangle]
pub extern "C" fn bridge_header() -> *mut c_char {
    run("bridge_header", || {
        let config = BRIDGE.lock().config();
        let table = bridge::generate(&species::manifest(), &config)?;
        into_c_string(table.render_c_header())
    })
    .unwrap_or(ptr::null_mut())
}

/// The generated binding table as JSON. Free with `bridge_string_free`.
#[no_mangle]
pub extern "C" fn bridge_manifest_json() -> *mut c_char {
    run("bridge_manifest_json", || {
        let config = BRIDGE.lock().config();
        let table = bridge::generate(&species::manifest(), &config)?;
        into_c_string(table.to_json()?)
    })
    .unwrap_or(ptr::null_mut())
}

/// # Safety
/// `s` must be null or a pointer previously returned by `bridge_header` or
/// `bridge_manifest_json`, not yet freed.
#[no_mangle]
pub unsafe extern "C" fn bridge_string_free(s: *mut c_char) {
    if !s.is_null() {
        drop(CString::from_raw(s));
    }
}

#[no_mangle]
pub extern "C" fn bridge_version() -> *const c_char {
    concat!(env!("CARGO_PKG_VERSION"), "\0").as_ptr() as *const c_char
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::BindingTable;

    /// Maps a generated symbol name onto the function actually exported under it.
    fn exported(name: &str) -> Option<usize> {
        let address = match name {
            "Animal_new" => Animal_new as *const () as usize,
            "Animal_eat" => Animal_eat as *const () as usize,
            "Animal_delete" => Animal_delete as *const () as usize,
            "Cat_new" => Cat_new as *const () as usize,
            "Cat_eat" => Cat_eat as *const () as usize,
            "Cat_scratch" => Cat_scratch as *const () as usize,
            "Cat___mul_number" => Cat___mul_number as *const () as usize,
            "Cat_delete" => Cat_delete as *const () as usize,
            _ => return None,
        };
        Some(address)
    }

    #[test]
    fn test_generated_table_matches_exports() {
        let table = bridge::generate(&species::manifest(), &BridgeConfig::default()).unwrap();
        for symbol in table.symbols() {
            assert!(exported(symbol).is_some(), "`{}` is generated but not exported", symbol);
        }
        assert_eq!(table.symbols().len(), 8);
    }

    #[test]
    fn test_animal_lifecycle_through_c_symbols() {
        let h = Animal_new();
        assert!(!h.is_null());
        assert_eq!(Animal_eat(h), 0);
        assert_eq!(Animal_delete(h), 0);

        // Double delete is detected, not a double free.
        assert_eq!(Animal_delete(h), BridgeStatus::StaleHandle as i32);
        assert_eq!(bridge_last_status(), BridgeStatus::StaleHandle as i32);
        assert!(!bridge_last_error().is_null());
        bridge_clear_error();
        assert!(bridge_last_error().is_null());
    }

    #[test]
    fn test_cat_through_c_symbols() {
        let c = Cat_new();
        assert!(!c.is_null());

        assert_eq!(Animal_eat(c), 0);
        assert_eq!(Cat_eat(c), 0);
        assert_eq!(Cat_scratch(c), 0);
        assert_eq!(Cat___mul_number(c, 2), 84);
        assert_eq!(Cat_delete(c), 0);

        // Use after free on a value-returning symbol: sentinel plus last error.
        assert_eq!(Cat___mul_number(c, 2), 0);
        assert_eq!(bridge_last_status(), BridgeStatus::StaleHandle as i32);
    }

    #[test]
    fn test_own_method_rejects_base_handle() {
        let h = Animal_new();
        assert_eq!(Cat_scratch(h), BridgeStatus::TypeMismatch as i32);
        assert_eq!(Cat_delete(h), BridgeStatus::TypeMismatch as i32);
        assert_eq!(Animal_delete(h), 0);
    }

    #[test]
    fn test_two_handles_are_independent() {
        let a = Cat_new();
        let b = Cat_new();
        assert_ne!(a, b);
        assert_eq!(Cat_delete(a), 0);
        assert_eq!(Cat___mul_number(b, 3), 126);
        assert_eq!(Cat_delete(b), 0);
    }

    #[test]
    fn test_null_and_forged_handles() {
        assert_eq!(Animal_eat(ptr::null_mut()), BridgeStatus::NullHandle as i32);
        assert_eq!(Cat_delete(ptr::null_mut()), BridgeStatus::NullHandle as i32);

        // Index half zero: never issued.
        let forged = (1usize << (usize::BITS / 2)) as *mut c_void;
        assert_eq!(Animal_eat(forged), BridgeStatus::UnknownHandle as i32);
    }

    #[test]
    fn test_overflow_is_reported() {
        let c = Cat_new();
        assert_eq!(Cat___mul_number(c, i64::MAX), 0);
        assert_eq!(bridge_last_status(), BridgeStatus::Overflow as i32);
        assert_eq!(Cat_delete(c), 0);
    }

    #[test]
    fn test_successful_call_clears_previous_error() {
        let c = Cat_new();
        assert_eq!(Cat___mul_number(c, i64::MAX), 0);
        assert_eq!(bridge_last_status(), BridgeStatus::Overflow as i32);

        // A genuine zero product must be distinguishable from the sentinel.
        assert_eq!(Cat___mul_number(c, 0), 0);
        assert_eq!(bridge_last_status(), BridgeStatus::Ok as i32);
        assert!(bridge_last_error().is_null());

        assert_eq!(Cat_eat(ptr::null_mut()), BridgeStatus::NullHandle as i32);
        assert_eq!(Cat_eat(c), 0);
        assert_eq!(bridge_last_status(), BridgeStatus::Ok as i32);
        assert_eq!(Cat_delete(c), 0);
    }

    #[test]
    fn test_configure_rejects_bad_input() {
        let malformed = CString::new("{ nope").unwrap();
        assert_eq!(
            unsafe { bridge_configure(malformed.as_ptr()) },
            BridgeStatus::Config as i32
        );

        let invalid_utf8 = CString::new(vec![0xffu8, 0xfe]).unwrap();
        assert_eq!(
            unsafe { bridge_configure(invalid_utf8.as_ptr()) },
            BridgeStatus::InvalidArgument as i32
        );
    }

    #[test]
    fn test_header_and_manifest_strings() {
        let header = bridge_header();
        assert!(!header.is_null());
        let text = unsafe { CStr::from_ptr(header) }.to_str().unwrap().to_owned();
        unsafe { bridge_string_free(header) };
        assert!(text.contains("int64_t Cat___mul_number(void* self, int64_t arg1);"));

        let manifest = bridge_manifest_json();
        assert!(!manifest.is_null());
        let json = unsafe { CStr::from_ptr(manifest) }.to_str().unwrap().to_owned();
        unsafe { bridge_string_free(manifest) };
        let table: BindingTable = serde_json::from_str(&json).unwrap();
        assert!(table.binding("Cat").is_some());

        unsafe { bridge_string_free(ptr::null_mut()) };
    }

    #[test]
    fn test_version_is_crate_version() {
        let version = unsafe { CStr::from_ptr(bridge_version()) }.to_str().unwrap();
        assert_eq!(version, crate::VERSION);
    }
}
