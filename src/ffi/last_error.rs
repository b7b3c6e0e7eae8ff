// In: src/ffi/last_error.rs

//! Thread-local record of the outcome of the most recent boundary call.
//!
//! Value-returning symbols (`T_new`, `Cat___mul_number`) can only signal failure
//! with a sentinel, so the details live here. The boundary guard clears the slot
//! at the start of every call, so it is empty exactly when the last call succeeded.

use std::cell::RefCell;
use std::ffi::{c_char, CString};
use std::ptr;

use crate::error::{BridgeError, BridgeStatus};

struct LastError {
    status: BridgeStatus,
    message: CString,
}

thread_local! {
    static LAST_ERROR: RefCell<Option<LastError>> = const { RefCell::new(None) };
}

pub(crate) fn record(err: &BridgeError) {
    let message = CString::new(err.to_string().replace('\0', "\\0")).unwrap_or_default();
    LAST_ERROR.with(|slot| {
        *slot.borrow_mut() = Some(LastError {
            status: err.status(),
            message,
        });
    });
}

pub(crate) fn status() -> BridgeStatus {
    LAST_ERROR.with(|slot| {
        slot.borrow()
            .as_ref()
            .map_or(BridgeStatus::Ok, |last| last.status)
    })
}

/// Pointer to the current message, or null. Valid until the next boundary call
/// on this thread.
pub(crate) fn message_ptr() -> *const c_char {
    LAST_ERROR.with(|slot| {
        slot.borrow()
            .as_ref()
            .map_or(ptr::null(), |last| last.message.as_ptr())
    })
}

pub(crate) fn clear() {
    LAST_ERROR.with(|slot| slot.borrow_mut().take());
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CStr;

    #[test]
    fn test_record_and_clear() {
        clear();
        assert_eq!(status(), BridgeStatus::Ok);
        assert!(message_ptr().is_null());

        record(&BridgeError::StaleHandle(0x101));
        assert_eq!(status(), BridgeStatus::StaleHandle);
        let message = unsafe { CStr::from_ptr(message_ptr()) }.to_str().unwrap();
        assert!(message.contains("stale"));

        clear();
        assert!(message_ptr().is_null());
    }

    #[test]
    fn test_interior_nul_is_escaped() {
        record(&BridgeError::InvalidArgument("a\0b".into()));
        let message = unsafe { CStr::from_ptr(message_ptr()) }.to_str().unwrap();
        assert!(message.ends_with("a\\0b"));
        clear();
    }
}
