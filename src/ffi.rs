//! FFI bindings for Tracklab
//!
//! C-compatible functions for calling Tracklab from other languages. All
//! string arguments are null-terminated UTF-8; returned strings are newly
//! allocated and must be freed with `tracklab_free_string`.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

use uuid::Uuid;

use crate::config::Settings;
use crate::pipeline::{
    all_experiment_results_json, dual_series_json, experiment_results_json, Dataset,
    InsightProcessor,
};
use crate::series::Selection;
use crate::stats::pearson_correlation;
use crate::types::UserContext;

thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

fn set_last_error(msg: &str) {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = CString::new(msg).ok();
    });
}

fn clear_last_error() {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = None;
    });
}

unsafe fn cstr_to_string(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    CStr::from_ptr(ptr).to_str().ok().map(|s| s.to_string())
}

/// Read a required string argument, recording an error when it is unusable
unsafe fn required_arg(ptr: *const c_char, name: &str) -> Option<String> {
    let value = cstr_to_string(ptr);
    if value.is_none() {
        set_last_error(&format!("Invalid {name} string pointer"));
    }
    value
}

fn string_to_cstr(s: &str) -> *mut c_char {
    match CString::new(s) {
        Ok(cstr) => cstr.into_raw(),
        Err(_) => ptr::null_mut(),
    }
}

fn result_to_cstr<E: std::fmt::Display>(result: Result<String, E>) -> *mut c_char {
    match result {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

// ============================================================================
// Stateless API
// ============================================================================

/// Compute results for one experiment of a dataset document.
///
/// # Safety
/// - `dataset_json` and `experiment_id` must be valid null-terminated C strings.
/// - Returns a newly allocated string that must be freed with `tracklab_free_string`.
/// - Returns NULL on error; call `tracklab_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn tracklab_experiment_results(
    dataset_json: *const c_char,
    experiment_id: *const c_char,
) -> *mut c_char {
    clear_last_error();

    let Some(dataset) = required_arg(dataset_json, "dataset JSON") else {
        return ptr::null_mut();
    };
    let Some(experiment_id) = required_arg(experiment_id, "experiment id") else {
        return ptr::null_mut();
    };

    result_to_cstr(experiment_results_json(&dataset, &experiment_id))
}

/// Compute results for every experiment of a dataset document (JSON array).
///
/// # Safety
/// - `dataset_json` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `tracklab_free_string`.
/// - Returns NULL on error; call `tracklab_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn tracklab_all_experiment_results(
    dataset_json: *const c_char,
) -> *mut c_char {
    clear_last_error();

    let Some(dataset) = required_arg(dataset_json, "dataset JSON") else {
        return ptr::null_mut();
    };

    result_to_cstr(all_experiment_results_json(&dataset))
}

/// Build a dual-metric chart series.
///
/// # Safety
/// - `dataset_json` and `selection_json` must be valid null-terminated C strings.
/// - Returns a newly allocated string that must be freed with `tracklab_free_string`.
/// - Returns NULL on error; call `tracklab_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn tracklab_dual_series(
    dataset_json: *const c_char,
    selection_json: *const c_char,
) -> *mut c_char {
    clear_last_error();

    let Some(dataset) = required_arg(dataset_json, "dataset JSON") else {
        return ptr::null_mut();
    };
    let Some(selection) = required_arg(selection_json, "selection JSON") else {
        return ptr::null_mut();
    };

    result_to_cstr(dual_series_json(&dataset, &selection))
}

/// Pearson correlation of two `len`-element arrays.
///
/// Returns 1 and writes the coefficient to `out` when it is defined, 0 when
/// there is not enough data or a series is constant, -1 on invalid pointers.
///
/// # Safety
/// - `xs` and `ys` must each point to `len` readable `f64` values.
/// - `out` must point to a writable `f64`.
#[no_mangle]
pub unsafe extern "C" fn tracklab_pearson(
    xs: *const f64,
    ys: *const f64,
    len: usize,
    out: *mut f64,
) -> i32 {
    clear_last_error();

    if out.is_null() || (len > 0 && (xs.is_null() || ys.is_null())) {
        set_last_error("Null pointer passed to tracklab_pearson");
        return -1;
    }
    if len == 0 {
        return 0;
    }

    let xs = std::slice::from_raw_parts(xs, len);
    let ys = std::slice::from_raw_parts(ys, len);
    match pearson_correlation(xs, ys) {
        Some(r) => {
            *out = r;
            1
        }
        None => 0,
    }
}

// ============================================================================
// Stateful Processor API
// ============================================================================

/// Opaque handle to an InsightProcessor
pub struct InsightProcessorHandle {
    processor: InsightProcessor,
}

/// Create a new processor.
///
/// `report_threshold` <= 0 selects the default.
///
/// # Safety
/// - Returns a pointer to a newly allocated processor.
/// - Must be freed with `tracklab_processor_free`.
#[no_mangle]
pub unsafe extern "C" fn tracklab_processor_new(report_threshold: i32) -> *mut InsightProcessorHandle {
    clear_last_error();

    let mut settings = Settings::default();
    if report_threshold > 0 {
        settings.report_threshold = report_threshold as u32;
    }

    let handle = Box::new(InsightProcessorHandle {
        processor: InsightProcessor::with_settings(&settings),
    });
    Box::into_raw(handle)
}

/// Free a processor.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `tracklab_processor_new`.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn tracklab_processor_free(processor: *mut InsightProcessorHandle) {
    if !processor.is_null() {
        drop(Box::from_raw(processor));
    }
}

/// Replace the processor's dataset.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `tracklab_processor_new`.
/// - `dataset_json` must be a valid null-terminated C string.
/// - Returns 0 on success, non-zero on error.
#[no_mangle]
pub unsafe extern "C" fn tracklab_processor_load_dataset(
    processor: *mut InsightProcessorHandle,
    dataset_json: *const c_char,
) -> i32 {
    clear_last_error();

    if processor.is_null() {
        set_last_error("Null processor pointer");
        return -1;
    }
    let handle = &mut *processor;

    let Some(json) = required_arg(dataset_json, "dataset JSON") else {
        return -1;
    };

    match Dataset::from_json(&json) {
        Ok(dataset) => {
            handle.processor.load_dataset(dataset);
            0
        }
        Err(e) => {
            set_last_error(&e.to_string());
            -1
        }
    }
}

/// Chart a selection for `user_id`, using the processor's memo cache.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `tracklab_processor_new`.
/// - `user_id` and `selection_json` must be valid null-terminated C strings.
/// - Returns a newly allocated string that must be freed with `tracklab_free_string`.
/// - Returns NULL on error; call `tracklab_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn tracklab_processor_chart(
    processor: *mut InsightProcessorHandle,
    user_id: *const c_char,
    selection_json: *const c_char,
) -> *mut c_char {
    clear_last_error();

    if processor.is_null() {
        set_last_error("Null processor pointer");
        return ptr::null_mut();
    }
    let handle = &mut *processor;

    let Some(user_id) = required_arg(user_id, "user id") else {
        return ptr::null_mut();
    };
    let Some(selection_json) = required_arg(selection_json, "selection JSON") else {
        return ptr::null_mut();
    };

    let user_id = match Uuid::parse_str(user_id.trim()) {
        Ok(id) => id,
        Err(e) => {
            set_last_error(&format!("Invalid user id: {e}"));
            return ptr::null_mut();
        }
    };
    let selection: Selection = match serde_json::from_str(&selection_json) {
        Ok(selection) => selection,
        Err(e) => {
            set_last_error(&format!("Invalid selection: {e}"));
            return ptr::null_mut();
        }
    };

    let ctx = UserContext::new(user_id);
    result_to_cstr(
        handle
            .processor
            .chart(&ctx, selection)
            .and_then(|series| serde_json::to_string(&series).map_err(Into::into)),
    )
}

/// Save the processor's vote ledger to JSON.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `tracklab_processor_new`.
/// - Returns a newly allocated string that must be freed with `tracklab_free_string`.
/// - Returns NULL on error; call `tracklab_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn tracklab_processor_save_ledger(
    processor: *mut InsightProcessorHandle,
) -> *mut c_char {
    clear_last_error();

    if processor.is_null() {
        set_last_error("Null processor pointer");
        return ptr::null_mut();
    }
    let handle = &*processor;

    result_to_cstr(handle.processor.save_ledger())
}

/// Load the processor's vote ledger from JSON.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `tracklab_processor_new`.
/// - `json` must be a valid null-terminated C string.
/// - Returns 0 on success, non-zero on error.
#[no_mangle]
pub unsafe extern "C" fn tracklab_processor_load_ledger(
    processor: *mut InsightProcessorHandle,
    json: *const c_char,
) -> i32 {
    clear_last_error();

    if processor.is_null() {
        set_last_error("Null processor pointer");
        return -1;
    }
    let handle = &mut *processor;

    let Some(json) = required_arg(json, "ledger JSON") else {
        return -1;
    };

    match handle.processor.load_ledger(&json) {
        Ok(()) => 0,
        Err(e) => {
            set_last_error(&e.to_string());
            -1
        }
    }
}

// ============================================================================
// Memory Management
// ============================================================================

/// Free a string returned by Tracklab functions.
///
/// # Safety
/// - `ptr` must be a valid pointer returned by a Tracklab function, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn tracklab_free_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        drop(CString::from_raw(ptr));
    }
}

// ============================================================================
// Error Handling
// ============================================================================

/// Get the last error message.
///
/// # Safety
/// - The returned pointer is valid until the next Tracklab call on this thread.
/// - Do NOT free the returned pointer.
/// - Returns NULL if no error occurred.
#[no_mangle]
pub unsafe extern "C" fn tracklab_last_error() -> *const c_char {
    LAST_ERROR.with(|e| match &*e.borrow() {
        Some(cstr) => cstr.as_ptr(),
        None => ptr::null(),
    })
}

// ============================================================================
// Version Information
// ============================================================================

/// Get the Tracklab library version.
///
/// # Safety
/// - Returns a pointer to a static string. Do NOT free.
#[no_mangle]
pub unsafe extern "C" fn tracklab_version() -> *const c_char {
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}
