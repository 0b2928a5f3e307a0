//! FFI bindings for posturekit
//!
//! C-compatible functions for embedding the engine in mobile and desktop
//! hosts. All functions exchange JSON through C strings (null-terminated)
//! and return allocated memory that must be freed by the caller using
//! `posturekit_free_string`.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

use serde::Deserialize;

use crate::capture::TimingVariant;
use crate::pipeline::{assess, ScanProcessor};
use crate::questionnaire::AnswerLabel;
use crate::report::ReportEncoder;
use crate::types::{BodyMetrics, FaceFrame, FaceMetrics, Landmark, PoseFrame};

// Thread-local storage for the last error message
thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

/// Set the last error message
fn set_last_error(msg: &str) {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = CString::new(msg).ok();
    });
}

/// Clear the last error message
fn clear_last_error() {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = None;
    });
}

/// Helper to convert C string to Rust string
unsafe fn cstr_to_string(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    CStr::from_ptr(ptr).to_str().ok().map(|s| s.to_string())
}

/// Helper to convert Rust string to C string (caller must free)
fn string_to_cstr(s: &str) -> *mut c_char {
    match CString::new(s) {
        Ok(cstr) => cstr.into_raw(),
        Err(_) => ptr::null_mut(),
    }
}

/// Metric input accepted by the stateless assess call.
#[derive(Deserialize)]
struct AssessInput {
    body: BodyMetrics,
    face: FaceMetrics,
    answers: Vec<Option<AnswerLabel>>,
}

/// One detection tick's raw landmark arrays.
#[derive(Deserialize)]
struct FrameInput {
    #[serde(default)]
    face: Option<Vec<Landmark>>,
    #[serde(default)]
    pose: Option<Vec<Landmark>>,
}

// ============================================================================
// Stateless API
// ============================================================================

/// Run a one-shot assessment and return the report JSON.
///
/// # Safety
/// - `input_json` must be a valid null-terminated C string containing
///   `{"body": {...}, "face": {...}, "answers": [...]}`.
/// - Returns a newly allocated string that must be freed with
///   `posturekit_free_string`.
/// - Returns NULL on error; call `posturekit_last_error` for the message.
#[no_mangle]
pub unsafe extern "C" fn posturekit_assess(input_json: *const c_char) -> *mut c_char {
    clear_last_error();

    let input_str = match cstr_to_string(input_json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid input JSON string pointer");
            return ptr::null_mut();
        }
    };

    let input: AssessInput = match serde_json::from_str(&input_str) {
        Ok(input) => input,
        Err(e) => {
            set_last_error(&e.to_string());
            return ptr::null_mut();
        }
    };

    let assessment = match assess(&input.body, &input.face, &input.answers) {
        Ok(assessment) => assessment,
        Err(e) => {
            set_last_error(&e.to_string());
            return ptr::null_mut();
        }
    };

    match ReportEncoder::new().encode_to_json(&assessment) {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

// ============================================================================
// Stateful Processor API
// ============================================================================

/// Opaque handle to a ScanProcessor
pub struct ScanProcessorHandle {
    processor: ScanProcessor,
}

/// Create a new processor.
///
/// # Safety
/// - `use_short_timing` selects the 3 s capture variant when non-zero, the
///   5 s variant otherwise.
/// - Returns a pointer that must be freed with `posturekit_processor_free`.
#[no_mangle]
pub unsafe extern "C" fn posturekit_processor_new(
    use_short_timing: i32,
) -> *mut ScanProcessorHandle {
    clear_last_error();

    let variant = if use_short_timing != 0 {
        TimingVariant::Short
    } else {
        TimingVariant::Long
    };

    let mut processor = ScanProcessor::with_variant(variant);
    processor.session_mut().start();
    let handle = Box::new(ScanProcessorHandle { processor });
    Box::into_raw(handle)
}

/// Free a processor.
///
/// # Safety
/// - `processor` must be a valid pointer returned by
///   `posturekit_processor_new`.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn posturekit_processor_free(processor: *mut ScanProcessorHandle) {
    if !processor.is_null() {
        drop(Box::from_raw(processor));
    }
}

/// Score and store the questionnaire for a processor.
///
/// # Safety
/// - `processor` must be a valid pointer returned by
///   `posturekit_processor_new`.
/// - `answers_json` must be a valid null-terminated C string containing a
///   20-element JSON array of answer labels or nulls.
/// - Returns 0 on success, non-zero on error.
#[no_mangle]
pub unsafe extern "C" fn posturekit_processor_set_questionnaire(
    processor: *mut ScanProcessorHandle,
    answers_json: *const c_char,
) -> i32 {
    clear_last_error();

    if processor.is_null() {
        set_last_error("Null processor pointer");
        return -1;
    }
    let handle = &mut *processor;

    let answers_str = match cstr_to_string(answers_json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid answers JSON string pointer");
            return -1;
        }
    };

    let answers: Vec<Option<AnswerLabel>> = match serde_json::from_str(&answers_str) {
        Ok(answers) => answers,
        Err(e) => {
            set_last_error(&e.to_string());
            return -1;
        }
    };

    match handle.processor.set_questionnaire(&answers) {
        Ok(_) => 0,
        Err(e) => {
            set_last_error(&e.to_string());
            -1
        }
    }
}

/// Drive the capture session by one 100 ms tick and return the frame result
/// JSON.
///
/// # Safety
/// - `processor` must be a valid pointer returned by
///   `posturekit_processor_new`.
/// - `frame_json` must be a valid null-terminated C string containing
///   `{"face": [...], "pose": [...]}` with raw landmark arrays (either may
///   be null or omitted).
/// - Returns a newly allocated string that must be freed with
///   `posturekit_free_string`; NULL on error.
#[no_mangle]
pub unsafe extern "C" fn posturekit_processor_tick(
    processor: *mut ScanProcessorHandle,
    frame_json: *const c_char,
) -> *mut c_char {
    clear_last_error();

    if processor.is_null() {
        set_last_error("Null processor pointer");
        return ptr::null_mut();
    }
    let handle = &mut *processor;

    let frame_str = match cstr_to_string(frame_json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid frame JSON string pointer");
            return ptr::null_mut();
        }
    };

    let frame: FrameInput = match serde_json::from_str(&frame_str) {
        Ok(frame) => frame,
        Err(e) => {
            set_last_error(&e.to_string());
            return ptr::null_mut();
        }
    };

    let face = frame
        .face
        .as_deref()
        .and_then(FaceFrame::from_landmarks);
    let pose = frame
        .pose
        .as_deref()
        .and_then(PoseFrame::from_landmarks);

    let result = match handle
        .processor
        .session_mut()
        .tick(face.as_ref(), pose.as_ref())
    {
        Ok(result) => result,
        Err(e) => {
            set_last_error(&e.to_string());
            return ptr::null_mut();
        }
    };

    match serde_json::to_string(&result) {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Confirm the stage under review (user chose Continue).
///
/// # Safety
/// - `processor` must be a valid pointer returned by
///   `posturekit_processor_new`.
/// - Returns 0 on success, non-zero on error.
#[no_mangle]
pub unsafe extern "C" fn posturekit_processor_confirm(
    processor: *mut ScanProcessorHandle,
) -> i32 {
    clear_last_error();

    if processor.is_null() {
        set_last_error("Null processor pointer");
        return -1;
    }
    let handle = &mut *processor;

    match handle.processor.session_mut().confirm() {
        Ok(_) => 0,
        Err(e) => {
            set_last_error(&e.to_string());
            -1
        }
    }
}

/// Discard the stage under review (user chose Retake).
///
/// # Safety
/// - `processor` must be a valid pointer returned by
///   `posturekit_processor_new`.
/// - Returns 0 on success, non-zero on error.
#[no_mangle]
pub unsafe extern "C" fn posturekit_processor_retake(
    processor: *mut ScanProcessorHandle,
) -> i32 {
    clear_last_error();

    if processor.is_null() {
        set_last_error("Null processor pointer");
        return -1;
    }
    let handle = &mut *processor;

    match handle.processor.session_mut().retake() {
        Ok(()) => 0,
        Err(e) => {
            set_last_error(&e.to_string());
            -1
        }
    }
}

/// Produce the final report JSON once all stages and the questionnaire are
/// in.
///
/// # Safety
/// - `processor` must be a valid pointer returned by
///   `posturekit_processor_new`.
/// - Returns a newly allocated string that must be freed with
///   `posturekit_free_string`; NULL on error.
#[no_mangle]
pub unsafe extern "C" fn posturekit_processor_finish(
    processor: *mut ScanProcessorHandle,
) -> *mut c_char {
    clear_last_error();

    if processor.is_null() {
        set_last_error("Null processor pointer");
        return ptr::null_mut();
    }
    let handle = &*processor;

    let assessment = match handle.processor.finish() {
        Ok(assessment) => assessment,
        Err(e) => {
            set_last_error(&e.to_string());
            return ptr::null_mut();
        }
    };

    match ReportEncoder::new().encode_to_json(&assessment) {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

// ============================================================================
// Memory Management
// ============================================================================

/// Free a string returned by posturekit functions.
///
/// # Safety
/// - `ptr` must be a valid pointer returned by a posturekit function, or
///   NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn posturekit_free_string(ptr: *mut c_char) {
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
/// - Returns a pointer to a thread-local error string.
/// - The returned pointer is valid until the next posturekit call on this
///   thread. Do NOT free it.
/// - Returns NULL if no error occurred.
#[no_mangle]
pub unsafe extern "C" fn posturekit_last_error() -> *const c_char {
    LAST_ERROR.with(|e| match &*e.borrow() {
        Some(cstr) => cstr.as_ptr(),
        None => ptr::null(),
    })
}

// ============================================================================
// Version Information
// ============================================================================

/// Get the posturekit library version.
///
/// # Safety
/// - Returns a pointer to a static string. Do NOT free.
#[no_mangle]
pub unsafe extern "C" fn posturekit_version() -> *const c_char {
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CString;

    fn sample_assess_input() -> CString {
        CString::new(
            r#"{
            "body": {
                "shoulderHeight": 2.0,
                "fhpAngle": 42.0,
                "pelvicTilt": 4.0,
                "kneeAngle": 172.0,
                "footArchRatio": 0.22
            },
            "face": {
                "eyeSym": 0.03,
                "jawShift": 0.02,
                "headTilt": 4.0,
                "nostrilAsym": 0.02,
                "irisWidth": 0.08
            },
            "answers": ["A","A","B","A","B","A","B","A","A","A","A","B","A","C","A","C","C","D","A","A"]
        }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_ffi_assess() {
        let input = sample_assess_input();

        unsafe {
            let result = posturekit_assess(input.as_ptr());
            assert!(!result.is_null());

            let result_str = CStr::from_ptr(result).to_str().unwrap();
            assert!(result_str.contains("reportVersion"));
            assert!(result_str.contains("primaryPattern"));

            posturekit_free_string(result);
        }
    }

    #[test]
    fn test_ffi_error_handling() {
        let invalid = CString::new("not json").unwrap();

        unsafe {
            let result = posturekit_assess(invalid.as_ptr());
            assert!(result.is_null());

            let error = posturekit_last_error();
            assert!(!error.is_null());
            let error_str = CStr::from_ptr(error).to_str().unwrap();
            assert!(!error_str.is_empty());
        }
    }

    #[test]
    fn test_ffi_processor_lifecycle() {
        unsafe {
            let processor = posturekit_processor_new(1);
            assert!(!processor.is_null());

            let answers = CString::new(
                r#"["A","A","B","A","B","A","B","A","A","A","A","B","A","C","A","C","C","D","A","A"]"#,
            )
            .unwrap();
            assert_eq!(
                posturekit_processor_set_questionnaire(processor, answers.as_ptr()),
                0
            );

            // An empty frame is a valid "nothing detected" tick.
            let frame = CString::new(r#"{"face": null, "pose": null}"#).unwrap();
            let result = posturekit_processor_tick(processor, frame.as_ptr());
            assert!(!result.is_null());
            let result_str = CStr::from_ptr(result).to_str().unwrap();
            assert!(result_str.contains("\"aligned\":false"));
            posturekit_free_string(result);

            // Finishing without captures reports the missing stages.
            let report = posturekit_processor_finish(processor);
            assert!(report.is_null());
            assert!(!posturekit_last_error().is_null());

            posturekit_processor_free(processor);
        }
    }

    #[test]
    fn test_ffi_version() {
        unsafe {
            let version = posturekit_version();
            assert!(!version.is_null());
            let version_str = CStr::from_ptr(version).to_str().unwrap();
            assert!(!version_str.is_empty());
        }
    }
}
