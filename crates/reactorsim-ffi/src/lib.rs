//! C FFI layer for the reactorsim engine.
//!
//! Layouts cross the boundary as a flat, row-major array of two-letter
//! component codes (`"U1"`, `"VV"`, ...). The array length picks the grid
//! width: `6 * (3 + extra_chambers)` for 0 to 6 extra chambers.
//!
//! # Safety
//!
//! Every `extern "C"` function wraps its body in `std::panic::catch_unwind`
//! to prevent Rust panics from crossing the FFI boundary. Null pointer inputs
//! are detected early and return appropriate status codes.
//!
//! # Async classification
//!
//! `reactorsim_run_simulation_async` copies the layout before returning and
//! classifies it on a dedicated worker thread, then invokes the callback on
//! that thread exactly once.

use std::ffi::{CStr, CString, c_char, c_void};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::ptr;
use std::sync::OnceLock;

use reactorsim_core::limits::{BASE_WIDTH, GRID_HEIGHT, MAX_EXTRA_CHAMBERS};
use reactorsim_core::{Device, RunResult, classify};
use reactorsim_data::codes::{all_codes, parse_code};
use tracing::warn;

// ---------------------------------------------------------------------------
// Status codes
// ---------------------------------------------------------------------------

/// Status codes returned by all FFI functions.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReactorSimStatus {
    /// Success.
    Ok = 0,
    /// A required pointer argument was null.
    NullPointer = 1,
    /// The code array length (or chamber count) does not describe a grid.
    InvalidLength = 2,
    /// A code is not valid UTF-8 or not a known component code.
    InvalidCode = 3,
    /// Classification reached a state it does not expect.
    SimulationFailed = 4,
    /// An internal panic was caught at the FFI boundary.
    InternalError = 5,
    /// The worker thread for an async run could not be started.
    SpawnFailed = 6,
}

// ---------------------------------------------------------------------------
// FFI-safe result types
// ---------------------------------------------------------------------------

/// C-compatible classification result. Optional counts use -1 for "none".
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FfiRunResult {
    pub efficiency: f64,
    pub total_eu_per_cycle: f64,
    pub eu_per_tick: i32,
    pub overall_eu_per_tick: i32,
    pub uses_single_use_coolant: bool,
    pub timed_out: bool,
    pub cooldown_ticks: u32,
    /// -1 when the cooldown timed out.
    pub cycle_ticks: i64,
    /// 1 through 5, or 0 for a layout without fuel.
    pub mark: u8,
    pub num_iterations_before_failure: i64,
    pub ticks_until_meltdown: i64,
    pub ticks_until_component_failure: i64,
    pub total_cost: i32,
}

fn or_sentinel(value: Option<u32>) -> i64 {
    value.map_or(-1, i64::from)
}

impl From<&RunResult> for FfiRunResult {
    fn from(r: &RunResult) -> Self {
        Self {
            efficiency: r.efficiency,
            total_eu_per_cycle: r.total_eu_per_cycle,
            eu_per_tick: r.eu_per_tick,
            overall_eu_per_tick: r.overall_eu_per_tick,
            uses_single_use_coolant: r.uses_single_use_coolant,
            timed_out: r.timed_out,
            cooldown_ticks: r.cooldown_ticks,
            cycle_ticks: or_sentinel(r.cycle_ticks),
            mark: r.mark_level(),
            num_iterations_before_failure: or_sentinel(r.num_iterations_before_failure),
            ticks_until_meltdown: or_sentinel(r.ticks_until_meltdown),
            ticks_until_component_failure: or_sentinel(r.ticks_until_component_failure),
            total_cost: r.total_cost,
        }
    }
}

/// Grid size for a chamber count.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FfiGridDimensions {
    pub width: u32,
    pub height: u32,
}

/// Completion callback for async runs.
///
/// `result` is valid only for the duration of the call and is null unless
/// `status` is `Ok`.
pub type ReactorSimCallback = Option<
    unsafe extern "C" fn(status: ReactorSimStatus, result: *const FfiRunResult, user_data: *mut c_void),
>;

/// Caller-owned context handed back to the callback on the worker thread.
struct UserData(*mut c_void);

// SAFETY: the pointer is never dereferenced on the Rust side; the caller
// promises it may be used from the worker thread.
unsafe impl Send for UserData {}

impl UserData {
    fn into_inner(self) -> *mut c_void {
        self.0
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Build a device from a C array of code strings.
///
/// # Safety
///
/// `codes` must point to `len` readable pointers, each null or pointing to a
/// NUL-terminated string.
unsafe fn read_layout(codes: *const *const c_char, len: usize) -> Result<Device, ReactorSimStatus> {
    if codes.is_null() {
        return Err(ReactorSimStatus::NullPointer);
    }
    let extra = Device::extra_chambers_for_len(len).map_err(|_| ReactorSimStatus::InvalidLength)?;

    // SAFETY: caller guarantees `codes` points to `len` pointers.
    let raw = unsafe { std::slice::from_raw_parts(codes, len) };
    let mut kinds = Vec::with_capacity(len);
    for &code in raw {
        if code.is_null() {
            return Err(ReactorSimStatus::NullPointer);
        }
        // SAFETY: caller guarantees each non-null entry is NUL-terminated.
        let code = unsafe { CStr::from_ptr(code) };
        let kind = code
            .to_str()
            .ok()
            .and_then(parse_code)
            .ok_or(ReactorSimStatus::InvalidCode)?;
        kinds.push(kind);
    }

    Device::from_kinds(extra, &kinds).map_err(|_| ReactorSimStatus::InvalidLength)
}

fn run(device: &Device) -> Result<FfiRunResult, ReactorSimStatus> {
    classify(device)
        .map(|r| FfiRunResult::from(&r))
        .map_err(|e| {
            warn!(error = %e, "classification failed");
            ReactorSimStatus::SimulationFailed
        })
}

fn codes_table() -> &'static [CString] {
    static CODES: OnceLock<Vec<CString>> = OnceLock::new();
    CODES.get_or_init(|| all_codes().filter_map(|c| CString::new(c).ok()).collect())
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

/// Classify a layout on the calling thread and write the result to `out`.
///
/// # Safety
///
/// `codes` must point to `len` pointers to NUL-terminated strings, and `out`
/// must be a valid pointer to writable `FfiRunResult` memory.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn reactorsim_run_simulation(
    codes: *const *const c_char,
    len: usize,
    out: *mut FfiRunResult,
) -> ReactorSimStatus {
    if out.is_null() {
        return ReactorSimStatus::NullPointer;
    }
    match catch_unwind(AssertUnwindSafe(|| {
        // SAFETY: forwarded caller guarantees.
        let device = unsafe { read_layout(codes, len) }?;
        run(&device)
    })) {
        Ok(Ok(result)) => {
            // SAFETY: caller guarantees `out` is valid.
            unsafe { *out = result };
            ReactorSimStatus::Ok
        }
        Ok(Err(status)) => status,
        Err(_) => ReactorSimStatus::InternalError,
    }
}

/// Classify a layout on a worker thread.
///
/// The layout is validated and copied before this returns; on any error the
/// callback is not invoked. On `Ok`, `callback` runs exactly once on the
/// worker thread with the outcome and `user_data`.
///
/// # Safety
///
/// `codes` must point to `len` pointers to NUL-terminated strings.
/// `user_data` must be safe to use from another thread until the callback
/// has run.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn reactorsim_run_simulation_async(
    codes: *const *const c_char,
    len: usize,
    callback: ReactorSimCallback,
    user_data: *mut c_void,
) -> ReactorSimStatus {
    let Some(callback) = callback else {
        return ReactorSimStatus::NullPointer;
    };
    match catch_unwind(AssertUnwindSafe(|| {
        // SAFETY: forwarded caller guarantees.
        let device = unsafe { read_layout(codes, len) }?;
        let user_data = UserData(user_data);

        std::thread::Builder::new()
            .name("reactorsim-worker".into())
            .spawn(move || {
                let user_data = user_data.into_inner();
                let outcome = catch_unwind(AssertUnwindSafe(|| run(&device)))
                    .unwrap_or(Err(ReactorSimStatus::InternalError));
                // SAFETY: callback contract is documented on ReactorSimCallback.
                match outcome {
                    Ok(result) => unsafe { callback(ReactorSimStatus::Ok, &result, user_data) },
                    Err(status) => unsafe { callback(status, ptr::null(), user_data) },
                }
            })
            .map(|_| ())
            .map_err(|e| {
                warn!(error = %e, "failed to spawn simulation worker");
                ReactorSimStatus::SpawnFailed
            })
    })) {
        Ok(Ok(())) => ReactorSimStatus::Ok,
        Ok(Err(status)) => status,
        Err(_) => ReactorSimStatus::InternalError,
    }
}

// ---------------------------------------------------------------------------
// Layout queries
// ---------------------------------------------------------------------------

/// Width and height of the grid for `extra_chambers`.
///
/// # Safety
///
/// `out` must be a valid pointer to writable `FfiGridDimensions` memory.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn reactorsim_grid_dimensions(
    extra_chambers: u32,
    out: *mut FfiGridDimensions,
) -> ReactorSimStatus {
    if out.is_null() {
        return ReactorSimStatus::NullPointer;
    }
    if extra_chambers as usize > MAX_EXTRA_CHAMBERS {
        return ReactorSimStatus::InvalidLength;
    }
    // SAFETY: caller guarantees `out` is valid.
    unsafe {
        *out = FfiGridDimensions {
            width: BASE_WIDTH as u32 + extra_chambers,
            height: GRID_HEIGHT as u32,
        };
    }
    ReactorSimStatus::Ok
}

/// Number of component codes, including the empty cell `"XX"`.
#[unsafe(no_mangle)]
pub extern "C" fn reactorsim_component_code_count() -> usize {
    catch_unwind(|| codes_table().len()).unwrap_or(0)
}

/// The component code at `index` (discriminant order), or null if out of
/// range. The string is static and must not be freed.
#[unsafe(no_mangle)]
pub extern "C" fn reactorsim_component_code(index: usize) -> *const c_char {
    catch_unwind(|| codes_table().get(index).map_or(ptr::null(), |c| c.as_ptr()))
        .unwrap_or(ptr::null())
}

/// Static description of a status code. Must not be freed.
#[unsafe(no_mangle)]
pub extern "C" fn reactorsim_status_message(status: ReactorSimStatus) -> *const c_char {
    let message: &'static CStr = match status {
        ReactorSimStatus::Ok => c"ok",
        ReactorSimStatus::NullPointer => c"null pointer argument",
        ReactorSimStatus::InvalidLength => c"code count does not describe a 3..9 x 6 grid",
        ReactorSimStatus::InvalidCode => c"unknown component code",
        ReactorSimStatus::SimulationFailed => c"classification failed",
        ReactorSimStatus::InternalError => c"internal error",
        ReactorSimStatus::SpawnFailed => c"could not start worker thread",
    };
    message.as_ptr()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use std::time::Duration;

    const VENTED: [&str; 18] = [
        "XX", "VV", "XX", //
        "VV", "U1", "VV", //
        "XX", "VV", "XX", //
        "XX", "XX", "XX", //
        "XX", "XX", "XX", //
        "XX", "XX", "XX",
    ];

    /// Owned C strings plus the pointer array that borrows them.
    struct CodeArray {
        _owned: Vec<CString>,
        ptrs: Vec<*const c_char>,
    }

    fn code_array(codes: &[&str]) -> CodeArray {
        let owned: Vec<CString> = codes.iter().map(|c| CString::new(*c).unwrap()).collect();
        let ptrs = owned.iter().map(|c| c.as_ptr()).collect();
        CodeArray { _owned: owned, ptrs }
    }

    fn empty_result() -> FfiRunResult {
        FfiRunResult::from(&RunResult::default())
    }

    // -----------------------------------------------------------------------
    // Synchronous runs
    // -----------------------------------------------------------------------

    #[test]
    fn vented_cell_classifies_as_mark_one() {
        let codes = code_array(&VENTED);
        let mut out = empty_result();
        let status = unsafe { reactorsim_run_simulation(codes.ptrs.as_ptr(), 18, &mut out) };
        assert_eq!(status, ReactorSimStatus::Ok);
        assert_eq!(out.mark, 1);
        assert_eq!(out.eu_per_tick, 5);
        assert_eq!(out.cycle_ticks, 10_000);
        assert_eq!(out.ticks_until_meltdown, -1);
        assert_eq!(out.total_cost, 10);
    }

    #[test]
    fn layout_without_fuel_has_mark_zero() {
        let mut codes = vec!["XX"; 18];
        codes[4] = "VA";
        let codes = code_array(&codes);
        let mut out = empty_result();
        let status = unsafe { reactorsim_run_simulation(codes.ptrs.as_ptr(), 18, &mut out) };
        assert_eq!(status, ReactorSimStatus::Ok);
        assert_eq!(out.mark, 0);
        assert_eq!(out.total_cost, 2);
        assert_eq!(out.cycle_ticks, -1);
    }

    #[test]
    fn null_arguments_rejected() {
        let codes = code_array(&VENTED);
        let mut out = empty_result();
        let status = unsafe { reactorsim_run_simulation(ptr::null(), 18, &mut out) };
        assert_eq!(status, ReactorSimStatus::NullPointer);
        let status =
            unsafe { reactorsim_run_simulation(codes.ptrs.as_ptr(), 18, ptr::null_mut()) };
        assert_eq!(status, ReactorSimStatus::NullPointer);

        let mut ptrs = codes.ptrs.clone();
        ptrs[7] = ptr::null();
        let status = unsafe { reactorsim_run_simulation(ptrs.as_ptr(), 18, &mut out) };
        assert_eq!(status, ReactorSimStatus::NullPointer);
    }

    #[test]
    fn bad_lengths_rejected() {
        let codes = code_array(&["XX"; 60]);
        let mut out = empty_result();
        for len in [0, 12, 17, 19, 60] {
            let status = unsafe { reactorsim_run_simulation(codes.ptrs.as_ptr(), len, &mut out) };
            assert_eq!(status, ReactorSimStatus::InvalidLength, "len {len}");
        }
    }

    #[test]
    fn unknown_code_rejected() {
        let mut codes = VENTED;
        codes[4] = "U9";
        let codes = code_array(&codes);
        let mut out = empty_result();
        let status = unsafe { reactorsim_run_simulation(codes.ptrs.as_ptr(), 18, &mut out) };
        assert_eq!(status, ReactorSimStatus::InvalidCode);
    }

    // -----------------------------------------------------------------------
    // Async runs
    // -----------------------------------------------------------------------

    type Outcome = (ReactorSimStatus, Option<FfiRunResult>);

    unsafe extern "C" fn send_outcome(
        status: ReactorSimStatus,
        result: *const FfiRunResult,
        user_data: *mut c_void,
    ) {
        let tx = unsafe { Box::from_raw(user_data.cast::<mpsc::Sender<Outcome>>()) };
        let result = unsafe { result.as_ref() }.copied();
        tx.send((status, result)).unwrap();
    }

    #[test]
    fn async_run_invokes_callback_once() {
        let (tx, rx) = mpsc::channel::<Outcome>();
        let user_data = Box::into_raw(Box::new(tx)).cast::<c_void>();
        let codes = code_array(&VENTED);

        let status = unsafe {
            reactorsim_run_simulation_async(codes.ptrs.as_ptr(), 18, Some(send_outcome), user_data)
        };
        assert_eq!(status, ReactorSimStatus::Ok);
        // The layout was copied; the caller's strings may go away now.
        drop(codes);

        let (status, result) = rx.recv_timeout(Duration::from_secs(120)).unwrap();
        assert_eq!(status, ReactorSimStatus::Ok);
        let result = result.unwrap();
        assert_eq!(result.mark, 1);
        assert_eq!(result.overall_eu_per_tick, 5);
        assert!(rx.recv_timeout(Duration::from_millis(50)).is_err());
    }

    #[test]
    fn async_validation_errors_skip_callback() {
        let codes = code_array(&["XX"; 5]);
        let status = unsafe {
            reactorsim_run_simulation_async(codes.ptrs.as_ptr(), 5, Some(send_outcome), ptr::null_mut())
        };
        assert_eq!(status, ReactorSimStatus::InvalidLength);

        let codes = code_array(&VENTED);
        let status = unsafe {
            reactorsim_run_simulation_async(codes.ptrs.as_ptr(), 18, None, ptr::null_mut())
        };
        assert_eq!(status, ReactorSimStatus::NullPointer);
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    #[test]
    fn grid_dimensions() {
        let mut dims = FfiGridDimensions { width: 0, height: 0 };
        let status = unsafe { reactorsim_grid_dimensions(2, &mut dims) };
        assert_eq!(status, ReactorSimStatus::Ok);
        assert_eq!(dims, FfiGridDimensions { width: 5, height: 6 });
        let status = unsafe { reactorsim_grid_dimensions(7, &mut dims) };
        assert_eq!(status, ReactorSimStatus::InvalidLength);
        let status = unsafe { reactorsim_grid_dimensions(0, ptr::null_mut()) };
        assert_eq!(status, ReactorSimStatus::NullPointer);
    }

    #[test]
    fn component_codes_in_order() {
        assert_eq!(reactorsim_component_code_count(), 23);
        let first = unsafe { CStr::from_ptr(reactorsim_component_code(0)) };
        assert_eq!(first.to_str().unwrap(), "XX");
        let quad = unsafe { CStr::from_ptr(reactorsim_component_code(17)) };
        assert_eq!(quad.to_str().unwrap(), "U4");
        assert!(reactorsim_component_code(23).is_null());
    }

    #[test]
    fn status_messages_are_static() {
        let msg = unsafe { CStr::from_ptr(reactorsim_status_message(ReactorSimStatus::InvalidCode)) };
        assert_eq!(msg.to_str().unwrap(), "unknown component code");
    }

    #[test]
    fn result_conversion_uses_sentinels() {
        let result = RunResult {
            ticks_until_meltdown: Some(42),
            mark: Some(reactorsim_core::Mark::V),
            ..RunResult::default()
        };
        let ffi = FfiRunResult::from(&result);
        assert_eq!(ffi.ticks_until_meltdown, 42);
        assert_eq!(ffi.ticks_until_component_failure, -1);
        assert_eq!(ffi.mark, 5);
    }
}
