// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Platform primitives Nuklear is built against.
//!
//! The binding compiles Nuklear without its libc/libm fallbacks and routes
//! memory, math and assertion calls to the `nuklear_*` symbols below. Those
//! symbols dispatch through a process-wide [`Primitives`] table, so a
//! freestanding host can install its own implementations before the first
//! Nuklear call.
//!
//! None of this affects struct layouts; the generated assertions hold no
//! matter which table is installed.

use parking_lot::RwLock;
use std::ffi::CStr;
use std::os::raw::{c_char, c_int, c_void};

/// Called with the failed condition, source file and line.
pub type AssertHandler = fn(condition: &str, file: &str, line: u32);

/// Named function slots supplied to the native library.
#[derive(Debug, Clone, Copy)]
pub struct Primitives {
    pub memset: fn(dest: &mut [u8], value: u8),
    pub memcpy: fn(dest: &mut [u8], src: &[u8]),
    pub inv_sqrt: fn(f32) -> f32,
    pub sin: fn(f32) -> f32,
    pub cos: fn(f32) -> f32,
    pub atan: fn(f32) -> f32,
    pub atan2: fn(y: f32, x: f32) -> f32,
    /// `None` logs the failure and aborts.
    pub assert_handler: Option<AssertHandler>,
}

impl Primitives {
    /// Implementations backed by the Rust standard library.
    pub const STD: Primitives = Primitives {
        memset: std_memset,
        memcpy: std_memcpy,
        inv_sqrt: std_inv_sqrt,
        sin: f32::sin,
        cos: f32::cos,
        atan: f32::atan,
        atan2: f32::atan2,
        assert_handler: None,
    };
}

impl Default for Primitives {
    fn default() -> Self {
        Self::STD
    }
}

fn std_memset(dest: &mut [u8], value: u8) {
    dest.fill(value);
}

fn std_memcpy(dest: &mut [u8], src: &[u8]) {
    dest.copy_from_slice(src);
}

fn std_inv_sqrt(n: f32) -> f32 {
    1.0 / n.sqrt()
}

static ACTIVE: RwLock<Primitives> = RwLock::new(Primitives::STD);

/// Replace the active table, returning the previous one.
pub fn install(primitives: Primitives) -> Primitives {
    std::mem::replace(&mut *ACTIVE.write(), primitives)
}

/// Snapshot of the active table.
pub fn current() -> Primitives {
    *ACTIVE.read()
}

/// Fill `size` bytes at `dest` with the low byte of `c0`.
///
/// # Safety
/// `dest` must be valid for writes of `size` bytes.
#[no_mangle]
pub unsafe extern "C" fn nuklear_memset(dest: *mut c_void, c0: c_int, size: u64) {
    if dest.is_null() || size == 0 {
        return;
    }
    let dest = std::slice::from_raw_parts_mut(dest.cast::<u8>(), size as usize);
    (current().memset)(dest, c0 as u8);
}

/// Copy `size` bytes from `src` to `dest`; returns `dest`.
///
/// # Safety
/// Both pointers must be valid for `size` bytes and must not overlap.
#[no_mangle]
pub unsafe extern "C" fn nuklear_memcpy(
    dest: *mut c_void,
    src: *const c_void,
    size: u64,
) -> *mut c_void {
    if dest.is_null() || src.is_null() || size == 0 {
        return dest;
    }
    let len = size as usize;
    let to = std::slice::from_raw_parts_mut(dest.cast::<u8>(), len);
    let from = std::slice::from_raw_parts(src.cast::<u8>(), len);
    (current().memcpy)(to, from);
    dest
}

#[no_mangle]
pub extern "C" fn nuklear_inv_sqrt(n: f32) -> f32 {
    (current().inv_sqrt)(n)
}

#[no_mangle]
pub extern "C" fn nuklear_sin(x: f32) -> f32 {
    (current().sin)(x)
}

#[no_mangle]
pub extern "C" fn nuklear_cos(x: f32) -> f32 {
    (current().cos)(x)
}

#[no_mangle]
pub extern "C" fn nuklear_atan(x: f32) -> f32 {
    (current().atan)(x)
}

#[no_mangle]
pub extern "C" fn nuklear_atan2(y: f32, x: f32) -> f32 {
    (current().atan2)(y, x)
}

/// Report a failed `NK_ASSERT` in debug builds of the library.
///
/// # Safety
/// `condition` and `file` must be null or valid NUL-terminated strings.
#[no_mangle]
pub unsafe extern "C" fn nuklear_assert_handler(
    condition: *const c_char,
    file: *const c_char,
    line: c_int,
) {
    let condition = lossy(condition);
    let file = lossy(file);
    let line = u32::try_from(line).unwrap_or(0);

    tracing::error!("[ERROR] Nuklear assertion failed: {} ({}:{})", condition, file, line);

    match current().assert_handler {
        Some(handler) => handler(&condition, &file, line),
        None => std::process::abort(),
    }
}

unsafe fn lossy(ptr: *const c_char) -> String {
    if ptr.is_null() {
        String::from("<null>")
    } else {
        CStr::from_ptr(ptr).to_string_lossy().into_owned()
    }
}
