//! C ABI for [`generate_3d_lut`](crate::generate_3d_lut)

use std::ffi::{CStr, c_char, c_int};
use std::path::PathBuf;
use std::slice;

use crate::error::Status;

/// # Safety
///
/// `ga_path` and `display_path` must be null or NUL-terminated strings.
/// `r`, `g` and `b` must be null or point to `grid³` writable `u32`s that do
/// not overlap.
#[allow(non_snake_case)]
#[unsafe(no_mangle)]
pub unsafe extern "C" fn generate3dLut(
    ga_path: *const c_char,
    display_path: *const c_char,
    grid: c_int,
    r: *mut u32,
    g: *mut u32,
    b: *mut u32,
) -> c_int {
    let Some(grid) = usize::try_from(grid).ok().filter(|&n| n >= 2) else {
        return Status::WrongGridValue.code();
    };
    if r.is_null() || g.is_null() || b.is_null() {
        return Status::NullPointerForOutput.code();
    }
    // A missing path fails to load in its own turn, so GA is still tried first
    // SAFETY: the caller passes null or a NUL-terminated string
    let ga = unsafe { path_from_c(ga_path) }.unwrap_or_default();
    let display = unsafe { path_from_c(display_path) }.unwrap_or_default();
    let Some(len) = grid.checked_mul(grid).and_then(|n| n.checked_mul(grid)) else {
        return Status::WrongGridValue.code();
    };

    // SAFETY: non-null, caller-sized to grid³ and disjoint
    let (r, g, b) = unsafe {
        (
            slice::from_raw_parts_mut(r, len),
            slice::from_raw_parts_mut(g, len),
            slice::from_raw_parts_mut(b, len),
        )
    };
    crate::generate_3d_lut(ga, display, grid, Some(r), Some(g), Some(b)).code()
}

unsafe fn path_from_c(ptr: *const c_char) -> Option<PathBuf> {
    if ptr.is_null() {
        return None;
    }
    // SAFETY: non-null and NUL-terminated per the caller
    let s = unsafe { CStr::from_ptr(ptr) };
    s.to_str().ok().map(PathBuf::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ptr;

    #[test]
    fn test_status_order() {
        let mut buf = [0u32; 8];
        let p = buf.as_mut_ptr();
        unsafe {
            assert_eq!(generate3dLut(ptr::null(), ptr::null(), 1, p, p, p), 3);
            assert_eq!(generate3dLut(ptr::null(), ptr::null(), -4, p, p, p), 3);
            assert_eq!(generate3dLut(ptr::null(), ptr::null(), 2, p, ptr::null_mut(), p), 4);
            assert_eq!(generate3dLut(ptr::null(), ptr::null(), 2, p, p, p), 1);
        }
    }

    #[test]
    fn test_null_display_after_unreadable_ga() {
        let (mut r, mut g, mut b) = ([0u32; 8], [0u32; 8], [0u32; 8]);
        let ga = c"/nonexistent/oxlut/ga.icc";
        let status = unsafe {
            generate3dLut(
                ga.as_ptr(),
                ptr::null(),
                2,
                r.as_mut_ptr(),
                g.as_mut_ptr(),
                b.as_mut_ptr(),
            )
        };
        assert_eq!(status, Status::CantOpenGa.code());
    }

    #[test]
    fn test_missing_file() {
        let (mut r, mut g, mut b) = ([0u32; 8], [0u32; 8], [0u32; 8]);
        let path = c"/nonexistent/oxlut/ga.icc";
        let status = unsafe {
            generate3dLut(
                path.as_ptr(),
                path.as_ptr(),
                2,
                r.as_mut_ptr(),
                g.as_mut_ptr(),
                b.as_mut_ptr(),
            )
        };
        assert_eq!(status, Status::CantOpenGa.code());
    }
}
