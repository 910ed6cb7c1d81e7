// Windows resolution via `GetModuleFileNameW`.
use std::ptr;

use windows_sys::Win32::Foundation::{
    ERROR_INSUFFICIENT_BUFFER, ERROR_MOD_NOT_FOUND, GetLastError, HMODULE, MAX_PATH,
};
use windows_sys::Win32::System::LibraryLoader::{
    GET_MODULE_HANDLE_EX_FLAG_FROM_ADDRESS, GET_MODULE_HANDLE_EX_FLAG_UNCHANGED_REFCOUNT,
    GetModuleFileNameW, GetModuleHandleExW,
};

use crate::core::error::{Error, ErrorKind};
use crate::core::module_path::ModulePath;

pub type PathUnit = u16;
pub type PathChar = u16;

pub const MAX_PATH_UNITS: usize = MAX_PATH as usize;
pub const UNRESOLVED_STATUS: u32 = ERROR_MOD_NOT_FOUND;
pub const PATH_TOO_LONG_STATUS: u32 = ERROR_INSUFFICIENT_BUFFER;

/// Resolve the file behind a loader handle, e.g. the one `DllMain` receives.
pub fn module_path_from_handle(module: HMODULE) -> Result<ModulePath, Error> {
    let mut buf = [0u16; MAX_PATH_UNITS];
    // SAFETY: `buf` holds exactly `MAX_PATH` units.
    let written = unsafe { GetModuleFileNameW(module, buf.as_mut_ptr(), MAX_PATH) } as usize;
    if written == 0 {
        // SAFETY: no other API call sits between the failure and this read.
        let code = unsafe { GetLastError() };
        return Err(Error::new(ErrorKind::Resolve)
            .with_message("GetModuleFileNameW failed")
            .with_os_code(if code == 0 { UNRESOLVED_STATUS } else { code }));
    }
    // Truncation returns the full buffer size; older systems leave the last
    // error untouched, so report it explicitly.
    if written >= MAX_PATH_UNITS {
        return Err(Error::new(ErrorKind::Resolve)
            .with_message("module path was truncated")
            .with_os_code(PATH_TOO_LONG_STATUS));
    }
    ModulePath::from_units(&buf[..written])
}

#[inline(never)]
pub fn current_module_path() -> Result<ModulePath, Error> {
    let mut module: HMODULE = ptr::null_mut();
    // SAFETY: with FROM_ADDRESS the name argument is an address inside the
    // module; UNCHANGED_REFCOUNT means no matching FreeLibrary is owed.
    let found = unsafe {
        GetModuleHandleExW(
            GET_MODULE_HANDLE_EX_FLAG_FROM_ADDRESS | GET_MODULE_HANDLE_EX_FLAG_UNCHANGED_REFCOUNT,
            current_module_path as *const u16,
            &mut module,
        )
    };
    if found == 0 {
        // SAFETY: read immediately after the failing call.
        let code = unsafe { GetLastError() };
        return Err(Error::new(ErrorKind::Resolve)
            .with_message("GetModuleHandleExW could not attribute an address to this module")
            .with_os_code(if code == 0 { UNRESOLVED_STATUS } else { code }));
    }
    module_path_from_handle(module)
}
