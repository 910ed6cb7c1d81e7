// Unix resolution via `dladdr` on an address inside this module.
use std::ffi::{CStr, OsStr, c_void};
use std::mem;
use std::os::unix::ffi::OsStrExt;
use std::path::{Path, PathBuf};

use libc::{Dl_info, dladdr};

use crate::core::error::{Error, ErrorKind};
use crate::core::module_path::ModulePath;

pub type PathUnit = u8;
pub type PathChar = std::os::raw::c_char;

pub const MAX_PATH_UNITS: usize = libc::PATH_MAX as usize;
pub const UNRESOLVED_STATUS: u32 = libc::ENOENT as u32;
pub const PATH_TOO_LONG_STATUS: u32 = libc::ENAMETOOLONG as u32;

#[inline(never)]
pub fn current_module_path() -> Result<ModulePath, Error> {
    // SAFETY: POD C type that is safe to zero initialize.
    let mut info = unsafe { mem::zeroed::<Dl_info>() };

    // SAFETY: return value is checked.
    let res = unsafe { dladdr(current_module_path as *const c_void, &mut info) };
    if res == 0 || info.dli_fname.is_null() {
        return Err(Error::new(ErrorKind::Resolve)
            .with_message("dladdr could not attribute an address to this module")
            .with_os_code(UNRESOLVED_STATUS));
    }

    // SAFETY: `dli_fname` is non-null and NUL-terminated when `dladdr` succeeds.
    let c_str = unsafe { CStr::from_ptr(info.dli_fname) };
    let reported = Path::new(OsStr::from_bytes(c_str.to_bytes()));
    let path = absolutize(reported)?;
    ModulePath::from_path(&path)
}

// glibc reports argv[0] for the main executable and the dlopen argument for
// libraries, either of which may be relative. Symlinks are kept as loaded.
fn absolutize(reported: &Path) -> Result<PathBuf, Error> {
    if reported.is_absolute() {
        return Ok(reported.to_path_buf());
    }
    let resolved = if reported.as_os_str().as_bytes().contains(&b'/') {
        std::path::absolute(reported)
    } else {
        std::env::current_exe()
    };
    resolved.map_err(|err| {
        Error::new(ErrorKind::Resolve)
            .with_message("module path is relative and could not be made absolute")
            .with_path(reported)
            .with_os_code(UNRESOLVED_STATUS)
            .with_source(err)
    })
}
