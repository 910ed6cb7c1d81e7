//! Purpose: Ask the operating system where a loaded module lives on disk.
//! Exports: `PathUnit`, `PathChar`, `MAX_PATH_UNITS`, status constants, `current_module_path`.
//! Role: The only place that touches loader APIs (`dladdr`, `GetModuleFileNameW`).
//! Invariants: Resolved paths are absolute and fit in `MAX_PATH_UNITS` including the terminator.
//! Invariants: Failures always carry a non-zero OS status code.
use std::path::{Path, PathBuf};

#[cfg(unix)]
mod unix;
#[cfg(windows)]
mod windows;

#[cfg(unix)]
pub use unix::{
    MAX_PATH_UNITS, PATH_TOO_LONG_STATUS, PathChar, PathUnit, UNRESOLVED_STATUS,
    current_module_path,
};
#[cfg(windows)]
pub use windows::{
    MAX_PATH_UNITS, PATH_TOO_LONG_STATUS, PathChar, PathUnit, UNRESOLVED_STATUS,
    current_module_path, module_path_from_handle,
};

pub fn path_to_units(path: &Path) -> Vec<PathUnit> {
    #[cfg(unix)]
    {
        use std::os::unix::ffi::OsStrExt;
        path.as_os_str().as_bytes().to_vec()
    }
    #[cfg(windows)]
    {
        use std::os::windows::ffi::OsStrExt;
        path.as_os_str().encode_wide().collect()
    }
}

pub fn units_to_path(units: &[PathUnit]) -> PathBuf {
    #[cfg(unix)]
    {
        use std::os::unix::ffi::OsStrExt;
        PathBuf::from(std::ffi::OsStr::from_bytes(units))
    }
    #[cfg(windows)]
    {
        use std::os::windows::ffi::OsStringExt;
        PathBuf::from(std::ffi::OsString::from_wide(units))
    }
}
