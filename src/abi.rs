//! Purpose: C ABI surface of liblighthouse.
//! Exports: `get_module_file_name`, `get_moduleFileName`, `get_module_file_name_length`.
//! Role: Stable exports for hosts that load this module and ask where it lives.
//! Invariants: Status 0 is success; a failed capture returns its OS code on every call.
//! Invariants: Copy failures return `STATUS_INVALID_ARGUMENT` or `STATUS_RANGE` and never
//! write past the caller's capacity.
//! Notes: Path units are UTF-16 on Windows and bytes on Unix.
use std::os::raw::c_int;

use crate::core::error::{Error, ErrorKind, to_status_code};
use crate::core::module_path::ModulePathCache;
use crate::loader::module_path_cache;
use crate::platform::{PathChar, PathUnit};

/// Copy this module's path, NUL-terminated, into `buffer`.
///
/// `buffer_capacity` counts path units, terminator included.
#[unsafe(no_mangle)]
pub extern "C" fn get_module_file_name(buffer: *mut PathChar, buffer_capacity: c_int) -> u32 {
    query(module_path_cache(), buffer, buffer_capacity)
}

/// Same as [`get_module_file_name`], under the name older hosts bind to.
#[unsafe(no_mangle)]
#[allow(non_snake_case)]
pub extern "C" fn get_moduleFileName(buffer: *mut PathChar, buffer_capacity: c_int) -> u32 {
    query(module_path_cache(), buffer, buffer_capacity)
}

/// Cached path length in units, terminator excluded; -1 when no path was captured.
#[unsafe(no_mangle)]
pub extern "C" fn get_module_file_name_length() -> c_int {
    length(module_path_cache())
}

pub(crate) fn length(cache: &ModulePathCache) -> c_int {
    cache
        .reported_len()
        .and_then(|len| c_int::try_from(len).ok())
        .unwrap_or(-1)
}

pub(crate) fn query(cache: &ModulePathCache, buffer: *mut PathChar, capacity: c_int) -> u32 {
    let path = match cache.path() {
        Ok(path) => path,
        Err(err) => return to_status_code(err),
    };
    let dest = match borrow_destination(buffer, capacity) {
        Ok(dest) => dest,
        Err(err) => return reject(err),
    };
    match path.copy_to(dest) {
        Ok(_) => 0,
        Err(err) => reject(err),
    }
}

fn borrow_destination<'a>(
    buffer: *mut PathChar,
    capacity: c_int,
) -> Result<&'a mut [PathUnit], Error> {
    if buffer.is_null() {
        return Err(Error::new(ErrorKind::InvalidDestination).with_message("buffer is null"));
    }
    let capacity = usize::try_from(capacity)
        .ok()
        .filter(|capacity| *capacity > 0)
        .ok_or_else(|| {
            Error::new(ErrorKind::InvalidDestination)
                .with_message(format!("buffer capacity {capacity} is not positive"))
        })?;
    // SAFETY: the caller guarantees `buffer` is writable for `capacity` units.
    let dest = unsafe { std::slice::from_raw_parts_mut(buffer.cast::<PathUnit>(), capacity) };
    Ok(dest)
}

fn reject(err: Error) -> u32 {
    let status = to_status_code(&err);
    tracing::trace!(error = %err, status, "module path query rejected");
    status
}

#[cfg(test)]
mod tests {
    use super::{
        get_module_file_name, get_module_file_name_length, get_moduleFileName, length, query,
    };
    use crate::core::error::{Error, ErrorKind, STATUS_INVALID_ARGUMENT, STATUS_RANGE};
    use crate::core::module_path::{ModulePath, ModulePathCache};
    use crate::platform::{MAX_PATH_UNITS, PathChar, PathUnit, path_to_units, units_to_path};
    use std::os::raw::c_int;
    use std::path::{Path, PathBuf};
    use std::ptr;

    const SENTINEL: PathUnit = 0x2a;
    const MAX_CAPACITY: c_int = MAX_PATH_UNITS as c_int;

    fn plugin_path() -> &'static Path {
        if cfg!(windows) {
            Path::new(r"C:\apps\tool\plugin.dll")
        } else {
            Path::new("/apps/tool/plugin.so")
        }
    }

    fn plugin_cache() -> ModulePathCache {
        ModulePathCache::capture(ModulePath::from_path(plugin_path()))
    }

    fn failed_cache(code: u32) -> ModulePathCache {
        ModulePathCache::capture(Err(Error::new(ErrorKind::Resolve).with_os_code(code)))
    }

    fn call(cache: &ModulePathCache, buf: &mut [PathUnit], capacity: c_int) -> u32 {
        query(cache, buf.as_mut_ptr().cast::<PathChar>(), capacity)
    }

    fn terminated(buf: &[PathUnit]) -> PathBuf {
        let end = buf.iter().position(|unit| *unit == 0).expect("terminator");
        units_to_path(&buf[..end])
    }

    #[test]
    fn plugin_query_with_max_path_buffer() {
        let cache = plugin_cache();
        let mut buf = vec![SENTINEL; 260];
        assert_eq!(call(&cache, &mut buf, 260), 0);
        assert_eq!(terminated(&buf), plugin_path());
    }

    #[test]
    fn plugin_query_with_five_unit_buffer_is_range_error() {
        let cache = plugin_cache();
        let mut buf = vec![SENTINEL; 16];
        assert_eq!(call(&cache, &mut buf, 5), STATUS_RANGE);
        assert_eq!(buf[0], 0);
        assert!(buf[1..].iter().all(|unit| *unit == SENTINEL));
    }

    #[test]
    fn failed_capture_wins_over_any_buffer() {
        let cache = failed_cache(126);
        for capacity in [0usize, 1, 5, 260, MAX_PATH_UNITS] {
            let mut buf = vec![SENTINEL; capacity.max(1)];
            let status = call(&cache, &mut buf, capacity as c_int);
            assert_eq!(status, 126, "capacity {capacity}");
            assert!(buf.iter().all(|unit| *unit == SENTINEL));
        }
        assert_eq!(query(&cache, ptr::null_mut(), 260), 126);
    }

    #[test]
    fn length_tracks_capture_outcome() {
        let expected = path_to_units(plugin_path()).len() as c_int;
        assert_eq!(length(&plugin_cache()), expected);
        assert_eq!(length(&failed_cache(126)), -1);
    }

    #[test]
    fn null_or_non_positive_destination_is_invalid() {
        let cache = plugin_cache();
        assert_eq!(query(&cache, ptr::null_mut(), 260), STATUS_INVALID_ARGUMENT);

        let mut buf = vec![SENTINEL; 4];
        assert_eq!(call(&cache, &mut buf, 0), STATUS_INVALID_ARGUMENT);
        assert_eq!(call(&cache, &mut buf, -1), STATUS_INVALID_ARGUMENT);
        assert!(buf.iter().all(|unit| *unit == SENTINEL));
    }

    #[test]
    fn repeated_queries_return_identical_paths() {
        let cache = plugin_cache();
        let mut first = vec![0; 64];
        let mut second = vec![SENTINEL; 64];
        assert_eq!(call(&cache, &mut first, 64), 0);
        assert_eq!(call(&cache, &mut second, 64), 0);
        assert_eq!(terminated(&first), terminated(&second));
    }

    #[test]
    fn exported_query_reports_this_binary() {
        let mut buf = vec![0 as PathChar; MAX_PATH_UNITS];
        let status = get_module_file_name(buf.as_mut_ptr(), MAX_CAPACITY);
        assert_eq!(status, 0);

        let buf: Vec<PathUnit> = buf.into_iter().map(|unit| unit as PathUnit).collect();
        let path = terminated(&buf);
        assert!(path.is_absolute());
        let len = get_module_file_name_length();
        assert_eq!(len as usize, path_to_units(&path).len());
    }

    #[test]
    fn legacy_export_matches_primary() {
        let mut primary = vec![0 as PathChar; MAX_PATH_UNITS];
        let mut legacy = vec![0 as PathChar; MAX_PATH_UNITS];
        assert_eq!(get_module_file_name(primary.as_mut_ptr(), MAX_CAPACITY), 0);
        assert_eq!(get_moduleFileName(legacy.as_mut_ptr(), MAX_CAPACITY), 0);
        assert_eq!(primary, legacy);
    }

    #[test]
    fn concurrent_queries_agree() {
        let handles: Vec<_> = (0..8)
            .map(|_| {
                std::thread::spawn(|| {
                    let mut buf = vec![0 as PathChar; MAX_PATH_UNITS];
                    let status = get_module_file_name(buf.as_mut_ptr(), MAX_CAPACITY);
                    (status, buf)
                })
            })
            .collect();

        let results: Vec<_> = handles
            .into_iter()
            .map(|handle| handle.join().expect("join"))
            .collect();
        let (_, expected) = &results[0];
        for (status, buf) in &results {
            assert_eq!(*status, 0);
            assert_eq!(buf, expected);
        }
    }
}
