//! Purpose: Own the process-wide module path cache and fill it on the load event.
//! Exports: `module_path_cache`, and the platform load hook when `loader-hook` is enabled.
//! Role: Single construction point for the cache; everything else reads through it.
//! Invariants: The cache is built exactly once and is immutable afterward.
//! Invariants: A query that races or precedes the load hook resolves lazily via the same
//! `OnceLock`, so no caller observes a partially built cache.
//! Notes: Windows hooks `DllMain`; ELF targets use `.init_array`; Apple uses `__mod_init_func`.
use std::sync::OnceLock;

#[cfg(feature = "loader-hook")]
use crate::core::error::Error;
#[cfg(feature = "loader-hook")]
use crate::core::module_path::ModulePath;
use crate::core::module_path::ModulePathCache;
use crate::platform;

static MODULE_PATH: OnceLock<ModulePathCache> = OnceLock::new();

/// The cache for the module that contains this code.
pub fn module_path_cache() -> &'static ModulePathCache {
    MODULE_PATH.get_or_init(|| ModulePathCache::capture(platform::current_module_path()))
}

#[cfg(feature = "loader-hook")]
fn capture_on_load(resolve: impl FnOnce() -> Result<ModulePath, Error>) {
    MODULE_PATH.get_or_init(|| ModulePathCache::capture(resolve()));
}

#[cfg(all(windows, feature = "loader-hook"))]
mod hook {
    use std::ffi::c_void;

    use windows_sys::Win32::Foundation::{BOOL, HMODULE, TRUE};
    use windows_sys::Win32::System::SystemServices::DLL_PROCESS_ATTACH;

    use crate::platform;

    #[unsafe(no_mangle)]
    #[allow(non_snake_case)]
    pub extern "system" fn DllMain(module: HMODULE, reason: u32, _reserved: *mut c_void) -> BOOL {
        if reason == DLL_PROCESS_ATTACH {
            super::capture_on_load(|| platform::module_path_from_handle(module));
        }
        TRUE
    }
}

#[cfg(all(unix, feature = "loader-hook"))]
mod hook {
    use crate::platform;

    extern "C" fn on_load() {
        super::capture_on_load(platform::current_module_path);
    }

    #[used]
    #[cfg_attr(
        any(target_os = "macos", target_os = "ios"),
        unsafe(link_section = "__DATA,__mod_init_func")
    )]
    #[cfg_attr(
        not(any(target_os = "macos", target_os = "ios")),
        unsafe(link_section = ".init_array")
    )]
    static LOAD_HOOK: extern "C" fn() = on_load;
}
