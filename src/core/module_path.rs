//! Purpose: The value captured when the module loads: its own path or the reason it has none.
//! Exports: `ModulePath`, `ModulePathCache`.
//! Role: Platform-neutral core behind the C ABI query; no globals live here.
//! Invariants: A `ModulePath` is non-empty, NUL-free and fits `MAX_PATH_UNITS` with its terminator.
//! Invariants: A failed `ModulePathCache` holds no path, so a path is never read past a failure.
//! Invariants: Copies never write past the destination and never leave a partial path behind.
use std::path::{Path, PathBuf};

use crate::core::error::{Error, ErrorKind, to_status_code};
use crate::platform::{self, MAX_PATH_UNITS, PATH_TOO_LONG_STATUS, PathUnit, UNRESOLVED_STATUS};

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ModulePath {
    units: Box<[PathUnit]>,
}

impl ModulePath {
    /// Build from platform path units, without a trailing terminator.
    pub fn from_units(units: &[PathUnit]) -> Result<Self, Error> {
        if units.is_empty() {
            return Err(Error::new(ErrorKind::Resolve)
                .with_message("module path is empty")
                .with_os_code(UNRESOLVED_STATUS));
        }
        if units.contains(&0) {
            return Err(Error::new(ErrorKind::Resolve)
                .with_message("module path contains a NUL unit")
                .with_path(platform::units_to_path(units))
                .with_os_code(UNRESOLVED_STATUS));
        }
        if units.len() + 1 > MAX_PATH_UNITS {
            return Err(Error::new(ErrorKind::Resolve)
                .with_message(format!(
                    "module path needs {} units, capacity is {MAX_PATH_UNITS}",
                    units.len() + 1
                ))
                .with_path(platform::units_to_path(units))
                .with_os_code(PATH_TOO_LONG_STATUS));
        }
        Ok(Self {
            units: units.into(),
        })
    }

    pub fn from_path(path: &Path) -> Result<Self, Error> {
        Self::from_units(&platform::path_to_units(path))
    }

    pub fn units(&self) -> &[PathUnit] {
        &self.units
    }

    /// Length in units, terminator excluded.
    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub fn to_path_buf(&self) -> PathBuf {
        platform::units_to_path(&self.units)
    }

    /// Copy the path plus a NUL terminator into `dest`.
    ///
    /// Mirrors the CRT's `wcscpy_s`: an empty destination is rejected
    /// untouched, and a destination that is too small gets a terminator at
    /// index 0 and nothing else. Returns the number of units copied,
    /// terminator excluded.
    pub fn copy_to(&self, dest: &mut [PathUnit]) -> Result<usize, Error> {
        if dest.is_empty() {
            return Err(Error::new(ErrorKind::InvalidDestination)
                .with_message("destination capacity is zero"));
        }
        let needed = self.units.len() + 1;
        if dest.len() < needed {
            dest[0] = 0;
            return Err(Error::new(ErrorKind::BufferTooSmall).with_message(format!(
                "destination holds {} units, path needs {needed}",
                dest.len()
            )));
        }
        dest[..self.units.len()].copy_from_slice(&self.units);
        dest[self.units.len()] = 0;
        Ok(self.units.len())
    }
}

/// Outcome of resolving the module's own path, frozen at capture time.
#[derive(Debug)]
pub struct ModulePathCache {
    resolved: Result<ModulePath, Error>,
}

impl ModulePathCache {
    pub fn capture(resolved: Result<ModulePath, Error>) -> Self {
        match &resolved {
            Ok(path) => tracing::debug!(
                path = %path.to_path_buf().display(),
                len = path.len(),
                "captured module path"
            ),
            Err(err) => tracing::warn!(
                error = %err,
                status = to_status_code(err),
                "module path unavailable"
            ),
        }
        Self { resolved }
    }

    pub fn path(&self) -> Result<&ModulePath, &Error> {
        self.resolved.as_ref()
    }

    /// Units the platform reported for the path, or `None` after a failure.
    pub fn reported_len(&self) -> Option<usize> {
        self.resolved.as_ref().ok().map(ModulePath::len)
    }

    /// Zero when a path was captured, otherwise the captured status code.
    pub fn status(&self) -> u32 {
        match &self.resolved {
            Ok(_) => 0,
            Err(err) => to_status_code(err),
        }
    }
}
