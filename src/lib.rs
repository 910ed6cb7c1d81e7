//! Purpose: liblighthouse, a native module that knows where it was loaded from.
//! Exports: `abi` (C exports), `core` (cache value and errors), `loader`, `platform`, `report`.
//! Role: Built as a `cdylib` for hosts and as an `rlib` for the `lighthouse` CLI and tests.
//! Invariants: The module path is captured once per load and never changes afterward.
pub mod abi;
pub mod core;
pub mod loader;
pub mod platform;
pub mod report;

pub use loader::module_path_cache;
