//! Purpose: JSON shape for module path reports printed by the `lighthouse` CLI.
//! Exports: `ModuleReport`, `report_json`.
//! Invariants: Schema is additive-only; `path` and `length` are present only when `status` is 0.
use serde_json::{Map, Value, json};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleReport {
    /// Library that was probed; `None` when reporting the CLI's own module.
    pub library: Option<String>,
    pub status: u32,
    pub path: Option<String>,
    pub length: Option<usize>,
}

pub fn report_json(report: &ModuleReport) -> Value {
    let mut inner = Map::new();
    if let Some(library) = &report.library {
        inner.insert("library".to_string(), json!(library));
    }
    inner.insert("status".to_string(), json!(report.status));
    if report.status == 0 {
        if let Some(path) = &report.path {
            inner.insert("path".to_string(), json!(path));
        }
        if let Some(length) = report.length {
            inner.insert("length".to_string(), json!(length));
        }
    }

    let mut outer = Map::new();
    outer.insert("module".to_string(), Value::Object(inner));
    Value::Object(outer)
}
