//! Runtime version resolution from a project manifest.
//!
//! Reads `engines.node` from a package.json. The asymmetry here is
//! deliberate and load-bearing: an ABSENT field falls back to
//! [`DEFAULT_VERSION`], while a field that is PRESENT but null (JSON null
//! or the literal string "null") aborts with
//! [`Error::VersionFieldNull`](crate::Error::VersionFieldNull).

use crate::error::{Error, Result};
use serde_json::Value;
use std::fs;
use std::path::Path;

/// Version used when the manifest does not pin one.
pub const DEFAULT_VERSION: &str = "16";

/// Resolve the required runtime version from a package.json.
pub fn resolve_version(manifest: &Path) -> Result<String> {
    let content = fs::read_to_string(manifest).map_err(|e| Error::ManifestRead {
        path: manifest.to_path_buf(),
        source: e,
    })?;

    let json: Value = serde_json::from_str(&content).map_err(|e| Error::ManifestParse {
        path: manifest.to_path_buf(),
        source: e,
    })?;

    resolve_from_value(&json, manifest)
}

/// Resolve from already-parsed JSON (split out for tests).
fn resolve_from_value(json: &Value, manifest: &Path) -> Result<String> {
    match json.pointer("/engines/node") {
        None => Ok(DEFAULT_VERSION.to_string()),
        Some(Value::Null) => Err(Error::VersionFieldNull {
            manifest: manifest.to_path_buf(),
        }),
        // jq-style tooling renders a missing field as the string "null";
        // manifests written against that convention carry it literally
        Some(Value::String(s)) if s == "null" => Err(Error::VersionFieldNull {
            manifest: manifest.to_path_buf(),
        }),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(other) => Err(Error::VersionFieldInvalid {
            manifest: manifest.to_path_buf(),
            found: json_type_name(other).to_string(),
        }),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
