//! Request body shape and nesting limits.
//!
//! # Responsibilities
//! - Reject bodies that are not a single JSON object
//! - Reject bodies nested deeper than the configured depth
//!
//! # Design Decisions
//! - Body size is capped earlier by `DefaultBodyLimit` (413)
//! - The root object sits at depth 0; each nested value is one deeper

use serde_json::{Map, Value};

/// Why a request body was refused before field validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyViolation {
    /// Body is an array or scalar instead of an object.
    NotAnObject,
    /// Body nests deeper than allowed.
    TooDeep,
}

/// Check shape and depth; on success hand back the top-level object.
pub fn check_body(body: &Value, max_depth: usize) -> Result<&Map<String, Value>, BodyViolation> {
    let Value::Object(map) = body else {
        return Err(BodyViolation::NotAnObject);
    };
    if exceeds_depth(body, 0, max_depth) {
        return Err(BodyViolation::TooDeep);
    }
    Ok(map)
}

fn exceeds_depth(value: &Value, depth: usize, max_depth: usize) -> bool {
    if depth > max_depth {
        return true;
    }
    match value {
        Value::Object(map) => map.values().any(|v| exceeds_depth(v, depth + 1, max_depth)),
        Value::Array(items) => items.iter().any(|v| exceeds_depth(v, depth + 1, max_depth)),
        _ => false,
    }
}
