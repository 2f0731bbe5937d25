//! The shape extractor. Pure function from a [`Value`] to a [`Shape`] —
//! structure only, no leaf content.

use crate::error::{CoreError, CoreResult};
use crate::value::{LeafKind, Value};

/// Default recursion depth cap.
pub const DEFAULT_DEPTH_CAP: usize = 256;

/// Recursive tagged tree describing a value's structure.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Leaf(LeafKind),
    /// Positional; length is part of the shape, so arrays of differing
    /// length never compare equal.
    Array(Vec<Shape>),
    /// Always stored in lexicographic order of keys — the canonical
    /// traversal order shared with the fingerprinter and linearizer.
    Object(Vec<(String, Shape)>),
}

impl Shape {
    pub fn is_empty_object(&self) -> bool {
        matches!(self, Shape::Object(fields) if fields.is_empty())
    }

    pub fn is_empty_array(&self) -> bool {
        matches!(self, Shape::Array(items) if items.is_empty())
    }
}

/// Extracts the [`Shape`] of `value`, using [`DEFAULT_DEPTH_CAP`] as the
/// recursion bound.
pub fn extract(value: &Value) -> CoreResult<Shape> {
    extract_with_cap(value, DEFAULT_DEPTH_CAP)
}

/// Extracts the [`Shape`] of `value`, bounding recursion at `depth_cap`
/// levels. `Value` trees built by this workspace are always acyclic (they
/// are owned Rust trees — no aliasing is possible), but the cap still
/// guards against pathologically deep JSON input turning into a stack
/// overflow rather than assuming acyclicity blindly.
pub fn extract_with_cap(value: &Value, depth_cap: usize) -> CoreResult<Shape> {
    extract_at(value, 0, depth_cap)
}

fn extract_at(value: &Value, depth: usize, cap: usize) -> CoreResult<Shape> {
    if depth > cap {
        return Err(CoreError::CycleDepthExceeded { cap });
    }
    match value {
        Value::Array(items) => {
            let mut shapes = Vec::with_capacity(items.len());
            for item in items {
                shapes.push(extract_at(item, depth + 1, cap)?);
            }
            Ok(Shape::Array(shapes))
        }
        Value::Object(fields) => {
            let mut sorted: Vec<&(String, Value)> = fields.iter().collect();
            sorted.sort_by(|a, b| a.0.cmp(&b.0));
            let mut out = Vec::with_capacity(sorted.len());
            for (key, val) in sorted {
                out.push((key.clone(), extract_at(val, depth + 1, cap)?));
            }
            Ok(Shape::Object(out))
        }
        other => Ok(Shape::Leaf(
            other
                .leaf_kind()
                .expect("Array/Object handled above; every other Value has a leaf kind"),
        )),
    }
}
