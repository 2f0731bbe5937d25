//! The value linearizer. Traverses a value in the same canonical order as
//! the shape extractor and fingerprinter — sorted object keys, array index
//! order — and emits a flat sequence of leaf values. [`reconstruct`] is the
//! inverse, walking a [`Shape`] and consuming one value per leaf.

use crate::error::{CoreError, CoreResult};
use crate::shape::Shape;
use crate::value::Value;

/// Flattens `value` into its leaf sequence. Rich scalars occupy a single
/// slot regardless of internal complexity — they are never expanded.
pub fn linearize(value: &Value) -> Vec<Value> {
    let mut out = Vec::new();
    linearize_into(value, &mut out);
    out
}

fn linearize_into(value: &Value, out: &mut Vec<Value>) {
    match value {
        Value::Array(items) => {
            for item in items {
                linearize_into(item, out);
            }
        }
        Value::Object(fields) => {
            let mut sorted: Vec<&(String, Value)> = fields.iter().collect();
            sorted.sort_by(|a, b| a.0.cmp(&b.0));
            for (_, v) in sorted {
                linearize_into(v, out);
            }
        }
        leaf => out.push(leaf.clone()),
    }
}

/// Rebuilds a value from `values` (in the order [`linearize`] would have
/// produced) and `shape`. The contract is that `linearize(v)` and
/// `shape::extract(v)` must already agree; this function performs no
/// upfront length check, only the index-bounds check that running out of
/// values mid-walk implies.
pub fn reconstruct(values: &[Value], shape: &Shape) -> CoreResult<Value> {
    let mut pos = 0usize;
    reconstruct_at(values, &mut pos, shape)
}

fn reconstruct_at(values: &[Value], pos: &mut usize, shape: &Shape) -> CoreResult<Value> {
    match shape {
        Shape::Leaf(_) => {
            let value = values.get(*pos).cloned().ok_or(CoreError::ShapeMismatch {
                expected: *pos + 1,
                found: values.len(),
            })?;
            *pos += 1;
            Ok(value)
        }
        Shape::Array(items) => {
            let mut out = Vec::with_capacity(items.len());
            for item_shape in items {
                out.push(reconstruct_at(values, pos, item_shape)?);
            }
            Ok(Value::Array(out))
        }
        Shape::Object(fields) => {
            let mut out = Vec::with_capacity(fields.len());
            for (key, field_shape) in fields {
                out.push((key.clone(), reconstruct_at(values, pos, field_shape)?));
            }
            Ok(Value::Object(out))
        }
    }
}
