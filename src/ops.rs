//! Immutable read/write/delete/move over nested [`serde_json::Value`]s
//! addressed by a [`Path`].
//!
//! Writers never mutate their input: they rebuild the spine of containers
//! along the path and carry every untouched sibling over as-is. Readers
//! short-circuit on missing or mismatched intermediates instead of erroring.

use serde_json::{Map, Value};
use thiserror::Error;

use crate::path::{Path, PathSegment};

#[derive(Debug, Error, PartialEq)]
pub enum PathOpError {
    #[error("value at `{path}` is not an array")]
    NotAnArray { path: String },
    #[error("index {index} out of bounds for array of length {len}")]
    IndexOutOfBounds { index: usize, len: usize },
}

// ------------------------------- Readers ---------------------------------- //

/// Walk `path` into `root`. Any missing key, out-of-range index, or
/// non-container intermediate yields `None` immediately.
pub fn get_value_at_path<'a>(root: &'a Value, path: &Path) -> Option<&'a Value> {
    let mut current = root;
    for segment in path.segments() {
        current = match (segment, current) {
            (PathSegment::Property(key), Value::Object(map)) => map.get(key)?,
            (PathSegment::Index(i), Value::Array(items)) => items.get(*i)?,
            _ => return None,
        };
    }
    Some(current)
}

/// True only if every property segment names an own key of an object (a
/// `null` value still counts as present) and every index segment is in
/// bounds of an actual array. A `null` or scalar intermediate stops the
/// walk with `false`.
pub fn has_path(root: &Value, path: &Path) -> bool {
    get_value_at_path(root, path).is_some()
}

// ------------------------------- Writers ---------------------------------- //

/// Return a copy of `root` with the value at `path` replaced by `value`.
///
/// The empty path is a no-op that returns the root unchanged (the document
/// root itself is not assignable through this operation). Missing
/// intermediate containers are materialized as `[]` or `{}` depending on
/// whether the next segment is an index or a property, so writing into
/// absent structure never disturbs sibling keys. An index write past the
/// end of an array pads the gap with `null`.
pub fn set_value_at_path(root: &Value, path: &Path, value: Value) -> Value {
    if path.is_empty() {
        return root.clone();
    }
    set_segments(root, path.segments(), value)
}

fn set_segments(current: &Value, segments: &[PathSegment], value: Value) -> Value {
    let (segment, rest) = match segments.split_first() {
        Some(split) => split,
        None => return value,
    };
    match segment {
        PathSegment::Property(key) => {
            let mut map = match current {
                Value::Object(map) => map.clone(),
                _ => Map::new(),
            };
            let child = map.get(key).cloned().unwrap_or(Value::Null);
            map.insert(key.clone(), set_segments(&child, rest, value));
            Value::Object(map)
        }
        PathSegment::Index(i) => {
            let mut items = match current {
                Value::Array(items) => items.clone(),
                _ => Vec::new(),
            };
            if *i >= items.len() {
                items.resize(*i + 1, Value::Null);
            }
            let child = items[*i].clone();
            items[*i] = set_segments(&child, rest, value);
            Value::Array(items)
        }
    }
}

/// Return a copy of `root` with the value at `path` removed. Objects lose
/// the named key; arrays splice the element out, preserving the order of
/// the rest. Deleting the root or a missing target is a no-op copy.
pub fn delete_at_path(root: &Value, path: &Path) -> Value {
    let segments = path.segments();
    if segments.is_empty() {
        return root.clone();
    }
    if segments.len() == 1 {
        return delete_child(root, &segments[0]);
    }

    let parent_path = path.parent();
    let parent = match get_value_at_path(root, &parent_path) {
        Some(parent) => parent,
        None => return root.clone(),
    };
    let pruned = delete_child(parent, segments.last().expect("non-empty path"));
    set_value_at_path(root, &parent_path, pruned)
}

fn delete_child(container: &Value, segment: &PathSegment) -> Value {
    match (segment, container) {
        (PathSegment::Property(key), Value::Object(map)) => {
            let mut map = map.clone();
            map.shift_remove(key);
            Value::Object(map)
        }
        (PathSegment::Index(i), Value::Array(items)) => {
            let mut items = items.clone();
            if *i < items.len() {
                items.remove(*i);
            }
            Value::Array(items)
        }
        _ => container.clone(),
    }
}

/// Move the element of the array at `array_path` from index `from` to
/// index `to`, returning the rewritten document. A non-array target or an
/// out-of-range `from` is a programming error, not a data condition; `to`
/// is clamped into the array.
pub fn move_array_element(
    root: &Value,
    array_path: &Path,
    from: usize,
    to: usize,
) -> Result<Value, PathOpError> {
    let items = get_value_at_path(root, array_path)
        .and_then(Value::as_array)
        .ok_or_else(|| PathOpError::NotAnArray {
            path: array_path.to_string(),
        })?;
    if from >= items.len() {
        return Err(PathOpError::IndexOutOfBounds {
            index: from,
            len: items.len(),
        });
    }

    let mut items = items.clone();
    let element = items.remove(from);
    let to = to.min(items.len());
    items.insert(to, element);
    Ok(set_value_at_path(root, array_path, Value::Array(items)))
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn get_walks_and_short_circuits() {
        let doc = json!({"user": {"addresses": [{"street": "Main"}]}});
        let p = Path::parse("user.addresses[0].street");
        assert_eq!(get_value_at_path(&doc, &p), Some(&json!("Main")));

        assert_eq!(get_value_at_path(&doc, &Path::parse("user.missing.deep")), None);
        assert_eq!(get_value_at_path(&doc, &Path::parse("user.addresses[5]")), None);
        // Scalar intermediate stops the walk rather than panicking.
        assert_eq!(get_value_at_path(&doc, &Path::parse("user.addresses[0].street.x")), None);
    }

    #[test]
    fn set_with_empty_path_is_a_no_op() {
        let doc = json!({"a": 1});
        let out = set_value_at_path(&doc, &Path::root(), json!(42));
        assert_eq!(out, doc);
    }

    #[test]
    fn set_then_get_round_trips_without_mutation() {
        let doc = json!({"a": {"b": 1}, "keep": [true]});
        let before = doc.clone();
        let p = Path::parse("a.c[1].d");
        let out = set_value_at_path(&doc, &p, json!("x"));

        assert_eq!(get_value_at_path(&out, &p), Some(&json!("x")));
        assert_eq!(doc, before, "input untouched");
        // Sibling branches carried over.
        assert_eq!(out["a"]["b"], json!(1));
        assert_eq!(out["keep"], json!([true]));
        // Missing structure materialized by the next segment's kind, with
        // null padding for the skipped index.
        assert_eq!(out["a"]["c"][0], Value::Null);
    }

    #[test]
    fn set_materializes_array_for_leading_index() {
        let doc = json!({});
        let out = set_value_at_path(&doc, &Path::parse("rows[0]"), json!(7));
        assert_eq!(out, json!({"rows": [7]}));
    }

    #[test]
    fn delete_object_key_and_array_element() {
        let doc = json!({"a": {"x": 1, "y": 2}, "list": [10, 20, 30]});

        let out = delete_at_path(&doc, &Path::parse("a.x"));
        assert_eq!(out["a"], json!({"y": 2}));

        let out = delete_at_path(&doc, &Path::parse("list[1]"));
        assert_eq!(out["list"], json!([10, 30]), "sibling order preserved");

        // Deleting something absent is a no-op copy.
        let out = delete_at_path(&doc, &Path::parse("a.z.q"));
        assert_eq!(out, doc);
    }

    #[test]
    fn has_path_checks_presence_not_truthiness() {
        let doc = json!({"a": null, "list": [1]});
        assert!(has_path(&doc, &Path::parse("a")), "null value is still present");
        assert!(has_path(&doc, &Path::parse("list[0]")));
        assert!(!has_path(&doc, &Path::parse("list[1]")));
        assert!(!has_path(&doc, &Path::parse("a.b")), "null intermediate stops");
        assert!(!has_path(&doc, &Path::parse("missing")));
    }

    #[test]
    fn move_reorders_within_cloned_array() {
        let doc = json!({"items": ["a", "b", "c"]});
        let out = move_array_element(&doc, &Path::parse("items"), 0, 2).unwrap();
        assert_eq!(out["items"], json!(["b", "c", "a"]));
        assert_eq!(doc["items"], json!(["a", "b", "c"]), "input untouched");
    }

    #[test]
    fn move_rejects_non_arrays_and_bad_indices() {
        let doc = json!({"items": {"not": "an array"}});
        let err = move_array_element(&doc, &Path::parse("items"), 0, 1).unwrap_err();
        assert_eq!(err, PathOpError::NotAnArray { path: "items".into() });

        let doc = json!({"items": [1]});
        let err = move_array_element(&doc, &Path::parse("items"), 3, 0).unwrap_err();
        assert_eq!(err, PathOpError::IndexOutOfBounds { index: 3, len: 1 });
    }
}
