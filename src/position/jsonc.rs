//! JSON/JSONC cursor mapping over `jsonc-parser`'s range-carrying AST.
//!
//! Comments and trailing commas are the parser's problem; the descent here
//! only ever sees real members and elements. Ranges are byte offsets, so
//! the cursor is converted with the byte-offset variant of the position
//! helper.

use jsonc_parser::ast::{ObjectPropName, Value as AstValue};
use jsonc_parser::common::Range;

use crate::path::Path;
use crate::position::{position_to_byte_offset, CursorPosition};

/// Map a cursor position in JSON/JSONC text to a document path. Parse
/// failures and positions outside every node yield `None`.
pub fn path_at_position(text: &str, position: CursorPosition) -> Option<Path> {
    let offset = position_to_byte_offset(text, position.line, position.column);

    let parsed =
        jsonc_parser::parse_to_ast(text, &Default::default(), &Default::default()).ok()?;
    find_path(&parsed.value?, offset, &Path::root())
}

fn value_range(value: &AstValue) -> Range {
    match value {
        AstValue::StringLit(node) => node.range,
        AstValue::NumberLit(node) => node.range,
        AstValue::BooleanLit(node) => node.range,
        AstValue::NullKeyword(node) => node.range,
        AstValue::Object(node) => node.range,
        AstValue::Array(node) => node.range,
    }
}

fn name_range(name: &ObjectPropName) -> Range {
    match name {
        ObjectPropName::String(node) => node.range,
        ObjectPropName::Word(node) => node.range,
    }
}

fn name_text(name: &ObjectPropName) -> String {
    match name {
        ObjectPropName::String(node) => node.value.to_string(),
        ObjectPropName::Word(node) => node.value.to_string(),
    }
}

fn in_range(range: Range, offset: usize) -> bool {
    offset >= range.start && offset <= range.end
}

fn is_container(value: &AstValue) -> bool {
    matches!(value, AstValue::Object(_) | AstValue::Array(_))
}

fn find_path(node: &AstValue, offset: usize, current: &Path) -> Option<Path> {
    if !in_range(value_range(node), offset) {
        return None;
    }
    match node {
        AstValue::Object(object) => {
            for property in &object.properties {
                let child = current.child(name_text(&property.name));
                let key_range = name_range(&property.name);
                if in_range(key_range, offset) {
                    return Some(child);
                }
                let val_range = value_range(&property.value);
                if in_range(val_range, offset) {
                    if is_container(&property.value) {
                        if let Some(deeper) = find_path(&property.value, offset, &child) {
                            return Some(deeper);
                        }
                    }
                    return Some(child);
                }
                // The gap: on the `:` or padding between name and value.
                if offset >= key_range.start && offset <= val_range.end {
                    return Some(child);
                }
            }
            (!current.is_empty()).then(|| current.clone())
        }
        AstValue::Array(array) => {
            for (index, element) in array.elements.iter().enumerate() {
                let child = current.item(index);
                if in_range(value_range(element), offset) {
                    if is_container(element) {
                        if let Some(deeper) = find_path(element, offset, &child) {
                            return Some(deeper);
                        }
                    }
                    return Some(child);
                }
            }
            (!current.is_empty()).then(|| current.clone())
        }
        _ => (!current.is_empty()).then(|| current.clone()),
    }
}

// ------------------------------- Tests ------------------------------------ //
