//! Data model for the consumed JSON-Schema (draft-07) subset, plus the one
//! shape classifier shared by tree building and property lookup.
//!
//! A [`SchemaNode`] is immutable from the engine's point of view: resolution
//! and tree building read it, cache copies of it, and never write back into
//! a bound root. Map-valued keywords keep declaration order (`indexmap`),
//! which drives property ordering in the built tree.

use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;

// ------------------------------ Schema node ------------------------------- //

/// The `type` keyword: a single type name or a list of alternatives
/// (possibly including `"null"`).
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum TypeSet {
    One(String),
    Many(Vec<String>),
}

/// The `additionalProperties` keyword: a blanket allow/deny flag or a schema
/// for every undeclared key.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum AdditionalProperties {
    Flag(bool),
    Schema(Box<SchemaNode>),
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SchemaNode {
    #[serde(rename = "type")]
    pub ty: Option<TypeSet>,
    pub properties: Option<IndexMap<String, SchemaNode>>,
    pub items: Option<Box<SchemaNode>>,
    pub additional_properties: Option<AdditionalProperties>,
    pub pattern_properties: Option<IndexMap<String, SchemaNode>>,
    #[serde(rename = "$ref")]
    pub reference: Option<String>,
    pub any_of: Option<Vec<SchemaNode>>,
    pub one_of: Option<Vec<SchemaNode>>,
    #[serde(rename = "enum")]
    pub enum_values: Option<Vec<Value>>,
    pub default: Option<Value>,
    pub required: Option<Vec<String>>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub format: Option<String>,
    #[serde(rename = "x-order")]
    pub x_order: Option<Vec<String>>,
    #[serde(rename = "$defs")]
    pub defs: Option<IndexMap<String, SchemaNode>>,
    pub definitions: Option<IndexMap<String, SchemaNode>>,
}

impl SchemaNode {
    /// The single effective type name: the `type` string itself, or the
    /// first non-`"null"` entry of an array-of-types. `None` when untyped
    /// or when only `"null"` is listed.
    pub fn effective_type(&self) -> Option<&str> {
        match &self.ty {
            Some(TypeSet::One(name)) => Some(name.as_str()),
            Some(TypeSet::Many(names)) => {
                names.iter().map(String::as_str).find(|name| *name != "null")
            }
            None => None,
        }
    }

    /// True for the `{"type": "null"}` alternative of a union.
    pub fn is_null_type(&self) -> bool {
        matches!(&self.ty, Some(TypeSet::One(name)) if name == "null")
    }

    /// The `anyOf`/`oneOf` alternatives (in that priority order), or `None`
    /// when the schema is not a union.
    pub fn union_variants(&self) -> Option<&[SchemaNode]> {
        self.any_of.as_deref().or(self.one_of.as_deref())
    }

    /// The union alternatives that are not `{"type": "null"}`. `None` when
    /// the schema is not a union at all.
    pub fn non_null_variants(&self) -> Option<Vec<&SchemaNode>> {
        self.union_variants()
            .map(|variants| variants.iter().filter(|v| !v.is_null_type()).collect())
    }

    pub fn has_declared_properties(&self) -> bool {
        self.properties.as_ref().is_some_and(|map| !map.is_empty())
    }

    pub fn has_pattern_properties(&self) -> bool {
        self.pattern_properties
            .as_ref()
            .is_some_and(|map| !map.is_empty())
    }

    /// True when `additionalProperties` admits undeclared keys, either as a
    /// blanket `true` or as a value schema. `false` and absent both close
    /// the schema.
    pub fn open_additional_properties(&self) -> bool {
        matches!(
            &self.additional_properties,
            Some(AdditionalProperties::Flag(true)) | Some(AdditionalProperties::Schema(_))
        )
    }

    /// The value schema for undeclared keys, when one is given.
    pub fn additional_properties_schema(&self) -> Option<&SchemaNode> {
        match &self.additional_properties {
            Some(AdditionalProperties::Schema(schema)) => Some(schema),
            _ => None,
        }
    }

    /// True when the node names a member of the `required` set.
    pub fn requires(&self, key: &str) -> bool {
        self.required
            .as_ref()
            .is_some_and(|names| names.iter().any(|name| name == key))
    }
}

// ------------------------------ Classifier -------------------------------- //

/// The navigable shape of a resolved schema node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaClass {
    Object,
    Array,
    Dictionary,
    Primitive,
    Variant,
}

impl SchemaClass {
    pub fn as_str(self) -> &'static str {
        match self {
            SchemaClass::Object => "object",
            SchemaClass::Array => "array",
            SchemaClass::Dictionary => "dictionary",
            SchemaClass::Primitive => "primitive",
            SchemaClass::Variant => "variant",
        }
    }
}

/// Classify a resolved schema node. This is the single classification used
/// everywhere a "dictionary vs. object vs. array vs. variant" decision is
/// needed, so tree building and property lookup can never disagree.
///
/// Callers are expected to have chased `$ref`s and unwrapped single-variant
/// nullable unions first (see the resolver); a union with more than one
/// non-null alternative classifies as [`SchemaClass::Variant`].
pub fn classify(schema: &SchemaNode) -> SchemaClass {
    if schema
        .non_null_variants()
        .is_some_and(|variants| variants.len() > 1)
    {
        return SchemaClass::Variant;
    }

    let object_like = schema.effective_type() == Some("object")
        || (schema.ty.is_none()
            && (schema.has_declared_properties()
                || schema.additional_properties.is_some()
                || schema.has_pattern_properties()));

    if object_like
        && !schema.has_declared_properties()
        && (schema.open_additional_properties() || schema.has_pattern_properties())
    {
        return SchemaClass::Dictionary;
    }
    if schema.effective_type() == Some("array") {
        return SchemaClass::Array;
    }
    if object_like {
        return SchemaClass::Object;
    }
    SchemaClass::Primitive
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;

    fn schema(src: &str) -> SchemaNode {
        serde_json::from_str(src).expect("test schema parses")
    }

    #[test]
    fn effective_type_skips_null_entries() {
        assert_eq!(schema(r#"{"type": "string"}"#).effective_type(), Some("string"));
        assert_eq!(
            schema(r#"{"type": ["null", "integer"]}"#).effective_type(),
            Some("integer")
        );
        assert_eq!(schema(r#"{"type": "null"}"#).effective_type(), None);
        assert_eq!(schema("{}").effective_type(), None);
    }

    #[test]
    fn property_order_is_declaration_order() {
        let s = schema(r#"{"properties": {"z": {}, "a": {}, "m": {}}}"#);
        let keys: Vec<&String> = s.properties.as_ref().unwrap().keys().collect();
        assert_eq!(keys, ["z", "a", "m"]);
    }

    #[test]
    fn classify_objects_and_primitives() {
        assert_eq!(
            classify(&schema(r#"{"type": "object", "properties": {"a": {}}}"#)),
            SchemaClass::Object
        );
        // Untyped but with declared properties still reads as an object.
        assert_eq!(
            classify(&schema(r#"{"properties": {"a": {}}}"#)),
            SchemaClass::Object
        );
        assert_eq!(classify(&schema(r#"{"type": "string"}"#)), SchemaClass::Primitive);
        assert_eq!(classify(&schema("{}")), SchemaClass::Primitive);
    }

    #[test]
    fn classify_dictionaries() {
        assert_eq!(
            classify(&schema(
                r#"{"type": "object", "additionalProperties": {"type": "number"}}"#
            )),
            SchemaClass::Dictionary
        );
        assert_eq!(
            classify(&schema(r#"{"type": "object", "additionalProperties": true}"#)),
            SchemaClass::Dictionary
        );
        assert_eq!(
            classify(&schema(
                r#"{"type": "object", "patternProperties": {"^x-": {"type": "string"}}}"#
            )),
            SchemaClass::Dictionary
        );
        // additionalProperties: false closes the schema; with no declared
        // properties it is just an empty object.
        assert_eq!(
            classify(&schema(r#"{"type": "object", "additionalProperties": false}"#)),
            SchemaClass::Object
        );
        // Declared properties win over the dictionary reading.
        assert_eq!(
            classify(&schema(
                r#"{"type": "object", "properties": {"a": {}}, "additionalProperties": true}"#
            )),
            SchemaClass::Object
        );
    }

    #[test]
    fn classify_variants_counts_non_null_alternatives() {
        assert_eq!(
            classify(&schema(
                r#"{"anyOf": [{"type": "string"}, {"type": "object"}]}"#
            )),
            SchemaClass::Variant
        );
        // A nullable single alternative is not a variant; classification of
        // the unwrapped inner schema is the resolver's job.
        assert_eq!(
            classify(&schema(r#"{"anyOf": [{"type": "string"}, {"type": "null"}]}"#)),
            SchemaClass::Primitive
        );
        assert_eq!(
            classify(&schema(
                r#"{"oneOf": [{"type": "array"}, {"type": "integer"}]}"#
            )),
            SchemaClass::Variant
        );
    }
}
