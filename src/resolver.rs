//! `$ref` resolution over a bound root schema, plus the schema lookups that
//! depend on it: property schemas, derived defaults, and property order.
//!
//! The resolver owns the root schema and a memo cache keyed by the literal
//! `$ref` string. The cache key carries no schema-version component, so the
//! lifetime contract is on the caller: call [`SchemaResolver::clear_cache`]
//! (or construct a fresh resolver) whenever the bound schema is replaced.
//! One resolver per schema; instances over independent schemas are
//! independent.

use std::collections::HashMap;

use indexmap::IndexMap;
use regex::Regex;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::debug;

use crate::schema::{classify, SchemaClass, SchemaNode};

/// Bound on `$ref`-chasing so a pointer that resolves to another pointer
/// (or a pointer loop the tree builder has not yet caught) cannot recurse
/// forever.
pub const MAX_REF_DEPTH: usize = 10;

#[derive(Debug, Error, PartialEq)]
pub enum ResolveError {
    /// A `$ref` pointer that does not address anything in the root schema.
    /// A schema-authoring defect: surfaced as a hard failure, never
    /// recovered (callers validate schemas before binding them).
    #[error("unresolvable $ref pointer `{pointer}`")]
    InvalidRef { pointer: String },
}

/// The alternative of an `anyOf`/`oneOf` union selected for a concrete
/// value, by index into the declared alternatives.
#[derive(Debug, Clone, PartialEq)]
pub struct VariantMatch {
    pub index: usize,
    pub schema: SchemaNode,
}

// ------------------------------ Resolver ---------------------------------- //

pub struct SchemaResolver {
    root: SchemaNode,
    cache: HashMap<String, SchemaNode>,
}

impl SchemaResolver {
    pub fn new(root: SchemaNode) -> Self {
        Self {
            root,
            cache: HashMap::new(),
        }
    }

    pub fn root(&self) -> &SchemaNode {
        &self.root
    }

    /// Drop every memoized resolution. Required when the bound schema is
    /// about to change; [`SchemaResolver::rebind`] does both in one step.
    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    /// Swap the bound root schema and invalidate the cache with it.
    pub fn rebind(&mut self, root: SchemaNode) {
        self.root = root;
        self.cache.clear();
    }

    /// Resolve a node's `$ref`, one hop. A node without `$ref` is returned
    /// as-is; otherwise the pointer is looked up in the root schema (memo
    /// cache first) and the target returned. The target may itself carry a
    /// `$ref`; see [`SchemaResolver::resolve_chased`].
    pub fn resolve(&mut self, node: &SchemaNode) -> Result<SchemaNode, ResolveError> {
        match &node.reference {
            None => Ok(node.clone()),
            Some(pointer) => self.resolve_pointer(pointer),
        }
    }

    fn resolve_pointer(&mut self, pointer: &str) -> Result<SchemaNode, ResolveError> {
        if let Some(hit) = self.cache.get(pointer) {
            return Ok(hit.clone());
        }
        let target = lookup_pointer(&self.root, pointer).ok_or_else(|| {
            ResolveError::InvalidRef {
                pointer: pointer.to_string(),
            }
        })?;
        let resolved = target.clone();
        debug!(pointer, "resolved $ref");
        self.cache.insert(pointer.to_string(), resolved.clone());
        Ok(resolved)
    }

    /// One `$ref` hop with the metadata carry-over used during tree
    /// building: the nearer schema's own `title`/`description` win over the
    /// target's. Only those two keys merge; everything else comes from the
    /// target.
    pub fn chase_step(&mut self, node: &SchemaNode) -> Result<SchemaNode, ResolveError> {
        let mut target = self.resolve(node)?;
        if node.title.is_some() {
            target.title = node.title.clone();
        }
        if node.description.is_some() {
            target.description = node.description.clone();
        }
        Ok(target)
    }

    /// Follow a chain of `$ref`s, bounded by [`MAX_REF_DEPTH`], merging
    /// `title`/`description` at each hop ([`SchemaResolver::chase_step`]).
    /// If the bound is exhausted the node is returned as it stands.
    pub fn resolve_chased(&mut self, node: &SchemaNode) -> Result<SchemaNode, ResolveError> {
        let mut current = node.clone();
        for _ in 0..MAX_REF_DEPTH {
            if current.reference.is_none() {
                break;
            }
            current = self.chase_step(&current)?;
        }
        Ok(current)
    }

    /// The schema for `key` under `parent`, in priority order: a declared
    /// property, the first `patternProperties` entry (declaration order)
    /// whose regex matches `key`, then `additionalProperties` when it is a
    /// schema. The winner is returned fully chased; `None` when nothing
    /// applies.
    pub fn get_property_schema(
        &mut self,
        parent: &SchemaNode,
        key: &str,
    ) -> Result<Option<SchemaNode>, ResolveError> {
        match self.get_raw_property_schema(parent, key)? {
            Some(raw) => self.resolve_chased(&raw).map(Some),
            None => Ok(None),
        }
    }

    /// [`SchemaResolver::get_property_schema`] without the final chase: the
    /// winning entry is returned as declared, `$ref` intact. Tree building
    /// needs the raw pointer so its cycle guard can see it.
    pub fn get_raw_property_schema(
        &mut self,
        parent: &SchemaNode,
        key: &str,
    ) -> Result<Option<SchemaNode>, ResolveError> {
        let parent = self.resolve(parent)?;

        if let Some(declared) = parent.properties.as_ref().and_then(|map| map.get(key)) {
            return Ok(Some(declared.clone()));
        }

        if let Some(patterns) = &parent.pattern_properties {
            for (pattern, schema) in patterns {
                match Regex::new(pattern) {
                    Ok(regex) if regex.is_match(key) => {
                        return Ok(Some(schema.clone()));
                    }
                    Ok(_) => {}
                    Err(error) => {
                        debug!(pattern, %error, "skipping unparsable patternProperties regex");
                    }
                }
            }
        }

        Ok(parent.additional_properties_schema().cloned())
    }

    /// A type-appropriate default for a schema. An explicit `default` wins
    /// verbatim; a union defaults to `null`; otherwise the effective type
    /// picks the empty value of its kind.
    pub fn get_default_value(&mut self, schema: &SchemaNode) -> Result<Value, ResolveError> {
        let schema = self.resolve_chased(schema)?;
        if let Some(default) = &schema.default {
            return Ok(default.clone());
        }
        if schema.union_variants().is_some() {
            return Ok(Value::Null);
        }
        Ok(match schema.effective_type() {
            Some("string") => json!(""),
            Some("number") | Some("integer") => json!(0),
            Some("boolean") => json!(false),
            Some("array") => json!([]),
            Some("object") => json!({}),
            _ => Value::Null,
        })
    }

    /// Declared property order: the `x-order` vendor extension verbatim
    /// when present, else `properties` keys in declaration order, else
    /// empty.
    pub fn get_property_order(&mut self, schema: &SchemaNode) -> Result<Vec<String>, ResolveError> {
        let schema = self.resolve(schema)?;
        if let Some(order) = &schema.x_order {
            return Ok(order.clone());
        }
        Ok(schema
            .properties
            .as_ref()
            .map(|map| map.keys().cloned().collect())
            .unwrap_or_default())
    }

    /// Pick the `anyOf`/`oneOf` alternative matching a concrete value's
    /// runtime shape: array values take the first array-classed branch,
    /// objects the first object- or dictionary-classed branch, everything
    /// else the first primitive branch. `None` when no branch fits.
    pub fn match_variant(
        &mut self,
        variants: &[SchemaNode],
        value: &Value,
    ) -> Result<Option<VariantMatch>, ResolveError> {
        let wanted = ValueShape::of(value);
        for (index, variant) in variants.iter().enumerate() {
            let resolved = self.resolve_chased(variant)?;
            let shape = match classify(&resolved) {
                SchemaClass::Array => ValueShape::Array,
                SchemaClass::Object | SchemaClass::Dictionary => ValueShape::Object,
                SchemaClass::Primitive => ValueShape::Primitive,
                SchemaClass::Variant => continue,
            };
            if shape == wanted {
                return Ok(Some(VariantMatch {
                    index,
                    schema: resolved,
                }));
            }
        }
        Ok(None)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ValueShape {
    Array,
    Object,
    Primitive,
}

impl ValueShape {
    fn of(value: &Value) -> Self {
        match value {
            Value::Array(_) => ValueShape::Array,
            Value::Object(_) => ValueShape::Object,
            _ => ValueShape::Primitive,
        }
    }
}

// ---------------------------- Pointer walk -------------------------------- //

/// Walk a `#/…` JSON pointer through the typed schema, segment by segment.
/// Keyed maps (`$defs`, `definitions`, `properties`, `patternProperties`)
/// and single-schema edges (`items`, `additionalProperties`) are the only
/// traversable keywords; anything else fails the walk.
fn lookup_pointer<'a>(root: &'a SchemaNode, pointer: &str) -> Option<&'a SchemaNode> {
    enum Cursor<'a> {
        Node(&'a SchemaNode),
        Map(&'a IndexMap<String, SchemaNode>),
    }

    let trimmed = pointer.strip_prefix("#/").or_else(|| pointer.strip_prefix('/'))?;
    let mut cursor = Cursor::Node(root);
    for raw in trimmed.split('/') {
        let segment = unescape_pointer_segment(raw);
        cursor = match cursor {
            Cursor::Node(node) => match segment.as_str() {
                "$defs" => Cursor::Map(node.defs.as_ref()?),
                "definitions" => Cursor::Map(node.definitions.as_ref()?),
                "properties" => Cursor::Map(node.properties.as_ref()?),
                "patternProperties" => Cursor::Map(node.pattern_properties.as_ref()?),
                "items" => Cursor::Node(node.items.as_deref()?),
                "additionalProperties" => Cursor::Node(node.additional_properties_schema()?),
                _ => return None,
            },
            Cursor::Map(map) => Cursor::Node(map.get(segment.as_str())?),
        };
    }
    match cursor {
        Cursor::Node(node) => Some(node),
        Cursor::Map(_) => None,
    }
}

/// JSON pointer escapes: `~1` is `/`, `~0` is `~`.
fn unescape_pointer_segment(segment: &str) -> String {
    segment.replace("~1", "/").replace("~0", "~")
}

// ------------------------------- Tests ------------------------------------ //
