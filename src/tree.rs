//! Build a navigable tree of typed nodes from a (schema, value) pair.
//!
//! The tree is a derived, disposable projection for the UI: rebuilt on every
//! schema or value change, never edited in place. Node paths are
//! path-strings (see [`crate::path`]), so a selected node maps straight back
//! into the document.
//!
//! Termination on cyclic schemas is guaranteed by `visited`: the set of
//! `$ref` pointers already followed along the current branch. The set is
//! copied, not shared, into each recursive call, so one branch following a
//! pointer never makes a sibling branch look cyclic.

use std::collections::HashSet;

use serde_json::Value;
use tracing::trace;

use crate::path::Path;
use crate::resolver::{ResolveError, SchemaResolver, MAX_REF_DEPTH};
use crate::schema::{classify, SchemaClass, SchemaNode};

// ------------------------------ Tree nodes -------------------------------- //

/// One navigable node of the built tree.
#[derive(Debug, Clone, PartialEq)]
pub struct TreeNode {
    /// Path-string addressing this node's value in the document.
    pub path: String,
    pub title: String,
    pub kind: SchemaClass,
    /// The addressed key/element is present in the current value (`null`
    /// counts as present).
    pub has_value: bool,
    /// Named in the owning schema's `required` set.
    pub is_required: bool,
    /// Present only for object/array/dictionary nodes and variants whose
    /// value matched an alternative.
    pub children: Option<Vec<TreeNode>>,
    /// Element count, arrays only.
    pub item_count: Option<usize>,
    /// Synthetic dictionary "add key" affordance; never `has_value`.
    pub is_placeholder: bool,
    /// Primitive classification metadata for the field widget.
    pub schema_type: Option<String>,
    pub format: Option<String>,
    pub has_enum: bool,
}

impl TreeNode {
    fn new(path: &Path, title: String, kind: SchemaClass) -> Self {
        Self {
            path: path.to_string(),
            title,
            kind,
            has_value: false,
            is_required: false,
            children: None,
            item_count: None,
            is_placeholder: false,
            schema_type: None,
            format: None,
            has_enum: false,
        }
    }
}

// ------------------------------- Builder ---------------------------------- //

/// A schema node readied for classification: `$ref`s chased (tracked in
/// `visited`) and single-alternative nullable unions unwrapped.
struct Prepared {
    schema: SchemaNode,
    visited: HashSet<String>,
    /// The node's pointer was already followed on this branch; classify it,
    /// but do not descend.
    cyclic: bool,
}

pub struct TreeBuilder<'a> {
    resolver: &'a mut SchemaResolver,
}

impl<'a> TreeBuilder<'a> {
    pub fn new(resolver: &'a mut SchemaResolver) -> Self {
        Self { resolver }
    }

    /// Build the root's child nodes for a (schema, value) pair. This is the
    /// shape the tree renderer consumes; a primitive root yields no nodes.
    pub fn build(
        &mut self,
        schema: &SchemaNode,
        value: &Value,
    ) -> Result<Vec<TreeNode>, ResolveError> {
        let prepared = self.prepare(schema, &HashSet::new())?;
        if prepared.cyclic {
            return Ok(Vec::new());
        }
        if classify(&prepared.schema) == SchemaClass::Variant {
            let variants = prepared.schema.union_variants().unwrap_or(&[]).to_vec();
            return match self.resolver.match_variant(&variants, value)? {
                Some(matched) => self.build_children(
                    &matched.schema,
                    Some(value),
                    &Path::root(),
                    &prepared.visited,
                ),
                None => Ok(Vec::new()),
            };
        }
        self.build_children(
            &prepared.schema,
            Some(value),
            &Path::root(),
            &prepared.visited,
        )
    }

    /// Chase `$ref`s and unwrap nullable single-alternative unions until
    /// the node classifies on its own. Every pointer actually followed
    /// lands in a copy of `visited`; re-encountering one flags the branch
    /// as cyclic instead of descending again.
    fn prepare(
        &mut self,
        schema: &SchemaNode,
        visited: &HashSet<String>,
    ) -> Result<Prepared, ResolveError> {
        let mut visited = visited.clone();
        let mut current = schema.clone();

        for _ in 0..MAX_REF_DEPTH {
            if let Some(pointer) = current.reference.clone() {
                if visited.contains(&pointer) {
                    trace!(pointer, "cycle guard hit, closing branch");
                    let schema = self.resolver.resolve_chased(&current)?;
                    return Ok(Prepared {
                        schema,
                        visited,
                        cyclic: true,
                    });
                }
                visited.insert(pointer);
                current = self.resolver.chase_step(&current)?;
                continue;
            }

            // A union with exactly one non-null alternative is not a
            // variant: unwrap to the alternative, the outer title and
            // description filling in where the inner schema has none.
            let single = current.non_null_variants().and_then(|variants| {
                (variants.len() == 1).then(|| variants[0].clone())
            });
            match single {
                Some(mut inner) => {
                    if inner.title.is_none() {
                        inner.title = current.title.clone();
                    }
                    if inner.description.is_none() {
                        inner.description = current.description.clone();
                    }
                    current = inner;
                }
                None => break,
            }
        }

        Ok(Prepared {
            schema: current,
            visited,
            cyclic: false,
        })
    }

    fn build_node(
        &mut self,
        raw_schema: &SchemaNode,
        value: Option<&Value>,
        path: &Path,
        fallback_title: String,
        is_required: bool,
        visited: &HashSet<String>,
    ) -> Result<TreeNode, ResolveError> {
        let Prepared {
            schema,
            visited,
            cyclic,
        } = self.prepare(raw_schema, visited)?;

        let kind = classify(&schema);
        let title = schema.title.clone().unwrap_or(fallback_title);
        let mut node = TreeNode::new(path, title, kind);
        node.has_value = value.is_some();
        node.is_required = is_required;

        match kind {
            SchemaClass::Primitive => {
                node.schema_type = schema.effective_type().map(str::to_string);
                node.format = schema.format.clone();
                node.has_enum = schema.enum_values.is_some();
            }
            SchemaClass::Array => {
                node.item_count = Some(
                    value
                        .and_then(Value::as_array)
                        .map(Vec::len)
                        .unwrap_or(0),
                );
                if !cyclic {
                    node.children =
                        Some(self.build_children(&schema, value, path, &visited)?);
                }
            }
            SchemaClass::Object | SchemaClass::Dictionary => {
                if !cyclic {
                    node.children =
                        Some(self.build_children(&schema, value, path, &visited)?);
                }
            }
            SchemaClass::Variant => {
                // Children reflect the active alternative only: dispatch on
                // the value's runtime shape and render the subtree the
                // matching alternative would produce.
                if !cyclic {
                    if let Some(value) = value {
                        let variants = schema.union_variants().unwrap_or(&[]).to_vec();
                        if let Some(matched) = self.resolver.match_variant(&variants, value)? {
                            node.children = Some(self.build_children(
                                &matched.schema,
                                Some(value),
                                path,
                                &visited,
                            )?);
                        }
                    }
                }
            }
        }
        Ok(node)
    }

    fn build_children(
        &mut self,
        schema: &SchemaNode,
        value: Option<&Value>,
        path: &Path,
        visited: &HashSet<String>,
    ) -> Result<Vec<TreeNode>, ResolveError> {
        match classify(schema) {
            SchemaClass::Object => self.object_children(schema, value, path, visited),
            SchemaClass::Dictionary => self.dictionary_children(schema, value, path, visited),
            SchemaClass::Array => self.array_children(schema, value, path, visited),
            SchemaClass::Variant | SchemaClass::Primitive => Ok(Vec::new()),
        }
    }

    /// One node per declared property, in declared (or `x-order`) order,
    /// value narrowed to the property.
    fn object_children(
        &mut self,
        schema: &SchemaNode,
        value: Option<&Value>,
        path: &Path,
        visited: &HashSet<String>,
    ) -> Result<Vec<TreeNode>, ResolveError> {
        let entries = value.and_then(Value::as_object);
        let mut children = Vec::new();
        for key in self.resolver.get_property_order(schema)? {
            let Some(raw) = self.resolver.get_raw_property_schema(schema, &key)? else {
                // x-order may name a property the schema never declares.
                continue;
            };
            let child_value = entries.and_then(|map| map.get(&key));
            let child = self.build_node(
                &raw,
                child_value,
                &path.child(&key),
                key.clone(),
                schema.requires(&key),
                visited,
            )?;
            children.push(child);
        }
        Ok(children)
    }

    /// A synthetic placeholder ("add key" affordance) followed by one node
    /// per key actually present, all typed by the dictionary's value
    /// schema.
    fn dictionary_children(
        &mut self,
        schema: &SchemaNode,
        value: Option<&Value>,
        path: &Path,
        visited: &HashSet<String>,
    ) -> Result<Vec<TreeNode>, ResolveError> {
        let mut placeholder = TreeNode::new(
            path,
            placeholder_label(schema.title.as_deref()),
            SchemaClass::Primitive,
        );
        placeholder.is_placeholder = true;
        let mut children = vec![placeholder];

        let value_schema = schema
            .additional_properties_schema()
            .cloned()
            .or_else(|| {
                schema
                    .pattern_properties
                    .as_ref()
                    .and_then(|map| map.values().next().cloned())
            })
            .unwrap_or_default();

        if let Some(entries) = value.and_then(Value::as_object) {
            for (key, child_value) in entries {
                let child = self.build_node(
                    &value_schema,
                    Some(child_value),
                    &path.child(key),
                    key.clone(),
                    false,
                    visited,
                )?;
                children.push(child);
            }
        }
        Ok(children)
    }

    /// One node per element, addressed by an index segment, built against
    /// the items schema.
    fn array_children(
        &mut self,
        schema: &SchemaNode,
        value: Option<&Value>,
        path: &Path,
        visited: &HashSet<String>,
    ) -> Result<Vec<TreeNode>, ResolveError> {
        let items = schema
            .items
            .as_deref()
            .cloned()
            .unwrap_or_default();
        let mut children = Vec::new();
        if let Some(elements) = value.and_then(Value::as_array) {
            for (index, element) in elements.iter().enumerate() {
                let child = self.build_node(
                    &items,
                    Some(element),
                    &path.item(index),
                    format!("[{index}]"),
                    false,
                    visited,
                )?;
                children.push(child);
            }
        }
        Ok(children)
    }
}

/// Placeholder label for a dictionary's "add key" affordance: derived from
/// the schema title when there is one (`"Services"` → `[service name]`),
/// generic otherwise.
fn placeholder_label(title: Option<&str>) -> String {
    match title {
        Some(title) if !title.trim().is_empty() => {
            let mut singular = title.trim().to_lowercase();
            if singular.len() > 1 && singular.ends_with('s') {
                singular.pop();
            }
            format!("[{singular} name]")
        }
        _ => "[key]".to_string(),
    }
}

// ------------------------------- Filtering -------------------------------- //

/// Post-order filter down to populated nodes: placeholders always drop; any
/// other node survives iff it has a value of its own or keeps at least one
/// surviving child (its children replaced by the filtered list).
pub fn filter_populated_nodes(nodes: Vec<TreeNode>) -> Vec<TreeNode> {
    nodes
        .into_iter()
        .filter_map(|mut node| {
            if node.is_placeholder {
                return None;
            }
            let children = node.children.take().map(filter_populated_nodes);
            let has_surviving_child = children
                .as_ref()
                .is_some_and(|children| !children.is_empty());
            if node.has_value || has_surviving_child {
                node.children = children;
                Some(node)
            } else {
                None
            }
        })
        .collect()
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schema(src: &str) -> SchemaNode {
        serde_json::from_str(src).expect("test schema parses")
    }

    fn build(schema_src: &str, value: Value) -> Vec<TreeNode> {
        let root = schema(schema_src);
        let mut resolver = SchemaResolver::new(root.clone());
        TreeBuilder::new(&mut resolver)
            .build(&root, &value)
            .expect("tree builds")
    }

    #[test]
    fn object_children_carry_value_and_required_flags() {
        let nodes = build(
            r#"{
                "type": "object",
                "required": ["name"],
                "properties": {
                    "name": {"type": "string", "title": "Name"},
                    "age": {"type": "integer"}
                }
            }"#,
            json!({"name": "ada", "extra": true}),
        );
        assert_eq!(nodes.len(), 2);

        assert_eq!(nodes[0].path, "name");
        assert_eq!(nodes[0].title, "Name");
        assert_eq!(nodes[0].kind, SchemaClass::Primitive);
        assert!(nodes[0].has_value);
        assert!(nodes[0].is_required);
        assert_eq!(nodes[0].schema_type.as_deref(), Some("string"));

        assert_eq!(nodes[1].path, "age");
        assert_eq!(nodes[1].title, "age", "key is the fallback title");
        assert!(!nodes[1].has_value);
        assert!(!nodes[1].is_required);
    }

    #[test]
    fn null_property_value_still_counts_as_present() {
        let nodes = build(
            r#"{"type": "object", "properties": {"a": {"type": "string"}}}"#,
            json!({"a": null}),
        );
        assert!(nodes[0].has_value);
    }

    #[test]
    fn array_children_use_index_paths() {
        let nodes = build(
            r#"{
                "type": "object",
                "properties": {
                    "tags": {"type": "array", "items": {"type": "string"}}
                }
            }"#,
            json!({"tags": ["a", "b"]}),
        );
        let tags = &nodes[0];
        assert_eq!(tags.kind, SchemaClass::Array);
        assert_eq!(tags.item_count, Some(2));
        let children = tags.children.as_ref().unwrap();
        assert_eq!(children[0].path, "tags[0]");
        assert_eq!(children[1].path, "tags[1]");
        assert!(children[1].has_value);
    }

    #[test]
    fn dictionary_children_lead_with_a_placeholder() {
        let nodes = build(
            r#"{
                "type": "object",
                "properties": {
                    "services": {
                        "type": "object",
                        "title": "Services",
                        "additionalProperties": {"type": "integer"}
                    }
                }
            }"#,
            json!({"services": {"web": 80, "db": 5432}}),
        );
        let services = &nodes[0];
        assert_eq!(services.kind, SchemaClass::Dictionary);
        let children = services.children.as_ref().unwrap();
        assert_eq!(children.len(), 3);

        assert!(children[0].is_placeholder);
        assert!(!children[0].has_value, "placeholders never report a value");
        assert_eq!(children[0].title, "[service name]");

        assert_eq!(children[1].path, "services.web");
        assert_eq!(children[1].schema_type.as_deref(), Some("integer"));
        assert_eq!(children[2].path, "services.db");
    }

    #[test]
    fn untitled_dictionary_gets_the_generic_placeholder() {
        assert_eq!(placeholder_label(None), "[key]");
        assert_eq!(placeholder_label(Some("Services")), "[service name]");
        assert_eq!(placeholder_label(Some("")), "[key]");
    }

    #[test]
    fn nullable_single_union_unwraps_transparently() {
        let nodes = build(
            r#"{
                "type": "object",
                "properties": {
                    "note": {
                        "title": "Note",
                        "anyOf": [{"type": "string"}, {"type": "null"}]
                    }
                }
            }"#,
            json!({"note": "hi"}),
        );
        let note = &nodes[0];
        assert_eq!(note.kind, SchemaClass::Primitive, "not a variant");
        assert_eq!(note.schema_type.as_deref(), Some("string"));
        assert_eq!(note.title, "Note", "outer title carried onto the alternative");
    }

    #[test]
    fn variant_children_reflect_the_active_alternative() {
        let src = r#"{
            "type": "object",
            "properties": {
                "target": {
                    "anyOf": [
                        {"type": "string"},
                        {
                            "type": "object",
                            "properties": {"host": {"type": "string"}}
                        }
                    ]
                }
            }
        }"#;

        let nodes = build(src, json!({"target": {"host": "example.com"}}));
        let target = &nodes[0];
        assert_eq!(target.kind, SchemaClass::Variant);
        let children = target.children.as_ref().unwrap();
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].path, "target.host");
        assert!(children[0].has_value);

        // With the scalar alternative active there is nothing to descend
        // into; with no value at all there are no children.
        let nodes = build(src, json!({"target": "just-a-string"}));
        assert_eq!(nodes[0].children.as_deref(), Some(&[][..]));
        let nodes = build(src, json!({}));
        assert_eq!(nodes[0].children, None);
    }

    #[test]
    fn cyclic_ref_builds_a_finite_tree() {
        let nodes = build(
            r##"{
                "type": "object",
                "properties": {"node": {"$ref": "#/$defs/Node"}},
                "$defs": {
                    "Node": {
                        "type": "object",
                        "properties": {"child": {"$ref": "#/$defs/Node"}}
                    }
                }
            }"##,
            json!({"node": {"child": {}}}),
        );
        let node = &nodes[0];
        assert_eq!(node.kind, SchemaClass::Object);
        let children = node.children.as_ref().unwrap();
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].path, "node.child");
        // The pointer was already followed on this branch: classified, but
        // closed off.
        assert_eq!(children[0].kind, SchemaClass::Object);
        assert_eq!(children[0].children, None);
    }

    #[test]
    fn sibling_branches_do_not_share_the_cycle_guard() {
        let nodes = build(
            r##"{
                "type": "object",
                "properties": {
                    "a": {"$ref": "#/$defs/Leaf"},
                    "b": {"$ref": "#/$defs/Leaf"}
                },
                "$defs": {"Leaf": {"type": "string"}}
            }"##,
            json!({}),
        );
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[0].schema_type.as_deref(), Some("string"));
        assert_eq!(
            nodes[1].schema_type.as_deref(),
            Some("string"),
            "second use of the pointer is not a cycle"
        );
    }

    #[test]
    fn filter_keeps_populated_branches_only() {
        let nodes = build(
            r#"{
                "type": "object",
                "properties": {
                    "a": {"type": "string"},
                    "b": {"type": "object", "additionalProperties": {"type": "number"}}
                }
            }"#,
            json!({"a": "x"}),
        );
        let filtered = filter_populated_nodes(nodes);
        assert_eq!(filtered.len(), 1, "empty dictionary drops entirely");
        assert_eq!(filtered[0].path, "a");
    }

    #[test]
    fn filter_replaces_children_with_the_filtered_list() {
        let nodes = build(
            r#"{
                "type": "object",
                "properties": {
                    "outer": {
                        "type": "object",
                        "properties": {
                            "set": {"type": "string"},
                            "unset": {"type": "string"}
                        }
                    }
                }
            }"#,
            json!({"outer": {"set": "v"}}),
        );
        let filtered = filter_populated_nodes(nodes);
        assert_eq!(filtered.len(), 1);
        let outer_children = filtered[0].children.as_ref().unwrap();
        assert_eq!(outer_children.len(), 1);
        assert_eq!(outer_children[0].path, "outer.set");
    }
}
