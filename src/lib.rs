//! Core engine for a schema-aware structured document editor.
//!
//! Maps between a serialized document (YAML/JSON/JSONC text), its parsed
//! data value, and a JSON-Schema-described navigable structure:
//!
//! - [`path`]: path strings ↔ typed segment sequences;
//! - [`ops`]: immutable get/set/delete/move over nested values by path;
//! - [`resolver`]: `$ref` resolution, property lookup, derived defaults,
//!   property order;
//! - [`tree`]: (schema, value) → navigable tree of typed nodes, with cycle
//!   protection for self-referential schemas;
//! - [`position`]: cursor position → path, for YAML and JSON/JSONC text;
//! - [`de`]: typed loading with path-context errors.
//!
//! Everything is a synchronous pure-data transformation; the only mutable
//! state is the resolver's memo cache, confined to one resolver value.

pub mod de;
pub mod ops;
pub mod path;
pub mod position;
pub mod resolver;
pub mod schema;
pub mod tree;

pub use path::{Path, PathSegment};
pub use position::{path_at_position, CursorPosition, DocumentFormat};
pub use resolver::{ResolveError, SchemaResolver, VariantMatch};
pub use schema::{classify, SchemaClass, SchemaNode};
pub use tree::{filter_populated_nodes, TreeBuilder, TreeNode};
