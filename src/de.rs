//! Typed deserialization with path context in error messages.
//!
//! Schemas and documents arrive as user-authored text; when one fails to
//! deserialize, the error names the JSON path of the offending node, not
//! just a byte position.

use serde::de::DeserializeOwned;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("{format} deserialization failed at `{path}`: {message}")]
pub struct LoadError {
    pub format: &'static str,
    /// JSON path to the node that failed, `.`-joined.
    pub path: String,
    pub message: String,
}

pub fn from_json_str<T: DeserializeOwned>(src: &str) -> Result<T, LoadError> {
    let de = &mut serde_json::Deserializer::from_str(src);
    serde_path_to_error::deserialize(de).map_err(|err| LoadError {
        format: "JSON",
        path: err.path().to_string(),
        message: err.into_inner().to_string(),
    })
}

pub fn from_yaml_str<T: DeserializeOwned>(src: &str) -> Result<T, LoadError> {
    let de = serde_yaml::Deserializer::from_str(src);
    serde_path_to_error::deserialize(de).map_err(|err| LoadError {
        format: "YAML",
        path: err.path().to_string(),
        message: err.into_inner().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::SchemaNode;

    #[test]
    fn json_errors_name_the_offending_path() {
        let err = from_json_str::<SchemaNode>(r#"{"properties": {"a": {"type": 1}}}"#)
            .unwrap_err();
        assert!(err.path.contains("properties.a"), "got path {}", err.path);
        assert_eq!(err.format, "JSON");
    }

    #[test]
    fn yaml_documents_load_as_values() {
        let value: serde_json::Value = from_yaml_str("a:\n  b: [1, 2]\n").unwrap();
        assert_eq!(value["a"]["b"][1], serde_json::json!(2));
    }
}
