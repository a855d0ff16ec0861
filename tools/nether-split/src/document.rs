//! glTF document model
//!
//! Only `buffers` and `bufferViews` are typed. Every other top-level key is
//! kept as raw JSON in its original position and written back unchanged.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;

use crate::error::{Result, SplitError};

/// A glTF buffer record.
///
/// See <https://registry.khronos.org/glTF/specs/2.0/glTF-2.0.html#reference-buffer>
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Buffer {
    pub byte_length: u64,
    /// Absent for embedded (GLB) buffers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extensions: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extras: Option<Value>,
}

impl Buffer {
    /// Copy of this buffer's metadata with `byteLength` reset to zero.
    ///
    /// Used as the starting point for every chunk split from this buffer.
    pub fn empty_copy(&self) -> Self {
        Self {
            byte_length: 0,
            ..self.clone()
        }
    }
}

/// A glTF bufferView record.
///
/// See <https://registry.khronos.org/glTF/specs/2.0/glTF-2.0.html#reference-bufferview>
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BufferView {
    pub buffer: usize,
    pub byte_length: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub byte_offset: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub byte_stride: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extensions: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extras: Option<Value>,
}

impl BufferView {
    /// Byte offset into the referenced buffer (glTF default: 0)
    pub fn offset(&self) -> u64 {
        self.byte_offset.unwrap_or(0)
    }

    /// Exclusive end of this view's byte range, `None` if it overflows
    pub fn end(&self) -> Option<u64> {
        self.offset().checked_add(self.byte_length)
    }
}

/// A parsed glTF document.
#[derive(Debug, Clone)]
pub struct Document {
    /// Top-level JSON object; the typed keys hold stale values until serialized
    root: Map<String, Value>,
    pub buffers: Vec<Buffer>,
    pub buffer_views: Vec<BufferView>,
}

impl Document {
    pub const BUFFERS_KEY: &'static str = "buffers";
    pub const BUFFER_VIEWS_KEY: &'static str = "bufferViews";

    /// Parse a document from glTF JSON text
    pub fn from_json(json: &str) -> Result<Self> {
        let mut root: Map<String, Value> = serde_json::from_str(json)?;

        let buffers = take_array(&mut root, Self::BUFFERS_KEY)?;
        let buffer_views = take_array(&mut root, Self::BUFFER_VIEWS_KEY)?;

        Ok(Self {
            root,
            buffers,
            buffer_views,
        })
    }

    /// Load and parse a `.gltf` file
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path).map_err(|e| SplitError::io(path, e))?;
        Self::from_json(&json)
    }

    /// Serialize back to JSON, either compact or with a 2-space indent
    pub fn to_json(&self, pretty: bool) -> Result<String> {
        let mut root = self.root.clone();
        root.insert(
            Self::BUFFERS_KEY.to_string(),
            serde_json::to_value(&self.buffers)?,
        );
        root.insert(
            Self::BUFFER_VIEWS_KEY.to_string(),
            serde_json::to_value(&self.buffer_views)?,
        );

        let root = Value::Object(root);
        let json = if pretty {
            serde_json::to_string_pretty(&root)?
        } else {
            serde_json::to_string(&root)?
        };
        Ok(json)
    }

    /// Overwrite `path` with the serialized document
    pub fn save(&self, path: &Path, pretty: bool) -> Result<()> {
        let json = self.to_json(pretty)?;
        std::fs::write(path, json).map_err(|e| SplitError::io(path, e))
    }
}

/// Take a required array out of the root, leaving a placeholder so the key
/// keeps its position.
fn take_array<T: serde::de::DeserializeOwned>(
    root: &mut Map<String, Value>,
    key: &'static str,
) -> Result<Vec<T>> {
    let value = root
        .get_mut(key)
        .map(Value::take)
        .ok_or(SplitError::MissingKey(key))?;
    Ok(serde_json::from_value(value)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "asset": {"version": "2.0", "generator": "test"},
        "buffers": [{"byteLength": 100, "uri": "mesh.bin", "extras": {"tag": 1}}],
        "bufferViews": [
            {"buffer": 0, "byteLength": 40, "target": 34962},
            {"buffer": 0, "byteLength": 60, "byteOffset": 40, "name": "indices"}
        ],
        "meshes": [{"primitives": []}]
    }"#;

    #[test]
    fn test_parse_typed_records() {
        let doc = Document::from_json(SAMPLE).unwrap();
        assert_eq!(doc.buffers.len(), 1);
        assert_eq!(doc.buffers[0].byte_length, 100);
        assert_eq!(doc.buffers[0].uri.as_deref(), Some("mesh.bin"));
        assert_eq!(doc.buffers[0].extras, Some(serde_json::json!({"tag": 1})));

        assert_eq!(doc.buffer_views.len(), 2);
        assert_eq!(doc.buffer_views[0].byte_offset, None);
        assert_eq!(doc.buffer_views[0].offset(), 0);
        assert_eq!(doc.buffer_views[0].target, Some(34962));
        assert_eq!(doc.buffer_views[1].end(), Some(100));
        assert_eq!(doc.buffer_views[1].name.as_deref(), Some("indices"));
    }

    #[test]
    fn test_view_end_overflow() {
        let view: BufferView = serde_json::from_str(
            r#"{"buffer":0,"byteOffset":9223372036854775808,"byteLength":9223372036854775808}"#,
        )
        .unwrap();
        assert_eq!(view.end(), None);
    }

    #[test]
    fn test_absent_fields_are_omitted() {
        let doc = Document::from_json(SAMPLE).unwrap();
        let json = doc.to_json(false).unwrap();
        assert!(!json.contains("null"));
        assert!(!json.contains("\"name\":null"));
        // First view never had an offset
        assert!(json.contains(r#"{"buffer":0,"byteLength":40,"target":34962}"#));
    }

    #[test]
    fn test_other_sections_preserved_in_order() {
        let doc = Document::from_json(SAMPLE).unwrap();
        let json = doc.to_json(false).unwrap();
        let value: Value = serde_json::from_str(&json).unwrap();
        let keys: Vec<&str> = value
            .as_object()
            .unwrap()
            .keys()
            .map(String::as_str)
            .collect();
        assert_eq!(keys, ["asset", "buffers", "bufferViews", "meshes"]);
        assert_eq!(value["asset"]["generator"], "test");
        assert_eq!(value["meshes"][0]["primitives"], serde_json::json!([]));
    }

    #[test]
    fn test_rewritten_buffers_are_serialized() {
        let mut doc = Document::from_json(SAMPLE).unwrap();
        let mut chunk = doc.buffers[0].empty_copy();
        chunk.byte_length = 40;
        doc.buffers = vec![chunk.clone(), chunk];

        let value: Value = serde_json::from_str(&doc.to_json(false).unwrap()).unwrap();
        assert_eq!(value["buffers"].as_array().unwrap().len(), 2);
        assert_eq!(value["buffers"][1]["byteLength"], 40);
        assert_eq!(value["buffers"][1]["uri"], "mesh.bin");
    }

    #[test]
    fn test_pretty_uses_two_space_indent() {
        let doc = Document::from_json(SAMPLE).unwrap();
        let json = doc.to_json(true).unwrap();
        assert!(json.starts_with("{\n  \"asset\""));
    }

    #[test]
    fn test_missing_buffer_views_key() {
        let err = Document::from_json(r#"{"buffers": []}"#).unwrap_err();
        assert!(matches!(err, SplitError::MissingKey("bufferViews")));
    }

    #[test]
    fn test_empty_copy_resets_length_only() {
        let buffer = Buffer {
            byte_length: 64,
            uri: Some("a.bin".to_string()),
            name: Some("a".to_string()),
            extensions: None,
            extras: Some(serde_json::json!({"k": "v"})),
        };
        let copy = buffer.empty_copy();
        assert_eq!(copy.byte_length, 0);
        assert_eq!(copy.uri, buffer.uri);
        assert_eq!(copy.name, buffer.name);
        assert_eq!(copy.extras, buffer.extras);
    }
}
