//! NDJSON body for the `_bulk` endpoint.
//!
//! Every document contributes two lines: an `{"index":{}}` action line and
//! the JSON-encoded document. The body ends with a newline.

use crate::normalize::yaml_block;
use crate::record::{Document, Extra};
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::Value;

pub const ACTION_LINE: &str = "{\"index\":{}}";

impl Serialize for Document {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let len = if self.extra.is_some() { 6 } else { 4 };
        let mut map = serializer.serialize_map(Some(len))?;
        map.serialize_entry("level", &self.level)?;
        map.serialize_entry("name", &self.name)?;
        map.serialize_entry("message", &self.message)?;
        map.serialize_entry("@timestamp", &self.timestamp)?;
        if let Some(extra) = &self.extra {
            let (tag, value) = encode_extra(extra);
            map.serialize_entry("extra", &value)?;
            map.serialize_entry("type", &tag)?;
        }
        map.end()
    }
}

/// `type` tag and `extra` value for a payload.
pub fn encode_extra(extra: &Extra) -> (&str, Value) {
    match extra {
        Extra::Mapping(map) => ("yaml", Value::String(yaml_block(map))),
        Extra::Scalar { type_name, value } => (*type_name, value.clone()),
        Extra::Exception(text) => ("exception", Value::String(text.clone())),
        Extra::Opaque { type_name, repr } => (type_name.as_str(), Value::String(repr.clone())),
    }
}

/// Encode one document as a single JSON line.
///
/// Documents are made of strings and JSON values only, so encoding does
/// not fail in practice; should it, the payload is dropped from the line
/// rather than losing the whole document.
pub fn encode_document(doc: &Document) -> String {
    serde_json::to_string(doc).unwrap_or_else(|_| {
        let bare = Document { extra: None, ..doc.clone() };
        serde_json::to_string(&bare).unwrap_or_default()
    })
}

/// Build the full `_bulk` request body for a batch.
pub fn encode_bulk(docs: &[Document]) -> String {
    let mut body = String::with_capacity(docs.len() * 128);
    for doc in docs {
        body.push_str(ACTION_LINE);
        body.push('\n');
        body.push_str(&encode_document(doc));
        body.push('\n');
    }
    body
}
