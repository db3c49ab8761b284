//! Skeletal-animation bundle recovery.
//!
//! A compiled skeleton entry is a six-slot positional array: a literal `0`
//! discriminant, the bundle name, the raw atlas text, texture name hints,
//! the skeleton definition document, and texture index hints. One compiled
//! document may carry several bundles.

use serde::Serialize;
use serde_json::Value;

use crate::walk::walk;

/// A recovered Spine-style skeletal-animation bundle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkeletonBundle {
    pub name: String,
    /// Raw `.atlas` text as authored.
    pub atlas_text: String,
    /// The skeleton definition, kept as an opaque structured document.
    pub skeleton: Value,
    /// Texture file-name hints, in declaration order.
    pub texture_names: Vec<String>,
    /// Indexes into the document's identifier table, in declaration order.
    pub texture_indices: Vec<usize>,
}

/// Collect every skeleton bundle in a document.
pub fn extract_skeleton_bundles(doc: &Value) -> Vec<SkeletonBundle> {
    let mut out = Vec::new();
    walk(doc, &mut |node| {
        let Value::Array(items) = node else {
            return;
        };
        if items.len() < 6 {
            return;
        }
        if items[0].as_i64() != Some(0) {
            return;
        }
        let (Some(name), Some(atlas_text)) = (items[1].as_str(), items[2].as_str()) else {
            return;
        };
        let (Value::Array(names), Value::Object(_), Value::Array(indices)) =
            (&items[3], &items[4], &items[5])
        else {
            return;
        };
        out.push(SkeletonBundle {
            name: name.to_owned(),
            atlas_text: atlas_text.to_owned(),
            skeleton: items[4].clone(),
            texture_names: names
                .iter()
                .filter_map(|v| v.as_str().map(str::to_owned))
                .collect(),
            texture_indices: indices
                .iter()
                .filter_map(|v| v.as_i64().and_then(|i| usize::try_from(i).ok()))
                .collect(),
        });
    });
    out
}
