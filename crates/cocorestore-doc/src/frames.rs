//! Atlas sprite-frame recovery.
//!
//! Frame records survive compilation as plain objects carrying `name`,
//! `rect` and `originalSize` fields. Geometry fields appear in two encodings
//! depending on the compiler version: a flat numeric array (`[x, y, w, h]` /
//! `[x, y]`) or a nested pair-of-pairs (`[[x, y], [w, h]]`). Both normalize
//! to the same integer structs here; non-conforming shapes degrade to zeros.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::walk::walk;

/// An integer point or size pair.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pair {
    pub x: i64,
    pub y: i64,
}

/// A sub-rectangle of a texture.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rect {
    pub x: i64,
    pub y: i64,
    pub w: i64,
    pub h: i64,
}

/// A named sub-rectangle of a texture plus padding metadata, the atomic unit
/// of a texture atlas.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpriteFrame {
    pub name: String,
    pub rotated: bool,
    pub rect: Rect,
    pub offset: Pair,
    pub original_size: Pair,
}

/// Collect every sprite-frame record in a document.
///
/// A record is any object with a non-empty `name`, a present `rect` and a
/// present `originalSize`. `rotated` defaults to false and `offset` to
/// `{0, 0}`.
pub fn extract_sprite_frames(doc: &Value) -> Vec<SpriteFrame> {
    let mut out = Vec::new();
    walk(doc, &mut |node| {
        let Value::Object(map) = node else {
            return;
        };
        let Some(name) = map.get("name").and_then(Value::as_str) else {
            return;
        };
        if name.is_empty() {
            return;
        }
        let (Some(rect), Some(original_size)) = (map.get("rect"), map.get("originalSize"))
        else {
            return;
        };
        if !is_present(rect) || !is_present(original_size) {
            return;
        }
        out.push(SpriteFrame {
            name: name.to_owned(),
            rotated: map.get("rotated").and_then(Value::as_bool).unwrap_or(false),
            rect: normalize_rect(rect),
            offset: map.get("offset").map(normalize_pair).unwrap_or_default(),
            original_size: normalize_pair(original_size),
        });
    });
    out
}

/// Whether a field value counts as present. Null and empty containers do
/// not; they are artifacts of the compiler writing out default slots.
fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
        Value::String(s) => !s.is_empty(),
        _ => true,
    }
}

/// Normalize a rect field to `{x, y, w, h}`.
pub fn normalize_rect(value: &Value) -> Rect {
    let Value::Array(items) = value else {
        return Rect::default();
    };
    // Nested encoding: [[x, y], [w, h]].
    if let Some(Value::Array(_)) = items.first() {
        let origin = items.first().map(normalize_pair).unwrap_or_default();
        let size = items.get(1).map(normalize_pair).unwrap_or_default();
        return Rect {
            x: origin.x,
            y: origin.y,
            w: size.x,
            h: size.y,
        };
    }
    Rect {
        x: int_at(items, 0),
        y: int_at(items, 1),
        w: int_at(items, 2),
        h: int_at(items, 3),
    }
}

/// Normalize a point/size field to `{x, y}`.
pub fn normalize_pair(value: &Value) -> Pair {
    let Value::Array(items) = value else {
        return Pair::default();
    };
    // Nested encoding: take the leading pair.
    if let Some(Value::Array(inner)) = items.first() {
        return Pair {
            x: int_at(inner, 0),
            y: int_at(inner, 1),
        };
    }
    Pair {
        x: int_at(items, 0),
        y: int_at(items, 1),
    }
}

/// Integer at an index, truncating fractional values toward zero. Missing
/// or non-numeric slots read as zero.
fn int_at(items: &[Value], index: usize) -> i64 {
    items
        .get(index)
        .and_then(Value::as_f64)
        .map(|v| v as i64)
        .unwrap_or(0)
}
