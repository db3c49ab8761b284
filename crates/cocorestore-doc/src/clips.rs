//! Explicit animation-clip recovery.
//!
//! Compiled clips survive as positional arrays: a clip header opens a scope,
//! and keyframe-track records for the `spriteFrame` property appear somewhere
//! in the subtree below it. Both patterns are duck-typed by element position
//! and value, so matching is strictly best-effort.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::idtable::IdentifierTable;
use crate::walk::walk_with_context;

/// Marker string present in the raw text of any document that carries
/// explicit animation clips. Used as a cheap pre-filter before parsing.
pub const CLIP_MARKER: &str = "cc.AnimationClip";

/// Whether a raw document text is worth parsing for explicit clips.
pub fn has_clip_marker(text: &str) -> bool {
    text.contains(CLIP_MARKER)
}

/// How a clip came to exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClipSource {
    /// Recovered from an explicit clip record in a compiled document.
    Authored,
    /// Synthesized from frame-naming evidence alone.
    Guessed,
}

/// Kind of a keyframe track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrackKind {
    #[serde(rename = "spriteFrame")]
    SpriteFrame,
}

/// One keyframe of a track.
///
/// `frame` is the resolved identifier (or frame name, for inferred clips);
/// it is `None` when the compiled record carried an index outside the
/// document's identifier table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Keyframe {
    pub time: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frame: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frame_index: Option<usize>,
}

/// One keyframe track of a clip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    #[serde(rename = "type")]
    pub kind: TrackKind,
    pub frames: Vec<Keyframe>,
}

/// A recovered animation timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimationClip {
    pub name: String,
    /// Total duration in seconds.
    pub duration: f64,
    /// Sample rate in frames per second, when the header carried one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sample: Option<f64>,
    pub tracks: Vec<Track>,
    pub source: ClipSource,
    /// Compressed texture reference of the atlas an inferred clip came from.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_atlas: Option<String>,
}

/// Extract every explicit animation clip from a document.
///
/// A clip header is an array of length >= 3 whose elements are
/// `[number, name, duration]`, optionally followed by a numeric sample rate;
/// a present fourth element that is not numeric disqualifies the match.
/// Matching a header opens the "current clip" context for the subtree, and
/// any descendant array containing the literal `"spriteFrame"` contributes
/// its keyframe records as one track of that clip.
pub fn extract_clips(doc: &Value, table: &IdentifierTable) -> Vec<AnimationClip> {
    let mut clips: Vec<AnimationClip> = Vec::new();
    walk_with_context(doc, &None::<usize>, &mut |node, ctx| {
        let Value::Array(items) = node else {
            return *ctx;
        };
        let mut current = *ctx;
        if let Some(clip) = match_clip_header(items) {
            clips.push(clip);
            current = Some(clips.len() - 1);
        }
        if items.iter().any(|v| v == "spriteFrame") {
            let mut keyframes = Vec::new();
            collect_keyframes(items, table, &mut keyframes);
            if let Some(index) = current {
                if !keyframes.is_empty() {
                    clips[index].tracks.push(Track {
                        kind: TrackKind::SpriteFrame,
                        frames: keyframes,
                    });
                }
            }
        }
        current
    });
    clips
}

fn match_clip_header(items: &[Value]) -> Option<AnimationClip> {
    if items.len() < 3 {
        return None;
    }
    items[0].as_f64()?;
    let name = items[1].as_str()?;
    let duration = items[2].as_f64()?;
    let sample = match items.get(3) {
        Some(value) => Some(value.as_f64()?),
        None => None,
    };
    Some(AnimationClip {
        name: name.to_owned(),
        duration,
        sample,
        tracks: Vec::new(),
        source: ClipSource::Authored,
        source_atlas: None,
    })
}

/// Scan an array subtree for keyframe records.
///
/// A record is an array of length >= 4 whose first element is an object with
/// a `"frame"` field (the time in seconds) and which carries the literal
/// `"value"` among its elements. The frame identifier is the integer element
/// immediately following a literal `6`, resolved against the document's
/// identifier table.
fn collect_keyframes(items: &[Value], table: &IdentifierTable, out: &mut Vec<Keyframe>) {
    for entry in items {
        let Value::Array(record) = entry else {
            continue;
        };
        if record.len() >= 4 {
            if let Some(Value::Object(head)) = record.first() {
                if head.contains_key("frame") && record.iter().any(|v| v == "value") {
                    let time = head.get("frame").and_then(Value::as_f64);
                    let frame_index = find_identifier_index(record);
                    let frame = frame_index
                        .and_then(|i| table.get(i))
                        .map(str::to_owned);
                    out.push(Keyframe {
                        time,
                        frame,
                        frame_index,
                    });
                }
            }
        }
    }
    for entry in items {
        if let Value::Array(nested) = entry {
            collect_keyframes(nested, table, out);
        }
    }
}

/// Find the literal `6` tag followed by an integer index within a record.
fn find_identifier_index(record: &[Value]) -> Option<usize> {
    for window in record.windows(2) {
        if window[0].as_i64() == Some(6) {
            if let Some(raw) = window[1].as_i64() {
                return usize::try_from(raw).ok();
            }
        }
    }
    None
}
