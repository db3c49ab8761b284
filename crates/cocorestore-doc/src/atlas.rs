//! Atlas grouping and canonical descriptor assembly.
//!
//! Sprite frames from many compiled documents are regrouped by the exact
//! compressed texture reference they index, then emitted as one
//! property-list atlas descriptor per group.

use std::collections::{BTreeMap, BTreeSet};

use serde_json::{json, Map, Value};

use crate::frames::SpriteFrame;
use crate::plist::to_plist_document;

/// Frames recovered for one compressed texture reference.
///
/// Membership is determined by exact string equality of the reference;
/// duplicate frame names within a group keep the first-seen record. Both are
/// deliberate: fuzzy reference matching would merge unrelated atlases, and
/// later duplicates are re-exports of the same frame more often than not.
#[derive(Debug, Clone, Default)]
pub struct AtlasGroup {
    frames: BTreeMap<String, SpriteFrame>,
    sources: BTreeSet<String>,
}

impl AtlasGroup {
    /// Record a contributing document and its frames, keeping first-seen
    /// records on name collision.
    pub fn absorb(&mut self, source_doc: &str, frames: Vec<SpriteFrame>) {
        self.sources.insert(source_doc.to_owned());
        for frame in frames {
            self.frames.entry(frame.name.clone()).or_insert(frame);
        }
    }

    /// Frames keyed by name, in deterministic order.
    pub fn frames(&self) -> &BTreeMap<String, SpriteFrame> {
        &self.frames
    }

    /// Names of the compiled documents that contributed frames.
    pub fn sources(&self) -> &BTreeSet<String> {
        &self.sources
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Build the canonical plist atlas descriptor for this group.
    ///
    /// Geometry is formatted as the fixed textual tuples sprite-sheet tools
    /// expect: `frame` as `{{x,y},{w,h}}`, `offset` as `{x,y}` and
    /// `sourceSize` as `{w,h}`.
    pub fn to_plist(&self, texture_file_name: &str) -> String {
        let mut frames = Map::new();
        for (name, frame) in &self.frames {
            let rect = frame.rect;
            frames.insert(
                name.clone(),
                json!({
                    "rotated": frame.rotated,
                    "frame": format!("{{{{{},{}}},{{{},{}}}}}", rect.x, rect.y, rect.w, rect.h),
                    "offset": format!("{{{},{}}}", frame.offset.x, frame.offset.y),
                    "sourceSize": format!("{{{},{}}}", frame.original_size.x, frame.original_size.y),
                }),
            );
        }
        let descriptor = json!({
            "frames": frames,
            "metadata": {
                "format": 2,
                "textureFileName": texture_file_name,
            },
        });
        to_plist_document(&descriptor)
    }
}

/// All atlas groups recovered in one run, keyed by exact compressed texture
/// reference.
#[derive(Debug, Clone, Default)]
pub struct AtlasGroupSet {
    groups: BTreeMap<String, AtlasGroup>,
}

impl AtlasGroupSet {
    /// Merge one document's frames into the group for `reference`.
    pub fn merge(&mut self, reference: &str, source_doc: &str, frames: Vec<SpriteFrame>) {
        if frames.is_empty() {
            return;
        }
        self.groups
            .entry(reference.to_owned())
            .or_default()
            .absorb(source_doc, frames);
    }

    /// Iterate groups in deterministic reference order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &AtlasGroup)> {
        self.groups.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}
