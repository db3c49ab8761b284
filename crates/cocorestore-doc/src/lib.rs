//! Structural-document recovery for compiled Cocos Creator assets.
//!
//! Compiled `import` documents are JSON trees whose original authoring
//! structure has been flattened into loosely-typed arrays and objects. This
//! crate recognizes the surviving positional patterns and rebuilds editable
//! asset records from them:
//!
//! - [`clips`]: explicit `cc.AnimationClip` timelines
//! - [`skeleton`]: Spine-style skeletal-animation bundles
//! - [`frames`]: texture-atlas sprite-frame records
//! - [`atlas`]: frame grouping by texture reference and plist assembly
//! - [`sequence`]: animation timelines inferred from frame-name number series
//!
//! Everything here is best-effort by design: a pattern that fails to match at
//! a node is simply not collected, and an identifier index that falls outside
//! its table resolves to `None`. No extractor ever fails a run.

pub mod atlas;
pub mod clips;
pub mod frames;
pub mod idtable;
pub mod plist;
pub mod sequence;
pub mod skeleton;
pub mod walk;

mod util;

pub use atlas::{AtlasGroup, AtlasGroupSet};
pub use clips::{extract_clips, has_clip_marker, AnimationClip, ClipSource, Keyframe, Track, TrackKind};
pub use frames::{extract_sprite_frames, Pair, Rect, SpriteFrame};
pub use idtable::{guess_texture_reference, IdentifierTable};
pub use sequence::{infer_clips, INFERRED_SAMPLE_RATE};
pub use skeleton::{extract_skeleton_bundles, SkeletonBundle};
pub use util::safe_slug;
