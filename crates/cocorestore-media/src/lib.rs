//! Binary-payload handling for compiled Cocos Creator asset trees.
//!
//! The `native` tree of a compiled bundle holds image and audio payloads
//! sharded under two-character content-hash bucket directories. This crate
//! covers everything this side of the join:
//!
//! - [`sniff`]: container classification and header-only dimension reads
//! - [`stub`]: telling genuine image bytes from placeholder redirects, and
//!   materializing either into a destination file
//! - [`native`]: the bucket index plus texture-candidate disambiguation
//!
//! Per-payload failures degrade (`Unknown` kind, `None` dimensions, `false`
//! materialization); nothing in this crate aborts a run over one bad file.

pub mod native;
pub mod sniff;
pub mod stub;

pub use native::{NativeIndex, ScanError, MISC_BUCKET};
pub use sniff::{classify, dimensions, ContainerKind, ImageInfo};
pub use stub::{extract_stub_url, is_genuine_image, materialize, Fetch, HttpFetcher};
