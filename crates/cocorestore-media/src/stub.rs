//! Placeholder (stub) payload detection and resolution.
//!
//! Some compiled bundles ship placeholder files in place of large textures:
//! a short text body containing a "No Content" notice and a remote locator
//! for the real bytes. Materializing a payload therefore means: copy genuine
//! image bytes verbatim, otherwise chase the embedded locator, otherwise
//! attempt a verbatim copy as a last resort. Every failure path reports
//! `false`; none of these operations can fail a run.

use std::fs::{self, File};
use std::io::Read;
use std::path::Path;

use regex::Regex;

/// Sentinel phrase that marks a placeholder body.
const STUB_SENTINEL: &str = "No Content";

/// Upper bound on how much of a suspected stub is read and decoded.
const STUB_PREFIX_LEN: u64 = 1024;

/// A pluggable remote fetch capability.
///
/// The restore pipeline is otherwise pure file shuffling; isolating the one
/// network side effect behind this trait lets tests substitute deterministic
/// bytes without touching the network.
pub trait Fetch {
    /// Fetch the body at `url`, or `None` on any transport failure.
    fn fetch(&self, url: &str) -> Option<Vec<u8>>;
}

/// Blocking HTTP fetcher used by the real pipeline.
///
/// No retries and no timeout beyond transport defaults; a failed fetch
/// surfaces as `None` at the call site.
#[derive(Debug, Default)]
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
}

impl Fetch for HttpFetcher {
    fn fetch(&self, url: &str) -> Option<Vec<u8>> {
        let response = self.client.get(url).send().ok()?.error_for_status().ok()?;
        response.bytes().ok().map(|b| b.to_vec())
    }
}

/// Whether the file at `path` starts with a genuine image signature.
///
/// PNG and JPEG are decided from the first 12 bytes; a RIFF prefix needs a
/// second, slightly longer read to confirm the `WEBP` tag.
pub fn is_genuine_image(path: &Path) -> bool {
    let Some(head) = read_prefix(path, 12) else {
        return false;
    };
    if head.len() < 4 {
        return false;
    }
    if head.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
        return true;
    }
    if head[0] == 0xFF && head[1] == 0xD8 {
        return true;
    }
    if &head[0..4] == b"RIFF" {
        if let Some(longer) = read_prefix(path, 16) {
            return longer.len() >= 12 && &longer[8..12] == b"WEBP";
        }
    }
    false
}

/// Extract the remote locator from a placeholder file.
///
/// Reads a bounded prefix, lossily decodes it as text, and only when the
/// text carries the placeholder sentinel extracts the first URL-shaped
/// substring. Anything else yields `None`.
pub fn extract_stub_url(path: &Path) -> Option<String> {
    let prefix = read_prefix(path, STUB_PREFIX_LEN)?;
    let text = String::from_utf8_lossy(&prefix);
    if !text.contains(STUB_SENTINEL) {
        return None;
    }
    let url = Regex::new(r"(https?://[^\s%]+)").expect("valid regex");
    url.find(&text).map(|m| m.as_str().to_owned())
}

/// Materialize `src` at `dst`, resolving a placeholder if necessary.
///
/// Genuine images copy verbatim. A placeholder with a locator is fetched
/// and its body written; a fetch failure is final (no placeholder bytes are
/// written in its place). Files that are neither get a last-resort verbatim
/// copy attempt.
pub fn materialize(src: &Path, dst: &Path, fetch: &dyn Fetch) -> bool {
    if is_genuine_image(src) {
        return fs::copy(src, dst).is_ok();
    }
    if let Some(url) = extract_stub_url(src) {
        return match fetch.fetch(&url) {
            Some(body) => fs::write(dst, body).is_ok(),
            None => false,
        };
    }
    fs::copy(src, dst).is_ok()
}

fn read_prefix(path: &Path, limit: u64) -> Option<Vec<u8>> {
    let file = File::open(path).ok()?;
    let mut buf = Vec::with_capacity(limit as usize);
    file.take(limit).read_to_end(&mut buf).ok()?;
    Some(buf)
}
