//! Native payload index and texture-candidate resolution.
//!
//! Binary payloads live under two-character hex bucket directories named
//! after the leading characters of their content-derived identifiers. The
//! index is built once per run from a single scan and is read-only
//! afterwards; per-path image descriptors are computed lazily and cached.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use regex::Regex;
use thiserror::Error;
use walkdir::WalkDir;

use crate::sniff;
use crate::stub;

/// Catch-all bucket for payloads whose path segment is not a two-character
/// hex prefix.
pub const MISC_BUCKET: &str = "__misc__";

/// Image payload extensions, in atlas-texture preference order.
const IMAGE_EXTENSIONS: [&str; 4] = ["png", "webp", "jpg", "jpeg"];

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("native payload root is not a directory: {0}")]
    NotADirectory(PathBuf),
}

/// Bucket-prefix index over the native image payloads.
pub struct NativeIndex {
    buckets: HashMap<String, Vec<PathBuf>>,
    // Lazily computed dimensions per payload; interior mutability keeps the
    // index shareable by reference in the single-threaded pipeline.
    sizes: RefCell<HashMap<PathBuf, Option<(u32, u32)>>>,
}

impl NativeIndex {
    /// Scan the native tree once and bucket its image payloads.
    ///
    /// Candidate order within a bucket is the (sorted) directory scan order;
    /// unreadable entries are skipped.
    pub fn scan(native_root: &Path) -> Result<Self, ScanError> {
        if !native_root.is_dir() {
            return Err(ScanError::NotADirectory(native_root.to_owned()));
        }
        let mut buckets: HashMap<String, Vec<PathBuf>> = HashMap::new();
        for entry in WalkDir::new(native_root)
            .sort_by_file_name()
            .into_iter()
            .filter_map(Result::ok)
        {
            if !entry.file_type().is_file() || !has_image_extension(entry.path()) {
                continue;
            }
            let bucket = entry
                .path()
                .strip_prefix(native_root)
                .ok()
                .and_then(|rel| rel.components().next())
                .map(|first| bucket_key(&first.as_os_str().to_string_lossy()))
                .unwrap_or_else(|| MISC_BUCKET.to_owned());
            buckets.entry(bucket).or_default().push(entry.into_path());
        }
        Ok(Self {
            buckets,
            sizes: RefCell::new(HashMap::new()),
        })
    }

    /// Candidate payloads for a compressed texture reference. The first two
    /// characters of the reference select the bucket.
    pub fn candidates(&self, reference: &str) -> &[PathBuf] {
        reference
            .get(..2)
            .and_then(|prefix| self.buckets.get(&prefix.to_ascii_lowercase()))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Cached intrinsic dimensions of an image payload. Non-image extensions
    /// resolve to `None` without reading the body; unsupported or corrupt
    /// bytes degrade to `None` as well.
    pub fn image_size(&self, path: &Path) -> Option<(u32, u32)> {
        if let Some(cached) = self.sizes.borrow().get(path) {
            return *cached;
        }
        let size = if has_image_extension(path) {
            fs::read(path).ok().and_then(|bytes| sniff::dimensions(&bytes))
        } else {
            None
        };
        self.sizes.borrow_mut().insert(path.to_owned(), size);
        size
    }

    /// Resolve the texture for a skeleton bundle.
    ///
    /// Disambiguation order: match the dimensions declared in the atlas text
    /// against each candidate, then fall back to the first candidate in scan
    /// order. The fallback is best-effort only; with no dimension signal the
    /// scan order is all there is to go on.
    pub fn resolve_skeleton_texture(
        &self,
        reference: &str,
        atlas_text: &str,
    ) -> Option<&Path> {
        let candidates = self.candidates(reference);
        if let Some((width, height)) = declared_atlas_size(atlas_text) {
            for path in candidates {
                if self.image_size(path) == Some((width, height)) {
                    return Some(path);
                }
            }
        }
        candidates.first().map(PathBuf::as_path)
    }

    /// Choose the backing texture for an atlas group.
    ///
    /// Prefers candidates with genuine image signatures in PNG > WEBP > JPEG
    /// order, then falls back to the same extension order regardless of
    /// signature (the winner may be a stub; it is resolved at copy time).
    pub fn choose_atlas_texture(&self, reference: &str) -> Option<&Path> {
        let candidates = self.candidates(reference);
        for ext in IMAGE_EXTENSIONS {
            if let Some(found) = candidates
                .iter()
                .find(|p| has_extension(p, ext) && stub::is_genuine_image(p))
            {
                return Some(found.as_path());
            }
        }
        for ext in IMAGE_EXTENSIONS {
            if let Some(found) = candidates.iter().find(|p| has_extension(p, ext)) {
                return Some(found.as_path());
            }
        }
        None
    }
}

/// Deterministic stand-in texture file name for an unresolvable reference.
pub fn placeholder_texture_name(reference: &str) -> String {
    let prefix = reference.get(..2).unwrap_or(reference).to_ascii_lowercase();
    format!("texture_{}.png", prefix)
}

/// Parse the `size: W,H` marker from Spine atlas text.
pub fn declared_atlas_size(atlas_text: &str) -> Option<(u32, u32)> {
    let marker = Regex::new(r"(?i)size:\s*(\d+)\s*,\s*(\d+)").expect("valid regex");
    let caps = marker.captures(atlas_text)?;
    let width = caps.get(1)?.as_str().parse().ok()?;
    let height = caps.get(2)?.as_str().parse().ok()?;
    Some((width, height))
}

fn bucket_key(segment: &str) -> String {
    let is_hex_pair = segment.len() == 2 && segment.bytes().all(|b| b.is_ascii_hexdigit());
    if is_hex_pair {
        segment.to_ascii_lowercase()
    } else {
        MISC_BUCKET.to_owned()
    }
}

fn has_image_extension(path: &Path) -> bool {
    IMAGE_EXTENSIONS.iter().any(|ext| has_extension(path, ext))
}

fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension()
        .map(|e| e.to_string_lossy().eq_ignore_ascii_case(ext))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let mut data = Vec::new();
        let mut encoder = png::Encoder::new(&mut data, width, height);
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);
        let mut writer = encoder.write_header().unwrap();
        writer
            .write_image_data(&vec![0u8; (width * height * 4) as usize])
            .unwrap();
        drop(writer);
        data
    }

    fn write(root: &Path, rel: &str, body: &[u8]) -> PathBuf {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn buckets_by_hex_prefix_with_catch_all() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "AB/one.png", &png_bytes(2, 2));
        write(dir.path(), "ab/two.webp", b"stub");
        write(dir.path(), "misc-dir/three.png", b"stub");
        write(dir.path(), "loose.jpg", b"stub");
        write(dir.path(), "ab/ignored.bin", b"not an image");
        let index = NativeIndex::scan(dir.path()).unwrap();

        assert_eq!(index.candidates("ab99ff00").len(), 2);
        assert_eq!(index.candidates("AB99ff00").len(), 2);
        assert_eq!(index.candidates("zz").len(), 0);
        // Short references cannot select a bucket.
        assert_eq!(index.candidates("a").len(), 0);
        assert_eq!(index.candidates(MISC_BUCKET).len(), 0);
    }

    #[test]
    fn scan_rejects_missing_root() {
        let dir = TempDir::new().unwrap();
        assert!(NativeIndex::scan(&dir.path().join("absent")).is_err());
    }

    #[test]
    fn image_size_is_cached_and_extension_gated() {
        let dir = TempDir::new().unwrap();
        let real = write(dir.path(), "ab/real.png", &png_bytes(64, 32));
        let fake = write(dir.path(), "ab/fake.png", b"not image bytes");
        let index = NativeIndex::scan(dir.path()).unwrap();

        assert_eq!(index.image_size(&real), Some((64, 32)));
        assert_eq!(index.image_size(&fake), None);
        assert_eq!(index.image_size(Path::new("whatever.txt")), None);
        // Second read answers from the cache even if the file disappears.
        fs::remove_file(&real).unwrap();
        assert_eq!(index.image_size(&real), Some((64, 32)));
    }

    #[test]
    fn skeleton_texture_prefers_declared_size_match() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "cd/a_small.png", &png_bytes(4, 4));
        let big = write(dir.path(), "cd/b_big.png", &png_bytes(512, 256));
        let index = NativeIndex::scan(dir.path()).unwrap();

        let atlas = "sheet.png\nsize: 512,256\nformat: RGBA8888\n";
        assert_eq!(index.resolve_skeleton_texture("cdef", atlas), Some(big.as_path()));
        // No size marker: first candidate in scan order.
        let fallback = index.resolve_skeleton_texture("cdef", "no marker here").unwrap();
        assert!(fallback.ends_with("a_small.png"));
        assert_eq!(index.resolve_skeleton_texture("ff00", atlas), None);
    }

    #[test]
    fn atlas_texture_prefers_genuine_png_over_stub() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "ef/a_stub.png", b"No Content https://x.example/t.png");
        let genuine = write(dir.path(), "ef/b_real.webp", b"RIFF\x04\x00\x00\x00WEBP");
        let index = NativeIndex::scan(dir.path()).unwrap();

        // The PNG sorts first but is a stub; the genuine WEBP wins.
        assert_eq!(index.choose_atlas_texture("ef01"), Some(genuine.as_path()));
    }

    #[test]
    fn atlas_texture_falls_back_to_extension_priority() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "ef/z_stub.png", b"No Content https://x.example/t.png");
        write(dir.path(), "ef/a_stub.jpg", b"No Content https://x.example/t.jpg");
        let index = NativeIndex::scan(dir.path()).unwrap();

        // Nothing genuine: PNG still outranks JPEG.
        let chosen = index.choose_atlas_texture("ef01").unwrap();
        assert!(chosen.ends_with("z_stub.png"));
    }

    #[test]
    fn declared_size_parsing() {
        assert_eq!(declared_atlas_size("size: 512,256"), Some((512, 256)));
        assert_eq!(declared_atlas_size("SIZE:100 , 50"), Some((100, 50)));
        assert_eq!(declared_atlas_size("width: 512"), None);
    }

    #[test]
    fn placeholder_name_uses_bucket_prefix() {
        assert_eq!(placeholder_texture_name("AB99ff"), "texture_ab.png");
        assert_eq!(placeholder_texture_name("a"), "texture_a.png");
    }
}
