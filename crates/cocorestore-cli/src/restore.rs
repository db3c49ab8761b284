//! The restore pipeline.
//!
//! Single-threaded, single-pass batch execution: one scan of the native
//! payload tree and one scan of the compiled document tree, with all
//! recovered assets materialized under the output directory:
//!
//! ```text
//! out/
//!   audio/             relocated audio payloads
//!   spine/<name>/      atlas text, skeleton JSON, resolved texture
//!   sprite_atlases/    one folder per texture reference: plist + texture
//!   animations/        explicit clips + index.json
//!   animations_auto/   inferred clips + index.json (with provenance note)
//! ```
//!
//! Per-item failures (bad documents, unresolvable references, failed
//! fetches) are absorbed so the batch always runs to completion; only I/O
//! failures on the output side propagate.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{ensure, Context, Result};
use colored::Colorize;
use serde_json::Value;
use walkdir::WalkDir;

use cocorestore_doc::{
    extract_clips, extract_skeleton_bundles, extract_sprite_frames, guess_texture_reference,
    has_clip_marker, infer_clips, safe_slug, AnimationClip, AtlasGroupSet, IdentifierTable,
    SkeletonBundle,
};
use cocorestore_media::native::placeholder_texture_name;
use cocorestore_media::{stub, Fetch, NativeIndex};

use crate::output::{ensure_dir, unique_path, write_index, write_json_pretty, CategoryIndex, IndexEntry};

const AUDIO_EXTENSIONS: [&str; 4] = ["mp3", "ogg", "wav", "m4a"];
const IMAGE_EXTENSIONS: [&str; 4] = ["png", "webp", "jpg", "jpeg"];

const INFERRED_INDEX_NOTE: &str =
    "Clips inferred from numeric frame-name suffixes in atlas frames; ordering and timing are best-effort guesses.";

/// Pipeline inputs.
pub struct RestoreOptions {
    /// Asset root containing the `import` and `native` subtrees.
    pub assets_root: PathBuf,
    /// Destination root, created if absent.
    pub out_dir: PathBuf,
}

/// What one run produced.
pub struct RestoreSummary {
    pub audio_files: usize,
    pub skeleton_bundles: usize,
    pub atlas_groups: usize,
    pub authored_clips: usize,
    pub inferred_clips: usize,
    pub spine_dir: PathBuf,
    pub atlas_dir: PathBuf,
    pub audio_dir: PathBuf,
}

/// Run the whole restore pipeline.
pub fn run(opts: &RestoreOptions, fetch: &dyn Fetch) -> Result<RestoreSummary> {
    let import_root = opts.assets_root.join("import");
    let native_root = opts.assets_root.join("native");
    ensure!(
        import_root.is_dir() && native_root.is_dir(),
        "asset root must contain 'import' and 'native' subdirectories: {}",
        opts.assets_root.display()
    );

    ensure_dir(&opts.out_dir)?;
    let audio_dir = opts.out_dir.join("audio");
    let spine_dir = opts.out_dir.join("spine");
    let atlas_dir = opts.out_dir.join("sprite_atlases");
    let anim_dir = opts.out_dir.join("animations");
    let auto_dir = opts.out_dir.join("animations_auto");

    println!("{} Relocating audio...", "[1/4]".cyan().bold());
    let audio_entries = relocate_audio(&native_root, &audio_dir)?;
    println!("  {} audio files -> {}", audio_entries.len(), audio_dir.display());

    println!(
        "{} Restoring skeleton bundles and collecting sprite frames...",
        "[2/4]".cyan().bold()
    );
    let index = NativeIndex::scan(&native_root)?;
    let scan = scan_documents(&import_root, &index, fetch, &spine_dir, &anim_dir)?;
    println!(
        "  {} skeleton bundles, {} explicit clips, {} atlas groups",
        scan.skeleton_bundles,
        scan.clip_entries.len(),
        scan.groups.len()
    );

    println!("{} Emitting atlas descriptors...", "[3/4]".cyan().bold());
    emit_atlases(&scan.groups, &index, fetch, &atlas_dir)?;

    println!("{} Inferring frame sequences...", "[4/4]".cyan().bold());
    let inferred = emit_inferred_clips(&scan.groups, &scan.consumed_frames, &auto_dir)?;
    println!("  {} inferred clips -> {}", inferred, auto_dir.display());

    println!("{}", "Restore complete:".green().bold());
    println!(" - skeleton bundles: {}", spine_dir.display());
    println!(" - sprite atlases:   {}", atlas_dir.display());
    println!(" - audio:            {}", audio_dir.display());

    Ok(RestoreSummary {
        audio_files: audio_entries.len(),
        skeleton_bundles: scan.skeleton_bundles,
        atlas_groups: scan.groups.len(),
        authored_clips: scan.clip_entries.len(),
        inferred_clips: inferred,
        spine_dir,
        atlas_dir,
        audio_dir,
    })
}

/// Copy audio payloads out of the native tree under collision-safe names.
fn relocate_audio(native_root: &Path, audio_dir: &Path) -> Result<Vec<IndexEntry>> {
    ensure_dir(audio_dir)?;
    let mut entries = Vec::new();
    for entry in WalkDir::new(native_root)
        .sort_by_file_name()
        .into_iter()
        .filter_map(Result::ok)
    {
        let path = entry.path();
        if !entry.file_type().is_file() || !has_any_extension(path, &AUDIO_EXTENSIONS) {
            continue;
        }
        let stem = safe_slug(&path.file_stem().unwrap_or_default().to_string_lossy());
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        let target = unique_path(audio_dir, &stem, &format!(".{}", ext));
        fs::copy(path, &target)
            .with_context(|| format!("failed to copy audio payload {}", path.display()))?;
        entries.push(IndexEntry {
            name: stem,
            path: target.display().to_string(),
        });
    }
    Ok(entries)
}

struct DocumentScan {
    groups: AtlasGroupSet,
    clip_entries: Vec<IndexEntry>,
    consumed_frames: HashSet<String>,
    skeleton_bundles: usize,
}

/// Single pass over the compiled document tree: skeleton bundles and
/// explicit clips are materialized as encountered, sprite frames accumulate
/// into atlas groups for the later passes.
fn scan_documents(
    import_root: &Path,
    index: &NativeIndex,
    fetch: &dyn Fetch,
    spine_dir: &Path,
    anim_dir: &Path,
) -> Result<DocumentScan> {
    ensure_dir(anim_dir)?;
    let mut scan = DocumentScan {
        groups: AtlasGroupSet::default(),
        clip_entries: Vec::new(),
        consumed_frames: HashSet::new(),
        skeleton_bundles: 0,
    };

    for entry in WalkDir::new(import_root)
        .sort_by_file_name()
        .into_iter()
        .filter_map(Result::ok)
    {
        let path = entry.path();
        if !entry.file_type().is_file() || !has_any_extension(path, &["json"]) {
            continue;
        }
        // Untrusted input: unreadable or unparseable documents are skipped.
        let Ok(text) = fs::read_to_string(path) else {
            continue;
        };
        let Ok(doc) = serde_json::from_str::<Value>(&text) else {
            continue;
        };
        let table = IdentifierTable::from_document(&doc);
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let file_stem = path
            .file_stem()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        for bundle in extract_skeleton_bundles(&doc) {
            restore_skeleton_bundle(&bundle, &table, index, fetch, spine_dir)?;
            scan.skeleton_bundles += 1;
        }

        if has_clip_marker(&text) {
            for clip in extract_clips(&doc, &table) {
                note_consumed_frames(&clip, &mut scan.consumed_frames);
                let display_name = if clip.name.is_empty() {
                    file_stem.clone()
                } else {
                    clip.name.clone()
                };
                let target = unique_path(anim_dir, &safe_slug(&display_name), ".anim.json");
                write_json_pretty(&target, &clip)?;
                scan.clip_entries.push(IndexEntry {
                    name: display_name,
                    path: target.display().to_string(),
                });
            }
        }

        if let Some(reference) = guess_texture_reference(&doc) {
            let frames = extract_sprite_frames(&doc);
            scan.groups.merge(reference, &file_name, frames);
        }
    }

    write_index(
        anim_dir,
        &CategoryIndex {
            clips: scan.clip_entries.clone(),
            note: None,
        },
    )?;
    Ok(scan)
}

/// Record the frame identifiers an authored clip references, so the
/// inference pass does not re-synthesize timelines for them.
fn note_consumed_frames(clip: &AnimationClip, consumed: &mut HashSet<String>) {
    for track in &clip.tracks {
        for keyframe in &track.frames {
            if let Some(frame) = &keyframe.frame {
                consumed.insert(frame.clone());
            }
        }
    }
}

/// Materialize one skeleton bundle: atlas text, skeleton document, and the
/// best texture candidate the native index can offer.
fn restore_skeleton_bundle(
    bundle: &SkeletonBundle,
    table: &IdentifierTable,
    index: &NativeIndex,
    fetch: &dyn Fetch,
    spine_dir: &Path,
) -> Result<()> {
    let slug = if bundle.name.is_empty() {
        "spine".to_owned()
    } else {
        safe_slug(&bundle.name)
    };
    let dir = spine_dir.join(&slug);
    ensure_dir(&dir)?;
    fs::write(dir.join(format!("{}.atlas", slug)), &bundle.atlas_text)
        .with_context(|| format!("failed to write atlas text for {}", slug))?;
    write_json_pretty(&dir.join(format!("{}.json", slug)), &bundle.skeleton)?;

    if table.is_empty() {
        return Ok(());
    }
    let hint = bundle.texture_indices.first().copied().unwrap_or(0);
    let Some(reference) = table.get(hint).or_else(|| table.first()) else {
        return Ok(());
    };
    let Some(source) = index.resolve_skeleton_texture(reference, &bundle.atlas_text) else {
        return Ok(());
    };
    // Keep the hinted name, but take the extension from the actual payload
    // so content and extension stay in agreement.
    let ext = source
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy().to_lowercase()))
        .unwrap_or_default();
    let file_name = match bundle.texture_names.first() {
        Some(hinted) => {
            let stem = Path::new(hinted)
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| hinted.clone());
            format!("{}{}", stem, ext)
        }
        None => format!("texture{}", ext),
    };
    // Failures here were already the best effort available; the bundle
    // remains useful without its texture.
    let _ = stub::materialize(source, &dir.join(file_name), fetch);
    Ok(())
}

/// Emit one atlas folder per group: the plist descriptor plus the resolved
/// texture, clearing stale texture files from previous runs first.
fn emit_atlases(
    groups: &AtlasGroupSet,
    index: &NativeIndex,
    fetch: &dyn Fetch,
    atlas_dir: &Path,
) -> Result<()> {
    ensure_dir(atlas_dir)?;
    for (reference, group) in groups.iter() {
        let texture = index.choose_atlas_texture(reference);
        let texture_file_name = texture
            .and_then(Path::file_name)
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| placeholder_texture_name(reference));

        let prefix = reference.get(..2).unwrap_or(reference).to_ascii_lowercase();
        let dir = atlas_dir.join(format!(
            "{}_{}",
            prefix,
            safe_slug(reference.get(..6).unwrap_or(reference))
        ));
        ensure_dir(&dir)?;

        let plist_name = format!("atlas_{}.plist", safe_slug(reference.get(..8).unwrap_or(reference)));
        fs::write(dir.join(&plist_name), group.to_plist(&texture_file_name))
            .with_context(|| format!("failed to write atlas descriptor for {}", reference))?;

        // Delete-then-write, not atomic: stale textures from earlier runs
        // would otherwise accumulate as unusable placeholders.
        remove_stale_textures(&dir, &texture_file_name);
        if let Some(source) = texture {
            let _ = stub::materialize(source, &dir.join(&texture_file_name), fetch);
        }
    }
    Ok(())
}

fn remove_stale_textures(dir: &Path, keep: &str) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    for entry in entries.filter_map(Result::ok) {
        let path = entry.path();
        let name = entry.file_name().to_string_lossy().into_owned();
        if has_any_extension(&path, &IMAGE_EXTENSIONS) && name != keep {
            let _ = fs::remove_file(&path);
        }
    }
}

/// Infer sequence clips from frame names no explicit clip accounted for.
fn emit_inferred_clips(
    groups: &AtlasGroupSet,
    consumed: &HashSet<String>,
    auto_dir: &Path,
) -> Result<usize> {
    ensure_dir(auto_dir)?;
    let mut entries = Vec::new();
    for (reference, group) in groups.iter() {
        let names = group
            .frames()
            .keys()
            .map(String::as_str)
            .filter(|name| !consumed.contains(*name));
        for mut clip in infer_clips(names) {
            clip.source_atlas = Some(reference.to_owned());
            let target = unique_path(auto_dir, &safe_slug(&clip.name), ".anim.guessed.json");
            write_json_pretty(&target, &clip)?;
            entries.push(IndexEntry {
                name: clip.name.clone(),
                path: target.display().to_string(),
            });
        }
    }
    let count = entries.len();
    write_index(
        auto_dir,
        &CategoryIndex {
            clips: entries,
            note: Some(INFERRED_INDEX_NOTE.to_owned()),
        },
    )?;
    Ok(count)
}

fn has_any_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .map(|e| {
            let ext = e.to_string_lossy();
            extensions.iter().any(|want| ext.eq_ignore_ascii_case(want))
        })
        .unwrap_or(false)
}
