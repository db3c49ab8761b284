//! Implied-sequence inference from frame naming conventions.
//!
//! Artists almost universally name sequence frames `base_01`, `base_02`, …
//! When an atlas carries such a series but no explicit clip references it,
//! the timeline can be reconstructed from the names alone. The guards here
//! (at least three members, and at least three strictly consecutive suffix
//! values somewhere in the group) keep coincidental base/suffix collisions
//! across unrelated frames from producing junk clips.

use std::collections::BTreeMap;

use regex::Regex;

use crate::clips::{AnimationClip, ClipSource, Keyframe, Track, TrackKind};

/// Sample rate assigned to inferred clips, in frames per second.
pub const INFERRED_SAMPLE_RATE: f64 = 24.0;

const MIN_GROUP_SIZE: usize = 3;
const MIN_CONSECUTIVE_RUN: usize = 3;

/// Infer animation clips from a set of frame names.
///
/// Each surviving base name yields one clip tagged [`ClipSource::Guessed`],
/// with one keyframe per member in ascending suffix order and
/// `duration = member_count / 24`. Output order is deterministic (sorted by
/// base name).
pub fn infer_clips<'a, I>(names: I) -> Vec<AnimationClip>
where
    I: IntoIterator<Item = &'a str>,
{
    let series = Regex::new(r"^(.*?)[_\-\s]?(\d{1,4})$").expect("valid regex");

    let mut groups: BTreeMap<String, Vec<(u32, String)>> = BTreeMap::new();
    for name in names {
        if let Some((base, index)) = split_name_series(&series, name) {
            groups.entry(base).or_default().push((index, name.to_owned()));
        }
    }

    let mut clips = Vec::new();
    for (base, mut members) in groups {
        members.sort_by_key(|(index, _)| *index);
        if members.len() < MIN_GROUP_SIZE {
            continue;
        }
        if longest_consecutive_run(&members) < MIN_CONSECUTIVE_RUN {
            continue;
        }
        let frames = members
            .iter()
            .enumerate()
            .map(|(i, (_, name))| Keyframe {
                time: Some(i as f64 / INFERRED_SAMPLE_RATE),
                frame: Some(name.clone()),
                frame_index: None,
            })
            .collect();
        clips.push(AnimationClip {
            name: base,
            duration: members.len() as f64 / INFERRED_SAMPLE_RATE,
            sample: Some(INFERRED_SAMPLE_RATE),
            tracks: vec![Track {
                kind: TrackKind::SpriteFrame,
                frames,
            }],
            source: ClipSource::Guessed,
            source_atlas: None,
        });
    }
    clips
}

/// Split a frame name into base text and numeric suffix.
///
/// The suffix is 1-4 trailing digits, optionally preceded by a single
/// `_`/`-`/space separator. Trailing separator punctuation on the base is
/// trimmed; a name that is all suffix has no base and is discarded.
fn split_name_series(series: &Regex, name: &str) -> Option<(String, u32)> {
    let caps = series.captures(name)?;
    let base = caps
        .get(1)
        .map(|m| m.as_str())
        .unwrap_or("")
        .trim()
        .trim_end_matches(['_', '-', '.', ' ']);
    if base.is_empty() {
        return None;
    }
    let index = caps.get(2)?.as_str().parse::<u32>().ok()?;
    Some((base.to_owned(), index))
}

/// Length of the longest strictly consecutive run of suffix values in an
/// ascending-sorted member list.
fn longest_consecutive_run(members: &[(u32, String)]) -> usize {
    let mut best = 1usize;
    let mut run = 1usize;
    for window in members.windows(2) {
        if window[1].0 == window[0].0 + 1 {
            run += 1;
            best = best.max(run);
        } else {
            run = 1;
        }
    }
    best
}
