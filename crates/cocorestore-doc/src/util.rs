//! Small shared helpers.

use regex::Regex;

/// Sanitize a recovered name for use as a file or directory name.
///
/// Every character outside `[A-Za-z0-9._-]` becomes `_`.
pub fn safe_slug(raw: &str) -> String {
    let unsafe_chars = Regex::new(r"[^a-zA-Z0-9._-]").expect("valid regex");
    unsafe_chars.replace_all(raw, "_").into_owned()
}
