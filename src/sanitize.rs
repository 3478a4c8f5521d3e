//! Deterministic record-to-filename mapping.

use std::path::{Path, PathBuf};

/// Characters stripped from titles: unsafe in filesystem entries or
/// awkward in shell contexts.
const BAD_CHARS: [char; 11] = [';', ':', '!', '*', '/', '\\', ' ', ',', '?', '>', '<'];

/// Exported file name for a record: `{id}-{cleanedTitle}`.
/// Pure and total; an empty title yields `{id}-`. The embedded id keeps
/// names unique even when two records share a title.
pub fn sanitize_file_name(title: &str, id: &str) -> String {
    let clean: String = title.chars().filter(|c| !BAD_CHARS.contains(c)).collect();
    format!("{}-{}", id, clean)
}

/// Full path of the exported file inside `output_dir`.
pub fn sanitized_path(output_dir: &Path, title: &str, id: &str) -> PathBuf {
    output_dir.join(sanitize_file_name(title, id))
}
