//! Unified diffs between a C++ source and its translation.

use similar::TextDiff;

/// Line diff from `original` (labelled `from`) to `translated` (labelled
/// `to`) with three lines of context. Identical inputs give an empty string.
pub fn unified_diff(original: &str, translated: &str, from: &str, to: &str) -> String {
    let diff = TextDiff::from_lines(original, translated);
    diff.unified_diff().context_radius(3).header(from, to).to_string()
}
