//! Identifier list input: one beatmap-set ID per line.
//!
//! The list file is produced by the score-server export stage. This module
//! only normalizes it: whitespace is trimmed, blank lines are skipped, and
//! duplicates are collapsed preserving first-seen order.

use std::collections::HashSet;
use std::io;
use std::path::Path;

/// Reads an identifier list file.
///
/// # Errors
///
/// Returns the underlying IO error when the file cannot be read.
pub async fn read_id_file(path: &Path) -> Result<Vec<String>, io::Error> {
    let text = tokio::fs::read_to_string(path).await?;
    Ok(parse_id_list(&text))
}

/// Parses identifier-list text: trims lines, skips blanks, dedups
/// preserving first-seen order.
#[must_use]
pub fn parse_id_list(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter(|line| seen.insert((*line).to_string()))
        .map(std::string::ToString::to_string)
        .collect()
}
