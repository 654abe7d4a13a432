//! Assembly of the link list from command-line values or a links file.

use std::collections::HashSet;
use std::path::Path;

use tracing::debug;

/// Removes duplicate links, keeping the first occurrence of each.
///
/// Links are compared after trimming surrounding whitespace; empty entries
/// are dropped.
#[must_use]
pub fn dedupe_links<I, S>(links: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    links
        .into_iter()
        .filter_map(|link| {
            let trimmed = link.as_ref().trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        })
        .filter(|link| seen.insert(link.clone()))
        .collect()
}

/// Parses newline-delimited links, ignoring blank lines and `#` comments.
#[must_use]
pub fn parse_links(text: &str) -> Vec<String> {
    dedupe_links(
        text.lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#')),
    )
}

/// Reads a links file (one URL per line).
///
/// # Errors
///
/// Returns the IO error if the file can't be read as UTF-8 text.
pub fn read_links_file(path: &Path) -> std::io::Result<Vec<String>> {
    let text = std::fs::read_to_string(path)?;
    let links = parse_links(&text);
    debug!(path = %path.display(), count = links.len(), "read links file");
    Ok(links)
}
