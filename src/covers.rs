use std::collections::HashSet;
use std::io;
use std::path::Path;

/// Known cover songs, loaded from a plain text list.
///
/// This is an external classification table, not owned by any show.
/// Membership is tested on the lowercased, whitespace-trimmed title.
#[derive(Debug, Default)]
pub struct CoverSet {
    normalized: HashSet<String>,
}

impl CoverSet {
    /// Load from a text file with one song title per line.
    /// Blank lines are skipped.
    pub fn load(path: &Path) -> io::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let set = Self::from_lines(contents.lines());
        log::info!("Loaded {} cover songs from {}", set.len(), path.display());
        Ok(set)
    }

    pub fn from_lines<'a>(lines: impl IntoIterator<Item = &'a str>) -> Self {
        let normalized = lines
            .into_iter()
            .map(normalize_title)
            .filter(|t| !t.is_empty())
            .collect();
        Self { normalized }
    }

    /// Case-insensitive, whitespace-trimmed membership test.
    pub fn contains(&self, title: &str) -> bool {
        self.normalized.contains(&normalize_title(title))
    }

    pub fn len(&self) -> usize {
        self.normalized.len()
    }

    pub fn is_empty(&self) -> bool {
        self.normalized.is_empty()
    }
}

/// The comparison key used for cover matching: lowercased and trimmed.
pub fn normalize_title(title: &str) -> String {
    title.trim().to_lowercase()
}
