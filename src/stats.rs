use std::collections::HashMap;

use crate::covers::{self, CoverSet};
use crate::store::ShowRecord;

/// A counter that remembers first-seen order, so ranking ties break by
/// encounter order instead of hash order.
#[derive(Debug, Default, Clone)]
pub struct Counter {
    index: HashMap<String, usize>,
    entries: Vec<(String, usize)>,
}

impl Counter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one occurrence. The first-seen spelling becomes the stored key.
    pub fn add(&mut self, key: &str) {
        match self.index.get(key) {
            Some(&i) => self.entries[i].1 += 1,
            None => {
                self.index.insert(key.to_string(), self.entries.len());
                self.entries.push((key.to_string(), 1));
            }
        }
    }

    pub fn get(&self, key: &str) -> usize {
        self.index.get(key).map(|&i| self.entries[i].1).unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// The `n` highest counts. Stable sort, so ties keep encounter order.
    pub fn top_n(&self, n: usize) -> Vec<(String, usize)> {
        let mut sorted = self.entries.clone();
        sorted.sort_by(|a, b| b.1.cmp(&a.1));
        sorted.truncate(n);
        sorted
    }

    /// The `n` lowest counts. Stable sort, so ties keep encounter order.
    pub fn bottom_n(&self, n: usize) -> Vec<(String, usize)> {
        let mut sorted = self.entries.clone();
        sorted.sort_by(|a, b| a.1.cmp(&b.1));
        sorted.truncate(n);
        sorted
    }
}

/// Which end of the setlist to count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    First,
    Last,
}

/// Count every appearance of every song across all setlists.
/// A song played twice in one show counts twice.
pub fn song_frequency(records: &[ShowRecord]) -> Counter {
    let mut counts = Counter::new();
    for show in records {
        for song in &show.setlist {
            counts.add(song);
        }
    }
    counts
}

/// Count openers (`Position::First`) or closers (`Position::Last`), one per
/// show. Shows with empty setlists are skipped.
pub fn boundary_songs(records: &[ShowRecord], position: Position) -> Counter {
    let mut counts = Counter::new();
    for show in records {
        let song = match position {
            Position::First => show.setlist.first(),
            Position::Last => show.setlist.last(),
        };
        if let Some(song) = song {
            counts.add(song);
        }
    }
    counts
}

/// Restrict `song_frequency` to songs on the cover list.
///
/// Matching is case-insensitive and whitespace-trimmed. The stored key is
/// the (trimmed) casing of the first occurrence encountered, so "DISCO" and
/// "disco " count under one key.
pub fn cover_matches(records: &[ShowRecord], covers: &CoverSet) -> Counter {
    let mut counts = Counter::new();
    let mut canonical: HashMap<String, String> = HashMap::new();

    for show in records {
        for song in &show.setlist {
            if !covers.contains(song) {
                continue;
            }
            let key = canonical
                .entry(covers::normalize_title(song))
                .or_insert_with(|| song.trim().to_string());
            counts.add(key);
        }
    }

    counts
}

/// Number of shows per location string. Locations are free text and may be
/// formatted inconsistently across sources; no normalization is attempted.
pub fn shows_per_location(records: &[ShowRecord]) -> Counter {
    let mut counts = Counter::new();
    for show in records {
        counts.add(&show.location);
    }
    counts
}

/// Songs-per-show sizes in archive order, for the stats summary.
pub fn songs_per_show(records: &[ShowRecord]) -> Vec<usize> {
    records.iter().map(|s| s.setlist.len()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn show(date: &str, location: &str, songs: &[&str]) -> ShowRecord {
        ShowRecord {
            date: date.to_string(),
            location: location.to_string(),
            setlist: songs.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_frequency_counts_repeats_within_a_show() {
        let n = 4;
        let records: Vec<ShowRecord> = (0..n)
            .map(|i| show(&format!("2024-04-{:02}", i + 1), "Red Rocks", &["A", "A", "B"]))
            .collect();

        let counts = song_frequency(&records);
        assert_eq!(counts.get("A"), 2 * n);
        assert_eq!(counts.get("B"), n);
        assert_eq!(counts.get("C"), 0);
    }

    #[test]
    fn test_boundary_songs_skips_empty_setlists() {
        let records = vec![
            show("2024-04-18", "Red Rocks", &[]),
            show("2024-04-19", "Red Rocks", &["X", "Y"]),
            show("2024-04-20", "Red Rocks", &["Z"]),
        ];

        let openers = boundary_songs(&records, Position::First);
        assert_eq!(openers.get("X"), 1);
        assert_eq!(openers.get("Z"), 1);
        assert_eq!(openers.len(), 2);

        let closers = boundary_songs(&records, Position::Last);
        assert_eq!(closers.get("Y"), 1);
        assert_eq!(closers.get("Z"), 1);
    }

    #[test]
    fn test_single_song_setlist_is_both_opener_and_closer() {
        let records = vec![show("2024-04-20", "Red Rocks", &["Z"])];
        assert_eq!(boundary_songs(&records, Position::First).get("Z"), 1);
        assert_eq!(boundary_songs(&records, Position::Last).get("Z"), 1);
    }

    #[test]
    fn test_cover_matches_normalizes_case_and_whitespace() {
        let covers = CoverSet::from_lines(["Disco"]);
        let records = vec![
            show("2024-04-18", "Red Rocks", &["disco ", "Chilly Water"]),
            show("2024-04-19", "Red Rocks", &["DISCO"]),
            show("2024-04-20", "Red Rocks", &["Disco"]),
        ];

        let counts = cover_matches(&records, &covers);
        assert_eq!(counts.len(), 1);
        // Canonical key is the first spelling encountered, trimmed
        assert_eq!(counts.get("disco"), 3);
    }

    #[test]
    fn test_top_n_ties_keep_encounter_order() {
        let mut counts = Counter::new();
        for _ in 0..5 {
            counts.add("A");
        }
        for _ in 0..5 {
            counts.add("B");
        }
        counts.add("C");

        let top = counts.top_n(2);
        assert_eq!(top, vec![("A".to_string(), 5), ("B".to_string(), 5)]);
    }

    #[test]
    fn test_bottom_n_ties_keep_encounter_order() {
        let mut counts = Counter::new();
        counts.add("A");
        counts.add("B");
        for _ in 0..3 {
            counts.add("C");
        }

        let bottom = counts.bottom_n(2);
        assert_eq!(bottom, vec![("A".to_string(), 1), ("B".to_string(), 1)]);
    }

    #[test]
    fn test_top_n_larger_than_len() {
        let mut counts = Counter::new();
        counts.add("A");
        assert_eq!(counts.top_n(10).len(), 1);
    }

    #[test]
    fn test_songs_per_show() {
        let records = vec![
            show("2024-04-18", "Red Rocks", &["A", "B", "C"]),
            show("2024-04-19", "Red Rocks", &[]),
        ];
        assert_eq!(songs_per_show(&records), vec![3, 0]);
    }

    #[test]
    fn test_shows_per_location() {
        let records = vec![
            show("2024-04-18", "Red Rocks, Morrison, CO, USA", &["A"]),
            show("2024-04-19", "Red Rocks, Morrison, CO, USA", &["B"]),
            show("2024-04-20", "The Fox Theatre, Atlanta, GA, USA", &["C"]),
        ];
        let counts = shows_per_location(&records);
        assert_eq!(counts.get("Red Rocks, Morrison, CO, USA"), 2);
        assert_eq!(counts.get("The Fox Theatre, Atlanta, GA, USA"), 1);
    }
}
