use std::fs;
use std::io;
use std::path::Path;

use crate::covers::CoverSet;
use crate::stats;
use crate::store::ShowRecord;

/// One flattened row: a single song appearance at a single show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SongRow {
    pub date: String,
    pub location: String,
    pub song: String,
    /// "Cover" or "Original", from the cover list.
    pub song_type: &'static str,
    /// Total appearances of this song across the whole archive.
    pub times_played: usize,
}

/// Flatten the archive into one row per song appearance, most-played songs
/// first (stable, so appearance order is kept within a song).
pub fn song_rows(records: &[ShowRecord], covers: &CoverSet) -> Vec<SongRow> {
    let frequency = stats::song_frequency(records);

    let mut rows: Vec<SongRow> = Vec::new();
    for show in records {
        for song in &show.setlist {
            rows.push(SongRow {
                date: show.date.clone(),
                location: show.location.clone(),
                song: song.clone(),
                song_type: if covers.contains(song) { "Cover" } else { "Original" },
                times_played: frequency.get(song),
            });
        }
    }

    rows.sort_by(|a, b| b.times_played.cmp(&a.times_played));
    rows
}

/// Write rows as CSV with a header line.
pub fn write_csv(rows: &[SongRow], path: &Path) -> io::Result<()> {
    fs::write(path, render_csv(rows))?;
    log::info!("Wrote {} rows to {}", rows.len(), path.display());
    Ok(())
}

pub fn render_csv(rows: &[SongRow]) -> String {
    let mut out = String::from("date,location,song,song_type,times_played\n");
    for row in rows {
        out.push_str(&csv_field(&row.date));
        out.push(',');
        out.push_str(&csv_field(&row.location));
        out.push(',');
        out.push_str(&csv_field(&row.song));
        out.push(',');
        out.push_str(row.song_type);
        out.push(',');
        out.push_str(&row.times_played.to_string());
        out.push('\n');
    }
    out
}

/// Quote a field when it needs it; double any embedded quotes.
fn csv_field(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}
