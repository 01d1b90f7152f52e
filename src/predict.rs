use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;

use crate::store::ShowRecord;

/// How many previous shows feed the "recently played" feature.
pub const RECENT_WINDOW: usize = 3;

/// Fitted categorical encoder: trimmed location string -> dense index, in
/// encounter order. Locations unseen at inference time get a dedicated
/// out-of-vocabulary bucket past the end (`oov_index`).
#[derive(Debug, Default)]
pub struct LocationEncoder {
    index: HashMap<String, usize>,
    classes: Vec<String>,
}

impl LocationEncoder {
    pub fn fit<'a>(locations: impl IntoIterator<Item = &'a str>) -> Self {
        let mut enc = Self::default();
        for loc in locations {
            let key = loc.trim();
            if !enc.index.contains_key(key) {
                enc.index.insert(key.to_string(), enc.classes.len());
                enc.classes.push(key.to_string());
            }
        }
        enc
    }

    /// Index for a known location, or `None` for out-of-vocabulary.
    pub fn encode(&self, location: &str) -> Option<usize> {
        self.index.get(location.trim()).copied()
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// The bucket unknown locations fall into.
    pub fn oov_index(&self) -> usize {
        self.classes.len()
    }
}

/// Days-since-previous-show, coarsened into the buckets the classifier
/// actually conditions on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GapBucket {
    /// Back-to-back nights or a short run (0-3 days).
    Run,
    /// Same tour leg (4-14 days).
    Tour,
    /// A longer break.
    Break,
    /// One of the two dates didn't parse.
    Unknown,
}

const GAP_BUCKETS: usize = 4;

impl GapBucket {
    fn from_days(days: Option<i64>) -> Self {
        match days {
            Some(d) if d <= 3 => Self::Run,
            Some(d) if d <= 14 => Self::Tour,
            Some(_) => Self::Break,
            None => Self::Unknown,
        }
    }

    fn index(self) -> usize {
        match self {
            Self::Run => 0,
            Self::Tour => 1,
            Self::Break => 2,
            Self::Unknown => 3,
        }
    }
}

/// One training row: a (show, vocabulary-song) pair. Built transiently
/// during training, never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlattenedAppearance {
    pub date: Option<NaiveDate>,
    /// Encoded location index.
    pub location: usize,
    /// Days since the previous show, when both dates parse.
    pub days_since_previous: Option<i64>,
    /// Vocabulary index of the song this row is about.
    pub song: usize,
    /// Song appeared in one of the `RECENT_WINDOW` shows before this one.
    pub recently_played: bool,
    /// Song appears in this show's setlist.
    pub played: bool,
}

/// The flattened training set: one row per (show x vocabulary-song) pair.
pub struct TrainingSet {
    pub encoder: LocationEncoder,
    /// All songs ever played, in encounter order.
    pub vocabulary: Vec<String>,
    pub rows: Vec<FlattenedAppearance>,
}

impl TrainingSet {
    pub fn build(records: &[ShowRecord]) -> Self {
        let encoder = LocationEncoder::fit(records.iter().map(|s| s.location.as_str()));

        let mut vocab_index: HashMap<String, usize> = HashMap::new();
        let mut vocabulary: Vec<String> = Vec::new();
        for show in records {
            for song in &show.setlist {
                let title = song.trim();
                if !vocab_index.contains_key(title) {
                    vocab_index.insert(title.to_string(), vocabulary.len());
                    vocabulary.push(title.to_string());
                }
            }
        }

        // Chronological order for the recency window. Shows whose dates
        // don't parse sort as oldest, keeping their archive order.
        let order = chronological_order(records);

        let mut rows = Vec::with_capacity(order.len() * vocabulary.len());
        let mut window: Vec<HashSet<usize>> = Vec::new();
        let mut previous_date: Option<NaiveDate> = None;

        for &i in &order {
            let show = &records[i];
            let date = show.parsed_date();
            let days_since_previous = match (previous_date, date) {
                (Some(prev), Some(cur)) => Some((cur - prev).num_days()),
                _ => None,
            };

            let location = encoder
                .encode(&show.location)
                .unwrap_or_else(|| encoder.oov_index());

            let played: HashSet<usize> = show
                .setlist
                .iter()
                .filter_map(|s| vocab_index.get(s.trim()).copied())
                .collect();

            let recent: HashSet<usize> = window.iter().flatten().copied().collect();

            for song in 0..vocabulary.len() {
                rows.push(FlattenedAppearance {
                    date,
                    location,
                    days_since_previous,
                    song,
                    recently_played: recent.contains(&song),
                    played: played.contains(&song),
                });
            }

            window.push(played);
            if window.len() > RECENT_WINDOW {
                window.remove(0);
            }
            if date.is_some() {
                previous_date = date;
            }
        }

        Self { encoder, vocabulary, rows }
    }
}

/// Indices of `records` sorted by parsed date ascending. Unparseable dates
/// sort first (stable, so they keep archive order among themselves).
fn chronological_order(records: &[ShowRecord]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..records.len()).collect();
    order.sort_by_key(|&i| records[i].parsed_date().unwrap_or(NaiveDate::MIN));
    order
}

/// Per-song feature tallies split by class, the fitted half of the
/// per-song naive-Bayes classifier.
#[derive(Debug, Clone, Default)]
struct SongStats {
    played: usize,
    not_played: usize,
    loc_played: HashMap<usize, usize>,
    loc_not_played: HashMap<usize, usize>,
    recent_played: usize,
    recent_not_played: usize,
    gap_played: [usize; GAP_BUCKETS],
    gap_not_played: [usize; GAP_BUCKETS],
}

impl SongStats {
    fn observe(&mut self, row: &FlattenedAppearance) {
        let gap = GapBucket::from_days(row.days_since_previous).index();
        if row.played {
            self.played += 1;
            *self.loc_played.entry(row.location).or_insert(0) += 1;
            if row.recently_played {
                self.recent_played += 1;
            }
            self.gap_played[gap] += 1;
        } else {
            self.not_played += 1;
            *self.loc_not_played.entry(row.location).or_insert(0) += 1;
            if row.recently_played {
                self.recent_not_played += 1;
            }
            self.gap_not_played[gap] += 1;
        }
    }

    /// Log-likelihood of the feature triple under one class, with Laplace
    /// smoothing. Class priors are held equal ("played" is rare for any
    /// given song, so the natural priors would drown the features).
    fn log_likelihood(
        &self,
        played: bool,
        location: usize,
        recently_played: bool,
        gap: GapBucket,
        location_buckets: usize,
    ) -> f64 {
        let (total, locs, recent, gaps) = if played {
            (self.played, &self.loc_played, self.recent_played, &self.gap_played)
        } else {
            (self.not_played, &self.loc_not_played, self.recent_not_played, &self.gap_not_played)
        };
        let n = total as f64;

        let loc_count = locs.get(&location).copied().unwrap_or(0) as f64;
        let p_loc = (loc_count + 1.0) / (n + location_buckets as f64);

        let recent_count = if recently_played { recent } else { total - recent };
        let p_recent = (recent_count as f64 + 1.0) / (n + 2.0);

        let gap_count = gaps[gap.index()] as f64;
        let p_gap = (gap_count + 1.0) / (n + GAP_BUCKETS as f64);

        p_loc.ln() + p_recent.ln() + p_gap.ln()
    }
}

/// A fitted model: the location encoder, the song vocabulary, and one
/// balanced binary classifier per vocabulary song (one-vs-rest).
///
/// Held as an explicit value and passed to inference calls; nothing here
/// is global state.
pub struct TrainedModel {
    encoder: LocationEncoder,
    vocabulary: Vec<String>,
    stats: Vec<SongStats>,
    /// Vocabulary indices of songs played in the last `RECENT_WINDOW` shows.
    recent: HashSet<usize>,
    last_show_date: Option<NaiveDate>,
}

impl TrainedModel {
    /// Train on the full archive. The archive is treated as an immutable
    /// snapshot; there is no incremental update path.
    pub fn train(records: &[ShowRecord]) -> Self {
        let training = TrainingSet::build(records);

        let mut stats = vec![SongStats::default(); training.vocabulary.len()];
        for row in &training.rows {
            stats[row.song].observe(row);
        }

        // Recency state for inference: songs from the last RECENT_WINDOW
        // shows, and the most recent parsed show date.
        let order = chronological_order(records);
        let mut recent: HashSet<usize> = HashSet::new();
        let vocab_index: HashMap<&str, usize> = training
            .vocabulary
            .iter()
            .enumerate()
            .map(|(i, s)| (s.as_str(), i))
            .collect();
        for &i in order.iter().rev().take(RECENT_WINDOW) {
            for song in &records[i].setlist {
                if let Some(&idx) = vocab_index.get(song.trim()) {
                    recent.insert(idx);
                }
            }
        }
        let last_show_date = order
            .iter()
            .rev()
            .find_map(|&i| records[i].parsed_date());

        log::info!(
            "Trained on {} shows: {} songs, {} locations, {} rows",
            records.len(),
            training.vocabulary.len(),
            training.encoder.len(),
            training.rows.len(),
        );

        Self {
            encoder: training.encoder,
            vocabulary: training.vocabulary,
            stats,
            recent,
            last_show_date,
        }
    }

    pub fn vocabulary(&self) -> &[String] {
        &self.vocabulary
    }

    /// Predicted play-probability for every vocabulary song at the given
    /// location and date, in vocabulary order.
    pub fn song_probabilities(&self, location: &str, date: Option<NaiveDate>) -> Vec<f64> {
        let loc = match self.encoder.encode(location) {
            Some(i) => i,
            None => {
                log::warn!(
                    "Location '{}' not seen in training data, using out-of-vocabulary bucket",
                    location.trim()
                );
                self.encoder.oov_index()
            }
        };

        let days = match (self.last_show_date, date) {
            (Some(last), Some(next)) => Some((next - last).num_days()),
            _ => None,
        };
        let gap = GapBucket::from_days(days);

        // +1 for the OOV bucket
        let location_buckets = self.encoder.len() + 1;

        self.stats
            .iter()
            .enumerate()
            .map(|(song, stats)| {
                let recently = self.recent.contains(&song);
                let s1 = stats.log_likelihood(true, loc, recently, gap, location_buckets);
                let s0 = stats.log_likelihood(false, loc, recently, gap, location_buckets);
                1.0 / (1.0 + (s0 - s1).exp())
            })
            .collect()
    }

    /// Rank the vocabulary by predicted play-probability and return the
    /// `top_k` most likely songs. Ties keep vocabulary encounter order
    /// (stable sort). Unknown locations warn and fall back to the
    /// out-of-vocabulary bucket; never fatal.
    pub fn predict_next_setlist(
        &self,
        location: &str,
        date: Option<NaiveDate>,
        top_k: usize,
    ) -> Vec<String> {
        let probabilities = self.song_probabilities(location, date);

        let mut ranked: Vec<(usize, f64)> = probabilities.into_iter().enumerate().collect();
        ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        ranked.truncate(top_k);

        ranked
            .into_iter()
            .map(|(song, _)| self.vocabulary[song].clone())
            .collect()
    }
}
