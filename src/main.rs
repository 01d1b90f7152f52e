use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};

use encore::scrape::{self, Source};
use encore::stats::{self, Position};
use encore::store;
use encore::{config, covers, export, predict};

#[derive(Parser)]
#[command(name = "encore", version, about = "Concert setlist scraper and analyzer")]
struct Cli {
    /// Path to the show-archive XML file
    #[arg(long, global = true)]
    archive: Option<PathBuf>,

    /// Verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum SourceArg {
    Setlistfm,
    Bandsite,
}

impl From<SourceArg> for Source {
    fn from(arg: SourceArg) -> Self {
        match arg {
            SourceArg::Setlistfm => Source::SetlistFm,
            SourceArg::Bandsite => Source::BandSite,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Scrape show setlists from a web source into the XML archive
    Scrape {
        /// Which site to scrape
        #[arg(value_enum, default_value = "setlistfm")]
        source: SourceArg,

        /// Listing-page range, e.g. "78-304" or a single page number
        #[arg(long)]
        pages: Option<String>,

        /// Write the archive here instead of the default path
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show song-frequency statistics for the archive
    Stats {
        /// Number of results per table
        #[arg(short = 'n', long, default_value = "20")]
        limit: usize,
    },

    /// Show most and least played cover songs
    Covers {
        /// Path to the cover-song list (one title per line)
        #[arg(long)]
        covers_file: Option<PathBuf>,

        /// Number of results per table
        #[arg(short = 'n', long, default_value = "20")]
        limit: usize,
    },

    /// Predict the next show's setlist for a location
    Predict {
        /// Venue string, e.g. "Township Auditorium, Columbia, SC, USA"
        location: String,

        /// Show date (YYYY-MM-DD); feeds the recency features
        #[arg(short, long)]
        date: Option<String>,

        /// How many songs to predict
        #[arg(short = 'n', long, default_value = "20")]
        limit: usize,
    },

    /// Export the archive as a flat CSV of song appearances
    Export {
        /// Path to the cover-song list (one title per line)
        #[arg(long)]
        covers_file: Option<PathBuf>,

        /// Output CSV path
        #[arg(short, long, default_value = "all_show_data.csv")]
        output: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .init();

    // Load config file (optional, defaults if missing)
    let app_config = config::AppConfig::load();

    // Resolve archive path: CLI > config > XDG default
    let archive_path = cli
        .archive
        .or(app_config.archive_path.clone())
        .unwrap_or_else(config::default_archive_path);
    log::info!("Archive: {}", archive_path.display());

    match cli.command {
        Commands::Scrape { source, pages, output } => {
            let source: Source = source.into();
            let pages = match pages {
                Some(range) => parse_page_range(&range)
                    .with_context(|| format!("Invalid page range '{range}'"))?,
                None => source.default_pages(),
            };

            let result = scrape::scrape(source, pages, app_config.scrape.rate_limit_ms);
            println!();
            println!(
                "Scrape complete: {} pages, {} shows, {} fetch errors, {} skipped",
                result.pages_fetched,
                result.shows_scraped,
                result.fetch_errors,
                result.extract_errors
            );

            if result.records.is_empty() {
                println!("Nothing to save.");
                return Ok(());
            }

            let out_path = output.unwrap_or(archive_path);
            store::save(&result.records, &out_path)
                .with_context(|| format!("Failed to write {}", out_path.display()))?;
            println!("Saved {} shows to {}", result.records.len(), out_path.display());
        }

        Commands::Stats { limit } => {
            let records = load_archive(&archive_path)?;
            let frequency = stats::song_frequency(&records);
            let sizes = stats::songs_per_show(&records);
            let total_played: usize = sizes.iter().sum();
            println!(
                "{} shows, {} distinct songs, {:.1} songs per show",
                records.len(),
                frequency.len(),
                if records.is_empty() { 0.0 } else { total_played as f64 / records.len() as f64 }
            );
            print_count_table("Most played songs", &frequency.top_n(limit), "Plays");
            print_count_table("Least played songs", &frequency.bottom_n(limit), "Plays");

            let openers = stats::boundary_songs(&records, Position::First);
            print_count_table("Top openers", &openers.top_n(limit), "Opened");

            let closers = stats::boundary_songs(&records, Position::Last);
            print_count_table("Top closers", &closers.top_n(limit), "Closed");

            let locations = stats::shows_per_location(&records);
            print_count_table("Shows per location", &locations.top_n(limit), "Shows");
        }

        Commands::Covers { covers_file, limit } => {
            let records = load_archive(&archive_path)?;
            let cover_set = load_covers(covers_file, &app_config)?;

            let matches = stats::cover_matches(&records, &cover_set);
            println!(
                "{} of {} listed covers have been played",
                matches.len(),
                cover_set.len()
            );
            print_count_table("Most played covers", &matches.top_n(limit), "Plays");
            print_count_table("Least played covers", &matches.bottom_n(limit), "Plays");
        }

        Commands::Predict { location, date, limit } => {
            let records = load_archive(&archive_path)?;
            let date = date
                .map(|d| {
                    NaiveDate::parse_from_str(&d, "%Y-%m-%d")
                        .with_context(|| format!("Invalid date '{d}', expected YYYY-MM-DD"))
                })
                .transpose()?;

            let model = predict::TrainedModel::train(&records);
            let predicted = model.predict_next_setlist(&location, date, limit);

            if predicted.is_empty() {
                println!("No training data — archive has no songs.");
                return Ok(());
            }

            println!("Predicted setlist for {}:", location);
            println!();
            for (i, song) in predicted.iter().enumerate() {
                println!("{:>3}. {}", i + 1, song);
            }
        }

        Commands::Export { covers_file, output } => {
            let records = load_archive(&archive_path)?;
            let cover_set = load_covers(covers_file, &app_config)?;

            let rows = export::song_rows(&records, &cover_set);
            export::write_csv(&rows, &output)
                .with_context(|| format!("Failed to write {}", output.display()))?;
            println!("Exported {} song rows to {}", rows.len(), output.display());
        }
    }

    Ok(())
}

fn load_archive(path: &std::path::Path) -> Result<Vec<store::ShowRecord>> {
    let records = store::load(path)
        .with_context(|| format!("Failed to load show archive {}", path.display()))?;
    if records.is_empty() {
        log::warn!("Archive is empty — run `encore scrape` first");
    }
    Ok(records)
}

fn load_covers(
    cli_path: Option<PathBuf>,
    app_config: &config::AppConfig,
) -> Result<covers::CoverSet> {
    let path = cli_path
        .or_else(|| app_config.covers_path.clone())
        .unwrap_or_else(config::default_covers_path);
    covers::CoverSet::load(&path)
        .with_context(|| format!("Failed to load cover list {}", path.display()))
}

/// Parse "A-B" (inclusive) or a single page "N".
fn parse_page_range(range: &str) -> Result<(usize, usize)> {
    let parsed = match range.split_once('-') {
        Some((a, b)) => (a.trim().parse()?, b.trim().parse()?),
        None => {
            let page = range.trim().parse()?;
            (page, page)
        }
    };
    anyhow::ensure!(parsed.0 <= parsed.1, "start page is after end page");
    anyhow::ensure!(parsed.0 >= 1, "pages start at 1");
    Ok(parsed)
}

/// Print a ranked name/count table.
fn print_count_table(title: &str, entries: &[(String, usize)], count_label: &str) {
    if entries.is_empty() {
        return;
    }

    println!();
    println!("{title}:");
    println!("{:<50} {:>8}", "", count_label);
    println!("{}", "-".repeat(59));
    for (name, count) in entries {
        println!("{:<50} {:>8}", truncate_label(name, 50), count);
    }
}

/// Shorten a long name for table display. Counts chars, not bytes, so
/// multibyte venue names ("Théâtre St-Denis, Montréal...") don't split
/// mid-codepoint.
fn truncate_label(name: &str, max_chars: usize) -> String {
    if name.chars().count() > max_chars {
        let head: String = name.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{head}...")
    } else {
        name.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_label_short_names_untouched() {
        assert_eq!(truncate_label("Red Rocks", 50), "Red Rocks");
    }

    #[test]
    fn test_truncate_label_long_ascii() {
        let name = "a".repeat(60);
        let out = truncate_label(&name, 50);
        assert_eq!(out, format!("{}...", "a".repeat(47)));
        assert_eq!(out.chars().count(), 50);
    }

    #[test]
    fn test_truncate_label_multibyte_venue() {
        // 60 chars, 120 bytes — byte slicing would split mid-codepoint
        let name = "é".repeat(60);
        let out = truncate_label(&name, 50);
        assert_eq!(out, format!("{}...", "é".repeat(47)));
        assert_eq!(out.chars().count(), 50);
    }

    #[test]
    fn test_truncate_label_accented_venue_at_limit() {
        let name = "Théâtre St-Denis, Montréal, QC, Canada";
        assert_eq!(truncate_label(name, 50), name);
    }

    #[test]
    fn test_parse_page_range() {
        assert_eq!(parse_page_range("78-304").unwrap(), (78, 304));
        assert_eq!(parse_page_range("5").unwrap(), (5, 5));
        assert!(parse_page_range("10-2").is_err());
        assert!(parse_page_range("0-4").is_err());
        assert!(parse_page_range("abc").is_err());
    }
}
