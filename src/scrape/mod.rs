use std::thread;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use thiserror::Error;

use crate::store::ShowRecord;

pub mod bandsite;
mod html;
pub mod setlistfm;

#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("HTTP request failed for {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: Box<ureq::Error>,
    },
    #[error("page has no usable {what}")]
    Extract { what: &'static str },
}

/// Which site to scrape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    SetlistFm,
    BandSite,
}

impl Source {
    pub fn label(self) -> &'static str {
        match self {
            Self::SetlistFm => "setlist.fm",
            Self::BandSite => "band site",
        }
    }

    /// Listing-page range walked when the CLI doesn't narrow it.
    pub fn default_pages(self) -> (usize, usize) {
        match self {
            Self::SetlistFm => setlistfm::DEFAULT_PAGES,
            Self::BandSite => bandsite::DEFAULT_PAGES,
        }
    }

    fn listing_url(self, page: usize) -> String {
        match self {
            Self::SetlistFm => setlistfm::listing_url(page),
            Self::BandSite => bandsite::listing_url(page),
        }
    }

    fn extract_show_links(self, page: &str) -> Vec<String> {
        match self {
            Self::SetlistFm => setlistfm::extract_show_links(page),
            Self::BandSite => bandsite::extract_show_links(page),
        }
    }

    fn extract_show(self, page: &str) -> Result<ShowRecord, ScrapeError> {
        match self {
            Self::SetlistFm => setlistfm::extract_show(page),
            Self::BandSite => bandsite::extract_show(page),
        }
    }
}

/// Result of a scrape run. Failures are per-show and non-fatal; the batch
/// always runs to the end.
pub struct ScrapeResult {
    pub pages_fetched: usize,
    pub shows_scraped: usize,
    pub fetch_errors: usize,
    pub extract_errors: usize,
    pub records: Vec<ShowRecord>,
}

/// Fetch one page of markup.
pub fn fetch_page(url: &str) -> Result<String, ScrapeError> {
    log::debug!("Fetching {url}");
    ureq::get(url)
        .call()
        .map_err(|e| fetch_error(url, e))?
        .body_mut()
        .read_to_string()
        .map_err(|e| fetch_error(url, e))
}

fn fetch_error(url: &str, e: ureq::Error) -> ScrapeError {
    ScrapeError::Fetch {
        url: url.to_string(),
        source: Box::new(e),
    }
}

/// Walk listing pages `start..=end`, collect show links, then fetch and
/// extract each show sequentially. One request at a time with a polite
/// sleep in between; a failed page is logged and skipped.
pub fn scrape(
    source: Source,
    pages: (usize, usize),
    rate_limit_ms: u64,
) -> ScrapeResult {
    let (start, end) = pages;
    let mut result = ScrapeResult {
        pages_fetched: 0,
        shows_scraped: 0,
        fetch_errors: 0,
        extract_errors: 0,
        records: Vec::new(),
    };

    println!(
        "Collecting show links from {} (pages {start}-{end})...",
        source.label()
    );

    let mut show_links: Vec<String> = Vec::new();
    for page_num in start..=end {
        let url = source.listing_url(page_num);
        match fetch_page(&url) {
            Ok(page) => {
                result.pages_fetched += 1;
                let links = source.extract_show_links(&page);
                log::debug!("Page {page_num}: {} show links", links.len());
                show_links.extend(links);
            }
            Err(e) => {
                result.fetch_errors += 1;
                log::warn!("Skipping listing page {page_num}: {e}");
            }
        }
        thread::sleep(Duration::from_millis(rate_limit_ms));
    }

    if show_links.is_empty() {
        log::warn!("No show links found on any listing page");
        return result;
    }

    let pb = ProgressBar::new(show_links.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} shows ({eta} remaining) {msg}")
            .unwrap()
            .progress_chars("=>-"),
    );

    for link in &show_links {
        match fetch_page(link) {
            Ok(page) => match source.extract_show(&page) {
                Ok(show) => {
                    pb.set_message(format!("{} — {}", show.date, show.location));
                    result.shows_scraped += 1;
                    result.records.push(show);
                }
                Err(e) => {
                    result.extract_errors += 1;
                    log::warn!("Skipping {link}: {e}");
                }
            },
            Err(e) => {
                result.fetch_errors += 1;
                log::warn!("Skipping {link}: {e}");
            }
        }

        pb.inc(1);
        thread::sleep(Duration::from_millis(rate_limit_ms));
    }

    pb.finish_with_message("done");
    result
}
