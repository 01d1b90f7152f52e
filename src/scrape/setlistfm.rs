//! Extraction for setlist.fm artist pages.
//!
//! Listing pages carry one `summary url` anchor per show; each show page
//! has the venue in the `<h1>`, the date split across month/day/year
//! spans, and one `songLabel` anchor per song.

use crate::store::ShowRecord;

use super::ScrapeError;
use super::html;

const BASE_LIST_URL: &str =
    "https://www.setlist.fm/setlists/widespread-panic-13d6ad15.html?page=";
const BASE_DOMAIN: &str = "https://www.setlist.fm";

/// Listing pages to walk when the CLI doesn't narrow the range.
pub const DEFAULT_PAGES: (usize, usize) = (1, 304);

pub fn listing_url(page: usize) -> String {
    format!("{BASE_LIST_URL}{page}")
}

/// Show-page links from one listing page, in page order.
pub fn extract_show_links(page: &str) -> Vec<String> {
    html::tags(page, "a")
        .into_iter()
        .filter(|a| html::has_class(&a.attrs, "summary") && html::has_class(&a.attrs, "url"))
        .filter_map(|a| html::attr(&a.attrs, "href"))
        // Links are relative ("../setlist/...")
        .map(|href| format!("{BASE_DOMAIN}{}", href.trim_start_matches("..")))
        .collect()
}

/// Extract one show from a show page.
///
/// Missing venue or date degrade to placeholder strings so the show is
/// still archived; a page without an `<h1>` is not a show page at all.
pub fn extract_show(page: &str) -> Result<ShowRecord, ScrapeError> {
    let h1 = html::tags(page, "h1")
        .into_iter()
        .next()
        .ok_or(ScrapeError::Extract { what: "show heading" })?;

    // Venue lives in the second anchor of the heading
    let location = html::tags(&h1.inner, "a")
        .get(1)
        .map(|a| html::text(&a.inner))
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "Unknown location".to_string());

    let date = match (
        first_span_text(page, "month"),
        first_span_text(page, "day"),
        first_span_text(page, "year"),
    ) {
        (Some(month), Some(day), Some(year)) => format!("{month} {day}, {year}"),
        _ => "Unknown date".to_string(),
    };

    let setlist: Vec<String> = html::tags_with_class(page, "a", "songLabel")
        .iter()
        .map(|a| html::text(&a.inner))
        .filter(|s| !s.is_empty())
        .collect();

    Ok(ShowRecord { date, location, setlist })
}

fn first_span_text(page: &str, class_name: &str) -> Option<String> {
    html::tags_with_class(page, "span", class_name)
        .first()
        .map(|s| html::text(&s.inner))
        .filter(|s| !s.is_empty())
}
