//! Extraction for the band's own show archive (widespreadpanic.com).
//!
//! Listing pages link each show through a `gig-info-link` anchor; show
//! pages carry the venue in the `entry-title` heading, an ISO date in the
//! `dtstart` time element, and songs grouped into sets
//! (`setlist-item-title` divs). Sets are flattened in page order, which is
//! performance order.

use crate::store::ShowRecord;

use super::ScrapeError;
use super::html;

const BASE_LIST_URL: &str = "https://widespreadpanic.com/shows/past/?sf_paged=";

/// Listing pages to walk when the CLI doesn't narrow the range.
pub const DEFAULT_PAGES: (usize, usize) = (1, 65);

pub fn listing_url(page: usize) -> String {
    format!("{BASE_LIST_URL}{page}")
}

/// Show-page links from one listing page, in page order.
pub fn extract_show_links(page: &str) -> Vec<String> {
    html::tags_with_class(page, "a", "gig-info-link")
        .into_iter()
        .filter_map(|a| html::attr(&a.attrs, "href"))
        .filter(|href| href.contains("widespreadpanic.com/shows"))
        .collect()
}

/// Extract one show from a show page.
pub fn extract_show(page: &str) -> Result<ShowRecord, ScrapeError> {
    let location = html::tags_with_class(page, "h1", "entry-title")
        .first()
        .map(|h| html::text(&h.inner))
        .filter(|s| !s.is_empty())
        .ok_or(ScrapeError::Extract { what: "show heading" })?;

    let date = html::tags_with_class(page, "time", "dtstart")
        .first()
        .and_then(|t| html::attr(&t.attrs, "datetime"))
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty())
        .unwrap_or_else(|| "Unknown date".to_string());

    let setlist: Vec<String> = html::tags_with_class(page, "div", "setlist-item-title")
        .iter()
        .map(|d| html::text(&d.inner))
        .filter(|s| !s.is_empty())
        .collect();

    Ok(ShowRecord { date, location, setlist })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SHOW_PAGE: &str = r#"
<article>
  <h1 class="entry-title">Red Rocks Amphitheatre &#8211; Morrison, CO</h1>
  <time class="dtstart" datetime="2024-04-18">April 18, 2024</time>
  <div class="set-title">Set I</div>
  <div class="setlist-item"><div class="setlist-item-title">Disco</div></div>
  <div class="setlist-item"><div class="setlist-item-title">Chilly Water</div></div>
  <div class="set-title">Encore</div>
  <div class="setlist-item"><div class="setlist-item-title">Porch Song</div></div>
</article>"#;

    #[test]
    fn test_extract_show_flattens_sets_in_order() {
        let show = extract_show(SHOW_PAGE).unwrap();
        assert_eq!(show.date, "2024-04-18");
        assert!(show.location.starts_with("Red Rocks Amphitheatre"));
        assert_eq!(show.setlist, vec!["Disco", "Chilly Water", "Porch Song"]);
    }

    #[test]
    fn test_extract_show_without_title_fails() {
        assert!(extract_show("<html><body></body></html>").is_err());
    }

    #[test]
    fn test_missing_date_degrades() {
        let page = r#"<h1 class="entry-title">Somewhere</h1>"#;
        let show = extract_show(page).unwrap();
        assert_eq!(show.date, "Unknown date");
    }

    #[test]
    fn test_extract_show_links_filters_foreign_hosts() {
        let listing = r#"
<a class="gig-info-link" href="https://widespreadpanic.com/shows/red-rocks-2024/">Show</a>
<a class="gig-info-link" href="https://tickets.example.com/buy">Tickets</a>
<a class="nav" href="https://widespreadpanic.com/shows/other/">Nav</a>"#;

        let links = extract_show_links(listing);
        assert_eq!(links, vec!["https://widespreadpanic.com/shows/red-rocks-2024/"]);
    }
}
