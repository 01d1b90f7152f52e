use std::fs;
use std::path::Path;

use chrono::NaiveDate;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use thiserror::Error;

/// One show: a date, a venue string, and the songs in performance order.
///
/// First song is the opener, last is the closer. A song repeated within one
/// show appears twice and both appearances count. `(date, location)` is not
/// a unique key — the sources format both inconsistently.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShowRecord {
    /// Date as scraped. Sources disagree on format ("Apr 18, 2024" vs
    /// "2024-04-18"), so the raw string is kept verbatim.
    pub date: String,
    /// Free-text venue string.
    pub location: String,
    pub setlist: Vec<String>,
}

impl ShowRecord {
    /// Best-effort date parse for the handful of formats the sources emit.
    /// Returns `None` for anything unrecognized (analysis that needs
    /// ordering treats those shows as oldest).
    pub fn parsed_date(&self) -> Option<NaiveDate> {
        parse_show_date(&self.date)
    }
}

/// Try the date formats seen across both scrape sources.
pub fn parse_show_date(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    for fmt in ["%Y-%m-%d", "%b %d, %Y", "%B %d, %Y"] {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(d);
        }
    }
    None
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("show element #{index} is missing required <{field}>")]
    MissingField { index: usize, field: &'static str },
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Load the show archive from a flat XML file.
pub fn load(path: &Path) -> Result<Vec<ShowRecord>, StoreError> {
    let xml = fs::read_to_string(path)?;
    parse_shows(&xml)
}

/// Serialize the archive back to the same XML shape, escaping text content.
pub fn save(records: &[ShowRecord], path: &Path) -> Result<(), StoreError> {
    let xml = render_shows(records)?;
    fs::write(path, xml)?;
    Ok(())
}

/// Which text node the parser is currently inside.
#[derive(Clone, Copy)]
enum Field {
    Date,
    Location,
    Song,
}

#[derive(Default)]
struct PartialShow {
    date: Option<String>,
    location: Option<String>,
    setlist: Vec<String>,
}

impl PartialShow {
    fn finish(self, index: usize) -> Result<ShowRecord, StoreError> {
        let date = self
            .date
            .ok_or(StoreError::MissingField { index, field: "date" })?;
        let location = self
            .location
            .ok_or(StoreError::MissingField { index, field: "location" })?;
        Ok(ShowRecord { date, location, setlist: self.setlist })
    }
}

/// Parse an XML document of `<show>` elements into records.
///
/// A show missing `<date>` or `<location>` is an error; an empty
/// `<setlist>` is fine. Text nodes are whitespace-trimmed.
pub fn parse_shows(xml: &str) -> Result<Vec<ShowRecord>, StoreError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut shows: Vec<ShowRecord> = Vec::new();
    let mut current: Option<PartialShow> = None;
    let mut field: Option<Field> = None;

    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.name().as_ref() {
                b"show" => current = Some(PartialShow::default()),
                b"date" => field = Some(Field::Date),
                b"location" => field = Some(Field::Location),
                b"song" => field = Some(Field::Song),
                _ => field = None,
            },
            Event::Text(t) => {
                if let (Some(show), Some(f)) = (current.as_mut(), field) {
                    let text = t.unescape()?.trim().to_string();
                    match f {
                        Field::Date => show.date = Some(text),
                        Field::Location => show.location = Some(text),
                        Field::Song => show.setlist.push(text),
                    }
                }
            }
            Event::End(e) => {
                if e.name().as_ref() == b"show" {
                    if let Some(partial) = current.take() {
                        let index = shows.len();
                        shows.push(partial.finish(index)?);
                    }
                }
                field = None;
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(shows)
}

/// Render records as an XML document string.
pub fn render_shows(records: &[ShowRecord]) -> Result<String, StoreError> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    writer.write_event(Event::Start(BytesStart::new("shows")))?;

    for show in records {
        writer.write_event(Event::Start(BytesStart::new("show")))?;
        write_text_element(&mut writer, "date", &show.date)?;
        write_text_element(&mut writer, "location", &show.location)?;
        writer.write_event(Event::Start(BytesStart::new("setlist")))?;
        for song in &show.setlist {
            write_text_element(&mut writer, "song", song)?;
        }
        writer.write_event(Event::End(BytesEnd::new("setlist")))?;
        writer.write_event(Event::End(BytesEnd::new("show")))?;
    }

    writer.write_event(Event::End(BytesEnd::new("shows")))?;
    Ok(String::from_utf8_lossy(&writer.into_inner()).into_owned())
}

fn write_text_element(
    writer: &mut Writer<Vec<u8>>,
    name: &str,
    text: &str,
) -> Result<(), StoreError> {
    writer.write_event(Event::Start(BytesStart::new(name)))?;
    // BytesText::new escapes &, <, > on write
    writer.write_event(Event::Text(BytesText::new(text)))?;
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
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
    fn test_round_trip() {
        let records = vec![
            show("Apr 18, 2024", "Red Rocks, Morrison, CO, USA", &["Disco", "Chilly Water", "Disco"]),
            show("2024-04-20", "The Fox Theatre, Atlanta, GA, USA", &[]),
        ];

        let xml = render_shows(&records).unwrap();
        let parsed = parse_shows(&xml).unwrap();
        assert_eq!(parsed, records);
    }

    #[test]
    fn test_round_trip_escapes_text() {
        let records = vec![show(
            "Jun 1, 2023",
            "Smith's Olde Bar <Main Room>",
            &["Ain't Life Grand", "C. Brown & Friends"],
        )];

        let xml = render_shows(&records).unwrap();
        assert!(xml.contains("&lt;Main Room&gt;"));
        assert!(xml.contains("&amp;"));

        let parsed = parse_shows(&xml).unwrap();
        assert_eq!(parsed, records);
    }

    #[test]
    fn test_parse_trims_text_whitespace() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<shows>
  <show>
    <date>
      Apr 18, 2024
    </date>
    <location>  Red Rocks  </location>
    <setlist>
      <song> Disco </song>
    </setlist>
  </show>
</shows>"#;

        let parsed = parse_shows(xml).unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].date, "Apr 18, 2024");
        assert_eq!(parsed[0].location, "Red Rocks");
        assert_eq!(parsed[0].setlist, vec!["Disco"]);
    }

    #[test]
    fn test_missing_date_is_an_error() {
        let xml = "<shows><show><location>Somewhere</location><setlist/></show></shows>";
        let err = parse_shows(xml).unwrap_err();
        match err {
            StoreError::MissingField { index, field } => {
                assert_eq!(index, 0);
                assert_eq!(field, "date");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_location_is_an_error() {
        let xml = "<shows><show><date>Apr 18, 2024</date></show></shows>";
        assert!(matches!(
            parse_shows(xml).unwrap_err(),
            StoreError::MissingField { field: "location", .. }
        ));
    }

    #[test]
    fn test_empty_setlist_is_allowed() {
        let xml = "<shows><show><date>Apr 18, 2024</date><location>Red Rocks</location><setlist></setlist></show></shows>";
        let parsed = parse_shows(xml).unwrap();
        assert!(parsed[0].setlist.is_empty());
    }

    #[test]
    fn test_duplicate_songs_preserved_in_order() {
        let records = vec![show("2024-04-18", "Red Rocks", &["Drums", "Space", "Drums"])];
        let parsed = parse_shows(&render_shows(&records).unwrap()).unwrap();
        assert_eq!(parsed[0].setlist, vec!["Drums", "Space", "Drums"]);
    }

    #[test]
    fn test_parse_show_date_formats() {
        let d = NaiveDate::from_ymd_opt(2024, 4, 18).unwrap();
        assert_eq!(parse_show_date("2024-04-18"), Some(d));
        assert_eq!(parse_show_date("Apr 18, 2024"), Some(d));
        assert_eq!(parse_show_date("April 18, 2024"), Some(d));
        assert_eq!(parse_show_date(" Apr 18, 2024 "), Some(d));
        assert_eq!(parse_show_date("Unknown date"), None);
    }
}
