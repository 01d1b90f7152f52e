//! Low-level HTML extraction helpers.
//!
//! Deliberately naive, tailored to the flat markup of the two show-listing
//! sites. Non-greedy block matching, so nested same-name tags are not
//! handled (the pages don't need it).

use regex::Regex;

/// One `<tag ...>inner</tag>` occurrence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagBlock {
    /// Raw attribute text of the opening tag.
    pub attrs: String,
    /// Markup between the opening and closing tag.
    pub inner: String,
}

/// All blocks of `tag` in document order.
pub fn tags(html: &str, tag: &str) -> Vec<TagBlock> {
    let pattern = format!(
        r"(?is)<{tag}\b([^>]*)>(.*?)</{tag}\s*>",
        tag = regex::escape(tag)
    );
    // Pattern is built from a fixed tag name; can't fail
    let re = Regex::new(&pattern).unwrap();
    re.captures_iter(html)
        .map(|c| TagBlock {
            attrs: c[1].to_string(),
            inner: c[2].to_string(),
        })
        .collect()
}

/// All blocks of `tag` whose class attribute carries `class_name` as a
/// whitespace-separated token.
pub fn tags_with_class(html: &str, tag: &str, class_name: &str) -> Vec<TagBlock> {
    tags(html, tag)
        .into_iter()
        .filter(|t| has_class(&t.attrs, class_name))
        .collect()
}

/// Whether the attribute text carries `name` as a class token.
pub fn has_class(attrs: &str, name: &str) -> bool {
    attr(attrs, "class")
        .map(|classes| classes.split_whitespace().any(|c| c == name))
        .unwrap_or(false)
}

/// Value of a double-quoted attribute, e.g. `href="..."`.
pub fn attr(attrs: &str, name: &str) -> Option<String> {
    let pattern = format!(r#"(?i){}\s*=\s*"([^"]*)""#, regex::escape(name));
    let re = Regex::new(&pattern).unwrap();
    re.captures(attrs).map(|c| c[1].to_string())
}

/// Visible text of a block: tags stripped, minimal entities decoded,
/// whitespace collapsed.
pub fn text(inner: &str) -> String {
    normalize_ws(&decode_entities(&strip_tags(inner)))
}

/// Remove all `<...>` tags.
fn strip_tags(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_tag = false;
    for ch in s.chars() {
        match ch {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => out.push(ch),
            _ => {}
        }
    }
    out
}

/// Minimal entity decoding: the handful these pages actually use.
fn decode_entities(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&gt;", ">")
        .replace("&lt;", "<")
        .replace("&amp;", "&")
}

/// Collapse whitespace runs to a single space and trim.
fn normalize_ws(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_space = false;
    for ch in s.chars() {
        if ch.is_whitespace() {
            if !prev_space {
                out.push(' ');
                prev_space = true;
            }
        } else {
            out.push(ch);
            prev_space = false;
        }
    }
    out.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tags_finds_blocks_in_order() {
        let html = r#"<span class="month">Apr</span> <span class="day">18</span>"#;
        let spans = tags(html, "span");
        assert_eq!(spans.len(), 2);
        assert_eq!(spans[0].inner, "Apr");
        assert_eq!(spans[1].inner, "18");
    }

    #[test]
    fn test_tags_case_insensitive() {
        let html = "<H1 class=\"entry-title\">Red Rocks</H1>";
        let blocks = tags_with_class(html, "h1", "entry-title");
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].inner, "Red Rocks");
    }

    #[test]
    fn test_class_token_matching() {
        assert!(has_class(r#" class="summary url""#, "summary"));
        assert!(has_class(r#" class="summary url""#, "url"));
        assert!(!has_class(r#" class="summary url""#, "summ"));
        assert!(!has_class(r#" href="x.html""#, "summary"));
    }

    #[test]
    fn test_attr_extraction() {
        let attrs = r#" href="../setlist/show.html" class="summary url""#;
        assert_eq!(attr(attrs, "href").as_deref(), Some("../setlist/show.html"));
        assert_eq!(attr(attrs, "title"), None);
    }

    #[test]
    fn test_text_strips_and_collapses() {
        let inner = "  <a href=\"x\">Ain&#39;t  Life\n Grand</a> ";
        assert_eq!(text(inner), "Ain't Life Grand");
    }

    #[test]
    fn test_decode_order_keeps_double_escapes() {
        assert_eq!(text("A &amp; B"), "A & B");
        // "&amp;lt;" is an escaped "&lt;", not a "<"
        assert_eq!(text("&amp;lt;"), "&lt;");
    }
}
