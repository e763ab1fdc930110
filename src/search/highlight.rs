//! Highlighters: mark matched terms in stored text.

use std::fmt;

use crate::document::Document;
use crate::search::{DocumentMatch, Location};

/// Produces highlighted fragments of a hit's stored field.
pub trait Highlighter: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;

    /// Up to `num` fragments of `field`, best first.
    fn best_fragments(
        &self,
        hit: &DocumentMatch,
        doc: &Document,
        field: &str,
        num: usize,
    ) -> Vec<String>;
}

const DEFAULT_FRAGMENT_SIZE: usize = 200;
const DEFAULT_SEPARATOR: &str = "…";

/// Wraps matches in fixed before/after markers within fixed-size windows.
#[derive(Debug, Clone)]
pub struct SimpleHighlighter {
    name: String,
    fragment_size: usize,
    before: String,
    after: String,
    separator: String,
}

impl SimpleHighlighter {
    pub fn new<S: Into<String>>(name: S, before: S, after: S) -> Self {
        SimpleHighlighter {
            name: name.into(),
            fragment_size: DEFAULT_FRAGMENT_SIZE,
            before: before.into(),
            after: after.into(),
            separator: DEFAULT_SEPARATOR.to_string(),
        }
    }

    /// `<mark>` tags.
    pub fn html() -> Self {
        Self::new("html", "<mark>", "</mark>")
    }

    /// Yellow background ANSI escapes.
    pub fn ansi() -> Self {
        Self::new("ansi", "\x1b[43m", "\x1b[0m")
    }

    pub fn with_fragment_size(mut self, size: usize) -> Self {
        self.fragment_size = size.max(1);
        self
    }

    fn render(&self, text: &str, start: usize, end: usize, locations: &[&Location]) -> String {
        let mut out = String::new();
        if start > 0 {
            out.push_str(&self.separator);
        }
        let mut cursor = start;
        for location in locations {
            let (s, e) = (location.start as usize, location.end as usize);
            if s < cursor {
                continue;
            }
            out.push_str(&text[cursor..s]);
            out.push_str(&self.before);
            out.push_str(&text[s..e]);
            out.push_str(&self.after);
            cursor = e;
        }
        out.push_str(&text[cursor..end]);
        if end < text.len() {
            out.push_str(&self.separator);
        }
        out
    }
}

fn floor_boundary(text: &str, mut i: usize) -> usize {
    while i > 0 && !text.is_char_boundary(i) {
        i -= 1;
    }
    i
}

fn ceil_boundary(text: &str, mut i: usize) -> usize {
    while i < text.len() && !text.is_char_boundary(i) {
        i += 1;
    }
    i
}

impl Highlighter for SimpleHighlighter {
    fn name(&self) -> &str {
        &self.name
    }

    fn best_fragments(
        &self,
        hit: &DocumentMatch,
        doc: &Document,
        field: &str,
        num: usize,
    ) -> Vec<String> {
        let Some(term_locations) = hit.locations.get(field) else {
            return Vec::new();
        };

        // (score, order, fragment)
        let mut fragments: Vec<(usize, usize, String)> = Vec::new();
        for stored in doc.fields_named(field) {
            let Some(text) = stored.as_text() else {
                continue;
            };
            let mut locations: Vec<&Location> = term_locations
                .values()
                .flatten()
                .filter(|l| l.array_positions == stored.array_positions())
                .filter(|l| {
                    let (s, e) = (l.start as usize, l.end as usize);
                    s < e && e <= text.len() && text.is_char_boundary(s) && text.is_char_boundary(e)
                })
                .collect();
            locations.sort_by_key(|l| (l.start, l.end));
            locations.dedup_by_key(|l| l.start);

            let mut i = 0;
            while i < locations.len() {
                let first = locations[i];
                let lead = (first.start as usize).min(self.fragment_size / 4);
                let start = floor_boundary(text, first.start as usize - lead);
                let end = ceil_boundary(
                    text,
                    (start + self.fragment_size)
                        .max(first.end as usize)
                        .min(text.len()),
                );

                let mut j = i;
                while j < locations.len() && locations[j].end as usize <= end {
                    j += 1;
                }
                let included = &locations[i..j];
                let order = fragments.len();
                fragments.push((included.len(), order, self.render(text, start, end, included)));
                i = j.max(i + 1);
            }
        }

        fragments.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(&b.1)));
        fragments
            .into_iter()
            .take(num)
            .map(|(_, _, fragment)| fragment)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Field, TermLocation};

    fn hit_with(field: &str, term: &str, spans: &[(u64, u64)]) -> DocumentMatch {
        let mut hit = DocumentMatch::new(0, 1.0);
        let locations: Vec<TermLocation> = spans
            .iter()
            .enumerate()
            .map(|(i, (start, end))| TermLocation {
                position: i as u64 + 1,
                start: *start,
                end: *end,
                array_positions: vec![],
            })
            .collect();
        hit.add_locations(field, term, &locations);
        hit
    }

    #[test]
    fn test_html_fragment() {
        let doc = Document::new("1").with_field(Field::text("body", vec![], "the quick brown fox"));
        let hit = hit_with("body", "quick", &[(4, 9)]);

        let fragments = SimpleHighlighter::html().best_fragments(&hit, &doc, "body", 1);
        assert_eq!(fragments, vec!["the <mark>quick</mark> brown fox".to_string()]);
    }

    #[test]
    fn test_long_text_is_windowed() {
        let text = format!("{} needle {}", "a ".repeat(200), "b ".repeat(200));
        let start = text.find("needle").unwrap() as u64;
        let doc = Document::new("1").with_field(Field::text("body", vec![], text.as_str()));
        let hit = hit_with("body", "needle", &[(start, start + 6)]);

        let highlighter = SimpleHighlighter::ansi().with_fragment_size(40);
        let fragments = highlighter.best_fragments(&hit, &doc, "body", 3);
        assert_eq!(fragments.len(), 1);
        assert!(fragments[0].starts_with('…'));
        assert!(fragments[0].ends_with('…'));
        assert!(fragments[0].contains("\x1b[43mneedle\x1b[0m"));
    }

    #[test]
    fn test_missing_field_yields_nothing() {
        let doc = Document::new("1");
        let hit = hit_with("body", "x", &[(0, 1)]);
        assert!(SimpleHighlighter::html().best_fragments(&hit, &doc, "title", 1).is_empty());
    }
}
