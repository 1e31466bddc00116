// Emoticon extraction and rendering over message text
//
// Rendering produces a sequence of segments rather than markup; the
// presentation layer decides how an emoticon segment is drawn.

use once_cell::sync::Lazy;
use regex::Regex;

use super::catalog::{self, Emoticon};
use crate::models::EmoticonOccurrence;

/// One piece of rendered message text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderedSegment {
    Text(String),
    Emoticon(&'static Emoticon),
}

impl RenderedSegment {
    /// Plain-text fallback: the text itself, or the shortcut for an emoticon.
    pub fn as_plain(&self) -> &str {
        match self {
            RenderedSegment::Text(text) => text,
            RenderedSegment::Emoticon(emoticon) => emoticon.shortcut,
        }
    }
}

// Alternation ordered longest shortcut first. The regex engine prefers the
// earliest alternative at a given position, so `:-)` wins over `:)`.
static SHORTCUT_PATTERN: Lazy<Regex> = Lazy::new(|| {
    let alternation = catalog::longest_first()
        .iter()
        .map(|e| regex::escape(e.shortcut))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&alternation).expect("escaped emoticon shortcuts always form a valid pattern")
});

/// Every literal occurrence of every catalog shortcut, ascending by character
/// offset. Occurrences of different shortcuts may overlap.
pub fn extract_occurrences(text: &str) -> Vec<EmoticonOccurrence> {
    if text.is_empty() {
        return Vec::new();
    }

    let mut found: Vec<(usize, EmoticonOccurrence)> = Vec::new();
    for (order, emoticon) in catalog::all().iter().enumerate() {
        for (byte_offset, _) in text.match_indices(emoticon.shortcut) {
            found.push((
                order,
                EmoticonOccurrence {
                    shortcut: emoticon.shortcut.to_string(),
                    offset: char_offset(text, byte_offset),
                },
            ));
        }
    }

    // Stable on offset, catalog order breaks ties
    found.sort_by(|(ao, a), (bo, b)| a.offset.cmp(&b.offset).then(ao.cmp(bo)));
    found.into_iter().map(|(_, occurrence)| occurrence).collect()
}

/// Splits `text` into plain and emoticon segments, longest shortcut winning
/// at any position. Text outside matched spans is passed through untouched.
pub fn render_with_glyphs(text: &str) -> Vec<RenderedSegment> {
    let mut segments = Vec::new();
    let mut cursor = 0;

    for found in SHORTCUT_PATTERN.find_iter(text) {
        let Some(emoticon) = catalog::find_by_shortcut(found.as_str()) else {
            continue;
        };
        if found.start() > cursor {
            segments.push(RenderedSegment::Text(text[cursor..found.start()].to_string()));
        }
        segments.push(RenderedSegment::Emoticon(emoticon));
        cursor = found.end();
    }

    if cursor < text.len() {
        segments.push(RenderedSegment::Text(text[cursor..].to_string()));
    }
    segments
}

/// Renders emoticons as `[description]`, used by the command-line driver and logs.
pub fn render_plain(text: &str) -> String {
    render_with_glyphs(text)
        .iter()
        .map(|segment| match segment {
            RenderedSegment::Text(text) => text.clone(),
            RenderedSegment::Emoticon(e) => format!("[{}]", e.description),
        })
        .collect()
}

fn char_offset(text: &str, byte_offset: usize) -> usize {
    text[..byte_offset].chars().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shortcuts(segments: &[RenderedSegment]) -> Vec<&str> {
        segments
            .iter()
            .filter_map(|s| match s {
                RenderedSegment::Emoticon(e) => Some(e.shortcut),
                RenderedSegment::Text(_) => None,
            })
            .collect()
    }

    #[test]
    fn test_extract_single_smile() {
        let found = extract_occurrences("hola :)");
        assert_eq!(
            found,
            vec![EmoticonOccurrence { shortcut: ":)".to_string(), offset: 5 }]
        );
    }

    #[test]
    fn test_extract_is_sorted_and_repeatable() {
        let text = "(y) genial :D y luego :P (y)";
        let first = extract_occurrences(text);
        let second = extract_occurrences(text);
        assert_eq!(first, second);

        let offsets: Vec<usize> = first.iter().map(|o| o.offset).collect();
        assert_eq!(offsets, vec![0, 11, 22, 25]);
        assert_eq!(first[0].shortcut, "(y)");
        assert_eq!(first[2].shortcut, ":P");
    }

    #[test]
    fn test_extract_uses_character_offsets() {
        // "¡Buenas! " is 9 characters but 10 bytes
        let found = extract_occurrences("¡Buenas! :D");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].offset, 9);
    }

    #[test]
    fn test_extract_empty_text() {
        assert!(extract_occurrences("").is_empty());
        assert!(render_with_glyphs("").is_empty());
    }

    #[test]
    fn test_longer_shortcut_wins() {
        let segments = render_with_glyphs("hey :-) you");
        assert_eq!(shortcuts(&segments), vec![":-)"]);
        assert_eq!(
            segments,
            vec![
                RenderedSegment::Text("hey ".to_string()),
                RenderedSegment::Emoticon(catalog::find_by_shortcut(":-)").unwrap()),
                RenderedSegment::Text(" you".to_string()),
            ]
        );
    }

    #[test]
    fn test_metacharacters_are_literal() {
        let segments = render_with_glyphs(":-* :* (6) 8-)");
        assert_eq!(shortcuts(&segments), vec![":-*", ":*", "(6)", "8-)"]);
        // A bare asterisk or parenthesis is never a match on its own
        assert_eq!(render_with_glyphs("a*b(c)"), vec![RenderedSegment::Text("a*b(c)".to_string())]);
    }

    #[test]
    fn test_unicode_passes_through() {
        let text = "Escuchando Shakira 🎵 (h) ñandú";
        let segments = render_with_glyphs(text);
        assert_eq!(shortcuts(&segments), vec!["(h)"]);
        let rebuilt: String = segments.iter().map(|s| s.as_plain()).collect();
        assert_eq!(rebuilt, text);
    }

    #[test]
    fn test_render_plain() {
        assert_eq!(render_plain("hola :) (y)"), "hola [Smile] [Thumbs up]");
    }
}
