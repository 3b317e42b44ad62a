#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/topchart/topchart/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Artist credit and title normalization.
//!
//! Chart pages print credits such as `DRAKE FEAT. RIHANNA & FUTURE` in one
//! field and hide further credits in the title, e.g. `GOD'S PLAN (feat. Lil Wayne)`.
//! The functions here turn both into the fixed four-slot [`ArtistCredits`].
//!
//! # Example
//!
//! ```
//! use chart_text::normalize_credits;
//!
//! let (title, artists) = normalize_credits("GOD'S PLAN (feat. Lil Wayne)", "DRAKE");
//! assert_eq!(title, "GOD'S PLAN");
//! assert_eq!(artists.slots(), &["DRAKE", "Lil Wayne", "", ""].map(String::from));
//! ```

use chart_core::ArtistCredits;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::collections::HashSet;

/// Internal separator token. Never appears in chart text.
const SEPARATOR: &str = "\u{1f}";

/// `FT`, `FT.`, `FEAT`, `FEAT.`, `&` and `,` with their surrounding whitespace.
static DELIMITER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\s*(?:\b(?:feat|ft)(?:\.|\b)|&|,)\s*").expect("valid delimiter pattern")
});

/// `Name X Name`, both sides starting with a capital letter.
static X_SEPARATOR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b([A-Z][A-Za-z\s]+?)\s+X\s+([A-Z][A-Za-z\s]+?)\b")
        .expect("valid X separator pattern")
});

static LONG_DIGITS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d{3,}").expect("valid digit pattern"));

static STOP_WORDS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:THE|AND|OF|FOR|WITH|IN|ON|AT)\b").expect("valid stop-word pattern")
});

static PARENTHESIZED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\(([^)]+)\)").expect("valid parenthesis pattern"));

static FEAT_MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:feat\.?|ft\.?|featuring)\b").expect("valid feat marker pattern")
});

static FEAT_NAMES: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:feat\.?|ft\.?|featuring)\s+(.+)").expect("valid feat names pattern")
});

static PARENTHESIZED_SPAN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s*\([^)]*\)\s*").expect("valid span pattern"));

static FEAT_LIST_DELIMITER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s*[&,]\s*").expect("valid list delimiter pattern"));

static WHITESPACE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("valid whitespace pattern"));

/// Splits a multi-artist credit into at most four names, in order.
///
/// Recognized separators are `FT`, `FT.`, `FEAT`, `FEAT.` (any case, whole
/// word), `&`, `,`, and a bare capital `X` between two capitalized names.
/// The `X` is only a separator when neither side holds a run of three or more
/// digits nor one of the words `THE AND OF FOR WITH IN ON AT`.
///
/// Missing slots are empty strings.
#[must_use]
pub fn parse_artists(raw: &str) -> ArtistCredits {
    let raw = raw.trim();
    if raw.is_empty() {
        return ArtistCredits::empty();
    }

    let unified = DELIMITER.replace_all(raw, SEPARATOR);
    let unified = split_on_x(&unified);

    ArtistCredits::from_names(
        unified
            .split(SEPARATOR)
            .map(str::trim)
            .filter(|name| !name.is_empty()),
    )
}

fn split_on_x(text: &str) -> String {
    X_SEPARATOR
        .replace_all(text, |caps: &Captures<'_>| {
            let left = caps[1].trim();
            let right = caps[2].trim();
            if looks_like_artist_pair(left, right) {
                format!("{left}{SEPARATOR}{right}")
            } else {
                caps[0].to_string()
            }
        })
        .into_owned()
}

fn looks_like_artist_pair(left: &str, right: &str) -> bool {
    left.chars().count() >= 2
        && right.chars().count() >= 2
        && !LONG_DIGITS.is_match(&format!("{left}{right}"))
        && !STOP_WORDS.is_match(&format!("{left} {right}"))
}

/// Splits the names listed after a feat. marker on `&` and `,`.
#[must_use]
pub fn split_feat_names(text: &str) -> Vec<String> {
    FEAT_LIST_DELIMITER
        .split(text)
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

/// Removes every parenthesized span from a title and returns the feat.
/// artists credited inside them.
///
/// Spans without a `feat`/`ft`/`featuring` marker are removed too. An empty or
/// whitespace-only title is returned unchanged.
#[must_use]
pub fn clean_title_and_extract_feat(title: &str) -> (String, Vec<String>) {
    if title.trim().is_empty() {
        return (title.to_string(), Vec::new());
    }

    let trimmed = title.trim();
    let mut feats = Vec::new();

    for caps in PARENTHESIZED.captures_iter(trimmed) {
        let inner = &caps[1];
        if !FEAT_MARKER.is_match(inner) {
            continue;
        }
        if let Some(names) = FEAT_NAMES.captures(inner) {
            feats.extend(split_feat_names(names[1].trim()));
        }
    }

    let stripped = PARENTHESIZED_SPAN.replace_all(trimmed, " ");
    let cleaned = WHITESPACE.replace_all(&stripped, " ").trim().to_string();

    (cleaned, feats)
}

/// Adds feat. artists to the first free slots, skipping names already credited.
///
/// Names compare case-insensitively. Once all four slots are filled, the
/// remaining feat. artists are dropped.
#[must_use]
pub fn merge_artists(mut credits: ArtistCredits, feats: &[String]) -> ArtistCredits {
    let mut known: HashSet<String> = credits.names().map(str::to_uppercase).collect();

    for feat in feats {
        let upper = feat.to_uppercase();
        if known.contains(&upper) {
            continue;
        }
        if let Some(slot) = credits.slots_mut().iter_mut().find(|slot| slot.is_empty()) {
            *slot = feat.clone();
            known.insert(upper);
        }
    }

    credits
}

/// Cleans a raw title and builds the full artist credits of a chart entry.
#[must_use]
pub fn normalize_credits(raw_title: &str, raw_artist: &str) -> (String, ArtistCredits) {
    let (title, feats) = clean_title_and_extract_feat(raw_title);
    let credits = merge_artists(parse_artists(raw_artist), &feats);
    (title, credits)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slots(credits: &ArtistCredits) -> Vec<&str> {
        credits.slots().iter().map(String::as_str).collect()
    }

    #[test]
    fn test_parse_artists_feat_and_ampersand() {
        let credits = parse_artists("DRAKE FEAT. RIHANNA & FUTURE");
        assert_eq!(slots(&credits), ["DRAKE", "RIHANNA", "FUTURE", ""]);
    }

    #[test]
    fn test_parse_artists_segment_count_matches_delimiters() {
        let cases = [
            ("NISKA", 1),
            ("NISKA, KOBA LAD", 2),
            ("NISKA FT KOBA LAD", 2),
            ("NISKA ft. KOBA LAD & NINHO", 3),
            ("A feat B, C & D", 4),
            ("A FEAT. B, C & D, E", 4),
            ("A,B&C", 3),
        ];
        for (raw, expected) in cases {
            assert_eq!(parse_artists(raw).len(), expected, "{raw}");
        }
    }

    #[test]
    fn test_parse_artists_keeps_order_and_caps() {
        let credits = parse_artists("A, B, C, D, E, F");
        assert_eq!(slots(&credits), ["A", "B", "C", "D"]);
    }

    #[test]
    fn test_parse_artists_empty() {
        assert!(parse_artists("").is_empty());
        assert!(parse_artists("   ").is_empty());
        assert_eq!(parse_artists(" , & ").len(), 0);
    }

    #[test]
    fn test_parse_artists_feat_inside_word_is_not_a_separator() {
        assert_eq!(slots(&parse_artists("FTISLAND")), ["FTISLAND", "", "", ""]);
        assert_eq!(slots(&parse_artists("SOFT CELL")), ["SOFT CELL", "", "", ""]);
    }

    #[test]
    fn test_x_separator_between_names() {
        let credits = parse_artists("Jay Z X Kanye West");
        assert_eq!(slots(&credits), ["Jay Z", "Kanye West", "", ""]);

        let credits = parse_artists("GAMBI X HEUSS L'ENFOIRE");
        assert_eq!(credits.len(), 2);
        assert_eq!(credits.primary(), "GAMBI");
    }

    #[test]
    fn test_x_inside_token_is_not_a_separator() {
        assert_eq!(slots(&parse_artists("6IX9INE")), ["6IX9INE", "", "", ""]);
        assert_eq!(slots(&parse_artists("XXXTENTACION")), ["XXXTENTACION", "", "", ""]);
    }

    #[test]
    fn test_x_with_stop_words_is_not_a_separator() {
        let credits = parse_artists("THE WEEKND X DAFT PUNK");
        assert_eq!(slots(&credits), ["THE WEEKND X DAFT PUNK", "", "", ""]);
    }

    #[test]
    fn test_clean_title_extracts_feat() {
        let (title, feats) = clean_title_and_extract_feat("GOD'S PLAN (feat. Lil Wayne)");
        assert_eq!(title, "GOD'S PLAN");
        assert_eq!(feats, ["Lil Wayne"]);
    }

    #[test]
    fn test_clean_title_splits_feat_list() {
        let (title, feats) =
            clean_title_and_extract_feat("BAIANO (Featuring Niska, Ninho & SCH) (Remix)");
        assert_eq!(title, "BAIANO");
        assert_eq!(feats, ["Niska", "Ninho", "SCH"]);
    }

    #[test]
    fn test_clean_title_drops_non_feat_spans() {
        let (title, feats) = clean_title_and_extract_feat("DANCE MONKEY (Radio Edit)  NOW");
        assert_eq!(title, "DANCE MONKEY NOW");
        assert!(feats.is_empty());
    }

    #[test]
    fn test_clean_title_blank_is_unchanged() {
        assert_eq!(clean_title_and_extract_feat(""), (String::new(), Vec::new()));
        assert_eq!(
            clean_title_and_extract_feat("   "),
            ("   ".to_string(), Vec::new())
        );
    }

    #[test]
    fn test_merge_artists_skips_known_names() {
        let credits = parse_artists("DRAKE & LIL WAYNE");
        let merged = merge_artists(credits, &["Lil Wayne".to_string(), "Future".to_string()]);
        assert_eq!(slots(&merged), ["DRAKE", "LIL WAYNE", "Future", ""]);
    }

    #[test]
    fn test_merge_artists_drops_overflow() {
        let credits = parse_artists("A & B & C");
        let merged = merge_artists(
            credits,
            &["D".to_string(), "E".to_string(), "d".to_string()],
        );
        assert_eq!(slots(&merged), ["A", "B", "C", "D"]);
    }

    #[test]
    fn test_normalize_credits() {
        let (title, credits) = normalize_credits("TATI (feat. DJ Quick)", "BAKO");
        assert_eq!(title, "TATI");
        assert_eq!(slots(&credits), ["BAKO", "DJ Quick", "", ""]);
    }
}
