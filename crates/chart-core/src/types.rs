//! Core data types for chart ingestion.
//!
//! This module defines the fundamental data structures:
//!
//! - [`ArtistCredits`] - The four artist slots of a chart entry
//! - [`ChartEntry`] - One ranked song row scraped from a chart page
//! - [`EnrichmentRecord`] - Producer/writer/release/sample metadata for a song
//! - [`CacheKey`] - Normalized `(title, artist)` key for enrichment lookups
//! - [`ChartRow`] - The flat record handed to persistence

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::{error::ChartError, unit::Unit};

/// Number of artist slots carried by every chart entry.
pub const ARTIST_SLOTS: usize = 4;

/// Ordered artist credits with exactly [`ARTIST_SLOTS`] slots.
///
/// Slot 1 holds the primary artist. Unused slots are empty strings, never
/// omitted, because persistence expects all four artist columns.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArtistCredits([String; ARTIST_SLOTS]);

impl ArtistCredits {
    /// Creates credits with every slot empty.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Builds credits from names in order; names past the fourth are dropped.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut credits = Self::default();
        for (slot, name) in credits.0.iter_mut().zip(names) {
            *slot = name.into();
        }
        credits
    }

    /// Returns the primary artist (slot 1).
    #[must_use]
    pub fn primary(&self) -> &str {
        &self.0[0]
    }

    /// Returns the artist in slot `index` (0-based), or `None` when out of range.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&str> {
        self.0.get(index).map(String::as_str)
    }

    /// Returns all four slots, including empty ones.
    #[must_use]
    pub fn slots(&self) -> &[String; ARTIST_SLOTS] {
        &self.0
    }

    /// Mutable access to the four slots.
    pub fn slots_mut(&mut self) -> &mut [String; ARTIST_SLOTS] {
        &mut self.0
    }

    /// Iterates over the non-empty artist names in slot order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str).filter(|s| !s.is_empty())
    }

    /// Number of filled slots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.names().count()
    }

    /// Returns true when no slot is filled.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns true when all four slots are filled.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.0.iter().all(|s| !s.is_empty())
    }
}

/// One ranked song row of a weekly chart page.
///
/// An entry only exists when both rank and title were resolved from the page.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartEntry {
    /// Position in the chart, starting at 1.
    pub rank: u32,
    /// Song title with parenthesized spans removed.
    pub title: String,
    /// Artist credits, feat. artists merged in.
    pub artists: ArtistCredits,
    /// Record label, empty when the page did not show one.
    pub label: String,
    /// Chart year.
    pub year: i32,
    /// Chart week, 1 to 53.
    pub week: u32,
}

impl ChartEntry {
    /// Creates an entry for the given unit with empty artists and label.
    #[must_use]
    pub fn new(unit: Unit, rank: u32, title: impl Into<String>) -> Self {
        Self {
            rank,
            title: title.into(),
            artists: ArtistCredits::empty(),
            label: String::new(),
            year: unit.year(),
            week: unit.week(),
        }
    }

    /// Sets the artist credits.
    #[must_use]
    pub fn with_artists(mut self, artists: ArtistCredits) -> Self {
        self.artists = artists;
        self
    }

    /// Sets the label.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }
}

/// How a song reuses another recording.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SampleType {
    /// Direct audio sample.
    Sample,
    /// Re-recorded melody or lyric.
    Interpolation,
}

impl SampleType {
    /// Returns the persisted string form.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Sample => "sample",
            Self::Interpolation => "interpolation",
        }
    }
}

impl fmt::Display for SampleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SampleType {
    type Err = ChartError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sample" => Ok(Self::Sample),
            "interpolation" => Ok(Self::Interpolation),
            other => Err(ChartError::Parse(format!("unknown sample type: {other}"))),
        }
    }
}

/// Externally-sourced song metadata.
///
/// Every field is independently optional. A record with every field absent is
/// the "no match" outcome and is cached like any other record. `sample_from`
/// is set iff `sample_type` is set; use [`EnrichmentRecord::set_sample`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichmentRecord {
    /// First credited producer.
    #[serde(default)]
    pub producer_1: Option<String>,
    /// Second credited producer.
    #[serde(default)]
    pub producer_2: Option<String>,
    /// First credited writer.
    #[serde(default)]
    pub writer_1: Option<String>,
    /// Second credited writer.
    #[serde(default)]
    pub writer_2: Option<String>,
    /// Release date as reported by the provider.
    #[serde(default)]
    pub release_date: Option<String>,
    /// Kind of reuse of another song, if any.
    #[serde(default)]
    pub sample_type: Option<SampleType>,
    /// The reused song, `"<title> - <artist>"` or just the title.
    #[serde(default)]
    pub sample_from: Option<String>,
}

impl EnrichmentRecord {
    /// The all-absent record.
    #[must_use]
    pub fn absent() -> Self {
        Self::default()
    }

    /// Records sample provenance, keeping type and source together.
    pub fn set_sample(&mut self, kind: SampleType, from: impl Into<String>) {
        self.sample_type = Some(kind);
        self.sample_from = Some(from.into());
    }

    /// Returns true when no field is present.
    #[must_use]
    pub fn is_absent(&self) -> bool {
        self == &Self::default()
    }
}

static NON_WORD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\w\s]").expect("valid punctuation pattern"));

/// Separator between the normalized title and artist inside a [`CacheKey`].
const KEY_SEPARATOR: char = '|';

/// Normalized `(title, artist)` key identifying one enrichment lookup.
///
/// Both parts are lower-cased, stripped of punctuation and trimmed, so case
/// and punctuation variants of the same song share one cache entry.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CacheKey(String);

impl CacheKey {
    /// Builds the key for a title and artist.
    #[must_use]
    pub fn new(title: &str, artist: &str) -> Self {
        Self(format!(
            "{}{KEY_SEPARATOR}{}",
            Self::normalize(title),
            Self::normalize(artist)
        ))
    }

    /// Normalizes one key component. Idempotent.
    #[must_use]
    pub fn normalize(part: &str) -> String {
        NON_WORD
            .replace_all(&part.to_lowercase(), "")
            .trim()
            .to_string()
    }

    /// Returns the key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Flat record handed to persistence, one per chart entry.
///
/// Field names are the persisted column names.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartRow {
    /// Rank.
    pub classement: u32,
    /// Artist slot 1.
    pub artiste: String,
    /// Artist slot 2.
    pub artiste_2: String,
    /// Artist slot 3.
    pub artiste_3: String,
    /// Artist slot 4.
    pub artiste_4: String,
    /// Title.
    pub titre: String,
    /// Label.
    pub editeur: String,
    /// Year.
    pub annee: i32,
    /// Week.
    pub semaine: u32,
    /// First producer.
    pub producer_1: Option<String>,
    /// Second producer.
    pub producer_2: Option<String>,
    /// First writer.
    pub writer_1: Option<String>,
    /// Second writer.
    pub writer_2: Option<String>,
    /// Release date.
    pub release_date: Option<String>,
    /// Sample kind.
    pub sample_type: Option<SampleType>,
    /// Sampled song.
    pub sample_from: Option<String>,
}

impl ChartRow {
    /// Persisted column names, in order.
    pub const COLUMNS: [&'static str; 16] = [
        "classement",
        "artiste",
        "artiste_2",
        "artiste_3",
        "artiste_4",
        "titre",
        "editeur",
        "annee",
        "semaine",
        "producer_1",
        "producer_2",
        "writer_1",
        "writer_2",
        "release_date",
        "sample_type",
        "sample_from",
    ];

    /// Merges a chart entry with its enrichment record.
    #[must_use]
    pub fn merge(entry: ChartEntry, record: EnrichmentRecord) -> Self {
        let [artiste, artiste_2, artiste_3, artiste_4] = entry.artists.0;
        Self {
            classement: entry.rank,
            artiste,
            artiste_2,
            artiste_3,
            artiste_4,
            titre: entry.title,
            editeur: entry.label,
            annee: entry.year,
            semaine: entry.week,
            producer_1: record.producer_1,
            producer_2: record.producer_2,
            writer_1: record.writer_1,
            writer_2: record.writer_2,
            release_date: record.release_date,
            sample_type: record.sample_type,
            sample_from: record.sample_from,
        }
    }

    /// Builds a row with no enrichment, as persisted when enrichment was skipped.
    #[must_use]
    pub fn unenriched(entry: ChartEntry) -> Self {
        Self::merge(entry, EnrichmentRecord::absent())
    }

    /// Replaces every enrichment column with the record's values.
    pub fn apply(&mut self, record: &EnrichmentRecord) {
        self.producer_1.clone_from(&record.producer_1);
        self.producer_2.clone_from(&record.producer_2);
        self.writer_1.clone_from(&record.writer_1);
        self.writer_2.clone_from(&record.writer_2);
        self.release_date.clone_from(&record.release_date);
        self.sample_type = record.sample_type;
        self.sample_from.clone_from(&record.sample_from);
    }

    /// Rows without a first producer are due for enrichment.
    #[must_use]
    pub const fn needs_enrichment(&self) -> bool {
        self.producer_1.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit() -> Unit {
        Unit::new(2024, 12).unwrap()
    }

    #[test]
    fn test_artist_credits_from_names_caps_at_four() {
        let credits = ArtistCredits::from_names(["A", "B", "C", "D", "E"]);
        assert_eq!(credits.slots(), &["A", "B", "C", "D"].map(String::from));
        assert!(credits.is_full());
    }

    #[test]
    fn test_artist_credits_pads_with_empty_slots() {
        let credits = ArtistCredits::from_names(["DRAKE"]);
        assert_eq!(credits.primary(), "DRAKE");
        assert_eq!(credits.get(3), Some(""));
        assert_eq!(credits.len(), 1);
        assert!(!credits.is_full());
    }

    #[test]
    fn test_cache_key_collapses_case_and_punctuation() {
        let a = CacheKey::new("God's Plan!", "Drake");
        let b = CacheKey::new("  GODS PLAN ", "DRAKE.");
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "gods plan|drake");
    }

    #[test]
    fn test_cache_key_is_idempotent() {
        for (title, artist) in [
            ("NE REVIENS PAS", "GRADUR"),
            ("a !", "  b?c "),
            ("Ça va (Remix)", "Aya Nakamura & Damso"),
        ] {
            let once = CacheKey::new(title, artist);
            let twice = CacheKey::new(&CacheKey::normalize(title), &CacheKey::normalize(artist));
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn test_enrichment_record_absent() {
        let mut record = EnrichmentRecord::absent();
        assert!(record.is_absent());
        record.set_sample(SampleType::Interpolation, "Numb - Linkin Park");
        assert!(!record.is_absent());
        assert_eq!(record.sample_from.as_deref(), Some("Numb - Linkin Park"));
    }

    #[test]
    fn test_sample_type_parses_persisted_form() {
        for kind in [SampleType::Sample, SampleType::Interpolation] {
            assert_eq!(kind.as_str().parse::<SampleType>().unwrap(), kind);
        }
        assert!("remix".parse::<SampleType>().is_err());
    }

    #[test]
    fn test_enrichment_record_reads_null_fields() {
        let json = r#"{"producer_1": "Boi-1da", "producer_2": null, "writer_1": null,
            "writer_2": null, "release_date": "2018-01-19", "sample_type": null, "sample_from": null}"#;
        let record: EnrichmentRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.producer_1.as_deref(), Some("Boi-1da"));
        assert_eq!(record.release_date.as_deref(), Some("2018-01-19"));
        assert!(record.sample_type.is_none());
    }

    #[test]
    fn test_chart_row_merge() {
        let entry = ChartEntry::new(unit(), 3, "GOD'S PLAN")
            .with_artists(ArtistCredits::from_names(["DRAKE", "Lil Wayne"]))
            .with_label("REPUBLIC");
        let mut record = EnrichmentRecord::absent();
        record.producer_1 = Some("Cardo".to_string());
        record.set_sample(SampleType::Sample, "Intro");

        let row = ChartRow::merge(entry, record);
        assert_eq!(row.classement, 3);
        assert_eq!(row.artiste_2, "Lil Wayne");
        assert_eq!(row.artiste_3, "");
        assert_eq!(row.editeur, "REPUBLIC");
        assert_eq!((row.annee, row.semaine), (2024, 12));
        assert_eq!(row.producer_1.as_deref(), Some("Cardo"));
        assert_eq!(row.sample_type, Some(SampleType::Sample));
    }

    #[test]
    fn test_chart_row_serializes_column_names() {
        let row = ChartRow::unenriched(ChartEntry::new(unit(), 1, "X"));
        let value = serde_json::to_value(&row).unwrap();
        let object = value.as_object().unwrap();
        assert_eq!(object.len(), ChartRow::COLUMNS.len());
        for column in ChartRow::COLUMNS {
            assert!(object.contains_key(column), "missing column {column}");
        }
    }

    #[test]
    fn test_chart_row_apply_overwrites_enrichment() {
        let mut row = ChartRow::unenriched(ChartEntry::new(unit(), 4, "DJADJA"));
        assert!(row.needs_enrichment());

        let mut record = EnrichmentRecord::absent();
        record.producer_1 = Some("Vinsmoker".to_string());
        record.writer_1 = Some("Aya Nakamura".to_string());
        record.set_sample(SampleType::Interpolation, "Djadja (Remix)");
        row.apply(&record);

        assert!(!row.needs_enrichment());
        assert_eq!(row.writer_1.as_deref(), Some("Aya Nakamura"));
        assert_eq!(row.sample_type, Some(SampleType::Interpolation));
        assert_eq!(row.titre, "DJADJA");

        row.apply(&EnrichmentRecord::absent());
        assert!(row.needs_enrichment());
        assert!(row.sample_from.is_none());
    }
}
