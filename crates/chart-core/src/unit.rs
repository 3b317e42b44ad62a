//! Unit of work and pipeline state definitions.
//!
//! This module defines [`Unit`], one `(year, week)` chart page, and
//! [`UnitState`], the stage a unit reached in the update pipeline.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{ChartError, Result};

/// Highest ISO week number.
pub const MAX_WEEK: u32 = 53;

/// One `(year, week)` chart page to be scraped, enriched and persisted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Unit {
    year: i32,
    week: u32,
}

impl Unit {
    /// Creates a unit, rejecting weeks outside `1..=53`.
    ///
    /// # Errors
    /// Returns [`ChartError::InvalidParameter`] for an out-of-range week.
    pub fn new(year: i32, week: u32) -> Result<Self> {
        if !(1..=MAX_WEEK).contains(&week) {
            return Err(ChartError::InvalidParameter(format!(
                "week {week} is outside 1..={MAX_WEEK}"
            )));
        }
        Ok(Self { year, week })
    }

    /// Chart year.
    #[must_use]
    pub const fn year(&self) -> i32 {
        self.year
    }

    /// Chart week.
    #[must_use]
    pub const fn week(&self) -> u32 {
        self.week
    }

    /// Key used by the week cache, `"<year>-<week>"`.
    #[must_use]
    pub fn cache_key(&self) -> String {
        format!("{}-{}", self.year, self.week)
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} W{:02}", self.year, self.week)
    }
}

/// Stage reached by a unit in the update pipeline.
///
/// `Pending → Scraped → Enriched → Persisted`, or `Skipped` when scraping
/// returned no entries.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnitState {
    /// Not processed yet.
    #[default]
    Pending,
    /// Entries extracted from the chart page.
    Scraped,
    /// Every entry carries its enrichment record.
    Enriched,
    /// Rows handed to the store.
    Persisted,
    /// Scraping produced no entries.
    Skipped,
}

impl UnitState {
    /// Returns true for states that end a unit's processing.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Persisted | Self::Skipped)
    }
}

impl fmt::Display for UnitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Pending => "pending",
            Self::Scraped => "scraped",
            Self::Enriched => "enriched",
            Self::Persisted => "persisted",
            Self::Skipped => "skipped",
        };
        f.write_str(name)
    }
}
