//! Incremental update of one chart year.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chart_core::{
    ChartEntry, ChartError, ChartRow, ChartSource, ChartStore, Result, Unit, UnitState, WeekCache,
    unit::MAX_WEEK,
};
use tracing::{debug, error, info, instrument, warn};

use crate::enricher::Enricher;

/// Pause after every live chart page fetch.
pub const DEFAULT_PAGE_DELAY: Duration = Duration::from_millis(1500);

/// Outcome of one week of a run.
#[derive(Debug)]
pub struct UnitReport {
    /// The week processed.
    pub unit: Unit,
    /// Last state reached.
    pub state: UnitState,
    /// Entries scraped or reused from the week cache.
    pub entries: usize,
    /// Rows actually inserted by the store.
    pub inserted: usize,
    /// Error that stopped the unit or followed its persistence.
    pub error: Option<ChartError>,
}

impl UnitReport {
    fn new(unit: Unit) -> Self {
        Self {
            unit,
            state: UnitState::Pending,
            entries: 0,
            inserted: 0,
            error: None,
        }
    }

    /// Returns true when an error was recorded for this unit.
    #[must_use]
    pub const fn is_failed(&self) -> bool {
        self.error.is_some()
    }
}

/// Outcome of [`ChartUpdater::run`].
#[derive(Debug)]
pub struct RunReport {
    /// Year updated.
    pub year: i32,
    /// Last week persisted before the run.
    pub last_week: u32,
    /// Requested final week.
    pub target_week: u32,
    /// One report per processed week, ascending.
    pub units: Vec<UnitReport>,
}

impl RunReport {
    /// Returns true when no week needed processing.
    #[must_use]
    pub fn is_up_to_date(&self) -> bool {
        self.units.is_empty()
    }

    /// Weeks whose rows reached the store.
    #[must_use]
    pub fn persisted(&self) -> usize {
        self.count(|unit| unit.state == UnitState::Persisted)
    }

    /// Weeks with an empty scrape.
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.count(|unit| unit.state == UnitState::Skipped)
    }

    /// Weeks with a recorded error.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.count(UnitReport::is_failed)
    }

    /// Weeks that stopped before being persisted or skipped.
    #[must_use]
    pub fn incomplete(&self) -> usize {
        self.count(|unit| !unit.state.is_terminal())
    }

    /// Rows inserted over the whole run.
    #[must_use]
    pub fn rows_inserted(&self) -> usize {
        self.units.iter().map(|unit| unit.inserted).sum()
    }

    fn count(&self, predicate: impl Fn(&UnitReport) -> bool) -> usize {
        self.units.iter().filter(|unit| predicate(unit)).count()
    }
}

/// Outcome of [`ChartUpdater::backfill`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BackfillReport {
    /// Year backfilled.
    pub year: i32,
    /// Stored rows without a first producer.
    pub pending: usize,
    /// Rows whose enrichment columns were rewritten.
    pub enriched: usize,
    /// Rows for which no metadata was found.
    pub unresolved: usize,
    /// Rows the store failed to update.
    pub failed: usize,
}

/// Rows enriched between two progress logs and song cache flushes.
const BACKFILL_PROGRESS_EVERY: usize = 100;

/// Brings a year of chart rows up to a target week.
///
/// Weeks are processed one at a time in ascending order: scrape (or reuse the
/// week cache), enrich every entry in page order, insert the rows, flush both
/// caches. A failing week is reported and the run moves on.
pub struct ChartUpdater {
    source: Arc<dyn ChartSource>,
    enricher: Enricher,
    week_cache: Arc<dyn WeekCache>,
    store: Arc<dyn ChartStore>,
    page_delay: Duration,
}

impl fmt::Debug for ChartUpdater {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChartUpdater")
            .field("source", &self.source.name())
            .field("enricher", &self.enricher)
            .field("page_delay", &self.page_delay)
            .finish_non_exhaustive()
    }
}

impl ChartUpdater {
    /// Create an updater from its collaborators.
    #[must_use]
    pub fn new(
        source: Arc<dyn ChartSource>,
        enricher: Enricher,
        week_cache: Arc<dyn WeekCache>,
        store: Arc<dyn ChartStore>,
    ) -> Self {
        Self {
            source,
            enricher,
            week_cache,
            store,
            page_delay: DEFAULT_PAGE_DELAY,
        }
    }

    /// Set the pause after live page fetches and after live provider lookups.
    #[must_use]
    pub fn with_delays(mut self, page_delay: Duration, api_delay: Duration) -> Self {
        self.page_delay = page_delay;
        self.enricher = self.enricher.with_api_delay(api_delay);
        self
    }

    /// The enricher used for every entry.
    #[must_use]
    pub const fn enricher(&self) -> &Enricher {
        &self.enricher
    }

    /// Process every week after the last persisted one, up to `target_week`.
    ///
    /// Never fails. A store that cannot report its last week is treated as
    /// empty, which is safe because conflicting inserts are ignored.
    #[instrument(skip(self))]
    pub async fn run(&self, year: i32, target_week: u32) -> RunReport {
        let target_week = if target_week > MAX_WEEK {
            warn!(target_week, "Target week clamped to {MAX_WEEK}");
            MAX_WEEK
        } else {
            target_week
        };

        let last_week = match self.store.last_week(year).await {
            Ok(last) => last,
            Err(e) => {
                error!(error = %e, "Could not read last persisted week, starting from week 1");
                0
            }
        };

        let mut report = RunReport {
            year,
            last_week,
            target_week,
            units: Vec::new(),
        };

        if last_week >= target_week {
            info!(last_week, "Chart data is up to date");
            return report;
        }

        info!(
            from = last_week + 1,
            to = target_week,
            source = self.source.name(),
            "Updating chart weeks"
        );

        for week in (last_week + 1)..=target_week {
            let unit = match Unit::new(year, week) {
                Ok(unit) => unit,
                Err(e) => {
                    error!(week, error = %e, "Invalid unit");
                    continue;
                }
            };
            report.units.push(self.process_unit(unit).await);
        }

        self.flush_caches().await;

        let stats = self.enricher.cache().stats();
        info!(
            hits = stats.hits,
            misses = stats.misses,
            api_calls = stats.api_calls,
            hit_rate = stats.hit_rate(),
            cached_songs = self.enricher.cache().len(),
            "Song cache statistics"
        );
        info!(
            persisted = report.persisted(),
            skipped = report.skipped(),
            failed = report.failed(),
            incomplete = report.incomplete(),
            rows = report.rows_inserted(),
            "Update finished"
        );

        report
    }

    /// Enrich the stored rows of a year that have no first producer yet.
    ///
    /// Each pending row goes through the enricher, so cached songs cost no
    /// lookup. Rows resolved to an absent record are left untouched. A row the
    /// store fails to update is counted and the backfill moves on.
    ///
    /// # Errors
    /// Returns an error if the stored rows cannot be read.
    #[instrument(skip(self))]
    pub async fn backfill(&self, year: i32) -> Result<BackfillReport> {
        let pending: Vec<ChartRow> = self
            .store
            .rows_for_year(year)
            .await?
            .into_iter()
            .filter(ChartRow::needs_enrichment)
            .collect();

        let mut report = BackfillReport {
            year,
            pending: pending.len(),
            ..BackfillReport::default()
        };
        if pending.is_empty() {
            info!("Every stored row is already enriched");
            return Ok(report);
        }
        info!(pending = report.pending, "Enriching stored rows");

        for (done, row) in pending.iter().enumerate() {
            let record = self.enricher.song_details(&row.titre, &row.artiste).await;
            if record.is_absent() {
                report.unresolved += 1;
            } else {
                match self
                    .store
                    .update_enrichment(year, row.semaine, row.classement, &record)
                    .await
                {
                    Ok(true) => report.enriched += 1,
                    Ok(false) => {
                        warn!(week = row.semaine, rank = row.classement, "Row disappeared before update");
                        report.failed += 1;
                    }
                    Err(e) => {
                        error!(week = row.semaine, rank = row.classement, error = %e, "Failed to update row");
                        report.failed += 1;
                    }
                }
            }

            if (done + 1) % BACKFILL_PROGRESS_EVERY == 0 {
                info!(done = done + 1, pending = report.pending, "Backfill progress");
                if let Err(e) = self.enricher.cache().flush().await {
                    warn!(error = %e, "Failed to flush song cache");
                }
            }
        }

        if let Err(e) = self.enricher.cache().flush().await {
            warn!(error = %e, "Failed to flush song cache");
        }
        info!(
            enriched = report.enriched,
            unresolved = report.unresolved,
            failed = report.failed,
            "Backfill finished"
        );
        Ok(report)
    }

    async fn process_unit(&self, unit: Unit) -> UnitReport {
        let mut report = UnitReport::new(unit);

        let entries = self.scrape(unit).await;
        if entries.is_empty() {
            warn!(%unit, "No entries for week, skipping");
            report.state = UnitState::Skipped;
            return report;
        }
        report.state = UnitState::Scraped;
        report.entries = entries.len();

        let mut rows = Vec::with_capacity(entries.len());
        for entry in entries {
            let record = self
                .enricher
                .song_details(&entry.title, entry.artists.primary())
                .await;
            rows.push(ChartRow::merge(entry, record));
        }
        report.state = UnitState::Enriched;

        match self.store.insert_rows(unit.year(), &rows).await {
            Ok(inserted) => {
                report.inserted = inserted;
                report.state = UnitState::Persisted;
                info!(%unit, entries = report.entries, inserted, "Week persisted");
            }
            Err(e) => {
                error!(%unit, error = %e, "Failed to persist week");
                report.error = Some(e);
                return report;
            }
        }

        if let Err(e) = self.enricher.cache().flush().await {
            warn!(%unit, error = %e, "Failed to flush song cache");
            report.error = Some(e);
        }
        if let Err(e) = self.week_cache.flush().await {
            warn!(%unit, error = %e, "Failed to flush week cache");
            report.error = Some(e);
        }

        report
    }

    /// Entries of a unit, from the week cache or a live fetch.
    async fn scrape(&self, unit: Unit) -> Vec<ChartEntry> {
        if let Some(entries) = self.week_cache.get(unit).await {
            debug!(%unit, count = entries.len(), "Week cache hit");
            return entries;
        }

        let entries = self.source.scrape_week(unit).await;
        if !entries.is_empty() {
            if let Err(e) = self.week_cache.put(unit, &entries).await {
                warn!(%unit, error = %e, "Failed to cache week");
            }
        }
        tokio::time::sleep(self.page_delay).await;
        entries
    }

    async fn flush_caches(&self) {
        if let Err(e) = self.enricher.cache().flush().await {
            warn!(error = %e, "Failed to flush song cache");
        }
        if let Err(e) = self.week_cache.flush().await {
            warn!(error = %e, "Failed to flush week cache");
        }
    }
}
