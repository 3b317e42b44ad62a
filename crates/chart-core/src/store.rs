//! Persistence trait for enriched chart rows.

use async_trait::async_trait;

use crate::{
    error::Result,
    types::{ChartRow, EnrichmentRecord},
};

/// Relational store of chart rows, unique on `(annee, semaine, classement)`.
#[async_trait]
pub trait ChartStore: Send + Sync {
    /// Returns the highest persisted week of a year, 0 when the year is empty.
    async fn last_week(&self, year: i32) -> Result<u32>;

    /// Inserts rows into the year's table.
    ///
    /// A row conflicting on `(annee, semaine, classement)` is skipped, not an
    /// error. Returns the number of rows actually inserted.
    async fn insert_rows(&self, year: i32, rows: &[ChartRow]) -> Result<usize>;

    /// Returns every persisted row of a year, ordered by week then rank.
    async fn rows_for_year(&self, year: i32) -> Result<Vec<ChartRow>>;

    /// Overwrites the seven enrichment columns of the row at
    /// `(year, week, rank)`.
    ///
    /// Returns false when no such row exists.
    async fn update_enrichment(
        &self,
        year: i32,
        week: u32,
        rank: u32,
        record: &EnrichmentRecord,
    ) -> Result<bool>;
}
