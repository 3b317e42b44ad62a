//! In-memory store implementation.

use async_trait::async_trait;
use chart_core::{ChartRow, ChartStore, EnrichmentRecord, Result};
use std::collections::BTreeMap;
use tokio::sync::RwLock;
use tracing::debug;

/// Rows of one year keyed by `(annee, semaine, classement)`.
type YearTable = BTreeMap<(i32, u32, u32), ChartRow>;

/// Simple in-memory store for testing and development.
///
/// Follows the same conflict rule as the SQLite store: the first row stored
/// for a `(annee, semaine, classement)` triple wins.
#[derive(Debug, Default)]
pub struct InMemoryChartStore {
    tables: RwLock<BTreeMap<i32, YearTable>>,
}

impl InMemoryChartStore {
    /// Create a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ChartStore for InMemoryChartStore {
    async fn last_week(&self, year: i32) -> Result<u32> {
        let tables = self.tables.read().await;
        Ok(tables
            .get(&year)
            .and_then(|table| table.values().map(|row| row.semaine).max())
            .unwrap_or(0))
    }

    async fn insert_rows(&self, year: i32, rows: &[ChartRow]) -> Result<usize> {
        let mut tables = self.tables.write().await;
        let table = tables.entry(year).or_default();

        let mut inserted = 0;
        for row in rows {
            let key = (row.annee, row.semaine, row.classement);
            if !table.contains_key(&key) {
                table.insert(key, row.clone());
                inserted += 1;
            }
        }
        debug!(year, inserted, "Stored chart rows in memory");
        Ok(inserted)
    }

    async fn rows_for_year(&self, year: i32) -> Result<Vec<ChartRow>> {
        let tables = self.tables.read().await;
        let mut rows: Vec<ChartRow> = tables
            .get(&year)
            .map(|table| table.values().cloned().collect())
            .unwrap_or_default();
        rows.sort_by_key(|row| (row.semaine, row.classement));
        Ok(rows)
    }

    async fn update_enrichment(
        &self,
        year: i32,
        week: u32,
        rank: u32,
        record: &EnrichmentRecord,
    ) -> Result<bool> {
        let mut tables = self.tables.write().await;
        match tables
            .get_mut(&year)
            .and_then(|table| table.get_mut(&(year, week, rank)))
        {
            Some(row) => {
                row.apply(record);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chart_core::{ChartEntry, Unit};

    fn row(week: u32, rank: u32, title: &str) -> ChartRow {
        ChartRow::unenriched(ChartEntry::new(Unit::new(2022, week).unwrap(), rank, title))
    }

    #[tokio::test]
    async fn test_memory_store_first_row_wins() {
        let store = InMemoryChartStore::new();
        assert_eq!(store.last_week(2022).await.unwrap(), 0);

        store
            .insert_rows(2022, &[row(2, 1, "A"), row(1, 1, "B")])
            .await
            .unwrap();
        let inserted = store.insert_rows(2022, &[row(2, 1, "C")]).await.unwrap();
        assert_eq!(inserted, 0);

        let rows = store.rows_for_year(2022).await.unwrap();
        assert_eq!(
            rows.iter().map(|r| r.titre.as_str()).collect::<Vec<_>>(),
            ["B", "A"]
        );
        assert_eq!(store.last_week(2022).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_memory_store_update_enrichment() {
        let store = InMemoryChartStore::new();
        store.insert_rows(2022, &[row(3, 1, "A")]).await.unwrap();

        let mut record = EnrichmentRecord::absent();
        record.producer_1 = Some("Ponko".to_string());

        assert!(store.update_enrichment(2022, 3, 1, &record).await.unwrap());
        assert!(!store.update_enrichment(2022, 3, 2, &record).await.unwrap());
        assert!(!store.update_enrichment(2023, 3, 1, &record).await.unwrap());

        let rows = store.rows_for_year(2022).await.unwrap();
        assert_eq!(rows[0].producer_1.as_deref(), Some("Ponko"));
    }
}
