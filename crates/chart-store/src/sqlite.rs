//! SQLite-based store implementation.

use async_trait::async_trait;
use chart_core::{ChartError, ChartRow, ChartStore, EnrichmentRecord, Result, SampleType};
use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, Row, params};
use std::path::Path;
use std::sync::Mutex;
use tracing::{debug, instrument, warn};

use crate::table_name;

/// SQLite-backed chart store, one `top_singles_<year>` table per year.
///
/// Tables are created on first insert. Inserting a row that conflicts on
/// `(annee, semaine, classement)` leaves the stored row untouched.
#[derive(Debug)]
pub struct SqliteChartStore {
    conn: Mutex<Connection>,
}

impl SqliteChartStore {
    /// Opens (or creates) the database at the given path.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened.
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path).map_err(|e| ChartError::Store(e.to_string()))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Creates an in-memory store.
    ///
    /// Useful for testing; data is lost when the store is dropped.
    ///
    /// # Errors
    /// Returns an error if the connection cannot be opened.
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|e| ChartError::Store(e.to_string()))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn create_table(conn: &Connection, year: i32) -> Result<()> {
        let table = table_name(year);
        conn.execute(
            &format!(
                "CREATE TABLE IF NOT EXISTS \"{table}\" (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    classement INTEGER NOT NULL,
                    artiste TEXT NOT NULL,
                    artiste_2 TEXT NOT NULL DEFAULT '',
                    artiste_3 TEXT NOT NULL DEFAULT '',
                    artiste_4 TEXT NOT NULL DEFAULT '',
                    titre TEXT NOT NULL,
                    editeur TEXT NOT NULL DEFAULT '',
                    annee INTEGER NOT NULL,
                    semaine INTEGER NOT NULL,
                    producer_1 TEXT,
                    producer_2 TEXT,
                    writer_1 TEXT,
                    writer_2 TEXT,
                    release_date TEXT,
                    sample_type TEXT,
                    sample_from TEXT,
                    created_at TEXT NOT NULL,
                    UNIQUE (annee, semaine, classement)
                )"
            ),
            [],
        )
        .map_err(|e| ChartError::Store(e.to_string()))?;
        Ok(())
    }

    fn table_exists(conn: &Connection, year: i32) -> Result<bool> {
        conn.query_row(
            "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1",
            params![table_name(year)],
            |_| Ok(()),
        )
        .optional()
        .map(|found| found.is_some())
        .map_err(|e| ChartError::Store(e.to_string()))
    }

    fn read_row(row: &Row<'_>) -> rusqlite::Result<ChartRow> {
        let sample_type: Option<String> = row.get(14)?;
        Ok(ChartRow {
            classement: row.get(0)?,
            artiste: row.get(1)?,
            artiste_2: row.get(2)?,
            artiste_3: row.get(3)?,
            artiste_4: row.get(4)?,
            titre: row.get(5)?,
            editeur: row.get(6)?,
            annee: row.get(7)?,
            semaine: row.get(8)?,
            producer_1: row.get(9)?,
            producer_2: row.get(10)?,
            writer_1: row.get(11)?,
            writer_2: row.get(12)?,
            release_date: row.get(13)?,
            sample_type: sample_type.and_then(|s| s.parse::<SampleType>().ok()),
            sample_from: row.get(15)?,
        })
    }
}

#[async_trait]
impl ChartStore for SqliteChartStore {
    #[instrument(skip(self))]
    async fn last_week(&self, year: i32) -> Result<u32> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| ChartError::Store(e.to_string()))?;

        if !Self::table_exists(&conn, year)? {
            debug!("No table for year yet");
            return Ok(0);
        }

        let last: u32 = conn
            .query_row(
                &format!(
                    "SELECT COALESCE(MAX(semaine), 0) FROM \"{}\"",
                    table_name(year)
                ),
                [],
                |row| row.get(0),
            )
            .map_err(|e| ChartError::Store(e.to_string()))?;

        debug!(last, "Last persisted week");
        Ok(last)
    }

    #[instrument(skip(self, rows), fields(count = rows.len()))]
    async fn insert_rows(&self, year: i32, rows: &[ChartRow]) -> Result<usize> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| ChartError::Store(e.to_string()))?;
        Self::create_table(&conn, year)?;

        let created_at = Utc::now().to_rfc3339();
        let tx = conn
            .unchecked_transaction()
            .map_err(|e| ChartError::Store(e.to_string()))?;

        let mut inserted = 0;
        {
            let mut stmt = tx
                .prepare(&format!(
                    "INSERT OR IGNORE INTO \"{}\"
                     (classement, artiste, artiste_2, artiste_3, artiste_4, titre, editeur,
                      annee, semaine, producer_1, producer_2, writer_1, writer_2,
                      release_date, sample_type, sample_from, created_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)",
                    table_name(year)
                ))
                .map_err(|e| ChartError::Store(e.to_string()))?;

            for row in rows {
                inserted += stmt
                    .execute(params![
                        row.classement,
                        row.artiste,
                        row.artiste_2,
                        row.artiste_3,
                        row.artiste_4,
                        row.titre,
                        row.editeur,
                        row.annee,
                        row.semaine,
                        row.producer_1,
                        row.producer_2,
                        row.writer_1,
                        row.writer_2,
                        row.release_date,
                        row.sample_type.map(|kind| kind.as_str()),
                        row.sample_from,
                        created_at,
                    ])
                    .map_err(|e| ChartError::Store(e.to_string()))?;
            }
        }

        tx.commit().map_err(|e| ChartError::Store(e.to_string()))?;

        if inserted < rows.len() {
            warn!(
                skipped = rows.len() - inserted,
                "Rows already present were left unchanged"
            );
        }
        debug!(inserted, "Inserted chart rows");
        Ok(inserted)
    }

    #[instrument(skip(self))]
    async fn rows_for_year(&self, year: i32) -> Result<Vec<ChartRow>> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| ChartError::Store(e.to_string()))?;

        if !Self::table_exists(&conn, year)? {
            return Ok(Vec::new());
        }

        let mut stmt = conn
            .prepare(&format!(
                "SELECT classement, artiste, artiste_2, artiste_3, artiste_4, titre, editeur,
                        annee, semaine, producer_1, producer_2, writer_1, writer_2,
                        release_date, sample_type, sample_from
                 FROM \"{}\"
                 ORDER BY semaine ASC, classement ASC",
                table_name(year)
            ))
            .map_err(|e| ChartError::Store(e.to_string()))?;

        let rows = stmt
            .query_map([], Self::read_row)
            .map_err(|e| ChartError::Store(e.to_string()))?;

        let mut result = Vec::new();
        for row in rows {
            result.push(row.map_err(|e| ChartError::Store(e.to_string()))?);
        }

        debug!("Found {} persisted rows", result.len());
        Ok(result)
    }

    #[instrument(skip(self, record))]
    async fn update_enrichment(
        &self,
        year: i32,
        week: u32,
        rank: u32,
        record: &EnrichmentRecord,
    ) -> Result<bool> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| ChartError::Store(e.to_string()))?;

        if !Self::table_exists(&conn, year)? {
            return Ok(false);
        }

        let updated = conn
            .execute(
                &format!(
                    "UPDATE \"{}\"
                     SET producer_1 = ?1, producer_2 = ?2, writer_1 = ?3, writer_2 = ?4,
                         release_date = ?5, sample_type = ?6, sample_from = ?7
                     WHERE annee = ?8 AND semaine = ?9 AND classement = ?10",
                    table_name(year)
                ),
                params![
                    record.producer_1,
                    record.producer_2,
                    record.writer_1,
                    record.writer_2,
                    record.release_date,
                    record.sample_type.map(|kind| kind.as_str()),
                    record.sample_from,
                    year,
                    week,
                    rank,
                ],
            )
            .map_err(|e| ChartError::Store(e.to_string()))?;

        debug!(updated, "Updated enrichment columns");
        Ok(updated > 0)
    }
}
