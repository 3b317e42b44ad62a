//! CSV import of chart rows written by [`write_csv`](crate::write_csv) or by
//! older yearly exports.

use chart_core::{ChartError, ChartRow, ChartStore, Result, SampleType};
use polars::prelude::*;
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info, instrument, warn};

/// Columns a file must carry. Enrichment columns and the extra artist slots
/// may be missing and read as empty.
const REQUIRED: [&str; 5] = ["classement", "artiste", "titre", "annee", "semaine"];

fn column<'a>(df: &'a DataFrame, name: &str) -> Result<Option<&'a StringChunked>> {
    match df.column(name) {
        Ok(column) => column
            .as_materialized_series()
            .str()
            .map(Some)
            .map_err(|e| ChartError::Parse(e.to_string())),
        Err(_) if REQUIRED.contains(&name) => {
            Err(ChartError::Parse(format!("missing column {name}")))
        }
        Err(_) => Ok(None),
    }
}

fn cell(column: Option<&StringChunked>, index: usize) -> Option<&str> {
    column
        .and_then(|values| values.get(index))
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

fn number<T: FromStr>(column: Option<&StringChunked>, index: usize, name: &str) -> Result<T> {
    cell(column, index)
        .and_then(|value| value.parse::<T>().ok())
        .ok_or_else(|| ChartError::Parse(format!("line {}: invalid {name}", index + 2)))
}

/// Reads a CSV file with a header line into chart rows.
///
/// Every column is read as text so that empty cells stay distinguishable from
/// zeros. Empty text cells become empty strings, empty enrichment cells become
/// `None` and an unknown `sample_type` is dropped.
///
/// # Errors
/// Returns an error if the file cannot be read, a required column is missing
/// or a rank, year or week cell is not a number.
#[instrument(fields(path = %path.as_ref().display()))]
pub fn read_csv(path: impl AsRef<Path>) -> Result<Vec<ChartRow>> {
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .try_into_reader_with_file_path(Some(path.as_ref().to_path_buf()))
        .map_err(|e| ChartError::Store(e.to_string()))?
        .finish()
        .map_err(|e| ChartError::Parse(e.to_string()))?;

    for name in REQUIRED {
        column(&df, name)?;
    }

    let [
        classement,
        artiste,
        artiste_2,
        artiste_3,
        artiste_4,
        titre,
        editeur,
        annee,
        semaine,
        producer_1,
        producer_2,
        writer_1,
        writer_2,
        release_date,
        sample_type,
        sample_from,
    ] = ChartRow::COLUMNS;

    let text = |name: &str, index: usize| -> Result<String> {
        Ok(cell(column(&df, name)?, index).unwrap_or_default().to_string())
    };
    let optional = |name: &str, index: usize| -> Result<Option<String>> {
        Ok(cell(column(&df, name)?, index).map(str::to_string))
    };

    let mut rows = Vec::with_capacity(df.height());
    for index in 0..df.height() {
        rows.push(ChartRow {
            classement: number(column(&df, classement)?, index, classement)?,
            artiste: text(artiste, index)?,
            artiste_2: text(artiste_2, index)?,
            artiste_3: text(artiste_3, index)?,
            artiste_4: text(artiste_4, index)?,
            titre: text(titre, index)?,
            editeur: text(editeur, index)?,
            annee: number(column(&df, annee)?, index, annee)?,
            semaine: number(column(&df, semaine)?, index, semaine)?,
            producer_1: optional(producer_1, index)?,
            producer_2: optional(producer_2, index)?,
            writer_1: optional(writer_1, index)?,
            writer_2: optional(writer_2, index)?,
            release_date: optional(release_date, index)?,
            sample_type: optional(sample_type, index)?
                .and_then(|kind| kind.parse::<SampleType>().ok()),
            sample_from: optional(sample_from, index)?,
        });
    }

    debug!("Read {} rows", rows.len());
    Ok(rows)
}

/// Loads a yearly CSV file into the store.
///
/// Rows of another year are left out. Rows already stored are skipped by the
/// store, so importing the same file twice inserts nothing the second time.
/// Returns the number of rows inserted.
///
/// # Errors
/// Returns an error if the file cannot be read or the store rejects the rows.
pub async fn import_csv(store: &dyn ChartStore, year: i32, path: impl AsRef<Path>) -> Result<usize> {
    let path = path.as_ref();
    let (rows, other_years): (Vec<ChartRow>, Vec<ChartRow>) = read_csv(path)?
        .into_iter()
        .partition(|row| row.annee == year);
    if !other_years.is_empty() {
        warn!(year, count = other_years.len(), "Ignoring rows of another year");
    }

    let inserted = store.insert_rows(year, &rows).await?;
    info!(
        year,
        read = rows.len(),
        inserted,
        path = %path.display(),
        "Imported chart rows"
    );
    Ok(inserted)
}
