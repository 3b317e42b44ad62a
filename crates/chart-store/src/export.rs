//! CSV export of persisted chart rows.

use chart_core::{ChartError, ChartRow, Result, SampleType};
use polars::prelude::*;
use std::fs::File;
use std::path::Path;
use tracing::{debug, instrument};

fn text_column(name: &str, rows: &[ChartRow], field: fn(&ChartRow) -> &str) -> Column {
    Column::new(name.into(), rows.iter().map(field).collect::<Vec<_>>())
}

fn optional_column(
    name: &str,
    rows: &[ChartRow],
    field: fn(&ChartRow) -> Option<&str>,
) -> Column {
    Column::new(name.into(), rows.iter().map(field).collect::<Vec<_>>())
}

/// Builds a `DataFrame` with one column per persisted field, in
/// [`ChartRow::COLUMNS`] order.
///
/// # Errors
/// Returns an error if polars rejects the columns.
pub fn rows_to_frame(rows: &[ChartRow]) -> Result<DataFrame> {
    DataFrame::new(vec![
        Column::new(
            "classement".into(),
            rows.iter().map(|r| r.classement).collect::<Vec<u32>>(),
        ),
        text_column("artiste", rows, |r| r.artiste.as_str()),
        text_column("artiste_2", rows, |r| r.artiste_2.as_str()),
        text_column("artiste_3", rows, |r| r.artiste_3.as_str()),
        text_column("artiste_4", rows, |r| r.artiste_4.as_str()),
        text_column("titre", rows, |r| r.titre.as_str()),
        text_column("editeur", rows, |r| r.editeur.as_str()),
        Column::new(
            "annee".into(),
            rows.iter().map(|r| r.annee).collect::<Vec<i32>>(),
        ),
        Column::new(
            "semaine".into(),
            rows.iter().map(|r| r.semaine).collect::<Vec<u32>>(),
        ),
        optional_column("producer_1", rows, |r| r.producer_1.as_deref()),
        optional_column("producer_2", rows, |r| r.producer_2.as_deref()),
        optional_column("writer_1", rows, |r| r.writer_1.as_deref()),
        optional_column("writer_2", rows, |r| r.writer_2.as_deref()),
        optional_column("release_date", rows, |r| r.release_date.as_deref()),
        optional_column("sample_type", rows, |r| {
            r.sample_type.as_ref().map(SampleType::as_str)
        }),
        optional_column("sample_from", rows, |r| r.sample_from.as_deref()),
    ])
    .map_err(|e| ChartError::Store(e.to_string()))
}

/// Writes rows as CSV with a header line. Returns the number of rows written.
///
/// # Errors
/// Returns an error if the file cannot be created or written.
#[instrument(skip(rows), fields(count = rows.len(), path = %path.as_ref().display()))]
pub fn write_csv(rows: &[ChartRow], path: impl AsRef<Path>) -> Result<usize> {
    let mut df = rows_to_frame(rows)?;
    let mut file = File::create(path.as_ref()).map_err(|e| ChartError::Store(e.to_string()))?;

    CsvWriter::new(&mut file)
        .include_header(true)
        .finish(&mut df)
        .map_err(|e| ChartError::Store(e.to_string()))?;

    debug!("Exported {} rows", df.height());
    Ok(df.height())
}
