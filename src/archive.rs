use std::collections::BTreeMap;
use chrono::NaiveDate;
use serde::Serialize;
use tokio::fs::write;

/// Writes an imported batch to the archive directory, partitioned by
/// business date.
///
/// Each date in the batch becomes one file named `<source>-<date>.json`;
/// re-importing a date overwrites its file. Returns the number of files
/// written.
///
/// # Arguments
///
/// * 'data_dir' - directory to store data in
/// * 'source' - prefix to identify the source series
/// * 'rows' - rows to store
/// * 'date_of' - maps a row to its business date
pub async fn store_batches<T, F>(
    data_dir: &str,
    source: &str,
    rows: &[T],
    date_of: F,
) -> Result<usize, std::io::Error>
where
    T: Serialize,
    F: Fn(&T) -> NaiveDate,
{
    let mut by_date: BTreeMap<NaiveDate, Vec<&T>> = BTreeMap::new();
    for row in rows {
        by_date.entry(date_of(row)).or_default().push(row);
    }

    let written = by_date.len();
    for (date, day_rows) in by_date {
        let path = format!("{}/{}-{}.json", data_dir, source, date.format("%Y-%m-%d"));
        let json = serde_json::to_string(&day_rows)?;
        write(path, json).await?;
    }

    Ok(written)
}
