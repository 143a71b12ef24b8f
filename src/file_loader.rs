use std::fmt;
use std::fmt::Formatter;
use chrono::NaiveDateTime;
use csv::ReaderBuilder;
use crate::models::GenerationRecord;

const TIMESTAMP_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];

#[derive(Debug)]
pub struct UploadError(pub String);
impl fmt::Display for UploadError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "UploadError: {}", self.0)
    }
}
impl From<csv::Error> for UploadError {
    fn from(e: csv::Error) -> Self { UploadError(e.to_string()) }
}

/// Parses an uploaded generation file into records.
///
/// Supported formats are comma separated `.csv` and tab separated `.txt`,
/// both headerless with two columns: timestamp and produced energy.
///
/// # Arguments
///
/// * 'filename' - name of the uploaded file, used to pick the delimiter
/// * 'content' - raw file content
pub fn load_generation_file(
    filename: &str,
    content: &[u8],
) -> Result<Vec<GenerationRecord>, UploadError> {
    let lower = filename.to_lowercase();
    let delimiter = if lower.ends_with(".csv") {
        b','
    } else if lower.ends_with(".txt") {
        b'\t'
    } else {
        return Err(UploadError("unsupported file format".to_string()));
    };

    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .delimiter(delimiter)
        .trim(csv::Trim::All)
        .from_reader(content);

    let mut rows = Vec::new();
    for (line, result) in rdr.records().enumerate() {
        let record = result?;
        if record.is_empty() || (record.len() == 1 && record.get(0) == Some("")) {
            continue;
        }
        if record.len() < 2 {
            return Err(UploadError(format!(
                "line {}: expected 2 columns, found {}",
                line + 1,
                record.len()
            )));
        }

        let timestamp = record.get(0).unwrap_or("");
        let plan_dtime = parse_timestamp(timestamp).ok_or_else(|| {
            UploadError(format!("line {}: invalid timestamp '{}'", line + 1, timestamp))
        })?;

        let value = record.get(1).unwrap_or("");
        let fcst_pv_tot_gen: f64 = value.parse().map_err(|_| {
            UploadError(format!("line {}: invalid value '{}'", line + 1, value))
        })?;

        rows.push(GenerationRecord { plan_dtime, fcst_pv_tot_gen });
    }

    Ok(rows)
}

fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(value, f).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn parses_comma_separated_csv() {
        let content = b"2024-06-01 10:00:00,12.5\n2024-06-01 11:00:00,14.0\n";
        let rows = load_generation_file("Upload.CSV", content).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(
            rows[0].plan_dtime,
            NaiveDate::from_ymd_opt(2024, 6, 1)
                .unwrap()
                .and_hms_opt(10, 0, 0)
                .unwrap()
        );
        assert_eq!(rows[1].fcst_pv_tot_gen, 14.0);
    }

    #[test]
    fn parses_tab_separated_txt() {
        let content = b"2024-06-01T10:00:00\t12.5\n";
        let rows = load_generation_file("dump.txt", content).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].fcst_pv_tot_gen, 12.5);
    }

    #[test]
    fn rejects_unsupported_extension() {
        let err = load_generation_file("data.xlsx", b"").unwrap_err();
        assert!(err.to_string().contains("unsupported file format"));
    }

    #[test]
    fn rejects_invalid_timestamp() {
        let err = load_generation_file("data.csv", b"not-a-date,1.0\n").unwrap_err();
        assert!(err.to_string().contains("invalid timestamp"));
    }

    #[test]
    fn rejects_invalid_value() {
        let err = load_generation_file("data.csv", b"2024-06-01 10:00:00,abc\n").unwrap_err();
        assert!(err.to_string().contains("invalid value"));
    }
}
