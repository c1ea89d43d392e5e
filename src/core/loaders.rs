//! Loader for survey observation CSV files.
//!
//! Expected layout, one observation per row and no header by default:
//!
//! ```text
//! time, id, x, y, z
//! 2008,FEAT01,449850.6,75308.663,19.9
//! ```
//!
//! The `time` and `id` columns are typed as a whole: if every value parses as
//! an integer the column is integral, else if every value parses as a finite
//! float it is floating, otherwise it is text. Coordinates must be finite
//! numbers; a single bad row fails the whole file.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, StringRecord, Trim};
use log::debug;
use thiserror::Error;

use super::observation::{Observation, PointId, SurveyTime};
use crate::config::InputConfig;

/// Number of fields each row must carry.
const FIELD_COUNT: usize = 5;

/// Errors that can occur during file loading.
#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("IO error reading '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("malformed observation on line {line}: {reason}")]
    MalformedObservation { line: u64, reason: String },

    #[error("delimiter must be a single ASCII character, got {0:?}")]
    InvalidDelimiter(char),
}

/// Result type for loader operations.
pub type Result<T> = std::result::Result<T, LoaderError>;

/// Column typing inferred from every value in the column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnKind {
    Integer,
    Float,
    Text,
}

fn infer_kind<'a>(values: impl Iterator<Item = &'a str>) -> ColumnKind {
    let mut kind = ColumnKind::Integer;
    for value in values {
        if kind == ColumnKind::Integer && value.parse::<i64>().is_err() {
            kind = ColumnKind::Float;
        }
        if kind == ColumnKind::Float && !value.parse::<f64>().map_or(false, f64::is_finite) {
            return ColumnKind::Text;
        }
    }
    kind
}

/// Values of an inferred column, converted once the kind is known.
enum Typed {
    Integer(i64),
    Float(f64),
    Text(String),
}

fn convert(value: &str, kind: ColumnKind) -> Typed {
    // The kind was inferred over these same values, so the numeric parses hold.
    match kind {
        ColumnKind::Integer => value
            .parse()
            .map(Typed::Integer)
            .unwrap_or_else(|_| Typed::Text(value.to_string())),
        ColumnKind::Float => value
            .parse()
            .map(Typed::Float)
            .unwrap_or_else(|_| Typed::Text(value.to_string())),
        ColumnKind::Text => Typed::Text(value.to_string()),
    }
}

impl From<Typed> for SurveyTime {
    fn from(v: Typed) -> Self {
        match v {
            Typed::Integer(i) => SurveyTime::Integer(i),
            Typed::Float(f) => SurveyTime::Float(f),
            Typed::Text(s) => SurveyTime::Text(s),
        }
    }
}

impl From<Typed> for PointId {
    fn from(v: Typed) -> Self {
        match v {
            Typed::Integer(i) => PointId::Integer(i),
            Typed::Float(f) => PointId::Float(f),
            Typed::Text(s) => PointId::Text(s),
        }
    }
}

fn line_of(record: &StringRecord) -> u64 {
    record.position().map_or(0, |p| p.line())
}

fn parse_coordinate(record: &StringRecord, idx: usize, name: &str) -> Result<f64> {
    let raw = record.get(idx).unwrap_or_default();
    match raw.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(LoaderError::MalformedObservation {
            line: line_of(record),
            reason: format!("{} is not a finite number: {:?}", name, raw),
        }),
    }
}

/// Check field count and that time and id are present.
fn validate_shape(record: &StringRecord) -> Result<()> {
    if record.len() < FIELD_COUNT {
        return Err(LoaderError::MalformedObservation {
            line: line_of(record),
            reason: format!("expected {} fields, found {}", FIELD_COUNT, record.len()),
        });
    }
    for (idx, name) in [(0, "time"), (1, "id")] {
        if record.get(idx).map_or(true, str::is_empty) {
            return Err(LoaderError::MalformedObservation {
                line: line_of(record),
                reason: format!("{} field is empty", name),
            });
        }
    }
    Ok(())
}

/// Parse observations from any reader.
///
/// # Errors
///
/// Returns [`LoaderError::MalformedObservation`] for the first row with missing
/// fields or non-numeric coordinates. An input without rows is not an error.
pub fn parse_observations<R: Read>(reader: R, config: &InputConfig) -> Result<Vec<Observation>> {
    if !config.delimiter.is_ascii() {
        return Err(LoaderError::InvalidDelimiter(config.delimiter));
    }

    let mut reader = ReaderBuilder::new()
        .has_headers(config.has_headers)
        .delimiter(config.delimiter as u8)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(reader);

    let mut records = Vec::new();
    for result in reader.records() {
        let record = result?;
        // Blank lines come through as a single empty field
        if record.len() == 1 && record.get(0).map_or(false, str::is_empty) {
            continue;
        }
        validate_shape(&record)?;
        records.push(record);
    }

    let time_kind = infer_kind(records.iter().map(|r| &r[0]));
    let id_kind = infer_kind(records.iter().map(|r| &r[1]));
    debug!(
        "Parsed {} rows (time column: {:?}, id column: {:?})",
        records.len(),
        time_kind,
        id_kind
    );

    let mut observations = Vec::with_capacity(records.len());
    for record in &records {
        let x = parse_coordinate(record, 2, "x")?;
        let y = parse_coordinate(record, 3, "y")?;
        let z = parse_coordinate(record, 4, "z")?;

        observations.push(Observation {
            time: convert(&record[0], time_kind).into(),
            id: convert(&record[1], id_kind).into(),
            x,
            y,
            z,
        });
    }

    Ok(observations)
}

/// Load observations from a CSV file.
///
/// # Arguments
///
/// * `path` - Path to the survey CSV file
/// * `config` - Input configuration (header row, delimiter)
///
/// # Errors
///
/// Returns an error if the file cannot be read or any row is malformed.
pub fn load_observations_csv<P: AsRef<Path>>(
    path: P,
    config: &InputConfig,
) -> Result<Vec<Observation>> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| LoaderError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    parse_observations(BufReader::new(file), config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn parse(text: &str) -> Result<Vec<Observation>> {
        parse_observations(text.as_bytes(), &InputConfig::default())
    }

    #[test]
    fn test_parse_text_ids_and_integer_years() -> Result<()> {
        let obs = parse("2008,FEAT01,449850.6,75308.663,19.9\n2012,FEAT01,449851.0,75309.0,20.1\n")?;
        assert_eq!(obs.len(), 2);
        assert_eq!(obs[0].time, SurveyTime::Integer(2008));
        assert_eq!(obs[0].id, PointId::Text("FEAT01".to_string()));
        assert_eq!(obs[0].x, 449850.6);
        assert_eq!(obs[1].z, 20.1);
        Ok(())
    }

    #[test]
    fn test_column_kind_is_inferred_over_all_rows() -> Result<()> {
        // One text id turns the whole column into text
        let obs = parse("1,7,0,0,0\n2,7,1,1,1\n1,A,0,0,0\n")?;
        assert!(obs.iter().all(|o| matches!(o.id, PointId::Text(_))));

        let obs = parse("1,7,0,0,0\n2,7.5,1,1,1\n")?;
        assert_eq!(obs[0].id, PointId::Float(7.0));
        assert_eq!(obs[1].id, PointId::Float(7.5));

        let obs = parse("1,7,0,0,0\n")?;
        assert_eq!(obs[0].id, PointId::Integer(7));
        Ok(())
    }

    #[test]
    fn test_empty_input_is_not_an_error() -> Result<()> {
        assert!(parse("")?.is_empty());
        assert!(parse("\n\n")?.is_empty());
        Ok(())
    }

    #[test]
    fn test_non_numeric_coordinate_fails_batch() {
        let result = parse("2008,P1,1.0,2.0,3.0\n2012,P1,abc,2.0,3.0\n");
        match result {
            Err(LoaderError::MalformedObservation { line, reason }) => {
                assert_eq!(line, 2);
                assert!(reason.contains('x'));
            }
            other => panic!("Expected MalformedObservation, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_fields_fail_batch() {
        let result = parse("2008,P1,1.0,2.0\n");
        assert!(matches!(result, Err(LoaderError::MalformedObservation { line: 1, .. })));

        let result = parse("2008,,1.0,2.0,3.0\n");
        assert!(matches!(result, Err(LoaderError::MalformedObservation { .. })));
    }

    #[test]
    fn test_non_finite_coordinate_rejected() {
        let result = parse("2008,P1,nan,2.0,3.0\n");
        assert!(matches!(result, Err(LoaderError::MalformedObservation { .. })));
    }

    #[test]
    fn test_headers_and_delimiter_from_config() -> Result<()> {
        let config = InputConfig {
            has_headers: true,
            delimiter: ';',
        };
        let text = "time;id;x;y;z\n2008;P1;1.5;2.5;3.5\n";
        let obs = parse_observations(text.as_bytes(), &config)?;
        assert_eq!(obs.len(), 1);
        assert_eq!(obs[0].y, 2.5);
        Ok(())
    }

    #[test]
    fn test_load_observations_csv() -> Result<()> {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "2008, P1, 100.0, 200.0, 10.0").unwrap();
        writeln!(file, "2012, P1, 103.0, 204.0, 10.5").unwrap();
        file.flush().unwrap();

        let obs = load_observations_csv(file.path(), &InputConfig::default())?;
        assert_eq!(obs.len(), 2);
        assert_eq!(obs[1].time, SurveyTime::Integer(2012));
        assert_eq!(obs[1].id, PointId::Text("P1".to_string()));
        Ok(())
    }

    #[test]
    fn test_load_missing_file() {
        let result = load_observations_csv("/nonexistent/survey.csv", &InputConfig::default());
        assert!(matches!(result, Err(LoaderError::Io { .. })));
    }
}
