//! Remote dataset download and table parsing.
//!
//! The source is a semicolon-delimited text table with a fixed 12-column
//! header (11 features plus `quality`). Fetch or parse failures are returned
//! to the caller, which is expected to fall back to synthetic data rather
//! than abort training.

use thiserror::Error;

use super::RawDataset;
use crate::http_client;
use crate::schema::{FIELDS, QUALITY_COLUMN};

/// Default location of the red-wine quality table.
pub const DEFAULT_DATASET_URL: &str =
    "https://archive.ics.uci.edu/ml/machine-learning-databases/wine-quality/winequality-red.csv";

/// Upper bound on the downloaded table size. The real file is ~85 KiB.
const MAX_DATASET_BYTES: usize = 8 * 1024 * 1024;

const DELIMITER: char = ';';

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Invalid dataset URL {url}: {source}")]
    InvalidUrl {
        url: String,
        source: url::ParseError,
    },
    #[error("Request to {url} failed: {message}")]
    Request { url: String, message: String },
    #[error("Failed to read response body: {0}")]
    Read(#[from] std::io::Error),
    #[error("Response was not valid UTF-8")]
    NotUtf8,
    #[error("Dataset table is empty")]
    EmptyTable,
    #[error("Unexpected header column {index}: expected {expected:?}, got {found:?}")]
    HeaderMismatch {
        index: usize,
        expected: String,
        found: String,
    },
    #[error("Header has {found} columns, expected {expected}")]
    HeaderLength { expected: usize, found: usize },
    #[error("Row {line}: expected {expected} columns, got {found}")]
    RowLength {
        line: usize,
        expected: usize,
        found: usize,
    },
    #[error("Row {line}: invalid numeric value {value:?}")]
    BadValue { line: usize, value: String },
}

/// Download and parse the dataset table.
pub fn fetch_dataset(url: &str) -> Result<RawDataset, FetchError> {
    let parsed = url::Url::parse(url).map_err(|source| FetchError::InvalidUrl {
        url: url.to_string(),
        source,
    })?;
    let response = http_client::agent()
        .get(parsed.as_str())
        .call()
        .map_err(|err| FetchError::Request {
            url: url.to_string(),
            message: err.to_string(),
        })?;
    let bytes = http_client::read_response_bytes(response, MAX_DATASET_BYTES)?;
    let text = String::from_utf8(bytes).map_err(|_| FetchError::NotUtf8)?;
    parse_table(&text)
}

/// Parse a semicolon-delimited table into feature rows and quality scores.
///
/// The header must list the 11 feature columns in schema order followed by
/// `quality`. Column names may be quoted, as in the published file.
pub fn parse_table(text: &str) -> Result<RawDataset, FetchError> {
    let mut lines = text.lines().enumerate().filter(|(_, line)| !line.trim().is_empty());
    let Some((_, header)) = lines.next() else {
        return Err(FetchError::EmptyTable);
    };
    check_header(header)?;

    let expected_columns = FIELDS.len() + 1;
    let mut x = Vec::new();
    let mut quality = Vec::new();
    for (idx, line) in lines {
        let cells: Vec<&str> = line.split(DELIMITER).collect();
        if cells.len() != expected_columns {
            return Err(FetchError::RowLength {
                line: idx + 1,
                expected: expected_columns,
                found: cells.len(),
            });
        }
        let mut row = Vec::with_capacity(FIELDS.len());
        for cell in &cells[..FIELDS.len()] {
            row.push(parse_value(cell, idx + 1)?);
        }
        let raw_quality = parse_value(cells[FIELDS.len()], idx + 1)?;
        x.push(row);
        quality.push(raw_quality.round() as u8);
    }

    if x.is_empty() {
        return Err(FetchError::EmptyTable);
    }
    Ok(RawDataset { x, quality })
}

fn check_header(header: &str) -> Result<(), FetchError> {
    let cells: Vec<String> = header
        .split(DELIMITER)
        .map(|cell| unquote(cell).to_string())
        .collect();
    let expected_columns = FIELDS.len() + 1;
    if cells.len() != expected_columns {
        return Err(FetchError::HeaderLength {
            expected: expected_columns,
            found: cells.len(),
        });
    }
    for (index, field) in FIELDS.iter().enumerate() {
        if cells[index] != field.name {
            return Err(FetchError::HeaderMismatch {
                index,
                expected: field.name.to_string(),
                found: cells[index].clone(),
            });
        }
    }
    if cells[FIELDS.len()] != QUALITY_COLUMN {
        return Err(FetchError::HeaderMismatch {
            index: FIELDS.len(),
            expected: QUALITY_COLUMN.to_string(),
            found: cells[FIELDS.len()].clone(),
        });
    }
    Ok(())
}

fn parse_value(cell: &str, line: usize) -> Result<f32, FetchError> {
    unquote(cell)
        .parse::<f32>()
        .map_err(|_| FetchError::BadValue {
            line,
            value: cell.to_string(),
        })
}

fn unquote(cell: &str) -> &str {
    cell.trim().trim_matches('"')
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "\"fixed acidity\";\"volatile acidity\";\"citric acid\";\"residual sugar\";\"chlorides\";\"free sulfur dioxide\";\"total sulfur dioxide\";\"density\";\"pH\";\"sulphates\";\"alcohol\";\"quality\"";

    #[test]
    fn parses_quoted_header_and_rows() {
        let text = format!(
            "{HEADER}\n7.4;0.7;0;1.9;0.076;11;34;0.9978;3.51;0.56;9.4;5\n7.8;0.88;0;2.6;0.098;25;67;0.9968;3.2;0.68;9.8;7\n"
        );
        let dataset = parse_table(&text).unwrap();
        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.x[0].len(), 11);
        assert_eq!(dataset.x[0][0], 7.4);
        assert_eq!(dataset.quality, vec![5, 7]);
    }

    #[test]
    fn rejects_reordered_header() {
        let bad = HEADER.replacen("fixed acidity", "volatile acidity", 1);
        let text = format!("{bad}\n7.4;0.7;0;1.9;0.076;11;34;0.9978;3.51;0.56;9.4;5\n");
        let err = parse_table(&text).unwrap_err();
        assert!(matches!(err, FetchError::HeaderMismatch { index: 0, .. }));
    }

    #[test]
    fn rejects_short_row() {
        let text = format!("{HEADER}\n7.4;0.7;0\n");
        let err = parse_table(&text).unwrap_err();
        assert!(matches!(
            err,
            FetchError::RowLength {
                line: 2,
                expected: 12,
                found: 3
            }
        ));
    }

    #[test]
    fn rejects_non_numeric_cell() {
        let text = format!("{HEADER}\n7.4;0.7;zero;1.9;0.076;11;34;0.9978;3.51;0.56;9.4;5\n");
        let err = parse_table(&text).unwrap_err();
        assert!(matches!(err, FetchError::BadValue { line: 2, .. }));
    }

    #[test]
    fn rejects_empty_table() {
        assert!(matches!(parse_table(""), Err(FetchError::EmptyTable)));
        let header_only = format!("{HEADER}\n");
        assert!(matches!(
            parse_table(&header_only),
            Err(FetchError::EmptyTable)
        ));
    }
}
