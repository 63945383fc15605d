//! CSV parsing for `(x, t)` observation files.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use nutsreg_core::Dataset;

use super::DataError;

/// Load a dataset from a two-column `x,t` CSV file.
///
/// The first non-empty line is treated as a header if its first field is not
/// a number. Empty lines and lines starting with `#` are skipped; columns
/// beyond the second are ignored.
///
/// # Example file content
/// ```csv
/// x,t
/// 0.0,0.12
/// 0.1,0.71
/// 0.2,0.93
/// ```
///
/// # Errors
/// Returns `DataError` if the file cannot be read, a value cannot be parsed,
/// or the result is not a valid dataset (e.g. no rows, non-finite values).
pub fn load_csv(path: &Path) -> Result<Dataset, DataError> {
    let file = File::open(path)?;
    parse_csv(BufReader::new(file))
}

/// Parse `x,t` rows from any buffered reader. See [`load_csv`].
pub fn parse_csv<R: BufRead>(reader: R) -> Result<Dataset, DataError> {
    let mut x = Vec::new();
    let mut t = Vec::new();
    let mut seen_content = false;

    for (line_num, line_result) in reader.lines().enumerate() {
        let line = line_result?;
        let line = line.trim();

        // Skip empty lines and comments
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let parts: Vec<&str> = line.split(',').map(str::trim).collect();
        if parts.len() < 2 {
            return Err(DataError::Parse {
                line: line_num + 1,
                message: format!("Expected 2 columns, got {}", parts.len()),
            });
        }

        let first = !seen_content;
        seen_content = true;
        if first && parts[0].parse::<f64>().is_err() {
            continue;
        }

        x.push(parse_value(parts[0], line_num + 1)?);
        t.push(parse_value(parts[1], line_num + 1)?);
    }

    Ok(Dataset::new(x, t)?)
}

fn parse_value(field: &str, line: usize) -> Result<f64, DataError> {
    field.parse().map_err(|_| DataError::InvalidValue {
        line,
        value: field.to_string(),
    })
}
