//! Loading observation datasets from files.
//!
//! # Supported Formats
//!
//! - **Two-column CSV**: `x,t` per line, optional header line, `#` comments
//!
//! # Example
//!
//! ```ignore
//! use nutsreg::data::load_csv;
//! use std::path::Path;
//!
//! let dataset = load_csv(Path::new("observations.csv"))?;
//! println!("Loaded {} observations", dataset.len());
//! ```

mod csv;

pub use csv::{load_csv, parse_csv};

use std::fmt;

/// Errors that can occur during data loading.
#[derive(Debug)]
pub enum DataError {
    /// IO error reading file.
    Io(std::io::Error),

    /// CSV parse error at a specific line.
    Parse {
        /// Line number where the error occurred (1-indexed).
        line: usize,
        /// Description of the parse error.
        message: String,
    },

    /// A field that should hold a number does not.
    InvalidValue {
        /// Line number where the invalid value was found (1-indexed).
        line: usize,
        /// The invalid value string.
        value: String,
    },

    /// The parsed columns do not form a valid dataset.
    Dataset(nutsreg_core::Error),
}

impl fmt::Display for DataError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataError::Io(e) => write!(f, "IO error: {}", e),
            DataError::Parse { line, message } => {
                write!(f, "Parse error at line {}: {}", line, message)
            }
            DataError::InvalidValue { line, value } => {
                write!(f, "Invalid numeric value at line {}: '{}'", line, value)
            }
            DataError::Dataset(e) => write!(f, "Invalid dataset: {}", e),
        }
    }
}

impl std::error::Error for DataError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DataError::Io(e) => Some(e),
            DataError::Dataset(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for DataError {
    fn from(e: std::io::Error) -> Self {
        DataError::Io(e)
    }
}

impl From<nutsreg_core::Error> for DataError {
    fn from(e: nutsreg_core::Error) -> Self {
        DataError::Dataset(e)
    }
}
