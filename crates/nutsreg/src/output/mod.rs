//! Output formatting for inference reports.

mod json;
mod terminal;

pub use json::{to_json, to_json_pretty};
pub use terminal::{format_parameter_table, format_predictive_table, format_report};
