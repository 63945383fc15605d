//! JSON serialization for inference reports.

use crate::engine::InferenceReport;

/// Serialize a report to a compact JSON string.
///
/// # Errors
///
/// Returns an error if serialization fails. Non-finite floats are written
/// as `null` rather than failing.
pub fn to_json(report: &InferenceReport) -> Result<String, serde_json::Error> {
    serde_json::to_string(report)
}

/// Serialize a report to a pretty-printed JSON string.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn to_json_pretty(report: &InferenceReport) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(report)
}
