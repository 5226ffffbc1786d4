//! JSON Schema of the report formats

use crate::report::SuiteReport;

/// JSON Schema for [`SuiteReport`], pretty-printed.
///
/// # Errors
///
/// Returns error if the schema cannot be serialized.
pub fn generate_schema() -> Result<String, serde_json::Error> {
    let schema = schemars::schema_for!(SuiteReport);
    serde_json::to_string_pretty(&schema)
}
