//! Advisory schema validation for logged responses.
//!
//! Validation is a side channel: its result is data attached to the usage
//! record, never a control signal. The write path invokes it and carries
//! on regardless of the outcome.

use serde_json::{Map, Value};

/// Validate a response payload against a declared JSON Schema.
///
/// Returns `None` if the payload conforms, or `Some(error_string)`
/// describing every violation. A schema that itself fails to compile is
/// reported through the same channel — the caller records it, nothing
/// more.
pub fn validate_response(
    schema: &Map<String, Value>,
    response: &Map<String, Value>,
) -> Option<String> {
    let schema_value = Value::Object(schema.clone());
    let validator = match jsonschema::validator_for(&schema_value) {
        Ok(v) => v,
        Err(e) => return Some(format!("invalid expected_output_schema: {e}")),
    };

    let instance = Value::Object(response.clone());
    let errors: Vec<String> = validator
        .iter_errors(&instance)
        .map(|e| format!("{}: {e}", e.instance_path()))
        .collect();

    if errors.is_empty() {
        None
    } else {
        Some(errors.join("; "))
    }
}
