use crate::errors::ToolError;
use crate::utils::suggest::closest_matches;

fn with_known(mut err: ToolError, given: &str, known: &[&str]) -> ToolError {
    let suggestions = closest_matches(given, known, 3);
    let mut hint = format!("Use one of: {}.", known.join(", "));
    if !suggestions.is_empty() {
        hint = format!("Did you mean: {}? {}", suggestions.join(", "), hint);
    }
    err = err.with_hint(hint).with_details(serde_json::json!({
        "known": known,
        "did_you_mean": suggestions,
    }));
    err
}

pub fn unsupported_operation_error(resource: &str, operation: &str, known: &[&str]) -> ToolError {
    with_known(
        ToolError::invalid_params(format!(
            "Unsupported operation '{}' for resource '{}'",
            operation, resource
        )),
        operation,
        known,
    )
}

pub fn unsupported_resource_error(resource: &str, known: &[&str]) -> ToolError {
    with_known(
        ToolError::invalid_params(format!("Unsupported resource '{}'", resource)),
        resource,
        known,
    )
}
