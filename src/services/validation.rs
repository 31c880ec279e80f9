use crate::errors::ToolError;
use serde_json::Value;

/// Argument coercion shared by the step handlers. All failures are
/// `invalid_params` so they never reach the remote service.
#[derive(Clone)]
pub struct Validation;

impl Validation {
    pub fn new() -> Self {
        Self
    }

    pub fn ensure_string(
        &self,
        value: &Value,
        label: &str,
        trim: bool,
    ) -> Result<String, ToolError> {
        let text = match value {
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            _ => {
                return Err(ToolError::invalid_params(format!(
                    "{} must be a non-empty string",
                    label
                )))
            }
        };
        let normalized = text.trim();
        if normalized.is_empty() {
            return Err(ToolError::invalid_params(format!(
                "{} must be a non-empty string",
                label
            )));
        }
        Ok(if trim {
            normalized.to_string()
        } else {
            text
        })
    }

    pub fn ensure_optional_string(
        &self,
        value: Option<&Value>,
        label: &str,
        trim: bool,
    ) -> Result<Option<String>, ToolError> {
        match value {
            None => Ok(None),
            Some(val) if val.is_null() => Ok(None),
            Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
            Some(val) => self.ensure_string(val, label, trim).map(Some),
        }
    }

    pub fn ensure_optional_bool(
        &self,
        value: Option<&Value>,
        label: &str,
    ) -> Result<Option<bool>, ToolError> {
        match value {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Bool(b)) => Ok(Some(*b)),
            Some(Value::String(s)) => match s.trim().to_lowercase().as_str() {
                "true" | "1" => Ok(Some(true)),
                "false" | "0" | "" => Ok(Some(false)),
                _ => Err(ToolError::invalid_params(format!(
                    "{} must be a boolean",
                    label
                ))),
            },
            Some(_) => Err(ToolError::invalid_params(format!(
                "{} must be a boolean",
                label
            ))),
        }
    }

    /// Non-negative integer, accepting numeric strings the way form inputs
    /// tend to deliver them.
    pub fn ensure_optional_u64(
        &self,
        value: Option<&Value>,
        label: &str,
    ) -> Result<Option<u64>, ToolError> {
        let invalid = || {
            ToolError::invalid_params(format!("{} must be a non-negative integer", label))
        };
        match value {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Number(n)) => {
                if let Some(v) = n.as_u64() {
                    return Ok(Some(v));
                }
                match n.as_f64() {
                    Some(f) if f >= 0.0 && f.fract() == 0.0 => Ok(Some(f as u64)),
                    _ => Err(invalid()),
                }
            }
            Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
            Some(Value::String(s)) => s.trim().parse::<u64>().map(Some).map_err(|_| invalid()),
            Some(_) => Err(invalid()),
        }
    }

    /// Reads a list of key/value pairs. Accepts `[{key, value}]` (the form
    /// collection shape) or a plain object. Entries with an empty key are
    /// dropped; order is preserved so later duplicates can overwrite earlier
    /// ones.
    pub fn ensure_pairs(
        &self,
        value: Option<&Value>,
        label: &str,
    ) -> Result<Vec<(String, Value)>, ToolError> {
        let Some(value) = value else {
            return Ok(Vec::new());
        };
        match value {
            Value::Null => Ok(Vec::new()),
            Value::Object(map) => Ok(map
                .iter()
                .filter(|(k, _)| !k.trim().is_empty())
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect()),
            Value::Array(items) => {
                let mut out = Vec::with_capacity(items.len());
                for item in items {
                    let entry = item.as_object().ok_or_else(|| {
                        ToolError::invalid_params(format!(
                            "{} entries must be objects of the form {{\"key\": ..., \"value\": ...}}",
                            label
                        ))
                    })?;
                    let key = entry
                        .get("key")
                        .or_else(|| entry.get("name"))
                        .and_then(|v| v.as_str())
                        .unwrap_or("");
                    if key.is_empty() {
                        continue;
                    }
                    let value = entry.get("value").cloned().unwrap_or(Value::Null);
                    out.push((key.to_string(), value));
                }
                Ok(out)
            }
            _ => Err(ToolError::invalid_params(format!(
                "{} must be an array of key/value pairs or an object",
                label
            ))),
        }
    }

    /// Same as [`Validation::ensure_pairs`] but renders every value as a
    /// string, for query strings and headers.
    pub fn ensure_string_pairs(
        &self,
        value: Option<&Value>,
        label: &str,
    ) -> Result<Vec<(String, String)>, ToolError> {
        Ok(self
            .ensure_pairs(value, label)?
            .into_iter()
            .map(|(k, v)| (k, render_scalar(&v)))
            .collect())
    }
}

impl Default for Validation {
    fn default() -> Self {
        Self::new()
    }
}

pub fn render_scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn pairs_skip_empty_keys_and_keep_order() {
        let v = Validation::new();
        let pairs = v
            .ensure_pairs(
                Some(&json!([
                    {"key": "a", "value": "1"},
                    {"key": "", "value": "ignored"},
                    {"key": "a", "value": "2"}
                ])),
                "parameters",
            )
            .unwrap();
        assert_eq!(
            pairs,
            vec![
                ("a".to_string(), json!("1")),
                ("a".to_string(), json!("2"))
            ]
        );
    }

    #[test]
    fn pairs_reject_scalars() {
        let v = Validation::new();
        let err = v.ensure_pairs(Some(&json!("a=b")), "query").unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn optional_u64_accepts_numeric_strings() {
        let v = Validation::new();
        assert_eq!(
            v.ensure_optional_u64(Some(&json!("250")), "poll_delay_ms").unwrap(),
            Some(250)
        );
        assert_eq!(
            v.ensure_optional_u64(Some(&json!(3.0)), "poll_limit").unwrap(),
            Some(3)
        );
        assert!(v.ensure_optional_u64(Some(&json!(-1)), "poll_limit").is_err());
    }
}
