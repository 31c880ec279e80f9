//! Remote payload shapes. Parsing is lenient: listings that are missing or
//! not arrays read as empty, and malformed entries are skipped.

use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiParameter {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

impl ApiParameter {
    /// Only `name` is required. A non-string description reads as absent and
    /// the default is kept as whatever JSON the remote sent.
    fn from_value(value: &Value) -> Option<Self> {
        let name = value.get("name").and_then(|v| v.as_str())?.trim();
        if name.is_empty() {
            return None;
        }
        Some(Self {
            name: name.to_string(),
            description: value
                .get("description")
                .and_then(|v| v.as_str())
                .map(str::to_string),
            default: value.get("default").filter(|v| !v.is_null()).cloned(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ApiDefinition {
    pub name: String,
    pub parameters: Vec<ApiParameter>,
}

impl ApiDefinition {
    pub fn from_response(name: &str, response: &Value) -> Self {
        let parameters = response
            .get("parameters")
            .and_then(|v| v.as_array())
            .map(|items| {
                items
                    .iter()
                    .filter_map(ApiParameter::from_value)
                    .collect()
            })
            .unwrap_or_default();
        Self {
            name: name.to_string(),
            parameters,
        }
    }

    /// Parameter name → default (or `""`), in declaration order.
    pub fn template(&self) -> serde_json::Map<String, Value> {
        self.parameters
            .iter()
            .map(|p| {
                (
                    p.name.clone(),
                    p.default.clone().unwrap_or_else(|| Value::String(String::new())),
                )
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Target {
    pub id: String,
    pub name: String,
}

impl Target {
    fn from_value(value: &Value) -> Option<Self> {
        let id = id_to_string(value.get("id")?)?;
        let name = value
            .get("name")
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
            .map(|s| s.to_string())
            .unwrap_or_else(|| id.clone());
        Some(Self { id, name })
    }
}

pub fn parse_targets(response: &Value) -> Vec<Target> {
    response
        .as_array()
        .map(|items| items.iter().filter_map(Target::from_value).collect())
        .unwrap_or_default()
}

pub fn parse_api_names(response: &Value) -> Vec<String> {
    response
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.get("name").and_then(|v| v.as_str()))
                .filter(|s| !s.is_empty())
                .map(|s| s.to_string())
                .collect()
        })
        .unwrap_or_default()
}

/// Remote ids arrive as strings or numbers; both render as strings.
pub fn id_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn definition_skips_unnamed_parameters_and_null_defaults() {
        let def = ApiDefinition::from_response(
            "invoice",
            &json!({"parameters": [
                {"name": "customer", "description": "Customer id"},
                {"description": "no name"},
                {"name": "region", "default": null},
                {"name": "currency", "default": "EUR"}
            ]}),
        );
        let names: Vec<_> = def.parameters.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["customer", "region", "currency"]);
        assert_eq!(def.parameters[1].default, None);
        assert_eq!(
            Value::Object(def.template()),
            json!({"customer": "", "region": "", "currency": "EUR"})
        );
    }

    #[test]
    fn targets_accept_numeric_ids() {
        let targets = parse_targets(&json!([
            {"id": 7, "name": "SAP"},
            {"id": "abc"},
            {"name": "no id"}
        ]));
        assert_eq!(
            targets,
            vec![
                Target { id: "7".into(), name: "SAP".into() },
                Target { id: "abc".into(), name: "abc".into() },
            ]
        );
    }

    #[test]
    fn non_array_listings_are_empty() {
        assert!(parse_targets(&Value::Null).is_empty());
        assert!(parse_api_names(&json!({"error": "x"})).is_empty());
    }

    #[test]
    fn odd_descriptions_do_not_hide_parameters() {
        let def = ApiDefinition::from_response(
            "get_weather",
            &json!({"parameters": [
                {"name": "city", "description": 5},
                {"name": "units", "description": {"text": "x"}, "default": 0}
            ]}),
        );
        let names: Vec<_> = def.parameters.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["city", "units"]);
        assert_eq!(def.parameters[0].description, None);
        assert_eq!(def.parameters[1].default, Some(json!(0)));
    }
}
