use crate::errors::ToolError;
use crate::models::ApiDefinition;
use crate::services::api_client::LegacyUseClient;
use crate::services::credentials::Credentials;
use crate::services::logger::Logger;
use crate::utils::merge::merge_shallow;
use serde_json::{Map, Value};

/// Caller-supplied parameters before they meet the API's schema.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterInput {
    pub pairs: Vec<(String, Value)>,
    /// Auxiliary JSON object, either inline or as a JSON string.
    pub json: Option<Value>,
}

impl ParameterInput {
    pub fn from_pairs(pairs: Vec<(String, Value)>) -> Self {
        Self { pairs, json: None }
    }

    pub fn with_json(mut self, json: Value) -> Self {
        self.json = Some(json);
        self
    }
}

/// Builds the initial mapping: pairs in order (later keys overwrite earlier
/// ones), then the JSON blob merged over them. The blob wins on conflict.
pub fn collect_parameters(input: &ParameterInput) -> Result<Map<String, Value>, ToolError> {
    let mut mapping = Map::new();
    for (key, value) in &input.pairs {
        if key.is_empty() {
            continue;
        }
        mapping.insert(key.clone(), value.clone());
    }
    if let Some(blob) = parse_json_blob(input.json.as_ref())? {
        merge_shallow(&mut mapping, blob);
    }
    Ok(mapping)
}

fn parse_json_blob(raw: Option<&Value>) -> Result<Option<Map<String, Value>>, ToolError> {
    let invalid = || {
        ToolError::invalid_params("parameters_json must be a JSON object")
            .with_hint(r#"For example: {"customer_id": "42"}"#)
    };
    match raw {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Object(map)) => Ok(Some(map.clone())),
        Some(Value::String(text)) if text.trim().is_empty() => Ok(None),
        Some(Value::String(text)) => match serde_json::from_str::<Value>(text) {
            Ok(Value::Object(map)) => Ok(Some(map)),
            _ => Err(invalid()),
        },
        Some(_) => Err(invalid()),
    }
}

fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(_) => false,
    }
}

/// Fills declared parameters from defaults and rejects the mapping if any
/// declared parameter is still blank. Every missing name is reported, in
/// declaration order. Undeclared keys pass through untouched.
pub fn apply_definition(
    mut mapping: Map<String, Value>,
    definition: &ApiDefinition,
) -> Result<Map<String, Value>, ToolError> {
    let mut missing = Vec::new();
    for parameter in &definition.parameters {
        if !is_blank(mapping.get(&parameter.name)) {
            continue;
        }
        match parameter.default.as_ref() {
            Some(default) => {
                mapping.insert(parameter.name.clone(), default.clone());
            }
            None => missing.push(parameter.name.clone()),
        }
    }
    if !missing.is_empty() {
        return Err(
            ToolError::invalid_params(format!("Missing parameters: {}", missing.join(", ")))
                .with_details(serde_json::json!({
                    "api_name": definition.name,
                    "missing": missing,
                })),
        );
    }
    Ok(mapping)
}

#[derive(Clone)]
pub struct ParameterResolver {
    logger: Logger,
    client: LegacyUseClient,
}

impl ParameterResolver {
    pub fn new(logger: Logger, client: LegacyUseClient) -> Self {
        Self {
            logger: logger.child("parameters"),
            client,
        }
    }

    /// Validates the caller input locally first, then fetches the live
    /// definition and applies it.
    pub async fn resolve(
        &self,
        credentials: &Credentials,
        api_name: &str,
        input: &ParameterInput,
    ) -> Result<Map<String, Value>, ToolError> {
        let mapping = collect_parameters(input)?;
        let definition = self.client.get_definition(credentials, api_name).await?;
        let resolved = apply_definition(mapping, &definition)?;
        self.logger.debug(
            "parameters resolved",
            Some(&serde_json::json!({
                "api_name": api_name,
                "declared": definition.parameters.len(),
                "provided": resolved.len(),
            })),
        );
        Ok(resolved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ApiParameter;
    use serde_json::json;

    fn definition(params: &[(&str, Option<Value>)]) -> ApiDefinition {
        ApiDefinition {
            name: "invoice".to_string(),
            parameters: params
                .iter()
                .map(|(name, default)| ApiParameter {
                    name: name.to_string(),
                    description: None,
                    default: default.clone(),
                })
                .collect(),
        }
    }

    fn pairs(items: &[(&str, Value)]) -> ParameterInput {
        ParameterInput::from_pairs(
            items
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
        )
    }

    #[test]
    fn later_pairs_overwrite_earlier_ones() {
        let mapping =
            collect_parameters(&pairs(&[("a", json!("1")), ("a", json!("2"))])).unwrap();
        assert_eq!(Value::Object(mapping), json!({"a": "2"}));
    }

    #[test]
    fn json_blob_wins_over_pairs() {
        let input = pairs(&[("a", json!("pair")), ("b", json!("pair"))])
            .with_json(json!(r#"{"a": "json", "c": {"nested": true}}"#));
        let mapping = collect_parameters(&input).unwrap();
        assert_eq!(
            Value::Object(mapping),
            json!({"a": "json", "b": "pair", "c": {"nested": true}})
        );
    }

    #[test]
    fn malformed_or_non_object_blob_is_rejected() {
        assert!(collect_parameters(&ParameterInput::default().with_json(json!("{oops"))).is_err());
        assert!(collect_parameters(&ParameterInput::default().with_json(json!("[1,2]"))).is_err());
        assert!(collect_parameters(&ParameterInput::default().with_json(json!("  "))).is_ok());
    }

    #[test]
    fn defaults_fill_blank_values() {
        let def = definition(&[("region", Some(json!("eu"))), ("customer", None)]);
        let mapping = collect_parameters(&pairs(&[("region", json!("")), ("customer", json!("42"))]))
            .unwrap();
        let resolved = apply_definition(mapping, &def).unwrap();
        assert_eq!(Value::Object(resolved), json!({"region": "eu", "customer": "42"}));
    }

    #[test]
    fn reports_every_missing_parameter() {
        let def = definition(&[("a", None), ("b", Some(json!("x"))), ("c", None)]);
        let err = apply_definition(Map::new(), &def).unwrap_err();
        assert_eq!(err.message, "Missing parameters: a, c");
        assert_eq!(err.details.unwrap()["missing"], json!(["a", "c"]));
    }

    #[test]
    fn whitespace_and_zero_count_as_provided() {
        let def = definition(&[("a", None), ("b", None)]);
        let mapping = collect_parameters(&pairs(&[("a", json!(" ")), ("b", json!(0))])).unwrap();
        assert!(apply_definition(mapping, &def).is_ok());
    }

    #[test]
    fn undeclared_parameters_pass_through() {
        let def = definition(&[]);
        let mapping = collect_parameters(&pairs(&[("extra", json!("keep"))])).unwrap();
        let resolved = apply_definition(mapping, &def).unwrap();
        assert_eq!(resolved.get("extra"), Some(&json!("keep")));
    }
}
