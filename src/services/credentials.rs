use crate::config;
use crate::constants::network;
use crate::errors::ToolError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::fmt;

static SUBDOMAIN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?$").expect("subdomain regex"));

#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    subdomain: Option<String>,
    api_key: String,
    base_url: String,
}

impl Credentials {
    /// Builds credentials for a tenant, deriving the canonical base URL.
    pub fn for_tenant(subdomain: &str, api_key: &str) -> Result<Self, ToolError> {
        let subdomain = ensure_subdomain(subdomain)?;
        let base_url = tenant_base_url(&subdomain);
        Self::build(Some(subdomain), api_key, base_url)
    }

    /// Builds credentials against an explicit base URL (self-hosted tenants,
    /// local fakes).
    pub fn with_base_url(api_key: &str, base_url: &str) -> Result<Self, ToolError> {
        Self::build(None, api_key, base_url.to_string())
    }

    fn build(subdomain: Option<String>, api_key: &str, base_url: String) -> Result<Self, ToolError> {
        let api_key = api_key.trim();
        if api_key.is_empty() {
            return Err(ToolError::invalid_params("api_key must be a non-empty string")
                .with_hint(format!(
                    "Pass credentials.api_key or set {}.",
                    config::ENV_API_KEY
                )));
        }
        let base_url = base_url.trim().trim_end_matches('/').to_string();
        let parsed = url::Url::parse(&base_url)
            .map_err(|_| ToolError::invalid_params(format!("Invalid base URL: {}", base_url)))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ToolError::invalid_params(
                "Only http/https base URLs are supported",
            ));
        }
        Ok(Self {
            subdomain,
            api_key: api_key.to_string(),
            base_url,
        })
    }

    pub fn subdomain(&self) -> Option<&str> {
        self.subdomain.as_deref()
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// Tenant API root without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("subdomain", &self.subdomain)
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .finish()
    }
}

pub fn tenant_base_url(subdomain: &str) -> String {
    format!("https://{}.{}/api", subdomain, network::TENANT_DOMAIN)
}

fn ensure_subdomain(raw: &str) -> Result<String, ToolError> {
    let trimmed = raw.trim();
    if !SUBDOMAIN_RE.is_match(trimmed) {
        return Err(ToolError::invalid_params(format!(
            "Invalid subdomain: '{}'",
            trimmed
        ))
        .with_hint("Use the tenant label only, e.g. acme for acme.legacy-use.com."));
    }
    Ok(trimmed.to_lowercase())
}

/// Resolves credentials from layered sources. Each source is an optional
/// `{subdomain, api_key, base_url}` object; the first non-empty value per
/// field wins, then the environment fills the gaps.
#[derive(Clone, Default)]
pub struct CredentialResolver;

impl CredentialResolver {
    pub fn new() -> Self {
        Self
    }

    pub fn resolve(&self, sources: &[Option<&Value>]) -> Result<Credentials, ToolError> {
        let pick = |keys: &[&str]| -> Option<String> {
            sources.iter().flatten().find_map(|source| {
                keys.iter().find_map(|key| {
                    source
                        .get(*key)
                        .and_then(|v| v.as_str())
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                })
            })
        };

        let api_key = pick(&["api_key", "apiKey"])
            .or_else(|| config::read_env_string(config::ENV_API_KEY))
            .unwrap_or_default();
        if let Some(base_url) = pick(&["base_url", "baseUrl"]) {
            return Credentials::with_base_url(&api_key, &base_url);
        }
        let explicit_subdomain = pick(&["subdomain"]);
        if explicit_subdomain.is_none() {
            if let Some(base_url) = config::base_url_override() {
                return Credentials::with_base_url(&api_key, &base_url);
            }
        }

        let subdomain = explicit_subdomain
            .or_else(|| config::read_env_string(config::ENV_SUBDOMAIN))
            .ok_or_else(|| {
                ToolError::invalid_params("subdomain is required").with_hint(format!(
                    "Pass credentials.subdomain or set {}.",
                    config::ENV_SUBDOMAIN
                ))
            })?;
        Credentials::for_tenant(&subdomain, &api_key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn tenant_base_url_follows_subdomain() {
        let creds = Credentials::for_tenant("Acme", "k").unwrap();
        assert_eq!(creds.base_url(), "https://acme.legacy-use.com/api");
        assert_eq!(creds.subdomain(), Some("acme"));
    }

    #[test]
    fn rejects_subdomain_with_dots() {
        let err = Credentials::for_tenant("acme.evil.com", "k").unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn rejects_blank_api_key() {
        assert!(Credentials::for_tenant("acme", "  ").is_err());
    }

    #[test]
    fn debug_output_hides_api_key() {
        let creds = Credentials::for_tenant("acme", "super-secret").unwrap();
        let rendered = format!("{:?}", creds);
        assert!(!rendered.contains("super-secret"));
    }

    #[test]
    fn earlier_sources_win_per_field() {
        let item = json!({"api_key": "item-key"});
        let batch = json!({"api_key": "batch-key", "subdomain": "acme"});
        let creds = CredentialResolver::new()
            .resolve(&[Some(&item), Some(&batch)])
            .unwrap();
        assert_eq!(creds.api_key(), "item-key");
        assert_eq!(creds.base_url(), "https://acme.legacy-use.com/api");
    }

    #[test]
    fn explicit_base_url_skips_subdomain() {
        let source = json!({"api_key": "k", "base_url": "http://127.0.0.1:9000/api/"});
        let creds = CredentialResolver::new().resolve(&[Some(&source)]).unwrap();
        assert_eq!(creds.base_url(), "http://127.0.0.1:9000/api");
        assert_eq!(creds.subdomain(), None);
    }
}
