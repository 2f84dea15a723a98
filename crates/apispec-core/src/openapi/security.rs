//! Security requirement detection and security scheme definitions.
//!
//! Each operation gets at most one security requirement. It is taken from the
//! request's declared requirement when present, otherwise inferred from the
//! captured `Authorization` header. Extractors are tried in a fixed order and
//! the first match wins.

// Internal imports (std, crate)
use std::collections::BTreeMap;

use crate::config::Oauth2Configuration;
use crate::model::{HeaderDescriptor, RequestModel, SecurityRequirements, SecurityType};
use crate::openapi::types::{
    OAuthFlow, OAuthFlows, ParameterLocation, PathItem, SecurityRequirement, SecurityScheme,
};
use crate::{Error, Result};

// External imports (alphabetized)
use indexmap::IndexMap;
use log::debug;

pub const BASIC_SCHEME: &str = "basic";
pub const JWT_SCHEME: &str = "bearerAuthJWT";
pub const API_KEY_SCHEME: &str = "api_key";
const OAUTH2_SCHEME_PREFIX: &str = "oauth2_";
const AUTHORIZATION: &str = "Authorization";

/// Derives a security requirement from a captured request.
pub trait SecurityRequirementsExtractor: Send + Sync {
    fn extract(&self, request: &RequestModel) -> Option<SecurityRequirements>;
}

/// Uses the requirement recorded with the snapshot.
#[derive(Debug, Default)]
pub struct DeclaredSecurityExtractor;

impl SecurityRequirementsExtractor for DeclaredSecurityExtractor {
    fn extract(&self, request: &RequestModel) -> Option<SecurityRequirements> {
        request.security_requirements.clone()
    }
}

/// `Authorization: Basic ...`
#[derive(Debug, Default)]
pub struct BasicSecurityExtractor;

impl SecurityRequirementsExtractor for BasicSecurityExtractor {
    fn extract(&self, request: &RequestModel) -> Option<SecurityRequirements> {
        authorization_examples(request)
            .any(|value| value.starts_with("Basic "))
            .then(|| SecurityRequirements::new(SecurityType::Basic))
    }
}

/// `Authorization: Bearer <header.payload.signature>`
#[derive(Debug, Default)]
pub struct JwtSecurityExtractor;

impl SecurityRequirementsExtractor for JwtSecurityExtractor {
    fn extract(&self, request: &RequestModel) -> Option<SecurityRequirements> {
        authorization_examples(request)
            .filter_map(|value| value.strip_prefix("Bearer "))
            .any(is_jwt)
            .then(|| SecurityRequirements::new(SecurityType::JwtBearer))
    }
}

fn authorization_examples(request: &RequestModel) -> impl Iterator<Item = &str> {
    request
        .headers
        .iter()
        .filter(|h: &&HeaderDescriptor| h.name.eq_ignore_ascii_case(AUTHORIZATION))
        .filter_map(|h| h.example.as_deref())
}

fn is_jwt(token: &str) -> bool {
    let parts: Vec<&str> = token.trim().split('.').collect();
    parts.len() == 3
        && parts[..2].iter().all(|p| !p.is_empty())
        && parts.iter().all(|p| {
            p.chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '=')
        })
}

/// Ordered set of extractors.
pub struct SecurityRequirementsHandler {
    extractors: Vec<Box<dyn SecurityRequirementsExtractor>>,
}

impl SecurityRequirementsHandler {
    pub fn new(extractors: Vec<Box<dyn SecurityRequirementsExtractor>>) -> Self {
        Self { extractors }
    }

    pub fn extract(&self, request: &RequestModel) -> Option<SecurityRequirements> {
        self.extractors.iter().find_map(|e| e.extract(request))
    }
}

impl Default for SecurityRequirementsHandler {
    fn default() -> Self {
        Self::new(vec![
            Box::new(DeclaredSecurityExtractor),
            Box::new(BasicSecurityExtractor),
            Box::new(JwtSecurityExtractor),
        ])
    }
}

/// Operation-level `security` entries for a requirement.
pub fn operation_security(
    requirements: Option<&SecurityRequirements>,
    oauth2: Option<&Oauth2Configuration>,
) -> Vec<SecurityRequirement> {
    let Some(requirements) = requirements else {
        return Vec::new();
    };
    let single = |name: &str| vec![IndexMap::from([(name.to_string(), Vec::<String>::new())])];

    match requirements.security_type {
        SecurityType::Basic => single(BASIC_SCHEME),
        SecurityType::JwtBearer => single(JWT_SCHEME),
        SecurityType::ApiKey => single(API_KEY_SCHEME),
        SecurityType::Oauth2 => match oauth2 {
            Some(config) => {
                let scopes = requirements.required_scopes.clone().unwrap_or_default();
                config
                    .flows
                    .iter()
                    .map(|flow| IndexMap::from([(oauth2_scheme_name(flow), scopes.clone())]))
                    .collect()
            }
            None => {
                debug!("OAuth2 requirement without OAuth2 configuration, no security emitted");
                Vec::new()
            }
        },
    }
}

pub fn oauth2_scheme_name(flow: &str) -> String {
    format!("{OAUTH2_SCHEME_PREFIX}{flow}")
}

/// `components.securitySchemes` for the schemes the paths reference.
pub fn security_schemes(
    paths: &IndexMap<String, PathItem>,
    oauth2: Option<&Oauth2Configuration>,
) -> Result<BTreeMap<String, SecurityScheme>> {
    let mut used: IndexMap<&str, Vec<&str>> = IndexMap::new();
    for item in paths.values() {
        for (_, operation) in item.operations() {
            for requirement in &operation.security {
                for (name, scopes) in requirement {
                    let entry = used.entry(name.as_str()).or_default();
                    for scope in scopes {
                        if !entry.contains(&scope.as_str()) {
                            entry.push(scope.as_str());
                        }
                    }
                }
            }
        }
    }

    let mut schemes = BTreeMap::new();
    if used.contains_key(BASIC_SCHEME) {
        schemes.insert(
            BASIC_SCHEME.to_string(),
            SecurityScheme::Http {
                scheme: "basic".into(),
                bearer_format: None,
            },
        );
    }
    if used.contains_key(JWT_SCHEME) {
        schemes.insert(
            JWT_SCHEME.to_string(),
            SecurityScheme::Http {
                scheme: "bearer".into(),
                bearer_format: Some("JWT".into()),
            },
        );
    }
    if used.contains_key(API_KEY_SCHEME) {
        schemes.insert(
            API_KEY_SCHEME.to_string(),
            SecurityScheme::ApiKey {
                location: ParameterLocation::Header,
                name: AUTHORIZATION.into(),
            },
        );
    }

    if let Some(config) = oauth2 {
        for flow in &config.flows {
            let name = oauth2_scheme_name(flow);
            let scopes: IndexMap<String, String> = used
                .get(name.as_str())
                .into_iter()
                .flatten()
                .map(|scope| {
                    let description = config
                        .scopes
                        .get(*scope)
                        .cloned()
                        .unwrap_or_else(|| "No description".to_string());
                    (scope.to_string(), description)
                })
                .collect();
            schemes.insert(
                name,
                SecurityScheme::OAuth2 {
                    flows: oauth2_flows(flow, config, scopes)?,
                },
            );
        }
    }
    Ok(schemes)
}

fn oauth2_flows(
    flow: &str,
    config: &Oauth2Configuration,
    scopes: IndexMap<String, String>,
) -> Result<OAuthFlows> {
    let with_token = || OAuthFlow {
        authorization_url: None,
        token_url: Some(config.token_url.clone()),
        scopes: scopes.clone(),
    };
    let mut flows = OAuthFlows::default();
    match flow {
        "authorizationCode" => {
            flows.authorization_code = Some(OAuthFlow {
                authorization_url: Some(config.authorization_url.clone()),
                ..with_token()
            })
        }
        "clientCredentials" => flows.client_credentials = Some(with_token()),
        "password" => flows.password = Some(with_token()),
        "implicit" => {
            flows.implicit = Some(OAuthFlow {
                authorization_url: Some(config.authorization_url.clone()),
                token_url: None,
                scopes: scopes.clone(),
            })
        }
        other => return Err(Error::UnknownOauth2Flow(other.to_string())),
    }
    Ok(flows)
}
