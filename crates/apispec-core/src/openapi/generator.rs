//! Assembly of an OpenAPI document from captured resources.

// Internal imports (std, crate)
use std::collections::{BTreeMap, HashSet};

use crate::config::Oauth2Configuration;
use crate::jsonschema;
use crate::model::{group_by_path, FieldDescriptor, HttpMethod, NamedSchema, ResourceModel};
use crate::openapi::components;
use crate::openapi::parameters::{
    header_parameter, path_parameter, path_parameter_names, placeholder_path_parameter,
    query_parameter, response_header,
};
use crate::openapi::security::{self, SecurityRequirementsHandler};
use crate::openapi::status::reason_phrase;
use crate::openapi::types::{
    Components, Example, Info, MediaType, OpenApi, Operation, Parameter, PathItem, RequestBody,
    Response, Server, Tag, OPENAPI_VERSION,
};
use crate::{Error, Result};

// External imports (alphabetized)
use indexmap::IndexMap;
use log::{debug, info, warn};
use serde_json::Value as JsonValue;

/// Document-level settings for assembly.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiMetadata {
    pub title: String,
    pub description: Option<String>,
    pub version: String,
    pub servers: Vec<Server>,
    pub tag_descriptions: IndexMap<String, String>,
    pub oauth2: Option<Oauth2Configuration>,
}

impl Default for ApiMetadata {
    fn default() -> Self {
        Self {
            title: "API".to_string(),
            description: None,
            version: "1.0.0".to_string(),
            servers: Vec::new(),
            tag_descriptions: IndexMap::new(),
            oauth2: None,
        }
    }
}

/// Assemble a complete document.
///
/// Resources sharing a path and method are folded into one operation. The
/// result does not depend on the order of `resources`.
pub fn generate(resources: &[ResourceModel], metadata: &ApiMetadata) -> Result<OpenApi> {
    if let Some(resource) = resources.iter().find(|r| r.request.path.trim().is_empty()) {
        return Err(Error::MissingTemplate {
            operation_id: resource.operation_id.clone(),
        });
    }

    let handler = SecurityRequirementsHandler::default();
    let oauth2 = metadata.oauth2.as_ref();

    let mut paths = IndexMap::new();
    for (path, models) in group_by_path(resources) {
        let item = path_item(&path, models, oauth2, &handler)?;
        paths.insert(path, item);
    }
    info!("Assembled {} paths from {} resources", paths.len(), resources.len());

    let schemas = components::extract_schemas(&mut paths)?;
    let security_schemes = security::security_schemes(&paths, oauth2)?;
    debug!(
        "Extracted {} component schemas and {} security schemes",
        schemas.len(),
        security_schemes.len()
    );
    let components = (!schemas.is_empty() || !security_schemes.is_empty()).then(|| Components {
        schemas,
        security_schemes,
    });

    Ok(OpenApi {
        openapi: OPENAPI_VERSION.to_string(),
        info: Info {
            title: metadata.title.clone(),
            description: metadata.description.clone(),
            version: metadata.version.clone(),
        },
        servers: metadata.servers.clone(),
        tags: metadata
            .tag_descriptions
            .iter()
            .map(|(name, description)| Tag {
                name: name.clone(),
                description: Some(description.clone()),
            })
            .collect(),
        paths,
        components,
    })
}

fn path_item(
    path: &str,
    mut models: Vec<&ResourceModel>,
    oauth2: Option<&Oauth2Configuration>,
    handler: &SecurityRequirementsHandler,
) -> Result<PathItem> {
    models.sort_by(|a, b| a.operation_id.cmp(&b.operation_id));

    let mut by_method: BTreeMap<HttpMethod, Vec<&ResourceModel>> = BTreeMap::new();
    for model in models {
        by_method.entry(model.request.method).or_default().push(model);
    }

    let mut item = PathItem::default();
    for (method, group) in by_method {
        debug!("Building {} {} from {} examples", method, path, group.len());
        item.set_operation(method, operation(path, &group, oauth2, handler)?);
    }
    Ok(item)
}

fn operation(
    path: &str,
    models: &[&ResourceModel],
    oauth2: Option<&Oauth2Configuration>,
    handler: &SecurityRequirementsHandler,
) -> Result<Operation> {
    let operation_id = operation_id(models);
    let mut tags: Vec<String> = Vec::new();
    for tag in models.iter().flat_map(|m| &m.tags) {
        if !tags.contains(tag) {
            tags.push(tag.clone());
        }
    }
    let requirements = models.first().and_then(|m| handler.extract(&m.request));

    Ok(Operation {
        tags,
        summary: first_non_blank(models.iter().map(|m| m.summary.as_deref())),
        description: first_non_blank(models.iter().map(|m| m.description.as_deref())),
        parameters: parameters(path, models)?,
        request_body: request_body(&operation_id, models)?,
        responses: responses(&operation_id, models)?,
        deprecated: models.iter().all(|m| m.deprecated).then_some(true),
        security: security::operation_security(requirements.as_ref(), oauth2),
        operation_id,
    })
}

/// Longest common prefix, or the sorted concatenation when there is none.
fn operation_id(models: &[&ResourceModel]) -> String {
    let mut ids: Vec<&str> = models.iter().map(|m| m.operation_id.as_str()).collect();
    let Some((first, rest)) = ids.split_first() else {
        return String::new();
    };
    let prefix = rest.iter().fold(*first, |prefix, id| common_prefix(prefix, id));
    if !prefix.is_empty() {
        return prefix.to_string();
    }
    ids.sort_unstable();
    ids.concat()
}

fn common_prefix<'a>(a: &'a str, b: &str) -> &'a str {
    let end = a
        .char_indices()
        .zip(b.chars())
        .take_while(|((_, x), y)| x == y)
        .last()
        .map_or(0, |((i, c), _)| i + c.len_utf8());
    &a[..end]
}

fn first_non_blank<'a>(values: impl Iterator<Item = Option<&'a str>>) -> Option<String> {
    values
        .flatten()
        .find(|v| !v.trim().is_empty())
        .map(str::to_string)
}

fn parameters(path: &str, models: &[&ResourceModel]) -> Result<Vec<Parameter>> {
    let mut parameters = Vec::new();

    for name in path_parameter_names(path) {
        let descriptor = models
            .iter()
            .flat_map(|m| &m.request.path_parameters)
            .find(|p| p.name == name);
        parameters.push(match descriptor {
            Some(descriptor) => path_parameter(descriptor)?,
            None => placeholder_path_parameter(name),
        });
    }

    let mut seen = HashSet::new();
    for descriptor in models.iter().flat_map(|m| &m.request.query_parameters) {
        if seen.insert(descriptor.name.as_str()) {
            parameters.push(query_parameter(descriptor)?);
        }
    }

    let mut seen = HashSet::new();
    for descriptor in models.iter().flat_map(|m| &m.request.headers) {
        if seen.insert(descriptor.name.as_str()) {
            parameters.push(header_parameter(descriptor)?);
        }
    }
    Ok(parameters)
}

/// A body as captured by one example.
struct BodySample<'a> {
    operation_id: &'a str,
    fields: Vec<FieldDescriptor>,
    example: Option<&'a str>,
    schema: Option<&'a NamedSchema>,
}

fn request_body(operation_id: &str, models: &[&ResourceModel]) -> Result<Option<RequestBody>> {
    let mut by_content_type: IndexMap<&str, Vec<BodySample<'_>>> = IndexMap::new();
    for model in models {
        let request = &model.request;
        let Some(content_type) = request.content_type.as_deref() else {
            continue;
        };
        let fields: Vec<FieldDescriptor> = if is_form_urlencoded(content_type) {
            request.form_parameters.iter().map(FieldDescriptor::from).collect()
        } else if is_multipart(content_type) {
            request.request_parts.iter().map(FieldDescriptor::from).collect()
        } else {
            request.request_fields.clone()
        };
        by_content_type.entry(content_type).or_default().push(BodySample {
            operation_id: &model.operation_id,
            fields,
            example: request.example.as_deref(),
            schema: request.schema.as_ref(),
        });
    }

    if by_content_type.is_empty() {
        return Ok(None);
    }
    let mut content = IndexMap::new();
    for (content_type, samples) in by_content_type {
        content.insert(content_type.to_string(), media_type(operation_id, content_type, &samples)?);
    }
    Ok(Some(RequestBody { content }))
}

fn responses(operation_id: &str, models: &[&ResourceModel]) -> Result<Option<IndexMap<String, Response>>> {
    let mut by_status: BTreeMap<u16, Vec<&ResourceModel>> = BTreeMap::new();
    for model in models {
        by_status.entry(model.response.status).or_default().push(model);
    }
    if by_status.is_empty() {
        return Ok(None);
    }

    let mut responses = IndexMap::new();
    for (status, group) in by_status {
        let mut headers = IndexMap::new();
        for header in group.iter().flat_map(|m| &m.response.headers) {
            if !headers.contains_key(&header.name) {
                headers.insert(header.name.clone(), response_header(header)?);
            }
        }

        let mut by_content_type: IndexMap<&str, Vec<BodySample<'_>>> = IndexMap::new();
        for model in &group {
            let response = &model.response;
            let Some(content_type) = response.content_type.as_deref() else {
                continue;
            };
            by_content_type.entry(content_type).or_default().push(BodySample {
                operation_id: &model.operation_id,
                fields: response.response_fields.clone(),
                example: response.example.as_deref(),
                schema: response.schema.as_ref(),
            });
        }
        let mut content = IndexMap::new();
        for (content_type, samples) in by_content_type {
            content.insert(content_type.to_string(), media_type(operation_id, content_type, &samples)?);
        }

        responses.insert(
            status.to_string(),
            Response {
                description: reason_phrase(status).into_owned(),
                headers,
                content,
            },
        );
    }
    Ok(Some(responses))
}

fn media_type(operation_id: &str, content_type: &str, samples: &[BodySample<'_>]) -> Result<MediaType> {
    let fields: Vec<FieldDescriptor> = samples.iter().flat_map(|s| s.fields.iter().cloned()).collect();
    let name = samples.iter().find_map(|s| s.schema).map(|s| s.name.as_str());
    let mut schema = jsonschema::generate(&fields, name)?;
    schema.name = name.map(str::to_string);

    let mut examples = IndexMap::new();
    for sample in samples {
        let Some(example) = sample.example.filter(|e| !e.trim().is_empty()) else {
            continue;
        };
        examples
            .entry(sample.operation_id.to_string())
            .or_insert_with(|| Example {
                value: example_value(operation_id, content_type, example),
            });
    }

    Ok(MediaType {
        schema: Some(schema),
        examples,
    })
}

fn example_value(operation_id: &str, content_type: &str, example: &str) -> JsonValue {
    if !content_type.to_ascii_lowercase().contains("json") {
        return JsonValue::String(example.to_string());
    }
    serde_json::from_str(example).unwrap_or_else(|e| {
        warn!(
            "Example of '{}' is not valid JSON ({}), keeping it as text",
            operation_id, e
        );
        JsonValue::String(example.to_string())
    })
}

fn media_type_essence(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

fn is_form_urlencoded(content_type: &str) -> bool {
    media_type_essence(content_type) == "application/x-www-form-urlencoded"
}

fn is_multipart(content_type: &str) -> bool {
    media_type_essence(content_type) == "multipart/form-data"
}

/// Check a generated document against the OpenAPI 3 object model.
pub fn validate(document: &OpenApi) -> Result<()> {
    let value = serde_json::to_value(document)?;
    serde_json::from_value::<openapiv3::OpenAPI>(value)
        .map_err(|e| Error::openapi(format!("Generated document is not valid OpenAPI 3: {e}")))?;
    Ok(())
}
