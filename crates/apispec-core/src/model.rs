//! Captured resource snapshots.
//!
//! A [`ResourceModel`] is one documented example invocation of an HTTP
//! operation, written to disk during a documentation test run. Many models can
//! describe the same logical operation; they are read once and never mutated,
//! the generators consume them by reference.
//!
//! Descriptor variants (fields, parameters, headers, multipart parts) share a
//! common capability set exposed through [`DescriptorRef`].

// Internal imports (std, crate)
use std::convert::TryFrom;
use std::fmt;
use std::str::FromStr;

use crate::constraints::Constraints;
use crate::Error;

// External imports (alphabetized)
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// One captured example of a documented operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceModel {
    pub operation_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub private_resource: bool,
    #[serde(default)]
    pub deprecated: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    pub request: RequestModel,
    pub response: ResponseModel,
}

/// Group resources by request path.
///
/// Paths are ordered by their first non-empty segment, then by depth (number of
/// slashes), then by the full path, so the result does not depend on the order
/// snapshots were captured in.
pub fn group_by_path(resources: &[ResourceModel]) -> IndexMap<String, Vec<&ResourceModel>> {
    let mut sorted: Vec<&ResourceModel> = resources.iter().collect();
    sorted.sort_by(|a, b| path_sort_key(&a.request.path).cmp(&path_sort_key(&b.request.path)));

    let mut groups: IndexMap<String, Vec<&ResourceModel>> = IndexMap::new();
    for resource in sorted {
        groups
            .entry(resource.request.path.clone())
            .or_default()
            .push(resource);
    }
    groups
}

fn path_sort_key(path: &str) -> (&str, usize, &str) {
    let first_segment = path.split('/').find(|s| !s.is_empty()).unwrap_or("");
    (first_segment, path.matches('/').count(), path)
}

/// Named schema declared for a request or response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedSchema {
    pub name: String,
}

/// Request half of a captured example.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestModel {
    /// URL template, e.g. `/items/{id}`
    #[serde(default)]
    pub path: String,
    pub method: HttpMethod,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub security_requirements: Option<SecurityRequirements>,
    #[serde(default)]
    pub headers: Vec<HeaderDescriptor>,
    #[serde(default)]
    pub path_parameters: Vec<ParameterDescriptor>,
    #[serde(default, alias = "requestParameters")]
    pub query_parameters: Vec<ParameterDescriptor>,
    #[serde(default)]
    pub form_parameters: Vec<ParameterDescriptor>,
    #[serde(default)]
    pub request_parts: Vec<PartDescriptor>,
    #[serde(default)]
    pub request_fields: Vec<FieldDescriptor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<NamedSchema>,
}

/// Response half of a captured example.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseModel {
    pub status: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(default)]
    pub headers: Vec<HeaderDescriptor>,
    #[serde(default)]
    pub response_fields: Vec<FieldDescriptor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<NamedSchema>,
}

/// HTTP methods an operation can be documented for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE", try_from = "String")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Patch,
    Head,
    Options,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
            Self::Patch => "PATCH",
            Self::Head => "HEAD",
            Self::Options => "OPTIONS",
        }
    }
}

impl FromStr for HttpMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "GET" => Ok(Self::Get),
            "POST" => Ok(Self::Post),
            "PUT" => Ok(Self::Put),
            "DELETE" => Ok(Self::Delete),
            "PATCH" => Ok(Self::Patch),
            "HEAD" => Ok(Self::Head),
            "OPTIONS" => Ok(Self::Options),
            _ => Err(Error::UnknownHttpMethod(s.to_string())),
        }
    }
}

impl TryFrom<String> for HttpMethod {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Abstract data type of a descriptor.
///
/// Descriptors carry their type as a free-form string; it is resolved lazily so
/// that an unknown value surfaces as [`Error::InvalidType`] naming the field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    String,
    Integer,
    Number,
    Boolean,
    Array,
    Object,
    Enum,
    Null,
    /// Type differs between examples; rendered as an unconstrained schema
    Varies,
}

impl DataType {
    /// Case-insensitive lookup, `None` for unknown names
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "string" => Some(Self::String),
            "integer" => Some(Self::Integer),
            "number" => Some(Self::Number),
            "boolean" => Some(Self::Boolean),
            "array" => Some(Self::Array),
            "object" => Some(Self::Object),
            "enum" => Some(Self::Enum),
            "null" => Some(Self::Null),
            "varies" | "empty" => Some(Self::Varies),
            _ => None,
        }
    }

    /// Resolve `value` or fail with an error naming `path`
    pub fn resolve(path: &str, value: &str) -> crate::Result<Self> {
        Self::parse(value).ok_or_else(|| Error::invalid_type(path, value))
    }
}

/// A field inside a JSON body, addressed by a dotted/bracketed path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDescriptor {
    pub path: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default)]
    pub optional: bool,
    #[serde(default)]
    pub ignored: bool,
    #[serde(default)]
    pub attributes: Attributes,
}

impl FieldDescriptor {
    pub fn new(path: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            description: String::new(),
            type_name: type_name.into(),
            optional: false,
            ignored: false,
            attributes: Attributes::default(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn ignored(mut self) -> Self {
        self.ignored = true;
        self
    }

    pub fn with_constraint(mut self, constraint: Constraint) -> Self {
        self.attributes.validation_constraints.push(constraint);
        self
    }
}

/// A path, query or form parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterDescriptor {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default, rename = "default", skip_serializing_if = "Option::is_none")]
    pub default_value: Option<JsonValue>,
    #[serde(default)]
    pub optional: bool,
    #[serde(default)]
    pub ignored: bool,
    #[serde(default)]
    pub attributes: Attributes,
}

impl ParameterDescriptor {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            type_name: type_name.into(),
            default_value: None,
            optional: false,
            ignored: false,
            attributes: Attributes::default(),
        }
    }
}

/// A request or response header.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeaderDescriptor {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default, rename = "default", skip_serializing_if = "Option::is_none")]
    pub default_value: Option<JsonValue>,
    #[serde(default)]
    pub optional: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example: Option<String>,
    #[serde(default)]
    pub attributes: Attributes,
}

impl HeaderDescriptor {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            type_name: type_name.into(),
            default_value: None,
            optional: false,
            example: None,
            attributes: Attributes::default(),
        }
    }

    pub fn with_example(mut self, example: impl Into<String>) -> Self {
        self.example = Some(example.into());
        self
    }
}

/// One part of a multipart request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartDescriptor {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default, rename = "default", skip_serializing_if = "Option::is_none")]
    pub default_value: Option<JsonValue>,
    #[serde(default)]
    pub optional: bool,
    #[serde(default)]
    pub ignored: bool,
    #[serde(default)]
    pub attributes: Attributes,
}

/// Element description for array-typed descriptors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemDescriptor {
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub attributes: Attributes,
}

/// Structured attribute bag shared by every descriptor variant.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attributes {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub validation_constraints: Vec<Constraint>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub enum_values: Vec<JsonValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<ItemDescriptor>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encoding: Option<Encoding>,
}

impl Attributes {
    /// Semantic view over the validation constraints
    pub fn constraints(&self) -> Constraints<'_> {
        Constraints::new(&self.validation_constraints)
    }
}

/// Serialization hints for parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Encoding {
    pub style: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explode: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow_reserved: Option<bool>,
}

/// A validation constraint as produced by the constraint extraction step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Constraint {
    pub name: ConstraintKind,
    #[serde(default)]
    pub configuration: IndexMap<String, JsonValue>,
}

impl Constraint {
    pub fn new(name: ConstraintKind) -> Self {
        Self {
            name,
            configuration: IndexMap::new(),
        }
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.configuration.insert(key.into(), value.into());
        self
    }
}

/// Kind of a validation constraint.
///
/// Snapshot files may carry either the short name (`NotNull`) or a fully
/// qualified annotation name (`javax.validation.constraints.NotNull`); only the
/// last dotted segment is significant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ConstraintKind {
    NotNull,
    NotEmpty,
    NotBlank,
    Size,
    Length,
    Pattern,
    Min,
    Max,
    DecimalMin,
    DecimalMax,
    Other(String),
}

impl ConstraintKind {
    pub fn as_str(&self) -> &str {
        match self {
            Self::NotNull => "NotNull",
            Self::NotEmpty => "NotEmpty",
            Self::NotBlank => "NotBlank",
            Self::Size => "Size",
            Self::Length => "Length",
            Self::Pattern => "Pattern",
            Self::Min => "Min",
            Self::Max => "Max",
            Self::DecimalMin => "DecimalMin",
            Self::DecimalMax => "DecimalMax",
            Self::Other(name) => name,
        }
    }
}

impl From<String> for ConstraintKind {
    fn from(name: String) -> Self {
        let short = name.rsplit('.').next().unwrap_or_default();
        match short {
            "NotNull" => Self::NotNull,
            "NotEmpty" => Self::NotEmpty,
            "NotBlank" => Self::NotBlank,
            "Size" => Self::Size,
            "Length" => Self::Length,
            "Pattern" => Self::Pattern,
            "Min" => Self::Min,
            "Max" => Self::Max,
            "DecimalMin" => Self::DecimalMin,
            "DecimalMax" => Self::DecimalMax,
            _ => Self::Other(name),
        }
    }
}

impl From<&str> for ConstraintKind {
    fn from(name: &str) -> Self {
        Self::from(name.to_string())
    }
}

impl From<ConstraintKind> for String {
    fn from(kind: ConstraintKind) -> Self {
        kind.as_str().to_string()
    }
}

/// Security mechanism declared for a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityRequirements {
    #[serde(rename = "type")]
    pub security_type: SecurityType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_scopes: Option<Vec<String>>,
}

impl SecurityRequirements {
    pub fn new(security_type: SecurityType) -> Self {
        Self {
            security_type,
            required_scopes: None,
        }
    }

    pub fn oauth2<I, S>(scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            security_type: SecurityType::Oauth2,
            required_scopes: Some(scopes.into_iter().map(Into::into).collect()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SecurityType {
    Oauth2,
    Basic,
    ApiKey,
    JwtBearer,
}

/// Borrowed view over any descriptor variant.
#[derive(Debug, Clone, Copy)]
pub enum DescriptorRef<'a> {
    Field(&'a FieldDescriptor),
    Parameter(&'a ParameterDescriptor),
    Header(&'a HeaderDescriptor),
    Part(&'a PartDescriptor),
    Item(&'a ItemDescriptor),
}

impl<'a> DescriptorRef<'a> {
    /// Field path or parameter name, used in error messages
    pub fn label(&self) -> &'a str {
        match self {
            Self::Field(d) => &d.path,
            Self::Parameter(d) => &d.name,
            Self::Header(d) => &d.name,
            Self::Part(d) => &d.name,
            Self::Item(_) => "items",
        }
    }

    pub fn description(&self) -> &'a str {
        match self {
            Self::Field(d) => &d.description,
            Self::Parameter(d) => &d.description,
            Self::Header(d) => &d.description,
            Self::Part(d) => &d.description,
            Self::Item(d) => &d.description,
        }
    }

    pub fn type_name(&self) -> &'a str {
        match self {
            Self::Field(d) => &d.type_name,
            Self::Parameter(d) => &d.type_name,
            Self::Header(d) => &d.type_name,
            Self::Part(d) => &d.type_name,
            Self::Item(d) => &d.type_name,
        }
    }

    pub fn optional(&self) -> bool {
        match self {
            Self::Field(d) => d.optional,
            Self::Parameter(d) => d.optional,
            Self::Header(d) => d.optional,
            Self::Part(d) => d.optional,
            Self::Item(_) => false,
        }
    }

    pub fn attributes(&self) -> &'a Attributes {
        match self {
            Self::Field(d) => &d.attributes,
            Self::Parameter(d) => &d.attributes,
            Self::Header(d) => &d.attributes,
            Self::Part(d) => &d.attributes,
            Self::Item(d) => &d.attributes,
        }
    }

    pub fn default_value(&self) -> Option<&'a JsonValue> {
        match self {
            Self::Parameter(d) => d.default_value.as_ref(),
            Self::Header(d) => d.default_value.as_ref(),
            Self::Part(d) => d.default_value.as_ref(),
            Self::Field(_) | Self::Item(_) => None,
        }
    }

    pub fn data_type(&self) -> crate::Result<DataType> {
        DataType::resolve(self.label(), self.type_name())
    }

    pub fn constraints(&self) -> Constraints<'a> {
        self.attributes().constraints()
    }
}

impl<'a> From<&'a FieldDescriptor> for DescriptorRef<'a> {
    fn from(d: &'a FieldDescriptor) -> Self {
        Self::Field(d)
    }
}

impl<'a> From<&'a ParameterDescriptor> for DescriptorRef<'a> {
    fn from(d: &'a ParameterDescriptor) -> Self {
        Self::Parameter(d)
    }
}

impl<'a> From<&'a HeaderDescriptor> for DescriptorRef<'a> {
    fn from(d: &'a HeaderDescriptor) -> Self {
        Self::Header(d)
    }
}

impl<'a> From<&'a PartDescriptor> for DescriptorRef<'a> {
    fn from(d: &'a PartDescriptor) -> Self {
        Self::Part(d)
    }
}

// Form and multipart bodies are flat, so the parameter name is a valid path.
impl From<&ParameterDescriptor> for FieldDescriptor {
    fn from(d: &ParameterDescriptor) -> Self {
        Self {
            path: d.name.clone(),
            description: d.description.clone(),
            type_name: d.type_name.clone(),
            optional: d.optional,
            ignored: d.ignored,
            attributes: d.attributes.clone(),
        }
    }
}

impl From<&PartDescriptor> for FieldDescriptor {
    fn from(d: &PartDescriptor) -> Self {
        Self {
            path: d.name.clone(),
            description: d.description.clone(),
            type_name: d.type_name.clone(),
            optional: d.optional,
            ignored: d.ignored,
            attributes: d.attributes.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn resource(operation_id: &str, path: &str) -> ResourceModel {
        serde_json::from_value(json!({
            "operationId": operation_id,
            "request": { "path": path, "method": "GET" },
            "response": { "status": 200 }
        }))
        .unwrap()
    }

    #[test]
    fn test_deserialize_snapshot() {
        let model: ResourceModel = serde_json::from_value(json!({
            "operationId": "createItem",
            "summary": "Create an item",
            "privateResource": false,
            "deprecated": false,
            "tags": ["items"],
            "request": {
                "path": "/items",
                "method": "post",
                "contentType": "application/json",
                "securityRequirements": { "type": "OAUTH2", "requiredScopes": ["write"] },
                "requestFields": [{
                    "path": "name",
                    "description": "Item name",
                    "type": "STRING",
                    "attributes": {
                        "validationConstraints": [
                            { "name": "javax.validation.constraints.NotBlank", "configuration": {} }
                        ]
                    }
                }]
            },
            "response": { "status": 201, "contentType": "application/json" }
        }))
        .unwrap();

        assert_eq!(model.request.method, HttpMethod::Post);
        assert_eq!(
            model.request.security_requirements,
            Some(SecurityRequirements::oauth2(["write"]))
        );
        let constraint = &model.request.request_fields[0].attributes.validation_constraints[0];
        assert_eq!(constraint.name, ConstraintKind::NotBlank);
        assert_eq!(model.response.status, 201);
    }

    #[test]
    fn test_unknown_method_is_rejected() {
        let result = serde_json::from_value::<RequestModel>(json!({"path": "/x", "method": "TRACE"}));
        let err = result.unwrap_err().to_string();
        assert!(err.contains("Unknown HTTP method 'TRACE'"), "{err}");
    }

    #[test]
    fn test_data_type_is_case_insensitive() {
        assert_eq!(DataType::parse("String"), Some(DataType::String));
        assert_eq!(DataType::parse("VARIES"), Some(DataType::Varies));
        assert_eq!(DataType::parse("money"), None);
        let err = DataType::resolve("price", "money").unwrap_err();
        assert!(matches!(err, Error::InvalidType { ref path, .. } if path == "price"));
    }

    #[test]
    fn test_constraint_kind_keeps_unknown_names() {
        let kind = ConstraintKind::from("com.example.Custom");
        assert_eq!(kind, ConstraintKind::Other("com.example.Custom".to_string()));
        assert_eq!(String::from(ConstraintKind::DecimalMin), "DecimalMin");
    }

    #[test]
    fn test_group_by_path_ordering() {
        let resources = vec![
            resource("getOrderLine", "/orders/{id}/lines"),
            resource("getItem", "/items/{id}"),
            resource("getOrder", "/orders/{id}"),
            resource("listItems", "/items"),
            resource("getItemAgain", "/items/{id}"),
        ];
        let groups = group_by_path(&resources);
        let keys: Vec<&str> = groups.keys().map(String::as_str).collect();
        assert_eq!(
            keys,
            vec!["/items", "/items/{id}", "/orders/{id}", "/orders/{id}/lines"]
        );
        assert_eq!(groups["/items/{id}"].len(), 2);
    }

    #[test]
    fn test_parameter_maps_to_field() {
        let mut parameter = ParameterDescriptor::new("page", "integer");
        parameter.optional = true;
        let field = FieldDescriptor::from(&parameter);
        assert_eq!(field.path, "page");
        assert!(field.optional);
        assert_eq!(DescriptorRef::from(&field).label(), "page");
    }
}
