//! Conversion of parameter and header descriptors.

// Internal imports (std, crate)
use crate::model::{DataType, DescriptorRef, HeaderDescriptor, ParameterDescriptor};
use crate::openapi::types::{Header, Parameter, ParameterLocation, ParameterStyle};
use crate::schema::{self, Schema, SchemaType};
use crate::{Error, Result};

// External imports (alphabetized)
use log::warn;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value as JsonValue;

static PATH_PARAMETER_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{([^/}]+)\}").expect("path parameter pattern is valid"));

/// Placeholder names of a path template, in order of appearance.
pub fn path_parameter_names(path: &str) -> Vec<&str> {
    PATH_PARAMETER_PATTERN
        .captures_iter(path)
        .filter_map(|c| c.get(1).map(|m| m.as_str()))
        .collect()
}

/// Schema for a flat value (parameter, header or array item).
pub fn simple_type_to_schema(descriptor: DescriptorRef<'_>) -> Result<Schema> {
    let attributes = descriptor.attributes();
    let constraints = attributes.constraints();
    let format = attributes.format.as_deref();

    let schema = match descriptor.data_type()? {
        DataType::Boolean => Schema::boolean(),
        DataType::String | DataType::Enum => Schema::string().with_constraints(&constraints),
        data_type @ (DataType::Number | DataType::Integer) => {
            Schema::of_type(schema::numeric_type(data_type, format)).with_constraints(&constraints)
        }
        DataType::Array => {
            let mut array = Schema::of_type(SchemaType::Array).with_constraints(&constraints);
            if let Some(item) = &attributes.items {
                array.items = Some(Box::new(simple_type_to_schema(DescriptorRef::Item(item))?));
            }
            array
        }
        DataType::Object => Schema::object(),
        DataType::Null | DataType::Varies => {
            return Err(Error::invalid_type(descriptor.label(), descriptor.type_name()))
        }
    };

    Ok(schema
        .with_format(format)
        .with_enum_values(&attributes.enum_values)
        .with_default(descriptor.default_value().cloned()))
}

pub fn path_parameter(descriptor: &ParameterDescriptor) -> Result<Parameter> {
    let mut parameter = base_parameter(DescriptorRef::Parameter(descriptor), &descriptor.name, ParameterLocation::Path)?;
    parameter.required = true;
    Ok(parameter)
}

/// Path parameter for a placeholder no descriptor documents.
pub fn placeholder_path_parameter(name: &str) -> Parameter {
    Parameter {
        name: name.to_string(),
        location: ParameterLocation::Path,
        description: None,
        required: true,
        style: None,
        explode: None,
        allow_reserved: None,
        schema: Some(Schema::string()),
        example: None,
    }
}

pub fn query_parameter(descriptor: &ParameterDescriptor) -> Result<Parameter> {
    base_parameter(DescriptorRef::Parameter(descriptor), &descriptor.name, ParameterLocation::Query)
}

pub fn header_parameter(descriptor: &HeaderDescriptor) -> Result<Parameter> {
    let mut parameter = base_parameter(DescriptorRef::Header(descriptor), &descriptor.name, ParameterLocation::Header)?;
    parameter.example = descriptor.example.clone().map(JsonValue::String);
    Ok(parameter)
}

pub fn response_header(descriptor: &HeaderDescriptor) -> Result<Header> {
    Ok(Header {
        description: non_blank(&descriptor.description),
        schema: Some(simple_type_to_schema(DescriptorRef::Header(descriptor))?),
        example: descriptor.example.clone().map(JsonValue::String),
    })
}

fn base_parameter(descriptor: DescriptorRef<'_>, name: &str, location: ParameterLocation) -> Result<Parameter> {
    let mut parameter = Parameter {
        name: name.to_string(),
        location,
        description: non_blank(descriptor.description()),
        required: !descriptor.optional() || descriptor.constraints().is_required(),
        style: None,
        explode: None,
        allow_reserved: None,
        schema: Some(simple_type_to_schema(descriptor)?),
        example: None,
    };

    if let Some(encoding) = &descriptor.attributes().encoding {
        parameter.style = ParameterStyle::parse(&encoding.style);
        if parameter.style.is_none() {
            warn!("Ignoring unknown style '{}' on parameter '{}'", encoding.style, name);
        }
        parameter.explode = encoding.explode;
        parameter.allow_reserved = encoding.allow_reserved;
    }
    Ok(parameter)
}

fn non_blank(value: &str) -> Option<String> {
    (!value.trim().is_empty()).then(|| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Constraint, ConstraintKind, Encoding, ItemDescriptor};
    use serde_json::json;

    #[test]
    fn test_path_parameter_names() {
        assert_eq!(path_parameter_names("/orders/{orderId}/lines/{lineId}"), vec!["orderId", "lineId"]);
        assert!(path_parameter_names("/orders").is_empty());
    }

    #[test]
    fn test_query_parameter_with_encoding() {
        let mut descriptor = ParameterDescriptor::new("sort", "array");
        descriptor.optional = true;
        descriptor.description = "Sort order".into();
        descriptor.attributes.items = Some(Box::new(ItemDescriptor {
            type_name: "string".into(),
            description: String::new(),
            attributes: Default::default(),
        }));
        descriptor.attributes.encoding = Some(Encoding {
            style: "FORM".into(),
            explode: Some(false),
            allow_reserved: None,
        });

        let parameter = query_parameter(&descriptor).unwrap();
        assert_eq!(
            serde_json::to_value(&parameter).unwrap(),
            json!({
                "name": "sort",
                "in": "query",
                "description": "Sort order",
                "style": "form",
                "explode": false,
                "schema": {"type": "array", "items": {"type": "string"}}
            })
        );
    }

    #[test]
    fn test_optional_parameter_with_required_constraint() {
        let mut descriptor = ParameterDescriptor::new("q", "string");
        descriptor.optional = true;
        descriptor
            .attributes
            .validation_constraints
            .push(Constraint::new(ConstraintKind::NotBlank));
        assert!(query_parameter(&descriptor).unwrap().required);
    }

    #[test]
    fn test_simple_schema_default_enum_and_format() {
        let mut descriptor = ParameterDescriptor::new("since", "string");
        descriptor.default_value = Some(json!("2024-01-01T00:00:00Z"));
        descriptor.attributes.format = Some("datetime".into());
        let schema = simple_type_to_schema(DescriptorRef::Parameter(&descriptor)).unwrap();
        assert_eq!(
            serde_json::to_value(schema).unwrap(),
            json!({"type": "string", "format": "date-time", "default": "2024-01-01T00:00:00Z"})
        );

        let mut descriptor = ParameterDescriptor::new("state", "enum");
        descriptor.attributes.enum_values = vec![json!("OPEN"), json!("CLOSED")];
        let schema = simple_type_to_schema(DescriptorRef::Parameter(&descriptor)).unwrap();
        assert_eq!(
            serde_json::to_value(schema).unwrap(),
            json!({"type": "string", "enum": ["OPEN", "CLOSED"]})
        );
    }

    #[test]
    fn test_header_parameter_keeps_example() {
        let header = HeaderDescriptor::new("X-Request-Id", "string").with_example("abc-123");
        let parameter = header_parameter(&header).unwrap();
        assert_eq!(parameter.location, ParameterLocation::Header);
        assert!(parameter.required);
        assert_eq!(parameter.example, Some(json!("abc-123")));
    }

    #[test]
    fn test_placeholder_is_required_string() {
        assert_eq!(
            serde_json::to_value(placeholder_path_parameter("id")).unwrap(),
            json!({"name": "id", "in": "path", "required": true, "schema": {"type": "string"}})
        );
    }

    #[test]
    fn test_null_type_is_invalid_for_parameters() {
        let descriptor = ParameterDescriptor::new("x", "null");
        assert!(matches!(query_parameter(&descriptor), Err(Error::InvalidType { .. })));
    }
}
