//! Schema value object shared by the JSON Schema and OpenAPI generators.
//!
//! [`Schema`] covers the subset of JSON Schema draft-04 that OpenAPI 3.0 also
//! accepts. Values are assembled with consuming `with_*` methods and never
//! mutated once placed in a document.
//!
//! The second half of the module holds the mapping tables from abstract data
//! types, formats and constraint kinds to concrete schema keywords.

// Internal imports (std, crate)
use crate::constraints::Constraints;
use crate::model::DataType;

// External imports (alphabetized)
use indexmap::IndexMap;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

// Bounds are written as JSON numbers: integers when integral, otherwise
// the nearest double.
mod decimal_bound {
    use rust_decimal::prelude::ToPrimitive;
    use rust_decimal::Decimal;
    use serde::{de, Deserialize, Deserializer, Serializer};
    use serde_json::Number;

    pub fn serialize<S: Serializer>(value: &Option<Decimal>, serializer: S) -> Result<S::Ok, S::Error> {
        let Some(value) = value else {
            return serializer.serialize_none();
        };
        match value.fract().is_zero().then(|| value.to_i64()).flatten() {
            Some(integer) => serializer.serialize_i64(integer),
            None => serializer.serialize_f64(value.to_f64().unwrap_or_default()),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Decimal>, D::Error> {
        match Option::<Number>::deserialize(deserializer)? {
            Some(number) => crate::constraints::parse_decimal(&number.to_string())
                .map(Some)
                .ok_or_else(|| de::Error::custom(format!("invalid numeric bound {number}"))),
            None => Ok(None),
        }
    }
}

/// Prefix of local component references
pub const COMPONENTS_PREFIX: &str = "#/components/schemas/";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaType {
    String,
    Number,
    Integer,
    Boolean,
    Array,
    Object,
    Null,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    #[serde(rename = "$ref", default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub schema_type: Option<SchemaType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub properties: IndexMap<String, Schema>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<Schema>>,
    #[serde(rename = "oneOf", default, skip_serializing_if = "Vec::is_empty")]
    pub one_of: Vec<Schema>,
    #[serde(rename = "enum", default, skip_serializing_if = "Vec::is_empty")]
    pub enum_values: Vec<JsonValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<JsonValue>,
    #[serde(rename = "minLength", default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<u64>,
    #[serde(rename = "maxLength", default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u64>,
    #[serde(rename = "minItems", default, skip_serializing_if = "Option::is_none")]
    pub min_items: Option<u64>,
    #[serde(rename = "maxItems", default, skip_serializing_if = "Option::is_none")]
    pub max_items: Option<u64>,
    #[serde(default, with = "decimal_bound", skip_serializing_if = "Option::is_none")]
    pub minimum: Option<Decimal>,
    #[serde(default, with = "decimal_bound", skip_serializing_if = "Option::is_none")]
    pub maximum: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    /// Component name hint, consumed during extraction and never serialized
    #[serde(skip)]
    pub name: Option<String>,
}

impl Schema {
    pub fn of_type(schema_type: SchemaType) -> Self {
        Self {
            schema_type: Some(schema_type),
            ..Self::default()
        }
    }

    pub fn string() -> Self {
        Self::of_type(SchemaType::String)
    }

    pub fn number() -> Self {
        Self::of_type(SchemaType::Number)
    }

    pub fn integer() -> Self {
        Self::of_type(SchemaType::Integer)
    }

    pub fn boolean() -> Self {
        Self::of_type(SchemaType::Boolean)
    }

    pub fn object() -> Self {
        Self::of_type(SchemaType::Object)
    }

    pub fn null() -> Self {
        Self::of_type(SchemaType::Null)
    }

    /// Unconstrained schema, `{}`
    pub fn any() -> Self {
        Self::default()
    }

    pub fn array(items: Schema) -> Self {
        Self {
            items: Some(Box::new(items)),
            ..Self::of_type(SchemaType::Array)
        }
    }

    pub fn one_of(alternatives: Vec<Schema>) -> Self {
        Self {
            one_of: alternatives,
            ..Self::default()
        }
    }

    pub fn enumeration(values: Vec<JsonValue>) -> Self {
        Self {
            enum_values: values,
            ..Self::default()
        }
    }

    /// Reference into `#/components/schemas`
    pub fn reference(name: &str) -> Self {
        Self {
            reference: Some(format!("{COMPONENTS_PREFIX}{name}")),
            ..Self::default()
        }
    }

    /// Empty strings leave the title unset.
    pub fn with_title(mut self, title: Option<&str>) -> Self {
        self.title = non_blank(title);
        self
    }

    /// Empty strings leave the description unset.
    pub fn with_description(mut self, description: Option<&str>) -> Self {
        self.description = non_blank(description);
        self
    }

    pub fn with_format(mut self, format: Option<&str>) -> Self {
        if let Some(format) = non_blank(format) {
            self.format = Some(normalize_format(&format).to_string());
        }
        self
    }

    pub fn with_default(mut self, default: Option<JsonValue>) -> Self {
        self.default = default;
        self
    }

    pub fn with_enum_values(mut self, values: &[JsonValue]) -> Self {
        if !values.is_empty() {
            self.enum_values = values.to_vec();
        }
        self
    }

    pub fn with_property(mut self, name: impl Into<String>, schema: Schema, required: bool) -> Self {
        let name = name.into();
        if required && !self.required.contains(&name) {
            self.required.push(name.clone());
        }
        self.properties.insert(name, schema);
        self
    }

    /// Apply constraint-derived keywords valid for this schema's type.
    pub fn with_constraints(mut self, constraints: &Constraints<'_>) -> Self {
        for keyword in keywords_for(self.schema_type) {
            match keyword {
                Keyword::MinLength => self.min_length = constraints.min_size(),
                Keyword::MaxLength => self.max_length = constraints.max_size(),
                Keyword::Pattern => self.pattern = constraints.pattern().map(str::to_string),
                Keyword::MinItems => self.min_items = constraints.min_size(),
                Keyword::MaxItems => self.max_items = constraints.max_size(),
                Keyword::Minimum => self.minimum = constraints.min_number(),
                Keyword::Maximum => self.maximum = constraints.max_number(),
            }
        }
        self
    }

    pub fn is_array(&self) -> bool {
        self.schema_type == Some(SchemaType::Array)
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .filter(|v| !v.trim().is_empty())
        .map(str::to_string)
}

// Mapping tables

/// Schema keywords fed by validation constraints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    MinLength,
    MaxLength,
    Pattern,
    MinItems,
    MaxItems,
    Minimum,
    Maximum,
}

const STRING_KEYWORDS: &[Keyword] = &[Keyword::MinLength, Keyword::MaxLength, Keyword::Pattern];
const ARRAY_KEYWORDS: &[Keyword] = &[Keyword::MinItems, Keyword::MaxItems];
const NUMERIC_KEYWORDS: &[Keyword] = &[Keyword::Minimum, Keyword::Maximum];

/// Constraint keywords applicable to a schema type.
///
/// Size and Length constrain `minLength`/`maxLength` on strings and
/// `minItems`/`maxItems` on arrays; Min, Max and their decimal variants
/// constrain numbers. Other types take no constraint keywords.
pub fn keywords_for(schema_type: Option<SchemaType>) -> &'static [Keyword] {
    match schema_type {
        Some(SchemaType::String) => STRING_KEYWORDS,
        Some(SchemaType::Array) => ARRAY_KEYWORDS,
        Some(SchemaType::Number) | Some(SchemaType::Integer) => NUMERIC_KEYWORDS,
        _ => &[],
    }
}

/// Concrete numeric type. A `number` with an integer format is an `integer`.
pub fn numeric_type(data_type: DataType, format: Option<&str>) -> SchemaType {
    match (data_type, format) {
        (DataType::Integer, _) => SchemaType::Integer,
        (_, Some("int32")) | (_, Some("int64")) => SchemaType::Integer,
        _ => SchemaType::Number,
    }
}

/// Format names as they appear in JSON Schema.
pub fn normalize_format(format: &str) -> &str {
    match format {
        "datetime" => "date-time",
        other => other,
    }
}
