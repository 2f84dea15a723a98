//! Leaf schemas for a single descriptor.

// Internal imports (std, crate)
use crate::model::{Attributes, DataType, DescriptorRef};
use crate::schema::{self, Schema};
use crate::Result;

/// Schema for one descriptor, without its description.
pub(crate) fn leaf_schema(descriptor: DescriptorRef<'_>) -> Result<Schema> {
    let data_type = descriptor.data_type()?;
    let attributes = descriptor.attributes();
    let constraints = attributes.constraints();
    let format = attributes.format.as_deref();

    let schema = match data_type {
        DataType::Null => Schema::null(),
        DataType::Varies => Schema::any(),
        DataType::Object => Schema::object(),
        DataType::Boolean => Schema::boolean(),
        DataType::String => Schema::string()
            .with_format(format)
            .with_constraints(&constraints),
        DataType::Number | DataType::Integer => {
            Schema::of_type(schema::numeric_type(data_type, format))
                .with_format(format)
                .with_constraints(&constraints)
        }
        DataType::Array => Schema::array(items_schema(attributes)?).with_constraints(&constraints),
        DataType::Enum => Schema::one_of(vec![
            Schema::string(),
            Schema::enumeration(attributes.enum_values.clone()),
        ]),
    };
    Ok(schema)
}

// Element type is unknown without an items descriptor.
fn items_schema(attributes: &Attributes) -> Result<Schema> {
    match &attributes.items {
        Some(item) => leaf_schema(DescriptorRef::Item(item)),
        None => Ok(Schema::one_of(vec![
            Schema::object(),
            Schema::boolean(),
            Schema::string(),
            Schema::number(),
        ])),
    }
}
