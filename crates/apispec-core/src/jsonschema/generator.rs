//! Tree construction from flat field descriptors.

// Internal imports (std, crate)
use crate::jsonschema::path::{JsonFieldPath, Segment};
use crate::jsonschema::reduce::{reduce, MergedField};
use crate::model::{DataType, FieldDescriptor};
use crate::schema::Schema;
use crate::{Error, Result};

// External imports (alphabetized)
use indexmap::IndexMap;
use log::debug;

struct CompiledField {
    field: MergedField,
    path: JsonFieldPath,
}

impl CompiledField {
    fn remaining<'p>(&'p self, traversed: &[Segment]) -> &'p [Segment] {
        self.path.remaining_segments(traversed)
    }

    fn is_direct_match(&self, traversed: &[Segment]) -> bool {
        match self.remaining(traversed) {
            [] => true,
            [only] => only.is_array(),
            _ => false,
        }
    }
}

/// Build a JSON Schema describing the body the descriptors document.
///
/// Descriptors are merged first (see [`reduce`]); ignored fields are dropped
/// and fields carrying a required constraint are listed in `required`. A body
/// whose only top-level path is the array marker becomes an array schema.
pub fn generate(descriptors: &[FieldDescriptor], title: Option<&str>) -> Result<Schema> {
    let fields: Vec<CompiledField> = reduce(descriptors)?
        .into_iter()
        .map(|field| CompiledField {
            path: JsonFieldPath::compile(&field.path),
            field,
        })
        .collect();
    let refs: Vec<&CompiledField> = fields.iter().collect();
    debug!("Building schema from {} merged fields", refs.len());

    let root = traverse(&[], &refs, None)?.with_title(title);
    Ok(unwrap_root_array(&refs, root))
}

fn traverse(traversed: &[Segment], fields: &[&CompiledField], description: Option<&str>) -> Result<Schema> {
    let mut schema = Schema::object().with_description(description);

    for (segment, group) in group_by_first_segment(traversed, fields)? {
        let mut next = traversed.to_vec();
        next.push(segment.clone());

        let (direct, rest): (Vec<&CompiledField>, Vec<&CompiledField>) =
            group.iter().partition(|f| f.is_direct_match(&next));

        match (direct.as_slice(), rest.is_empty()) {
            ([leaf], true) => {
                if !leaf.field.ignored {
                    let property = leaf_property(leaf);
                    schema = schema.with_property(segment.property_name(), property, leaf.field.is_required());
                }
            }
            _ => {
                let property_field = direct.first().copied();
                if let (Some(parent), false) = (property_field, rest.is_empty()) {
                    ensure_holds_children(parent, &rest, &next)?;
                }
                let remaining = if rest.is_empty() { &direct[..] } else { &rest[..] };
                let required = property_field.map_or(false, |f| f.field.is_required());
                let property = nested_property(&next, remaining, property_field)?;
                schema = schema.with_property(segment.property_name(), property, required);
            }
        }
    }
    Ok(schema)
}

// A parent documented with a scalar type cannot have fields below it. A path
// ending in `[]` types the elements, which must be objects or arrays; any
// other parent must be an object for key children and an array for `[]`.
fn ensure_holds_children(parent: &CompiledField, children: &[&CompiledField], traversed: &[Segment]) -> Result<()> {
    let types: Vec<DataType> = parent.field.types().collect();
    if types.iter().any(|t| matches!(t, DataType::Varies | DataType::Null)) {
        return Ok(());
    }
    let holds = |data_type: DataType| types.contains(&data_type);

    let fits = if parent.path.segments().last().map_or(false, Segment::is_array) {
        holds(DataType::Object) || holds(DataType::Array)
    } else {
        children.iter().all(|child| match child.remaining(traversed).first() {
            Some(Segment::Array) => holds(DataType::Array),
            _ => holds(DataType::Object),
        })
    };
    if fits {
        Ok(())
    } else {
        Err(Error::path_conflict(&parent.field.path))
    }
}

// A leaf path ending in `[]` documents the elements of an array.
fn leaf_property(leaf: &CompiledField) -> Schema {
    let schema = leaf.field.schema();
    let ends_in_array = leaf.path.segments().last().map_or(false, Segment::is_array);
    if !ends_in_array || schema.is_array() {
        return schema;
    }
    let description = schema.description.clone();
    Schema::array(schema.with_description(None)).with_description(description.as_deref())
}

fn nested_property(
    traversed: &[Segment],
    fields: &[&CompiledField],
    property_field: Option<&CompiledField>,
) -> Result<Schema> {
    let first = fields[0];
    let remaining = first.remaining(traversed);
    let description = property_field.map(|f| f.field.description.as_str());

    match remaining.first() {
        Some(Segment::Array) => {
            let mut next = traversed.to_vec();
            next.push(Segment::Array);
            let mut items = traverse(&next, fields, None)?;
            // `[][]`: the element is itself an array, not an object keyed "[]"
            if fields.iter().all(|f| f.remaining(&next).first() == Some(&Segment::Array)) {
                if let Some(inner) = items.properties.shift_remove(Segment::Array.property_name()) {
                    items = inner;
                }
            }
            let mut array = Schema::array(items).with_description(description);
            if let Some(property_field) = property_field {
                array = array.with_constraints(&property_field.field.attributes.constraints());
            }
            Ok(array)
        }
        Some(Segment::Key(_)) => traverse(traversed, fields, description),
        None => Err(Error::path_conflict(&first.field.path)),
    }
}

fn group_by_first_segment<'f>(
    traversed: &[Segment],
    fields: &[&'f CompiledField],
) -> Result<IndexMap<Segment, Vec<&'f CompiledField>>> {
    let mut groups: IndexMap<Segment, Vec<&CompiledField>> = IndexMap::new();
    for field in fields {
        let first = field
            .remaining(traversed)
            .first()
            .ok_or_else(|| Error::path_conflict(&field.field.path))?;
        groups.entry(first.clone()).or_default().push(field);
    }
    Ok(groups)
}

fn unwrap_root_array(fields: &[&CompiledField], mut root: Schema) -> Schema {
    let is_root_array = !fields.is_empty()
        && fields
            .iter()
            .all(|f| f.path.segments().first() == Some(&Segment::Array));
    if !is_root_array {
        return root;
    }

    let Some(items) = root.properties.shift_remove(Segment::Array.property_name()) else {
        return root;
    };
    let root_field = fields.iter().find(|f| f.path.segments() == [Segment::Array]);

    match root_field {
        Some(_) if fields.len() == 1 => items.with_title(root.title.as_deref()),
        Some(root_field) => Schema::array(items.with_description(None))
            .with_title(root.title.as_deref())
            .with_description(Some(&root_field.field.description))
            .with_constraints(&root_field.field.attributes.constraints()),
        None => Schema::array(items).with_title(root.title.as_deref()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Constraint, ConstraintKind};
    use proptest::prelude::*;
    use serde_json::{json, Value};

    fn required(field: FieldDescriptor) -> FieldDescriptor {
        field.with_constraint(Constraint::new(ConstraintKind::NotNull))
    }

    fn generate_json(fields: &[FieldDescriptor]) -> Value {
        serde_json::to_value(generate(fields, None).unwrap()).unwrap()
    }

    #[test]
    fn test_flat_object() {
        let fields = vec![
            required(FieldDescriptor::new("id", "string").with_description("Identifier")),
            FieldDescriptor::new("count", "integer").optional(),
        ];
        assert_eq!(
            generate_json(&fields),
            json!({
                "type": "object",
                "properties": {
                    "id": {"type": "string", "description": "Identifier"},
                    "count": {"type": "integer"}
                },
                "required": ["id"]
            })
        );
    }

    #[test]
    fn test_nested_objects() {
        let fields = vec![
            FieldDescriptor::new("owner", "object").with_description("Owner"),
            required(FieldDescriptor::new("owner.name", "string")),
            FieldDescriptor::new("owner.address.city", "string"),
        ];
        assert_eq!(
            generate_json(&fields),
            json!({
                "type": "object",
                "properties": {
                    "owner": {
                        "type": "object",
                        "description": "Owner",
                        "properties": {
                            "name": {"type": "string"},
                            "address": {
                                "type": "object",
                                "properties": {"city": {"type": "string"}}
                            }
                        },
                        "required": ["name"]
                    }
                }
            })
        );
    }

    #[test]
    fn test_array_of_objects() {
        let fields = vec![required(FieldDescriptor::new("tags[].name", "string"))];
        assert_eq!(
            generate_json(&fields),
            json!({
                "type": "object",
                "properties": {
                    "tags": {
                        "type": "array",
                        "items": {
                            "type": "object",
                            "properties": {"name": {"type": "string"}},
                            "required": ["name"]
                        }
                    }
                }
            })
        );
    }

    #[test]
    fn test_array_property_takes_size_constraints() {
        let fields = vec![
            FieldDescriptor::new("lines", "array")
                .with_constraint(Constraint::new(ConstraintKind::Size).with("min", 1))
                .with_description("Order lines"),
            FieldDescriptor::new("lines[].sku", "string"),
        ];
        let schema = generate_json(&fields);
        assert_eq!(schema["properties"]["lines"]["type"], json!("array"));
        assert_eq!(schema["properties"]["lines"]["minItems"], json!(1));
        assert_eq!(schema["properties"]["lines"]["description"], json!("Order lines"));
        assert_eq!(
            schema["properties"]["lines"]["items"]["properties"]["sku"],
            json!({"type": "string"})
        );
    }

    #[test]
    fn test_scalar_array_leaf() {
        let fields = vec![FieldDescriptor::new("ids[]", "integer")];
        assert_eq!(
            generate_json(&fields)["properties"]["ids"],
            json!({"type": "array", "items": {"type": "integer"}})
        );
    }

    #[test]
    fn test_root_array_of_scalars() {
        let fields = vec![FieldDescriptor::new("[]", "string")];
        assert_eq!(
            generate_json(&fields),
            json!({"type": "array", "items": {"type": "string"}})
        );
    }

    #[test]
    fn test_root_array_of_objects() {
        let fields = vec![
            FieldDescriptor::new("[]", "array").with_description("All items"),
            FieldDescriptor::new("[].id", "string"),
        ];
        let schema = generate(&fields, Some("items")).unwrap();
        assert_eq!(
            serde_json::to_value(&schema).unwrap(),
            json!({
                "type": "array",
                "title": "items",
                "description": "All items",
                "items": {
                    "type": "object",
                    "properties": {"id": {"type": "string"}}
                }
            })
        );
    }

    #[test]
    fn test_nested_array_markers_give_array_of_arrays() {
        let fields = vec![FieldDescriptor::new("grid[][]", "number")];
        assert_eq!(
            generate_json(&fields)["properties"]["grid"],
            json!({"type": "array", "items": {"type": "array", "items": {"type": "number"}}})
        );
    }

    #[test]
    fn test_nested_arrays_of_objects() {
        let fields = vec![FieldDescriptor::new("matrix[][].cell", "string")];
        assert_eq!(
            generate_json(&fields)["properties"]["matrix"],
            json!({
                "type": "array",
                "items": {
                    "type": "array",
                    "items": {"type": "object", "properties": {"cell": {"type": "string"}}}
                }
            })
        );
    }

    #[test]
    fn test_scalar_and_array_at_same_path_conflict() {
        for fields in [
            vec![FieldDescriptor::new("a", "string"), FieldDescriptor::new("a[]", "string")],
            vec![FieldDescriptor::new("a[]", "string"), FieldDescriptor::new("a", "string")],
        ] {
            assert!(matches!(
                generate(&fields, None),
                Err(Error::PathConflict { .. })
            ));
        }
    }

    #[test]
    fn test_scalar_with_children_conflicts() {
        let fields = vec![
            FieldDescriptor::new("name", "string"),
            FieldDescriptor::new("name.first", "string"),
        ];
        assert!(matches!(
            generate(&fields, None),
            Err(Error::PathConflict { ref path }) if path == "name"
        ));
    }

    #[test]
    fn test_array_with_key_child_conflicts() {
        let fields = vec![
            FieldDescriptor::new("items", "array"),
            FieldDescriptor::new("items.x", "string"),
        ];
        assert!(matches!(
            generate(&fields, None),
            Err(Error::PathConflict { ref path }) if path == "items"
        ));
    }

    #[test]
    fn test_scalar_elements_with_children_conflict() {
        let fields = vec![
            FieldDescriptor::new("tags[]", "string"),
            FieldDescriptor::new("tags[].name", "string"),
        ];
        assert!(matches!(
            generate(&fields, None),
            Err(Error::PathConflict { ref path }) if path == "tags[]"
        ));
    }

    #[test]
    fn test_typed_parents_hold_children() {
        let fields = vec![
            FieldDescriptor::new("owner", "object"),
            FieldDescriptor::new("owner.name", "string"),
            FieldDescriptor::new("tags[]", "object"),
            FieldDescriptor::new("tags[].name", "string"),
            FieldDescriptor::new("meta", "varies"),
            FieldDescriptor::new("meta.at", "string"),
        ];
        let schema = generate_json(&fields);
        assert_eq!(schema["properties"]["owner"]["properties"]["name"]["type"], "string");
        assert_eq!(schema["properties"]["tags"]["items"]["properties"]["name"]["type"], "string");
        assert_eq!(schema["properties"]["meta"]["properties"]["at"]["type"], "string");
    }

    #[test]
    fn test_ignored_fields_are_omitted() {
        let fields = vec![
            FieldDescriptor::new("id", "string"),
            FieldDescriptor::new("_links", "object").ignored(),
        ];
        let schema = generate_json(&fields);
        assert!(schema["properties"].get("_links").is_none());
    }

    #[test]
    fn test_empty_descriptors_give_bare_object() {
        assert_eq!(generate_json(&[]), json!({"type": "object"}));
    }

    #[test]
    fn test_unknown_type_is_reported() {
        let fields = vec![FieldDescriptor::new("price", "money")];
        assert!(matches!(
            generate(&fields, None),
            Err(Error::InvalidType { ref path, .. }) if path == "price"
        ));
    }

    #[test]
    fn test_required_only_for_non_ignored() {
        let fields = vec![required(FieldDescriptor::new("secret", "string").ignored())];
        let schema = generate(&fields, None).unwrap();
        assert!(schema.required.is_empty());
        assert!(schema.properties.is_empty());
    }

    fn assert_required_are_properties(schema: &Schema) {
        for name in &schema.required {
            assert!(schema.properties.contains_key(name), "{name} missing from properties");
        }
        schema.properties.values().for_each(assert_required_are_properties);
        schema.one_of.iter().for_each(assert_required_are_properties);
        if let Some(items) = &schema.items {
            assert_required_are_properties(items);
        }
    }

    fn field() -> impl Strategy<Value = FieldDescriptor> {
        let paths = vec!["id", "owner.name", "owner.email", "tags[].name", "tags[].id", "meta.created.at"];
        let types = vec!["string", "integer", "number", "boolean"];
        (
            prop::sample::select(paths),
            prop::sample::select(types),
            any::<bool>(),
            any::<bool>(),
        )
            .prop_map(|(path, t, is_required, ignored)| {
                let field = FieldDescriptor {
                    ignored,
                    ..FieldDescriptor::new(path, t)
                };
                if is_required {
                    required(field)
                } else {
                    field
                }
            })
    }

    proptest! {
        #[test]
        fn required_names_always_have_properties(fields in proptest::collection::vec(field(), 0..10)) {
            let schema = generate(&fields, Some("body")).unwrap();
            assert_required_are_properties(&schema);
        }
    }
}
