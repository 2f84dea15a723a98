//! Merging of descriptors that share a path.
//!
//! The same field is usually described by many snapshots. Identical
//! declarations collapse to one; declarations whose types differ are merged
//! into a single field whose schema is a `oneOf` over the distinct types.

// Internal imports (std, crate)
use std::collections::HashMap;

use crate::jsonschema::leaf::leaf_schema;
use crate::model::{Attributes, DataType, DescriptorRef, FieldDescriptor};
use crate::schema::Schema;
use crate::Result;

/// A field after merging, carrying one schema per distinct observed type.
#[derive(Debug, Clone)]
pub struct MergedField {
    pub path: String,
    pub description: String,
    pub optional: bool,
    pub ignored: bool,
    pub attributes: Attributes,
    alternatives: Vec<(DataType, Schema)>,
}

impl MergedField {
    fn new(descriptor: &FieldDescriptor) -> Result<Self> {
        let view = DescriptorRef::Field(descriptor);
        Ok(Self {
            path: descriptor.path.clone(),
            description: descriptor.description.clone(),
            optional: descriptor.optional,
            ignored: descriptor.ignored,
            attributes: descriptor.attributes.clone(),
            alternatives: vec![(view.data_type()?, leaf_schema(view)?)],
        })
    }

    fn has_type(&self, data_type: DataType) -> bool {
        self.alternatives.iter().any(|(t, _)| *t == data_type)
    }

    // An ignored flag only survives when both sides are optional and ignored.
    fn absorb(&mut self, other: MergedField) {
        self.ignored = self.optional && self.ignored && other.optional && other.ignored;
        self.optional = self.optional || other.optional;
        if self.attributes.format.is_none() {
            self.attributes.format = other.attributes.format;
        }
        for (data_type, schema) in other.alternatives {
            if !self.has_type(data_type) {
                self.alternatives.push((data_type, schema));
            }
        }
    }

    pub fn is_required(&self) -> bool {
        self.attributes.constraints().is_required()
    }

    pub fn types(&self) -> impl Iterator<Item = DataType> + '_ {
        self.alternatives.iter().map(|(t, _)| *t)
    }

    /// Leaf schema with the description attached.
    pub fn schema(&self) -> Schema {
        let schema = match self.alternatives.as_slice() {
            [(_, single)] => single.clone(),
            alternatives => Schema::one_of(alternatives.iter().map(|(_, s)| s.clone()).collect()),
        };
        schema.with_description(Some(&self.description))
    }
}

/// Collapse descriptors sharing a path.
///
/// Later declarations win for description and attributes. Output order
/// follows the first occurrence of each path in the input.
pub fn reduce(descriptors: &[FieldDescriptor]) -> Result<Vec<MergedField>> {
    let mut merged: Vec<MergedField> = Vec::with_capacity(descriptors.len());

    for descriptor in descriptors.iter().rev() {
        let data_type = DescriptorRef::Field(descriptor).data_type()?;
        match merged.iter_mut().find(|m| m.path == descriptor.path) {
            Some(existing) if existing.has_type(data_type) => {}
            Some(existing) => existing.absorb(MergedField::new(descriptor)?),
            None => merged.push(MergedField::new(descriptor)?),
        }
    }

    let mut first_seen: HashMap<&str, usize> = HashMap::new();
    for (index, descriptor) in descriptors.iter().enumerate() {
        first_seen.entry(descriptor.path.as_str()).or_insert(index);
    }
    merged.sort_by_key(|m| first_seen[m.path.as_str()]);
    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn test_identical_descriptors_collapse() {
        let fields = vec![
            FieldDescriptor::new("id", "string").with_description("first"),
            FieldDescriptor::new("id", "string").with_description("second"),
        ];
        let merged = reduce(&fields).unwrap();
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].description, "second");
    }

    #[test]
    fn test_differing_types_become_one_of() {
        let fields = vec![
            FieldDescriptor::new("value", "string"),
            FieldDescriptor::new("value", "number").optional(),
        ];
        let merged = reduce(&fields).unwrap();
        assert_eq!(merged.len(), 1);
        assert!(merged[0].optional);
        let schema = serde_json::to_value(merged[0].schema()).unwrap();
        assert_eq!(schema, json!({"oneOf": [{"type": "number"}, {"type": "string"}]}));
    }

    #[test]
    fn test_ignored_requires_both_sides() {
        let fields = vec![
            FieldDescriptor::new("x", "string").optional().ignored(),
            FieldDescriptor::new("x", "boolean").ignored(),
        ];
        assert!(!reduce(&fields).unwrap()[0].ignored);

        let fields = vec![
            FieldDescriptor::new("x", "string").optional().ignored(),
            FieldDescriptor::new("x", "boolean").optional().ignored(),
        ];
        assert!(reduce(&fields).unwrap()[0].ignored);
    }

    #[test]
    fn test_output_follows_input_order() {
        let fields = vec![
            FieldDescriptor::new("a", "string"),
            FieldDescriptor::new("b", "string"),
            FieldDescriptor::new("a", "string"),
            FieldDescriptor::new("c", "string"),
        ];
        let paths: Vec<String> = reduce(&fields).unwrap().into_iter().map(|m| m.path).collect();
        assert_eq!(paths, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_repeated_types_are_not_duplicated() {
        let fields = vec![
            FieldDescriptor::new("v", "string"),
            FieldDescriptor::new("v", "number"),
            FieldDescriptor::new("v", "boolean"),
            FieldDescriptor::new("v", "number"),
        ];
        let merged = reduce(&fields).unwrap();
        assert_eq!(merged[0].types().count(), 3);
    }

    fn type_name() -> impl Strategy<Value = &'static str> {
        prop::sample::select(vec!["string", "integer", "number", "boolean", "object", "array"])
    }

    fn descriptor() -> impl Strategy<Value = FieldDescriptor> {
        ("[a-c]", type_name(), any::<bool>(), any::<bool>()).prop_map(|(path, t, optional, ignored)| {
            FieldDescriptor {
                optional,
                ignored,
                ..FieldDescriptor::new(path, t)
            }
        })
    }

    proptest! {
        #[test]
        fn reduce_yields_one_entry_per_path(fields in proptest::collection::vec(descriptor(), 0..12)) {
            let merged = reduce(&fields).unwrap();
            let mut paths: Vec<&str> = merged.iter().map(|m| m.path.as_str()).collect();
            let count = paths.len();
            paths.dedup();
            prop_assert_eq!(paths.len(), count);

            let doubled: Vec<FieldDescriptor> = fields.iter().chain(fields.iter()).cloned().collect();
            prop_assert_eq!(reduce(&doubled).unwrap().len(), merged.len());
        }

        #[test]
        fn merged_flags_combine_inputs(a in descriptor(), b in descriptor()) {
            prop_assume!(a.type_name != b.type_name);
            let b = FieldDescriptor { path: a.path.clone(), ..b };
            let merged = reduce(&[a.clone(), b.clone()]).unwrap();
            prop_assert_eq!(merged.len(), 1);
            prop_assert_eq!(merged[0].optional, a.optional || b.optional);
            prop_assert_eq!(merged[0].ignored, a.optional && a.ignored && b.optional && b.ignored);
            prop_assert_eq!(merged[0].types().count(), 2);
        }
    }
}
