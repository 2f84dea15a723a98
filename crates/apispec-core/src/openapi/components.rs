//! Hoisting of inline body schemas into `components.schemas`.

// Internal imports (std, crate)
use std::collections::{BTreeMap, HashMap};

use crate::canonical;
use crate::openapi::types::{MediaType, PathItem};
use crate::schema::Schema;
use crate::Result;

// External imports (alphabetized)
use indexmap::IndexMap;
use log::warn;

const HASH_LENGTH: usize = 8;

/// Replace every request and response body schema with a `$ref` and return
/// the referenced schemas keyed by component name.
///
/// Equal schemas share one component. A schema keeps its declared name when
/// it has one; otherwise the name is derived from the path plus a content hash.
pub fn extract_schemas(paths: &mut IndexMap<String, PathItem>) -> Result<BTreeMap<String, Schema>> {
    let mut registry = SchemaRegistry::default();

    for (path, item) in paths.iter_mut() {
        for operation in item.operations_mut() {
            if let Some(body) = operation.request_body.as_mut() {
                for media in body.content.values_mut() {
                    registry.extract(path, media)?;
                }
            }
            if let Some(responses) = operation.responses.as_mut() {
                for response in responses.values_mut() {
                    for media in response.content.values_mut() {
                        registry.extract(path, media)?;
                    }
                }
            }
        }
    }
    Ok(registry.schemas)
}

#[derive(Default)]
struct SchemaRegistry {
    keys: HashMap<(Option<String>, String), String>,
    schemas: BTreeMap<String, Schema>,
}

impl SchemaRegistry {
    fn extract(&mut self, path: &str, media: &mut MediaType) -> Result<()> {
        let Some(schema) = media.schema.take() else {
            return Ok(());
        };
        let key = self.register(path, schema)?;
        media.schema = Some(Schema::reference(&key));
        Ok(())
    }

    fn register(&mut self, path: &str, mut schema: Schema) -> Result<String> {
        let canonical = canonical::to_canonical_string(&schema)?;
        let identity = (schema.name.clone(), canonical);
        if let Some(key) = self.keys.get(&identity) {
            return Ok(key.clone());
        }

        let hash = canonical::content_hash(&identity.1);
        let short_hash = &hash[..HASH_LENGTH];
        let mut key = match schema.name.take() {
            Some(name) => name,
            None => format!("{}-{}", path_base_name(path), short_hash),
        };
        if self.schemas.contains_key(&key) {
            let unique = format!("{key}-{short_hash}");
            warn!("Schema name '{}' is used for different shapes, registering '{}'", key, unique);
            key = unique;
        }

        self.schemas.insert(key.clone(), schema);
        self.keys.insert(identity, key.clone());
        Ok(key)
    }
}

/// `/orders/{id}/lines` becomes `orders-id-lines`.
fn path_base_name(path: &str) -> String {
    let base = path
        .trim_start_matches('/')
        .replace('/', "-")
        .replace(['{', '}'], "");
    if base.is_empty() {
        "root".to_string()
    } else {
        base
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::HttpMethod;
    use crate::openapi::types::{Operation, RequestBody, Response};
    use serde_json::json;

    fn operation(request: Option<Schema>, response: Schema) -> Operation {
        Operation {
            operation_id: "op".into(),
            request_body: request.map(|schema| RequestBody {
                content: IndexMap::from([(
                    "application/json".to_string(),
                    MediaType {
                        schema: Some(schema),
                        ..MediaType::default()
                    },
                )]),
            }),
            responses: Some(IndexMap::from([(
                "200".to_string(),
                Response {
                    description: "OK".into(),
                    content: IndexMap::from([(
                        "application/json".to_string(),
                        MediaType {
                            schema: Some(response),
                            ..MediaType::default()
                        },
                    )]),
                    ..Response::default()
                },
            )])),
            ..Operation::default()
        }
    }

    fn item(op: Operation) -> PathItem {
        let mut item = PathItem::default();
        item.set_operation(HttpMethod::Post, op);
        item
    }

    fn reference(item: &PathItem) -> serde_json::Value {
        let op = item.operation(HttpMethod::Post).unwrap();
        serde_json::to_value(&op.responses.as_ref().unwrap()["200"].content["application/json"].schema).unwrap()
    }

    #[test]
    fn test_equal_schemas_share_one_component() {
        let body = Schema::object().with_property("id", Schema::string(), true);
        let mut paths = IndexMap::from([
            ("/items/{id}".to_string(), item(operation(Some(body.clone()), body.clone()))),
        ]);
        let schemas = extract_schemas(&mut paths).unwrap();

        assert_eq!(schemas.len(), 1);
        let (name, stored) = schemas.iter().next().unwrap();
        assert!(name.starts_with("items-id-"), "{name}");
        assert_eq!(name.len(), "items-id-".len() + HASH_LENGTH);
        assert_eq!(stored, &body);
        assert_eq!(reference(&paths["/items/{id}"]), json!({"$ref": format!("#/components/schemas/{name}")}));
    }

    #[test]
    fn test_names_are_stable_across_runs() {
        let body = Schema::object().with_property("n", Schema::integer(), false);
        let mut first = IndexMap::from([("/a".to_string(), item(operation(None, body.clone())))]);
        let mut second = IndexMap::from([("/a".to_string(), item(operation(None, body)))]);
        assert_eq!(
            extract_schemas(&mut first).unwrap().keys().collect::<Vec<_>>(),
            extract_schemas(&mut second).unwrap().keys().collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_declared_name_collision_gets_suffix() {
        let mut named_a = Schema::object().with_property("a", Schema::string(), false);
        named_a.name = Some("Payload".into());
        let mut named_b = Schema::object().with_property("b", Schema::string(), false);
        named_b.name = Some("Payload".into());

        let mut paths = IndexMap::from([("/x".to_string(), item(operation(Some(named_a), named_b)))]);
        let schemas = extract_schemas(&mut paths).unwrap();
        let names: Vec<&String> = schemas.keys().collect();
        assert_eq!(names.len(), 2);
        assert_eq!(names[0], "Payload");
        assert!(names[1].starts_with("Payload-"));
    }

    #[test]
    fn test_path_base_name() {
        assert_eq!(path_base_name("/orders/{id}/lines"), "orders-id-lines");
        assert_eq!(path_base_name("/"), "root");
    }
}
