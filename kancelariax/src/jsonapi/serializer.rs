//! Turns serializable records into JSON:API documents.
//!
//! A record's relationship fields are lifted out of `attributes` into `relationships` as
//! `{type, id}` references. Embedded related records end up once in the document-level
//! `included` list, in the order they are first seen.

use super::{
    Document, PrimaryData, Relationship, RelationshipData, ResourceIdentifier, ResourceObject, SerializationError,
};
use crate::types::ResourceType;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashSet};

/// Where the related records of a relationship come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationshipSource {
    /// The field with the relationship's name holds the related records. This is a to-many
    /// relationship: an absent or null field links to nothing (`[]`), a lone object to one record.
    Embedded,
    /// The named field holds the related record's id; nothing is added to `included`
    ForeignKey(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelationshipSpec {
    pub name: &'static str,
    pub resource_type: ResourceType,
    pub source: RelationshipSource,
}

impl RelationshipSpec {
    pub const fn new(name: &'static str, resource_type: ResourceType) -> Self {
        Self {
            name,
            resource_type,
            source: RelationshipSource::Embedded,
        }
    }

    pub const fn foreign_key(name: &'static str, resource_type: ResourceType, field: &'static str) -> Self {
        Self {
            name,
            resource_type,
            source: RelationshipSource::ForeignKey(field),
        }
    }
}

/// A record that can be rendered as a JSON:API resource object.
pub trait JsonApiResource: Serialize {
    const TYPE: ResourceType;
    const RELATIONSHIPS: &'static [RelationshipSpec] = &[];
}

/// Collects `included` resources, dropping repeats by type and id.
#[derive(Debug, Default)]
struct Included {
    seen: HashSet<(ResourceType, String)>,
    resources: Vec<ResourceObject>,
}

impl Included {
    fn push(&mut self, resource: ResourceObject) {
        if self.seen.insert((resource.resource_type, resource.id.clone())) {
            self.resources.push(resource);
        }
    }
}

fn id_of(value: &Value) -> Option<String> {
    match value {
        Value::String(id) if !id.is_empty() => Some(id.clone()),
        Value::Number(id) => Some(id.to_string()),
        _ => None,
    }
}

fn into_object(value: Value, resource_type: ResourceType) -> Result<Map<String, Value>, SerializationError> {
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(SerializationError::NotAnObject { resource_type }),
    }
}

/// Build a resource object for an embedded related record.
fn related_resource(value: Value, resource_type: ResourceType) -> Result<ResourceObject, SerializationError> {
    let attributes = into_object(value, resource_type)?;
    let id = attributes
        .get("id")
        .and_then(id_of)
        .ok_or(SerializationError::MissingId { resource_type })?;
    Ok(ResourceObject {
        resource_type,
        id,
        attributes,
        relationships: BTreeMap::new(),
    })
}

fn resource<T: JsonApiResource>(record: &T, included: &mut Included) -> Result<ResourceObject, SerializationError> {
    let mut attributes = into_object(serde_json::to_value(record)?, T::TYPE)?;
    let id = attributes
        .get("id")
        .and_then(id_of)
        .ok_or(SerializationError::MissingId { resource_type: T::TYPE })?;

    let mut relationships = BTreeMap::new();
    for spec in T::RELATIONSHIPS {
        let data = match spec.source {
            RelationshipSource::ForeignKey(field) => {
                let linkage = attributes
                    .remove(field)
                    .as_ref()
                    .and_then(id_of)
                    .map(|id| ResourceIdentifier::new(spec.resource_type, id));
                RelationshipData::One(linkage)
            }
            RelationshipSource::Embedded => {
                let items = match attributes.remove(spec.name) {
                    Some(Value::Array(items)) => items,
                    Some(Value::Null) | None => Vec::new(),
                    Some(item) => vec![item],
                };
                let mut linkage = Vec::with_capacity(items.len());
                for item in items {
                    let related = related_resource(item, spec.resource_type)?;
                    linkage.push(ResourceIdentifier::new(spec.resource_type, related.id.clone()));
                    included.push(related);
                }
                RelationshipData::Many(linkage)
            }
        };
        relationships.insert(spec.name.to_string(), Relationship { data });
    }

    Ok(ResourceObject {
        resource_type: T::TYPE,
        id,
        attributes,
        relationships,
    })
}

/// Serialize a list of records as a collection document.
pub fn collection<T: JsonApiResource>(records: &[T]) -> Result<Document, SerializationError> {
    let mut included = Included::default();
    let data = records
        .iter()
        .map(|record| resource(record, &mut included))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Document {
        data: PrimaryData::Many(data),
        included: included.resources,
        meta: Map::new(),
        links: None,
    })
}

/// Serialize a single record as a document.
pub fn single<T: JsonApiResource>(record: &T) -> Result<Document, SerializationError> {
    let mut included = Included::default();
    let data = resource(record, &mut included)?;
    Ok(Document {
        data: PrimaryData::One(Box::new(data)),
        included: included.resources,
        meta: Map::new(),
        links: None,
    })
}
