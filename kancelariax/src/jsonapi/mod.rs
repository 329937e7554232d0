//! JSON:API document types.
//!
//! The same types are used by the server to build responses ([`serializer`]) and by the client to
//! read them back, so both sides agree on the shape of `data`, `included`, `meta` and `links`.

pub mod serializer;

use crate::api::models::pagination::PaginationMeta;
use crate::types::ResourceType;
use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use thiserror::Error;
use utoipa::ToSchema;

pub use serializer::{JsonApiResource, RelationshipSpec, collection, single};

/// Media type used for requests and responses.
pub const MEDIA_TYPE: &str = "application/vnd.api+json";

#[derive(Error, Debug)]
pub enum SerializationError {
    #[error("{resource_type} record has no identifier")]
    MissingId { resource_type: ResourceType },

    #[error("{resource_type} record did not serialize to an object")]
    NotAnObject { resource_type: ResourceType },

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub struct ResourceIdentifier {
    #[serde(rename = "type")]
    pub resource_type: ResourceType,
    pub id: String,
}

impl ResourceIdentifier {
    pub fn new(resource_type: ResourceType, id: impl Into<String>) -> Self {
        Self {
            resource_type,
            id: id.into(),
        }
    }
}

/// Linkage of a relationship: a list for to-many, a single reference or null for to-one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum RelationshipData {
    Many(Vec<ResourceIdentifier>),
    One(Option<ResourceIdentifier>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Relationship {
    pub data: RelationshipData,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ResourceObject {
    #[serde(rename = "type")]
    pub resource_type: ResourceType,
    pub id: String,
    #[schema(value_type = Object)]
    pub attributes: Map<String, Value>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub relationships: BTreeMap<String, Relationship>,
}

impl ResourceObject {
    /// Identifiers linked under `name`, empty if the relationship is absent or null.
    pub fn related(&self, name: &str) -> Vec<&ResourceIdentifier> {
        match self.relationships.get(name).map(|r| &r.data) {
            Some(RelationshipData::Many(ids)) => ids.iter().collect(),
            Some(RelationshipData::One(Some(id))) => vec![id],
            Some(RelationshipData::One(None)) | None => Vec::new(),
        }
    }

    /// Deserialize the attributes (plus `id`) back into a record of the expected type.
    pub fn to_record<T: DeserializeOwned>(&self, expected: ResourceType) -> Result<T, serde_json::Error> {
        if self.resource_type != expected {
            return Err(serde_json::Error::custom(format!(
                "expected resource of type {expected}, got {}",
                self.resource_type
            )));
        }
        let mut attributes = self.attributes.clone();
        attributes
            .entry("id")
            .or_insert_with(|| Value::String(self.id.clone()));
        serde_json::from_value(Value::Object(attributes))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum PrimaryData {
    Many(Vec<ResourceObject>),
    One(Box<ResourceObject>),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Links {
    #[serde(rename = "self")]
    pub self_link: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prev: Option<String>,
}

impl Links {
    /// Navigation links for one page; `next`/`prev` only when such a page exists.
    pub fn paginated(template: &LinkTemplate, meta: &PaginationMeta) -> Self {
        let page = u64::from(meta.page);
        Self {
            self_link: template.href(page),
            first: Some(template.href(1)),
            last: Some(template.href(meta.last_page())),
            next: meta.has_next.then(|| template.href(page + 1)),
            prev: meta.has_prev.then(|| template.href(page - 1)),
        }
    }
}

/// Request URL pattern with the page number left open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkTemplate {
    path: String,
    per_page_key: String,
    per_page: u32,
    params: Vec<(String, String)>,
}

impl LinkTemplate {
    pub fn new(path: impl Into<String>, per_page_key: &str, per_page: u32, params: Vec<(String, String)>) -> Self {
        Self {
            path: path.into(),
            per_page_key: per_page_key.to_string(),
            per_page,
            params,
        }
    }

    pub fn href(&self, page: u64) -> String {
        let mut query = url::form_urlencoded::Serializer::new(String::new());
        query.append_pair("page", &page.to_string());
        query.append_pair(&self.per_page_key, &self.per_page.to_string());
        for (key, value) in &self.params {
            query.append_pair(key, value);
        }
        format!("{}?{}", self.path, query.finish())
    }
}

/// Top-level JSON:API document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Document {
    pub data: PrimaryData,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub included: Vec<ResourceObject>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    #[schema(value_type = Object)]
    pub meta: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub links: Option<Links>,
}

impl Document {
    pub fn with_meta(mut self, key: &str, value: impl Serialize) -> Result<Self, SerializationError> {
        self.meta.insert(key.to_string(), serde_json::to_value(value)?);
        Ok(self)
    }

    /// Merge the pagination fields into `meta` and add navigation links.
    pub fn with_pagination(mut self, meta: &PaginationMeta, template: &LinkTemplate) -> Result<Self, SerializationError> {
        if let Value::Object(fields) = serde_json::to_value(meta)? {
            self.meta.extend(fields);
        }
        self.links = Some(Links::paginated(template, meta));
        Ok(self)
    }

    /// Pagination metadata as written by [`Document::with_pagination`], if present.
    pub fn pagination(&self) -> Option<PaginationMeta> {
        serde_json::from_value(Value::Object(self.meta.clone())).ok()
    }

    pub fn primary(&self) -> Vec<&ResourceObject> {
        match &self.data {
            PrimaryData::Many(resources) => resources.iter().collect(),
            PrimaryData::One(resource) => vec![resource.as_ref()],
        }
    }
}
