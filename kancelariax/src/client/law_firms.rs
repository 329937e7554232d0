//! Typed operations for law firms, their lawyers and the specialization catalogue.

use super::error::{ClientError, Result};
use super::transport::Transport;
use super::ApiClient;
use crate::api::models::law_firms::{LawFirm, LawFirmCreate, LawFirmUpdate, LawyerCreate};
use crate::api::models::pagination::PaginationMeta;
use crate::api::models::search::SortOrder;
use crate::jsonapi::Document;
use reqwest::Method;
use serde::de::Error as _;

/// Search parameters for `GET /law-firms`.
///
/// Page, page size, sort field and order are always sent, so the server never falls back to its
/// own defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LawFirmQuery {
    pub q: Option<String>,
    pub city: Option<String>,
    /// Specialization codes; a firm matches if it offers any of them
    pub specializations: Vec<String>,
    pub page: u32,
    pub per_page: u32,
    pub sort: String,
    pub order: SortOrder,
}

impl Default for LawFirmQuery {
    fn default() -> Self {
        Self {
            q: None,
            city: None,
            specializations: Vec::new(),
            page: 1,
            per_page: 20,
            sort: "name".to_string(),
            order: SortOrder::Asc,
        }
    }
}

impl LawFirmQuery {
    pub fn with_query(mut self, q: impl Into<String>) -> Self {
        self.q = Some(q.into());
        self
    }

    pub fn with_city(mut self, city: impl Into<String>) -> Self {
        self.city = Some(city.into());
        self
    }

    pub fn with_specializations<I, S>(mut self, codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.specializations = codes.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_page(mut self, page: u32) -> Self {
        self.page = page;
        self
    }

    pub fn with_per_page(mut self, per_page: u32) -> Self {
        self.per_page = per_page;
        self
    }

    pub fn with_sort(mut self, sort: impl Into<String>, order: SortOrder) -> Self {
        self.sort = sort.into();
        self.order = order;
        self
    }

    pub fn to_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = vec![
            ("page".to_string(), self.page.to_string()),
            ("per_page".to_string(), self.per_page.to_string()),
            ("sort".to_string(), self.sort.clone()),
            ("order".to_string(), self.order.to_string()),
        ];
        for (key, value) in [("q", &self.q), ("city", &self.city)] {
            if let Some(value) = value.as_deref().filter(|v| !v.is_empty()) {
                pairs.push((key.to_string(), value.to_string()));
            }
        }
        pairs.extend(
            self.specializations
                .iter()
                .map(|code| ("specializations".to_string(), code.clone())),
        );
        pairs
    }
}

/// One page of search results, with related records resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct LawFirmPage {
    pub law_firms: Vec<LawFirm>,
    pub pagination: PaginationMeta,
}

impl LawFirmPage {
    pub fn from_document(doc: &Document) -> Result<Self> {
        let pagination = doc
            .pagination()
            .ok_or_else(|| serde_json::Error::custom("response has no pagination metadata"))?;
        let law_firms = doc
            .primary()
            .into_iter()
            .map(|resource| LawFirm::from_resource(resource, &doc.included))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(Self { law_firms, pagination })
    }
}

fn single_law_firm(doc: &Document) -> Result<LawFirm> {
    let resource = doc
        .primary()
        .into_iter()
        .next()
        .ok_or_else(|| ClientError::Decode(serde_json::Error::custom("response has no primary data")))?;
    Ok(LawFirm::from_resource(resource, &doc.included)?)
}

impl<T: Transport> ApiClient<T> {
    pub async fn create_law_firm(&self, data: &LawFirmCreate) -> Result<Document> {
        self.document(Method::POST, "/law-firms", &[], Some(data)).await
    }

    pub async fn get_law_firm(&self, id: &str) -> Result<Document> {
        self.document::<()>(Method::GET, &format!("/law-firms/{id}"), &[], None)
            .await
    }

    /// [`ApiClient::get_law_firm`] with lawyers and specializations resolved from `included`.
    pub async fn fetch_law_firm(&self, id: &str) -> Result<LawFirm> {
        single_law_firm(&self.get_law_firm(id).await?)
    }

    pub async fn search_law_firms(&self, query: &LawFirmQuery) -> Result<Document> {
        self.document::<()>(Method::GET, "/law-firms", &query.to_pairs(), None)
            .await
    }

    pub async fn search_law_firms_page(&self, query: &LawFirmQuery) -> Result<LawFirmPage> {
        LawFirmPage::from_document(&self.search_law_firms(query).await?)
    }

    pub async fn update_law_firm(&self, id: &str, data: &LawFirmUpdate) -> Result<Document> {
        self.document(Method::PUT, &format!("/law-firms/{id}"), &[], Some(data))
            .await
    }

    /// Soft-deletes the firm; the API answers 204 with no body.
    pub async fn delete_law_firm(&self, id: &str) -> Result<()> {
        self.execute(Method::DELETE, &format!("/law-firms/{id}"), &[], None)
            .await?;
        Ok(())
    }

    pub async fn list_specializations(&self) -> Result<Document> {
        self.document::<()>(Method::GET, "/specializations", &[], None)
            .await
    }

    pub async fn list_lawyers(&self, law_firm_id: &str) -> Result<Document> {
        self.document::<()>(Method::GET, &format!("/law-firms/{law_firm_id}/lawyers"), &[], None)
            .await
    }

    pub async fn create_lawyer(&self, law_firm_id: &str, data: &LawyerCreate) -> Result<Document> {
        self.document(Method::POST, &format!("/law-firms/{law_firm_id}/lawyers"), &[], Some(data))
            .await
    }
}
