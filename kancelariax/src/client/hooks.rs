//! Stateful wrappers for UI code.
//!
//! Each hook owns a snapshot of "what the screen shows": the records, whether a request is in
//! flight, and the last error message. Methods take `&self`, so a hook can be shared between
//! tasks; read the state with `state()`.
//!
//! Concurrent `search` calls on one [`LawFirmSearch`] are not cancelled or sequenced: whichever
//! request resolves last overwrites the state, even if it was issued first.

use super::error::{ClientError, Result};
use super::law_firms::{LawFirmPage, LawFirmQuery};
use super::transport::Transport;
use super::ApiClient;
use crate::api::models::law_firms::{LawFirm, LawFirmCreate};
use crate::api::models::pagination::PaginationMeta;
use crate::jsonapi::Document;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::debug;

pub const SEARCH_FAILED: &str = "Wystąpił błąd podczas wyszukiwania";
pub const FETCH_FAILED: &str = "Wystąpił błąd podczas pobierania danych";
pub const CREATE_FAILED: &str = "Wystąpił błąd podczas tworzenia kancelarii";

/// Message shown for `err`: the API's own message, or `fallback` for anything that never got an
/// API answer.
fn display_message(err: &ClientError, fallback: &str) -> String {
    match err {
        ClientError::Api { message, .. } => message.clone(),
        _ => fallback.to_string(),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchState {
    pub law_firms: Vec<LawFirm>,
    pub loading: bool,
    pub error: Option<String>,
    /// Left untouched by a failed search
    pub pagination: PaginationMeta,
    /// Parameters of the last successful search
    pub params: LawFirmQuery,
}

impl Default for SearchState {
    fn default() -> Self {
        Self {
            law_firms: Vec::new(),
            loading: false,
            error: None,
            pagination: PaginationMeta::new(0, 1, 20),
            params: LawFirmQuery::default(),
        }
    }
}

/// Paginated law-firm search.
pub struct LawFirmSearch<T> {
    client: Arc<ApiClient<T>>,
    state: RwLock<SearchState>,
}

impl<T: Transport> LawFirmSearch<T> {
    pub fn new(client: Arc<ApiClient<T>>) -> Self {
        Self {
            client,
            state: RwLock::new(SearchState::default()),
        }
    }

    pub fn state(&self) -> SearchState {
        self.state.read().clone()
    }

    pub async fn search(&self, params: LawFirmQuery) {
        {
            let mut state = self.state.write();
            state.loading = true;
            state.error = None;
        }

        let result = self.client.search_law_firms_page(&params).await;

        let mut state = self.state.write();
        match result {
            Ok(LawFirmPage { law_firms, pagination }) => {
                debug!(total = pagination.total, page = pagination.page, "Search finished");
                state.law_firms = law_firms;
                state.pagination = pagination;
                state.params = params;
            }
            Err(err) => {
                debug!(error = %err, "Search failed");
                state.error = Some(display_message(&err, SEARCH_FAILED));
                state.law_firms.clear();
            }
        }
        state.loading = false;
    }

    /// Fetch the following page with the current parameters; does nothing on the last page.
    pub async fn next_page(&self) {
        let next = {
            let state = self.state.read();
            state
                .pagination
                .has_next
                .then(|| state.params.clone().with_page(state.pagination.page + 1))
        };
        if let Some(params) = next {
            self.search(params).await;
        }
    }

    /// Fetch the preceding page; does nothing on the first page.
    pub async fn prev_page(&self) {
        let prev = {
            let state = self.state.read();
            state
                .pagination
                .has_prev
                .then(|| state.params.clone().with_page(state.pagination.page - 1))
        };
        if let Some(params) = prev {
            self.search(params).await;
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DetailState {
    pub law_firm: Option<LawFirm>,
    pub loading: bool,
    pub error: Option<String>,
}

/// A single law firm by ID.
pub struct LawFirmDetail<T> {
    client: Arc<ApiClient<T>>,
    id: String,
    state: RwLock<DetailState>,
}

impl<T: Transport> LawFirmDetail<T> {
    /// Nothing is fetched until [`LawFirmDetail::refresh`] is called.
    pub fn new(client: Arc<ApiClient<T>>, id: impl Into<String>) -> Self {
        Self {
            client,
            id: id.into(),
            state: RwLock::new(DetailState::default()),
        }
    }

    pub fn state(&self) -> DetailState {
        self.state.read().clone()
    }

    /// (Re)load the firm. An empty ID is a no-op.
    pub async fn refresh(&self) {
        if self.id.is_empty() {
            return;
        }
        {
            let mut state = self.state.write();
            state.loading = true;
            state.error = None;
        }

        let result = self.client.fetch_law_firm(&self.id).await;

        let mut state = self.state.write();
        match result {
            Ok(firm) => state.law_firm = Some(firm),
            Err(err) => {
                state.error = Some(display_message(&err, FETCH_FAILED));
                state.law_firm = None;
            }
        }
        state.loading = false;
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateState {
    pub loading: bool,
    pub error: Option<String>,
}

/// Law-firm creation form.
pub struct CreateLawFirm<T> {
    client: Arc<ApiClient<T>>,
    state: RwLock<CreateState>,
}

impl<T: Transport> CreateLawFirm<T> {
    pub fn new(client: Arc<ApiClient<T>>) -> Self {
        Self {
            client,
            state: RwLock::new(CreateState::default()),
        }
    }

    pub fn state(&self) -> CreateState {
        self.state.read().clone()
    }

    /// Create the firm. On failure the error message is recorded and the error is also returned.
    pub async fn create(&self, data: &LawFirmCreate) -> Result<Document> {
        {
            let mut state = self.state.write();
            state.loading = true;
            state.error = None;
        }

        let result = self.client.create_law_firm(data).await;

        let mut state = self.state.write();
        state.loading = false;
        if let Err(err) = &result {
            state.error = Some(display_message(err, CREATE_FAILED));
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::mock::MockTransport;
    use crate::client::{RetryPolicy, TransportError};
    use crate::jsonapi::{LinkTemplate, collection};
    use crate::test_utils::{law_firm, law_firm_payload, numbered_firms};
    use serde_json::{Value, json};
    use std::time::Duration;

    fn client(transport: &MockTransport) -> Arc<ApiClient<MockTransport>> {
        Arc::new(
            ApiClient::builder()
                .transport(transport.clone())
                .base_url("http://api.test/api/v1")
                .retry(RetryPolicy::new(1))
                .build(),
        )
    }

    /// Search response holding page `page` of `total` firms, 2 per page.
    fn page_body(firms: &[LawFirm], total: u64, page: u32) -> Value {
        let meta = PaginationMeta::new(total, page, 2);
        let template = LinkTemplate::new("/api/v1/law-firms", "per_page", 2, Vec::new());
        let doc = collection(firms).unwrap().with_pagination(&meta, &template).unwrap();
        serde_json::to_value(doc).unwrap()
    }

    fn query_of(transport: &MockTransport, call: usize) -> String {
        let url = &transport.calls()[call].url;
        url.split_once('?').map(|(_, q)| q.to_string()).unwrap_or_default()
    }

    #[tokio::test]
    async fn test_search_updates_state() {
        let transport = MockTransport::new();
        let firms = numbered_firms(2);
        transport.push_json(200, &page_body(&firms, 5, 1));
        let hook = LawFirmSearch::new(client(&transport));

        hook.search(LawFirmQuery::default().with_per_page(2).with_city("Warszawa"))
            .await;

        let state = hook.state();
        assert!(!state.loading);
        assert_eq!(state.error, None);
        assert_eq!(state.law_firms, firms);
        assert_eq!(state.pagination.pages, 3);
        assert!(state.pagination.has_next);
        assert_eq!(state.params.city.as_deref(), Some("Warszawa"));
    }

    #[tokio::test]
    async fn test_failed_search_keeps_stale_pagination() {
        let transport = MockTransport::new();
        transport.push_json(200, &page_body(&numbered_firms(2), 5, 1));
        transport.push_json(400, &json!({"error": "Invalid search parameters"}));
        transport.push(Err(TransportError::Network("connection reset".to_string())));
        let hook = LawFirmSearch::new(client(&transport));

        hook.search(LawFirmQuery::default().with_per_page(2)).await;
        hook.search(LawFirmQuery::default().with_sort("rating", Default::default()))
            .await;

        let state = hook.state();
        assert_eq!(state.error.as_deref(), Some("Invalid search parameters"));
        assert!(state.law_firms.is_empty());
        assert_eq!(state.pagination.total, 5);
        assert_eq!(state.params.sort, "name");

        hook.search(LawFirmQuery::default()).await;
        // Exhausted retries are an API error with the generic message
        assert_eq!(hook.state().error.as_deref(), Some("Max retry attempts exceeded"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_uses_fallback_message() {
        let transport = MockTransport::new();
        transport.push_delayed(Duration::from_secs(120), Err(TransportError::Timeout));
        let hook = LawFirmSearch::new(client(&transport));

        hook.search(LawFirmQuery::default()).await;

        assert_eq!(hook.state().error.as_deref(), Some(SEARCH_FAILED));
    }

    #[tokio::test]
    async fn test_page_navigation() {
        let transport = MockTransport::new();
        let firms = numbered_firms(5);
        transport.push_json(200, &page_body(&firms[0..2], 5, 1));
        transport.push_json(200, &page_body(&firms[2..4], 5, 2));
        transport.push_json(200, &page_body(&firms[4..], 5, 3));
        transport.push_json(200, &page_body(&firms[2..4], 5, 2));
        let hook = LawFirmSearch::new(client(&transport));

        // Nothing loaded yet: both directions are no-ops
        hook.prev_page().await;
        hook.next_page().await;
        assert_eq!(transport.call_count(), 0);

        hook.search(LawFirmQuery::default().with_per_page(2).with_query("kancelaria"))
            .await;
        hook.next_page().await;
        hook.next_page().await;
        assert_eq!(hook.state().pagination.page, 3);
        assert!(!hook.state().pagination.has_next);

        hook.next_page().await;
        assert_eq!(transport.call_count(), 3);

        hook.prev_page().await;
        assert_eq!(hook.state().law_firms, firms[2..4].to_vec());
        assert_eq!(
            query_of(&transport, 3),
            "page=2&per_page=2&sort=name&order=asc&q=kancelaria"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_last_resolved_search_wins() {
        let transport = MockTransport::new();
        let slow = vec![law_firm("Kancelaria Wolna", "Kraków", &[])];
        let fast = vec![law_firm("Kancelaria Szybka", "Poznań", &[])];
        transport.push_delayed(Duration::from_secs(5), Ok(crate::client::HttpResponse {
            status: 200,
            body: page_body(&slow, 1, 1).to_string(),
        }));
        transport.push_delayed(Duration::from_secs(1), Ok(crate::client::HttpResponse {
            status: 200,
            body: page_body(&fast, 1, 1).to_string(),
        }));
        let hook = LawFirmSearch::new(client(&transport));

        tokio::join!(
            hook.search(LawFirmQuery::default().with_city("Kraków")),
            hook.search(LawFirmQuery::default().with_city("Poznań")),
        );

        // The first request resolved last, so its results are shown
        let state = hook.state();
        assert_eq!(state.law_firms, slow);
        assert_eq!(state.params.city.as_deref(), Some("Kraków"));
        assert!(!state.loading);
    }

    #[tokio::test]
    async fn test_detail_refresh() {
        let transport = MockTransport::new();
        let firm = law_firm("Kancelaria Detal", "Gdańsk", &["CIVIL"]);
        let doc = crate::jsonapi::single(&firm).unwrap();
        transport.push_json(200, &serde_json::to_value(&doc).unwrap());
        transport.push_json(404, &json!({"error": "Law firm with ID x not found"}));
        transport.push(Ok(crate::client::HttpResponse {
            status: 200,
            body: "{}".to_string(),
        }));

        let empty = LawFirmDetail::new(client(&transport), "");
        empty.refresh().await;
        assert_eq!(transport.call_count(), 0);

        let hook = LawFirmDetail::new(client(&transport), firm.id.to_string());
        hook.refresh().await;
        assert_eq!(hook.state().law_firm.as_ref(), Some(&firm));

        hook.refresh().await;
        let state = hook.state();
        assert_eq!(state.law_firm, None);
        assert_eq!(state.error.as_deref(), Some("Law firm with ID x not found"));

        // A body that is not a document never reached the API's error path
        hook.refresh().await;
        assert_eq!(hook.state().error.as_deref(), Some(FETCH_FAILED));
    }

    #[tokio::test]
    async fn test_create_records_and_returns_error() {
        let transport = MockTransport::new();
        transport.push_json(
            409,
            &json!({"error": "Law firm with tax number 1234567890 already exists"}),
        );
        transport.push_network_error();
        let hook = CreateLawFirm::new(client(&transport));
        let payload: LawFirmCreate = serde_json::from_value(law_firm_payload("Kancelaria", "1234567890")).unwrap();

        let err = hook.create(&payload).await.unwrap_err();
        assert_eq!(err.status_code(), Some(409));
        assert_eq!(
            hook.state().error.as_deref(),
            Some("Law firm with tax number 1234567890 already exists")
        );

        let err = hook.create(&payload).await.unwrap_err();
        assert_eq!(err.status_code(), None);
        assert_eq!(hook.state(), CreateState {
            loading: false,
            error: Some("Max retry attempts exceeded".to_string()),
        });
        assert_eq!(transport.calls()[0].body.as_deref().map(|b| b.contains("\"tax_number\":\"1234567890\"")), Some(true));
    }
}
