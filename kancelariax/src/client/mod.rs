//! Typed HTTP client for the directory API.
//!
//! [`ApiClient`] sends JSON:API requests with the SDK headers, retries transport failures with
//! exponential backoff, and turns non-2xx responses into [`ClientError::Api`]. The operations in
//! [`law_firms`] wrap it per endpoint, and [`hooks`] layers UI-facing state on top.
//!
//! ```no_run
//! # async fn demo() -> Result<(), kancelariax::client::ClientError> {
//! use kancelariax::client::{ApiClient, law_firms::LawFirmQuery};
//!
//! let client = ApiClient::new("http://localhost:3001/api/v1");
//! let page = client
//!     .search_law_firms_page(&LawFirmQuery::default().with_city("Gdańsk"))
//!     .await?;
//! println!("{} firms in Gdańsk", page.pagination.total);
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod hooks;
pub mod law_firms;
pub mod mock;
pub mod retry;
pub mod transport;

pub use error::{ClientError, Result};
pub use retry::RetryPolicy;
pub use transport::{HttpRequest, HttpResponse, ReqwestTransport, Transport, TransportError};

use crate::config::ClientConfig;
use crate::jsonapi::{Document, MEDIA_TYPE};
use bon::Builder;
use reqwest::Method;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue, USER_AGENT};
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, instrument, warn};

pub const SDK_USER_AGENT: &str = "KancelariaXSDK/1.0.0";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Client for one API base URL.
///
/// ```ignore
/// let client = ApiClient::builder()
///     .transport(MockTransport::new())
///     .base_url("http://localhost:3001/api/v1")
///     .api_key("token".to_string())
///     .retry(RetryPolicy::new(5))
///     .build();
/// ```
#[derive(Debug, Clone, Builder)]
pub struct ApiClient<T> {
    transport: T,
    /// Base URL including the version prefix, e.g. `http://localhost:3001/api/v1`
    #[builder(into)]
    base_url: String,
    api_key: Option<String>,
    /// Applied to each attempt separately
    #[builder(default = DEFAULT_TIMEOUT)]
    timeout: Duration,
    #[builder(default)]
    retry: RetryPolicy,
}

impl ApiClient<ReqwestTransport> {
    /// Client with default timeout and retry policy and no API key.
    pub fn new(base_url: impl Into<String>) -> Self {
        ApiClient::builder()
            .transport(ReqwestTransport::default())
            .base_url(base_url)
            .build()
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        ApiClient::builder()
            .transport(ReqwestTransport::default())
            .base_url(config.base_url.clone())
            .maybe_api_key(config.api_key.clone())
            .timeout(config.timeout)
            .retry(RetryPolicy::new(config.retry_attempts))
            .build()
    }
}

impl<T: Transport> ApiClient<T> {
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(SDK_USER_AGENT));
        headers.insert(ACCEPT, HeaderValue::from_static(MEDIA_TYPE));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(MEDIA_TYPE));
        if let Some(key) = &self.api_key {
            let value = HeaderValue::from_str(&format!("Bearer {key}"))
                .map_err(|_| ClientError::InvalidRequest("API key is not a valid header value".to_string()))?;
            headers.insert(AUTHORIZATION, value);
        }
        Ok(headers)
    }

    /// Absolute URL for `path`; repeated keys in `query` are sent as repeated parameters.
    fn url(&self, path: &str, query: &[(String, String)]) -> String {
        let mut url = format!("{}{}", self.base_url.trim_end_matches('/'), path);
        if !query.is_empty() {
            let encoded = url::form_urlencoded::Serializer::new(String::new())
                .extend_pairs(query)
                .finish();
            url.push('?');
            url.push_str(&encoded);
        }
        url
    }

    /// Send a request, retrying transport failures.
    ///
    /// Any HTTP response ends the loop: 2xx is returned, anything else becomes
    /// [`ClientError::Api`] without a retry. When every attempt fails in transport, a timeout on
    /// the last attempt yields [`ClientError::Timeout`] and any other failure yields
    /// "Max retry attempts exceeded".
    #[instrument(skip(self, query, body), fields(base_url = %self.base_url), err)]
    pub async fn execute(
        &self,
        method: Method,
        path: &str,
        query: &[(String, String)],
        body: Option<String>,
    ) -> Result<HttpResponse> {
        let request = HttpRequest {
            method,
            url: self.url(path, query),
            headers: self.headers()?,
            body,
        };

        let attempts = self.retry.max_attempts();
        for attempt in 0..attempts {
            let outcome = tokio::time::timeout(self.timeout, self.transport.send(request.clone()))
                .await
                .unwrap_or(Err(TransportError::Timeout));

            let failure = match outcome {
                Ok(response) if response.is_success() => {
                    debug!(status = response.status, attempt, "Request succeeded");
                    return Ok(response);
                }
                Ok(response) => return Err(ClientError::from_response(response.status, &response.body)),
                Err(failure) => failure,
            };

            match self.retry.delay_after(attempt) {
                Some(delay) => {
                    warn!(attempt = attempt + 1, attempts, ?delay, error = %failure, "Request failed, retrying");
                    tokio::time::sleep(delay).await;
                }
                None => {
                    return Err(match failure {
                        TransportError::Timeout => ClientError::Timeout(self.timeout),
                        TransportError::Network(_) => ClientError::retries_exhausted(),
                    });
                }
            }
        }

        Err(ClientError::retries_exhausted())
    }

    /// Send a request and decode the JSON:API document in the response.
    pub async fn document<B>(
        &self,
        method: Method,
        path: &str,
        query: &[(String, String)],
        body: Option<&B>,
    ) -> Result<Document>
    where
        B: Serialize + ?Sized + Sync,
    {
        let body = body.map(serde_json::to_string).transpose()?;
        let response = self.execute(method, path, query, body).await?;
        Ok(serde_json::from_str(&response.body)?)
    }
}

#[cfg(test)]
mod tests {
    use super::mock::MockTransport;
    use super::*;
    use serde_json::json;
    use tokio::time::Instant;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn mock_client(transport: MockTransport, attempts: u32) -> ApiClient<MockTransport> {
        ApiClient::builder()
            .transport(transport)
            .base_url("http://api.test/api/v1/")
            .retry(RetryPolicy::new(attempts))
            .build()
    }

    fn empty_collection() -> serde_json::Value {
        json!({"data": [], "meta": {"total": 0}})
    }

    #[tokio::test]
    async fn test_sends_sdk_headers_and_repeated_params() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/law-firms"))
            .and(header("user-agent", SDK_USER_AGENT))
            .and(header("accept", MEDIA_TYPE))
            .and(header("authorization", "Bearer secret"))
            .and(query_param("city", "Gdańsk"))
            .respond_with(ResponseTemplate::new(200).set_body_json(empty_collection()))
            .expect(1)
            .mount(&server)
            .await;

        let client = ApiClient::builder()
            .transport(ReqwestTransport::default())
            .base_url(format!("{}/api/v1", server.uri()))
            .api_key("secret".to_string())
            .build();
        let query = vec![
            ("city".to_string(), "Gdańsk".to_string()),
            ("specializations".to_string(), "CIVIL".to_string()),
            ("specializations".to_string(), "CRIMINAL".to_string()),
        ];
        let doc = client.document::<()>(Method::GET, "/law-firms", &query, None).await.unwrap();
        assert!(doc.primary().is_empty());

        let requests = server.received_requests().await.unwrap();
        let raw_query = requests[0].url.query().unwrap_or_default().to_string();
        assert_eq!(raw_query.matches("specializations=").count(), 2);
    }

    #[tokio::test]
    async fn test_http_error_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/law-firms/missing"))
            .respond_with(
                ResponseTemplate::new(404).set_body_json(json!({"error": "Law firm with ID missing not found"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = ApiClient::new(format!("{}/api/v1", server.uri()));
        let err = client
            .document::<()>(Method::GET, "/law-firms/missing", &[], None)
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Law firm with ID missing not found");
        assert_eq!(err.status_code(), Some(404));
    }

    #[tokio::test(start_paused = true)]
    async fn test_transport_failures_exhaust_retries() {
        let transport = MockTransport::new();
        for _ in 0..3 {
            transport.push_network_error();
        }
        transport.push_json(200, &empty_collection());
        let client = mock_client(transport.clone(), 3);

        let started = Instant::now();
        let err = client.execute(Method::GET, "/law-firms", &[], None).await.unwrap_err();

        assert_eq!(err.to_string(), "Max retry attempts exceeded");
        assert_eq!(err.status_code(), None);
        // Never a fourth attempt, and no sleep after the third
        assert_eq!(transport.call_count(), 3);
        assert_eq!(transport.remaining(), 1);
        assert_eq!(started.elapsed(), Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_recovers_after_transport_failures() {
        let transport = MockTransport::new();
        transport.push_network_error();
        transport.push(Err(TransportError::Timeout));
        transport.push_json(200, &empty_collection());
        let client = mock_client(transport.clone(), 3);

        let started = Instant::now();
        let doc = client.document::<()>(Method::GET, "/law-firms", &[], None).await.unwrap();

        assert!(doc.primary().is_empty());
        assert_eq!(transport.call_count(), 3);
        assert_eq!(started.elapsed(), Duration::from_secs(3));
        assert!(transport.calls().iter().all(|c| c.url == "http://api.test/api/v1/law-firms"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_server_error_stops_retrying() {
        let transport = MockTransport::new();
        transport.push_network_error();
        transport.push_json(500, &json!({"error": "Internal server error"}));
        transport.push_json(200, &empty_collection());
        let client = mock_client(transport.clone(), 3);

        let err = client.execute(Method::GET, "/law-firms", &[], None).await.unwrap_err();

        assert_eq!(err.status_code(), Some(500));
        assert_eq!(transport.call_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_on_last_attempt() {
        let transport = MockTransport::new();
        transport.push_network_error();
        transport.push_delayed(Duration::from_secs(60), Ok(HttpResponse { status: 200, body: "{}".to_string() }));
        let client = ApiClient::builder()
            .transport(transport.clone())
            .base_url("http://api.test")
            .timeout(Duration::from_secs(5))
            .retry(RetryPolicy::new(2))
            .build();

        let err = client.execute(Method::GET, "/law-firms", &[], None).await.unwrap_err();
        assert!(matches!(err, ClientError::Timeout(t) if t == Duration::from_secs(5)));
    }

    #[tokio::test]
    async fn test_undecodable_success_body() {
        let transport = MockTransport::new();
        transport.push(Ok(HttpResponse {
            status: 200,
            body: "not json".to_string(),
        }));
        let client = mock_client(transport, 1);

        let err = client
            .document::<()>(Method::GET, "/specializations", &[], None)
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Decode(_)));
    }

    #[test]
    fn test_invalid_api_key() {
        let client = ApiClient::builder()
            .transport(MockTransport::new())
            .base_url("http://api.test")
            .api_key("line\nbreak".to_string())
            .build();
        assert!(matches!(client.headers(), Err(ClientError::InvalidRequest(_))));
    }

    #[test]
    fn test_from_config() {
        let config = ClientConfig {
            base_url: "https://kancelariax.pl/api/v1".to_string(),
            api_key: Some("k".to_string()),
            timeout: Duration::from_secs(10),
            retry_attempts: 5,
        };
        let client = ApiClient::from_config(&config);
        assert_eq!(client.base_url(), "https://kancelariax.pl/api/v1");
        assert_eq!(client.timeout, Duration::from_secs(10));
        assert_eq!(client.retry.max_attempts(), 5);
        assert_eq!(
            client.url("/law-firms", &[("q".to_string(), "prawo karne".to_string())]),
            "https://kancelariax.pl/api/v1/law-firms?q=prawo+karne"
        );
    }
}
