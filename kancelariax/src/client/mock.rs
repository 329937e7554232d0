//! Scripted transport for tests and offline use.

use super::transport::{HttpRequest, HttpResponse, Transport, TransportError};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

struct ScriptedReply {
    delay: Option<Duration>,
    result: Result<HttpResponse, TransportError>,
}

/// Transport that replays queued results in order and records every request it receives.
///
/// Replies are consumed in call order regardless of URL. A reply may carry a delay, applied
/// after the reply is taken from the queue, to control the order in which concurrent requests
/// complete. Sending with an empty queue yields a network error.
#[derive(Clone, Default)]
pub struct MockTransport {
    replies: Arc<Mutex<VecDeque<ScriptedReply>>>,
    calls: Arc<Mutex<Vec<HttpRequest>>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, result: Result<HttpResponse, TransportError>) {
        self.replies.lock().push_back(ScriptedReply { delay: None, result });
    }

    pub fn push_delayed(&self, delay: Duration, result: Result<HttpResponse, TransportError>) {
        self.replies.lock().push_back(ScriptedReply {
            delay: Some(delay),
            result,
        });
    }

    /// Queue a response with a JSON body.
    pub fn push_json(&self, status: u16, body: &serde_json::Value) {
        self.push(Ok(HttpResponse {
            status,
            body: body.to_string(),
        }));
    }

    pub fn push_network_error(&self) {
        self.push(Err(TransportError::Network("connection refused".to_string())));
    }

    pub fn calls(&self) -> Vec<HttpRequest> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    /// Replies still queued.
    pub fn remaining(&self) -> usize {
        self.replies.lock().len()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        self.calls.lock().push(request.clone());
        let reply = self.replies.lock().pop_front();

        match reply {
            Some(ScriptedReply { delay, result }) => {
                if let Some(delay) = delay {
                    tokio::time::sleep(delay).await;
                }
                result
            }
            None => Err(TransportError::Network(format!(
                "no scripted reply for {} {}",
                request.method, request.url
            ))),
        }
    }
}
