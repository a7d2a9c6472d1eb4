//! In-memory transport for time-driven unit tests.

use bytes::Bytes;
use reqwest::header::HeaderMap;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;

use super::endpoint::{AuthScheme, Authorizer, EndpointDescriptor};
use crate::http_client::{RawResponse, Transport, TransportError};

enum Reply {
    Respond {
        status: u16,
        retry_after_secs: Option<u64>,
        body: Bytes,
    },
    Fail(TransportError),
}

/// One scripted attempt: wait `delay_ms`, then reply
pub(crate) struct Step {
    delay_ms: u64,
    reply: Reply,
}

impl Step {
    pub fn ok(delay_ms: u64) -> Self {
        Self::status(200, delay_ms)
    }

    pub fn status(status: u16, delay_ms: u64) -> Self {
        Self {
            delay_ms,
            reply: Reply::Respond {
                status,
                retry_after_secs: None,
                body: Bytes::from_static(b"{}"),
            },
        }
    }

    pub fn rate_limited(retry_after_secs: Option<u64>, delay_ms: u64) -> Self {
        Self {
            delay_ms,
            reply: Reply::Respond {
                status: 429,
                retry_after_secs,
                body: Bytes::new(),
            },
        }
    }

    pub fn fail(error: TransportError) -> Self {
        Self {
            delay_ms: 0,
            reply: Reply::Fail(error),
        }
    }

    pub fn with_body(mut self, text: &str) -> Self {
        if let Reply::Respond { body, .. } = &mut self.reply {
            *body = Bytes::copy_from_slice(text.as_bytes());
        }
        self
    }
}

/// Replays steps in order; once exhausted every call succeeds after 1ms
pub(crate) struct ScriptedTransport {
    steps: Mutex<VecDeque<Step>>,
    calls: AtomicUsize,
    started_at: Mutex<Vec<Instant>>,
}

impl ScriptedTransport {
    pub fn new(steps: Vec<Step>) -> Self {
        Self {
            steps: Mutex::new(steps.into()),
            calls: AtomicUsize::new(0),
            started_at: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Instant at which each attempt was dispatched
    pub fn started_at(&self) -> Vec<Instant> {
        self.started_at.lock().unwrap().clone()
    }
}

impl Transport for ScriptedTransport {
    async fn perform(
        &self,
        _endpoint: &EndpointDescriptor,
        _headers: &HeaderMap,
    ) -> Result<RawResponse, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.started_at.lock().unwrap().push(Instant::now());
        let step = self
            .steps
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Step::ok(1));

        tokio::time::sleep(Duration::from_millis(step.delay_ms)).await;

        match step.reply {
            Reply::Respond {
                status,
                retry_after_secs,
                body,
            } => Ok(RawResponse {
                status,
                retry_after_secs,
                body,
            }),
            Reply::Fail(error) => Err(error),
        }
    }
}

pub(crate) fn rest_endpoint() -> EndpointDescriptor {
    let auth = Authorizer::new(AuthScheme::Header("X-API-Key".to_string()), "test-key").unwrap();
    EndpointDescriptor::rest(
        "https://api.test.local/v1/balance",
        [("chain", "eth")],
        auth,
    )
    .unwrap()
}
