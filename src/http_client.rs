use bytes::Bytes;
use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::{Client, Response};
use std::future::Future;
use thiserror::Error;

use crate::bench::endpoint::{EndpointDescriptor, RequestPayload};
use crate::error::Result;

/// Raw result of one attempt, before classification
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    /// Parsed `Retry-After` header (delta-seconds form only)
    pub retry_after_secs: Option<u64>,
    pub body: Bytes,
}

impl RawResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_rate_limited(&self) -> bool {
        self.status == 429
    }
}

/// Transport-level failure of a single attempt
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("request timed out")]
    Timeout,

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("request error: {0}")]
    Request(String),

    #[error("body error: {0}")]
    Body(String),

    #[error("decode error: {0}")]
    Decode(String),

    #[error("transport error: {0}")]
    Other(String),
}

impl TransportError {
    /// Short label used in log fields
    pub fn kind(&self) -> &'static str {
        match self {
            TransportError::Timeout => "timeout",
            TransportError::Connect(_) => "connection_failed",
            TransportError::Request(_) => "request_error",
            TransportError::Body(_) => "body_error",
            TransportError::Decode(_) => "decode_error",
            TransportError::Other(_) => "unknown",
        }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        // A stalled handshake is a timeout, not a connection failure
        if e.is_timeout() {
            TransportError::Timeout
        } else if e.is_connect() {
            TransportError::Connect(e.to_string())
        } else if e.is_request() {
            TransportError::Request(e.to_string())
        } else if e.is_body() {
            TransportError::Body(e.to_string())
        } else if e.is_decode() {
            TransportError::Decode(e.to_string())
        } else {
            TransportError::Other(e.to_string())
        }
    }
}

/// Capability to issue one request for an endpoint.
///
/// The returned future must resolve only after the full response body has
/// been read, so the caller's timing covers the complete round trip.
pub trait Transport: Send + Sync {
    fn perform(
        &self,
        endpoint: &EndpointDescriptor,
        headers: &HeaderMap,
    ) -> impl Future<Output = std::result::Result<RawResponse, TransportError>> + Send;
}

/// Build the shared pooled client used by every transport.
///
/// No client-side timeouts are set: the executor's per-attempt ceiling
/// bounds connect, send and body read together.
pub fn build_client() -> Result<Client> {
    let client = Client::builder()
        .pool_max_idle_per_host(4)
        .build()?;
    Ok(client)
}

/// GET with query parameters
#[derive(Debug, Clone)]
pub struct RestTransport {
    client: Client,
}

impl RestTransport {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

impl Transport for RestTransport {
    async fn perform(
        &self,
        endpoint: &EndpointDescriptor,
        headers: &HeaderMap,
    ) -> std::result::Result<RawResponse, TransportError> {
        let RequestPayload::Query(params) = endpoint.payload() else {
            return Err(TransportError::Request(
                "REST transport requires query parameters".to_string(),
            ));
        };

        let response = self
            .client
            .get(endpoint.url().clone())
            .headers(headers.clone())
            .query(params)
            .send()
            .await?;

        read_response(response).await
    }
}

/// POST with a `{"query", "variables"}` JSON document
#[derive(Debug, Clone)]
pub struct GraphqlTransport {
    client: Client,
}

impl GraphqlTransport {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

impl Transport for GraphqlTransport {
    async fn perform(
        &self,
        endpoint: &EndpointDescriptor,
        headers: &HeaderMap,
    ) -> std::result::Result<RawResponse, TransportError> {
        let RequestPayload::GraphQl { query, variables } = endpoint.payload() else {
            return Err(TransportError::Request(
                "GraphQL transport requires a query document".to_string(),
            ));
        };

        let mut document = serde_json::json!({ "query": query });
        if let Some(variables) = variables {
            document["variables"] = variables.clone();
        }

        let response = self
            .client
            .post(endpoint.url().clone())
            .headers(headers.clone())
            .json(&document)
            .send()
            .await?;

        read_response(response).await
    }
}

/// Routes each endpoint to the transport matching its kind
#[derive(Debug, Clone)]
pub struct HttpTransport {
    rest: RestTransport,
    graphql: GraphqlTransport,
}

impl HttpTransport {
    pub fn new() -> Result<Self> {
        let client = build_client()?;
        Ok(Self::with_client(client))
    }

    pub fn with_client(client: Client) -> Self {
        Self {
            rest: RestTransport::new(client.clone()),
            graphql: GraphqlTransport::new(client),
        }
    }
}

impl Transport for HttpTransport {
    async fn perform(
        &self,
        endpoint: &EndpointDescriptor,
        headers: &HeaderMap,
    ) -> std::result::Result<RawResponse, TransportError> {
        match endpoint.payload() {
            RequestPayload::Query(_) => self.rest.perform(endpoint, headers).await,
            RequestPayload::GraphQl { .. } => self.graphql.perform(endpoint, headers).await,
        }
    }
}

async fn read_response(response: Response) -> std::result::Result<RawResponse, TransportError> {
    let status = response.status().as_u16();
    let retry_after_secs = response
        .headers()
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok());

    tracing::debug!(status = status, "Received HTTP response");

    let body = response.bytes().await?;

    Ok(RawResponse {
        status,
        retry_after_secs,
        body,
    })
}
