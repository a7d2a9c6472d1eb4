//! Endpoint descriptors handed to the benchmark core.
//!
//! A descriptor is built once per (provider, test) by the driver and never
//! mutated. It carries everything needed to issue a call: the target URL, the
//! request payload for its transport, and the provider's authorization header.

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION};
use reqwest::Url;

use super::config::TransportKind;
use crate::error::{BenchError, Result};

/// How a provider expects its credential to be presented
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthScheme {
    /// Credential sent verbatim in a custom header (e.g. `X-API-Key`)
    Header(String),
    /// `Authorization: Bearer <credential>`
    Bearer,
    /// `Authorization: <credential>`
    Raw,
}

/// Authorization header bound to one provider credential
#[derive(Debug, Clone)]
pub struct Authorizer {
    name: HeaderName,
    value: HeaderValue,
}

impl Authorizer {
    pub fn new(scheme: AuthScheme, credential: &str) -> Result<Self> {
        let (name, raw) = match scheme {
            AuthScheme::Header(name) => {
                let name = HeaderName::from_bytes(name.as_bytes())
                    .map_err(|_| BenchError::InvalidHeader(name.clone()))?;
                (name, credential.to_string())
            }
            AuthScheme::Bearer => (AUTHORIZATION, format!("Bearer {}", credential)),
            AuthScheme::Raw => (AUTHORIZATION, credential.to_string()),
        };

        let mut value = HeaderValue::from_str(&raw)
            .map_err(|_| BenchError::InvalidHeader(name.to_string()))?;
        value.set_sensitive(true);

        Ok(Self { name, value })
    }

    /// Produce the header map sent with every attempt
    pub fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::with_capacity(1);
        headers.insert(self.name.clone(), self.value.clone());
        headers
    }

    pub fn header_name(&self) -> &HeaderName {
        &self.name
    }
}

/// Transport-specific request content
#[derive(Debug, Clone, PartialEq)]
pub enum RequestPayload {
    /// Query-string parameters for a GET
    Query(Vec<(String, String)>),
    /// GraphQL document POSTed as `{"query": ..., "variables": ...}`
    GraphQl {
        query: String,
        variables: Option<serde_json::Value>,
    },
}

/// Immutable description of one benchmarked endpoint
#[derive(Debug, Clone)]
pub struct EndpointDescriptor {
    url: Url,
    payload: RequestPayload,
    auth: Authorizer,
}

impl EndpointDescriptor {
    /// REST endpoint queried with a GET
    pub fn rest<K, V>(
        address: &str,
        params: impl IntoIterator<Item = (K, V)>,
        auth: Authorizer,
    ) -> Result<Self>
    where
        K: Into<String>,
        V: Into<String>,
    {
        let params = params
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Ok(Self {
            url: parse_address(address)?,
            payload: RequestPayload::Query(params),
            auth,
        })
    }

    /// GraphQL endpoint queried with a POST
    pub fn graphql(
        address: &str,
        query: impl Into<String>,
        variables: Option<serde_json::Value>,
        auth: Authorizer,
    ) -> Result<Self> {
        Ok(Self {
            url: parse_address(address)?,
            payload: RequestPayload::GraphQl {
                query: query.into(),
                variables,
            },
            auth,
        })
    }

    pub fn kind(&self) -> TransportKind {
        match self.payload {
            RequestPayload::Query(_) => TransportKind::Rest,
            RequestPayload::GraphQl { .. } => TransportKind::GraphQl,
        }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn payload(&self) -> &RequestPayload {
        &self.payload
    }

    pub fn auth_headers(&self) -> HeaderMap {
        self.auth.headers()
    }
}

fn parse_address(address: &str) -> Result<Url> {
    Url::parse(address).map_err(|e| BenchError::InvalidAddress(format!("{}: {}", address, e)))
}
