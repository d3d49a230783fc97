//! HTTP transport for GraphQL requests, via a relay or straight to the portal.

use crate::config::Config;
use crate::seller::marketplaces::Marketplace;
use crate::seller::models::AuthContext;
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;
use wreq::Client;
use wreq_util::Emulation;

/// JSON body of a GraphQL POST.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphQlRequest {
    pub query: String,
    #[serde(rename = "operationName")]
    pub operation_name: String,
    pub variables: Value,
}

/// Status and raw body of an upstream response, passed through verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayResponse {
    pub status: u16,
    pub body: String,
}

impl RelayResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self { status, body: body.into() }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_rate_limited(&self) -> bool {
        self.status == 429
    }
}

/// Sends one GraphQL request - enables mocking for tests.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Posts the request with the session's credentials.
    ///
    /// Non-2xx statuses are returned as responses, not errors; `Err` means the
    /// request never produced a response.
    async fn post(&self, request: &GraphQlRequest, auth: &AuthContext) -> Result<RelayResponse>;
}

/// Where requests are sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    /// A relay that maps `x-amz-country` to the portal host and injects auth.
    Relay(String),
    /// The portal's GraphQL endpoint, resolved from the country code.
    /// `base_url` overrides the portal host (for testing).
    Direct { base_url: Option<String> },
}

impl Endpoint {
    pub fn from_config(config: &Config) -> Self {
        match config.relay_url.as_deref().map(str::trim) {
            Some(url) if !url.is_empty() => Endpoint::Relay(url.to_string()),
            _ => Endpoint::Direct { base_url: None },
        }
    }
}

/// Transport over wreq with browser TLS emulation.
pub struct HttpTransport {
    client: Client,
    endpoint: Endpoint,
}

impl HttpTransport {
    /// Creates a transport using the endpoint selected by the configuration.
    pub fn new(config: &Config) -> Result<Self> {
        Self::with_endpoint(config, Endpoint::from_config(config))
    }

    /// Creates a transport for an explicit endpoint.
    pub fn with_endpoint(config: &Config, endpoint: Endpoint) -> Result<Self> {
        let mut builder = Client::builder()
            .gzip(true)
            .brotli(true)
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .connect_timeout(Duration::from_secs(10));

        if let Some(proxy_url) = &config.proxy {
            debug!("Configuring proxy: {}", proxy_url);
            let proxy = wreq::Proxy::all(proxy_url).context("Failed to configure proxy")?;
            builder = builder.proxy(proxy);
        }

        let client = builder.build()?;

        Ok(Self { client, endpoint })
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Resolves the URL and headers for one request.
    fn target(&self, auth: &AuthContext) -> (String, Vec<(&'static str, String)>) {
        match &self.endpoint {
            Endpoint::Relay(url) => (url.clone(), auth.relay_headers()),
            Endpoint::Direct { base_url } => {
                let marketplace = Marketplace::from_country_or_default(&auth.country_code);
                let portal = marketplace.portal_url();
                let base = base_url.clone().unwrap_or_else(|| portal.clone());

                let headers = vec![
                    ("accept", "application/json".to_string()),
                    ("origin", portal.clone()),
                    ("referer", format!("{}/", portal)),
                    ("anti-csrftoken-a2z", auth.csrf_token.trim().to_string()),
                    ("cookie", auth.cookie.trim().to_string()),
                ];

                (format!("{}/ox-api/graphql", base.trim_end_matches('/')), headers)
            }
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn post(&self, request: &GraphQlRequest, auth: &AuthContext) -> Result<RelayResponse> {
        let (url, headers) = self.target(auth);
        let body = serde_json::to_vec(request).context("Failed to encode GraphQL request")?;

        debug!("POST {} ({})", url, request.operation_name);

        let mut builder = self
            .client
            .post(&url)
            .emulation(Emulation::Chrome131)
            .header("content-type", "application/json");

        for (name, value) in headers {
            builder = builder.header(name, value);
        }

        let response = builder.body(body).send().await.context("Failed to send request")?;

        let status = response.status().as_u16();
        debug!("Response status: {}", status);

        let body = match response.text().await {
            Ok(text) => text,
            Err(e) if !(200..300).contains(&status) => {
                debug!("Ignoring unreadable error body: {}", e);
                String::new()
            }
            Err(e) => return Err(e).context("Failed to read response body"),
        };

        Ok(RelayResponse { status, body })
    }
}
