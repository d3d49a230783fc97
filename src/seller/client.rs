//! Typed access to the two opportunity explorer queries.

use crate::config::Config;
use crate::error::QueryResult;
use crate::pacing::Sleeper;
use crate::search::events::LogSink;
use crate::seller::models::{AuthContext, NicheCandidate, NicheDetail};
use crate::seller::queries;
use crate::seller::retry::{RetryPolicy, RetryingClient};
use crate::seller::transport::{HttpTransport, Transport};
use anyhow::Result;
use std::sync::Arc;
use tracing::info;

/// Seller portal client: query documents on top of the retrying transport.
pub struct SellerCentralClient<T> {
    inner: RetryingClient<T>,
}

impl SellerCentralClient<HttpTransport> {
    /// Creates a client over HTTP using the configured endpoint and retry budget.
    pub fn from_config(config: &Config, sleeper: Arc<dyn Sleeper>) -> Result<Self> {
        let transport = HttpTransport::new(config)?;
        Ok(Self::new(transport, sleeper, RetryPolicy::with_max_attempts(config.max_attempts)))
    }
}

impl<T: Transport> SellerCentralClient<T> {
    pub fn new(transport: T, sleeper: Arc<dyn Sleeper>, policy: RetryPolicy) -> Self {
        Self { inner: RetryingClient::new(transport, sleeper, policy) }
    }

    pub fn transport(&self) -> &T {
        self.inner.transport()
    }

    /// Searches niches matching `keyword` in one marketplace.
    pub async fn list_niches(
        &self,
        keyword: &str,
        marketplace_id: &str,
        auth: &AuthContext,
        log: &mut (dyn LogSink + Send),
    ) -> QueryResult<Vec<NicheCandidate>> {
        info!("Searching niches: {}", keyword);
        let request = queries::niches_request(keyword, marketplace_id);
        let payload = self.inner.send(&request, auth, log).await?;
        queries::parse_niches(&payload)
    }

    /// Fetches launch potential; `None` when the niche has none.
    pub async fn niche_detail(
        &self,
        niche_id: &str,
        marketplace_id: &str,
        auth: &AuthContext,
        log: &mut (dyn LogSink + Send),
    ) -> QueryResult<Option<NicheDetail>> {
        info!("Fetching niche detail: {}", niche_id);
        let request = queries::niche_detail_request(niche_id, marketplace_id);
        let payload = self.inner.send(&request, auth, log).await?;
        queries::parse_niche_detail(&payload)
    }
}
