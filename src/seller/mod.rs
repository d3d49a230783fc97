//! Seller portal access: transport, retry, query documents and data models.

pub mod client;
pub mod marketplaces;
pub mod models;
pub mod queries;
pub mod retry;
pub mod transport;

pub use client::SellerCentralClient;
pub use marketplaces::Marketplace;
pub use models::{AuthContext, NicheCandidate, NicheDetail, NicheMetrics, NicheResult};
pub use retry::{RetryPolicy, RetryingClient};
pub use transport::{Endpoint, GraphQlRequest, HttpTransport, RelayResponse, Transport};
