//! niche-finder - keyword-driven niche discovery on the seller portal
//!
//! Queries the opportunity explorer for each keyword, enriches every niche
//! with its launch potential and keeps the ones that meet the thresholds.

pub mod commands;
pub mod config;
pub mod error;
pub mod filters;
pub mod format;
pub mod pacing;
pub mod search;
pub mod seller;

pub use config::Config;
pub use error::{QueryError, QueryResult};
pub use filters::FilterThresholds;
pub use search::{BatchDriver, NicheFinder, RunOutcome, SearchCriteria};
pub use seller::{AuthContext, Marketplace, NicheResult, SellerCentralClient};
