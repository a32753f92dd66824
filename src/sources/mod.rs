//! Sources module
//!
//! This module provides the source adapter SDK including:
//! - The `SourceAdapter` trait defining the interface for all upstream fetchers
//! - Source metadata and registry for discovery, ordering, and lookup
//! - Individual adapter implementations

pub mod fixtures_api;
pub mod llm_search;
pub mod metadata;
pub mod registry;
pub mod sports_db;
pub mod synthetic;
pub mod trait_;
pub mod web_scrape;

pub use metadata::{FallbackPolicy, SourceMetadata};
pub use registry::{Registry, RegistryError};
pub use trait_::{
    FetchContext, FetchOutcome, IngestWindow, RawEvent, SourceAdapter, SourceError,
};

pub use fixtures_api::{FixturesApiSource, register_fixtures_api_source};
pub use llm_search::{LlmSearchSource, register_llm_search_source};
pub use sports_db::{SportsDbSource, register_sports_db_source};
pub use synthetic::{SyntheticSource, register_synthetic_source};
pub use web_scrape::{WebScrapeSource, register_web_scrape_source};
