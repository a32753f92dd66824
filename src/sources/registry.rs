//! Source registry
//!
//! In-memory registry for storing and retrieving source adapters and their
//! metadata. Registration order is precedence order: when the deduplicator
//! sees the same fixture from two sources in one run, the source registered
//! first wins.

use std::sync::Arc;

use tracing::warn;

use crate::config::AppConfig;
use crate::sources::{SourceAdapter, SourceMetadata};

/// Error type for registry operations
#[derive(Debug, Clone, thiserror::Error)]
pub enum RegistryError {
    #[error("Source '{slug}' not found")]
    SourceNotFound { slug: String },
}

struct RegisteredSource {
    adapter: Arc<dyn SourceAdapter>,
    metadata: SourceMetadata,
}

/// Ordered registry of source adapters.
///
/// Held per application instance (in `AppState`) rather than as a global so
/// tests can build registries from different configurations side by side.
pub struct Registry {
    sources: Vec<RegisteredSource>,
}

impl Registry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            sources: Vec::new(),
        }
    }

    /// Build the registry from application configuration.
    ///
    /// API-keyed sources register only when their key is configured. The
    /// synthetic generator registers only when no keyed source is available,
    /// so it can never shadow a configured live adapter.
    pub fn from_config(config: &AppConfig) -> Self {
        let mut reg = Self::new();

        if let Some(api_key) = config.anthropic_api_key.clone() {
            let source = Arc::new(crate::sources::llm_search::LlmSearchSource::new(
                api_key,
                config.anthropic_api_base.clone(),
                config.anthropic_model.clone(),
            ));
            crate::sources::llm_search::register_llm_search_source(&mut reg, source);
        } else {
            warn!("llm_search source not registered: missing Anthropic API key");
        }

        if let Some(api_key) = config.sportsdb_api_key.clone() {
            let source = Arc::new(crate::sources::sports_db::SportsDbSource::new(
                api_key,
                config.sportsdb_api_base.clone(),
                &config.ingest,
            ));
            crate::sources::sports_db::register_sports_db_source(&mut reg, source);
        } else {
            warn!("sports_db source not registered: missing TheSportsDB API key");
        }

        if let Some(api_key) = config.football_api_key.clone() {
            let source = Arc::new(crate::sources::fixtures_api::FixturesApiSource::new(
                api_key,
                config.football_api_base.clone(),
                &config.ingest,
            ));
            crate::sources::fixtures_api::register_fixtures_api_source(&mut reg, source);
        } else {
            warn!("fixtures_api source not registered: missing API-Football key");
        }

        let scrape = Arc::new(crate::sources::web_scrape::WebScrapeSource::new(
            &config.ingest,
        ));
        crate::sources::web_scrape::register_web_scrape_source(&mut reg, scrape);

        let any_keyed = config.anthropic_api_key.is_some()
            || config.sportsdb_api_key.is_some()
            || config.football_api_key.is_some();
        if !any_keyed && config.ingest.synthetic_fallback {
            warn!("no keyed live source configured; registering synthetic generator fallback");
            let synthetic = Arc::new(crate::sources::synthetic::SyntheticSource::new());
            crate::sources::synthetic::register_synthetic_source(&mut reg, synthetic);
        }

        reg
    }

    /// Register a source with its metadata. Re-registering a slug replaces
    /// the adapter in place, keeping its position in precedence order.
    pub fn register(&mut self, adapter: Arc<dyn SourceAdapter>, metadata: SourceMetadata) {
        if let Some(existing) = self
            .sources
            .iter_mut()
            .find(|s| s.metadata.slug == metadata.slug)
        {
            existing.adapter = adapter;
            existing.metadata = metadata;
        } else {
            self.sources.push(RegisteredSource { adapter, metadata });
        }
    }

    /// Get an adapter by slug
    pub fn get(&self, slug: &str) -> Result<Arc<dyn SourceAdapter>, RegistryError> {
        self.sources
            .iter()
            .find(|s| s.metadata.slug == slug)
            .map(|s| s.adapter.clone())
            .ok_or_else(|| RegistryError::SourceNotFound {
                slug: slug.to_string(),
            })
    }

    /// Get metadata for a specific source
    pub fn metadata_for(&self, slug: &str) -> Result<&SourceMetadata, RegistryError> {
        self.sources
            .iter()
            .find(|s| s.metadata.slug == slug)
            .map(|s| &s.metadata)
            .ok_or_else(|| RegistryError::SourceNotFound {
                slug: slug.to_string(),
            })
    }

    /// Metadata for all sources, in registration (precedence) order
    pub fn list_metadata(&self) -> Vec<SourceMetadata> {
        self.sources.iter().map(|s| s.metadata.clone()).collect()
    }

    /// Iterate adapters with their metadata, in registration order
    pub fn iter(&self) -> impl Iterator<Item = (&Arc<dyn SourceAdapter>, &SourceMetadata)> {
        self.sources.iter().map(|s| (&s.adapter, &s.metadata))
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}
