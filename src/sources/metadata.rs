//! # Source Metadata
//!
//! Descriptive metadata attached to each registered source adapter. The
//! fallback policy recorded here drives how the channel resolver treats
//! events from the source when no channel matches by name.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// What the resolver does with an event whose channel name matched nothing.
///
/// Sources that invent or paraphrase channel names (the LLM search, the
/// synthetic generator) fall back to the tenant's first active channel so
/// their events still land somewhere visible. Sources that relay real
/// broadcast listings drop the event instead: a wrong channel on a real
/// fixture is worse than a missing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum FallbackPolicy {
    /// Discard events whose channel cannot be resolved.
    Drop,
    /// Bind unresolved events to the tenant's first active channel.
    FirstActive,
}

/// Metadata describing a registered source.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SourceMetadata {
    /// Stable identifier, matches `SourceAdapter::slug`.
    pub slug: String,
    /// Human-readable name for reports and the API surface.
    pub display_name: String,
    /// Resolver behavior for unmatched channel names.
    pub fallback_policy: FallbackPolicy,
    /// Whether the source needs an upstream API key to operate.
    pub api_keyed: bool,
}

impl SourceMetadata {
    pub fn new(
        slug: impl Into<String>,
        display_name: impl Into<String>,
        fallback_policy: FallbackPolicy,
        api_keyed: bool,
    ) -> Self {
        Self {
            slug: slug.into(),
            display_name: display_name.into(),
            fallback_policy,
            api_keyed,
        }
    }
}
