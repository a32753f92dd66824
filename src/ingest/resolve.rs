//! # Channel Resolver
//!
//! Maps the free-text channel names sources report onto the tenant's
//! configured channels. Matching runs in fixed tiers, most precise first,
//! and within a tier the tenant's channel order decides ties, so the same
//! inputs always resolve the same way.

use crate::models::channel::Model as Channel;

/// Broadcaster families whose names vary wildly across listings ("Sky
/// Sports", "Sky Sports Main Event", "Sky Sports PL"). Sharing a family
/// token is enough for a last-tier match.
const FAMILY_TOKENS: &[&str] = &["sky", "bt", "tnt", "bbc"];

/// Resolve a reported channel name against the tenant's channels.
///
/// Tiers, in order: case-insensitive exact match, containment in either
/// direction, shared broadcaster family token. Returns `None` when no tier
/// matches; the caller applies the source's fallback policy.
pub fn resolve<'a>(channel_name: &str, channels: &'a [Channel]) -> Option<&'a Channel> {
    let needle = channel_name.trim().to_lowercase();
    if needle.is_empty() {
        return None;
    }

    if let Some(exact) = channels.iter().find(|c| c.name.to_lowercase() == needle) {
        return Some(exact);
    }

    if let Some(contained) = channels.iter().find(|c| {
        let name = c.name.to_lowercase();
        name.contains(&needle) || needle.contains(&name)
    }) {
        return Some(contained);
    }

    channels.iter().find(|c| {
        let name = c.name.to_lowercase();
        FAMILY_TOKENS
            .iter()
            .any(|token| name.contains(token) && needle.contains(token))
    })
}
