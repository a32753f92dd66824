//! Scrape source seeding functionality
//!
//! This module provides the default scrape source catalog for tenants that
//! have not registered any sources yet. Seeding only ever fires against an
//! empty catalog, so a tenant that deletes a default stays rid of it.

use sea_orm::{DatabaseConnection, DbErr};
use uuid::Uuid;

use crate::repositories::data_source::{DataSourceRepository, NewDataSource};

/// Configuration structure for a seeded scrape source
struct SeedSource {
    name: &'static str,
    url: &'static str,
    description: &'static str,
}

/// UK broadcast listing pages the scrape adapter understands well.
const DEFAULT_SOURCES: &[SeedSource] = &[
    SeedSource {
        name: "BBC Sport",
        url: "https://www.bbc.co.uk/sport/football/fixtures",
        description: "BBC Sport football fixtures listing",
    },
    SeedSource {
        name: "Sky Sports",
        url: "https://www.skysports.com/watch/sport-on-sky",
        description: "Sky Sports broadcast schedule",
    },
    SeedSource {
        name: "Live Football on TV",
        url: "https://www.live-footballontv.com/",
        description: "Aggregated UK football TV listings",
    },
    SeedSource {
        name: "Wheresthematch",
        url: "https://www.wheresthematch.com/",
        description: "Multi-sport UK TV fixture guide",
    },
];

/// Seeds the default scrape sources for a tenant with an empty catalog
///
/// This function checks whether the tenant has any data sources registered
/// and, if not, creates the default catalog. Tenants that already manage
/// their own sources (including having deleted defaults) are left alone.
///
/// # Arguments
///
/// * `db` - Database connection
/// * `tenant_id` - The tenant whose catalog should be ensured
///
/// # Returns
///
/// Returns a Result indicating success or failure
pub async fn ensure_default_sources(db: &DatabaseConnection, tenant_id: Uuid) -> Result<(), DbErr> {
    let repo = DataSourceRepository::new(db);

    if !repo.list(tenant_id).await?.is_empty() {
        return Ok(());
    }

    log::info!("Seeding default scrape sources for tenant {}", tenant_id);

    for seed in DEFAULT_SOURCES {
        match repo
            .create(
                tenant_id,
                NewDataSource {
                    name: seed.name.to_string(),
                    url: seed.url.to_string(),
                    description: Some(seed.description.to_string()),
                    is_active: true,
                },
            )
            .await
        {
            Ok(_) => {
                log::info!("Created scrape source: {}", seed.name);
            }
            Err(e) => {
                log::error!("Failed to create scrape source '{}': {}", seed.name, e);
                return Err(e);
            }
        }
    }

    log::info!("Scrape source seeding completed successfully");
    Ok(())
}
