//! Test modules for the Fixturecast API.
//!
//! Each file here is also compiled as its own integration test binary;
//! this listing keeps them reachable as one module tree.

#[allow(clippy::duplicate_mod)]
pub mod fixtures_api_integration_tests;
#[allow(clippy::duplicate_mod)]
pub mod pipeline_tests;
#[allow(clippy::duplicate_mod)]
pub mod web_scrape_integration_tests;
