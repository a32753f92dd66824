//! Database seeding functionality
//!
//! This module provides functionality to seed the database with initial
//! data. Today that is the default scrape source catalog, created lazily
//! for tenants that have never registered a source of their own.

pub mod data_source;

pub use data_source::ensure_default_sources;
