//! # Fixturecast API Library
//!
//! This library provides the core functionality for the Fixturecast service:
//! source adapters, the ingestion pipeline, handlers, models, and server
//! configuration.

pub mod config;
pub mod cursor;
pub mod db;
pub mod error;
pub mod handlers;
pub mod ingest;
pub mod models;
pub mod repositories;
pub mod seeds;
pub mod server;
pub mod sources;
pub mod sports;
pub mod telemetry;
pub use migration;
