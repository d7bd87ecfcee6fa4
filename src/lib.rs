//! # tilebase
//!
//! A product categorization and retrieval engine for tile retail catalogs.
//!
//! tilebase consumes product records from an external acquisition feed,
//! classifies each one against a static keyword taxonomy (category,
//! subcategory, installation complexity, RAG keywords), and serves ranked
//! retrieval queries over the categorized catalog. Cross-sell suggestions
//! come from a fixed compatibility table (tile → thinset → grout → trim).
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌─────────────┐   ┌───────────┐
//! │ Product feed │──▶│ Categorizer │──▶│  SQLite    │
//! │ (JSON files) │   │ + taxonomy  │   │ FTS5 rows  │
//! └──────────────┘   └─────────────┘   └────┬──────┘
//!                                           │
//!                        ┌──────────────────┤
//!                        ▼                  ▼
//!                  ┌───────────┐     ┌────────────┐
//!                  │  search   │     │  related    │
//!                  │ (ranked)  │     │ (cross-sell)│
//!                  └───────────┘     └────────────┘
//! ```
//!
//! The categorizer and query scorer are pure functions over immutable
//! tables loaded once at startup; the database is the only shared mutable
//! resource, and categorization writes land one transaction per batch.
//!
//! ## Quick Start
//!
//! ```bash
//! tilebase init                 # create database
//! tilebase ingest               # load product feed files
//! tilebase categorize           # classify pending products
//! tilebase search "porcelain for shower walls"
//! tilebase related TIL-1042     # cross-sell suggestions
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`taxonomy`] | Category/subcategory enums and weighted keyword table |
//! | [`categorize`] | Keyword-weighted product categorization |
//! | [`related`] | Cross-sell compatibility table |
//! | [`query`] | Filtered, ranked retrieval over the catalog |
//! | [`feed`] | Product feed ingestion |
//! | [`get`] | Product lookup by SKU |
//! | [`stats`] | Catalog statistics |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema migrations |

pub mod categorize;
pub mod config;
pub mod db;
pub mod feed;
pub mod get;
pub mod migrate;
pub mod models;
pub mod query;
pub mod related;
pub mod stats;
pub mod taxonomy;
