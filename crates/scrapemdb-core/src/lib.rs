//! scrapemdb Core Library
//!
//! This crate harvests title pages of a movie database into JSON documents
//! that a static page can load directly.
//!
//! # Features
//! - Schema-driven field lookups (field name to selector, loaded from JSON)
//! - Best-effort extraction: missing fields degrade, they never abort
//! - Parental guide and review sub-resources with origin restoration
//! - Episode-by-episode series traversal
//! - Merge-write `const NAME_DATA = {...}` documents
//! - Lists and batches of targets
//! - Rate-limited HTTP client and a static-HTML navigator

pub mod client;
pub mod config;
pub mod error;
pub mod extractor;
pub mod harvester;
pub mod layout;
pub mod navigator;
pub mod runner;
pub mod schema;
pub mod store;
pub mod traversal;
pub mod types;

// Re-export main types for convenience
pub use client::{ClientConfig, HttpClient, RateLimiter};
pub use config::{EpisodeBound, HarvestConfig};
pub use error::{Result, ScrapeError};
pub use extractor::FieldExtractor;
pub use harvester::EntityHarvester;
pub use layout::OutputLayout;
pub use navigator::{HtmlElement, HttpNavigator, Navigator};
pub use runner::{collect_targets, ListMode, RunOptions, RunSummary, Runner};
pub use schema::{Schema, Selector, SelectorKind};
pub use store::DocumentStore;
pub use traversal::{SeriesTraversal, TraversalOutcome, TraversalState};
pub use types::{
    CastMember, EntityRecord, GuideEntry, HarvestReport, HarvestRequest, MediaType, Review,
    ReviewOutcome, Target,
};
