//! Data types for scrapemdb
//!
//! This module contains the record shapes written into documents and the
//! request/report types exchanged with the harvester.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::ScrapeError;
use crate::traversal::TraversalOutcome;

/// Placeholder substituted for a core field that could not be read
pub const SENTINEL: &str = "None";

/// Document key of a series' own record inside its primary document
pub const SERIES_ROOT_KEY: &str = "main";

/// Kind of entity being harvested
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    /// Single feature, filed under `Movies`
    Movie,
    /// Multi-part entity, filed under `Series` with nested episodes
    Series,
}

impl MediaType {
    /// Infer the media type from the page's type label.
    ///
    /// # Examples
    /// ```
    /// use scrapemdb_core::MediaType;
    ///
    /// assert_eq!(MediaType::infer("TV Series"), MediaType::Series);
    /// assert_eq!(MediaType::infer("Episode aired 2020"), MediaType::Series);
    /// assert_eq!(MediaType::infer("Unknown"), MediaType::Movie);
    /// ```
    pub fn infer(type_label: &str) -> Self {
        if ["Series", "TV", "Episode"]
            .iter()
            .any(|needle| type_label.contains(needle))
        {
            MediaType::Series
        } else {
            MediaType::Movie
        }
    }
}

impl std::str::FromStr for MediaType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "movie" => Ok(MediaType::Movie),
            "series" => Ok(MediaType::Series),
            other => Err(format!("unknown media type: {other}")),
        }
    }
}

/// One cast member with the role they play
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CastMember {
    pub name: String,
    pub role: String,
}

/// One parental guide category with its severity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuideEntry {
    #[serde(rename = "type")]
    pub kind: String,
    pub rate: String,
}

/// One user review
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    pub title: String,
    pub content: String,
}

/// Result of the review sub-resource fetch
#[derive(Debug)]
pub enum ReviewOutcome {
    /// Reviews were not requested
    Skipped,
    /// Titles and contents paired positionally
    Found(Vec<Review>),
    /// Review page had no usable review elements
    Unfound,
    /// Enhanced loading failed; the raw error is the review result
    RevealFailed(ScrapeError),
}

impl ReviewOutcome {
    /// Number of reviews collected (zero unless `Found`).
    pub fn count(&self) -> usize {
        match self {
            ReviewOutcome::Found(reviews) => reviews.len(),
            _ => 0,
        }
    }
}

/// Everything harvested for one entity
#[derive(Debug)]
pub struct EntityRecord {
    /// Sanitized title, safe as a folder name and document key
    pub id: String,
    pub title: String,
    pub date: String,
    pub rating: String,
    pub description: String,
    pub runtime: Option<String>,
    /// Ordered, de-duplicated director names; `None` when the field is missing
    pub directors: Option<Vec<String>>,
    pub cast: Vec<CastMember>,
    /// `None` when the guide was requested but could not be fetched
    pub guide: Option<Vec<GuideEntry>>,
    pub reviews: ReviewOutcome,
}

/// Where a harvested entity is written
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// Top-level entity filed under its category root
    Root,
    /// Entity appended to an existing list folder
    ListItem { list_dir: PathBuf },
    /// Episode nested inside its series' documents
    Episode { data_dir: PathBuf, label: String },
}

/// Options for one `harvest` call
#[derive(Debug, Clone)]
pub struct HarvestRequest {
    pub target: Target,
    /// Forced media type; inferred from the page when `None`
    pub media_type: Option<MediaType>,
    /// Fetch the parental guide sub-resource
    pub guide: bool,
    /// Fetch the review sub-resource
    pub reviews: bool,
    /// Try to reveal and lazy-load all reviews
    pub enhanced_reviews: bool,
    /// Never start a series traversal
    pub core_only: bool,
}

impl HarvestRequest {
    /// Full harvest of a top-level target.
    pub fn root() -> Self {
        Self {
            target: Target::Root,
            media_type: None,
            guide: true,
            reviews: true,
            enhanced_reviews: false,
            core_only: false,
        }
    }

    /// Restricted harvest of one episode into its series documents.
    pub fn episode(data_dir: PathBuf, label: String, guide: bool, reviews: bool) -> Self {
        Self {
            target: Target::Episode { data_dir, label },
            media_type: Some(MediaType::Series),
            guide,
            reviews,
            enhanced_reviews: false,
            core_only: true,
        }
    }

    pub fn is_episode(&self) -> bool {
        matches!(self.target, Target::Episode { .. })
    }
}

/// What a `harvest` call produced and where it was stored
#[derive(Debug)]
pub struct HarvestReport {
    pub record: EntityRecord,
    pub media_type: MediaType,
    /// Folder holding `main.js` and `review.js`
    pub data_dir: PathBuf,
    /// Key of this entity inside its documents
    pub key: String,
    /// Present when a series traversal ran
    pub traversal: Option<TraversalOutcome>,
}
