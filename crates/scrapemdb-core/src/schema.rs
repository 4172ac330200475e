//! Selector schema
//!
//! Maps field names to element selectors. The selector kind is a closed
//! enum, so an unknown kind is rejected when the schema is loaded rather
//! than at lookup time.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

use crate::error::{Result, ScrapeError};

/// Field names looked up by the harvester and the series traversal.
pub mod fields {
    pub const TITLE: &str = "targetTitle";
    pub const DATE: &str = "targetDate";
    pub const RATE: &str = "targetRate";
    pub const DESCRIPTION: &str = "targetDescription";
    pub const TYPE: &str = "targetType";
    pub const CAST_NAME: &str = "castName";
    pub const CAST_ROLE: &str = "castRole";
    pub const RUNTIME: &str = "runtime";
    pub const DIRECTORS: &str = "targetDirs";
    pub const GUIDE: &str = "parentsGuide";
    pub const GUIDE_RATING: &str = "parentsGuideRating";
    pub const GUIDE_TYPE: &str = "parentsGuideType";
    pub const REVIEW_TITLE: &str = "reviewTitle";
    pub const REVIEW_CONTENT: &str = "reviewContent";
    pub const REVIEW_ALL_BUTTON: &str = "reviewAllbtn";
    pub const EPISODE_COUNT: &str = "epsCount";
    pub const EPISODE_ADDRESS: &str = "epsAddress";
    pub const FIRST_EPISODE: &str = "firstEps";
    pub const NEXT_EPISODE: &str = "nextEpsBtn";
}

/// Strategy used to locate an element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
pub enum SelectorKind {
    #[serde(rename = "CLASS_NAME", alias = "class")]
    Class,
    #[serde(rename = "ID", alias = "id")]
    Id,
    #[serde(rename = "XPATH", alias = "xpath")]
    XPath,
    #[serde(rename = "NAME", alias = "name")]
    Name,
    #[serde(rename = "CSS_SELECTOR", alias = "css")]
    Css,
    #[serde(rename = "TAG_NAME", alias = "tag")]
    Tag,
    #[serde(rename = "LINK_TEXT", alias = "link-text")]
    LinkText,
    #[serde(rename = "PARTIAL_LINK_TEXT", alias = "partial-link-text")]
    PartialLinkText,
}

/// One schema entry: how to find a field on the page
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Selector {
    #[serde(rename = "by")]
    pub kind: SelectorKind,
    pub value: String,
}

impl Selector {
    pub fn new(kind: SelectorKind, value: impl Into<String>) -> Self {
        Self {
            kind,
            value: value.into(),
        }
    }

    pub fn css(value: impl Into<String>) -> Self {
        Self::new(SelectorKind::Css, value)
    }
}

impl std::fmt::Display for Selector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}={}", self.kind, self.value)
    }
}

/// Immutable mapping from field name to selector
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct Schema {
    entries: HashMap<String, Selector>,
}

impl Schema {
    /// Build a schema from `(field, selector)` pairs.
    pub fn from_entries<I, K>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, Selector)>,
        K: Into<String>,
    {
        Self {
            entries: entries.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    /// Parse a schema from JSON text.
    ///
    /// # Errors
    /// `ScrapeError::InvalidSchema` if the JSON is malformed or names an
    /// unknown selector kind.
    ///
    /// # Examples
    /// ```
    /// use scrapemdb_core::{Schema, SelectorKind};
    ///
    /// let schema = Schema::from_json_str(
    ///     r#"{ "targetTitle": { "by": "CSS_SELECTOR", "value": "h1" } }"#,
    /// ).unwrap();
    /// assert_eq!(schema.get("targetTitle").unwrap().kind, SelectorKind::Css);
    ///
    /// assert!(Schema::from_json_str(r#"{ "x": { "by": "SHADOW", "value": "y" } }"#).is_err());
    /// ```
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| ScrapeError::InvalidSchema(e.to_string()))
    }

    /// Load a schema from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ScrapeError::InvalidSchema(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_json_str(&content)
    }

    /// Look up the selector for a field.
    ///
    /// # Errors
    /// `ScrapeError::MissingSchemaEntry` if the field is not in the schema.
    pub fn get(&self, field: &str) -> Result<&Selector> {
        self.entries
            .get(field)
            .ok_or_else(|| ScrapeError::MissingSchemaEntry(field.to_string()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
