//! Harvest configuration
//!
//! An immutable value handed to the harvester at construction. Nothing in
//! the crate reads process-wide settings.

use std::collections::HashSet;
use std::time::Duration;

use crate::error::ScrapeError;
use crate::schema::fields;

/// How the declared episode count bounds a series walk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EpisodeBound {
    /// Process at most the declared number of episodes
    #[default]
    Declared,
    /// Keep following "next" past the declared count, up to `max` episodes
    FollowChain { max: usize },
}

/// Configuration for the entity harvester
#[derive(Debug, Clone)]
pub struct HarvestConfig {
    /// Bounded wait for each element lookup (default: single poll)
    pub lookup_timeout: Duration,
    /// Fields whose absence is not logged
    pub silent_fields: HashSet<String>,
    /// Downward scrolls after revealing all reviews (default: 8)
    pub review_scrolls: u32,
    /// Pixels per review scroll (default: 500000)
    pub review_scroll_delta: i64,
    /// Pause after each review scroll (default: 1s)
    pub review_settle_delay: Duration,
    /// Scroll needed to bring the runtime into view (default: 8000)
    pub runtime_scroll_delta: i64,
    /// Series walk bound policy
    pub episode_bound: EpisodeBound,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            lookup_timeout: Duration::ZERO,
            silent_fields: default_silent_fields(),
            review_scrolls: 8,
            review_scroll_delta: 500_000,
            review_settle_delay: Duration::from_secs(1),
            runtime_scroll_delta: 8000,
            episode_bound: EpisodeBound::Declared,
        }
    }
}

impl HarvestConfig {
    /// Whether a missing `field` should be reported.
    pub fn reports_missing(&self, field: &str) -> bool {
        !self.silent_fields.contains(field)
    }

    /// Whether a failed lookup of `field` deserves a warning. Silent fields
    /// only quiet plain misses; any other failure is always reported.
    pub fn warns_on(&self, field: &str, err: &ScrapeError) -> bool {
        !err.is_not_found() || self.reports_missing(field)
    }
}

/// Optional fields that are routinely absent.
pub fn default_silent_fields() -> HashSet<String> {
    [
        fields::TYPE,
        fields::REVIEW_ALL_BUTTON,
        fields::GUIDE,
        fields::GUIDE_RATING,
        fields::GUIDE_TYPE,
    ]
    .into_iter()
    .map(String::from)
    .collect()
}
