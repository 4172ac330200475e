//! Target runner
//!
//! Processes targets strictly in order through one harvester. A failing
//! target is logged and the run moves on; only a fatal error (the session
//! itself is gone) stops it. Ctrl-C skips the target in progress.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{error, info, warn};

use crate::error::Result;
use crate::harvester::EntityHarvester;
use crate::layout::{batch_list_name, validate_append_path};
use crate::navigator::{normalize_url, Navigator};
use crate::types::{HarvestRequest, MediaType, Target};

/// Where the targets of a run are collected
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ListMode {
    /// Each target in its own folder; several targets form a batch list
    #[default]
    None,
    /// Create a new list with this name
    New(String),
    /// Append to an existing list folder
    Append(PathBuf),
}

/// Options for one run
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub targets: Vec<String>,
    /// Forced media type for every target
    pub media_type: Option<MediaType>,
    /// Skip the parental guide and reviews
    pub fast: bool,
    pub enhanced_reviews: bool,
    pub list: ListMode,
}

/// Counts of what happened to each target
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub harvested: usize,
    pub failed: usize,
    pub skipped: usize,
}

/// Gather targets from arguments and an optional file, one per line.
///
/// Blank lines are ignored and every target is normalized to a URL.
///
/// # Errors
/// `ScrapeError::Io` if the targets file cannot be read.
pub fn collect_targets(args: &[String], file: Option<&Path>) -> Result<Vec<String>> {
    let mut targets: Vec<String> = args.to_vec();

    if let Some(file) = file {
        info!(path = %file.display(), "reading targets");
        let content = fs::read_to_string(file)?;
        targets.extend(
            content
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(String::from),
        );
    }

    Ok(targets.iter().map(|t| normalize_url(t)).collect())
}

/// Drives a harvester over a list of targets
pub struct Runner<N: Navigator> {
    harvester: EntityHarvester<N>,
}

impl<N: Navigator> Runner<N> {
    pub fn new(harvester: EntityHarvester<N>) -> Self {
        Self { harvester }
    }

    pub fn harvester(&self) -> &EntityHarvester<N> {
        &self.harvester
    }

    pub fn into_harvester(self) -> EntityHarvester<N> {
        self.harvester
    }

    /// List folder the run writes into, creating it when needed.
    ///
    /// # Errors
    /// `ScrapeError::InvalidListFolder` for an append path that is not a list.
    pub fn resolve_list(&self, options: &RunOptions) -> Result<Option<PathBuf>> {
        let layout = self.harvester.layout();
        let store = self.harvester.store();

        match &options.list {
            ListMode::New(name) => {
                let folder = layout.create_list(store, name)?;
                info!(path = %folder.display(), "list ready");
                Ok(Some(folder))
            }
            ListMode::Append(path) => {
                let folder = validate_append_path(path)?;
                info!(path = %folder.display(), "targeting list");
                Ok(Some(folder))
            }
            ListMode::None if options.targets.len() > 1 => {
                let name = batch_list_name();
                warn!(list = %name, "multiple targets detected, creating a batch list");
                Ok(Some(layout.create_list(store, &name)?))
            }
            ListMode::None => Ok(None),
        }
    }

    /// Harvest every target in order.
    ///
    /// # Errors
    /// List set-up failures, and fatal harvest errors; per-target failures
    /// are only counted.
    pub async fn run(&mut self, options: &RunOptions) -> Result<RunSummary> {
        let list_dir = self.resolve_list(options)?;
        let total = options.targets.len();
        let mut summary = RunSummary::default();

        for (idx, url) in options.targets.iter().enumerate() {
            info!("--- [{}/{}] Processing: {} ---", idx + 1, total, url);

            if list_dir.is_some() && options.media_type == Some(MediaType::Series) {
                error!(url = %url, "skipping: series cannot be added to a list");
                summary.skipped += 1;
                continue;
            }

            let request = HarvestRequest {
                target: match &list_dir {
                    Some(list_dir) => Target::ListItem {
                        list_dir: list_dir.clone(),
                    },
                    None => Target::Root,
                },
                media_type: options.media_type,
                guide: !options.fast,
                reviews: !options.fast,
                enhanced_reviews: options.enhanced_reviews,
                core_only: false,
            };

            tokio::select! {
                result = self.harvester.harvest(url, &request) => match result {
                    Ok(report) => {
                        info!(
                            title = %report.record.title,
                            path = %report.data_dir.display(),
                            "harvested"
                        );
                        summary.harvested += 1;
                    }
                    Err(err) if err.is_fatal() => return Err(err),
                    Err(err) => {
                        error!(url = %url, error = %err, "scrape error");
                        summary.failed += 1;
                    }
                },
                _ = tokio::signal::ctrl_c() => {
                    warn!(url = %url, "skipping current item");
                    summary.skipped += 1;
                }
            }
        }

        info!(
            harvested = summary.harvested,
            failed = summary.failed,
            skipped = summary.skipped,
            "operations complete"
        );
        Ok(summary)
    }
}
