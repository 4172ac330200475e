//! Series traversal
//!
//! Walks a series episode by episode, starting from the first episode link
//! on the series' episode page and following the "next episode" control.
//! Each episode is harvested in place into the series' own documents under
//! its label.
//!
//! ```text
//! Init ──▶ AtEpisode(1) ──▶ Advancing(1) ──▶ AtEpisode(2) ──▶ … ──▶ Done
//!   │            │                │
//!   └────────────┴────────────────┴──────▶ Aborted
//! ```

use std::path::PathBuf;
use std::time::{Duration, Instant};

use tracing::{info, warn};

use crate::config::EpisodeBound;
use crate::error::{Result, ScrapeError};
use crate::harvester::EntityHarvester;
use crate::navigator::{base_url, resolve_url, Navigator};
use crate::schema::fields;
use crate::types::HarvestRequest;

/// What the series harvest hands to the traversal
#[derive(Debug, Clone)]
pub struct TraversalPlan {
    /// Data folder of the series, shared by every episode
    pub data_dir: PathBuf,
    /// Episode count shown on the series page (0 when unreadable)
    pub declared_total: usize,
    /// Reviews collected for the series itself
    pub review_count: usize,
    pub guide: bool,
    pub reviews: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraversalState {
    Init,
    /// Harvesting the 1-based episode
    AtEpisode(usize),
    /// Moving past the 1-based episode
    Advancing(usize),
    Done,
    Aborted,
}

impl TraversalState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TraversalState::Done | TraversalState::Aborted)
    }
}

/// Position of the walk
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TraversalCursor {
    pub url: String,
    pub index: usize,
    pub total: usize,
}

/// Final state of a walk
#[derive(Debug)]
pub struct TraversalOutcome {
    pub state: TraversalState,
    pub cursor: TraversalCursor,
    /// Labels of the episodes harvested, in order
    pub episodes: Vec<String>,
    /// Time spent on each finished episode, moving to the next one included
    pub timings: Vec<Duration>,
    /// Why the walk aborted
    pub error: Option<ScrapeError>,
}

impl TraversalOutcome {
    pub fn completed(&self) -> bool {
        self.state == TraversalState::Done
    }
}

/// Episode walk over a series
pub struct SeriesTraversal {
    plan: TraversalPlan,
    bound: EpisodeBound,
    state: TraversalState,
    cursor: TraversalCursor,
    episodes: Vec<String>,
    timings: Vec<Duration>,
    /// Start of the episode currently being processed
    started: Option<Instant>,
    error: Option<ScrapeError>,
}

impl SeriesTraversal {
    pub fn new(plan: TraversalPlan, bound: EpisodeBound) -> Self {
        let cursor = TraversalCursor {
            total: plan.declared_total,
            ..TraversalCursor::default()
        };
        Self {
            plan,
            bound,
            state: TraversalState::Init,
            cursor,
            episodes: Vec::new(),
            timings: Vec::new(),
            started: None,
            error: None,
        }
    }

    pub fn state(&self) -> TraversalState {
        self.state
    }

    /// Drive the walk to a terminal state.
    pub async fn run<N: Navigator>(mut self, harvester: &mut EntityHarvester<N>) -> TraversalOutcome {
        info!(
            episodes = self.plan.declared_total,
            series_reviews = self.plan.review_count,
            "starting series traversal"
        );

        while !self.state.is_terminal() {
            self.state = self.step(harvester).await;
        }

        if self.state == TraversalState::Done {
            info!(harvested = self.episodes.len(), "series traversal finished");
        }
        TraversalOutcome {
            state: self.state,
            cursor: self.cursor,
            episodes: self.episodes,
            timings: self.timings,
            error: self.error,
        }
    }

    async fn step<N: Navigator>(&mut self, harvester: &mut EntityHarvester<N>) -> TraversalState {
        match self.state {
            TraversalState::Init => {
                if self.bound == EpisodeBound::Declared && self.cursor.total == 0 {
                    info!("no declared episodes");
                    return TraversalState::Done;
                }
                match self.enter_first_episode(harvester).await {
                    Ok(()) => TraversalState::AtEpisode(1),
                    Err(err) => self.abort(err),
                }
            }
            TraversalState::AtEpisode(n) => {
                self.started = Some(Instant::now());
                match self.harvest_episode(harvester, n).await {
                    Ok(label) => {
                        self.episodes.push(label);
                        TraversalState::Advancing(n)
                    }
                    Err(err) => self.abort(err),
                }
            }
            TraversalState::Advancing(n) => {
                let next = self.advance_or_finish(harvester, n).await;
                if next != TraversalState::Aborted {
                    self.episode_done(n);
                }
                next
            }
            state @ (TraversalState::Done | TraversalState::Aborted) => state,
        }
    }

    async fn advance_or_finish<N: Navigator>(
        &mut self,
        harvester: &mut EntityHarvester<N>,
        n: usize,
    ) -> TraversalState {
        match self.bound {
            EpisodeBound::Declared if n >= self.cursor.total => TraversalState::Done,
            EpisodeBound::Declared => match advance(harvester, n).await {
                Ok(()) => TraversalState::AtEpisode(n + 1),
                Err(err) => self.abort(err),
            },
            EpisodeBound::FollowChain { max } if n >= max => TraversalState::Done,
            EpisodeBound::FollowChain { .. } => match advance(harvester, n).await {
                Ok(()) => TraversalState::AtEpisode(n + 1),
                // the chain ending past the declared count is the natural end
                Err(_) if n >= self.cursor.total => TraversalState::Done,
                Err(err) => self.abort(err),
            },
        }
    }

    fn episode_done(&mut self, n: usize) {
        let elapsed = self.started.take().map(|t| t.elapsed()).unwrap_or_default();
        info!(
            label = self.episodes.last().map(String::as_str).unwrap_or_default(),
            elapsed = format_args!("{:.2}s", elapsed.as_secs_f64()),
            "[DONE] E{}/{}",
            n,
            self.cursor.total
        );
        self.timings.push(elapsed);
    }

    async fn enter_first_episode<N: Navigator>(
        &mut self,
        harvester: &mut EntityHarvester<N>,
    ) -> Result<()> {
        let series_url = harvester.navigator().current_url().await?;
        let list_url = format!("{}episodes/", base_url(&series_url));
        harvester.navigator_mut().navigate(&list_url).await?;

        let nav = harvester.navigator();
        let first = harvester
            .fields()
            .one(nav, fields::FIRST_EPISODE)
            .await
            .map_err(|e| ScrapeError::TraversalBreak(format!("no first episode link: {e}")))?;
        let href = nav.attribute(&first, "href").await?.ok_or_else(|| {
            ScrapeError::TraversalBreak("first episode link has no href".to_string())
        })?;
        let page_url = nav.current_url().await?;
        let episode_url = resolve_url(&page_url, &href)?;

        harvester.navigator_mut().navigate(&episode_url).await
    }

    async fn harvest_episode<N: Navigator>(
        &mut self,
        harvester: &mut EntityHarvester<N>,
        n: usize,
    ) -> Result<String> {
        let url = harvester.navigator().current_url().await?;
        self.cursor.url = url.clone();
        self.cursor.index = n;

        let label = harvester
            .fields()
            .text(harvester.navigator(), fields::EPISODE_ADDRESS)
            .await
            .map(|raw| episode_label(&raw))
            .map_err(|e| ScrapeError::TraversalBreak(format!("episode {n} has no label: {e}")))?;
        if label.is_empty() {
            return Err(ScrapeError::TraversalBreak(format!(
                "episode {n} has an empty label"
            )));
        }

        let request = HarvestRequest::episode(
            self.plan.data_dir.clone(),
            label.clone(),
            self.plan.guide,
            self.plan.reviews,
        );
        harvester.harvest_entity(&url, &request).await?;
        Ok(label)
    }

    fn abort(&mut self, err: ScrapeError) -> TraversalState {
        let err = match err {
            ScrapeError::TraversalBreak(_) => err,
            other => ScrapeError::TraversalBreak(other.to_string()),
        };
        warn!(
            episode = self.cursor.index,
            total = self.cursor.total,
            error = %err,
            "series traversal aborted"
        );
        self.error = Some(err);
        TraversalState::Aborted
    }
}

async fn advance<N: Navigator>(harvester: &mut EntityHarvester<N>, n: usize) -> Result<()> {
    let next = harvester
        .fields()
        .one(harvester.navigator(), fields::NEXT_EPISODE)
        .await
        .map_err(|e| ScrapeError::TraversalBreak(format!("no next episode after E{n}: {e}")))?;
    harvester.navigator_mut().click(&next).await
}

/// Episode label as shown on the page, e.g. `S1.E2` becomes `S1E2`.
pub fn episode_label(raw: &str) -> String {
    raw.replace('.', "").trim().to_string()
}
