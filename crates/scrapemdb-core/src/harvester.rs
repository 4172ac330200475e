//! Entity harvester
//!
//! Extracts one entity (movie, series or episode) field by field and writes
//! each field into its documents as soon as it resolves. A missing field or
//! sub-resource never aborts the others: it degrades to the sentinel,
//! `null`, or an empty list. Only navigating to the origin and document
//! I/O can fail a harvest.
//!
//! Sub-resources (parental guide, reviews) live on sibling pages. Every
//! visit restores the origin page before returning, whatever the outcome.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::HarvestConfig;
use crate::error::{Result, ScrapeError};
use crate::extractor::{clean_text, FieldExtractor};
use crate::layout::{
    data_dir, entity_folder_name, main_document, review_document, sanitize_title, OutputLayout,
};
use crate::navigator::{base_url, normalize_url, Navigator};
use crate::schema::{fields, Schema};
use crate::store::DocumentStore;
use crate::traversal::{SeriesTraversal, TraversalPlan};
use crate::types::{
    CastMember, EntityRecord, GuideEntry, HarvestReport, HarvestRequest, MediaType, Review,
    ReviewOutcome, Target, SENTINEL, SERIES_ROOT_KEY,
};

/// A sub-resource page is tried at most this many times
const MAX_SUB_RESOURCE_ATTEMPTS: u32 = 2;

/// Scroll applied when enhanced review loading fails midway
const REVEAL_SCROLL_BACK: i64 = 10_000;

const SCROLL_INTO_VIEW: &str = "arguments[0].scrollIntoView({block: 'center'});";
const CLICK: &str = "arguments[0].click();";

/// Orchestrates the extraction of one entity through a [`Navigator`]
pub struct EntityHarvester<N: Navigator> {
    nav: N,
    fields: FieldExtractor,
    config: HarvestConfig,
    store: DocumentStore,
    layout: OutputLayout,
}

impl<N: Navigator> EntityHarvester<N> {
    pub fn new(nav: N, schema: Arc<Schema>, config: HarvestConfig, layout: OutputLayout) -> Self {
        Self {
            nav,
            fields: FieldExtractor::new(schema, config.lookup_timeout),
            config,
            store: DocumentStore::new(),
            layout,
        }
    }

    pub fn navigator(&self) -> &N {
        &self.nav
    }

    pub fn navigator_mut(&mut self) -> &mut N {
        &mut self.nav
    }

    pub fn into_navigator(self) -> N {
        self.nav
    }

    pub fn layout(&self) -> &OutputLayout {
        &self.layout
    }

    pub fn store(&self) -> &DocumentStore {
        &self.store
    }

    pub(crate) fn fields(&self) -> &FieldExtractor {
        &self.fields
    }

    /// Harvest the entity at `origin_url`.
    ///
    /// A series harvested as a root target continues with its episodes
    /// unless the request is core-only; the walk's outcome is attached to
    /// the report.
    ///
    /// # Errors
    /// - `ScrapeError::NavigationFailure` if the origin page cannot be loaded
    /// - `ScrapeError::Io` / `ScrapeError::Json` if a document cannot be written
    pub async fn harvest(
        &mut self,
        origin_url: &str,
        request: &HarvestRequest,
    ) -> Result<HarvestReport> {
        let (mut report, plan) = self.harvest_entity(origin_url, request).await?;
        if let Some(plan) = plan {
            let traversal = SeriesTraversal::new(plan, self.config.episode_bound);
            report.traversal = Some(traversal.run(self).await);
        }
        Ok(report)
    }

    /// Harvest without walking episodes; returns the walk to perform, if any.
    pub(crate) async fn harvest_entity(
        &mut self,
        origin_url: &str,
        request: &HarvestRequest,
    ) -> Result<(HarvestReport, Option<TraversalPlan>)> {
        self.ensure_at(origin_url).await?;

        let title = self.core_text(fields::TITLE, None).await;
        let date = self.core_text(fields::DATE, Some(("–", " - "))).await;
        let rating = self.core_text(fields::RATE, None).await;
        let description = self.core_text(fields::DESCRIPTION, Some(("–", "-"))).await;
        let id = sanitize_title(&title);

        let media_type = match request.media_type {
            Some(media_type) => media_type,
            None => self.detect_media_type().await,
        };

        let (data_dir, key) = self.resolve_location(&request.target, media_type, &id, &date)?;
        let main_doc = main_document(&data_dir);
        self.store.init(&main_doc)?;

        let key_ns = Some(key.as_str());
        self.store.write(&main_doc, "Title", &title, key_ns)?;
        self.store.write(&main_doc, "Date", &date, key_ns)?;
        self.store.write(&main_doc, "Rate", &rating, key_ns)?;
        self.store.write(&main_doc, "Description", &description, key_ns)?;

        let cast = self.fetch_cast().await;
        self.store.write(&main_doc, "Cast", &cast, key_ns)?;
        let runtime = self.fetch_runtime().await;
        self.store.write(&main_doc, "Runtime", &runtime, key_ns)?;
        let directors = self.fetch_directors().await;
        self.store.write(&main_doc, "Directors", &directors, key_ns)?;

        let subject = if key == SERIES_ROOT_KEY { title.as_str() } else { key.as_str() };

        let guide = if request.guide {
            let guide = self.fetch_guide().await;
            if guide.is_none() {
                info!(subject, "[UNFOUND] Can't find Parents Guide data");
            }
            self.store.write(&main_doc, "ParentsGuide", &guide, key_ns)?;
            guide
        } else {
            None
        };

        let reviews = if request.reviews {
            let review_doc = review_document(&data_dir);
            if !request.is_episode() {
                self.store.init(&review_doc)?;
            }
            let outcome = self.fetch_reviews(request.enhanced_reviews).await;
            match &outcome {
                ReviewOutcome::Found(list) => {
                    self.store.write(&review_doc, "Reviews", list, key_ns)?;
                }
                ReviewOutcome::RevealFailed(err) => {
                    warn!(subject, error = %err, "loading all reviews failed");
                    self.store.write(&review_doc, "Reviews", err, key_ns)?;
                }
                ReviewOutcome::Unfound | ReviewOutcome::Skipped => {
                    info!(subject, "[UNFOUND] Can't find Reviews data");
                    self.store
                        .write(&review_doc, "Reviews", &serde_json::Value::Null, key_ns)?;
                }
            }
            outcome
        } else {
            ReviewOutcome::Skipped
        };

        let plan = if media_type == MediaType::Series
            && !request.core_only
            && request.target == Target::Root
        {
            Some(TraversalPlan {
                data_dir: data_dir.clone(),
                declared_total: self.episode_count().await,
                review_count: reviews.count(),
                guide: request.guide,
                reviews: request.reviews,
            })
        } else {
            None
        };

        let report = HarvestReport {
            record: EntityRecord {
                id,
                title,
                date,
                rating,
                description,
                runtime,
                directors,
                cast,
                guide,
                reviews,
            },
            media_type,
            data_dir,
            key,
            traversal: None,
        };
        Ok((report, plan))
    }

    async fn ensure_at(&mut self, url: &str) -> Result<()> {
        let url = normalize_url(url);
        match self.nav.current_url().await {
            Ok(current) if current == url => Ok(()),
            _ => self.nav.navigate(&url).await,
        }
    }

    fn resolve_location(
        &self,
        target: &Target,
        media_type: MediaType,
        id: &str,
        date: &str,
    ) -> Result<(PathBuf, String)> {
        let (dir, key) = match target {
            Target::Root => {
                let folder = entity_folder_name(id, date);
                let dir = data_dir(&self.layout.entity_dir(media_type, &folder));
                let key = match media_type {
                    MediaType::Series => SERIES_ROOT_KEY.to_string(),
                    MediaType::Movie => id.to_string(),
                };
                (dir, key)
            }
            Target::ListItem { list_dir } => (data_dir(list_dir), id.to_string()),
            Target::Episode { data_dir, label } => (data_dir.clone(), label.clone()),
        };
        fs::create_dir_all(&dir)?;
        Ok((dir, key))
    }

    fn report_missing(&self, field: &str, err: &ScrapeError) {
        if !self.config.warns_on(field, err) {
            debug!(field, error = %err, "missing element");
        } else if err.is_not_found() {
            warn!(field, error = %err, "missing element");
        } else {
            warn!(field, error = %err, "lookup failed");
        }
    }

    async fn core_text(&self, field: &str, replace: Option<(&str, &str)>) -> String {
        match self.fields.text(&self.nav, field).await {
            Ok(raw) => clean_text(&raw, replace),
            Err(err) => {
                self.report_missing(field, &err);
                SENTINEL.to_string()
            }
        }
    }

    async fn detect_media_type(&self) -> MediaType {
        let label = match self.fields.text(&self.nav, fields::TYPE).await {
            Ok(label) => label,
            Err(err) => {
                self.report_missing(fields::TYPE, &err);
                "Unknown".to_string()
            }
        };
        let media_type = MediaType::infer(&label);
        info!(?media_type, "auto-detected type");
        media_type
    }

    async fn elements_or_empty(&self, field: &str) -> Vec<N::Element> {
        match self.fields.many(&self.nav, field).await {
            Ok(elements) => elements,
            Err(err) => {
                self.report_missing(field, &err);
                Vec::new()
            }
        }
    }

    async fn text_of(&self, element: &N::Element) -> String {
        self.nav
            .text(element)
            .await
            .map(|text| text.trim().to_string())
            .unwrap_or_default()
    }

    async fn fetch_cast(&self) -> Vec<CastMember> {
        let names = self.elements_or_empty(fields::CAST_NAME).await;
        let roles = self.elements_or_empty(fields::CAST_ROLE).await;

        let mut cast = Vec::with_capacity(names.len().min(roles.len()));
        for (name, role) in names.iter().zip(roles.iter()) {
            let role = self.text_of(role).await;
            cast.push(CastMember {
                name: self.text_of(name).await,
                role: role.replace('\n', " "),
            });
        }
        cast
    }

    async fn fetch_runtime(&mut self) -> Option<String> {
        let delta = self.config.runtime_scroll_delta;
        self.scroll_quietly(delta).await;
        let runtime = self.fields.text(&self.nav, fields::RUNTIME).await;
        self.scroll_quietly(-delta).await;

        match runtime {
            Ok(runtime) => Some(runtime),
            Err(err) => {
                self.report_missing(fields::RUNTIME, &err);
                None
            }
        }
    }

    async fn fetch_directors(&self) -> Option<Vec<String>> {
        let elements = match self.fields.many(&self.nav, fields::DIRECTORS).await {
            Ok(elements) => elements,
            Err(err) => {
                self.report_missing(fields::DIRECTORS, &err);
                return None;
            }
        };

        let mut directors: Vec<String> = Vec::new();
        for element in &elements {
            let name = self.text_of(element).await;
            if !directors.contains(&name) {
                directors.push(name);
            }
        }
        Some(directors)
    }

    async fn scroll_quietly(&mut self, delta: i64) {
        if let Err(err) = self.nav.scroll(delta).await {
            debug!(delta, error = %err, "scroll failed");
        }
    }

    async fn restore(&mut self, origin: &str) {
        if let Err(err) = self.nav.navigate(origin).await {
            warn!(url = origin, error = %err, "could not return to origin page");
        }
    }

    async fn fetch_guide(&mut self) -> Option<Vec<GuideEntry>> {
        let origin = match self.nav.current_url().await {
            Ok(origin) => origin,
            Err(err) => {
                warn!(error = %err, "no origin page for parental guide");
                return None;
            }
        };
        let guide_url = format!("{}parentalguide/", base_url(&origin));

        let mut last_err = None;
        for attempt in 1..=MAX_SUB_RESOURCE_ATTEMPTS {
            let result = self.read_guide(&guide_url).await;
            self.restore(&origin).await;
            match result {
                Ok(entries) => return Some(entries),
                Err(err) => {
                    debug!(attempt, error = %err, "parental guide attempt failed");
                    last_err = Some(err);
                }
            }
        }

        if let Some(err) = last_err {
            self.report_missing(fields::GUIDE, &err);
        }
        None
    }

    async fn read_guide(&mut self, url: &str) -> Result<Vec<GuideEntry>> {
        self.nav.navigate(url).await?;
        let items = self.fields.many(&self.nav, fields::GUIDE).await?;

        let mut entries = Vec::with_capacity(items.len());
        for item in &items {
            let rating = self.fields.one_within(&self.nav, item, fields::GUIDE_RATING).await?;
            let kind = self.fields.one_within(&self.nav, item, fields::GUIDE_TYPE).await?;
            entries.push(GuideEntry {
                kind: self.text_of(&kind).await,
                rate: self.text_of(&rating).await,
            });
        }
        Ok(entries)
    }

    async fn fetch_reviews(&mut self, enhanced: bool) -> ReviewOutcome {
        let origin = match self.nav.current_url().await {
            Ok(origin) => origin,
            Err(err) => {
                warn!(error = %err, "no origin page for reviews");
                return ReviewOutcome::Unfound;
            }
        };
        let reviews_url = format!(
            "{}reviews/?ref_=tt_ururv_sm&spoilers=EXCLUDE",
            base_url(&origin)
        );

        let outcome = self.read_reviews(&reviews_url, enhanced).await;
        self.restore(&origin).await;
        outcome
    }

    async fn read_reviews(&mut self, url: &str, enhanced: bool) -> ReviewOutcome {
        if let Err(err) = self.nav.navigate(url).await {
            warn!(url, error = %err, "review page unavailable");
            return ReviewOutcome::Unfound;
        }

        if enhanced {
            if let Err(err) = self.load_all_reviews().await {
                self.scroll_quietly(-REVEAL_SCROLL_BACK).await;
                return ReviewOutcome::RevealFailed(err);
            }
        }

        let titles = match self.fields.many(&self.nav, fields::REVIEW_TITLE).await {
            Ok(titles) => titles,
            Err(err) => {
                self.report_missing(fields::REVIEW_TITLE, &err);
                return ReviewOutcome::Unfound;
            }
        };
        let contents = match self.fields.many(&self.nav, fields::REVIEW_CONTENT).await {
            Ok(contents) => contents,
            Err(err) => {
                self.report_missing(fields::REVIEW_CONTENT, &err);
                return ReviewOutcome::Unfound;
            }
        };

        let mut reviews = Vec::with_capacity(titles.len().min(contents.len()));
        for (title, content) in titles.iter().zip(contents.iter()) {
            reviews.push(Review {
                title: self.text_of(title).await,
                content: self.text_of(content).await,
            });
        }
        ReviewOutcome::Found(reviews)
    }

    /// Reveal every review, then scroll so the page lazy-loads them.
    async fn load_all_reviews(&mut self) -> Result<()> {
        if !self.reveal_all_reviews().await {
            return Ok(());
        }
        for _ in 0..self.config.review_scrolls {
            self.nav.scroll(self.config.review_scroll_delta).await?;
            tokio::time::sleep(self.config.review_settle_delay).await;
        }
        Ok(())
    }

    /// Best effort: a missing or unclickable button only means fewer reviews.
    async fn reveal_all_reviews(&mut self) -> bool {
        let button = match self.fields.one(&self.nav, fields::REVIEW_ALL_BUTTON).await {
            Ok(button) => button,
            Err(err) => {
                self.report_missing(fields::REVIEW_ALL_BUTTON, &err);
                return false;
            }
        };

        let args = [button];
        let clicked = match self.nav.run_script(SCROLL_INTO_VIEW, &args).await {
            Ok(_) => self.nav.run_script(CLICK, &args).await,
            Err(err) => Err(err),
        };
        match clicked {
            Ok(_) => true,
            Err(err) => {
                self.report_missing(fields::REVIEW_ALL_BUTTON, &err);
                false
            }
        }
    }

    async fn episode_count(&self) -> usize {
        match self.fields.texts(&self.nav, fields::EPISODE_COUNT).await {
            Ok(texts) => texts
                .first()
                .and_then(|text| text.trim().parse().ok())
                .unwrap_or(0),
            Err(err) => {
                self.report_missing(fields::EPISODE_COUNT, &err);
                0
            }
        }
    }
}
