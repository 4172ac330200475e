//! Scripted in-memory navigator for harvester and traversal tests.
//!
//! A page is a list of nodes; a node matches a selector when its key equals
//! the selector's value. Each URL holds one or more page versions, served
//! in visit order (the last version repeats).

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use scrapemdb_core::error::{Result, ScrapeError};
use scrapemdb_core::schema::fields;
use scrapemdb_core::{HarvestConfig, Navigator, Schema, Selector};

#[derive(Debug, Clone, Default)]
pub struct Node {
    pub key: String,
    pub text: String,
    pub attrs: HashMap<String, String>,
    pub children: Vec<Node>,
}

impl Node {
    pub fn new(key: &str, text: &str) -> Self {
        Self {
            key: key.to_string(),
            text: text.to_string(),
            ..Self::default()
        }
    }

    pub fn attr(mut self, name: &str, value: &str) -> Self {
        self.attrs.insert(name.to_string(), value.to_string());
        self
    }

    pub fn child(mut self, node: Node) -> Self {
        self.children.push(node);
        self
    }
}

#[derive(Default)]
pub struct FakeNavigator {
    pages: HashMap<String, Vec<Vec<Node>>>,
    visits: HashMap<String, usize>,
    current: Option<(String, Vec<Node>)>,
    /// Every URL navigated to, in order
    pub history: Vec<String>,
    /// Sum of all scroll deltas
    pub scroll_total: i64,
    pub scroll_calls: usize,
    pub scripts: Vec<String>,
    pub fail_scroll: bool,
    pub fail_scripts: bool,
    /// Time each click takes to land on the next page
    pub click_delay: Duration,
}

impl FakeNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `nodes` on every visit to `url`.
    pub fn page(mut self, url: &str, nodes: Vec<Node>) -> Self {
        self.pages.insert(url.to_string(), vec![nodes]);
        self
    }

    /// Serve each version in turn on successive visits to `url`.
    pub fn page_versions(mut self, url: &str, versions: Vec<Vec<Node>>) -> Self {
        self.pages.insert(url.to_string(), versions);
        self
    }

    pub fn visits(&self, url: &str) -> usize {
        self.visits.get(url).copied().unwrap_or(0)
    }

    fn candidates<'a>(&'a self, scope: Option<&'a Node>) -> Result<&'a [Node]> {
        match scope {
            Some(node) => Ok(&node.children),
            None => self
                .current
                .as_ref()
                .map(|(_, nodes)| nodes.as_slice())
                .ok_or_else(|| ScrapeError::NavigationFailure {
                    url: String::new(),
                    reason: "no page loaded".to_string(),
                }),
        }
    }
}

#[async_trait]
impl Navigator for FakeNavigator {
    type Element = Node;

    async fn navigate(&mut self, url: &str) -> Result<()> {
        self.history.push(url.to_string());
        let Some(versions) = self.pages.get(url) else {
            return Err(ScrapeError::NavigationFailure {
                url: url.to_string(),
                reason: "no such page".to_string(),
            });
        };
        let visit = self.visits.entry(url.to_string()).or_insert(0);
        let nodes = versions[(*visit).min(versions.len() - 1)].clone();
        *visit += 1;
        self.current = Some((url.to_string(), nodes));
        Ok(())
    }

    async fn locate_one(
        &self,
        scope: Option<&Node>,
        selector: &Selector,
        timeout: Duration,
    ) -> Result<Node> {
        let mut found = self.locate_many(scope, selector, timeout).await?;
        Ok(found.remove(0))
    }

    async fn locate_many(
        &self,
        scope: Option<&Node>,
        selector: &Selector,
        _timeout: Duration,
    ) -> Result<Vec<Node>> {
        let found: Vec<Node> = self
            .candidates(scope)?
            .iter()
            .filter(|node| node.key == selector.value)
            .cloned()
            .collect();
        if found.is_empty() {
            return Err(ScrapeError::ElementNotFound(selector.to_string()));
        }
        Ok(found)
    }

    async fn text(&self, element: &Node) -> Result<String> {
        Ok(element.text.clone())
    }

    async fn attribute(&self, element: &Node, name: &str) -> Result<Option<String>> {
        Ok(element.attrs.get(name).cloned())
    }

    async fn click(&mut self, element: &Node) -> Result<()> {
        tokio::time::sleep(self.click_delay).await;
        match element.attrs.get("href").cloned() {
            Some(href) => self.navigate(&href).await,
            None => Err(ScrapeError::ScriptError("element is not clickable".to_string())),
        }
    }

    async fn scroll(&mut self, delta: i64) -> Result<()> {
        self.scroll_calls += 1;
        if self.fail_scroll && delta > 0 {
            return Err(ScrapeError::ScriptError("scroll interrupted".to_string()));
        }
        self.scroll_total += delta;
        Ok(())
    }

    async fn run_script(&mut self, script: &str, _args: &[Node]) -> Result<serde_json::Value> {
        self.scripts.push(script.to_string());
        if self.fail_scripts {
            return Err(ScrapeError::ScriptError("script blocked".to_string()));
        }
        Ok(serde_json::Value::Null)
    }

    async fn current_url(&self) -> Result<String> {
        self.current
            .as_ref()
            .map(|(url, _)| url.clone())
            .ok_or_else(|| ScrapeError::NavigationFailure {
                url: String::new(),
                reason: "no page loaded".to_string(),
            })
    }
}

/// Schema whose selector for every field is the field name itself.
pub fn schema() -> Arc<Schema> {
    let names = [
        fields::TITLE,
        fields::DATE,
        fields::RATE,
        fields::DESCRIPTION,
        fields::TYPE,
        fields::CAST_NAME,
        fields::CAST_ROLE,
        fields::RUNTIME,
        fields::DIRECTORS,
        fields::GUIDE,
        fields::GUIDE_RATING,
        fields::GUIDE_TYPE,
        fields::REVIEW_TITLE,
        fields::REVIEW_CONTENT,
        fields::REVIEW_ALL_BUTTON,
        fields::EPISODE_COUNT,
        fields::EPISODE_ADDRESS,
        fields::FIRST_EPISODE,
        fields::NEXT_EPISODE,
    ];
    Arc::new(Schema::from_entries(
        names.into_iter().map(|name| (name, Selector::css(name))),
    ))
}

/// Harvest config without settle delays.
pub fn config() -> HarvestConfig {
    HarvestConfig {
        review_settle_delay: Duration::ZERO,
        ..HarvestConfig::default()
    }
}

pub fn core_page(title: &str, date: &str, kind: &str) -> Vec<Node> {
    vec![
        Node::new(fields::TITLE, title),
        Node::new(fields::DATE, date),
        Node::new(fields::RATE, "7.5"),
        Node::new(fields::DESCRIPTION, "A story."),
        Node::new(fields::TYPE, kind),
    ]
}
