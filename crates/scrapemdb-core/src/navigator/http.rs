//! Static-HTML navigator
//!
//! Fetches pages with [`HttpClient`] and answers lookups from the fetched
//! source. There is no script engine: `run_script` is unsupported, `scroll`
//! only tracks an offset and `click` follows the element's `href`. Lookup
//! timeouts do not apply since the page never changes after it is fetched.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use super::html::{self, HtmlElement as Element};
use super::{normalize_url, resolve_url, Navigator};
use crate::client::{ClientConfig, HttpClient};
use crate::error::{Result, ScrapeError};
use crate::schema::Selector;

pub use super::html::HtmlElement;

struct Page {
    url: String,
    source: Arc<str>,
    scroll_y: i64,
}

/// Navigator over plain HTTP responses
pub struct HttpNavigator {
    client: HttpClient,
    page: Option<Page>,
}

impl HttpNavigator {
    /// Start a session with the given client configuration.
    ///
    /// # Errors
    /// `ScrapeError::SessionFailure` if the HTTP client cannot be built
    pub fn start(config: ClientConfig) -> Result<Self> {
        Ok(Self::with_client(HttpClient::with_config(config)?))
    }

    pub fn with_client(client: HttpClient) -> Self {
        Self { client, page: None }
    }

    /// Current vertical scroll offset.
    pub fn scroll_offset(&self) -> i64 {
        self.page.as_ref().map(|p| p.scroll_y).unwrap_or(0)
    }

    fn page(&self) -> Result<&Page> {
        self.page.as_ref().ok_or_else(|| ScrapeError::NavigationFailure {
            url: String::new(),
            reason: "no page loaded".to_string(),
        })
    }
}

#[async_trait]
impl Navigator for HttpNavigator {
    type Element = Element;

    async fn navigate(&mut self, url: &str) -> Result<()> {
        let url = normalize_url(url);
        let (final_url, body) =
            self.client
                .fetch(&url)
                .await
                .map_err(|e| ScrapeError::NavigationFailure {
                    url: url.clone(),
                    reason: e.to_string(),
                })?;
        debug!(url = %final_url, bytes = body.len(), "page loaded");
        self.page = Some(Page {
            url: final_url,
            source: Arc::from(body),
            scroll_y: 0,
        });
        Ok(())
    }

    async fn locate_one(
        &self,
        scope: Option<&Element>,
        selector: &Selector,
        timeout: Duration,
    ) -> Result<Element> {
        self.locate_many(scope, selector, timeout)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| ScrapeError::ElementNotFound(selector.to_string()))
    }

    async fn locate_many(
        &self,
        scope: Option<&Element>,
        selector: &Selector,
        _timeout: Duration,
    ) -> Result<Vec<Element>> {
        let page = self.page()?;
        let found = html::select(&page.source, scope, selector)?;
        if found.is_empty() {
            return Err(ScrapeError::ElementNotFound(selector.to_string()));
        }
        Ok(found)
    }

    async fn text(&self, element: &Element) -> Result<String> {
        Ok(element.text().to_string())
    }

    async fn attribute(&self, element: &Element, name: &str) -> Result<Option<String>> {
        Ok(element.attr(name).map(String::from))
    }

    async fn click(&mut self, element: &Element) -> Result<()> {
        let href = element
            .attr("href")
            .ok_or_else(|| ScrapeError::Unsupported("click on element without href".to_string()))?
            .to_string();
        let target = resolve_url(&self.page()?.url, &href)?;
        self.navigate(&target).await
    }

    async fn scroll(&mut self, delta: i64) -> Result<()> {
        if let Some(page) = self.page.as_mut() {
            page.scroll_y = (page.scroll_y + delta).max(0);
        }
        Ok(())
    }

    async fn run_script(&mut self, script: &str, _args: &[Element]) -> Result<serde_json::Value> {
        Err(ScrapeError::Unsupported(format!("script execution: {script}")))
    }

    async fn current_url(&self) -> Result<String> {
        Ok(self.page()?.url.clone())
    }
}
