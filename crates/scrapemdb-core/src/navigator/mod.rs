//! Navigator boundary
//!
//! The harvester drives pages only through [`Navigator`]. Session start-up,
//! headless flags and resource blocking belong to whoever builds the
//! implementation. [`HttpNavigator`] is the static-HTML implementation
//! shipped with the crate.

mod html;
pub mod http;

use std::time::Duration;

use async_trait::async_trait;

use crate::error::{Result, ScrapeError};
use crate::schema::Selector;

pub use http::{HtmlElement, HttpNavigator};

/// Capability surface the harvester needs from a page session.
///
/// All lookups are bounded by `timeout`; a lookup that finds nothing fails
/// with `ScrapeError::ElementNotFound`. `locate_many` treats an empty match
/// as not found. When `scope` is given, the lookup runs inside that element.
#[async_trait]
pub trait Navigator: Send + Sync {
    /// Handle to an element on the current page
    type Element: Clone + Send + Sync;

    async fn navigate(&mut self, url: &str) -> Result<()>;

    async fn locate_one(
        &self,
        scope: Option<&Self::Element>,
        selector: &Selector,
        timeout: Duration,
    ) -> Result<Self::Element>;

    async fn locate_many(
        &self,
        scope: Option<&Self::Element>,
        selector: &Selector,
        timeout: Duration,
    ) -> Result<Vec<Self::Element>>;

    /// Untrimmed text content of the element.
    async fn text(&self, element: &Self::Element) -> Result<String>;

    async fn attribute(&self, element: &Self::Element, name: &str) -> Result<Option<String>>;

    async fn click(&mut self, element: &Self::Element) -> Result<()>;

    /// Scroll the page vertically; negative deltas scroll up.
    async fn scroll(&mut self, delta: i64) -> Result<()>;

    async fn run_script(
        &mut self,
        script: &str,
        args: &[Self::Element],
    ) -> Result<serde_json::Value>;

    async fn current_url(&self) -> Result<String>;
}

/// Trim the input and add `https://` when no scheme is present.
///
/// # Examples
/// ```
/// use scrapemdb_core::navigator::normalize_url;
///
/// assert_eq!(normalize_url(" www.imdb.com/title/tt0133093/ "), "https://www.imdb.com/title/tt0133093/");
/// assert_eq!(normalize_url("http://localhost/x"), "http://localhost/x");
/// ```
pub fn normalize_url(url: &str) -> String {
    let url = url.trim();
    if url.to_ascii_lowercase().starts_with("http") {
        url.to_string()
    } else {
        format!("https://{url}")
    }
}

/// The URL up to and including its last `/`.
///
/// Sub-resources (`parentalguide/`, `reviews/`, `episodes/`) hang off this base.
///
/// # Examples
/// ```
/// use scrapemdb_core::navigator::base_url;
///
/// assert_eq!(base_url("https://www.imdb.com/title/tt1/?ref_=x"), "https://www.imdb.com/title/tt1/");
/// assert_eq!(base_url("https://www.imdb.com/title/tt1/"), "https://www.imdb.com/title/tt1/");
/// ```
pub fn base_url(url: &str) -> &str {
    match url.rfind('/') {
        Some(idx) => &url[..=idx],
        None => url,
    }
}

/// Resolve a possibly relative `href` against the page it was found on.
pub fn resolve_url(page_url: &str, href: &str) -> Result<String> {
    let base = reqwest::Url::parse(page_url)
        .map_err(|e| ScrapeError::InvalidUrl(format!("{page_url}: {e}")))?;
    base.join(href.trim())
        .map(String::from)
        .map_err(|e| ScrapeError::InvalidUrl(format!("{href}: {e}")))
}
