//! Schema-driven field lookups
//!
//! The extractor is strict: a field that does not materialize within the
//! lookup timeout is an error. Substituting sentinels is the caller's job.

use std::sync::Arc;
use std::time::Duration;

use crate::error::Result;
use crate::navigator::Navigator;
use crate::schema::Schema;

/// Resolves field names to elements through a [`Navigator`]
#[derive(Debug, Clone)]
pub struct FieldExtractor {
    schema: Arc<Schema>,
    timeout: Duration,
}

impl FieldExtractor {
    pub fn new(schema: Arc<Schema>, timeout: Duration) -> Self {
        Self { schema, timeout }
    }

    /// First element matching `field` on the current page.
    pub async fn one<N: Navigator>(&self, nav: &N, field: &str) -> Result<N::Element> {
        let selector = self.schema.get(field)?;
        nav.locate_one(None, selector, self.timeout).await
    }

    /// First element matching `field` inside `scope`.
    pub async fn one_within<N: Navigator>(
        &self,
        nav: &N,
        scope: &N::Element,
        field: &str,
    ) -> Result<N::Element> {
        let selector = self.schema.get(field)?;
        nav.locate_one(Some(scope), selector, self.timeout).await
    }

    /// All elements matching `field`; at least one.
    pub async fn many<N: Navigator>(&self, nav: &N, field: &str) -> Result<Vec<N::Element>> {
        let selector = self.schema.get(field)?;
        nav.locate_many(None, selector, self.timeout).await
    }

    /// Trimmed text of the first element matching `field`.
    pub async fn text<N: Navigator>(&self, nav: &N, field: &str) -> Result<String> {
        let element = self.one(nav, field).await?;
        Ok(nav.text(&element).await?.trim().to_string())
    }

    /// Trimmed texts of all elements matching `field`.
    pub async fn texts<N: Navigator>(&self, nav: &N, field: &str) -> Result<Vec<String>> {
        let mut texts = Vec::new();
        for element in self.many(nav, field).await? {
            texts.push(nav.text(&element).await?.trim().to_string());
        }
        Ok(texts)
    }
}

/// Trim `raw` and optionally replace every `from` with `to`.
///
/// # Examples
/// ```
/// use scrapemdb_core::extractor::clean_text;
///
/// assert_eq!(clean_text(" 1999–12–31 ", Some(("–", " - "))), "1999 - 12 - 31");
/// assert_eq!(clean_text("  plain ", None), "plain");
/// ```
pub fn clean_text(raw: &str, replace: Option<(&str, &str)>) -> String {
    let trimmed = raw.trim();
    match replace {
        Some((from, to)) => trimmed.replace(from, to),
        None => trimmed.to_string(),
    }
}
