//! Element lookup in fetched HTML.
//!
//! Every lookup re-parses the page the scope belongs to. An element is
//! addressed by its ordinal in document order, which is stable across
//! parses of the same source.

use std::collections::HashMap;
use std::sync::Arc;

use scraper::{ElementRef, Html, Selector as CssSelector};

use crate::error::{Result, ScrapeError};
use crate::schema::{Selector, SelectorKind};

/// Snapshot of an element on a fetched page
#[derive(Debug, Clone)]
pub struct HtmlElement {
    page: Arc<str>,
    ordinal: usize,
    text: String,
    attributes: Vec<(String, String)>,
}

impl HtmlElement {
    /// Text content, untrimmed.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

enum LinkMatch {
    Exact,
    Partial,
}

struct Rule {
    css: String,
    link: Option<LinkMatch>,
}

fn quoted(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

fn rule_for(selector: &Selector) -> Result<Rule> {
    let value = &selector.value;
    let (css, link) = match selector.kind {
        SelectorKind::Class => (format!("[class~=\"{}\"]", quoted(value)), None),
        SelectorKind::Id => (format!("[id=\"{}\"]", quoted(value)), None),
        SelectorKind::Name => (format!("[name=\"{}\"]", quoted(value)), None),
        SelectorKind::Css | SelectorKind::Tag => (value.clone(), None),
        SelectorKind::LinkText => ("a".to_string(), Some(LinkMatch::Exact)),
        SelectorKind::PartialLinkText => ("a".to_string(), Some(LinkMatch::Partial)),
        SelectorKind::XPath => {
            return Err(ScrapeError::Unsupported(format!(
                "xpath selector {value} needs a scripting backend"
            )))
        }
    };
    Ok(Rule { css, link })
}

/// Select elements on `page`, or inside `scope` when given.
///
/// Returns every match in document order; an empty result is not an error
/// here, callers decide.
pub(crate) fn select(
    page: &Arc<str>,
    scope: Option<&HtmlElement>,
    selector: &Selector,
) -> Result<Vec<HtmlElement>> {
    let rule = rule_for(selector)?;
    let css = CssSelector::parse(&rule.css)
        .map_err(|e| ScrapeError::InvalidSelector(format!("{}: {:?}", rule.css, e)))?;

    let source = scope.map(|el| &el.page).unwrap_or(page);
    let document = Html::parse_document(source);

    let all: Vec<ElementRef> = document
        .root_element()
        .descendants()
        .filter_map(ElementRef::wrap)
        .collect();
    let ordinals: HashMap<_, usize> = all
        .iter()
        .enumerate()
        .map(|(idx, el)| (el.id(), idx))
        .collect();

    let matches: Vec<ElementRef> = match scope {
        Some(el) => {
            let root = all.get(el.ordinal).ok_or_else(|| {
                ScrapeError::ElementNotFound(format!("stale scope for {selector}"))
            })?;
            root.select(&css).collect()
        }
        None => document.select(&css).collect(),
    };

    let found = matches
        .into_iter()
        .filter(|el| {
            let text = el.text().collect::<String>();
            match rule.link {
                None => true,
                Some(LinkMatch::Exact) => text.trim() == selector.value,
                Some(LinkMatch::Partial) => text.contains(selector.value.as_str()),
            }
        })
        .filter_map(|el| {
            let ordinal = *ordinals.get(&el.id())?;
            Some(HtmlElement {
                page: Arc::clone(source),
                ordinal,
                text: el.text().collect(),
                attributes: el
                    .value()
                    .attrs()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
            })
        })
        .collect();

    Ok(found)
}
