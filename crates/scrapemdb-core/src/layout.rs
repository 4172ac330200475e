//! Output layout
//!
//! Entities are filed under a category root in a folder named
//! `<sanitized title> (<year>)`. Lists live under `Lists/<name>`. Every
//! folder holds its documents in a `data/` subfolder.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use chrono::Local;
use regex_lite::Regex;
use tracing::info;

use crate::error::{Result, ScrapeError};
use crate::store::{DocumentStore, MAIN_DOCUMENT, REVIEW_DOCUMENT};
use crate::types::{MediaType, SENTINEL};

/// Default output root
pub const DEFAULT_ROOT: &str = "Scraped";

/// Namespace of list metadata inside a list's primary document
pub const LIST_INFO_KEY: &str = "list_info";

fn unsafe_chars() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"[<>:"/\\|?*]"#).expect("static pattern"))
}

/// Replace filesystem-unsafe characters with ` -` and trim.
///
/// # Examples
/// ```
/// use scrapemdb_core::layout::sanitize_title;
///
/// assert_eq!(sanitize_title("Example: Movie"), "Example - Movie");
/// assert_eq!(sanitize_title("AC/DC"), "AC -DC");
/// ```
pub fn sanitize_title(title: &str) -> String {
    unsafe_chars().replace_all(title, " -").trim().to_string()
}

/// Year shown in a folder name: the first token of the date.
pub fn release_year(date: &str) -> &str {
    if date.is_empty() || date == SENTINEL {
        return "Unknown";
    }
    date.split(' ').next().unwrap_or("Unknown")
}

/// Folder name for an entity, e.g. `Heat (1995)`.
pub fn entity_folder_name(sanitized_title: &str, date: &str) -> String {
    format!("{} ({})", sanitized_title, release_year(date))
}

/// Sanitize a list name before using it as a folder.
pub fn list_folder_name(name: &str) -> String {
    sanitize_title(name)
}

/// Name of an automatically created batch list.
pub fn batch_list_name() -> String {
    format!("Batch_{}", Local::now().format("%Y%m%d_%H%M%S"))
}

/// Data folder of an entity, list or series
pub fn data_dir(folder: &Path) -> PathBuf {
    folder.join("data")
}

pub fn main_document(data_dir: &Path) -> PathBuf {
    data_dir.join(MAIN_DOCUMENT)
}

pub fn review_document(data_dir: &Path) -> PathBuf {
    data_dir.join(REVIEW_DOCUMENT)
}

/// Root folder under which all categories are created
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLayout {
    root: PathBuf,
}

impl Default for OutputLayout {
    fn default() -> Self {
        Self::new(DEFAULT_ROOT)
    }
}

impl OutputLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Folder of a top-level entity of the given type.
    pub fn entity_dir(&self, media_type: MediaType, folder_name: &str) -> PathBuf {
        let category = match media_type {
            MediaType::Movie => "Movies",
            MediaType::Series => "Series",
        };
        self.root.join(category).join(folder_name)
    }

    pub fn list_dir(&self, name: &str) -> PathBuf {
        self.root.join("Lists").join(list_folder_name(name))
    }

    /// Create a new list folder and record its name and creation time.
    ///
    /// Returns the list folder.
    pub fn create_list(&self, store: &DocumentStore, name: &str) -> Result<PathBuf> {
        let folder = self.list_dir(name);
        let document = main_document(&data_dir(&folder));
        info!(list = name, path = %folder.display(), "creating list");

        store.init(&document)?;
        store.write(&document, "ListName", name, Some(LIST_INFO_KEY))?;
        let created = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
        store.write(&document, "DateCreated", &created, Some(LIST_INFO_KEY))?;

        Ok(folder)
    }
}

/// Check that `path` is an existing list folder that can be appended to.
///
/// # Errors
/// `ScrapeError::InvalidListFolder` naming the problem when the folder belongs to a
/// single movie or series, or has no `data` subfolder.
pub fn validate_append_path(path: &Path) -> Result<PathBuf> {
    let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    let shown = absolute.to_string_lossy();
    if shown.contains("Series") || shown.contains("Movies") {
        return Err(ScrapeError::InvalidListFolder(format!(
            "cannot append to a single movie/series folder: {}",
            path.display()
        )));
    }
    if !data_dir(path).is_dir() {
        return Err(ScrapeError::InvalidListFolder(format!(
            "not a list folder (no data subfolder): {}",
            path.display()
        )));
    }
    Ok(path.to_path_buf())
}
