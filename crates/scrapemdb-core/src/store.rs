//! Merge-write document store
//!
//! A document is a text file `const NAME_DATA = {json}` that a static page
//! can load with a `<script>` tag. Every write reads the whole document,
//! merges one field and rewrites the file. There is no locking: callers
//! serialize writes to a given path.

use std::fs;
use std::path::Path;

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::warn;

use crate::error::{Result, ScrapeError};

/// File name of the primary document inside a data folder
pub const MAIN_DOCUMENT: &str = "main.js";

/// File name of the review document inside a data folder
pub const REVIEW_DOCUMENT: &str = "review.js";

/// Reads and merge-writes documents
#[derive(Debug, Clone, Copy, Default)]
pub struct DocumentStore;

impl DocumentStore {
    pub fn new() -> Self {
        Self
    }

    /// Create an empty document unless one already exists at `path`.
    pub fn init(&self, path: &Path) -> Result<()> {
        if path.exists() {
            return Ok(());
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, format!("const {} = {{}}", dataset_name(path)))?;
        Ok(())
    }

    /// Load the document at `path`.
    ///
    /// An absent file reads as empty. A corrupted payload is logged and
    /// reads as empty, so the next write replaces it.
    pub fn read(&self, path: &Path) -> Result<Map<String, Value>> {
        if !path.exists() {
            return Ok(Map::new());
        }
        let content = fs::read(path)?;
        match parse_document(path, &content) {
            Ok(map) => Ok(map),
            Err(err) => {
                warn!(path = %path.display(), error = %err, "resetting corrupted document");
                Ok(Map::new())
            }
        }
    }

    /// Set `field` to `value`, inside the `namespace` mapping when given.
    ///
    /// Unrelated keys at both levels are preserved. A namespace key that
    /// holds something other than a mapping is replaced by one.
    pub fn write<T: Serialize + ?Sized>(
        &self,
        path: &Path,
        field: &str,
        value: &T,
        namespace: Option<&str>,
    ) -> Result<()> {
        let value = serde_json::to_value(value)?;
        let mut document = self.read(path)?;

        match namespace {
            Some(key) => {
                let entry = document
                    .entry(key.to_string())
                    .or_insert_with(|| Value::Object(Map::new()));
                if !entry.is_object() {
                    *entry = Value::Object(Map::new());
                }
                if let Value::Object(inner) = entry {
                    inner.insert(field.to_string(), value);
                }
            }
            None => {
                document.insert(field.to_string(), value);
            }
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, render(path, &document)?)?;
        Ok(())
    }
}

/// Variable name declared by the document at `path`.
///
/// # Examples
/// ```
/// use std::path::Path;
/// use scrapemdb_core::store::dataset_name;
///
/// assert_eq!(dataset_name(Path::new("data/review.js")), "REVIEW_DATA");
/// assert_eq!(dataset_name(Path::new("data/main.js")), "MAIN_DATA");
/// assert_eq!(dataset_name(Path::new("data/cast list.js")), "CAST_LIST_DATA");
/// ```
pub fn dataset_name(path: &Path) -> String {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    if file_name.contains("review") {
        return "REVIEW_DATA".to_string();
    }
    if file_name.contains("main") {
        return "MAIN_DATA".to_string();
    }

    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    format!("{}_DATA", stem.replace(' ', "_").to_uppercase())
}

fn parse_document(path: &Path, content: &[u8]) -> Result<Map<String, Value>> {
    let Some(start) = content.iter().position(|&b| b == b'{') else {
        return Ok(Map::new());
    };
    let corrupted = |reason: String| ScrapeError::DocumentCorruption {
        path: path.to_path_buf(),
        reason,
    };
    match serde_json::from_slice::<Value>(&content[start..]) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(corrupted("payload is not a mapping".to_string())),
        Err(e) => Err(corrupted(e.to_string())),
    }
}

fn render(path: &Path, document: &Map<String, Value>) -> Result<String> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    document.serialize(&mut serializer)?;
    let payload = String::from_utf8(buf).map_err(|e| ScrapeError::DocumentCorruption {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    Ok(format!("const {} = {}", dataset_name(path), payload))
}
