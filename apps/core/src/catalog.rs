use std::path::{Path, PathBuf};
use std::rc::Rc;

use log::{info, warn};
use serde::Deserialize;
use serde_json::{Map, Value};
use walkdir::WalkDir;

use crate::model::{Asset, Catalog, Entry, IconRef, ImageHandle};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    MalformedEntry(String),
    MalformedPayload(String),
}

impl std::fmt::Display for CatalogError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MalformedEntry(error) => write!(f, "malformed entry: {error}"),
            Self::MalformedPayload(error) => write!(f, "malformed catalog payload: {error}"),
        }
    }
}

impl std::error::Error for CatalogError {}

/// Raw entry list as pushed by the host: either a structured value or serialized text.
#[derive(Debug, Clone, PartialEq)]
pub enum RawCatalog {
    Structured(Value),
    Text(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct CatalogPayload {
    pub raw: RawCatalog,
    pub links: Vec<Value>,
    pub assets: Vec<Asset>,
}

impl CatalogPayload {
    pub fn new(raw: RawCatalog, links: Vec<Value>) -> Self {
        Self {
            raw,
            links,
            assets: Vec::new(),
        }
    }

    pub fn with_assets(mut self, assets: Vec<Asset>) -> Self {
        self.assets = assets;
        self
    }
}

/// The two entry shapes hosts send; both normalize to `Entry::names`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawEntry {
    NamedList {
        names: Vec<String>,
        #[serde(default)]
        icon: Option<Value>,
        #[serde(flatten)]
        payload: Map<String, Value>,
    },
    SingleName {
        name: String,
        #[serde(default)]
        icon: Option<Value>,
        #[serde(flatten)]
        payload: Map<String, Value>,
    },
}

pub fn parse_entry(value: &Value) -> Result<Entry, CatalogError> {
    let raw = RawEntry::deserialize(value).map_err(|_| {
        CatalogError::MalformedEntry(format!("missing 'names' or 'name' in {value}"))
    })?;

    let (names, icon, payload) = match raw {
        RawEntry::NamedList {
            names,
            icon,
            payload,
        } => (names, icon, payload),
        RawEntry::SingleName {
            name,
            icon,
            payload,
        } => (vec![name], icon, payload),
    };

    let mut entry = Entry::new(names)
        .ok_or_else(|| CatalogError::MalformedEntry("entry has an empty 'names' list".to_string()))?
        .with_payload(payload);
    if let Some(icon) = icon.as_ref().and_then(parse_icon) {
        entry = entry.with_icon(icon);
    }
    Ok(entry)
}

fn parse_icon(value: &Value) -> Option<IconRef> {
    match value {
        // JSON5 text may hand integers over as floats.
        Value::Number(number) => number
            .as_u64()
            .or_else(|| {
                number
                    .as_f64()
                    .filter(|f| *f >= 0.0 && f.fract() == 0.0)
                    .map(|f| f as u64)
            })
            .and_then(|index| usize::try_from(index).ok())
            .map(IconRef::Asset),
        Value::String(url) if !url.trim().is_empty() => {
            Some(IconRef::Resolved(Rc::new(ImageHandle::external(url.trim()))))
        }
        _ => None,
    }
}

/// Strict parse of the raw entry list. Rows that fail to parse are dropped and reported
/// in the returned warnings.
pub fn parse_entries(raw: &RawCatalog) -> Result<(Vec<Entry>, Vec<String>), CatalogError> {
    let value = match raw {
        RawCatalog::Structured(value) => value.clone(),
        RawCatalog::Text(text) => json5::from_str::<Value>(text)
            .map_err(|e| CatalogError::MalformedPayload(e.to_string()))?,
    };

    let Value::Array(rows) = value else {
        return Err(CatalogError::MalformedPayload(
            "entries payload is not a list".to_string(),
        ));
    };

    Ok(parse_rows(&rows))
}

fn parse_rows(rows: &[Value]) -> (Vec<Entry>, Vec<String>) {
    let mut entries = Vec::with_capacity(rows.len());
    let mut warnings = Vec::new();
    for (position, row) in rows.iter().enumerate() {
        match parse_entry(row) {
            Ok(entry) => entries.push(entry),
            Err(error) => warnings.push(format!("row {position}: {error}")),
        }
    }
    (entries, warnings)
}

/// Builds the catalog for a host push. Never fails: a malformed payload becomes an empty
/// entry list and malformed rows are skipped, all with a logged diagnostic. Links are
/// appended after the entries.
pub fn ingest(payload: &CatalogPayload) -> Catalog {
    let (mut entries, mut warnings) = match parse_entries(&payload.raw) {
        Ok(parsed) => parsed,
        Err(error) => {
            warn!("catalog push ignored: {error}");
            (Vec::new(), Vec::new())
        }
    };

    let (links, link_warnings) = parse_rows(&payload.links);
    entries.extend(links);
    warnings.extend(link_warnings.into_iter().map(|w| format!("link {w}")));

    for warning in &warnings {
        warn!("catalog entry skipped: {warning}");
    }

    Catalog::new(entries, payload.assets.clone())
}

#[derive(Debug, Default)]
pub struct CatalogFiles {
    pub rows: Vec<Value>,
    pub load_warnings: Vec<String>,
}

impl CatalogFiles {
    pub fn into_payload(self) -> CatalogPayload {
        CatalogPayload::new(RawCatalog::Structured(Value::Array(self.rows)), Vec::new())
    }
}

/// Reads entry lists from `.json`/`.json5` files. Directories are walked recursively.
pub fn load_catalog_files(paths: &[PathBuf]) -> CatalogFiles {
    let mut files = CatalogFiles::default();
    for path in paths {
        for file in discover_catalog_files(path) {
            match load_catalog_file(&file) {
                Ok(rows) => {
                    info!("catalog file '{}' loaded rows={}", file.display(), rows.len());
                    files.rows.extend(rows);
                }
                Err(error) => files
                    .load_warnings
                    .push(format!("catalog file '{}' failed: {error}", file.display())),
            }
        }
    }
    files
}

fn discover_catalog_files(path: &Path) -> Vec<PathBuf> {
    if path.is_file() {
        return vec![path.to_path_buf()];
    }
    if !path.is_dir() {
        return Vec::new();
    }

    let mut out: Vec<PathBuf> = WalkDir::new(path)
        .follow_links(true)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|candidate| {
            candidate
                .extension()
                .and_then(|v| v.to_str())
                .is_some_and(|v| v.eq_ignore_ascii_case("json") || v.eq_ignore_ascii_case("json5"))
        })
        .collect();
    out.sort();
    out
}

fn load_catalog_file(path: &Path) -> Result<Vec<Value>, String> {
    let raw = std::fs::read_to_string(path).map_err(|e| format!("read failed: {e}"))?;
    match json5::from_str::<Value>(&raw).map_err(|e| format!("invalid json5: {e}"))? {
        Value::Array(rows) => Ok(rows),
        _ => Err("catalog file must contain a list of entries".to_string()),
    }
}
