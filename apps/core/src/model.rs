use std::rc::Rc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Raw binary resource exchanged alongside catalogs and engine results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    pub data: Vec<u8>,
    #[serde(rename = "type", default)]
    pub mime: String,
}

impl Asset {
    pub fn new(data: Vec<u8>, mime: &str) -> Self {
        Self {
            data,
            mime: mime.to_string(),
        }
    }
}

/// Display-ready image reference handed to the view.
#[derive(Debug, PartialEq, Eq)]
pub struct ImageHandle {
    url: String,
    mime: String,
    byte_len: usize,
}

impl ImageHandle {
    pub fn new(url: String, mime: String, byte_len: usize) -> Self {
        Self {
            url,
            mime,
            byte_len,
        }
    }

    /// Handle for an icon that is already renderable as-is (for example a path or URL).
    pub fn external(url: &str) -> Self {
        Self::new(url.to_string(), String::new(), 0)
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn mime(&self) -> &str {
        &self.mime
    }

    pub fn byte_len(&self) -> usize {
        self.byte_len
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IconRef {
    Resolved(Rc<ImageHandle>),
    Asset(usize),
}

/// A catalog item. `names` is never empty; the first name is the display name.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    names: Vec<String>,
    icon: Option<IconRef>,
    payload: Map<String, Value>,
}

impl Entry {
    pub fn new<S: Into<String>>(names: Vec<S>) -> Option<Self> {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        if names.is_empty() {
            return None;
        }

        Some(Self {
            names,
            icon: None,
            payload: Map::new(),
        })
    }

    pub fn with_icon(mut self, icon: IconRef) -> Self {
        self.icon = Some(icon);
        self
    }

    pub fn with_payload(mut self, payload: Map<String, Value>) -> Self {
        self.payload = payload;
        self
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn primary_name(&self) -> &str {
        &self.names[0]
    }

    pub fn icon(&self) -> Option<&IconRef> {
        self.icon.as_ref()
    }

    pub fn payload(&self) -> &Map<String, Value> {
        &self.payload
    }
}

/// Highlighted region of a matched name, counted in characters. `name` indexes the
/// entry's names; the region applies to that name, not necessarily the primary one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    #[serde(default)]
    pub name: usize,
    pub start: usize,
    pub len: usize,
}

impl Span {
    pub fn new(start: usize, len: usize) -> Self {
        Self::on_name(0, start, len)
    }

    pub fn on_name(name: usize, start: usize, len: usize) -> Self {
        Self { name, start, len }
    }
}

/// Match as produced by a matcher or engine, before icon resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct RawMatch {
    pub target: Rc<Entry>,
    pub span: Span,
    pub display_icon: Option<IconRef>,
}

impl RawMatch {
    pub fn new(target: Rc<Entry>, span: Span) -> Self {
        let display_icon = target.icon().cloned();
        Self {
            target,
            span,
            display_icon,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayIcon {
    None,
    Image(Rc<ImageHandle>),
    Placeholder,
}

impl DisplayIcon {
    pub fn handle(&self) -> Option<&Rc<ImageHandle>> {
        match self {
            Self::Image(handle) => Some(handle),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Match {
    pub target: Rc<Entry>,
    pub span: Span,
    pub display_icon: DisplayIcon,
}

impl Match {
    pub fn display(&self) -> &str {
        self.target.primary_name()
    }

    /// Name the span highlights. Engines reporting an unknown name index fall back to the
    /// primary name.
    pub fn matched_name(&self) -> &str {
        self.target
            .names()
            .get(self.span.name)
            .map(String::as_str)
            .unwrap_or_else(|| self.target.primary_name())
    }
}

/// Entry snapshot used for local matching, together with the asset table its icons index.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    pub entries: Vec<Rc<Entry>>,
    pub assets: Vec<Asset>,
}

impl Catalog {
    pub fn new(entries: Vec<Entry>, assets: Vec<Asset>) -> Self {
        Self {
            entries: entries.into_iter().map(Rc::new).collect(),
            assets,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

pub fn normalize_for_match(input: &str) -> String {
    input.to_lowercase()
}
