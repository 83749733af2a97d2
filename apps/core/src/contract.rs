use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::model::{Asset, DisplayIcon, Match};
use crate::overlay_state::OverlayState;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QueryRequest {
    pub query: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct KeyRequest {
    pub code: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HideRequest {
    #[serde(default = "default_restore")]
    pub restore: bool,
}

fn default_restore() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CatalogPush {
    /// Entry list, or a JSON5 string holding one.
    pub entries: Value,
    #[serde(default)]
    pub links: Vec<Value>,
    #[serde(default)]
    pub assets: Vec<Asset>,
}

/// Host → controller messages.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", content = "payload", rename_all = "snake_case")]
pub enum HostMessage {
    Hook,
    Query(QueryRequest),
    Key(KeyRequest),
    Blur,
    Focus,
    Catalog(CatalogPush),
    Hide(HideRequest),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MatchDto {
    pub display: String,
    pub names: Vec<String>,
    /// Name that `start` and `len` index into.
    pub matched_name: String,
    pub start: usize,
    pub len: usize,
    pub icon: Option<String>,
    pub placeholder_icon: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StateSnapshot {
    pub query: String,
    pub visible: bool,
    pub matches: Vec<MatchDto>,
}

/// Controller → host/view messages.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", content = "payload", rename_all = "snake_case")]
pub enum OutboundMessage {
    Toggle { code: u8 },
    Focus { field: String },
    Select { direction: i32 },
    Reset,
    State(StateSnapshot),
    Error { code: String, message: String },
}

impl From<&Match> for MatchDto {
    fn from(value: &Match) -> Self {
        Self {
            display: value.display().to_string(),
            names: value.target.names().to_vec(),
            matched_name: value.matched_name().to_string(),
            start: value.span.start,
            len: value.span.len,
            icon: value.display_icon.handle().map(|handle| handle.url().to_string()),
            placeholder_icon: value.display_icon == DisplayIcon::Placeholder,
        }
    }
}

impl From<&OverlayState> for StateSnapshot {
    fn from(value: &OverlayState) -> Self {
        Self {
            query: value.query().to_string(),
            visible: value.is_visible(),
            matches: value.matches().iter().map(MatchDto::from).collect(),
        }
    }
}
