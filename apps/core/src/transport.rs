use std::cell::RefCell;
use std::io::Write;
use std::rc::Rc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::assets::AssetFactory;
use crate::catalog::{CatalogPayload, RawCatalog};
use crate::contract::{CatalogPush, HostMessage, OutboundMessage, StateSnapshot};
use crate::controller::{Disposition, Key, OverlayController, OverlayEvent};
use crate::host::{HookRegistration, HostBridge, HostError, ToggleCode};
use crate::view::{SelectDirection, View};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    InvalidJson,
    InvalidRequest,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorResponse {
    pub code: ErrorCode,
    pub message: String,
}

impl ErrorResponse {
    pub fn to_message(&self) -> OutboundMessage {
        let code = match self.code {
            ErrorCode::InvalidJson => "invalid_json",
            ErrorCode::InvalidRequest => "invalid_request",
        };
        OutboundMessage::Error {
            code: code.to_string(),
            message: self.message.clone(),
        }
    }
}

impl From<CatalogPush> for CatalogPayload {
    fn from(value: CatalogPush) -> Self {
        let raw = match value.entries {
            Value::String(text) => RawCatalog::Text(text),
            other => RawCatalog::Structured(other),
        };
        CatalogPayload::new(raw, value.links).with_assets(value.assets)
    }
}

pub fn handle_message<H, V, F>(
    controller: &mut OverlayController<H, V, F>,
    message: HostMessage,
    now: Instant,
) -> Result<Disposition, ErrorResponse>
where
    H: HostBridge,
    V: View,
    F: AssetFactory,
{
    let event = match message {
        HostMessage::Hook => OverlayEvent::Hook,
        HostMessage::Query(request) => OverlayEvent::QueryChanged(request.query),
        HostMessage::Key(request) => {
            if request.code.trim().is_empty() {
                return Err(ErrorResponse {
                    code: ErrorCode::InvalidRequest,
                    message: "key code is required".to_string(),
                });
            }
            OverlayEvent::Key(Key::from_code(request.code.trim()))
        }
        HostMessage::Blur => OverlayEvent::Blur,
        HostMessage::Focus => OverlayEvent::Focus,
        HostMessage::Catalog(push) => OverlayEvent::Catalog(push.into()),
        HostMessage::Hide(request) => {
            controller.hide(request.restore, None, now);
            return Ok(Disposition::Default);
        }
    };

    Ok(controller.handle(event, now))
}

/// Decodes one JSON line and dispatches it.
pub fn handle_json<H, V, F>(
    controller: &mut OverlayController<H, V, F>,
    payload: &str,
    now: Instant,
) -> Result<Disposition, ErrorResponse>
where
    H: HostBridge,
    V: View,
    F: AssetFactory,
{
    let message = serde_json::from_str::<HostMessage>(payload).map_err(|error| ErrorResponse {
        code: ErrorCode::InvalidJson,
        message: error.to_string(),
    })?;
    handle_message(controller, message, now)
}

/// Shared line writer; every message becomes one JSON line.
pub struct JsonLineSink<W: Write> {
    writer: Rc<RefCell<W>>,
}

impl<W: Write> Clone for JsonLineSink<W> {
    fn clone(&self) -> Self {
        Self {
            writer: Rc::clone(&self.writer),
        }
    }
}

impl<W: Write> JsonLineSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Rc::new(RefCell::new(writer)),
        }
    }

    pub fn emit(&self, message: &OutboundMessage) -> std::io::Result<()> {
        let line = serde_json::to_string(message)?;
        let mut writer = self.writer.borrow_mut();
        writeln!(writer, "{line}")?;
        writer.flush()
    }

    pub fn emit_state(&self, snapshot: StateSnapshot) -> std::io::Result<()> {
        self.emit(&OutboundMessage::State(snapshot))
    }

    pub fn writer(&self) -> std::cell::Ref<'_, W> {
        self.writer.borrow()
    }
}

/// Host bridge for a host that drives the controller over a line protocol.
pub struct JsonLineHost<W: Write> {
    sink: JsonLineSink<W>,
}

impl<W: Write> JsonLineHost<W> {
    pub fn new(sink: JsonLineSink<W>) -> Self {
        Self { sink }
    }
}

impl<W: Write> HostBridge for JsonLineHost<W> {
    fn hook(&mut self) -> Result<HookRegistration, HostError> {
        Ok(HookRegistration::Attached("json-lines".to_string()))
    }

    fn unhook(&mut self) {}

    fn toggle(&mut self, code: ToggleCode) -> Result<(), HostError> {
        self.sink
            .emit(&OutboundMessage::Toggle { code: code.code() })
            .map_err(|e| HostError::Unreachable(e.to_string()))
    }
}

pub struct JsonLineView<W: Write> {
    sink: JsonLineSink<W>,
}

impl<W: Write> JsonLineView<W> {
    pub fn new(sink: JsonLineSink<W>) -> Self {
        Self { sink }
    }

    fn send(&self, message: OutboundMessage) {
        if let Err(error) = self.sink.emit(&message) {
            log::warn!("view command not delivered: {error}");
        }
    }
}

impl<W: Write> View for JsonLineView<W> {
    fn focus(&mut self, field: &str) {
        self.send(OutboundMessage::Focus {
            field: field.to_string(),
        });
    }

    fn select(&mut self, direction: SelectDirection) {
        self.send(OutboundMessage::Select {
            direction: direction.offset(),
        });
    }

    fn reset(&mut self) {
        self.send(OutboundMessage::Reset);
    }
}
