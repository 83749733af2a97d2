use std::time::Instant;

use log::{debug, info, warn};

use crate::assets::{AssetFactory, BlobFactory};
use crate::catalog::{ingest, CatalogPayload};
use crate::config::{validate, Config};
use crate::host::{HookRegistration, HostBridge, HostError, ToggleCode};
use crate::model::Catalog;
use crate::overlay_state::{OverlayState, StateListener, StateStore, SubscriptionId};
use crate::search::{MatchPipeline, SearchEngine};
use crate::view::{SelectDirection, View, INPUT_FIELD};
use crate::visibility::{
    CompletedHide, HideAction, HideCallback, ShowAction, VisibilityController,
};

#[derive(Debug)]
pub enum ControllerError {
    Config(String),
    Host(HostError),
}

impl std::fmt::Display for ControllerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(error) => write!(f, "config error: {error}"),
            Self::Host(error) => write!(f, "host error: {error}"),
        }
    }
}

impl std::error::Error for ControllerError {}

impl From<HostError> for ControllerError {
    fn from(value: HostError) -> Self {
        Self::Host(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Key {
    Escape,
    ArrowUp,
    ArrowDown,
    Other(String),
}

impl Key {
    pub fn from_code(code: &str) -> Self {
        match code {
            "Escape" => Self::Escape,
            "ArrowUp" => Self::ArrowUp,
            "ArrowDown" => Self::ArrowDown,
            other => Self::Other(other.to_string()),
        }
    }
}

/// Whether the platform's default handling of an event should still run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    Default,
    PreventDefault,
}

#[derive(Debug, Clone, PartialEq)]
pub enum OverlayEvent {
    Hook,
    QueryChanged(String),
    Key(Key),
    Blur,
    Focus,
    Catalog(CatalogPayload),
}

pub enum MatchSource {
    Catalog(Catalog),
    Engine(Box<dyn SearchEngine>),
}

/// Wires host, keyboard and window events to the visibility state machine and the match
/// pipeline, and owns the state the view renders from.
pub struct OverlayController<H: HostBridge, V: View, F: AssetFactory = BlobFactory> {
    host: H,
    view: Option<V>,
    store: StateStore,
    visibility: VisibilityController,
    pipeline: MatchPipeline<F>,
    source: MatchSource,
}

impl<H: HostBridge, V: View> OverlayController<H, V, BlobFactory> {
    pub fn new(config: &Config, host: H) -> Result<Self, ControllerError> {
        Self::with_factory(config, host, BlobFactory::default())
    }
}

impl<H: HostBridge, V: View, F: AssetFactory> OverlayController<H, V, F> {
    pub fn with_factory(
        config: &Config,
        mut host: H,
        factory: F,
    ) -> Result<Self, ControllerError> {
        validate(config).map_err(ControllerError::Config)?;
        match host.hook()? {
            HookRegistration::Attached(label) => info!("host hook attached: {label}"),
            HookRegistration::Noop => {
                info!("host hook not available; overlay opens on request only")
            }
        }

        Ok(Self {
            host,
            view: None,
            store: StateStore::default(),
            visibility: VisibilityController::new(config.hide_delay()),
            pipeline: MatchPipeline::with_factory(config, factory),
            source: MatchSource::Catalog(Catalog::default()),
        })
    }

    pub fn attach_view(&mut self, view: V) {
        self.view = Some(view);
        self.store.update(|state| state.set_view_attached(true));
    }

    pub fn detach_view(&mut self) -> Option<V> {
        let view = self.view.take();
        self.store.update(|state| state.set_view_attached(false));
        view
    }

    pub fn view(&self) -> Option<&V> {
        self.view.as_ref()
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn state(&self) -> &OverlayState {
        self.store.state()
    }

    pub fn subscribe(&mut self, listener: StateListener) -> SubscriptionId {
        self.store.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.store.unsubscribe(id)
    }

    pub fn visibility(&self) -> &VisibilityController {
        &self.visibility
    }

    pub fn pipeline(&self) -> &MatchPipeline<F> {
        &self.pipeline
    }

    pub fn catalog(&self) -> Option<&Catalog> {
        match &self.source {
            MatchSource::Catalog(catalog) => Some(catalog),
            MatchSource::Engine(_) => None,
        }
    }

    /// Earliest instant at which `poll_timers` has work to do.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.visibility.next_deadline()
    }

    /// Dispatches one event. Dismissals whose deadline has passed by `now` complete first,
    /// so a late hook reopens a hidden overlay instead of cancelling a finished hide.
    pub fn handle(&mut self, event: OverlayEvent, now: Instant) -> Disposition {
        self.poll_timers(now);
        match event {
            OverlayEvent::Hook => self.on_hook(now),
            OverlayEvent::QueryChanged(query) => self.set_query(query),
            OverlayEvent::Key(key) => return self.on_key(key, now),
            OverlayEvent::Blur => self.on_blur(now),
            OverlayEvent::Focus => self.on_focus(),
            OverlayEvent::Catalog(payload) => self.replace_catalog(&payload),
        }
        Disposition::Default
    }

    pub fn on_hook(&mut self, now: Instant) {
        self.poll_timers(now);
        match self.visibility.show() {
            ShowAction::Open { cancelled_hide } => {
                if cancelled_hide {
                    debug!("reopened during dismissal; pending cleanup cancelled");
                }
                self.notify_host(ToggleCode::Show);
                self.store.update(|state| state.set_visible(true));
                self.focus_input();
                self.visibility.acknowledge_focus();
            }
            ShowAction::FocusExisting => self.focus_input(),
        }
    }

    pub fn set_query(&mut self, query: String) {
        let matches = self.compute_matches(&query);
        self.store.update(|state| {
            state.set_query(query);
            state.set_matches(matches);
        });
    }

    pub fn on_key(&mut self, key: Key, now: Instant) -> Disposition {
        match key {
            Key::Escape => {
                self.hide(true, None, now);
                Disposition::Default
            }
            Key::ArrowUp => {
                self.select(SelectDirection::Up);
                Disposition::PreventDefault
            }
            Key::ArrowDown => {
                self.select(SelectDirection::Down);
                Disposition::PreventDefault
            }
            Key::Other(_) => Disposition::Default,
        }
    }

    pub fn on_blur(&mut self, now: Instant) {
        self.hide(true, None, now);
    }

    pub fn on_focus(&mut self) {
        self.focus_input();
    }

    /// Starts the dismissal. Host notification, input reset and `callback` run from
    /// `poll_timers` once the hide delay has elapsed.
    pub fn hide(
        &mut self,
        restore: bool,
        callback: Option<HideCallback>,
        now: Instant,
    ) -> HideAction {
        self.poll_timers(now);
        let action = self.visibility.hide(restore, callback, now);
        if let HideAction::Scheduled { .. } = action {
            self.store.update(|state| state.set_visible(false));
        }
        action
    }

    pub fn poll_timers(&mut self, now: Instant) {
        if let Some(completed) = self.visibility.poll(now) {
            self.finish_hide(completed);
        }
    }

    pub fn replace_catalog(&mut self, payload: &CatalogPayload) {
        let catalog = ingest(payload);
        info!("catalog replaced entries={} assets={}", catalog.len(), catalog.assets.len());
        self.replace_source(MatchSource::Catalog(catalog));
    }

    pub fn replace_engine(&mut self, engine: Box<dyn SearchEngine>) {
        info!("search engine replaced");
        self.replace_source(MatchSource::Engine(engine));
    }

    fn replace_source(&mut self, source: MatchSource) {
        self.source = source;
        self.pipeline.invalidate();
        let query = self.store.state().query().to_string();
        self.set_query(query);
    }

    fn finish_hide(&mut self, completed: CompletedHide) {
        self.notify_host(ToggleCode::for_hide(completed.restore));
        match self.view.as_mut() {
            Some(view) => view.reset(),
            None => debug!("no view attached; skipping reset"),
        }
        self.set_query(String::new());
        if let Some(callback) = completed.callback {
            callback();
        }
    }

    fn compute_matches(&mut self, query: &str) -> Vec<crate::model::Match> {
        match &self.source {
            MatchSource::Catalog(catalog) => self.pipeline.match_local(query, catalog),
            MatchSource::Engine(engine) => self.pipeline.match_engine(query, engine.as_ref()),
        }
    }

    fn focus_input(&mut self) {
        match self.view.as_mut() {
            Some(view) => view.focus(INPUT_FIELD),
            None => debug!("no view attached; focus request dropped"),
        }
    }

    fn select(&mut self, direction: SelectDirection) {
        if let Some(view) = self.view.as_mut() {
            view.select(direction);
        }
    }

    fn notify_host(&mut self, code: ToggleCode) {
        if let Err(error) = self.host.toggle(code) {
            warn!("host toggle({}) not delivered: {error}", code.code());
        }
    }
}

impl<H: HostBridge, V: View, F: AssetFactory> Drop for OverlayController<H, V, F> {
    fn drop(&mut self) {
        self.host.unhook();
        self.pipeline.invalidate();
    }
}
