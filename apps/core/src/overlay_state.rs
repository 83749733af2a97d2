use crate::model::Match;

/// Observable overlay state. Only the controller mutates it, through `StateStore::update`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OverlayState {
    query: String,
    matches: Vec<Match>,
    visible: bool,
    view_attached: bool,
}

impl OverlayState {
    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn matches(&self) -> &[Match] {
        &self.matches
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn has_view(&self) -> bool {
        self.view_attached
    }

    pub(crate) fn set_query(&mut self, query: String) {
        self.query = query;
    }

    pub(crate) fn set_matches(&mut self, matches: Vec<Match>) {
        self.matches = matches;
    }

    pub(crate) fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    pub(crate) fn set_view_attached(&mut self, attached: bool) {
        self.view_attached = attached;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

pub type StateListener = Box<dyn FnMut(&OverlayState)>;

/// Owns the overlay state and notifies subscribers once per committed update.
pub struct StateStore {
    state: OverlayState,
    listeners: Vec<(SubscriptionId, StateListener)>,
    next_id: u64,
}

impl Default for StateStore {
    fn default() -> Self {
        Self {
            state: OverlayState::default(),
            listeners: Vec::new(),
            next_id: 1,
        }
    }
}

impl StateStore {
    pub fn state(&self) -> &OverlayState {
        &self.state
    }

    pub fn subscribe(&mut self, listener: StateListener) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, listener));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(existing, _)| *existing != id);
        self.listeners.len() != before
    }

    pub fn subscriber_count(&self) -> usize {
        self.listeners.len()
    }

    /// Applies `change` and notifies subscribers if the state actually changed.
    pub(crate) fn update<F>(&mut self, change: F)
    where
        F: FnOnce(&mut OverlayState),
    {
        let before = self.state.clone();
        change(&mut self.state);
        if self.state == before {
            return;
        }

        for (_, listener) in &mut self.listeners {
            listener(&self.state);
        }
    }
}
