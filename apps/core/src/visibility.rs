use std::time::{Duration, Instant};

use crate::timer::{TimerQueue, TimerToken};

pub type HideCallback = Box<dyn FnOnce()>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Hidden,
    Showing,
    Shown,
    Hiding,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShowAction {
    /// Overlay was hidden (or mid-dismissal) and is appearing now.
    Open { cancelled_hide: bool },
    FocusExisting,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HideAction {
    Scheduled { token: TimerToken, deadline: Instant },
    Ignored,
}

/// Dismissal whose animation delay has elapsed; the owner performs the side effects.
pub struct CompletedHide {
    pub restore: bool,
    pub callback: Option<HideCallback>,
}

impl std::fmt::Debug for CompletedHide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompletedHide")
            .field("restore", &self.restore)
            .field("callback", &self.callback.is_some())
            .finish()
    }
}

struct PendingHide {
    restore: bool,
    callback: Option<HideCallback>,
}

pub struct VisibilityController {
    state: Visibility,
    delay: Duration,
    timers: TimerQueue<PendingHide>,
    pending: Option<TimerToken>,
}

impl VisibilityController {
    pub fn new(delay: Duration) -> Self {
        Self {
            state: Visibility::Hidden,
            delay,
            timers: TimerQueue::default(),
            pending: None,
        }
    }

    pub fn state(&self) -> Visibility {
        self.state
    }

    pub fn is_visible(&self) -> bool {
        matches!(self.state, Visibility::Showing | Visibility::Shown)
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn pending_hide(&self) -> Option<TimerToken> {
        self.pending
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.timers.next_deadline()
    }

    pub fn show(&mut self) -> ShowAction {
        match self.state {
            Visibility::Showing | Visibility::Shown => ShowAction::FocusExisting,
            Visibility::Hidden | Visibility::Hiding => {
                let cancelled_hide = self
                    .pending
                    .take()
                    .and_then(|token| self.timers.cancel(token))
                    .is_some();
                self.state = Visibility::Showing;
                ShowAction::Open { cancelled_hide }
            }
        }
    }

    /// The view took focus; `Showing` settles into `Shown`.
    pub fn acknowledge_focus(&mut self) {
        if self.state == Visibility::Showing {
            self.state = Visibility::Shown;
        }
    }

    pub fn hide(
        &mut self,
        restore: bool,
        callback: Option<HideCallback>,
        now: Instant,
    ) -> HideAction {
        if !self.is_visible() {
            return HideAction::Ignored;
        }

        self.state = Visibility::Hiding;
        let deadline = now + self.delay;
        let token = self
            .timers
            .schedule(deadline, PendingHide { restore, callback });
        self.pending = Some(token);
        HideAction::Scheduled { token, deadline }
    }

    /// Completes the pending dismissal once its deadline has passed.
    pub fn poll(&mut self, now: Instant) -> Option<CompletedHide> {
        let mut completed = None;
        for (token, task) in self.timers.take_due(now) {
            if self.pending != Some(token) {
                continue;
            }
            self.pending = None;
            self.state = Visibility::Hidden;
            completed = Some(CompletedHide {
                restore: task.restore,
                callback: task.callback,
            });
        }
        completed
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use super::{HideAction, ShowAction, Visibility, VisibilityController};

    const DELAY: Duration = Duration::from_millis(250);

    fn shown() -> VisibilityController {
        let mut controller = VisibilityController::new(DELAY);
        controller.show();
        controller.acknowledge_focus();
        controller
    }

    #[test]
    fn show_moves_hidden_overlay_through_showing_to_shown() {
        let mut controller = VisibilityController::new(DELAY);
        assert_eq!(controller.show(), ShowAction::Open { cancelled_hide: false });
        assert_eq!(controller.state(), Visibility::Showing);
        assert!(controller.is_visible());

        controller.acknowledge_focus();
        assert_eq!(controller.state(), Visibility::Shown);
    }

    #[test]
    fn show_on_visible_overlay_only_refocuses() {
        let mut controller = shown();
        assert_eq!(controller.show(), ShowAction::FocusExisting);
        assert_eq!(controller.state(), Visibility::Shown);
    }

    #[test]
    fn hide_is_invisible_immediately_and_completes_after_delay() {
        let start = Instant::now();
        let mut controller = shown();

        let action = controller.hide(true, None, start);
        assert!(matches!(
            action,
            HideAction::Scheduled { deadline, .. } if deadline == start + DELAY
        ));
        assert_eq!(controller.state(), Visibility::Hiding);
        assert!(!controller.is_visible());

        assert!(controller.poll(start + Duration::from_millis(100)).is_none());
        let completed = controller.poll(start + DELAY).unwrap();
        assert!(completed.restore);
        assert_eq!(controller.state(), Visibility::Hidden);
        assert!(controller.pending_hide().is_none());
    }

    #[test]
    fn hide_while_hidden_or_hiding_is_ignored() {
        let start = Instant::now();
        let mut controller = VisibilityController::new(DELAY);
        assert_eq!(controller.hide(false, None, start), HideAction::Ignored);

        controller.show();
        controller.hide(false, None, start);
        assert_eq!(controller.hide(true, None, start), HideAction::Ignored);

        let completed = controller.poll(start + DELAY).unwrap();
        assert!(!completed.restore);
        assert!(controller.poll(start + DELAY * 4).is_none());
    }

    #[test]
    fn show_during_hide_cancels_pending_dismissal() {
        let start = Instant::now();
        let mut controller = shown();
        controller.hide(true, None, start);

        assert_eq!(controller.show(), ShowAction::Open { cancelled_hide: true });
        assert!(controller.is_visible());
        assert!(controller.poll(start + DELAY * 2).is_none());
        assert!(controller.next_deadline().is_none());
    }
}
