use std::cell::RefCell;
use std::rc::Rc;

/// Notification codes sent to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleCode {
    Dismiss = 0,
    Show = 1,
    Restore = 2,
}

impl ToggleCode {
    pub fn for_hide(restore: bool) -> Self {
        if restore {
            Self::Restore
        } else {
            Self::Dismiss
        }
    }

    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Dismiss),
            1 => Some(Self::Show),
            2 => Some(Self::Restore),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookRegistration {
    Attached(String),
    Noop,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostError {
    HookFailed(String),
    Unreachable(String),
}

impl std::fmt::Display for HostError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::HookFailed(error) => write!(f, "hook registration failed: {error}"),
            Self::Unreachable(error) => write!(f, "host unreachable: {error}"),
        }
    }
}

impl std::error::Error for HostError {}

/// Integration layer that triggers the overlay and is told about visibility changes.
///
/// Hook invocations reach the controller as `OverlayEvent::Hook`; `hook` and `unhook`
/// scope that registration to the controller's lifetime.
pub trait HostBridge {
    fn hook(&mut self) -> Result<HookRegistration, HostError>;
    fn unhook(&mut self);
    fn toggle(&mut self, code: ToggleCode) -> Result<(), HostError>;
}

#[derive(Debug, Default)]
struct MockHostLog {
    hooked: bool,
    hook_calls: usize,
    toggles: Vec<ToggleCode>,
    unreachable: bool,
}

/// Records every call. Clones share the same log, so a test can keep one clone after
/// handing the other to a controller.
#[derive(Debug, Clone, Default)]
pub struct MockHostBridge {
    log: Rc<RefCell<MockHostLog>>,
}

impl MockHostBridge {
    pub fn toggles(&self) -> Vec<ToggleCode> {
        self.log.borrow().toggles.clone()
    }

    pub fn is_hooked(&self) -> bool {
        self.log.borrow().hooked
    }

    pub fn hook_calls(&self) -> usize {
        self.log.borrow().hook_calls
    }

    /// Makes subsequent toggles fail, as if the host had gone away.
    pub fn set_unreachable(&self, unreachable: bool) {
        self.log.borrow_mut().unreachable = unreachable;
    }
}

impl HostBridge for MockHostBridge {
    fn hook(&mut self) -> Result<HookRegistration, HostError> {
        let mut log = self.log.borrow_mut();
        log.hooked = true;
        log.hook_calls += 1;
        Ok(HookRegistration::Attached("mock".to_string()))
    }

    fn unhook(&mut self) {
        self.log.borrow_mut().hooked = false;
    }

    fn toggle(&mut self, code: ToggleCode) -> Result<(), HostError> {
        let mut log = self.log.borrow_mut();
        if log.unreachable {
            return Err(HostError::Unreachable("mock host offline".to_string()));
        }
        log.toggles.push(code);
        Ok(())
    }
}
