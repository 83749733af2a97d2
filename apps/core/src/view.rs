use std::cell::RefCell;
use std::rc::Rc;

pub const INPUT_FIELD: &str = "input";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectDirection {
    Up,
    Down,
}

impl SelectDirection {
    pub fn offset(self) -> i32 {
        match self {
            Self::Up => -1,
            Self::Down => 1,
        }
    }
}

/// Presentation layer. It renders from `OverlayState` and receives these commands.
pub trait View {
    fn focus(&mut self, field: &str);
    fn select(&mut self, direction: SelectDirection);
    fn reset(&mut self);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewCommand {
    Focus(String),
    Select(SelectDirection),
    Reset,
}

/// View that only records commands; clones share the record.
#[derive(Debug, Clone, Default)]
pub struct RecordingView {
    commands: Rc<RefCell<Vec<ViewCommand>>>,
}

impl RecordingView {
    pub fn commands(&self) -> Vec<ViewCommand> {
        self.commands.borrow().clone()
    }

    pub fn reset_count(&self) -> usize {
        self.commands
            .borrow()
            .iter()
            .filter(|command| **command == ViewCommand::Reset)
            .count()
    }
}

impl View for RecordingView {
    fn focus(&mut self, field: &str) {
        self.commands
            .borrow_mut()
            .push(ViewCommand::Focus(field.to_string()));
    }

    fn select(&mut self, direction: SelectDirection) {
        self.commands.borrow_mut().push(ViewCommand::Select(direction));
    }

    fn reset(&mut self) {
        self.commands.borrow_mut().push(ViewCommand::Reset);
    }
}
