use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerToken(u64);

/// Deadline-ordered deferred tasks. Nothing fires on its own: the owner drains due tasks
/// with the current instant, so the event loop never sleeps on a pending task.
#[derive(Debug)]
pub struct TimerQueue<T> {
    next_id: u64,
    pending: Vec<(TimerToken, Instant, T)>,
}

impl<T> Default for TimerQueue<T> {
    fn default() -> Self {
        Self {
            next_id: 1,
            pending: Vec::new(),
        }
    }
}

impl<T> TimerQueue<T> {
    pub fn schedule(&mut self, deadline: Instant, task: T) -> TimerToken {
        let token = TimerToken(self.next_id);
        self.next_id += 1;
        self.pending.push((token, deadline, task));
        token
    }

    /// Removes a pending task. Returns `None` when it already fired or was cancelled.
    pub fn cancel(&mut self, token: TimerToken) -> Option<T> {
        let position = self.pending.iter().position(|(t, _, _)| *t == token)?;
        Some(self.pending.remove(position).2)
    }

    pub fn is_pending(&self, token: TimerToken) -> bool {
        self.pending.iter().any(|(t, _, _)| *t == token)
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.iter().map(|(_, deadline, _)| *deadline).min()
    }

    /// Takes every task whose deadline is at or before `now`, earliest first.
    pub fn take_due(&mut self, now: Instant) -> Vec<(TimerToken, T)> {
        let mut due = Vec::new();
        let mut index = 0;
        while index < self.pending.len() {
            if self.pending[index].1 <= now {
                due.push(self.pending.remove(index));
            } else {
                index += 1;
            }
        }

        due.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0 .0.cmp(&b.0 .0)));
        due.into_iter().map(|(token, _, task)| (token, task)).collect()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
