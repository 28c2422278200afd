use std::cell::Cell;
use std::rc::Rc;

/// A periodic task that fell further behind than this many periods fires
/// this many times and skips the rest.
const MAX_CATCH_UP: u64 = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenState {
    Active,
    Finished,
    Cancelled,
}

/// Shared cancellation flag for a scramble run, a transition or a scheduled
/// task. Clones observe the same state.
#[derive(Debug, Clone)]
pub struct CancelToken {
    state: Rc<Cell<TokenState>>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self {
            state: Rc::new(Cell::new(TokenState::Active)),
        }
    }

    /// A token for work that never started (missing sink, empty plan).
    pub fn inert() -> Self {
        Self {
            state: Rc::new(Cell::new(TokenState::Finished)),
        }
    }

    /// Stop the work. Safe to call any number of times; a finished token
    /// stays finished.
    pub fn cancel(&self) {
        if self.state.get() == TokenState::Active {
            self.state.set(TokenState::Cancelled);
        }
    }

    pub(crate) fn finish(&self) {
        if self.state.get() == TokenState::Active {
            self.state.set(TokenState::Finished);
        }
    }

    pub fn is_active(&self) -> bool {
        self.state.get() == TokenState::Active
    }

    #[cfg(test)]
    pub fn state(&self) -> TokenState {
        self.state.get()
    }

    #[cfg(test)]
    pub fn is_cancelled(&self) -> bool {
        self.state.get() == TokenState::Cancelled
    }

    #[cfg(test)]
    pub fn is_finished(&self) -> bool {
        self.state.get() == TokenState::Finished
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

struct Task<T> {
    first: f64,
    period: Option<f64>,
    /// Deadlines already handed out.
    fired: u64,
    seq: u64,
    token: CancelToken,
    payload: T,
}

impl<T> Task<T> {
    fn due(&self) -> f64 {
        match self.period {
            Some(period) => self.first + period * self.fired as f64,
            None => self.first,
        }
    }
}

/// Deadline-ordered task list driven by the host clock.
///
/// `after` fires once, `every` re-arms itself until cancelled. Payloads are
/// plain data; the owner decides what a due task means.
pub struct Scheduler<T> {
    tasks: Vec<Task<T>>,
    next_seq: u64,
}

impl<T: Clone> Scheduler<T> {
    pub fn new() -> Self {
        Self {
            tasks: Vec::new(),
            next_seq: 0,
        }
    }

    pub fn after(&mut self, now: f64, delay: f32, payload: T) -> CancelToken {
        self.push(now + f64::from(delay.max(0.0)), None, payload)
    }

    /// Fire first at `now + period`, then every `period` seconds.
    pub fn every(&mut self, now: f64, period: f32, payload: T) -> CancelToken {
        let period = f64::from(period.max(1e-3));
        self.push(now + period, Some(period), payload)
    }

    fn push(&mut self, first: f64, period: Option<f64>, payload: T) -> CancelToken {
        let token = CancelToken::new();
        self.tasks.push(Task {
            first,
            period,
            fired: 0,
            seq: self.next_seq,
            token: token.clone(),
            payload,
        });
        self.next_seq += 1;
        token
    }

    /// Payloads whose deadline is at or before `now`, earliest first. A
    /// periodic task that fell several periods behind yields once per
    /// missed period, up to `MAX_CATCH_UP`.
    pub fn drain_due(&mut self, now: f64) -> Vec<T> {
        self.tasks.retain(|t| t.token.is_active());

        let mut due: Vec<(f64, u64, T)> = Vec::new();
        for task in self.tasks.iter_mut() {
            let next = task.due();
            if next > now {
                continue;
            }
            match task.period {
                Some(period) => {
                    // Deadlines are first + period * n; n = reached is the
                    // last one at or before `now`.
                    let reached = ((now - task.first) / period).floor() as u64;
                    let missed = (reached + 1).saturating_sub(task.fired).max(1);
                    let skipped = missed.saturating_sub(MAX_CATCH_UP);
                    task.fired += skipped;
                    for _ in skipped..missed {
                        due.push((task.due(), task.seq, task.payload.clone()));
                        task.fired += 1;
                    }
                }
                None => {
                    due.push((next, task.seq, task.payload.clone()));
                    task.token.finish();
                }
            }
        }
        self.tasks.retain(|t| t.token.is_active());

        due.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        due.into_iter().map(|(_, _, payload)| payload).collect()
    }

    pub fn cancel_all(&mut self) {
        for task in self.tasks.drain(..) {
            task.token.cancel();
        }
    }

    /// Number of live tasks.
    #[cfg(test)]
    pub fn pending(&self) -> usize {
        self.tasks.iter().filter(|t| t.token.is_active()).count()
    }

    #[cfg(test)]
    pub fn next_deadline(&self) -> Option<f64> {
        self.tasks
            .iter()
            .filter(|t| t.token.is_active())
            .map(|t| t.due())
            .min_by(|a, b| a.total_cmp(b))
    }
}

impl<T: Clone> Default for Scheduler<T> {
    fn default() -> Self {
        Self::new()
    }
}
