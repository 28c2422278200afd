use log::warn;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

const MAX_NOTIFY_ROUNDS: usize = 32;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CursorState {
    pub is_collapsed: bool,
    pub cursor_text: String,
    /// Always within `0.0..=100.0`.
    pub progress_percentage: f32,
}

type Listener = Box<dyn FnMut(&CursorState)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Subscription(u64);

#[derive(Default)]
struct Inner {
    state: RefCell<CursorState>,
    listeners: RefCell<Vec<(u64, Listener)>>,
    removed: RefCell<Vec<u64>>,
    next_id: Cell<u64>,
    notifying: Cell<bool>,
    dirty: Cell<bool>,
}

/// Shared handle to the session's cursor state. Listeners run before the
/// outermost setter returns; writes made from a listener go out in a
/// follow-up round.
#[derive(Clone, Default)]
pub struct CursorStore {
    inner: Rc<Inner>,
}

pub fn clamp_progress(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 100.0)
    }
}

impl CursorStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> CursorState {
        self.inner.state.borrow().clone()
    }

    pub fn set_collapsed(&self, collapsed: bool) {
        self.commit(|s| std::mem::replace(&mut s.is_collapsed, collapsed) != collapsed);
    }

    pub fn set_cursor_text(&self, text: &str) {
        self.commit(|s| {
            if s.cursor_text == text {
                return false;
            }
            s.cursor_text = text.to_string();
            true
        });
    }

    /// Out-of-range values are clamped into `0..=100`.
    pub fn set_progress_percentage(&self, percentage: f32) {
        let value = clamp_progress(percentage);
        self.commit(|s| std::mem::replace(&mut s.progress_percentage, value) != value);
    }

    pub fn subscribe(&self, listener: impl FnMut(&CursorState) + 'static) -> Subscription {
        let id = self.inner.next_id.get();
        self.inner.next_id.set(id + 1);
        self.inner.listeners.borrow_mut().push((id, Box::new(listener)));
        Subscription(id)
    }

    pub fn unsubscribe(&self, sub: Subscription) {
        let mut listeners = self.inner.listeners.borrow_mut();
        let before = listeners.len();
        listeners.retain(|(id, _)| *id != sub.0);
        // Listeners are checked out while a round runs; remember the id so
        // the round drops it when they are put back.
        if listeners.len() == before && self.inner.notifying.get() {
            self.inner.removed.borrow_mut().push(sub.0);
        }
    }

    #[cfg(test)]
    pub fn listener_count(&self) -> usize {
        self.inner.listeners.borrow().len()
    }

    fn commit(&self, apply: impl FnOnce(&mut CursorState) -> bool) {
        let changed = apply(&mut *self.inner.state.borrow_mut());
        if !changed {
            return;
        }
        self.inner.dirty.set(true);
        if self.inner.notifying.get() {
            return;
        }

        self.inner.notifying.set(true);
        let mut rounds = 0;
        while self.inner.dirty.replace(false) {
            rounds += 1;
            if rounds > MAX_NOTIFY_ROUNDS {
                warn!("cursor store: listeners kept writing after {MAX_NOTIFY_ROUNDS} rounds");
                break;
            }

            let snapshot = self.state();
            let mut listeners = std::mem::take(&mut *self.inner.listeners.borrow_mut());
            for (id, listener) in listeners.iter_mut() {
                if !self.inner.removed.borrow().contains(id) {
                    listener(&snapshot);
                }
            }

            let mut current = self.inner.listeners.borrow_mut();
            // Anything subscribed during the round landed in the empty slot.
            listeners.append(&mut current);
            let mut removed = self.inner.removed.borrow_mut();
            listeners.retain(|(id, _)| !removed.contains(id));
            removed.clear();
            *current = listeners;
        }
        self.inner.notifying.set(false);
    }
}
