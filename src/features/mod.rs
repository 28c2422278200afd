pub mod cursor;
pub mod hero;
pub mod scroll;
pub mod tilt;

use crate::store::CursorStore;

/// Setup/teardown pair for a page component. Every timer, frame loop and
/// store subscription created by `mount` is released by `unmount`.
pub trait Feature {
    fn name(&self) -> &'static str;
    fn mount(&mut self, store: &CursorStore, now: f64);
    fn unmount(&mut self);
}
