use crate::config::CursorConfig;
use crate::effects::transition::{TextTransition, TransitionOptions};
use crate::features::Feature;
use crate::gfx::anim::{yoyo, Ease, Tween};
use crate::gfx::math::Vec2;
use crate::sched::{CancelToken, Scheduler};
use crate::sink::Sink;
use crate::store::{CursorState, CursorStore, Subscription};
use log::{debug, info};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::f32::consts::PI;
use std::rc::Rc;

const REVEAL_DELAY: f32 = 0.1;
const INTRO_DELAY: f32 = 1.0;
const INTRO_DURATION: f32 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PillMode {
    Expanded,
    Collapsed,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum CursorTask {
    Frame,
    Reveal,
}

/// Everything the host needs to draw the cursor for one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct CursorFrame {
    pub visible: bool,
    pub mode: PillMode,
    pub icon: Vec2,
    pub pill: Vec2,
    /// Space between the two pill halves.
    pub gap: f32,
    pub margin_left: f32,
    pub ring_circumference: f32,
    pub ring_offset: f32,
    pub caret_opacity: f32,
    pub scale: f32,
    pub opacity: f32,
}

pub struct CursorController {
    config: CursorConfig,
    transition: TransitionOptions,
    mode: PillMode,
    caption: TextTransition,
    previous_caption: String,
    last_progress: f32,
    gap: Tween,
    margin: Tween,
    ring: Tween,
    intro_scale: Tween,
    intro_opacity: Tween,
    pointer: Vec2,
    pill: Vec2,
    visible: bool,
    blink_start: f64,
    tasks: Scheduler<CursorTask>,
    frame_loop: Option<CancelToken>,
    inbox: Rc<RefCell<VecDeque<CursorState>>>,
    subscription: Option<(CursorStore, Subscription)>,
}

impl CursorController {
    pub fn new(
        config: CursorConfig,
        transition: TransitionOptions,
        caption: Option<Box<dyn Sink>>,
    ) -> Self {
        let circumference = ring_circumference(config.ring_radius);
        Self {
            mode: PillMode::Expanded,
            caption: TextTransition::new(caption),
            previous_caption: String::new(),
            last_progress: 0.0,
            gap: Tween::at(config.expanded_gap, config.collapse_duration, Ease::Power1Out),
            margin: Tween::at(0.0, config.collapse_duration, Ease::Power1Out),
            ring: Tween::at(circumference, config.ring_duration, Ease::Power2Out),
            intro_scale: Tween::at(0.5, INTRO_DURATION, Ease::Power1Out).with_delay(INTRO_DELAY),
            intro_opacity: Tween::at(0.0, INTRO_DURATION, Ease::Power1Out)
                .with_delay(INTRO_DELAY),
            pointer: Vec2::ZERO,
            pill: Vec2::ZERO,
            visible: false,
            blink_start: 0.0,
            tasks: Scheduler::new(),
            frame_loop: None,
            inbox: Rc::new(RefCell::new(VecDeque::new())),
            subscription: None,
            transition,
            config,
        }
    }

    #[cfg(test)]
    pub fn mode(&self) -> PillMode {
        self.mode
    }

    pub fn is_mounted(&self) -> bool {
        self.subscription.is_some()
    }

    #[cfg(test)]
    pub fn frame_loop_running(&self) -> bool {
        self.frame_loop.as_ref().is_some_and(|t| t.is_active())
    }

    #[cfg(test)]
    pub fn caption_running(&self) -> bool {
        self.caption.is_running()
    }

    #[cfg(test)]
    pub fn pending_tasks(&self) -> usize {
        self.tasks.pending()
    }

    pub fn pointer_move(&mut self, pos: Vec2) {
        self.pointer = pos;
    }

    /// React to every store change queued since the last call, in order.
    pub fn sync(&mut self, now: f64) {
        loop {
            let next = self.inbox.borrow_mut().pop_front();
            let Some(state) = next else { break };
            self.apply_state(&state, now);
        }
    }

    pub fn update(&mut self, now: f64) {
        self.sync(now);
        for task in self.tasks.drain_due(now) {
            match task {
                CursorTask::Frame => {
                    let target = self.pointer - self.config.pill_offset();
                    self.pill = self.pill.approach(target, self.config.smoothing);
                }
                CursorTask::Reveal => {
                    self.visible = true;
                }
            }
        }
        self.caption.tick(now);
    }

    fn apply_state(&mut self, state: &CursorState, now: f64) {
        let mode = if state.is_collapsed {
            PillMode::Collapsed
        } else {
            PillMode::Expanded
        };
        if mode != self.mode {
            debug!("cursor {:?} -> {:?}", self.mode, mode);
            self.mode = mode;
            let (gap, margin) = match mode {
                PillMode::Collapsed => (0.0, self.config.collapsed_margin),
                PillMode::Expanded => (self.config.expanded_gap, 0.0),
            };
            self.gap.retarget(now, gap);
            self.margin.retarget(now, margin);
        }

        if state.progress_percentage != self.last_progress {
            self.last_progress = state.progress_percentage;
            let c = ring_circumference(self.config.ring_radius);
            self.ring
                .retarget(now, ring_offset(c, state.progress_percentage));
        }

        if state.cursor_text != self.previous_caption {
            self.caption.transition(
                &self.previous_caption,
                &state.cursor_text,
                &self.transition,
                now,
            );
            self.previous_caption = state.cursor_text.clone();
        }
    }

    pub fn frame(&self, now: f64) -> CursorFrame {
        let caret_opacity = if self.caption.caret_forced() {
            1.0
        } else {
            yoyo(now, self.blink_start, self.config.blink_half_period, Ease::Power1InOut)
        };
        CursorFrame {
            visible: self.visible,
            mode: self.mode,
            icon: self.pointer - self.config.icon_offset(),
            pill: self.pill,
            gap: self.gap.value(now),
            margin_left: self.margin.value(now),
            ring_circumference: ring_circumference(self.config.ring_radius),
            ring_offset: self.ring.value(now),
            caret_opacity,
            scale: self.intro_scale.value(now),
            opacity: self.intro_opacity.value(now),
        }
    }

    /// True while any tween or the caption is still moving.
    pub fn is_animating(&self, now: f64) -> bool {
        self.caption.is_running()
            || !self.gap.is_complete(now)
            || !self.margin.is_complete(now)
            || !self.ring.is_complete(now)
    }
}

impl Feature for CursorController {
    fn name(&self) -> &'static str {
        "cursor"
    }

    fn mount(&mut self, store: &CursorStore, now: f64) {
        if self.is_mounted() {
            return;
        }
        let inbox = self.inbox.clone();
        let sub = store.subscribe(move |state| inbox.borrow_mut().push_back(state.clone()));
        self.subscription = Some((store.clone(), sub));
        self.inbox.borrow_mut().push_back(store.state());

        let frame = 1.0 / self.config.frame_rate.max(1.0);
        self.frame_loop = Some(self.tasks.every(now, frame, CursorTask::Frame));
        self.tasks.after(now, REVEAL_DELAY, CursorTask::Reveal);
        self.intro_scale.play(now, 0.5, 1.0);
        self.intro_opacity.play(now, 0.0, 1.0);
        self.blink_start = now;
        info!("cursor mounted");
        self.sync(now);
    }

    fn unmount(&mut self) {
        self.tasks.cancel_all();
        self.frame_loop = None;
        self.caption.cancel();
        self.inbox.borrow_mut().clear();
        if let Some((store, sub)) = self.subscription.take() {
            store.unsubscribe(sub);
            info!("cursor unmounted");
        }
    }
}

impl Drop for CursorController {
    fn drop(&mut self) {
        self.unmount();
    }
}

pub fn ring_circumference(radius: f32) -> f32 {
    2.0 * PI * radius
}

/// Dash offset that leaves `percentage` of the ring drawn.
pub fn ring_offset(circumference: f32, percentage: f32) -> f32 {
    circumference - (percentage / 100.0) * circumference
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::TextBuffer;

    fn mounted() -> (CursorController, CursorStore, TextBuffer) {
        let buf = TextBuffer::new();
        let mut cursor = CursorController::new(
            CursorConfig::default(),
            TransitionOptions::default(),
            Some(Box::new(buf.clone())),
        );
        let store = CursorStore::new();
        cursor.mount(&store, 0.0);
        (cursor, store, buf)
    }

    #[test]
    fn ring_offset_tracks_percentage() {
        let c = ring_circumference(30.0);
        assert_eq!(ring_offset(c, 0.0), c);
        assert_eq!(ring_offset(c, 100.0), 0.0);
        assert!((ring_offset(c, 50.0) - c / 2.0).abs() < 1e-4);
    }

    #[test]
    fn collapse_and_expand_retarget_pill_shape() {
        let (mut cursor, store, _) = mounted();
        assert_eq!(cursor.mode(), PillMode::Expanded);

        store.set_collapsed(true);
        cursor.update(1.0);
        assert_eq!(cursor.mode(), PillMode::Collapsed);
        let f = cursor.frame(1.5);
        assert_eq!(f.gap, 0.0);
        assert_eq!(f.margin_left, 8.0);

        store.set_collapsed(false);
        cursor.update(2.0);
        let mid = cursor.frame(2.1);
        assert!(mid.gap > 0.0 && mid.gap < 16.0);
        let f = cursor.frame(2.5);
        assert_eq!(f.gap, 16.0);
        assert_eq!(f.margin_left, 0.0);
    }

    #[test]
    fn progress_ring_eases_toward_target() {
        let (mut cursor, store, _) = mounted();
        let c = ring_circumference(30.0);
        assert_eq!(cursor.frame(0.0).ring_offset, c);

        store.set_progress_percentage(100.0);
        cursor.update(1.0);
        let early = cursor.frame(1.1).ring_offset;
        assert!(early < c && early > 0.0);
        assert_eq!(cursor.frame(1.5).ring_offset, 0.0);
    }

    #[test]
    fn icon_follows_pointer_and_pill_trails() {
        let (mut cursor, _, _) = mounted();
        cursor.pointer_move(Vec2::new(100.0, 100.0));
        cursor.update(0.02);
        let f = cursor.frame(0.02);
        assert_eq!(f.icon, Vec2::new(82.0, 82.0));
        assert!((f.pill.x - 2.0).abs() < 1e-4);
        assert!((f.pill.y - 6.7).abs() < 1e-4);

        for i in 2..600 {
            cursor.update(i as f64 / 60.0 + 0.001);
        }
        let f = cursor.frame(10.0);
        assert!(f.pill.distance(Vec2::new(20.0, 67.0)) < 0.01);
    }

    #[test]
    fn caption_changes_drive_the_transition() {
        let (mut cursor, store, buf) = mounted();
        store.set_cursor_text("hi");
        cursor.update(0.0);
        assert!(cursor.caption_running());
        assert_eq!(cursor.frame(0.0).caret_opacity, 1.0);
        cursor.update(1.0);
        assert_eq!(buf.text(), "hi");
        assert!(!cursor.caption_running());
    }

    #[test]
    fn rapid_caption_flip_ends_empty_and_quiet() {
        let (mut cursor, store, buf) = mounted();
        store.set_cursor_text("click to start the magic!!!");
        cursor.update(0.0);
        cursor.update(0.1);
        store.set_cursor_text("");
        cursor.update(0.12);
        cursor.update(5.0);
        assert_eq!(buf.text(), "");
        assert!(!cursor.caption_running());

        let writes = buf.writes();
        cursor.update(10.0);
        cursor.update(20.0);
        assert_eq!(buf.writes(), writes);
    }

    #[test]
    fn intro_fades_in_after_delay() {
        let (mut cursor, _, _) = mounted();
        assert!(!cursor.frame(0.0).visible);
        cursor.update(0.2);
        let f = cursor.frame(0.2);
        assert!(f.visible);
        assert_eq!(f.opacity, 0.0);
        assert_eq!(f.scale, 0.5);
        let f = cursor.frame(2.0);
        assert_eq!(f.opacity, 1.0);
        assert_eq!(f.scale, 1.0);
    }

    #[test]
    fn unmount_cancels_everything() {
        let (mut cursor, store, buf) = mounted();
        store.set_cursor_text("loading");
        cursor.update(0.0);
        assert!(cursor.frame_loop_running());

        cursor.unmount();
        cursor.unmount();
        assert!(!cursor.is_mounted());
        assert!(!cursor.frame_loop_running());
        assert_eq!(cursor.pending_tasks(), 0);
        assert_eq!(store.listener_count(), 0);

        let writes = buf.writes();
        store.set_cursor_text("ignored");
        cursor.update(5.0);
        assert_eq!(buf.writes(), writes);
    }
}
