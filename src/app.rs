use crate::config::Config;
use crate::features::cursor::{CursorController, CursorFrame};
use crate::features::hero::{Effect, Hero};
use crate::features::scroll::ScrollSmoother;
use crate::features::Feature;
use crate::gfx::math::Vec2;
use crate::sink::Sink;
use crate::store::CursorStore;
use log::{debug, info};

#[derive(Debug, Clone, PartialEq)]
pub enum UiEvent {
    HoverEnter,
    HoverLeave,
    Activate,
    PointerMove { pos: Vec2 },
    Scroll { delta: f32 },
}

/// Where the page writes its text.
#[derive(Default)]
pub struct Sinks {
    pub caption: Option<Box<dyn Sink>>,
    pub title: Option<Box<dyn Sink>>,
}

/// One page session.
pub struct App {
    pub config: Config,
    pub store: CursorStore,
    pub cursor: CursorController,
    pub hero: Hero,
    pub scroll: ScrollSmoother,
    /// Session clock in seconds.
    pub time: f64,
    /// Session time at which the one-shot reveal fired.
    pub revealed_at: Option<f64>,
    mounted: bool,
}

impl App {
    pub fn new(config: Config, sinks: Sinks) -> Self {
        let cursor = CursorController::new(
            config.cursor.clone(),
            config.transition.options(),
            sinks.caption,
        );
        let hero = Hero::new(config.hero.clone(), config.scramble.options(), sinks.title);
        let scroll = ScrollSmoother::new(config.scroll.clone());
        Self {
            config,
            store: CursorStore::new(),
            cursor,
            hero,
            scroll,
            time: 0.0,
            revealed_at: None,
            mounted: false,
        }
    }

    #[cfg(test)]
    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    fn features(&mut self) -> [&mut dyn Feature; 3] {
        [&mut self.cursor, &mut self.hero, &mut self.scroll]
    }

    pub fn mount(&mut self) {
        if self.mounted {
            return;
        }
        let store = self.store.clone();
        let now = self.time;
        for feature in self.features() {
            debug!("mounting {}", feature.name());
            feature.mount(&store, now);
        }
        self.mounted = true;
        info!("page mounted at {:.2}s", now);
    }

    pub fn unmount(&mut self) {
        if !self.mounted {
            return;
        }
        for feature in self.features() {
            debug!("unmounting {}", feature.name());
            feature.unmount();
        }
        self.mounted = false;
        info!("page unmounted at {:.2}s", self.time);
    }

    pub fn handle_event(&mut self, event: UiEvent) {
        if !self.mounted {
            return;
        }
        if let UiEvent::Scroll { delta } = event {
            self.scroll.scroll_by(delta, self.time);
        }
        let cursor = self.store.state();
        let effects = self.hero.handle_event(&event, &cursor);
        self.apply(effects);
    }

    fn apply(&mut self, effects: Vec<Effect>) {
        let now = self.time;
        for effect in effects {
            match effect {
                Effect::SetCollapsed(collapsed) => self.store.set_collapsed(collapsed),
                Effect::SetCursorText(text) => self.store.set_cursor_text(&text),
                Effect::SetProgress(p) => self.store.set_progress_percentage(p),
                Effect::ScrambleTitle => self.hero.scramble_title(now),
                Effect::ArmProgressReset => self.hero.arm_progress_reset(now),
                Effect::TrackPointer(pos) => self.cursor.pointer_move(pos),
                Effect::TiltTitle(pos) => self.hero.tilt_toward(pos),
                Effect::ResetTilt => self.hero.reset_tilt(),
                Effect::Reveal => {
                    info!("reveal");
                    self.revealed_at = Some(now);
                }
            }
        }
        self.cursor.sync(now);
    }

    pub fn update(&mut self, dt: f32) {
        self.time += f64::from(dt);
        if !self.mounted {
            return;
        }
        let now = self.time;
        let effects = self.hero.update(now);
        self.apply(effects);
        self.cursor.update(now);
        self.scroll.update(now);
    }

    pub fn cursor_frame(&self) -> CursorFrame {
        self.cursor.frame(self.time)
    }

    /// Nothing left to animate apart from the idle loops.
    pub fn is_quiescent(&self) -> bool {
        !self.cursor.is_animating(self.time)
            && !self.hero.title_scrambling()
            && !self.hero.progress_pending()
            && self.scroll.is_settled()
    }
}

impl Drop for App {
    fn drop(&mut self) {
        self.unmount();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::TextBuffer;

    struct Page {
        app: App,
        caption: TextBuffer,
        title: TextBuffer,
    }

    fn page() -> Page {
        let caption = TextBuffer::new();
        let title = TextBuffer::new();
        let mut app = App::new(
            Config::default(),
            Sinks {
                caption: Some(Box::new(caption.clone())),
                title: Some(Box::new(title.clone())),
            },
        );
        app.mount();
        Page { app, caption, title }
    }

    fn run(app: &mut App, seconds: f32) {
        let steps = (seconds * 60.0).round() as usize;
        for _ in 0..steps {
            app.update(1.0 / 60.0);
        }
    }

    #[test]
    fn hover_enter_collapses_and_types_caption() {
        let mut p = page();
        p.app.handle_event(UiEvent::HoverEnter);
        let state = p.app.store.state();
        assert!(state.is_collapsed);
        assert_eq!(state.cursor_text, "click to start the magic!!!");
        assert!(p.app.hero.title_scrambling());

        run(&mut p.app, 3.0);
        assert_eq!(p.caption.text(), "click to start the magic!!!");
        assert_eq!(p.title.text(), "ECLIPSE");
    }

    #[test]
    fn click_protocol_holds_then_resets() {
        let mut p = page();
        p.app.handle_event(UiEvent::HoverEnter);
        p.app.handle_event(UiEvent::Activate);
        let state = p.app.store.state();
        assert!(state.is_collapsed);
        assert_eq!(state.progress_percentage, 100.0);
        assert!(p.app.revealed_at.is_some());
        assert!(p.app.hero.state().loading);

        run(&mut p.app, 0.5);
        assert_eq!(p.app.store.state().progress_percentage, 100.0);
        run(&mut p.app, 0.6);
        let state = p.app.store.state();
        assert_eq!(state.progress_percentage, 0.0);
        assert!(!state.is_collapsed);
        assert!(!p.app.hero.state().loading);
    }

    #[test]
    fn hover_leave_during_hold_keeps_collapsed() {
        let mut p = page();
        p.app.handle_event(UiEvent::HoverEnter);
        p.app.handle_event(UiEvent::Activate);
        p.app.handle_event(UiEvent::HoverLeave);
        let state = p.app.store.state();
        assert!(state.is_collapsed);
        assert_eq!(state.cursor_text, "");

        run(&mut p.app, 1.2);
        assert!(!p.app.store.state().is_collapsed);
    }

    #[test]
    fn second_activation_restarts_the_hold() {
        let mut p = page();
        p.app.handle_event(UiEvent::Activate);
        let first = p.app.revealed_at;
        run(&mut p.app, 0.5);
        p.app.handle_event(UiEvent::Activate);
        assert_eq!(p.app.revealed_at, first);

        run(&mut p.app, 0.75);
        assert_eq!(p.app.store.state().progress_percentage, 100.0);
        run(&mut p.app, 0.5);
        assert_eq!(p.app.store.state().progress_percentage, 0.0);
    }

    #[test]
    fn caption_round_trip_leaves_nothing_running() {
        let mut p = page();
        p.app.handle_event(UiEvent::HoverEnter);
        run(&mut p.app, 0.1);
        p.app.handle_event(UiEvent::HoverLeave);
        run(&mut p.app, 2.0);
        assert_eq!(p.caption.text(), "");
        assert!(p.app.is_quiescent());

        let writes = p.caption.writes();
        run(&mut p.app, 2.0);
        assert_eq!(p.caption.writes(), writes);
    }

    #[test]
    fn tilt_follows_pointer_only_while_hovered() {
        let mut p = page();
        let edge = Vec2::new(840.0, 360.0);
        p.app.handle_event(UiEvent::PointerMove { pos: edge });
        assert_eq!(p.app.hero.tilt_angles(), (0.0, 0.0));

        p.app.handle_event(UiEvent::HoverEnter);
        p.app.handle_event(UiEvent::PointerMove { pos: edge });
        assert_eq!(p.app.hero.tilt_angles(), (0.0, 5.0));

        p.app.handle_event(UiEvent::HoverLeave);
        assert_eq!(p.app.hero.tilt_angles(), (0.0, 0.0));
    }

    #[test]
    fn scroll_events_move_the_page() {
        let mut p = page();
        p.app.handle_event(UiEvent::Scroll { delta: 200.0 });
        assert_eq!(p.app.scroll.target(), 200.0);
        run(&mut p.app, 3.0);
        assert_eq!(p.app.scroll.offset(), 200.0);
    }

    #[test]
    fn long_running_session_still_animates() {
        let caption = TextBuffer::new();
        let title = TextBuffer::new();
        let mut app = App::new(
            Config::default(),
            Sinks {
                caption: Some(Box::new(caption.clone())),
                title: Some(Box::new(title.clone())),
            },
        );
        app.time = 524_288.0;
        app.mount();

        app.update(1.0 / 60.0);
        assert!(app.time > 524_288.0);

        app.handle_event(UiEvent::HoverEnter);
        app.handle_event(UiEvent::Activate);
        run(&mut app, 3.0);
        assert!((app.time - 524_291.0).abs() < 0.1);
        assert_eq!(caption.text(), "click to start the magic!!!");
        assert_eq!(title.text(), "ECLIPSE");
        assert_eq!(app.store.state().progress_percentage, 0.0);
        assert!(app.cursor_frame().ring_offset.is_finite());
    }

    #[test]
    fn unmount_leaves_no_pending_work() {
        let mut p = page();
        p.app.handle_event(UiEvent::HoverEnter);
        p.app.handle_event(UiEvent::Activate);
        run(&mut p.app, 0.1);
        assert!(p.app.is_mounted());
        p.app.unmount();

        assert!(!p.app.is_mounted());
        assert_eq!(p.app.cursor.pending_tasks(), 0);
        assert!(!p.app.hero.progress_pending());
        assert_eq!(p.app.store.listener_count(), 0);

        let (captions, titles) = (p.caption.writes(), p.title.writes());
        let progress = p.app.store.state().progress_percentage;
        run(&mut p.app, 5.0);
        assert_eq!(p.caption.writes(), captions);
        assert_eq!(p.title.writes(), titles);
        assert_eq!(p.app.store.state().progress_percentage, progress);

        p.app.handle_event(UiEvent::HoverLeave);
        assert_eq!(p.app.store.state().cursor_text, "click to start the magic!!!");
    }
}
