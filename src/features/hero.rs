use crate::app::UiEvent;
use crate::config::HeroConfig;
use crate::effects::scramble::{ScrambleOptions, ScrambleText};
use crate::features::tilt::Tilt;
use crate::features::Feature;
use crate::gfx::math::Vec2;
use crate::sched::{CancelToken, Scheduler};
use crate::sink::Sink;
use crate::store::{CursorState, CursorStore};
use log::{debug, info};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct HeroState {
    pub hovered: bool,
    /// The one-shot reveal has fired.
    pub revealed: bool,
    /// A click's progress hold is in flight.
    pub loading: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    SetCollapsed(bool),
    SetCursorText(String),
    SetProgress(f32),
    ScrambleTitle,
    /// (Re)start the progress hold timer.
    ArmProgressReset,
    TrackPointer(Vec2),
    TiltTitle(Vec2),
    ResetTilt,
    Reveal,
}

pub fn reduce(
    hero: &HeroState,
    cursor: &CursorState,
    event: &UiEvent,
    config: &HeroConfig,
) -> (HeroState, Vec<Effect>) {
    let mut next = hero.clone();
    let effects = match event {
        UiEvent::HoverEnter => {
            next.hovered = true;
            vec![
                Effect::SetCollapsed(true),
                Effect::ScrambleTitle,
                Effect::SetCursorText(config.hover_caption.clone()),
            ]
        }
        UiEvent::HoverLeave => {
            next.hovered = false;
            let mut effects = vec![Effect::SetCursorText(String::new()), Effect::ResetTilt];
            // Let a running progress hold finish before expanding.
            if cursor.progress_percentage == 0.0 {
                effects.push(Effect::SetCollapsed(false));
            }
            effects
        }
        UiEvent::Activate => {
            next.loading = true;
            let mut effects = vec![
                Effect::SetCollapsed(true),
                Effect::SetProgress(100.0),
                Effect::ArmProgressReset,
            ];
            if !hero.revealed {
                next.revealed = true;
                effects.push(Effect::Reveal);
            }
            effects
        }
        UiEvent::PointerMove { pos } => {
            let mut effects = vec![Effect::TrackPointer(*pos)];
            if hero.hovered {
                effects.push(Effect::TiltTitle(*pos));
            }
            effects
        }
        UiEvent::Scroll { .. } => Vec::new(),
    };
    (next, effects)
}

/// The progress hold ran out: drop the ring and reopen the cursor.
pub fn progress_elapsed(hero: &HeroState) -> (HeroState, Vec<Effect>) {
    let next = HeroState {
        loading: false,
        ..hero.clone()
    };
    (next, vec![Effect::SetProgress(0.0), Effect::SetCollapsed(false)])
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum HeroTask {
    Rescramble,
    ProgressElapsed,
}

/// The title hotspot. Owns the title scramble and the rescramble and click
/// reset timers; input goes through [`reduce`].
pub struct Hero {
    config: HeroConfig,
    scramble: ScrambleOptions,
    state: HeroState,
    title: ScrambleText,
    tilt: Tilt,
    angles: (f32, f32),
    tasks: Scheduler<HeroTask>,
    rescramble: Option<CancelToken>,
    progress_reset: Option<CancelToken>,
}

impl Hero {
    pub fn new(config: HeroConfig, scramble: ScrambleOptions, title: Option<Box<dyn Sink>>) -> Self {
        Self::with_title(config, scramble, ScrambleText::new(title))
    }

    pub fn with_title(config: HeroConfig, scramble: ScrambleOptions, title: ScrambleText) -> Self {
        let tilt = Tilt {
            max_tilt: config.max_tilt,
            sensitivity: config.tilt_sensitivity,
            reverse: config.tilt_reverse,
        };
        Self {
            config,
            scramble,
            state: HeroState::default(),
            title,
            tilt,
            angles: (0.0, 0.0),
            tasks: Scheduler::new(),
            rescramble: None,
            progress_reset: None,
        }
    }

    #[cfg(test)]
    pub fn state(&self) -> &HeroState {
        &self.state
    }

    /// Current `(rotate_x, rotate_y)` of the title in degrees.
    #[cfg(test)]
    pub fn tilt_angles(&self) -> (f32, f32) {
        self.angles
    }

    pub fn title_scrambling(&self) -> bool {
        self.title.is_running()
    }

    pub fn progress_pending(&self) -> bool {
        self.progress_reset.as_ref().is_some_and(|t| t.is_active())
    }

    pub fn handle_event(&mut self, event: &UiEvent, cursor: &CursorState) -> Vec<Effect> {
        let (next, effects) = reduce(&self.state, cursor, event, &self.config);
        self.state = next;
        effects
    }

    pub fn scramble_title(&mut self, now: f64) {
        self.title.start(&self.config.title, &self.scramble, now);
    }

    /// Re-arming while a hold is in flight restarts the hold.
    pub fn arm_progress_reset(&mut self, now: f64) {
        if let Some(token) = self.progress_reset.take() {
            token.cancel();
        }
        self.progress_reset = Some(self.tasks.after(
            now,
            self.config.progress_hold,
            HeroTask::ProgressElapsed,
        ));
    }

    pub fn tilt_toward(&mut self, pos: Vec2) {
        self.angles = self.tilt.angles(pos, self.config.title_bounds());
    }

    pub fn reset_tilt(&mut self) {
        self.angles = (0.0, 0.0);
    }

    /// Run due timers and the title scramble. Returns effects produced by
    /// timers that the page has to apply.
    pub fn update(&mut self, now: f64) -> Vec<Effect> {
        let mut effects = Vec::new();
        for task in self.tasks.drain_due(now) {
            match task {
                HeroTask::Rescramble => self.scramble_title(now),
                HeroTask::ProgressElapsed => {
                    debug!("progress hold elapsed");
                    let (next, mut fx) = progress_elapsed(&self.state);
                    self.state = next;
                    effects.append(&mut fx);
                }
            }
        }
        self.title.tick(now);
        effects
    }
}

impl Feature for Hero {
    fn name(&self) -> &'static str {
        "hero"
    }

    fn mount(&mut self, _store: &CursorStore, now: f64) {
        if self.rescramble.is_some() {
            return;
        }
        self.scramble_title(now);
        self.rescramble = Some(self.tasks.every(
            now,
            self.config.rescramble_interval,
            HeroTask::Rescramble,
        ));
        info!("hero mounted, title {:?}", self.config.title);
    }

    fn unmount(&mut self) {
        self.tasks.cancel_all();
        self.rescramble = None;
        self.progress_reset = None;
        self.title.cancel();
    }
}
