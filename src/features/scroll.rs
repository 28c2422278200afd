use crate::config::ScrollConfig;
use crate::features::Feature;
use crate::gfx::anim::{lerp, Timeline};
use crate::sched::{CancelToken, Scheduler};
use crate::store::CursorStore;
use log::debug;

const SETTLE_EPSILON: f32 = 0.01;

pub fn scroll_ease(t: f32) -> f32 {
    (1.001 - (1.0 - t).powi(4)).min(1.0)
}

/// Wheel input moves a target; each frame the offset closes `lerp` of the
/// gap, or follows [`scroll_ease`] over `duration` when `lerp` is zero.
pub struct ScrollSmoother {
    config: ScrollConfig,
    offset: f32,
    target: f32,
    from: f32,
    timeline: Timeline,
    tasks: Scheduler<()>,
    frame_loop: Option<CancelToken>,
}

impl ScrollSmoother {
    pub fn new(config: ScrollConfig) -> Self {
        Self {
            timeline: Timeline::new(config.duration),
            config,
            offset: 0.0,
            target: 0.0,
            from: 0.0,
            tasks: Scheduler::new(),
            frame_loop: None,
        }
    }

    pub fn offset(&self) -> f32 {
        self.offset
    }

    #[cfg(test)]
    pub fn target(&self) -> f32 {
        self.target
    }

    pub fn is_settled(&self) -> bool {
        self.offset == self.target
    }

    pub fn scroll_by(&mut self, delta: f32, now: f64) {
        let limit = self.config.limit.max(0.0);
        self.target = (self.target + delta * self.config.wheel_multiplier).clamp(0.0, limit);
        self.from = self.offset;
        self.timeline.start(now);
        debug!("scroll target {:.1}", self.target);
    }

    /// Advance the offset one frame.
    pub fn tick(&mut self, now: f64) {
        if self.is_settled() {
            return;
        }
        if self.config.lerp > 0.0 {
            self.offset = lerp(self.offset, self.target, self.config.lerp.min(1.0));
        } else {
            self.timeline.update(now);
            self.offset = lerp(self.from, self.target, scroll_ease(self.timeline.progress()));
        }
        if (self.target - self.offset).abs() < SETTLE_EPSILON {
            self.offset = self.target;
        }
    }

    pub fn update(&mut self, now: f64) {
        for () in self.tasks.drain_due(now) {
            self.tick(now);
        }
    }
}

impl Feature for ScrollSmoother {
    fn name(&self) -> &'static str {
        "scroll"
    }

    fn mount(&mut self, _store: &CursorStore, now: f64) {
        if self.frame_loop.is_none() {
            self.frame_loop = Some(self.tasks.every(now, 1.0 / 60.0, ()));
        }
    }

    fn unmount(&mut self) {
        self.tasks.cancel_all();
        self.frame_loop = None;
    }
}
