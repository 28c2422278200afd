pub fn ease_in_out(t: f32) -> f32 {
    if t < 0.5 {
        2.0 * t * t
    } else {
        -1.0 + (4.0 - 2.0 * t) * t
    }
}

pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Easing curves used by the cursor and text tweens.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Ease {
    #[cfg(test)]
    Linear,
    Power1Out,
    Power1InOut,
    /// Cubic deceleration, used by the progress ring.
    Power2Out,
}

impl Ease {
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            #[cfg(test)]
            Ease::Linear => t,
            Ease::Power1Out => 1.0 - (1.0 - t) * (1.0 - t),
            Ease::Power1InOut => ease_in_out(t),
            Ease::Power2Out => 1.0 - (1.0 - t).powi(3),
        }
    }
}

/// Session time is kept in `f64` seconds; durations stay `f32`.
#[derive(Debug, Clone)]
pub struct Timeline {
    pub start_time: f64,
    pub duration: f32,
    pub current_time: f64,
}

impl Timeline {
    pub fn new(duration: f32) -> Self {
        Self {
            start_time: 0.0,
            duration,
            current_time: 0.0,
        }
    }

    pub fn start(&mut self, now: f64) {
        self.start_time = now;
        self.current_time = now;
    }

    pub fn update(&mut self, now: f64) {
        self.current_time = now;
    }

    pub fn progress(&self) -> f32 {
        if self.duration <= 0.0 {
            return 1.0;
        }
        let elapsed = self.current_time - self.start_time;
        (elapsed / f64::from(self.duration)).clamp(0.0, 1.0) as f32
    }

    pub fn is_complete(&self) -> bool {
        self.progress() >= 1.0
    }
}

/// A single animated scalar. Retargeting mid-flight continues from the
/// value currently on screen, so a superseding tween never jumps.
#[derive(Debug, Clone)]
pub struct Tween {
    from: f32,
    to: f32,
    delay: f32,
    ease: Ease,
    timeline: Timeline,
}

impl Tween {
    /// A tween resting at `value`.
    pub fn at(value: f32, duration: f32, ease: Ease) -> Self {
        let mut timeline = Timeline::new(duration);
        // Park the timeline past its end so the tween reads as settled.
        timeline.start(f64::NEG_INFINITY);
        timeline.update(0.0);
        Self {
            from: value,
            to: value,
            delay: 0.0,
            ease,
            timeline,
        }
    }

    pub fn with_delay(mut self, delay: f32) -> Self {
        self.delay = delay.max(0.0);
        self
    }

    /// Start animating from `from` to `to` at `now`, honouring the delay.
    pub fn play(&mut self, now: f64, from: f32, to: f32) {
        self.from = from;
        self.to = to;
        self.timeline.start(now + f64::from(self.delay));
        self.timeline.update(now);
    }

    pub fn retarget(&mut self, now: f64, to: f32) {
        let current = self.value(now);
        self.play(now, current, to);
    }

    pub fn value(&self, now: f64) -> f32 {
        let mut timeline = self.timeline.clone();
        timeline.update(now);
        lerp(self.from, self.to, self.ease.apply(timeline.progress()))
    }

    pub fn is_complete(&self, now: f64) -> bool {
        let mut timeline = self.timeline.clone();
        timeline.update(now);
        timeline.is_complete()
    }
}

/// Infinite back-and-forth between 1 and 0 with `half_period` per leg.
pub fn yoyo(now: f64, start: f64, half_period: f32, ease: Ease) -> f32 {
    if half_period <= 0.0 {
        return 1.0;
    }
    let phase = (now - start).max(0.0) / f64::from(half_period);
    let leg = phase.floor() as u64;
    let t = ease.apply(phase.fract() as f32);
    if leg % 2 == 0 {
        1.0 - t
    } else {
        t
    }
}
