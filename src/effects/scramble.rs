use crate::sched::CancelToken;
use crate::sink::Sink;
use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

#[derive(Debug, Clone, PartialEq)]
pub struct ScrambleOptions {
    pub alphabet: String,
    /// Seconds between ticks.
    pub tick_interval: f32,
    /// How far the lock count advances per tick. Fractional on purpose:
    /// at 1/3 a character locks every third tick.
    pub lock_advance: f64,
}

impl Default for ScrambleOptions {
    fn default() -> Self {
        Self {
            alphabet: "ABCDEFGHIJKLMNOPQRSTUVWXYZ".to_string(),
            tick_interval: 0.03,
            lock_advance: 1.0 / 3.0,
        }
    }
}

struct Run {
    target: Vec<char>,
    alphabet: Vec<char>,
    started: f64,
    interval: f64,
    /// Ticks rendered so far; tick `n` is due at `started + interval * n`.
    ticks: u64,
    advance: f64,
    lock_count: f64,
    rendered_lock: f64,
    token: CancelToken,
}

/// Random-character reveal bound to one sink. Characters lock into place
/// left to right until the whole target is shown.
pub struct ScrambleText {
    sink: Option<Box<dyn Sink>>,
    run: Option<Run>,
    rng: StdRng,
}

impl ScrambleText {
    pub fn new(sink: Option<Box<dyn Sink>>) -> Self {
        Self {
            sink,
            run: None,
            rng: StdRng::from_entropy(),
        }
    }

    #[cfg(test)]
    pub fn with_seed(sink: Option<Box<dyn Sink>>, seed: u64) -> Self {
        Self {
            sink,
            run: None,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Begin a reveal of `target`. Any reveal already running on this sink
    /// is cancelled first. The first tick lands one interval after `now`.
    pub fn start(&mut self, target: &str, options: &ScrambleOptions, now: f64) -> CancelToken {
        self.cancel();
        if self.sink.is_none() {
            return CancelToken::inert();
        }

        let token = CancelToken::new();
        let interval = f64::from(options.tick_interval.max(0.001));
        debug!("scramble start: {:?}", target);
        self.run = Some(Run {
            target: target.chars().collect(),
            alphabet: options.alphabet.chars().collect(),
            started: now,
            interval,
            ticks: 0,
            advance: options.lock_advance.max(1e-3),
            lock_count: 0.0,
            rendered_lock: 0.0,
            token: token.clone(),
        });
        token
    }

    pub fn cancel(&mut self) {
        if let Some(run) = self.run.take() {
            run.token.cancel();
        }
    }

    pub fn is_running(&self) -> bool {
        self.run.as_ref().is_some_and(|run| run.token.is_active())
    }

    /// Lock count used for the most recent render.
    #[cfg(test)]
    pub fn lock_count(&self) -> Option<f64> {
        self.run.as_ref().map(|run| run.rendered_lock)
    }

    pub fn tick(&mut self, now: f64) {
        let Some(sink) = self.sink.as_mut() else {
            return;
        };
        let Some(run) = self.run.as_mut() else {
            return;
        };
        if !run.token.is_active() {
            self.run = None;
            return;
        }

        let mut done = false;
        while run.started + run.interval * (run.ticks + 1) as f64 <= now {
            let locked = run.lock_count.floor();
            let text: String = run
                .target
                .iter()
                .enumerate()
                .map(|(i, &ch)| {
                    if (i as f64) < locked || run.alphabet.is_empty() {
                        ch
                    } else {
                        run.alphabet[self.rng.gen_range(0..run.alphabet.len())]
                    }
                })
                .collect();
            sink.set_text(&text);
            run.rendered_lock = run.lock_count;

            if run.lock_count >= run.target.len() as f64 {
                done = true;
                break;
            }
            run.lock_count += run.advance;
            run.ticks += 1;
        }

        if done {
            run.token.finish();
            self.run = None;
        }
    }
}

impl Drop for ScrambleText {
    fn drop(&mut self) {
        self.cancel();
    }
}
