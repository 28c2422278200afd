use crate::gfx::anim::lerp;
use crate::sched::CancelToken;
use crate::sink::Sink;
use log::debug;
use std::collections::VecDeque;

#[derive(Debug, Clone, PartialEq)]
pub struct TransitionOptions {
    /// Seconds per typed character.
    pub typing_duration: f32,
    /// Seconds per deleted character.
    pub delete_duration: f32,
    pub fade_out_duration: f32,
    /// Upper bound on characters removed by a pure deletion. `None` deletes
    /// everything.
    pub delete_count: Option<usize>,
    /// Keep the caret lit while the sequence runs.
    pub show_caret: bool,
}

impl Default for TransitionOptions {
    fn default() -> Self {
        Self {
            typing_duration: 0.03,
            delete_duration: 0.05,
            fade_out_duration: 0.2,
            delete_count: None,
            show_caret: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Applied the moment the sequence starts.
    Set { text: String, opacity: f32 },
    /// Show the text with one more character.
    Type(String),
    /// Show the text with one character fewer.
    Delete(String),
    /// Fade opacity to zero over the step, then clear the text.
    FadeOut,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub duration: f32,
    pub action: Action,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanKind {
    Unchanged,
    Type,
    Delete,
    Extend,
    Rewrite { shared: usize },
    Retype,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Plan {
    pub kind: PlanKind,
    pub steps: Vec<Step>,
}

impl Plan {
    /// Text on screen once every step has run.
    pub fn landing_text(&self) -> Option<&str> {
        self.steps.last().map(|step| match &step.action {
            Action::Set { text, .. } | Action::Type(text) | Action::Delete(text) => text.as_str(),
            Action::FadeOut => "",
        })
    }

    pub fn total_duration(&self) -> f32 {
        self.steps.iter().map(|s| s.duration).sum()
    }
}

#[cfg(test)]
impl Plan {
    pub fn deletes(&self) -> usize {
        self.steps
            .iter()
            .filter(|s| matches!(s.action, Action::Delete(_)))
            .count()
    }

    pub fn types(&self) -> usize {
        self.steps
            .iter()
            .filter(|s| matches!(s.action, Action::Type(_)))
            .count()
    }

    pub fn fades(&self) -> bool {
        self.steps.iter().any(|s| s.action == Action::FadeOut)
    }
}

/// Length in characters of the longest common prefix.
pub fn shared_prefix_len(a: &str, b: &str) -> usize {
    a.chars().zip(b.chars()).take_while(|(x, y)| x == y).count()
}

fn typing_steps<'a>(
    prefix: &'a str,
    suffix: &'a [char],
    duration: f32,
) -> impl Iterator<Item = Step> + 'a {
    (1..=suffix.len()).map(move |n| {
        let mut text = prefix.to_string();
        text.extend(&suffix[..n]);
        Step {
            duration,
            action: Action::Type(text),
        }
    })
}

fn deleting_steps(text: &[char], count: usize, duration: f32) -> impl Iterator<Item = Step> + '_ {
    (1..=count).map(move |n| Step {
        duration,
        action: Action::Delete(text[..text.len() - n].iter().collect()),
    })
}

/// Build the step list from `current` to `new`. It reuses the longest
/// common prefix. Every intermediate text is a prefix of one of the two
/// strings.
pub fn plan(current: &str, new: &str, options: &TransitionOptions) -> Plan {
    let cur: Vec<char> = current.chars().collect();
    let next: Vec<char> = new.chars().collect();
    let mut steps = Vec::new();

    if current == new {
        return Plan {
            kind: PlanKind::Unchanged,
            steps,
        };
    }

    if cur.is_empty() {
        steps.push(Step {
            duration: 0.0,
            action: Action::Set {
                text: String::new(),
                opacity: 1.0,
            },
        });
        steps.extend(typing_steps("", &next, options.typing_duration));
        return Plan {
            kind: PlanKind::Type,
            steps,
        };
    }

    if next.is_empty() {
        let count = options.delete_count.unwrap_or(cur.len()).min(cur.len());
        steps.push(Step {
            duration: 0.0,
            action: Action::Set {
                text: current.to_string(),
                opacity: 1.0,
            },
        });
        steps.extend(deleting_steps(&cur, count, options.delete_duration));
        return Plan {
            kind: PlanKind::Delete,
            steps,
        };
    }

    let shared = shared_prefix_len(current, new);

    if shared == cur.len() {
        steps.push(Step {
            duration: 0.0,
            action: Action::Set {
                text: current.to_string(),
                opacity: 1.0,
            },
        });
        steps.extend(typing_steps(current, &next[shared..], options.typing_duration));
        return Plan {
            kind: PlanKind::Extend,
            steps,
        };
    }

    if shared > 0 {
        let prefix: String = cur[..shared].iter().collect();
        steps.extend(deleting_steps(&cur, cur.len() - shared, options.delete_duration));
        steps.extend(typing_steps(&prefix, &next[shared..], options.typing_duration));
        return Plan {
            kind: PlanKind::Rewrite { shared },
            steps,
        };
    }

    steps.push(Step {
        duration: options.fade_out_duration,
        action: Action::FadeOut,
    });
    steps.extend(typing_steps("", &next, options.typing_duration));
    Plan {
        kind: PlanKind::Retype,
        steps,
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextState {
    pub current_text: String,
    pub target_text: String,
    pub opacity: f32,
}

struct Sequence {
    steps: VecDeque<Step>,
    step_started: f64,
    fade_from: Option<f32>,
    show_caret: bool,
    token: CancelToken,
}

/// Plays transition plans into one sink, one sequence at a time.
pub struct TextTransition {
    sink: Option<Box<dyn Sink>>,
    state: TextState,
    sequence: Option<Sequence>,
}

impl TextTransition {
    pub fn new(sink: Option<Box<dyn Sink>>) -> Self {
        Self {
            sink,
            state: TextState {
                opacity: 1.0,
                ..TextState::default()
            },
            sequence: None,
        }
    }

    /// Replace whatever is playing with a transition from `current` to
    /// `new`. Steps with zero duration are applied before this returns.
    /// A deletion capped by `delete_count` targets the text it stops on.
    pub fn transition(
        &mut self,
        current: &str,
        new: &str,
        options: &TransitionOptions,
        now: f64,
    ) -> CancelToken {
        self.cancel();
        if self.sink.is_none() {
            return CancelToken::inert();
        }

        let plan = plan(current, new, options);
        let Some(landing) = plan.landing_text() else {
            self.state.current_text = new.to_string();
            self.state.target_text = new.to_string();
            return CancelToken::inert();
        };
        self.state.target_text = landing.to_string();

        debug!(
            "transition {:?} -> {:?}: {:?}, {} steps over {:.2}s",
            current,
            new,
            plan.kind,
            plan.steps.len(),
            plan.total_duration()
        );
        let token = CancelToken::new();
        self.sequence = Some(Sequence {
            steps: plan.steps.into(),
            step_started: now,
            fade_from: None,
            show_caret: options.show_caret,
            token: token.clone(),
        });
        self.tick(now);
        token
    }

    /// Kill the running sequence. The text stays wherever it got to.
    pub fn cancel(&mut self) {
        if let Some(seq) = self.sequence.take() {
            seq.token.cancel();
        }
    }

    pub fn is_running(&self) -> bool {
        self.sequence.as_ref().is_some_and(|s| s.token.is_active())
    }

    pub fn caret_forced(&self) -> bool {
        self.sequence
            .as_ref()
            .is_some_and(|s| s.show_caret && s.token.is_active())
    }

    #[cfg(test)]
    pub fn state(&self) -> &TextState {
        &self.state
    }

    pub fn tick(&mut self, now: f64) {
        let Some(seq) = self.sequence.as_mut() else {
            return;
        };
        if !seq.token.is_active() {
            self.sequence = None;
            return;
        }
        let Some(sink) = self.sink.as_mut() else {
            return;
        };

        while let Some(step) = seq.steps.front() {
            if step.action == Action::FadeOut && seq.fade_from.is_none() {
                seq.fade_from = Some(self.state.opacity);
            }

            let end = seq.step_started + f64::from(step.duration);
            if now < end {
                if step.action == Action::FadeOut {
                    let t = ((now - seq.step_started) as f32 / step.duration).clamp(0.0, 1.0);
                    let opacity = lerp(seq.fade_from.unwrap_or(1.0), 0.0, t);
                    sink.set_opacity(opacity);
                    self.state.opacity = opacity;
                }
                break;
            }

            match &step.action {
                Action::Set { text, opacity } => {
                    sink.set_text(text);
                    sink.set_opacity(*opacity);
                    self.state.current_text = text.clone();
                    self.state.opacity = *opacity;
                }
                Action::Type(text) | Action::Delete(text) => {
                    sink.set_text(text);
                    sink.set_opacity(1.0);
                    self.state.current_text = text.clone();
                    self.state.opacity = 1.0;
                }
                Action::FadeOut => {
                    sink.set_opacity(0.0);
                    sink.set_text("");
                    self.state.current_text.clear();
                    self.state.opacity = 0.0;
                    seq.fade_from = None;
                }
            }
            seq.step_started = end;
            seq.steps.pop_front();
        }

        if seq.steps.is_empty() {
            seq.token.finish();
            debug!("transition settled on {:?}", self.state.current_text);
            self.sequence = None;
        }
    }
}

impl Drop for TextTransition {
    fn drop(&mut self) {
        self.cancel();
    }
}
