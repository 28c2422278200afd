mod app;
mod config;
mod effects;
mod features;
mod gfx;
mod sched;
mod sink;
mod store;

use anyhow::{anyhow, Result};
use app::{App, Sinks, UiEvent};
use calloop::timer::{TimeoutAction, Timer};
use calloop::{EventLoop, LoopSignal};
use config::{Config, HeroConfig};
use gfx::anim::lerp;
use gfx::math::{Rect, Vec2};
use log::{debug, info, warn};
use sink::TextBuffer;
use std::collections::VecDeque;
use std::time::{Duration, Instant};

struct Host {
    app: App,
    hotspot: Hotspot,
    caption: TextBuffer,
    title: TextBuffer,
    script: VecDeque<(f64, UiEvent)>,
    shown_caption: String,
    shown_title: String,
    last_frame: Instant,
    signal: LoopSignal,
}

impl Host {
    fn frame(&mut self) {
        let now = Instant::now();
        let dt = now.duration_since(self.last_frame).as_secs_f32();
        self.last_frame = now;

        self.app.update(dt);
        while self.script.front().is_some_and(|(at, _)| *at <= self.app.time) {
            if let Some((_, event)) = self.script.pop_front() {
                self.hotspot.dispatch(&mut self.app, event);
            }
        }

        let caption = self.caption.text();
        if caption != self.shown_caption {
            info!("caption: {:?} at opacity {:.2}", caption, self.caption.opacity());
            self.shown_caption = caption;
        }
        let title = self.title.text();
        if title != self.shown_title {
            debug!("title: {}", title);
            self.shown_title = title;
        }

        let done = self.app.time >= f64::from(self.app.config.demo.duration);
        if done && self.script.is_empty() && self.app.is_quiescent() {
            let f = self.app.cursor_frame();
            info!(
                "demo finished at {:.2}s, pill {:?} ring {:.1}, scroll {:.1}",
                self.app.time,
                f.mode,
                f.ring_offset,
                self.app.scroll.offset()
            );
            self.signal.stop();
        }
    }
}

/// Turns raw pointer motion into hover enter and leave for the title.
struct Hotspot {
    bounds: Rect,
    inside: bool,
}

impl Hotspot {
    fn new(hero: &HeroConfig) -> Self {
        Self {
            bounds: hero.title_bounds(),
            inside: false,
        }
    }

    fn dispatch(&mut self, app: &mut App, event: UiEvent) {
        let UiEvent::PointerMove { pos } = event else {
            app.handle_event(event);
            return;
        };
        let inside = self.bounds.contains(pos);
        if inside && !self.inside {
            app.handle_event(UiEvent::HoverEnter);
        }
        if !inside && self.inside {
            app.handle_event(UiEvent::HoverLeave);
        }
        self.inside = inside;
        app.handle_event(event);
    }
}

/// A visitor drifting onto the title, clicking it, leaving and scrolling.
fn demo_script(hero: &HeroConfig) -> VecDeque<(f64, UiEvent)> {
    let target = hero.title_bounds().center();
    let start = Vec2::new(80.0, 80.0);
    let mut script = VecDeque::new();
    for i in 0..=10 {
        let t = i as f32 / 10.0;
        let pos = Vec2::new(lerp(start.x, target.x, t), lerp(start.y, target.y, t));
        script.push_back((0.2 + f64::from(t), UiEvent::PointerMove { pos }));
    }
    script.push_back((1.75, UiEvent::PointerMove { pos: target + Vec2::new(120.0, -30.0) }));
    script.push_back((2.5, UiEvent::Activate));
    script.push_back((4.5, UiEvent::PointerMove { pos: start }));
    script.push_back((5.0, UiEvent::Scroll { delta: 400.0 }));
    script
}

fn main() -> Result<()> {
    env_logger::init();

    let config = Config::load().unwrap_or_else(|e| {
        warn!("Failed to load config, using defaults: {}", e);
        Config::default()
    });
    if std::env::args().any(|arg| arg == "--write-config") {
        config.save()?;
        info!("wrote default config");
        return Ok(());
    }

    let caption = TextBuffer::new();
    let title = TextBuffer::with_text(&config.hero.title);
    let script = demo_script(&config.hero);
    let frame = Duration::from_secs_f32(1.0 / config.fps_cap.max(1) as f32);

    let mut app = App::new(
        config,
        Sinks {
            caption: Some(Box::new(caption.clone())),
            title: Some(Box::new(title.clone())),
        },
    );
    app.mount();

    let mut event_loop: EventLoop<Host> = EventLoop::try_new()?;
    let mut host = Host {
        hotspot: Hotspot::new(&app.config.hero),
        app,
        caption,
        title,
        script,
        shown_caption: String::new(),
        shown_title: String::new(),
        last_frame: Instant::now(),
        signal: event_loop.get_signal(),
    };

    event_loop
        .handle()
        .insert_source(Timer::from_duration(frame), move |_, _, host: &mut Host| {
            host.frame();
            TimeoutAction::ToDuration(frame)
        })
        .map_err(|e| anyhow!("Failed to insert frame timer: {}", e.error))?;

    info!("Starting eclipse at {} fps", frame.as_secs_f32().recip().round());
    event_loop.run(None, &mut host, |_| {})?;

    host.app.unmount();
    Ok(())
}
