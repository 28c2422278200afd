use crate::effects::scramble::ScrambleOptions;
use crate::effects::transition::TransitionOptions;
use crate::gfx::math::{Rect, Vec2};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub scramble: ScrambleConfig,

    #[serde(default)]
    pub transition: TransitionConfig,

    #[serde(default)]
    pub cursor: CursorConfig,

    #[serde(default)]
    pub hero: HeroConfig,

    #[serde(default)]
    pub scroll: ScrollConfig,

    #[serde(default)]
    pub demo: DemoConfig,

    #[serde(default = "default_fps_cap")]
    pub fps_cap: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrambleConfig {
    pub alphabet: String,
    pub tick_interval: f32,
    pub lock_advance: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransitionConfig {
    pub typing_duration: f32,
    pub delete_duration: f32,
    pub fade_out_duration: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CursorConfig {
    /// Fraction of the remaining distance the pill covers per frame.
    pub smoothing: f32,
    pub frame_rate: f32,
    pub icon_offset: [f32; 2],
    pub pill_offset: [f32; 2],
    pub ring_radius: f32,
    pub ring_duration: f32,
    pub collapse_duration: f32,
    pub expanded_gap: f32,
    pub collapsed_margin: f32,
    pub blink_half_period: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HeroConfig {
    pub title: String,
    pub hover_caption: String,
    /// Seconds between idle title scrambles.
    pub rescramble_interval: f32,
    /// How long the progress ring holds at 100% after a click.
    pub progress_hold: f32,
    /// Title hotspot as `[x, y, w, h]`.
    pub title_bounds: [f32; 4],
    pub max_tilt: f32,
    pub tilt_sensitivity: f32,
    pub tilt_reverse: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrollConfig {
    pub duration: f32,
    pub lerp: f32,
    pub wheel_multiplier: f32,
    pub limit: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoConfig {
    /// Seconds the scripted session runs before the host exits.
    pub duration: f32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            scramble: ScrambleConfig::default(),
            transition: TransitionConfig::default(),
            cursor: CursorConfig::default(),
            hero: HeroConfig::default(),
            scroll: ScrollConfig::default(),
            demo: DemoConfig::default(),
            fps_cap: default_fps_cap(),
        }
    }
}

impl Default for ScrambleConfig {
    fn default() -> Self {
        let options = ScrambleOptions::default();
        Self {
            alphabet: options.alphabet,
            tick_interval: options.tick_interval,
            lock_advance: options.lock_advance,
        }
    }
}

impl Default for TransitionConfig {
    fn default() -> Self {
        let options = TransitionOptions::default();
        Self {
            typing_duration: options.typing_duration,
            delete_duration: options.delete_duration,
            fade_out_duration: options.fade_out_duration,
        }
    }
}

impl Default for CursorConfig {
    fn default() -> Self {
        Self {
            smoothing: 0.1,
            frame_rate: 60.0,
            icon_offset: [18.0, 18.0],
            pill_offset: [80.0, 33.0],
            ring_radius: 30.0,
            ring_duration: 0.5,
            collapse_duration: 0.3,
            expanded_gap: 16.0,
            collapsed_margin: 8.0,
            blink_half_period: 0.5,
        }
    }
}

impl Default for HeroConfig {
    fn default() -> Self {
        Self {
            title: "ECLIPSE".to_string(),
            hover_caption: "click to start the magic!!!".to_string(),
            rescramble_interval: 4.0,
            progress_hold: 1.0,
            title_bounds: [440.0, 300.0, 400.0, 120.0],
            max_tilt: 5.0,
            tilt_sensitivity: 1.0,
            tilt_reverse: false,
        }
    }
}

impl Default for ScrollConfig {
    fn default() -> Self {
        Self {
            duration: 1.7,
            lerp: 0.1,
            wheel_multiplier: 1.0,
            limit: 1080.0,
        }
    }
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self { duration: 8.0 }
    }
}

fn default_fps_cap() -> u32 {
    60
}

impl ScrambleConfig {
    pub fn options(&self) -> ScrambleOptions {
        ScrambleOptions {
            alphabet: self.alphabet.clone(),
            tick_interval: self.tick_interval,
            lock_advance: self.lock_advance,
        }
    }
}

impl TransitionConfig {
    pub fn options(&self) -> TransitionOptions {
        TransitionOptions {
            typing_duration: self.typing_duration,
            delete_duration: self.delete_duration,
            fade_out_duration: self.fade_out_duration,
            ..TransitionOptions::default()
        }
    }
}

impl CursorConfig {
    pub fn icon_offset(&self) -> Vec2 {
        Vec2::new(self.icon_offset[0], self.icon_offset[1])
    }

    pub fn pill_offset(&self) -> Vec2 {
        Vec2::new(self.pill_offset[0], self.pill_offset[1])
    }
}

impl HeroConfig {
    pub fn title_bounds(&self) -> Rect {
        let [x, y, w, h] = self.title_bounds;
        Rect::new(x, y, w, h)
    }
}

impl Config {
    fn path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join("eclipse").join("config.toml"))
    }

    pub fn load() -> Result<Self> {
        Self::load_from(&Self::path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            let config: Config = toml::from_str(&contents)?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        let contents = toml::to_string_pretty(self)?;
        std::fs::write(path, contents)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("nope.toml")).unwrap();
        assert_eq!(config.fps_cap, 60);
        assert_eq!(config.hero.title, "ECLIPSE");
        assert_eq!(config.cursor.smoothing, 0.1);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "fps_cap = 30\n[scramble]\nalphabet = \"01\"\n").unwrap();
        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.fps_cap, 30);
        assert_eq!(config.scramble.alphabet, "01");
        assert_eq!(config.scramble.tick_interval, 0.03);
        assert_eq!(config.transition.delete_duration, 0.05);
    }

    #[test]
    fn saved_config_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("eclipse").join("config.toml");
        let mut config = Config::default();
        config.hero.hover_caption = "hello".to_string();
        config.save_to(&path).unwrap();
        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.hero.hover_caption, "hello");
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "fps_cap = \"fast\"").unwrap();
        assert!(Config::load_from(&path).is_err());
    }
}
