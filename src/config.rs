use std::path::Path;
use std::time::Duration;
use std::{env, fs};

use anyhow::Context;
use serde::Deserialize;

use crate::geometry;
use crate::media;
use crate::notch;

/// Optional overrides for the built-in constants. No file is the normal
/// case; nothing is ever written back.
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub window: WindowConfig,
    pub media: MediaConfig,
    pub behavior: BehaviorConfig,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let mut candidates = Vec::new();

        if let Ok(current_dir) = env::current_dir() {
            candidates.push(current_dir.join("notchbar.toml"));
            candidates.push(current_dir.join("config").join("notchbar.toml"));
        }

        if let Ok(exe) = env::current_exe() {
            if let Some(dir) = exe.parent() {
                candidates.push(dir.join("notchbar.toml"));
                candidates.push(dir.join("config").join("notchbar.toml"));
            }
        }

        for path in candidates {
            if path.exists() {
                return Self::load_path(&path);
            }
        }

        Ok(Config::default())
    }

    pub fn load_path(path: &Path) -> anyhow::Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let doc: ConfigDocument = toml::from_str(&data)
            .with_context(|| format!("Failed to parse config: {}", path.display()))?;
        Ok(doc.into())
    }
}

#[derive(Debug, Clone)]
pub struct WindowConfig {
    pub collapsed_width: f32,
    pub collapsed_height: f32,
    pub expanded_width: f32,
    pub expanded_height: f32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            collapsed_width: geometry::COLLAPSED_WIDTH,
            collapsed_height: geometry::COLLAPSED_HEIGHT,
            expanded_width: geometry::EXPANDED_WIDTH,
            expanded_height: geometry::EXPANDED_HEIGHT,
        }
    }
}

impl WindowConfig {
    pub fn collapsed_size(&self) -> (f32, f32) {
        (
            self.collapsed_width.clamp(100.0, 2000.0),
            self.collapsed_height.clamp(8.0, 200.0),
        )
    }

    pub fn expanded_size(&self) -> (f32, f32) {
        (
            self.expanded_width.clamp(200.0, 4000.0),
            self.expanded_height.clamp(100.0, 2000.0),
        )
    }
}

#[derive(Debug, Clone)]
pub struct MediaConfig {
    pub poll_interval_secs: f32,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: media::POLL_INTERVAL.as_secs_f32(),
        }
    }
}

impl MediaConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs_f32(self.poll_interval_secs.clamp(0.5, 60.0))
    }
}

#[derive(Debug, Clone)]
pub struct BehaviorConfig {
    pub grace_delay_ms: u64,
    pub animation_ms: u64,
    pub indicator_hide_secs: u64,
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        Self {
            grace_delay_ms: notch::GRACE_DELAY.as_millis() as u64,
            animation_ms: notch::ANIMATION_DURATION.as_millis() as u64,
            indicator_hide_secs: notch::INDICATOR_HIDE_INTERVAL.as_secs(),
        }
    }
}

impl BehaviorConfig {
    pub fn grace_delay(&self) -> Duration {
        Duration::from_millis(self.grace_delay_ms.min(5_000))
    }

    pub fn animation_duration(&self) -> Duration {
        Duration::from_millis(self.animation_ms.min(2_000))
    }

    pub fn indicator_hide_interval(&self) -> Duration {
        Duration::from_secs(self.indicator_hide_secs.clamp(1, 3_600))
    }
}

#[derive(Debug, Default, Deserialize)]
struct ConfigDocument {
    #[serde(default)]
    window: WindowSection,
    #[serde(default)]
    media: MediaSection,
    #[serde(default)]
    behavior: BehaviorSection,
}

impl From<ConfigDocument> for Config {
    fn from(value: ConfigDocument) -> Self {
        let defaults = Config::default();
        let window = WindowConfig {
            collapsed_width: value
                .window
                .collapsed_width
                .unwrap_or(defaults.window.collapsed_width),
            collapsed_height: value
                .window
                .collapsed_height
                .unwrap_or(defaults.window.collapsed_height),
            expanded_width: value
                .window
                .expanded_width
                .unwrap_or(defaults.window.expanded_width),
            expanded_height: value
                .window
                .expanded_height
                .unwrap_or(defaults.window.expanded_height),
        };
        let media = MediaConfig {
            poll_interval_secs: value
                .media
                .poll_interval_secs
                .unwrap_or(defaults.media.poll_interval_secs),
        };
        let behavior = BehaviorConfig {
            grace_delay_ms: value
                .behavior
                .grace_delay_ms
                .unwrap_or(defaults.behavior.grace_delay_ms),
            animation_ms: value
                .behavior
                .animation_ms
                .unwrap_or(defaults.behavior.animation_ms),
            indicator_hide_secs: value
                .behavior
                .indicator_hide_secs
                .unwrap_or(defaults.behavior.indicator_hide_secs),
        };

        Config {
            window,
            media,
            behavior,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct WindowSection {
    collapsed_width: Option<f32>,
    collapsed_height: Option<f32>,
    expanded_width: Option<f32>,
    expanded_height: Option<f32>,
}

#[derive(Debug, Default, Deserialize)]
struct MediaSection {
    poll_interval_secs: Option<f32>,
}

#[derive(Debug, Default, Deserialize)]
struct BehaviorSection {
    grace_delay_ms: Option<u64>,
    animation_ms: Option<u64>,
    indicator_hide_secs: Option<u64>,
}
