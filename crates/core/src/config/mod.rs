use std::{fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::{
    scene::{Placement, SceneDescriptor, SceneKind},
    tick::{Direction, EnvelopeParams},
    Result,
};

/// Top-level configuration structure for the application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub playback: PlaybackConfig,
    #[serde(default)]
    pub canvas: CanvasConfig,
    #[serde(default)]
    pub scenes: Vec<SceneDescriptor>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            playback: PlaybackConfig::default(),
            canvas: CanvasConfig::default(),
            scenes: bar_dance(),
        }
    }
}

impl AppConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let text = serde_json::to_string_pretty(self)?;
        fs::write(path, text)?;
        Ok(())
    }
}

/// How the host drives the timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackConfig {
    pub fps: u32,
    pub looping: bool,
    /// Number of host frames a headless run plays.
    pub frames: u64,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            fps: 60,
            looping: true,
            frames: 600,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanvasConfig {
    pub width: f32,
    pub height: f32,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            width: 1080.0,
            height: 1080.0,
        }
    }
}

/// Bars of growing height, each starting while the previous one still fades.
fn bar_dance() -> Vec<SceneDescriptor> {
    let envelope = EnvelopeParams {
        peak: 2.0,
        attack: 0.5,
        decay: 0.06,
    };
    // Truncated: rows overlap one frame less than the full decay ramp.
    let overlap = -((envelope.peak / envelope.decay) as i64);

    let mut scenes: Vec<SceneDescriptor> = [0.1, 0.2, 0.4, 0.6, 0.8, 1.0]
        .into_iter()
        .enumerate()
        .map(|(index, height)| {
            let direction = if index % 2 == 0 {
                Direction::Forward
            } else {
                Direction::Backward
            };
            let placement = if index == 0 {
                Placement::default()
            } else {
                Placement::Append { offset: overlap }
            };
            SceneDescriptor::new(
                format!("bars-{}", index + 1),
                SceneKind::TickBars {
                    bars: 32,
                    height,
                    frames_per_tick: 2,
                    envelope,
                    direction,
                    weight: 25.0,
                },
                placement,
            )
        })
        .collect();

    scenes.push(SceneDescriptor::new(
        "curtain",
        SceneKind::Fade {
            length: 60,
            from: 0.0,
            to: 1.0,
        },
        Placement::Append { offset: overlap },
    ));
    scenes
}
