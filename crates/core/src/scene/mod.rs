use serde::{Deserialize, Serialize};

use crate::{
    render::{Canvas, Point},
    tick::{Direction, EnvelopeParams, TickSequence},
    AppConfig, Frame, Result, Segment, SketchReelError, Timeline,
};

fn default_weight() -> f32 {
    25.0
}

/// What a scene draws while it is on screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SceneKind {
    /// Row of vertical bars lit one after another.
    TickBars {
        bars: usize,
        /// Bar height as a fraction of the canvas height.
        height: f32,
        frames_per_tick: Frame,
        #[serde(default)]
        envelope: EnvelopeParams,
        #[serde(default)]
        direction: Direction,
        #[serde(default = "default_weight")]
        weight: f32,
    },
    /// Full-canvas rectangle whose alpha moves linearly from `from` to `to`.
    Fade { length: Frame, from: f32, to: f32 },
    /// Clears the canvas every frame.
    Clear { length: Frame },
}

/// Where a scene lands on the timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Placement {
    Append {
        #[serde(default)]
        offset: i64,
    },
    At {
        start: Frame,
    },
}

impl Default for Placement {
    fn default() -> Self {
        Self::Append { offset: 0 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneDescriptor {
    pub name: String,
    pub kind: SceneKind,
    #[serde(default)]
    pub placement: Placement,
}

impl SceneDescriptor {
    pub fn new(name: impl Into<String>, kind: SceneKind, placement: Placement) -> Self {
        Self {
            name: name.into(),
            kind,
            placement,
        }
    }

    /// Builds the segment that renders this scene onto a canvas.
    pub fn build<C>(&self) -> Result<Segment<C>>
    where
        C: Canvas + 'static,
    {
        let segment = match self.kind {
            SceneKind::TickBars {
                bars,
                height,
                frames_per_tick,
                envelope,
                direction,
                weight,
            } => {
                if bars == 0 {
                    return Err(SketchReelError::invalid_scene(&self.name, "needs at least one bar"));
                }
                if !(height > 0.0 && height <= 1.0) {
                    return Err(SketchReelError::invalid_scene(
                        &self.name,
                        format!("bar height {height} is outside (0, 1]"),
                    ));
                }
                let sequence = TickSequence::new(bars, frames_per_tick, envelope, direction)
                    .map_err(|err| SketchReelError::invalid_scene(&self.name, err.to_string()))?;
                let length = sequence.length();
                Segment::stateful(length, sequence, move |sequence, canvas: &mut C, local| {
                    sequence.step(local);
                    draw_bars(canvas, sequence, height, weight);
                })?
            }
            SceneKind::Fade { length, from, to } => {
                for alpha in [from, to] {
                    if !(0.0..=1.0).contains(&alpha) {
                        return Err(SketchReelError::invalid_scene(
                            &self.name,
                            format!("fade alpha {alpha} is outside [0, 1]"),
                        ));
                    }
                }
                Segment::new(length, move |canvas: &mut C, local| {
                    let t = if length > 1 {
                        local as f32 / (length - 1) as f32
                    } else {
                        1.0
                    };
                    let bounds = canvas.bounds();
                    canvas.rect(
                        Point::default(),
                        bounds.width,
                        bounds.height,
                        from + (to - from) * t,
                    );
                })
                .map_err(|err| SketchReelError::invalid_scene(&self.name, err.to_string()))?
            }
            SceneKind::Clear { length } => Segment::new(length, |canvas: &mut C, _| canvas.clear())
                .map_err(|err| SketchReelError::invalid_scene(&self.name, err.to_string()))?,
        };
        Ok(segment.with_label(self.name.clone()))
    }
}

fn draw_bars<C: Canvas>(canvas: &mut C, sequence: &TickSequence, height: f32, weight: f32) {
    let bounds = canvas.bounds();
    let count = sequence.envelopes().len() as f32;
    let bar_height = bounds.height * height;
    let top = bounds.center().y - bar_height / 2.0;
    for (index, envelope) in sequence.envelopes().iter().enumerate() {
        if envelope.alpha() <= 0.0 {
            continue;
        }
        let x = bounds.width * (index as f32 + 0.5) / count;
        canvas.line(
            Point::new(x, top),
            Point::new(x, top + bar_height),
            weight,
            envelope.alpha(),
        );
    }
}

/// Populates a timeline from the scene list of `config`, in order.
pub fn build_timeline<C>(config: &AppConfig) -> Result<Timeline<C>>
where
    C: Canvas + 'static,
{
    let mut timeline = Timeline::new(config.playback.looping);
    for scene in &config.scenes {
        let segment = scene.build()?;
        match scene.placement {
            Placement::Append { offset } => {
                timeline.append(segment, offset)?;
            }
            Placement::At { start } => timeline.add(segment, start)?,
        }
    }
    tracing::debug!(
        scenes = timeline.len(),
        total_length = timeline.total_length(),
        "built timeline"
    );
    Ok(timeline)
}
