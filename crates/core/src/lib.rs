//! Core library for sketchreel.
//!
//! A [`Timeline`] maps the host's ever-increasing frame counter onto a set of
//! fixed-length [`Segment`]s, each anchored at its own start frame. Segments
//! may overlap, leave gaps, or nest whole timelines; the timeline handles
//! looping and resets each segment after its last frame so the next pass
//! starts clean. The remaining modules are the supporting pieces a headless
//! sketch host needs: tick envelopes, a recording canvas, JSON scene
//! descriptions and frame recording.

pub mod config;
pub mod error;
pub mod record;
pub mod render;
pub mod scene;
pub mod segment;
pub mod tick;
pub mod timeline;
pub mod window;

pub use config::{AppConfig, CanvasConfig, PlaybackConfig};
pub use error::{Result, SketchReelError};
pub use record::{FrameRecord, Recorder, RecordingSettings};
pub use render::{Canvas, DrawCommand, RecordingCanvas};
pub use scene::{build_timeline, Placement, SceneDescriptor, SceneKind};
pub use segment::{Behavior, Segment};
pub use tick::{Direction, Envelope, EnvelopeParams, TickPointer, TickSequence};
pub use timeline::{FrameClock, Tick, Timeline};
pub use window::{Frame, FrameWindow};
