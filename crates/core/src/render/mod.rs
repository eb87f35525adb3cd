use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub width: f32,
    pub height: f32,
}

impl Bounds {
    pub fn center(&self) -> Point {
        Point::new(self.width / 2.0, self.height / 2.0)
    }
}

/// Single draw call issued by a segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum DrawCommand {
    Clear,
    Line {
        from: Point,
        to: Point,
        weight: f32,
        alpha: f32,
    },
    Rect {
        origin: Point,
        width: f32,
        height: f32,
        alpha: f32,
    },
}

/// Drawing surface handed through the timeline to segment callbacks.
///
/// Segments are expected to set every bit of state they need on each call;
/// nothing carries over from whichever segment drew before them.
pub trait Canvas {
    fn bounds(&self) -> Bounds;

    fn clear(&mut self);

    fn line(&mut self, from: Point, to: Point, weight: f32, alpha: f32);

    fn rect(&mut self, origin: Point, width: f32, height: f32, alpha: f32);
}

/// Headless canvas that keeps the draw calls of the current frame.
#[derive(Debug, Clone)]
pub struct RecordingCanvas {
    bounds: Bounds,
    commands: Vec<DrawCommand>,
}

impl RecordingCanvas {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            bounds: Bounds { width, height },
            commands: Vec::new(),
        }
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// Hands out the recorded commands and starts an empty frame.
    pub fn take_commands(&mut self) -> Vec<DrawCommand> {
        std::mem::take(&mut self.commands)
    }
}

impl Canvas for RecordingCanvas {
    fn bounds(&self) -> Bounds {
        self.bounds
    }

    fn clear(&mut self) {
        self.commands.push(DrawCommand::Clear);
    }

    fn line(&mut self, from: Point, to: Point, weight: f32, alpha: f32) {
        self.commands.push(DrawCommand::Line {
            from,
            to,
            weight,
            alpha,
        });
    }

    fn rect(&mut self, origin: Point, width: f32, height: f32, alpha: f32) {
        self.commands.push(DrawCommand::Rect {
            origin,
            width,
            height,
            alpha,
        });
    }
}
