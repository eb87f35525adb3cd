use serde::{Deserialize, Serialize};

use crate::{Result, SketchReelError};

/// Frame index on either the global or a segment-local clock.
pub type Frame = u64;

/// Inclusive range of global frames `[start, start + length - 1]` during which
/// a segment is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FrameWindow {
    start: Frame,
    length: Frame,
}

impl FrameWindow {
    pub fn new(start: Frame, length: Frame) -> Result<Self> {
        if length == 0 {
            return Err(SketchReelError::ZeroLength);
        }
        if start.checked_add(length).is_none() {
            return Err(SketchReelError::msg(format!(
                "window starting at frame {start} with {length} frames overflows the frame counter"
            )));
        }
        Ok(Self { start, length })
    }

    pub fn start(&self) -> Frame {
        self.start
    }

    pub fn length(&self) -> Frame {
        self.length
    }

    /// Last frame the window covers.
    pub fn last(&self) -> Frame {
        self.start + self.length - 1
    }

    /// First frame after the window.
    pub fn end(&self) -> Frame {
        self.start + self.length
    }

    pub fn contains(&self, frame: Frame) -> bool {
        frame >= self.start && frame <= self.last()
    }

    /// Converts a global frame into the window's local frame, if it is inside.
    pub fn local(&self, frame: Frame) -> Option<Frame> {
        self.contains(frame).then(|| frame - self.start)
    }

    pub fn is_last(&self, frame: Frame) -> bool {
        frame == self.last()
    }

    /// Frames shared with `other`, or `None` if the windows are disjoint.
    pub fn overlap(&self, other: &FrameWindow) -> Option<FrameWindow> {
        let start = self.start.max(other.start);
        let end = self.end().min(other.end());
        (start < end).then(|| FrameWindow {
            start,
            length: end - start,
        })
    }
}
