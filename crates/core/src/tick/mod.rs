//! Attack/decay envelopes triggered one unit at a time.
//!
//! A tick sequence walks over a row of units, triggering the next one every
//! `frames_per_tick` frames. Each triggered unit ramps its alpha up to `peak`
//! and then fades back out, so a sequence segment has to stay on screen until
//! the last unit has fully decayed.

use serde::{Deserialize, Serialize};

use crate::{Frame, Result, SketchReelError};

/// Longest attack or decay ramp accepted, in frames.
pub const MAX_RAMP_FRAMES: Frame = 1 << 32;

/// Shape of a single attack/decay envelope, in alpha units per frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnvelopeParams {
    pub peak: f32,
    pub attack: f32,
    pub decay: f32,
}

impl Default for EnvelopeParams {
    fn default() -> Self {
        Self {
            peak: 1.0,
            attack: 0.5,
            decay: 0.01,
        }
    }
}

impl EnvelopeParams {
    pub fn validate(&self) -> Result<()> {
        if !(self.peak > 0.0) {
            return Err(SketchReelError::InvalidEnvelope("peak must be positive"));
        }
        if !(self.attack > 0.0) {
            return Err(SketchReelError::InvalidEnvelope("attack must be positive"));
        }
        if !(self.decay > 0.0) {
            return Err(SketchReelError::InvalidEnvelope("decay must be positive"));
        }
        if !ramp_in_range(self.peak / self.attack) {
            return Err(SketchReelError::InvalidEnvelope("attack ramp is too long"));
        }
        if !ramp_in_range(self.peak / self.decay) {
            return Err(SketchReelError::InvalidEnvelope("decay ramp is too long"));
        }
        Ok(())
    }

    /// Frames needed to ramp from zero to `peak`.
    pub fn attack_frames(&self) -> Frame {
        (self.peak / self.attack).ceil() as Frame
    }

    /// Frames needed to fade from `peak` back to zero.
    pub fn decay_frames(&self) -> Frame {
        (self.peak / self.decay).ceil() as Frame
    }
}

fn ramp_in_range(frames: f32) -> bool {
    frames.is_finite() && frames.ceil() <= MAX_RAMP_FRAMES as f32
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnvelopeStage {
    Idle,
    Attack,
    Decay,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    params: EnvelopeParams,
    stage: EnvelopeStage,
    alpha: f32,
}

impl Envelope {
    pub fn new(params: EnvelopeParams) -> Result<Self> {
        params.validate()?;
        Ok(Self {
            params,
            stage: EnvelopeStage::Idle,
            alpha: 0.0,
        })
    }

    pub fn trigger(&mut self) {
        self.stage = EnvelopeStage::Attack;
    }

    /// Advances the envelope by one frame.
    pub fn update(&mut self) {
        match self.stage {
            EnvelopeStage::Idle => {}
            EnvelopeStage::Attack => {
                self.alpha += self.params.attack;
                if self.alpha >= self.params.peak {
                    self.alpha = self.params.peak;
                    self.stage = EnvelopeStage::Decay;
                }
            }
            EnvelopeStage::Decay => {
                self.alpha = (self.alpha - self.params.decay).max(0.0);
                if self.alpha == 0.0 {
                    self.stage = EnvelopeStage::Idle;
                }
            }
        }
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    pub fn stage(&self) -> EnvelopeStage {
        self.stage
    }

    pub fn reset(&mut self) {
        self.stage = EnvelopeStage::Idle;
        self.alpha = 0.0;
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Forward,
    Backward,
}

/// Index that walks over `0..len` once, in either direction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickPointer {
    len: usize,
    direction: Direction,
    initial: Option<usize>,
    next: Option<usize>,
}

impl TickPointer {
    pub fn new(len: usize, direction: Direction) -> Self {
        let initial = match (len, direction) {
            (0, _) => None,
            (_, Direction::Forward) => Some(0),
            (len, Direction::Backward) => Some(len - 1),
        };
        Self {
            len,
            direction,
            initial,
            next: initial,
        }
    }

    /// Returns the current index and moves one step, or `None` once every
    /// index has been visited.
    pub fn advance(&mut self) -> Option<usize> {
        let current = self.next?;
        let len = self.len;
        self.next = match self.direction {
            Direction::Forward => Some(current + 1).filter(|next| *next < len),
            Direction::Backward => current.checked_sub(1),
        };
        Some(current)
    }

    pub fn is_exhausted(&self) -> bool {
        self.next.is_none()
    }

    pub fn reset(&mut self) {
        self.next = self.initial;
    }
}

/// Length in frames of a segment that ticks `ticks` units and waits for the
/// last one to rise and fade.
pub fn tick_segment_length(
    ticks: usize,
    frames_per_tick: Frame,
    params: &EnvelopeParams,
) -> Result<Frame> {
    params.validate()?;
    if frames_per_tick == 0 {
        return Err(SketchReelError::msg("frames per tick must be at least one"));
    }
    Frame::try_from(ticks)
        .ok()
        .and_then(|ticks| frames_per_tick.checked_mul(ticks))
        .and_then(|frames| frames.checked_add(params.attack_frames()))
        .and_then(|frames| frames.checked_add(params.decay_frames()))
        .ok_or_else(|| SketchReelError::msg("tick segment length overflows"))
}

/// Row of envelopes triggered in turn by a [`TickPointer`].
#[derive(Debug, Clone, PartialEq)]
pub struct TickSequence {
    frames_per_tick: Frame,
    length: Frame,
    pointer: TickPointer,
    envelopes: Vec<Envelope>,
}

impl TickSequence {
    pub fn new(
        units: usize,
        frames_per_tick: Frame,
        params: EnvelopeParams,
        direction: Direction,
    ) -> Result<Self> {
        let length = tick_segment_length(units, frames_per_tick, &params)?;
        let envelope = Envelope::new(params)?;
        Ok(Self {
            frames_per_tick,
            length,
            pointer: TickPointer::new(units, direction),
            envelopes: vec![envelope; units],
        })
    }

    pub fn length(&self) -> Frame {
        self.length
    }

    /// Triggers the next unit on tick frames, then advances every envelope.
    pub fn step(&mut self, local: Frame) {
        if local % self.frames_per_tick == 0 {
            if let Some(index) = self.pointer.advance() {
                self.envelopes[index].trigger();
            }
        }
        for envelope in &mut self.envelopes {
            envelope.update();
        }
    }

    pub fn envelopes(&self) -> &[Envelope] {
        &self.envelopes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> EnvelopeParams {
        EnvelopeParams {
            peak: 1.0,
            attack: 0.5,
            decay: 0.25,
        }
    }

    #[test]
    fn envelope_rises_then_fades() {
        let mut envelope = Envelope::new(params()).unwrap();
        envelope.update();
        assert_eq!(envelope.alpha(), 0.0);

        envelope.trigger();
        let mut alphas = Vec::new();
        for _ in 0..7 {
            envelope.update();
            alphas.push(envelope.alpha());
        }
        assert_eq!(alphas, vec![0.5, 1.0, 0.75, 0.5, 0.25, 0.0, 0.0]);
        assert_eq!(envelope.stage(), EnvelopeStage::Idle);
    }

    #[test]
    fn envelope_reset_clears_alpha() {
        let mut envelope = Envelope::new(params()).unwrap();
        envelope.trigger();
        envelope.update();
        envelope.reset();
        assert_eq!(envelope.alpha(), 0.0);
        assert_eq!(envelope.stage(), EnvelopeStage::Idle);
    }

    #[test]
    fn rejects_non_positive_rates() {
        let zero_decay = EnvelopeParams {
            decay: 0.0,
            ..params()
        };
        assert!(matches!(
            Envelope::new(zero_decay),
            Err(SketchReelError::InvalidEnvelope(_))
        ));
        let nan_attack = EnvelopeParams {
            attack: f32::NAN,
            ..params()
        };
        assert!(nan_attack.validate().is_err());
    }

    #[test]
    fn pointer_walks_forward_and_backward() {
        let mut forward = TickPointer::new(3, Direction::Forward);
        let visited: Vec<_> = std::iter::from_fn(|| forward.advance()).collect();
        assert_eq!(visited, vec![0, 1, 2]);
        assert!(forward.is_exhausted());

        let mut backward = TickPointer::new(3, Direction::Backward);
        let visited: Vec<_> = std::iter::from_fn(|| backward.advance()).collect();
        assert_eq!(visited, vec![2, 1, 0]);
    }

    #[test]
    fn pointer_reset_returns_to_start() {
        let mut pointer = TickPointer::new(4, Direction::Backward);
        pointer.advance();
        pointer.advance();
        pointer.reset();
        assert_eq!(pointer.advance(), Some(3));

        let mut empty = TickPointer::new(0, Direction::Forward);
        assert_eq!(empty.advance(), None);
    }

    #[test]
    fn segment_length_covers_attack_and_decay() {
        assert_eq!(tick_segment_length(4, 2, &params()).unwrap(), 14);
        assert!(tick_segment_length(4, 0, &params()).is_err());
    }

    #[test]
    fn rejects_ramps_that_never_settle() {
        let glacial = EnvelopeParams {
            peak: 1.0,
            attack: 1e-30,
            decay: 1e-30,
        };
        assert!(matches!(
            glacial.validate(),
            Err(SketchReelError::InvalidEnvelope(_))
        ));
        assert!(tick_segment_length(4, 2, &glacial).is_err());
        assert!(TickSequence::new(4, 2, glacial, Direction::Forward).is_err());
    }

    #[test]
    fn rejects_lengths_past_the_frame_counter() {
        let err = tick_segment_length(4, i64::MAX as Frame, &params()).unwrap_err();
        assert!(err.to_string().contains("overflows"));

        let err = tick_segment_length(1, Frame::MAX, &params()).unwrap_err();
        assert!(err.to_string().contains("overflows"));
    }

    #[test]
    fn sequence_settles_by_its_last_frame() {
        let mut sequence = TickSequence::new(4, 2, params(), Direction::Forward).unwrap();
        assert_eq!(sequence.length(), 14);

        sequence.step(0);
        assert_eq!(sequence.envelopes()[0].alpha(), 0.5);
        assert_eq!(sequence.envelopes()[1].alpha(), 0.0);

        for local in 1..sequence.length() {
            sequence.step(local);
        }
        assert!(sequence.envelopes().iter().all(|e| e.alpha() == 0.0));
    }
}
