use std::fmt;

use crate::{Frame, Result, SketchReelError};

/// Per-frame behaviour backing a [`Segment`].
///
/// `execute` receives the segment-local frame, which is always in
/// `0..length`. `reset` must restore whatever the behaviour mutates so that
/// the next pass through the window plays exactly like the first one.
pub trait Behavior<C> {
    fn execute(&mut self, ctx: &mut C, local: Frame);

    fn reset(&mut self) {}
}

/// A fixed-length unit of animation driven by a segment-local frame index.
pub struct Segment<C> {
    length: Frame,
    label: Option<String>,
    behavior: Box<dyn Behavior<C>>,
}

impl<C> Segment<C> {
    /// Segment backed by a plain render callback with a no-op reset.
    pub fn new<F>(length: Frame, render: F) -> Result<Self>
    where
        F: FnMut(&mut C, Frame) + 'static,
    {
        Self::from_behavior(length, Callback { render, reset: None::<fn()> })
    }

    /// Segment backed by a render callback plus a separate reset callback.
    pub fn resettable<F, R>(length: Frame, render: F, reset: R) -> Result<Self>
    where
        F: FnMut(&mut C, Frame) + 'static,
        R: FnMut() + 'static,
    {
        Self::from_behavior(
            length,
            Callback {
                render,
                reset: Some(reset),
            },
        )
    }

    /// Segment that owns its progression state.
    ///
    /// The render callback mutates `state` freely; `reset` replaces it with a
    /// clone of `initial`.
    pub fn stateful<S, F>(length: Frame, initial: S, render: F) -> Result<Self>
    where
        S: Clone + 'static,
        F: FnMut(&mut S, &mut C, Frame) + 'static,
    {
        Self::from_behavior(
            length,
            Stateful {
                state: initial.clone(),
                initial,
                render,
            },
        )
    }

    pub fn from_behavior<B>(length: Frame, behavior: B) -> Result<Self>
    where
        B: Behavior<C> + 'static,
    {
        if length == 0 {
            return Err(SketchReelError::ZeroLength);
        }
        Ok(Self {
            length,
            label: None,
            behavior: Box::new(behavior),
        })
    }

    /// Attaches a name that shows up in log output.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn length(&self) -> Frame {
        self.length
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn execute(&mut self, ctx: &mut C, local: Frame) {
        debug_assert!(local < self.length, "local frame {local} out of range");
        self.behavior.execute(ctx, local);
    }

    pub fn reset(&mut self) {
        self.behavior.reset();
    }
}

impl<C> fmt::Debug for Segment<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Segment")
            .field("length", &self.length)
            .field("label", &self.label)
            .finish()
    }
}

struct Callback<F, R> {
    render: F,
    reset: Option<R>,
}

impl<C, F, R> Behavior<C> for Callback<F, R>
where
    F: FnMut(&mut C, Frame),
    R: FnMut(),
{
    fn execute(&mut self, ctx: &mut C, local: Frame) {
        (self.render)(ctx, local);
    }

    fn reset(&mut self) {
        if let Some(reset) = self.reset.as_mut() {
            reset();
        }
    }
}

struct Stateful<S, F> {
    initial: S,
    state: S,
    render: F,
}

impl<C, S, F> Behavior<C> for Stateful<S, F>
where
    S: Clone,
    F: FnMut(&mut S, &mut C, Frame),
{
    fn execute(&mut self, ctx: &mut C, local: Frame) {
        (self.render)(&mut self.state, ctx, local);
    }

    fn reset(&mut self) {
        self.state = self.initial.clone();
    }
}
