use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::{Behavior, Frame, FrameWindow, Result, Segment, SketchReelError};

/// Host-side frame counter. The render loop calls [`FrameClock::tick`] once
/// per rendered frame and hands the result to [`Timeline::play`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameClock {
    frame: Frame,
    fps: u32,
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new(60)
    }
}

impl FrameClock {
    pub fn new(fps: u32) -> Self {
        Self { frame: 0, fps }
    }

    /// Returns the current frame and advances the counter.
    pub fn tick(&mut self) -> Frame {
        let frame = self.frame;
        self.frame += 1;
        frame
    }

    pub fn frame(&self) -> Frame {
        self.frame
    }

    pub fn fps(&self) -> u32 {
        self.fps
    }

    pub fn seconds(&self) -> f32 {
        if self.fps == 0 {
            return 0.0;
        }
        self.frame as f32 / self.fps as f32
    }

    pub fn reset(&mut self) {
        self.frame = 0;
    }
}

/// What happened during a single [`Timeline::play`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tick {
    /// Global frame handed in by the host.
    pub frame: Frame,
    /// Frame on the timeline's own clock after loop wraparound.
    pub effective: Frame,
    /// Number of completed loop passes before this tick. Always 0 when not looping.
    pub pass: u64,
    /// Segments whose window contained the effective frame.
    pub executed: usize,
    /// Whether the completion callback ran on this tick.
    pub finished: bool,
}

struct Placed<C> {
    segment: Segment<C>,
    window: FrameWindow,
}

/// Ordered collection of segments anchored on a single frame-indexed clock.
///
/// Segments execute in placement order on every tick, so overlapping
/// windows always render in the same order.
pub struct Timeline<C> {
    placed: Vec<Placed<C>>,
    total_length: Frame,
    looping: bool,
}

impl<C> Default for Timeline<C> {
    fn default() -> Self {
        Self::new(true)
    }
}

impl<C> Timeline<C> {
    pub fn new(looping: bool) -> Self {
        Self {
            placed: Vec::new(),
            total_length: 0,
            looping,
        }
    }

    pub fn is_looping(&self) -> bool {
        self.looping
    }

    pub fn set_looping(&mut self, looping: bool) {
        self.looping = looping;
    }

    pub fn len(&self) -> usize {
        self.placed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.placed.is_empty()
    }

    /// Largest end frame over all placed segments, 0 while empty.
    pub fn total_length(&self) -> Frame {
        self.total_length
    }

    pub fn window(&self, index: usize) -> Option<FrameWindow> {
        self.placed.get(index).map(|placed| placed.window)
    }

    /// Windows in placement order.
    pub fn windows(&self) -> impl Iterator<Item = FrameWindow> + '_ {
        self.placed.iter().map(|placed| placed.window)
    }

    pub fn segment(&self, index: usize) -> Option<&Segment<C>> {
        self.placed.get(index).map(|placed| &placed.segment)
    }

    /// Places `segment` right after the most recently placed one, shifted by
    /// `offset` frames. A negative offset overlaps the previous segment, a
    /// positive one leaves a gap. Returns the computed start frame.
    pub fn append(&mut self, segment: Segment<C>, offset: i64) -> Result<Frame> {
        let start = match self.placed.last() {
            Some(previous) => {
                let start = i128::from(previous.window.end()) + i128::from(offset);
                Frame::try_from(start).map_err(|_| SketchReelError::StartBeforeOrigin(start))?
            }
            None => 0,
        };
        self.add(segment, start)?;
        Ok(start)
    }

    /// Places `segment` at an explicit start frame, independent of the others.
    pub fn add(&mut self, segment: Segment<C>, start: Frame) -> Result<()> {
        let window = FrameWindow::new(start, segment.length())?;
        debug!(
            label = segment.label(),
            start,
            last = window.last(),
            "placed segment"
        );
        self.placed.push(Placed { segment, window });
        self.update_total_length();
        Ok(())
    }

    pub fn play(&mut self, frame: Frame, ctx: &mut C) -> Result<Tick> {
        self.play_with(frame, ctx, || {})
    }

    /// Advances the timeline to the global `frame`.
    ///
    /// Without looping, `on_finish` runs when `frame` equals the total length,
    /// the first frame after every segment has ended. With looping it runs on
    /// the first frame of every pass after the first one.
    pub fn play_with<F>(&mut self, frame: Frame, ctx: &mut C, on_finish: F) -> Result<Tick>
    where
        F: FnOnce(),
    {
        if self.placed.is_empty() {
            return Err(SketchReelError::EmptyTimeline);
        }

        let (effective, pass) = if self.looping {
            (frame % self.total_length, frame / self.total_length)
        } else {
            (frame, 0)
        };

        let executed = self.dispatch(effective, ctx);

        let finished = if self.looping {
            pass > 0 && effective == 0
        } else {
            effective == self.total_length
        };
        if finished {
            debug!(frame, pass, "timeline finished");
            on_finish();
        }

        Ok(Tick {
            frame,
            effective,
            pass,
            executed,
            finished,
        })
    }

    /// Turns the timeline into a single segment spanning its total length.
    /// The inner timeline is driven by the segment's local frame and never
    /// loops on its own.
    pub fn into_segment(self) -> Result<Segment<C>>
    where
        C: 'static,
    {
        if self.placed.is_empty() {
            return Err(SketchReelError::EmptyTimeline);
        }
        let length = self.total_length;
        Segment::from_behavior(length, Compound { inner: self })
    }

    fn dispatch(&mut self, effective: Frame, ctx: &mut C) -> usize {
        let mut executed = 0;
        for placed in &mut self.placed {
            let Some(local) = placed.window.local(effective) else {
                continue;
            };
            trace!(label = placed.segment.label(), effective, local, "execute");
            placed.segment.execute(ctx, local);
            executed += 1;

            if placed.window.is_last(effective) {
                debug!(label = placed.segment.label(), effective, "reset");
                placed.segment.reset();
            }
        }
        executed
    }

    fn update_total_length(&mut self) {
        self.total_length = self
            .placed
            .iter()
            .map(|placed| placed.window.end())
            .max()
            .unwrap_or(0);
    }
}

impl<C> std::fmt::Debug for Timeline<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Timeline")
            .field("segments", &self.placed.len())
            .field("total_length", &self.total_length)
            .field("looping", &self.looping)
            .finish()
    }
}

struct Compound<C> {
    inner: Timeline<C>,
}

impl<C> Behavior<C> for Compound<C> {
    fn execute(&mut self, ctx: &mut C, local: Frame) {
        self.inner.dispatch(local, ctx);
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, rc::Rc};

    use super::*;

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Event {
        Execute(&'static str, Frame),
        Reset(&'static str),
    }

    type Log = Rc<RefCell<Vec<Event>>>;

    fn logged(name: &'static str, length: Frame, log: &Log) -> Segment<()> {
        let executions = log.clone();
        let resets = log.clone();
        Segment::<()>::resettable(
            length,
            move |_, frame| executions.borrow_mut().push(Event::Execute(name, frame)),
            move || resets.borrow_mut().push(Event::Reset(name)),
        )
        .unwrap()
        .with_label(name)
    }

    fn drain(log: &Log) -> Vec<Event> {
        log.borrow_mut().drain(..).collect()
    }

    #[test]
    fn append_places_segments_back_to_back() {
        let log = Log::default();
        let mut timeline = Timeline::new(false);
        let lengths = [4, 7, 1, 12];
        let mut expected_start = 0;
        for length in lengths {
            let start = timeline.append(logged("s", length, &log), 0).unwrap();
            assert_eq!(start, expected_start);
            expected_start += length;
        }
        assert_eq!(timeline.total_length(), lengths.iter().sum::<Frame>());
        let starts: Vec<Frame> = timeline.windows().map(|w| w.start()).collect();
        assert_eq!(starts, vec![0, 4, 11, 12]);
    }

    #[test]
    fn first_append_ignores_offset() {
        let log = Log::default();
        let mut timeline = Timeline::new(false);
        assert_eq!(timeline.append(logged("a", 3, &log), 5).unwrap(), 0);
    }

    #[test]
    fn negative_offset_overlaps_previous_segment() {
        let log = Log::default();
        let mut timeline = Timeline::new(false);
        timeline.add(logged("a", 10, &log), 0).unwrap();
        let start = timeline.append(logged("b", 10, &log), -4).unwrap();

        assert_eq!(start, 6);
        assert_eq!(timeline.total_length(), 16);

        for frame in 6..=9 {
            let tick = timeline.play(frame, &mut ()).unwrap();
            assert_eq!(tick.executed, 2, "frame {frame}");
        }
    }

    #[test]
    fn overlapping_segments_run_in_placement_order() {
        let log = Log::default();
        let mut timeline = Timeline::new(false);
        timeline.add(logged("a", 10, &log), 0).unwrap();
        timeline.append(logged("b", 10, &log), -4).unwrap();

        timeline.play(7, &mut ()).unwrap();
        assert_eq!(
            drain(&log),
            vec![Event::Execute("a", 7), Event::Execute("b", 1)]
        );
    }

    #[test]
    fn explicit_placement_keeps_insertion_order() {
        let log = Log::default();
        let mut timeline = Timeline::new(false);
        timeline.add(logged("late", 5, &log), 20).unwrap();
        timeline.add(logged("early", 30, &log), 0).unwrap();
        assert_eq!(timeline.total_length(), 30);

        timeline.play(22, &mut ()).unwrap();
        assert_eq!(
            drain(&log),
            vec![Event::Execute("late", 2), Event::Execute("early", 22)]
        );
    }

    #[test]
    fn positive_offset_leaves_a_gap() {
        let log = Log::default();
        let mut timeline = Timeline::new(false);
        timeline.append(logged("a", 5, &log), 0).unwrap();
        let start = timeline.append(logged("b", 5, &log), 3).unwrap();
        assert_eq!(start, 8);
        assert_eq!(timeline.total_length(), 13);

        for frame in 5..8 {
            assert_eq!(timeline.play(frame, &mut ()).unwrap().executed, 0);
        }
        assert!(drain(&log).is_empty());
    }

    #[test]
    fn append_follows_last_placed_segment() {
        let log = Log::default();
        let mut timeline = Timeline::new(false);
        timeline.add(logged("long", 50, &log), 0).unwrap();
        timeline.add(logged("short", 5, &log), 10).unwrap();
        assert_eq!(timeline.append(logged("next", 5, &log), 0).unwrap(), 15);
        assert_eq!(timeline.total_length(), 50);
    }

    #[test]
    fn rejects_start_before_origin() {
        let log = Log::default();
        let mut timeline = Timeline::new(false);
        timeline.append(logged("a", 5, &log), 0).unwrap();
        let err = timeline.append(logged("b", 5, &log), -10).unwrap_err();
        assert!(matches!(err, SketchReelError::StartBeforeOrigin(-5)));
        assert_eq!(timeline.len(), 1);
    }

    #[test]
    fn overflowing_placement_places_nothing() {
        let log = Log::default();
        let mut timeline = Timeline::new(false);
        timeline.add(logged("a", 5, &log), 0).unwrap();

        assert!(timeline.add(logged("b", 2, &log), Frame::MAX).is_err());
        assert_eq!(timeline.len(), 1);
        assert_eq!(timeline.total_length(), 5);
    }

    #[test]
    fn sequential_scenario() {
        let log = Log::default();
        let mut timeline = Timeline::new(false);
        timeline.add(logged("a", 10, &log), 0).unwrap();
        let start = timeline.append(logged("b", 5, &log), 0).unwrap();
        assert_eq!(start, 10);
        assert_eq!(timeline.total_length(), 15);

        timeline.play(9, &mut ()).unwrap();
        assert_eq!(
            drain(&log),
            vec![Event::Execute("a", 9), Event::Reset("a")]
        );

        timeline.play(10, &mut ()).unwrap();
        assert_eq!(drain(&log), vec![Event::Execute("b", 0)]);

        timeline.play(14, &mut ()).unwrap();
        assert_eq!(
            drain(&log),
            vec![Event::Execute("b", 4), Event::Reset("b")]
        );
    }

    #[test]
    fn looping_wraps_total_length_to_zero() {
        let log = Log::default();
        let mut timeline = Timeline::new(true);
        timeline.add(logged("a", 10, &log), 0).unwrap();
        timeline.append(logged("b", 5, &log), -2).unwrap();
        let total = timeline.total_length();

        let first = timeline.play(0, &mut ()).unwrap();
        let at_zero = drain(&log);
        let wrapped = timeline.play(total, &mut ()).unwrap();
        let at_total = drain(&log);

        assert_eq!(at_zero, at_total);
        assert_eq!(first.effective, wrapped.effective);
        assert_eq!(wrapped.pass, 1);
    }

    #[test]
    fn resets_once_per_pass_after_last_frame() {
        let log = Log::default();
        let mut timeline = Timeline::new(true);
        timeline.add(logged("a", 4, &log), 0).unwrap();
        timeline.append(logged("b", 3, &log), -1).unwrap();
        let total = timeline.total_length();

        for frame in 0..total * 3 {
            timeline.play(frame, &mut ()).unwrap();
        }
        let events = drain(&log);

        for (name, last) in [("a", 3), ("b", 2)] {
            let resets: Vec<usize> = events
                .iter()
                .enumerate()
                .filter(|(_, e)| **e == Event::Reset(name))
                .map(|(i, _)| i)
                .collect();
            assert_eq!(resets.len(), 3, "{name}");
            for index in resets {
                assert_eq!(events[index - 1], Event::Execute(name, last));
            }
        }
    }

    #[test]
    fn local_frames_stay_in_bounds() {
        let lengths: [Frame; 4] = [7, 3, 11, 1];
        let mut timeline: Timeline<Vec<(usize, Frame)>> = Timeline::new(true);
        for (index, length) in lengths.iter().copied().enumerate() {
            let segment =
                Segment::new(length, move |out: &mut Vec<(usize, Frame)>, frame| {
                    out.push((index, frame))
                })
                .unwrap();
            let offset = if index % 2 == 0 { -2 } else { 4 };
            timeline.append(segment, offset).unwrap();
        }
        let parallel =
            Segment::new(9, |out: &mut Vec<(usize, Frame)>, frame| out.push((9, frame))).unwrap();
        timeline.add(parallel, 5).unwrap();

        let mut calls = Vec::new();
        for frame in 0..500 {
            timeline.play(frame, &mut calls).unwrap();
        }

        assert!(!calls.is_empty());
        for (index, local) in calls {
            let length = lengths.get(index).copied().unwrap_or(9);
            assert!(local < length, "segment {index} got local frame {local}");
        }
    }

    #[test]
    fn empty_timeline_cannot_play() {
        let mut timeline: Timeline<()> = Timeline::new(false);
        assert_eq!(timeline.total_length(), 0);
        assert!(matches!(
            timeline.play(0, &mut ()),
            Err(SketchReelError::EmptyTimeline)
        ));
    }

    #[test]
    fn finishes_once_after_last_frame_without_looping() {
        let log = Log::default();
        let mut timeline = Timeline::new(false);
        timeline.append(logged("a", 5, &log), 0).unwrap();

        let mut finishes = 0;
        for frame in 0..20 {
            let tick = timeline.play_with(frame, &mut (), || finishes += 1).unwrap();
            assert_eq!(tick.finished, frame == 5);
            if frame >= 5 {
                assert_eq!(tick.executed, 0);
            }
        }
        assert_eq!(finishes, 1);
    }

    #[test]
    fn finishes_every_completed_pass_when_looping() {
        let log = Log::default();
        let mut timeline = Timeline::new(true);
        timeline.append(logged("a", 5, &log), 0).unwrap();

        let mut finished_at = Vec::new();
        for frame in 0..16 {
            let tick = timeline.play_with(frame, &mut (), || finished_at.push(frame)).unwrap();
            assert_eq!(tick.executed, 1);
        }
        assert_eq!(finished_at, vec![5, 10, 15]);
    }

    #[test]
    fn compound_segment_drives_inner_timeline() {
        let log = Log::default();
        let mut inner = Timeline::new(true);
        inner.append(logged("x", 3, &log), 0).unwrap();
        inner.append(logged("y", 2, &log), 0).unwrap();
        let compound = inner.into_segment().unwrap();
        assert_eq!(compound.length(), 5);

        let mut outer = Timeline::new(false);
        outer.append(logged("intro", 2, &log), 0).unwrap();
        assert_eq!(outer.append(compound, 0).unwrap(), 2);
        assert_eq!(outer.total_length(), 7);

        outer.play(2, &mut ()).unwrap();
        assert_eq!(drain(&log), vec![Event::Execute("x", 0)]);
        outer.play(5, &mut ()).unwrap();
        assert_eq!(drain(&log), vec![Event::Execute("y", 0)]);
        outer.play(6, &mut ()).unwrap();
        assert_eq!(
            drain(&log),
            vec![Event::Execute("y", 1), Event::Reset("y")]
        );
    }

    #[test]
    fn empty_timeline_is_not_a_segment() {
        let timeline: Timeline<()> = Timeline::new(false);
        assert!(matches!(
            timeline.into_segment(),
            Err(SketchReelError::EmptyTimeline)
        ));
    }

    #[test]
    fn clock_counts_frames() {
        let mut clock = FrameClock::new(30);
        assert_eq!(clock.tick(), 0);
        assert_eq!(clock.tick(), 1);
        assert_eq!(clock.frame(), 2);
        for _ in 0..28 {
            clock.tick();
        }
        assert!((clock.seconds() - 1.0).abs() < f32::EPSILON);
        clock.reset();
        assert_eq!(clock.frame(), 0);
    }
}
