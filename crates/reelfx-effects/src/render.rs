//! Video timeline fold: sample output frames, remap time through Speed
//! Control stages, and run the prepared chain on every frame.

use crate::chain::PreparedChain;
use rand::Rng;
use reelfx_core::{Frame, FrameRate, FxError, Result};
use tracing::{debug, info};

/// Tolerance when comparing frame timestamps.
const TIME_EPSILON: f64 = 1e-9;

/// Decoded frames of a clip, fetched by time.
pub trait FrameSource {
    fn frame_rate(&self) -> FrameRate;

    /// Clip duration in seconds.
    fn duration(&self) -> f64;

    /// The latest frame whose timestamp is at or before `time`.
    ///
    /// Callers ask for non-decreasing times; sources may only move forward.
    fn frame_at(&mut self, time: f64) -> Result<&Frame>;
}

/// Destination for rendered frames, in presentation order.
pub trait FrameSink {
    fn write_frame(&mut self, frame: Frame) -> Result<()>;
}

impl FrameSink for Vec<Frame> {
    fn write_frame(&mut self, frame: Frame) -> Result<()> {
        self.push(frame);
        Ok(())
    }
}

/// [`FrameSource`] over a forward-only iterator of frames at a constant
/// rate, such as a decoder's output.
pub struct SequentialSource<I> {
    frames: I,
    frame_rate: FrameRate,
    duration: f64,
    /// Index of `current` in the stream.
    index: u64,
    current: Option<Frame>,
    exhausted: bool,
}

impl<I> SequentialSource<I>
where
    I: Iterator<Item = Result<Frame>>,
{
    pub fn new(frames: I, frame_rate: FrameRate, duration: f64) -> Self {
        Self {
            frames,
            frame_rate,
            duration,
            index: 0,
            current: None,
            exhausted: false,
        }
    }

    fn pull(&mut self) -> Result<Option<Frame>> {
        if self.exhausted {
            return Ok(None);
        }
        let next = self.frames.next().transpose()?;
        if next.is_none() {
            self.exhausted = true;
        }
        Ok(next)
    }
}

impl<I> FrameSource for SequentialSource<I>
where
    I: Iterator<Item = Result<Frame>>,
{
    fn frame_rate(&self) -> FrameRate {
        self.frame_rate
    }

    fn duration(&self) -> f64 {
        self.duration
    }

    fn frame_at(&mut self, time: f64) -> Result<&Frame> {
        if self.current.is_none() {
            self.current = self.pull()?;
            self.index = 0;
        }
        // Advance while the following frame is due. Past the end of the
        // stream the last frame is held.
        while self.frame_rate.frame_time(self.index + 1) <= time + TIME_EPSILON {
            match self.pull()? {
                Some(frame) => {
                    self.current = Some(frame);
                    self.index += 1;
                }
                None => break,
            }
        }
        self.current
            .as_ref()
            .ok_or_else(|| FxError::Decode("video has no frames".into()))
    }
}

/// Durations of the clip between chain stages.
///
/// Stage `0` is the source. Effect `i` reads stage `i` and writes stage
/// `i + 1`; Speed Control with factor `f` divides the duration by `f` and
/// every other effect keeps it.
#[derive(Debug, Clone, PartialEq)]
pub struct Timeline {
    durations: Vec<f64>,
    speeds: Vec<f64>,
}

impl Timeline {
    pub fn new(chain: &PreparedChain, source_duration: f64) -> Self {
        let speeds: Vec<f64> = chain.effects().iter().map(|e| e.speed_factor()).collect();
        let mut durations = Vec::with_capacity(speeds.len() + 1);
        durations.push(source_duration.max(0.0));
        for speed in &speeds {
            let last = durations[durations.len() - 1];
            durations.push(last / speed);
        }
        Self { durations, speeds }
    }

    /// Duration after the whole chain.
    pub fn output_duration(&self) -> f64 {
        self.durations.last().copied().unwrap_or(0.0)
    }

    /// Duration of stage `i` (the input of effect `i`).
    pub fn stage_duration(&self, stage: usize) -> f64 {
        self.durations
            .get(stage)
            .copied()
            .unwrap_or_else(|| self.output_duration())
    }

    /// Clip time at every stage for an output time. Index `0` is the
    /// source time, the last index is `output_time` itself.
    pub fn stage_times(&self, output_time: f64) -> Vec<f64> {
        let mut times = vec![0.0; self.speeds.len() + 1];
        let mut t = output_time;
        times[self.speeds.len()] = t;
        for (i, speed) in self.speeds.iter().enumerate().rev() {
            t *= speed;
            times[i] = t;
        }
        times
    }

    /// Source time that feeds the output frame at `output_time`.
    pub fn source_time(&self, output_time: f64) -> f64 {
        output_time * self.speeds.iter().product::<f64>()
    }
}

/// Summary of a finished render.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderStats {
    pub frames: u64,
    /// Output duration in seconds.
    pub duration: f64,
    /// Size of the rendered frames, `None` if nothing was rendered.
    pub frame_size: Option<(u32, u32)>,
}

/// Render a clip through `chain`.
///
/// Output frames are sampled at the source rate over the chain's output
/// duration. For each one, the stage times are computed back to the
/// source, the matching source frame is fetched, and the chain runs
/// forward with every effect seeing its own stage's time and duration.
pub fn render_video<S, K, R>(
    chain: &PreparedChain,
    source: &mut S,
    sink: &mut K,
    rng: &mut R,
) -> Result<RenderStats>
where
    S: FrameSource + ?Sized,
    K: FrameSink + ?Sized,
    R: Rng,
{
    let timeline = Timeline::new(chain, source.duration());
    let rate = source.frame_rate();
    let total = rate.frames_in(timeline.output_duration());
    info!(
        effects = chain.effects().len(),
        source_duration = source.duration(),
        output_duration = timeline.output_duration(),
        frames = total,
        "rendering video"
    );

    let mut frame_size = None;
    for index in 0..total {
        let t = rate.frame_time(index);
        let times = timeline.stage_times(t);
        let input = source.frame_at(times[0])?;
        let output = chain.apply_frame(input, &timeline, &times, rng);
        frame_size = Some(output.dimensions());
        sink.write_frame(output)?;
        if index % 100 == 0 {
            debug!(index, time = t, "rendered frame");
        }
    }

    Ok(RenderStats {
        frames: total,
        duration: timeline.output_duration(),
        frame_size,
    })
}
