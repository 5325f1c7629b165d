use nalgebra::Vector2;

use crate::solver::{
    FieldComponent,
    FieldView,
    SolverInstance,
    runner::{
        StepError,
        StepFunction,
    },
};

/// A field component sampled on a plane. Row-major, row 0 at the top.
#[derive(Clone, Debug)]
pub struct FieldFrame {
    pub size: Vector2<u32>,
    pub time: f64,
    pub values: Vec<f32>,
}

impl FieldFrame {
    pub fn get(&self, x: u32, y: u32) -> Option<f32> {
        (x < self.size.x && y < self.size.y)
            .then(|| self.values[(y * self.size.x + x) as usize])
    }

    /// Largest absolute value in the frame.
    pub fn max_abs(&self) -> f32 {
        self.values
            .iter()
            .fold(0.0, |max, value| max.max(value.abs()))
    }
}

/// Receives sampled frames, e.g. to encode them into an animation.
pub trait FrameRecorder {
    type Error: std::error::Error + Send + Sync + 'static;

    fn record_frame(&mut self, frame: FieldFrame) -> Result<(), Self::Error>;
}

impl<R> FrameRecorder for &mut R
where
    R: FrameRecorder,
{
    type Error = R::Error;

    fn record_frame(&mut self, frame: FieldFrame) -> Result<(), Self::Error> {
        R::record_frame(*self, frame)
    }
}

/// Step function that samples the whole domain at a fixed cadence and hands
/// the frames to a [`FrameRecorder`].
#[derive(Debug)]
pub struct RecordFrames<R> {
    pub recorder: R,
    pub component: FieldComponent,
    pub interval: f64,
    pub frame_size: Vector2<u32>,
    frames_recorded: usize,
}

impl<R> RecordFrames<R> {
    pub fn new(
        recorder: R,
        component: FieldComponent,
        interval: f64,
        frame_size: Vector2<u32>,
    ) -> Self {
        Self {
            recorder,
            component,
            interval,
            frame_size,
            frames_recorded: 0,
        }
    }

    pub fn frames_recorded(&self) -> usize {
        self.frames_recorded
    }

    pub fn into_inner(self) -> R {
        self.recorder
    }
}

impl<I, R> StepFunction<I> for RecordFrames<R>
where
    I: SolverInstance,
    R: FrameRecorder,
{
    fn interval(&self) -> f64 {
        self.interval
    }

    fn call(&mut self, view: &FieldView<I>) -> Result<(), StepError> {
        let frame = view.sample_plane(self.component, self.frame_size);
        self.recorder.record_frame(frame)?;
        self.frames_recorded += 1;
        Ok(())
    }
}
