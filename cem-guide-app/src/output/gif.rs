use std::{
    io::Write,
    time::Duration,
};

use cem_guide::solver::observer::{
    FieldFrame,
    FrameRecorder,
};
use colorgrad::Gradient;
use image::{
    Delay,
    Frame,
    RgbaImage,
    codecs::gif::{
        GifEncoder,
        Repeat,
    },
};

/// Encodes field frames into an animated GIF.
///
/// Signed values are mapped onto a diverging gradient with 0 in the middle.
/// The color scale follows the largest magnitude seen so far, so a decaying
/// field fades out instead of being rescaled each frame.
#[derive(derive_more::Debug)]
pub struct GifOutput<W, G>
where
    W: Write,
{
    #[debug("image::GifEncoder {{ ... }}")]
    gif_encoder: GifEncoder<W>,
    #[debug(skip)]
    gradient: G,
    frame_delay: Delay,
    max_frames: usize,
    frames_written: usize,
    frames_dropped: usize,
    scale: f32,
}

impl<W, G> GifOutput<W, G>
where
    W: Write,
    G: Gradient,
{
    pub fn new(
        writer: W,
        frame_delay: Duration,
        gradient: G,
        max_frames: usize,
    ) -> Result<Self, image::ImageError> {
        let mut gif_encoder = GifEncoder::new(writer);
        gif_encoder.set_repeat(Repeat::Infinite)?;

        Ok(Self {
            gif_encoder,
            gradient,
            frame_delay: Delay::from_saturating_duration(frame_delay),
            max_frames,
            frames_written: 0,
            frames_dropped: 0,
            scale: 0.0,
        })
    }

    pub fn frames_written(&self) -> usize {
        self.frames_written
    }

    pub fn frames_dropped(&self) -> usize {
        self.frames_dropped
    }
}

impl<W, G> FrameRecorder for GifOutput<W, G>
where
    W: Write,
    G: Gradient,
{
    type Error = image::ImageError;

    fn record_frame(&mut self, frame: FieldFrame) -> Result<(), Self::Error> {
        if self.frames_written >= self.max_frames {
            if self.frames_dropped == 0 {
                tracing::warn!(max_frames = self.max_frames, "animation frame limit reached");
            }
            self.frames_dropped += 1;
            return Ok(());
        }

        self.scale = self.scale.max(frame.max_abs());
        let scale = if self.scale > 0.0 { self.scale } else { 1.0 };

        let image = RgbaImage::from_fn(frame.size.x, frame.size.y, |x, y| {
            let value = frame.get(x, y).unwrap_or_default();
            let color = self.gradient.at(0.5 + 0.5 * value / scale);
            color.to_rgba8().into()
        });

        self.gif_encoder
            .encode_frame(Frame::from_parts(image, 0, 0, self.frame_delay))?;
        self.frames_written += 1;
        Ok(())
    }
}
