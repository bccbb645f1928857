use log::debug;
use std::path::{Path, PathBuf};

use super::decoder::{FrameStream, VideoDecoder, VideoInfo};
use super::frame::Frame;
use crate::error::{Error, Result};

/// Frames between sample points: `round(fps * interval)`, never less than 1
pub fn sample_step(fps: f64, interval_secs: u32) -> u64 {
    let step = (fps * interval_secs as f64).round();
    if step.is_finite() && step >= 1.0 {
        step as u64
    } else {
        1
    }
}

/// Frame indices `k * step` below the frame count
pub fn sample_points(info: &VideoInfo, interval_secs: u32) -> impl Iterator<Item = u64> {
    let step = sample_step(info.fps, interval_secs);
    (0..info.frame_count).step_by(step as usize)
}

/// Pulls frames out of a video at a fixed wall-clock interval
pub struct FrameSampler<'d> {
    decoder: &'d dyn VideoDecoder,
}

impl<'d> FrameSampler<'d> {
    pub fn new(decoder: &'d dyn VideoDecoder) -> Self {
        Self { decoder }
    }

    /// Open `path` and return its sampled frames.
    ///
    /// Fails with `UnreadableVideo` when the container cannot be opened or reports fps <= 0.
    pub fn sample(&self, path: &Path, interval_secs: u32) -> Result<SampledFrames> {
        let info = self.decoder.probe(path)?;

        if !(info.fps > 0.0) {
            return Err(Error::unreadable(
                path,
                format!("container reports fps {}", info.fps),
            ));
        }

        let step = sample_step(info.fps, interval_secs);
        let expected = sample_points(&info, interval_secs).count();
        let stream: FrameStream = if expected == 0 {
            Box::new(std::iter::empty::<Result<Frame>>())
        } else {
            self.decoder.frames(path, &info, step)?
        };

        debug!(
            "Sampling {}: {:.3} fps, {} frames, step {}, {} sample points",
            path.display(),
            info.fps,
            info.frame_count,
            step,
            expected
        );

        Ok(SampledFrames {
            path: path.to_path_buf(),
            stream,
            remaining: expected,
            skipped: 0,
        })
    }
}

/// Lazy, finite, non-restartable sequence of sampled frames.
///
/// Positions that fail to decode are dropped, never padded.
pub struct SampledFrames {
    path: PathBuf,
    stream: FrameStream,
    remaining: usize,
    skipped: usize,
}

impl SampledFrames {
    /// Sample positions dropped so far because they failed to decode
    pub fn skipped(&self) -> usize {
        self.skipped
    }
}

impl Iterator for SampledFrames {
    type Item = Frame;

    fn next(&mut self) -> Option<Frame> {
        while self.remaining > 0 {
            self.remaining -= 1;
            match self.stream.next()? {
                Ok(frame) => return Some(frame),
                Err(e) => {
                    self.skipped += 1;
                    debug!("Skipping sample in {}: {}", self.path.display(), e);
                }
            }
        }
        None
    }
}
