use log::{debug, warn};
use std::path::{Path, PathBuf};

use super::decoder::VideoDecoder;
use super::perceptual::{phash_from_frame, PHash};
use super::sampler::FrameSampler;
use crate::error::Result;

/// Ordered per-frame hashes of one video. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoSignature {
    path: PathBuf,
    hashes: Vec<PHash>,
}

impl VideoSignature {
    /// Signature from precomputed hashes
    pub fn from_hashes(path: impl Into<PathBuf>, hashes: Vec<PHash>) -> Self {
        Self {
            path: path.into(),
            hashes,
        }
    }

    /// "No signature available"; matches nothing
    pub fn empty(path: impl Into<PathBuf>) -> Self {
        Self::from_hashes(path, Vec::new())
    }

    /// Sample and hash `path`, propagating an unreadable container
    pub fn try_build(path: &Path, sample_interval: u32, decoder: &dyn VideoDecoder) -> Result<Self> {
        let mut frames = FrameSampler::new(decoder).sample(path, sample_interval)?;
        let hashes: Vec<PHash> = frames.by_ref().map(phash_from_frame).collect();

        debug!(
            "Signature for {}: {} hashes, {} samples skipped",
            path.display(),
            hashes.len(),
            frames.skipped()
        );

        Ok(Self::from_hashes(path, hashes))
    }

    /// Sample and hash `path`; an unreadable file yields the empty signature
    pub fn build(path: &Path, sample_interval: u32, decoder: &dyn VideoDecoder) -> Self {
        Self::try_build(path, sample_interval, decoder).unwrap_or_else(|e| {
            warn!("Error processing {}: {}", path.display(), e);
            Self::empty(path)
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn hashes(&self) -> &[PHash] {
        &self.hashes
    }

    pub fn len(&self) -> usize {
        self.hashes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hashes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::processing::decoder::{FrameStream, VideoInfo};
    use crate::processing::frame::{Frame, PixelLayout};

    /// Serves 2x1 gray frames whose brighter pixel alternates every frame
    struct AlternatingDecoder {
        fps: f64,
        frame_count: u64,
    }

    impl VideoDecoder for AlternatingDecoder {
        fn probe(&self, path: &Path) -> Result<VideoInfo> {
            if path.ends_with("missing.mp4") {
                return Err(Error::unreadable(path, "no such file"));
            }
            Ok(VideoInfo {
                fps: self.fps,
                frame_count: self.frame_count,
                width: 2,
                height: 1,
            })
        }

        fn frames(&self, _path: &Path, info: &VideoInfo, step: u64) -> Result<FrameStream> {
            let frames: Vec<Result<Frame>> = (0..info.frame_count)
                .step_by(step as usize)
                .map(|index| {
                    let data = if (index / step) % 2 == 0 { vec![255, 0] } else { vec![0, 255] };
                    Frame::new(2, 1, PixelLayout::Gray, data, index)
                })
                .collect();
            Ok(Box::new(frames.into_iter()))
        }
    }

    #[test]
    fn test_build_preserves_temporal_order() {
        let decoder = AlternatingDecoder {
            fps: 5.0,
            frame_count: 20,
        };
        let signature = VideoSignature::build(Path::new("clip.mp4"), 1, &decoder);

        assert_eq!(signature.len(), 4);
        let hashes = signature.hashes();
        assert_eq!(hashes[0], hashes[2]);
        assert_eq!(hashes[1], hashes[3]);
        assert_ne!(hashes[0], hashes[1]);
    }

    #[test]
    fn test_unreadable_file_yields_empty_signature() {
        let decoder = AlternatingDecoder {
            fps: 5.0,
            frame_count: 20,
        };

        let result = VideoSignature::try_build(Path::new("missing.mp4"), 1, &decoder);
        assert!(matches!(result, Err(Error::UnreadableVideo { .. })));

        let signature = VideoSignature::build(Path::new("missing.mp4"), 1, &decoder);
        assert!(signature.is_empty());
        assert_eq!(signature.path(), Path::new("missing.mp4"));
    }

    #[test]
    fn test_length_tracks_duration_over_interval() {
        // 60 seconds at 30 fps, sampled every 5 seconds
        let decoder = AlternatingDecoder {
            fps: 30.0,
            frame_count: 1800,
        };
        let signature = VideoSignature::build(Path::new("minute.mp4"), 5, &decoder);
        assert_eq!(signature.len(), 12);
    }
}
