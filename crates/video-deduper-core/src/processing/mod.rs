// Core modules
pub mod decoder;
pub mod frame;
pub mod perceptual;
pub mod sampler;
pub mod signature;

// Expose the decoder seam
pub use decoder::{FfmpegDecoder, FrameStream, VideoDecoder, VideoInfo};

// Expose frame sampling and hashing
pub use frame::{Frame, PixelLayout};
pub use perceptual::{calculate_phash, phash_from_frame, PHash};
pub use sampler::{sample_points, sample_step, FrameSampler, SampledFrames};
pub use signature::VideoSignature;
