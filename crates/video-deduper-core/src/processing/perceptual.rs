//! # Perceptual Hashing Module
//!
//! Reduces a decoded video frame to a 64-bit average hash.
//!
//! ## Overview
//!
//! Perceptual hashing generates "fingerprints" that remain similar for visually similar images,
//! unlike cryptographic hashes where minor changes produce completely different outputs.
//!
//! The frame is converted to luminance, area-averaged down to an 8×8 grid, and each
//! cell contributes one bit: set when the cell is strictly brighter than the grid mean.
//! Bits are laid out row-major, least significant bit first.
//!
//! ## Hamming Distance Interpretation
//!
//! Signatures compare hashes for exact equality by default. When a distance mode is
//! configured, the Hamming distance (count of differing bits) reads roughly as:
//!
//! - 0-3: Nearly identical frames (re-encode, minor brightness shift)
//! - 4-10: Similar frames
//! - >10: Different frames

use image::imageops::{self, FilterType};
use image::{DynamicImage, GrayImage};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::frame::Frame;

/// Side length of the reduced luminance grid
pub const GRID_SIZE: u32 = 8;

/// A perceptual hash represented as a 64-bit value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PHash(pub u64);

impl PHash {
    /// Calculate the Hamming distance between two perceptual hashes
    pub fn distance(&self, other: &PHash) -> u32 {
        (self.0 ^ other.0).count_ones()
    }

    /// Check if two frames are perceptually similar based on a threshold
    pub fn is_similar(&self, other: &PHash, threshold: u32) -> bool {
        self.distance(other) <= threshold
    }
}

impl fmt::Display for PHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// Calculate a 64-bit perceptual hash for an image
pub fn calculate_phash(img: &DynamicImage) -> PHash {
    let gray = img.to_luma8();
    let small = reduce_to_grid(&gray);

    let pixels: Vec<f32> = small.pixels().map(|p| p[0] as f32).collect();
    let mean = pixels.iter().sum::<f32>() / pixels.len() as f32;

    let mut hash: u64 = 0;
    for (bit_pos, &p) in pixels.iter().enumerate() {
        if p > mean {
            hash |= 1u64 << bit_pos;
        }
    }

    PHash(hash)
}

/// Calculate a perceptual hash from a decoded frame
pub fn phash_from_frame(frame: Frame) -> PHash {
    calculate_phash(&frame.into_image())
}

// Area averaging when shrinking; frames smaller than the grid are upsampled
fn reduce_to_grid(gray: &GrayImage) -> GrayImage {
    if gray.width() >= GRID_SIZE && gray.height() >= GRID_SIZE {
        imageops::thumbnail(gray, GRID_SIZE, GRID_SIZE)
    } else {
        imageops::resize(gray, GRID_SIZE, GRID_SIZE, FilterType::Nearest)
    }
}
