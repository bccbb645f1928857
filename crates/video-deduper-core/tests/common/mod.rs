//! Shared helpers for integration tests.
//!
//! Test "videos" are small JSON fixtures read by [`FixtureDecoder`]. Each entry of
//! `seconds` is the 64-bit pattern every frame in that second hashes to.

#![allow(dead_code)]

use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use video_deduper_core::processing::{Frame, FrameStream, PixelLayout, VideoDecoder, VideoInfo};
use video_deduper_core::{Config, Error, Result};

const FRAME_SIDE: u32 = 64;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fixture {
    pub fps: f64,
    pub seconds: Vec<u64>,
}

impl Fixture {
    pub fn new(fps: f64, seconds: &[u64]) -> Self {
        Self {
            fps,
            seconds: seconds.to_vec(),
        }
    }
}

/// Decoder over JSON fixture files
pub struct FixtureDecoder;

fn read_fixture(path: &Path) -> Result<Fixture> {
    let text = fs::read_to_string(path)?;
    serde_json::from_str(&text).map_err(|e| Error::UnreadableVideo {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

/// Gray frame whose 8x8 blocks are white where `pattern` has a bit set
pub fn block_frame(pattern: u64, frame_index: u64) -> Result<Frame> {
    let mut data = Vec::with_capacity((FRAME_SIDE * FRAME_SIDE) as usize);
    for y in 0..FRAME_SIDE {
        for x in 0..FRAME_SIDE {
            let bit = (y / 8) * 8 + (x / 8);
            data.push(if pattern & (1u64 << bit) != 0 { 255 } else { 0 });
        }
    }
    Frame::new(FRAME_SIDE, FRAME_SIDE, PixelLayout::Gray, data, frame_index)
}

impl VideoDecoder for FixtureDecoder {
    fn probe(&self, path: &Path) -> Result<VideoInfo> {
        let fixture = read_fixture(path)?;
        Ok(VideoInfo {
            fps: fixture.fps,
            frame_count: (fixture.seconds.len() as f64 * fixture.fps).round() as u64,
            width: FRAME_SIDE,
            height: FRAME_SIDE,
        })
    }

    fn frames(&self, path: &Path, info: &VideoInfo, step: u64) -> Result<FrameStream> {
        let fixture = read_fixture(path)?;
        let fps = info.fps;
        let frames: Vec<Result<Frame>> = (0..info.frame_count)
            .step_by(step.max(1) as usize)
            .map(|index| {
                let second = (index as f64 / fps) as usize;
                block_frame(fixture.seconds[second.min(fixture.seconds.len() - 1)], index)
            })
            .collect();
        Ok(Box::new(frames.into_iter()))
    }
}

/// Write a fixture video and backdate its mtime by `age_secs`
pub fn write_video(dir: &Path, name: &str, fixture: &Fixture, age_secs: u64) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, serde_json::to_vec(fixture).unwrap()).unwrap();
    set_age(&path, age_secs);
    path
}

pub fn set_age(path: &Path, age_secs: u64) {
    let mtime = SystemTime::now() - Duration::from_secs(age_secs);
    File::options()
        .write(true)
        .open(path)
        .unwrap()
        .set_modified(mtime)
        .unwrap();
}

/// Config for a quiet test run over the given roots
pub fn test_config(input: &Path, archive: &Path) -> Config {
    let mut config = Config::new(input, archive);
    config.show_progress = false;
    config.threads = 2;
    config
}

/// Distinct, non-uniform patterns for "unrelated" content
pub const PATTERN_A: u64 = 0x00FF_00FF_00FF_00FF;
pub const PATTERN_B: u64 = 0x0F0F_0F0F_0F0F_0F0F;
pub const PATTERN_C: u64 = 0x3333_CCCC_3333_CCCC;
pub const PATTERN_D: u64 = 0xFFFF_0000_FFFF_0000;
