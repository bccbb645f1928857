//! Container/codec access for the frame sampler.
//!
//! [`FfmpegDecoder`] calls `ffprobe` and `ffmpeg` from the command line. They must be
//! on `PATH` or configured explicitly through [`crate::Config`].

use log::debug;
use serde::Deserialize;
use std::ffi::OsString;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdout, Command, Stdio};

use super::frame::{Frame, PixelLayout};
use crate::error::{Error, Result};

/// Stream of frames decoded from one open video, in temporal order
pub type FrameStream = Box<dyn Iterator<Item = Result<Frame>> + Send>;

/// Container metadata needed to place sample points
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VideoInfo {
    pub fps: f64,
    pub frame_count: u64,
    pub width: u32,
    pub height: u32,
}

/// Decodes frames out of a video container
pub trait VideoDecoder: Send + Sync {
    /// Read container metadata without decoding frames
    fn probe(&self, path: &Path) -> Result<VideoInfo>;

    /// Decode frames 0, step, 2*step, ... in order.
    ///
    /// A position that fails to decode yields an `Err` item; the stream may continue past it.
    fn frames(&self, path: &Path, info: &VideoInfo, step: u64) -> Result<FrameStream>;
}

/// Decoder backed by the ffmpeg command-line tools
#[derive(Debug, Clone)]
pub struct FfmpegDecoder {
    ffmpeg: PathBuf,
    ffprobe: PathBuf,
}

impl Default for FfmpegDecoder {
    fn default() -> Self {
        Self::new("ffmpeg", "ffprobe")
    }
}

impl FfmpegDecoder {
    pub fn new(ffmpeg: impl Into<PathBuf>, ffprobe: impl Into<PathBuf>) -> Self {
        Self {
            ffmpeg: ffmpeg.into(),
            ffprobe: ffprobe.into(),
        }
    }

    /// Whether both tools can be executed
    pub fn is_available(&self) -> bool {
        [&self.ffmpeg, &self.ffprobe].iter().all(|tool| {
            Command::new(tool)
                .arg("-version")
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .status()
                .map(|status| status.success())
                .unwrap_or(false)
        })
    }
}

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
    format: Option<ProbeFormat>,
}

/// Container-level fields; Matroska and FLV only carry duration here
#[derive(Debug, Deserialize)]
struct ProbeFormat {
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    width: Option<u32>,
    height: Option<u32>,
    avg_frame_rate: Option<String>,
    r_frame_rate: Option<String>,
    nb_frames: Option<String>,
    duration: Option<String>,
}

/// Parse an ffprobe rational such as `30000/1001`. `0/0` reads as 0.
fn parse_rate(rate: &str) -> Option<f64> {
    match rate.split_once('/') {
        Some((num, den)) => {
            let num: f64 = num.trim().parse().ok()?;
            let den: f64 = den.trim().parse().ok()?;
            Some(if den == 0.0 { 0.0 } else { num / den })
        }
        None => rate.trim().parse().ok(),
    }
}

fn parse_probe(path: &Path, json: &[u8]) -> Result<VideoInfo> {
    let output: ProbeOutput = serde_json::from_slice(json)
        .map_err(|e| Error::unreadable(path, format!("unparseable ffprobe output: {}", e)))?;

    let container_duration = output.format.and_then(|f| f.duration);

    let stream = output
        .streams
        .into_iter()
        .next()
        .ok_or_else(|| Error::unreadable(path, "no video stream"))?;

    let (width, height) = match (stream.width, stream.height) {
        (Some(w), Some(h)) if w > 0 && h > 0 => (w, h),
        _ => return Err(Error::unreadable(path, "video stream has no dimensions")),
    };

    let fps = stream
        .avg_frame_rate
        .as_deref()
        .and_then(parse_rate)
        .filter(|fps| *fps > 0.0)
        .or_else(|| stream.r_frame_rate.as_deref().and_then(parse_rate))
        .unwrap_or(0.0);

    let frame_count = match stream.nb_frames.as_deref().and_then(|n| n.parse::<u64>().ok()) {
        Some(count) => count,
        None => stream
            .duration
            .as_deref()
            .or(container_duration.as_deref())
            .and_then(|d| d.parse::<f64>().ok())
            .map(|secs| (secs * fps).round().max(0.0) as u64)
            .unwrap_or(0),
    };

    if frame_count == 0 && fps > 0.0 {
        return Err(Error::unreadable(path, "no frame count or duration reported"));
    }

    Ok(VideoInfo {
        fps,
        frame_count,
        width,
        height,
    })
}

/// ffmpeg arguments that stream every `step`-th frame of `path` as raw RGB24.
///
/// Autorotation is off so frames keep the stream dimensions ffprobe reported.
fn frame_args(path: &Path, step: u64) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec![
        "-v".into(),
        "error".into(),
        "-nostdin".into(),
        "-noautorotate".into(),
        "-i".into(),
        path.into(),
    ];
    let filter = format!("select=not(mod(n\\,{}))", step);
    for arg in [
        "-map", "0:v:0", "-vf", filter.as_str(), "-vsync", "vfr", "-f", "rawvideo", "-pix_fmt", "rgb24", "-",
    ] {
        args.push(arg.into());
    }
    args
}

impl VideoDecoder for FfmpegDecoder {
    fn probe(&self, path: &Path) -> Result<VideoInfo> {
        let output = Command::new(&self.ffprobe)
            .args(["-v", "error", "-select_streams", "v:0"])
            .args([
                "-show_entries",
                "stream=width,height,avg_frame_rate,r_frame_rate,nb_frames,duration:format=duration",
            ])
            .args(["-of", "json"])
            .arg(path)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| Error::unreadable(path, format!("failed to run ffprobe: {}", e)))?;

        if !output.status.success() {
            return Err(Error::unreadable(
                path,
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ));
        }

        parse_probe(path, &output.stdout)
    }

    fn frames(&self, path: &Path, info: &VideoInfo, step: u64) -> Result<FrameStream> {
        let step = step.max(1);
        let mut child = Command::new(&self.ffmpeg)
            .args(frame_args(path, step))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| Error::unreadable(path, format!("failed to run ffmpeg: {}", e)))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| Error::unreadable(path, "ffmpeg stdout unavailable"))?;

        debug!(
            "Streaming {} every {} frames ({}x{})",
            path.display(),
            step,
            info.width,
            info.height
        );

        Ok(Box::new(RawFrameStream {
            child,
            reader: BufReader::new(stdout),
            width: info.width,
            height: info.height,
            step,
            next_index: 0,
            done: false,
        }))
    }
}

/// Lazily reads fixed-size RGB24 frames from an ffmpeg pipe
struct RawFrameStream {
    child: Child,
    reader: BufReader<ChildStdout>,
    width: u32,
    height: u32,
    step: u64,
    next_index: u64,
    done: bool,
}

impl Iterator for RawFrameStream {
    type Item = Result<Frame>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let frame_len = self.width as usize * self.height as usize * PixelLayout::Rgb.channels();
        let mut buffer = vec![0u8; frame_len];
        let mut filled = 0;
        while filled < frame_len {
            match self.reader.read(&mut buffer[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    self.done = true;
                    return Some(Err(Error::FrameDecode(e.to_string())));
                }
            }
        }

        let index = self.next_index;
        self.next_index += self.step;

        if filled == 0 {
            self.done = true;
            return None;
        }
        if filled < frame_len {
            // Truncated tail: report it once, then stop
            self.done = true;
            return Some(Err(Error::FrameDecode(format!(
                "frame {} truncated after {} of {} bytes",
                index, filled, frame_len
            ))));
        }

        Some(Frame::new(
            self.width,
            self.height,
            PixelLayout::Rgb,
            buffer,
            index,
        ))
    }
}

impl Drop for RawFrameStream {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rate() {
        assert_eq!(parse_rate("30/1"), Some(30.0));
        assert_eq!(parse_rate("0/0"), Some(0.0));
        assert_eq!(parse_rate("25"), Some(25.0));
        assert!((parse_rate("30000/1001").unwrap() - 29.97).abs() < 0.01);
        assert_eq!(parse_rate("abc"), None);
    }

    #[test]
    fn test_parse_probe_with_frame_count() {
        let json = br#"{"streams":[{"width":640,"height":360,"avg_frame_rate":"25/1","r_frame_rate":"25/1","nb_frames":"250","duration":"10.000000"}]}"#;
        let info = parse_probe(Path::new("a.mp4"), json).unwrap();

        assert_eq!(
            info,
            VideoInfo {
                fps: 25.0,
                frame_count: 250,
                width: 640,
                height: 360
            }
        );
    }

    #[test]
    fn test_parse_probe_falls_back_to_duration() {
        // Matroska streams usually carry no nb_frames
        let json = br#"{"streams":[{"width":320,"height":240,"avg_frame_rate":"0/0","r_frame_rate":"30/1","duration":"2.5"}]}"#;
        let info = parse_probe(Path::new("a.mkv"), json).unwrap();

        assert_eq!(info.fps, 30.0);
        assert_eq!(info.frame_count, 75);
    }

    #[test]
    fn test_container_duration_fills_missing_frame_count() {
        // Matroska/FLV: no nb_frames or duration on the stream, only on the format
        let json = br#"{"programs":[],"streams":[{"width":640,"height":360,"avg_frame_rate":"25/1","r_frame_rate":"25/1"}],"format":{"duration":"10.000000"}}"#;
        let info = parse_probe(Path::new("a.mkv"), json).unwrap();

        assert_eq!(info.fps, 25.0);
        assert_eq!(info.frame_count, 250);
    }

    #[test]
    fn test_stream_without_length_is_unreadable() {
        let json = br#"{"streams":[{"width":640,"height":360,"avg_frame_rate":"25/1","r_frame_rate":"25/1"}]}"#;
        let result = parse_probe(Path::new("a.mkv"), json);
        assert!(matches!(result, Err(Error::UnreadableVideo { .. })));
    }

    #[test]
    fn test_frame_args_disable_autorotation() {
        let args = frame_args(Path::new("clip.mov"), 30);
        let noautorotate = args.iter().position(|a| a == "-noautorotate").unwrap();
        let input = args.iter().position(|a| a == "-i").unwrap();

        assert!(noautorotate < input);
        assert_eq!(args[input + 1], OsString::from("clip.mov"));
        assert!(args.iter().any(|a| a == "select=not(mod(n\\,30))"));
    }

    #[test]
    fn test_parse_probe_without_stream_is_unreadable() {
        let result = parse_probe(Path::new("a.mp4"), br#"{"streams":[]}"#);
        assert!(matches!(result, Err(Error::UnreadableVideo { .. })));

        let result = parse_probe(Path::new("a.mp4"), b"not json");
        assert!(matches!(result, Err(Error::UnreadableVideo { .. })));
    }

    #[test]
    fn test_missing_binary_is_unreadable() {
        let decoder = FfmpegDecoder::new("/nonexistent/ffmpeg", "/nonexistent/ffprobe");
        assert!(!decoder.is_available());

        let result = decoder.probe(Path::new("clip.mp4"));
        assert!(matches!(result, Err(Error::UnreadableVideo { .. })));
    }
}
