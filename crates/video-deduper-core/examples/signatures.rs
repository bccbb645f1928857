use std::env;
use std::path::PathBuf;
use video_deduper_core::discovery;
use video_deduper_core::processing::{FfmpegDecoder, VideoSignature};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Get directory to scan from command line or use current directory
    let args: Vec<String> = env::args().collect();
    let directory = if args.len() > 1 {
        PathBuf::from(&args[1])
    } else {
        env::current_dir()?
    };

    println!("Scanning directory: {}", directory.display());

    let decoder = FfmpegDecoder::default();
    let videos = discovery::discover_videos(&directory)?;

    println!("Found {} videos:", videos.len());
    for (i, video) in videos.iter().enumerate() {
        let signature = VideoSignature::build(&video.path, 1, &decoder);
        let preview: Vec<String> = signature.hashes().iter().take(4).map(|h| h.to_string()).collect();
        println!(
            "{}: {} ({} bytes, {} hashes) {}",
            i + 1,
            video.path.display(),
            video.size,
            signature.len(),
            preview.join(" ")
        );
    }

    Ok(())
}
