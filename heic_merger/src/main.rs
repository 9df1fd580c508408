use std::path::PathBuf;

use clap::error::ErrorKind;
use clap::Parser;
use console::style;
use tracing::{error, info};

use heic_merger::{derive_output_path, load_rendition, write_heic, DynamicRange};

#[derive(Parser, Debug)]
#[command(name = "heic-merge")]
#[command(version, about = "Merge SDR and HDR renditions of an image into one HEIC file", long_about = None)]
struct Args {
    /// Source image (AVIF, HEIC, PNG, JPEG, ...)
    #[arg(value_name = "FILE_PATH")]
    file_path: PathBuf,

    /// Lossy compression ratio, conventionally between 0 and 1
    #[arg(value_name = "COMPRESSION_RATIO", allow_negative_numbers = true)]
    compression_ratio: Option<f64>,
}

fn print_usage() {
    println!("📷 Usage: heic-merge <file_path> [compression_ratio]");
    println!("🔸 Example: heic-merge ./photo.avif 0.88");
    println!("🔸 Default compression ratio is 0.8 if not provided.");
}

/// Argument parsing with every failure mapped to exit code 1.
fn parse_args() -> Args {
    match Args::try_parse() {
        Ok(args) => args,
        Err(e) => match e.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => e.exit(),
            ErrorKind::ValueValidation => {
                eprintln!("⚠️ Invalid compression ratio. Must be a number between 0 and 1.");
                std::process::exit(1);
            }
            _ => {
                print_usage();
                std::process::exit(1);
            }
        },
    }
}

fn main() -> anyhow::Result<()> {
    let _ = shared_utils::logging::init_logging(
        "heic_merge",
        shared_utils::logging::LogConfig::default(),
    );

    let args = parse_args();
    let compression_ratio = args.compression_ratio.unwrap_or(0.8);
    let input = args.file_path;
    let output = derive_output_path(&input);

    info!(
        "Converting {} → {} at compression {}",
        input.display(),
        output.display(),
        compression_ratio
    );

    let sdr = match load_rendition(&input, DynamicRange::Standard) {
        Ok(rendition) => rendition,
        Err(e) => {
            error!("SDR decode failed: {}", e);
            eprintln!("❌ Couldn't create SDR image from {}", input.display());
            std::process::exit(1);
        }
    };

    let hdr = match load_rendition(&input, DynamicRange::High) {
        Ok(rendition) => rendition,
        Err(e) => {
            error!("HDR decode failed: {}", e);
            eprintln!("❌ Couldn't load HDR version");
            std::process::exit(1);
        }
    };

    println!("📸 Processing image at compression: {}", compression_ratio);
    println!("🎨 Image Info:");
    println!("   📦 Path: {}", style(input.display()).cyan());
    println!("   🌞 Content Headroom: {}", hdr.content_headroom());
    println!("   🎨 SDR ColorSpace: {}", sdr.color_space_name());
    println!("   💡 HDR ColorSpace: {}", hdr.color_space_name());

    if let Err(e) = write_heic(&sdr, &hdr, &output, compression_ratio) {
        error!("Write failed: {}", e);
        eprintln!("💥 Failed to write image: {}", e);
        std::process::exit(1);
    }

    info!("Conversion complete: {}", output.display());
    println!("✅ Saved HEIC to: {}", style(output.display()).green());

    Ok(())
}
