//! HEIC output.
//!
//! Both renditions are encoded into one container: the SDR image first,
//! which makes it the primary item, then the HDR image as a second
//! top-level image. Readers that understand multi-image HEIC can pick the
//! HDR rendition; everything else sees the SDR primary.

use std::path::{Path, PathBuf};

use libheif_rs::{
    Channel, ColorSpace, CompressionFormat, EncoderQuality, HeifContext, Image, LibHeif, RgbChroma,
};
use tracing::debug;

use crate::color;
use crate::loader::{Rendition, RenditionPixels};
use crate::{HeicMergeError, Result};

/// Output path: the input's extension replaced with `HEIC`, in the same
/// directory.
pub fn derive_output_path(input: &Path) -> PathBuf {
    input.with_extension("HEIC")
}

/// Lossy quality for the HEVC encoder. The ratio is deliberately not
/// clamped; out-of-range values reach the encoder as-is.
pub(crate) fn quality_percent(ratio: f64) -> u8 {
    (ratio * 100.0).round() as u8
}

/// Encodes both renditions into one HEIC container and writes it to
/// `output`, replacing any existing file.
pub fn write_heic(sdr: &Rendition, hdr: &Rendition, output: &Path, ratio: f64) -> Result<()> {
    let lib_heif = LibHeif::new();
    let mut ctx = HeifContext::new()
        .map_err(|e| HeicMergeError::EncodeError(format!("Failed to create context: {}", e)))?;
    let mut encoder = lib_heif
        .encoder_for_format(CompressionFormat::Hevc)
        .map_err(|e| HeicMergeError::EncodeError(format!("No HEVC encoder available: {}", e)))?;
    let quality = quality_percent(ratio);
    encoder
        .set_quality(EncoderQuality::Lossy(quality))
        .map_err(|e| {
            HeicMergeError::EncodeError(format!("Encoder rejected quality {}: {}", quality, e))
        })?;

    // The first encoded image becomes the container's primary item.
    let mut sdr_image = build_image(sdr)?;
    match sdr.nclx.as_ref() {
        Some(profile) => sdr_image.set_color_profile_nclx(profile)?,
        None => {
            debug!("SDR rendition has no color profile, falling back to Display P3");
            let profile = color::display_p3_nclx()?;
            sdr_image.set_color_profile_nclx(&profile)?;
        }
    }
    ctx.encode_image(&sdr_image, &mut encoder, None)
        .map_err(|e| {
            HeicMergeError::EncodeError(format!("Failed to encode SDR rendition: {}", e))
        })?;

    let mut hdr_image = build_image(hdr)?;
    if let Some(profile) = hdr.nclx.as_ref() {
        hdr_image.set_color_profile_nclx(profile)?;
    }
    ctx.encode_image(&hdr_image, &mut encoder, None)
        .map_err(|e| {
            HeicMergeError::EncodeError(format!("Failed to encode HDR rendition: {}", e))
        })?;

    ctx.write_to_file(output.to_string_lossy().as_ref())
        .map_err(|e| {
            HeicMergeError::EncodeError(format!("Failed to write {}: {}", output.display(), e))
        })?;

    debug!(
        "Encoded {}x{} SDR and {}x{} HDR renditions at quality {}",
        sdr.width, sdr.height, hdr.width, hdr.height, quality
    );
    Ok(())
}

/// Builds an in-memory image with an interleaved RGBA plane holding the
/// rendition's pixels.
fn build_image(rendition: &Rendition) -> Result<Image> {
    match &rendition.pixels {
        RenditionPixels::Rgba8(data) => {
            let mut image = Image::new(
                rendition.width,
                rendition.height,
                ColorSpace::Rgb(RgbChroma::Rgba),
            )?;
            image.create_plane(Channel::Interleaved, rendition.width, rendition.height, 8)?;
            fill_plane_u8(&mut image, data, rendition.width, rendition.height)?;
            Ok(image)
        }
        RenditionPixels::Rgba16(data) => {
            let mut image = Image::new(
                rendition.width,
                rendition.height,
                ColorSpace::Rgb(RgbChroma::HdrRgbaLe),
            )?;
            image.create_plane(
                Channel::Interleaved,
                rendition.width,
                rendition.height,
                rendition.bit_depth,
            )?;
            fill_plane_u16(&mut image, data, rendition.width, rendition.height)?;
            Ok(image)
        }
    }
}

fn fill_plane_u8(image: &mut Image, data: &[u8], width: u32, height: u32) -> Result<()> {
    let row_bytes = width as usize * 4;
    let planes = image.planes_mut();
    let plane = planes
        .interleaved
        .ok_or_else(|| HeicMergeError::EncodeError("No interleaved plane".to_string()))?;
    let stride = plane.stride;
    for (y, row) in data.chunks_exact(row_bytes).enumerate().take(height as usize) {
        plane.data[y * stride..y * stride + row_bytes].copy_from_slice(row);
    }
    Ok(())
}

fn fill_plane_u16(image: &mut Image, data: &[u16], width: u32, height: u32) -> Result<()> {
    let row_samples = width as usize * 4;
    let planes = image.planes_mut();
    let plane = planes
        .interleaved
        .ok_or_else(|| HeicMergeError::EncodeError("No interleaved plane".to_string()))?;
    let stride = plane.stride;
    for (y, row) in data.chunks_exact(row_samples).enumerate().take(height as usize) {
        let out = &mut plane.data[y * stride..y * stride + row_samples * 2];
        for (bytes, sample) in out.chunks_exact_mut(2).zip(row) {
            bytes.copy_from_slice(&sample.to_le_bytes());
        }
    }
    Ok(())
}
