//! Image loading.
//!
//! The source file is decoded into renditions: ISO-BMFF containers (HEIC,
//! AVIF and friends) go through libheif, everything else through the image
//! crate decoders. Both paths apply the container's orientation before the
//! pixels are handed on.

use std::path::Path;

use image::DynamicImage;
use libheif_rs::{ColorProfileNCLX, ColorSpace, HeifContext, LibHeif, RgbChroma};
use tracing::debug;

use crate::color::ColorDescription;
use crate::formats;
use crate::headroom;
use crate::{HeicMergeError, Result};

/// Which rendition of the source to decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DynamicRange {
    /// Orientation-corrected 8-bit decode.
    Standard,
    /// Orientation-corrected decode requesting dynamic-range expansion.
    High,
}

/// Interleaved RGBA samples of one rendition.
pub enum RenditionPixels {
    Rgba8(Vec<u8>),
    /// Samples occupy the low `bit_depth` bits of each u16.
    Rgba16(Vec<u16>),
}

/// One decoded rendition of the source file.
pub struct Rendition {
    pub width: u32,
    pub height: u32,
    /// Significant bits per sample: 8 for SDR, the source depth for HDR.
    pub bit_depth: u8,
    pub pixels: RenditionPixels,
    /// CICP description signaled by the container, when present.
    pub color: Option<ColorDescription>,
    /// The container's own nclx profile, reattached on encode.
    pub(crate) nclx: Option<ColorProfileNCLX>,
}

impl Rendition {
    /// Color-space name for the diagnostics block, `none` when the
    /// container signals nothing.
    pub fn color_space_name(&self) -> String {
        match &self.color {
            Some(description) => description.name(),
            None => "none".to_string(),
        }
    }

    /// Linear-light peak relative to SDR reference white, never below 1.0.
    pub fn content_headroom(&self) -> f32 {
        let transfer = match &self.color {
            Some(description) => description.transfer,
            None => return 1.0,
        };
        headroom::content_headroom(transfer, self.max_rgb_component())
    }

    /// Brightest R/G/B sample normalized to [0, 1]; alpha is skipped.
    fn max_rgb_component(&self) -> f32 {
        let max_value = ((1u32 << self.bit_depth) - 1) as f32;
        let max_sample = match &self.pixels {
            RenditionPixels::Rgba8(data) => data
                .chunks_exact(4)
                .map(|px| px[0].max(px[1]).max(px[2]))
                .max()
                .unwrap_or(0) as f32,
            RenditionPixels::Rgba16(data) => data
                .chunks_exact(4)
                .map(|px| px[0].max(px[1]).max(px[2]))
                .max()
                .unwrap_or(0) as f32,
        };
        (max_sample / max_value).min(1.0)
    }
}

/// Decodes one rendition of the source file.
pub fn load_rendition(path: &Path, range: DynamicRange) -> Result<Rendition> {
    if formats::is_bmff_container(path) {
        load_heif_rendition(path, range)
    } else {
        load_generic_rendition(path, range)
    }
}

fn load_heif_rendition(path: &Path, range: DynamicRange) -> Result<Rendition> {
    let lib_heif = LibHeif::new();
    let ctx = HeifContext::read_from_file(path.to_string_lossy().as_ref())
        .map_err(|e| HeicMergeError::DecodeError(format!("Failed to read container: {}", e)))?;
    let handle = ctx
        .primary_image_handle()
        .map_err(|e| HeicMergeError::DecodeError(format!("No primary image: {}", e)))?;

    let source_depth = handle.luma_bits_per_pixel();
    let nclx = handle.color_profile_nclx();
    let color = nclx.as_ref().map(ColorDescription::from_nclx);

    if let Some(brand) = formats::ftyp_major_brand(path) {
        debug!(
            "Decoding {} container: {}x{}, {} bit",
            brand,
            handle.width(),
            handle.height(),
            source_depth
        );
    }

    // Rotation and mirroring transformations are applied during decode.
    match range {
        DynamicRange::High if source_depth > 8 => {
            let image = lib_heif
                .decode(&handle, ColorSpace::Rgb(RgbChroma::HdrRgbaLe), None)
                .map_err(|e| {
                    HeicMergeError::DecodeError(format!("Failed to decode HDR rendition: {}", e))
                })?;
            let planes = image.planes();
            let plane = planes
                .interleaved
                .ok_or_else(|| HeicMergeError::DecodeError("No RGBA plane found".to_string()))?;
            let width = plane.width as u32;
            let height = plane.height as u32;
            Ok(Rendition {
                width,
                height,
                bit_depth: source_depth,
                pixels: RenditionPixels::Rgba16(rows_to_u16(plane.data, plane.stride, width, height)),
                color,
                nclx,
            })
        }
        _ => {
            let image = lib_heif
                .decode(&handle, ColorSpace::Rgb(RgbChroma::Rgba), None)
                .map_err(|e| {
                    HeicMergeError::DecodeError(format!("Failed to decode image: {}", e))
                })?;
            let planes = image.planes();
            let plane = planes
                .interleaved
                .ok_or_else(|| HeicMergeError::DecodeError("No RGBA plane found".to_string()))?;
            let width = plane.width as u32;
            let height = plane.height as u32;
            Ok(Rendition {
                width,
                height,
                bit_depth: 8,
                pixels: RenditionPixels::Rgba8(rows_to_u8(plane.data, plane.stride, width, height)),
                color,
                nclx,
            })
        }
    }
}

fn load_generic_rendition(path: &Path, range: DynamicRange) -> Result<Rendition> {
    use image::ImageDecoder;

    let mut decoder = image::ImageReader::open(path)
        .map_err(|e| HeicMergeError::DecodeError(format!("Failed to open file: {}", e)))?
        .with_guessed_format()
        .map_err(|e| HeicMergeError::DecodeError(format!("Failed to guess format: {}", e)))?
        .into_decoder()?;
    let orientation = decoder.orientation()?;
    let mut image = DynamicImage::from_decoder(decoder)?;
    image.apply_orientation(orientation);

    if range == DynamicRange::High {
        // These formats carry no expanded dynamic range; the rendition
        // holds the same content as the standard decode.
        debug!("Source has no HDR rendition; reusing the standard decode");
    }

    let rgba = image.into_rgba8();
    Ok(Rendition {
        width: rgba.width(),
        height: rgba.height(),
        bit_depth: 8,
        pixels: RenditionPixels::Rgba8(rgba.into_raw()),
        color: None,
        nclx: None,
    })
}

/// Copies stride-padded rows into a tightly packed RGBA buffer.
fn rows_to_u8(data: &[u8], stride: usize, width: u32, height: u32) -> Vec<u8> {
    let row_bytes = width as usize * 4;
    let mut out = Vec::with_capacity(row_bytes * height as usize);
    for y in 0..height as usize {
        out.extend_from_slice(&data[y * stride..y * stride + row_bytes]);
    }
    out
}

/// Copies stride-padded rows of little-endian u16 samples into a tightly
/// packed RGBA buffer.
fn rows_to_u16(data: &[u8], stride: usize, width: u32, height: u32) -> Vec<u16> {
    let row_bytes = width as usize * 8;
    let mut out = Vec::with_capacity(width as usize * height as usize * 4);
    for y in 0..height as usize {
        let row = &data[y * stride..y * stride + row_bytes];
        for pair in row.chunks_exact(2) {
            out.push(u16::from_le_bytes([pair[0], pair[1]]));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::{ColorDescription, Primaries, Transfer};
    use std::io::Write;
    use tempfile::TempDir;

    fn write_test_png(dir: &TempDir) -> std::path::PathBuf {
        let path = dir.path().join("sample.png");
        let mut img = image::RgbaImage::new(2, 2);
        img.put_pixel(0, 0, image::Rgba([255, 0, 0, 255]));
        img.put_pixel(1, 0, image::Rgba([0, 255, 0, 255]));
        img.put_pixel(0, 1, image::Rgba([0, 0, 255, 255]));
        img.put_pixel(1, 1, image::Rgba([128, 128, 128, 255]));
        img.save(&path).unwrap();
        path
    }

    #[test]
    fn test_loads_png_standard_rendition() {
        let dir = TempDir::new().unwrap();
        let path = write_test_png(&dir);

        let rendition = load_rendition(&path, DynamicRange::Standard).unwrap();
        assert_eq!(rendition.width, 2);
        assert_eq!(rendition.height, 2);
        assert_eq!(rendition.bit_depth, 8);
        assert!(rendition.color.is_none());
        assert_eq!(rendition.color_space_name(), "none");
        match &rendition.pixels {
            RenditionPixels::Rgba8(data) => assert_eq!(data.len(), 16),
            RenditionPixels::Rgba16(_) => panic!("expected an 8-bit rendition"),
        }
    }

    #[test]
    fn test_png_hdr_rendition_matches_standard() {
        let dir = TempDir::new().unwrap();
        let path = write_test_png(&dir);

        let standard = load_rendition(&path, DynamicRange::Standard).unwrap();
        let high = load_rendition(&path, DynamicRange::High).unwrap();
        assert_eq!(high.bit_depth, standard.bit_depth);
        assert_eq!(high.content_headroom(), 1.0);
    }

    #[test]
    fn test_missing_file_fails() {
        let result = load_rendition(
            std::path::Path::new("/nonexistent/missing.png"),
            DynamicRange::Standard,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_corrupt_file_fails() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.png");
        std::fs::File::create(&path)
            .unwrap()
            .write_all(b"this is not an image")
            .unwrap();

        assert!(load_rendition(&path, DynamicRange::Standard).is_err());
    }

    #[test]
    fn test_truncated_bmff_container_fails() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.heic");
        let mut header = Vec::new();
        header.extend_from_slice(&16u32.to_be_bytes());
        header.extend_from_slice(b"ftypheic");
        header.extend_from_slice(b"\x00\x00\x00\x00");
        std::fs::File::create(&path).unwrap().write_all(&header).unwrap();

        assert!(load_rendition(&path, DynamicRange::Standard).is_err());
    }

    #[test]
    fn test_headroom_skips_alpha() {
        let rendition = Rendition {
            width: 1,
            height: 1,
            bit_depth: 8,
            pixels: RenditionPixels::Rgba8(vec![0, 0, 0, 255]),
            color: Some(ColorDescription {
                primaries: Primaries::Bt2020,
                transfer: Transfer::Pq,
            }),
            nclx: None,
        };
        assert_eq!(rendition.content_headroom(), 1.0);
    }

    #[test]
    fn test_headroom_of_full_pq_signal() {
        let rendition = Rendition {
            width: 1,
            height: 1,
            bit_depth: 10,
            pixels: RenditionPixels::Rgba16(vec![1023, 1023, 1023, 1023]),
            color: Some(ColorDescription {
                primaries: Primaries::Bt2020,
                transfer: Transfer::Pq,
            }),
            nclx: None,
        };
        let headroom = rendition.content_headroom();
        assert!((headroom - 10000.0 / 203.0).abs() < 1e-3);
    }

    #[test]
    fn test_rows_to_u8_drops_stride_padding() {
        // Two 2x1 rows padded to a 12 byte stride.
        let data: Vec<u8> = vec![
            1, 2, 3, 4, 5, 6, 7, 8, 0xAA, 0xAA, 0xAA, 0xAA, // row 0
            9, 10, 11, 12, 13, 14, 15, 16, 0xBB, 0xBB, 0xBB, 0xBB, // row 1
        ];
        let packed = rows_to_u8(&data, 12, 2, 2);
        assert_eq!(packed, vec![1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16]);
    }

    #[test]
    fn test_rows_to_u16_decodes_little_endian() {
        // One 1x2 column padded to a 10 byte stride.
        let data: Vec<u8> = vec![
            0x00, 0x01, 0x01, 0x01, 0xFF, 0x03, 0xFF, 0xFF, 0xCC, 0xCC, // row 0
            0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0xCC, 0xCC, // row 1
        ];
        let packed = rows_to_u16(&data, 10, 1, 2);
        assert_eq!(packed, vec![256, 257, 1023, 65535, 1, 0, 0, 0]);
    }
}
