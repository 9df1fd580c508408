//! Source container detection.
//!
//! The loader routes ISO-BMFF containers (HEIC/HEIF/AVIF family) through
//! libheif and everything else through the generic image decoders. Detection
//! is content-based: extensions lie often enough that only the `ftyp` box
//! decides.

use std::io::Read;
use std::path::Path;

/// Check if a file is an ISO-BMFF container (starts with an `ftyp` box).
///
/// Short files, unreadable files and other magics return false.
pub fn is_bmff_container(path: &Path) -> bool {
    read_ftyp_header(path).is_some()
}

/// Major brand of the `ftyp` box (`heic`, `avif`, `mif1`, ...) for logging.
///
/// Returns `None` when the file is not a BMFF container.
pub fn ftyp_major_brand(path: &Path) -> Option<String> {
    let buffer = read_ftyp_header(path)?;
    Some(String::from_utf8_lossy(&buffer[8..12]).into_owned())
}

/// Reads the first 12 bytes and validates the `ftyp` box header.
///
/// Layout: box size (u32 BE) + "ftyp" + major brand. A conforming ftyp box
/// carries at least the major brand and minor version, so size >= 16.
fn read_ftyp_header(path: &Path) -> Option<[u8; 12]> {
    let mut file = std::fs::File::open(path).ok()?;
    let mut buffer = [0u8; 12];
    file.read_exact(&mut buffer).ok()?;

    let box_size = u32::from_be_bytes([buffer[0], buffer[1], buffer[2], buffer[3]]);
    if &buffer[4..8] == b"ftyp" && box_size >= 16 {
        Some(buffer)
    } else {
        None
    }
}
