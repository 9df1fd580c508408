//! Color description handling.
//!
//! Containers signal their color space as CICP code points (ITU-T H.273):
//! a color-primaries code and a transfer-characteristics code. This module
//! parses those codes out of an nclx profile, names the common
//! combinations for the diagnostics block, and builds the wide-gamut
//! fallback profile attached to output images that carry no description
//! of their own.

use libheif_rs::{ColorPrimaries, ColorProfileNCLX, TransferCharacteristics};

use crate::{HeicMergeError, Result};

/// Color primaries code points (ITU-T H.273 table 2).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Primaries {
    /// ITU-R BT.709, also the sRGB primaries (code 1)
    Bt709,
    /// ITU-R BT.2020 / BT.2100 wide gamut (code 9)
    Bt2020,
    /// SMPTE RP 431-2 theatrical P3 (code 11)
    DciP3,
    /// SMPTE EG 432-1, the P3 gamut with a D65 white point (code 12)
    DisplayP3,
    /// Any other code from the H.273 table
    Other(u16),
    /// A code outside the H.273 table; libheif collapses these before
    /// the raw value can be read
    Unrecognized,
}

impl Primaries {
    pub fn from_code(code: u16) -> Self {
        match code {
            1 => Primaries::Bt709,
            9 => Primaries::Bt2020,
            11 => Primaries::DciP3,
            12 => Primaries::DisplayP3,
            other => Primaries::Other(other),
        }
    }

    pub fn code(&self) -> u16 {
        match self {
            Primaries::Bt709 => 1,
            Primaries::Bt2020 => 9,
            Primaries::DciP3 => 11,
            Primaries::DisplayP3 => 12,
            Primaries::Other(code) => *code,
            // H.273 treats out-of-table values as unspecified
            Primaries::Unrecognized => 2,
        }
    }
}

/// Transfer characteristics code points (ITU-T H.273 table 3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transfer {
    /// sRGB / IEC 61966-2-1 (code 13)
    Srgb,
    /// SMPTE ST 2084 perceptual quantizer (code 16)
    Pq,
    /// ARIB STD-B67 hybrid log-gamma (code 18)
    Hlg,
    /// Any other code from the H.273 table
    Other(u16),
    /// A code outside the H.273 table; libheif collapses these before
    /// the raw value can be read
    Unrecognized,
}

impl Transfer {
    pub fn from_code(code: u16) -> Self {
        match code {
            13 => Transfer::Srgb,
            16 => Transfer::Pq,
            18 => Transfer::Hlg,
            other => Transfer::Other(other),
        }
    }

    pub fn code(&self) -> u16 {
        match self {
            Transfer::Srgb => 13,
            Transfer::Pq => 16,
            Transfer::Hlg => 18,
            Transfer::Other(code) => *code,
            // H.273 treats out-of-table values as unspecified
            Transfer::Unrecognized => 2,
        }
    }
}

/// The primaries/transfer pair signaled by a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorDescription {
    pub primaries: Primaries,
    pub transfer: Transfer,
}

/// Display P3: the fallback attached to output images without a
/// description of their own.
pub const DISPLAY_P3: ColorDescription = ColorDescription {
    primaries: Primaries::DisplayP3,
    transfer: Transfer::Srgb,
};

impl ColorDescription {
    pub fn from_nclx(nclx: &ColorProfileNCLX) -> Self {
        // Discriminants of the named libheif variants are the CICP
        // codes themselves; only Unknown carries no usable value.
        let primaries = match nclx.color_primaries() {
            ColorPrimaries::ITU_R_BT_709_5 => Primaries::Bt709,
            ColorPrimaries::ITU_R_BT_2020_2_and_2100_0 => Primaries::Bt2020,
            ColorPrimaries::SMPTE_RP_431_2 => Primaries::DciP3,
            ColorPrimaries::SMPTE_EG_432_1 => Primaries::DisplayP3,
            ColorPrimaries::Unknown => Primaries::Unrecognized,
            other => Primaries::Other(other as u16),
        };
        let transfer = match nclx.transfer_characteristics() {
            TransferCharacteristics::IEC_61966_2_1 => Transfer::Srgb,
            TransferCharacteristics::ITU_R_BT_2100_0_PQ => Transfer::Pq,
            TransferCharacteristics::ITU_R_BT_2100_0_HLG => Transfer::Hlg,
            TransferCharacteristics::Unknown => Transfer::Unrecognized,
            other => Transfer::Other(other as u16),
        };
        ColorDescription { primaries, transfer }
    }

    /// Name used in the diagnostics block. Combinations without an
    /// established name fall back to the raw code points.
    pub fn name(&self) -> String {
        match (self.primaries, self.transfer) {
            (Primaries::Unrecognized, _) | (_, Transfer::Unrecognized) => {
                "unrecognized".to_string()
            }
            (Primaries::Bt709, Transfer::Srgb) => "sRGB IEC61966-2.1".to_string(),
            (Primaries::DisplayP3, Transfer::Srgb) => "Display P3".to_string(),
            (Primaries::DisplayP3, Transfer::Pq) => "Display P3 PQ".to_string(),
            (Primaries::DisplayP3, Transfer::Hlg) => "Display P3 HLG".to_string(),
            (Primaries::Bt2020, Transfer::Pq) => "BT.2100 PQ".to_string(),
            (Primaries::Bt2020, Transfer::Hlg) => "BT.2100 HLG".to_string(),
            (Primaries::Bt2020, _) => "BT.2020".to_string(),
            (Primaries::DciP3, Transfer::Pq) => "DCI-P3 PQ".to_string(),
            (Primaries::DciP3, _) => "DCI-P3".to_string(),
            (primaries, transfer) => format!("CICP {}/{}", primaries.code(), transfer.code()),
        }
    }
}

/// Builds the Display P3 nclx profile for output images that carry no
/// color description of their own.
///
/// A freshly allocated profile carries libheif's sRGB defaults,
/// transfer IEC 61966-2-1 included, so moving the primaries to
/// SMPTE EG 432-1 is all Display P3 needs.
pub fn display_p3_nclx() -> Result<ColorProfileNCLX> {
    let mut profile = ColorProfileNCLX::new().ok_or_else(|| {
        HeicMergeError::EncodeError("Failed to allocate nclx color profile".to_string())
    })?;
    profile.set_color_primaries(ColorPrimaries::SMPTE_EG_432_1);
    Ok(profile)
}
