//! Content headroom derivation.
//!
//! Headroom is the ratio between the brightest pixel of the HDR rendition
//! in linear light and SDR reference white (203 cd/m², ITU-R BT.2408). An
//! SDR image has a headroom of 1.0; a PQ image peaking at 1000 cd/m² has a
//! headroom just under 5.

use crate::color::Transfer;

/// SDR reference white in cd/m² (ITU-R BT.2408).
pub const SDR_WHITE_NITS: f32 = 203.0;

/// PQ signal peak in cd/m²; SMPTE ST 2084 encodes 0 to 10000.
const PQ_PEAK_NITS: f32 = 10000.0;

/// Nominal peak of the HLG reference display in cd/m² (ITU-R BT.2100).
const HLG_PEAK_NITS: f32 = 1000.0;

// SMPTE ST 2084 constants
const PQ_M1: f32 = 2610.0 / 16384.0;
const PQ_M2: f32 = 2523.0 / 4096.0 * 128.0;
const PQ_C1: f32 = 3424.0 / 4096.0;
const PQ_C2: f32 = 2413.0 / 4096.0 * 32.0;
const PQ_C3: f32 = 2392.0 / 4096.0 * 32.0;

// ARIB STD-B67 constants
const HLG_A: f32 = 0.17883277;
const HLG_B: f32 = 0.28466892;
const HLG_C: f32 = 0.55991073;

/// Headroom of content whose brightest R/G/B sample, normalized to
/// [0, 1], is `max_component` under the given transfer. Never below 1.0.
pub fn content_headroom(transfer: Transfer, max_component: f32) -> f32 {
    let peak_nits = match transfer {
        Transfer::Pq => pq_eotf(max_component) * PQ_PEAK_NITS,
        Transfer::Hlg => hlg_eotf(max_component, HLG_PEAK_NITS),
        Transfer::Srgb | Transfer::Other(_) | Transfer::Unrecognized => SDR_WHITE_NITS,
    };
    (peak_nits / SDR_WHITE_NITS).max(1.0)
}

/// PQ EOTF (SMPTE ST 2084): encoded [0, 1] to display-relative linear
/// [0, 1], where 1.0 is 10000 cd/m².
fn pq_eotf(encoded: f32) -> f32 {
    let e_inv_m2 = encoded.powf(1.0 / PQ_M2);
    let numerator = (e_inv_m2 - PQ_C1).max(0.0);
    let denominator = PQ_C2 - PQ_C3 * e_inv_m2;
    if denominator <= 0.0 {
        return 0.0;
    }
    (numerator / denominator).powf(1.0 / PQ_M1)
}

/// Inverse HLG OETF: encoded [0, 1] to scene-relative linear [0, 1].
fn hlg_oetf_inv(encoded: f32) -> f32 {
    if encoded <= 0.5 {
        encoded * encoded / 3.0
    } else {
        ((encoded - HLG_C) / HLG_A).exp() / 12.0 + HLG_B / 12.0
    }
}

/// HLG OOTF for a display of the given peak. The single component stands
/// in for scene luminance, which slightly overstates saturated peaks.
fn hlg_ootf(scene_linear: f32, display_peak_nits: f32) -> f32 {
    let gamma = (1.2 + 0.42 * (display_peak_nits / 1000.0).log10()).clamp(1.0, 1.5);
    scene_linear.powf(gamma - 1.0) * scene_linear * display_peak_nits
}

/// HLG EOTF: encoded [0, 1] to cd/m² on a display of the given peak.
fn hlg_eotf(encoded: f32, display_peak_nits: f32) -> f32 {
    hlg_ootf(hlg_oetf_inv(encoded), display_peak_nits)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const EPSILON: f32 = 1e-3;

    #[test]
    fn test_pq_eotf_reference_points() {
        // PQ code value 0.751827 is the 1000 cd/m² point.
        assert!((pq_eotf(0.751827) - 0.1).abs() < EPSILON);
        assert!((pq_eotf(1.0) - 1.0).abs() < EPSILON);
        assert_eq!(pq_eotf(0.0), 0.0);
    }

    #[test]
    fn test_hlg_eotf_reference_points() {
        // Full signal reaches the display peak.
        assert!((hlg_eotf(1.0, 1000.0) - 1000.0).abs() < 0.5);
        // Half signal lands near 5% of peak.
        assert!((hlg_eotf(0.5, 1000.0) - 50.7).abs() < 0.5);
        assert_eq!(hlg_eotf(0.0, 1000.0), 0.0);
    }

    #[test]
    fn test_sdr_transfers_have_unit_headroom() {
        assert_eq!(content_headroom(Transfer::Srgb, 1.0), 1.0);
        assert_eq!(content_headroom(Transfer::Other(6), 1.0), 1.0);
        assert_eq!(content_headroom(Transfer::Unrecognized, 1.0), 1.0);
    }

    #[test]
    fn test_pq_full_signal_headroom() {
        let headroom = content_headroom(Transfer::Pq, 1.0);
        assert!((headroom - PQ_PEAK_NITS / SDR_WHITE_NITS).abs() < EPSILON);
    }

    #[test]
    fn test_hlg_full_signal_headroom() {
        let headroom = content_headroom(Transfer::Hlg, 1.0);
        assert!((headroom - HLG_PEAK_NITS / SDR_WHITE_NITS).abs() < 0.01);
    }

    #[test]
    fn test_dim_pq_content_is_floored_at_one() {
        // PQ encodes 203 cd/m² near 0.5801; anything below is SDR range.
        assert_eq!(content_headroom(Transfer::Pq, 0.58), 1.0);
        assert_eq!(content_headroom(Transfer::Pq, 0.0), 1.0);
    }

    proptest! {
        #[test]
        fn prop_headroom_never_below_one(code in any::<u16>(), max in 0.0f32..=1.0f32) {
            prop_assert!(content_headroom(Transfer::from_code(code), max) >= 1.0);
        }

        #[test]
        fn prop_pq_headroom_is_monotonic(a in 0.0f32..=1.0f32, b in 0.0f32..=1.0f32) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(
                content_headroom(Transfer::Pq, lo) <= content_headroom(Transfer::Pq, hi)
            );
        }

        #[test]
        fn prop_hlg_headroom_is_monotonic(a in 0.0f32..=1.0f32, b in 0.0f32..=1.0f32) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(
                content_headroom(Transfer::Hlg, lo) <= content_headroom(Transfer::Hlg, hi)
            );
        }
    }
}
