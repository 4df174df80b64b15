// Copyright 2024 Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! Chipset (packaged CPU product) classification from the `/proc/cpuinfo`
//! hardware description string.
//!
//! This is independent of the microarchitecture resolver: both consume the
//! same text source but operate on different fields, and reconciling the two
//! classifications is the caller's concern.

use std::fmt;

use log::{debug, warn};

/// Chipset vendor.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum ChipsetVendor {
    /// The hardware string did not match any known signature.
    #[default]
    Unknown,
    /// Loongson Technology.
    Loongson,
}

/// Chipset product series.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum ChipsetSeries {
    /// The hardware string did not match any known signature.
    #[default]
    Unknown,
    /// Loongson 3 series (3A5000 and friends).
    Series3,
}

/// Maximum length of the model suffix, in bytes.
pub const CHIPSET_SUFFIX_MAX: usize = 8;

/// A decoded chipset name.
///
/// `model == 0` denotes a series-only name; the suffix is only meaningful
/// alongside a nonzero model.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Chipset {
    /// Chipset vendor, always derived from the series.
    pub vendor: ChipsetVendor,
    /// Product series.
    pub series: ChipsetSeries,
    /// Numeric model within the series, 0 when absent.
    pub model: u32,
    /// NUL-padded model suffix letters.
    pub suffix: [u8; CHIPSET_SUFFIX_MAX],
}

/// Tabulated hardware strings for chipsets that cannot otherwise be detected.
struct SpecialMapEntry {
    platform: &'static str,
    series: ChipsetSeries,
    model: u32,
    suffix: u8,
}

static SPECIAL_HARDWARE_MAP: &[SpecialMapEntry] = &[
    // "A5000" -> Loongson 3 series
    SpecialMapEntry {
        platform: "A5000",
        series: ChipsetSeries::Series3,
        model: 0,
        suffix: 0,
    },
];

/// Maps a chipset series to its vendor, so vendor identifiers never need to
/// be stored in the tables.
const fn series_vendor(series: ChipsetSeries) -> ChipsetVendor {
    match series {
        ChipsetSeries::Unknown => ChipsetVendor::Unknown,
        ChipsetSeries::Series3 => ChipsetVendor::Loongson,
    }
}

const fn series_string(series: ChipsetSeries) -> Option<&'static str> {
    match series {
        ChipsetSeries::Unknown => None,
        ChipsetSeries::Series3 => Some("3"),
    }
}

const fn vendor_string(vendor: ChipsetVendor) -> &'static str {
    match vendor {
        ChipsetVendor::Unknown => "Unknown",
        ChipsetVendor::Loongson => "Loongson",
    }
}

/// Decodes a chipset name from a `/proc/cpuinfo` hardware description string.
///
/// `is_loongson` is the caller's pre-classification of the platform; when it
/// is false the table scan is skipped entirely. An unrecognized string is not
/// an error: the returned descriptor uses the `Unknown` vendor and series
/// identifiers.
#[must_use]
pub fn decode_chipset_from_hardware(hardware: &str, is_loongson: bool) -> Chipset {
    if is_loongson {
        for entry in SPECIAL_HARDWARE_MAP {
            if entry.platform == hardware {
                debug!(
                    "found /proc/cpuinfo Hardware string {hardware:?} in special chipset table"
                );
                let mut suffix = [0u8; CHIPSET_SUFFIX_MAX];
                suffix[0] = entry.suffix;
                return Chipset {
                    vendor: series_vendor(entry.series),
                    series: entry.series,
                    model: entry.model,
                    suffix,
                };
            }
        }
    }

    Chipset::default()
}

/// Rewrites known-buggy or renamed chipset names after resolution.
///
/// No corrections are currently documented, so this pass is a no-op.
pub fn fixup_chipset(chipset: &mut Chipset) {
    match chipset.series {
        _ => {}
    }
}

/// Decodes and fixes up a chipset name from a hardware description string.
///
/// A failed classification is logged but still returned as the `Unknown`
/// descriptor; the caller decides what to do with it.
#[must_use]
pub fn decode_chipset(hardware: &str) -> Chipset {
    let mut chipset = decode_chipset_from_hardware(hardware, true);
    if chipset.vendor == ChipsetVendor::Unknown {
        warn!("chipset detection failed: /proc/cpuinfo Hardware string did not match known signatures");
    } else {
        fixup_chipset(&mut chipset);
    }
    chipset
}

impl Chipset {
    fn suffix_str(&self) -> &str {
        let len = self
            .suffix
            .iter()
            .position(|&byte| byte == 0)
            .unwrap_or(CHIPSET_SUFFIX_MAX);
        // The suffix is populated from ASCII table entries only.
        std::str::from_utf8(&self.suffix[..len]).unwrap_or("")
    }
}

impl fmt::Display for Chipset {
    /// Renders the chipset as a display name: vendor alone when nothing else
    /// is known, `<vendor> <series>` for series-only names, and
    /// `<vendor> <series><model><suffix>` otherwise.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let vendor = vendor_string(self.vendor);
        if self.model == 0 {
            match series_string(self.series) {
                None => write!(f, "{vendor}"),
                Some(series) => write!(f, "{vendor} {series}"),
            }
        } else {
            let series = series_string(self.series).unwrap_or("");
            write!(f, "{vendor} {series}{}{}", self.model, self.suffix_str())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognized_hardware_string_resolves() {
        let chipset = decode_chipset_from_hardware("A5000", true);
        assert_eq!(chipset.vendor, ChipsetVendor::Loongson);
        assert_eq!(chipset.series, ChipsetSeries::Series3);
        assert_eq!(chipset.model, 0);
    }

    #[test]
    fn vendor_hint_false_skips_the_table() {
        let chipset = decode_chipset_from_hardware("A5000", false);
        assert_eq!(chipset.vendor, ChipsetVendor::Unknown);
        assert_eq!(chipset.series, ChipsetSeries::Unknown);
    }

    #[test]
    fn unrecognized_hardware_string_is_unknown() {
        let chipset = decode_chipset_from_hardware("SnapDragon", true);
        assert_eq!(chipset, Chipset::default());
    }

    #[test]
    fn match_is_exact_and_case_sensitive() {
        assert_eq!(decode_chipset_from_hardware("a5000", true), Chipset::default());
        assert_eq!(decode_chipset_from_hardware("A5000 ", true), Chipset::default());
        assert_eq!(decode_chipset_from_hardware("A500", true), Chipset::default());
    }

    #[test]
    fn decoding_is_idempotent() {
        assert_eq!(decode_chipset("A5000"), decode_chipset("A5000"));
    }

    #[test]
    fn formats_full_model_name() {
        let mut suffix = [0u8; CHIPSET_SUFFIX_MAX];
        suffix[0] = b'A';
        let chipset = Chipset {
            vendor: ChipsetVendor::Loongson,
            series: ChipsetSeries::Series3,
            model: 5000,
            suffix,
        };
        assert_eq!(chipset.to_string(), "Loongson 35000A");
    }

    #[test]
    fn formats_series_only_name() {
        let chipset = Chipset {
            vendor: ChipsetVendor::Loongson,
            series: ChipsetSeries::Series3,
            model: 0,
            suffix: [0; CHIPSET_SUFFIX_MAX],
        };
        assert_eq!(chipset.to_string(), "Loongson 3");
    }

    #[test]
    fn formats_vendor_only_name() {
        let chipset = Chipset {
            vendor: ChipsetVendor::Loongson,
            series: ChipsetSeries::Unknown,
            model: 0,
            suffix: [0; CHIPSET_SUFFIX_MAX],
        };
        assert_eq!(chipset.to_string(), "Loongson");
    }

    #[test]
    fn formats_fully_unknown_name() {
        assert_eq!(Chipset::default().to_string(), "Unknown");
    }
}
