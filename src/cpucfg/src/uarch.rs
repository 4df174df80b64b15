// Copyright 2024 Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! Vendor and microarchitecture classification from a CPUCFG identifier.

use crate::cpucfg_id::CpucfgId;

/// CPU core designer.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Vendor {
    /// No rule matched the identifier.
    #[default]
    Unknown,
    /// Loongson Technology.
    Loongson,
}

/// CPU core microarchitecture.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Uarch {
    /// No rule matched the identifier.
    #[default]
    Unknown,
    /// LA464 core (Loongson 3A5000/3C5000 family).
    La464,
    /// LA664 core (Loongson 3A6000 family).
    La664,
}

/// Derives the (vendor, microarchitecture) pair from a finalized identifier.
///
/// The implementer subfield is reinterpreted as an offset from ASCII `'A'`;
/// `'L'` selects Loongson and narrows further on the variant and revision
/// subfields. Any unrecognized implementer letter or (variant, revision)
/// combination is reported as `Unknown`. Pure function, no logging.
#[must_use]
pub fn decode_vendor_uarch(id: CpucfgId) -> (Vendor, Uarch) {
    let implementer_letter = u32::from(b'A') + id.implementer();
    if implementer_letter == u32::from(b'L') {
        let uarch = match (id.variant(), id.revision()) {
            (3, 5) => Uarch::La464,
            (3, 6) => Uarch::La664,
            _ => Uarch::Unknown,
        };
        (Vendor::Loongson, uarch)
    } else {
        (Vendor::Unknown, Uarch::Unknown)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loongson_id(variant: u32, revision: u32) -> CpucfgId {
        CpucfgId(0)
            .set_implementer(u32::from(b'L' - b'A'))
            .set_variant(variant)
            .set_revision(revision)
    }

    #[test]
    fn decodes_la464() {
        assert_eq!(
            decode_vendor_uarch(loongson_id(3, 5)),
            (Vendor::Loongson, Uarch::La464)
        );
    }

    #[test]
    fn decodes_la664() {
        assert_eq!(
            decode_vendor_uarch(loongson_id(3, 6)),
            (Vendor::Loongson, Uarch::La664)
        );
    }

    #[test]
    fn unknown_revision_keeps_vendor() {
        assert_eq!(
            decode_vendor_uarch(loongson_id(3, 9)),
            (Vendor::Loongson, Uarch::Unknown)
        );
    }

    #[test]
    fn unknown_implementer_is_terminal() {
        let id = CpucfgId(0).set_implementer(u32::from(b'Q' - b'A'));
        assert_eq!(decode_vendor_uarch(id), (Vendor::Unknown, Uarch::Unknown));
    }

    #[test]
    fn decoding_is_idempotent() {
        let id = loongson_id(3, 5);
        assert_eq!(decode_vendor_uarch(id), decode_vendor_uarch(id));
    }
}
