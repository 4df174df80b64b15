// Copyright 2024 Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! Packed 32-bit CPUCFG identifier.
//!
//! The identifier encodes five subfields describing a LoongArch core:
//!
//! ```text
//! +-------------+-------+
//! | field       | bits  |
//! +-------------+-------+
//! | implementer | 24-31 |
//! | variant     | 20-23 |
//! | part        | 16-19 |
//! | revision    |  4-15 |
//! | suffix      |   0-3 |
//! +-------------+-------+
//! ```
//!
//! All accessors are pure bit-mask/shift transforms. Out-of-range inputs are
//! silently truncated to the field width, matching the fixed widths of the
//! hardware register the layout mirrors.

const IMPLEMENTER_MASK: u32 = 0xFF00_0000;
const VARIANT_MASK: u32 = 0x00F0_0000;
const PART_MASK: u32 = 0x000F_0000;
const REVISION_MASK: u32 = 0x0000_FFF0;
const SUFFIX_MASK: u32 = 0x0000_000F;

const IMPLEMENTER_OFFSET: u32 = 24;
const VARIANT_OFFSET: u32 = 20;
const PART_OFFSET: u32 = 16;
const REVISION_OFFSET: u32 = 4;
const SUFFIX_OFFSET: u32 = 0;

/// A packed CPUCFG identifier.
///
/// Before the `model name` line of `/proc/cpuinfo` is decoded, the parser also
/// uses this value to carry the raw processor index.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CpucfgId(pub u32);

/// Generates the get/set/copy triple for one subfield.
macro_rules! cpucfg_field {
    ($field:ident, $get:ident, $set:ident, $copy:ident, $mask:expr, $offset:expr) => {
        #[doc = concat!("Returns the ", stringify!($field), " subfield.")]
        #[must_use]
        pub const fn $get(self) -> u32 {
            (self.0 & $mask) >> $offset
        }

        #[doc = concat!(
            "Returns a new identifier with the ",
            stringify!($field),
            " subfield set to `value`, truncated to the field width. Bits \
             outside the field are left untouched."
        )]
        #[must_use]
        pub const fn $set(self, value: u32) -> Self {
            Self((self.0 & !$mask) | ((value << $offset) & $mask))
        }

        #[doc = concat!(
            "Returns a new identifier with the ",
            stringify!($field),
            " subfield taken from `other` and every other bit taken from \
             `self`."
        )]
        #[must_use]
        pub const fn $copy(self, other: Self) -> Self {
            Self((self.0 & !$mask) | (other.0 & $mask))
        }
    };
}

impl CpucfgId {
    cpucfg_field!(
        implementer,
        implementer,
        set_implementer,
        copy_implementer,
        IMPLEMENTER_MASK,
        IMPLEMENTER_OFFSET
    );
    cpucfg_field!(
        variant,
        variant,
        set_variant,
        copy_variant,
        VARIANT_MASK,
        VARIANT_OFFSET
    );
    cpucfg_field!(part, part, set_part, copy_part, PART_MASK, PART_OFFSET);
    cpucfg_field!(
        revision,
        revision,
        set_revision,
        copy_revision,
        REVISION_MASK,
        REVISION_OFFSET
    );
    cpucfg_field!(
        suffix,
        suffix,
        set_suffix,
        copy_suffix,
        SUFFIX_MASK,
        SUFFIX_OFFSET
    );
}
