// Copyright 2024 Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! CPU capability bits from the ELF auxiliary vector.

use super::Features;

/// Reads the `AT_HWCAP` capability word.
///
/// The kernel reports LoongArch capabilities as a flat 32-bit mask whose bit
/// assignment matches [`Features`], so the word is reinterpreted as-is,
/// retaining bits this crate does not know about. `getauxval` returns 0 for
/// absent entries, so there is no failure path.
#[must_use]
pub fn hwcap_features() -> Features {
    // SAFETY: `getauxval` only reads the process auxiliary vector and has no
    // preconditions.
    let hwcap = unsafe { libc::getauxval(libc::AT_HWCAP) };
    Features::from_bits_retain((hwcap & u64::from(u32::MAX)) as u32)
}
