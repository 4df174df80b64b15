// Copyright 2024 Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! Utilities for identifying the LoongArch CPU a program is running on.
//!
//! The crate turns two raw data sources into structured, queryable
//! descriptions:
//!
//! - the textual `/proc/cpuinfo` pseudo-file, parsed line by line into
//!   per-processor records carrying a packed [`CpucfgId`] identifier and a
//!   [`linux::Features`] capability mask, and
//! - the `AT_HWCAP` auxiliary-vector word, reinterpreted into the same
//!   capability mask.
//!
//! Finalized identifiers are classified into a ([`Vendor`], [`Uarch`]) pair,
//! and hardware description strings into a [`linux::chipset::Chipset`]
//! display name. Callers that need to pick the fastest code path for the
//! actual silicon run the parse once at startup and query the records.
//!
//! Malformed input is never fatal: anomalies are reported through the [`log`]
//! facade and skipped, and resolvers fall back to explicit `Unknown`
//! sentinels. The only hard failure is `/proc/cpuinfo` being unreadable.

/// Packed 32-bit identifier codec.
pub mod cpucfg_id;

/// Linux data sources: `/proc/cpuinfo`, `AT_HWCAP`, chipset tables.
pub mod linux;

/// Vendor and microarchitecture resolution.
pub mod uarch;

pub use cpucfg_id::CpucfgId;
pub use uarch::{decode_vendor_uarch, Uarch, Vendor};
