// Copyright 2024 Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! Linux-specific CPU identification sources: `/proc/cpuinfo`, the auxiliary
//! vector, and the chipset lookup tables.

use bitflags::bitflags;

use crate::cpucfg_id::CpucfgId;

pub mod chipset;
pub mod hwcap;
pub mod proc_cpuinfo;

bitflags! {
    /// CPU capability bits reported by the kernel.
    ///
    /// Bit positions match the `HWCAP_LOONGARCH_*` constants from the Linux
    /// UAPI, so the `AT_HWCAP` word can be stored here without translation.
    /// The same bits are set when decoding the `features` line of
    /// `/proc/cpuinfo`.
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
    pub struct Features: u32 {
        /// CPUCFG instruction is available to user mode.
        const CPUCFG = 1 << 0;
        /// Atomic memory access instructions.
        const LAM = 1 << 1;
        /// Unaligned access support.
        const UAL = 1 << 2;
        /// Floating-point unit.
        const FPU = 1 << 3;
        /// 128-bit SIMD extension.
        const LSX = 1 << 4;
        /// 256-bit SIMD extension.
        const LASX = 1 << 5;
        /// CRC32 instructions.
        const CRC32 = 1 << 6;
        /// Complex-number instructions.
        const COMPLEX = 1 << 7;
        /// Crypto instructions.
        const CRYPTO = 1 << 8;
        /// Virtualization extension.
        const LVZ = 1 << 9;
        /// x86 binary translation extension.
        const LBT_X86 = 1 << 10;
        /// Arm binary translation extension.
        const LBT_ARM = 1 << 11;
        /// MIPS binary translation extension.
        const LBT_MIPS = 1 << 12;
    }
}

bitflags! {
    /// Provenance flags recording which parts of a [`Processor`] record were
    /// actually populated from input.
    ///
    /// A `cpucfg_id` subfield is only meaningful when its validity bit is
    /// set; unset subfields keep their zero default and must not be trusted
    /// by downstream resolvers.
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
    pub struct ValidFlags: u32 {
        /// The processor slot was mentioned in `/proc/cpuinfo` at all.
        const PROCESSOR = 1 << 0;
        /// A `features` line was seen for this slot.
        const FEATURES = 1 << 1;
        /// The implementer subfield was decoded from the model name.
        const IMPLEMENTER = 1 << 2;
        /// The variant subfield was decoded from the model name.
        const VARIANT = 1 << 3;
        /// The part subfield was decoded from the model name.
        const PART = 1 << 4;
        /// The revision subfield was decoded from the model name.
        const REVISION = 1 << 5;
        /// The suffix subfield was decoded from the model name.
        const SUFFIX = 1 << 6;
    }
}

/// Per-logical-processor identification record.
///
/// The caller allocates one zeroed record per possible processor and hands
/// the slice to [`proc_cpuinfo::parse_proc_cpuinfo`], which fills matching
/// slots in place. Slots are never removed or reallocated during a parse.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Processor {
    /// Packed identifier decoded from the `model name` line. Holds the raw
    /// processor index until that line is seen.
    pub cpucfg_id: CpucfgId,
    /// OR-accumulated capability bits.
    pub features: Features,
    /// Which of the above fields were populated from input.
    pub flags: ValidFlags,
}
