// Copyright 2024 Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! `/proc/cpuinfo` parsing.
//!
//! The parser works line by line in a single forward pass. Lines have the
//! format `<key>[ \t]*:[ ]*<value>`. An example dump from a Loongson 3A5000:
//!
//! ```text
//! system type             : generic-loongson-machine
//! processor               : 0
//! package                 : 0
//! core                    : 0
//! cpu family              : Loongson-64bit
//! model name              : Loongson-3A5000
//! CPU Revision            : 0x10
//! FPU Revision            : 0x00
//! CPU MHz                 : 2300.00
//! BogoMIPS                : 4600.00
//! TLB entries             : 2112
//! Address sizes           : 48 bits physical, 48 bits virtual
//! isa                     : loongarch32 loongarch64
//! features                : cpucfg lam ual fpu lsx lasx complex crypto lvz lbt_x86 lbt_arm lbt_mips
//! hardware watchpoint     : yes, iwatch count: 8, dwatch count: 8
//! ```
//!
//! Malformed input never aborts a parse: every anomaly is logged and the
//! offending line, token or subfield is skipped. The only caller-visible
//! failure is the source file being unreadable.

use std::{fs, io};

use log::{debug, info, warn};

use super::{Features, Processor, ValidFlags};
use crate::cpucfg_id::CpucfgId;

/// Path of the kernel's CPU description pseudo-file.
pub const PROC_CPUINFO_PATH: &str = "/proc/cpuinfo";

/// Upper bound on the length of a single `/proc/cpuinfo` line, in bytes.
/// Longer lines are truncated to this bound before parsing.
const MAX_LINE_LEN: usize = 1024;

/// Error type for [`parse_proc_cpuinfo`].
#[derive(Debug, thiserror::Error, displaydoc::Display)]
pub enum ProcCpuinfoError {
    /// Failed to read /proc/cpuinfo: {0}
    Io(#[from] io::Error),
}

/// Parses `/proc/cpuinfo` and fills the caller-provided processor records.
///
/// The slice length is the maximum number of logical processors the caller
/// supports; lines referring to higher indices are logged and absorbed by an
/// internal sink record, never written out of bounds.
///
/// # Errors
///
/// When `/proc/cpuinfo` cannot be opened or read. Parse-level anomalies are
/// logged and skipped, they are not errors.
pub fn parse_proc_cpuinfo(processors: &mut [Processor]) -> Result<(), ProcCpuinfoError> {
    let text = fs::read_to_string(PROC_CPUINFO_PATH)?;
    parse_str(&text, processors);
    Ok(())
}

/// Parses an in-memory `/proc/cpuinfo` text buffer.
///
/// Exposed separately from [`parse_proc_cpuinfo`] so that captured dumps can
/// be decoded offline.
pub fn parse_str(text: &str, processors: &mut [Processor]) {
    let mut state = ParserState {
        processor_index: 0,
        processors,
        sink: Processor::default(),
    };
    for line in text.lines() {
        state.parse_line(bound_line(line));
    }
}

/// Truncates a line to [`MAX_LINE_LEN`] bytes, backing off to a character
/// boundary. The input is ASCII in practice, so the back-off is a no-op.
fn bound_line(line: &str) -> &str {
    if line.len() <= MAX_LINE_LEN {
        return line;
    }
    debug!(
        "/proc/cpuinfo line of {} bytes truncated to {} bytes",
        line.len(),
        MAX_LINE_LEN
    );
    let mut end = MAX_LINE_LEN;
    while !line.is_char_boundary(end) {
        end -= 1;
    }
    &line[..end]
}

/// Transient parse state, one per invocation.
///
/// `processor_index` only moves when a `processor :` line is seen; until the
/// next such line every field write targets the record at the current index,
/// or `sink` when the index exceeds the caller's slice.
#[derive(Debug)]
struct ParserState<'a> {
    processor_index: u32,
    processors: &'a mut [Processor],
    sink: Processor,
}

impl ParserState<'_> {
    fn current_record(&mut self) -> &mut Processor {
        match self.processors.get_mut(self.processor_index as usize) {
            Some(processor) => processor,
            None => &mut self.sink,
        }
    }

    fn parse_line(&mut self, line: &str) {
        if line.is_empty() {
            return;
        }

        let Some((raw_key, raw_value)) = line.split_once(':') else {
            info!("Line {line:?} in /proc/cpuinfo is ignored: key/value separator ':' not found");
            return;
        };

        let key = raw_key.trim_end_matches([' ', '\t']);
        if key.is_empty() {
            info!("Line {line:?} in /proc/cpuinfo is ignored: key contains only spaces");
            return;
        }

        let value = raw_value.trim_start_matches(' ').trim_end_matches(' ');
        if value.is_empty() {
            info!("Line {line:?} in /proc/cpuinfo is ignored: value contains only spaces");
            return;
        }

        match key {
            "processor" => self.parse_processor_number(value),
            "features" => parse_features(value, self.current_record()),
            "model name" => parse_model_name(value, self.current_record()),
            // Recognized keys that carry nothing we presently need.
            "system type" | "package" | "core" | "cpu family" | "CPU Revision"
            | "FPU Revision" | "CPU MHz" | "BogoMIPS" | "TLB entries" | "Address sizes"
            | "isa" | "hardware watchpoint" => {}
            _ => debug!("unknown /proc/cpuinfo key: {key}"),
        }
    }

    /// Handles a `processor : <n>` line, re-homing the current-record context.
    fn parse_processor_number(&mut self, value: &str) {
        let new_index = parse_decimal_prefix(value);

        if new_index < self.processor_index {
            // Strange: decreasing processor number.
            warn!(
                "unexpectedly low processor number {new_index} following processor {} in \
                 /proc/cpuinfo",
                self.processor_index
            );
        } else if new_index > self.processor_index + 1 {
            // Strange, but common: offline or isolated processors leave gaps.
            info!(
                "unexpectedly high processor number {new_index} following processor {} in \
                 /proc/cpuinfo",
                self.processor_index
            );
        }

        match self.processors.get_mut(new_index as usize) {
            Some(processor) => {
                // Record that the processor was mentioned in /proc/cpuinfo,
                // and stash the raw index in the identifier until a model
                // name line overwrites it.
                processor.flags |= ValidFlags::PROCESSOR;
                processor.cpucfg_id = CpucfgId(new_index);
            }
            None => warn!(
                "processor {new_index} in /proc/cpuinfo is ignored: index exceeds system limit {}",
                self.processors.len().saturating_sub(1)
            ),
        }
        self.processor_index = new_index;
    }
}

/// Parses the leading decimal run of a processor number value. A non-decimal
/// tail truncates the parse; an empty value yields index 0.
fn parse_decimal_prefix(value: &str) -> u32 {
    if value.is_empty() {
        warn!("Processor number in /proc/cpuinfo is ignored: string is empty");
        return 0;
    }

    let mut number: u32 = 0;
    for (position, byte) in value.bytes().enumerate() {
        if !byte.is_ascii_digit() {
            warn!(
                "non-decimal suffix {:?} in /proc/cpuinfo processor number is ignored",
                &value[position..]
            );
            break;
        }
        number = number
            .wrapping_mul(10)
            .wrapping_add(u32::from(byte - b'0'));
    }
    number
}

/// Decodes a `features` line, OR-ing recognized tokens into the record's
/// capability mask.
fn parse_features(value: &str, processor: &mut Processor) {
    // The features are valid as soon as the line is seen, even if no token
    // below matches.
    processor.flags |= ValidFlags::FEATURES | ValidFlags::PROCESSOR;

    for token in value.split_ascii_whitespace() {
        let feature = match token {
            "cpucfg" => Features::CPUCFG,
            "lam" => Features::LAM,
            "ual" => Features::UAL,
            "fpu" => Features::FPU,
            "lsx" => Features::LSX,
            "lasx" => Features::LASX,
            "crc32" => Features::CRC32,
            "complex" => Features::COMPLEX,
            "crypto" => Features::CRYPTO,
            "lvz" => Features::LVZ,
            "lbt_x86" => Features::LBT_X86,
            "lbt_arm" => Features::LBT_ARM,
            "lbt_mips" => Features::LBT_MIPS,
            _ => {
                warn!("unexpected /proc/cpuinfo feature {token:?} is ignored");
                continue;
            }
        };
        processor.features |= feature;
    }
}

/// Decodes a `model name` line of the shape `<model-code>-<rest>`, e.g.
/// `Loongson-3A5000`.
///
/// The model code must be exactly 8 bytes and the rest 6 or 7 bytes. Within
/// the rest, byte 0 is the variant digit, byte 1 the part letter, byte 2 the
/// revision digit (confirmed by byte 5 being `'0'`) and, for 7-byte rests,
/// byte 3 the suffix letter. Each subfield whose precondition holds sets the
/// identifier bits and its validity flag; a failed precondition leaves that
/// one subfield unset.
fn parse_model_name(value: &str, processor: &mut Processor) {
    let Some((model, rest)) = value.split_once('-') else {
        warn!("Model {value:?} in /proc/cpuinfo is ignored: no '-' separator found");
        return;
    };
    if model.len() != 8 {
        warn!(
            "Model {model:?} in /proc/cpuinfo is ignored due to unexpected length ({})",
            model.len()
        );
        return;
    }
    if rest.len() < 6 || rest.len() > 7 {
        warn!(
            "Model {rest:?} in /proc/cpuinfo is ignored due to unexpected length ({})",
            rest.len()
        );
        return;
    }

    let model = model.as_bytes();
    let rest = rest.as_bytes();

    if model[0] == b'l' || model[0] == b'L' {
        let implementer = u32::from(model[0]).wrapping_sub(u32::from(b'A'));
        processor.cpucfg_id = processor.cpucfg_id.set_implementer(implementer);
        processor.flags |= ValidFlags::IMPLEMENTER | ValidFlags::PROCESSOR;
    } else {
        warn!("Model {value:?} in /proc/cpuinfo is ignored due to unexpected leading character");
        return;
    }

    let variant = u32::from(rest[0]).wrapping_sub(u32::from(b'0'));
    if variant < 10 {
        processor.cpucfg_id = processor.cpucfg_id.set_variant(variant);
        processor.flags |= ValidFlags::VARIANT | ValidFlags::PROCESSOR;
    }

    let part = u32::from(rest[1]).wrapping_sub(u32::from(b'A'));
    if part < 26 {
        // Part codes start past the variant digit range.
        processor.cpucfg_id = processor.cpucfg_id.set_part(part + 25);
        processor.flags |= ValidFlags::PART | ValidFlags::PROCESSOR;
    }

    let revision = u32::from(rest[2]).wrapping_sub(u32::from(b'0'));
    if revision < 10 && rest[5] == b'0' {
        processor.cpucfg_id = processor.cpucfg_id.set_revision(revision);
        processor.flags |= ValidFlags::REVISION | ValidFlags::PROCESSOR;
    }

    if rest.len() == 7 {
        let suffix = u32::from(rest[3]).wrapping_sub(u32::from(b'A'));
        processor.cpucfg_id = processor.cpucfg_id.set_suffix(suffix);
        processor.flags |= ValidFlags::SUFFIX | ValidFlags::PROCESSOR;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CPUINFO_3A5000: &str = "\
system type\t\t: generic-loongson-machine
processor\t\t: 0
package\t\t\t: 0
core\t\t\t: 0
cpu family\t\t: Loongson-64bit
model name\t\t: Loongson-3A5000
CPU Revision\t\t: 0x10
FPU Revision\t\t: 0x00
CPU MHz\t\t\t: 2300.00
BogoMIPS\t\t: 4600.00
TLB entries\t\t: 2112
Address sizes\t\t: 48 bits physical, 48 bits virtual
isa\t\t\t: loongarch32 loongarch64
features\t\t: cpucfg lam ual fpu lsx lasx complex crypto lvz lbt_x86 lbt_arm lbt_mips
hardware watchpoint\t: yes, iwatch count: 8, dwatch count: 8
";

    #[test]
    fn parses_full_3a5000_dump() {
        let mut processors = [Processor::default(); 4];
        parse_str(CPUINFO_3A5000, &mut processors);

        let processor = &processors[0];
        assert!(processor.flags.contains(
            ValidFlags::PROCESSOR
                | ValidFlags::FEATURES
                | ValidFlags::IMPLEMENTER
                | ValidFlags::VARIANT
                | ValidFlags::PART
                | ValidFlags::REVISION
        ));
        // 6-byte model rest carries no suffix.
        assert!(!processor.flags.contains(ValidFlags::SUFFIX));

        assert_eq!(processor.cpucfg_id.implementer(), u32::from(b'L' - b'A'));
        assert_eq!(processor.cpucfg_id.variant(), 3);
        assert_eq!(processor.cpucfg_id.part(), (25 + 0) & 0xF);
        assert_eq!(processor.cpucfg_id.revision(), 5);

        // Untouched slots stay zeroed.
        assert_eq!(processors[1], Processor::default());
    }

    #[test]
    fn feature_line_sets_every_recognized_bit() {
        let mut processor = Processor::default();
        parse_features(
            "cpucfg  lam ual fpu lsx lasx crc32  complex crypto lvz lbt_x86 lbt_arm lbt_mips",
            &mut processor,
        );
        assert_eq!(processor.features, Features::all());
        assert!(processor
            .flags
            .contains(ValidFlags::FEATURES | ValidFlags::PROCESSOR));
    }

    #[test]
    fn unknown_feature_tokens_are_skipped() {
        let mut processor = Processor::default();
        parse_features("fpu warp9 lsx", &mut processor);
        assert_eq!(processor.features, Features::FPU | Features::LSX);
    }

    #[test]
    fn empty_feature_line_still_marks_validity() {
        let mut processor = Processor::default();
        parse_features("??", &mut processor);
        assert_eq!(processor.features, Features::empty());
        assert!(processor.flags.contains(ValidFlags::FEATURES));
    }

    #[test]
    fn model_name_with_suffix_span_of_seven() {
        let mut processor = Processor::default();
        parse_model_name("Loongson-3A6000M", &mut processor);
        assert!(processor.flags.contains(
            ValidFlags::IMPLEMENTER | ValidFlags::VARIANT | ValidFlags::PART | ValidFlags::SUFFIX
        ));
        assert_eq!(processor.cpucfg_id.variant(), 3);
        assert_eq!(processor.cpucfg_id.revision(), 6);
    }

    #[test]
    fn short_model_code_sets_nothing() {
        let mut processor = Processor::default();
        parse_model_name("LA464A-B0B100", &mut processor);
        assert_eq!(processor, Processor::default());
    }

    #[test]
    fn model_code_without_l_prefix_sets_nothing() {
        let mut processor = Processor::default();
        parse_model_name("Xoongson-3A5000", &mut processor);
        assert_eq!(processor, Processor::default());
    }

    #[test]
    fn model_rest_with_unmet_preconditions_only_sets_implementer() {
        let mut processor = Processor::default();
        parse_model_name("LA464AR0-A0B100", &mut processor);
        assert!(processor.flags.contains(ValidFlags::IMPLEMENTER));
        assert!(!processor.flags.intersects(
            ValidFlags::VARIANT | ValidFlags::PART | ValidFlags::REVISION | ValidFlags::SUFFIX
        ));
    }

    #[test]
    fn sparse_processor_indices_are_tolerated() {
        let text = "\
processor : 0
processor : 1
processor : 3
";
        let mut processors = [Processor::default(); 4];
        parse_str(text, &mut processors);

        assert!(processors[0].flags.contains(ValidFlags::PROCESSOR));
        assert!(processors[1].flags.contains(ValidFlags::PROCESSOR));
        assert!(!processors[2].flags.contains(ValidFlags::PROCESSOR));
        assert!(processors[3].flags.contains(ValidFlags::PROCESSOR));
    }

    #[test]
    fn out_of_range_index_writes_land_in_the_sink() {
        let text = "\
processor : 5
features : fpu lsx
model name : Loongson-3A5000
";
        let mut processors = [Processor::default(); 2];
        parse_str(text, &mut processors);

        assert_eq!(processors[0], Processor::default());
        assert_eq!(processors[1], Processor::default());
    }

    #[test]
    fn decreasing_index_still_rehomes_context() {
        let text = "\
processor : 1
processor : 0
features : fpu
";
        let mut processors = [Processor::default(); 2];
        parse_str(text, &mut processors);

        assert!(processors[0].features.contains(Features::FPU));
        assert!(!processors[1].features.contains(Features::FPU));
    }

    #[test]
    fn processor_number_with_trailing_garbage_is_truncated() {
        assert_eq!(parse_decimal_prefix("12abc"), 12);
        assert_eq!(parse_decimal_prefix("7"), 7);
        assert_eq!(parse_decimal_prefix("x7"), 0);
    }

    #[test]
    fn malformed_lines_are_ignored() {
        let text = "\
processor : 0
no separator on this line
   : value with empty key
features :
model name : Loongson-3A5000
";
        let mut processors = [Processor::default(); 1];
        parse_str(text, &mut processors);

        // The malformed lines contribute nothing, the good ones still land.
        assert!(processors[0].flags.contains(ValidFlags::IMPLEMENTER));
        assert!(!processors[0].flags.contains(ValidFlags::FEATURES));
    }

    #[test]
    fn overlong_lines_are_truncated_not_fatal() {
        let mut text = String::from("processor : 0\nfeatures : fpu");
        text.push_str(&" ".repeat(2 * MAX_LINE_LEN));
        text.push_str("\nmodel name : Loongson-3A5000\n");

        let mut processors = [Processor::default(); 1];
        parse_str(&text, &mut processors);
        assert!(processors[0].features.contains(Features::FPU));
        assert!(processors[0].flags.contains(ValidFlags::IMPLEMENTER));
    }
}
