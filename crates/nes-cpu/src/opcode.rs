//! Opcode decode table.
//!
//! The documented 6502 map is mostly regular: within a family (one
//! mnemonic across its addressing modes) every opcode sits at a fixed
//! offset from the family's absolute-mode slot. The table is built once
//! from that rule plus a short list of irregular entries, and the builder
//! panics if two entries ever land on the same slot.

use crate::addressing::Mode;

/// Instruction mnemonics for the 56 documented operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mnemonic {
    Adc, And, Asl, Bcc, Bcs, Beq, Bit, Bmi, Bne, Bpl, Brk, Bvc, Bvs,
    Clc, Cld, Cli, Clv, Cmp, Cpx, Cpy, Dec, Dex, Dey, Eor, Inc, Inx,
    Iny, Jmp, Jsr, Lda, Ldx, Ldy, Lsr, Nop, Ora, Pha, Php, Pla, Plp,
    Rol, Ror, Rti, Rts, Sbc, Sec, Sed, Sei, Sta, Stx, Sty, Tax, Tay,
    Tsx, Txa, Txs, Tya,
}

/// One decoded table slot.
#[derive(Debug, Clone, Copy)]
pub struct Opcode {
    pub mnemonic: Mnemonic,
    pub mode: Mode,
    /// Instruction length in bytes, opcode included.
    pub bytes: u16,
    /// Base cycle count; page-cross and branch extras are added at runtime.
    pub cycles: u32,
    /// Whether an indexed page crossing costs one extra cycle.
    pub page_penalty: bool,
}

/// Extra-cycle behaviour of a family's indexed modes.
#[derive(Clone, Copy, PartialEq, Eq)]
enum Penalty {
    /// Reads: one extra cycle only when indexing crosses a page.
    PageCross,
    /// Writes and read-modify-writes: the extra cycle is always paid.
    Always,
    None,
}

struct Family {
    mnemonic: Mnemonic,
    /// Opcode of the family's absolute-mode form.
    base: u8,
    /// Cycle count of the absolute-mode form.
    cycles: u32,
    penalty: Penalty,
    modes: &'static [Mode],
}

use Mnemonic as M;
use Mode::{
    Absolute, AbsoluteX, AbsoluteY, Accumulator, Immediate, IndexedIndirect, IndirectIndexed,
    ZeroPage, ZeroPageX, ZeroPageY,
};

const ALU_MODES: &[Mode] = &[
    IndexedIndirect, ZeroPage, Immediate, Absolute, IndirectIndexed, ZeroPageX, AbsoluteY,
    AbsoluteX,
];
const STORE_A_MODES: &[Mode] = &[
    IndexedIndirect, ZeroPage, Absolute, IndirectIndexed, ZeroPageX, AbsoluteY, AbsoluteX,
];
const SHIFT_MODES: &[Mode] = &[Accumulator, ZeroPage, ZeroPageX, Absolute, AbsoluteX];
const STEP_MODES: &[Mode] = &[ZeroPage, ZeroPageX, Absolute, AbsoluteX];

const FAMILIES: &[Family] = &[
    Family { mnemonic: M::Ora, base: 0x0D, cycles: 4, penalty: Penalty::PageCross, modes: ALU_MODES },
    Family { mnemonic: M::And, base: 0x2D, cycles: 4, penalty: Penalty::PageCross, modes: ALU_MODES },
    Family { mnemonic: M::Eor, base: 0x4D, cycles: 4, penalty: Penalty::PageCross, modes: ALU_MODES },
    Family { mnemonic: M::Adc, base: 0x6D, cycles: 4, penalty: Penalty::PageCross, modes: ALU_MODES },
    Family { mnemonic: M::Lda, base: 0xAD, cycles: 4, penalty: Penalty::PageCross, modes: ALU_MODES },
    Family { mnemonic: M::Cmp, base: 0xCD, cycles: 4, penalty: Penalty::PageCross, modes: ALU_MODES },
    Family { mnemonic: M::Sbc, base: 0xED, cycles: 4, penalty: Penalty::PageCross, modes: ALU_MODES },
    Family { mnemonic: M::Sta, base: 0x8D, cycles: 4, penalty: Penalty::Always, modes: STORE_A_MODES },
    Family { mnemonic: M::Asl, base: 0x0E, cycles: 6, penalty: Penalty::Always, modes: SHIFT_MODES },
    Family { mnemonic: M::Rol, base: 0x2E, cycles: 6, penalty: Penalty::Always, modes: SHIFT_MODES },
    Family { mnemonic: M::Lsr, base: 0x4E, cycles: 6, penalty: Penalty::Always, modes: SHIFT_MODES },
    Family { mnemonic: M::Ror, base: 0x6E, cycles: 6, penalty: Penalty::Always, modes: SHIFT_MODES },
    Family { mnemonic: M::Inc, base: 0xEE, cycles: 6, penalty: Penalty::Always, modes: STEP_MODES },
    Family { mnemonic: M::Dec, base: 0xCE, cycles: 6, penalty: Penalty::Always, modes: STEP_MODES },
    Family { mnemonic: M::Ldx, base: 0xAE, cycles: 4, penalty: Penalty::PageCross, modes: &[ZeroPage, ZeroPageY, Absolute, AbsoluteY] },
    Family { mnemonic: M::Ldy, base: 0xAC, cycles: 4, penalty: Penalty::PageCross, modes: &[ZeroPage, ZeroPageX, Absolute, AbsoluteX] },
    Family { mnemonic: M::Stx, base: 0x8E, cycles: 4, penalty: Penalty::None, modes: &[ZeroPage, ZeroPageY, Absolute] },
    Family { mnemonic: M::Sty, base: 0x8C, cycles: 4, penalty: Penalty::None, modes: &[ZeroPage, ZeroPageX, Absolute] },
    Family { mnemonic: M::Cpx, base: 0xEC, cycles: 4, penalty: Penalty::None, modes: &[ZeroPage, Absolute] },
    Family { mnemonic: M::Cpy, base: 0xCC, cycles: 4, penalty: Penalty::None, modes: &[ZeroPage, Absolute] },
    Family { mnemonic: M::Bit, base: 0x2C, cycles: 4, penalty: Penalty::None, modes: &[ZeroPage, Absolute] },
];

/// Irregular slots: index-register immediates sit low in their rows
/// (before the regular layout), plus the jumps, branches, stack and
/// implied operations, each of which has exactly one form.
const FIXED: &[(Mnemonic, u8, Mode, u32)] = &[
    (M::Ldx, 0xA2, Mode::Immediate, 2),
    (M::Ldy, 0xA0, Mode::Immediate, 2),
    (M::Cpx, 0xE0, Mode::Immediate, 2),
    (M::Cpy, 0xC0, Mode::Immediate, 2),
    (M::Jmp, 0x4C, Mode::Absolute, 3),
    (M::Jmp, 0x6C, Mode::Indirect, 5),
    (M::Jsr, 0x20, Mode::Absolute, 6),
    (M::Rts, 0x60, Mode::Implied, 6),
    (M::Rti, 0x40, Mode::Implied, 6),
    (M::Brk, 0x00, Mode::Implied, 7),
    (M::Bpl, 0x10, Mode::Relative, 2),
    (M::Bmi, 0x30, Mode::Relative, 2),
    (M::Bvc, 0x50, Mode::Relative, 2),
    (M::Bvs, 0x70, Mode::Relative, 2),
    (M::Bcc, 0x90, Mode::Relative, 2),
    (M::Bcs, 0xB0, Mode::Relative, 2),
    (M::Bne, 0xD0, Mode::Relative, 2),
    (M::Beq, 0xF0, Mode::Relative, 2),
    (M::Pha, 0x48, Mode::Implied, 3),
    (M::Php, 0x08, Mode::Implied, 3),
    (M::Pla, 0x68, Mode::Implied, 4),
    (M::Plp, 0x28, Mode::Implied, 4),
    (M::Clc, 0x18, Mode::Implied, 2),
    (M::Sec, 0x38, Mode::Implied, 2),
    (M::Cli, 0x58, Mode::Implied, 2),
    (M::Sei, 0x78, Mode::Implied, 2),
    (M::Clv, 0xB8, Mode::Implied, 2),
    (M::Cld, 0xD8, Mode::Implied, 2),
    (M::Sed, 0xF8, Mode::Implied, 2),
    (M::Tax, 0xAA, Mode::Implied, 2),
    (M::Txa, 0x8A, Mode::Implied, 2),
    (M::Tay, 0xA8, Mode::Implied, 2),
    (M::Tya, 0x98, Mode::Implied, 2),
    (M::Tsx, 0xBA, Mode::Implied, 2),
    (M::Txs, 0x9A, Mode::Implied, 2),
    (M::Dex, 0xCA, Mode::Implied, 2),
    (M::Dey, 0x88, Mode::Implied, 2),
    (M::Inx, 0xE8, Mode::Implied, 2),
    (M::Iny, 0xC8, Mode::Implied, 2),
    (M::Nop, 0xEA, Mode::Implied, 2),
];

/// Offset of a mode's slot from the family's absolute-mode opcode.
fn mode_offset(mnemonic: Mnemonic, mode: Mode) -> i16 {
    // LDX absolute,Y occupies the slot the absolute,X form holds in
    // every other family.
    if mnemonic == M::Ldx && mode == Mode::AbsoluteY {
        return 0x10;
    }
    match mode {
        Mode::IndexedIndirect => -0x0C,
        Mode::ZeroPage => -0x08,
        Mode::Immediate | Mode::Accumulator => -0x04,
        Mode::IndirectIndexed => 0x04,
        Mode::ZeroPageX | Mode::ZeroPageY => 0x08,
        Mode::AbsoluteY => 0x0C,
        Mode::AbsoluteX => 0x10,
        Mode::Absolute | Mode::Implied | Mode::Relative | Mode::Indirect => 0,
    }
}

/// Cycle adjustment of a mode relative to the family's absolute form.
fn mode_cycle_delta(mode: Mode) -> i32 {
    match mode {
        Mode::IndexedIndirect => 2,
        Mode::IndirectIndexed => 1,
        Mode::ZeroPage => -1,
        Mode::Immediate => -2,
        Mode::Accumulator => -4,
        _ => 0,
    }
}

fn is_indexed_past_page(mode: Mode) -> bool {
    matches!(mode, Mode::AbsoluteX | Mode::AbsoluteY | Mode::IndirectIndexed)
}

/// Complete decode table for the documented instruction set.
pub struct OpcodeTable {
    entries: [Option<Opcode>; 256],
}

impl OpcodeTable {
    /// Build the table from the family layout and the irregular list.
    ///
    /// Panics if any two entries resolve to the same slot; a collision
    /// means the layout data itself is wrong.
    #[must_use]
    pub fn build() -> Self {
        let mut entries = [None; 256];
        for family in FAMILIES {
            for &mode in family.modes {
                let slot = (i16::from(family.base) + mode_offset(family.mnemonic, mode)) as u8;
                let mut cycles = (family.cycles as i32 + mode_cycle_delta(mode)) as u32;
                if family.penalty == Penalty::Always && is_indexed_past_page(mode) {
                    cycles += 1;
                }
                let page_penalty =
                    family.penalty == Penalty::PageCross && is_indexed_past_page(mode);
                insert(
                    &mut entries,
                    slot,
                    Opcode {
                        mnemonic: family.mnemonic,
                        mode,
                        bytes: mode.instruction_bytes(),
                        cycles,
                        page_penalty,
                    },
                );
            }
        }
        for &(mnemonic, slot, mode, cycles) in FIXED {
            insert(
                &mut entries,
                slot,
                Opcode {
                    mnemonic,
                    mode,
                    bytes: mode.instruction_bytes(),
                    cycles,
                    page_penalty: false,
                },
            );
        }
        Self { entries }
    }

    #[must_use]
    pub fn get(&self, opcode: u8) -> Option<&Opcode> {
        self.entries[usize::from(opcode)].as_ref()
    }
}

fn insert(entries: &mut [Option<Opcode>; 256], slot: u8, entry: Opcode) {
    assert!(
        entries[usize::from(slot)].is_none(),
        "opcode table collision at ${slot:02X}"
    );
    entries[usize::from(slot)] = Some(entry);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_all_documented_opcodes_without_collision() {
        let table = OpcodeTable::build();
        let count = (0u16..256).filter(|&op| table.get(op as u8).is_some()).count();
        assert_eq!(count, 151);
    }

    #[test]
    fn derived_slots_match_hardware_encoding() {
        let table = OpcodeTable::build();
        let cases: &[(u8, Mnemonic, Mode, u32)] = &[
            (0xA9, M::Lda, Mode::Immediate, 2),
            (0xA5, M::Lda, Mode::ZeroPage, 3),
            (0xB1, M::Lda, Mode::IndirectIndexed, 5),
            (0x81, M::Sta, Mode::IndexedIndirect, 6),
            (0x9D, M::Sta, Mode::AbsoluteX, 5),
            (0x0A, M::Asl, Mode::Accumulator, 2),
            (0x1E, M::Asl, Mode::AbsoluteX, 7),
            (0xE6, M::Inc, Mode::ZeroPage, 5),
            (0xD6, M::Dec, Mode::ZeroPageX, 6),
            (0xB6, M::Ldx, Mode::ZeroPageY, 4),
            (0x94, M::Sty, Mode::ZeroPageX, 4),
            (0x24, M::Bit, Mode::ZeroPage, 3),
            (0xE4, M::Cpx, Mode::ZeroPage, 3),
        ];
        for &(slot, mnemonic, mode, cycles) in cases {
            let entry = table.get(slot).unwrap_or_else(|| panic!("missing ${slot:02X}"));
            assert_eq!(entry.mnemonic, mnemonic, "mnemonic at ${slot:02X}");
            assert_eq!(entry.mode, mode, "mode at ${slot:02X}");
            assert_eq!(entry.cycles, cycles, "cycles at ${slot:02X}");
        }
    }

    #[test]
    fn ldx_absolute_y_takes_the_absolute_x_slot() {
        let table = OpcodeTable::build();
        let entry = table.get(0xBE).unwrap();
        assert_eq!(entry.mnemonic, M::Ldx);
        assert_eq!(entry.mode, Mode::AbsoluteY);
        assert!(entry.page_penalty);
    }

    #[test]
    fn page_penalty_only_on_indexed_reads() {
        let table = OpcodeTable::build();
        assert!(table.get(0xBD).unwrap().page_penalty); // LDA abs,X
        assert!(!table.get(0x9D).unwrap().page_penalty); // STA abs,X pays it always
        assert!(!table.get(0xA5).unwrap().page_penalty); // LDA zp never crosses
    }

    #[test]
    fn byte_lengths_follow_addressing_mode() {
        let table = OpcodeTable::build();
        assert_eq!(table.get(0xEA).unwrap().bytes, 1); // NOP
        assert_eq!(table.get(0xA9).unwrap().bytes, 2); // LDA #
        assert_eq!(table.get(0x4C).unwrap().bytes, 3); // JMP abs
    }

    #[test]
    fn undocumented_slots_are_empty() {
        let table = OpcodeTable::build();
        for slot in [0x02u8, 0x3F, 0x80, 0xFF] {
            assert!(table.get(slot).is_none(), "${slot:02X} should be empty");
        }
    }
}
