//! Addressing mode resolution.
//!
//! Each mode is resolved by a pure function of the register file and the
//! bus: operand bytes are fetched relative to the instruction's fetch
//! address (`last_pc`), since PC has already been advanced past them.

use nes_core::Bus;

use crate::registers::Registers;

/// The thirteen documented 6502 addressing modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Implied,
    Accumulator,
    Immediate,
    ZeroPage,
    ZeroPageX,
    ZeroPageY,
    Absolute,
    AbsoluteX,
    AbsoluteY,
    Indirect,
    IndexedIndirect,
    IndirectIndexed,
    Relative,
}

impl Mode {
    /// Total instruction length in bytes, opcode included.
    #[must_use]
    pub fn instruction_bytes(self) -> u16 {
        match self {
            Mode::Implied | Mode::Accumulator => 1,
            Mode::Immediate
            | Mode::ZeroPage
            | Mode::ZeroPageX
            | Mode::ZeroPageY
            | Mode::IndexedIndirect
            | Mode::IndirectIndexed
            | Mode::Relative => 2,
            Mode::Absolute | Mode::AbsoluteX | Mode::AbsoluteY | Mode::Indirect => 3,
        }
    }
}

/// What an addressing mode produced for the executing instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operand {
    None,
    Accumulator,
    Immediate(u8),
    Address(u16),
    Branch(i8),
}

/// A resolved operand plus whether indexing crossed a page boundary.
#[derive(Debug, Clone, Copy)]
pub struct Resolved {
    pub operand: Operand,
    pub page_crossed: bool,
}

impl Resolved {
    fn plain(operand: Operand) -> Self {
        Self {
            operand,
            page_crossed: false,
        }
    }
}

/// Resolve `mode` for the instruction fetched at `regs.last_pc`.
pub fn resolve(mode: Mode, regs: &Registers, bus: &mut dyn Bus) -> Resolved {
    let operand_pc = regs.last_pc.wrapping_add(1);
    match mode {
        Mode::Implied => Resolved::plain(Operand::None),
        Mode::Accumulator => Resolved::plain(Operand::Accumulator),
        Mode::Immediate => Resolved::plain(Operand::Immediate(bus.read(operand_pc))),
        Mode::ZeroPage => {
            let address = u16::from(bus.read(operand_pc));
            Resolved::plain(Operand::Address(address))
        }
        Mode::ZeroPageX => Resolved::plain(Operand::Address(zero_page_indexed(
            bus.read(operand_pc),
            regs.x,
        ))),
        Mode::ZeroPageY => Resolved::plain(Operand::Address(zero_page_indexed(
            bus.read(operand_pc),
            regs.y,
        ))),
        Mode::Absolute => Resolved::plain(Operand::Address(bus.read_word(operand_pc))),
        Mode::AbsoluteX => absolute_indexed(bus.read_word(operand_pc), regs.x),
        Mode::AbsoluteY => absolute_indexed(bus.read_word(operand_pc), regs.y),
        Mode::Indirect => {
            let pointer = bus.read_word(operand_pc);
            Resolved::plain(Operand::Address(read_word_page_bug(bus, pointer)))
        }
        Mode::IndexedIndirect => {
            let pointer = bus.read(operand_pc).wrapping_add(regs.x);
            Resolved::plain(Operand::Address(read_zero_page_word(bus, pointer)))
        }
        Mode::IndirectIndexed => {
            let pointer = bus.read(operand_pc);
            let base = read_zero_page_word(bus, pointer);
            absolute_indexed(base, regs.y)
        }
        Mode::Relative => Resolved::plain(Operand::Branch(bus.read(operand_pc) as i8)),
    }
}

/// Zero-page indexing wraps within page zero and never crosses out of it.
fn zero_page_indexed(base: u8, index: u8) -> u16 {
    u16::from(base.wrapping_add(index))
}

fn absolute_indexed(base: u16, index: u8) -> Resolved {
    let address = base.wrapping_add(u16::from(index));
    Resolved {
        operand: Operand::Address(address),
        page_crossed: (base & 0xFF00) != (address & 0xFF00),
    }
}

/// Read a pointer from the zero page, wrapping the high-byte fetch so a
/// pointer at $FF takes its high byte from $00.
fn read_zero_page_word(bus: &mut dyn Bus, pointer: u8) -> u16 {
    let low = bus.read(u16::from(pointer));
    let high = bus.read(u16::from(pointer.wrapping_add(1)));
    u16::from_le_bytes([low, high])
}

/// Word read reproducing the JMP ($xxFF) hardware bug: the high byte is
/// fetched from the start of the same page, not the next one.
fn read_word_page_bug(bus: &mut dyn Bus, address: u16) -> u16 {
    let low = bus.read(address);
    let high_address = (address & 0xFF00) | u16::from((address as u8).wrapping_add(1));
    let high = bus.read(high_address);
    u16::from_le_bytes([low, high])
}

#[cfg(test)]
mod tests {
    use super::*;
    use nes_core::SimpleBus;

    fn setup(operand_bytes: &[u8]) -> (Registers, SimpleBus) {
        let mut regs = Registers::new();
        regs.last_pc = 0x8000;
        regs.pc = 0x8000 + 1 + operand_bytes.len() as u16;
        let mut bus = SimpleBus::new();
        bus.load(0x8001, operand_bytes);
        (regs, bus)
    }

    #[test]
    fn zero_page_x_wraps_within_page_zero() {
        let (mut regs, mut bus) = setup(&[0xFF]);
        regs.x = 0x02;
        let resolved = resolve(Mode::ZeroPageX, &regs, &mut bus);
        assert_eq!(resolved.operand, Operand::Address(0x0001));
        assert!(!resolved.page_crossed);
    }

    #[test]
    fn absolute_x_reports_page_cross() {
        let (mut regs, mut bus) = setup(&[0xFF, 0x20]);
        regs.x = 0x01;
        let resolved = resolve(Mode::AbsoluteX, &regs, &mut bus);
        assert_eq!(resolved.operand, Operand::Address(0x2100));
        assert!(resolved.page_crossed);
    }

    #[test]
    fn absolute_x_without_page_cross() {
        let (mut regs, mut bus) = setup(&[0x00, 0x20]);
        regs.x = 0x01;
        let resolved = resolve(Mode::AbsoluteX, &regs, &mut bus);
        assert_eq!(resolved.operand, Operand::Address(0x2001));
        assert!(!resolved.page_crossed);
    }

    #[test]
    fn indirect_jmp_page_wrap_bug() {
        let (regs, mut bus) = setup(&[0xFF, 0x30]);
        bus.write(0x30FF, 0x34);
        bus.write(0x3000, 0x12);
        bus.write(0x3100, 0x99); // would be read without the bug
        let resolved = resolve(Mode::Indirect, &regs, &mut bus);
        assert_eq!(resolved.operand, Operand::Address(0x1234));
    }

    #[test]
    fn indexed_indirect_wraps_pointer_in_zero_page() {
        let (mut regs, mut bus) = setup(&[0xFE]);
        regs.x = 0x01;
        bus.write(0x00FF, 0x78);
        bus.write(0x0000, 0x56);
        let resolved = resolve(Mode::IndexedIndirect, &regs, &mut bus);
        assert_eq!(resolved.operand, Operand::Address(0x5678));
    }

    #[test]
    fn indirect_indexed_adds_y_and_reports_cross() {
        let (mut regs, mut bus) = setup(&[0x10]);
        regs.y = 0x10;
        bus.write(0x0010, 0xF8);
        bus.write(0x0011, 0x40);
        let resolved = resolve(Mode::IndirectIndexed, &regs, &mut bus);
        assert_eq!(resolved.operand, Operand::Address(0x4108));
        assert!(resolved.page_crossed);
    }
}
