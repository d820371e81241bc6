//! 6502 register file.

use crate::flags::Status;

/// The 6502 register file.
///
/// `last_pc` records the address the current instruction was fetched from;
/// PC itself is advanced past the operand bytes before execution, so
/// relative branches and diagnostics need the fetch address separately.
#[derive(Debug, Clone, Copy)]
pub struct Registers {
    pub a: u8,
    pub x: u8,
    pub y: u8,
    pub s: u8,
    pub pc: u16,
    pub last_pc: u16,
    pub p: Status,
}

impl Registers {
    #[must_use]
    pub fn new() -> Self {
        Self {
            a: 0,
            x: 0,
            y: 0,
            s: 0xFD,
            pc: 0,
            last_pc: 0,
            p: Status::new(),
        }
    }
}

impl Default for Registers {
    fn default() -> Self {
        Self::new()
    }
}
