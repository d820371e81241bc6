//! MOS 6502 CPU core as found in the NES (Ricoh 2A03).
//!
//! The CPU steps at instruction granularity: [`Cpu6502::step`] executes one
//! complete instruction against a [`nes_core::Bus`] and reports the cycles it
//! consumed, so a machine can catch its other chips up afterwards. The 2A03
//! has no BCD arithmetic; the decimal flag is tracked but never consulted.

mod addressing;
mod cpu;
pub mod flags;
mod opcode;
mod registers;
mod stack;

pub use addressing::{Mode, Operand, Resolved};
pub use cpu::{Cpu6502, IRQ_VECTOR, NMI_VECTOR, RESET_VECTOR};
pub use flags::Status;
pub use opcode::{Mnemonic, Opcode, OpcodeTable};
pub use registers::Registers;
