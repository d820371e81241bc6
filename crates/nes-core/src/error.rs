//! Fatal execution errors.

use std::error::Error;
use std::fmt;

/// A fatal condition raised while stepping the CPU.
///
/// Execution cannot safely continue after any of these: the emulated
/// machine state would silently diverge from real hardware.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepError {
    /// The fetched opcode byte has no wired handler. Carries the opcode
    /// and the address it was fetched from, for diagnosis.
    UnimplementedOpcode { opcode: u8, pc: u16 },
}

impl fmt::Display for StepError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnimplementedOpcode { opcode, pc } => {
                write!(f, "unimplemented opcode ${opcode:02X} at ${pc:04X}")
            }
        }
    }
}

impl Error for StepError {}
