//! CPU interface.

use crate::bus::Bus;
use crate::error::StepError;

/// A CPU core driven at instruction granularity.
///
/// The machine's execution loop only needs this much: reset, step, and
/// the two interrupt lines. Everything else (registers, decode tables)
/// stays behind the implementation.
pub trait Cpu {
    /// Reload state from the reset vector.
    fn reset(&mut self, bus: &mut dyn Bus);

    /// Execute one instruction, returning the cycles consumed.
    fn step(&mut self, bus: &mut dyn Bus) -> Result<u32, StepError>;

    /// Current program counter.
    fn pc(&self) -> u16;

    /// Latch an NMI edge.
    fn nmi(&mut self);

    /// Drive the level-sensitive IRQ line.
    fn set_irq_line(&mut self, asserted: bool);
}
