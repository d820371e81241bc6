//! Core traits and types shared by the CPU and system crates.
//!
//! The emulation core is a single-threaded, cycle-synchronized machine:
//! one CPU cycle is mirrored by exactly three PPU dots and one APU tick,
//! and everything reaches memory through one bus abstraction.

mod bus;
mod cpu;
mod error;

pub use bus::{Bus, SimpleBus};
pub use cpu::Cpu;
pub use error::StepError;
