//! NES machine emulation.
//!
//! [`Nes`] wires a 6502 core to the PPU, APU, joypads and a cartridge
//! mapper, and keeps them cycle-synchronized: each CPU step is followed
//! by three PPU dots and one APU tick per cycle consumed. Video comes
//! out as a 256x240 palette-index framebuffer, audio as unsigned 8-bit
//! PCM samples.

mod apu;
mod cartridge;
mod config;
mod error;
mod joypad;
mod mapper;
mod memory;
mod nes;
pub mod palette;
mod ppu;

pub use apu::Apu;
pub use cartridge::{Cartridge, CartridgeHeader, Mirroring, parse_ines};
pub use config::NesRegion;
pub use error::LoadError;
pub use joypad::{Button, Joypad};
pub use mapper::Mapper;
pub use memory::{AddressSpace, mirror_address};
pub use nes::Nes;
pub use ppu::{FRAME_HEIGHT, FRAME_WIDTH, Ppu};
