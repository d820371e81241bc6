//! CPU address space: decoding, mirroring and I/O port dispatch.

use log::warn;
use nes_core::Bus;

use crate::apu::Apu;
use crate::config::NesRegion;
use crate::joypad::Joypad;
use crate::mapper::Mapper;
use crate::ppu::Ppu;

/// Fold a CPU address through the console's mirroring: the 2KB of work
/// RAM repeats through $0000-$1FFF and the eight PPU registers repeat
/// through $2000-$3FFF. Everything else maps one to one.
#[must_use]
pub fn mirror_address(address: u16) -> u16 {
    match address {
        0x0000..=0x1FFF => address & 0x07FF,
        0x2000..=0x3FFF => 0x2000 | (address & 0x0007),
        _ => address,
    }
}

/// Everything the CPU can reach, wired into one bus.
pub struct AddressSpace {
    ram: [u8; 2048],
    pub ppu: Ppu,
    pub apu: Apu,
    pub joypad1: Joypad,
    pub joypad2: Joypad,
    pub mapper: Box<dyn Mapper>,
    /// Page latched by a $4014 write, consumed by the execution loop.
    pub(crate) oam_dma_page: Option<u8>,
}

impl AddressSpace {
    #[must_use]
    pub fn new(mapper: Box<dyn Mapper>, region: NesRegion) -> Self {
        Self {
            ram: [0; 2048],
            ppu: Ppu::new(region),
            apu: Apu::new(),
            joypad1: Joypad::new(),
            joypad2: Joypad::new(),
            mapper,
            oam_dma_page: None,
        }
    }

    pub fn read_byte(&mut self, address: u16) -> u8 {
        let address = mirror_address(address);
        match address {
            0x0000..=0x07FF => self.ram[usize::from(address)],
            0x2000..=0x2007 => self.ppu.cpu_read(address & 0x0007, self.mapper.as_mut()),
            0x4015 => self.apu.read_status(),
            0x4016 => self.joypad1.read(),
            0x4017 => self.joypad2.read(),
            // Write-only APU and DMA ports.
            0x4000..=0x4014 => 0,
            0x4018..=0x401F => {
                warn!("read from unsupported port ${address:04X}");
                0
            }
            // Cartridge space, including expansion at $4020-$5FFF.
            _ => self.mapper.cpu_read(address),
        }
    }

    pub fn write_byte(&mut self, address: u16, value: u8) {
        let address = mirror_address(address);
        match address {
            0x0000..=0x07FF => self.ram[usize::from(address)] = value,
            0x2000..=0x2007 => {
                self.ppu.cpu_write(address & 0x0007, value, self.mapper.as_mut());
            }
            0x4014 => self.oam_dma_page = Some(value),
            0x4016 => {
                // One strobe line drives both controllers.
                self.joypad1.write(value);
                self.joypad2.write(value);
            }
            0x4000..=0x4013 | 0x4015 | 0x4017 => self.apu.write(address, value),
            0x4018..=0x401F => {
                warn!("write ${value:02X} to unsupported port ${address:04X}");
            }
            _ => self.mapper.cpu_write(address, value),
        }
    }

    /// Side-effect-free RAM read, for tests and tools.
    #[must_use]
    pub fn peek_ram(&self, address: u16) -> u8 {
        self.ram[usize::from(mirror_address(address) & 0x07FF)]
    }
}

impl Bus for AddressSpace {
    fn read(&mut self, address: u16) -> u8 {
        self.read_byte(address)
    }

    fn write(&mut self, address: u16, value: u8) {
        self.write_byte(address, value);
    }
}
