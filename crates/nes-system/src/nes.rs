//! The assembled machine and its execution loop.

use nes_core::StepError;
use nes_cpu::Cpu6502;

use crate::cartridge::parse_ines;
use crate::config::NesRegion;
use crate::error::LoadError;
use crate::joypad::Button;
use crate::mapper;
use crate::memory::AddressSpace;
use crate::ppu::{FRAME_HEIGHT, FRAME_WIDTH};

/// A complete NES.
///
/// One [`step`](Nes::step) runs a single CPU instruction, then catches
/// the PPU up three dots per cycle and the APU one tick per cycle, then
/// delivers any interrupt edges. Everything stays on one thread.
pub struct Nes {
    cpu: Cpu6502,
    pub bus: AddressSpace,
    region: NesRegion,
    total_cycles: u64,
    frame_cycles: u32,
}

impl Nes {
    /// Build a machine around an iNES image and run the reset sequence.
    pub fn new(rom: &[u8], region: NesRegion) -> Result<Self, LoadError> {
        let cartridge = parse_ines(rom)?;
        let mapper = mapper::create(cartridge)?;
        let mut bus = AddressSpace::new(mapper, region);
        let mut cpu = Cpu6502::new();
        cpu.reset(&mut bus);
        Ok(Self {
            cpu,
            bus,
            region,
            total_cycles: 0,
            frame_cycles: 0,
        })
    }

    /// Run one CPU instruction (or one DMA transfer) and keep the other
    /// chips in lockstep. Returns the CPU cycles consumed.
    pub fn step(&mut self) -> Result<u32, StepError> {
        let cycles = if let Some(page) = self.bus.oam_dma_page.take() {
            self.run_oam_dma(page)
        } else {
            self.cpu.step(&mut self.bus)?
        };

        for _ in 0..cycles {
            self.bus.ppu.tick(self.bus.mapper.as_mut());
            self.bus.ppu.tick(self.bus.mapper.as_mut());
            self.bus.ppu.tick(self.bus.mapper.as_mut());
            self.bus.apu.tick();
        }

        if self.bus.ppu.pull_nmi() {
            self.cpu.nmi();
        }
        self.cpu.set_irq_line(self.bus.apu.irq_pending());

        self.total_cycles += u64::from(cycles);
        self.frame_cycles += cycles;
        Ok(cycles)
    }

    /// Copy a page of CPU memory into OAM. The CPU is stalled for 513
    /// cycles, 514 when the transfer starts on an odd cycle; the PPU and
    /// APU keep running underneath.
    fn run_oam_dma(&mut self, page: u8) -> u32 {
        let base = u16::from(page) << 8;
        for offset in 0..=0xFF_u8 {
            let value = self.bus.read_byte(base | u16::from(offset));
            self.bus.ppu.write_oam_dma(value);
        }
        if self.total_cycles % 2 == 1 { 514 } else { 513 }
    }

    /// Step until one frame's worth of CPU cycles has elapsed.
    pub fn run_frame(&mut self) -> Result<(), StepError> {
        let budget = self.region.cycles_per_frame();
        while self.frame_cycles < budget {
            self.step()?;
        }
        self.frame_cycles -= budget;
        Ok(())
    }

    #[must_use]
    pub fn cpu(&self) -> &Cpu6502 {
        &self.cpu
    }

    #[must_use]
    pub fn region(&self) -> NesRegion {
        self.region
    }

    #[must_use]
    pub fn total_cycles(&self) -> u64 {
        self.total_cycles
    }

    /// 6-bit palette indices, row-major 256x240.
    #[must_use]
    pub fn framebuffer(&self) -> &[u8; FRAME_WIDTH * FRAME_HEIGHT] {
        self.bus.ppu.framebuffer()
    }

    /// Drain the APU's accumulated PCM samples.
    pub fn take_audio_buffer(&mut self) -> Vec<u8> {
        self.bus.apu.take_buffer()
    }

    /// Press or release a button on controller 1.
    pub fn set_button(&mut self, button: Button, pressed: bool) {
        self.bus.joypad1.set_button(button, pressed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cartridge::PRG_PAGE_SIZE;

    /// Minimal NROM image: given code at the reset target, no CHR ROM.
    fn make_rom(program: &[u8]) -> Vec<u8> {
        let mut rom = vec![
            0x4E, 0x45, 0x53, 0x1A, // magic
            0x01, // one PRG page
            0x00, // CHR RAM
            0x00, 0x00, // mapper 0, horizontal
            0, 0, 0, 0, 0, 0, 0, 0,
        ];
        let mut prg = vec![0; PRG_PAGE_SIZE];
        prg[..program.len()].copy_from_slice(program);
        // Reset vector -> $8000.
        prg[0x3FFC] = 0x00;
        prg[0x3FFD] = 0x80;
        rom.extend_from_slice(&prg);
        rom
    }

    #[test]
    fn reset_loads_pc_from_the_vector() {
        let nes = Nes::new(&make_rom(&[0xEA]), NesRegion::Ntsc).unwrap();
        assert_eq!(nes.cpu().pc(), 0x8000);
    }

    #[test]
    fn store_and_break() {
        let rom = make_rom(&[
            0xA9, 0x05, // LDA #$05
            0x85, 0x00, // STA $00
            0x00, // BRK
        ]);
        let mut nes = Nes::new(&rom, NesRegion::Ntsc).unwrap();
        nes.step().unwrap();
        nes.step().unwrap();
        nes.step().unwrap();
        assert_eq!(nes.cpu().registers().a, 0x05);
        assert_eq!(nes.bus.peek_ram(0x0000), 0x05);
        // BRK vectored through $FFFE (zero-filled ROM -> $0000).
        assert_eq!(nes.cpu().pc(), 0x0000);
    }

    #[test]
    fn frame_advances_the_ppu_a_full_frame() {
        // Tight loop: JMP $8000.
        let mut nes = Nes::new(&make_rom(&[0x4C, 0x00, 0x80]), NesRegion::Ntsc).unwrap();
        nes.run_frame().unwrap();
        let dots = nes.total_cycles() * 3;
        assert!(dots >= 341 * 262);
        // Audio accumulated at one sample per 34 cycles.
        let samples = nes.take_audio_buffer();
        assert!(samples.len() >= (nes.total_cycles() / 34) as usize - 1);
    }

    #[test]
    fn oam_dma_stalls_and_copies_a_page() {
        let rom = make_rom(&[
            0xA9, 0x42, // LDA #$42
            0x85, 0x10, // STA $10
            0xA9, 0x00, // LDA #$00
            0x8D, 0x14, 0x40, // STA $4014 (DMA from page 0)
            0x4C, 0x09, 0x80, // JMP self
        ]);
        let mut nes = Nes::new(&rom, NesRegion::Ntsc).unwrap();
        for _ in 0..4 {
            nes.step().unwrap();
        }
        // Next step consumes the DMA latch.
        let cycles = nes.step().unwrap();
        assert!(cycles == 513 || cycles == 514);
    }
}
