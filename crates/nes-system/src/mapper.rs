//! Cartridge mapper boards.
//!
//! A mapper owns the PRG/CHR data and translates bus addresses through
//! its current banking. Four boards cover the bulk of the licensed
//! library: NROM (0), MMC1 (1), UxROM (2) and CNROM (3).

use log::debug;

use crate::cartridge::{Cartridge, Mirroring, PRG_PAGE_SIZE};
use crate::error::LoadError;

const PRG_RAM_SIZE: usize = 8 * 1024;
const CHR_BANK_4K: usize = 4 * 1024;

/// Cartridge hardware as seen from the CPU and PPU buses.
pub trait Mapper {
    /// CPU read in $4020-$FFFF. Unmapped regions read as 0.
    fn cpu_read(&mut self, address: u16) -> u8;

    /// CPU write in $4020-$FFFF. Writes into ROM space drive the board's
    /// bank-select logic, not memory.
    fn cpu_write(&mut self, address: u16, value: u8);

    /// Translate a pattern-table address ($0000-$1FFF) to an offset into
    /// CHR data under the current banking.
    fn chr_offset(&self, address: u16) -> usize;

    fn chr_read(&self, address: u16) -> u8;

    fn chr_write(&mut self, address: u16, value: u8);

    /// Current nametable arrangement; MMC1 can change it at runtime.
    fn mirroring(&self) -> Mirroring;
}

/// Build the board matching the cartridge's mapper number.
pub fn create(cartridge: Cartridge) -> Result<Box<dyn Mapper>, LoadError> {
    match cartridge.header.mapper_id {
        0 => Ok(Box::new(Nrom::new(cartridge))),
        1 => Ok(Box::new(Mmc1::new(cartridge))),
        2 => Ok(Box::new(UxRom::new(cartridge))),
        3 => Ok(Box::new(CnRom::new(cartridge))),
        id => Err(LoadError::UnsupportedMapper(id)),
    }
}

/// Mapper 0: no banking at all. 16KB PRG images appear mirrored into
/// both halves of $8000-$FFFF.
struct Nrom {
    prg: Vec<u8>,
    chr: Vec<u8>,
    chr_is_ram: bool,
    prg_ram: Vec<u8>,
    mirroring: Mirroring,
}

impl Nrom {
    fn new(cartridge: Cartridge) -> Self {
        Self {
            prg: cartridge.prg,
            chr: cartridge.chr,
            chr_is_ram: cartridge.chr_is_ram,
            prg_ram: vec![0; PRG_RAM_SIZE],
            mirroring: cartridge.header.mirroring,
        }
    }
}

impl Mapper for Nrom {
    fn cpu_read(&mut self, address: u16) -> u8 {
        match address {
            0x6000..=0x7FFF => self.prg_ram[usize::from(address - 0x6000)],
            0x8000..=0xFFFF => self.prg[usize::from(address - 0x8000) % self.prg.len()],
            _ => 0,
        }
    }

    fn cpu_write(&mut self, address: u16, value: u8) {
        match address {
            0x6000..=0x7FFF => self.prg_ram[usize::from(address - 0x6000)] = value,
            _ => debug!("NROM: write ${value:02X} to ROM address ${address:04X} ignored"),
        }
    }

    fn chr_offset(&self, address: u16) -> usize {
        usize::from(address)
    }

    fn chr_read(&self, address: u16) -> u8 {
        self.chr[self.chr_offset(address)]
    }

    fn chr_write(&mut self, address: u16, value: u8) {
        if self.chr_is_ram {
            let offset = self.chr_offset(address);
            self.chr[offset] = value;
        }
    }

    fn mirroring(&self) -> Mirroring {
        self.mirroring
    }
}

/// Mapper 1: MMC1. Registers are loaded serially, one bit per write,
/// LSB first; the fifth write commits to the register selected by
/// address bits 14-13. A write with bit 7 set resets the shifter and
/// forces the PRG mode to fix-last.
struct Mmc1 {
    prg: Vec<u8>,
    chr: Vec<u8>,
    chr_is_ram: bool,
    prg_ram: Vec<u8>,
    shift_register: u8,
    shift_count: u8,
    control: u8,
    chr_bank_0: u8,
    chr_bank_1: u8,
    prg_bank: u8,
}

impl Mmc1 {
    fn new(cartridge: Cartridge) -> Self {
        Self {
            prg: cartridge.prg,
            chr: cartridge.chr,
            chr_is_ram: cartridge.chr_is_ram,
            prg_ram: vec![0; PRG_RAM_SIZE],
            shift_register: 0,
            shift_count: 0,
            // Power-on: PRG mode 3 (fix last bank at $C000).
            control: 0x0C,
            chr_bank_0: 0,
            chr_bank_1: 0,
            prg_bank: 0,
        }
    }

    fn prg_banks(&self) -> usize {
        self.prg.len() / PRG_PAGE_SIZE
    }

    fn write_register(&mut self, address: u16, value: u8) {
        if value & 0x80 != 0 {
            self.shift_register = 0;
            self.shift_count = 0;
            self.control |= 0x0C;
            return;
        }
        self.shift_register |= (value & 1) << self.shift_count;
        self.shift_count += 1;
        if self.shift_count < 5 {
            return;
        }
        let committed = self.shift_register;
        self.shift_register = 0;
        self.shift_count = 0;
        match (address >> 13) & 0x03 {
            0 => self.control = committed,
            1 => self.chr_bank_0 = committed,
            2 => self.chr_bank_1 = committed,
            _ => self.prg_bank = committed & 0x0F,
        }
    }

    fn prg_offset(&self, address: u16) -> usize {
        let bank_count = self.prg_banks();
        let offset = usize::from(address - 0x8000);
        match (self.control >> 2) & 0x03 {
            // 32KB mode: low bit of the bank number is ignored.
            0 | 1 => {
                let bank = usize::from(self.prg_bank & 0x0E) % bank_count;
                bank * PRG_PAGE_SIZE + offset
            }
            // Fix first bank at $8000, switch at $C000.
            2 => {
                if address < 0xC000 {
                    offset
                } else {
                    let bank = usize::from(self.prg_bank) % bank_count;
                    bank * PRG_PAGE_SIZE + (offset - PRG_PAGE_SIZE)
                }
            }
            // Fix last bank at $C000, switch at $8000.
            _ => {
                if address < 0xC000 {
                    let bank = usize::from(self.prg_bank) % bank_count;
                    bank * PRG_PAGE_SIZE + offset
                } else {
                    (bank_count - 1) * PRG_PAGE_SIZE + (offset - PRG_PAGE_SIZE)
                }
            }
        }
    }
}

impl Mapper for Mmc1 {
    fn cpu_read(&mut self, address: u16) -> u8 {
        match address {
            0x6000..=0x7FFF => self.prg_ram[usize::from(address - 0x6000)],
            0x8000..=0xFFFF => self.prg[self.prg_offset(address)],
            _ => 0,
        }
    }

    fn cpu_write(&mut self, address: u16, value: u8) {
        match address {
            0x6000..=0x7FFF => self.prg_ram[usize::from(address - 0x6000)] = value,
            0x8000..=0xFFFF => self.write_register(address, value),
            _ => {}
        }
    }

    fn chr_offset(&self, address: u16) -> usize {
        let offset = usize::from(address);
        if self.control & 0x10 == 0 {
            // 8KB mode: low bit of the bank number is ignored.
            let bank = usize::from(self.chr_bank_0 & 0x1E);
            (bank * CHR_BANK_4K + offset) % self.chr.len()
        } else if address < 0x1000 {
            (usize::from(self.chr_bank_0) * CHR_BANK_4K + offset) % self.chr.len()
        } else {
            (usize::from(self.chr_bank_1) * CHR_BANK_4K + (offset - 0x1000)) % self.chr.len()
        }
    }

    fn chr_read(&self, address: u16) -> u8 {
        self.chr[self.chr_offset(address)]
    }

    fn chr_write(&mut self, address: u16, value: u8) {
        if self.chr_is_ram {
            let offset = self.chr_offset(address);
            self.chr[offset] = value;
        }
    }

    fn mirroring(&self) -> Mirroring {
        match self.control & 0x03 {
            0 => Mirroring::SingleScreenLower,
            1 => Mirroring::SingleScreenUpper,
            2 => Mirroring::Vertical,
            _ => Mirroring::Horizontal,
        }
    }
}

/// Mapper 2: UxROM. $8000-$BFFF selects among 16KB banks, the last bank
/// is fixed at $C000.
struct UxRom {
    prg: Vec<u8>,
    chr: Vec<u8>,
    chr_is_ram: bool,
    prg_ram: Vec<u8>,
    mirroring: Mirroring,
    bank_select: u8,
}

impl UxRom {
    fn new(cartridge: Cartridge) -> Self {
        Self {
            prg: cartridge.prg,
            chr: cartridge.chr,
            chr_is_ram: cartridge.chr_is_ram,
            prg_ram: vec![0; PRG_RAM_SIZE],
            mirroring: cartridge.header.mirroring,
            bank_select: 0,
        }
    }

    fn prg_banks(&self) -> usize {
        self.prg.len() / PRG_PAGE_SIZE
    }
}

impl Mapper for UxRom {
    fn cpu_read(&mut self, address: u16) -> u8 {
        match address {
            0x6000..=0x7FFF => self.prg_ram[usize::from(address - 0x6000)],
            0x8000..=0xBFFF => {
                let bank = usize::from(self.bank_select) % self.prg_banks();
                self.prg[bank * PRG_PAGE_SIZE + usize::from(address - 0x8000)]
            }
            0xC000..=0xFFFF => {
                let last = (self.prg_banks() - 1) * PRG_PAGE_SIZE;
                self.prg[last + usize::from(address - 0xC000)]
            }
            _ => 0,
        }
    }

    fn cpu_write(&mut self, address: u16, value: u8) {
        match address {
            0x6000..=0x7FFF => self.prg_ram[usize::from(address - 0x6000)] = value,
            0x8000..=0xFFFF => self.bank_select = value,
            _ => {}
        }
    }

    fn chr_offset(&self, address: u16) -> usize {
        usize::from(address)
    }

    fn chr_read(&self, address: u16) -> u8 {
        self.chr[self.chr_offset(address)]
    }

    fn chr_write(&mut self, address: u16, value: u8) {
        if self.chr_is_ram {
            let offset = self.chr_offset(address);
            self.chr[offset] = value;
        }
    }

    fn mirroring(&self) -> Mirroring {
        self.mirroring
    }
}

/// Mapper 3: CNROM. PRG is fixed like NROM; writes select an 8KB CHR bank.
struct CnRom {
    prg: Vec<u8>,
    chr: Vec<u8>,
    prg_ram: Vec<u8>,
    mirroring: Mirroring,
    chr_bank: u8,
}

impl CnRom {
    fn new(cartridge: Cartridge) -> Self {
        Self {
            prg: cartridge.prg,
            chr: cartridge.chr,
            prg_ram: vec![0; PRG_RAM_SIZE],
            mirroring: cartridge.header.mirroring,
            chr_bank: 0,
        }
    }
}

impl Mapper for CnRom {
    fn cpu_read(&mut self, address: u16) -> u8 {
        match address {
            0x6000..=0x7FFF => self.prg_ram[usize::from(address - 0x6000)],
            0x8000..=0xFFFF => self.prg[usize::from(address - 0x8000) % self.prg.len()],
            _ => 0,
        }
    }

    fn cpu_write(&mut self, address: u16, value: u8) {
        match address {
            0x6000..=0x7FFF => self.prg_ram[usize::from(address - 0x6000)] = value,
            0x8000..=0xFFFF => self.chr_bank = value & 0x03,
            _ => {}
        }
    }

    fn chr_offset(&self, address: u16) -> usize {
        (usize::from(self.chr_bank) * 0x2000 + usize::from(address)) % self.chr.len()
    }

    fn chr_read(&self, address: u16) -> u8 {
        self.chr[self.chr_offset(address)]
    }

    fn chr_write(&mut self, _address: u16, _value: u8) {
        // CNROM carries CHR ROM; writes have nowhere to go.
    }

    fn mirroring(&self) -> Mirroring {
        self.mirroring
    }
}
