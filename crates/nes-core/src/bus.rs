//! Memory and I/O bus interface.

/// Memory and I/O bus interface.
///
/// Components access memory and peripherals through this trait. The bus
/// handles address decoding and routing to the appropriate device.
pub trait Bus {
    /// Read a byte from the given address.
    fn read(&mut self, address: u16) -> u8;

    /// Write a byte to the given address.
    fn write(&mut self, address: u16, value: u8);

    /// Read a 16-bit word (little-endian: low byte at `address`).
    fn read_word(&mut self, address: u16) -> u16 {
        let low = self.read(address);
        let high = self.read(address.wrapping_add(1));
        u16::from_le_bytes([low, high])
    }
}

/// Flat 64KB RAM bus with no decoding, for tests and tools.
pub struct SimpleBus {
    ram: [u8; 65536],
}

impl SimpleBus {
    #[must_use]
    pub fn new() -> Self {
        Self { ram: [0; 65536] }
    }

    /// Copy `data` into RAM starting at `address`.
    pub fn load(&mut self, address: u16, data: &[u8]) {
        for (i, &byte) in data.iter().enumerate() {
            self.ram[address as usize + i] = byte;
        }
    }

    /// Read without side effects (identical to `read` on this bus).
    #[must_use]
    pub fn peek(&self, address: u16) -> u8 {
        self.ram[address as usize]
    }
}

impl Default for SimpleBus {
    fn default() -> Self {
        Self::new()
    }
}

impl Bus for SimpleBus {
    fn read(&mut self, address: u16) -> u8 {
        self.ram[address as usize]
    }

    fn write(&mut self, address: u16, value: u8) {
        self.ram[address as usize] = value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_and_read_back() {
        let mut bus = SimpleBus::new();
        bus.load(0x0200, &[0x01, 0x02, 0x03]);
        assert_eq!(bus.read(0x0200), 0x01);
        assert_eq!(bus.read(0x0202), 0x03);
    }

    #[test]
    fn read_word_is_little_endian() {
        let mut bus = SimpleBus::new();
        bus.write(0x1000, 0x34);
        bus.write(0x1001, 0x12);
        assert_eq!(bus.read_word(0x1000), 0x1234);
    }
}
