//! Hardware stack in page one ($0100-$01FF).

use nes_core::Bus;

/// Borrowed view of the hardware stack: the bus plus the S register.
///
/// S points at the next free slot and moves downwards. Wrapping past
/// either end is a program bug on real hardware too, so it only trips a
/// debug assertion here.
pub struct Stack<'a> {
    bus: &'a mut dyn Bus,
    s: &'a mut u8,
}

const STACK_PAGE: u16 = 0x0100;

impl<'a> Stack<'a> {
    pub fn new(bus: &'a mut dyn Bus, s: &'a mut u8) -> Self {
        Self { bus, s }
    }

    pub fn push(&mut self, value: u8) {
        debug_assert!(*self.s >= 0x01, "stack overflow: push with S=${:02X}", *self.s);
        self.bus.write(STACK_PAGE | u16::from(*self.s), value);
        *self.s = self.s.wrapping_sub(1);
    }

    pub fn pop(&mut self) -> u8 {
        debug_assert!(*self.s <= 0xFE, "stack underflow: pop with S=${:02X}", *self.s);
        *self.s = self.s.wrapping_add(1);
        self.bus.read(STACK_PAGE | u16::from(*self.s))
    }

    /// Push a 16-bit value, high byte first, so it pops low byte first.
    pub fn push_word(&mut self, value: u16) {
        self.push((value >> 8) as u8);
        self.push((value & 0xFF) as u8);
    }

    pub fn pop_word(&mut self) -> u16 {
        let low = self.pop();
        let high = self.pop();
        u16::from_le_bytes([low, high])
    }
}
