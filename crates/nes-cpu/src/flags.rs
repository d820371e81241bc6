//! 6502 status register (P) flags.

/// Carry flag (bit 0)
pub const C: u8 = 0b0000_0001;
/// Zero flag (bit 1)
pub const Z: u8 = 0b0000_0010;
/// Interrupt disable flag (bit 2)
pub const I: u8 = 0b0000_0100;
/// Decimal mode flag (bit 3) - tracked but unused on the 2A03
pub const D: u8 = 0b0000_1000;
/// Break flag (bit 4) - only exists on the stack, not in the register
pub const B: u8 = 0b0001_0000;
/// Unused flag (bit 5) - always reads as 1
pub const U: u8 = 0b0010_0000;
/// Overflow flag (bit 6)
pub const V: u8 = 0b0100_0000;
/// Negative flag (bit 7)
pub const N: u8 = 0b1000_0000;

/// The processor status register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Status(pub u8);

impl Status {
    #[must_use]
    pub fn new() -> Self {
        Status(U | I)
    }

    /// Restore from a byte pulled off the stack. B is discarded and the
    /// unused bit forced on, as the hardware does.
    #[must_use]
    pub fn from_byte(value: u8) -> Self {
        Status((value & !B) | U)
    }

    /// Byte as pushed by PHP and BRK (B set).
    #[must_use]
    pub fn to_byte_brk(self) -> u8 {
        self.0 | B | U
    }

    /// Byte as pushed when an interrupt is serviced (B clear).
    #[must_use]
    pub fn to_byte_irq(self) -> u8 {
        (self.0 & !B) | U
    }

    #[must_use]
    pub fn is_set(self, flag: u8) -> bool {
        self.0 & flag != 0
    }

    pub fn set(&mut self, flag: u8) {
        self.0 |= flag;
    }

    pub fn clear(&mut self, flag: u8) {
        self.0 &= !flag;
    }

    pub fn set_if(&mut self, flag: u8, condition: bool) {
        if condition {
            self.set(flag);
        } else {
            self.clear(flag);
        }
    }

    /// Set Z and N from a result byte.
    pub fn update_nz(&mut self, value: u8) {
        self.set_if(Z, value == 0);
        self.set_if(N, value & 0x80 != 0);
    }
}

impl Default for Status {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_status_has_unused_and_interrupt_set() {
        let status = Status::new();
        assert!(status.is_set(U));
        assert!(status.is_set(I));
        assert!(!status.is_set(C));
    }

    #[test]
    fn from_byte_discards_break_and_forces_unused() {
        let status = Status::from_byte(B | C);
        assert!(!status.is_set(B));
        assert!(status.is_set(U));
        assert!(status.is_set(C));
    }

    #[test]
    fn brk_and_irq_push_forms_differ_in_break_bit() {
        let status = Status(U | N);
        assert_eq!(status.to_byte_brk() & B, B);
        assert_eq!(status.to_byte_irq() & B, 0);
    }

    #[test]
    fn update_nz() {
        let mut status = Status::new();
        status.update_nz(0x00);
        assert!(status.is_set(Z));
        assert!(!status.is_set(N));
        status.update_nz(0x80);
        assert!(!status.is_set(Z));
        assert!(status.is_set(N));
    }
}
