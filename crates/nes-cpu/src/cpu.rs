//! Instruction-level 6502 executor.

use nes_core::{Bus, StepError};

use crate::addressing::{self, Operand, Resolved};
use crate::flags::{self, Status};
use crate::opcode::{Mnemonic, OpcodeTable};
use crate::registers::Registers;
use crate::stack::Stack;

pub const NMI_VECTOR: u16 = 0xFFFA;
pub const RESET_VECTOR: u16 = 0xFFFC;
pub const IRQ_VECTOR: u16 = 0xFFFE;

/// Cycles consumed by servicing an interrupt (push PC, push P, fetch vector).
const INTERRUPT_CYCLES: u32 = 7;

/// The 2A03's 6502 core.
///
/// [`Cpu6502::step`] runs exactly one instruction (or one interrupt entry)
/// and returns the cycle count, letting the machine tick the PPU and APU
/// forward by the same amount afterwards.
pub struct Cpu6502 {
    regs: Registers,
    table: OpcodeTable,
    nmi_pending: bool,
    irq_line: bool,
}

impl Cpu6502 {
    #[must_use]
    pub fn new() -> Self {
        Self {
            regs: Registers::new(),
            table: OpcodeTable::build(),
            nmi_pending: false,
            irq_line: false,
        }
    }

    /// Reset the register file and load PC from the reset vector.
    pub fn reset(&mut self, bus: &mut dyn Bus) {
        self.regs = Registers::new();
        self.regs.pc = bus.read_word(RESET_VECTOR);
    }

    #[must_use]
    pub fn registers(&self) -> &Registers {
        &self.regs
    }

    pub fn registers_mut(&mut self) -> &mut Registers {
        &mut self.regs
    }

    #[must_use]
    pub fn pc(&self) -> u16 {
        self.regs.pc
    }

    /// Latch an NMI edge; it is serviced before the next instruction.
    pub fn nmi(&mut self) {
        self.nmi_pending = true;
    }

    /// Drive the level-sensitive IRQ line. The interrupt is taken before
    /// the next instruction whenever the line is high and I is clear.
    pub fn set_irq_line(&mut self, asserted: bool) {
        self.irq_line = asserted;
    }

    /// Execute one instruction and return the cycles it consumed.
    ///
    /// Pending interrupts are serviced first: NMI unconditionally, IRQ
    /// only while the interrupt-disable flag is clear.
    pub fn step(&mut self, bus: &mut dyn Bus) -> Result<u32, StepError> {
        if self.nmi_pending {
            self.nmi_pending = false;
            self.service_interrupt(bus, NMI_VECTOR);
            return Ok(INTERRUPT_CYCLES);
        }
        if self.irq_line && !self.regs.p.is_set(flags::I) {
            self.service_interrupt(bus, IRQ_VECTOR);
            return Ok(INTERRUPT_CYCLES);
        }

        let pc = self.regs.pc;
        let opcode = bus.read(pc);
        let entry = *self
            .table
            .get(opcode)
            .ok_or(StepError::UnimplementedOpcode { opcode, pc })?;

        self.regs.last_pc = pc;
        self.regs.pc = pc.wrapping_add(entry.bytes);

        let resolved = addressing::resolve(entry.mode, &self.regs, bus);
        let mut cycles = entry.cycles;
        if entry.page_penalty && resolved.page_crossed {
            cycles += 1;
        }
        cycles += self.execute(entry.mnemonic, &resolved, bus);
        Ok(cycles)
    }

    fn service_interrupt(&mut self, bus: &mut dyn Bus, vector: u16) {
        let pc = self.regs.pc;
        let status = self.regs.p.to_byte_irq();
        {
            let mut stack = Stack::new(bus, &mut self.regs.s);
            stack.push_word(pc);
            stack.push(status);
        }
        self.regs.p.set(flags::I);
        self.regs.pc = bus.read_word(vector);
    }

    fn execute(&mut self, mnemonic: Mnemonic, resolved: &Resolved, bus: &mut dyn Bus) -> u32 {
        use Mnemonic as M;
        match mnemonic {
            M::Lda => {
                let value = self.load(resolved, bus);
                self.regs.a = value;
                self.regs.p.update_nz(value);
            }
            M::Ldx => {
                let value = self.load(resolved, bus);
                self.regs.x = value;
                self.regs.p.update_nz(value);
            }
            M::Ldy => {
                let value = self.load(resolved, bus);
                self.regs.y = value;
                self.regs.p.update_nz(value);
            }
            M::Sta => bus.write(address_of(resolved), self.regs.a),
            M::Stx => bus.write(address_of(resolved), self.regs.x),
            M::Sty => bus.write(address_of(resolved), self.regs.y),

            M::Tax => {
                self.regs.x = self.regs.a;
                self.regs.p.update_nz(self.regs.x);
            }
            M::Tay => {
                self.regs.y = self.regs.a;
                self.regs.p.update_nz(self.regs.y);
            }
            M::Txa => {
                self.regs.a = self.regs.x;
                self.regs.p.update_nz(self.regs.a);
            }
            M::Tya => {
                self.regs.a = self.regs.y;
                self.regs.p.update_nz(self.regs.a);
            }
            M::Tsx => {
                self.regs.x = self.regs.s;
                self.regs.p.update_nz(self.regs.x);
            }
            // TXS is the one transfer that does not touch the flags.
            M::Txs => self.regs.s = self.regs.x,

            M::Adc => {
                let value = self.load(resolved, bus);
                self.adc(value);
            }
            M::Sbc => {
                // SBC is ADC of the one's complement: A - M - (1-C) equals
                // A + !M + C, so both share one wide-sum carry comparison.
                let value = self.load(resolved, bus);
                self.adc(!value);
            }
            M::And => {
                self.regs.a &= self.load(resolved, bus);
                self.regs.p.update_nz(self.regs.a);
            }
            M::Ora => {
                self.regs.a |= self.load(resolved, bus);
                self.regs.p.update_nz(self.regs.a);
            }
            M::Eor => {
                self.regs.a ^= self.load(resolved, bus);
                self.regs.p.update_nz(self.regs.a);
            }
            M::Cmp => {
                let value = self.load(resolved, bus);
                self.compare(self.regs.a, value);
            }
            M::Cpx => {
                let value = self.load(resolved, bus);
                self.compare(self.regs.x, value);
            }
            M::Cpy => {
                let value = self.load(resolved, bus);
                self.compare(self.regs.y, value);
            }
            M::Bit => {
                let value = self.load(resolved, bus);
                self.regs.p.set_if(flags::Z, self.regs.a & value == 0);
                self.regs.p.set_if(flags::N, value & 0x80 != 0);
                self.regs.p.set_if(flags::V, value & 0x40 != 0);
            }

            M::Inc => {
                let address = address_of(resolved);
                let result = bus.read(address).wrapping_add(1);
                bus.write(address, result);
                self.regs.p.update_nz(result);
            }
            M::Dec => {
                let address = address_of(resolved);
                let result = bus.read(address).wrapping_sub(1);
                bus.write(address, result);
                self.regs.p.update_nz(result);
            }
            M::Inx => {
                self.regs.x = self.regs.x.wrapping_add(1);
                self.regs.p.update_nz(self.regs.x);
            }
            M::Iny => {
                self.regs.y = self.regs.y.wrapping_add(1);
                self.regs.p.update_nz(self.regs.y);
            }
            M::Dex => {
                self.regs.x = self.regs.x.wrapping_sub(1);
                self.regs.p.update_nz(self.regs.x);
            }
            M::Dey => {
                self.regs.y = self.regs.y.wrapping_sub(1);
                self.regs.p.update_nz(self.regs.y);
            }

            M::Asl => self.modify(resolved, bus, |p, value| {
                p.set_if(flags::C, value & 0x80 != 0);
                value << 1
            }),
            M::Lsr => self.modify(resolved, bus, |p, value| {
                p.set_if(flags::C, value & 0x01 != 0);
                value >> 1
            }),
            M::Rol => self.modify(resolved, bus, |p, value| {
                let carry_in = u8::from(p.is_set(flags::C));
                p.set_if(flags::C, value & 0x80 != 0);
                (value << 1) | carry_in
            }),
            M::Ror => self.modify(resolved, bus, |p, value| {
                let carry_in = u8::from(p.is_set(flags::C));
                p.set_if(flags::C, value & 0x01 != 0);
                (value >> 1) | (carry_in << 7)
            }),

            M::Jmp => self.regs.pc = address_of(resolved),
            M::Jsr => {
                // Hardware pushes the address of the instruction's last
                // byte; RTS adds one back.
                let return_address = self.regs.pc.wrapping_sub(1);
                let target = address_of(resolved);
                Stack::new(bus, &mut self.regs.s).push_word(return_address);
                self.regs.pc = target;
            }
            M::Rts => {
                let return_address = Stack::new(bus, &mut self.regs.s).pop_word();
                self.regs.pc = return_address.wrapping_add(1);
            }
            M::Rti => {
                let mut stack = Stack::new(bus, &mut self.regs.s);
                let status = stack.pop();
                let pc = stack.pop_word();
                self.regs.p = Status::from_byte(status);
                self.regs.pc = pc;
            }
            M::Brk => {
                // The byte after BRK is padding: the pushed return address
                // skips it, and the pushed status carries the break bit.
                let return_address = self.regs.pc.wrapping_add(1);
                let status = self.regs.p.to_byte_brk();
                {
                    let mut stack = Stack::new(bus, &mut self.regs.s);
                    stack.push_word(return_address);
                    stack.push(status);
                }
                self.regs.p.set(flags::I);
                self.regs.pc = bus.read_word(IRQ_VECTOR);
            }

            M::Bpl => return self.branch(resolved, !self.regs.p.is_set(flags::N)),
            M::Bmi => return self.branch(resolved, self.regs.p.is_set(flags::N)),
            M::Bvc => return self.branch(resolved, !self.regs.p.is_set(flags::V)),
            M::Bvs => return self.branch(resolved, self.regs.p.is_set(flags::V)),
            M::Bcc => return self.branch(resolved, !self.regs.p.is_set(flags::C)),
            M::Bcs => return self.branch(resolved, self.regs.p.is_set(flags::C)),
            M::Bne => return self.branch(resolved, !self.regs.p.is_set(flags::Z)),
            M::Beq => return self.branch(resolved, self.regs.p.is_set(flags::Z)),

            M::Clc => self.regs.p.clear(flags::C),
            M::Sec => self.regs.p.set(flags::C),
            M::Cli => self.regs.p.clear(flags::I),
            M::Sei => self.regs.p.set(flags::I),
            M::Clv => self.regs.p.clear(flags::V),
            M::Cld => self.regs.p.clear(flags::D),
            M::Sed => self.regs.p.set(flags::D),

            M::Pha => {
                let value = self.regs.a;
                Stack::new(bus, &mut self.regs.s).push(value);
            }
            M::Php => {
                let value = self.regs.p.to_byte_brk();
                Stack::new(bus, &mut self.regs.s).push(value);
            }
            M::Pla => {
                let value = Stack::new(bus, &mut self.regs.s).pop();
                self.regs.a = value;
                self.regs.p.update_nz(value);
            }
            M::Plp => {
                let value = Stack::new(bus, &mut self.regs.s).pop();
                self.regs.p = Status::from_byte(value);
            }

            M::Nop => {}
        }
        0
    }

    fn load(&self, resolved: &Resolved, bus: &mut dyn Bus) -> u8 {
        match resolved.operand {
            Operand::Immediate(value) => value,
            Operand::Address(address) => bus.read(address),
            Operand::Accumulator => self.regs.a,
            Operand::None | Operand::Branch(_) => unreachable!("operand carries no value"),
        }
    }

    fn modify(
        &mut self,
        resolved: &Resolved,
        bus: &mut dyn Bus,
        op: impl FnOnce(&mut Status, u8) -> u8,
    ) {
        match resolved.operand {
            Operand::Accumulator => {
                let result = op(&mut self.regs.p, self.regs.a);
                self.regs.a = result;
                self.regs.p.update_nz(result);
            }
            Operand::Address(address) => {
                let value = bus.read(address);
                let result = op(&mut self.regs.p, value);
                bus.write(address, result);
                self.regs.p.update_nz(result);
            }
            _ => unreachable!("read-modify-write needs a target"),
        }
    }

    /// Add with carry into A, setting C from the wide sum and V from the
    /// sign rule: overflow iff both inputs agree in sign and the result
    /// does not.
    fn adc(&mut self, value: u8) {
        let carry_in = u16::from(self.regs.p.is_set(flags::C));
        let sum = u16::from(self.regs.a) + u16::from(value) + carry_in;
        let result = sum as u8;
        self.regs.p.set_if(flags::C, sum > 0xFF);
        self.regs
            .p
            .set_if(flags::V, (self.regs.a ^ result) & (value ^ result) & 0x80 != 0);
        self.regs.a = result;
        self.regs.p.update_nz(result);
    }

    fn compare(&mut self, register: u8, value: u8) {
        self.regs.p.set_if(flags::C, register >= value);
        self.regs.p.update_nz(register.wrapping_sub(value));
    }

    /// Take or skip a branch. Taken branches cost one extra cycle, two if
    /// the target lands in a different page than the advanced PC.
    fn branch(&mut self, resolved: &Resolved, condition: bool) -> u32 {
        let Operand::Branch(offset) = resolved.operand else {
            unreachable!("branch without relative operand")
        };
        if !condition {
            return 0;
        }
        let target = self.regs.pc.wrapping_add_signed(i16::from(offset));
        let crossed = (target & 0xFF00) != (self.regs.pc & 0xFF00);
        self.regs.pc = target;
        if crossed { 2 } else { 1 }
    }
}

/// Extract the effective address of an operand that must have one.
fn address_of(resolved: &Resolved) -> u16 {
    match resolved.operand {
        Operand::Address(address) => address,
        _ => unreachable!("operand carries no address"),
    }
}

impl Default for Cpu6502 {
    fn default() -> Self {
        Self::new()
    }
}

impl nes_core::Cpu for Cpu6502 {
    fn reset(&mut self, bus: &mut dyn Bus) {
        Cpu6502::reset(self, bus);
    }

    fn step(&mut self, bus: &mut dyn Bus) -> Result<u32, StepError> {
        Cpu6502::step(self, bus)
    }

    fn pc(&self) -> u16 {
        Cpu6502::pc(self)
    }

    fn nmi(&mut self) {
        Cpu6502::nmi(self);
    }

    fn set_irq_line(&mut self, asserted: bool) {
        Cpu6502::set_irq_line(self, asserted);
    }
}
