//! Program-level tests: short machine-code sequences run to completion.

use nes_core::{Bus, SimpleBus};
use nes_cpu::{Cpu6502, flags};

fn setup_program(program: &[u8]) -> (Cpu6502, SimpleBus) {
    let mut cpu = Cpu6502::new();
    let mut bus = SimpleBus::new();
    bus.load(0x8000, program);
    cpu.registers_mut().pc = 0x8000;
    (cpu, bus)
}

fn run(cpu: &mut Cpu6502, bus: &mut SimpleBus, steps: usize) -> u32 {
    let mut total = 0;
    for _ in 0..steps {
        total += cpu.step(bus).expect("documented opcode");
    }
    total
}

#[test]
fn countdown_loop_terminates_with_x_zero() {
    let (mut cpu, mut bus) = setup_program(&[
        0xA2, 0x03, // LDX #$03
        0xCA, // loop: DEX
        0xD0, 0xFD, // BNE loop
        0xEA, // NOP
    ]);
    // LDX + 3 iterations of DEX/BNE + NOP.
    run(&mut cpu, &mut bus, 8);
    assert_eq!(cpu.registers().x, 0);
    assert!(cpu.registers().p.is_set(flags::Z));
    assert_eq!(cpu.registers().pc, 0x8006);
}

#[test]
fn indexed_store_fills_a_block() {
    let (mut cpu, mut bus) = setup_program(&[
        0xA2, 0x00, // LDX #$00
        0xA9, 0xAB, // LDA #$AB
        0x9D, 0x00, 0x03, // loop: STA $0300,X
        0xE8, // INX
        0xE0, 0x04, // CPX #$04
        0xD0, 0xF9, // BNE loop
    ]);
    run(&mut cpu, &mut bus, 2 + 4 * 4);
    for offset in 0..4 {
        assert_eq!(bus.peek(0x0300 + offset), 0xAB);
    }
    assert_eq!(bus.peek(0x0304), 0x00);
}

#[test]
fn nested_subroutines_unwind_in_order() {
    let (mut cpu, mut bus) = setup_program(&[
        0x20, 0x10, 0x80, // JSR $8010
        0xA9, 0x01, // LDA #$01
    ]);
    bus.load(
        0x8010,
        &[
            0x20, 0x20, 0x80, // JSR $8020
            0x60, // RTS
        ],
    );
    bus.load(
        0x8020,
        &[
            0xE8, // INX
            0x60, // RTS
        ],
    );
    run(&mut cpu, &mut bus, 6);
    assert_eq!(cpu.registers().a, 0x01);
    assert_eq!(cpu.registers().x, 0x01);
    assert_eq!(cpu.registers().s, 0xFD);
    assert_eq!(cpu.registers().pc, 0x8005);
}

#[test]
fn compare_drives_all_three_branch_outcomes() {
    let (mut cpu, mut bus) = setup_program(&[
        0xA9, 0x40, // LDA #$40
        0xC9, 0x40, // CMP #$40  (equal: Z and C set)
        0xC9, 0x41, // CMP #$41  (less: C clear, N set)
        0xC9, 0x3F, // CMP #$3F  (greater: C set, Z clear)
    ]);
    run(&mut cpu, &mut bus, 2);
    assert!(cpu.registers().p.is_set(flags::Z));
    assert!(cpu.registers().p.is_set(flags::C));
    run(&mut cpu, &mut bus, 1);
    assert!(!cpu.registers().p.is_set(flags::C));
    assert!(cpu.registers().p.is_set(flags::N));
    run(&mut cpu, &mut bus, 1);
    assert!(cpu.registers().p.is_set(flags::C));
    assert!(!cpu.registers().p.is_set(flags::Z));
}

#[test]
fn read_modify_write_through_indexed_zero_page() {
    let (mut cpu, mut bus) = setup_program(&[
        0xA2, 0x05, // LDX #$05
        0xF6, 0x10, // INC $10,X
        0xF6, 0x10, // INC $10,X
    ]);
    run(&mut cpu, &mut bus, 3);
    assert_eq!(bus.peek(0x0015), 0x02);
}

#[test]
fn interrupt_return_restores_status() {
    let (mut cpu, mut bus) = setup_program(&[
        0x38, // SEC
        0x00, 0xFF, // BRK (padding byte)
        0x18, // after BRK returns: CLC
    ]);
    // IRQ/BRK vector -> $9000: RTI immediately.
    bus.write(0xFFFE, 0x00);
    bus.write(0xFFFF, 0x90);
    bus.load(0x9000, &[0x40]); // RTI
    run(&mut cpu, &mut bus, 3);
    // RTI restored P (with carry) and the padded return address.
    assert!(cpu.registers().p.is_set(flags::C));
    assert_eq!(cpu.registers().pc, 0x8003);
}
