//! Audio processing unit (2A03 channels).
//!
//! Four channels: two pulses, triangle and noise. Each is built from the
//! shared hardware units (envelope, length counter, sweep) clocked by a
//! frame sequencer, while the channel timers run off the CPU clock
//! (every other cycle for pulse and noise, every cycle for triangle).
//! Output is unsigned 8-bit PCM, one sample gathered every 34 CPU cycles.

use log::warn;

/// Length counter load values, indexed by the 5-bit field of register 3.
const LENGTH_TABLE: [u8; 32] = [
    10, 254, 20, 2, 40, 4, 80, 6, 160, 8, 60, 10, 14, 12, 26, 14, //
    12, 16, 24, 18, 48, 20, 96, 22, 192, 24, 72, 26, 16, 28, 32, 30,
];

/// Noise channel timer periods (NTSC).
const NOISE_PERIOD_TABLE: [u16; 16] = [
    4, 8, 16, 32, 64, 96, 128, 160, 202, 254, 380, 508, 762, 1016, 2034, 4068,
];

/// The triangle's 32-step output sequence.
const TRIANGLE_SEQUENCE: [u8; 32] = [
    15, 14, 13, 12, 11, 10, 9, 8, 7, 6, 5, 4, 3, 2, 1, 0, //
    0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15,
];

/// Pulse duty sequences: 12.5%, 25%, 50%, 75% (inverted 25%).
const PULSE_DUTY: [[u8; 8]; 4] = [
    [0, 1, 0, 0, 0, 0, 0, 0],
    [0, 1, 1, 0, 0, 0, 0, 0],
    [0, 1, 1, 1, 1, 0, 0, 0],
    [1, 0, 0, 1, 1, 1, 1, 1],
];

/// CPU cycles between the frame sequencer's quarter-frame steps.
const FRAME_STEP_CYCLES: u32 = 7457;

/// CPU cycles between PCM samples (~52.6kHz at NTSC speed).
const SAMPLE_INTERVAL: u32 = 34;

#[derive(Default)]
struct Envelope {
    start: bool,
    looping: bool,
    constant: bool,
    volume: u8,
    divider: u8,
    decay: u8,
}

impl Envelope {
    fn clock(&mut self) {
        if self.start {
            self.start = false;
            self.decay = 15;
            self.divider = self.volume;
        } else if self.divider == 0 {
            self.divider = self.volume;
            if self.decay > 0 {
                self.decay -= 1;
            } else if self.looping {
                self.decay = 15;
            }
        } else {
            self.divider -= 1;
        }
    }

    fn output(&self) -> u8 {
        if self.constant { self.volume } else { self.decay }
    }
}

#[derive(Default)]
struct LengthCounter {
    counter: u8,
    halt: bool,
    enabled: bool,
}

impl LengthCounter {
    fn clock(&mut self) {
        if !self.halt && self.counter > 0 {
            self.counter -= 1;
        }
    }

    fn load(&mut self, index: u8) {
        if self.enabled {
            self.counter = LENGTH_TABLE[usize::from(index)];
        }
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            self.counter = 0;
        }
    }

    fn active(&self) -> bool {
        self.counter > 0
    }
}

struct Sweep {
    enabled: bool,
    period: u8,
    negate: bool,
    shift: u8,
    reload: bool,
    divider: u8,
    /// Pulse 1 negates with one's complement, pulse 2 with two's.
    ones_complement: bool,
}

impl Sweep {
    fn new(ones_complement: bool) -> Self {
        Self {
            enabled: false,
            period: 0,
            negate: false,
            shift: 0,
            reload: false,
            divider: 0,
            ones_complement,
        }
    }

    fn target(&self, timer_period: u16) -> u16 {
        let change = timer_period >> self.shift;
        if self.negate {
            let subtracted = timer_period.wrapping_sub(change);
            if self.ones_complement {
                subtracted.wrapping_sub(1)
            } else {
                subtracted
            }
        } else {
            timer_period + change
        }
    }

    fn mutes(&self, timer_period: u16) -> bool {
        timer_period < 8 || self.target(timer_period) > 0x07FF
    }

    fn clock(&mut self, timer_period: &mut u16) {
        if self.divider == 0 && self.enabled && self.shift > 0 && !self.mutes(*timer_period) {
            *timer_period = self.target(*timer_period);
        }
        if self.divider == 0 || self.reload {
            self.divider = self.period;
            self.reload = false;
        } else {
            self.divider -= 1;
        }
    }
}

struct Pulse {
    envelope: Envelope,
    length: LengthCounter,
    sweep: Sweep,
    duty: u8,
    duty_position: u8,
    timer: u16,
    timer_period: u16,
}

impl Pulse {
    fn new(ones_complement: bool) -> Self {
        Self {
            envelope: Envelope::default(),
            length: LengthCounter::default(),
            sweep: Sweep::new(ones_complement),
            duty: 0,
            duty_position: 0,
            timer: 0,
            timer_period: 0,
        }
    }

    fn tick_timer(&mut self) {
        if self.timer == 0 {
            self.timer = self.timer_period;
            self.duty_position = (self.duty_position + 1) % 8;
        } else {
            self.timer -= 1;
        }
    }

    fn output(&self) -> u8 {
        if !self.length.active()
            || self.sweep.mutes(self.timer_period)
            || PULSE_DUTY[usize::from(self.duty)][usize::from(self.duty_position)] == 0
        {
            return 0;
        }
        self.envelope.output()
    }
}

struct Triangle {
    length: LengthCounter,
    timer: u16,
    timer_period: u16,
    sequence_position: u8,
    linear_counter: u8,
    linear_reload_value: u8,
    linear_reload: bool,
    control: bool,
}

impl Triangle {
    fn new() -> Self {
        Self {
            length: LengthCounter::default(),
            timer: 0,
            timer_period: 0,
            sequence_position: 0,
            linear_counter: 0,
            linear_reload_value: 0,
            linear_reload: false,
            control: false,
        }
    }

    fn tick_timer(&mut self) {
        if self.timer == 0 {
            self.timer = self.timer_period;
            if self.linear_counter > 0 && self.length.active() {
                self.sequence_position = (self.sequence_position + 1) % 32;
            }
        } else {
            self.timer -= 1;
        }
    }

    fn clock_linear(&mut self) {
        if self.linear_reload {
            self.linear_counter = self.linear_reload_value;
        } else if self.linear_counter > 0 {
            self.linear_counter -= 1;
        }
        if !self.control {
            self.linear_reload = false;
        }
    }

    fn output(&self) -> u8 {
        if !self.length.active() || self.linear_counter == 0 {
            return 0;
        }
        TRIANGLE_SEQUENCE[usize::from(self.sequence_position)]
    }
}

struct Noise {
    envelope: Envelope,
    length: LengthCounter,
    timer: u16,
    timer_period: u16,
    mode: bool,
    /// 15-bit LFSR, seeded to 1 at power-on.
    shift: u16,
}

impl Noise {
    fn new() -> Self {
        Self {
            envelope: Envelope::default(),
            length: LengthCounter::default(),
            timer: 0,
            timer_period: NOISE_PERIOD_TABLE[0],
            mode: false,
            shift: 1,
        }
    }

    fn tick_timer(&mut self) {
        if self.timer == 0 {
            self.timer = self.timer_period;
            let tap = if self.mode { 6 } else { 1 };
            let feedback = (self.shift & 1) ^ ((self.shift >> tap) & 1);
            self.shift >>= 1;
            self.shift |= feedback << 14;
        } else {
            self.timer -= 1;
        }
    }

    fn output(&self) -> u8 {
        if !self.length.active() || self.shift & 1 != 0 {
            return 0;
        }
        self.envelope.output()
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum FrameMode {
    FourStep,
    FiveStep,
}

pub struct Apu {
    pulse1: Pulse,
    pulse2: Pulse,
    triangle: Triangle,
    noise: Noise,

    frame_mode: FrameMode,
    frame_cycles: u32,
    frame_step: u8,
    irq_inhibit: bool,
    frame_irq: bool,

    odd_cycle: bool,
    sample_countdown: u32,
    buffer: Vec<u8>,
}

impl Apu {
    #[must_use]
    pub fn new() -> Self {
        Self {
            pulse1: Pulse::new(true),
            pulse2: Pulse::new(false),
            triangle: Triangle::new(),
            noise: Noise::new(),
            frame_mode: FrameMode::FourStep,
            frame_cycles: 0,
            frame_step: 0,
            irq_inhibit: false,
            frame_irq: false,
            odd_cycle: false,
            sample_countdown: SAMPLE_INTERVAL,
            buffer: Vec::new(),
        }
    }

    /// Advance one CPU cycle.
    pub fn tick(&mut self) {
        self.triangle.tick_timer();
        self.odd_cycle = !self.odd_cycle;
        if self.odd_cycle {
            self.pulse1.tick_timer();
            self.pulse2.tick_timer();
            self.noise.tick_timer();
        }
        self.clock_frame_sequencer();

        self.sample_countdown -= 1;
        if self.sample_countdown == 0 {
            self.sample_countdown = SAMPLE_INTERVAL;
            let sample = self.mix();
            self.buffer.push(sample);
        }
    }

    /// Whether the frame interrupt is being asserted.
    #[must_use]
    pub fn irq_pending(&self) -> bool {
        self.frame_irq
    }

    /// Drain the accumulated PCM samples.
    pub fn take_buffer(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.buffer)
    }

    #[must_use]
    pub fn buffer_len(&self) -> usize {
        self.buffer.len()
    }

    /// $4015 read: channel length statuses plus the frame IRQ flag,
    /// which the read clears.
    pub fn read_status(&mut self) -> u8 {
        let mut value = 0;
        if self.pulse1.length.active() {
            value |= 0x01;
        }
        if self.pulse2.length.active() {
            value |= 0x02;
        }
        if self.triangle.length.active() {
            value |= 0x04;
        }
        if self.noise.length.active() {
            value |= 0x08;
        }
        if self.frame_irq {
            value |= 0x40;
        }
        self.frame_irq = false;
        value
    }

    pub fn write(&mut self, address: u16, value: u8) {
        match address {
            0x4000 => Self::write_pulse_control(&mut self.pulse1, value),
            0x4001 => Self::write_pulse_sweep(&mut self.pulse1, value),
            0x4002 => {
                self.pulse1.timer_period = (self.pulse1.timer_period & 0x0700) | u16::from(value);
            }
            0x4003 => Self::write_pulse_length(&mut self.pulse1, value),
            0x4004 => Self::write_pulse_control(&mut self.pulse2, value),
            0x4005 => Self::write_pulse_sweep(&mut self.pulse2, value),
            0x4006 => {
                self.pulse2.timer_period = (self.pulse2.timer_period & 0x0700) | u16::from(value);
            }
            0x4007 => Self::write_pulse_length(&mut self.pulse2, value),
            0x4008 => {
                self.triangle.control = value & 0x80 != 0;
                self.triangle.length.halt = value & 0x80 != 0;
                self.triangle.linear_reload_value = value & 0x7F;
            }
            0x400A => {
                self.triangle.timer_period =
                    (self.triangle.timer_period & 0x0700) | u16::from(value);
            }
            0x400B => {
                self.triangle.timer_period =
                    (self.triangle.timer_period & 0x00FF) | (u16::from(value & 0x07) << 8);
                self.triangle.length.load(value >> 3);
                self.triangle.linear_reload = true;
            }
            0x400C => {
                self.noise.length.halt = value & 0x20 != 0;
                self.noise.envelope.looping = value & 0x20 != 0;
                self.noise.envelope.constant = value & 0x10 != 0;
                self.noise.envelope.volume = value & 0x0F;
            }
            0x400E => {
                self.noise.mode = value & 0x80 != 0;
                self.noise.timer_period = NOISE_PERIOD_TABLE[usize::from(value & 0x0F)];
            }
            0x400F => {
                self.noise.length.load(value >> 3);
                self.noise.envelope.start = true;
            }
            0x4015 => {
                self.pulse1.length.set_enabled(value & 0x01 != 0);
                self.pulse2.length.set_enabled(value & 0x02 != 0);
                self.triangle.length.set_enabled(value & 0x04 != 0);
                self.noise.length.set_enabled(value & 0x08 != 0);
            }
            0x4017 => {
                self.frame_mode = if value & 0x80 != 0 {
                    FrameMode::FiveStep
                } else {
                    FrameMode::FourStep
                };
                self.irq_inhibit = value & 0x40 != 0;
                if self.irq_inhibit {
                    self.frame_irq = false;
                }
                self.frame_cycles = 0;
                self.frame_step = 0;
                // Five-step mode clocks everything immediately.
                if self.frame_mode == FrameMode::FiveStep {
                    self.clock_quarter_frame();
                    self.clock_half_frame();
                }
            }
            // No DMC on this machine; its registers and the unused slots
            // are accepted and dropped.
            0x4009 | 0x400D | 0x4010..=0x4013 => {
                warn!("APU: write ${value:02X} to unimplemented register ${address:04X} ignored");
            }
            _ => {}
        }
    }

    fn write_pulse_control(pulse: &mut Pulse, value: u8) {
        pulse.duty = value >> 6;
        pulse.length.halt = value & 0x20 != 0;
        pulse.envelope.looping = value & 0x20 != 0;
        pulse.envelope.constant = value & 0x10 != 0;
        pulse.envelope.volume = value & 0x0F;
    }

    fn write_pulse_sweep(pulse: &mut Pulse, value: u8) {
        pulse.sweep.enabled = value & 0x80 != 0;
        pulse.sweep.period = (value >> 4) & 0x07;
        pulse.sweep.negate = value & 0x08 != 0;
        pulse.sweep.shift = value & 0x07;
        pulse.sweep.reload = true;
    }

    fn write_pulse_length(pulse: &mut Pulse, value: u8) {
        pulse.timer_period = (pulse.timer_period & 0x00FF) | (u16::from(value & 0x07) << 8);
        pulse.length.load(value >> 3);
        pulse.envelope.start = true;
        pulse.duty_position = 0;
    }

    /// Step counter derived from elapsed cycles: quarter frames land
    /// every 7457 CPU cycles.
    fn clock_frame_sequencer(&mut self) {
        self.frame_cycles += 1;
        let step = self.frame_cycles / FRAME_STEP_CYCLES;
        if step <= u32::from(self.frame_step) {
            return;
        }
        self.frame_step = step as u8;
        match (self.frame_mode, step) {
            (FrameMode::FourStep, 1 | 3) | (FrameMode::FiveStep, 1 | 3) => {
                self.clock_quarter_frame();
            }
            (FrameMode::FourStep, 2) | (FrameMode::FiveStep, 2) => {
                self.clock_quarter_frame();
                self.clock_half_frame();
            }
            (FrameMode::FourStep, 4) => {
                self.clock_quarter_frame();
                self.clock_half_frame();
                if !self.irq_inhibit {
                    self.frame_irq = true;
                }
                self.frame_cycles = 0;
                self.frame_step = 0;
            }
            (FrameMode::FiveStep, 5) => {
                self.clock_quarter_frame();
                self.clock_half_frame();
                self.frame_cycles = 0;
                self.frame_step = 0;
            }
            _ => {}
        }
    }

    fn clock_quarter_frame(&mut self) {
        self.pulse1.envelope.clock();
        self.pulse2.envelope.clock();
        self.noise.envelope.clock();
        self.triangle.clock_linear();
    }

    fn clock_half_frame(&mut self) {
        self.pulse1.length.clock();
        self.pulse2.length.clock();
        self.triangle.length.clock();
        self.noise.length.clock();
        self.pulse1.sweep.clock(&mut self.pulse1.timer_period);
        self.pulse2.sweep.clock(&mut self.pulse2.timer_period);
    }

    /// Weighted integer mix of the four channels into one unsigned
    /// sample. Maximum channel outputs sum to 255 exactly.
    fn mix(&self) -> u8 {
        let p1 = u16::from(self.pulse1.output());
        let p2 = u16::from(self.pulse2.output());
        let triangle = u16::from(self.triangle.output());
        let noise = u16::from(self.noise.output());
        (p1 * 4 + p2 * 4 + triangle * 5 + noise * 4) as u8
    }
}

impl Default for Apu {
    fn default() -> Self {
        Self::new()
    }
}
