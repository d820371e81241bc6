//! Standard controller with serial shift-register readout.

/// The eight buttons, in the order the controller reports them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    A,
    B,
    Select,
    Start,
    Up,
    Down,
    Left,
    Right,
}

impl Button {
    fn bit(self) -> u8 {
        match self {
            Button::A => 0,
            Button::B => 1,
            Button::Select => 2,
            Button::Start => 3,
            Button::Up => 4,
            Button::Down => 5,
            Button::Left => 6,
            Button::Right => 7,
        }
    }
}

/// One standard controller.
///
/// While the strobe is high the button states are latched continuously
/// and reads always report the A button; dropping the strobe freezes the
/// latch and successive reads walk through the eight buttons serially.
#[derive(Debug, Default)]
pub struct Joypad {
    buttons: u8,
    position: u8,
    strobe: bool,
}

impl Joypad {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn button_down(&mut self, button: Button) {
        self.buttons |= 1 << button.bit();
    }

    pub fn button_up(&mut self, button: Button) {
        self.buttons &= !(1 << button.bit());
    }

    pub fn set_button(&mut self, button: Button, pressed: bool) {
        if pressed {
            self.button_down(button);
        } else {
            self.button_up(button);
        }
    }

    /// $4016 write: bit 0 drives the strobe line.
    pub fn write(&mut self, value: u8) {
        self.strobe = value & 1 != 0;
        if self.strobe {
            self.position = 0;
        }
    }

    /// $4016/$4017 read: bit 0 of the shift register at the current
    /// serial position. Advances the position unless the strobe is high.
    /// After all eight buttons have been read the line reports 1.
    pub fn read(&mut self) -> u8 {
        if self.strobe {
            return self.buttons & 1;
        }
        if self.position >= 8 {
            return 1;
        }
        let bit = (self.buttons >> self.position) & 1;
        self.position += 1;
        bit
    }
}
