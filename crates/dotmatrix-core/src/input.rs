/// Snapshot of the eight-button matrix, owned by the host between frames.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Buttons {
    pub a: bool,
    pub b: bool,
    pub select: bool,
    pub start: bool,
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
}

impl Buttons {
    fn any_newly_pressed(self, prev: Buttons) -> bool {
        (self.a && !prev.a)
            || (self.b && !prev.b)
            || (self.select && !prev.select)
            || (self.start && !prev.start)
            || (self.up && !prev.up)
            || (self.down && !prev.down)
            || (self.left && !prev.left)
            || (self.right && !prev.right)
    }
}

/// Joypad register (0xFF00). Software writes the select bits; the read value
/// recomputes the low nibble from the button matrix, active-low.
pub struct Input {
    select: u8,
    buttons: Buttons,
}

impl Input {
    pub fn new() -> Self {
        Self {
            select: 0,
            buttons: Buttons::default(),
        }
    }

    pub fn read(&self) -> u8 {
        let mut nibble = 0x0F;
        if self.select & 0x10 == 0 {
            // D-pad group selected
            if self.buttons.right {
                nibble &= !0x01;
            }
            if self.buttons.left {
                nibble &= !0x02;
            }
            if self.buttons.up {
                nibble &= !0x04;
            }
            if self.buttons.down {
                nibble &= !0x08;
            }
        }
        if self.select & 0x20 == 0 {
            // Action group selected
            if self.buttons.a {
                nibble &= !0x01;
            }
            if self.buttons.b {
                nibble &= !0x02;
            }
            if self.buttons.select {
                nibble &= !0x04;
            }
            if self.buttons.start {
                nibble &= !0x08;
            }
        }
        0xC0 | self.select | nibble
    }

    pub fn write(&mut self, val: u8) {
        self.select = val & 0x30;
    }

    /// Replace the button matrix with the host's latest snapshot. A button
    /// going from released to pressed raises the joypad interrupt.
    pub fn set_buttons(&mut self, buttons: Buttons, if_reg: &mut u8) {
        if buttons.any_newly_pressed(self.buttons) {
            *if_reg |= 0x10;
        }
        self.buttons = buttons;
    }

    pub fn buttons(&self) -> Buttons {
        self.buttons
    }
}

impl Default for Input {
    fn default() -> Self {
        Self::new()
    }
}
