use dotmatrix_common::key::{Button, KeyEvent};

use super::interrupts::{Interrupt, InterruptController};

/// P1/JOYP (0xFF00) with active-low button lines.
#[derive(Clone, Debug)]
pub struct Joypad {
    /// Bits 4..5 as last written; 0 selects the group.
    select: u8,
    /// Pressed d-pad directions, bit set = pressed (Right=0 Left=1 Up=2 Down=3).
    dpad: u8,
    /// Pressed action buttons, bit set = pressed (A=0 B=1 Select=2 Start=3).
    actions: u8,
}

impl Default for Joypad {
    fn default() -> Self {
        Self {
            select: 0x30,
            dpad: 0,
            actions: 0,
        }
    }
}

impl Joypad {
    pub fn read(&self) -> u8 {
        let mut lines = 0x0F;
        if self.select & 0x10 == 0 {
            lines &= !self.dpad;
        }
        if self.select & 0x20 == 0 {
            lines &= !self.actions;
        }
        0xC0 | self.select | (lines & 0x0F)
    }

    pub fn write(&mut self, value: u8) {
        self.select = value & 0x30;
    }

    /// Apply a key transition; a press requests the joypad interrupt.
    pub fn apply(&mut self, event: KeyEvent, interrupts: &mut InterruptController) {
        let (group, bit) = match event.button {
            Button::Right => (&mut self.dpad, 0),
            Button::Left => (&mut self.dpad, 1),
            Button::Up => (&mut self.dpad, 2),
            Button::Down => (&mut self.dpad, 3),
            Button::A => (&mut self.actions, 0),
            Button::B => (&mut self.actions, 1),
            Button::Select => (&mut self.actions, 2),
            Button::Start => (&mut self.actions, 3),
        };
        if event.pressed {
            *group |= 1 << bit;
            interrupts.request(Interrupt::JOYPAD);
        } else {
            *group &= !(1 << bit);
        }
    }
}
