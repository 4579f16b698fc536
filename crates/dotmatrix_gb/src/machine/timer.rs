//! DIV/TIMA/TMA/TAC.
//!
//! The 16-bit divider advances once per T-cycle and DIV exposes its upper
//! byte. TIMA counts falling edges of the divider bit selected by TAC while
//! TAC bit 2 is set.

use super::interrupts::{Interrupt, InterruptController};

pub const DIV: u16 = 0xFF04;
pub const TIMA: u16 = 0xFF05;
pub const TMA: u16 = 0xFF06;
pub const TAC: u16 = 0xFF07;

/// Divider bit watched for each TAC[1:0] setting (4096, 262144, 65536 and
/// 16384 Hz).
const RATE_BITS: [u16; 4] = [9, 3, 5, 7];

#[derive(Clone, Debug)]
pub struct Timer {
    /// Hidden system counter; DIV is the high byte.
    div: u16,
    tima: u8,
    tma: u8,
    tac: u8,
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}

impl Timer {
    /// Power-on state after the DMG boot ROM (DIV reads 0xAB).
    pub fn new() -> Self {
        Self {
            div: 0xABCC,
            tima: 0,
            tma: 0,
            tac: 0,
        }
    }

    #[inline]
    fn enabled(&self) -> bool {
        self.tac & 0x04 != 0
    }

    /// Whether the watched divider bit currently feeds a 1 into the edge
    /// detector.
    #[inline]
    fn signal(&self, div: u16) -> bool {
        let bit = RATE_BITS[(self.tac & 0x03) as usize];
        self.enabled() && (div >> bit) & 1 != 0
    }

    /// Advance one T-cycle.
    pub fn tick(&mut self, interrupts: &mut InterruptController) {
        let before = self.signal(self.div);
        self.div = self.div.wrapping_add(1);
        if before && !self.signal(self.div) {
            self.increment(interrupts);
        }
    }

    fn increment(&mut self, interrupts: &mut InterruptController) {
        let (next, overflow) = self.tima.overflowing_add(1);
        if overflow {
            self.tima = self.tma;
            interrupts.request(Interrupt::TIMER);
        } else {
            self.tima = next;
        }
    }

    pub fn read(&self, addr: u16) -> u8 {
        match addr {
            DIV => (self.div >> 8) as u8,
            TIMA => self.tima,
            TMA => self.tma,
            TAC => 0xF8 | self.tac,
            _ => 0xFF,
        }
    }

    pub fn write(&mut self, addr: u16, value: u8, interrupts: &mut InterruptController) {
        match addr {
            DIV => {
                // Clearing the divider can itself produce a falling edge.
                let before = self.signal(self.div);
                self.div = 0;
                if before {
                    self.increment(interrupts);
                }
            }
            TIMA => self.tima = value,
            TMA => self.tma = value,
            TAC => {
                let before = self.signal(self.div);
                self.tac = value & 0x07;
                if before && !self.signal(self.div) {
                    self.increment(interrupts);
                }
            }
            _ => {}
        }
    }
}
