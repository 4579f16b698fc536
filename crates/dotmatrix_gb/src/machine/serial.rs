use super::interrupts::{Interrupt, InterruptController};

/// Serial port registers (SB 0xFF01, SC 0xFF02) with no link partner.
///
/// Transfers on the internal clock finish immediately and the byte is kept
/// in `output`, which is where test ROMs print their results.
#[derive(Clone, Debug, Default)]
pub struct Serial {
    sb: u8,
    sc: u8,
    output: Vec<u8>,
}

impl Serial {
    pub fn read(&self, addr: u16) -> u8 {
        match addr {
            0xFF01 => self.sb,
            _ => 0x7E | self.sc,
        }
    }

    pub fn write(&mut self, addr: u16, value: u8, interrupts: &mut InterruptController) {
        match addr {
            0xFF01 => self.sb = value,
            _ => {
                self.sc = value & 0x81;
                if self.sc == 0x81 {
                    self.output.push(self.sb);
                    log::trace!("GB serial out: 0x{:02X}", self.sb);
                    self.sb = 0xFF;
                    self.sc &= 0x7F;
                    interrupts.request(Interrupt::SERIAL);
                }
            }
        }
    }

    pub fn output(&self) -> &[u8] {
        &self.output
    }
}
