mod alu;
mod exec;
mod helpers;
pub mod instructions;
mod interrupts;
mod operand;
mod regs;


pub use instructions::{CbInstruction, Instruction, Kind, CB_INSTRUCTIONS, INSTRUCTIONS};
pub use regs::{Flag, Registers};

use crate::error::EmuError;
use crate::machine::InterruptController;

/// The CPU's view of the rest of the machine.
///
/// The CPU is the only component that moves time forward; it does so by
/// calling [`Bus::advance`] once per instruction (and once per interrupt
/// dispatch) with the number of M-cycles consumed.
pub trait Bus {
    fn read8(&mut self, addr: u16) -> u8;
    fn write8(&mut self, addr: u16, value: u8);

    fn read16(&mut self, addr: u16) -> u16 {
        let lo = self.read8(addr);
        let hi = self.read8(addr.wrapping_add(1));
        u16::from_le_bytes([lo, hi])
    }

    fn write16(&mut self, addr: u16, value: u16) {
        let [lo, hi] = value.to_le_bytes();
        self.write8(addr, lo);
        self.write8(addr.wrapping_add(1), hi);
    }

    /// Run every other component for `m_cycles` M-cycles.
    fn advance(&mut self, m_cycles: u32);

    fn interrupts(&mut self) -> &mut InterruptController;
}

/// Sharp LR35902 core, stepped one instruction at a time.
#[derive(Clone, Debug)]
pub struct Cpu {
    pub regs: Registers,
    /// Interrupt master enable.
    pub ime: bool,
    pub halted: bool,
    /// Set by EI; IME turns on once the following instruction has run.
    ime_scheduled: bool,
}

impl Default for Cpu {
    fn default() -> Self {
        Self::new()
    }
}

impl Cpu {
    pub fn new() -> Self {
        Self {
            regs: Registers::DMG_BOOT,
            ime: false,
            halted: false,
            ime_scheduled: false,
        }
    }

    /// Reset to the state the boot ROM hands over at 0x0100.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Execute one instruction (or one idle HALT cycle) and service at most
    /// one interrupt afterwards.
    ///
    /// Returns the M-cycles consumed, interrupt dispatch included.
    pub fn step<B: Bus>(&mut self, bus: &mut B) -> Result<u32, EmuError> {
        if self.ime_scheduled {
            self.ime_scheduled = false;
            self.ime = true;
        }

        let mut cycles = if self.halted {
            bus.advance(1);
            if bus.interrupts().has_requested() {
                self.halted = false;
            }
            1
        } else {
            self.execute_next(bus)?
        };

        if self.ime {
            if let Some(taken) = self.service_interrupt(bus) {
                cycles += taken;
            }
        }

        Ok(cycles)
    }

    fn execute_next<B: Bus>(&mut self, bus: &mut B) -> Result<u32, EmuError> {
        let pc = self.regs.pc;
        let opcode = self.fetch8(bus);
        let instr = &INSTRUCTIONS[opcode as usize];

        if log::log_enabled!(log::Level::Trace) {
            log::trace!(
                "GB CPU pc=0x{:04X} op=0x{:02X} {:?} a=0x{:02X} f=0x{:02X} bc=0x{:04X} de=0x{:04X} hl=0x{:04X} sp=0x{:04X}",
                pc,
                opcode,
                instr.kind,
                self.regs.a,
                self.regs.f,
                self.regs.bc(),
                self.regs.de(),
                self.regs.hl(),
                self.regs.sp,
            );
        }

        if instr.kind == Kind::Invalid {
            log::error!("GB CPU locked: invalid opcode 0x{:02X} at 0x{:04X}", opcode, pc);
            return Err(EmuError::UnimplementedOpcode { opcode, pc });
        }

        let operand = self.resolve_operand(bus, instr);
        let cycles = self.execute(bus, instr, operand);
        bus.advance(cycles);
        Ok(cycles)
    }
}
