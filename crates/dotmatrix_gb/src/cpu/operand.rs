use super::instructions::{AddrMode, Instruction, Reg};
use super::{Bus, Cpu};

/// Resolved source value and, for memory destinations, the target address.
#[derive(Clone, Copy, Debug, Default)]
pub(super) struct Operand {
    pub data: u16,
    pub dest: Option<u16>,
}

impl Operand {
    fn value(data: u16) -> Self {
        Self { data, dest: None }
    }
}

impl Cpu {
    /// Indirect address held in `reg`; `(C)` is the 0xFF00 page.
    #[inline]
    fn indirect(&self, reg: Reg) -> u16 {
        match reg {
            Reg::C => 0xFF00 | self.regs.c as u16,
            _ => self.regs.get(reg),
        }
    }

    /// Consume immediates and perform source reads for `instr`.
    pub(super) fn resolve_operand<B: Bus>(&mut self, bus: &mut B, instr: &Instruction) -> Operand {
        match instr.mode {
            AddrMode::Implied => Operand::default(),
            AddrMode::Direct => Operand::value(self.regs.get(instr.reg1)),
            AddrMode::RegReg => Operand::value(self.regs.get(instr.reg2)),
            AddrMode::RegImm8 | AddrMode::Imm8 | AddrMode::HlSpOffset => {
                Operand::value(self.fetch8(bus) as u16)
            }
            AddrMode::RegImm16 | AddrMode::Imm16 => Operand::value(self.fetch16(bus)),
            AddrMode::RegMem => {
                let addr = self.indirect(instr.reg2);
                Operand::value(bus.read8(addr) as u16)
            }
            AddrMode::RegHli | AddrMode::RegHld => {
                let hl = self.regs.hl();
                let data = bus.read8(hl) as u16;
                self.regs.set_hl(step_hl(hl, instr.mode == AddrMode::RegHli));
                Operand::value(data)
            }
            AddrMode::RegAbs16 => {
                let addr = self.fetch16(bus);
                Operand::value(bus.read8(addr) as u16)
            }
            AddrMode::RegZeroPage => {
                let addr = 0xFF00 | self.fetch8(bus) as u16;
                Operand::value(bus.read8(addr) as u16)
            }
            AddrMode::Mem => {
                let addr = self.indirect(instr.reg1);
                Operand {
                    data: bus.read8(addr) as u16,
                    dest: Some(addr),
                }
            }
            AddrMode::MemImm8 => {
                let data = self.fetch8(bus) as u16;
                Operand {
                    data,
                    dest: Some(self.indirect(instr.reg1)),
                }
            }
            AddrMode::MemReg => Operand {
                data: self.regs.get(instr.reg2),
                dest: Some(self.indirect(instr.reg1)),
            },
            AddrMode::ZeroPageReg => {
                let addr = 0xFF00 | self.fetch8(bus) as u16;
                Operand {
                    data: self.regs.get(instr.reg2),
                    dest: Some(addr),
                }
            }
            AddrMode::Abs16Reg => {
                let addr = self.fetch16(bus);
                Operand {
                    data: self.regs.get(instr.reg2),
                    dest: Some(addr),
                }
            }
            AddrMode::HliReg | AddrMode::HldReg => {
                let hl = self.regs.hl();
                self.regs.set_hl(step_hl(hl, instr.mode == AddrMode::HliReg));
                Operand {
                    data: self.regs.get(instr.reg2),
                    dest: Some(hl),
                }
            }
        }
    }
}

#[inline]
fn step_hl(hl: u16, increment: bool) -> u16 {
    if increment {
        hl.wrapping_add(1)
    } else {
        hl.wrapping_sub(1)
    }
}
