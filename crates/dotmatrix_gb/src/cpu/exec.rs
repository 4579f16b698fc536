use super::instructions::{AddrMode, CbOp, Instruction, Kind, Reg, CB_INSTRUCTIONS};
use super::operand::Operand;
use super::{Bus, Cpu, Flag};

impl Cpu {
    /// Apply the semantics of `instr` and return its M-cycle cost.
    pub(super) fn execute<B: Bus>(&mut self, bus: &mut B, instr: &Instruction, operand: Operand) -> u32 {
        let data = operand.data;
        let taken = instr.cycles as u32;

        match instr.kind {
            Kind::Nop | Kind::Invalid => taken,
            Kind::Ld | Kind::Ldh => {
                self.exec_ld(bus, instr, operand);
                taken
            }
            Kind::Inc => {
                self.exec_inc_dec(bus, instr, operand, true);
                taken
            }
            Kind::Dec => {
                self.exec_inc_dec(bus, instr, operand, false);
                taken
            }
            Kind::Add => {
                match instr.reg1 {
                    Reg::HL => self.alu_add16_hl(data),
                    Reg::SP => self.regs.sp = self.alu_sp_offset(data as u8),
                    _ => self.alu_add(data as u8, false),
                }
                taken
            }
            Kind::Adc => {
                self.alu_add(data as u8, true);
                taken
            }
            Kind::Sub => {
                self.alu_sub(data as u8, false);
                taken
            }
            Kind::Sbc => {
                self.alu_sub(data as u8, true);
                taken
            }
            Kind::And => {
                self.alu_and(data as u8);
                taken
            }
            Kind::Xor => {
                self.alu_xor(data as u8);
                taken
            }
            Kind::Or => {
                self.alu_or(data as u8);
                taken
            }
            Kind::Cp => {
                self.alu_cp(data as u8);
                taken
            }
            Kind::Rlca | Kind::Rrca | Kind::Rla | Kind::Rra => {
                let op = match instr.kind {
                    Kind::Rlca => CbOp::Rlc,
                    Kind::Rrca => CbOp::Rrc,
                    Kind::Rla => CbOp::Rl,
                    _ => CbOp::Rr,
                };
                self.regs.a = self.alu_shift(op, self.regs.a);
                self.set_flag(Flag::Z, false);
                taken
            }
            Kind::Daa => {
                self.alu_daa();
                taken
            }
            Kind::Cpl => {
                self.regs.a = !self.regs.a;
                self.set_flag(Flag::N, true);
                self.set_flag(Flag::H, true);
                taken
            }
            Kind::Scf => {
                self.set_flag(Flag::N, false);
                self.set_flag(Flag::H, false);
                self.set_flag(Flag::C, true);
                taken
            }
            Kind::Ccf => {
                let carry = self.get_flag(Flag::C);
                self.set_flag(Flag::N, false);
                self.set_flag(Flag::H, false);
                self.set_flag(Flag::C, !carry);
                taken
            }
            Kind::Jp => self.branch(bus, instr, |cpu, _| cpu.regs.pc = data),
            Kind::Jr => self.branch(bus, instr, |cpu, _| {
                cpu.regs.pc = cpu.regs.pc.wrapping_add(data as u8 as i8 as u16);
            }),
            Kind::Call => self.branch(bus, instr, |cpu, bus| {
                let ret = cpu.regs.pc;
                cpu.push16(bus, ret);
                cpu.regs.pc = data;
            }),
            Kind::Ret => self.branch(bus, instr, |cpu, bus| {
                cpu.regs.pc = cpu.pop16(bus);
            }),
            Kind::Reti => {
                self.ime = true;
                self.regs.pc = self.pop16(bus);
                taken
            }
            Kind::Rst => {
                let ret = self.regs.pc;
                self.push16(bus, ret);
                self.regs.pc = instr.param as u16;
                taken
            }
            Kind::Push => {
                self.push16(bus, data);
                taken
            }
            Kind::Pop => {
                let value = self.pop16(bus);
                self.regs.set(instr.reg1, value);
                taken
            }
            Kind::Di => {
                self.ime = false;
                self.ime_scheduled = false;
                taken
            }
            Kind::Ei => {
                self.ime_scheduled = true;
                taken
            }
            Kind::Halt => {
                self.halted = true;
                taken
            }
            Kind::Stop => {
                // Low-power mode is not modelled; the divider still resets.
                bus.write8(0xFF04, 0);
                taken
            }
            Kind::Prefix => {
                let opcode = self.fetch8(bus);
                self.exec_cb(bus, opcode)
            }
        }
    }

    /// Run `jump` when the condition holds; cost depends on the outcome.
    fn branch<B: Bus, F>(&mut self, bus: &mut B, instr: &Instruction, jump: F) -> u32
    where
        F: FnOnce(&mut Cpu, &mut B),
    {
        if self.condition_met(instr.cond) {
            jump(self, bus);
            instr.cycles as u32
        } else {
            instr.cycles_untaken as u32
        }
    }

    fn exec_ld<B: Bus>(&mut self, bus: &mut B, instr: &Instruction, operand: Operand) {
        if let Some(addr) = operand.dest {
            if instr.reg2.is_16bit() {
                bus.write16(addr, operand.data);
            } else {
                bus.write8(addr, operand.data as u8);
            }
            return;
        }

        let value = match instr.mode {
            AddrMode::HlSpOffset => self.alu_sp_offset(operand.data as u8),
            _ => operand.data,
        };
        self.regs.set(instr.reg1, value);
    }

    fn exec_inc_dec<B: Bus>(&mut self, bus: &mut B, instr: &Instruction, operand: Operand, inc: bool) {
        if let Some(addr) = operand.dest {
            let value = operand.data as u8;
            let result = if inc {
                self.alu_inc8(value)
            } else {
                self.alu_dec8(value)
            };
            bus.write8(addr, result);
        } else if instr.reg1.is_16bit() {
            let value = self.regs.get(instr.reg1);
            let result = if inc {
                value.wrapping_add(1)
            } else {
                value.wrapping_sub(1)
            };
            self.regs.set(instr.reg1, result);
        } else {
            let value = operand.data as u8;
            let result = if inc {
                self.alu_inc8(value)
            } else {
                self.alu_dec8(value)
            };
            self.regs.set(instr.reg1, result as u16);
        }
    }

    fn exec_cb<B: Bus>(&mut self, bus: &mut B, opcode: u8) -> u32 {
        let cb = CB_INSTRUCTIONS[opcode as usize];
        let value = match cb.target {
            Reg::HL => bus.read8(self.regs.hl()),
            reg => self.regs.get(reg) as u8,
        };

        let result = match cb.op {
            CbOp::Bit => {
                self.set_flag(Flag::Z, value & (1 << cb.bit) == 0);
                self.set_flag(Flag::N, false);
                self.set_flag(Flag::H, true);
                None
            }
            CbOp::Res => Some(value & !(1 << cb.bit)),
            CbOp::Set => Some(value | (1 << cb.bit)),
            op => Some(self.alu_shift(op, value)),
        };

        if let Some(result) = result {
            match cb.target {
                Reg::HL => bus.write8(self.regs.hl(), result),
                reg => self.regs.set(reg, result as u16),
            }
        }
        cb.cycles as u32
    }
}
