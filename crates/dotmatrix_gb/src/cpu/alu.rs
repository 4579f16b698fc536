use super::instructions::CbOp;
use super::{Cpu, Flag};

// Carry into bit N shows up as bit N of `a ^ b ^ result`.

#[inline]
fn half_carry8(a: u16, b: u16, result: u16) -> bool {
    (a ^ b ^ result) & 0x10 != 0
}

#[inline]
fn carry8(a: u16, b: u16, result: u16) -> bool {
    (a ^ b ^ result) & 0x100 != 0
}

#[inline]
fn half_carry16(a: u32, b: u32, result: u32) -> bool {
    (a ^ b ^ result) & 0x1000 != 0
}

#[inline]
fn carry16(a: u32, b: u32, result: u32) -> bool {
    (a ^ b ^ result) & 0x1_0000 != 0
}

impl Cpu {
    /// ADD/ADC on A.
    pub(super) fn alu_add(&mut self, value: u8, use_carry: bool) {
        let a = self.regs.a as u16;
        let b = value as u16;
        let carry_in = u16::from(use_carry && self.get_flag(Flag::C));
        let result = a + b + carry_in;

        self.regs.a = result as u8;
        self.set_flags(
            result as u8 == 0,
            false,
            half_carry8(a, b, result),
            carry8(a, b, result),
        );
    }

    /// SUB/SBC on A.
    pub(super) fn alu_sub(&mut self, value: u8, use_carry: bool) {
        self.regs.a = self.subtract(value, use_carry);
    }

    /// CP: SUB without storing the result.
    pub(super) fn alu_cp(&mut self, value: u8) {
        self.subtract(value, false);
    }

    fn subtract(&mut self, value: u8, use_carry: bool) -> u8 {
        let a = self.regs.a as u16;
        let b = value as u16;
        let carry_in = u16::from(use_carry && self.get_flag(Flag::C));
        let result = a.wrapping_sub(b).wrapping_sub(carry_in);

        self.set_flags(
            result as u8 == 0,
            true,
            half_carry8(a, b, result),
            carry8(a, b, result),
        );
        result as u8
    }

    pub(super) fn alu_and(&mut self, value: u8) {
        self.regs.a &= value;
        self.set_flags(self.regs.a == 0, false, true, false);
    }

    pub(super) fn alu_or(&mut self, value: u8) {
        self.regs.a |= value;
        self.set_flags(self.regs.a == 0, false, false, false);
    }

    pub(super) fn alu_xor(&mut self, value: u8) {
        self.regs.a ^= value;
        self.set_flags(self.regs.a == 0, false, false, false);
    }

    /// 8-bit INC; C is preserved.
    pub(super) fn alu_inc8(&mut self, value: u8) -> u8 {
        let result = value.wrapping_add(1);
        self.set_flag(Flag::Z, result == 0);
        self.set_flag(Flag::N, false);
        self.set_flag(Flag::H, half_carry8(value as u16, 1, result as u16));
        result
    }

    /// 8-bit DEC; C is preserved.
    pub(super) fn alu_dec8(&mut self, value: u8) -> u8 {
        let result = value.wrapping_sub(1);
        self.set_flag(Flag::Z, result == 0);
        self.set_flag(Flag::N, true);
        self.set_flag(Flag::H, half_carry8(value as u16, 1, result as u16));
        result
    }

    /// ADD HL,rr; Z is preserved.
    pub(super) fn alu_add16_hl(&mut self, value: u16) {
        let hl = self.regs.hl() as u32;
        let b = value as u32;
        let result = hl + b;

        self.regs.set_hl(result as u16);
        self.set_flag(Flag::N, false);
        self.set_flag(Flag::H, half_carry16(hl, b, result));
        self.set_flag(Flag::C, carry16(hl, b, result));
    }

    /// SP + signed 8-bit offset, shared by ADD SP,e8 and LD HL,SP+e8.
    ///
    /// H and C come from the unsigned add of the low bytes.
    pub(super) fn alu_sp_offset(&mut self, offset: u8) -> u16 {
        let sp = self.regs.sp;
        let b = offset as i8 as i16 as u16;
        let result = sp.wrapping_add(b);

        self.set_flags(
            false,
            false,
            half_carry8(sp, b, result),
            carry8(sp, b, result),
        );
        result
    }

    pub(super) fn alu_daa(&mut self) {
        let mut a = self.regs.a;
        let mut carry = self.get_flag(Flag::C);
        let half = self.get_flag(Flag::H);

        if !self.get_flag(Flag::N) {
            if carry || a > 0x99 {
                a = a.wrapping_add(0x60);
                carry = true;
            }
            if half || (a & 0x0F) > 0x09 {
                a = a.wrapping_add(0x06);
            }
        } else {
            if carry {
                a = a.wrapping_sub(0x60);
            }
            if half {
                a = a.wrapping_sub(0x06);
            }
        }

        self.regs.a = a;
        self.set_flag(Flag::Z, a == 0);
        self.set_flag(Flag::H, false);
        self.set_flag(Flag::C, carry);
    }

    /// Rotate/shift/swap used by the 0xCB table and the A-register rotates.
    ///
    /// Sets Z from the result, clears N and H, and sets C from the bit shifted
    /// out.
    pub(super) fn alu_shift(&mut self, op: CbOp, value: u8) -> u8 {
        let carry_in = u8::from(self.get_flag(Flag::C));
        let (result, carry_out) = match op {
            CbOp::Rlc => (value.rotate_left(1), value >> 7),
            CbOp::Rrc => (value.rotate_right(1), value & 1),
            CbOp::Rl => ((value << 1) | carry_in, value >> 7),
            CbOp::Rr => ((value >> 1) | (carry_in << 7), value & 1),
            CbOp::Sla => (value << 1, value >> 7),
            CbOp::Sra => ((value >> 1) | (value & 0x80), value & 1),
            CbOp::Swap => (value.rotate_left(4), 0),
            CbOp::Srl => (value >> 1, value & 1),
            CbOp::Bit | CbOp::Res | CbOp::Set => (value, carry_in),
        };
        self.set_flags(result == 0, false, false, carry_out != 0);
        result
    }
}
