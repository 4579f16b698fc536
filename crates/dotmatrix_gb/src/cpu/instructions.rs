//! Opcode descriptor tables.
//!
//! Every byte value has an entry in both the base table and the 0xCB table.
//! Cycle counts are in M-cycles.

use lazy_static::lazy_static;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Kind {
    Nop,
    Ld,
    Ldh,
    Inc,
    Dec,
    Rlca,
    Rrca,
    Rla,
    Rra,
    Stop,
    Jr,
    Daa,
    Cpl,
    Scf,
    Ccf,
    Halt,
    Add,
    Adc,
    Sub,
    Sbc,
    And,
    Xor,
    Or,
    Cp,
    Pop,
    Jp,
    Push,
    Ret,
    Call,
    Rst,
    Reti,
    Prefix,
    Di,
    Ei,
    /// Opcode with no defined behaviour on the DMG.
    Invalid,
}

/// How an instruction finds its source value and destination.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AddrMode {
    Implied,
    /// `reg1`
    Direct,
    /// `reg1 <- reg2`
    RegReg,
    RegImm16,
    RegImm8,
    /// `reg1 <- (reg2)`; `(C)` means `0xFF00 + C`.
    RegMem,
    /// `reg1 <- (HL+)`
    RegHli,
    /// `reg1 <- (HL-)`
    RegHld,
    RegAbs16,
    /// `reg1 <- (0xFF00 + n8)`
    RegZeroPage,
    Imm8,
    Imm16,
    /// Read-modify-write on `(reg1)`.
    Mem,
    MemImm8,
    /// `(reg1) <- reg2`; `(C)` means `0xFF00 + C`.
    MemReg,
    /// `(0xFF00 + n8) <- reg2`
    ZeroPageReg,
    Abs16Reg,
    HliReg,
    HldReg,
    /// `HL <- SP + e8`
    HlSpOffset,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Reg {
    None,
    A,
    F,
    B,
    C,
    D,
    E,
    H,
    L,
    AF,
    BC,
    DE,
    HL,
    SP,
    PC,
}

impl Reg {
    #[inline]
    pub fn is_16bit(self) -> bool {
        matches!(self, Reg::AF | Reg::BC | Reg::DE | Reg::HL | Reg::SP | Reg::PC)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Condition {
    Always,
    NZ,
    Z,
    NC,
    C,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Instruction {
    pub kind: Kind,
    pub mode: AddrMode,
    pub reg1: Reg,
    pub reg2: Reg,
    pub cond: Condition,
    pub cycles: u8,
    pub cycles_untaken: u8,
    /// RST target.
    pub param: u8,
}

impl Instruction {
    const fn new(kind: Kind, mode: AddrMode, cycles: u8) -> Self {
        Self {
            kind,
            mode,
            reg1: Reg::None,
            reg2: Reg::None,
            cond: Condition::Always,
            cycles,
            cycles_untaken: cycles,
            param: 0,
        }
    }

    const fn r1(mut self, reg: Reg) -> Self {
        self.reg1 = reg;
        self
    }

    const fn r2(mut self, reg: Reg) -> Self {
        self.reg2 = reg;
        self
    }

    const fn when(mut self, cond: Condition, cycles_untaken: u8) -> Self {
        self.cond = cond;
        self.cycles_untaken = cycles_untaken;
        self
    }

    const fn rst(vector: u8) -> Self {
        let mut ins = Self::new(Kind::Rst, AddrMode::Implied, 4);
        ins.param = vector;
        ins
    }
}

/// Register operands in opcode encoding order; index 6 is `(HL)`.
pub const R8_ORDER: [Reg; 8] = [Reg::B, Reg::C, Reg::D, Reg::E, Reg::H, Reg::L, Reg::HL, Reg::A];

const ALU_ORDER: [Kind; 8] = [
    Kind::Add,
    Kind::Adc,
    Kind::Sub,
    Kind::Sbc,
    Kind::And,
    Kind::Xor,
    Kind::Or,
    Kind::Cp,
];

pub static INSTRUCTIONS: [Instruction; 256] = build_table();

const fn build_table() -> [Instruction; 256] {
    use AddrMode::*;
    use Condition::{C as IfC, NC as IfNC, NZ as IfNZ, Z as IfZ};
    use Kind::*;

    let invalid = Instruction::new(Invalid, Implied, 1);
    let mut t = [invalid; 256];

    t[0x00] = Instruction::new(Nop, Implied, 1);
    t[0x01] = Instruction::new(Ld, RegImm16, 3).r1(Reg::BC);
    t[0x02] = Instruction::new(Ld, MemReg, 2).r1(Reg::BC).r2(Reg::A);
    t[0x03] = Instruction::new(Inc, Direct, 2).r1(Reg::BC);
    t[0x07] = Instruction::new(Rlca, Implied, 1);
    t[0x08] = Instruction::new(Ld, Abs16Reg, 5).r2(Reg::SP);
    t[0x09] = Instruction::new(Add, RegReg, 2).r1(Reg::HL).r2(Reg::BC);
    t[0x0A] = Instruction::new(Ld, RegMem, 2).r1(Reg::A).r2(Reg::BC);
    t[0x0B] = Instruction::new(Dec, Direct, 2).r1(Reg::BC);
    t[0x0F] = Instruction::new(Rrca, Implied, 1);

    t[0x10] = Instruction::new(Stop, Imm8, 1);
    t[0x11] = Instruction::new(Ld, RegImm16, 3).r1(Reg::DE);
    t[0x12] = Instruction::new(Ld, MemReg, 2).r1(Reg::DE).r2(Reg::A);
    t[0x13] = Instruction::new(Inc, Direct, 2).r1(Reg::DE);
    t[0x17] = Instruction::new(Rla, Implied, 1);
    t[0x18] = Instruction::new(Jr, Imm8, 3);
    t[0x19] = Instruction::new(Add, RegReg, 2).r1(Reg::HL).r2(Reg::DE);
    t[0x1A] = Instruction::new(Ld, RegMem, 2).r1(Reg::A).r2(Reg::DE);
    t[0x1B] = Instruction::new(Dec, Direct, 2).r1(Reg::DE);
    t[0x1F] = Instruction::new(Rra, Implied, 1);

    t[0x20] = Instruction::new(Jr, Imm8, 3).when(IfNZ, 2);
    t[0x21] = Instruction::new(Ld, RegImm16, 3).r1(Reg::HL);
    t[0x22] = Instruction::new(Ld, HliReg, 2).r1(Reg::HL).r2(Reg::A);
    t[0x23] = Instruction::new(Inc, Direct, 2).r1(Reg::HL);
    t[0x27] = Instruction::new(Daa, Implied, 1);
    t[0x28] = Instruction::new(Jr, Imm8, 3).when(IfZ, 2);
    t[0x29] = Instruction::new(Add, RegReg, 2).r1(Reg::HL).r2(Reg::HL);
    t[0x2A] = Instruction::new(Ld, RegHli, 2).r1(Reg::A).r2(Reg::HL);
    t[0x2B] = Instruction::new(Dec, Direct, 2).r1(Reg::HL);
    t[0x2F] = Instruction::new(Cpl, Implied, 1);

    t[0x30] = Instruction::new(Jr, Imm8, 3).when(IfNC, 2);
    t[0x31] = Instruction::new(Ld, RegImm16, 3).r1(Reg::SP);
    t[0x32] = Instruction::new(Ld, HldReg, 2).r1(Reg::HL).r2(Reg::A);
    t[0x33] = Instruction::new(Inc, Direct, 2).r1(Reg::SP);
    t[0x34] = Instruction::new(Inc, Mem, 3).r1(Reg::HL);
    t[0x35] = Instruction::new(Dec, Mem, 3).r1(Reg::HL);
    t[0x36] = Instruction::new(Ld, MemImm8, 3).r1(Reg::HL);
    t[0x37] = Instruction::new(Scf, Implied, 1);
    t[0x38] = Instruction::new(Jr, Imm8, 3).when(IfC, 2);
    t[0x39] = Instruction::new(Add, RegReg, 2).r1(Reg::HL).r2(Reg::SP);
    t[0x3A] = Instruction::new(Ld, RegHld, 2).r1(Reg::A).r2(Reg::HL);
    t[0x3B] = Instruction::new(Dec, Direct, 2).r1(Reg::SP);
    t[0x3F] = Instruction::new(Ccf, Implied, 1);

    // INC r / DEC r / LD r,n8 in columns 4/5/6 and C/D/E; (HL) is handled above.
    let mut row = 0;
    while row < 8 {
        let reg = R8_ORDER[row];
        if row != 6 {
            let base = row * 8;
            t[base + 0x04] = Instruction::new(Inc, Direct, 1).r1(reg);
            t[base + 0x05] = Instruction::new(Dec, Direct, 1).r1(reg);
            t[base + 0x06] = Instruction::new(Ld, RegImm8, 2).r1(reg);
        }
        row += 1;
    }

    let mut op = 0x40;
    while op < 0x80 {
        let dst = R8_ORDER[(op >> 3) & 7];
        let src = R8_ORDER[op & 7];
        t[op] = if op == 0x76 {
            Instruction::new(Halt, Implied, 1)
        } else if (op >> 3) & 7 == 6 {
            Instruction::new(Ld, MemReg, 2).r1(Reg::HL).r2(src)
        } else if op & 7 == 6 {
            Instruction::new(Ld, RegMem, 2).r1(dst).r2(Reg::HL)
        } else {
            Instruction::new(Ld, RegReg, 1).r1(dst).r2(src)
        };
        op += 1;
    }

    while op < 0xC0 {
        let kind = ALU_ORDER[(op >> 3) & 7];
        let src = R8_ORDER[op & 7];
        t[op] = if op & 7 == 6 {
            Instruction::new(kind, RegMem, 2).r1(Reg::A).r2(Reg::HL)
        } else {
            Instruction::new(kind, RegReg, 1).r1(Reg::A).r2(src)
        };
        op += 1;
    }

    t[0xC0] = Instruction::new(Ret, Implied, 5).when(IfNZ, 2);
    t[0xC1] = Instruction::new(Pop, Direct, 3).r1(Reg::BC);
    t[0xC2] = Instruction::new(Jp, Imm16, 4).when(IfNZ, 3);
    t[0xC3] = Instruction::new(Jp, Imm16, 4);
    t[0xC4] = Instruction::new(Call, Imm16, 6).when(IfNZ, 3);
    t[0xC5] = Instruction::new(Push, Direct, 4).r1(Reg::BC);
    t[0xC6] = Instruction::new(Add, RegImm8, 2).r1(Reg::A);
    t[0xC8] = Instruction::new(Ret, Implied, 5).when(IfZ, 2);
    t[0xC9] = Instruction::new(Ret, Implied, 4);
    t[0xCA] = Instruction::new(Jp, Imm16, 4).when(IfZ, 3);
    t[0xCB] = Instruction::new(Prefix, Implied, 1);
    t[0xCC] = Instruction::new(Call, Imm16, 6).when(IfZ, 3);
    t[0xCD] = Instruction::new(Call, Imm16, 6);
    t[0xCE] = Instruction::new(Adc, RegImm8, 2).r1(Reg::A);

    t[0xD0] = Instruction::new(Ret, Implied, 5).when(IfNC, 2);
    t[0xD1] = Instruction::new(Pop, Direct, 3).r1(Reg::DE);
    t[0xD2] = Instruction::new(Jp, Imm16, 4).when(IfNC, 3);
    t[0xD4] = Instruction::new(Call, Imm16, 6).when(IfNC, 3);
    t[0xD5] = Instruction::new(Push, Direct, 4).r1(Reg::DE);
    t[0xD6] = Instruction::new(Sub, RegImm8, 2).r1(Reg::A);
    t[0xD8] = Instruction::new(Ret, Implied, 5).when(IfC, 2);
    t[0xD9] = Instruction::new(Reti, Implied, 4);
    t[0xDA] = Instruction::new(Jp, Imm16, 4).when(IfC, 3);
    t[0xDC] = Instruction::new(Call, Imm16, 6).when(IfC, 3);
    t[0xDE] = Instruction::new(Sbc, RegImm8, 2).r1(Reg::A);

    t[0xE0] = Instruction::new(Ldh, ZeroPageReg, 3).r2(Reg::A);
    t[0xE1] = Instruction::new(Pop, Direct, 3).r1(Reg::HL);
    t[0xE2] = Instruction::new(Ld, MemReg, 2).r1(Reg::C).r2(Reg::A);
    t[0xE5] = Instruction::new(Push, Direct, 4).r1(Reg::HL);
    t[0xE6] = Instruction::new(And, RegImm8, 2).r1(Reg::A);
    t[0xE8] = Instruction::new(Add, RegImm8, 4).r1(Reg::SP);
    t[0xE9] = Instruction::new(Jp, Direct, 1).r1(Reg::HL);
    t[0xEA] = Instruction::new(Ld, Abs16Reg, 4).r2(Reg::A);
    t[0xEE] = Instruction::new(Xor, RegImm8, 2).r1(Reg::A);

    t[0xF0] = Instruction::new(Ldh, RegZeroPage, 3).r1(Reg::A);
    t[0xF1] = Instruction::new(Pop, Direct, 3).r1(Reg::AF);
    t[0xF2] = Instruction::new(Ld, RegMem, 2).r1(Reg::A).r2(Reg::C);
    t[0xF3] = Instruction::new(Di, Implied, 1);
    t[0xF5] = Instruction::new(Push, Direct, 4).r1(Reg::AF);
    t[0xF6] = Instruction::new(Or, RegImm8, 2).r1(Reg::A);
    t[0xF8] = Instruction::new(Ld, HlSpOffset, 3).r1(Reg::HL).r2(Reg::SP);
    t[0xF9] = Instruction::new(Ld, RegReg, 2).r1(Reg::SP).r2(Reg::HL);
    t[0xFA] = Instruction::new(Ld, RegAbs16, 4).r1(Reg::A);
    t[0xFB] = Instruction::new(Ei, Implied, 1);
    t[0xFE] = Instruction::new(Cp, RegImm8, 2).r1(Reg::A);

    let mut vector = 0;
    while vector < 0x40 {
        t[0xC7 + vector] = Instruction::rst(vector as u8);
        vector += 8;
    }

    t
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CbOp {
    Rlc,
    Rrc,
    Rl,
    Rr,
    Sla,
    Sra,
    Swap,
    Srl,
    Bit,
    Res,
    Set,
}

const ROTATE_ORDER: [CbOp; 8] = [
    CbOp::Rlc,
    CbOp::Rrc,
    CbOp::Rl,
    CbOp::Rr,
    CbOp::Sla,
    CbOp::Sra,
    CbOp::Swap,
    CbOp::Srl,
];

/// One entry of the 0xCB-prefixed table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CbInstruction {
    pub op: CbOp,
    /// Operand register; `Reg::HL` stands for `(HL)`.
    pub target: Reg,
    pub bit: u8,
    /// Total cost including the prefix fetch.
    pub cycles: u8,
}

impl CbInstruction {
    fn decode(opcode: u8) -> Self {
        let target = R8_ORDER[(opcode & 7) as usize];
        let bit = (opcode >> 3) & 7;
        let op = match opcode >> 6 {
            0 => ROTATE_ORDER[bit as usize],
            1 => CbOp::Bit,
            2 => CbOp::Res,
            _ => CbOp::Set,
        };
        let cycles = match (target, op) {
            (Reg::HL, CbOp::Bit) => 3,
            (Reg::HL, _) => 4,
            _ => 2,
        };
        Self {
            op,
            target,
            bit,
            cycles,
        }
    }
}

lazy_static! {
    pub static ref CB_INSTRUCTIONS: [CbInstruction; 256] =
        std::array::from_fn(|opcode| CbInstruction::decode(opcode as u8));
}
