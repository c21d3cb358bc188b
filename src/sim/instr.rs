//! Instructions the simulator can execute.
//!
//! Each supported mnemonic has its own type (e.g., [`Add`], [`Sll`], [`Lw`]),
//! which is parsed from an operand list ([`ParseInstr`]) and executed on an
//! [`ExecutionContext`] ([`Instruction`]).
//!
//! Executing an instruction produces an [`UndoRecord`] holding what it overwrote.
//! The step controller keeps these records, and hands them back
//! to [`Instruction::undo`] to step backwards.
//!
//! All arithmetic is 32-bit two's complement and wraps on overflow.

use std::fmt;

use crate::ast::Reg;
use crate::parse::{Operands, ParseErr};

use super::context::ExecutionContext;

/// The state an instruction overwrote when it was executed.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum UndoRecord {
    /// Nothing was overwritten (e.g., the destination was `$zero`).
    Nothing,
    /// A register was overwritten.
    Reg {
        /// The register that was written.
        reg: Reg,
        /// Its value before the write.
        prev: i32
    },
    /// HI and LO were overwritten.
    HiLo {
        /// HI before the write.
        hi: i32,
        /// LO before the write.
        lo: i32
    },
    /// Consecutive bytes of memory were overwritten.
    Mem {
        /// The address of the first byte.
        addr: u32,
        /// For each byte, its value before the write (or `None` if it had never been written).
        prev: Box<[Option<u8>]>
    },
}

/// An instruction which can be executed and undone.
pub trait Instruction: fmt::Debug + fmt::Display + Send + Sync {
    /// The (lowercase) mnemonic of this instruction.
    fn mnemonic(&self) -> &'static str;

    /// Executes the instruction, returning the state it overwrote.
    ///
    /// This does not move the execution index. That is the step controller's job.
    fn execute(&self, ctx: &mut ExecutionContext) -> UndoRecord;

    /// Reverts the effects of [`Instruction::execute`].
    ///
    /// `record` must be the record produced by executing this instruction on this context.
    fn undo(&self, ctx: &mut ExecutionContext, record: UndoRecord) {
        ctx.restore(record);
    }
}

/// Instructions which can be created from an operand list.
pub trait ParseInstr: Sized {
    /// Parses the operand list, validating its shape and its immediate ranges.
    fn parse(ops: &Operands) -> Result<Self, ParseErr>;
}

const SIMM16: (i32, i32) = (i16::MIN as i32, i16::MAX as i32);
const UIMM16: (i32, i32) = (0, u16::MAX as i32);
const SHAMT:  (i32, i32) = (0, 31);

macro_rules! reg3_instrs {
    ($($(#[$m:meta])* $Name:ident($mn:literal) = |$a:ident, $b:ident| $e:expr;)*) => {$(
        $(#[$m])*
        ///
        /// Operands: `$rd, $rs, $rt`
        #[derive(Debug, PartialEq, Eq, Clone, Copy)]
        pub struct $Name {
            /// Destination register.
            pub rd: Reg,
            /// First source register.
            pub rs: Reg,
            /// Second source register.
            pub rt: Reg
        }
        impl ParseInstr for $Name {
            fn parse(ops: &Operands) -> Result<Self, ParseErr> {
                let [rd, rs, rt] = ops.regs()?;
                Ok(Self { rd, rs, rt })
            }
        }
        impl Instruction for $Name {
            fn mnemonic(&self) -> &'static str { $mn }
            fn execute(&self, ctx: &mut ExecutionContext) -> UndoRecord {
                let $a = ctx.read_reg(self.rs);
                let $b = ctx.read_reg(self.rt);
                ctx.write_reg(self.rd, $e)
            }
        }
        impl fmt::Display for $Name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{} {}, {}, {}", $mn, self.rd, self.rs, self.rt)
            }
        }
    )*};
}

macro_rules! shift_instrs {
    ($($(#[$m:meta])* $Name:ident($mn:literal) = |$v:ident, $s:ident| $e:expr;)*) => {$(
        $(#[$m])*
        ///
        /// Operands: `$rd, $rt, shamt` (shamt in `[0, 31]`)
        #[derive(Debug, PartialEq, Eq, Clone, Copy)]
        pub struct $Name {
            /// Destination register.
            pub rd: Reg,
            /// Register to shift.
            pub rt: Reg,
            /// Shift amount.
            pub shamt: u32
        }
        impl ParseInstr for $Name {
            fn parse(ops: &Operands) -> Result<Self, ParseErr> {
                ops.expect_len(3)?;
                let shamt = ops.imm(2)?.get_in(SHAMT.0, SHAMT.1)?;
                Ok(Self { rd: ops.reg(0)?, rt: ops.reg(1)?, shamt: shamt as u32 })
            }
        }
        impl Instruction for $Name {
            fn mnemonic(&self) -> &'static str { $mn }
            fn execute(&self, ctx: &mut ExecutionContext) -> UndoRecord {
                let $v = ctx.read_reg(self.rt);
                let $s = self.shamt;
                ctx.write_reg(self.rd, $e)
            }
        }
        impl fmt::Display for $Name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{} {}, {}, {}", $mn, self.rd, self.rt, self.shamt)
            }
        }
    )*};
}

macro_rules! shiftv_instrs {
    ($($(#[$m:meta])* $Name:ident($mn:literal) = |$v:ident, $s:ident| $e:expr;)*) => {$(
        $(#[$m])*
        ///
        /// Operands: `$rd, $rt, $rs` (shifts by the low 5 bits of `$rs`)
        #[derive(Debug, PartialEq, Eq, Clone, Copy)]
        pub struct $Name {
            /// Destination register.
            pub rd: Reg,
            /// Register to shift.
            pub rt: Reg,
            /// Register holding the shift amount.
            pub rs: Reg
        }
        impl ParseInstr for $Name {
            fn parse(ops: &Operands) -> Result<Self, ParseErr> {
                let [rd, rt, rs] = ops.regs()?;
                Ok(Self { rd, rt, rs })
            }
        }
        impl Instruction for $Name {
            fn mnemonic(&self) -> &'static str { $mn }
            fn execute(&self, ctx: &mut ExecutionContext) -> UndoRecord {
                let $v = ctx.read_reg(self.rt);
                let $s = (ctx.read_reg(self.rs) & 31) as u32;
                ctx.write_reg(self.rd, $e)
            }
        }
        impl fmt::Display for $Name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{} {}, {}, {}", $mn, self.rd, self.rt, self.rs)
            }
        }
    )*};
}

macro_rules! hilo_instrs {
    ($($(#[$m:meta])* $Name:ident($mn:literal) = |$a:ident, $b:ident| $e:expr;)*) => {$(
        $(#[$m])*
        ///
        /// Operands: `$rs, $rt`
        #[derive(Debug, PartialEq, Eq, Clone, Copy)]
        pub struct $Name {
            /// First source register.
            pub rs: Reg,
            /// Second source register.
            pub rt: Reg
        }
        impl ParseInstr for $Name {
            fn parse(ops: &Operands) -> Result<Self, ParseErr> {
                let [rs, rt] = ops.regs()?;
                Ok(Self { rs, rt })
            }
        }
        impl Instruction for $Name {
            fn mnemonic(&self) -> &'static str { $mn }
            fn execute(&self, ctx: &mut ExecutionContext) -> UndoRecord {
                let $a = ctx.read_reg(self.rs);
                let $b = ctx.read_reg(self.rt);
                let result: Option<(i32, i32)> = $e;
                match result {
                    Some((hi, lo)) => ctx.set_hi_lo(hi, lo),
                    None => UndoRecord::Nothing,
                }
            }
        }
        impl fmt::Display for $Name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{} {}, {}", $mn, self.rs, self.rt)
            }
        }
    )*};
}

macro_rules! imm_instrs {
    ($($(#[$m:meta])* $Name:ident($mn:literal, $range:expr) = |$a:ident, $i:ident| $e:expr;)*) => {$(
        $(#[$m])*
        ///
        /// Operands: `$rt, $rs, imm`
        #[derive(Debug, PartialEq, Eq, Clone, Copy)]
        pub struct $Name {
            /// Destination register.
            pub rt: Reg,
            /// Source register.
            pub rs: Reg,
            /// Immediate operand.
            pub imm: i32
        }
        impl ParseInstr for $Name {
            fn parse(ops: &Operands) -> Result<Self, ParseErr> {
                ops.expect_len(3)?;
                let (min, max) = $range;
                let imm = ops.imm(2)?.get_in(min, max)?;
                Ok(Self { rt: ops.reg(0)?, rs: ops.reg(1)?, imm })
            }
        }
        impl Instruction for $Name {
            fn mnemonic(&self) -> &'static str { $mn }
            fn execute(&self, ctx: &mut ExecutionContext) -> UndoRecord {
                let $a = ctx.read_reg(self.rs);
                let $i = self.imm;
                ctx.write_reg(self.rt, $e)
            }
        }
        impl fmt::Display for $Name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{} {}, {}, {}", $mn, self.rt, self.rs, self.imm)
            }
        }
    )*};
}

macro_rules! load_instrs {
    ($($(#[$m:meta])* $Name:ident($mn:literal) = |$ctx:ident, $addr:ident| $e:expr;)*) => {$(
        $(#[$m])*
        ///
        /// Operands: `$rt, offset($rs)`
        #[derive(Debug, PartialEq, Eq, Clone, Copy)]
        pub struct $Name {
            /// Destination register.
            pub rt: Reg,
            /// Offset from the base register.
            pub offset: i32,
            /// Base register.
            pub base: Reg
        }
        impl ParseInstr for $Name {
            fn parse(ops: &Operands) -> Result<Self, ParseErr> {
                parse_mem_operands(ops).map(|(rt, offset, base)| Self { rt, offset, base })
            }
        }
        impl Instruction for $Name {
            fn mnemonic(&self) -> &'static str { $mn }
            fn execute(&self, ctx: &mut ExecutionContext) -> UndoRecord {
                let $addr = effective_address(ctx, self.base, self.offset);
                let $ctx = &*ctx;
                let value: i32 = $e;
                ctx.write_reg(self.rt, value)
            }
        }
        impl fmt::Display for $Name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{} {}, {}({})", $mn, self.rt, self.offset, self.base)
            }
        }
    )*};
}

macro_rules! store_instrs {
    ($($(#[$m:meta])* $Name:ident($mn:literal) = |$ctx:ident, $addr:ident, $v:ident| $e:expr;)*) => {$(
        $(#[$m])*
        ///
        /// Operands: `$rt, offset($rs)`
        #[derive(Debug, PartialEq, Eq, Clone, Copy)]
        pub struct $Name {
            /// Register holding the value to store.
            pub rt: Reg,
            /// Offset from the base register.
            pub offset: i32,
            /// Base register.
            pub base: Reg
        }
        impl ParseInstr for $Name {
            fn parse(ops: &Operands) -> Result<Self, ParseErr> {
                parse_mem_operands(ops).map(|(rt, offset, base)| Self { rt, offset, base })
            }
        }
        impl Instruction for $Name {
            fn mnemonic(&self) -> &'static str { $mn }
            fn execute(&self, ctx: &mut ExecutionContext) -> UndoRecord {
                let $addr = effective_address(ctx, self.base, self.offset);
                let $v = ctx.read_reg(self.rt);
                let $ctx = ctx;
                $e
            }
        }
        impl fmt::Display for $Name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{} {}, {}({})", $mn, self.rt, self.offset, self.base)
            }
        }
    )*};
}

fn parse_mem_operands(ops: &Operands) -> Result<(Reg, i32, Reg), ParseErr> {
    ops.expect_len(2)?;
    let rt = ops.reg(0)?;
    let (offset, base) = ops.indexed(1)?;
    let offset = offset.get_in(SIMM16.0, SIMM16.1)?;
    Ok((rt, offset, base))
}
fn effective_address(ctx: &ExecutionContext, base: Reg, offset: i32) -> u32 {
    ctx.read_reg(base).wrapping_add(offset) as u32
}

reg3_instrs! {
    /// Adds two registers.
    Add("add") = |a, b| a.wrapping_add(b);
    /// Adds two registers (without an overflow trap, which is the same as `add` here).
    Addu("addu") = |a, b| a.wrapping_add(b);
    /// Subtracts two registers.
    Sub("sub") = |a, b| a.wrapping_sub(b);
    /// Subtracts two registers (without an overflow trap).
    Subu("subu") = |a, b| a.wrapping_sub(b);
    /// Bitwise AND of two registers.
    And("and") = |a, b| a & b;
    /// Bitwise OR of two registers.
    Or("or") = |a, b| a | b;
    /// Bitwise XOR of two registers.
    Xor("xor") = |a, b| a ^ b;
    /// Bitwise NOR of two registers.
    Nor("nor") = |a, b| !(a | b);
    /// Sets the destination to 1 if `$rs < $rt` (signed), 0 otherwise.
    Slt("slt") = |a, b| i32::from(a < b);
    /// Sets the destination to 1 if `$rs < $rt` (unsigned), 0 otherwise.
    Sltu("sltu") = |a, b| i32::from((a as u32) < (b as u32));
}

shift_instrs! {
    /// Shifts left logically by a constant.
    Sll("sll") = |v, s| ((v as u32) << s) as i32;
    /// Shifts right logically by a constant.
    Srl("srl") = |v, s| ((v as u32) >> s) as i32;
    /// Shifts right arithmetically by a constant.
    Sra("sra") = |v, s| v >> s;
}

shiftv_instrs! {
    /// Shifts left logically by a register.
    Sllv("sllv") = |v, s| ((v as u32) << s) as i32;
    /// Shifts right logically by a register.
    Srlv("srlv") = |v, s| ((v as u32) >> s) as i32;
    /// Shifts right arithmetically by a register.
    Srav("srav") = |v, s| v >> s;
}

hilo_instrs! {
    /// Signed 64-bit multiplication into HI:LO.
    Mult("mult") = |a, b| {
        let p = i64::from(a) * i64::from(b);
        Some(((p >> 32) as i32, p as i32))
    };
    /// Unsigned 64-bit multiplication into HI:LO.
    Multu("multu") = |a, b| {
        let p = u64::from(a as u32) * u64::from(b as u32);
        Some(((p >> 32) as i32, p as i32))
    };
    /// Signed division. LO gets the quotient and HI gets the remainder.
    ///
    /// Dividing by zero leaves HI and LO unchanged.
    Div("div") = |a, b| match b {
        0 => None,
        _ => Some((a.wrapping_rem(b), a.wrapping_div(b)))
    };
    /// Unsigned division. LO gets the quotient and HI gets the remainder.
    ///
    /// Dividing by zero leaves HI and LO unchanged.
    Divu("divu") = |a, b| {
        let (a, b) = (a as u32, b as u32);
        match b {
            0 => None,
            _ => Some(((a % b) as i32, (a / b) as i32))
        }
    };
}

imm_instrs! {
    /// Adds a sign-extended 16-bit immediate.
    Addi("addi", SIMM16) = |a, i| a.wrapping_add(i);
    /// Adds a sign-extended 16-bit immediate (without an overflow trap).
    Addiu("addiu", SIMM16) = |a, i| a.wrapping_add(i);
    /// Sets the destination to 1 if `$rs < imm` (signed).
    Slti("slti", SIMM16) = |a, i| i32::from(a < i);
    /// Sets the destination to 1 if `$rs < imm` (unsigned, after sign-extending the immediate).
    Sltiu("sltiu", SIMM16) = |a, i| i32::from((a as u32) < (i as u32));
    /// Bitwise AND with a zero-extended 16-bit immediate.
    Andi("andi", UIMM16) = |a, i| a & i;
    /// Bitwise OR with a zero-extended 16-bit immediate.
    Ori("ori", UIMM16) = |a, i| a | i;
    /// Bitwise XOR with a zero-extended 16-bit immediate.
    Xori("xori", UIMM16) = |a, i| a ^ i;
}

load_instrs! {
    /// Loads a sign-extended byte.
    Lb("lb") = |ctx, addr| i32::from(ctx.read_byte(addr) as i8);
    /// Loads a zero-extended byte.
    Lbu("lbu") = |ctx, addr| i32::from(ctx.read_byte(addr));
    /// Loads a sign-extended half-word.
    Lh("lh") = |ctx, addr| i32::from(ctx.read_half(addr) as i16);
    /// Loads a zero-extended half-word.
    Lhu("lhu") = |ctx, addr| i32::from(ctx.read_half(addr));
    /// Loads a word.
    Lw("lw") = |ctx, addr| ctx.read_word(addr) as i32;
}

store_instrs! {
    /// Stores the low byte of a register.
    Sb("sb") = |ctx, addr, v| {
        let prev = ctx.write_byte(addr, v as u8);
        UndoRecord::Mem { addr, prev: Box::new([prev]) }
    };
    /// Stores the low half-word of a register.
    Sh("sh") = |ctx, addr, v| ctx.write_half(addr, v as u16);
    /// Stores a register.
    Sw("sw") = |ctx, addr, v| ctx.write_word(addr, v as u32);
}

/// Loads a 16-bit immediate into the upper half of a register.
///
/// Operands: `$rt, imm` (imm in `[0, 65535]`)
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct Lui {
    /// Destination register.
    pub rt: Reg,
    /// Immediate operand.
    pub imm: i32
}
impl ParseInstr for Lui {
    fn parse(ops: &Operands) -> Result<Self, ParseErr> {
        ops.expect_len(2)?;
        let imm = ops.imm(1)?.get_in(UIMM16.0, UIMM16.1)?;
        Ok(Self { rt: ops.reg(0)?, imm })
    }
}
impl Instruction for Lui {
    fn mnemonic(&self) -> &'static str { "lui" }
    fn execute(&self, ctx: &mut ExecutionContext) -> UndoRecord {
        ctx.write_reg(self.rt, self.imm << 16)
    }
}
impl fmt::Display for Lui {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "lui {}, {}", self.rt, self.imm)
    }
}

/// Which of HI or LO a move instruction accesses.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum HiLo {
    /// The HI register.
    Hi,
    /// The LO register.
    Lo
}

/// Moves HI or LO into a register (`mfhi`, `mflo`).
///
/// Operands: `$rd`
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct MoveFrom {
    /// Which register to read.
    pub src: HiLo,
    /// Destination register.
    pub rd: Reg
}
impl MoveFrom {
    fn parse(src: HiLo, ops: &Operands) -> Result<Self, ParseErr> {
        let [rd] = ops.regs()?;
        Ok(Self { src, rd })
    }
}
impl Instruction for MoveFrom {
    fn mnemonic(&self) -> &'static str {
        match self.src {
            HiLo::Hi => "mfhi",
            HiLo::Lo => "mflo",
        }
    }
    fn execute(&self, ctx: &mut ExecutionContext) -> UndoRecord {
        let value = match self.src {
            HiLo::Hi => ctx.hi(),
            HiLo::Lo => ctx.lo(),
        };
        ctx.write_reg(self.rd, value)
    }
}
impl fmt::Display for MoveFrom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.mnemonic(), self.rd)
    }
}

/// Moves a register into HI or LO (`mthi`, `mtlo`).
///
/// Operands: `$rs`
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct MoveTo {
    /// Which register to write.
    pub dest: HiLo,
    /// Source register.
    pub rs: Reg
}
impl MoveTo {
    fn parse(dest: HiLo, ops: &Operands) -> Result<Self, ParseErr> {
        let [rs] = ops.regs()?;
        Ok(Self { dest, rs })
    }
}
impl Instruction for MoveTo {
    fn mnemonic(&self) -> &'static str {
        match self.dest {
            HiLo::Hi => "mthi",
            HiLo::Lo => "mtlo",
        }
    }
    fn execute(&self, ctx: &mut ExecutionContext) -> UndoRecord {
        let value = ctx.read_reg(self.rs);
        match self.dest {
            HiLo::Hi => ctx.set_hi_lo(value, ctx.lo()),
            HiLo::Lo => ctx.set_hi_lo(ctx.hi(), value),
        }
    }
}
impl fmt::Display for MoveTo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.mnemonic(), self.rs)
    }
}

/// Creates a move-from-HI instruction from its operands.
pub fn parse_mfhi(ops: &Operands) -> Result<Box<dyn Instruction>, ParseErr> {
    Ok(Box::new(MoveFrom::parse(HiLo::Hi, ops)?))
}
/// Creates a move-from-LO instruction from its operands.
pub fn parse_mflo(ops: &Operands) -> Result<Box<dyn Instruction>, ParseErr> {
    Ok(Box::new(MoveFrom::parse(HiLo::Lo, ops)?))
}
/// Creates a move-to-HI instruction from its operands.
pub fn parse_mthi(ops: &Operands) -> Result<Box<dyn Instruction>, ParseErr> {
    Ok(Box::new(MoveTo::parse(HiLo::Hi, ops)?))
}
/// Creates a move-to-LO instruction from its operands.
pub fn parse_mtlo(ops: &Operands) -> Result<Box<dyn Instruction>, ParseErr> {
    Ok(Box::new(MoveTo::parse(HiLo::Lo, ops)?))
}
/// Creates a boxed instruction of type `I` from its operands.
pub fn parse_boxed<I: ParseInstr + Instruction + 'static>(ops: &Operands) -> Result<Box<dyn Instruction>, ParseErr> {
    Ok(Box::new(I::parse(ops)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse<I: ParseInstr>(ops: &str) -> Result<I, ParseErr> {
        I::parse(&Operands::parse(ops)?)
    }
    fn ctx_with(regs: &[(Reg, i32)]) -> ExecutionContext {
        let mut ctx = ExecutionContext::default();
        for &(r, v) in regs {
            ctx.write_reg(r, v);
        }
        ctx
    }
    /// Executes, checks the result with `check`, undoes, and checks the context was restored.
    fn exec_undo(instr: &dyn Instruction, ctx: &mut ExecutionContext, check: impl FnOnce(&ExecutionContext)) {
        let before = ctx.clone();
        let record = instr.execute(ctx);
        check(ctx);
        instr.undo(ctx, record);
        assert_eq!(*ctx, before, "{instr} was not undone");
    }

    #[test]
    fn test_reg3() {
        let mut ctx = ctx_with(&[(Reg::T1, 7), (Reg::T2, -3)]);
        let cases: [(Box<dyn Instruction>, i32); 10] = [
            (Box::new(parse::<Add>("$t0, $t1, $t2").unwrap()), 4),
            (Box::new(parse::<Addu>("$t0, $t1, $t2").unwrap()), 4),
            (Box::new(parse::<Sub>("$t0, $t1, $t2").unwrap()), 10),
            (Box::new(parse::<Subu>("$t0, $t2, $t1").unwrap()), -10),
            (Box::new(parse::<And>("$t0, $t1, $t2").unwrap()), 7 & -3),
            (Box::new(parse::<Or>("$t0, $t1, $t2").unwrap()), 7 | -3),
            (Box::new(parse::<Xor>("$t0, $t1, $t2").unwrap()), 7 ^ -3),
            (Box::new(parse::<Nor>("$t0, $t1, $t2").unwrap()), !(7 | -3)),
            (Box::new(parse::<Slt>("$t0, $t2, $t1").unwrap()), 1),
            (Box::new(parse::<Sltu>("$t0, $t2, $t1").unwrap()), 0),
        ];

        for (instr, expected) in cases {
            exec_undo(&*instr, &mut ctx, |ctx| assert_eq!(ctx.read_reg(Reg::T0), expected, "{instr}"));
        }
    }

    #[test]
    fn test_wrapping() {
        let mut ctx = ctx_with(&[(Reg::T1, i32::MAX), (Reg::T2, 1)]);
        let add = parse::<Add>("$t0, $t1, $t2").unwrap();
        exec_undo(&add, &mut ctx, |ctx| assert_eq!(ctx.read_reg(Reg::T0), i32::MIN));
    }

    #[test]
    fn test_zero_dest() {
        let mut ctx = ctx_with(&[(Reg::T1, 1), (Reg::T2, 2)]);
        let add = parse::<Add>("$zero, $t1, $t2").unwrap();
        assert_eq!(add.execute(&mut ctx), UndoRecord::Nothing);
        assert_eq!(ctx.read_reg(Reg::Zero), 0);
    }

    #[test]
    fn test_shifts() {
        let mut ctx = ctx_with(&[(Reg::T1, -16), (Reg::T2, 34)]);
        exec_undo(&parse::<Sll>("$t0, $t1, 2").unwrap(), &mut ctx, |c| assert_eq!(c.read_reg(Reg::T0), -64));
        exec_undo(&parse::<Srl>("$t0, $t1, 28").unwrap(), &mut ctx, |c| assert_eq!(c.read_reg(Reg::T0), 0xF));
        exec_undo(&parse::<Sra>("$t0, $t1, 2").unwrap(), &mut ctx, |c| assert_eq!(c.read_reg(Reg::T0), -4));
        // $t2 & 31 == 2
        exec_undo(&parse::<Sllv>("$t0, $t1, $t2").unwrap(), &mut ctx, |c| assert_eq!(c.read_reg(Reg::T0), -64));
        exec_undo(&parse::<Srav>("$t0, $t1, $t2").unwrap(), &mut ctx, |c| assert_eq!(c.read_reg(Reg::T0), -4));
        exec_undo(&parse::<Srlv>("$t0, $t1, $t2").unwrap(), &mut ctx, |c| assert_eq!(c.read_reg(Reg::T0), 0x3FFF_FFFC));
    }

    #[test]
    fn test_shamt_range() {
        assert!(parse::<Sll>("$t0, $t1, 0").is_ok());
        assert!(parse::<Sll>("$t0, $t1, 31").is_ok());
        assert_eq!(parse::<Sll>("$t0, $t1, 32"), Err(ParseErr::ImmOutOfRange { value: 32, min: 0, max: 31 }));
        assert_eq!(parse::<Sll>("$t0, $t1, -1"), Err(ParseErr::ImmOutOfRange { value: -1, min: 0, max: 31 }));
        assert!(parse::<Sll>("$t0, $t1, $t2").is_err());
    }

    #[test]
    fn test_mult_div() {
        let mut ctx = ctx_with(&[(Reg::T1, -7), (Reg::T2, 2), (Reg::T3, 0)]);
        exec_undo(&parse::<Mult>("$t1, $t2").unwrap(), &mut ctx, |c| assert_eq!((c.hi(), c.lo()), (-1, -14)));
        exec_undo(&parse::<Multu>("$t1, $t2").unwrap(), &mut ctx, |c| assert_eq!((c.hi(), c.lo()), (1, -14)));
        exec_undo(&parse::<Div>("$t1, $t2").unwrap(), &mut ctx, |c| assert_eq!((c.hi(), c.lo()), (-1, -3)));
        exec_undo(&parse::<Divu>("$t2, $t2").unwrap(), &mut ctx, |c| assert_eq!((c.hi(), c.lo()), (0, 1)));

        ctx.set_hi_lo(5, 6);
        let div0 = parse::<Div>("$t1, $t3").unwrap();
        assert_eq!(div0.execute(&mut ctx), UndoRecord::Nothing);
        assert_eq!((ctx.hi(), ctx.lo()), (5, 6));
    }

    #[test]
    fn test_div_overflow() {
        let mut ctx = ctx_with(&[(Reg::T1, i32::MIN), (Reg::T2, -1)]);
        parse::<Div>("$t1, $t2").unwrap().execute(&mut ctx);
        assert_eq!((ctx.hi(), ctx.lo()), (0, i32::MIN));
    }

    #[test]
    fn test_move_hi_lo() {
        let mut ctx = ctx_with(&[(Reg::T1, 9)]);
        ctx.set_hi_lo(1, 2);
        exec_undo(&*parse_mfhi(&Operands::parse("$t0").unwrap()).unwrap(), &mut ctx, |c| assert_eq!(c.read_reg(Reg::T0), 1));
        exec_undo(&*parse_mflo(&Operands::parse("$t0").unwrap()).unwrap(), &mut ctx, |c| assert_eq!(c.read_reg(Reg::T0), 2));
        exec_undo(&*parse_mthi(&Operands::parse("$t1").unwrap()).unwrap(), &mut ctx, |c| assert_eq!((c.hi(), c.lo()), (9, 2)));
        exec_undo(&*parse_mtlo(&Operands::parse("$t1").unwrap()).unwrap(), &mut ctx, |c| assert_eq!((c.hi(), c.lo()), (1, 9)));
        assert!(parse_mfhi(&Operands::parse("$t0, $t1").unwrap()).is_err());
    }

    #[test]
    fn test_imm() {
        let mut ctx = ctx_with(&[(Reg::T1, -2)]);
        exec_undo(&parse::<Addi>("$t0, $t1, -32768").unwrap(), &mut ctx, |c| assert_eq!(c.read_reg(Reg::T0), -32770));
        exec_undo(&parse::<Slti>("$t0, $t1, -1").unwrap(), &mut ctx, |c| assert_eq!(c.read_reg(Reg::T0), 1));
        exec_undo(&parse::<Sltiu>("$t0, $t1, -1").unwrap(), &mut ctx, |c| assert_eq!(c.read_reg(Reg::T0), 1));
        exec_undo(&parse::<Andi>("$t0, $t1, 0xFFFF").unwrap(), &mut ctx, |c| assert_eq!(c.read_reg(Reg::T0), 0xFFFE));
        exec_undo(&parse::<Ori>("$t0, $zero, 0x8000").unwrap(), &mut ctx, |c| assert_eq!(c.read_reg(Reg::T0), 0x8000));
        exec_undo(&parse::<Xori>("$t0, $t1, 1").unwrap(), &mut ctx, |c| assert_eq!(c.read_reg(Reg::T0), -1));
        exec_undo(&parse::<Lui>("$t0, 0xFFFF").unwrap(), &mut ctx, |c| assert_eq!(c.read_reg(Reg::T0), -65536));

        assert!(parse::<Addi>("$t0, $t1, 32768").is_err());
        assert!(parse::<Ori>("$t0, $t1, -1").is_err());
        assert!(parse::<Lui>("$t0, 65536").is_err());
        assert!(parse::<Addi>("$t0, $t1").is_err());
    }

    #[test]
    fn test_load_store() {
        let mut ctx = ctx_with(&[(Reg::Sp, 0x7FFF_EFFC), (Reg::T1, -2)]);

        let sw = parse::<Sw>("$t1, -4($sp)").unwrap();
        let record = sw.execute(&mut ctx);
        assert_eq!(ctx.read_word(0x7FFF_EFF8), 0xFFFF_FFFE);

        exec_undo(&parse::<Lw>("$t0, -4($sp)").unwrap(), &mut ctx, |c| assert_eq!(c.read_reg(Reg::T0), -2));
        exec_undo(&parse::<Lb>("$t0, -1($sp)").unwrap(), &mut ctx, |c| assert_eq!(c.read_reg(Reg::T0), -2));
        exec_undo(&parse::<Lbu>("$t0, -1($sp)").unwrap(), &mut ctx, |c| assert_eq!(c.read_reg(Reg::T0), 0xFE));
        exec_undo(&parse::<Lh>("$t0, -2($sp)").unwrap(), &mut ctx, |c| assert_eq!(c.read_reg(Reg::T0), -2));
        exec_undo(&parse::<Lhu>("$t0, -2($sp)").unwrap(), &mut ctx, |c| assert_eq!(c.read_reg(Reg::T0), 0xFFFE));

        sw.undo(&mut ctx, record);
        assert_eq!(ctx.mem().written_len(), 0);
    }

    #[test]
    fn test_store_partial() {
        let mut ctx = ctx_with(&[(Reg::A0, 0x1000), (Reg::T1, 0x1234_5678)]);
        exec_undo(&parse::<Sb>("$t1, ($a0)").unwrap(), &mut ctx, |c| assert_eq!(c.read_word(0x1000), 0x7800_0000));
        exec_undo(&parse::<Sh>("$t1, 1($a0)").unwrap(), &mut ctx, |c| assert_eq!(c.read_word(0x1000), 0x0056_7800));
    }

    #[test]
    fn test_mem_operand_shape() {
        assert!(parse::<Lw>("$t0, $sp").is_err());
        assert!(parse::<Lw>("$t0, 4").is_err());
        assert!(parse::<Sw>("$t0, 32768($sp)").is_err());
        assert_eq!(parse::<Lw>("$t0, 4($sp)").unwrap().to_string(), "lw $t0, 4($sp)");
    }
}
