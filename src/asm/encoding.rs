//! Bit-level layout of MIPS machine words.
//!
//! This module holds:
//! - the opcode and function-code tables ([`Opcode`], [`Funct`], [`RegImm`]),
//! - the R/I/J-type packers ([`encode_r`], [`encode_i`], [`encode_j`]),
//! - [`Fields`], which splits a word back into its fields,
//! - [`to_be_bytes`], which serializes words for output.
//!
//! ```text
//! R-type: | opcode (6) | rs (5) | rt (5) | rd (5) | shamt (5) | funct (6) |
//! I-type: | opcode (6) | rs (5) | rt (5) |          immediate (16)        |
//! J-type: | opcode (6) |                  target (26)                      |
//! ```

use crate::ast::Reg;

/// The opcode shared by all R-type instructions (which are distinguished by their [`Funct`]).
pub const SPECIAL: u32 = 0b000000;
/// The opcode shared by `bltz` and `bgez` (which are distinguished by their [`RegImm`] code in the rt field).
pub const REGIMM: u32 = 0b000001;

macro_rules! code_table {
    ($(#[$m:meta])* $Name:ident { $($Var:ident = $code:literal => $mn:literal),+ $(,)? }) => {
        $(#[$m])*
        #[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
        pub enum $Name {
            $(
                #[allow(missing_docs)]
                $Var
            ),+
        }
        impl $Name {
            /// Every entry of the table.
            pub const ALL: &'static [$Name] = &[$($Name::$Var),+];

            /// The numeric code of this entry.
            pub fn code(self) -> u32 {
                match self {
                    $($Name::$Var => $code),+
                }
            }
            /// The (lowercase) mnemonic of this entry.
            pub fn mnemonic(self) -> &'static str {
                match self {
                    $($Name::$Var => $mn),+
                }
            }
            /// Finds the entry with the given (lowercase) mnemonic.
            pub fn from_mnemonic(mnemonic: &str) -> Option<Self> {
                match mnemonic {
                    $($mn => Some($Name::$Var),)+
                    _ => None
                }
            }
            /// Finds the entry with the given numeric code.
            pub fn from_code(code: u32) -> Option<Self> {
                Self::ALL.iter().copied().find(|e| e.code() == code)
            }
        }
    };
}

code_table! {
    /// The function codes of R-type instructions.
    Funct {
        Sll     = 0b000000 => "sll",
        Srl     = 0b000010 => "srl",
        Sra     = 0b000011 => "sra",
        Sllv    = 0b000100 => "sllv",
        Srlv    = 0b000110 => "srlv",
        Srav    = 0b000111 => "srav",
        Jr      = 0b001000 => "jr",
        Jalr    = 0b001001 => "jalr",
        Syscall = 0b001100 => "syscall",
        Break   = 0b001101 => "break",
        Mfhi    = 0b010000 => "mfhi",
        Mthi    = 0b010001 => "mthi",
        Mflo    = 0b010010 => "mflo",
        Mtlo    = 0b010011 => "mtlo",
        Mult    = 0b011000 => "mult",
        Multu   = 0b011001 => "multu",
        Div     = 0b011010 => "div",
        Divu    = 0b011011 => "divu",
        Add     = 0b100000 => "add",
        Addu    = 0b100001 => "addu",
        Sub     = 0b100010 => "sub",
        Subu    = 0b100011 => "subu",
        And     = 0b100100 => "and",
        Or      = 0b100101 => "or",
        Xor     = 0b100110 => "xor",
        Nor     = 0b100111 => "nor",
        Slt     = 0b101010 => "slt",
        Sltu    = 0b101011 => "sltu",
    }
}

code_table! {
    /// The opcodes of I-type and J-type instructions.
    Opcode {
        J     = 0b000010 => "j",
        Jal   = 0b000011 => "jal",
        Beq   = 0b000100 => "beq",
        Bne   = 0b000101 => "bne",
        Blez  = 0b000110 => "blez",
        Bgtz  = 0b000111 => "bgtz",
        Addi  = 0b001000 => "addi",
        Addiu = 0b001001 => "addiu",
        Slti  = 0b001010 => "slti",
        Sltiu = 0b001011 => "sltiu",
        Andi  = 0b001100 => "andi",
        Ori   = 0b001101 => "ori",
        Xori  = 0b001110 => "xori",
        Lui   = 0b001111 => "lui",
        Lb    = 0b100000 => "lb",
        Lh    = 0b100001 => "lh",
        Lw    = 0b100011 => "lw",
        Lbu   = 0b100100 => "lbu",
        Lhu   = 0b100101 => "lhu",
        Sb    = 0b101000 => "sb",
        Sh    = 0b101001 => "sh",
        Sw    = 0b101011 => "sw",
    }
}

code_table! {
    /// The rt codes of `REGIMM` branch instructions.
    RegImm {
        Bltz = 0b00000 => "bltz",
        Bgez = 0b00001 => "bgez",
    }
}

/// A mnemonic, classified by the table it belongs to.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum Mnemonic {
    /// An R-type instruction.
    R(Funct),
    /// An I-type or J-type instruction.
    Op(Opcode),
    /// A `REGIMM` branch.
    RegImm(RegImm),
}
impl Mnemonic {
    /// Classifies a mnemonic (case-insensitively).
    pub fn lookup(mnemonic: &str) -> Option<Self> {
        let lower = mnemonic.to_ascii_lowercase();
        Funct::from_mnemonic(&lower).map(Mnemonic::R)
            .or_else(|| Opcode::from_mnemonic(&lower).map(Mnemonic::Op))
            .or_else(|| RegImm::from_mnemonic(&lower).map(Mnemonic::RegImm))
    }

    /// The (lowercase) mnemonic.
    pub fn as_str(self) -> &'static str {
        match self {
            Mnemonic::R(f) => f.mnemonic(),
            Mnemonic::Op(o) => o.mnemonic(),
            Mnemonic::RegImm(r) => r.mnemonic(),
        }
    }
}
impl std::fmt::Display for Mnemonic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

fn reg_field(r: Reg) -> u32 {
    u32::from(r.reg_no())
}

/// Packs an R-type instruction.
///
/// Only the low 5 bits of `shamt` are used.
pub fn encode_r(funct: Funct, rs: Reg, rt: Reg, rd: Reg, shamt: u32) -> u32 {
    (SPECIAL << 26)
        | (reg_field(rs) << 21)
        | (reg_field(rt) << 16)
        | (reg_field(rd) << 11)
        | ((shamt & 0x1F) << 6)
        | funct.code()
}

/// Packs an I-type instruction.
///
/// The rt field is taken as a raw 5-bit value, since `REGIMM` instructions store a code there.
pub fn encode_i(opcode: u32, rs: Reg, rt: u32, imm: u16) -> u32 {
    ((opcode & 0x3F) << 26)
        | (reg_field(rs) << 21)
        | ((rt & 0x1F) << 16)
        | u32::from(imm)
}

/// Packs a J-type instruction, given the byte address of its target.
///
/// The target field holds the word address (`target >> 2`), truncated to 26 bits.
pub fn encode_j(opcode: Opcode, target: u32) -> u32 {
    (opcode.code() << 26) | ((target >> 2) & 0x03FF_FFFF)
}

/// The raw fields of a machine word.
///
/// Every field is extracted regardless of the word's layout,
/// so only the fields relevant to that layout are meaningful.
///
/// ```
/// use mips_stepper::asm::encoding::{Fields, Funct, Mnemonic};
///
/// let f = Fields::decode(0x012A4020); // add $t0, $t1, $t2
/// assert_eq!((f.opcode, f.rs, f.rt, f.rd, f.funct), (0, 9, 10, 8, 0x20));
/// assert_eq!(f.mnemonic(), Some(Mnemonic::R(Funct::Add)));
/// ```
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub struct Fields {
    /// Bits 31-26.
    pub opcode: u32,
    /// Bits 25-21.
    pub rs: u32,
    /// Bits 20-16.
    pub rt: u32,
    /// Bits 15-11.
    pub rd: u32,
    /// Bits 10-6.
    pub shamt: u32,
    /// Bits 5-0.
    pub funct: u32,
    /// Bits 15-0.
    pub imm: u16,
    /// Bits 25-0.
    pub target: u32,
}
impl Fields {
    /// Splits a word into its fields.
    pub fn decode(word: u32) -> Self {
        Self {
            opcode: word >> 26,
            rs: (word >> 21) & 0x1F,
            rt: (word >> 16) & 0x1F,
            rd: (word >> 11) & 0x1F,
            shamt: (word >> 6) & 0x1F,
            funct: word & 0x3F,
            imm: word as u16,
            target: word & 0x03FF_FFFF,
        }
    }

    /// Identifies the instruction these fields belong to, if it is in the tables.
    pub fn mnemonic(&self) -> Option<Mnemonic> {
        match self.opcode {
            SPECIAL => Funct::from_code(self.funct).map(Mnemonic::R),
            REGIMM  => RegImm::from_code(self.rt).map(Mnemonic::RegImm),
            op      => Opcode::from_code(op).map(Mnemonic::Op),
        }
    }

    /// The immediate, sign-extended.
    pub fn simm(&self) -> i32 {
        i32::from(self.imm as i16)
    }
}

/// Serializes words into bytes, each word big-endian, in order.
pub fn to_be_bytes(words: &[u32]) -> Vec<u8> {
    words.iter().flat_map(|w| w.to_be_bytes()).collect()
}
