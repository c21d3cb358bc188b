//! Tokenizing MIPS operand lists.
//!
//! This module holds the tokens that characterize the operands of a MIPS instruction ([`Token`]).
//! Mnemonics, labels, comments, and directives are split off line-by-line
//! before tokenizing (see [`crate::parse`]), so only operand syntax is handled here.

use logos::{Lexer, Logos};

use crate::ast::{Immediate, Reg};

/// A unit of information in a MIPS operand list.
#[derive(Debug, Logos, PartialEq, Eq)]
#[logos(skip r"[ \t\r]+", error = LexErr)]
pub enum Token {
    // Note, these regexes span over tokens that are technically invalid
    // (e.g., 12abc matches for an immediate even though it shouldn't).
    // This is intended.
    // These regexes collect what would be considered one discernable unit
    // and validates it using the validator function.

    /// A numeric value (e.g., `9`, `-14`, `0x7F`)
    #[regex(r"-?[0-9][A-Za-z0-9_]*", lex_imm)]
    #[regex(r"-", lex_imm)]
    Imm(Immediate),

    /// A register (e.g., `$t0`, `$zero`, `$31`)
    #[regex(r"\$[A-Za-z0-9_]*", lex_reg)]
    Reg(Reg),

    /// An identifier, which here always refers to a label (e.g., `main`, `loop_end`).
    #[regex(r"[A-Za-z_][A-Za-z0-9_]*", |lx| lx.slice().to_string())]
    Ident(String),

    /// A comma, which delineate operands of an instruction
    #[token(",")]
    Comma,

    /// An opening parenthesis, which starts the base register of a memory operand
    #[token("(")]
    LParen,

    /// A closing parenthesis, which ends the base register of a memory operand
    #[token(")")]
    RParen,
}

/// Any errors raised in attempting to tokenize an input stream.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy, Default)]
pub enum LexErr {
    /// Numeric literal cannot fit within the range of a 32-bit integer
    DoesNotFitI32,
    /// Hex literal (starting with 0x) has invalid hex digits
    InvalidHex,
    /// Hex literal (starting with 0x) doesn't have digits after it.
    InvalidHexEmpty,
    /// Numeric literal could not be parsed as a decimal literal because it has invalid digits (i.e., not 0-9)
    InvalidNumeric,
    /// Numeric literal could not be parsed as a decimal literal because there are no digits in it (it's just -)
    InvalidDecEmpty,
    /// Token had the format $name, but name isn't a register.
    InvalidReg,
    /// A symbol was used which is not allowed in MIPS operands
    #[default]
    InvalidSymbol
}
impl std::fmt::Display for LexErr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LexErr::DoesNotFitI32   => f.write_str("numeric token does not fit 32-bit integer"),
            LexErr::InvalidHex      => f.write_str("invalid hex literal"),
            LexErr::InvalidHexEmpty => f.write_str("invalid hex literal"),
            LexErr::InvalidNumeric  => f.write_str("invalid decimal literal"),
            LexErr::InvalidDecEmpty => f.write_str("invalid decimal literal"),
            LexErr::InvalidReg      => f.write_str("invalid register"),
            LexErr::InvalidSymbol   => f.write_str("unrecognized symbol"),
        }
    }
}
impl std::error::Error for LexErr {}
impl crate::err::Error for LexErr {
    fn help(&self) -> Option<std::borrow::Cow<str>> {
        match self {
            LexErr::DoesNotFitI32   => Some(format!("the range for a 32-bit integer is [{}, {}]", i32::MIN, i32::MAX).into()),
            LexErr::InvalidHex      => Some("a hex literal starts with '0x' and consists of 0-9, A-F".into()),
            LexErr::InvalidHexEmpty => Some("there should be hex digits (0-9, A-F) here".into()),
            LexErr::InvalidNumeric  => Some("a decimal literal only consists of digits 0-9".into()),
            LexErr::InvalidDecEmpty => Some("there should be digits (0-9) here".into()),
            LexErr::InvalidReg      => Some("this must be a register name ($zero, $t0, $sp, ...) or number ($0-$31)".into()),
            LexErr::InvalidSymbol   => Some("this char does not occur in any token of a MIPS operand".into()),
        }
    }
}

fn lex_imm(lx: &Lexer<'_, Token>) -> Result<Immediate, LexErr> {
    lx.slice().parse::<Immediate>()
}
fn lex_reg(lx: &Lexer<'_, Token>) -> Result<Reg, LexErr> {
    lx.slice()[1..].parse::<Reg>()
}
