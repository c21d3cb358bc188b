//! Parsing MIPS assembly source lines.
//!
//! MIPS assembly is line-oriented, so parsing happens one line at a time:
//! 1. [`clean_line`] strips comments (`#`) and assembler directives (`.`) from a line.
//! 2. [`classify_line`] splits a cleaned line into its label and instruction parts ([`Line`]).
//! 3. [`Operands::parse`] tokenizes (see [`lex`]) and parses the operand list of an instruction.
//!
//! Both the simulator's program loader and the assembler go through these functions,
//! so both agree on what counts as a label and what counts as an instruction.
//!
//! ```
//! use mips_stepper::parse::{classify_line, clean_line, Line, Operand, Operands};
//! use mips_stepper::ast::{Immediate, Reg};
//!
//! let line = clean_line("loop: lw $t0, 4($sp)  # load it");
//! let Line::Instr { label, mnemonic, operands } = classify_line(line) else { unreachable!() };
//! assert_eq!(label, Some("loop"));
//! assert_eq!(mnemonic, "lw");
//!
//! let ops = Operands::parse(operands).unwrap();
//! assert_eq!(ops.as_slice(), &[
//!     Operand::Reg(Reg::T0),
//!     Operand::Indexed { offset: Immediate::new(4), base: Reg::Sp },
//! ]);
//! ```
pub mod lex;

use logos::Logos;

use crate::ast::{Immediate, Reg};
use self::lex::{LexErr, Token};

/// The character that begins a line comment.
pub const COMMENT_CHAR: char = '#';
/// The character that begins an assembler directive.
pub const DIRECTIVE_CHAR: char = '.';

/// Strips the comment and directive portions of a line, as well as surrounding whitespace.
///
/// Everything from the first `#` onward is a comment,
/// and everything from the first `.` onward is an (uninterpreted) assembler directive.
///
/// ```
/// # use mips_stepper::parse::clean_line;
/// assert_eq!(clean_line("  add $t0, $t1, $t2 # sum"), "add $t0, $t1, $t2");
/// assert_eq!(clean_line(".text"), "");
/// assert_eq!(clean_line("# only a comment"), "");
/// ```
pub fn clean_line(line: &str) -> &str {
    let line = line.split_once(COMMENT_CHAR).map_or(line, |(l, _)| l);
    let line = line.split_once(DIRECTIVE_CHAR).map_or(line, |(l, _)| l);
    line.trim()
}

/// The components of a cleaned assembly line.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Line<'s> {
    /// Nothing is left on this line.
    Empty,
    /// This line only declares a label (e.g., `main:`).
    Label(&'s str),
    /// This line holds an instruction, optionally preceded by a label.
    Instr {
        /// A label declared before the instruction (e.g., `loop: add ...`).
        label: Option<&'s str>,
        /// The mnemonic, as written.
        mnemonic: &'s str,
        /// The unparsed operand list (can be empty).
        operands: &'s str
    }
}

/// Checks whether the string is a valid label identifier (`[A-Za-z_][A-Za-z0-9_]*`).
pub fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Classifies a cleaned line (see [`clean_line`]).
///
/// - A line that ends in `:` and contains no space is a label line.
/// - A line starting with `identifier:` declares a label, followed by an instruction.
/// - Otherwise, the first whitespace-separated word is the mnemonic and the rest are the operands.
///
/// ```
/// # use mips_stepper::parse::{classify_line, Line};
/// assert_eq!(classify_line(""), Line::Empty);
/// assert_eq!(classify_line("main:"), Line::Label("main"));
/// assert_eq!(
///     classify_line("sll $t0, $t1, 2"),
///     Line::Instr { label: None, mnemonic: "sll", operands: "$t0, $t1, 2" }
/// );
/// ```
pub fn classify_line(line: &str) -> Line<'_> {
    if line.is_empty() {
        return Line::Empty;
    }
    if let Some(label) = line.strip_suffix(':') {
        if !line.contains(char::is_whitespace) {
            return Line::Label(label);
        }
    }

    let (label, rest) = match line.split_once(':') {
        Some((label, rest)) if is_identifier(label.trim()) => (Some(label.trim()), rest.trim()),
        _ => (None, line),
    };
    if rest.is_empty() {
        // `label :` with spacing
        return label.map_or(Line::Empty, Line::Label);
    }

    let (mnemonic, operands) = rest.split_once(char::is_whitespace)
        .map_or((rest, ""), |(m, o)| (m, o.trim()));

    Line::Instr { label, mnemonic, operands }
}

/// An operand of an instruction.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum Operand {
    /// A register (e.g., `$t0`).
    Reg(Reg),
    /// An immediate value (e.g., `4`, `0xFF`).
    Imm(Immediate),
    /// A label reference (e.g., `loop`).
    Label(String),
    /// A base register with an offset, as used by loads and stores (e.g., `-4($sp)`, `($a0)`).
    Indexed {
        /// The offset from the base register.
        offset: Immediate,
        /// The base register.
        base: Reg
    },
}
impl std::fmt::Display for Operand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Operand::Reg(r) => r.fmt(f),
            Operand::Imm(i) => i.fmt(f),
            Operand::Label(l) => f.write_str(l),
            Operand::Indexed { offset, base } => write!(f, "{offset}({base})"),
        }
    }
}

/// The destination of a branch or jump.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Target<'a> {
    /// A label, to be resolved to an address.
    Label(&'a str),
    /// A literal offset or address.
    Imm(Immediate),
}

/// The shape of an operand (used in error reporting).
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum OperandKind {
    /// A register (`$t0`).
    Reg,
    /// An immediate (`4`).
    Imm,
    /// A label (`loop`).
    Label,
    /// A memory operand (`4($sp)`).
    Indexed,
    /// A label or an immediate.
    Target,
}
impl std::fmt::Display for OperandKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OperandKind::Reg     => f.write_str("register"),
            OperandKind::Imm     => f.write_str("immediate"),
            OperandKind::Label   => f.write_str("label"),
            OperandKind::Indexed => f.write_str("memory operand"),
            OperandKind::Target  => f.write_str("label or immediate"),
        }
    }
}

/// Errors that can occur while parsing an instruction line.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum ParseErr {
    /// The operand list could not be tokenized.
    Lex(LexErr),
    /// The mnemonic is not known.
    UnknownMnemonic(String),
    /// The line does not have the shape `<mnemonic> <operands>`.
    MalformedLine,
    /// A token appeared where it is not allowed.
    UnexpectedToken,
    /// An operand was missing (e.g., a trailing comma).
    MissingOperand,
    /// The instruction received the wrong number of operands.
    WrongOperandCount {
        /// Number of operands the instruction takes.
        expected: usize,
        /// Number of operands which were provided.
        found: usize
    },
    /// An operand of the wrong shape was provided.
    WrongOperand {
        /// The index of the operand (0-based).
        index: usize,
        /// The expected shape.
        expected: OperandKind
    },
    /// An immediate does not fit the instruction's field.
    ImmOutOfRange {
        /// The provided value.
        value: i32,
        /// The minimum allowed value.
        min: i32,
        /// The maximum allowed value.
        max: i32
    },
}
impl std::fmt::Display for ParseErr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseErr::Lex(e) => e.fmt(f),
            ParseErr::UnknownMnemonic(m) => write!(f, "unknown instruction {m}"),
            ParseErr::MalformedLine => f.write_str("malformed instruction"),
            ParseErr::UnexpectedToken => f.write_str("unexpected token"),
            ParseErr::MissingOperand => f.write_str("missing operand"),
            ParseErr::WrongOperandCount { expected, found } => write!(f, "expected {expected} operands, found {found}"),
            ParseErr::WrongOperand { index, expected } => write!(f, "expected operand {} to be a {expected}", index + 1),
            ParseErr::ImmOutOfRange { value, .. } => write!(f, "immediate {value} is out of range"),
        }
    }
}
impl std::error::Error for ParseErr {}
impl crate::err::Error for ParseErr {
    fn help(&self) -> Option<std::borrow::Cow<str>> {
        match self {
            ParseErr::Lex(e) => crate::err::Error::help(e),
            ParseErr::ImmOutOfRange { min, max, .. } => Some(format!("this field must be in [{min}, {max}]").into()),
            ParseErr::MissingOperand => Some("remove the trailing comma or add an operand".into()),
            _ => None
        }
    }
}
impl From<LexErr> for ParseErr {
    fn from(value: LexErr) -> Self {
        ParseErr::Lex(value)
    }
}

/// A parsed, comma-separated list of operands.
#[derive(Debug, PartialEq, Eq, Clone, Default)]
pub struct Operands(Vec<Operand>);

impl Operands {
    /// Parses an operand list (e.g., `$t0, -4($sp)`).
    ///
    /// An empty string is an empty operand list.
    pub fn parse(src: &str) -> Result<Self, ParseErr> {
        let tokens = Token::lexer(src).collect::<Result<Vec<_>, _>>()?;
        let mut stream = tokens.into_iter().peekable();
        let mut ops = vec![];

        if stream.peek().is_none() {
            return Ok(Operands(ops));
        }

        loop {
            let op = match stream.next() {
                Some(Token::Reg(r)) => Operand::Reg(r),
                Some(Token::Ident(l)) => Operand::Label(l),
                Some(Token::Imm(offset)) if stream.peek() == Some(&Token::LParen) => {
                    stream.next();
                    Operand::Indexed { offset, base: parse_base(&mut stream)? }
                },
                Some(Token::Imm(i)) => Operand::Imm(i),
                Some(Token::LParen) => Operand::Indexed { offset: Immediate::new(0), base: parse_base(&mut stream)? },
                Some(Token::Comma) | None => return Err(ParseErr::MissingOperand),
                Some(Token::RParen) => return Err(ParseErr::UnexpectedToken),
            };
            ops.push(op);

            match stream.next() {
                Some(Token::Comma) => continue,
                None => break,
                Some(_) => return Err(ParseErr::UnexpectedToken),
            }
        }

        Ok(Operands(ops))
    }

    /// The operands as a slice.
    pub fn as_slice(&self) -> &[Operand] {
        &self.0
    }
    /// The number of operands.
    pub fn len(&self) -> usize {
        self.0.len()
    }
    /// Whether there are no operands.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Errors if there are not exactly `n` operands.
    pub fn expect_len(&self, n: usize) -> Result<(), ParseErr> {
        match self.0.len() == n {
            true  => Ok(()),
            false => Err(ParseErr::WrongOperandCount { expected: n, found: self.0.len() }),
        }
    }

    fn get(&self, index: usize, expected: OperandKind) -> Result<&Operand, ParseErr> {
        self.0.get(index).ok_or(ParseErr::WrongOperand { index, expected })
    }

    /// Gets the register at the given operand index.
    pub fn reg(&self, index: usize) -> Result<Reg, ParseErr> {
        match self.get(index, OperandKind::Reg)? {
            &Operand::Reg(r) => Ok(r),
            _ => Err(ParseErr::WrongOperand { index, expected: OperandKind::Reg })
        }
    }
    /// Gets the immediate at the given operand index.
    pub fn imm(&self, index: usize) -> Result<Immediate, ParseErr> {
        match self.get(index, OperandKind::Imm)? {
            &Operand::Imm(i) => Ok(i),
            _ => Err(ParseErr::WrongOperand { index, expected: OperandKind::Imm })
        }
    }
    /// Gets the memory operand (offset and base register) at the given operand index.
    pub fn indexed(&self, index: usize) -> Result<(Immediate, Reg), ParseErr> {
        match self.get(index, OperandKind::Indexed)? {
            &Operand::Indexed { offset, base } => Ok((offset, base)),
            _ => Err(ParseErr::WrongOperand { index, expected: OperandKind::Indexed })
        }
    }
    /// Gets the label or immediate at the given operand index (used for branch and jump targets).
    pub fn target(&self, index: usize) -> Result<Target<'_>, ParseErr> {
        match self.get(index, OperandKind::Target)? {
            Operand::Label(l) => Ok(Target::Label(l)),
            &Operand::Imm(i) => Ok(Target::Imm(i)),
            _ => Err(ParseErr::WrongOperand { index, expected: OperandKind::Target })
        }
    }

    /// Parses exactly `N` register operands.
    pub fn regs<const N: usize>(&self) -> Result<[Reg; N], ParseErr> {
        self.expect_len(N)?;
        let mut regs = [Reg::Zero; N];
        for (i, r) in regs.iter_mut().enumerate() {
            *r = self.reg(i)?;
        }
        Ok(regs)
    }
}

fn parse_base(stream: &mut std::iter::Peekable<std::vec::IntoIter<Token>>) -> Result<Reg, ParseErr> {
    let Some(Token::Reg(base)) = stream.next() else {
        return Err(ParseErr::WrongOperand { index: 0, expected: OperandKind::Indexed });
    };
    match stream.next() {
        Some(Token::RParen) => Ok(base),
        _ => Err(ParseErr::UnexpectedToken),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ops(src: &str) -> Vec<Operand> {
        Operands::parse(src).unwrap().0
    }

    #[test]
    fn test_clean_line() {
        assert_eq!(clean_line("add $t0, $t1, $t2"), "add $t0, $t1, $t2");
        assert_eq!(clean_line("\tadd $t0, $t1, $t2   # sum # again"), "add $t0, $t1, $t2");
        assert_eq!(clean_line("   "), "");
        assert_eq!(clean_line("#"), "");
        assert_eq!(clean_line(".data"), "");
        assert_eq!(clean_line("main: .globl main"), "main:");
        // comment stripping happens first
        assert_eq!(clean_line("sub $t0, $t1, $t2 # v1.0"), "sub $t0, $t1, $t2");
    }

    #[test]
    fn test_classify_labels() {
        assert_eq!(classify_line("main:"), Line::Label("main"));
        assert_eq!(classify_line("loop_2:"), Line::Label("loop_2"));
        assert_eq!(classify_line("main :"), Line::Label("main"));
        assert_eq!(
            classify_line("main: add $t0, $t1, $t2"),
            Line::Instr { label: Some("main"), mnemonic: "add", operands: "$t0, $t1, $t2" }
        );
        assert_eq!(
            classify_line("main:add $t0, $t1, $t2"),
            Line::Instr { label: Some("main"), mnemonic: "add", operands: "$t0, $t1, $t2" }
        );
    }

    #[test]
    fn test_classify_instrs() {
        assert_eq!(
            classify_line("ADD   $t0,$t1,$t2"),
            Line::Instr { label: None, mnemonic: "ADD", operands: "$t0,$t1,$t2" }
        );
        assert_eq!(
            classify_line("syscall"),
            Line::Instr { label: None, mnemonic: "syscall", operands: "" }
        );
        // not an identifier, so not an inline label
        assert_eq!(
            classify_line("1x: add $t0, $t1, $t2"),
            Line::Instr { label: None, mnemonic: "1x:", operands: "add $t0, $t1, $t2" }
        );
    }

    #[test]
    fn test_operands_basic() {
        assert_eq!(ops(""), vec![]);
        assert_eq!(ops("$t0, $t1, $t2"), vec![Operand::Reg(Reg::T0), Operand::Reg(Reg::T1), Operand::Reg(Reg::T2)]);
        assert_eq!(ops("$t0,$t1 , 31"), vec![Operand::Reg(Reg::T0), Operand::Reg(Reg::T1), Operand::Imm(Immediate::new(31))]);
        assert_eq!(ops("$t0, $t1, loop"), vec![Operand::Reg(Reg::T0), Operand::Reg(Reg::T1), Operand::Label("loop".into())]);
    }

    #[test]
    fn test_operands_indexed() {
        assert_eq!(ops("$t0, -8($sp)"), vec![
            Operand::Reg(Reg::T0),
            Operand::Indexed { offset: Immediate::new(-8), base: Reg::Sp }
        ]);
        assert_eq!(ops("$t0, ($a0)"), vec![
            Operand::Reg(Reg::T0),
            Operand::Indexed { offset: Immediate::new(0), base: Reg::A0 }
        ]);
        assert_eq!(ops("$t0, 0x10 ( $gp )"), vec![
            Operand::Reg(Reg::T0),
            Operand::Indexed { offset: Immediate::new(16), base: Reg::Gp }
        ]);
    }

    #[test]
    fn test_operands_malformed() {
        assert_eq!(Operands::parse("$t0,"), Err(ParseErr::MissingOperand));
        assert_eq!(Operands::parse(", $t0"), Err(ParseErr::MissingOperand));
        assert_eq!(Operands::parse("$t0 $t1"), Err(ParseErr::UnexpectedToken));
        assert_eq!(Operands::parse("$t0, 4($sp"), Err(ParseErr::UnexpectedToken));
        assert_eq!(Operands::parse("$t0, )"), Err(ParseErr::UnexpectedToken));
        assert_eq!(Operands::parse("$t0, $t9x"), Err(ParseErr::Lex(LexErr::InvalidReg)));
        assert_eq!(Operands::parse("$t0 + 1"), Err(ParseErr::Lex(LexErr::InvalidSymbol)));
    }

    #[test]
    fn test_operand_shapes() {
        let o = Operands::parse("$t0, $t1, 5").unwrap();
        assert_eq!(o.regs::<2>(), Err(ParseErr::WrongOperandCount { expected: 2, found: 3 }));
        assert_eq!(o.regs::<3>(), Err(ParseErr::WrongOperand { index: 2, expected: OperandKind::Reg }));
        assert_eq!(o.reg(1), Ok(Reg::T1));
        assert_eq!(o.imm(2), Ok(Immediate::new(5)));
        assert_eq!(o.imm(0), Err(ParseErr::WrongOperand { index: 0, expected: OperandKind::Imm }));
        assert_eq!(o.imm(3), Err(ParseErr::WrongOperand { index: 3, expected: OperandKind::Imm }));
        assert_eq!(o.target(2), Ok(Target::Imm(Immediate::new(5))));
        assert_eq!(o.target(0), Err(ParseErr::WrongOperand { index: 0, expected: OperandKind::Target }));
        let o = Operands::parse("loop").unwrap();
        assert_eq!(o.target(0), Ok(Target::Label("loop")));
    }
}
