//! The table of mnemonics the simulator understands.
//!
//! An [`InstrRegistry`] maps each (lowercase) mnemonic to a function
//! which creates an [`Instruction`] from an operand list.
//! [`InstrRegistry::new`] creates a registry holding every instruction in [`super::instr`],
//! and further mnemonics can be added with [`InstrRegistry::register`].
//!
//! ```
//! use mips_stepper::sim::registry::InstrRegistry;
//!
//! let registry = InstrRegistry::new();
//! let instr = registry.parse_line("ADD $t0, $t1, $t2").unwrap();
//! assert_eq!(instr.to_string(), "add $t0, $t1, $t2");
//!
//! assert!(registry.parse_line("frobnicate $t0").is_err());
//! ```
use std::collections::HashMap;

use crate::parse::{classify_line, Line, Operands, ParseErr};

use super::instr::{self, parse_boxed, Instruction};

/// A function which creates an instruction from its operands.
pub type InstrParser = fn(&Operands) -> Result<Box<dyn Instruction>, ParseErr>;

/// Mapping of mnemonics to their instruction parsers.
#[derive(Clone)]
pub struct InstrRegistry {
    parsers: HashMap<String, InstrParser>
}

impl InstrRegistry {
    /// Creates a registry with all of the built-in instructions.
    pub fn new() -> Self {
        let mut reg = Self::empty();

        reg.register("add",   parse_boxed::<instr::Add>);
        reg.register("addu",  parse_boxed::<instr::Addu>);
        reg.register("sub",   parse_boxed::<instr::Sub>);
        reg.register("subu",  parse_boxed::<instr::Subu>);
        reg.register("and",   parse_boxed::<instr::And>);
        reg.register("or",    parse_boxed::<instr::Or>);
        reg.register("xor",   parse_boxed::<instr::Xor>);
        reg.register("nor",   parse_boxed::<instr::Nor>);
        reg.register("slt",   parse_boxed::<instr::Slt>);
        reg.register("sltu",  parse_boxed::<instr::Sltu>);

        reg.register("sll",   parse_boxed::<instr::Sll>);
        reg.register("srl",   parse_boxed::<instr::Srl>);
        reg.register("sra",   parse_boxed::<instr::Sra>);
        reg.register("sllv",  parse_boxed::<instr::Sllv>);
        reg.register("srlv",  parse_boxed::<instr::Srlv>);
        reg.register("srav",  parse_boxed::<instr::Srav>);

        reg.register("mult",  parse_boxed::<instr::Mult>);
        reg.register("multu", parse_boxed::<instr::Multu>);
        reg.register("div",   parse_boxed::<instr::Div>);
        reg.register("divu",  parse_boxed::<instr::Divu>);
        reg.register("mfhi",  instr::parse_mfhi);
        reg.register("mflo",  instr::parse_mflo);
        reg.register("mthi",  instr::parse_mthi);
        reg.register("mtlo",  instr::parse_mtlo);

        reg.register("addi",  parse_boxed::<instr::Addi>);
        reg.register("addiu", parse_boxed::<instr::Addiu>);
        reg.register("slti",  parse_boxed::<instr::Slti>);
        reg.register("sltiu", parse_boxed::<instr::Sltiu>);
        reg.register("andi",  parse_boxed::<instr::Andi>);
        reg.register("ori",   parse_boxed::<instr::Ori>);
        reg.register("xori",  parse_boxed::<instr::Xori>);
        reg.register("lui",   parse_boxed::<instr::Lui>);

        reg.register("lb",    parse_boxed::<instr::Lb>);
        reg.register("lbu",   parse_boxed::<instr::Lbu>);
        reg.register("lh",    parse_boxed::<instr::Lh>);
        reg.register("lhu",   parse_boxed::<instr::Lhu>);
        reg.register("lw",    parse_boxed::<instr::Lw>);
        reg.register("sb",    parse_boxed::<instr::Sb>);
        reg.register("sh",    parse_boxed::<instr::Sh>);
        reg.register("sw",    parse_boxed::<instr::Sw>);

        reg
    }

    /// Creates a registry with no instructions.
    pub fn empty() -> Self {
        Self { parsers: HashMap::new() }
    }

    /// Registers a mnemonic, replacing any parser previously registered under the same mnemonic.
    ///
    /// Mnemonics are case-insensitive.
    pub fn register(&mut self, mnemonic: &str, parser: InstrParser) {
        self.parsers.insert(mnemonic.to_ascii_lowercase(), parser);
    }

    /// Checks whether the mnemonic is known (case-insensitively).
    pub fn contains(&self, mnemonic: &str) -> bool {
        self.parsers.contains_key(&mnemonic.to_ascii_lowercase())
    }

    /// The registered mnemonics (in no particular order).
    pub fn mnemonics(&self) -> impl Iterator<Item = &str> + '_ {
        self.parsers.keys().map(String::as_str)
    }

    /// Creates an instruction from a mnemonic and its operands.
    pub fn parse(&self, mnemonic: &str, operands: &str) -> Result<Box<dyn Instruction>, ParseErr> {
        let parser = self.parsers.get(&mnemonic.to_ascii_lowercase())
            .ok_or_else(|| ParseErr::UnknownMnemonic(mnemonic.to_string()))?;

        parser(&Operands::parse(operands)?)
    }

    /// Creates an instruction from a cleaned line of the form `<mnemonic> <operands>`.
    ///
    /// Lines without an instruction (empty lines and label lines) are malformed.
    pub fn parse_line(&self, line: &str) -> Result<Box<dyn Instruction>, ParseErr> {
        match classify_line(line) {
            Line::Instr { label: None, mnemonic, operands } => self.parse(mnemonic, operands),
            _ => Err(ParseErr::MalformedLine),
        }
    }
}
impl Default for InstrRegistry {
    fn default() -> Self {
        Self::new()
    }
}
impl std::fmt::Debug for InstrRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut mnemonics: Vec<_> = self.mnemonics().collect();
        mnemonics.sort_unstable();
        f.debug_struct("InstrRegistry")
            .field("mnemonics", &mnemonics)
            .finish()
    }
}
