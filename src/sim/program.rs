//! Loading assembly source into an executable program.
//!
//! A [`ParsedProgram`] holds the instructions of a source file in order,
//! the source line each instruction came from,
//! and the labels declared in the file (which map to instruction indices).
//!
//! Loading is lenient. A line that fails to parse is skipped
//! (and reported to the logger) rather than failing the whole load.
//!
//! ```
//! use mips_stepper::sim::program::ParsedProgram;
//! use mips_stepper::sim::registry::InstrRegistry;
//! use mips_stepper::sim::log::Logger;
//!
//! let src = "
//! .text
//! main:
//!     add $t0, $t1, $t2   # first
//! end:
//! ";
//! let prog = ParsedProgram::parse(src, &InstrRegistry::new(), &Logger::new());
//! assert_eq!(prog.len(), 1);
//! assert_eq!(prog.line_of(0), Some(4));
//! assert_eq!(prog.label_index("main"), Some(0));
//! assert_eq!(prog.label_index("end"), Some(1));
//! ```
use std::collections::HashMap;
use std::path::Path;

use crate::parse::{classify_line, clean_line, Line};

use super::instr::Instruction;
use super::log::Logger;
use super::registry::InstrRegistry;

/// A program loaded from assembly source.
///
/// This is immutable once created.
#[derive(Debug, Default)]
pub struct ParsedProgram {
    instrs: Vec<Box<dyn Instruction>>,
    /// 1-based source line of each instruction.
    lines: Vec<usize>,
    labels: HashMap<String, usize>,
}

impl ParsedProgram {
    /// Parses assembly source.
    ///
    /// Lines are processed as follows:
    /// 1. Everything from the first `#` and then everything from the first `.` is removed.
    /// 2. Empty lines are skipped.
    /// 3. A label line (`label:`) maps the label to the index of the next instruction.
    ///    If the label was already declared, the new declaration wins.
    /// 4. Any other line is parsed as an instruction (optionally preceded by `label:`).
    ///    If it fails to parse, it is skipped and the failure is logged.
    pub fn parse(src: &str, registry: &InstrRegistry, logger: &Logger) -> Self {
        let mut prog = Self::default();

        for (i, raw) in src.lines().enumerate() {
            let lno = i + 1;
            let line = clean_line(raw);

            match classify_line(line) {
                Line::Empty => {},
                Line::Label(label) => prog.add_label(label),
                Line::Instr { label, mnemonic, operands } => {
                    if let Some(label) = label {
                        prog.add_label(label);
                    }
                    match registry.parse(mnemonic, operands) {
                        Ok(instr) => {
                            prog.instrs.push(instr);
                            prog.lines.push(lno);
                        },
                        Err(e) => logger.log(format_args!("line {lno}: skipping `{line}`: {e}")),
                    }
                }
            }
        }

        prog
    }

    /// Reads and parses an assembly file.
    pub fn read(path: &Path, registry: &InstrRegistry, logger: &Logger) -> std::io::Result<Self> {
        let src = std::fs::read_to_string(path)?;
        Ok(Self::parse(&src, registry, logger))
    }

    fn add_label(&mut self, label: &str) {
        self.labels.insert(label.to_string(), self.instrs.len());
    }

    /// The number of instructions in the program.
    pub fn len(&self) -> usize {
        self.instrs.len()
    }
    /// Whether the program has no instructions.
    pub fn is_empty(&self) -> bool {
        self.instrs.is_empty()
    }
    /// Gets the instruction at the given index.
    pub fn instr(&self, index: usize) -> Option<&dyn Instruction> {
        self.instrs.get(index).map(|b| &**b)
    }
    /// Gets the (1-based) source line of the instruction at the given index.
    pub fn line_of(&self, index: usize) -> Option<usize> {
        self.lines.get(index).copied()
    }
    /// Gets the index of the instruction at the given (1-based) source line.
    pub fn index_of_line(&self, line: usize) -> Option<usize> {
        self.lines.binary_search(&line).ok()
    }
    /// Gets the instruction index a label points to.
    pub fn label_index(&self, label: &str) -> Option<usize> {
        self.labels.get(label).copied()
    }
    /// All labels and their instruction indices.
    pub fn labels(&self) -> impl Iterator<Item = (&str, usize)> + '_ {
        self.labels.iter().map(|(k, &v)| (k.as_str(), v))
    }
}
