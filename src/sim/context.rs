//! The machine state instructions operate on.
//!
//! An [`ExecutionContext`] holds the register file, the HI and LO registers,
//! the execution index (which instruction is next), and memory.
//!
//! Every mutating accessor reports what it overwrote,
//! so instructions can hand an [`UndoRecord`] back to the step controller.

use crate::ast::{Reg, TEXT_BASE};

use super::instr::UndoRecord;
use super::log::Logger;
use super::mem::{Memory, RegFile};

/// The state of a simulated MIPS machine.
///
/// ```
/// use mips_stepper::sim::context::ExecutionContext;
/// use mips_stepper::ast::Reg;
///
/// let mut ctx = ExecutionContext::default();
/// ctx.write_reg(Reg::T0, 12);
/// assert_eq!(ctx.read_reg(Reg::T0), 12);
/// assert_eq!(ctx.pc(), 0x0040_0000);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ExecutionContext {
    regs: RegFile,
    hi: i32,
    lo: i32,
    exec_index: usize,
    mem: Memory,
    logger: Logger,
}

impl ExecutionContext {
    /// Creates a new context with the given register file and log sink.
    pub fn new(regs: RegFile, logger: Logger) -> Self {
        Self { regs, logger, ..Default::default() }
    }

    /// Reads a register.
    pub fn read_reg(&self, reg: Reg) -> i32 {
        self.regs[reg]
    }
    /// Writes a register.
    ///
    /// Writes to `$zero` are discarded (and produce [`UndoRecord::Nothing`]).
    pub fn write_reg(&mut self, reg: Reg, value: i32) -> UndoRecord {
        match self.regs.set(reg, value) {
            Some(prev) => UndoRecord::Reg { reg, prev },
            None => UndoRecord::Nothing,
        }
    }
    /// The register file, in register number order.
    pub fn registers(&self) -> &[i32] {
        self.regs.as_slice()
    }

    /// The HI register.
    pub fn hi(&self) -> i32 {
        self.hi
    }
    /// The LO register.
    pub fn lo(&self) -> i32 {
        self.lo
    }
    /// Writes both HI and LO.
    pub fn set_hi_lo(&mut self, hi: i32, lo: i32) -> UndoRecord {
        let record = UndoRecord::HiLo { hi: self.hi, lo: self.lo };
        self.hi = hi;
        self.lo = lo;
        record
    }

    /// The index of the next instruction to execute.
    pub fn exec_index(&self) -> usize {
        self.exec_index
    }
    pub(crate) fn set_exec_index(&mut self, index: usize) {
        self.exec_index = index;
    }
    /// The program counter, computed as `TEXT_BASE + exec_index`.
    pub fn pc(&self) -> i32 {
        TEXT_BASE.wrapping_add(self.exec_index as u32) as i32
    }
    /// The byte address of the next instruction in the text segment (`TEXT_BASE + 4 * exec_index`).
    ///
    /// This is the address an assembled program would have for this instruction.
    pub fn text_address(&self) -> u32 {
        TEXT_BASE.wrapping_add((self.exec_index as u32).wrapping_mul(4))
    }

    /// The memory.
    pub fn mem(&self) -> &Memory {
        &self.mem
    }
    /// Reads a byte.
    pub fn read_byte(&self, addr: u32) -> u8 {
        self.mem.read_byte(addr)
    }
    /// Writes a byte, returning the previous byte (if it had been written).
    pub fn write_byte(&mut self, addr: u32, value: u8) -> Option<u8> {
        self.mem.write_byte(addr, value)
    }
    /// Reads a big-endian half-word.
    pub fn read_half(&self, addr: u32) -> u16 {
        self.mem.read_half(addr)
    }
    /// Writes a big-endian half-word.
    pub fn write_half(&mut self, addr: u32, value: u16) -> UndoRecord {
        let prev = self.mem.write_half(addr, value);
        UndoRecord::Mem { addr, prev: prev.into() }
    }
    /// Reads a big-endian word.
    pub fn read_word(&self, addr: u32) -> u32 {
        self.mem.read_word(addr)
    }
    /// Writes a big-endian word.
    pub fn write_word(&mut self, addr: u32, value: u32) -> UndoRecord {
        let prev = self.mem.write_word(addr, value);
        UndoRecord::Mem { addr, prev: prev.into() }
    }

    /// Reverts a change to this context.
    pub fn restore(&mut self, record: UndoRecord) {
        match record {
            UndoRecord::Nothing => {},
            UndoRecord::Reg { reg, prev } => { self.regs.set(reg, prev); },
            UndoRecord::HiLo { hi, lo } => {
                self.hi = hi;
                self.lo = lo;
            },
            UndoRecord::Mem { addr, prev } => {
                for (i, p) in prev.iter().enumerate() {
                    self.mem.restore_byte(addr.wrapping_add(i as u32), *p);
                }
            },
        }
    }

    /// Sends a message to the log sink. This does not affect the machine's state.
    pub fn log(&self, args: std::fmt::Arguments<'_>) {
        self.logger.log(args);
    }
    pub(crate) fn set_logger(&mut self, logger: Logger) {
        self.logger = logger;
    }
}

impl PartialEq for ExecutionContext {
    // The log sink is not machine state.
    fn eq(&self, other: &Self) -> bool {
        self.regs == other.regs
            && self.hi == other.hi
            && self.lo == other.lo
            && self.exec_index == other.exec_index
            && self.mem == other.mem
    }
}
impl Eq for ExecutionContext {}
