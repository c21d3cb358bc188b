//! Utilities to debug simulation.
//!
//! The key type here is [`Breakpoint`], which can be appended to the [`Simulator`]'s
//! breakpoint field to cause the simulator's run loop to break.
//!
//! Breakpoints are only checked by [`Simulator::run_while`] (and adjacent),
//! after each instruction executes. Single steps ignore them.
use std::cmp::Ordering;
use std::fmt::Write;

use crate::ast::Reg;

use super::Simulator;

/// Common breakpoints.
#[derive(PartialEq, Eq, Hash)]
pub enum Breakpoint {
    /// Break when the PC is equal to the given value.
    PC(i32),

    /// Break when the next instruction comes from the given (1-based) source line.
    Line(usize),

    /// Break when the provided register is set to a given value.
    Reg {
        /// Register to check.
        reg: Reg,
        /// Predicate to break against.
        value: Comparator
    },
    /// Break when the word at the provided memory address has a given value.
    Mem {
        /// Address to check.
        addr: u32,
        /// Predicate to break against.
        value: Comparator
    },
}

impl Breakpoint {
    /// Checks if a break should occur.
    ///
    /// This never breaks if the simulator has no loaded program.
    pub fn check(&self, sim: &Simulator) -> bool {
        let Some(ctx) = sim.context() else { return false };
        match self {
            Breakpoint::PC(expected) => *expected == ctx.pc(),
            Breakpoint::Line(line) => sim.current_source_line() == Some(*line),
            Breakpoint::Reg { reg, value: cmp } => cmp.check(ctx.read_reg(*reg)),
            Breakpoint::Mem { addr, value: cmp } => cmp.check(ctx.read_word(*addr) as i32),
        }
    }

    fn fmt_bp(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::PC(expected) => {
                write!(f, "PC == 0x{expected:08X}")?;
            },
            Self::Line(line) => {
                write!(f, "line {line}")?;
            },
            Self::Reg { reg, value } => {
                write!(f, "{reg} ")?;
                value.fmt_cmp(f)?;
            },
            Self::Mem { addr, value } => {
                write!(f, "mem[0x{addr:08X}] ")?;
                value.fmt_cmp(f)?;
            },
        }
        Ok(())
    }
}
impl std::fmt::Debug for Breakpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Breakpoint(")?;
        self.fmt_bp(f)?;
        f.write_char(')')
    }
}
/// Predicate checking whether the current value is equal to the value.
///
/// Values are compared as signed 32-bit integers.
#[derive(PartialEq, Eq, Hash, Debug)]
pub enum Comparator {
    /// Never breaks.
    Never,
    /// Break if the desired value is less than the provided value.
    Lt(i32),
    /// Break if the desired value is equal to the provided value.
    Eq(i32),
    /// Break if the desired value is less than or equal to the provided value.
    Le(i32),
    /// Break if the desired value is greater than the provided value.
    Gt(i32),
    /// Break if the desired value is not equal to the provided value.
    Ne(i32),
    /// Break if the desired value is greater than or equal to the provided value.
    Ge(i32),
    /// Always breaks.
    Always
}
impl Comparator {
    /// The bound, the test applied to `operand.cmp(bound)`, and the operator symbol.
    ///
    /// `Never` and `Always` have no bound.
    fn bound(&self) -> Option<(i32, fn(Ordering) -> bool, &'static str)> {
        let bound: (i32, fn(Ordering) -> bool, &'static str) = match *self {
            Comparator::Lt(r) => (r, Ordering::is_lt, "<"),
            Comparator::Eq(r) => (r, Ordering::is_eq, "=="),
            Comparator::Le(r) => (r, Ordering::is_le, "<="),
            Comparator::Gt(r) => (r, Ordering::is_gt, ">"),
            Comparator::Ne(r) => (r, Ordering::is_ne, "!="),
            Comparator::Ge(r) => (r, Ordering::is_ge, ">="),
            Comparator::Never | Comparator::Always => return None,
        };
        Some(bound)
    }

    /// Checks if the operand passes the comparator.
    pub fn check(&self, operand: i32) -> bool {
        match self.bound() {
            Some((r, passes, _)) => passes(operand.cmp(&r)),
            None => *self == Comparator::Always,
        }
    }

    fn fmt_cmp(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.bound() {
            Some((r, _, op)) => write!(f, "{op} {r}"),
            None if *self == Comparator::Always => f.write_str("always"),
            None => f.write_str("never"),
        }
    }
}
