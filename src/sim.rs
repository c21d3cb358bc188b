//! Simulating and stepping MIPS assembly.
//!
//! This module is focused on executing MIPS source directly
//! (instructions are interpreted from their mnemonics, not decoded from machine words).
//!
//! This module consists of:
//! - [`Simulator`]: The step controller, which runs a loaded program forwards and backwards.
//! - [`Debugger`]: The interface a debug-protocol front end drives the simulator through.
//! - [`mem`]: The module handling the register file and memory.
//! - [`context`]: The module holding the machine state instructions operate on.
//! - [`instr`]: The module holding the supported instructions.
//! - [`registry`]: The module mapping mnemonics to instructions.
//! - [`program`]: The module loading source into a program.
//! - [`debug`]: The module handling types of breakpoints for the simulator.
//! - [`log`]: The module handling the simulator's diagnostic messages.
//!
//! # Usage
//!
//! To simulate some code, you need to instantiate a Simulator and load a program into it:
//!
//! ```no_run
//! use std::path::Path;
//! use mips_stepper::sim::Simulator;
//!
//! let mut simulator = Simulator::new(Default::default());
//! assert!(simulator.load(Path::new("program.s")));
//! simulator.run();
//! ```
//!
//! ## Flags
//!
//! Here, we define `simulator` to have the default flags.
//! We could also configure the simulator by editing the flags. For example,
//! if we wish to preset some registers when a program is loaded, we can edit the flags like so:
//!
//! ```
//! # use mips_stepper::sim::{Simulator, SimFlags};
//! use mips_stepper::ast::Reg;
//!
//! let mut simulator = Simulator::new(SimFlags { preset_regs: vec![(Reg::T1, 0xcafe)], ..Default::default() });
//! ```
//!
//! All of the available flags can be found in [`SimFlags`].
//!
//! ## Execution
//!
//! A program is executed one instruction at a time with [`Simulator::step`],
//! and each step can be undone with [`Simulator::step_back`].
//! Beyond that, there are also:
//! - [`Simulator::run`]: runs until the program ends
//! - [`Simulator::run_while`], [`Simulator::run_with_limit`]: more advanced programmatic execution
//!
//! ```
//! use mips_stepper::sim::Simulator;
//! use mips_stepper::ast::Reg;
//!
//! let src = "
//!     addi $t0, $zero, 1
//!     add  $t0, $t0, $t0
//!     add  $t0, $t0, $t0
//! ";
//! let mut sim = Simulator::new(Default::default());
//! sim.load_src(src, "double.s");
//!
//! let reg = |sim: &Simulator| sim.context().unwrap().read_reg(Reg::T0);
//! sim.step();
//! assert_eq!(reg(&sim), 1);
//! sim.step();
//! assert_eq!(reg(&sim), 2);
//! sim.step();
//! assert_eq!(reg(&sim), 4);
//! assert!(sim.is_terminated());
//!
//! // ...and backwards:
//! sim.step_back();
//! assert_eq!(reg(&sim), 2);
//! assert!(!sim.is_terminated());
//! ```
//!
//! ## Querying State
//!
//! The machine state of the loaded program is accessible through [`Simulator::context`]
//! (which is `None` if no program is loaded).
//! The [`Debugger`] trait offers the same state with sentinel values instead.
//!
//! ## Debugging with breakpoints
//!
//! Breakpoints are accessible through the `breakpoints` field on [`Simulator`].
//!
//! To add a `breakpoint`, simply insert a [`Breakpoint`] and
//! it will break if its condition is met during all execution functions (except [`Simulator::step`]).
//!
//! ```
//! use mips_stepper::sim::{Simulator, PauseCondition};
//! use mips_stepper::sim::debug::Breakpoint;
//!
//! let src = "
//!     addi $t0, $zero, 1
//!     addi $t0, $zero, 2
//!     addi $t0, $zero, 3
//!     addi $t0, $zero, 4
//! ";
//! let mut sim = Simulator::new(Default::default());
//! sim.load_src(src, "bp.s");
//!
//! sim.breakpoints.insert(Breakpoint::Line(4));
//!
//! assert_eq!(sim.run(), PauseCondition::Breakpoint);
//! assert_eq!(sim.current_source_line(), Some(4));
//! ```
pub mod mem;
pub mod context;
pub mod instr;
pub mod registry;
pub mod program;
pub mod debug;
pub mod log;

use std::collections::HashSet;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::ast::Reg;

use self::context::ExecutionContext;
use self::debug::Breakpoint;
use self::instr::UndoRecord;
use self::log::Logger;
use self::mem::MachineInitStrategy;
use self::program::ParsedProgram;
use self::registry::InstrRegistry;

/// Reason for why execution paused.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum PauseCondition {
    /// The program ran out of instructions.
    Terminated,
    /// Program hit a breakpoint.
    Breakpoint,
    /// Program hit a tripwire condition.
    Tripwire,
    /// Execution was cancelled through a [`RunHandle`].
    Cancelled,
    /// No program is loaded.
    NotLoaded,
}

/// Configuration flags for [`Simulator`].
///
/// These can be modified after the `Simulator` is created with [`Simulator::new`].
/// They take effect at the next load (or restart).
///
/// Read the field descriptions for more details.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct SimFlags {
    /// The creation strategy for the register file.
    ///
    /// By default, this flag is [`MachineInitStrategy::default`] (all zeroes).
    pub machine_init: MachineInitStrategy,

    /// Register values which are written after the register file is created.
    ///
    /// Writes to `$zero` are ignored.
    ///
    /// By default, this flag is empty.
    pub preset_regs: Vec<(Reg, i32)>,

    /// The label execution starts at.
    ///
    /// If the program does not declare this label, execution starts at the first instruction.
    ///
    /// By default, this flag is `"main"`.
    pub entry_label: String,
}

impl Default for SimFlags {
    fn default() -> Self {
        Self {
            machine_init: Default::default(),
            preset_regs: vec![],
            entry_label: String::from("main"),
        }
    }
}

/// A handle which can cancel a running simulator.
///
/// This can be acquired with [`Simulator::run_handle`] and sent to another thread.
/// Cancelling only affects a run which is in progress.
/// Each call to [`Simulator::run_while`] (and adjacent) re-arms the handle.
#[derive(Debug, Clone, Default)]
pub struct RunHandle(Arc<AtomicBool>);
impl RunHandle {
    /// Stops the current run before its next instruction.
    pub fn cancel(&self) {
        self.0.store(false, Ordering::Relaxed);
    }
    /// Whether the simulator is currently running.
    pub fn is_running(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
    fn arm(&self) {
        self.0.store(true, Ordering::Relaxed);
    }
}

/// One executed step, kept so that it can be undone.
#[derive(Debug)]
struct HistoryEntry {
    index: usize,
    record: UndoRecord,
    was_terminated: bool,
}

/// A loaded program and its execution state.
#[derive(Debug)]
struct Session {
    path: String,
    program: ParsedProgram,
    ctx: ExecutionContext,
    history: Vec<HistoryEntry>,
    terminated: bool,
}

/// Executes MIPS programs, forwards and backwards.
#[derive(Debug)]
pub struct Simulator {
    // ------------------ SIMULATION STATE ------------------
    // Loading a program resets this.
    session: Option<Session>,

    /// The number of instructions successfully run since this `Simulator` was initialized.
    ///
    /// Stepping back does not decrease this.
    /// This can be set to 0 to reset the counter.
    pub instructions_run: u64,

    // ------------------ CONFIG/DEBUG STATE ------------------
    // Loading a program does not reset these values.

    /// Cancellation flag for the run loop.
    ///
    /// This is publicly accessible via [`Simulator::run_handle`].
    run_handle: RunHandle,

    /// Configuration settings for the simulator.
    ///
    /// See [`SimFlags`] for more details on what configuration
    /// settings are available.
    pub flags: SimFlags,

    /// Breakpoints for the simulator.
    pub breakpoints: HashSet<Breakpoint>,

    registry: InstrRegistry,
    logger: Logger,
}
impl Simulator where Simulator: Send + Sync {}

impl Simulator {
    /// Creates a new simulator with the provided flags and the built-in instructions,
    /// but without a loaded program.
    pub fn new(flags: SimFlags) -> Self {
        Self::with_registry(flags, InstrRegistry::new())
    }

    /// Creates a new simulator with the provided flags and instruction registry,
    /// but without a loaded program.
    pub fn with_registry(flags: SimFlags, registry: InstrRegistry) -> Self {
        Self {
            session: None,
            instructions_run: 0,
            run_handle: Default::default(),
            flags,
            breakpoints: Default::default(),
            registry,
            logger: Default::default(),
        }
    }

    /// Gets the instruction registry programs are parsed with.
    pub fn registry(&self) -> &InstrRegistry {
        &self.registry
    }
    /// Gets a mutable reference to the instruction registry.
    ///
    /// Changes take effect at the next load.
    pub fn registry_mut(&mut self) -> &mut InstrRegistry {
        &mut self.registry
    }

    /// Sets the log sink for diagnostic messages.
    pub fn set_logger(&mut self, logger: Logger) {
        if let Some(s) = &mut self.session {
            s.ctx.set_logger(logger.clone());
        }
        self.logger = logger;
    }

    /// Gets a handle which can cancel [`Simulator::run`] (and adjacent) from another thread.
    pub fn run_handle(&self) -> RunHandle {
        self.run_handle.clone()
    }

    /// Reads and loads an assembly file.
    ///
    /// If the file cannot be read, the failure is logged,
    /// the previously loaded program (if any) is kept, and `false` is returned.
    pub fn load(&mut self, path: &Path) -> bool {
        match ParsedProgram::read(path, &self.registry, &self.logger) {
            Ok(program) => {
                self.load_program(program, path.display().to_string());
                true
            },
            Err(e) => {
                self.logger.log(format_args!("could not read {}: {e}", path.display()));
                false
            }
        }
    }

    /// Loads assembly source, recording `path` as the program's path.
    pub fn load_src(&mut self, src: &str, path: impl Into<String>) {
        let program = ParsedProgram::parse(src, &self.registry, &self.logger);
        self.load_program(program, path.into());
    }

    fn load_program(&mut self, program: ParsedProgram, path: String) {
        tracing::debug!(target: "mips_stepper", path = %path, instructions = program.len(), "loaded program");

        let ctx = self.fresh_context(&program);
        self.session = Some(Session {
            path,
            program,
            ctx,
            history: vec![],
            terminated: false,
        });
    }

    fn fresh_context(&self, program: &ParsedProgram) -> ExecutionContext {
        let mut ctx = ExecutionContext::new(self.flags.machine_init.reg_file(), self.logger.clone());
        for &(reg, value) in &self.flags.preset_regs {
            ctx.write_reg(reg, value);
        }
        ctx.set_exec_index(program.label_index(&self.flags.entry_label).unwrap_or(0));
        ctx
    }

    /// Resets the loaded program to its initial state (as though it had just been loaded).
    ///
    /// This preserves breakpoints and flags, but applies the current flags to the new state.
    /// Returns `false` if no program is loaded.
    pub fn restart(&mut self) -> bool {
        let Some(mut s) = self.session.take() else { return false };
        s.ctx = self.fresh_context(&s.program);
        s.history.clear();
        s.terminated = false;
        self.session = Some(s);
        true
    }

    /// Checks whether a program is loaded.
    pub fn is_loaded(&self) -> bool {
        self.session.is_some()
    }
    /// Gets the loaded program.
    pub fn program(&self) -> Option<&ParsedProgram> {
        self.session.as_ref().map(|s| &s.program)
    }
    /// Gets the path of the loaded program.
    pub fn program_path(&self) -> Option<&str> {
        self.session.as_ref().map(|s| &*s.path)
    }
    /// Gets the machine state of the loaded program.
    pub fn context(&self) -> Option<&ExecutionContext> {
        self.session.as_ref().map(|s| &s.ctx)
    }
    /// Whether the loaded program has terminated.
    ///
    /// This is `false` if no program is loaded.
    pub fn is_terminated(&self) -> bool {
        self.session.as_ref().is_some_and(|s| s.terminated)
    }
    /// The number of steps which can currently be undone.
    pub fn history_len(&self) -> usize {
        self.session.as_ref().map_or(0, |s| s.history.len())
    }
    /// The (1-based) source line of the next instruction to execute.
    ///
    /// This is `None` if no program is loaded or if there is no next instruction.
    pub fn current_source_line(&self) -> Option<usize> {
        let s = self.session.as_ref()?;
        s.program.line_of(s.ctx.exec_index())
    }

    /// Simulate one step, executing one instruction.
    ///
    /// This returns whether an instruction was executed.
    ///
    /// Nothing happens if no program is loaded or if the program has terminated.
    /// If there are no instructions left, the program terminates.
    /// The program also terminates right after its last instruction executes.
    pub fn step(&mut self) -> bool {
        let Some(s) = &mut self.session else { return false };
        if s.terminated { return false };

        let index = s.ctx.exec_index();
        let Some(instr) = s.program.instr(index) else {
            s.terminated = true;
            return false;
        };

        let pc = s.ctx.pc();
        let record = instr.execute(&mut s.ctx);
        trace_step(&s.ctx, pc, &*instr, &record);

        s.history.push(HistoryEntry { index, record, was_terminated: s.terminated });
        s.ctx.set_exec_index(index + 1);
        if index + 1 >= s.program.len() {
            s.terminated = true;
        }

        self.instructions_run += 1;
        true
    }

    /// Undoes the last step.
    ///
    /// This returns whether a step was undone
    /// (which is `false` if no program is loaded or if no steps have been executed).
    pub fn step_back(&mut self) -> bool {
        let Some(s) = &mut self.session else { return false };
        let Some(HistoryEntry { index, record, was_terminated }) = s.history.pop() else { return false };

        if let Some(instr) = s.program.instr(index) {
            instr.undo(&mut s.ctx, record);
        }
        s.ctx.set_exec_index(index);
        s.terminated = was_terminated;
        true
    }

    /// Runs until the tripwire condition returns false (or any of the typical breaks occur).
    ///
    /// The typical break conditions are:
    /// - the program terminates
    /// - the run is cancelled through a [`RunHandle`]
    /// - A breakpoint matches
    pub fn run_while(&mut self, mut tripwire: impl FnMut(&mut Simulator) -> bool) -> PauseCondition {
        if !self.is_loaded() { return PauseCondition::NotLoaded };
        self.run_handle.arm();

        // event loop
        // run until:
        // 1. the run handle is cancelled
        // 2. the program terminates
        // 3. the tripwire condition returns false
        // 4. any of the breakpoints are hit
        let result = loop {
            if !self.run_handle.is_running() {
                break PauseCondition::Cancelled;
            }
            if self.is_terminated() {
                break PauseCondition::Terminated;
            }
            if !tripwire(self) {
                break PauseCondition::Tripwire;
            }

            if !self.step() {
                break PauseCondition::Terminated;
            }

            // After executing, check that any breakpoints were hit.
            if self.breakpoints.iter().any(|bp| bp.check(self)) {
                break PauseCondition::Breakpoint;
            }
        };

        self.run_handle.cancel();
        result
    }

    /// Execute the program.
    ///
    /// This blocks until the program ends.
    /// If you would like to limit the maximum number of steps to execute, consider [`Simulator::run_with_limit`].
    pub fn run(&mut self) -> PauseCondition {
        self.run_while(|_| true)
    }

    /// Execute the program with a limit on how many steps to execute.
    ///
    /// This blocks until the program ends or until the number of steps to execute has been hit.
    pub fn run_with_limit(&mut self, max_steps: u64) -> PauseCondition {
        let i = self.instructions_run;
        self.run_while(|sim| sim.instructions_run.wrapping_sub(i) < max_steps)
    }
}
impl Default for Simulator {
    fn default() -> Self {
        Self::new(Default::default())
    }
}

fn trace_step(ctx: &ExecutionContext, pc: i32, instr: &dyn instr::Instruction, record: &UndoRecord) {
    match *record {
        UndoRecord::Nothing => ctx.log(format_args!("0x{pc:08X}: {instr}")),
        UndoRecord::Reg { reg, prev } => ctx.log(format_args!(
            "0x{pc:08X}: {instr}: {reg} = 0x{:08X} (was 0x{prev:08X})", ctx.read_reg(reg)
        )),
        UndoRecord::HiLo { .. } => ctx.log(format_args!(
            "0x{pc:08X}: {instr}: hi = 0x{:08X}, lo = 0x{:08X}", ctx.hi(), ctx.lo()
        )),
        UndoRecord::Mem { addr, ref prev } => ctx.log(format_args!(
            "0x{pc:08X}: {instr}: wrote {} byte(s) at 0x{addr:08X}", prev.len()
        )),
    }
}

/// The interface a debug-protocol front end uses to drive a simulator.
///
/// Unlike the inherent methods of [`Simulator`], these never return `Option`.
/// When nothing is loaded, they return sentinel values instead
/// (`-1` for numbers, an empty slice, or an empty string).
pub trait Debugger {
    /// Reads and loads a program, returning whether it could be read.
    fn load(&mut self, path: &Path) -> bool;
    /// Executes one instruction, returning whether one was executed.
    fn step(&mut self) -> bool;
    /// Undoes one instruction, returning whether one was undone.
    fn step_back(&mut self) -> bool;
    /// Whether the program has terminated.
    fn is_terminated(&self) -> bool;
    /// The 32 general purpose registers.
    fn registers(&self) -> &[i32];
    /// The program counter.
    fn pc(&self) -> i32;
    /// The HI register.
    fn hi(&self) -> i32;
    /// The LO register.
    fn lo(&self) -> i32;
    /// The (1-based) source line of the next instruction.
    fn current_line(&self) -> i32;
    /// The path of the loaded program.
    fn program_path(&self) -> &str;
    /// Sets the sink for diagnostic messages.
    fn set_logger(&mut self, logger: Logger);
}

impl Debugger for Simulator {
    fn load(&mut self, path: &Path) -> bool {
        Simulator::load(self, path)
    }
    fn step(&mut self) -> bool {
        Simulator::step(self)
    }
    fn step_back(&mut self) -> bool {
        Simulator::step_back(self)
    }
    fn is_terminated(&self) -> bool {
        Simulator::is_terminated(self)
    }
    fn registers(&self) -> &[i32] {
        match self.context() {
            Some(ctx) => ctx.registers(),
            None => &[],
        }
    }
    fn pc(&self) -> i32 {
        self.context().map_or(-1, |c| c.pc())
    }
    fn hi(&self) -> i32 {
        self.context().map_or(-1, |c| c.hi())
    }
    fn lo(&self) -> i32 {
        self.context().map_or(-1, |c| c.lo())
    }
    fn current_line(&self) -> i32 {
        self.current_source_line()
            .and_then(|l| i32::try_from(l).ok())
            .unwrap_or(-1)
    }
    fn program_path(&self) -> &str {
        Simulator::program_path(self).unwrap_or("")
    }
    fn set_logger(&mut self, logger: Logger) {
        Simulator::set_logger(self, logger);
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use proptest::prelude::*;

    use crate::parse::{Operands, ParseErr};
    use crate::sim::debug::Comparator;

    use super::*;

    fn load(src: &str) -> Simulator {
        let mut sim = Simulator::new(Default::default());
        sim.load_src(src, "test.s");
        sim
    }
    fn reg(sim: &Simulator, r: Reg) -> i32 {
        sim.context().unwrap().read_reg(r)
    }
    fn exec_index(sim: &Simulator) -> usize {
        sim.context().unwrap().exec_index()
    }

    #[test]
    fn test_unloaded() {
        let mut sim = Simulator::new(Default::default());
        let dbg: &mut dyn Debugger = &mut sim;

        assert!(!dbg.step());
        assert!(!dbg.step_back());
        assert!(!dbg.is_terminated());
        assert_eq!(dbg.registers(), &[] as &[i32]);
        assert_eq!(dbg.pc(), -1);
        assert_eq!(dbg.hi(), -1);
        assert_eq!(dbg.lo(), -1);
        assert_eq!(dbg.current_line(), -1);
        assert_eq!(dbg.program_path(), "");
        assert_eq!(sim.run(), PauseCondition::NotLoaded);
        assert!(!sim.restart());
    }

    #[test]
    fn test_single_instruction_program() {
        let mut sim = Simulator::new(SimFlags { preset_regs: vec![(Reg::T1, 0xcafe)], ..Default::default() });
        sim.load_src("main: add $t0, $t1, $t2", "single.s");
        assert!(!sim.is_terminated());
        assert_eq!(Debugger::current_line(&sim), 1);
        assert_eq!(reg(&sim, Reg::T1), 0xcafe);

        assert!(sim.step());
        assert_eq!(reg(&sim, Reg::T0), 0xcafe);
        // the last instruction has run
        assert!(sim.is_terminated());
        assert_eq!(Debugger::current_line(&sim), -1);
        assert!(!sim.step());

        assert!(sim.step_back());
        assert!(!sim.is_terminated());
        assert_eq!(exec_index(&sim), 0);
        assert_eq!(reg(&sim, Reg::T0), 0);
        assert_eq!(Debugger::current_line(&sim), 1);
    }

    #[test]
    fn test_step_back_across_termination() {
        let mut sim = load("addi $t0, $zero, 3\nsll $t1, $t0, 31");
        assert!(sim.step());
        assert!(!sim.is_terminated());
        assert!(sim.step());
        assert!(sim.is_terminated());
        assert_eq!(reg(&sim, Reg::T1), i32::MIN);

        assert!(sim.step_back());
        assert!(!sim.is_terminated());
        assert_eq!(exec_index(&sim), 1);
        assert_eq!(reg(&sim, Reg::T1), 0);
        assert_eq!(reg(&sim, Reg::T0), 3);
    }

    #[test]
    fn test_step_back_empty_history() {
        let mut sim = load("addi $t0, $zero, 3");
        let before = sim.context().cloned();
        assert!(!sim.step_back());
        assert_eq!(sim.context().cloned(), before);
        assert!(!sim.is_terminated());
        assert_eq!(sim.history_len(), 0);
    }

    #[test]
    fn test_empty_program() {
        let mut sim = load("# nothing here\n.text\n");
        assert!(sim.is_loaded());
        assert!(!sim.is_terminated());
        assert!(!sim.step());
        assert!(sim.is_terminated());
        assert!(!sim.step_back());
        assert!(sim.is_terminated());
    }

    #[test]
    fn test_entry_label() {
        let src = "addi $t0, $zero, 1\nmain:\naddi $t1, $zero, 2";
        let sim = load(src);
        assert_eq!(exec_index(&sim), 1);
        assert_eq!(Debugger::pc(&sim), 0x0040_0001);
        assert_eq!(Debugger::current_line(&sim), 3);

        let mut sim = Simulator::new(SimFlags { entry_label: "start".into(), ..Default::default() });
        sim.load_src(src, "entry.s");
        assert_eq!(exec_index(&sim), 0);
    }

    #[test]
    fn test_skipped_lines_keep_line_map() {
        let mut sim = load("addi $t0, $zero, 1\nbogus $t0\n\nsll $t0, $t0, 35\naddi $t0, $t0, 1");
        assert_eq!(sim.program().unwrap().len(), 2);
        sim.step();
        assert_eq!(sim.current_source_line(), Some(5));
        sim.step();
        assert_eq!(reg(&sim, Reg::T0), 2);
    }

    #[test]
    fn test_load_file() {
        let path = std::env::temp_dir().join(format!("mips-stepper-load-{}.s", std::process::id()));
        std::fs::write(&path, "main:\n  addi $v0, $zero, 10\n").unwrap();

        let mut sim = Simulator::new(Default::default());
        assert!(Debugger::load(&mut sim, &path));
        assert_eq!(Debugger::program_path(&sim), path.display().to_string());
        assert_eq!(Debugger::registers(&sim).len(), 32);
        assert!(sim.step());
        assert_eq!(Debugger::registers(&sim)[2], 10);

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_load_missing_file() {
        let (logger, rx) = Logger::channel();
        let mut sim = load("addi $t0, $zero, 1");
        sim.set_logger(logger);

        assert!(!sim.load(Path::new("/definitely/not/a/real/file.s")));
        let msg = rx.try_recv().unwrap();
        assert!(msg.contains("file.s"), "{msg}");

        // the previous program is still loaded
        assert_eq!(sim.program_path(), Some("test.s"));
    }

    #[test]
    fn test_logger_messages() {
        let (logger, rx) = Logger::channel();
        let mut sim = Simulator::new(Default::default());
        sim.set_logger(logger);
        sim.load_src("addi $t0, $zero, 7\nnope\nsw $t0, 0($sp)\ndiv $t0, $zero", "log.s");

        let skipped = rx.try_recv().unwrap();
        assert!(skipped.starts_with("line 2:"), "{skipped}");

        sim.run();
        let trace: Vec<_> = rx.try_iter().collect();
        assert_eq!(trace, [
            "0x00400000: addi $t0, $zero, 7: $t0 = 0x00000007 (was 0x00000000)",
            "0x00400001: sw $t0, 0($sp): wrote 4 byte(s) at 0x00000000",
            "0x00400002: div $t0, $zero",
        ]);
    }

    #[test]
    fn test_init_strategy_and_presets() {
        let flags = SimFlags {
            machine_init: MachineInitStrategy::Known { value: 0x1234 },
            preset_regs: vec![(Reg::T1, 0xcafe), (Reg::Zero, 1)],
            ..Default::default()
        };
        let mut sim = Simulator::new(flags);
        sim.load_src("add $t0, $t1, $t2", "init.s");
        assert_eq!(reg(&sim, Reg::Zero), 0);
        assert_eq!(reg(&sim, Reg::T1), 0xcafe);
        assert_eq!(reg(&sim, Reg::T2), 0x1234);
        sim.step();
        assert_eq!(reg(&sim, Reg::T0), 0xcafe + 0x1234);
    }

    #[test]
    fn test_restart() {
        let mut sim = load("addi $t0, $zero, 1\naddi $t1, $zero, 2");
        sim.run();
        assert!(sim.is_terminated());

        sim.flags.preset_regs = vec![(Reg::S0, 5)];
        assert!(sim.restart());
        assert!(!sim.is_terminated());
        assert_eq!(exec_index(&sim), 0);
        assert_eq!(sim.history_len(), 0);
        assert_eq!(reg(&sim, Reg::T0), 0);
        assert_eq!(reg(&sim, Reg::S0), 5);
    }

    #[test]
    fn test_run_to_end() {
        let mut sim = load("addi $t0, $zero, 6\naddi $t1, $zero, 7\nmult $t0, $t1\nmflo $v0");
        assert_eq!(sim.run(), PauseCondition::Terminated);
        assert_eq!(reg(&sim, Reg::V0), 42);
        assert_eq!(sim.instructions_run, 4);
        assert_eq!(sim.run(), PauseCondition::Terminated);
        assert!(!sim.run_handle().is_running());
    }

    #[test]
    fn test_run_breakpoints() {
        let mut sim = load("addi $t0, $zero, 1\naddi $t0, $t0, 1\naddi $t0, $t0, 1\naddi $t0, $t0, 1");
        sim.breakpoints.insert(Breakpoint::Reg { reg: Reg::T0, value: Comparator::Ge(2) });
        assert_eq!(sim.run(), PauseCondition::Breakpoint);
        assert_eq!(reg(&sim, Reg::T0), 2);

        sim.breakpoints.clear();
        sim.breakpoints.insert(Breakpoint::PC(0x0040_0003));
        assert_eq!(sim.run(), PauseCondition::Breakpoint);
        assert_eq!(reg(&sim, Reg::T0), 3);

        sim.breakpoints.clear();
        sim.breakpoints.insert(Breakpoint::Mem { addr: 0, value: Comparator::Ne(0) });
        assert_eq!(sim.run(), PauseCondition::Terminated);
        assert_eq!(reg(&sim, Reg::T0), 4);
    }

    #[test]
    fn test_run_limit_and_tripwire() {
        let mut sim = load(&"addi $t0, $t0, 1\n".repeat(10));
        assert_eq!(sim.run_with_limit(3), PauseCondition::Tripwire);
        assert_eq!(reg(&sim, Reg::T0), 3);

        assert_eq!(sim.run_while(|sim| sim.context().unwrap().read_reg(Reg::T0) < 5), PauseCondition::Tripwire);
        assert_eq!(reg(&sim, Reg::T0), 5);
    }

    #[test]
    fn test_run_cancel() {
        let mut sim = load(&"addi $t0, $t0, 1\n".repeat(10));
        let handle = sim.run_handle();
        let mut calls = 0;
        let result = sim.run_while(|_| {
            calls += 1;
            if calls == 2 { handle.cancel(); }
            true
        });
        assert_eq!(result, PauseCondition::Cancelled);
        assert_eq!(reg(&sim, Reg::T0), 2);
        assert!(!handle.is_running());
    }

    #[test]
    fn test_run_is_undoable() {
        let mut sim = load("addi $sp, $zero, 64\naddi $t0, $zero, -1\nsw $t0, -4($sp)\nsb $zero, -1($sp)\nlw $t1, -4($sp)");
        let initial = sim.context().cloned();
        sim.run();
        assert_eq!(reg(&sim, Reg::T1), -256);
        while sim.step_back() {}
        assert_eq!(sim.context().cloned(), initial);
    }

    #[test]
    fn test_custom_registry() {
        fn parse_move(ops: &Operands) -> Result<Box<dyn instr::Instruction>, ParseErr> {
            let [rd, rs] = ops.regs()?;
            Ok(Box::new(instr::Addu { rd, rs, rt: Reg::Zero }))
        }

        let mut sim = Simulator::new(Default::default());
        sim.registry_mut().register("move", parse_move);
        sim.load_src("addi $t1, $zero, 9\nmove $t0, $t1", "move.s");
        sim.run();
        assert_eq!(reg(&sim, Reg::T0), 9);
    }

    fn arb_line() -> impl Strategy<Value = String> {
        let reg = prop::sample::select(vec!["$zero", "$t0", "$t1", "$t2", "$s0", "$sp"]);
        let r3 = prop::sample::select(vec!["add", "addu", "sub", "subu", "and", "or", "xor", "nor", "slt", "sltu", "sllv", "srav"]);
        let sh = prop::sample::select(vec!["sll", "srl", "sra"]);
        let md = prop::sample::select(vec!["mult", "multu", "div", "divu"]);
        let imm = prop::sample::select(vec!["addi", "addiu", "slti", "sltiu"]);
        let mem = prop::sample::select(vec!["lb", "lbu", "lh", "lhu", "lw", "sb", "sh", "sw"]);
        let mv = prop::sample::select(vec!["mfhi", "mflo", "mthi", "mtlo"]);

        prop_oneof![
            (r3, reg.clone(), reg.clone(), reg.clone()).prop_map(|(m, a, b, c)| format!("{m} {a}, {b}, {c}")),
            (sh, reg.clone(), reg.clone(), 0..32i32).prop_map(|(m, a, b, s)| format!("{m} {a}, {b}, {s}")),
            (md, reg.clone(), reg.clone()).prop_map(|(m, a, b)| format!("{m} {a}, {b}")),
            (imm, reg.clone(), reg.clone(), -32768..32768i32).prop_map(|(m, a, b, i)| format!("{m} {a}, {b}, {i}")),
            (mem, reg.clone(), reg.clone(), -64..64i32).prop_map(|(m, a, b, o)| format!("{m} {a}, {o}({b})")),
            (mv, reg.clone()).prop_map(|(m, a)| format!("{m} {a}")),
            (reg, 0..65536i32).prop_map(|(a, i)| format!("lui {a}, {i}")),
        ]
    }

    proptest! {
        #[test]
        fn returning_to_an_index_restores_the_context(
            lines in prop::collection::vec(arb_line(), 1..24),
            forward in prop::collection::vec(any::<bool>(), 0..120),
            seed in any::<u64>()
        ) {
            let mut sim = Simulator::new(SimFlags {
                machine_init: MachineInitStrategy::Seeded { seed },
                ..Default::default()
            });
            sim.load_src(&lines.join("\n"), "prop.s");
            prop_assert_eq!(sim.program().map(|p| p.len()), Some(lines.len()));

            let mut first_seen = HashMap::new();
            let mut check = |sim: &Simulator| -> Result<(), TestCaseError> {
                let ctx = sim.context().unwrap();
                match first_seen.get(&ctx.exec_index()) {
                    Some(snapshot) => prop_assert_eq!(ctx, snapshot),
                    None => { first_seen.insert(ctx.exec_index(), ctx.clone()); },
                }
                prop_assert_eq!(ctx.read_reg(Reg::Zero), 0);
                Ok(())
            };

            check(&sim)?;
            for f in forward {
                match f {
                    true  => { sim.step(); },
                    false => { sim.step_back(); },
                }
                check(&sim)?;
            }
        }
    }
}
