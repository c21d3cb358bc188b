//! A MIPS parser, assembler, and reversible step simulator.
//!
//! This is meant to be the execution core of a stepping debugger
//! (a debug-protocol front end drives it through the [`sim::Debugger`] trait).
//!
//! # Usage
//!
//! To run MIPS source code, it must be loaded into a [`sim::Simulator`],
//! which can then be stepped forwards and backwards:
//! ```
//! use mips_stepper::sim::Simulator;
//! use mips_stepper::ast::Reg;
//!
//! let src = "
//!     main:
//!         addi $t0, $zero, 5
//!         sll  $t1, $t0, 2
//! ";
//! let mut sim = Simulator::new(Default::default());
//! sim.load_src(src, "demo.s");
//!
//! sim.step();
//! sim.step();
//! assert_eq!(sim.context().unwrap().read_reg(Reg::T1), 20);
//! assert!(sim.is_terminated());
//!
//! // Undo the last instruction:
//! sim.step_back();
//! assert_eq!(sim.context().unwrap().read_reg(Reg::T1), 0);
//! assert!(!sim.is_terminated());
//! ```
//!
//! Independently, MIPS source can be encoded into machine code:
//! ```
//! use mips_stepper::asm::assemble;
//!
//! let obj = assemble("add $t0, $t1, $t2").unwrap();
//! assert_eq!(obj.words(), &[0x012A4020]);
//! assert_eq!(obj.to_bytes(), vec![0x01, 0x2A, 0x40, 0x20]);
//! ```
//!
//! See the [`sim`] and [`asm`] modules for more details.
#![warn(missing_docs)]

pub mod parse;
pub mod ast;
pub mod asm;
pub mod sim;
pub mod err;
