//! Memory handling for the MIPS simulator.
//!
//! This module consists of:
//! - [`RegFile`]: The general purpose register file.
//! - [`Memory`]: The byte-addressable memory.
//! - [`MachineInitStrategy`]: How the register file is filled when a program is loaded.

use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::Rng;

use crate::ast::Reg;

/// The register file.
///
/// This struct can be indexed with a [`Reg`].
/// Reading `$zero` always produces 0, and writes to it are discarded.
///
/// # Example
///
/// ```
/// use mips_stepper::sim::mem::RegFile;
/// use mips_stepper::ast::Reg;
///
/// let mut regs = RegFile::new();
/// regs.set(Reg::T0, 11);
/// regs.set(Reg::Zero, 11);
/// assert_eq!(regs[Reg::T0], 11);
/// assert_eq!(regs[Reg::Zero], 0);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegFile([i32; 32]);
impl RegFile {
    /// Creates a register file filled with zeroes.
    pub fn new() -> Self {
        Self([0; 32])
    }

    /// Creates a register file whose registers (other than `$zero`) are filled by the given filler.
    pub fn with_filler(filler: &mut impl RegFiller) -> Self {
        let mut regs = Self::new();
        for r in &mut regs.0[1..] {
            *r = filler.generate();
        }
        regs
    }

    /// Writes a register, returning its previous value.
    ///
    /// If the register is `$zero`, nothing happens and `None` is returned.
    pub fn set(&mut self, reg: Reg, value: i32) -> Option<i32> {
        match reg {
            Reg::Zero => None,
            r => Some(std::mem::replace(&mut self.0[usize::from(r)], value)),
        }
    }

    /// The register values, in register number order.
    pub fn as_slice(&self) -> &[i32] {
        &self.0
    }
}
impl Default for RegFile {
    fn default() -> Self {
        Self::new()
    }
}
impl std::ops::Index<Reg> for RegFile {
    type Output = i32;

    fn index(&self, index: Reg) -> &Self::Output {
        &self.0[usize::from(index)]
    }
}

/// Byte-addressable memory.
///
/// This can be addressed with any `u32` (32-bit address).
/// Only bytes which have been written are stored. Any other byte reads as 0.
///
/// Multi-byte accesses are big-endian and do not need to be aligned.
///
/// ```
/// use mips_stepper::sim::mem::Memory;
///
/// let mut mem = Memory::new();
/// assert_eq!(mem.read_word(0x1000_0000), 0);
///
/// mem.write_word(0x1000_0000, 0x1234_5678);
/// assert_eq!(mem.read_byte(0x1000_0000), 0x12);
/// assert_eq!(mem.read_half(0x1000_0002), 0x5678);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Memory {
    data: HashMap<u32, u8>
}
impl Memory {
    /// Creates an empty memory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads a byte (0 if it has never been written).
    pub fn read_byte(&self, addr: u32) -> u8 {
        self.data.get(&addr).copied().unwrap_or(0)
    }
    /// Writes a byte, returning the previous byte if one was written before.
    pub fn write_byte(&mut self, addr: u32, value: u8) -> Option<u8> {
        self.data.insert(addr, value)
    }
    /// Restores a byte to a previous state.
    ///
    /// If the state is `None`, the byte becomes unwritten again.
    pub fn restore_byte(&mut self, addr: u32, prev: Option<u8>) {
        match prev {
            Some(b) => self.data.insert(addr, b),
            None    => self.data.remove(&addr),
        };
    }

    /// Checks whether a byte has been written.
    pub fn is_written(&self, addr: u32) -> bool {
        self.data.contains_key(&addr)
    }
    /// Number of bytes which have been written.
    pub fn written_len(&self) -> usize {
        self.data.len()
    }

    fn read_bytes<const N: usize>(&self, addr: u32) -> [u8; N] {
        std::array::from_fn(|i| self.read_byte(addr.wrapping_add(i as u32)))
    }
    fn write_bytes<const N: usize>(&mut self, addr: u32, bytes: [u8; N]) -> [Option<u8>; N] {
        let mut prev = [None; N];
        for (i, (p, b)) in std::iter::zip(&mut prev, bytes).enumerate() {
            *p = self.write_byte(addr.wrapping_add(i as u32), b);
        }
        prev
    }

    /// Reads a big-endian half-word.
    pub fn read_half(&self, addr: u32) -> u16 {
        u16::from_be_bytes(self.read_bytes(addr))
    }
    /// Reads a big-endian word.
    pub fn read_word(&self, addr: u32) -> u32 {
        u32::from_be_bytes(self.read_bytes(addr))
    }
    /// Writes a big-endian half-word, returning the previous state of both bytes.
    pub fn write_half(&mut self, addr: u32, value: u16) -> [Option<u8>; 2] {
        self.write_bytes(addr, value.to_be_bytes())
    }
    /// Writes a big-endian word, returning the previous state of all four bytes.
    pub fn write_word(&mut self, addr: u32, value: u32) -> [Option<u8>; 4] {
        self.write_bytes(addr, value.to_be_bytes())
    }
}

/// Trait that describes types that can be used to create the initial data of a register.
pub trait RegFiller {
    /// Generate the data.
    fn generate(&mut self) -> i32;
}
impl RegFiller for i32 {
    /// Sets each register to the given value.
    fn generate(&mut self) -> i32 {
        *self
    }
}
impl RegFiller for StdRng {
    /// This creates values from the standard random number generator.
    ///
    /// This can be used to create deterministic, seeded values.
    fn generate(&mut self) -> i32 {
        self.gen()
    }
}

/// Strategy used to initialize the register file when a program is loaded.
///
/// `$zero` is always 0 regardless of strategy.
/// Memory is unaffected (unwritten memory always reads as 0).
#[derive(Debug, Default, PartialEq, Eq, Clone, Copy)]
pub enum MachineInitStrategy {
    /// Initializes each register to 0.
    #[default]
    Zeroed,

    /// Initializes each register randomly and deterministically.
    Seeded {
        /// The seed the RNG was initialized with.
        seed: u64
    },

    /// Initializes each register to a known value.
    Known {
        /// The value to initialize each register to.
        value: i32
    }
}

impl MachineInitStrategy {
    /// Creates a register file according to this strategy.
    pub fn reg_file(&self) -> RegFile {
        use rand::SeedableRng;

        match *self {
            MachineInitStrategy::Zeroed => RegFile::new(),
            MachineInitStrategy::Seeded { seed } => RegFile::with_filler(&mut StdRng::seed_from_u64(seed)),
            MachineInitStrategy::Known { mut value } => RegFile::with_filler(&mut value),
        }
    }
}
