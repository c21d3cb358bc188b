//! Components relating to the operands of MIPS assembly instructions.
//!
//! The key types here are:
//! - [`Reg`]: one of the 32 general purpose registers,
//! - [`Immediate`]: a signed 32-bit literal value.

use std::str::FromStr;

use crate::parse::lex::LexErr;

/// The base address of the text segment.
///
/// The first instruction of a program is conventionally located here.
pub const TEXT_BASE: u32 = 0x0040_0000;

macro_rules! reg_enum {
    ($($reg:ident = $name:literal),+ $(,)?) => {
        /// A general purpose register.
        ///
        /// Registers are ordinal-indexed (`Reg::Zero` is register 0, `Reg::Ra` is register 31)
        /// and written in assembly with a leading `$`
        /// either by name (e.g., `$t0`) or by number (e.g., `$8`).
        ///
        /// ## Examples
        ///
        /// ```text
        /// add $t0, $t1, $t2
        ///     ~~~  ~~~  ~~~
        /// lw $s0, 4($sp)
        ///    ~~~    ~~~
        /// ```
        #[derive(Debug, PartialEq, Eq, Hash, Clone, Copy, PartialOrd, Ord)]
        #[repr(u8)]
        pub enum Reg {
            $(
                #[allow(missing_docs)]
                $reg
            ),+
        }

        impl Reg {
            /// All registers, in register number order.
            pub const ALL: [Reg; 32] = [$(Reg::$reg),+];

            /// The canonical short name of this register (without the `$`).
            pub fn name(self) -> &'static str {
                match self {
                    $(Reg::$reg => $name),+
                }
            }
        }
    };
}
reg_enum! {
    Zero = "zero", At = "at", V0 = "v0", V1 = "v1",
    A0 = "a0", A1 = "a1", A2 = "a2", A3 = "a3",
    T0 = "t0", T1 = "t1", T2 = "t2", T3 = "t3",
    T4 = "t4", T5 = "t5", T6 = "t6", T7 = "t7",
    S0 = "s0", S1 = "s1", S2 = "s2", S3 = "s3",
    S4 = "s4", S5 = "s5", S6 = "s6", S7 = "s7",
    T8 = "t8", T9 = "t9", K0 = "k0", K1 = "k1",
    Gp = "gp", Sp = "sp", S8 = "s8", Ra = "ra",
}

impl Reg {
    /// Gets the register number of this [`Reg`]. This is always between 0 and 31.
    pub fn reg_no(self) -> u8 {
        self as u8
    }

    /// Gets the register with the given register number, if it exists.
    pub fn from_reg_no(n: u8) -> Option<Reg> {
        Reg::ALL.get(usize::from(n)).copied()
    }
}
impl std::fmt::Display for Reg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "${}", self.name())
    }
}
impl From<Reg> for usize {
    // Used for indexing the register file.
    fn from(value: Reg) -> Self {
        usize::from(value.reg_no())
    }
}
impl FromStr for Reg {
    type Err = LexErr;

    /// Parses a register name (without its `$`).
    ///
    /// This accepts a case-insensitive register name (including `fp` as an alias of `s8`)
    /// or a register number between 0 and 31.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.bytes().all(|b| b.is_ascii_digit()) {
            return s.parse::<u8>().ok()
                .and_then(Reg::from_reg_no)
                .ok_or(LexErr::InvalidReg);
        }

        let lower = s.to_ascii_lowercase();
        if lower == "fp" { return Ok(Reg::S8) };

        Reg::ALL.into_iter()
            .find(|r| r.name() == lower)
            .ok_or(LexErr::InvalidReg)
    }
}

/// A signed 32-bit immediate value.
///
/// Immediates are written either in decimal (e.g., `42`, `-7`)
/// or in hexadecimal with a `0x` prefix (e.g., `0xcafe`, `0xFFFFFFFF`).
///
/// Hexadecimal literals may use all 32 bits and are reinterpreted as two's complement,
/// so `0xFFFFFFFF` is `-1`. Decimal literals must fit an `i32`.
///
/// The immediate itself has no range restriction;
/// each instruction checks that the value fits its own field.
///
/// ```
/// use mips_stepper::ast::Immediate;
///
/// assert_eq!("0x10".parse::<Immediate>().unwrap().get(), 16);
/// assert_eq!("-32".parse::<Immediate>().unwrap().get(), -32);
/// assert_eq!("0xFFFFFFFF".parse::<Immediate>().unwrap().get(), -1);
/// assert!("0xG".parse::<Immediate>().is_err());
/// ```
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy, Default)]
pub struct Immediate(i32);

impl Immediate {
    /// Creates a new immediate.
    pub fn new(value: i32) -> Self {
        Immediate(value)
    }
    /// Gets the value of the immediate.
    pub fn get(self) -> i32 {
        self.0
    }
    /// Gets the value of the immediate, erroring if it lies outside `min..=max`.
    pub fn get_in(self, min: i32, max: i32) -> Result<i32, crate::parse::ParseErr> {
        match (min..=max).contains(&self.0) {
            true  => Ok(self.0),
            false => Err(crate::parse::ParseErr::ImmOutOfRange { value: self.0, min, max }),
        }
    }
}
impl From<Immediate> for i32 {
    fn from(value: Immediate) -> Self {
        value.0
    }
}
impl std::fmt::Display for Immediate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}
impl FromStr for Immediate {
    type Err = LexErr;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        use std::num::IntErrorKind;

        let (neg, digits) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s),
        };

        if let Some(hex) = digits.strip_prefix("0x").or_else(|| digits.strip_prefix("0X")) {
            let bits = u32::from_str_radix(hex, 16)
                .map_err(|e| match e.kind() {
                    IntErrorKind::Empty => LexErr::InvalidHexEmpty,
                    IntErrorKind::PosOverflow => LexErr::DoesNotFitI32,
                    _ => LexErr::InvalidHex,
                })?;
            // Hex literals are bit patterns.
            let value = bits as i32;
            return Ok(Immediate(if neg { value.wrapping_neg() } else { value }));
        }

        s.parse::<i32>()
            .map(Immediate)
            .map_err(|e| match e.kind() {
                IntErrorKind::Empty => LexErr::InvalidDecEmpty,
                IntErrorKind::InvalidDigit if digits.is_empty() => LexErr::InvalidDecEmpty,
                IntErrorKind::PosOverflow | IntErrorKind::NegOverflow => LexErr::DoesNotFitI32,
                _ => LexErr::InvalidNumeric,
            })
    }
}
