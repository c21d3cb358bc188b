//! Error interface for this crate.
//!
//! Each module has its own error type, which are re-exported here:
//! - [`LexErr`]: errors raised while tokenizing an operand list
//! - [`ParseErr`]: errors raised while parsing an instruction line
//! - [`AsmErr`]: errors raised while encoding a program into machine code
//!
//! The simulator does not surface errors.
//! Lines that fail to parse during loading are skipped and logged instead.

use std::borrow::Cow;

pub use crate::parse::lex::LexErr;
pub use crate::parse::ParseErr;
pub use crate::asm::{AsmErr, AsmErrKind};

/// Unified error interface for all errors in this crate.
///
/// Note that the [`Display`] implementation is used for a brief message,
/// where as [`Error::help`] is used for any clarifying messages.
///
/// [`Display`]: std::fmt::Display
pub trait Error: std::error::Error {
    /// A clarifying message to help aid someone in how to fix the message.
    ///
    /// By default this is `None`.
    fn help(&self) -> Option<Cow<str>> {
        None
    }
}
