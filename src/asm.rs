//! Encoding assembly source into MIPS machine code.
//!
//! This is independent of the simulator: it reads source text and produces
//! 32-bit machine words, without executing anything.
//!
//! The assembler module notably consists of:
//! - [`assemble`] and [`assemble_file`]: The main functions which encode source into an object file.
//! - [`SymbolTable`]: a struct holding the symbol table, which stores the address of labels after the first assembler pass
//! - [`ObjectFile`]: a struct holding the encoded words, which can be serialized with [`ObjectFile::to_bytes`]
//!
//! Source lines are cleaned the same way the simulator's loader cleans them
//! (see [`crate::parse::clean_line`]), and each instruction line occupies one word,
//! starting at [`TEXT_BASE`].

pub mod encoding;

use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use crate::ast::{Reg, TEXT_BASE};
use crate::parse::{classify_line, clean_line, Line, Operands, ParseErr, Target};

use self::encoding::{encode_i, encode_j, encode_r, Funct, Mnemonic, Opcode, REGIMM};

/// Encodes assembly source into an object file.
///
/// # Example
/// ```
/// use mips_stepper::asm::assemble;
///
/// let src = "
///     main:
///         addi $t0, $zero, 5
///         j main
/// ";
/// let obj = assemble(src).unwrap();
/// assert_eq!(obj.words(), &[0x20080005, 0x08100000]);
/// assert_eq!(obj.symbol_table().lookup_label("main"), Some(0x0040_0000));
/// ```
pub fn assemble(src: &str) -> Result<ObjectFile, AsmErr> {
    let sym = SymbolTable::new(src)?;
    ObjectFile::new(src, sym)
}

/// Reads an assembly file and encodes it into an object file.
///
/// A read failure is reported as [`AsmErrKind::Io`] at line 0.
pub fn assemble_file(path: &Path) -> Result<ObjectFile, AsmErr> {
    let src = std::fs::read_to_string(path)
        .map_err(|e| AsmErr::new(AsmErrKind::Io(e.kind()), 0))?;
    assemble(&src)
}

/// Kinds of errors that can occur from encoding assembly source.
///
/// See [`AsmErr`] for this error type with line information included.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum AsmErrKind {
    /// The line could not be parsed (unknown mnemonic, bad operands, out-of-range immediate) (pass 2).
    Parse(ParseErr),
    /// A label was referenced but never declared (pass 2).
    UndefinedLabel(String),
    /// A branch target is too far away to be encoded (pass 2).
    ///
    /// This holds the offset (in words) that was computed.
    BranchOutOfRange(i64),
    /// There were multiple labels of the same name (pass 1).
    DuplicateLabel(String),
    /// The source file could not be read.
    Io(std::io::ErrorKind),
}
impl std::fmt::Display for AsmErrKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parse(e)            => e.fmt(f),
            Self::UndefinedLabel(l)   => write!(f, "label `{l}` was never defined"),
            Self::BranchOutOfRange(o) => write!(f, "branch offset {o} does not fit in 16 bits"),
            Self::DuplicateLabel(l)   => write!(f, "label `{l}` was defined multiple times"),
            Self::Io(k)               => write!(f, "could not read source: {k}"),
        }
    }
}
impl From<ParseErr> for AsmErrKind {
    fn from(value: ParseErr) -> Self {
        AsmErrKind::Parse(value)
    }
}

/// Error from encoding assembly source.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct AsmErr {
    /// The kind of error.
    pub kind: AsmErrKind,
    /// The (1-based) source line where the error occurred, or 0 if it is not tied to a line.
    pub line: usize
}
impl AsmErr {
    /// Creates a new [`AsmErr`].
    pub fn new(kind: AsmErrKind, line: usize) -> Self {
        AsmErr { kind, line }
    }
}
impl std::fmt::Display for AsmErr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.line {
            0 => self.kind.fmt(f),
            n => write!(f, "line {n}: {}", self.kind),
        }
    }
}
impl std::error::Error for AsmErr {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &self.kind {
            AsmErrKind::Parse(e) => Some(e),
            _ => None
        }
    }
}
impl crate::err::Error for AsmErr {
    fn help(&self) -> Option<std::borrow::Cow<str>> {
        match &self.kind {
            AsmErrKind::Parse(e)            => crate::err::Error::help(e),
            AsmErrKind::UndefinedLabel(_)   => Some("try adding this label before an instruction".into()),
            AsmErrKind::BranchOutOfRange(_) => Some("branches can only reach 32768 instructions away; try using j instead".into()),
            AsmErrKind::DuplicateLabel(_)   => Some("labels must be unique within a file, try renaming one of the labels".into()),
            AsmErrKind::Io(_)               => None,
        }
    }
}

/// The symbol table created in the first assembler pass.
///
/// This maps labels and source lines to the byte addresses they were assigned.
///
/// | from ↓, to →   | label                              | memory address                |
/// |----------------|------------------------------------|-------------------------------|
/// | label          | -                                  | [`SymbolTable::lookup_label`] |
/// | memory address | [`SymbolTable::rev_lookup_label`]  | [`SymbolTable::rev_lookup_line`] (to source line) |
/// | source line    | none                               | [`SymbolTable::lookup_line`]  |
#[derive(PartialEq, Eq, Clone, Default)]
pub struct SymbolTable {
    /// A mapping from label to its address.
    labels: HashMap<String, u32>,
    /// A mapping from (1-based) instruction lines to their addresses.
    lines: BTreeMap<usize, u32>,
}

impl SymbolTable {
    /// Creates a new symbol table.
    ///
    /// This performs the first assembler pass. Every instruction line is assigned
    /// the next word address (starting at [`TEXT_BASE`]), and every label is assigned
    /// the address of the instruction that follows it.
    ///
    /// ## Example
    /// ```
    /// use mips_stepper::asm::SymbolTable;
    ///
    /// let src = "
    /// main:
    ///     add $t0, $t1, $t2
    /// loop: sub $t0, $t0, $t1
    /// ";
    /// let sym = SymbolTable::new(src).unwrap();
    /// assert_eq!(sym.lookup_label("main"), Some(0x0040_0000));
    /// assert_eq!(sym.lookup_label("loop"), Some(0x0040_0004));
    /// assert_eq!(sym.lookup_line(4), Some(0x0040_0004));
    /// ```
    pub fn new(src: &str) -> Result<Self, AsmErr> {
        let mut sym = Self::default();
        let mut addr = TEXT_BASE;

        for (i, raw) in src.lines().enumerate() {
            let lno = i + 1;
            let (label, is_instr) = match classify_line(clean_line(raw)) {
                Line::Empty => (None, false),
                Line::Label(label) => (Some(label), false),
                Line::Instr { label, .. } => (label, true),
            };

            if let Some(label) = label {
                match sym.labels.entry(label.to_string()) {
                    Entry::Occupied(_) => return Err(AsmErr::new(AsmErrKind::DuplicateLabel(label.to_string()), lno)),
                    Entry::Vacant(e) => { e.insert(addr); },
                }
            }
            if is_instr {
                sym.lines.insert(lno, addr);
                addr = addr.wrapping_add(4);
            }
        }

        Ok(sym)
    }

    /// Gets the memory address of a given label (if it exists).
    pub fn lookup_label(&self, label: &str) -> Option<u32> {
        self.labels.get(label).copied()
    }

    /// Gets the label at a given memory address (if it exists).
    ///
    /// If several labels share the address, the alphabetically first one is returned.
    pub fn rev_lookup_label(&self, addr: u32) -> Option<&str> {
        self.labels.iter()
            .filter(|&(_, &a)| a == addr)
            .map(|(label, _)| label.as_str())
            .min()
    }

    /// Gets the memory address of the instruction at the given (1-based) source line (if it exists).
    pub fn lookup_line(&self, line: usize) -> Option<u32> {
        self.lines.get(&line).copied()
    }

    /// Gets the (1-based) source line of the instruction at the given memory address (if it exists).
    pub fn rev_lookup_line(&self, addr: u32) -> Option<usize> {
        self.lines.iter()
            .find(|&(_, &a)| a == addr)
            .map(|(&line, _)| line)
    }

    /// Gets an iterable of the mapping from labels to addresses.
    pub fn label_iter(&self) -> impl Iterator<Item=(&str, u32)> + '_ {
        self.labels.iter().map(|(label, &addr)| (label.as_str(), addr))
    }

    /// Gets an iterable of the mapping from source lines to addresses (in line order).
    pub fn line_iter(&self) -> impl Iterator<Item=(usize, u32)> + '_ {
        self.lines.iter().map(|(&line, &addr)| (line, addr))
    }
}
impl std::fmt::Debug for SymbolTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        struct Addr(u32);
        impl std::fmt::Debug for Addr {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "0x{:08X}", self.0)
            }
        }

        let mut labels: Vec<_> = self.label_iter().collect();
        labels.sort_unstable_by_key(|&(label, addr)| (addr, label));

        f.debug_struct("SymbolTable")
            .field("labels", &labels.into_iter().map(|(l, a)| (l, Addr(a))).collect::<Vec<_>>())
            .field("lines", &self.line_iter().map(|(l, a)| (l, Addr(a))).collect::<Vec<_>>())
            .finish()
    }
}

/// An object file.
///
/// This is the final product after assembly source is fully encoded.
/// It holds one word per instruction line, in source order.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct ObjectFile {
    words: Vec<u32>,
    sym: SymbolTable,
}

impl ObjectFile {
    /// Performs the second assembler pass, encoding every instruction line.
    fn new(src: &str, sym: SymbolTable) -> Result<Self, AsmErr> {
        let mut words = vec![];

        for (i, raw) in src.lines().enumerate() {
            let lno = i + 1;
            if let Line::Instr { mnemonic, operands, .. } = classify_line(clean_line(raw)) {
                let addr = sym.lookup_line(lno).unwrap_or(TEXT_BASE);
                let word = encode_instr(mnemonic, operands, addr, &sym)
                    .map_err(|kind| AsmErr::new(kind, lno))?;
                words.push(word);
            }
        }

        Ok(Self { words, sym })
    }

    /// The encoded words, in order.
    pub fn words(&self) -> &[u32] {
        &self.words
    }
    /// The number of encoded words.
    pub fn len(&self) -> usize {
        self.words.len()
    }
    /// Whether no words were encoded.
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
    /// The symbol table computed in the first pass.
    pub fn symbol_table(&self) -> &SymbolTable {
        &self.sym
    }

    /// Serializes the words (each big-endian) into a byte buffer.
    pub fn to_bytes(&self) -> Vec<u8> {
        encoding::to_be_bytes(&self.words)
    }

    /// Writes the serialized words (see [`ObjectFile::to_bytes`]) to a writer.
    pub fn write_to(&self, mut w: impl std::io::Write) -> std::io::Result<()> {
        w.write_all(&self.to_bytes())
    }
}

const SIMM16: (i32, i32) = (i16::MIN as i32, i16::MAX as i32);
const UIMM16: (i32, i32) = (0, u16::MAX as i32);

fn rt_field(r: Reg) -> u32 {
    u32::from(r.reg_no())
}
fn simm16(imm: crate::ast::Immediate) -> Result<u16, ParseErr> {
    imm.get_in(SIMM16.0, SIMM16.1).map(|v| v as i16 as u16)
}
fn uimm16(imm: crate::ast::Immediate) -> Result<u16, ParseErr> {
    imm.get_in(UIMM16.0, UIMM16.1).map(|v| v as u16)
}

/// Encodes one instruction located at `addr`.
fn encode_instr(mnemonic: &str, operands: &str, addr: u32, sym: &SymbolTable) -> Result<u32, AsmErrKind> {
    let mn = Mnemonic::lookup(mnemonic)
        .ok_or_else(|| ParseErr::UnknownMnemonic(mnemonic.to_string()))?;
    let ops = Operands::parse(operands)?;

    match mn {
        Mnemonic::R(funct) => Ok(encode_special(funct, &ops)?),
        Mnemonic::RegImm(code) => {
            ops.expect_len(2)?;
            let rs = ops.reg(0)?;
            let offset = branch_offset(ops.target(1)?, addr, sym)?;
            Ok(encode_i(REGIMM, rs, code.code(), offset))
        },
        Mnemonic::Op(op) => {
            let word = match op {
                Opcode::J | Opcode::Jal => {
                    ops.expect_len(1)?;
                    encode_j(op, jump_target(ops.target(0)?, sym)?)
                },
                Opcode::Beq | Opcode::Bne => {
                    ops.expect_len(3)?;
                    let rs = ops.reg(0)?;
                    let rt = ops.reg(1)?;
                    let offset = branch_offset(ops.target(2)?, addr, sym)?;
                    encode_i(op.code(), rs, rt_field(rt), offset)
                },
                Opcode::Blez | Opcode::Bgtz => {
                    ops.expect_len(2)?;
                    let rs = ops.reg(0)?;
                    let offset = branch_offset(ops.target(1)?, addr, sym)?;
                    encode_i(op.code(), rs, 0, offset)
                },
                Opcode::Addi | Opcode::Addiu | Opcode::Slti | Opcode::Sltiu => {
                    ops.expect_len(3)?;
                    let rt = ops.reg(0)?;
                    let rs = ops.reg(1)?;
                    encode_i(op.code(), rs, rt_field(rt), simm16(ops.imm(2)?)?)
                },
                Opcode::Andi | Opcode::Ori | Opcode::Xori => {
                    ops.expect_len(3)?;
                    let rt = ops.reg(0)?;
                    let rs = ops.reg(1)?;
                    encode_i(op.code(), rs, rt_field(rt), uimm16(ops.imm(2)?)?)
                },
                Opcode::Lui => {
                    ops.expect_len(2)?;
                    let rt = ops.reg(0)?;
                    encode_i(op.code(), Reg::Zero, rt_field(rt), uimm16(ops.imm(1)?)?)
                },
                Opcode::Lb | Opcode::Lh | Opcode::Lw | Opcode::Lbu | Opcode::Lhu
                | Opcode::Sb | Opcode::Sh | Opcode::Sw => {
                    ops.expect_len(2)?;
                    let rt = ops.reg(0)?;
                    let (offset, base) = ops.indexed(1)?;
                    encode_i(op.code(), base, rt_field(rt), simm16(offset)?)
                },
            };
            Ok(word)
        }
    }
}

/// Encodes an R-type instruction, dispatching on the operand shape of its family.
fn encode_special(funct: Funct, ops: &Operands) -> Result<u32, ParseErr> {
    let word = match funct {
        Funct::Add | Funct::Addu | Funct::Sub | Funct::Subu
        | Funct::And | Funct::Or | Funct::Xor | Funct::Nor
        | Funct::Slt | Funct::Sltu => {
            let [rd, rs, rt] = ops.regs()?;
            encode_r(funct, rs, rt, rd, 0)
        },
        Funct::Sll | Funct::Srl | Funct::Sra => {
            ops.expect_len(3)?;
            let rd = ops.reg(0)?;
            let rt = ops.reg(1)?;
            let shamt = ops.imm(2)?.get_in(0, 31)?;
            encode_r(funct, Reg::Zero, rt, rd, shamt as u32)
        },
        Funct::Sllv | Funct::Srlv | Funct::Srav => {
            let [rd, rt, rs] = ops.regs()?;
            encode_r(funct, rs, rt, rd, 0)
        },
        Funct::Jr | Funct::Mthi | Funct::Mtlo => {
            let [rs] = ops.regs()?;
            encode_r(funct, rs, Reg::Zero, Reg::Zero, 0)
        },
        Funct::Jalr => {
            let (rd, rs) = match ops.len() {
                1 => (Reg::Ra, ops.reg(0)?),
                _ => {
                    let [rd, rs] = ops.regs()?;
                    (rd, rs)
                }
            };
            encode_r(funct, rs, Reg::Zero, rd, 0)
        },
        Funct::Mfhi | Funct::Mflo => {
            let [rd] = ops.regs()?;
            encode_r(funct, Reg::Zero, Reg::Zero, rd, 0)
        },
        Funct::Mult | Funct::Multu | Funct::Div | Funct::Divu => {
            let [rs, rt] = ops.regs()?;
            encode_r(funct, rs, rt, Reg::Zero, 0)
        },
        Funct::Syscall | Funct::Break => {
            ops.expect_len(0)?;
            encode_r(funct, Reg::Zero, Reg::Zero, Reg::Zero, 0)
        },
    };
    Ok(word)
}

/// Computes the 16-bit offset of a branch at `addr`.
///
/// A label resolves to `(target - (addr + 4)) / 4`.
/// An immediate is taken as the word offset itself.
fn branch_offset(target: Target<'_>, addr: u32, sym: &SymbolTable) -> Result<u16, AsmErrKind> {
    let offset = match target {
        Target::Label(label) => {
            let dest = sym.lookup_label(label)
                .ok_or_else(|| AsmErrKind::UndefinedLabel(label.to_string()))?;
            (i64::from(dest) - (i64::from(addr) + 4)) / 4
        },
        Target::Imm(imm) => i64::from(imm.get()),
    };

    i16::try_from(offset)
        .map(|o| o as u16)
        .map_err(|_| AsmErrKind::BranchOutOfRange(offset))
}

/// Computes the byte address of a jump target.
///
/// An immediate is taken as the byte address itself.
fn jump_target(target: Target<'_>, sym: &SymbolTable) -> Result<u32, AsmErrKind> {
    match target {
        Target::Label(label) => sym.lookup_label(label)
            .ok_or_else(|| AsmErrKind::UndefinedLabel(label.to_string())),
        Target::Imm(imm) => Ok(imm.get() as u32),
    }
}

#[cfg(test)]
mod tests {
    use crate::parse::OperandKind;

    use super::encoding::Fields;
    use super::*;

    fn word(line: &str) -> u32 {
        let obj = assemble(line).unwrap();
        assert_eq!(obj.len(), 1, "expected one word from {line:?}");
        obj.words()[0]
    }
    fn err(src: &str) -> AsmErr {
        assemble(src).unwrap_err()
    }

    #[test]
    fn test_known_encodings() {
        assert_eq!(word("add $t0, $t1, $t2"),   0x012A_4020);
        assert_eq!(word("addi $t0, $zero, 5"),  0x2008_0005);
        assert_eq!(word("lw $t0, 4($sp)"),      0x8FA8_0004);
        assert_eq!(word("jr $ra"),              0x03E0_0008);
        assert_eq!(word("sll $t0, $t1, 4"),     0x0009_4100);
        assert_eq!(word("syscall"),             0x0000_000C);
        assert_eq!(word("jalr $t0"),            0x0100_F809);
        assert_eq!(word("jalr $s0, $t0"),       0x0100_8009);
        assert_eq!(word("mfhi $t0"),            0x0000_4010);
        assert_eq!(word("mtlo $t0"),            0x0100_0013);
        assert_eq!(word("lui $t0, 0x1001"),     0x3C08_1001);
        assert_eq!(word("mult $t0, $t1"),       0x0109_0018);
        assert_eq!(word("sllv $t0, $t1, $t2"),  0x0149_4004);
        assert_eq!(word("sw $t0, -4($sp)"),     0xAFA8_FFFC);
        assert_eq!(word("ori $t0, $t0, 0xFFFF"), 0x3508_FFFF);
        assert_eq!(word("ADD $T0, $T1, $T2"),   0x012A_4020);
    }

    #[test]
    fn test_labels_and_jumps() {
        let src = "
            # countdown
            main:
                addi $t0, $zero, 3
            loop: addi $t0, $t0, -1
                bne $t0, $zero, loop
                j main
                jal done
            done:
                bgez $t0, main
        ";
        let obj = assemble(src).unwrap();
        assert_eq!(obj.len(), 6);
        assert_eq!(obj.words()[2], 0x1500_FFFE);
        assert_eq!(obj.words()[3], 0x0810_0000);
        assert_eq!(obj.words()[4], 0x0C10_0005);
        // bgez at 0x400014 back to 0x400000: offset -6
        assert_eq!(obj.words()[5], 0x0501_FFFA);

        let sym = obj.symbol_table();
        assert_eq!(sym.lookup_label("loop"), Some(0x0040_0004));
        assert_eq!(sym.lookup_label("done"), Some(0x0040_0014));
        assert_eq!(sym.rev_lookup_label(0x0040_0000), Some("main"));
        assert_eq!(sym.rev_lookup_label(0x0040_0008), None);
        assert_eq!(sym.lookup_line(5), Some(0x0040_0004));
        assert_eq!(sym.rev_lookup_line(0x0040_0008), Some(6));
        assert_eq!(sym.line_iter().count(), 6);
    }

    #[test]
    fn test_bne_backwards() {
        let obj = assemble("loop: addi $t0, $t0, 1\nbne $t0, $t1, loop").unwrap();
        assert_eq!(obj.words(), &[0x2108_0001, 0x1509_FFFE]);
    }

    #[test]
    fn test_immediate_targets() {
        assert_eq!(word("beq $t0, $t1, 3"), 0x1109_0003);
        assert_eq!(word("blez $t0, -1"), 0x1900_FFFF);
        assert_eq!(word("j 0x00400010"), 0x0810_0004);
    }

    #[test]
    fn test_comments_consume_no_slot() {
        let src = "
            .text
            .globl main
            # nothing here
            main:   # still nothing
                j main      # jump to self
        ";
        let obj = assemble(src).unwrap();
        assert_eq!(obj.words(), &[0x0810_0000]);
    }

    #[test]
    fn test_to_bytes() {
        let obj = assemble("add $t0, $t1, $t2\nsyscall").unwrap();
        assert_eq!(obj.to_bytes(), [0x01, 0x2A, 0x40, 0x20, 0x00, 0x00, 0x00, 0x0C]);

        let mut buf = vec![];
        obj.write_to(&mut buf).unwrap();
        assert_eq!(buf, obj.to_bytes());

        assert!(assemble("# empty").unwrap().is_empty());
    }

    #[test]
    fn test_r_family_fields() {
        let three_reg = [
            Funct::Add, Funct::Addu, Funct::Sub, Funct::Subu, Funct::And,
            Funct::Or, Funct::Xor, Funct::Nor, Funct::Slt, Funct::Sltu,
        ];
        for funct in three_reg {
            let f = Fields::decode(word(&format!("{} $s0, $a1, $t7", funct.mnemonic())));
            assert_eq!(f.mnemonic(), Some(Mnemonic::R(funct)));
            assert_eq!((f.rd, f.rs, f.rt, f.shamt), (16, 5, 15, 0));
        }
    }

    #[test]
    fn test_branch_out_of_range() {
        let mut src = String::from("beq $t0, $t1, far\n");
        for _ in 0..40000 {
            src.push_str("add $t0, $t0, $t0\n");
        }
        src.push_str("far: add $t0, $t0, $t0\n");

        let e = err(&src);
        assert_eq!(e, AsmErr::new(AsmErrKind::BranchOutOfRange(40000), 1));
    }

    #[test]
    fn test_errors_carry_line() {
        let e = err("add $t0, $t1, $t2\n\nj nowhere");
        assert_eq!(e, AsmErr::new(AsmErrKind::UndefinedLabel("nowhere".into()), 3));
        assert_eq!(e.to_string(), "line 3: label `nowhere` was never defined");

        let e = err("x:\nadd $t0, $t1, $t2\nx: syscall");
        assert_eq!(e, AsmErr::new(AsmErrKind::DuplicateLabel("x".into()), 3));

        let e = err("syscall\nfrob $t0");
        assert_eq!(e, AsmErr::new(AsmErrKind::Parse(ParseErr::UnknownMnemonic("frob".into())), 2));

        let e = err("add $t0, $t1");
        assert_eq!(e.kind, AsmErrKind::Parse(ParseErr::WrongOperandCount { expected: 3, found: 2 }));
        assert_eq!(e.line, 1);

        let e = err("syscall $t0");
        assert_eq!(e.kind, AsmErrKind::Parse(ParseErr::WrongOperandCount { expected: 0, found: 1 }));

        let e = err("lw $t0, $sp");
        assert_eq!(e.kind, AsmErrKind::Parse(ParseErr::WrongOperand { index: 1, expected: OperandKind::Indexed }));
    }

    #[test]
    fn test_immediate_ranges() {
        assert!(assemble("addi $t0, $t0, -32768").is_ok());
        assert!(assemble("andi $t0, $t0, 65535").is_ok());
        assert!(assemble("sll $t0, $t0, 31").is_ok());

        for (src, value, min, max) in [
            ("addi $t0, $t0, 32768", 32768, -32768, 32767),
            ("andi $t0, $t0, -1", -1, 0, 65535),
            ("lui $t0, 65536", 65536, 0, 65535),
            ("sll $t0, $t0, 32", 32, 0, 31),
            ("lw $t0, 40000($sp)", 40000, -32768, 32767),
        ] {
            let e = err(src);
            assert_eq!(e.kind, AsmErrKind::Parse(ParseErr::ImmOutOfRange { value, min, max }), "{src}");
            assert!(crate::err::Error::help(&e).is_some());
        }
    }

    #[test]
    fn test_assemble_missing_file() {
        let e = assemble_file(Path::new("/this/path/does/not/exist.s")).unwrap_err();
        assert_eq!(e, AsmErr::new(AsmErrKind::Io(std::io::ErrorKind::NotFound), 0));
    }
}
