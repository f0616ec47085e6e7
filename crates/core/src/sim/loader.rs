//! Program loading and validation.
//!
//! The loader owns all syntactic checking, so the pipeline only ever sees
//! well-formed instructions. Two input formats are accepted:
//!
//! 1. **Assembly text** — one instruction per line, `#` or `//` comments:
//!    ```text
//!    ADD  R1, R2, R3
//!    ADDI R1, R2, 6
//!    NEG  R1, R2
//!    LOAD R4, 3(R2)
//!    STORE R5, 0(R2)      # value register first, then offset(base)
//!    BNE  R2, R3, -2
//!    JAL  4
//!    RET
//!    ```
//! 2. **JSON records** — an array of `{"op", "rd", "rs1", "rs2", "imm"}`
//!    objects with absent fields omitted or null.
//!
//! Every diagnostic carries the source line (assembly) or 1-based record
//! position (JSON).

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::common::error::ProgramError;
use crate::common::reg::Reg;
use crate::isa::instruction::{Instruction, Opcode};

/// Loads a program file, picking the format from the extension: `.json`
/// parses as records, anything else as assembly text.
pub fn load_program(path: &Path) -> Result<Vec<Instruction>, ProgramError> {
    let text = fs::read_to_string(path)?;
    if path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("json")) {
        parse_json(&text)
    } else {
        parse_asm(&text)
    }
}

/// Parses an assembly-text program.
pub fn parse_asm(text: &str) -> Result<Vec<Instruction>, ProgramError> {
    let mut program = Vec::new();
    for (index, raw) in text.lines().enumerate() {
        let line = index + 1;
        let code = strip_comment(raw).trim();
        if code.is_empty() {
            continue;
        }
        program.push(parse_line(code, line)?);
    }
    Ok(program)
}

/// Parses a JSON-record program.
pub fn parse_json(text: &str) -> Result<Vec<Instruction>, ProgramError> {
    let records: Vec<RawRecord> = serde_json::from_str(text)?;
    records
        .iter()
        .enumerate()
        .map(|(index, record)| record.validate(index + 1))
        .collect()
}

fn strip_comment(line: &str) -> &str {
    let end = line.find('#').unwrap_or(line.len());
    let end = line.find("//").unwrap_or(end).min(end);
    &line[..end]
}

fn parse_line(code: &str, line: usize) -> Result<Instruction, ProgramError> {
    let (mnemonic, rest) = code
        .split_once(char::is_whitespace)
        .unwrap_or((code, ""));
    let op = Opcode::parse(mnemonic).ok_or_else(|| ProgramError::UnknownOpcode {
        line,
        text: mnemonic.to_string(),
    })?;
    let operands: Vec<&str> = rest
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();

    let mismatch = || ProgramError::OperandMismatch { line, op, expected: op.shape() };

    let (rd, rs1, rs2, imm) = match op {
        Opcode::Add | Opcode::Nand | Opcode::Sll => {
            let [rd, rs1, rs2] = operands[..] else { return Err(mismatch()) };
            (
                Some(parse_reg(rd, line)?),
                Some(parse_reg(rs1, line)?),
                Some(parse_reg(rs2, line)?),
                None,
            )
        }
        Opcode::Addi => {
            let [rd, rs1, imm] = operands[..] else { return Err(mismatch()) };
            (
                Some(parse_reg(rd, line)?),
                Some(parse_reg(rs1, line)?),
                None,
                Some(parse_imm(imm, line)?),
            )
        }
        Opcode::Neg => {
            let [rd, rs1] = operands[..] else { return Err(mismatch()) };
            (
                Some(parse_reg(rd, line)?),
                Some(parse_reg(rs1, line)?),
                None,
                None,
            )
        }
        Opcode::Load => {
            let [rd, mem] = operands[..] else { return Err(mismatch()) };
            let (imm, base) = parse_mem_operand(mem, line)?;
            (Some(parse_reg(rd, line)?), Some(base), None, Some(imm))
        }
        Opcode::Store => {
            let [value, mem] = operands[..] else { return Err(mismatch()) };
            let (imm, base) = parse_mem_operand(mem, line)?;
            (None, Some(base), Some(parse_reg(value, line)?), Some(imm))
        }
        Opcode::Bne => {
            let [rs1, rs2, imm] = operands[..] else { return Err(mismatch()) };
            (
                None,
                Some(parse_reg(rs1, line)?),
                Some(parse_reg(rs2, line)?),
                Some(parse_imm(imm, line)?),
            )
        }
        Opcode::Jal => {
            let [imm] = operands[..] else { return Err(mismatch()) };
            (None, None, None, Some(parse_imm(imm, line)?))
        }
        Opcode::Ret => {
            if !operands.is_empty() {
                return Err(mismatch());
            }
            (None, None, None, None)
        }
    };

    Instruction::checked(op, rd, rs1, rs2, imm)
        .map_err(|expected| ProgramError::OperandMismatch { line, op, expected })
}

fn parse_reg(text: &str, line: usize) -> Result<Reg, ProgramError> {
    text.parse().map_err(|()| ProgramError::InvalidRegister {
        line,
        text: text.to_string(),
    })
}

fn parse_imm(text: &str, line: usize) -> Result<i64, ProgramError> {
    let digits = text.strip_prefix('+').unwrap_or(text);
    digits.parse().map_err(|_| ProgramError::InvalidImmediate {
        line,
        text: text.to_string(),
    })
}

/// Splits an `offset(base)` memory operand.
fn parse_mem_operand(text: &str, line: usize) -> Result<(i64, Reg), ProgramError> {
    let bad = || ProgramError::InvalidImmediate { line, text: text.to_string() };
    let (offset, rest) = text.split_once('(').ok_or_else(bad)?;
    let base = rest.strip_suffix(')').ok_or_else(bad)?;
    Ok((parse_imm(offset.trim(), line)?, parse_reg(base.trim(), line)?))
}

/// The unvalidated shape of one JSON program record, matching the classic
/// `{"op": "ADD", "rd": "R1", "rs1": "R2", "rs2": "R3"}` dictionaries.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawRecord {
    op: String,
    #[serde(default)]
    rd: Option<String>,
    #[serde(default)]
    rs1: Option<String>,
    #[serde(default)]
    rs2: Option<String>,
    #[serde(default)]
    imm: Option<i64>,
}

impl RawRecord {
    fn validate(&self, line: usize) -> Result<Instruction, ProgramError> {
        let op = Opcode::parse(&self.op).ok_or_else(|| ProgramError::UnknownOpcode {
            line,
            text: self.op.clone(),
        })?;
        let reg = |field: &Option<String>| -> Result<Option<Reg>, ProgramError> {
            field
                .as_deref()
                .map(|text| parse_reg(text, line))
                .transpose()
        };
        Instruction::checked(op, reg(&self.rd)?, reg(&self.rs1)?, reg(&self.rs2)?, self.imm)
            .map_err(|expected| ProgramError::OperandMismatch { line, op, expected })
    }
}
