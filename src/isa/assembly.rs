/*!

  The human readable text forms the machine's callers supply. This module
  leverages the `strum` derives of `Opcode` to deserialize mnemonics, and
  `nom` for the line shapes. Three formats:

    * Program text: an optional `#ip <N>` header naming the register bound
      to the instruction pointer, then one `mnemonic a b out` line per
      instruction.
    * Raw program text: the same, except the first field is a numeric
      opcode id whose meaning has not been resolved yet.
    * Sample text: three-line groups of the form

        Before: [3, 2, 1, 1]
        9 2 1 2
        After:  [3, 2, 2, 1]

      separated by blank lines, optionally followed by a raw program
      (observation dumps carry both sections in one file).

  Shape errors are reported with the 1-based line number they occur on. A
  well-shaped instruction line whose mnemonic names none of the sixteen
  operations is an `UnknownOperation`, not a malformed line.

*/

use std::str::FromStr;

use nom::{
  IResult,
  bytes::complete::tag,
  character::complete::{
    alpha1,
    char as one_char,
    digit1,
    space0,
    space1
  },
  combinator::{all_consuming, map, map_res, opt, recognize},
  multi::separated_list,
  sequence::{delimited, pair, preceded, terminated, tuple},
};

use crate::error::MachineError;
use crate::isa::instruction::{Instruction, Program, RawInstruction};
use crate::isa::operation::Opcode;
use crate::registers::{Registers, Word};
use crate::resolver::Sample;

// region Line parsers

fn word_p(input: &str) -> IResult<&str, Word> {
  map_res(
    recognize(pair(opt(one_char('-')), digit1)),
    |text: &str| text.parse::<Word>()
  )(input)
}

/// The four-field shape shared by named and raw instruction lines, with the
/// mnemonic left unresolved.
fn shape_p(input: &str) -> IResult<&str, (&str, Word, Word, Word)> {
  tuple((
    alpha1,
    preceded(space1, word_p),
    preceded(space1, word_p),
    preceded(space1, word_p),
  ))(input)
}

fn raw_instruction_p(input: &str) -> IResult<&str, RawInstruction> {
  map(
    tuple((
      map_res(digit1, str::parse::<u8>),
      preceded(space1, word_p),
      preceded(space1, word_p),
      preceded(space1, word_p),
    )),
    |(opcode, a, b, out)| RawInstruction::new(opcode, a, b, out)
  )(input)
}

fn ip_bind_p(input: &str) -> IResult<&str, usize> {
  preceded(
    pair(tag("#ip"), space1),
    map_res(digit1, str::parse::<usize>)
  )(input)
}

/// `[3, 2, 1, 1]`
fn register_list_p(input: &str) -> IResult<&str, Vec<Word>> {
  delimited(
    one_char('['),
    separated_list(delimited(space0, one_char(','), space0), word_p),
    one_char(']')
  )(input)
}

fn snapshot_p<'a>(input: &'a str, label: &str) -> IResult<&'a str, Vec<Word>> {
  preceded(pair(tag(label), space0), register_list_p)(input)
}

// endregion

// region Public parsing surface

/// Parses named-instruction program text into an executable `Program`.
pub fn parse_program(text: &str) -> Result<Program, MachineError> {
  let mut ip_bind = None;
  let mut instructions = Vec::new();

  for (number, line) in text.lines().enumerate() {
    let line_no = number + 1;
    let trimmed = line.trim();
    if trimmed.is_empty() {
      continue;
    }

    if trimmed.starts_with("#ip") {
      match all_consuming(terminated(ip_bind_p, space0))(trimmed) {
        Ok((_rest, bind)) => {
          ip_bind = Some(bind);
        }
        Err(_) => {
          return Err(
            MachineError::MalformedInstruction { line: line_no, text: trimmed.to_string() }
          );
        }
      }
      continue;
    }

    instructions.push(parse_instruction_line(trimmed, line_no)?);
  }

  Ok(Program::new(instructions, ip_bind))
}

fn parse_instruction_line(line: &str, line_no: usize) -> Result<Instruction, MachineError> {
  let (name, a, b, out) =
    match all_consuming(terminated(shape_p, space0))(line) {
      Ok((_rest, shape)) => shape,
      Err(_) => {
        return Err(
          MachineError::MalformedInstruction { line: line_no, text: line.to_string() }
        );
      }
    };

  match Opcode::from_str(name) {
    Ok(opcode) => Ok(Instruction::new(opcode, a, b, out)),
    Err(_)     => Err(MachineError::UnknownOperation(name.to_string()))
  }
}

/// Parses numeric-opcode program text. No `#ip` header: raw programs come
/// from the inference context, which never binds the pointer.
pub fn parse_raw_program(text: &str) -> Result<Vec<RawInstruction>, MachineError> {
  let mut instructions = Vec::new();

  for (number, line) in text.lines().enumerate() {
    let line_no = number + 1;
    let trimmed = line.trim();
    if trimmed.is_empty() {
      continue;
    }
    instructions.push(parse_raw_line(trimmed, line_no)?);
  }

  Ok(instructions)
}

fn parse_raw_line(line: &str, line_no: usize) -> Result<RawInstruction, MachineError> {
  match all_consuming(terminated(raw_instruction_p, space0))(line) {
    Ok((_rest, instruction)) => Ok(instruction),
    Err(_) => {
      Err(MachineError::MalformedInstruction { line: line_no, text: line.to_string() })
    }
  }
}

/**
  Parses an observation dump: a run of three-line sample groups, then
  (optionally) a raw numeric program. The program section starts at the
  first non-blank line that is not a `Before:` header.
*/
pub fn parse_observations(text: &str)
  -> Result<(Vec<Sample>, Vec<RawInstruction>), MachineError>
{
  let mut samples = Vec::new();
  let mut tail = Vec::new();
  let mut lines = text.lines().enumerate();

  while let Some((number, line)) = lines.next() {
    let line_no = number + 1;
    let trimmed = line.trim();
    if trimmed.is_empty() {
      continue;
    }

    if !trimmed.starts_with("Before:") {
      // Raw program section.
      tail.push(parse_raw_line(trimmed, line_no)?);
      continue;
    }

    let before = parse_snapshot_line(trimmed, "Before:", line_no)?;

    let (instr_number, instr_line) =
      lines.next().ok_or_else(|| missing(line_no, "instruction line"))?;
    let instruction = parse_raw_line(instr_line.trim(), instr_number + 1)
      .map_err(|_| {
        MachineError::MalformedSample {
          line: instr_number + 1,
          reason: format!("expected a four-integer instruction, found `{}`", instr_line.trim())
        }
      })?;

    let (after_number, after_line) =
      lines.next().ok_or_else(|| missing(line_no, "`After:` line"))?;
    let after = parse_snapshot_line(after_line.trim(), "After:", after_number + 1)?;

    if before.len() != after.len() {
      return Err(
        MachineError::MalformedSample {
          line: line_no,
          reason: format!(
            "before snapshot has {} registers but after has {}",
            before.len(),
            after.len()
          )
        }
      );
    }

    samples.push(
      Sample::new(Registers::from(before), instruction, Registers::from(after))
    );
  }

  Ok((samples, tail))
}

/// Parses sample text that must consist of sample groups only.
pub fn parse_samples(text: &str) -> Result<Vec<Sample>, MachineError> {
  let (samples, tail) = parse_observations(text)?;
  if !tail.is_empty() {
    return Err(
      MachineError::MalformedSample {
        line: 0,
        reason: format!("{} instruction lines outside any sample group", tail.len())
      }
    );
  }
  Ok(samples)
}

fn parse_snapshot_line(line: &str, label: &str, line_no: usize)
  -> Result<Vec<Word>, MachineError>
{
  match all_consuming(terminated(|input| snapshot_p(input, label), space0))(line) {
    Ok((_rest, cells)) => Ok(cells),
    Err(_) => {
      Err(
        MachineError::MalformedSample {
          line: line_no,
          reason: format!("expected `{} [r0, r1, ...]`, found `{}`", label, line)
        }
      )
    }
  }
}

fn missing(line_no: usize, what: &str) -> MachineError {
  MachineError::MalformedSample {
    line: line_no,
    reason: format!("sample group is missing its {}", what)
  }
}

// endregion
