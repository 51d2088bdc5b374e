/*!

  Instruction values in their two lifecycles: `RawInstruction` is the wire
  form whose opcode is a numeric id of unknown meaning, and `Instruction` is
  the fully decoded form the machine executes. A `Program` is an immutable
  sequence of decoded instructions plus the optional declaration of which
  register the instruction pointer is bound to.

*/

use std::fmt::{Display, Formatter};

use crate::error::MachineError;
use crate::isa::operation::Opcode;
use crate::registers::Word;

/// A decoded instruction: opcode plus three operand fields. Whether `a` and
/// `b` are register indices or immediates is the opcode's business.
#[derive(Clone, Copy, Eq, PartialEq, Debug, Hash)]
pub struct Instruction {
  pub opcode: Opcode,
  pub a: Word,
  pub b: Word,
  pub out: Word,
}

impl Instruction {
  pub fn new(opcode: Opcode, a: Word, b: Word, out: Word) -> Instruction {
    Instruction { opcode, a, b, out }
  }
}

impl Display for Instruction {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    write!(f, "{} {} {} {}", self.opcode, self.a, self.b, self.out)
  }
}

/// An undecoded instruction as it appears in sample text and raw programs.
#[derive(Clone, Copy, Eq, PartialEq, Debug, Hash)]
pub struct RawInstruction {
  pub opcode: u8,
  pub a: Word,
  pub b: Word,
  pub out: Word,
}

impl RawInstruction {
  pub fn new(opcode: u8, a: Word, b: Word, out: Word) -> RawInstruction {
    RawInstruction { opcode, a, b, out }
  }
}

impl Display for RawInstruction {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    write!(f, "{} {} {} {}", self.opcode, self.a, self.b, self.out)
  }
}

/**
  An ordered instruction sequence, constructed once from parsed input.

  The one sanctioned mutation is `patch`, which replaces a single
  instruction before a run. One known use is overwriting the tail of a
  program so a loop that would otherwise spin for hours halts on a
  deterministic value instead. Execution itself never touches the program.
*/
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct Program {
  instructions: Vec<Instruction>,
  ip_bind: Option<usize>,
}

impl Program {

  pub fn new(instructions: Vec<Instruction>, ip_bind: Option<usize>) -> Program {
    Program { instructions, ip_bind }
  }

  pub fn len(&self) -> usize {
    self.instructions.len()
  }

  pub fn is_empty(&self) -> bool {
    self.instructions.is_empty()
  }

  pub fn get(&self, index: usize) -> Option<&Instruction> {
    self.instructions.get(index)
  }

  /// The register index the instruction pointer is bound to, if the program
  /// declared one with an `#ip` header.
  pub fn ip_bind(&self) -> Option<usize> {
    self.ip_bind
  }

  /// Replaces the instruction at `index`. Pre-run only; the machine never
  /// calls this.
  pub fn patch(&mut self, index: usize, instruction: Instruction)
    -> Result<(), MachineError>
  {
    let len = self.instructions.len();
    match self.instructions.get_mut(index) {

      Some(slot) => {
        *slot = instruction;
        Ok(())
      }

      None => {
        Err(MachineError::PatchOutOfRange { index, len })
      }

    }
  }

}

impl Display for Program {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    if let Some(bind) = self.ip_bind {
      writeln!(f, "#ip {}", bind)?;
    }
    for instruction in self.instructions.iter() {
      writeln!(f, "{}", instruction)?;
    }
    Ok(())
  }
}
