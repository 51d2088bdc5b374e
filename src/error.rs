/*!

  Error kinds for the machine and the opcode resolver. All of them are fatal
  to the operation that produced them and propagate synchronously; there is
  no internal recovery and no partial result.

*/

use thiserror::Error;

use crate::registers::Word;

#[derive(Debug, Error, Clone, Eq, PartialEq)]
pub enum MachineError {

  /// An operand or output index falls outside the register file.
  #[error("register index {index} is out of range for a {width}-register file")]
  InvalidRegisterIndex {
    index: Word,
    width: usize
  },

  /// A mnemonic, or a numeric opcode id with no resolved mapping, that
  /// names none of the sixteen operations.
  #[error("unknown operation `{0}`")]
  UnknownOperation(String),

  /// Constraint propagation reached a state where no opcode id has exactly
  /// one remaining candidate. Retrying the same deterministic computation
  /// cannot change the outcome, so the caller must treat the input as
  /// deficient.
  #[error("opcode mapping is ambiguous: {unresolved} ids retain multiple candidates")]
  AmbiguousMapping {
    unresolved: usize
  },

  /// A program line that does not have the `mnemonic a b out` shape.
  #[error("line {line}: malformed instruction `{text}`")]
  MalformedInstruction {
    line: usize,
    text: String
  },

  /// A sample group missing a line, or with before/after snapshots of
  /// different widths.
  #[error("sample at line {line} is malformed: {reason}")]
  MalformedSample {
    line: usize,
    reason: String
  },

  /// A pre-run patch addressed an instruction the program does not have.
  #[error("cannot patch instruction {index} of a {len}-instruction program")]
  PatchOutOfRange {
    index: usize,
    len: usize
  },

}
