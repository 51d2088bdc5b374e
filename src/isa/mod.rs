/*!

  The instruction set: fixed 4-field instructions (opcode + 3 operands)
  over a small register file. There is no branch instruction class; the
  only jump the machine knows is writing to the register bound to the
  instruction pointer. Operands are registers or immediates depending on
  the opcode's addressing mode, and every instruction writes exactly one
  register.

  Submodules: `operation` holds the closed opcode enum and its semantics,
  `instruction` the decoded/raw instruction values and `Program`, and
  `assembly` the text formats callers feed in.

*/

mod assembly;
mod instruction;
mod operation;

pub use assembly::{
  parse_observations,
  parse_program,
  parse_raw_program,
  parse_samples
};
pub use instruction::{Instruction, Program, RawInstruction};
pub use operation::{MnemonicList, Opcode, OPERATION_COUNT};
