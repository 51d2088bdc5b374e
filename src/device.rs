/*!

  Structures and functions for the register machine itself: a fixed-width
  register file, an instruction pointer, and optionally a binding of the
  pointer to one register slot.

  The fetch–decode–execute cycle for one step is:

    1. If a binding is set, write the current pointer into the bound
       register, so the instruction about to execute sees the fresh value.
    2. Execute the instruction, which writes exactly one register.
    3. If a binding is set, read the bound register back into the pointer.
    4. Increment the pointer.

  Step 3 is the machine's entire control-flow story: a "jump" is an
  instruction that happens to write the bound register. Execution halts
  when the pointer leaves `[0, program.len())`.

  The machine never terminates a non-halting program on its own. Callers
  that need a step budget or cycle detection drive `step` themselves and
  observe register state in between; `run_with_watch` additionally offers a
  read-only callback before every step for observation at known pointer
  values.

*/

use std::fmt::{Display, Formatter};

use prettytable::{format as TableFormat, Table};

use crate::error::MachineError;
use crate::isa::{Instruction, Program};
use crate::registers::{Registers, Word};

pub struct Device {
  ip      : Word,           // Instruction pointer, a cursor into the program
  ip_bind : Option<usize>,  // Register slot aliased to the pointer, if any
  regs    : Registers,      // The register file
}

impl Device {

  // region Construction and register access

  /// A machine with no pointer binding; the pointer just walks the program.
  pub fn new(width: usize) -> Device {
    Device {
      ip      : 0,
      ip_bind : None,
      regs    : Registers::new(width)
    }
  }

  /// A machine whose pointer is aliased to register `bind`.
  pub fn with_ip_bind(width: usize, bind: usize) -> Result<Device, MachineError> {
    if bind >= width {
      return Err(
        MachineError::InvalidRegisterIndex { index: bind as Word, width }
      );
    }
    Ok(
      Device {
        ip      : 0,
        ip_bind : Some(bind),
        regs    : Registers::new(width)
      }
    )
  }

  /// A machine configured from a program's own `#ip` declaration.
  pub fn for_program(program: &Program, width: usize) -> Result<Device, MachineError> {
    match program.ip_bind() {
      Some(bind) => Device::with_ip_bind(width, bind),
      None       => Ok(Device::new(width))
    }
  }

  pub fn ip(&self) -> Word {
    self.ip
  }

  pub fn registers(&self) -> &Registers {
    &self.regs
  }

  /// Seeds a single register before a run.
  pub fn set_register(&mut self, index: usize, value: Word) -> Result<(), MachineError> {
    self.regs.set(index, value)
  }

  /// Overwrites the whole register file in place.
  pub fn load_registers(&mut self, values: &[Word]) {
    self.regs.load(values);
  }

  /// Zeroes the file and rewinds the pointer. The binding is construction
  /// state and survives a reset.
  pub fn reset(&mut self) {
    let width = self.regs.width();
    self.regs = Registers::new(width);
    self.ip = 0;
  }

  // endregion

  // region Execution

  /**
    Executes one instruction, mutating the register file and the pointer.
    Returns the new pointer value so callers driving the machine manually
    can tell whether it still addresses their program.
  */
  pub fn step(&mut self, instruction: &Instruction) -> Result<Word, MachineError> {
    if let Some(bind) = self.ip_bind {
      self.regs.set(bind, self.ip)?;
    }

    instruction.opcode.apply(
      instruction.a,
      instruction.b,
      instruction.out,
      &mut self.regs
    )?;

    if let Some(bind) = self.ip_bind {
      self.ip = self.regs.get(bind)?;
    }
    self.ip += 1;
    Ok(self.ip)
  }

  /// Runs until the pointer leaves the program, returning the final
  /// register file.
  pub fn run(&mut self, program: &Program) -> Result<&Registers, MachineError> {
    self.run_with_watch(program, |_ip, _regs| {})
  }

  /**
    Like `run`, but invokes `watch` with the pointer and a register
    snapshot before executing each instruction. The callback cannot touch
    machine state; it exists so callers can observe the file at specific
    pointer values without the machine growing a termination policy.
  */
  pub fn run_with_watch<W>(&mut self, program: &Program, mut watch: W)
    -> Result<&Registers, MachineError>
    where W: FnMut(Word, &Registers)
  {
    while let Some(instruction) = self.fetch(program) {
      watch(self.ip, &self.regs);

      #[cfg(feature = "trace_execution")]
        {
          println!("{} executing: {}", self.ip, instruction);
          println!("{}", self);
        }

      self.step(instruction)?;
    }
    Ok(&self.regs)
  }

  fn fetch<'p>(&self, program: &'p Program) -> Option<&'p Instruction> {
    if self.ip < 0 {
      return None;
    }
    program.get(self.ip as usize)
  }

  // endregion

}


lazy_static! {
  static ref TABLE_DISPLAY_FORMAT: TableFormat::TableFormat =
    TableFormat::FormatBuilder::new()
      .column_separator('│')
      .borders(' ')
      .separator(
        TableFormat::LinePosition::Title,
        TableFormat::LineSeparator::new('─', '┼', ' ', ' ')
      )
      .separator(
        TableFormat::LinePosition::Bottom,
        TableFormat::LineSeparator::new('─', '┴', ' ', ' ')
      )
      .padding(1, 1)
      .build();
}

impl Display for Device {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    let mut table = Table::new();

    table.set_format(*TABLE_DISPLAY_FORMAT);
    table.set_titles(row![ubr->"Register", ubl->"Contents"]);

    for (i, value) in self.regs.as_slice().iter().enumerate() {
      match self.ip_bind == Some(i) {

        true  => {
          table.add_row(
            row![r->format!("ip --> r[{}] =", i), format!("{}", value)]
          );
        }

        false => {
          table.add_row(
            row![r->format!("r[{}] =", i), format!("{}", value)]
          );
        }

      } // end match on binding
    } // end for

    write!(f, "ip = {}\n{}", self.ip, table)
  }
}
