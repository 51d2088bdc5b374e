/*!

  A fixed-width file of integer registers. The width is a construction-time
  parameter because the two contexts that use the machine never share one:
  opcode inference works over 4-register snapshots, while ip-bound execution
  uses a 6-register file.

*/

use std::fmt::{Display, Formatter};

use crate::error::MachineError;

/// The machine word. Register values stay non-negative in practice and fit
/// well inside 53 bits; a signed 64-bit word gives headroom and lets the
/// instruction pointer share the type.
pub type Word = i64;

/// Register file width used by the opcode-inference samples.
pub const SAMPLE_WIDTH: usize = 4;
/// Register file width used when a register is bound to the instruction pointer.
pub const BOUND_WIDTH: usize = 6;

#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub struct Registers {
  cells: Vec<Word>
}

impl Registers {

  /// A zeroed register file of the given width.
  pub fn new(width: usize) -> Registers {
    Registers {
      cells: vec![0; width]
    }
  }

  pub fn width(&self) -> usize {
    self.cells.len()
  }

  /// Bounds-checked read. Out-of-range indices are surfaced, never clamped.
  pub fn get(&self, index: usize) -> Result<Word, MachineError> {
    self.cells
        .get(index)
        .copied()
        .ok_or(
          MachineError::InvalidRegisterIndex {
            index: index as Word,
            width: self.cells.len()
          }
        )
  }

  /// Bounds-checked write.
  pub fn set(&mut self, index: usize, value: Word) -> Result<(), MachineError> {
    let width = self.cells.len();
    match self.cells.get_mut(index) {

      Some(cell) => {
        *cell = value;
        Ok(())
      }

      None => {
        Err(MachineError::InvalidRegisterIndex { index: index as Word, width })
      }

    }
  }

  /**
    Overwrites the entire file from a slice, resizing to the slice's width.

    The resolver reloads one scratch file between candidate trials with this
    rather than allocating a fresh file per trial. No residual state survives
    the reload.
  */
  pub fn load(&mut self, values: &[Word]) {
    self.cells.clear();
    self.cells.extend_from_slice(values);
  }

  pub fn as_slice(&self) -> &[Word] {
    &self.cells
  }

}

impl From<&[Word]> for Registers {
  fn from(values: &[Word]) -> Registers {
    Registers {
      cells: values.to_vec()
    }
  }
}

impl From<Vec<Word>> for Registers {
  fn from(cells: Vec<Word>) -> Registers {
    Registers { cells }
  }
}

impl Display for Registers {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    let values =
      self.cells
          .iter()
          .map(Word::to_string)
          .collect::<Vec<String>>()
          .join(", ");
    write!(f, "[{}]", values)
  }
}


#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn new_file_is_zeroed() {
    let regs = Registers::new(BOUND_WIDTH);
    assert_eq!(regs.width(), 6);
    assert_eq!(regs.as_slice(), &[0, 0, 0, 0, 0, 0]);
  }

  #[test]
  fn get_and_set_are_bounds_checked() {
    let mut regs = Registers::new(SAMPLE_WIDTH);
    regs.set(2, 41).unwrap();
    assert_eq!(regs.get(2), Ok(41));
    assert_eq!(
      regs.get(4),
      Err(MachineError::InvalidRegisterIndex { index: 4, width: 4 })
    );
    assert_eq!(
      regs.set(7, 1),
      Err(MachineError::InvalidRegisterIndex { index: 7, width: 4 })
    );
  }

  #[test]
  fn load_overwrites_every_cell() {
    let mut regs = Registers::from(vec![9, 9, 9, 9]);
    regs.load(&[3, 2, 1, 1]);
    assert_eq!(regs.as_slice(), &[3, 2, 1, 1]);
  }

  #[test]
  fn display_matches_snapshot_notation() {
    let regs = Registers::from(vec![3, 2, 2, 1]);
    assert_eq!(format!("{}", regs), "[3, 2, 2, 1]");
  }
}
