/*!

  The sixteen elementary operations of the machine.

  The operation set is a closed enum rather than a string-keyed method table:
  dispatch is an exhaustive `match`, so a missing operation is a compile
  error instead of a runtime lookup failure. Each mnemonic encodes its
  addressing mode in the final letter(s): `r` reads a register, `i` takes
  the operand as an immediate. Every operation reads zero, one, or two
  registers, writes exactly one, and is total for in-range indices.

*/

use std::fmt::{Display, Formatter};

use num_enum::{IntoPrimitive, TryFromPrimitive};
use strum_macros::{Display as StrumDisplay, EnumIter, EnumString, IntoStaticStr};

use crate::error::MachineError;
use crate::registers::{Registers, Word};

/// How many operations the machine has, which is also how many numeric
/// opcode ids a raw program can use.
pub const OPERATION_COUNT: usize = 16;

/**
  Opcodes of the machine.

  The `u8` discriminant is an internal ordering only. The numeric ids that
  appear in raw programs are device-specific and unrelated to declaration
  order; recovering that correspondence is the resolver's job.
*/
#[derive(
  StrumDisplay, EnumString, EnumIter, IntoStaticStr, TryFromPrimitive, IntoPrimitive,
  Clone,        Copy,       Eq,       PartialEq,     Debug,            Hash
)]
#[repr(u8)]
#[strum(serialize_all = "lowercase")]
pub enum Opcode {
  // Arithmetic
  Addr,   // out = reg[a] + reg[b]
  Addi,   // out = reg[a] + b
  Mulr,   // out = reg[a] * reg[b]
  Muli,   // out = reg[a] * b

  // Bitwise
  Banr,   // out = reg[a] & reg[b]
  Bani,   // out = reg[a] & b
  Borr,   // out = reg[a] | reg[b]
  Bori,   // out = reg[a] | b

  // Assignment (operand b unused)
  Setr,   // out = reg[a]
  Seti,   // out = a

  // Greater-than comparison
  Gtir,   // out = (a > reg[b]) as Word
  Gtri,   // out = (reg[a] > b) as Word
  Gtrr,   // out = (reg[a] > reg[b]) as Word

  // Equality comparison
  Eqir,   // out = (a == reg[b]) as Word
  Eqri,   // out = (reg[a] == b) as Word
  Eqrr,   // out = (reg[a] == reg[b]) as Word
}

impl Opcode {

  /// The lowercase mnemonic, as it appears in program text.
  pub fn mnemonic(&self) -> &'static str {
    self.into()
  }

  /**
    Executes the operation against a register file, writing exactly one
    register. Operands are interpreted per the opcode's addressing mode; a
    register-mode operand outside the file propagates
    `InvalidRegisterIndex` immediately.
  */
  pub fn apply(&self, a: Word, b: Word, out: Word, regs: &mut Registers)
    -> Result<(), MachineError>
  {
    let value =
      match self {
        Opcode::Addr => read(regs, a)? + read(regs, b)?,
        Opcode::Addi => read(regs, a)? + b,
        Opcode::Mulr => read(regs, a)? * read(regs, b)?,
        Opcode::Muli => read(regs, a)? * b,
        Opcode::Banr => read(regs, a)? & read(regs, b)?,
        Opcode::Bani => read(regs, a)? & b,
        Opcode::Borr => read(regs, a)? | read(regs, b)?,
        Opcode::Bori => read(regs, a)? | b,
        Opcode::Setr => read(regs, a)?,
        Opcode::Seti => a,
        Opcode::Gtir => (a > read(regs, b)?) as Word,
        Opcode::Gtri => (read(regs, a)? > b) as Word,
        Opcode::Gtrr => (read(regs, a)? > read(regs, b)?) as Word,
        Opcode::Eqir => (a == read(regs, b)?) as Word,
        Opcode::Eqri => (read(regs, a)? == b) as Word,
        Opcode::Eqrr => (read(regs, a)? == read(regs, b)?) as Word,
      };
    write(regs, out, value)
  }

}

/// Reads the register a register-mode operand names.
fn read(regs: &Registers, operand: Word) -> Result<Word, MachineError> {
  if operand < 0 {
    return Err(
      MachineError::InvalidRegisterIndex { index: operand, width: regs.width() }
    );
  }
  regs.get(operand as usize)
}

/// Writes the single output register.
fn write(regs: &mut Registers, operand: Word, value: Word) -> Result<(), MachineError> {
  if operand < 0 {
    return Err(
      MachineError::InvalidRegisterIndex { index: operand, width: regs.width() }
    );
  }
  regs.set(operand as usize, value)
}

/// Wrapper so `{}` on an opcode sequence prints mnemonics.
pub struct MnemonicList<'a>(pub &'a [Opcode]);

impl<'a> Display for MnemonicList<'a> {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    let names =
      self.0
          .iter()
          .map(|opcode| opcode.mnemonic())
          .collect::<Vec<&str>>()
          .join(", ");
    write!(f, "{}", names)
  }
}


#[cfg(test)]
mod tests {
  use std::convert::TryFrom;
  use std::str::FromStr;

  use strum::IntoEnumIterator;

  use super::*;

  fn applied(opcode: Opcode, a: Word, b: Word, out: Word, before: &[Word]) -> Vec<Word> {
    let mut regs = Registers::from(before);
    opcode.apply(a, b, out, &mut regs).unwrap();
    regs.as_slice().to_vec()
  }

  #[test]
  fn operation_semantics() {
    // (opcode, a, b, expected value of reg 3) against [3, 4, 2, 1].
    let before = [3, 4, 2, 1];
    let cases = [
      (Opcode::Addr, 0, 1, 7),
      (Opcode::Addi, 0, 7, 10),
      (Opcode::Mulr, 0, 1, 12),
      (Opcode::Muli, 0, 5, 15),
      (Opcode::Banr, 0, 1, 0),
      (Opcode::Bani, 0, 2, 2),
      (Opcode::Borr, 0, 1, 7),
      (Opcode::Bori, 0, 8, 11),
      (Opcode::Setr, 1, 99, 4),
      (Opcode::Seti, 9, 99, 9),
      (Opcode::Gtir, 5, 1, 1),
      (Opcode::Gtri, 0, 3, 0),
      (Opcode::Gtrr, 1, 0, 1),
      (Opcode::Eqir, 4, 1, 1),
      (Opcode::Eqri, 2, 3, 0),
      (Opcode::Eqrr, 0, 2, 0),
    ];
    for (opcode, a, b, expected) in cases.iter() {
      let after = applied(*opcode, *a, *b, 3, &before);
      assert_eq!(
        after,
        vec![3, 4, 2, *expected],
        "{} {} {} 3", opcode, a, b
      );
      // Only the output register changes.
      assert_eq!(&after[..3], &before[..3]);
    }
  }

  #[test]
  fn addr_example() {
    assert_eq!(applied(Opcode::Addr, 0, 1, 2, &[3, 4, 0, 0]), vec![3, 4, 7, 0]);
  }

  #[test]
  fn register_operand_out_of_range_is_fatal() {
    let mut regs = Registers::from(vec![1, 2, 3, 4]);
    assert_eq!(
      Opcode::Addr.apply(0, 9, 2, &mut regs),
      Err(MachineError::InvalidRegisterIndex { index: 9, width: 4 })
    );
    assert_eq!(
      Opcode::Seti.apply(5, 0, -1, &mut regs),
      Err(MachineError::InvalidRegisterIndex { index: -1, width: 4 })
    );
    // The failed applications left the file untouched.
    assert_eq!(regs.as_slice(), &[1, 2, 3, 4]);
  }

  #[test]
  fn mnemonics_round_trip() {
    for opcode in Opcode::iter() {
      assert_eq!(Opcode::from_str(opcode.mnemonic()), Ok(opcode));
      assert_eq!(format!("{}", opcode), opcode.mnemonic());
    }
    assert_eq!(Opcode::from_str("addr"), Ok(Opcode::Addr));
    assert_eq!(Opcode::from_str("eqrr"), Ok(Opcode::Eqrr));
    assert!(Opcode::from_str("jump").is_err());
  }

  #[test]
  fn sixteen_operations_with_stable_discriminants() {
    assert_eq!(Opcode::iter().count(), OPERATION_COUNT);
    for (expected, opcode) in Opcode::iter().enumerate() {
      assert_eq!(u8::from(opcode) as usize, expected);
      assert_eq!(Opcode::try_from(expected as u8), Ok(opcode));
    }
    assert!(Opcode::try_from(16u8).is_err());
  }
}

#[cfg(test)]
mod proptests {
  use proptest::prelude::*;
  use strum::IntoEnumIterator;

  use super::*;

  const COMPARISONS: [Opcode; 6] = [
    Opcode::Gtir, Opcode::Gtri, Opcode::Gtrr,
    Opcode::Eqir, Opcode::Eqri, Opcode::Eqrr,
  ];

  proptest! {

    #[test]
    fn applying_twice_is_deterministic(
      cells in prop::collection::vec(0i64..1_000_000, 4),
      a in 0i64..4,
      b in 0i64..4,
      out in 0i64..4
    ) {
      for opcode in Opcode::iter() {
        let mut first = Registers::from(cells.clone());
        let mut second = Registers::from(cells.clone());
        opcode.apply(a, b, out, &mut first).unwrap();
        opcode.apply(a, b, out, &mut second).unwrap();
        prop_assert_eq!(first, second);
      }
    }

    #[test]
    fn comparisons_only_write_zero_or_one(
      cells in prop::collection::vec(0i64..1_000_000, 4),
      a in 0i64..4,
      b in 0i64..4,
      out in 0usize..4
    ) {
      for opcode in COMPARISONS.iter() {
        let mut regs = Registers::from(cells.clone());
        opcode.apply(a, b, out as Word, &mut regs).unwrap();
        let flag = regs.get(out).unwrap();
        prop_assert!(flag == 0 || flag == 1, "{} wrote {}", opcode, flag);
      }
    }

    #[test]
    fn set_operations_ignore_operand_b(
      cells in prop::collection::vec(0i64..1_000_000, 4),
      a in 0i64..4,
      b in any::<i64>(),
      b_other in any::<i64>(),
      out in 0i64..4
    ) {
      for opcode in [Opcode::Setr, Opcode::Seti].iter() {
        let mut with_b = Registers::from(cells.clone());
        let mut with_other = Registers::from(cells.clone());
        opcode.apply(a, b, out, &mut with_b).unwrap();
        opcode.apply(a, b_other, out, &mut with_other).unwrap();
        prop_assert_eq!(&with_b, &with_other);
      }
    }

  }
}
