/*!

  Opcode-identity inference. The wire form of a program uses numeric opcode
  ids whose meaning is device-specific; what we have instead of a manual is
  a pile of observed execution samples, each one a (before, instruction,
  after) triple. For each sample, simulating all sixteen operations against
  the before-snapshot tells us which of them could have produced the
  after-snapshot. Intersecting those candidate sets per id across every
  sample, then repeatedly assigning ids whose set has shrunk to a single
  operation and eliminating that operation elsewhere, yields the unique
  id-to-operation bijection.

  The elimination is pure constraint propagation, not search: if no id has
  exactly one remaining candidate the input is deficient, and that is
  reported rather than guessed around.

*/

use std::collections::HashSet;
use std::fmt::{Display, Formatter};

use bimap::BiMap;
use prettytable::Table;
use strum::IntoEnumIterator;

use crate::error::MachineError;
use crate::isa::{Instruction, Opcode, Program, RawInstruction, OPERATION_COUNT};
use crate::registers::Registers;

/// One observed execution: the register file before, the raw instruction
/// that ran, and the register file after. Immutable once parsed.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct Sample {
  pub before: Registers,
  pub instruction: RawInstruction,
  pub after: Registers,
}

impl Sample {
  pub fn new(before: Registers, instruction: RawInstruction, after: Registers) -> Sample {
    Sample { before, instruction, after }
  }
}

/**
  The operations that could have produced the sample's transition.

  Each trial reloads one scratch register file from the before-snapshot, so
  no state leaks between trials or between samples. A candidate whose
  addressing-mode reading of an operand lands outside the register file
  simply did not produce this transition; that is exclusion, not an error.
*/
pub fn candidates(sample: &Sample) -> Vec<Opcode> {
  let mut matching = Vec::new();
  let mut scratch = sample.before.clone();

  for opcode in Opcode::iter() {
    scratch.load(sample.before.as_slice());
    let outcome = opcode.apply(
      sample.instruction.a,
      sample.instruction.b,
      sample.instruction.out,
      &mut scratch
    );
    if outcome.is_ok() && scratch == sample.after {
      matching.push(opcode);
    }
  }

  matching
}

/// How many samples match at least `threshold` operations. A diagnostic
/// over the same per-sample computation the resolver uses, independent of
/// whether the mapping is resolvable.
pub fn count_ambiguous_samples(samples: &[Sample], threshold: usize) -> usize {
  samples
    .iter()
    .filter(|sample| candidates(sample).len() >= threshold)
    .count()
}

/// The resolved bijection from numeric opcode id to operation.
#[derive(Clone, Debug)]
pub struct OpcodeMapping {
  table: BiMap<u8, Opcode>,
}

impl OpcodeMapping {

  pub fn operation(&self, id: u8) -> Result<Opcode, MachineError> {
    self.table
        .get_by_left(&id)
        .copied()
        .ok_or_else(|| MachineError::UnknownOperation(id.to_string()))
  }

  pub fn id(&self, opcode: Opcode) -> Option<u8> {
    self.table.get_by_right(&opcode).copied()
  }

  pub fn len(&self) -> usize {
    self.table.len()
  }

  pub fn is_empty(&self) -> bool {
    self.table.is_empty()
  }

  /// Re-decodes one wire instruction into its named form.
  pub fn decode(&self, raw: &RawInstruction) -> Result<Instruction, MachineError> {
    let opcode = self.operation(raw.opcode)?;
    Ok(Instruction::new(opcode, raw.a, raw.b, raw.out))
  }

  /// Re-decodes a whole raw program so the machine can run it.
  pub fn decode_program(&self, raw: &[RawInstruction], ip_bind: Option<usize>)
    -> Result<Program, MachineError>
  {
    let instructions =
      raw.iter()
         .map(|instruction| self.decode(instruction))
         .collect::<Result<Vec<Instruction>, MachineError>>()?;
    Ok(Program::new(instructions, ip_bind))
  }

}

impl Display for OpcodeMapping {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    let mut table = Table::new();
    table.set_titles(row![ubr->"Id", ubl->"Operation"]);
    let mut ids: Vec<u8> = self.table.left_values().copied().collect();
    ids.sort();
    for id in ids {
      if let Some(opcode) = self.table.get_by_left(&id) {
        table.add_row(row![r->format!("{}", id), opcode.mnemonic()]);
      }
    }
    write!(f, "{}", table)
  }
}

/**
  Solves for the unique id-to-operation bijection.

  Every id's candidate set starts as all sixteen operations and only ever
  shrinks: first by intersection with each sample's matches, then by
  elimination as other ids resolve. A propagation round that finds no
  singleton fails with `AmbiguousMapping`; re-running the same computation
  could only reach the same stuck state.
*/
pub fn resolve(samples: &[Sample]) -> Result<OpcodeMapping, MachineError> {
  let mut remaining: Vec<HashSet<Opcode>> =
    (0..OPERATION_COUNT)
      .map(|_| Opcode::iter().collect())
      .collect();

  for sample in samples {
    let id = sample.instruction.opcode as usize;
    if id >= OPERATION_COUNT {
      return Err(MachineError::UnknownOperation(id.to_string()));
    }
    let matched: HashSet<Opcode> = candidates(sample).into_iter().collect();
    remaining[id].retain(|opcode| matched.contains(opcode));
  }

  let mut table: BiMap<u8, Opcode> = BiMap::new();
  while table.len() < OPERATION_COUNT {

    let mut found: Option<(u8, Opcode)> = None;
    for (id, set) in remaining.iter().enumerate() {
      let id = id as u8;
      if table.contains_left(&id) || set.len() != 1 {
        continue;
      }
      if let Some(opcode) = set.iter().next() {
        found = Some((id, *opcode));
        break;
      }
    }

    match found {

      Some((id, opcode)) => {
        table.insert(id, opcode);
        for set in remaining.iter_mut() {
          set.remove(&opcode);
        }
      }

      None => {
        return Err(
          MachineError::AmbiguousMapping {
            unresolved: OPERATION_COUNT - table.len()
          }
        );
      }

    }
  }

  Ok(OpcodeMapping { table })
}


#[cfg(test)]
mod tests {
  use rand::seq::SliceRandom;
  use rand::SeedableRng;

  use crate::device::Device;
  use crate::isa::parse_samples;
  use crate::registers::{Word, SAMPLE_WIDTH};

  use super::*;

  const CANONICAL_SAMPLE: &str = "\
Before: [3, 2, 1, 1]
9 2 1 2
After:  [3, 2, 2, 1]
";

  #[test]
  fn canonical_sample_matches_three_operations() {
    let samples = parse_samples(CANONICAL_SAMPLE).unwrap();
    let mut matched = candidates(&samples[0]);
    matched.sort_by_key(|opcode| opcode.mnemonic());
    assert_eq!(matched, vec![Opcode::Addi, Opcode::Mulr, Opcode::Seti]);
  }

  #[test]
  fn canonical_sample_counts_as_ambiguous_at_threshold_three() {
    let samples = parse_samples(CANONICAL_SAMPLE).unwrap();
    assert_eq!(count_ambiguous_samples(&samples, 3), 1);
    assert_eq!(count_ambiguous_samples(&samples, 4), 0);
  }

  #[test]
  fn single_sample_set_is_ambiguous() {
    let samples = parse_samples(CANONICAL_SAMPLE).unwrap();
    assert_eq!(
      resolve(&samples).err(),
      Some(MachineError::AmbiguousMapping { unresolved: 16 })
    );
  }

  #[test]
  fn opcode_id_out_of_range_is_rejected() {
    let sample = Sample::new(
      Registers::from(vec![0, 0, 0, 0]),
      RawInstruction::new(16, 0, 0, 0),
      Registers::from(vec![0, 0, 0, 0])
    );
    assert_eq!(
      resolve(&[sample]).err(),
      Some(MachineError::UnknownOperation("16".to_string()))
    );
  }

  /// A battery of (before, a, b) trials that jointly separates every pair
  /// of the sixteen operations: for any two distinct operations, at least
  /// one trial produces different outputs. All outputs land in register 3.
  const DISCRIMINATING_TRIALS: [([Word; 4], Word, Word); 6] = [
    ([5, 9, 2, 7], 0, 1),
    ([3, 1, 6, 2], 2, 0),
    ([0, 1, 1, 0], 1, 2),
    ([2, 2, 3, 9], 0, 1),
    ([1, 3, 3, 0], 1, 3),
    ([0, 0, 0, 0], 0, 0),
  ];

  fn synthetic_samples(mapping: &[Opcode]) -> Vec<Sample> {
    let mut samples = Vec::new();
    for (id, opcode) in mapping.iter().enumerate() {
      for (before, a, b) in DISCRIMINATING_TRIALS.iter() {
        let before = Registers::from(&before[..]);
        let mut after = before.clone();
        opcode.apply(*a, *b, 3, &mut after).unwrap();
        samples.push(
          Sample::new(
            before,
            RawInstruction::new(id as u8, *a, *b, 3),
            after
          )
        );
      }
    }
    samples
  }

  #[test]
  fn resolving_synthetic_samples_recovers_the_mapping_exactly() {
    let mut ground_truth: Vec<Opcode> = Opcode::iter().collect();
    let mut rng = rand::rngs::StdRng::seed_from_u64(0x5eed);
    ground_truth.shuffle(&mut rng);

    let samples = synthetic_samples(&ground_truth);
    let mapping = resolve(&samples).unwrap();

    assert_eq!(mapping.len(), OPERATION_COUNT);
    for (id, opcode) in ground_truth.iter().enumerate() {
      assert_eq!(mapping.operation(id as u8), Ok(*opcode));
      assert_eq!(mapping.id(*opcode), Some(id as u8));
    }
  }

  /// Decoding the raw program with the resolved mapping and running it must
  /// agree with simulating under the ground-truth names directly.
  #[test]
  fn resolved_decoding_reproduces_ground_truth_execution() {
    let mut ground_truth: Vec<Opcode> = Opcode::iter().collect();
    let mut rng = rand::rngs::StdRng::seed_from_u64(42);
    ground_truth.shuffle(&mut rng);

    let mapping = resolve(&synthetic_samples(&ground_truth)).unwrap();

    // A raw straight-line program over the shuffled ids.
    let raw: Vec<RawInstruction> =
      (0..OPERATION_COUNT)
        .map(|id| RawInstruction::new(id as u8, 1, 2, 3))
        .collect();

    let decoded = mapping.decode_program(&raw, None).unwrap();
    let mut device = Device::new(SAMPLE_WIDTH);
    device.load_registers(&[7, 3, 2, 0]);
    let via_mapping = device.run(&decoded).unwrap().clone();

    let mut direct = Registers::from(vec![7, 3, 2, 0]);
    for opcode in ground_truth.iter() {
      opcode.apply(1, 2, 3, &mut direct).unwrap();
    }

    assert_eq!(via_mapping, direct);
  }

  #[test]
  fn deficient_sample_set_raises_ambiguous_mapping() {
    // Ids 0 and 1 share one transition that every zero-writing operation
    // (gtir, gtrr, the eq family, seti) matches, and ids 2..15 have no
    // evidence at all, so no id anywhere shrinks to a singleton.
    let text = "\
Before: [5, 9, 2, 7]
0 0 1 3
After:  [5, 9, 2, 0]

Before: [5, 9, 2, 7]
1 0 1 3
After:  [5, 9, 2, 0]
";
    let samples = parse_samples(text).unwrap();
    // Both ids retain several candidates.
    assert!(candidates(&samples[0]).len() >= 2);
    assert!(candidates(&samples[1]).len() >= 2);
    assert!(matches!(
      resolve(&samples),
      Err(MachineError::AmbiguousMapping { .. })
    ));
  }

  #[test]
  fn decoding_an_unmapped_id_fails() {
    let mapping = resolve(&synthetic_samples(
      &Opcode::iter().collect::<Vec<Opcode>>()
    )).unwrap();
    // Ids are total after resolution, so force the error through the raw
    // instruction's id range instead.
    assert_eq!(
      mapping.decode(&RawInstruction::new(99, 0, 0, 0)).err(),
      Some(MachineError::UnknownOperation("99".to_string()))
    );
  }

  #[test]
  fn candidate_trials_do_not_contaminate_each_other() {
    let samples = parse_samples(CANONICAL_SAMPLE).unwrap();
    let first = candidates(&samples[0]);
    let second = candidates(&samples[0]);
    assert_eq!(first, second);
    // The sample itself is untouched.
    assert_eq!(samples[0].before.as_slice(), &[3, 2, 1, 1]);
    assert_eq!(samples[0].after.as_slice(), &[3, 2, 2, 1]);
  }
}
