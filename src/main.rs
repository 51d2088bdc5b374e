#![allow(dead_code)]

#[macro_use] extern crate prettytable;
#[macro_use] extern crate lazy_static;

mod device;
mod error;
mod isa;
mod registers;
mod resolver;

use crate::device::Device;
use crate::error::MachineError;
use crate::isa::{parse_program, parse_samples, MnemonicList};
use crate::registers::BOUND_WIDTH;
use crate::resolver::{candidates, count_ambiguous_samples};

// A small ip-bound program: instruction 2 bumps the pointer past the add at
// instruction 3, instruction 4 jumps into the tail, and the run halts with
// the pointer just past the end.
const DEMO_PROGRAM: &str = "\
#ip 0
seti 5 0 1
seti 6 0 2
addi 0 1 0
addr 1 2 3
setr 1 0 0
seti 8 0 4
seti 9 0 5
";

const DEMO_SAMPLE: &str = "\
Before: [3, 2, 1, 1]
9 2 1 2
After:  [3, 2, 2, 1]
";

fn demo() -> Result<(), MachineError> {
  let program = parse_program(DEMO_PROGRAM)?;
  println!("Program:\n{}", program);

  let mut machine = Device::for_program(&program, BOUND_WIDTH)?;
  machine.run(&program)?;
  println!("Final machine state:\n{}", machine);

  let samples = parse_samples(DEMO_SAMPLE)?;
  for sample in samples.iter() {
    println!(
      "{} could have been: {}",
      sample.instruction,
      MnemonicList(&candidates(sample))
    );
  }
  println!(
    "{} of {} samples match 3 or more operations.",
    count_ambiguous_samples(&samples, 3),
    samples.len()
  );

  Ok(())
}

fn main() {
  if let Err(error) = demo() {
    eprintln!("{}", error);
  }
}
