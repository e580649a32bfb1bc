//! Semantic validation binary (spec §6.1): `cc_semantic <input.ast>`.

use cc_codegen::validate;
use cc_runtime::{log_error, CcResult, FileByteReader};
use std::{env, process::ExitCode};

fn main() -> ExitCode {
  colog::init();
  let args: Vec<String> = env::args().skip(1).collect();
  let [input] = &args[..] else {
    eprintln!("Usage: cc_semantic <input.ast>");
    return ExitCode::FAILURE;
  };

  match run(input) {
    Ok(()) => {
      println!("{input} -> OK");
      ExitCode::SUCCESS
    }
    Err(e) => {
      log_error(&e.to_string());
      ExitCode::FAILURE
    }
  }
}

fn run(input: &str) -> CcResult<()> {
  validate(FileByteReader::open(input)?)
}
