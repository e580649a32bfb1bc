//! Parser stage binary (spec §6.1): `cc_parse <input.c> <output.ast>`.

use cc_bytecode::write_program;
use cc_runtime::{log_error, CcError, CcResult, FileByteReader, FileOutputSink};
use std::{env, process::ExitCode};

fn main() -> ExitCode {
  colog::init();
  let args: Vec<String> = env::args().skip(1).collect();
  let [input, output] = &args[..] else {
    eprintln!("Usage: cc_parse <input.c> <output.ast>");
    return ExitCode::FAILURE;
  };

  match run(input, output) {
    Ok(()) => {
      println!("{input} -> {output}");
      ExitCode::SUCCESS
    }
    Err(e) => {
      log_error(&e.to_string());
      ExitCode::FAILURE
    }
  }
}

fn run(input: &str, output: &str) -> CcResult<()> {
  let mut sink = FileOutputSink::create(output)?;
  let report = write_program(|| FileByteReader::open(input), &mut sink)?;
  if report.error_count > 0 {
    return Err(CcError::Syntax(format!("{} parse error(s)", report.error_count)));
  }
  log::info!("wrote {} node(s), {} string(s)", report.node_count, report.string_count);
  Ok(())
}
