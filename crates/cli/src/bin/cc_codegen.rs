//! Code generation binary (spec §6.1): `cc_codegen <input.ast> <output.asm>`.

use cc_codegen::generate;
use cc_runtime::{log_error, CcResult, FileByteReader, FileOutputSink};
use std::{env, process::ExitCode};

fn main() -> ExitCode {
  colog::init();
  let args: Vec<String> = env::args().skip(1).collect();
  let [input, output] = &args[..] else {
    eprintln!("Usage: cc_codegen <input.ast> <output.asm>");
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
  let report = generate(|| FileByteReader::open(input), &mut sink)?;
  log::info!("emitted {} function(s), {} global(s)", report.function_count, report.global_count);
  Ok(())
}
