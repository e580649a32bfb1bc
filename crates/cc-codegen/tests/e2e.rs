//! End-to-end pipeline scenarios (spec §8.3): source text through the
//! writer, the semantic validator, and the code generator, without ever
//! touching the host filesystem.

use cc_bytecode::write_program;
use cc_codegen::{generate, validate};
use cc_runtime::{ByteReader, CcResult, OutputSink};

struct SliceReader {
  data: Vec<u8>,
  pos: u32,
  lookahead: Option<Option<u8>>,
}

impl SliceReader {
  fn new(s: &str) -> Self {
    Self { data: s.as_bytes().to_vec(), pos: 0, lookahead: None }
  }
}

impl ByteReader for SliceReader {
  fn next(&mut self) -> CcResult<Option<u8>> {
    let byte = match self.lookahead.take() {
      Some(b) => b,
      None => self.data.get(self.pos as usize).copied(),
    };
    if byte.is_some() {
      self.pos += 1;
    }
    Ok(byte)
  }
  fn peek(&mut self) -> CcResult<Option<u8>> {
    if self.lookahead.is_none() {
      self.lookahead = Some(self.data.get(self.pos as usize).copied());
    }
    Ok(self.lookahead.unwrap())
  }
  fn seek(&mut self, abs: u32) -> CcResult<()> {
    self.pos = abs;
    self.lookahead = None;
    Ok(())
  }
  fn tell(&self) -> u32 {
    self.pos
  }
}

#[derive(Default)]
struct VecSink(Vec<u8>);
impl OutputSink for VecSink {
  fn write(&mut self, bytes: &[u8]) -> CcResult<()> {
    self.0.extend_from_slice(bytes);
    Ok(())
  }
  fn tell(&self) -> u32 {
    self.0.len() as u32
  }
  fn close(&mut self) -> CcResult<()> {
    Ok(())
  }
}

fn compile_to_ast(src: &str) -> Vec<u8> {
  let mut sink = VecSink::default();
  let report = write_program(|| Ok(SliceReader::new(src)), &mut sink).unwrap();
  assert_eq!(report.error_count, 0, "unexpected parse errors in: {src}");
  sink.0
}

fn compile_to_asm(src: &str) -> String {
  let ast = compile_to_ast(src);
  let mut sink = VecSink::default();
  generate(|| Ok(SliceReader { data: ast.clone(), pos: 0, lookahead: None }), &mut sink).unwrap();
  String::from_utf8(sink.0).unwrap()
}

#[test]
fn trivial_return_zero_compiles_and_validates() {
  let ast = compile_to_ast("int main() { return 0; }");
  validate(SliceReader { data: ast.clone(), pos: 0, lookahead: None }).unwrap();
  let asm = compile_to_asm("int main() { return 0; }");
  assert!(asm.contains("main:"));
  assert!(asm.contains("org 0x4000"));
}

#[test]
fn function_call_with_two_params_emits_both_functions() {
  let src = "int add(int a,int b){return a+b;} int main(){return add(5,3);}";
  let asm = compile_to_asm(src);
  assert!(asm.contains("add:"));
  assert!(asm.contains("main:"));
  assert!(asm.contains("call add"));
}

#[test]
fn bitwise_c_validates_and_emits_logical_ops() {
  let src = include_str!("../../../demos/bitwise.c");
  let ast = compile_to_ast(src);
  validate(SliceReader { data: ast, pos: 0, lookahead: None }).unwrap();
  let asm = compile_to_asm(src);
  assert!(asm.contains("xor"));
  assert!(asm.contains("and"));
  assert!(asm.contains("or "));
}

#[test]
fn goto_c_emits_jump_and_labels() {
  let src = include_str!("../../../demos/goto.c");
  let asm = compile_to_asm(src);
  assert!(asm.contains("jp "));
  assert!(asm.contains("_lbl_"));
}

#[test]
fn break_c_emits_loop_exit_jumps() {
  let src = include_str!("../../../demos/break.c");
  let asm = compile_to_asm(src);
  assert!(asm.contains("_l"));
}

#[test]
fn array_c_emits_string_pool_and_globals() {
  let src = include_str!("../../../demos/array.c");
  let asm = compile_to_asm(src);
  assert!(asm.contains("_s0") || asm.contains("_s1"));
}

#[test]
fn missing_array_length_is_reported_as_a_parse_error() {
  let mut sink = VecSink::default();
  let report = write_program(|| Ok(SliceReader::new("int main(){ int x[]; return 0; }")), &mut sink).unwrap();
  assert!(report.error_count > 0);
}

#[test]
fn bad_magic_is_rejected_by_both_semantic_and_codegen_stages() {
  let mut ast = compile_to_ast("int main() { return 0; }");
  ast[3] = b'?'; // "ZAS?" instead of "ZAST"

  let err = validate(SliceReader { data: ast.clone(), pos: 0, lookahead: None }).unwrap_err();
  assert!(err.to_string().contains("semantic error"));

  let mut sink = VecSink::default();
  let err = generate(|| Ok(SliceReader { data: ast.clone(), pos: 0, lookahead: None }), &mut sink).unwrap_err();
  assert!(!err.to_string().is_empty());
}
