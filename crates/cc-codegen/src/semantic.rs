//! The semantic validator (spec §4.5): a deliberately thin pass that proves
//! the `ZAST` file decodes as a structurally sound `PROGRAM` without
//! building any node. Richer typechecking is out of scope.

use cc_bytecode::AstReader;
use cc_runtime::{ByteReader, CcError, CcResult};

pub fn validate<R: ByteReader>(reader: R) -> CcResult<()> {
  run(reader).map_err(|e| CcError::Semantic(e.to_string()))
}

fn run<R: ByteReader>(reader: R) -> CcResult<()> {
  let mut ast = AstReader::open(reader)?;
  let decl_count = ast.begin_program()?;
  for _ in 0..decl_count {
    ast.skip_node()?;
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;
  use cc_bytecode::write_program;
  use cc_runtime::OutputSink;

  struct SliceReader {
    data: Vec<u8>,
    pos: u32,
    lookahead: Option<Option<u8>>,
  }

  impl SliceReader {
    fn new(data: Vec<u8>) -> Self {
      Self { data, pos: 0, lookahead: None }
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

  fn encode(src: &str) -> Vec<u8> {
    let mut sink = VecSink(Vec::new());
    write_program(|| Ok(SliceReader::new(src.as_bytes().to_vec())), &mut sink).unwrap();
    sink.0
  }

  #[test]
  fn accepts_well_formed_program() {
    let bytes = encode("int main() { int x; x = 1; return x; }");
    assert!(validate(SliceReader::new(bytes)).is_ok());
  }

  #[test]
  fn rejects_bad_magic() {
    let mut bytes = encode("int main() { return 0; }");
    bytes[0] = b'?';
    assert!(matches!(validate(SliceReader::new(bytes)), Err(CcError::Semantic(_))));
  }

  #[test]
  fn rejects_truncated_file() {
    let mut bytes = encode("int main() { return 0; }");
    bytes.truncate(bytes.len() - 4);
    assert!(matches!(validate(SliceReader::new(bytes)), Err(CcError::Semantic(_))));
  }
}
