//! `ZAST` reader (spec §4.4.3): full-tree reconstruction, streaming
//! per-declaration reads, and an allocation-free skip walker.

use crate::tag::{BinOpCode, Tag, UnOpCode};
use crate::typeinfo::{self, TypeInfo};
use crate::writer::{HEADER_SIZE, MAGIC, VERSION};
use cc_core::ast::Node;
use cc_runtime::{ByteReader, CcError, CcResult};

pub struct AstReader<R> {
  reader: R,
  node_count: u16,
  string_count: u16,
  string_table_off: u32,
  strings: Vec<String>,
}

fn read_u8<R: ByteReader>(r: &mut R) -> CcResult<u8> {
  r.next()?.ok_or_else(|| CcError::Internal("unexpected end of AST file".into()))
}

fn read_u16<R: ByteReader>(r: &mut R) -> CcResult<u16> {
  let lo = read_u8(r)?;
  let hi = read_u8(r)?;
  Ok(u16::from_le_bytes([lo, hi]))
}

fn read_i16<R: ByteReader>(r: &mut R) -> CcResult<i16> {
  let lo = read_u8(r)?;
  let hi = read_u8(r)?;
  Ok(i16::from_le_bytes([lo, hi]))
}

fn read_u32<R: ByteReader>(r: &mut R) -> CcResult<u32> {
  let mut bytes = [0u8; 4];
  for b in bytes.iter_mut() {
    *b = read_u8(r)?;
  }
  Ok(u32::from_le_bytes(bytes))
}

fn read_tag<R: ByteReader>(r: &mut R) -> CcResult<Tag> {
  let byte = read_u8(r)?;
  Tag::from_u8(byte).ok_or_else(|| CcError::Internal(format!("unknown AST tag {byte}")))
}

fn read_typeinfo<R: ByteReader>(r: &mut R) -> CcResult<TypeInfo> {
  let base = read_u8(r)?;
  let depth = read_u8(r)?;
  let array_len = read_u16(r)?;
  Ok(TypeInfo { base, depth, array_len })
}

impl<R: ByteReader> AstReader<R> {
  /// Reads the header and loads the string table, then seeks back to the
  /// start of the node stream so callers can pick full-tree, streaming, or
  /// skip-only decoding from a known position.
  pub fn open(mut reader: R) -> CcResult<Self> {
    let mut magic = [0u8; 4];
    for b in magic.iter_mut() {
      *b = read_u8(&mut reader)?;
    }
    if &magic != MAGIC {
      return Err(CcError::Internal(format!("bad AST magic {magic:?}")));
    }
    let version = read_u8(&mut reader)?;
    if version != VERSION {
      return Err(CcError::Internal(format!("unsupported AST version {version}")));
    }
    let _reserved = read_u8(&mut reader)?;
    let _flags = read_u16(&mut reader)?;
    let node_count = read_u16(&mut reader)?;
    let string_count = read_u16(&mut reader)?;
    let string_table_off = read_u32(&mut reader)?;

    reader.seek(string_table_off)?;
    let mut strings = Vec::with_capacity(string_count as usize);
    for _ in 0..string_count {
      let len = read_u16(&mut reader)?;
      let mut raw = Vec::with_capacity(len as usize);
      for _ in 0..len {
        raw.push(read_u8(&mut reader)?);
      }
      strings.push(String::from_utf8_lossy(&raw).into_owned());
    }

    reader.seek(HEADER_SIZE)?;
    Ok(Self { reader, node_count, string_count, string_table_off, strings })
  }

  pub fn node_count(&self) -> u16 {
    self.node_count
  }

  pub fn string_count(&self) -> u16 {
    self.string_count
  }

  pub fn string_table_off(&self) -> u32 {
    self.string_table_off
  }

  pub fn tell(&self) -> u32 {
    self.reader.tell()
  }

  fn string(&self, idx: u16) -> CcResult<String> {
    self.strings.get(idx as usize).cloned().ok_or_else(|| CcError::Internal(format!("string index {idx} out of range")))
  }

  /// Consumes the root `PROGRAM` tag and returns its declaration count, the
  /// entry point for streaming per-declaration decoding.
  pub fn begin_program(&mut self) -> CcResult<u16> {
    let tag = read_tag(&mut self.reader)?;
    if tag != Tag::Program {
      return Err(CcError::Internal("expected PROGRAM tag at root".into()));
    }
    read_u16(&mut self.reader)
  }

  /// Decodes the next node from the stream, one full subtree at a time.
  /// Used both for top-level declarations and recursively for children.
  pub fn read_decl(&mut self) -> CcResult<Node> {
    self.decode_node()
  }

  /// Reads the whole tree into an owned `Program` node.
  pub fn read_tree(&mut self) -> CcResult<Node> {
    self.reader.seek(HEADER_SIZE)?;
    let decl_count = self.begin_program()?;
    let mut decls = Vec::with_capacity(decl_count as usize);
    for _ in 0..decl_count {
      decls.push(self.read_decl()?);
    }
    Ok(Node::Program { decls })
  }

  fn decode_node(&mut self) -> CcResult<Node> {
    let tag = read_tag(&mut self.reader)?;
    Ok(match tag {
      Tag::Program => {
        let decl_count = read_u16(&mut self.reader)?;
        let mut decls = Vec::with_capacity(decl_count as usize);
        for _ in 0..decl_count {
          decls.push(self.decode_node()?);
        }
        Node::Program { decls }
      }
      Tag::Function => {
        let name = self.string(read_u16(&mut self.reader)?)?;
        let ret = typeinfo::decode(read_typeinfo(&mut self.reader)?);
        let param_count = read_u8(&mut self.reader)?;
        let mut params = Vec::with_capacity(param_count as usize);
        for _ in 0..param_count {
          params.push(self.decode_node()?);
        }
        let body = Box::new(self.decode_node()?);
        Node::Function { name, ret, params, body }
      }
      Tag::VarDecl => {
        let name = self.string(read_u16(&mut self.reader)?)?;
        let ty = typeinfo::decode(read_typeinfo(&mut self.reader)?);
        let has_init = read_u8(&mut self.reader)? != 0;
        let init = if has_init { Some(Box::new(self.decode_node()?)) } else { None };
        Node::VarDecl { name, ty, init }
      }
      Tag::CompoundStmt => {
        let stmt_count = read_u16(&mut self.reader)?;
        let mut stmts = Vec::with_capacity(stmt_count as usize);
        for _ in 0..stmt_count {
          stmts.push(self.decode_node()?);
        }
        Node::Compound { stmts }
      }
      Tag::ReturnStmt => {
        let has_expr = read_u8(&mut self.reader)? != 0;
        let expr = if has_expr { Some(Box::new(self.decode_node()?)) } else { None };
        Node::Return { expr }
      }
      Tag::BreakStmt => Node::Break,
      Tag::ContinueStmt => Node::Continue,
      Tag::GotoStmt => Node::Goto { name: self.string(read_u16(&mut self.reader)?)? },
      Tag::LabelStmt => Node::Label { name: self.string(read_u16(&mut self.reader)?)? },
      Tag::EmptyStmt => Node::EmptyStmt,
      Tag::IfStmt => {
        let has_else = read_u8(&mut self.reader)? != 0;
        let cond = Box::new(self.decode_node()?);
        let then_branch = Box::new(self.decode_node()?);
        let else_branch = if has_else { Some(Box::new(self.decode_node()?)) } else { None };
        Node::If { cond, then_branch, else_branch }
      }
      Tag::WhileStmt => {
        let cond = Box::new(self.decode_node()?);
        let body = Box::new(self.decode_node()?);
        Node::While { cond, body }
      }
      Tag::ForStmt => {
        let has_init = read_u8(&mut self.reader)? != 0;
        let has_cond = read_u8(&mut self.reader)? != 0;
        let has_inc = read_u8(&mut self.reader)? != 0;
        let init = if has_init { Some(Box::new(self.decode_node()?)) } else { None };
        let cond = if has_cond { Some(Box::new(self.decode_node()?)) } else { None };
        let inc = if has_inc { Some(Box::new(self.decode_node()?)) } else { None };
        let body = Box::new(self.decode_node()?);
        Node::For { init, cond, inc, body }
      }
      Tag::Assign => {
        let lvalue = Box::new(self.decode_node()?);
        let rvalue = Box::new(self.decode_node()?);
        Node::Assign { lvalue, rvalue }
      }
      Tag::Call => {
        let name = self.string(read_u16(&mut self.reader)?)?;
        let arg_count = read_u8(&mut self.reader)?;
        let mut args = Vec::with_capacity(arg_count as usize);
        for _ in 0..arg_count {
          args.push(self.decode_node()?);
        }
        Node::Call { name, args }
      }
      Tag::BinaryOp => {
        let op_byte = read_u8(&mut self.reader)?;
        let op = BinOpCode::from_u8(op_byte).ok_or_else(|| CcError::Internal(format!("unknown binary op code {op_byte}")))?.to_ast();
        let left = Box::new(self.decode_node()?);
        let right = Box::new(self.decode_node()?);
        Node::BinaryOp { op, left, right }
      }
      Tag::UnaryOp => {
        let op_byte = read_u8(&mut self.reader)?;
        let op = UnOpCode::from_u8(op_byte).ok_or_else(|| CcError::Internal(format!("unknown unary op code {op_byte}")))?.to_ast();
        let operand = Box::new(self.decode_node()?);
        Node::UnaryOp { op, operand }
      }
      Tag::Identifier => Node::Identifier { name: self.string(read_u16(&mut self.reader)?)? },
      Tag::Constant => Node::Constant { value: read_i16(&mut self.reader)? },
      Tag::StringLiteral => Node::StringLiteral { value: self.string(read_u16(&mut self.reader)?)? },
      Tag::ArrayAccess => {
        let base = Box::new(self.decode_node()?);
        let index = Box::new(self.decode_node()?);
        Node::ArrayAccess { base, index }
      }
    })
  }

  /// Advances past the next node without allocating a [`Node`]. Used by the
  /// semantic validator, which only cares that the stream decodes cleanly.
  pub fn skip_node(&mut self) -> CcResult<()> {
    let tag = read_tag(&mut self.reader)?;
    match tag {
      Tag::Program => {
        let decl_count = read_u16(&mut self.reader)?;
        for _ in 0..decl_count {
          self.skip_node()?;
        }
      }
      Tag::Function => {
        read_u16(&mut self.reader)?; // name_idx
        read_typeinfo(&mut self.reader)?;
        let param_count = read_u8(&mut self.reader)?;
        for _ in 0..param_count {
          self.skip_node()?;
        }
        self.skip_node()?; // body
      }
      Tag::VarDecl => {
        read_u16(&mut self.reader)?;
        read_typeinfo(&mut self.reader)?;
        if read_u8(&mut self.reader)? != 0 {
          self.skip_node()?;
        }
      }
      Tag::CompoundStmt => {
        let stmt_count = read_u16(&mut self.reader)?;
        for _ in 0..stmt_count {
          self.skip_node()?;
        }
      }
      Tag::ReturnStmt => {
        if read_u8(&mut self.reader)? != 0 {
          self.skip_node()?;
        }
      }
      Tag::BreakStmt | Tag::ContinueStmt | Tag::EmptyStmt => {}
      Tag::GotoStmt | Tag::LabelStmt => {
        read_u16(&mut self.reader)?;
      }
      Tag::IfStmt => {
        let has_else = read_u8(&mut self.reader)? != 0;
        self.skip_node()?; // cond
        self.skip_node()?; // then
        if has_else {
          self.skip_node()?;
        }
      }
      Tag::WhileStmt => {
        self.skip_node()?;
        self.skip_node()?;
      }
      Tag::ForStmt => {
        let has_init = read_u8(&mut self.reader)? != 0;
        let has_cond = read_u8(&mut self.reader)? != 0;
        let has_inc = read_u8(&mut self.reader)? != 0;
        if has_init {
          self.skip_node()?;
        }
        if has_cond {
          self.skip_node()?;
        }
        if has_inc {
          self.skip_node()?;
        }
        self.skip_node()?; // body
      }
      Tag::Assign => {
        self.skip_node()?;
        self.skip_node()?;
      }
      Tag::Call => {
        read_u16(&mut self.reader)?;
        let arg_count = read_u8(&mut self.reader)?;
        for _ in 0..arg_count {
          self.skip_node()?;
        }
      }
      Tag::BinaryOp => {
        read_u8(&mut self.reader)?;
        self.skip_node()?;
        self.skip_node()?;
      }
      Tag::UnaryOp => {
        read_u8(&mut self.reader)?;
        self.skip_node()?;
      }
      Tag::Identifier | Tag::StringLiteral => {
        read_u16(&mut self.reader)?;
      }
      Tag::Constant => {
        read_i16(&mut self.reader)?;
      }
      Tag::ArrayAccess => {
        self.skip_node()?;
        self.skip_node()?;
      }
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::writer::write_program;
  use cc_core::parser::Parser;
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
    fn from_str(s: &str) -> Self {
      Self::new(s.as_bytes().to_vec())
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
    write_program(|| Ok(SliceReader::from_str(src)), &mut sink).unwrap();
    sink.0
  }

  #[test]
  fn roundtrips_function_with_locals_and_return() {
    let src = "int add(int a, int b) { int c; c = a + b; return c; }";
    let bytes = encode(src);
    let mut reader = AstReader::open(SliceReader::new(bytes)).unwrap();
    let tree = reader.read_tree().unwrap();
    let Node::Program { decls } = tree else { panic!("expected Program") };
    assert_eq!(decls.len(), 1);
    let Node::Function { name, params, .. } = &decls[0] else { panic!("expected Function") };
    assert_eq!(name, "add");
    assert_eq!(params.len(), 2);
  }

  #[test]
  fn streaming_reads_match_full_tree() {
    let src = "int a; int b; void f() { return; }";
    let bytes = encode(src);
    let mut streamed = AstReader::open(SliceReader::new(bytes.clone())).unwrap();
    let decl_count = streamed.begin_program().unwrap();
    assert_eq!(decl_count, 3);
    for _ in 0..decl_count {
      streamed.read_decl().unwrap();
    }
  }

  #[test]
  fn skip_node_consumes_whole_program_without_building_nodes() {
    let src = "int fib(int n) { if (n) return fib(n - 1); return 0; }";
    let bytes = encode(src);
    let mut reader = AstReader::open(SliceReader::new(bytes)).unwrap();
    let decl_count = reader.begin_program().unwrap();
    for _ in 0..decl_count {
      reader.skip_node().unwrap();
    }
  }

  #[test]
  fn rejects_bad_magic() {
    let mut bytes = encode("int main() { return 0; }");
    bytes[0] = b'?';
    let err = AstReader::open(SliceReader::new(bytes)).unwrap_err();
    assert!(matches!(err, CcError::Internal(_)));
  }
}
