//! Two-pass `ZAST` writer (spec §4.4.2).
//!
//! Pass one measures: parse every top-level declaration, intern its
//! strings, tally node counts and per-declaration byte sizes, then
//! discard the subtree. Pass two re-parses the same source from the
//! start and emits the header (now that `string_table_off` is known)
//! followed by the body and the frozen string table. Both passes visit
//! declarations and intern strings in identical source order, so indices
//! assigned in pass one are reproduced exactly in pass two.

use crate::strings::StringTable;
use crate::tag::{BinOpCode, Tag, UnOpCode};
use crate::typeinfo;
use cc_core::ast::Node;
use cc_core::parser::Parser;
use cc_runtime::{ByteReader, CcError, CcResult, OutputSink};

pub const MAGIC: &[u8; 4] = b"ZAST";
pub const VERSION: u8 = 1;
pub const HEADER_SIZE: u32 = 16;

#[derive(Debug, Clone, Copy, Default)]
pub struct WriteReport {
  pub node_count: u32,
  pub string_count: u16,
  pub decl_count: u16,
  pub error_count: u32,
}

struct Encoder<'t> {
  table: &'t mut StringTable,
  node_count: u32,
}

impl<'t> Encoder<'t> {
  fn encode(&mut self, node: &Node, buf: &mut Vec<u8>) -> CcResult<()> {
    self.node_count += 1;
    match node {
      Node::Program { decls } => {
        buf.push(Tag::Program as u8);
        push_u16(buf, decls.len() as u16);
        for d in decls {
          self.encode(d, buf)?;
        }
      }
      Node::Function { name, ret, params, body } => {
        buf.push(Tag::Function as u8);
        let idx = self.table.intern(name)?;
        push_u16(buf, idx);
        push_typeinfo(buf, ret)?;
        buf.push(params.len() as u8);
        for p in params {
          self.encode(p, buf)?;
        }
        self.encode(body, buf)?;
      }
      Node::VarDecl { name, ty, init } => {
        buf.push(Tag::VarDecl as u8);
        let idx = self.table.intern(name)?;
        push_u16(buf, idx);
        push_typeinfo(buf, ty)?;
        buf.push(init.is_some() as u8);
        if let Some(e) = init {
          self.encode(e, buf)?;
        }
      }
      Node::Compound { stmts } => {
        buf.push(Tag::CompoundStmt as u8);
        push_u16(buf, stmts.len() as u16);
        for s in stmts {
          self.encode(s, buf)?;
        }
      }
      Node::Return { expr } => {
        buf.push(Tag::ReturnStmt as u8);
        buf.push(expr.is_some() as u8);
        if let Some(e) = expr {
          self.encode(e, buf)?;
        }
      }
      Node::Break => buf.push(Tag::BreakStmt as u8),
      Node::Continue => buf.push(Tag::ContinueStmt as u8),
      Node::Goto { name } => {
        buf.push(Tag::GotoStmt as u8);
        let idx = self.table.intern(name)?;
        push_u16(buf, idx);
      }
      Node::Label { name } => {
        buf.push(Tag::LabelStmt as u8);
        let idx = self.table.intern(name)?;
        push_u16(buf, idx);
      }
      Node::EmptyStmt => buf.push(Tag::EmptyStmt as u8),
      Node::If { cond, then_branch, else_branch } => {
        buf.push(Tag::IfStmt as u8);
        buf.push(else_branch.is_some() as u8);
        self.encode(cond, buf)?;
        self.encode(then_branch, buf)?;
        if let Some(e) = else_branch {
          self.encode(e, buf)?;
        }
      }
      Node::While { cond, body } => {
        buf.push(Tag::WhileStmt as u8);
        self.encode(cond, buf)?;
        self.encode(body, buf)?;
      }
      Node::For { init, cond, inc, body } => {
        buf.push(Tag::ForStmt as u8);
        buf.push(init.is_some() as u8);
        buf.push(cond.is_some() as u8);
        buf.push(inc.is_some() as u8);
        if let Some(n) = init {
          self.encode(n, buf)?;
        }
        if let Some(n) = cond {
          self.encode(n, buf)?;
        }
        if let Some(n) = inc {
          self.encode(n, buf)?;
        }
        self.encode(body, buf)?;
      }
      Node::Assign { lvalue, rvalue } => {
        buf.push(Tag::Assign as u8);
        self.encode(lvalue, buf)?;
        self.encode(rvalue, buf)?;
      }
      Node::Call { name, args } => {
        buf.push(Tag::Call as u8);
        let idx = self.table.intern(name)?;
        push_u16(buf, idx);
        buf.push(args.len() as u8);
        for a in args {
          self.encode(a, buf)?;
        }
      }
      Node::BinaryOp { op, left, right } => {
        buf.push(Tag::BinaryOp as u8);
        buf.push(BinOpCode::from_ast(*op) as u8);
        self.encode(left, buf)?;
        self.encode(right, buf)?;
      }
      Node::UnaryOp { op, operand } => {
        buf.push(Tag::UnaryOp as u8);
        buf.push(UnOpCode::from_ast(*op) as u8);
        self.encode(operand, buf)?;
      }
      Node::Identifier { name } => {
        buf.push(Tag::Identifier as u8);
        let idx = self.table.intern(name)?;
        push_u16(buf, idx);
      }
      Node::Constant { value } => {
        buf.push(Tag::Constant as u8);
        push_i16(buf, *value);
      }
      Node::StringLiteral { value } => {
        buf.push(Tag::StringLiteral as u8);
        let idx = self.table.intern(value)?;
        push_u16(buf, idx);
      }
      Node::ArrayAccess { base, index } => {
        buf.push(Tag::ArrayAccess as u8);
        self.encode(base, buf)?;
        self.encode(index, buf)?;
      }
    }
    Ok(())
  }
}

fn push_u16(buf: &mut Vec<u8>, v: u16) {
  buf.extend_from_slice(&v.to_le_bytes());
}

fn push_i16(buf: &mut Vec<u8>, v: i16) {
  buf.extend_from_slice(&v.to_le_bytes());
}

fn push_u32(buf: &mut Vec<u8>, v: u32) {
  buf.extend_from_slice(&v.to_le_bytes());
}

fn push_typeinfo(buf: &mut Vec<u8>, ty: &cc_core::types::QualifiedType) -> CcResult<()> {
  let info = typeinfo::encode(ty)?;
  buf.push(info.base);
  buf.push(info.depth);
  push_u16(buf, info.array_len);
  Ok(())
}

/// Writes a complete `ZAST` file by invoking `open` twice: once to measure,
/// once to emit. `open` must yield a reader positioned at the start of the
/// same source both times.
pub fn write_program<R: ByteReader>(mut open: impl FnMut() -> CcResult<R>, sink: &mut impl OutputSink) -> CcResult<WriteReport> {
  let mut table = StringTable::new();
  let mut node_count = 1u32; // the Program node itself
  let mut body_size = 1u32 + 2u32; // Program tag + decl_count
  let mut decl_count: u16 = 0;
  let mut error_count;

  {
    let reader = open()?;
    let mut parser = Parser::new(reader)?;
    while let Some(decl) = parser.parse_next()? {
      let mut buf = Vec::new();
      let mut enc = Encoder { table: &mut table, node_count: 0 };
      enc.encode(&decl, &mut buf)?;
      node_count += enc.node_count;
      body_size += buf.len() as u32;
      decl_count = decl_count
        .checked_add(1)
        .ok_or_else(|| CcError::Syntax("too many top-level declarations".into()))?;
    }
    error_count = parser.error_count();
  }

  table.freeze();
  let string_count = table.len();
  let string_table_off = HEADER_SIZE + body_size;

  sink.write(MAGIC)?;
  sink.write(&[VERSION, 0])?;
  let mut hdr = Vec::with_capacity(10);
  push_u16(&mut hdr, 0); // flags
  push_u16(&mut hdr, node_count as u16);
  push_u16(&mut hdr, string_count);
  push_u32(&mut hdr, string_table_off);
  sink.write(&hdr)?;

  let mut body = Vec::with_capacity(body_size as usize);
  body.push(Tag::Program as u8);
  push_u16(&mut body, decl_count);
  {
    let reader = open()?;
    let mut parser = Parser::new(reader)?;
    let mut emitted = 0u16;
    while let Some(decl) = parser.parse_next()? {
      let mut enc = Encoder { table: &mut table, node_count: 0 };
      enc.encode(&decl, &mut body)?;
      emitted += 1;
    }
    // A divergent second parse (different declaration count) would silently
    // corrupt the offsets computed from pass one.
    if emitted != decl_count {
      return Err(CcError::Internal("emit pass declaration count diverged from measure pass".into()));
    }
    error_count = error_count.max(parser.error_count());
  }
  sink.write(&body)?;

  for s in table.entries() {
    let bytes = s.as_bytes();
    let mut len_buf = Vec::with_capacity(2);
    push_u16(&mut len_buf, bytes.len() as u16);
    sink.write(&len_buf)?;
    sink.write(bytes)?;
  }
  sink.close()?;

  Ok(WriteReport { node_count, string_count, decl_count, error_count })
}

#[cfg(test)]
mod tests {
  use super::*;

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

  #[test]
  fn header_offsets_are_internally_consistent() {
    let src = "int main() { return 0; }";
    let mut sink = VecSink(Vec::new());
    let report = write_program(|| Ok(SliceReader::new(src)), &mut sink).unwrap();
    assert_eq!(report.decl_count, 1);
    assert_eq!(report.error_count, 0);
    assert_eq!(&sink.0[0..4], MAGIC);
    let string_table_off = u32::from_le_bytes(sink.0[12..16].try_into().unwrap());
    assert_eq!(string_table_off as usize, sink.0.len() - string_table_len(&sink.0, string_table_off, report.string_count));
  }

  fn string_table_len(data: &[u8], off: u32, count: u16) -> usize {
    let mut pos = off as usize;
    for _ in 0..count {
      let len = u16::from_le_bytes(data[pos..pos + 2].try_into().unwrap()) as usize;
      pos += 2 + len;
    }
    pos - off as usize
  }

  #[test]
  fn identical_identifiers_share_one_string_entry() {
    let src = "int x; int x2() { return x; }";
    let mut sink = VecSink(Vec::new());
    let report = write_program(|| Ok(SliceReader::new(src)), &mut sink).unwrap();
    // "x" appears twice (decl + use) but must intern once.
    assert!(report.string_count >= 2);
  }

  #[test]
  fn short_declaration_is_rejected_at_write_time() {
    let src = "short x; int main() { return 0; }";
    let mut sink = VecSink(Vec::new());
    assert!(write_program(|| Ok(SliceReader::new(src)), &mut sink).is_err());
  }

  #[test]
  fn long_return_type_is_rejected_at_write_time() {
    let src = "long f() { return 0; }";
    let mut sink = VecSink(Vec::new());
    assert!(write_program(|| Ok(SliceReader::new(src)), &mut sink).is_err());
  }
}
