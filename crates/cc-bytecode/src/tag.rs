//! The closed tag set for the `ZAST` wire format (spec §6.2).
//!
//! `Break`/`Continue`/`Goto`/`Label` are the "reserved adjacent IDs" spec
//! §6.2 calls out; `EmptyStmt` is this port's own extension for the bare
//! `;` statement (spec.md's closed set has no room for it, and the binary
//! format is ours to extend — see `SPEC_FULL.md` §2). Both skip and read
//! tables below must stay in this exact order.

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum Tag {
  Program = 1,
  Function = 2,
  VarDecl = 3,
  CompoundStmt = 4,
  ReturnStmt = 5,
  IfStmt = 6,
  WhileStmt = 7,
  ForStmt = 8,
  Assign = 9,
  Call = 10,
  BinaryOp = 11,
  UnaryOp = 12,
  Identifier = 13,
  Constant = 14,
  StringLiteral = 15,
  ArrayAccess = 16,
  BreakStmt = 17,
  ContinueStmt = 18,
  GotoStmt = 19,
  LabelStmt = 20,
  EmptyStmt = 21,
}

impl Tag {
  pub fn from_u8(byte: u8) -> Option<Tag> {
    use Tag::*;
    Some(match byte {
      1 => Program,
      2 => Function,
      3 => VarDecl,
      4 => CompoundStmt,
      5 => ReturnStmt,
      6 => IfStmt,
      7 => WhileStmt,
      8 => ForStmt,
      9 => Assign,
      10 => Call,
      11 => BinaryOp,
      12 => UnaryOp,
      13 => Identifier,
      14 => Constant,
      15 => StringLiteral,
      16 => ArrayAccess,
      17 => BreakStmt,
      18 => ContinueStmt,
      19 => GotoStmt,
      20 => LabelStmt,
      21 => EmptyStmt,
      _ => return None,
    })
  }
}

/// Binary operator codes, in spec §6.2 source order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum BinOpCode {
  Add = 0,
  Sub = 1,
  Mul = 2,
  Div = 3,
  Mod = 4,
  And = 5,
  Or = 6,
  Xor = 7,
  Shl = 8,
  Shr = 9,
  Eq = 10,
  Ne = 11,
  Lt = 12,
  Le = 13,
  Gt = 14,
  Ge = 15,
  LAnd = 16,
  LOr = 17,
}

impl BinOpCode {
  pub fn from_u8(byte: u8) -> Option<BinOpCode> {
    use BinOpCode::*;
    Some(match byte {
      0 => Add,
      1 => Sub,
      2 => Mul,
      3 => Div,
      4 => Mod,
      5 => And,
      6 => Or,
      7 => Xor,
      8 => Shl,
      9 => Shr,
      10 => Eq,
      11 => Ne,
      12 => Lt,
      13 => Le,
      14 => Gt,
      15 => Ge,
      16 => LAnd,
      17 => LOr,
      _ => return None,
    })
  }

  pub fn from_ast(op: cc_core::ast::BinOp) -> BinOpCode {
    use cc_core::ast::BinOp::*;
    match op {
      Add => BinOpCode::Add,
      Sub => BinOpCode::Sub,
      Mul => BinOpCode::Mul,
      Div => BinOpCode::Div,
      Mod => BinOpCode::Mod,
      And => BinOpCode::And,
      Or => BinOpCode::Or,
      Xor => BinOpCode::Xor,
      Shl => BinOpCode::Shl,
      Shr => BinOpCode::Shr,
      Eq => BinOpCode::Eq,
      Ne => BinOpCode::Ne,
      Lt => BinOpCode::Lt,
      Le => BinOpCode::Le,
      Gt => BinOpCode::Gt,
      Ge => BinOpCode::Ge,
      LAnd => BinOpCode::LAnd,
      LOr => BinOpCode::LOr,
    }
  }

  pub fn to_ast(self) -> cc_core::ast::BinOp {
    use cc_core::ast::BinOp::*;
    match self {
      BinOpCode::Add => Add,
      BinOpCode::Sub => Sub,
      BinOpCode::Mul => Mul,
      BinOpCode::Div => Div,
      BinOpCode::Mod => Mod,
      BinOpCode::And => And,
      BinOpCode::Or => Or,
      BinOpCode::Xor => Xor,
      BinOpCode::Shl => Shl,
      BinOpCode::Shr => Shr,
      BinOpCode::Eq => Eq,
      BinOpCode::Ne => Ne,
      BinOpCode::Lt => Lt,
      BinOpCode::Le => Le,
      BinOpCode::Gt => Gt,
      BinOpCode::Ge => Ge,
      BinOpCode::LAnd => LAnd,
      BinOpCode::LOr => LOr,
    }
  }
}

/// Unary operator codes, in spec §6.2 source order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum UnOpCode {
  Neg = 0,
  Not = 1,
  LNot = 2,
  Addr = 3,
  Deref = 4,
  PreInc = 5,
  PreDec = 6,
  PostInc = 7,
  PostDec = 8,
}

impl UnOpCode {
  pub fn from_u8(byte: u8) -> Option<UnOpCode> {
    use UnOpCode::*;
    Some(match byte {
      0 => Neg,
      1 => Not,
      2 => LNot,
      3 => Addr,
      4 => Deref,
      5 => PreInc,
      6 => PreDec,
      7 => PostInc,
      8 => PostDec,
      _ => return None,
    })
  }

  pub fn from_ast(op: cc_core::ast::UnOp) -> UnOpCode {
    use cc_core::ast::UnOp::*;
    match op {
      Neg => UnOpCode::Neg,
      Not => UnOpCode::Not,
      LNot => UnOpCode::LNot,
      Addr => UnOpCode::Addr,
      Deref => UnOpCode::Deref,
      PreInc => UnOpCode::PreInc,
      PreDec => UnOpCode::PreDec,
      PostInc => UnOpCode::PostInc,
      PostDec => UnOpCode::PostDec,
    }
  }

  pub fn to_ast(self) -> cc_core::ast::UnOp {
    use cc_core::ast::UnOp::*;
    match self {
      UnOpCode::Neg => Neg,
      UnOpCode::Not => Not,
      UnOpCode::LNot => LNot,
      UnOpCode::Addr => Addr,
      UnOpCode::Deref => Deref,
      UnOpCode::PreInc => PreInc,
      UnOpCode::PreDec => PreDec,
      UnOpCode::PostInc => PostInc,
      UnOpCode::PostDec => PostDec,
    }
  }
}
