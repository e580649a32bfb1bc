//! Recursive-descent parser with one-token lookahead (spec §4.3).
//!
//! [`Parser::parse`] builds a full [`Node::Program`]; [`Parser::parse_next`]
//! is the streaming entry point the parser *stage* actually drives, handing
//! back one top-level declaration at a time so the binary-codec writer can
//! intern and discard each declaration without holding the whole program in
//! memory (spec §3.5, §4.4.2).

use crate::{
  ast::{BinOp, Node, UnOp, MAX_ARGS, MAX_DECLS, MAX_PARAMS, MAX_STMTS},
  lexer::Lexer,
  token::{Keyword, Punct, Token, TokenKind},
  types::{Qualifiers, QualifiedType, Type},
};
use cc_runtime::{ByteReader, CcResult};

pub struct Parser<R> {
  lexer: Lexer<R>,
  cur: Token,
  next: Token,
  error_count: u32,
  decl_count: usize,
}

impl<R: ByteReader> Parser<R> {
  pub fn new(reader: R) -> CcResult<Self> {
    let mut lexer = Lexer::new(reader)?;
    let cur = lexer.next_token()?;
    let next = lexer.next_token()?;
    Ok(Self { lexer, cur, next, error_count: 0, decl_count: 0 })
  }

  pub fn error_count(&self) -> u32 {
    self.error_count
  }

  fn advance(&mut self) -> CcResult<()> {
    self.cur = std::mem::replace(&mut self.next, self.lexer.next_token()?);
    Ok(())
  }

  fn diag(&mut self, msg: impl AsRef<str>) {
    self.error_count += 1;
    cc_runtime::log_error(&format!("{}:{}: {}", self.cur.line, self.cur.col, msg.as_ref()));
  }

  fn at_punct(&self, p: Punct) -> bool {
    self.cur.kind == TokenKind::Punct(p)
  }

  fn at_keyword(&self, k: Keyword) -> bool {
    self.cur.kind == TokenKind::Keyword(k)
  }

  fn eat_punct(&mut self, p: Punct, what: &str) -> CcResult<bool> {
    if self.at_punct(p) {
      self.advance()?;
      Ok(true)
    } else {
      self.diag(format!("Expected {what}"));
      Ok(false)
    }
  }

  fn eat_ident(&mut self, what: &str) -> CcResult<String> {
    if self.cur.kind == TokenKind::Ident {
      let name = self.cur.lexeme.clone().unwrap_or_default();
      self.advance()?;
      Ok(name)
    } else {
      self.diag(format!("Expected {what}"));
      Ok(String::new())
    }
  }

  fn is_type_start(&self) -> bool {
    use Keyword::*;
    matches!(
      self.cur.kind,
      TokenKind::Keyword(Void)
        | TokenKind::Keyword(Char)
        | TokenKind::Keyword(Short)
        | TokenKind::Keyword(Int)
        | TokenKind::Keyword(Long)
        | TokenKind::Keyword(Signed)
        | TokenKind::Keyword(Unsigned)
    )
  }

  fn skip_storage_qualifiers(&mut self) -> CcResult<()> {
    use Keyword::*;
    while matches!(self.cur.kind, TokenKind::Keyword(Const) | TokenKind::Keyword(Volatile) | TokenKind::Keyword(Static) | TokenKind::Keyword(Extern) | TokenKind::Keyword(Register)) {
      self.advance()?;
    }
    Ok(())
  }

  /// `Type := (signed|unsigned)? BaseType (signed|unsigned)? "*"*`
  fn parse_type(&mut self) -> CcResult<QualifiedType> {
    self.skip_storage_qualifiers()?;

    let mut sign: Option<bool> = None; // Some(true) = unsigned
    if self.at_keyword(Keyword::Signed) {
      sign = Some(false);
      self.advance()?;
    } else if self.at_keyword(Keyword::Unsigned) {
      sign = Some(true);
      self.advance()?;
    }

    self.skip_storage_qualifiers()?;

    let base = if self.at_keyword(Keyword::Void) {
      self.advance()?;
      Type::Void
    } else if self.at_keyword(Keyword::Char) {
      self.advance()?;
      Type::Char
    } else if self.at_keyword(Keyword::Short) {
      self.advance()?;
      Type::Short
    } else if self.at_keyword(Keyword::Int) {
      self.advance()?;
      Type::Int
    } else if self.at_keyword(Keyword::Long) {
      self.advance()?;
      Type::Long
    } else if sign.is_some() {
      // An omitted base type with a sign qualifier defaults to `int`.
      Type::Int
    } else {
      self.diag("Expected type");
      Type::Int
    };

    self.skip_storage_qualifiers()?;

    if self.at_keyword(Keyword::Signed) || self.at_keyword(Keyword::Unsigned) {
      let trailing = self.at_keyword(Keyword::Unsigned);
      if sign.is_some() {
        self.diag("conflicting signed/unsigned qualifiers");
      } else {
        sign = Some(trailing);
      }
      self.advance()?;
    }

    let is_unsigned = sign.unwrap_or(false);
    if is_unsigned && matches!(base, Type::Void) {
      self.diag("unsigned void is a parse error");
    }

    let mut ty = base;
    while self.at_punct(Punct::Star) {
      self.advance()?;
      ty = Type::Pointer(Box::new(ty));
    }

    Ok(QualifiedType::new(ty, Qualifiers { is_unsigned, ..Default::default() }))
  }

  /// The streaming entry point used by the parser stage: returns the next
  /// top-level declaration, or `None` at EOF.
  pub fn parse_next(&mut self) -> CcResult<Option<Node>> {
    self.skip_storage_qualifiers()?;
    if self.cur.is_eof() {
      return Ok(None);
    }
    if self.decl_count >= MAX_DECLS {
      self.diag("too many top-level declarations");
      // Drain remaining input without building more nodes.
      while !self.cur.is_eof() {
        self.advance()?;
      }
      return Ok(None);
    }
    self.decl_count += 1;
    self.parse_declaration().map(Some)
  }

  /// Builds the full program, collecting every declaration.
  pub fn parse(&mut self) -> CcResult<Node> {
    let mut decls = Vec::new();
    while let Some(decl) = self.parse_next()? {
      decls.push(decl);
    }
    Ok(Node::Program { decls })
  }

  fn parse_declaration(&mut self) -> CcResult<Node> {
    let ret = self.parse_type()?;
    let name = self.eat_ident("identifier")?;

    if self.at_punct(Punct::LParen) {
      self.parse_function_tail(name, ret)
    } else {
      self.parse_var_tail(name, ret)
    }
  }

  fn parse_function_tail(&mut self, name: String, ret: QualifiedType) -> CcResult<Node> {
    self.eat_punct(Punct::LParen, "'('")?;
    let params = self.parse_params()?;
    self.eat_punct(Punct::RParen, "')'")?;
    let body = self.parse_compound()?;
    Ok(Node::Function { name, ret, params, body: Box::new(body) })
  }

  fn parse_params(&mut self) -> CcResult<Vec<Node>> {
    let mut params = Vec::new();
    if self.at_keyword(Keyword::Void) && self.next.kind == TokenKind::Punct(Punct::RParen) {
      self.advance()?;
      return Ok(params);
    }
    if self.at_punct(Punct::RParen) {
      return Ok(params);
    }
    loop {
      let param = self.parse_parameter()?;
      if params.len() < MAX_PARAMS {
        params.push(param);
      } else if params.len() == MAX_PARAMS {
        self.diag("too many parameters");
        break;
      }
      if self.at_punct(Punct::Comma) {
        self.advance()?;
      } else {
        break;
      }
    }
    Ok(params)
  }

  fn parse_parameter(&mut self) -> CcResult<Node> {
    let qty = self.parse_type()?;
    let name = self.eat_ident("parameter name")?;
    let mut ty = qty.ty;
    if self.at_punct(Punct::LBracket) {
      self.advance()?;
      if self.cur.kind == TokenKind::Int {
        self.advance()?; // length ignored: parameters always decay to pointer
      }
      self.eat_punct(Punct::RBracket, "']'")?;
      ty = Type::Pointer(Box::new(ty));
    }
    Ok(Node::VarDecl { name, ty: QualifiedType::new(ty, qty.quals), init: None })
  }

  fn parse_var_tail(&mut self, name: String, qty: QualifiedType) -> CcResult<Node> {
    let mut ty = qty.ty;
    if self.at_punct(Punct::LBracket) {
      self.advance()?;
      if self.cur.kind == TokenKind::Int {
        let len = self.cur.value;
        self.advance()?;
        if len <= 0 {
          self.diag("array length must be a positive integer literal");
        }
        ty = Type::Array(Box::new(ty), len.max(0) as u16);
      } else {
        self.diag("Expected array length");
      }
      self.eat_punct(Punct::RBracket, "']'")?;
    }

    let init = if self.at_punct(Punct::Assign) {
      self.advance()?;
      Some(Box::new(self.parse_expression()?))
    } else {
      None
    };

    self.eat_punct(Punct::Semi, "';'")?;
    Ok(Node::VarDecl { name, ty: QualifiedType::new(ty, qty.quals), init })
  }

  fn parse_statement(&mut self) -> CcResult<Node> {
    use Keyword::*;
    if self.is_type_start()
      || matches!(self.cur.kind, TokenKind::Keyword(Const) | TokenKind::Keyword(Volatile) | TokenKind::Keyword(Static) | TokenKind::Keyword(Extern) | TokenKind::Keyword(Register))
    {
      let qty = self.parse_type()?;
      let name = self.eat_ident("identifier")?;
      return self.parse_var_tail(name, qty);
    }
    if self.at_keyword(If) {
      return self.parse_if();
    }
    if self.at_keyword(While) {
      return self.parse_while();
    }
    if self.at_keyword(For) {
      return self.parse_for();
    }
    if self.at_keyword(Return) {
      self.advance()?;
      let expr = if self.at_punct(Punct::Semi) { None } else { Some(Box::new(self.parse_expression()?)) };
      self.eat_punct(Punct::Semi, "';'")?;
      return Ok(Node::Return { expr });
    }
    if self.at_keyword(Break) {
      self.advance()?;
      self.eat_punct(Punct::Semi, "';'")?;
      return Ok(Node::Break);
    }
    if self.at_keyword(Continue) {
      self.advance()?;
      self.eat_punct(Punct::Semi, "';'")?;
      return Ok(Node::Continue);
    }
    if self.at_keyword(Goto) {
      self.advance()?;
      let name = self.eat_ident("label name")?;
      self.eat_punct(Punct::Semi, "';'")?;
      return Ok(Node::Goto { name });
    }
    if self.cur.kind == TokenKind::Ident && self.next.kind == TokenKind::Punct(Punct::Colon) {
      let name = self.cur.lexeme.clone().unwrap_or_default();
      self.advance()?;
      self.advance()?;
      return Ok(Node::Label { name });
    }
    if self.at_punct(Punct::LBrace) {
      return self.parse_compound();
    }
    self.parse_expr_stmt()
  }

  fn parse_compound(&mut self) -> CcResult<Node> {
    self.eat_punct(Punct::LBrace, "'{'")?;
    let mut stmts = Vec::new();
    while !self.at_punct(Punct::RBrace) && !self.cur.is_eof() {
      let stmt = self.parse_statement()?;
      if stmts.len() < MAX_STMTS {
        stmts.push(stmt);
      } else if stmts.len() == MAX_STMTS {
        self.diag("too many statements in compound");
        break;
      }
    }
    self.eat_punct(Punct::RBrace, "'}'")?;
    Ok(Node::Compound { stmts })
  }

  fn parse_if(&mut self) -> CcResult<Node> {
    self.advance()?; // 'if'
    self.eat_punct(Punct::LParen, "'('")?;
    let cond = Box::new(self.parse_expression()?);
    self.eat_punct(Punct::RParen, "')'")?;
    let then_branch = Box::new(self.parse_statement()?);
    let else_branch = if self.at_keyword(Keyword::Else) {
      self.advance()?;
      Some(Box::new(self.parse_statement()?))
    } else {
      None
    };
    Ok(Node::If { cond, then_branch, else_branch })
  }

  fn parse_while(&mut self) -> CcResult<Node> {
    self.advance()?; // 'while'
    self.eat_punct(Punct::LParen, "'('")?;
    let cond = Box::new(self.parse_expression()?);
    self.eat_punct(Punct::RParen, "')'")?;
    let body = Box::new(self.parse_statement()?);
    Ok(Node::While { cond, body })
  }

  fn parse_for(&mut self) -> CcResult<Node> {
    self.advance()?; // 'for'
    self.eat_punct(Punct::LParen, "'('")?;

    let init = if self.at_punct(Punct::Semi) {
      self.advance()?;
      None
    } else {
      let stmt = self.parse_for_init()?;
      Some(Box::new(stmt))
    };

    let cond = if self.at_punct(Punct::Semi) { None } else { Some(Box::new(self.parse_expression()?)) };
    self.eat_punct(Punct::Semi, "';'")?;

    let inc = if self.at_punct(Punct::RParen) { None } else { Some(Box::new(self.parse_expression()?)) };
    self.eat_punct(Punct::RParen, "')'")?;

    let body = Box::new(self.parse_statement()?);
    Ok(Node::For { init, cond, inc, body })
  }

  /// `for`'s init clause is `Statement | ";"`; a `Statement` here is either a
  /// local `VarDecl` or an expression, both of which already consume their
  /// own trailing `;` when parsed through the usual statement paths.
  fn parse_for_init(&mut self) -> CcResult<Node> {
    if self.is_type_start() {
      let qty = self.parse_type()?;
      let name = self.eat_ident("identifier")?;
      self.parse_var_tail(name, qty)
    } else {
      let expr = self.parse_expression()?;
      self.eat_punct(Punct::Semi, "';'")?;
      Ok(expr)
    }
  }

  fn parse_expr_stmt(&mut self) -> CcResult<Node> {
    if self.at_punct(Punct::Semi) {
      self.advance()?;
      return Ok(Node::EmptyStmt);
    }
    let expr = self.parse_expression()?;
    self.eat_punct(Punct::Semi, "';'")?;
    Ok(expr)
  }

  // ---- Expressions, lowest to highest precedence (spec §4.3.2) ----

  fn parse_expression(&mut self) -> CcResult<Node> {
    self.parse_assignment()
  }

  fn parse_assignment(&mut self) -> CcResult<Node> {
    let lhs = self.parse_logical_or()?;
    if self.at_punct(Punct::Assign) {
      self.advance()?;
      let rhs = self.parse_assignment()?;
      return Ok(Node::Assign { lvalue: Box::new(lhs), rvalue: Box::new(rhs) });
    }
    Ok(lhs)
  }

  fn parse_logical_or(&mut self) -> CcResult<Node> {
    let mut lhs = self.parse_logical_and()?;
    while self.at_punct(Punct::OrOr) {
      self.advance()?;
      let rhs = self.parse_logical_and()?;
      lhs = Node::BinaryOp { op: BinOp::LOr, left: Box::new(lhs), right: Box::new(rhs) };
    }
    Ok(lhs)
  }

  fn parse_logical_and(&mut self) -> CcResult<Node> {
    let mut lhs = self.parse_bitwise_or()?;
    while self.at_punct(Punct::AndAnd) {
      self.advance()?;
      let rhs = self.parse_bitwise_or()?;
      lhs = Node::BinaryOp { op: BinOp::LAnd, left: Box::new(lhs), right: Box::new(rhs) };
    }
    Ok(lhs)
  }

  fn parse_bitwise_or(&mut self) -> CcResult<Node> {
    let mut lhs = self.parse_bitwise_xor()?;
    while self.at_punct(Punct::Pipe) {
      self.advance()?;
      let rhs = self.parse_bitwise_xor()?;
      lhs = Node::BinaryOp { op: BinOp::Or, left: Box::new(lhs), right: Box::new(rhs) };
    }
    Ok(lhs)
  }

  fn parse_bitwise_xor(&mut self) -> CcResult<Node> {
    let mut lhs = self.parse_bitwise_and()?;
    while self.at_punct(Punct::Caret) {
      self.advance()?;
      let rhs = self.parse_bitwise_and()?;
      lhs = Node::BinaryOp { op: BinOp::Xor, left: Box::new(lhs), right: Box::new(rhs) };
    }
    Ok(lhs)
  }

  fn parse_bitwise_and(&mut self) -> CcResult<Node> {
    let mut lhs = self.parse_comparison()?;
    while self.at_punct(Punct::Amp) {
      self.advance()?;
      let rhs = self.parse_comparison()?;
      lhs = Node::BinaryOp { op: BinOp::And, left: Box::new(lhs), right: Box::new(rhs) };
    }
    Ok(lhs)
  }

  fn parse_comparison(&mut self) -> CcResult<Node> {
    let mut lhs = self.parse_shift()?;
    loop {
      let op = match self.cur.kind {
        TokenKind::Punct(Punct::Lt) => BinOp::Lt,
        TokenKind::Punct(Punct::Gt) => BinOp::Gt,
        TokenKind::Punct(Punct::LtEq) => BinOp::Le,
        TokenKind::Punct(Punct::GtEq) => BinOp::Ge,
        TokenKind::Punct(Punct::EqEq) => BinOp::Eq,
        TokenKind::Punct(Punct::NotEq) => BinOp::Ne,
        _ => break,
      };
      self.advance()?;
      let rhs = self.parse_shift()?;
      lhs = Node::BinaryOp { op, left: Box::new(lhs), right: Box::new(rhs) };
    }
    Ok(lhs)
  }

  fn parse_shift(&mut self) -> CcResult<Node> {
    let mut lhs = self.parse_term()?;
    loop {
      let op = match self.cur.kind {
        TokenKind::Punct(Punct::Shl) => BinOp::Shl,
        TokenKind::Punct(Punct::Shr) => BinOp::Shr,
        _ => break,
      };
      self.advance()?;
      let rhs = self.parse_term()?;
      lhs = Node::BinaryOp { op, left: Box::new(lhs), right: Box::new(rhs) };
    }
    Ok(lhs)
  }

  fn parse_term(&mut self) -> CcResult<Node> {
    let mut lhs = self.parse_factor()?;
    loop {
      let op = match self.cur.kind {
        TokenKind::Punct(Punct::Plus) => BinOp::Add,
        TokenKind::Punct(Punct::Minus) => BinOp::Sub,
        _ => break,
      };
      self.advance()?;
      let rhs = self.parse_factor()?;
      lhs = Node::BinaryOp { op, left: Box::new(lhs), right: Box::new(rhs) };
    }
    Ok(lhs)
  }

  fn parse_factor(&mut self) -> CcResult<Node> {
    let mut lhs = self.parse_unary()?;
    loop {
      let op = match self.cur.kind {
        TokenKind::Punct(Punct::Star) => BinOp::Mul,
        TokenKind::Punct(Punct::Slash) => BinOp::Div,
        TokenKind::Punct(Punct::Percent) => BinOp::Mod,
        _ => break,
      };
      self.advance()?;
      let rhs = self.parse_unary()?;
      lhs = Node::BinaryOp { op, left: Box::new(lhs), right: Box::new(rhs) };
    }
    Ok(lhs)
  }

  fn parse_unary(&mut self) -> CcResult<Node> {
    let op = match self.cur.kind {
      TokenKind::Punct(Punct::Plus) => {
        self.advance()?;
        // Unary `+` collapses to its operand.
        return self.parse_unary();
      }
      TokenKind::Punct(Punct::Minus) => Some(UnOp::Neg),
      TokenKind::Punct(Punct::Bang) => Some(UnOp::Not),
      TokenKind::Punct(Punct::Tilde) => Some(UnOp::LNot),
      TokenKind::Punct(Punct::PlusPlus) => Some(UnOp::PreInc),
      TokenKind::Punct(Punct::MinusMinus) => Some(UnOp::PreDec),
      TokenKind::Punct(Punct::Star) => Some(UnOp::Deref),
      TokenKind::Punct(Punct::Amp) => Some(UnOp::Addr),
      _ => None,
    };
    if let Some(op) = op {
      self.advance()?;
      let operand = Box::new(self.parse_unary()?);
      return Ok(Node::UnaryOp { op, operand });
    }
    self.parse_postfix()
  }

  fn parse_postfix(&mut self) -> CcResult<Node> {
    let mut expr = self.parse_primary()?;
    loop {
      if self.at_punct(Punct::LBracket) {
        self.advance()?;
        let index = Box::new(self.parse_expression()?);
        self.eat_punct(Punct::RBracket, "']'")?;
        expr = Node::ArrayAccess { base: Box::new(expr), index };
      } else if self.at_punct(Punct::PlusPlus) {
        self.advance()?;
        expr = Node::UnaryOp { op: UnOp::PostInc, operand: Box::new(expr) };
      } else if self.at_punct(Punct::MinusMinus) {
        self.advance()?;
        expr = Node::UnaryOp { op: UnOp::PostDec, operand: Box::new(expr) };
      } else {
        break;
      }
    }
    Ok(expr)
  }

  fn parse_primary(&mut self) -> CcResult<Node> {
    match self.cur.kind.clone() {
      TokenKind::Ident => {
        let name = self.cur.lexeme.clone().unwrap_or_default();
        self.advance()?;
        if self.at_punct(Punct::LParen) {
          self.advance()?;
          let mut args = Vec::new();
          if !self.at_punct(Punct::RParen) {
            loop {
              let arg = self.parse_assignment()?;
              if args.len() < MAX_ARGS {
                args.push(arg);
              } else if args.len() == MAX_ARGS {
                self.diag("too many call arguments");
                break;
              }
              if self.at_punct(Punct::Comma) {
                self.advance()?;
              } else {
                break;
              }
            }
          }
          self.eat_punct(Punct::RParen, "')'")?;
          Ok(Node::Call { name, args })
        } else {
          Ok(Node::Identifier { name })
        }
      }
      // Numbers and char literals both arrive as `TokenKind::Int` (spec
      // §3.1: char literals materialize as integer tokens).
      TokenKind::Int => {
        let value = self.cur.value;
        self.advance()?;
        Ok(Node::Constant { value })
      }
      TokenKind::Str => {
        let value = self.cur.lexeme.clone().unwrap_or_default();
        self.advance()?;
        Ok(Node::StringLiteral { value })
      }
      TokenKind::Punct(Punct::LParen) => {
        self.advance()?;
        let expr = self.parse_expression()?;
        self.eat_punct(Punct::RParen, "')'")?;
        Ok(expr)
      }
      _ => {
        self.diag("Expected expression");
        self.advance()?;
        Ok(Node::Constant { value: 0 })
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  struct SliceReader<'a> {
    data: &'a [u8],
    pos: usize,
  }

  impl<'a> ByteReader for SliceReader<'a> {
    fn next(&mut self) -> CcResult<Option<u8>> {
      if self.pos < self.data.len() {
        let b = self.data[self.pos];
        self.pos += 1;
        Ok(Some(b))
      } else {
        Ok(None)
      }
    }
    fn peek(&mut self) -> CcResult<Option<u8>> {
      Ok(self.data.get(self.pos).copied())
    }
    fn seek(&mut self, abs: u32) -> CcResult<()> {
      self.pos = abs as usize;
      Ok(())
    }
    fn tell(&self) -> u32 {
      self.pos as u32
    }
  }

  fn parse(src: &str) -> (Node, u32) {
    let reader = SliceReader { data: src.as_bytes(), pos: 0 };
    let mut parser = Parser::new(reader).unwrap();
    let program = parser.parse().unwrap();
    (program, parser.error_count())
  }

  #[test]
  fn parses_trivial_main() {
    let (prog, errs) = parse("int main() { return 0; }");
    assert_eq!(errs, 0);
    let Node::Program { decls } = prog else { panic!() };
    assert_eq!(decls.len(), 1);
    assert!(decls[0].is_function());
  }

  #[test]
  fn operator_precedence_mul_before_add() {
    let (prog, errs) = parse("int main() { return 1 + 2 * 3; }");
    assert_eq!(errs, 0);
    let Node::Program { decls } = prog else { panic!() };
    let Node::Function { body, .. } = &decls[0] else { panic!() };
    let Node::Compound { stmts } = body.as_ref() else { panic!() };
    let Node::Return { expr } = &stmts[0] else { panic!() };
    let Node::BinaryOp { op, right, .. } = expr.as_deref().unwrap() else { panic!() };
    assert_eq!(*op, BinOp::Add);
    assert!(matches!(right.as_ref(), Node::BinaryOp { op: BinOp::Mul, .. }));
  }

  #[test]
  fn missing_array_length_is_a_parse_error() {
    let (_prog, errs) = parse("int main(){ int x[]; return 0; }");
    assert!(errs > 0);
  }

  #[test]
  fn fanout_limit_keeps_first_32_decls() {
    let mut src = String::new();
    for i in 0..40 {
      src.push_str(&format!("int g{i};\n"));
    }
    let (prog, errs) = parse(&src);
    let Node::Program { decls } = prog else { panic!() };
    assert_eq!(decls.len(), MAX_DECLS);
    assert!(errs > 0);
  }

  #[test]
  fn parameter_array_decays_to_pointer() {
    let (prog, errs) = parse("int f(int a[]) { return 0; }");
    assert_eq!(errs, 0);
    let Node::Program { decls } = prog else { panic!() };
    let Node::Function { params, .. } = &decls[0] else { panic!() };
    let Node::VarDecl { ty, .. } = &params[0] else { panic!() };
    assert!(ty.ty.is_pointer());
  }
}
