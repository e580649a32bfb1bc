//! Token kinds and the `Token` value produced by the lexer (spec §3.1).

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Keyword {
  Auto,
  Break,
  Case,
  Char,
  Const,
  Continue,
  Default,
  Do,
  Else,
  For,
  Goto,
  If,
  Int,
  Long,
  Return,
  Signed,
  Switch,
  Unsigned,
  Void,
  While,
  // Parsed, never propagated to the AST (spec §9, storage qualifiers).
  Static,
  Extern,
  Register,
  Volatile,
}

impl Keyword {
  pub fn lookup(ident: &str) -> Option<Keyword> {
    use Keyword::*;
    Some(match ident {
      "auto" => Auto,
      "break" => Break,
      "case" => Case,
      "char" => Char,
      "const" => Const,
      "continue" => Continue,
      "default" => Default,
      "do" => Do,
      "else" => Else,
      "for" => For,
      "goto" => Goto,
      "if" => If,
      "int" => Int,
      "long" => Long,
      "return" => Return,
      "signed" => Signed,
      "switch" => Switch,
      "unsigned" => Unsigned,
      "void" => Void,
      "while" => While,
      "static" => Static,
      "extern" => Extern,
      "register" => Register,
      "volatile" => Volatile,
      _ => return None,
    })
  }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Punct {
  Plus,
  Minus,
  Star,
  Slash,
  Percent,
  Amp,
  Pipe,
  Caret,
  Tilde,
  Bang,
  Assign,
  Lt,
  Gt,
  LParen,
  RParen,
  LBrace,
  RBrace,
  LBracket,
  RBracket,
  Semi,
  Comma,
  Colon,
  Arrow,
  PlusAssign,
  MinusAssign,
  StarAssign,
  SlashAssign,
  PercentAssign,
  AmpAssign,
  PipeAssign,
  CaretAssign,
  ShlAssign,
  ShrAssign,
  AndAnd,
  OrOr,
  EqEq,
  NotEq,
  LtEq,
  GtEq,
  Shl,
  Shr,
  PlusPlus,
  MinusMinus,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TokenKind {
  Keyword(Keyword),
  Ident,
  Int,
  Char,
  Str,
  Punct(Punct),
  Eof,
  Error,
}

#[derive(Clone, Debug)]
pub struct Token {
  pub kind: TokenKind,
  pub line: u32,
  pub col: u32,
  /// Owned lexeme text for identifiers and strings.
  pub lexeme: Option<String>,
  /// 16-bit signed value for numeric/char literals; truncated per spec §4.2.
  pub value: i16,
}

impl Token {
  pub fn new(kind: TokenKind, line: u32, col: u32) -> Self {
    Self { kind, line, col, lexeme: None, value: 0 }
  }

  pub fn with_lexeme(mut self, lexeme: impl Into<String>) -> Self {
    self.lexeme = Some(lexeme.into());
    self
  }

  pub fn with_value(mut self, value: i16) -> Self {
    self.value = value;
    self
  }

  pub fn is_eof(&self) -> bool {
    matches!(self.kind, TokenKind::Eof)
  }
}
