//! Converts a byte stream into a stream of tokens (spec §4.2).
//!
//! The lexer never aborts: malformed input surfaces as [`TokenKind::Error`]
//! tokens and scanning continues. EOF is sticky — once the underlying
//! [`ByteReader`] reports end of input, every subsequent call returns an
//! `Eof` token.

use crate::arena::Arena;
use crate::token::{Keyword, Punct, Token, TokenKind};
use cc_runtime::{ByteReader, CcResult};

/// Strings are capped at 256 bytes including the NUL terminator a future
/// codegen pass will append, so at most 255 content bytes are kept.
pub const MAX_STRING_LEN: usize = 255;

/// Sized to hold one `MAX_STRING_LEN`-byte scratch block plus its arena
/// header with room to spare for alignment padding (spec §4.1).
const SCRATCH_ARENA_CAPACITY: u32 = 512;

pub struct Lexer<R> {
  reader: R,
  line: u32,
  col: u32,
  cur: Option<u8>,
  eof_reported: bool,
  /// Backs each string literal's scratch byte buffer (spec §4.1): one block
  /// is allocated per literal, filled in place, copied into the token's
  /// owned `String`, then freed — the lexer never holds more than one live
  /// block at a time.
  scratch: Arena,
}

impl<R: ByteReader> Lexer<R> {
  pub fn new(mut reader: R) -> CcResult<Self> {
    let cur = reader.next()?;
    Ok(Self { reader, line: 1, col: 1, cur, eof_reported: false, scratch: Arena::new(SCRATCH_ARENA_CAPACITY) })
  }

  fn bump(&mut self) -> CcResult<Option<u8>> {
    let c = self.cur;
    if let Some(ch) = c {
      if ch == b'\n' {
        self.line += 1;
        self.col = 1;
      } else {
        self.col += 1;
      }
    }
    self.cur = self.reader.next()?;
    Ok(c)
  }

  fn peek2(&mut self) -> CcResult<Option<u8>> {
    self.reader.peek()
  }

  fn skip_trivia(&mut self) -> CcResult<()> {
    loop {
      match self.cur {
        Some(b' ') | Some(b'\t') | Some(b'\n') | Some(b'\r') => {
          self.bump()?;
        }
        Some(b'/') if self.peek2()? == Some(b'/') => {
          while self.cur.is_some() && self.cur != Some(b'\n') {
            self.bump()?;
          }
        }
        Some(b'/') if self.peek2()? == Some(b'*') => {
          self.bump()?; // '/'
          self.bump()?; // '*'
          loop {
            match self.cur {
              None => break,
              Some(b'*') if self.peek2()? == Some(b'/') => {
                self.bump()?;
                self.bump()?;
                break;
              }
              _ => {
                self.bump()?;
              }
            }
          }
        }
        _ => break,
      }
    }
    Ok(())
  }

  /// Returns the next token. One call yields exactly one token.
  pub fn next_token(&mut self) -> CcResult<Token> {
    self.skip_trivia()?;
    let (line, col) = (self.line, self.col);

    let Some(c) = self.cur else {
      self.eof_reported = true;
      return Ok(Token::new(TokenKind::Eof, line, col));
    };

    if c.is_ascii_alphabetic() || c == b'_' {
      return self.lex_ident(line, col);
    }
    if c.is_ascii_digit() {
      return self.lex_number(line, col);
    }
    if c == b'"' {
      return self.lex_string(line, col);
    }
    if c == b'\'' {
      return self.lex_char(line, col);
    }
    self.lex_operator(line, col)
  }

  fn lex_ident(&mut self, line: u32, col: u32) -> CcResult<Token> {
    let mut text = String::new();
    while let Some(c) = self.cur {
      if c.is_ascii_alphanumeric() || c == b'_' {
        text.push(c as char);
        self.bump()?;
      } else {
        break;
      }
    }
    if let Some(kw) = Keyword::lookup(&text) {
      Ok(Token::new(TokenKind::Keyword(kw), line, col).with_lexeme(text))
    } else {
      Ok(Token::new(TokenKind::Ident, line, col).with_lexeme(text))
    }
  }

  fn lex_number(&mut self, line: u32, col: u32) -> CcResult<Token> {
    let mut value: u32 = 0;
    if self.cur == Some(b'0') && matches!(self.peek2()?, Some(b'x') | Some(b'X')) {
      self.bump()?; // '0'
      self.bump()?; // 'x'/'X'
      let mut digits = 0;
      while let Some(c) = self.cur {
        if c.is_ascii_hexdigit() {
          value = value.wrapping_mul(16).wrapping_add((c as char).to_digit(16).unwrap());
          digits += 1;
          self.bump()?;
        } else {
          break;
        }
      }
      self.consume_number_suffix()?;
      if digits == 0 {
        return Ok(Token::new(TokenKind::Error, line, col));
      }
    } else {
      while let Some(c) = self.cur {
        if c.is_ascii_digit() {
          value = value.wrapping_mul(10).wrapping_add((c - b'0') as u32);
          self.bump()?;
        } else {
          break;
        }
      }
      self.consume_number_suffix()?;
    }
    Ok(Token::new(TokenKind::Int, line, col).with_value(value as u16 as i16))
  }

  fn consume_number_suffix(&mut self) -> CcResult<()> {
    while matches!(self.cur, Some(b'L') | Some(b'l') | Some(b'U') | Some(b'u') | Some(b'F') | Some(b'f')) {
      self.bump()?;
    }
    Ok(())
  }

  fn decode_escape(&mut self) -> CcResult<Option<u8>> {
    // Called with `cur` positioned just after the backslash.
    let Some(c) = self.cur else { return Ok(None) };
    let decoded = match c {
      b'n' => b'\n',
      b't' => b'\t',
      b'r' => b'\r',
      b'\\' => b'\\',
      b'"' => b'"',
      b'\'' => b'\'',
      b'0' => 0,
      other => other, // unknown escape: falls through as the literal char
    };
    self.bump()?;
    Ok(Some(decoded))
  }

  fn lex_string(&mut self, line: u32, col: u32) -> CcResult<Token> {
    self.bump()?; // opening quote
    let block = self.scratch.alloc(MAX_STRING_LEN as u32)?;
    let mut len = 0usize;
    loop {
      match self.cur {
        None => break,
        Some(b'"') => {
          self.bump()?;
          break;
        }
        Some(b'\\') => {
          self.bump()?;
          if let Some(decoded) = self.decode_escape()? {
            if len < MAX_STRING_LEN {
              self.scratch.get_mut(block)[len] = decoded;
              len += 1;
            }
          }
        }
        Some(c) => {
          if len < MAX_STRING_LEN {
            self.scratch.get_mut(block)[len] = c;
            len += 1;
          }
          self.bump()?;
        }
      }
    }
    let text = String::from_utf8_lossy(&self.scratch.get(block)[..len]).into_owned();
    self.scratch.free(block);
    Ok(Token::new(TokenKind::Str, line, col).with_lexeme(text))
  }

  fn lex_char(&mut self, line: u32, col: u32) -> CcResult<Token> {
    self.bump()?; // opening quote
    let value = match self.cur {
      Some(b'\\') => {
        self.bump()?;
        self.decode_escape()?.unwrap_or(0)
      }
      Some(c) => {
        self.bump()?;
        c
      }
      None => 0,
    };
    if self.cur == Some(b'\'') {
      self.bump()?;
    }
    // Char literals materialize as integer tokens after escape decoding
    // (spec §3.1).
    Ok(Token::new(TokenKind::Int, line, col).with_value(value as i16))
  }

  fn lex_operator(&mut self, line: u32, col: u32) -> CcResult<Token> {
    let c = self.cur.unwrap();
    let c2 = self.peek2()?;

    macro_rules! tok2 {
      ($p:expr) => {{
        self.bump()?;
        self.bump()?;
        Ok(Token::new(TokenKind::Punct($p), line, col))
      }};
    }
    macro_rules! tok1 {
      ($p:expr) => {{
        self.bump()?;
        Ok(Token::new(TokenKind::Punct($p), line, col))
      }};
    }

    match (c, c2) {
      (b'<', Some(b'<')) => {
        self.bump()?;
        self.bump()?;
        if self.cur == Some(b'=') {
          self.bump()?;
          Ok(Token::new(TokenKind::Punct(Punct::ShlAssign), line, col))
        } else {
          Ok(Token::new(TokenKind::Punct(Punct::Shl), line, col))
        }
      }
      (b'>', Some(b'>')) => {
        self.bump()?;
        self.bump()?;
        if self.cur == Some(b'=') {
          self.bump()?;
          Ok(Token::new(TokenKind::Punct(Punct::ShrAssign), line, col))
        } else {
          Ok(Token::new(TokenKind::Punct(Punct::Shr), line, col))
        }
      }
      (b'+', Some(b'=')) => tok2!(Punct::PlusAssign),
      (b'-', Some(b'=')) => tok2!(Punct::MinusAssign),
      (b'*', Some(b'=')) => tok2!(Punct::StarAssign),
      (b'/', Some(b'=')) => tok2!(Punct::SlashAssign),
      (b'%', Some(b'=')) => tok2!(Punct::PercentAssign),
      (b'&', Some(b'=')) => tok2!(Punct::AmpAssign),
      (b'|', Some(b'=')) => tok2!(Punct::PipeAssign),
      (b'^', Some(b'=')) => tok2!(Punct::CaretAssign),
      (b'&', Some(b'&')) => tok2!(Punct::AndAnd),
      (b'|', Some(b'|')) => tok2!(Punct::OrOr),
      (b'=', Some(b'=')) => tok2!(Punct::EqEq),
      (b'!', Some(b'=')) => tok2!(Punct::NotEq),
      (b'<', Some(b'=')) => tok2!(Punct::LtEq),
      (b'>', Some(b'=')) => tok2!(Punct::GtEq),
      (b'+', Some(b'+')) => tok2!(Punct::PlusPlus),
      (b'-', Some(b'-')) => tok2!(Punct::MinusMinus),
      (b'-', Some(b'>')) => tok2!(Punct::Arrow),
      (b'+', _) => tok1!(Punct::Plus),
      (b'-', _) => tok1!(Punct::Minus),
      (b'*', _) => tok1!(Punct::Star),
      (b'/', _) => tok1!(Punct::Slash),
      (b'%', _) => tok1!(Punct::Percent),
      (b'&', _) => tok1!(Punct::Amp),
      (b'|', _) => tok1!(Punct::Pipe),
      (b'^', _) => tok1!(Punct::Caret),
      (b'~', _) => tok1!(Punct::Tilde),
      (b'!', _) => tok1!(Punct::Bang),
      (b'=', _) => tok1!(Punct::Assign),
      (b'<', _) => tok1!(Punct::Lt),
      (b'>', _) => tok1!(Punct::Gt),
      (b'(', _) => tok1!(Punct::LParen),
      (b')', _) => tok1!(Punct::RParen),
      (b'{', _) => tok1!(Punct::LBrace),
      (b'}', _) => tok1!(Punct::RBrace),
      (b'[', _) => tok1!(Punct::LBracket),
      (b']', _) => tok1!(Punct::RBracket),
      (b';', _) => tok1!(Punct::Semi),
      (b',', _) => tok1!(Punct::Comma),
      (b':', _) => tok1!(Punct::Colon),
      _ => {
        self.bump()?;
        Ok(Token::new(TokenKind::Error, line, col))
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

  fn lex_all(src: &str) -> Vec<Token> {
    let reader = SliceReader { data: src.as_bytes(), pos: 0 };
    let mut lexer = Lexer::new(reader).unwrap();
    let mut out = Vec::new();
    loop {
      let tok = lexer.next_token().unwrap();
      let is_eof = tok.is_eof();
      out.push(tok);
      if is_eof {
        break;
      }
    }
    out
  }

  #[test]
  fn keywords_and_idents() {
    let toks = lex_all("int foo_bar return");
    assert_eq!(toks[0].kind, TokenKind::Keyword(Keyword::Int));
    assert_eq!(toks[1].kind, TokenKind::Ident);
    assert_eq!(toks[1].lexeme.as_deref(), Some("foo_bar"));
    assert_eq!(toks[2].kind, TokenKind::Keyword(Keyword::Return));
  }

  #[test]
  fn hex_and_decimal_numbers() {
    let toks = lex_all("0x2A 42 0xFFu");
    assert_eq!(toks[0].value, 42);
    assert_eq!(toks[1].value, 42);
    assert_eq!(toks[2].value, 255);
  }

  #[test]
  fn empty_hex_is_error() {
    let toks = lex_all("0x;");
    assert_eq!(toks[0].kind, TokenKind::Error);
  }

  #[test]
  fn string_with_escapes() {
    let toks = lex_all("\"a\\nb\"");
    assert_eq!(toks[0].kind, TokenKind::Str);
    assert_eq!(toks[0].lexeme.as_deref(), Some("a\nb"));
  }

  #[test]
  fn successive_string_literals_each_reuse_the_scratch_arena() {
    let toks = lex_all("\"one\" \"two\" \"three\"");
    assert_eq!(toks[0].lexeme.as_deref(), Some("one"));
    assert_eq!(toks[1].lexeme.as_deref(), Some("two"));
    assert_eq!(toks[2].lexeme.as_deref(), Some("three"));
  }

  #[test]
  fn char_literal_is_integer() {
    let toks = lex_all("'A'");
    assert_eq!(toks[0].kind, TokenKind::Int);
    assert_eq!(toks[0].value, 'A' as i16);
  }

  #[test]
  fn three_char_operators() {
    let toks = lex_all("<<= >>=");
    assert_eq!(toks[0].kind, TokenKind::Punct(Punct::ShlAssign));
    assert_eq!(toks[1].kind, TokenKind::Punct(Punct::ShrAssign));
  }

  #[test]
  fn comments_are_skipped() {
    let toks = lex_all("// hi\n/* block */ int");
    assert_eq!(toks[0].kind, TokenKind::Keyword(Keyword::Int));
  }

  #[test]
  fn unrecognized_byte_is_error_and_lexing_continues() {
    let toks = lex_all("@ int");
    assert_eq!(toks[0].kind, TokenKind::Error);
    assert_eq!(toks[1].kind, TokenKind::Keyword(Keyword::Int));
  }

  #[test]
  fn eof_is_sticky() {
    let reader = SliceReader { data: b"", pos: 0 };
    let mut lexer = Lexer::new(reader).unwrap();
    assert!(lexer.next_token().unwrap().is_eof());
    assert!(lexer.next_token().unwrap().is_eof());
  }
}
