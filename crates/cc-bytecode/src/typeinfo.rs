//! The on-disk `(base, depth, array_len)` type triple (spec §4.4).
//!
//! The triple only has three base codes (`int`/`char`/`void`). Matching
//! `ast_write_type`'s `k_type_base[]` lookup in
//! `examples/original_source/src/parser/main.c`, a `short` or `long` base
//! type has no wire representation and is rejected at encode time rather
//! than silently folded into `int` — the original writer calls
//! `cc_error("Unsupported type in AST writer")` for exactly this case.

use cc_core::types::{Qualifiers, QualifiedType, Type};
use cc_runtime::{CcError, CcResult};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TypeInfo {
  pub base: u8, // 1=int 2=char 3=void, bit 7 set if unsigned
  pub depth: u8,
  pub array_len: u16,
}

const BASE_INT: u8 = 1;
const BASE_CHAR: u8 = 2;
const BASE_VOID: u8 = 3;
const UNSIGNED_BIT: u8 = 0x80;

fn base_code(ty: &Type) -> CcResult<u8> {
  match ty {
    Type::Char => Ok(BASE_CHAR),
    Type::Void => Ok(BASE_VOID),
    Type::Int => Ok(BASE_INT),
    Type::Short | Type::Long => Err(CcError::Syntax("unsupported type in AST writer: short/long have no wire representation".into())),
    other => Err(CcError::Syntax(format!("unsupported type in AST writer: {other:?}"))),
  }
}

pub fn encode(qty: &QualifiedType) -> CcResult<TypeInfo> {
  let mut depth = 0u8;
  let mut array_len = 0u16;
  let mut cur = &qty.ty;

  if let Type::Array(elem, len) = cur {
    array_len = *len;
    cur = elem;
  }
  while let Type::Pointer(inner) = cur {
    depth += 1;
    cur = inner;
  }

  let mut base = base_code(cur)?;
  if qty.quals.is_unsigned {
    base |= UNSIGNED_BIT;
  }
  Ok(TypeInfo { base, depth, array_len })
}

pub fn decode(info: TypeInfo) -> QualifiedType {
  let is_unsigned = info.base & UNSIGNED_BIT != 0;
  let base_only = info.base & !UNSIGNED_BIT;
  let mut ty = match base_only {
    BASE_CHAR => Type::Char,
    BASE_VOID => Type::Void,
    _ => Type::Int,
  };
  for _ in 0..info.depth {
    ty = Type::Pointer(Box::new(ty));
  }
  if info.array_len > 0 {
    ty = Type::Array(Box::new(ty), info.array_len);
  }
  QualifiedType::new(ty, Qualifiers { is_unsigned, ..Default::default() })
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn pointer_depth_roundtrips() {
    let qty = QualifiedType::new(Type::Pointer(Box::new(Type::Pointer(Box::new(Type::Char)))), Qualifiers::default());
    let info = encode(&qty).unwrap();
    assert_eq!(info.depth, 2);
    assert_eq!(decode(info), qty);
  }

  #[test]
  fn array_len_roundtrips() {
    let qty = QualifiedType::new(Type::Array(Box::new(Type::Int), 10), Qualifiers::default());
    let info = encode(&qty).unwrap();
    assert_eq!(info.array_len, 10);
    assert_eq!(decode(info).ty, Type::Array(Box::new(Type::Int), 10));
  }

  #[test]
  fn unsigned_bit_roundtrips() {
    let qty = QualifiedType::new(Type::Char, Qualifiers { is_unsigned: true, ..Default::default() });
    let info = encode(&qty).unwrap();
    assert!(info.base & UNSIGNED_BIT != 0);
    assert!(decode(info).quals.is_unsigned);
  }

  #[test]
  fn short_is_rejected() {
    let qty = QualifiedType::new(Type::Short, Qualifiers::default());
    assert!(encode(&qty).is_err());
  }

  #[test]
  fn long_is_rejected() {
    let qty = QualifiedType::new(Type::Long, Qualifiers::default());
    assert!(encode(&qty).is_err());
  }
}
