//! The Z80 code generator (spec §4.6). Consumes the AST in streaming
//! per-declaration mode and writes a plain-ASCII assembly listing.
//!
//! The AST file is read twice, mirroring the writer's own two-pass
//! approach to the source: a first lightweight pass collects every
//! top-level `VAR_DECL`'s pointer-ness and every function's return shape
//! (so a call site downstream knows whether its result lives in `A` or
//! `HL` before it has seen that function's declaration), then a second
//! pass streams declarations one at a time and lowers each to assembly.

use crate::symtab::{FunctionSymbols, GlobalTable, Resolved};
use cc_bytecode::AstReader;
use cc_core::ast::{BinOp, Node, UnOp};
use cc_core::types::QualifiedType;
use cc_runtime::{ByteReader, CcError, CcResult, OutputSink};
use std::collections::HashMap;

const CRT0: &str = include_str!("runtime_asm/crt0.asm");
const RUNTIME_HELPERS: &str = include_str!("runtime_asm/runtime.asm");

#[derive(Debug, Clone, Copy, Default)]
pub struct GenReport {
  pub function_count: u32,
  pub global_count: u32,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum ValueKind {
  Scalar,
  Pointer,
}

struct FnCtx {
  fn_name: String,
  end_label: String,
  needs_end: bool,
  locals_size: i16,
}

struct Gen<'g> {
  lines: Vec<String>,
  globals: &'g GlobalTable,
  func_returns_pointer: &'g HashMap<String, bool>,
  strings: Vec<String>,
  label_counter: u32,
  loop_labels: Vec<(String, String)>, // (continue_label, break_label)
}

impl<'g> Gen<'g> {
  fn new(globals: &'g GlobalTable, func_returns_pointer: &'g HashMap<String, bool>) -> Self {
    Self { lines: Vec::new(), globals, func_returns_pointer, strings: Vec::new(), label_counter: 0, loop_labels: Vec::new() }
  }

  fn emit(&mut self, line: impl Into<String>) {
    self.lines.push(line.into());
  }

  fn new_label(&mut self) -> String {
    let n = self.label_counter;
    self.label_counter += 1;
    format!("_l{n}")
  }

  fn intern_string(&mut self, s: &str) -> String {
    if let Some(idx) = self.strings.iter().position(|e| e == s) {
      return format!("_s{idx}");
    }
    let idx = self.strings.len();
    self.strings.push(s.to_string());
    format!("_s{idx}")
  }

  fn emit_prologue(&mut self) {
    self.emit("; generated listing, do not edit by hand");
    self.emit("; source -> ZAST -> Z80 assembly");
    self.emit("org 0x4000");
    for line in CRT0.lines() {
      self.emit(line.to_string());
    }
    self.emit("; --- compiled declarations follow ---");
  }

  fn emit_runtime_helpers(&mut self) {
    self.emit("; --- runtime helpers ---");
    for line in RUNTIME_HELPERS.lines() {
      self.emit(line.to_string());
    }
  }

  fn emit_string_pool(&mut self) {
    self.emit("; --- string literal pool ---");
    for (idx, s) in self.strings.clone().iter().enumerate() {
      self.emit(format!("_s{idx}:"));
      for b in s.bytes() {
        self.emit(format!("  .db {b}"));
      }
      self.emit("  .db 0");
    }
  }

  fn emit_epilogue(&mut self, ctx: &FnCtx) {
    if ctx.locals_size > 0 {
      self.emit("  ld hl, 0");
      self.emit("  add hl, sp");
      self.emit(format!("  ld de, {}", ctx.locals_size));
      self.emit("  add hl, de");
      self.emit("  ld sp, hl");
    }
    self.emit("  pop ix");
    self.emit("  ret");
  }

  fn gen_function(&mut self, name: &str, _ret: &QualifiedType, params: &[Node], body: &Node) -> CcResult<()> {
    let mut syms = FunctionSymbols::new(self.globals);
    for (i, p) in params.iter().enumerate() {
      let Node::VarDecl { name: pname, ty, .. } = p else {
        return Err(CcError::Codegen(format!("function '{name}' has a malformed parameter")));
      };
      syms.declare_param(pname, 4 + 2 * i as i16, ty.ty.is_pointer());
    }

    let Node::Compound { stmts } = body else {
      return Err(CcError::Codegen(format!("function '{name}' body is not a compound statement")));
    };

    let mut next_offset = 0i16;
    for s in stmts {
      collect_locals(s, &mut syms, &mut next_offset);
    }
    let locals_size = next_offset;

    self.emit(format!("{name}:"));
    self.emit("  push ix");
    self.emit("  ld ix, 0");
    self.emit("  add ix, sp");
    if locals_size > 0 {
      self.emit("  ld hl, 0");
      self.emit("  add hl, sp");
      self.emit(format!("  ld de, {locals_size}"));
      self.emit("  or a");
      self.emit("  sbc hl, de");
      self.emit("  ld sp, hl");
      self.emit("  ld ix, 0");
      self.emit("  add ix, sp");
    }

    let mut ctx = FnCtx { fn_name: name.to_string(), end_label: format!("_end_{name}"), needs_end: false, locals_size };

    let last_is_return = matches!(stmts.last(), Some(Node::Return { .. }));
    let n = stmts.len();
    for (i, s) in stmts.iter().enumerate() {
      let is_tail = last_is_return && i + 1 == n;
      self.gen_stmt(s, &mut syms, &mut ctx, is_tail)?;
    }

    if !last_is_return {
      if stmts.is_empty() {
        // Spec §8.2's empty-body boundary case: the implicit return value
        // is `0`, not whatever happened to be left in `A`.
        self.emit("  ld a, 0");
      }
      if ctx.needs_end {
        self.emit(format!("{}:", ctx.end_label));
      }
      self.emit_epilogue(&ctx);
    } else if ctx.needs_end {
      self.emit(format!("{}:", ctx.end_label));
      self.emit_epilogue(&ctx);
    }
    Ok(())
  }

  fn gen_stmt(&mut self, node: &Node, syms: &mut FunctionSymbols, ctx: &mut FnCtx, is_tail: bool) -> CcResult<()> {
    match node {
      Node::VarDecl { name, init, .. } => {
        if let Some(e) = init {
          self.gen_init_store(name, e, syms)?;
        }
        Ok(())
      }
      Node::Compound { stmts } => {
        for s in stmts {
          self.gen_stmt(s, syms, ctx, false)?;
        }
        Ok(())
      }
      Node::Return { expr } => {
        if let Some(e) = expr {
          self.gen_expr(e, syms)?;
        }
        if is_tail {
          self.emit_epilogue(ctx);
        } else {
          ctx.needs_end = true;
          self.emit(format!("  jp {}", ctx.end_label));
        }
        Ok(())
      }
      Node::Break => {
        let (_, brk) = self.loop_labels.last().cloned().ok_or_else(|| CcError::Codegen("break outside a loop".into()))?;
        self.emit(format!("  jp {brk}"));
        Ok(())
      }
      Node::Continue => {
        let (cont, _) = self.loop_labels.last().cloned().ok_or_else(|| CcError::Codegen("continue outside a loop".into()))?;
        self.emit(format!("  jp {cont}"));
        Ok(())
      }
      Node::Goto { name } => {
        self.emit(format!("  jp {}", goto_label(&ctx.fn_name, name)));
        Ok(())
      }
      Node::Label { name } => {
        self.emit(format!("{}:", goto_label(&ctx.fn_name, name)));
        Ok(())
      }
      Node::EmptyStmt => Ok(()),
      Node::If { cond, then_branch, else_branch } => {
        self.gen_expr(cond, syms)?;
        self.emit("  or a");
        let else_or_end = self.new_label();
        self.emit(format!("  jp z, {else_or_end}"));
        self.gen_stmt(then_branch, syms, ctx, false)?;
        if let Some(else_b) = else_branch {
          let end = self.new_label();
          self.emit(format!("  jp {end}"));
          self.emit(format!("{else_or_end}:"));
          self.gen_stmt(else_b, syms, ctx, false)?;
          self.emit(format!("{end}:"));
        } else {
          self.emit(format!("{else_or_end}:"));
        }
        Ok(())
      }
      Node::While { cond, body } => {
        let loop_label = self.new_label();
        let end_label = self.new_label();
        self.emit(format!("{loop_label}:"));
        self.gen_expr(cond, syms)?;
        self.emit("  or a");
        self.emit(format!("  jp z, {end_label}"));
        self.loop_labels.push((loop_label.clone(), end_label.clone()));
        self.gen_stmt(body, syms, ctx, false)?;
        self.loop_labels.pop();
        self.emit(format!("  jp {loop_label}"));
        self.emit(format!("{end_label}:"));
        Ok(())
      }
      Node::For { init, cond, inc, body } => {
        let loop_label = self.new_label();
        let continue_label = self.new_label();
        let end_label = self.new_label();
        if let Some(n) = init {
          self.gen_stmt(n, syms, ctx, false)?;
        }
        self.emit(format!("{loop_label}:"));
        if let Some(c) = cond {
          self.gen_expr(c, syms)?;
          self.emit("  or a");
          self.emit(format!("  jp z, {end_label}"));
        }
        self.loop_labels.push((continue_label.clone(), end_label.clone()));
        self.gen_stmt(body, syms, ctx, false)?;
        self.loop_labels.pop();
        self.emit(format!("{continue_label}:"));
        if let Some(n) = inc {
          self.gen_expr(n, syms)?;
        }
        self.emit(format!("  jp {loop_label}"));
        self.emit(format!("{end_label}:"));
        Ok(())
      }
      // An expression used directly as a statement: evaluate and discard.
      _ => {
        self.gen_expr(node, syms)?;
        Ok(())
      }
    }
  }

  fn gen_init_store(&mut self, name: &str, init: &Node, syms: &mut FunctionSymbols) -> CcResult<()> {
    let resolved = syms.lookup(name).ok_or_else(|| CcError::Codegen(format!("undeclared identifier '{name}'")))?;
    if is_pointer_target(&resolved) {
      self.gen_pointer_value(init, syms)?;
      self.store_pointer(&resolved, name);
    } else {
      self.gen_expr(init, syms)?;
      self.store_scalar(&resolved, name);
    }
    Ok(())
  }

  fn gen_assign(&mut self, lvalue: &Node, rvalue: &Node, syms: &mut FunctionSymbols) -> CcResult<ValueKind> {
    match lvalue {
      Node::Identifier { name } => {
        let resolved = syms.lookup(name).ok_or_else(|| CcError::Codegen(format!("undeclared identifier '{name}'")))?;
        if is_pointer_target(&resolved) {
          self.gen_pointer_value(rvalue, syms)?;
          self.store_pointer(&resolved, name);
          Ok(ValueKind::Pointer)
        } else {
          self.gen_expr(rvalue, syms)?;
          self.store_scalar(&resolved, name);
          Ok(ValueKind::Scalar)
        }
      }
      Node::ArrayAccess { base, index } => {
        self.load_array_address(base, index, syms)?;
        self.gen_expr(rvalue, syms)?;
        self.emit("  ld (hl), a");
        Ok(ValueKind::Scalar)
      }
      other => Err(CcError::Codegen(format!("unsupported assignment target {other:?}"))),
    }
  }

  /// Loads one of the four accepted pointer right-hand-sides into `HL`
  /// (spec §4.6.4): string literal, `&identifier`, another pointer
  /// variable, or the constant `0`.
  fn gen_pointer_value(&mut self, rvalue: &Node, syms: &mut FunctionSymbols) -> CcResult<()> {
    match rvalue {
      Node::StringLiteral { value } => {
        let label = self.intern_string(value);
        self.emit(format!("  ld hl, {label}"));
        Ok(())
      }
      Node::UnaryOp { op: UnOp::Addr, operand } => {
        self.gen_unary(UnOp::Addr, operand, syms)?;
        Ok(())
      }
      Node::Identifier { name } => {
        let resolved = syms.lookup(name).ok_or_else(|| CcError::Codegen(format!("undeclared identifier '{name}'")))?;
        if !is_pointer_target(&resolved) {
          return Err(CcError::Codegen(format!("'{name}' is not a pointer variable")));
        }
        self.load_pointer(&resolved, name);
        Ok(())
      }
      Node::Constant { value: 0 } => {
        self.emit("  ld hl, 0");
        Ok(())
      }
      other => Err(CcError::Codegen(format!("unsupported pointer initializer {other:?}"))),
    }
  }

  fn load_pointer(&mut self, resolved: &Resolved, name: &str) {
    match resolved {
      Resolved::Local(l) => {
        self.emit(format!("  ld l, (ix+{})", l.offset));
        self.emit(format!("  ld h, (ix+{})", l.offset + 1));
      }
      Resolved::Param(p) => {
        self.emit(format!("  ld l, (ix+{})", p.offset));
        self.emit(format!("  ld h, (ix+{})", p.offset + 1));
      }
      Resolved::Global { .. } => {
        self.emit(format!("  ld hl, (_v_{name})"));
      }
    }
  }

  fn store_pointer(&mut self, resolved: &Resolved, name: &str) {
    match resolved {
      Resolved::Local(l) => {
        self.emit(format!("  ld (ix+{}), l", l.offset));
        self.emit(format!("  ld (ix+{}), h", l.offset + 1));
      }
      Resolved::Param(p) => {
        self.emit(format!("  ld (ix+{}), l", p.offset));
        self.emit(format!("  ld (ix+{}), h", p.offset + 1));
      }
      Resolved::Global { .. } => {
        self.emit(format!("  ld (_v_{name}), hl"));
      }
    }
  }

  fn load_scalar(&mut self, resolved: &Resolved, name: &str) {
    match resolved {
      Resolved::Local(l) => self.emit(format!("  ld a, (ix+{})", l.offset)),
      Resolved::Param(p) => self.emit(format!("  ld a, (ix+{})", p.offset)),
      Resolved::Global { .. } => self.emit(format!("  ld a, (_v_{name})")),
    }
  }

  fn store_scalar(&mut self, resolved: &Resolved, name: &str) {
    match resolved {
      Resolved::Local(l) => self.emit(format!("  ld (ix+{}), a", l.offset)),
      Resolved::Param(p) => self.emit(format!("  ld (ix+{}), a", p.offset)),
      Resolved::Global { .. } => self.emit(format!("  ld (_v_{name}), a")),
    }
  }

  /// Loads `base[index]`'s address into `HL` (spec §4.6.4's `arr[const]`
  /// path: only a pointer variable or a string literal base with a
  /// constant index is supported).
  fn load_array_address(&mut self, base: &Node, index: &Node, syms: &mut FunctionSymbols) -> CcResult<()> {
    let Node::Constant { value: idx } = index else {
      return Err(CcError::Codegen("array index must be a constant".into()));
    };
    match base {
      Node::Identifier { name } => {
        let resolved = syms.lookup(name).ok_or_else(|| CcError::Codegen(format!("undeclared identifier '{name}'")))?;
        if !is_pointer_target(&resolved) {
          return Err(CcError::Codegen(format!("'{name}' is not an array or pointer")));
        }
        self.load_pointer(&resolved, name);
      }
      Node::StringLiteral { value } => {
        let label = self.intern_string(value);
        self.emit(format!("  ld hl, {label}"));
      }
      other => return Err(CcError::Codegen(format!("unsupported array base {other:?}"))),
    }
    if *idx != 0 {
      self.emit(format!("  ld de, {idx}"));
      self.emit("  add hl, de");
    }
    Ok(())
  }

  fn gen_expr(&mut self, node: &Node, syms: &mut FunctionSymbols) -> CcResult<ValueKind> {
    match node {
      Node::Identifier { name } => {
        let resolved = syms.lookup(name).ok_or_else(|| CcError::Codegen(format!("undeclared identifier '{name}'")))?;
        if is_pointer_target(&resolved) {
          self.load_pointer(&resolved, name);
          Ok(ValueKind::Pointer)
        } else {
          self.load_scalar(&resolved, name);
          Ok(ValueKind::Scalar)
        }
      }
      Node::Constant { value } => {
        self.emit(format!("  ld a, {}", (*value as i32) & 0xFF));
        Ok(ValueKind::Scalar)
      }
      Node::StringLiteral { value } => {
        let label = self.intern_string(value);
        self.emit(format!("  ld hl, {label}"));
        Ok(ValueKind::Pointer)
      }
      Node::Assign { lvalue, rvalue } => self.gen_assign(lvalue, rvalue, syms),
      Node::Call { name, args } => {
        for arg in args.iter().rev() {
          let kind = self.gen_expr(arg, syms)?;
          match kind {
            ValueKind::Pointer => self.emit("  push hl"),
            ValueKind::Scalar => {
              self.emit("  ld l, a");
              self.emit("  ld h, 0");
              self.emit("  push hl");
            }
          }
        }
        self.emit(format!("  call {name}"));
        for _ in 0..args.len() {
          self.emit("  pop bc");
        }
        if *self.func_returns_pointer.get(name).unwrap_or(&false) {
          Ok(ValueKind::Pointer)
        } else {
          Ok(ValueKind::Scalar)
        }
      }
      Node::UnaryOp { op, operand } => self.gen_unary(*op, operand, syms),
      Node::BinaryOp { op, left, right } => self.gen_binary(*op, left, right, syms),
      Node::ArrayAccess { base, index } => {
        self.load_array_address(base, index, syms)?;
        self.emit("  ld a, (hl)");
        Ok(ValueKind::Scalar)
      }
      other => Err(CcError::Codegen(format!("unsupported expression {other:?}"))),
    }
  }

  fn gen_unary(&mut self, op: UnOp, operand: &Node, syms: &mut FunctionSymbols) -> CcResult<ValueKind> {
    match op {
      UnOp::Neg => {
        self.gen_expr(operand, syms)?;
        self.emit("  neg");
        Ok(ValueKind::Scalar)
      }
      UnOp::Not => {
        self.gen_expr(operand, syms)?;
        self.emit("  cpl");
        Ok(ValueKind::Scalar)
      }
      UnOp::LNot => {
        self.gen_expr(operand, syms)?;
        self.emit("  or a");
        let is_zero = self.new_label();
        let end = self.new_label();
        self.emit(format!("  jp z, {is_zero}"));
        self.emit("  ld a, 0");
        self.emit(format!("  jp {end}"));
        self.emit(format!("{is_zero}:"));
        self.emit("  ld a, 1");
        self.emit(format!("{end}:"));
        Ok(ValueKind::Scalar)
      }
      UnOp::Addr => {
        let Node::Identifier { name } = operand else {
          return Err(CcError::Codegen("'&' requires an identifier operand".into()));
        };
        let resolved = syms.lookup(name).ok_or_else(|| CcError::Codegen(format!("undeclared identifier '{name}'")))?;
        match resolved {
          Resolved::Local(l) => {
            self.emit("  push ix");
            self.emit("  pop hl");
            if l.offset != 0 {
              self.emit(format!("  ld de, {}", l.offset));
              self.emit("  add hl, de");
            }
          }
          Resolved::Param(p) => {
            self.emit("  push ix");
            self.emit("  pop hl");
            self.emit(format!("  ld de, {}", p.offset));
            self.emit("  add hl, de");
          }
          Resolved::Global { .. } => {
            self.emit(format!("  ld hl, _v_{name}"));
          }
        }
        Ok(ValueKind::Pointer)
      }
      UnOp::Deref => {
        self.gen_expr(operand, syms)?;
        self.emit("  ld a, (hl)");
        Ok(ValueKind::Scalar)
      }
      UnOp::PreInc | UnOp::PreDec | UnOp::PostInc | UnOp::PostDec => self.gen_incdec(op, operand, syms),
    }
  }

  fn gen_incdec(&mut self, op: UnOp, operand: &Node, syms: &mut FunctionSymbols) -> CcResult<ValueKind> {
    let Node::Identifier { name } = operand else {
      return Err(CcError::Codegen("'++'/'--' require an identifier operand".into()));
    };
    let resolved = syms.lookup(name).ok_or_else(|| CcError::Codegen(format!("undeclared identifier '{name}'")))?;
    if is_pointer_target(&resolved) {
      return Err(CcError::Codegen(format!("'++'/'--' on pointer '{name}' is unsupported")));
    }
    self.load_scalar(&resolved, name);
    match op {
      UnOp::PreInc => {
        self.emit("  inc a");
        self.store_scalar(&resolved, name);
      }
      UnOp::PreDec => {
        self.emit("  dec a");
        self.store_scalar(&resolved, name);
      }
      UnOp::PostInc => {
        self.emit("  push af");
        self.emit("  inc a");
        self.store_scalar(&resolved, name);
        self.emit("  pop af");
      }
      UnOp::PostDec => {
        self.emit("  push af");
        self.emit("  dec a");
        self.store_scalar(&resolved, name);
        self.emit("  pop af");
      }
      _ => unreachable!(),
    }
    Ok(ValueKind::Scalar)
  }

  fn gen_binary(&mut self, op: BinOp, left: &Node, right: &Node, syms: &mut FunctionSymbols) -> CcResult<ValueKind> {
    self.gen_expr(left, syms)?;
    self.emit("  push af");
    self.gen_expr(right, syms)?;
    self.emit("  ld l, a");
    self.emit("  pop af");
    // A = left, L = right.
    match op {
      BinOp::Add => self.emit("  add a, l"),
      BinOp::Sub => self.emit("  sub l"),
      BinOp::And => self.emit("  and l"),
      BinOp::Or => self.emit("  or l"),
      BinOp::Xor => self.emit("  xor l"),
      BinOp::Mul => self.emit("  call __mul_a_l"),
      BinOp::Div => self.emit("  call __div_a_l"),
      BinOp::Mod => self.emit("  call __mod_a_l"),
      BinOp::Shl => self.gen_shift(true),
      BinOp::Shr => self.gen_shift(false),
      BinOp::Eq => self.gen_compare("z"),
      BinOp::Ne => self.gen_compare("nz"),
      BinOp::Lt => self.gen_compare("c"),
      BinOp::Ge => self.gen_compare("nc"),
      BinOp::Gt => self.gen_compare_gt(),
      BinOp::Le => self.gen_compare_le(),
      BinOp::LAnd => self.gen_logical_and(),
      BinOp::LOr => self.gen_logical_or(),
    }
    Ok(ValueKind::Scalar)
  }

  fn gen_shift(&mut self, left: bool) {
    self.emit("  ld b, l");
    let loop_label = self.new_label();
    let end_label = self.new_label();
    self.emit(format!("{loop_label}:"));
    self.emit("  ld c, a");
    self.emit("  ld a, b");
    self.emit("  or a");
    self.emit(format!("  jp z, {end_label}"));
    self.emit("  ld a, c");
    self.emit(if left { "  sla a" } else { "  srl a" });
    self.emit("  dec b");
    self.emit(format!("  jp {loop_label}"));
    self.emit(format!("{end_label}:"));
    self.emit("  ld a, c");
  }

  fn gen_compare(&mut self, cc: &str) {
    self.emit("  cp l");
    let truthy = self.new_label();
    let end = self.new_label();
    self.emit(format!("  jp {cc}, {truthy}"));
    self.emit("  ld a, 0");
    self.emit(format!("  jp {end}"));
    self.emit(format!("{truthy}:"));
    self.emit("  ld a, 1");
    self.emit(format!("{end}:"));
  }

  fn gen_compare_gt(&mut self) {
    // a > l  <=>  l < a
    self.emit("  ld b, a");
    self.emit("  ld a, l");
    self.emit("  cp b");
    let truthy = self.new_label();
    let end = self.new_label();
    self.emit(format!("  jp c, {truthy}"));
    self.emit("  ld a, 0");
    self.emit(format!("  jp {end}"));
    self.emit(format!("{truthy}:"));
    self.emit("  ld a, 1");
    self.emit(format!("{end}:"));
  }

  fn gen_compare_le(&mut self) {
    // a <= l  <=>  !(a > l)
    self.gen_compare_gt();
    self.emit("  xor 1");
  }

  fn gen_logical_and(&mut self) {
    // A already holds `left != 0` folded with `right != 0` via AND on the
    // booleanized operands; strict (non-short-circuit) evaluation is
    // explicitly allowed (spec §4.6.4).
    self.emit("  or a");
    let left_false = self.new_label();
    let end = self.new_label();
    self.emit(format!("  jp z, {left_false}"));
    self.emit("  ld a, l");
    self.emit("  or a");
    self.emit(format!("  jp z, {left_false}"));
    self.emit("  ld a, 1");
    self.emit(format!("  jp {end}"));
    self.emit(format!("{left_false}:"));
    self.emit("  ld a, 0");
    self.emit(format!("{end}:"));
  }

  fn gen_logical_or(&mut self) {
    self.emit("  or a");
    let truthy = self.new_label();
    let end = self.new_label();
    self.emit(format!("  jp nz, {truthy}"));
    self.emit("  ld a, l");
    self.emit("  or a");
    self.emit(format!("  jp nz, {truthy}"));
    self.emit("  ld a, 0");
    self.emit(format!("  jp {end}"));
    self.emit(format!("{truthy}:"));
    self.emit("  ld a, 1");
    self.emit(format!("{end}:"));
  }

  fn gen_global(&mut self, name: &str, ty: &QualifiedType, init: &Option<Box<Node>>) {
    self.emit(format!("_v_{name}:"));
    if ty.ty.is_pointer() {
      match init.as_deref() {
        Some(Node::StringLiteral { value }) => {
          let label = self.intern_string(value);
          self.emit(format!("  .dw {label}"));
        }
        Some(Node::UnaryOp { op: UnOp::Addr, operand }) => match operand.as_ref() {
          Node::Identifier { name: target } => self.emit(format!("  .dw _v_{target}")),
          _ => self.emit("  .dw 0"),
        },
        Some(Node::Identifier { name: target }) => self.emit(format!("  .dw _v_{target}")),
        _ => self.emit("  .dw 0"),
      }
    } else {
      match init.as_deref() {
        Some(Node::Constant { value }) => self.emit(format!("  .db {}", (*value as i32) & 0xFF)),
        _ => self.emit("  .db 0"),
      }
    }
  }
}

fn is_pointer_target(resolved: &Resolved) -> bool {
  match resolved {
    Resolved::Local(l) => l.is_pointer,
    Resolved::Param(p) => p.is_pointer,
    Resolved::Global { is_pointer } => *is_pointer,
  }
}

fn goto_label(fn_name: &str, name: &str) -> String {
  format!("_lbl_{fn_name}_{name}")
}

fn frame_size(ty: &QualifiedType) -> u16 {
  if ty.ty.is_pointer() {
    2
  } else {
    1
  }
}

fn collect_locals(node: &Node, syms: &mut FunctionSymbols, next: &mut i16) {
  match node {
    Node::VarDecl { name, ty, .. } => {
      let size = frame_size(ty);
      syms.declare_local(name, *next, size, ty.ty.is_pointer());
      *next += size as i16;
    }
    Node::Compound { stmts } => {
      for s in stmts {
        collect_locals(s, syms, next);
      }
    }
    Node::If { then_branch, else_branch, .. } => {
      collect_locals(then_branch, syms, next);
      if let Some(e) = else_branch {
        collect_locals(e, syms, next);
      }
    }
    Node::While { body, .. } => collect_locals(body, syms, next),
    Node::For { body, .. } => collect_locals(body, syms, next),
    _ => {}
  }
}

/// Reads the AST twice (see module docs) and writes the full assembly
/// listing to `sink`.
pub fn generate<R: ByteReader>(mut open: impl FnMut() -> CcResult<R>, sink: &mut impl OutputSink) -> CcResult<GenReport> {
  let mut globals = GlobalTable::new();
  let mut func_returns_pointer: HashMap<String, bool> = HashMap::new();
  {
    let reader = open()?;
    let mut ast = AstReader::open(reader)?;
    let decl_count = ast.begin_program()?;
    for _ in 0..decl_count {
      match ast.read_decl()? {
        Node::VarDecl { name, ty, .. } => globals.declare(&name, ty.ty.is_pointer()),
        Node::Function { name, ret, .. } => {
          func_returns_pointer.insert(name, ret.ty.is_pointer());
        }
        other => return Err(CcError::Codegen(format!("unsupported top-level declaration {other:?}"))),
      }
    }
  }

  let mut gen = Gen::new(&globals, &func_returns_pointer);
  gen.emit_prologue();

  let mut function_count = 0u32;
  let mut global_decls: Vec<(String, QualifiedType, Option<Box<Node>>)> = Vec::new();
  {
    let reader = open()?;
    let mut ast = AstReader::open(reader)?;
    let decl_count = ast.begin_program()?;
    for _ in 0..decl_count {
      match ast.read_decl()? {
        Node::Function { name, ret, params, body } => {
          gen.gen_function(&name, &ret, &params, &body)?;
          function_count += 1;
        }
        Node::VarDecl { name, ty, init } => global_decls.push((name, ty, init)),
        other => return Err(CcError::Codegen(format!("unsupported top-level declaration {other:?}"))),
      }
    }
  }

  let global_count = global_decls.len() as u32;
  for (name, ty, init) in &global_decls {
    gen.gen_global(name, ty, init);
  }
  gen.emit_string_pool();
  gen.emit_runtime_helpers();

  for line in &gen.lines {
    sink.write(line.as_bytes())?;
    sink.write(b"\n")?;
  }
  sink.close()?;

  Ok(GenReport { function_count, global_count })
}

#[cfg(test)]
mod tests {
  use super::*;
  use cc_bytecode::write_program;

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

  fn compile(src: &str) -> String {
    let mut ast_sink = VecSink::default();
    write_program(|| Ok(SliceReader::new(src.as_bytes().to_vec())), &mut ast_sink).unwrap();
    let ast = ast_sink.0;
    let mut sink = VecSink::default();
    generate(|| Ok(SliceReader::new(ast.clone())), &mut sink).unwrap();
    String::from_utf8(sink.0).unwrap()
  }

  /// Spec §8.2's explicit boundary scenario: a no-parameter, empty-body
  /// function still emits an implicit `ld a, 0` before the epilogue.
  #[test]
  fn empty_body_function_emits_implicit_zero_return() {
    let asm = compile("void f() {}");
    let body = asm.split("f:\n").nth(1).unwrap();
    let next_lines: Vec<&str> = body.lines().take(3).map(str::trim).collect();
    assert_eq!(next_lines, ["push ix", "ld ix, 0", "add ix, sp"]);
    assert!(asm.contains("ld a, 0"));
    assert!(asm.contains("pop ix"));
    assert!(asm.contains("ret"));
  }

  #[test]
  fn non_empty_fallthrough_body_does_not_force_a_zero_return() {
    // A function whose last statement is a side-effecting non-return
    // expression falls through with whatever the last computed value left
    // in `A` — only an *empty* body gets the implicit `ld a, 0`.
    let asm = compile("int g(int x) { x = x + 1; }");
    let tail = asm.split("g:\n").nth(1).unwrap();
    let first_stmt_line = tail.lines().map(str::trim).find(|l| l.starts_with("ld a,")).unwrap();
    assert_ne!(first_stmt_line, "ld a, 0");
  }

  /// The epilogue is the plain spec/original form: `pop ix; ret`, with no
  /// parameter-count branching.
  #[test]
  fn epilogue_is_plain_pop_ix_ret() {
    let asm = compile("int h(int a, int b) { return a; }");
    assert!(asm.contains("  pop ix"));
    assert!(asm.contains("  ret"));
  }

  /// The caller cleans up its own pushed arguments with one `pop bc` per
  /// argument immediately after the call.
  #[test]
  fn call_site_pops_one_bc_per_argument() {
    let asm = compile("int add(int a, int b) { return a + b; } int main() { return add(1, 2); }");
    let call_idx = asm.find("call add").unwrap();
    let after = &asm[call_idx..];
    let cleanup: Vec<&str> = after.lines().skip(1).take(2).map(str::trim).collect();
    assert_eq!(cleanup, ["pop bc", "pop bc"]);
  }
}
