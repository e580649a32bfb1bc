//! Symbol tables consulted by the code generator (spec §3.4). Storage
//! itself is an external collaborator's concern; what the generator
//! actually needs is the three flat tables and the local → parameter →
//! global lookup order.

/// Nominal per-table capacity on the retro target. The host build keeps
/// tables in a `Vec` and does not hard-enforce this; it documents the
/// contract the codegen stage was designed against.
pub const MIN_TABLE_CAPACITY: usize = 32;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Local {
  pub offset: i16,
  pub size: u16,
  pub is_pointer: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Param {
  pub offset: i16,
  pub is_pointer: bool,
}

#[derive(Default)]
pub struct GlobalTable {
  globals: Vec<(String, bool)>,
}

impl GlobalTable {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn declare(&mut self, name: &str, is_pointer: bool) {
    self.globals.push((name.to_string(), is_pointer));
  }

  pub fn lookup(&self, name: &str) -> Option<bool> {
    self.globals.iter().rev().find(|(n, _)| n == name).map(|(_, p)| *p)
  }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Resolved {
  Local(Local),
  Param(Param),
  Global { is_pointer: bool },
}

/// Per-function locals + parameters, backed by the process-wide globals.
pub struct FunctionSymbols<'g> {
  locals: Vec<(String, Local)>,
  params: Vec<(String, Param)>,
  globals: &'g GlobalTable,
}

impl<'g> FunctionSymbols<'g> {
  pub fn new(globals: &'g GlobalTable) -> Self {
    Self { locals: Vec::new(), params: Vec::new(), globals }
  }

  pub fn declare_param(&mut self, name: &str, offset: i16, is_pointer: bool) {
    self.params.push((name.to_string(), Param { offset, is_pointer }));
  }

  pub fn declare_local(&mut self, name: &str, offset: i16, size: u16, is_pointer: bool) {
    self.locals.push((name.to_string(), Local { offset, size, is_pointer }));
  }

  /// Local → parameter → global; first hit wins (spec §3.4).
  pub fn lookup(&self, name: &str) -> Option<Resolved> {
    if let Some((_, l)) = self.locals.iter().rev().find(|(n, _)| n == name) {
      return Some(Resolved::Local(*l));
    }
    if let Some((_, p)) = self.params.iter().rev().find(|(n, _)| n == name) {
      return Some(Resolved::Param(*p));
    }
    self.globals.lookup(name).map(|is_pointer| Resolved::Global { is_pointer })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn locals_shadow_params_and_globals() {
    let mut globals = GlobalTable::new();
    globals.declare("x", false);
    let mut fs = FunctionSymbols::new(&globals);
    fs.declare_param("x", 4, false);
    fs.declare_local("x", 0, 1, false);
    assert_eq!(fs.lookup("x"), Some(Resolved::Local(Local { offset: 0, size: 1, is_pointer: false })));
  }

  #[test]
  fn params_shadow_globals() {
    let mut globals = GlobalTable::new();
    globals.declare("y", true);
    let mut fs = FunctionSymbols::new(&globals);
    fs.declare_param("y", 4, false);
    assert_eq!(fs.lookup("y"), Some(Resolved::Param(Param { offset: 4, is_pointer: false })));
  }

  #[test]
  fn falls_through_to_globals() {
    let mut globals = GlobalTable::new();
    globals.declare("z", true);
    let fs = FunctionSymbols::new(&globals);
    assert_eq!(fs.lookup("z"), Some(Resolved::Global { is_pointer: true }));
  }

  #[test]
  fn unknown_name_is_none() {
    let globals = GlobalTable::new();
    let fs = FunctionSymbols::new(&globals);
    assert_eq!(fs.lookup("nope"), None);
  }
}
