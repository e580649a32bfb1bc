use cc_runtime::{CcError, CcResult};
use std::collections::HashMap;

/// The deferred string table (spec §4.4.2). Interning is dedup-by-content,
/// which gives the "no two entries hold the same bytes" invariant (spec
/// §8.1) for free. Freezing after the measure pass makes a parser
/// determinism bug (a string appearing in the emit pass that the measure
/// pass never saw) a hard error instead of a silently-wrong offset.
#[derive(Default)]
pub struct StringTable {
  entries: Vec<String>,
  index: HashMap<String, u16>,
  frozen: bool,
}

impl StringTable {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn intern(&mut self, s: &str) -> CcResult<u16> {
    if let Some(&idx) = self.index.get(s) {
      return Ok(idx);
    }
    if self.frozen {
      return Err(CcError::Internal(format!("string table frozen: unseen string '{s}' in emit pass")));
    }
    let idx = self.entries.len() as u16;
    self.entries.push(s.to_string());
    self.index.insert(s.to_string(), idx);
    Ok(idx)
  }

  pub fn freeze(&mut self) {
    self.frozen = true;
  }

  pub fn len(&self) -> u16 {
    self.entries.len() as u16
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  pub fn entries(&self) -> &[String] {
    &self.entries
  }

  pub fn get(&self, idx: u16) -> Option<&str> {
    self.entries.get(idx as usize).map(String::as_str)
  }
}
