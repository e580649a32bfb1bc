use crate::error::CcResult;
use std::{
  fs::File,
  io::{BufWriter, Write},
  path::Path,
};

/// The append-only output sink consumed by the AST writer and the code
/// generator. Corresponds to the `output_*` family in spec §6.4.
pub trait OutputSink {
  fn write(&mut self, bytes: &[u8]) -> CcResult<()>;
  fn tell(&self) -> u32;
  fn close(&mut self) -> CcResult<()>;
}

/// An [`OutputSink`] backed by a host file.
pub struct FileOutputSink {
  inner: BufWriter<File>,
  pos: u32,
}

impl FileOutputSink {
  pub fn create(path: impl AsRef<Path>) -> CcResult<Self> {
    let file = File::create(path.as_ref())?;
    Ok(Self { inner: BufWriter::new(file), pos: 0 })
  }
}

impl OutputSink for FileOutputSink {
  fn write(&mut self, bytes: &[u8]) -> CcResult<()> {
    self.inner.write_all(bytes)?;
    self.pos += bytes.len() as u32;
    Ok(())
  }

  fn tell(&self) -> u32 {
    self.pos
  }

  fn close(&mut self) -> CcResult<()> {
    self.inner.flush()?;
    Ok(())
  }
}
