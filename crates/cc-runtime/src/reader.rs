use crate::error::{CcError, CcResult};
use std::{
  fs::File,
  io::{BufReader, Read, Seek, SeekFrom},
  path::Path,
};

/// The streaming byte source consumed by the lexer and the AST reader.
///
/// Corresponds to the `reader_*` family in spec §6.4: `next`/`peek` are
/// sticky at EOF (`None` forever after the first `None`), `seek` is
/// absolute, and `tell` reports the next byte's offset.
pub trait ByteReader {
  fn next(&mut self) -> CcResult<Option<u8>>;
  fn peek(&mut self) -> CcResult<Option<u8>>;
  fn seek(&mut self, abs: u32) -> CcResult<()>;
  fn tell(&self) -> u32;
}

/// A [`ByteReader`] backed by a host file, used by all three binaries.
pub struct FileByteReader {
  inner: BufReader<File>,
  pos: u32,
  lookahead: Option<Option<u8>>,
}

impl FileByteReader {
  pub fn open(path: impl AsRef<Path>) -> CcResult<Self> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|_| CcError::FileNotFound(path.to_path_buf()))?;
    Ok(Self { inner: BufReader::new(file), pos: 0, lookahead: None })
  }

  fn read_one(&mut self) -> CcResult<Option<u8>> {
    let mut byte = [0u8; 1];
    match self.inner.read(&mut byte)? {
      0 => Ok(None),
      _ => Ok(Some(byte[0])),
    }
  }
}

impl ByteReader for FileByteReader {
  fn next(&mut self) -> CcResult<Option<u8>> {
    let byte = match self.lookahead.take() {
      Some(b) => b,
      None => self.read_one()?,
    };
    if byte.is_some() {
      self.pos += 1;
    }
    Ok(byte)
  }

  fn peek(&mut self) -> CcResult<Option<u8>> {
    if self.lookahead.is_none() {
      self.lookahead = Some(self.read_one()?);
    }
    Ok(self.lookahead.unwrap())
  }

  fn seek(&mut self, abs: u32) -> CcResult<()> {
    self.inner.seek(SeekFrom::Start(abs as u64))?;
    self.pos = abs;
    self.lookahead = None;
    Ok(())
  }

  fn tell(&self) -> u32 {
    self.pos
  }
}
