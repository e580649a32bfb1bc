use std::path::PathBuf;

/// The error taxonomy from spec §7. `OK` is represented by `Result::Ok`
/// rather than a variant here.
#[derive(thiserror::Error, Debug)]
pub enum CcError {
  #[error("file not found: {0}")]
  FileNotFound(PathBuf),

  #[error("out of memory")]
  Memory,

  #[error("syntax error: {0}")]
  Syntax(String),

  #[error("semantic error: {0}")]
  Semantic(String),

  #[error("codegen error: {0}")]
  Codegen(String),

  #[error("internal error: {0}")]
  Internal(String),

  #[error("invalid argument: {0}")]
  InvalidArg(String),

  #[error(transparent)]
  Io(#[from] std::io::Error),
}

pub type CcResult<T> = Result<T, CcError>;
