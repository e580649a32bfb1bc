//! Host-facing collaborators: byte readers, output sinks, and the shared
//! error type. Everything in this crate is a thin wrapper over `std` — the
//! stages never touch `std::fs` directly, they go through [`ByteReader`] and
//! [`OutputSink`] so the parser/codegen stages stay portable to the retro
//! target's own streaming I/O primitives.

mod error;
mod reader;
mod sink;

pub use error::{CcError, CcResult};
pub use reader::{ByteReader, FileByteReader};
pub use sink::{FileOutputSink, OutputSink};

/// Prints a one-line progress message on the informational channel.
///
/// Mirrors the `log_msg` collaborator from spec §6.4: print-only, no return
/// value, no formatting contract beyond "one line".
pub fn log_msg(msg: &str) {
  log::info!("{msg}");
}

/// Prints a one-line diagnostic on the error channel, prefixed the way spec
/// §7 requires for recoverable errors.
pub fn log_error(msg: &str) {
  log::error!("ERROR: {msg}");
}
