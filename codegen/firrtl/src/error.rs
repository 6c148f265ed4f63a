use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while emitting FIRRTL or driving `firtool` to lower it to
/// Verilog (spec §4.7/§6), mirroring `_firrtl.py::firrtl`/`verilog`'s
/// failure modes (an I/O error writing `{name}.fir`, or a nonzero
/// `firtool` exit code).
#[derive(Debug, Error)]
pub enum EmitError {
    #[error("failed to write `{path}`: {source}")]
    Io { path: PathBuf, #[source] source: std::io::Error },

    #[error("firtool exited with status {status}")]
    FirtoolFailed { status: i32 },

    #[error("failed to launch firtool (`{0}`): is it installed and on PATH?")]
    FirtoolNotFound(String),
}
