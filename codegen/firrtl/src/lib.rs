//! The FIRRTL emitter (spec §4.7): a stateless walk over a [`Database`]
//! that produces FIRRTL text, plus the `firtool` driver that lowers it to
//! Verilog. Grounded on `_firrtl.py`.

mod error;
mod expr;
mod module;
mod stmt;
mod types;

use std::env;
use std::fs;
use std::path::Path;
use std::process::Command;

use firc_hir::{Circuit, Database};
use firc_hir_symbol::Symbol;

pub use error::EmitError;

const PREAMBLE: &str = "FIRRTL version 4.2.0\n";

/// Renders a single circuit (by name) to a complete FIRRTL source string,
/// including the version preamble, per `_firrtl.py::_preamble`/`_circuit`.
pub fn emit_circuit(db: &Database, circuit_name: &str) -> Option<String> {
    let circuit = db.circuit(Symbol::intern(circuit_name))?;
    let mut warned_reset = false;
    let mut out = String::from(PREAMBLE);
    out.push_str(&module::render_circuit(db, circuit, &mut warned_reset));
    Some(out)
}

/// Renders every circuit in `db`, keyed by circuit name, the multi-circuit
/// case `_firrtl.py::firrtl()` handles by writing one `{name}.fir` file per
/// circuit passed to it.
pub fn emit_all(db: &Database) -> Vec<(String, String)> {
    let mut warned_reset = false;
    db.circuits
        .values()
        .map(|circuit: &Circuit| {
            let mut out = String::from(PREAMBLE);
            out.push_str(&module::render_circuit(db, circuit, &mut warned_reset));
            (circuit.name.to_string(), out)
        })
        .collect()
}

/// Writes every circuit in `db` to `{odir}/{name}.fir`, per
/// `_firrtl.py::firrtl()`.
pub fn write_firrtl(db: &Database, odir: &Path) -> Result<Vec<std::path::PathBuf>, EmitError> {
    fs::create_dir_all(odir).map_err(|source| EmitError::Io { path: odir.to_path_buf(), source })?;
    let mut written = Vec::new();
    for (name, text) in emit_all(db) {
        let path = odir.join(format!("{name}.fir"));
        fs::write(&path, text).map_err(|source| EmitError::Io { path: path.clone(), source })?;
        written.push(path);
    }
    Ok(written)
}

/// Lowers a previously-written `{name}.fir` to `{name}.v` by invoking
/// `firtool`, the binary named by the `FIRTOOL` environment variable or
/// `firtool` itself if unset, per `_firrtl.py::verilog()`.
pub fn run_firtool(fir_path: &Path) -> Result<std::path::PathBuf, EmitError> {
    let firtool = env::var("FIRTOOL").unwrap_or_else(|_| "firtool".to_string());
    let stem = fir_path.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();
    let out_path = fir_path.with_file_name(format!("{stem}.v"));
    let status = Command::new(&firtool)
        .arg("--verilog")
        .arg(format!("-o={}", out_path.display()))
        .arg(fir_path)
        .status()
        .map_err(|_| EmitError::FirtoolNotFound(firtool.clone()))?;
    if !status.success() {
        return Err(EmitError::FirtoolFailed { status: status.code().unwrap_or(-1) });
    }
    Ok(out_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use firc_hir::{Database, ModuleBuilder};
    use firc_hir_symbol::Symbol;
    use firc_hir_type::{Type, Value};
    use pretty_assertions::assert_eq;

    #[test]
    fn emits_a_counter_like_module() {
        let mut db = Database::new();
        let mut b = ModuleBuilder::new(Symbol::intern("test"));
        b.input(Symbol::intern("x"), Type::uint(1)).unwrap();
        b.output(Symbol::intern("y"), Type::uint(2)).unwrap();
        let x = firc_hir::Expr::reference(firc_hir::LValue::new(Symbol::intern("x")), Type::uint(1));
        let one = firc_hir::Expr::literal(Value::Int(Type::uint(1), 1));
        let sum = firc_hir::Expr::binary(firc_hir::BinaryOp::Add, x, one).unwrap();
        b.connect(firc_hir::LValue::new(Symbol::intern("y")), sum).unwrap();
        let module = b.finish();
        db.add_module(Symbol::intern("test"), module).unwrap();

        let text = emit_circuit(&db, "test").unwrap();
        assert!(text.starts_with("FIRRTL version 4.2.0\n"));
        assert!(text.contains("public module test :"));
        assert!(text.contains("input x : UInt<1>"));
        assert!(text.contains("output y : UInt<2>"));
        assert!(text.contains("y <= add(x, UInt<1>(1))"));
    }
}
