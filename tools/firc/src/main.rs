//! `firc`: a small CLI over the FIRRTL emitter's `firtool` driver.
//!
//! Building a circuit happens in Rust code against `firc-hir`/
//! `firc-hir-analysis`/`firc-codegen-firrtl` directly (there is no
//! serialized circuit format to load from disk, the same way `hamp`'s
//! `firrtl()`/`verilog()` are plain library calls from a build script, not
//! a standalone tool); this binary only wraps the last mile — lowering an
//! already-emitted `.fir` file to Verilog via `firtool`.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "firc", about = "FIRRTL emission helpers", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Lowers a `.fir` file to Verilog by invoking `firtool` (respects the
    /// `FIRTOOL` environment variable).
    Verilog {
        /// Path to the FIRRTL file to lower.
        fir: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    match cli.command {
        Commands::Verilog { fir } => {
            let out = firc_codegen_firrtl::run_firtool(&fir)?;
            log::info!("wrote {}", out.display());
            println!("{}", out.display());
        }
    }
    Ok(())
}
