use firc_hir::{Circuit, Database, Direction, Member, Module, MEM_CIRCUIT};
use firc_hir_symbol::Symbol;

use crate::stmt::render_stmts;
use crate::types::render_type;

const INDENT: &str = "    ";

fn render_port(name: Symbol, dir: Direction, ty: &firc_hir_type::Type, warned_reset: &mut bool) -> String {
    let dir = match dir {
        Direction::Input => "input",
        Direction::Output => "output",
    };
    format!("{INDENT}{dir} {name} : {}\n", render_type(ty, warned_reset))
}

fn render_register(
    name: Symbol,
    member: &Member,
    warned_reset: &mut bool,
) -> String {
    let Member::Register { ty, clock, reset } = member else {
        unreachable!("render_register called on a non-register member")
    };
    let ty_str = render_type(ty, warned_reset);
    match reset {
        None => format!("{INDENT}reg {name} : {ty_str}, {clock}\n"),
        Some((signal, value)) => {
            let value_str = crate::expr::render_expr(value);
            format!(
                "{INDENT}regreset {name} : {ty_str}, {clock}, {signal}, {value_str}\n"
            )
        }
    }
}

/// Renders an instance, special-casing the reserved `mem` circuit the way
/// `_firrtl.py::_module` dispatches `cn == "mem"` to `_memory()` instead of
/// a plain `inst ... of ...` line (`SPEC_FULL.md` supplement 4).
fn render_instance(db: &Database, name: Symbol, circuit: Symbol, target: Symbol, warned_reset: &mut bool) -> String {
    if circuit.as_str() == MEM_CIRCUIT {
        return render_memory(db, name, target, warned_reset);
    }
    format!("{INDENT}inst {name} of {target}\n")
}

fn render_memory(db: &Database, name: Symbol, target: Symbol, warned_reset: &mut bool) -> String {
    let mem_circuit = db.circuit(Symbol::intern(MEM_CIRCUIT)).expect("mem circuit must exist to instantiate a memory");
    let target_module = mem_circuit.get(target).expect("memory instance target must be registered");
    let Some(Member::MemoryDef { data_type, depth, readers, writers, readwriters, read_latency, write_latency }) =
        target_module.data.get(&target)
    else {
        unreachable!("mem-circuit module must carry a MemoryDef member")
    };
    let mut out = String::new();
    out.push_str(&format!("{INDENT}mem {name} :\n"));
    out.push_str(&format!("{INDENT}{INDENT}data-type => {}\n", render_type(data_type, warned_reset)));
    out.push_str(&format!("{INDENT}{INDENT}depth => {depth}\n"));
    for i in 0..*readers {
        out.push_str(&format!("{INDENT}{INDENT}reader => r{i}\n"));
    }
    for i in 0..*writers {
        out.push_str(&format!("{INDENT}{INDENT}writer => w{i}\n"));
    }
    for i in 0..*readwriters {
        out.push_str(&format!("{INDENT}{INDENT}readwriter => rw{i}\n"));
    }
    out.push_str(&format!("{INDENT}{INDENT}read-latency => {read_latency}\n"));
    out.push_str(&format!("{INDENT}{INDENT}write-latency => {write_latency}\n"));
    out.push_str(&format!("{INDENT}{INDENT}read-under-write => undefined\n"));
    out
}

/// Renders a single module (or the `public module` top if its name matches
/// the owning circuit's), per `_firrtl.py::_module`.
pub fn render_module(db: &Database, circuit: &Circuit, module: &Module, warned_reset: &mut bool) -> String {
    let keyword = if circuit.is_public(module.name) { "public module" } else { "module" };
    let mut out = format!("{keyword} {} :\n", module.name);

    for name in &module.inputs {
        if let Some(Member::Port { ty, dir }) = module.data.get(name) {
            out.push_str(&render_port(*name, *dir, ty, warned_reset));
        }
    }
    for name in &module.outputs {
        if let Some(Member::Port { ty, dir }) = module.data.get(name) {
            out.push_str(&render_port(*name, *dir, ty, warned_reset));
        }
    }

    out.push('\n');
    for name in &module.wires {
        if let Some(Member::Wire { ty }) = module.data.get(name) {
            out.push_str(&format!("{INDENT}wire {name} : {}\n", render_type(ty, warned_reset)));
        }
    }
    for name in &module.registers {
        if let Some(member) = module.data.get(name) {
            out.push_str(&render_register(*name, member, warned_reset));
        }
    }
    for name in &module.instances {
        if let Some(Member::Instance { circuit: target_circuit, module: target }) = module.data.get(name) {
            out.push_str(&render_instance(db, *name, *target_circuit, *target, warned_reset));
        }
    }

    out.push('\n');
    out.push_str(&render_stmts(&module.code, 1, module));
    out
}

/// Renders a whole circuit block: `circuit Name :` followed by every
/// module it owns, public module first, per `_firrtl.py::_circuit`.
pub fn render_circuit(db: &Database, circuit: &Circuit, warned_reset: &mut bool) -> String {
    let mut out = format!("circuit {} :\n", circuit.name);
    for name in &circuit.order {
        if let Some(module) = circuit.get(*name) {
            let body = render_module(db, circuit, module, warned_reset);
            for line in body.lines() {
                if !line.is_empty() {
                    out.push_str(INDENT);
                    out.push_str(line);
                }
                out.push('\n');
            }
        }
    }
    out
}
