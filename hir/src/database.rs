use firc_hir_symbol::Symbol;
use firc_hir_type::Type;
use rustc_hash::FxHashMap;

use crate::error::BuildError;
use crate::module::{Member, Module, ModuleBuilder};

/// The reserved circuit name memories live under, per `_firrtl.py::_module`
/// (`cn == "mem"`) and `SPEC_FULL.md` supplement 4.
pub const MEM_CIRCUIT: &str = "mem";

/// A named group of modules emitted as one FIRRTL `circuit` block. The
/// module whose name matches the circuit's own name is the circuit's
/// public/top module (spec §4.7, `_firrtl.py::_module`'s `public` rule).
#[derive(Debug, Clone, Default)]
pub struct Circuit {
    pub name: Symbol,
    pub order: Vec<Symbol>,
    pub modules: FxHashMap<Symbol, Module>,
}

impl Circuit {
    pub fn new(name: Symbol) -> Self {
        Self { name, ..Default::default() }
    }

    pub fn insert(&mut self, module: Module) -> Result<(), BuildError> {
        if self.modules.contains_key(&module.name) {
            return Err(BuildError::DuplicateMember(module.name));
        }
        self.order.push(module.name);
        self.modules.insert(module.name, module);
        Ok(())
    }

    pub fn get(&self, name: Symbol) -> Option<&Module> {
        self.modules.get(&name)
    }

    pub fn is_public(&self, module: Symbol) -> bool {
        module == self.name
    }
}

/// The top-level IR: every circuit, keyed by name (spec §3 "IR (Database)").
#[derive(Debug, Clone, Default)]
pub struct Database {
    pub circuits: FxHashMap<Symbol, Circuit>,
}

impl Database {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn circuit_mut(&mut self, name: Symbol) -> &mut Circuit {
        self.circuits.entry(name).or_insert_with(|| Circuit::new(name))
    }

    pub fn circuit(&self, name: Symbol) -> Option<&Circuit> {
        self.circuits.get(&name)
    }

    /// Adds a completed module to `circuit`.
    pub fn add_module(&mut self, circuit: Symbol, module: Module) -> Result<(), BuildError> {
        self.circuit_mut(circuit).insert(module)
    }

    /// Creates an anonymous memory "module" in the reserved `mem` circuit,
    /// the way `_memory.py::memory()` builds one via an anonymous
    /// `module("")`, and returns its generated name for instantiation.
    ///
    /// `data_type` is the element type stored at each address; `depth` is
    /// the number of addressable rows. Reader/writer/readwriter port
    /// counts and latencies mirror `_firrtl.py::_memory`'s defaults (each
    /// latency defaults to `1`).
    #[allow(clippy::too_many_arguments)]
    pub fn memory(
        &mut self,
        data_type: Type,
        depth: u32,
        readers: u32,
        writers: u32,
        readwriters: u32,
        read_latency: u32,
        write_latency: u32,
    ) -> Result<Symbol, BuildError> {
        let mem_circuit = Symbol::intern(MEM_CIRCUIT);
        let existing = self.circuits.get(&mem_circuit).map(|c| c.order.len()).unwrap_or(0);
        let name = Symbol::intern(format!("mem_{existing}"));
        let mut module = Module::new(name);
        module.data.insert(
            name,
            Member::MemoryDef {
                data_type,
                depth,
                readers,
                writers,
                readwriters,
                read_latency,
                write_latency,
            },
        );
        self.circuit_mut(mem_circuit).insert(module)?;
        Ok(name)
    }

    pub fn module_builder(&self, name: Symbol) -> ModuleBuilder {
        ModuleBuilder::new(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn circuit_tracks_public_module() {
        let mut db = Database::new();
        let top = Symbol::intern("mux4");
        let sub = Symbol::intern("mux");
        db.add_module(top, Module::new(top)).unwrap();
        db.add_module(top, Module::new(sub)).unwrap();
        let circuit = db.circuit(top).unwrap();
        assert!(circuit.is_public(top));
        assert!(!circuit.is_public(sub));
        assert_eq!(circuit.order, vec![top, sub]);
    }

    #[test]
    fn memory_registers_under_reserved_circuit() {
        let mut db = Database::new();
        let name = db.memory(Type::uint(8), 16, 1, 1, 0, 1, 1).unwrap();
        let circuit = db.circuit(Symbol::intern(MEM_CIRCUIT)).unwrap();
        assert!(circuit.get(name).is_some());
    }
}
