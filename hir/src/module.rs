use firc_hir_symbol::Symbol;
use firc_hir_type::Type;
use rustc_hash::FxHashMap;

use crate::error::BuildError;
use crate::expr::{Expr, LValue, PathElem};
use crate::stmt::Stmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Input,
    Output,
}

impl Direction {
    pub fn flip(self) -> Self {
        match self {
            Direction::Input => Direction::Output,
            Direction::Output => Direction::Input,
        }
    }
}

/// A module-level helper function registered via `@m.function` in the
/// original (`_module.py`'s `_ModuleFunc`): a named statement template
/// invoked with positional arguments from `code`/other functions.
#[derive(Debug, Clone)]
pub struct Function {
    pub name: Symbol,
    pub params: Vec<Symbol>,
    pub body: Vec<Stmt>,
}

/// A single named member of a module: a port, wire, register, sub-module
/// instance, or attribute.
#[derive(Debug, Clone)]
pub enum Member {
    Port { ty: Type, dir: Direction },
    Wire { ty: Type },
    Register { ty: Type, clock: Symbol, reset: Option<(Symbol, crate::expr::Expr)> },
    /// `(circuit, module)` names the instantiated module; `circuit` is the
    /// reserved `"mem"` circuit for memories (`SPEC_FULL.md` supplement 4).
    Instance { circuit: Symbol, module: Symbol },
    Attribute { value: serde_json::Value },
    /// A memory definition living in the reserved `mem` circuit
    /// (`SPEC_FULL.md` supplement 4, grounded on `_memory.py`/
    /// `_firrtl.py::_memory`). Never appears as a member of an ordinary
    /// module; instantiating one records a `Member::Instance` whose
    /// `circuit` is `"mem"`.
    MemoryDef {
        data_type: Type,
        depth: u32,
        readers: u32,
        writers: u32,
        readwriters: u32,
        read_latency: u32,
        write_latency: u32,
    },
}

impl Member {
    pub fn ty(&self) -> Option<&Type> {
        match self {
            Member::Port { ty, .. } => Some(ty),
            Member::Wire { ty } => Some(ty),
            Member::Register { ty, .. } => Some(ty),
            _ => None,
        }
    }
}

/// Reserved names that cannot be used as member names, mirroring
/// `_module.py::_Module._RESERVED` (`SPEC_FULL.md` supplement).
pub const RESERVED_NAMES: &[&str] = &["cat", "function", "code"];

/// A single hardware module: its ordered member lists, member data, and
/// top-level statement body.
///
/// Ordered name lists (`inputs`, `outputs`, `wires`, `registers`,
/// `instances`, `attributes`) are kept alongside the `data` map so
/// emission can walk members in declaration order while still offering
/// O(1) lookup by name, matching the `Database`'s shape described in
/// spec §3.
#[derive(Debug, Clone, Default)]
pub struct Module {
    pub name: Symbol,
    pub inputs: Vec<Symbol>,
    pub outputs: Vec<Symbol>,
    pub wires: Vec<Symbol>,
    pub registers: Vec<Symbol>,
    pub instances: Vec<Symbol>,
    pub attributes: Vec<Symbol>,
    pub data: FxHashMap<Symbol, Member>,
    pub functions: FxHashMap<Symbol, Function>,
    pub code: Vec<Stmt>,
}

impl Module {
    pub fn new(name: Symbol) -> Self {
        Self { name, ..Default::default() }
    }

    pub fn member(&self, name: Symbol) -> Option<&Member> {
        self.data.get(&name)
    }
}

/// Builds up a [`Module`], validating each operation the way `hamp`'s
/// `_Module.__setattr__`/`_db.py` validation helpers do at add-time rather
/// than only at the end, so mistakes surface at the call site that made
/// them (spec §4.4).
///
/// `when`/`else_when`/`otherwise` chain onto the module's own statement
/// list: each call temporarily swaps the builder's active statement buffer
/// for the branch being built, runs the supplied closure against `self`,
/// then restores it — the same "build a nested scope, then splice it back
/// in" shape as `ProgramBuilder`'s function-building closures.
pub struct ModuleBuilder {
    module: Module,
}

fn validate_identifier(name: Symbol) -> Result<(), BuildError> {
    let s = name.as_str();
    let mut chars = s.chars();
    let first_ok = chars.next().map(|c| c.is_ascii_alphabetic() || c == '_').unwrap_or(false);
    let rest_ok = chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
    if !first_ok || !rest_ok {
        return Err(BuildError::InvalidIdentifier(s.to_string()));
    }
    if RESERVED_NAMES.contains(&s) {
        return Err(BuildError::ReservedName(name));
    }
    Ok(())
}

impl ModuleBuilder {
    pub fn new(name: Symbol) -> Self {
        Self { module: Module::new(name) }
    }

    pub fn finish(self) -> Module {
        self.module
    }

    fn declare(&mut self, name: Symbol) -> Result<(), BuildError> {
        validate_identifier(name)?;
        if self.module.data.contains_key(&name) {
            return Err(BuildError::DuplicateMember(name));
        }
        Ok(())
    }

    pub fn input(&mut self, name: Symbol, ty: Type) -> Result<&mut Self, BuildError> {
        self.declare(name)?;
        self.module.data.insert(name, Member::Port { ty, dir: Direction::Input });
        self.module.inputs.push(name);
        Ok(self)
    }

    pub fn output(&mut self, name: Symbol, ty: Type) -> Result<&mut Self, BuildError> {
        self.declare(name)?;
        self.module.data.insert(name, Member::Port { ty, dir: Direction::Output });
        self.module.outputs.push(name);
        Ok(self)
    }

    pub fn wire(&mut self, name: Symbol, ty: Type) -> Result<&mut Self, BuildError> {
        self.declare(name)?;
        self.module.data.insert(name, Member::Wire { ty });
        self.module.wires.push(name);
        Ok(self)
    }

    /// Adds a register. `reset` is `None` for a register that never
    /// resets (`SPEC_FULL.md` supplement 6); when present, its first
    /// element is `None` to infer the reset signal or `Some` to name a
    /// reset-compatible signal already declared on this module.
    ///
    /// `clock`/the reset signal are each inferred, when omitted, as the
    /// first eligible input port (clock-typed / reset-typed) declared on
    /// the module (spec §4.4, testable property #5); the reset signal's
    /// absence is only an error when a reset value was actually requested.
    pub fn register(
        &mut self,
        name: Symbol,
        ty: Type,
        clock: Option<Symbol>,
        reset: Option<(Option<Symbol>, Expr)>,
    ) -> Result<&mut Self, BuildError> {
        self.declare(name)?;
        let clock = match clock {
            Some(clock) => {
                self.expect_clock(clock)?;
                clock
            }
            None => self.first_clock_input()?,
        };
        let reset = match reset {
            None => None,
            Some((Some(rst), value)) => {
                self.expect_reset(rst)?;
                Some((rst, value))
            }
            Some((None, value)) => {
                let rst = self.first_reset_input().ok_or(BuildError::MissingResetSignal)?;
                Some((rst, value))
            }
        };
        self.module.data.insert(name, Member::Register { ty, clock, reset });
        self.module.registers.push(name);
        Ok(self)
    }

    pub fn instance(&mut self, name: Symbol, circuit: Symbol, target_module: Symbol) -> Result<&mut Self, BuildError> {
        self.declare(name)?;
        self.module.data.insert(name, Member::Instance { circuit, module: target_module });
        self.module.instances.push(name);
        Ok(self)
    }

    pub fn attribute(&mut self, name: Symbol, value: serde_json::Value) -> Result<&mut Self, BuildError> {
        self.declare(name)?;
        self.module.data.insert(name, Member::Attribute { value });
        self.module.attributes.push(name);
        Ok(self)
    }

    pub fn function(&mut self, name: Symbol, params: Vec<Symbol>, body: Vec<Stmt>) -> Result<&mut Self, BuildError> {
        if self.module.functions.contains_key(&name) {
            return Err(BuildError::DuplicateMember(name));
        }
        self.module.functions.insert(name, Function { name, params, body });
        Ok(self)
    }

    fn expect_clock(&self, name: Symbol) -> Result<(), BuildError> {
        match self.module.data.get(&name).and_then(Member::ty) {
            Some(ty) if ty.is_clock() => Ok(()),
            Some(ty) => Err(BuildError::InvalidResetType(ty.clone())),
            None => Err(BuildError::UnknownMember(name)),
        }
    }

    fn expect_reset(&self, name: Symbol) -> Result<(), BuildError> {
        match self.module.data.get(&name).and_then(Member::ty) {
            Some(ty) if ty.is_reset_compatible() => Ok(()),
            Some(ty) => Err(BuildError::InvalidResetType(ty.clone())),
            None => Err(BuildError::UnknownMember(name)),
        }
    }

    /// The first declared input port of clock type, for `register`'s
    /// clock inference (spec §4.4, testable property #5: "the first
    /// module member that is an input of clock type").
    fn first_clock_input(&self) -> Result<Symbol, BuildError> {
        self.module
            .inputs
            .iter()
            .copied()
            .find(|name| matches!(self.module.data.get(name), Some(Member::Port { ty, .. }) if ty.is_clock()))
            .ok_or(BuildError::NoClockInput(self.module.name))
    }

    /// The first declared input port of reset-compatible type, for
    /// `register`'s reset-signal inference.
    fn first_reset_input(&self) -> Option<Symbol> {
        self.module
            .inputs
            .iter()
            .copied()
            .find(|name| matches!(self.module.data.get(name), Some(Member::Port { ty, .. }) if ty.is_reset_compatible()))
    }

    /// The module's sole clock-typed input, for `printf`/`assertf`/
    /// `coverf`'s clock inference ("clock may be inferred as the module's
    /// sole clock input when omitted", spec §4.4). Zero or more than one
    /// candidate is ambiguous and is an error either way.
    fn sole_clock_input(&self) -> Result<Symbol, BuildError> {
        let mut found = None;
        for name in &self.module.inputs {
            if matches!(self.module.data.get(name), Some(Member::Port { ty, .. }) if ty.is_clock()) {
                if found.is_some() {
                    return Err(BuildError::NoClockInput(self.module.name));
                }
                found = Some(*name);
            }
        }
        found.ok_or(BuildError::NoClockInput(self.module.name))
    }

    /// Resolves an lvalue path to its final type and, when the path
    /// terminates on a port (or an instance's port), its effective
    /// direction as seen from this module.
    ///
    /// The effective direction is the root's declared direction XORed
    /// with every `flip` bit crossed while descending the struct path —
    /// the "flip algebra" spec §4.4 describes. A single XOR accumulator
    /// is equivalent to tracking direction inversions one field at a time.
    pub fn resolve(&self, lvalue: &LValue) -> Result<(Type, Option<Direction>), BuildError> {
        let member = self.module.data.get(&lvalue.root).ok_or(BuildError::UnknownMember(lvalue.root))?;
        let (mut ty, mut dir) = match member {
            Member::Port { ty, dir } => (ty.clone(), Some(*dir)),
            Member::Wire { ty } => (ty.clone(), None),
            Member::Register { ty, .. } => (ty.clone(), None),
            Member::Instance { .. } | Member::Attribute { .. } => {
                return Err(BuildError::NotIndexable(Type::Uint(0)));
            }
        };
        for elem in &lvalue.path {
            match elem {
                PathElem::Field(name) => {
                    let s = ty.as_struct().ok_or_else(|| BuildError::NotIndexable(ty.clone()))?;
                    let field = s.field(*name).ok_or_else(|| BuildError::NoSuchField(ty.clone(), *name))?;
                    if field.flip {
                        dir = dir.map(Direction::flip);
                    }
                    ty = field.ty.clone();
                }
                PathElem::ConstIndex(idx) => {
                    let (elem_ty, size) = ty.as_array().ok_or_else(|| BuildError::NotIndexable(ty.clone()))?;
                    if *idx >= size {
                        return Err(BuildError::IndexOutOfBounds { index: *idx, size });
                    }
                    ty = elem_ty.clone();
                }
                PathElem::Index(_) => {
                    let (elem_ty, _) = ty.as_array().ok_or_else(|| BuildError::NotIndexable(ty.clone()))?;
                    ty = elem_ty.clone();
                }
            }
        }
        Ok((ty, dir))
    }

    /// `m.x = expr`: validates direction (writable) and type compatibility,
    /// then records a `Connect` statement in the currently active scope.
    pub fn connect(&mut self, lvalue: LValue, rhs: Expr) -> Result<&mut Self, BuildError> {
        let (ty, dir) = self.resolve(&lvalue)?;
        if let Some(Direction::Input) = dir {
            return Err(BuildError::NotWritable(lvalue.root));
        }
        if !ty.equivalent(&rhs.ty) {
            return Err(BuildError::TypeMismatch { expected: ty, found: rhs.ty });
        }
        self.module.code.push(Stmt::Connect { lhs: lvalue, rhs });
        Ok(self)
    }

    fn check_condition(&self, cond: &Expr) -> Result<(), BuildError> {
        if cond.ty.bitsize() != 1 {
            return Err(BuildError::NotAHardwareCondition(self.module.name));
        }
        Ok(())
    }

    fn with_scope(&mut self, f: impl FnOnce(&mut Self)) -> Vec<Stmt> {
        let mut scope = Vec::new();
        std::mem::swap(&mut self.module.code, &mut scope);
        f(self);
        std::mem::swap(&mut self.module.code, &mut scope);
        scope
    }

    pub fn when(&mut self, cond: Expr, then: impl FnOnce(&mut Self)) -> Result<&mut Self, BuildError> {
        self.check_condition(&cond)?;
        let body = self.with_scope(then);
        self.module.code.push(Stmt::When { cond, then: body, else_ifs: Vec::new(), otherwise: None });
        Ok(self)
    }

    pub fn else_when(&mut self, cond: Expr, then: impl FnOnce(&mut Self)) -> Result<&mut Self, BuildError> {
        self.check_condition(&cond)?;
        let body = self.with_scope(then);
        match self.module.code.last_mut() {
            Some(Stmt::When { else_ifs, otherwise: None, .. }) => {
                else_ifs.push((cond, body));
                Ok(self)
            }
            _ => Err(BuildError::DanglingElse),
        }
    }

    pub fn otherwise(&mut self, then: impl FnOnce(&mut Self)) -> Result<&mut Self, BuildError> {
        let body = self.with_scope(then);
        match self.module.code.last_mut() {
            Some(Stmt::When { otherwise @ None, .. }) => {
                *otherwise = Some(body);
                Ok(self)
            }
            _ => Err(BuildError::DanglingElse),
        }
    }

    /// `printf(clk?, en?, fmt, args…)`: `enable` defaults to `u1(1)` when
    /// omitted, resolved here rather than left implicit in the statement
    /// (`SPEC_FULL.md` Open Question 3); `clock` defaults to the module's
    /// sole clock input (spec §4.4).
    pub fn printf(
        &mut self,
        clock: Option<Symbol>,
        format: impl Into<String>,
        args: Vec<Expr>,
        enable: Option<Expr>,
    ) -> Result<&mut Self, BuildError> {
        let format = format.into();
        check_format_arity(&format, args.len())?;
        let enable = enable.unwrap_or_else(default_enable);
        let clock = self.resolve_clock(clock)?;
        self.module.code.push(Stmt::Printf { clock, format, args, enable });
        Ok(self)
    }

    pub fn assertf(
        &mut self,
        clock: Option<Symbol>,
        format: impl Into<String>,
        args: Vec<Expr>,
        cond: Expr,
        enable: Option<Expr>,
    ) -> Result<&mut Self, BuildError> {
        let format = format.into();
        check_format_arity(&format, args.len())?;
        let enable = enable.unwrap_or_else(default_enable);
        let clock = self.resolve_clock(clock)?;
        self.module.code.push(Stmt::Assertf { clock, format, args, cond, enable });
        Ok(self)
    }

    pub fn coverf(
        &mut self,
        clock: Option<Symbol>,
        format: impl Into<String>,
        cond: Expr,
        enable: Option<Expr>,
    ) -> Result<&mut Self, BuildError> {
        let enable = enable.unwrap_or_else(default_enable);
        let clock = self.resolve_clock(clock)?;
        self.module.code.push(Stmt::Coverf { clock, format: format.into(), cond, enable });
        Ok(self)
    }

    fn resolve_clock(&self, clock: Option<Symbol>) -> Result<Symbol, BuildError> {
        match clock {
            Some(clock) => {
                self.expect_clock(clock)?;
                Ok(clock)
            }
            None => self.sole_clock_input(),
        }
    }

    pub fn call(&mut self, name: Symbol, args: Vec<Expr>) -> Result<&mut Self, BuildError> {
        if !self.module.functions.contains_key(&name) {
            return Err(BuildError::UnknownMember(name));
        }
        self.module.code.push(Stmt::Call { name, args });
        Ok(self)
    }
}

/// Resolves an lvalue path to its final type within `module`, ignoring
/// direction — the same traversal [`ModuleBuilder::resolve`] performs,
/// exposed standalone for the validator (§4.6), which checks a finished
/// `Module` with no live `ModuleBuilder` to query.
pub fn resolve_member_type(module: &Module, lvalue: &LValue) -> Option<Type> {
    let mut ty = module.data.get(&lvalue.root)?.ty()?.clone();
    for elem in &lvalue.path {
        match elem {
            PathElem::Field(name) => {
                ty = ty.as_struct()?.field(*name)?.ty.clone();
            }
            PathElem::ConstIndex(_) | PathElem::Index(_) => {
                ty = ty.as_array()?.0.clone();
            }
        }
    }
    Some(ty)
}

fn default_enable() -> Expr {
    Expr::literal(firc_hir_type::Value::Int(Type::Uint(1), 1))
}

/// Counts `%b`/`%d`/`%x` placeholders and compares against `args.len()`,
/// the exact check `_db.py::_validate_fmt` performs (and the exact error
/// family spec's "Format-string mismatch" scenario, §8, exercises).
fn check_format_arity(format: &str, found: usize) -> Result<(), BuildError> {
    let expected = count_placeholders(format);
    if expected != found {
        return Err(BuildError::FormatArityMismatch { expected, found });
    }
    Ok(())
}

fn count_placeholders(format: &str) -> usize {
    let bytes = format.as_bytes();
    let mut count = 0;
    let mut i = 0;
    while i + 1 < bytes.len() {
        if bytes[i] == b'%' && matches!(bytes[i + 1], b'b' | b'd' | b'x') {
            count += 1;
            i += 2;
        } else {
            i += 1;
        }
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;
    use firc_hir_symbol::Symbol;

    #[test]
    fn rejects_write_to_input() {
        let mut b = ModuleBuilder::new(Symbol::intern("m"));
        b.input(Symbol::intern("x"), Type::uint(1)).unwrap();
        let lv = LValue::new(Symbol::intern("x"));
        let rhs = Expr::literal(firc_hir_type::Value::Int(Type::uint(1), 1));
        assert!(matches!(b.connect(lv, rhs), Err(BuildError::NotWritable(_))));
    }

    #[test]
    fn format_arity_checked() {
        assert_eq!(count_placeholders("value=%d flag=%b"), 2);
        assert_eq!(count_placeholders("no placeholders"), 0);
    }

    #[test]
    fn register_infers_clock_from_first_clock_input() {
        let mut b = ModuleBuilder::new(Symbol::intern("m"));
        b.input(Symbol::intern("clk"), Type::Clock).unwrap();
        b.register(Symbol::intern("r"), Type::uint(8), None, None).unwrap();
        let module = b.finish();
        match module.data.get(&Symbol::intern("r")) {
            Some(Member::Register { clock, .. }) => assert_eq!(*clock, Symbol::intern("clk")),
            _ => panic!("expected a register"),
        }
    }

    #[test]
    fn register_without_clock_input_errors() {
        let mut b = ModuleBuilder::new(Symbol::intern("m"));
        assert!(matches!(
            b.register(Symbol::intern("r"), Type::uint(8), None, None),
            Err(BuildError::NoClockInput(_))
        ));
    }

    #[test]
    fn register_infers_reset_signal_when_value_given() {
        let mut b = ModuleBuilder::new(Symbol::intern("m"));
        b.input(Symbol::intern("clk"), Type::Clock).unwrap();
        b.input(Symbol::intern("rst"), Type::Reset).unwrap();
        let reset_value = Expr::literal(firc_hir_type::Value::Int(Type::uint(8), 0));
        b.register(Symbol::intern("r"), Type::uint(8), None, Some((None, reset_value))).unwrap();
        let module = b.finish();
        match module.data.get(&Symbol::intern("r")) {
            Some(Member::Register { reset: Some((signal, _)), .. }) => {
                assert_eq!(*signal, Symbol::intern("rst"))
            }
            _ => panic!("expected a register with an inferred reset signal"),
        }
    }

    #[test]
    fn register_reset_value_without_reset_input_errors() {
        let mut b = ModuleBuilder::new(Symbol::intern("m"));
        b.input(Symbol::intern("clk"), Type::Clock).unwrap();
        let reset_value = Expr::literal(firc_hir_type::Value::Int(Type::uint(8), 0));
        assert!(matches!(
            b.register(Symbol::intern("r"), Type::uint(8), None, Some((None, reset_value))),
            Err(BuildError::MissingResetSignal)
        ));
    }

    #[test]
    fn printf_infers_sole_clock_input() {
        let mut b = ModuleBuilder::new(Symbol::intern("m"));
        b.input(Symbol::intern("clk"), Type::Clock).unwrap();
        b.printf(None, "hi", Vec::new(), None).unwrap();
        let module = b.finish();
        match &module.code[0] {
            Stmt::Printf { clock, .. } => assert_eq!(*clock, Symbol::intern("clk")),
            _ => panic!("expected a Printf statement"),
        }
    }

    #[test]
    fn printf_with_ambiguous_clocks_errors() {
        let mut b = ModuleBuilder::new(Symbol::intern("m"));
        b.input(Symbol::intern("clk1"), Type::Clock).unwrap();
        b.input(Symbol::intern("clk2"), Type::Clock).unwrap();
        assert!(matches!(b.printf(None, "hi", Vec::new(), None), Err(BuildError::NoClockInput(_))));
    }

    #[test]
    fn connect_rejects_non_equivalent_types() {
        let mut b = ModuleBuilder::new(Symbol::intern("m"));
        b.output(Symbol::intern("y"), Type::uint(4).array(2)).unwrap();
        let lv = LValue::new(Symbol::intern("y"));
        let rhs = Expr::literal(firc_hir_type::Value::Int(Type::uint(4), 0));
        assert!(matches!(b.connect(lv, rhs), Err(BuildError::TypeMismatch { .. })));
    }

    #[test]
    fn connect_allows_equivalent_types_of_different_width() {
        let mut b = ModuleBuilder::new(Symbol::intern("m"));
        b.output(Symbol::intern("y"), Type::uint(8)).unwrap();
        let lv = LValue::new(Symbol::intern("y"));
        let rhs = Expr::literal(firc_hir_type::Value::Int(Type::uint(1), 1));
        assert!(b.connect(lv, rhs).is_ok());
    }

    #[test]
    fn when_else_when_otherwise_chain() {
        let mut b = ModuleBuilder::new(Symbol::intern("m"));
        b.input(Symbol::intern("en"), Type::uint(1)).unwrap();
        b.output(Symbol::intern("y"), Type::uint(1)).unwrap();
        let cond = Expr::reference(LValue::new(Symbol::intern("en")), Type::uint(1));
        b.when(cond, |b| {
            b.connect(
                LValue::new(Symbol::intern("y")),
                Expr::literal(firc_hir_type::Value::Int(Type::uint(1), 1)),
            )
            .unwrap();
        })
        .unwrap();
        b.otherwise(|b| {
            b.connect(
                LValue::new(Symbol::intern("y")),
                Expr::literal(firc_hir_type::Value::Int(Type::uint(1), 0)),
            )
            .unwrap();
        })
        .unwrap();
        let module = b.finish();
        assert_eq!(module.code.len(), 1);
        match &module.code[0] {
            Stmt::When { then, otherwise, .. } => {
                assert_eq!(then.len(), 1);
                assert!(otherwise.is_some());
            }
            _ => panic!("expected a When statement"),
        }
    }
}
