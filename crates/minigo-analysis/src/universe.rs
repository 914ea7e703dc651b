//! Universe scope: predeclared types, constants, builtins and the C
//! library functions every program may call.

use minigo_common::{
    Arena, ConstId, Entity, FuncId, GtypeId, ScopeId, Span, SymbolInterner,
};

use crate::program::{BasicTypes, Builtin, ConstKind, ConstValue, Constant, FuncKind, Function, Program};
use crate::scope::Scope;
use crate::types::{Gtype, GtypeKind, MethodSig};

/// Package name under which C library functions are declared.
pub const LIBC: &str = "libc";

const BUILTINS: [Builtin; 6] = [
    Builtin::Len,
    Builtin::Cap,
    Builtin::Append,
    Builtin::Panic,
    Builtin::Print,
    Builtin::Println,
];

/// `(name, returns int)`. Arguments are not checked.
const EXTERNS: [(&str, bool); 4] = [("exit", false), ("open", true), ("read", true), ("write", true)];

struct Builder<'a> {
    interner: &'a mut SymbolInterner,
    gtypes: Arena<GtypeId, Gtype>,
    consts: Arena<ConstId, Constant>,
    funcs: Arena<FuncId, Function>,
    scope: Scope,
}

impl Builder<'_> {
    fn declare(&mut self, name: &str, entity: Entity) {
        let sym = self.interner.intern(name);
        // The table is fixed and has no duplicates.
        let _ = self.scope.declare(sym, entity);
    }

    fn basic(&mut self, name: &str, kind: GtypeKind) -> GtypeId {
        let id = self.gtypes.insert(Gtype::new(kind));
        self.declare(name, Entity::Type(id));
        id
    }

    fn constant(&mut self, name: &str, kind: ConstKind, ty: Option<GtypeId>, value: Option<ConstValue>) -> ConstId {
        let sym = self.interner.intern(name);
        let id = self.consts.insert(Constant {
            name: sym,
            kind,
            ty,
            explicit_type: false,
            value,
            expr: None,
            iota: 0,
            span: Span::dummy(),
        });
        self.declare(name, Entity::Const(id));
        id
    }
}

pub(crate) fn create_program(interner: &mut SymbolInterner) -> Program {
    let universe_pkg = interner.intern("");
    let libc = interner.intern(LIBC);
    let blank = interner.intern("_");
    let mut b = Builder {
        interner,
        gtypes: Arena::new(),
        consts: Arena::new(),
        funcs: Arena::new(),
        scope: Scope::new(None),
    };

    let int = b.basic("int", GtypeKind::Int);
    let byte = b.basic("byte", GtypeKind::Byte);
    b.declare("uint8", Entity::Type(byte));
    let bool_ = b.basic("bool", GtypeKind::Bool);
    let string = b.basic("string", GtypeKind::String);

    // type error interface { Error() string }
    let error_sym = b.interner.intern("Error");
    let error_iface = b.gtypes.insert(Gtype::new(GtypeKind::Interface(vec![MethodSig {
        name: error_sym,
        params: Vec::new(),
        results: vec![string],
        variadic: false,
    }])));
    let error_name = b.interner.intern("error");
    let error = b.gtypes.insert(Gtype::new(GtypeKind::Named {
        name: error_name,
        pkg: universe_pkg,
        underlying: Some(error_iface),
        local: None,
    }));
    b.declare("error", Entity::Type(error));

    b.constant("true", ConstKind::True, Some(bool_), Some(ConstValue::Bool(true)));
    b.constant("false", ConstKind::False, Some(bool_), Some(ConstValue::Bool(false)));
    let iota = b.constant("iota", ConstKind::Iota, Some(int), None);
    let nil = b.constant("nil", ConstKind::Nil, None, None);

    for builtin in BUILTINS {
        let sym = b.interner.intern(builtin.name());
        let id = b.funcs.insert(Function::new(
            sym,
            universe_pkg,
            FuncKind::Builtin(builtin),
            Span::dummy(),
        ));
        b.declare(builtin.name(), Entity::Func(id));
    }

    for (name, returns_int) in EXTERNS {
        let sym = b.interner.intern(name);
        let mut f = Function::new(sym, libc, FuncKind::Extern, Span::dummy());
        if returns_int {
            f.results.push(int);
        }
        let id = b.funcs.insert(f);
        b.declare(name, Entity::Func(id));
    }

    let mut scopes: Arena<ScopeId, Scope> = Arena::new();
    let universe = scopes.insert(b.scope);
    let types = BasicTypes {
        int,
        byte,
        bool: bool_,
        string,
        error,
    };
    Program::from_parts(
        b.gtypes,
        b.consts,
        b.funcs,
        scopes,
        universe,
        types,
        universe_pkg,
        blank,
        nil,
        iota,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_universe_contents() {
        let mut interner = SymbolInterner::new();
        let program = Program::new(&mut interner);
        let lookup = |name: &str| {
            let sym = interner.get(name).unwrap();
            program.lookup(program.universe, sym)
        };
        assert_eq!(lookup("int"), Some(Entity::Type(program.types.int)));
        assert_eq!(lookup("uint8"), Some(Entity::Type(program.types.byte)));
        assert_eq!(lookup("nil"), Some(Entity::Const(program.nil)));
        assert!(matches!(lookup("println"), Some(Entity::Func(_))));
        assert!(matches!(lookup("write"), Some(Entity::Func(_))));
        assert!(program.is_interface(program.types.error));
    }

    #[test]
    fn test_extern_symbols_are_bare() {
        let mut interner = SymbolInterner::new();
        let program = Program::new(&mut interner);
        let exit = interner.get("exit").unwrap();
        let Some(Entity::Func(f)) = program.lookup(program.universe, exit) else {
            panic!("exit is not a function");
        };
        assert_eq!(program.func_symbol(f, &interner), "exit");
        assert!(program.funcs[f].results.is_empty());
        assert_eq!(program.type_name(program.types.error, &interner), "error");
    }
}
