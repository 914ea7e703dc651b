//! The whole-program model built up by analysis.
//!
//! All entities live in typed arenas owned by [`Program`]. Packages are
//! added one at a time in dependency order and keep their parsed files,
//! which later phases read through entity ids stored in the AST.

use std::collections::HashMap;

use minigo_common::{
    Arena, AsmLabel, ConstId, Entity, FuncId, GtypeId, ScopeId, Span, Symbol, SymbolInterner, VarId,
};
use minigo_syntax::ast::{Expr, File, Relation};

use crate::methods::MethodRegistry;
use crate::scope::Scope;
use crate::typeids::TypeIds;
use crate::types::{Gtype, GtypeKind, MethodSig, Width};
use crate::universe;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarType {
    Known(GtypeId),
    /// Declared without a type; filled in by inference.
    Dependent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarKind {
    Global,
    Local,
    Param,
}

#[derive(Debug, Clone)]
pub struct Variable {
    pub name: Symbol,
    pub ty: VarType,
    pub kind: VarKind,
    /// Package that declares the variable (its symbol prefix for globals).
    pub pkg: Symbol,
    pub span: Span,
}

impl Variable {
    pub fn gtype(&self) -> Option<GtypeId> {
        match self.ty {
            VarType::Known(t) => Some(t),
            VarType::Dependent => None,
        }
    }

    pub fn is_global(&self) -> bool {
        self.kind == VarKind::Global
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConstValue {
    Int(i64),
    Bool(bool),
    /// String text as written (escapes kept) and its length at run time.
    Str { text: String, len: usize },
}

impl ConstValue {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            ConstValue::Int(n) => Some(*n),
            ConstValue::Bool(b) => Some(*b as i64),
            ConstValue::Str { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstKind {
    User,
    True,
    False,
    Iota,
    Nil,
}

#[derive(Debug, Clone)]
pub struct Constant {
    pub name: Symbol,
    pub kind: ConstKind,
    /// Declared type, or the type of the value once evaluated.
    pub ty: Option<GtypeId>,
    /// True if the declaration names a type; untyped constants adapt to
    /// the other operand in binary expressions.
    pub explicit_type: bool,
    pub value: Option<ConstValue>,
    pub expr: Option<Expr>,
    pub iota: i64,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Builtin {
    Len,
    Cap,
    Append,
    Panic,
    Print,
    Println,
}

impl Builtin {
    pub fn name(self) -> &'static str {
        match self {
            Builtin::Len => "len",
            Builtin::Cap => "cap",
            Builtin::Append => "append",
            Builtin::Panic => "panic",
            Builtin::Print => "print",
            Builtin::Println => "println",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FuncKind {
    User,
    /// `recv` is the named receiver type with any pointer stripped.
    Method { recv: GtypeId, pointer: bool },
    Builtin(Builtin),
    /// A C library function. Arguments are passed unchecked.
    Extern,
}

#[derive(Debug, Clone)]
pub struct Function {
    pub name: Symbol,
    pub pkg: Symbol,
    pub kind: FuncKind,
    pub params: Vec<GtypeId>,
    pub results: Vec<GtypeId>,
    pub variadic: bool,
    /// Parameter variables, receiver first. `None` for `_` parameters.
    pub param_vars: Vec<Option<VarId>>,
    /// Every local declared in the body, in declaration order.
    pub locals: Vec<VarId>,
    pub has_body: bool,
    pub defer_label: Option<AsmLabel>,
    pub defer_count: u32,
    pub span: Span,
}

impl Function {
    pub fn new(name: Symbol, pkg: Symbol, kind: FuncKind, span: Span) -> Self {
        Self {
            name,
            pkg,
            kind,
            params: Vec::new(),
            results: Vec::new(),
            variadic: false,
            param_vars: Vec::new(),
            locals: Vec::new(),
            has_body: false,
            defer_label: None,
            defer_count: 0,
            span,
        }
    }

    pub fn is_method(&self) -> bool {
        matches!(self.kind, FuncKind::Method { .. })
    }

    pub fn builtin(&self) -> Option<Builtin> {
        match self.kind {
            FuncKind::Builtin(b) => Some(b),
            _ => None,
        }
    }
}

/// Location of a global `var` spec inside a package's files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlobalInit {
    pub file: usize,
    pub decl: usize,
    pub spec: usize,
}

#[derive(Debug)]
pub struct Package {
    pub name: Symbol,
    pub path: String,
    pub scope: ScopeId,
    pub files: Vec<File>,
    /// Globals in declaration order.
    pub globals: Vec<VarId>,
    /// Every constant declared in the package, local ones included.
    pub consts: Vec<ConstId>,
    /// Functions and methods in declaration order.
    pub funcs: Vec<FuncId>,
    pub init: Option<FuncId>,
    /// Global `var` specs in initialization order.
    pub init_order: Vec<GlobalInit>,
}

/// Ids of the predeclared types.
#[derive(Debug, Clone, Copy)]
pub struct BasicTypes {
    pub int: GtypeId,
    pub byte: GtypeId,
    pub bool: GtypeId,
    pub string: GtypeId,
    pub error: GtypeId,
}

#[derive(Debug)]
pub struct Program {
    pub vars: Arena<VarId, Variable>,
    pub consts: Arena<ConstId, Constant>,
    pub funcs: Arena<FuncId, Function>,
    pub gtypes: Arena<GtypeId, Gtype>,
    pub scopes: Arena<ScopeId, Scope>,
    pub packages: Vec<Package>,
    pub universe: ScopeId,
    pub types: BasicTypes,
    pub methods: MethodRegistry,
    pub type_ids: TypeIds,
    /// Package name of predeclared entities.
    pub universe_pkg: Symbol,
    pub blank: Symbol,
    pub nil: ConstId,
    pub iota: ConstId,
    pub(crate) package_index: HashMap<Symbol, usize>,
    pub(crate) pending_aliases: Vec<GtypeId>,
    pub(crate) pending_array_lens: Vec<(GtypeId, Expr)>,
    pointer_cache: HashMap<GtypeId, GtypeId>,
    slice_cache: HashMap<GtypeId, GtypeId>,
}

impl Program {
    /// Creates a program holding only the universe scope.
    pub fn new(interner: &mut SymbolInterner) -> Self {
        universe::create_program(interner)
    }

    #[allow(clippy::too_many_arguments)]
    pub(crate) fn from_parts(
        gtypes: Arena<GtypeId, Gtype>,
        consts: Arena<ConstId, Constant>,
        funcs: Arena<FuncId, Function>,
        scopes: Arena<ScopeId, Scope>,
        universe: ScopeId,
        types: BasicTypes,
        universe_pkg: Symbol,
        blank: Symbol,
        nil: ConstId,
        iota: ConstId,
    ) -> Self {
        Self {
            vars: Arena::new(),
            consts,
            funcs,
            gtypes,
            scopes,
            packages: Vec::new(),
            universe,
            types,
            methods: MethodRegistry::default(),
            type_ids: TypeIds::default(),
            universe_pkg,
            blank,
            nil,
            iota,
            package_index: HashMap::new(),
            pending_aliases: Vec::new(),
            pending_array_lens: Vec::new(),
            pointer_cache: HashMap::new(),
            slice_cache: HashMap::new(),
        }
    }

    // ==================== Lookup ====================

    /// Looks `name` up in `scope` and its parents.
    pub fn lookup(&self, scope: ScopeId, name: Symbol) -> Option<Entity> {
        let mut current = Some(scope);
        while let Some(id) = current {
            let s = &self.scopes[id];
            if let Some(entity) = s.lookup_local(name) {
                return Some(entity);
            }
            current = s.parent;
        }
        None
    }

    pub fn package_by_name(&self, name: Symbol) -> Option<&Package> {
        self.package_index.get(&name).map(|&i| &self.packages[i])
    }

    pub fn package_index(&self, name: Symbol) -> Option<usize> {
        self.package_index.get(&name).copied()
    }

    // ==================== Types ====================

    pub fn new_type(&mut self, kind: GtypeKind) -> GtypeId {
        self.gtypes.insert(Gtype::new(kind))
    }

    /// Follows resolved aliases to the type they stand for.
    pub fn canon(&self, mut id: GtypeId) -> GtypeId {
        // An alias chain can't be longer than the number of types.
        for _ in 0..=self.gtypes.len() {
            match &self.gtypes[id].kind {
                GtypeKind::Alias(Relation::Resolved {
                    entity: Entity::Type(target),
                    ..
                }) => id = *target,
                _ => return id,
            }
        }
        id
    }

    /// The underlying type: named types are replaced by their definition.
    pub fn underlying(&self, id: GtypeId) -> GtypeId {
        let mut id = self.canon(id);
        for _ in 0..=self.gtypes.len() {
            match &self.gtypes[id].kind {
                GtypeKind::Named {
                    underlying: Some(u),
                    ..
                } => id = self.canon(*u),
                _ => return id,
            }
        }
        id
    }

    /// The kind of the underlying type.
    pub fn kind(&self, id: GtypeId) -> &GtypeKind {
        &self.gtypes[self.underlying(id)].kind
    }

    pub fn is_interface(&self, id: GtypeId) -> bool {
        matches!(self.kind(id), GtypeKind::Interface(_))
    }

    pub fn is_string(&self, id: GtypeId) -> bool {
        matches!(self.kind(id), GtypeKind::String)
    }

    pub fn is_integer(&self, id: GtypeId) -> bool {
        matches!(self.kind(id), GtypeKind::Int | GtypeKind::Byte)
    }

    pub fn is_bool(&self, id: GtypeId) -> bool {
        matches!(self.kind(id), GtypeKind::Bool)
    }

    pub fn is_pointer(&self, id: GtypeId) -> bool {
        matches!(self.kind(id), GtypeKind::Pointer(_))
    }

    pub fn is_slice(&self, id: GtypeId) -> bool {
        matches!(self.kind(id), GtypeKind::Slice(_))
    }

    /// Element type of a pointer, slice or array.
    pub fn elem(&self, id: GtypeId) -> Option<GtypeId> {
        match self.kind(id) {
            GtypeKind::Pointer(e) | GtypeKind::Slice(e) | GtypeKind::Array { elem: e, .. } => {
                Some(*e)
            }
            _ => None,
        }
    }

    /// The named type itself, looking through a single pointer.
    pub fn named_receiver(&self, id: GtypeId) -> Option<(GtypeId, bool)> {
        let id = self.canon(id);
        match &self.gtypes[id].kind {
            GtypeKind::Named { .. } => Some((id, false)),
            GtypeKind::Pointer(elem) => {
                let elem = self.canon(*elem);
                self.gtypes[elem].is_named().then_some((elem, true))
            }
            _ => None,
        }
    }

    pub fn width(&self, id: GtypeId) -> Width {
        match self.kind(id) {
            GtypeKind::Byte => Width::Byte,
            GtypeKind::String | GtypeKind::Slice(_) | GtypeKind::Interface(_) => Width::Wide,
            GtypeKind::Struct(_) | GtypeKind::Array { .. } => Width::Aggregate,
            _ => Width::Narrow,
        }
    }

    /// Size in bytes. Valid after layout.
    pub fn size(&self, id: GtypeId) -> u32 {
        let u = self.underlying(id);
        self.gtypes[u].size.unwrap_or(0)
    }

    /// `*elem`, created once per element type.
    pub fn pointer_to(&mut self, elem: GtypeId) -> GtypeId {
        let elem = self.canon(elem);
        if let Some(&p) = self.pointer_cache.get(&elem) {
            return p;
        }
        let p = self.new_type(GtypeKind::Pointer(elem));
        self.pointer_cache.insert(elem, p);
        p
    }

    /// `[]elem`, created once per element type.
    pub fn slice_of(&mut self, elem: GtypeId) -> GtypeId {
        let elem = self.canon(elem);
        if let Some(&s) = self.slice_cache.get(&elem) {
            return s;
        }
        let s = self.new_type(GtypeKind::Slice(elem));
        self.slice_cache.insert(elem, s);
        s
    }

    /// Struct field by name, looking through one pointer.
    pub fn field(&self, id: GtypeId, name: Symbol) -> Option<(GtypeId, Option<u32>)> {
        let mut u = self.underlying(id);
        if let GtypeKind::Pointer(elem) = &self.gtypes[u].kind {
            u = self.underlying(*elem);
        }
        match &self.gtypes[u].kind {
            GtypeKind::Struct(fields) => fields
                .iter()
                .find(|f| f.name == name)
                .map(|f| (f.ty, f.offset)),
            _ => None,
        }
    }

    /// Methods of an interface type.
    pub fn interface_methods(&self, id: GtypeId) -> Option<&[MethodSig]> {
        match self.kind(id) {
            GtypeKind::Interface(methods) => Some(methods),
            _ => None,
        }
    }

    /// Type identity. Named types are identical only to themselves;
    /// unnamed composite types compare structurally.
    pub fn identical(&self, a: GtypeId, b: GtypeId) -> bool {
        let a = self.canon(a);
        let b = self.canon(b);
        if a == b {
            return true;
        }
        match (&self.gtypes[a].kind, &self.gtypes[b].kind) {
            (GtypeKind::Int, GtypeKind::Int)
            | (GtypeKind::Byte, GtypeKind::Byte)
            | (GtypeKind::Bool, GtypeKind::Bool)
            | (GtypeKind::String, GtypeKind::String) => true,
            (GtypeKind::Pointer(x), GtypeKind::Pointer(y))
            | (GtypeKind::Slice(x), GtypeKind::Slice(y)) => self.identical(*x, *y),
            (
                GtypeKind::Array { elem: x, len: lx },
                GtypeKind::Array { elem: y, len: ly },
            ) => lx == ly && self.identical(*x, *y),
            (
                GtypeKind::Map { key: k1, value: v1 },
                GtypeKind::Map { key: k2, value: v2 },
            ) => self.identical(*k1, *k2) && self.identical(*v1, *v2),
            (GtypeKind::Struct(f1), GtypeKind::Struct(f2)) => {
                f1.len() == f2.len()
                    && f1
                        .iter()
                        .zip(f2)
                        .all(|(x, y)| x.name == y.name && self.identical(x.ty, y.ty))
            }
            (GtypeKind::Interface(m1), GtypeKind::Interface(m2)) => {
                m1.len() == m2.len() && m1.iter().zip(m2).all(|(x, y)| x.name == y.name)
            }
            _ => false,
        }
    }

    /// True if a value of type `from` can be stored where `to` is expected
    /// without a conversion.
    pub fn assignable(&self, from: GtypeId, to: GtypeId) -> bool {
        if self.identical(from, to) {
            return true;
        }
        if self.is_interface(to) {
            return self.implements(from, to);
        }
        // An unnamed value may be stored into a named type with the same
        // underlying type, and the other way round.
        let from_named = self.gtypes[self.canon(from)].is_named();
        let to_named = self.gtypes[self.canon(to)].is_named();
        if !(from_named && to_named) {
            return self.identical(self.underlying(from), self.underlying(to));
        }
        false
    }

    /// True if every method of the interface `iface` is in the method set
    /// of `ty`.
    pub fn implements(&self, ty: GtypeId, iface: GtypeId) -> bool {
        self.missing_method(ty, iface).is_none()
    }

    /// The first interface method `ty` lacks.
    pub fn missing_method(&self, ty: GtypeId, iface: GtypeId) -> Option<Symbol> {
        let wanted = self.interface_methods(iface)?;
        if let Some(have) = self.interface_methods(ty) {
            return wanted
                .iter()
                .find(|m| !have.iter().any(|h| h.name == m.name))
                .map(|m| m.name);
        }
        let receiver = self.named_receiver(ty);
        wanted
            .iter()
            .find(|m| match receiver {
                Some((named, is_ptr)) => match self.methods.lookup(named, m.name) {
                    Some(entry) => is_ptr || !entry.pointer_receiver,
                    None => false,
                },
                None => true,
            })
            .map(|m| m.name)
    }

    /// Canonical spelling of a type, used for runtime type ids and
    /// descriptors: `int`, `*main.T`, `[]string`, `map[string]int`.
    /// Types declared in a function body carry their ordinal: `main.T.2`.
    pub fn type_name(&self, id: GtypeId, interner: &SymbolInterner) -> String {
        let id = self.canon(id);
        match &self.gtypes[id].kind {
            GtypeKind::Int => "int".to_owned(),
            GtypeKind::Byte => "byte".to_owned(),
            GtypeKind::Bool => "bool".to_owned(),
            GtypeKind::String => "string".to_owned(),
            GtypeKind::Pointer(e) => format!("*{}", self.type_name(*e, interner)),
            GtypeKind::Array { elem, len } => match len {
                Some(n) => format!("[{}]{}", n, self.type_name(*elem, interner)),
                None => format!("[?]{}", self.type_name(*elem, interner)),
            },
            GtypeKind::Slice(e) => format!("[]{}", self.type_name(*e, interner)),
            GtypeKind::Map { key, value } => format!(
                "map[{}]{}",
                self.type_name(*key, interner),
                self.type_name(*value, interner)
            ),
            GtypeKind::Struct(fields) => {
                let fields: Vec<_> = fields
                    .iter()
                    .map(|f| format!("{} {}", interner.name(f.name), self.type_name(f.ty, interner)))
                    .collect();
                format!("struct{{{}}}", fields.join("; "))
            }
            GtypeKind::Interface(methods) => {
                let names: Vec<_> = methods.iter().map(|m| interner.name(m.name)).collect();
                format!("interface{{{}}}", names.join("; "))
            }
            GtypeKind::Named {
                name, pkg, local, ..
            } => match local {
                _ if *pkg == self.universe_pkg => interner.name(*name).to_owned(),
                Some(n) => format!("{}.{}.{}", interner.name(*pkg), interner.name(*name), n),
                None => format!("{}.{}", interner.name(*pkg), interner.name(*name)),
            },
            GtypeKind::Alias(rel) => interner.name(rel.name().symbol).to_owned(),
        }
    }

    // ==================== Symbols ====================

    /// Assembler symbol of a function: `pkg.name`, `pkg.Type$Method`, or the
    /// bare name for C library functions.
    pub fn func_symbol(&self, id: FuncId, interner: &SymbolInterner) -> String {
        let f = &self.funcs[id];
        match f.kind {
            FuncKind::Extern => interner.name(f.name).to_owned(),
            FuncKind::Method { recv, .. } => {
                let type_name = match &self.gtypes[recv].kind {
                    GtypeKind::Named { name, .. } => interner.name(*name),
                    _ => "?",
                };
                format!(
                    "{}.{}${}",
                    interner.name(f.pkg),
                    type_name,
                    interner.name(f.name)
                )
            }
            _ => format!("{}.{}", interner.name(f.pkg), interner.name(f.name)),
        }
    }

    /// Assembler symbol of a global variable: `pkg.name`.
    pub fn global_symbol(&self, id: VarId, interner: &SymbolInterner) -> String {
        let v = &self.vars[id];
        format!("{}.{}", interner.name(v.pkg), interner.name(v.name))
    }

    /// Result types of a function, method or interface method call; empty
    /// for builtins, whose result depends on the arguments.
    pub fn func_results(&self, id: FuncId) -> &[GtypeId] {
        &self.funcs[id].results
    }
}
