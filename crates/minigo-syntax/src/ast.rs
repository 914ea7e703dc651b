//! Abstract syntax tree.
//!
//! The tree is produced by the parser and then completed in place by the
//! analysis phases: names are held as [`Relation`]s that start unresolved,
//! and a few `Option` slots (entity ids, expression types, method call
//! targets) are filled once the information exists.

use minigo_common::{AsmLabel, ConstId, Entity, FuncId, GtypeId, Ident, Span, Symbol, VarId};

/// A source file.
#[derive(Debug, Clone)]
pub struct File {
    pub package: Ident,
    pub imports: Vec<ImportSpec>,
    pub decls: Vec<Decl>,
    pub span: Span,
}

/// `import "path/to/pkg"`. The package is referred to by the last path segment.
#[derive(Debug, Clone)]
pub struct ImportSpec {
    pub path: String,
    pub name: Symbol,
    pub span: Span,
}

// ==================== Names ====================

/// A reference to a named entity.
///
/// Created unresolved by the parser, with an optional package qualifier
/// for `pkg.Name`, and resolved by the analysis passes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Relation {
    Unresolved { name: Ident, pkg: Option<Ident> },
    Resolved { name: Ident, entity: Entity },
}

impl Relation {
    pub fn new(name: Ident, pkg: Option<Ident>) -> Self {
        Relation::Unresolved { name, pkg }
    }

    pub fn name(&self) -> Ident {
        match self {
            Relation::Unresolved { name, .. } | Relation::Resolved { name, .. } => *name,
        }
    }

    pub fn pkg(&self) -> Option<Ident> {
        match self {
            Relation::Unresolved { pkg, .. } => *pkg,
            Relation::Resolved { .. } => None,
        }
    }

    pub fn entity(&self) -> Option<Entity> {
        match self {
            Relation::Resolved { entity, .. } => Some(*entity),
            Relation::Unresolved { .. } => None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Relation::Resolved { .. })
    }

    pub fn resolve(&mut self, entity: Entity) {
        *self = Relation::Resolved {
            name: self.name(),
            entity,
        };
    }
}

// ==================== Declarations ====================

#[derive(Debug, Clone)]
pub enum Decl {
    Var(VarDecl),
    Const(ConstDecl),
    Type(TypeDecl),
    Func(FuncDecl),
}

impl Decl {
    pub fn span(&self) -> Span {
        match self {
            Decl::Var(d) => d.span,
            Decl::Const(d) => d.span,
            Decl::Type(d) => d.span,
            Decl::Func(d) => d.span,
        }
    }
}

/// `var x T = e` or a parenthesized group of specs.
#[derive(Debug, Clone)]
pub struct VarDecl {
    pub specs: Vec<VarSpec>,
    pub span: Span,
}

/// `var a, b T = x, y`
#[derive(Debug, Clone)]
pub struct VarSpec {
    pub names: Vec<Ident>,
    pub ty: Option<TypeExpr>,
    pub values: Vec<Expr>,
    /// One slot per name; `None` for `_`. Filled by resolution.
    pub vars: Vec<Option<VarId>>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct ConstDecl {
    pub specs: Vec<ConstSpec>,
    pub span: Span,
}

/// One constant. An omitted value repeats the previous spec's expression.
#[derive(Debug, Clone)]
pub struct ConstSpec {
    pub name: Ident,
    pub ty: Option<TypeExpr>,
    pub value: Expr,
    /// Index within the enclosing `const` group.
    pub iota: i64,
    pub id: Option<ConstId>,
    pub span: Span,
}

/// `type T underlying`
#[derive(Debug, Clone)]
pub struct TypeDecl {
    pub name: Ident,
    pub ty: TypeExpr,
    pub id: Option<GtypeId>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct FuncDecl {
    pub receiver: Option<Param>,
    pub name: Ident,
    pub sig: FuncSig,
    /// `None` for declarations without a body (implemented elsewhere).
    pub body: Option<Block>,
    /// Every function gets one, whether or not it uses `defer`.
    pub defer_label: AsmLabel,
    /// Number of `defer` statements in the body.
    pub defer_count: u32,
    pub func: Option<FuncId>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct FuncSig {
    pub params: Vec<Param>,
    pub results: Vec<TypeExpr>,
}

/// A parameter or receiver. A variadic `xs ...T` has type `[]T`.
#[derive(Debug, Clone)]
pub struct Param {
    pub name: Ident,
    pub ty: TypeExpr,
    pub variadic: bool,
    pub var: Option<VarId>,
    pub span: Span,
}

// ==================== Types ====================

#[derive(Debug, Clone)]
pub struct TypeExpr {
    pub kind: TypeExprKind,
    pub span: Span,
    /// The type this expression denotes. Filled by resolution.
    pub gtype: Option<GtypeId>,
}

impl TypeExpr {
    pub fn new(kind: TypeExprKind, span: Span) -> Self {
        Self {
            kind,
            span,
            gtype: None,
        }
    }
}

#[derive(Debug, Clone)]
pub enum TypeExprKind {
    /// `T` or `pkg.T`
    Name(Relation),
    Pointer(Box<TypeExpr>),
    /// `[N]T`; `N` is a constant expression.
    Array { len: Box<Expr>, elem: Box<TypeExpr> },
    Slice(Box<TypeExpr>),
    Map { key: Box<TypeExpr>, value: Box<TypeExpr> },
    Struct(Vec<FieldDecl>),
    Interface(Vec<MethodSpec>),
}

#[derive(Debug, Clone)]
pub struct FieldDecl {
    pub name: Ident,
    pub ty: TypeExpr,
}

/// A method signature inside an interface type.
#[derive(Debug, Clone)]
pub struct MethodSpec {
    pub name: Ident,
    pub sig: FuncSig,
}

// ==================== Statements ====================

/// Identifies a breakable construct (loop or switch) within a file.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct LoopId(pub u32);

#[derive(Debug, Clone)]
pub struct Block {
    pub stmts: Vec<Stmt>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct Stmt {
    pub kind: StmtKind,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub enum StmtKind {
    Empty,
    Var(VarSpec),
    Const(ConstDecl),
    Type(TypeDecl),
    Expr(Expr),
    /// `a, b = x, y`. Operator assignments are desugared to this form,
    /// keeping the operator.
    Assign(AssignStmt),
    /// `a, b := x, y`
    ShortVarDecl(AssignStmt),
    IncDec(IncDecStmt),
    Block(Block),
    If(IfStmt),
    For(ForStmt),
    Switch(SwitchStmt),
    TypeSwitch(TypeSwitchStmt),
    Return(ReturnStmt),
    Break(LoopId),
    Continue(LoopId),
    Defer(DeferStmt),
}

#[derive(Debug, Clone)]
pub struct AssignStmt {
    pub lefts: Vec<Expr>,
    pub rights: Vec<Expr>,
    /// Operator of `x op= y`, whose right side then holds `x op y`.
    pub op: Option<BinaryOp>,
}

#[derive(Debug, Clone)]
pub struct IncDecStmt {
    pub operand: Expr,
    pub inc: bool,
}

#[derive(Debug, Clone)]
pub struct IfStmt {
    pub init: Option<Box<Stmt>>,
    pub cond: Expr,
    pub then: Block,
    /// Either another `If` or a `Block`.
    pub els: Option<Box<Stmt>>,
}

#[derive(Debug, Clone)]
pub struct ForStmt {
    pub id: LoopId,
    pub clause: ForClause,
    pub body: Block,
}

#[derive(Debug, Clone)]
pub enum ForClause {
    /// `for {}`, `for cond {}` and `for init; cond; post {}`
    Cond {
        init: Option<Box<Stmt>>,
        cond: Option<Expr>,
        post: Option<Box<Stmt>>,
    },
    Range(RangeClause),
}

/// `for k, v := range x` or `for k, v = range x`
#[derive(Debug, Clone)]
pub struct RangeClause {
    pub key: Option<Expr>,
    pub value: Option<Expr>,
    pub define: bool,
    pub expr: Expr,
}

#[derive(Debug, Clone)]
pub struct SwitchStmt {
    pub id: LoopId,
    /// `None` for a tagless switch.
    pub tag: Option<Expr>,
    pub cases: Vec<CaseClause>,
}

#[derive(Debug, Clone)]
pub struct CaseClause {
    /// Empty for `default`.
    pub values: Vec<Expr>,
    pub is_default: bool,
    pub body: Vec<Stmt>,
    pub span: Span,
}

/// `switch v := x.(type) { ... }`
#[derive(Debug, Clone)]
pub struct TypeSwitchStmt {
    pub id: LoopId,
    pub binding: Option<Ident>,
    pub subject: Expr,
    pub cases: Vec<TypeCaseClause>,
}

#[derive(Debug, Clone)]
pub struct TypeCaseClause {
    /// `None` entries stand for `nil`. Empty for `default`.
    pub types: Vec<Option<TypeExpr>>,
    pub is_default: bool,
    pub body: Vec<Stmt>,
    /// The clause-local binding, when the switch binds one.
    pub var: Option<VarId>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct ReturnStmt {
    pub results: Vec<Expr>,
}

/// `defer f(args)`. `index` numbers defers within the function.
#[derive(Debug, Clone)]
pub struct DeferStmt {
    pub call: Expr,
    pub index: u32,
}

// ==================== Expressions ====================

#[derive(Debug, Clone)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
    /// Static type. Filled by inference; stays `None` for `nil`, for blank
    /// identifiers, and for calls without results.
    pub ty: Option<GtypeId>,
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Self {
            kind,
            span,
            ty: None,
        }
    }

    /// The relation of a plain identifier expression.
    pub fn as_relation(&self) -> Option<&Relation> {
        match &self.kind {
            ExprKind::Ident(rel) => Some(rel),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub enum ExprKind {
    IntLit(i64),
    CharLit(u8),
    StringLit(StringLit),
    Ident(Relation),
    Unary(UnaryOp, Box<Expr>),
    Binary(Box<BinaryExpr>),
    /// `f(args)`; also `T(x)` when `f` resolves to a type.
    Call(Box<CallExpr>),
    MethodCall(Box<MethodCallExpr>),
    /// `x.field`
    Selector(Box<Expr>, Ident),
    Index(Box<Expr>, Box<Expr>),
    Slice(Box<SliceExpr>),
    TypeAssert(Box<Expr>, Box<TypeExpr>),
    CompositeLit(Box<CompositeLit>),
    Make(Box<MakeExpr>),
    /// Conversion written with a non-identifier type, e.g. `[]byte(s)`.
    Conversion(Box<TypeExpr>, Box<Expr>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StringLit {
    /// Text as emitted into the data section, escapes kept.
    pub text: String,
    /// Length in bytes at run time.
    pub len: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Not,
    Addr,
    Deref,
}

impl UnaryOp {
    pub fn as_str(self) -> &'static str {
        match self {
            UnaryOp::Neg => "-",
            UnaryOp::Not => "!",
            UnaryOp::Addr => "&",
            UnaryOp::Deref => "*",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    OrOr,
    AndAnd,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Add,
    Sub,
    Div,
    Rem,
    Mul,
}

impl BinaryOp {
    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinaryOp::Eq | BinaryOp::Ne | BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge
        )
    }

    pub fn is_logical(self) -> bool {
        matches!(self, BinaryOp::OrOr | BinaryOp::AndAnd)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BinaryOp::OrOr => "||",
            BinaryOp::AndAnd => "&&",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
            BinaryOp::Mul => "*",
        }
    }
}

#[derive(Debug, Clone)]
pub struct BinaryExpr {
    pub op: BinaryOp,
    pub left: Expr,
    pub right: Expr,
}

#[derive(Debug, Clone)]
pub struct CallExpr {
    pub func: Expr,
    pub args: Vec<Expr>,
    /// Last argument written as `s...`.
    pub spread: bool,
}

/// How a method call is dispatched. Filled by inference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodTarget {
    /// Direct call to a known method.
    Static { func: FuncId, pointer_receiver: bool },
    /// Lookup through the receiver's method table at run time.
    Interface,
}

#[derive(Debug, Clone)]
pub struct MethodCallExpr {
    pub receiver: Expr,
    pub method: Ident,
    pub args: Vec<Expr>,
    pub spread: bool,
    pub target: Option<MethodTarget>,
}

/// `x[low:high:max]`
#[derive(Debug, Clone)]
pub struct SliceExpr {
    pub expr: Expr,
    pub low: Option<Expr>,
    pub high: Option<Expr>,
    pub max: Option<Expr>,
}

#[derive(Debug, Clone)]
pub struct CompositeLit {
    pub ty: TypeExpr,
    pub elems: CompositeElems,
}

#[derive(Debug, Clone)]
pub enum CompositeElems {
    /// `T{f: v}`
    Fields(Vec<FieldInit>),
    /// `[]T{a, b}` and `[N]T{a, b}`
    Positional(Vec<Expr>),
    /// `map[K]V{k: v}`
    Map(Vec<(Expr, Expr)>),
}

#[derive(Debug, Clone)]
pub struct FieldInit {
    pub name: Ident,
    pub value: Expr,
}

/// `make(T, args...)`
#[derive(Debug, Clone)]
pub struct MakeExpr {
    pub ty: TypeExpr,
    pub args: Vec<Expr>,
}
