use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use crate::error::{fatal, InvariantViolation};
use crate::syntax::visitor;
use crate::syntax::*;

pub type Integer = i64;
pub type Natural = u64;
pub type Double = NaiveDouble;

/// Double with bitwise equality
#[derive(Debug, Copy, Clone)]
pub struct NaiveDouble(f64);

/// Constants for a pure type system
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Const {
    Type,
    Kind,
    Sort,
}

/// Bound variable
///
/// The `Label` field is the variable's name (i.e. \"`x`\").
/// The `usize` field counts the enclosing binders of the *same name* that sit between the
/// occurrence and the binder it refers to, so `λ(x : A) -> λ(y : B) -> λ(x : C) -> x@1` refers
/// to the outermost `x`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct V(pub Label, pub usize);

// Definition order must match precedence order for
// pretty-printing to work correctly
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BinOp {
    /// `x === y`
    Equivalence,
    /// `x ? y`
    ImportAlt,
    /// `x || y`
    BoolOr,
    /// `x + y`
    NaturalPlus,
    /// `x ++ y`
    TextAppend,
    /// `x # y`
    ListAppend,
    /// `x && y`
    BoolAnd,
    /// `x ∧ y`
    RecursiveRecordMerge,
    /// `x ⫽ y`
    RightBiasedRecordMerge,
    /// `x ⩓ y`
    RecursiveRecordTypeMerge,
    /// `x * y`
    NaturalTimes,
    /// `x == y`
    BoolEQ,
    /// `x != y`
    BoolNE,
}

/// Built-ins
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Builtin {
    Bool,
    Natural,
    Integer,
    Double,
    Text,
    List,
    Optional,
    OptionalNone,
    NaturalBuild,
    NaturalFold,
    NaturalIsZero,
    NaturalEven,
    NaturalOdd,
    NaturalToInteger,
    NaturalShow,
    NaturalSubtract,
    IntegerToDouble,
    IntegerShow,
    IntegerNegate,
    IntegerClamp,
    DoubleShow,
    ListBuild,
    ListFold,
    ListLength,
    ListHead,
    ListLast,
    ListIndexed,
    ListReverse,
    OptionalFold,
    OptionalBuild,
    TextShow,
}

/// One binding of a `let` expression.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Binding<SubExpr> {
    pub variable: Label,
    pub annot: Option<SubExpr>,
    pub value: SubExpr,
}

/// An expression. Cloning is cheap and shares the whole tree; nodes are never mutated after
/// construction, so rewriting passes build new nodes and reuse untouched subtrees.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Expr(Arc<ExprKind<Expr>>);

/// Syntax tree for expressions
// Having the recursion out of the enum definition enables writing
// much more generic code and improves pattern-matching behind
// smart pointers.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ExprKind<SubExpr> {
    Const(Const),
    ///  `x`
    ///  `x@n`
    Var(V),
    ///  `λ(x : A) -> b`
    Lam(Label, SubExpr, SubExpr),
    ///  `A -> B`
    ///  `∀(x : A) -> B`
    Pi(Label, SubExpr, SubExpr),
    ///  `f a`
    App(SubExpr, SubExpr),
    ///  `let x = r let y : t = s in e`
    ///
    /// Never empty.
    Let(Vec<Binding<SubExpr>>, SubExpr),
    ///  `x : t`
    Annot(SubExpr, SubExpr),
    ///  `assert : t`
    Assert(SubExpr),
    /// Built-in values
    Builtin(Builtin),
    // Binary operations
    BinOp(BinOp, SubExpr, SubExpr),
    ///  `True`
    BoolLit(bool),
    ///  `if x then y else z`
    BoolIf(SubExpr, SubExpr, SubExpr),
    ///  `1`
    NaturalLit(Natural),
    ///  `+2`
    IntegerLit(Integer),
    ///  `3.24`
    DoubleLit(Double),
    ///  `"Some ${interpolated} text"`
    TextLit(InterpolatedText<SubExpr>),
    ///  `[] : List t`
    EmptyListLit(SubExpr),
    ///  `[x, y, z]`
    ///
    /// Never empty.
    NEListLit(Vec<SubExpr>),
    ///  `Some e`
    SomeLit(SubExpr),
    ///  `{ k1 : t1, k2 : t1 }`
    RecordType(BTreeMap<Label, SubExpr>),
    ///  `{ k1 = v1, k2 = v2 }`
    RecordLit(BTreeMap<Label, SubExpr>),
    ///  `< k1 : t1, k2 >`
    UnionType(BTreeMap<Label, Option<SubExpr>>),
    ///  `merge x y : t`
    Merge(SubExpr, SubExpr, Option<SubExpr>),
    ///  `toMap x : t`
    ToMap(SubExpr, Option<SubExpr>),
    ///  `e.x`
    Field(SubExpr, Label),
    ///  `e.{ x, y, z }`
    Projection(SubExpr, BTreeSet<Label>),
    ///  `e.(t)`
    ProjectionByExpr(SubExpr, SubExpr),
    /// An import that hasn't been resolved yet
    Embed(Import),
}

impl<SE> ExprKind<SE> {
    pub fn traverse_ref_with_binders<'a, SE2, Err>(
        &'a self,
        visit: impl FnMut(&[&'a Label], &'a SE) -> Result<SE2, Err>,
    ) -> Result<ExprKind<SE2>, Err> {
        visitor::visit_ref(self, visit)
    }

    pub fn traverse_ref<'a, SE2, Err>(
        &'a self,
        mut visit_subexpr: impl FnMut(&'a SE) -> Result<SE2, Err>,
    ) -> Result<ExprKind<SE2>, Err> {
        self.traverse_ref_with_binders(|_, e| visit_subexpr(e))
    }

    pub fn map_ref_with_binders<'a, SE2>(
        &'a self,
        mut map: impl FnMut(&[&'a Label], &'a SE) -> SE2,
    ) -> ExprKind<SE2> {
        trivial_result(self.traverse_ref_with_binders(|l, x| Ok(map(l, x))))
    }

    pub fn map_ref<'a, SE2>(
        &'a self,
        mut map_subexpr: impl FnMut(&'a SE) -> SE2,
    ) -> ExprKind<SE2> {
        self.map_ref_with_binders(|_, e| map_subexpr(e))
    }
}

impl Expr {
    pub fn new(kind: ExprKind<Expr>) -> Self {
        Expr(Arc::new(kind))
    }

    pub fn kind(&self) -> &ExprKind<Expr> {
        &self.0
    }

    /// Rebuild this node from its shallowly-mapped children.
    pub fn map_ref(&self, map_subexpr: impl FnMut(&Expr) -> Expr) -> Expr {
        Expr::new(self.kind().map_ref(map_subexpr))
    }

    pub fn map_ref_with_binders(
        &self,
        map: impl FnMut(&[&Label], &Expr) -> Expr,
    ) -> Expr {
        Expr::new(self.kind().map_ref_with_binders(map))
    }
}

impl From<ExprKind<Expr>> for Expr {
    fn from(kind: ExprKind<Expr>) -> Self {
        Expr::new(kind)
    }
}

impl std::fmt::Debug for Expr {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        self.kind().fmt(f)
    }
}

pub fn trivial_result<T>(x: Result<T, std::convert::Infallible>) -> T {
    match x {
        Ok(x) => x,
        Err(e) => match e {},
    }
}

impl PartialEq for NaiveDouble {
    fn eq(&self, other: &Self) -> bool {
        self.0.to_bits() == other.0.to_bits()
    }
}

impl Eq for NaiveDouble {}

impl std::hash::Hash for NaiveDouble {
    fn hash<H>(&self, state: &mut H)
    where
        H: std::hash::Hasher,
    {
        self.0.to_bits().hash(state)
    }
}

impl From<f64> for NaiveDouble {
    fn from(x: f64) -> Self {
        NaiveDouble(x)
    }
}

impl From<NaiveDouble> for f64 {
    fn from(x: NaiveDouble) -> f64 {
        x.0
    }
}

impl From<Label> for V {
    fn from(x: Label) -> V {
        V(x, 0)
    }
}

impl From<&str> for V {
    fn from(x: &str) -> V {
        V(x.into(), 0)
    }
}

impl Builtin {
    pub fn parse(s: &str) -> Option<Self> {
        use Builtin::*;
        match s {
            "Bool" => Some(Bool),
            "Natural" => Some(Natural),
            "Integer" => Some(Integer),
            "Double" => Some(Double),
            "Text" => Some(Text),
            "List" => Some(List),
            "Optional" => Some(Optional),
            "None" => Some(OptionalNone),
            "Natural/build" => Some(NaturalBuild),
            "Natural/fold" => Some(NaturalFold),
            "Natural/isZero" => Some(NaturalIsZero),
            "Natural/even" => Some(NaturalEven),
            "Natural/odd" => Some(NaturalOdd),
            "Natural/toInteger" => Some(NaturalToInteger),
            "Natural/show" => Some(NaturalShow),
            "Natural/subtract" => Some(NaturalSubtract),
            "Integer/toDouble" => Some(IntegerToDouble),
            "Integer/show" => Some(IntegerShow),
            "Integer/negate" => Some(IntegerNegate),
            "Integer/clamp" => Some(IntegerClamp),
            "Double/show" => Some(DoubleShow),
            "List/build" => Some(ListBuild),
            "List/fold" => Some(ListFold),
            "List/length" => Some(ListLength),
            "List/head" => Some(ListHead),
            "List/last" => Some(ListLast),
            "List/indexed" => Some(ListIndexed),
            "List/reverse" => Some(ListReverse),
            "Optional/fold" => Some(OptionalFold),
            "Optional/build" => Some(OptionalBuild),
            "Text/show" => Some(TextShow),
            _ => None,
        }
    }
}

// Tree builders. These are what the parser and any code generating expressions use to
// assemble trees.

pub fn rc(kind: ExprKind<Expr>) -> Expr {
    Expr::new(kind)
}

/// `f a0 a1 ... an`, left-nested.
pub fn app(f: Expr, args: impl IntoIterator<Item = Expr>) -> Expr {
    args.into_iter()
        .fold(f, |f, a| rc(ExprKind::App(f, a)))
}

/// `x`
pub fn var(name: &str) -> Expr {
    var_at(name, 0)
}

/// `x@n`
pub fn var_at(name: &str, n: usize) -> Expr {
    rc(ExprKind::Var(V(name.into(), n)))
}

/// `λ(x : t) -> body`
pub fn lam(x: &str, t: Expr, body: Expr) -> Expr {
    rc(ExprKind::Lam(x.into(), t, body))
}

/// `∀(x : t) -> body`
pub fn pi(x: &str, t: Expr, body: Expr) -> Expr {
    rc(ExprKind::Pi(x.into(), t, body))
}

/// `A0 -> A1 -> ... -> output`
pub fn fn_type(inputs: impl IntoIterator<Item = Expr>, output: Expr) -> Expr {
    let inputs: Vec<_> = inputs.into_iter().collect();
    inputs
        .into_iter()
        .rev()
        .fold(output, |out, i| rc(ExprKind::Pi("_".into(), i, out)))
}

pub fn binding(x: &str, annot: Option<Expr>, value: Expr) -> Binding<Expr> {
    Binding {
        variable: x.into(),
        annot,
        value,
    }
}

/// `let x0 = v0 ... let xn = vn in body`. Panics if `bindings` is empty.
pub fn make_let(bindings: Vec<Binding<Expr>>, body: Expr) -> Expr {
    if bindings.is_empty() {
        fatal(InvariantViolation::EmptyLet)
    }
    rc(ExprKind::Let(bindings, body))
}

/// `[x0, ..., xn]`. Panics if `elts` is empty; use `ExprKind::EmptyListLit` for that case.
pub fn make_list(elts: Vec<Expr>) -> Expr {
    if elts.is_empty() {
        fatal(InvariantViolation::EmptyList)
    }
    rc(ExprKind::NEListLit(elts))
}

pub fn builtin(b: Builtin) -> Expr {
    rc(ExprKind::Builtin(b))
}

pub fn natural_lit(n: Natural) -> Expr {
    rc(ExprKind::NaturalLit(n))
}

pub fn integer_lit(n: Integer) -> Expr {
    rc(ExprKind::IntegerLit(n))
}

pub fn double_lit(n: f64) -> Expr {
    rc(ExprKind::DoubleLit(n.into()))
}

pub fn bool_lit(b: bool) -> Expr {
    rc(ExprKind::BoolLit(b))
}

pub fn text_lit(s: &str) -> Expr {
    rc(ExprKind::TextLit(s.into()))
}

pub fn binop(o: BinOp, x: Expr, y: Expr) -> Expr {
    rc(ExprKind::BinOp(o, x, y))
}

pub fn record_lit<'a>(kvs: impl IntoIterator<Item = (&'a str, Expr)>) -> Expr {
    rc(ExprKind::RecordLit(
        kvs.into_iter().map(|(k, v)| (k.into(), v)).collect(),
    ))
}

pub fn record_type<'a>(kts: impl IntoIterator<Item = (&'a str, Expr)>) -> Expr {
    rc(ExprKind::RecordType(
        kts.into_iter().map(|(k, t)| (k.into(), t)).collect(),
    ))
}

pub fn union_type<'a>(
    kts: impl IntoIterator<Item = (&'a str, Option<Expr>)>,
) -> Expr {
    rc(ExprKind::UnionType(
        kts.into_iter().map(|(k, t)| (k.into(), t)).collect(),
    ))
}

pub fn field(e: Expr, l: &str) -> Expr {
    rc(ExprKind::Field(e, l.into()))
}
