use std::collections::{BTreeMap, BTreeSet};
use std::iter::once;

use crate::error::{fatal, InvariantViolation};
use crate::semantics::{alpha_equivalent, apply_builtin, Subst};
use crate::syntax::{
    rc, text_lit, BinOp, Binding, Expr, ExprKind, InterpolatedText,
    InterpolatedTextContents, Label, V,
};

/// Reduce an expression to its normal form.
///
/// The input must not contain imports, and should be well-typed: ill-typed input may be left
/// stuck, or abort on a broken invariant.
pub fn normalize(e: &Expr) -> Expr {
    use ExprKind::*;
    match e.kind() {
        Const(_) | Var(_) | Builtin(_) | BoolLit(_) | NaturalLit(_)
        | IntegerLit(_) | DoubleLit(_) => e.clone(),
        App(f, a) => normalize_app(&normalize(f), &normalize(a)),
        Let(bindings, body) => normalize_let(bindings, body),
        Annot(x, _) => normalize(x),
        Assert(t) => rc(Assert(normalize(t))),
        TextLit(t) => normalize_text(t.iter().map(|c| match c {
            InterpolatedTextContents::Text(s) => {
                InterpolatedTextContents::Text(s)
            }
            InterpolatedTextContents::Expr(e) => {
                InterpolatedTextContents::Expr(normalize(e))
            }
        })),
        BoolIf(b, t, f) => {
            normalize_if(&normalize(b), &normalize(t), &normalize(f))
        }
        BinOp(o, x, y) => normalize_binop(*o, &normalize(x), &normalize(y)),
        Field(r, l) => normalize_field(&normalize(r), l),
        Projection(r, ls) => normalize_projection(&normalize(r), ls),
        ProjectionByExpr(r, t) => {
            normalize_projection_by_expr(&normalize(r), &normalize(t))
        }
        ToMap(r, t) => normalize_to_map(&normalize(r), t.as_ref().map(normalize)),
        Merge(h, u, t) => normalize_merge(
            &normalize(h),
            &normalize(u),
            t.as_ref().map(normalize),
        ),
        Embed(i) => fatal(InvariantViolation::UnresolvedImport(i.clone())),
        Lam(..) | Pi(..) | EmptyListLit(_) | NEListLit(_) | SomeLit(_)
        | RecordType(_) | RecordLit(_) | UnionType(_) => e.map_ref(normalize),
    }
}

impl Expr {
    pub fn normalize(&self) -> Expr {
        normalize(self)
    }
}

fn normalize_app(f: &Expr, a: &Expr) -> Expr {
    if let ExprKind::Lam(x, _, body) = f.kind() {
        return normalize(&body.subst_shift(&V(x.clone(), 0), a));
    }

    // Collect the application spine
    let mut args = vec![a.clone()];
    let mut head = f;
    while let ExprKind::App(g, b) = head.kind() {
        args.push(b.clone());
        head = g;
    }
    args.reverse();

    if let ExprKind::Builtin(b) = head.kind() {
        if let Some(e) = apply_builtin(*b, &args) {
            return e;
        }
    }
    rc(ExprKind::App(f.clone(), a.clone()))
}

// Bindings are eliminated one at a time, outermost first.
fn normalize_let(bindings: &[Binding<Expr>], body: &Expr) -> Expr {
    let (first, rest) = match bindings.split_first() {
        Some(split) => split,
        None => fatal(InvariantViolation::EmptyLet),
    };
    let value = normalize(&first.value);
    let rest = if rest.is_empty() {
        body.clone()
    } else {
        rc(ExprKind::Let(rest.to_vec(), body.clone()))
    };
    normalize(&rest.subst_shift(&V(first.variable.clone(), 0), &value))
}

// The interpolated expressions must already be normalized.
fn normalize_text(
    contents: impl IntoIterator<Item = InterpolatedTextContents<Expr>>,
) -> Expr {
    use InterpolatedTextContents::Text;
    let text: InterpolatedText<Expr> = contents
        .into_iter()
        .flat_map(|c| match c {
            InterpolatedTextContents::Expr(e) => match e.kind() {
                // Splice nested literals
                ExprKind::TextLit(t) => t
                    .iter()
                    .map(|c| match c {
                        Text(s) => Text(s),
                        InterpolatedTextContents::Expr(e) => {
                            InterpolatedTextContents::Expr(e.clone())
                        }
                    })
                    .collect::<Vec<_>>(),
                _ => vec![InterpolatedTextContents::Expr(e.clone())],
            },
            Text(s) => vec![Text(s)],
        })
        .collect();

    // "${e}" is just e
    if text.head().is_empty() {
        if let [(e, s)] = text.tail() {
            if s.is_empty() {
                return e.clone();
            }
        }
    }
    rc(ExprKind::TextLit(text))
}

fn normalize_if(b: &Expr, t: &Expr, f: &Expr) -> Expr {
    use ExprKind::BoolLit;
    match b.kind() {
        BoolLit(true) => t.clone(),
        BoolLit(false) => f.clone(),
        _ => match (t.kind(), f.kind()) {
            // Simplify `if b then True else False`
            (BoolLit(true), BoolLit(false)) => b.clone(),
            _ if alpha_equivalent(t, f) => t.clone(),
            _ => rc(ExprKind::BoolIf(b.clone(), t.clone(), f.clone())),
        },
    }
}

// Terms that are stuck on a free variable. Their value could be anything of the right type.
fn is_neutral(e: &Expr) -> bool {
    use ExprKind::*;
    match e.kind() {
        Var(_) | App(..) | BoolIf(..) | BinOp(..) | Field(..)
        | Projection(..) | ProjectionByExpr(..) | Merge(..) => true,
        _ => false,
    }
}

fn merge_maps<K, T, F>(
    map1: &BTreeMap<K, T>,
    map2: &BTreeMap<K, T>,
    mut f: F,
) -> BTreeMap<K, T>
where
    K: Ord + Clone,
    T: Clone,
    F: FnMut(&K, &T, &T) -> T,
{
    let mut kvs = map1.clone();
    for (x, v2) in map2 {
        let v = match map1.get(x) {
            Some(v1) => f(x, v1, v2),
            None => v2.clone(),
        };
        kvs.insert(x.clone(), v);
    }
    kvs
}

// `∧` on a field present on both sides
fn merge_record_field(field: &Label, l: &Expr, r: &Expr) -> Expr {
    use ExprKind::RecordLit;
    let mergeable = |e: &Expr| matches!(e.kind(), RecordLit(_)) || is_neutral(e);
    if mergeable(l) && mergeable(r) {
        normalize_binop(BinOp::RecursiveRecordMerge, l, r)
    } else {
        fatal(InvariantViolation::RecordMergeMismatch {
            field: field.clone(),
            left: l.clone(),
            right: r.clone(),
        })
    }
}

// `⩓` on a field present on both sides
fn merge_record_type_field(field: &Label, l: &Expr, r: &Expr) -> Expr {
    use ExprKind::RecordType;
    let mergeable = |e: &Expr| matches!(e.kind(), RecordType(_)) || is_neutral(e);
    match (l.kind(), r.kind()) {
        (RecordType(_), RecordType(_)) => {
            normalize_binop(BinOp::RecursiveRecordTypeMerge, l, r)
        }
        _ if alpha_equivalent(l, r) => l.clone(),
        _ if mergeable(l) && mergeable(r) => rc(ExprKind::BinOp(
            BinOp::RecursiveRecordTypeMerge,
            l.clone(),
            r.clone(),
        )),
        _ => fatal(InvariantViolation::RecordTypeMergeMismatch {
            field: field.clone(),
            left: l.clone(),
            right: r.clone(),
        }),
    }
}

// Both operands must already be normalized.
fn normalize_binop(o: BinOp, x: &Expr, y: &Expr) -> Expr {
    use BinOp::*;
    use ExprKind::{BoolLit, EmptyListLit, NEListLit, NaturalLit, RecordLit, RecordType};

    match (o, x.kind(), y.kind()) {
        (BoolAnd, BoolLit(true), _) => y.clone(),
        (BoolAnd, _, BoolLit(true)) => x.clone(),
        (BoolAnd, BoolLit(false), _) => rc(BoolLit(false)),
        (BoolAnd, _, BoolLit(false)) => rc(BoolLit(false)),
        (BoolAnd, _, _) if alpha_equivalent(x, y) => x.clone(),
        (BoolOr, BoolLit(true), _) => rc(BoolLit(true)),
        (BoolOr, _, BoolLit(true)) => rc(BoolLit(true)),
        (BoolOr, BoolLit(false), _) => y.clone(),
        (BoolOr, _, BoolLit(false)) => x.clone(),
        (BoolOr, _, _) if alpha_equivalent(x, y) => x.clone(),
        (BoolEQ, BoolLit(true), _) => y.clone(),
        (BoolEQ, _, BoolLit(true)) => x.clone(),
        (BoolEQ, BoolLit(a), BoolLit(b)) => rc(BoolLit(a == b)),
        (BoolEQ, _, _) if alpha_equivalent(x, y) => rc(BoolLit(true)),
        (BoolNE, BoolLit(false), _) => y.clone(),
        (BoolNE, _, BoolLit(false)) => x.clone(),
        (BoolNE, BoolLit(a), BoolLit(b)) => rc(BoolLit(a != b)),
        (BoolNE, _, _) if alpha_equivalent(x, y) => rc(BoolLit(false)),

        (NaturalPlus, NaturalLit(0), _) => y.clone(),
        (NaturalPlus, _, NaturalLit(0)) => x.clone(),
        (NaturalPlus, NaturalLit(a), NaturalLit(b)) => match a.checked_add(*b) {
            Some(n) => rc(NaturalLit(n)),
            None => rc(ExprKind::BinOp(o, x.clone(), y.clone())),
        },
        (NaturalTimes, NaturalLit(0), _) => rc(NaturalLit(0)),
        (NaturalTimes, _, NaturalLit(0)) => rc(NaturalLit(0)),
        (NaturalTimes, NaturalLit(1), _) => y.clone(),
        (NaturalTimes, _, NaturalLit(1)) => x.clone(),
        (NaturalTimes, NaturalLit(a), NaturalLit(b)) => match a.checked_mul(*b) {
            Some(n) => rc(NaturalLit(n)),
            None => rc(ExprKind::BinOp(o, x.clone(), y.clone())),
        },

        (TextAppend, _, _) => normalize_text(vec![
            InterpolatedTextContents::Expr(x.clone()),
            InterpolatedTextContents::Expr(y.clone()),
        ]),

        (ListAppend, EmptyListLit(_), _) => y.clone(),
        (ListAppend, _, EmptyListLit(_)) => x.clone(),
        (ListAppend, NEListLit(xs), NEListLit(ys)) => {
            rc(NEListLit(xs.iter().chain(ys.iter()).cloned().collect()))
        }

        (RightBiasedRecordMerge, _, RecordLit(kvs)) if kvs.is_empty() => {
            x.clone()
        }
        (RightBiasedRecordMerge, RecordLit(kvs), _) if kvs.is_empty() => {
            y.clone()
        }
        (RightBiasedRecordMerge, RecordLit(kvs1), RecordLit(kvs2)) => {
            let mut kvs = kvs2.clone();
            for (x, v) in kvs1 {
                // Insert only if key not already present
                kvs.entry(x.clone()).or_insert_with(|| v.clone());
            }
            rc(RecordLit(kvs))
        }
        (RightBiasedRecordMerge, _, _) if alpha_equivalent(x, y) => y.clone(),

        (RecursiveRecordMerge, _, RecordLit(kvs)) if kvs.is_empty() => {
            x.clone()
        }
        (RecursiveRecordMerge, RecordLit(kvs), _) if kvs.is_empty() => {
            y.clone()
        }
        (RecursiveRecordMerge, RecordLit(kvs1), RecordLit(kvs2)) => {
            rc(RecordLit(merge_maps(kvs1, kvs2, merge_record_field)))
        }

        (RecursiveRecordTypeMerge, _, RecordType(kts)) if kts.is_empty() => {
            x.clone()
        }
        (RecursiveRecordTypeMerge, RecordType(kts), _) if kts.is_empty() => {
            y.clone()
        }
        (RecursiveRecordTypeMerge, RecordType(kts_x), RecordType(kts_y)) => {
            rc(RecordType(merge_maps(kts_x, kts_y, merge_record_type_field)))
        }

        _ => rc(ExprKind::BinOp(o, x.clone(), y.clone())),
    }
}

// The record must already be normalized.
fn normalize_field(v: &Expr, field: &Label) -> Expr {
    use self::BinOp::{RecursiveRecordMerge, RightBiasedRecordMerge};
    use ExprKind::{BinOp, Projection, ProjectionByExpr, RecordLit};
    let nothing_to_do = || rc(ExprKind::Field(v.clone(), field.clone()));
    let singleton =
        |r: &Expr| rc(RecordLit(once((field.clone(), r.clone())).collect()));

    match v.kind() {
        RecordLit(kvs) => match kvs.get(field) {
            Some(r) => r.clone(),
            None => nothing_to_do(),
        },
        Projection(x, _) | ProjectionByExpr(x, _) => normalize_field(x, field),
        BinOp(RightBiasedRecordMerge, x, y) => match (x.kind(), y.kind()) {
            (_, RecordLit(kvs)) => match kvs.get(field) {
                Some(r) => r.clone(),
                None => normalize_field(x, field),
            },
            (RecordLit(kvs), _) => match kvs.get(field) {
                Some(r) => rc(ExprKind::Field(
                    rc(BinOp(RightBiasedRecordMerge, singleton(r), y.clone())),
                    field.clone(),
                )),
                None => normalize_field(y, field),
            },
            _ => nothing_to_do(),
        },
        BinOp(RecursiveRecordMerge, x, y) => match (x.kind(), y.kind()) {
            (RecordLit(kvs), _) => match kvs.get(field) {
                Some(r) => rc(ExprKind::Field(
                    rc(BinOp(RecursiveRecordMerge, singleton(r), y.clone())),
                    field.clone(),
                )),
                None => normalize_field(y, field),
            },
            (_, RecordLit(kvs)) => match kvs.get(field) {
                Some(r) => rc(ExprKind::Field(
                    rc(BinOp(RecursiveRecordMerge, x.clone(), singleton(r))),
                    field.clone(),
                )),
                None => normalize_field(x, field),
            },
            _ => nothing_to_do(),
        },
        _ => nothing_to_do(),
    }
}

// The record must already be normalized.
fn normalize_projection(v: &Expr, ls: &BTreeSet<Label>) -> Expr {
    use ExprKind::{BinOp, Projection, RecordLit};
    if ls.is_empty() {
        return rc(RecordLit(BTreeMap::new()));
    }
    match v.kind() {
        RecordLit(kvs) => rc(RecordLit(
            ls.iter()
                .filter_map(|l| kvs.get(l).map(|x| (l.clone(), x.clone())))
                .collect(),
        )),
        Projection(v2, _) => normalize_projection(v2, ls),
        BinOp(self::BinOp::RightBiasedRecordMerge, l, r) => match r.kind() {
            RecordLit(kvs) => {
                let r_keys: BTreeSet<Label> = kvs.keys().cloned().collect();
                normalize_binop(
                    self::BinOp::RightBiasedRecordMerge,
                    &normalize_projection(
                        l,
                        &ls.difference(&r_keys).cloned().collect(),
                    ),
                    &normalize_projection(
                        r,
                        &ls.intersection(&r_keys).cloned().collect(),
                    ),
                )
            }
            _ => rc(Projection(v.clone(), ls.clone())),
        },
        _ => rc(Projection(v.clone(), ls.clone())),
    }
}

fn normalize_projection_by_expr(v: &Expr, t: &Expr) -> Expr {
    match t.kind() {
        ExprKind::RecordType(kts) => {
            normalize_projection(v, &kts.keys().cloned().collect())
        }
        _ => rc(ExprKind::ProjectionByExpr(v.clone(), t.clone())),
    }
}

fn normalize_to_map(v: &Expr, annot: Option<Expr>) -> Expr {
    use ExprKind::{EmptyListLit, NEListLit, RecordLit};
    match (v.kind(), annot) {
        // The annotation is the type of the whole list
        (RecordLit(kvs), Some(t)) if kvs.is_empty() => rc(EmptyListLit(t)),
        (RecordLit(kvs), _) if !kvs.is_empty() => rc(NEListLit(
            kvs.iter()
                .map(|(k, v)| {
                    let mut rec: BTreeMap<Label, Expr> = BTreeMap::new();
                    rec.insert("mapKey".into(), text_lit(k.as_ref()));
                    rec.insert("mapValue".into(), v.clone());
                    rc(RecordLit(rec))
                })
                .collect(),
        )),
        (_, annot) => rc(ExprKind::ToMap(v.clone(), annot)),
    }
}

fn normalize_merge(handlers: &Expr, variant: &Expr, annot: Option<Expr>) -> Expr {
    use ExprKind::{App, Builtin, Field, RecordLit, SomeLit, UnionType};
    let nothing_to_do =
        || rc(ExprKind::Merge(handlers.clone(), variant.clone(), annot.clone()));
    let is_union = |e: &Expr| matches!(e.kind(), UnionType(_));

    let kvs = match handlers.kind() {
        RecordLit(kvs) => kvs,
        _ => return nothing_to_do(),
    };
    match variant.kind() {
        // An alternative with no payload
        Field(u, l) if is_union(u) => match kvs.get(l) {
            Some(h) => h.clone(),
            None => nothing_to_do(),
        },
        App(f, payload) => match f.kind() {
            Field(u, l) if is_union(u) => match kvs.get(l) {
                Some(h) => normalize_app(h, payload),
                None => nothing_to_do(),
            },
            Builtin(crate::syntax::Builtin::OptionalNone) => {
                match kvs.get("None") {
                    Some(h) => h.clone(),
                    None => nothing_to_do(),
                }
            }
            _ => nothing_to_do(),
        },
        SomeLit(v) => match kvs.get("Some") {
            Some(h) => normalize_app(h, v),
            None => nothing_to_do(),
        },
        _ => nothing_to_do(),
    }
}
