use std::iter::FromIterator;

use crate::syntax::{Binding, ExprKind, Label};

fn opt<'a, T, U, Err>(
    x: &'a Option<T>,
    f: impl FnOnce(&'a T) -> Result<U, Err>,
) -> Result<Option<U>, Err> {
    x.as_ref().map(f).transpose()
}

fn btmap<'a, SE1, SE2, T, Err>(
    x: impl IntoIterator<Item = (&'a Label, &'a SE1)>,
    mut f: impl FnMut(&'a SE1) -> Result<SE2, Err>,
) -> Result<T, Err>
where
    SE1: 'a,
    T: FromIterator<(Label, SE2)>,
{
    x.into_iter().map(|(k, x)| Ok((k.clone(), f(x)?))).collect()
}

/// Shallow traversal of an `ExprKind`. For each direct subexpression, `f` receives the
/// binders the subexpression lives under, innermost last, along with the subexpression.
///
/// For `λ(x : A) -> b` that's `[]` for `A` and `[x]` for `b`. For
/// `let x = a let y = b in c` that's `[]` for `a`, `[x]` for `b` and `[x, y]` for `c`.
pub fn visit_ref<'a, F, SE1, SE2, Err>(
    input: &'a ExprKind<SE1>,
    mut f: F,
) -> Result<ExprKind<SE2>, Err>
where
    F: FnMut(&[&'a Label], &'a SE1) -> Result<SE2, Err>,
{
    // Can't use closures because of borrowing rules
    macro_rules! expr {
        () => {
            |e| Ok(expr!(e))
        };
        ($e:expr) => {
            f(&[], $e)?
        };
        ($l:expr, $e:expr) => {
            f($l, $e)?
        };
    }
    macro_rules! opt {
        () => {
            |e| Ok(opt!(e))
        };
        ($e:expr) => {
            opt($e, |e| Ok(expr!(e)))?
        };
    }

    use crate::syntax::ExprKind::*;
    Ok(match input {
        Const(k) => Const(*k),
        Var(v) => Var(v.clone()),
        Lam(l, t, e) => Lam(l.clone(), expr!(t), expr!(&[l], e)),
        Pi(l, t, e) => Pi(l.clone(), expr!(t), expr!(&[l], e)),
        App(g, a) => App(expr!(g), expr!(a)),
        Let(bindings, body) => {
            let mut binders: Vec<&'a Label> = Vec::with_capacity(bindings.len());
            let mut new_bindings = Vec::with_capacity(bindings.len());
            for b in bindings {
                let annot = match &b.annot {
                    Some(t) => Some(f(&binders, t)?),
                    None => None,
                };
                let value = f(&binders, &b.value)?;
                new_bindings.push(Binding {
                    variable: b.variable.clone(),
                    annot,
                    value,
                });
                binders.push(&b.variable);
            }
            Let(new_bindings, expr!(&binders, body))
        }
        Annot(x, t) => Annot(expr!(x), expr!(t)),
        Assert(t) => Assert(expr!(t)),
        Builtin(b) => Builtin(*b),
        BinOp(o, x, y) => BinOp(*o, expr!(x), expr!(y)),
        BoolLit(b) => BoolLit(*b),
        BoolIf(b, t, e) => BoolIf(expr!(b), expr!(t), expr!(e)),
        NaturalLit(n) => NaturalLit(*n),
        IntegerLit(n) => IntegerLit(*n),
        DoubleLit(n) => DoubleLit(*n),
        TextLit(t) => TextLit(t.traverse_ref(expr!())?),
        EmptyListLit(t) => EmptyListLit(expr!(t)),
        NEListLit(es) => {
            NEListLit(es.iter().map(expr!()).collect::<Result<_, _>>()?)
        }
        SomeLit(e) => SomeLit(expr!(e)),
        RecordType(kts) => RecordType(btmap(kts, expr!())?),
        RecordLit(kvs) => RecordLit(btmap(kvs, expr!())?),
        UnionType(kts) => UnionType(btmap(kts, opt!())?),
        Merge(h, u, t) => Merge(expr!(h), expr!(u), opt!(t)),
        ToMap(r, t) => ToMap(expr!(r), opt!(t)),
        Field(r, l) => Field(expr!(r), l.clone()),
        Projection(r, ls) => Projection(expr!(r), ls.clone()),
        ProjectionByExpr(r, t) => ProjectionByExpr(expr!(r), expr!(t)),
        Embed(i) => Embed(i.clone()),
    })
}
