use crate::error::{fatal, InvariantViolation};
use crate::semantics::{normalize, Shift, Subst};
use crate::syntax::{Binding, Builtin, Expr, ExprKind, Label, V};

fn placeholder() -> Label {
    "_".into()
}

// Rename the variable bound to `x` in `body` to `_`, keeping every other variable pointing at
// the same binder.
fn rename_bound(x: &Label, body: &Expr) -> Expr {
    let underscore = V(placeholder(), 0);
    let x = V(x.clone(), 0);
    body.shift(1, &underscore)
        .subst(&x, &Expr::new(ExprKind::Var(underscore)))
        .shift(-1, &x)
}

/// Rename every bound variable to `_`. Two expressions that only differ in the names of their
/// bound variables have the same alpha-normal form.
pub fn alpha_normalize(e: &Expr) -> Expr {
    use ExprKind::*;
    match e.kind() {
        Lam(x, t, b) if x.as_ref() == "_" => {
            Expr::new(Lam(placeholder(), alpha_normalize(t), alpha_normalize(b)))
        }
        Lam(x, t, b) => Expr::new(Lam(
            placeholder(),
            alpha_normalize(t),
            alpha_normalize(&rename_bound(x, b)),
        )),
        Pi(x, t, b) if x.as_ref() == "_" => {
            Expr::new(Pi(placeholder(), alpha_normalize(t), alpha_normalize(b)))
        }
        Pi(x, t, b) => Expr::new(Pi(
            placeholder(),
            alpha_normalize(t),
            alpha_normalize(&rename_bound(x, b)),
        )),
        Let(bindings, body) => {
            let (first, rest) = match bindings.split_first() {
                Some(split) => split,
                None => fatal(InvariantViolation::EmptyLet),
            };
            let rest = if rest.is_empty() {
                body.clone()
            } else {
                Expr::new(Let(rest.to_vec(), body.clone()))
            };
            let rest = if first.variable.as_ref() == "_" {
                alpha_normalize(&rest)
            } else {
                alpha_normalize(&rename_bound(&first.variable, &rest))
            };
            let first = Binding {
                variable: placeholder(),
                annot: first.annot.as_ref().map(alpha_normalize),
                value: alpha_normalize(&first.value),
            };
            // Keep multi-binding lets as a single node
            match rest.kind() {
                Let(more, body) if bindings.len() > 1 => {
                    let mut all = Vec::with_capacity(bindings.len());
                    all.push(first);
                    all.extend(more.iter().cloned());
                    Expr::new(Let(all, body.clone()))
                }
                _ => Expr::new(Let(vec![first], rest)),
            }
        }
        Embed(i) => fatal(InvariantViolation::UnresolvedImport(i.clone())),
        _ => e.map_ref(alpha_normalize),
    }
}

/// Structural equality up to renaming of bound variables. Both sides are expected to be
/// normalized already.
pub fn alpha_equivalent(x: &Expr, y: &Expr) -> bool {
    x == y || alpha_normalize(x) == alpha_normalize(y)
}

/// Definitional equality: normalize, then compare up to renaming of bound variables.
pub fn judgmentally_equal(x: &Expr, y: &Expr) -> bool {
    alpha_equivalent(&normalize(x), &normalize(y))
}

/// Whether `var` occurs free in `e`.
pub fn is_free_in(var: &V, e: &Expr) -> bool {
    let marker = Expr::new(ExprKind::Builtin(Builtin::Bool));
    e.subst(var, &marker) != *e
}

impl Expr {
    pub fn alpha_normalize(&self) -> Expr {
        alpha_normalize(self)
    }
}
