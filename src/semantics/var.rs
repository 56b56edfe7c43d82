use crate::error::{fatal, InvariantViolation};
use crate::syntax::{Expr, ExprKind, Label, V};

pub trait Shift: Sized {
    // Shift an expression to move it around binders without changing the meaning of its free
    // variables. Shift by 1 to move an expression under a binder. Shift by -1 to extract an
    // expression from under a binder, if the expression does not refer to that bound variable.
    // Panics if a free variable would end up with a negative index.
    fn shift(&self, delta: isize, var: &V) -> Self;

    fn under_binder(&self, x: &Label) -> Self {
        self.shift(1, &V(x.clone(), 0))
    }

    fn over_binder(&self, x: &Label) -> Self {
        self.shift(-1, &V(x.clone(), 0))
    }
}

pub trait Subst<T> {
    /// Replace every free occurrence of `var` with `val`. Free variables are otherwise left
    /// untouched, so this is usually wrapped in a shift up and a shift down.
    fn subst(&self, var: &V, val: &T) -> Self;

    /// `subst` for a variable whose binder is being removed: `val` is shifted up past the
    /// binder, substituted, and the result shifted back down.
    fn subst_shift(&self, var: &V, val: &T) -> Self;
}

impl Shift for V {
    fn shift(&self, delta: isize, var: &V) -> Self {
        let V(x, n) = var;
        let V(y, m) = self;
        if x == y && n <= m {
            match add_ui(*m, delta) {
                Some(m) => V(y.clone(), m),
                None => fatal(InvariantViolation::NegativeShift {
                    var: self.clone(),
                    delta,
                }),
            }
        } else {
            self.clone()
        }
    }
}

impl Shift for Expr {
    fn shift(&self, delta: isize, var: &V) -> Self {
        match self.kind() {
            ExprKind::Var(v) => Expr::new(ExprKind::Var(v.shift(delta, var))),
            ExprKind::Embed(_) => self.clone(),
            _ => self.map_ref_with_binders(|binders, e| {
                let var = binders
                    .iter()
                    .fold(var.clone(), |var, x| var.under_binder(x));
                e.shift(delta, &var)
            }),
        }
    }
}

impl Subst<Expr> for Expr {
    fn subst(&self, var: &V, val: &Expr) -> Self {
        match self.kind() {
            ExprKind::Var(v) if v == var => val.clone(),
            ExprKind::Var(_) | ExprKind::Embed(_) => self.clone(),
            _ => self.map_ref_with_binders(|binders, e| {
                if binders.is_empty() {
                    return e.subst(var, val);
                }
                let mut var = var.clone();
                let mut val = val.clone();
                for x in binders {
                    var = var.under_binder(x);
                    val = val.under_binder(x);
                }
                e.subst(&var, &val)
            }),
        }
    }

    fn subst_shift(&self, var: &V, val: &Expr) -> Self {
        let val = val.shift(1, var);
        self.subst(var, &val).shift(-1, var)
    }
}

/// Add an isize to an usize
/// Returns `None` on over/underflow
fn add_ui(u: usize, i: isize) -> Option<usize> {
    Some(if i < 0 {
        u.checked_sub(i.checked_neg()? as usize)?
    } else {
        u.checked_add(i as usize)?
    })
}

/// Shift the free occurrences of `var` (and of outer variables with the same name) in `in_expr`
/// by `delta`.
pub fn shift(delta: isize, var: &V, in_expr: &Expr) -> Expr {
    in_expr.shift(delta, var)
}

/// Capture-avoiding substitution of `val` for `var` in `in_expr`.
pub fn subst(var: &V, val: &Expr, in_expr: &Expr) -> Expr {
    in_expr.subst(var, val)
}
