use std::convert::TryFrom;

use crate::semantics::{alpha_equivalent, normalize, Shift};
use crate::syntax::{
    app, binop, builtin, escape_text, lam, natural_lit, rc, record_lit,
    record_type, text_lit, var, BinOp, Builtin, Expr, ExprKind,
};

// The successor function given to `Natural/build`: `λ(x : Natural) → x + 1`
fn natural_succ() -> Expr {
    lam(
        "x",
        builtin(Builtin::Natural),
        binop(BinOp::NaturalPlus, var("x"), natural_lit(1)),
    )
}

// The cons function given to `List/build`: `λ(a : t) → λ(as : List t) → [ a ] # as`
fn list_cons(t: &Expr) -> Expr {
    let list_t = app(builtin(Builtin::List), vec![t.under_binder(&"a".into())]);
    lam(
        "a",
        t.clone(),
        lam(
            "as",
            list_t,
            binop(
                BinOp::ListAppend,
                rc(ExprKind::NEListLit(vec![var("a")])),
                var("as"),
            ),
        ),
    )
}

// The some function given to `Optional/build`: `λ(a : t) → Some a`
fn optional_some(t: &Expr) -> Expr {
    lam("a", t.clone(), rc(ExprKind::SomeLit(var("a"))))
}

fn list_of(t: &Expr) -> Expr {
    app(builtin(Builtin::List), vec![t.clone()])
}

fn none_of(t: &Expr) -> Expr {
    app(builtin(Builtin::OptionalNone), vec![t.clone()])
}

/// Whether `e` is `head a0 ... an`. Returns the arguments.
fn applied_builtin(e: &Expr, head: Builtin) -> Option<Vec<&Expr>> {
    let mut args = Vec::new();
    let mut e = e;
    loop {
        match e.kind() {
            ExprKind::App(f, a) => {
                args.push(a);
                e = f;
            }
            ExprKind::Builtin(b) if *b == head => {
                args.reverse();
                return Some(args);
            }
            _ => return None,
        }
    }
}

/// Reduce a builtin applied to the normalized arguments `args`. Returns `None` if the
/// application is stuck, which includes every case where the number of arguments doesn't match
/// a reduction rule exactly.
#[allow(clippy::cognitive_complexity)]
pub(crate) fn apply_builtin(b: Builtin, args: &[Expr]) -> Option<Expr> {
    use Builtin::*;
    use ExprKind::{
        BoolLit, DoubleLit, EmptyListLit, IntegerLit, NEListLit, NaturalLit,
        SomeLit, TextLit,
    };

    // Small helper enum
    enum Ret {
        // The result is already in normal form
        Expr(Expr),
        // The result may contain new redexes
        Renormalize(Expr),
        DoneAsIs,
    }
    let kind = |k| Ret::Expr(rc(k));

    let ret = match (b, args) {
        (NaturalIsZero, [n]) => match n.kind() {
            NaturalLit(n) => kind(BoolLit(*n == 0)),
            _ => Ret::DoneAsIs,
        },
        (NaturalEven, [n]) => match n.kind() {
            NaturalLit(n) => kind(BoolLit(*n % 2 == 0)),
            _ => Ret::DoneAsIs,
        },
        (NaturalOdd, [n]) => match n.kind() {
            NaturalLit(n) => kind(BoolLit(*n % 2 != 0)),
            _ => Ret::DoneAsIs,
        },
        (NaturalToInteger, [n]) => match n.kind() {
            NaturalLit(n) => match i64::try_from(*n) {
                Ok(n) => kind(IntegerLit(n)),
                Err(_) => Ret::DoneAsIs,
            },
            _ => Ret::DoneAsIs,
        },
        (NaturalShow, [n]) => match n.kind() {
            NaturalLit(n) => Ret::Expr(text_lit(&n.to_string())),
            _ => Ret::DoneAsIs,
        },
        (NaturalSubtract, [a, b]) => match (a.kind(), b.kind()) {
            (NaturalLit(a), NaturalLit(b)) => {
                kind(NaturalLit(b.saturating_sub(*a)))
            }
            (NaturalLit(0), _) => Ret::Expr(b.clone()),
            (_, NaturalLit(0)) => kind(NaturalLit(0)),
            _ if alpha_equivalent(a, b) => kind(NaturalLit(0)),
            _ => Ret::DoneAsIs,
        },
        (IntegerShow, [n]) => match n.kind() {
            IntegerLit(n) => {
                let s = if *n < 0 {
                    n.to_string()
                } else {
                    format!("+{}", n)
                };
                Ret::Expr(text_lit(&s))
            }
            _ => Ret::DoneAsIs,
        },
        (IntegerToDouble, [n]) => match n.kind() {
            IntegerLit(n) => kind(DoubleLit((*n as f64).into())),
            _ => Ret::DoneAsIs,
        },
        (IntegerNegate, [n]) => match n.kind() {
            IntegerLit(n) => match n.checked_neg() {
                Some(n) => kind(IntegerLit(n)),
                None => Ret::DoneAsIs,
            },
            _ => Ret::DoneAsIs,
        },
        (IntegerClamp, [n]) => match n.kind() {
            IntegerLit(n) => kind(NaturalLit(u64::try_from(*n).unwrap_or(0))),
            _ => Ret::DoneAsIs,
        },
        (DoubleShow, [n]) => match n.kind() {
            DoubleLit(n) => Ret::Expr(text_lit(&n.to_string())),
            _ => Ret::DoneAsIs,
        },
        (TextShow, [v]) => match v.kind() {
            // Only literals without interpolations
            TextLit(t) => match t.as_plain_text() {
                Some(s) => {
                    Ret::Expr(text_lit(&format!("\"{}\"", escape_text(s))))
                }
                None => Ret::DoneAsIs,
            },
            _ => Ret::DoneAsIs,
        },
        (ListLength, [_, l]) => match l.kind() {
            EmptyListLit(_) => kind(NaturalLit(0)),
            NEListLit(xs) => kind(NaturalLit(xs.len() as u64)),
            _ => Ret::DoneAsIs,
        },
        (ListHead, [t, l]) => match l.kind() {
            EmptyListLit(_) => Ret::Expr(none_of(t)),
            NEListLit(xs) => match xs.first() {
                Some(x) => kind(SomeLit(x.clone())),
                None => Ret::Expr(none_of(t)),
            },
            _ => Ret::DoneAsIs,
        },
        (ListLast, [t, l]) => match l.kind() {
            EmptyListLit(_) => Ret::Expr(none_of(t)),
            NEListLit(xs) => match xs.last() {
                Some(x) => kind(SomeLit(x.clone())),
                None => Ret::Expr(none_of(t)),
            },
            _ => Ret::DoneAsIs,
        },
        (ListReverse, [_, l]) => match l.kind() {
            EmptyListLit(_) => Ret::Expr(l.clone()),
            NEListLit(xs) => kind(NEListLit(xs.iter().rev().cloned().collect())),
            _ => Ret::DoneAsIs,
        },
        (ListIndexed, [t, l]) => match l.kind() {
            EmptyListLit(_) => {
                // { index : Natural, value : t }
                let record_t = record_type(vec![
                    ("index", builtin(Builtin::Natural)),
                    ("value", t.clone()),
                ]);
                kind(EmptyListLit(list_of(&record_t)))
            }
            NEListLit(xs) => kind(NEListLit(
                xs.iter()
                    .enumerate()
                    .map(|(i, x)| {
                        record_lit(vec![
                            ("index", natural_lit(i as u64)),
                            ("value", x.clone()),
                        ])
                    })
                    .collect(),
            )),
            _ => Ret::DoneAsIs,
        },
        (ListBuild, [t, g]) => match applied_builtin(g, ListFold).as_deref() {
            // List/build t (List/fold t l) = l
            Some([_, l]) => Ret::Expr((*l).clone()),
            _ => Ret::Renormalize(app(
                g.clone(),
                vec![
                    list_of(t),
                    list_cons(t),
                    rc(EmptyListLit(list_of(t))),
                ],
            )),
        },
        (ListFold, [_, l, _, cons, nil]) => match l.kind() {
            EmptyListLit(_) => Ret::Expr(nil.clone()),
            NEListLit(xs) => {
                let mut v = nil.clone();
                for x in xs.iter().rev() {
                    v = normalize(&app(cons.clone(), vec![x.clone(), v]));
                }
                Ret::Expr(v)
            }
            _ => Ret::DoneAsIs,
        },
        (OptionalBuild, [t, g]) => {
            match applied_builtin(g, OptionalFold).as_deref() {
                // Optional/build t (Optional/fold t o) = o
                Some([_, o]) => Ret::Expr((*o).clone()),
                _ => Ret::Renormalize(app(
                    g.clone(),
                    vec![
                        app(builtin(Optional), vec![t.clone()]),
                        optional_some(t),
                        none_of(t),
                    ],
                )),
            }
        }
        (OptionalFold, [_, o, _, some, none]) => match o.kind() {
            SomeLit(x) => {
                Ret::Renormalize(app(some.clone(), vec![x.clone()]))
            }
            _ if applied_builtin(o, OptionalNone).is_some() => {
                Ret::Expr(none.clone())
            }
            _ => Ret::DoneAsIs,
        },
        (NaturalBuild, [g]) => match applied_builtin(g, NaturalFold).as_deref()
        {
            // Natural/build (Natural/fold n) = n
            Some([n]) => Ret::Expr((*n).clone()),
            _ => Ret::Renormalize(app(
                g.clone(),
                vec![builtin(Natural), natural_succ(), natural_lit(0)],
            )),
        },
        (NaturalFold, [n, _, succ, zero]) => match n.kind() {
            NaturalLit(n) => {
                let mut v = zero.clone();
                for _ in 0..*n {
                    v = normalize(&app(succ.clone(), vec![v]));
                }
                Ret::Expr(v)
            }
            _ => Ret::DoneAsIs,
        },
        _ => Ret::DoneAsIs,
    };
    match ret {
        Ret::Expr(e) => Some(e),
        Ret::Renormalize(e) => Some(normalize(&e)),
        Ret::DoneAsIs => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::*;
    use pretty_assertions::assert_eq as assert_eq_pretty;

    fn nat() -> Expr {
        builtin(Builtin::Natural)
    }

    fn apply(b: Builtin, args: Vec<Expr>) -> Option<Expr> {
        apply_builtin(b, &args)
    }

    #[test]
    fn natural_predicates() {
        use Builtin::*;
        assert_eq!(apply(NaturalIsZero, vec![natural_lit(0)]), Some(bool_lit(true)));
        assert_eq!(apply(NaturalEven, vec![natural_lit(3)]), Some(bool_lit(false)));
        assert_eq!(apply(NaturalOdd, vec![natural_lit(3)]), Some(bool_lit(true)));
        assert_eq!(apply(NaturalOdd, vec![var("n")]), None);
        assert_eq!(
            apply(NaturalToInteger, vec![natural_lit(3)]),
            Some(integer_lit(3))
        );
        assert_eq!(apply(NaturalShow, vec![natural_lit(42)]), Some(text_lit("42")));
    }

    #[test]
    fn natural_subtract() {
        use Builtin::NaturalSubtract;
        assert_eq!(
            apply(NaturalSubtract, vec![natural_lit(2), natural_lit(5)]),
            Some(natural_lit(3))
        );
        assert_eq!(
            apply(NaturalSubtract, vec![natural_lit(5), natural_lit(2)]),
            Some(natural_lit(0))
        );
        assert_eq!(
            apply(NaturalSubtract, vec![natural_lit(0), var("n")]),
            Some(var("n"))
        );
        assert_eq!(
            apply(NaturalSubtract, vec![var("n"), natural_lit(0)]),
            Some(natural_lit(0))
        );
        assert_eq!(
            apply(NaturalSubtract, vec![var("n"), var("n")]),
            Some(natural_lit(0))
        );
        assert_eq!(apply(NaturalSubtract, vec![var("m"), var("n")]), None);
    }

    #[test]
    fn integers_and_doubles() {
        use Builtin::*;
        assert_eq!(apply(IntegerShow, vec![integer_lit(3)]), Some(text_lit("+3")));
        assert_eq!(apply(IntegerShow, vec![integer_lit(-3)]), Some(text_lit("-3")));
        assert_eq!(
            apply(IntegerToDouble, vec![integer_lit(-2)]),
            Some(double_lit(-2.0))
        );
        assert_eq!(apply(IntegerNegate, vec![integer_lit(4)]), Some(integer_lit(-4)));
        assert_eq!(apply(IntegerClamp, vec![integer_lit(-4)]), Some(natural_lit(0)));
        assert_eq!(apply(IntegerClamp, vec![integer_lit(4)]), Some(natural_lit(4)));
        assert_eq!(apply(DoubleShow, vec![double_lit(1.0)]), Some(text_lit("1.0")));
    }

    #[test]
    fn text_show_escapes() {
        assert_eq!(
            apply(Builtin::TextShow, vec![text_lit("a\"$\n")]),
            Some(text_lit(r#""a\"\u0024\n""#))
        );
        assert_eq!(
            apply(Builtin::TextShow, vec![text_lit("\u{1b}\u{1f}")]),
            Some(text_lit("\"\\u001b\u{1f}\""))
        );
        let interpolated = rc(ExprKind::TextLit(InterpolatedText::from_chunks(
            vec![("a".to_owned(), var("x"))],
            String::new(),
        )));
        assert_eq!(apply(Builtin::TextShow, vec![interpolated]), None);
    }

    #[test]
    fn list_operations() {
        use Builtin::*;
        let xs = make_list(vec![natural_lit(1), natural_lit(2)]);
        let empty = rc(ExprKind::EmptyListLit(list_of(&nat())));
        assert_eq!(apply(ListLength, vec![nat(), xs.clone()]), Some(natural_lit(2)));
        assert_eq!(apply(ListLength, vec![nat(), empty.clone()]), Some(natural_lit(0)));
        assert_eq!(
            apply(ListHead, vec![nat(), xs.clone()]),
            Some(rc(ExprKind::SomeLit(natural_lit(1))))
        );
        assert_eq!(
            apply(ListLast, vec![nat(), xs.clone()]),
            Some(rc(ExprKind::SomeLit(natural_lit(2))))
        );
        assert_eq!(apply(ListHead, vec![nat(), empty.clone()]), Some(none_of(&nat())));
        assert_eq!(
            apply(ListReverse, vec![nat(), xs.clone()]),
            Some(make_list(vec![natural_lit(2), natural_lit(1)]))
        );
        assert_eq_pretty!(
            apply(ListIndexed, vec![nat(), xs]),
            Some(make_list(vec![
                record_lit(vec![("index", natural_lit(0)), ("value", natural_lit(1))]),
                record_lit(vec![("index", natural_lit(1)), ("value", natural_lit(2))]),
            ]))
        );
        assert_eq_pretty!(
            apply(ListIndexed, vec![nat(), empty]),
            Some(rc(ExprKind::EmptyListLit(list_of(&record_type(vec![
                ("index", nat()),
                ("value", nat()),
            ])))))
        );
    }

    #[test]
    fn folds() {
        use Builtin::*;
        let plus = lam(
            "x",
            nat(),
            lam("y", nat(), binop(BinOp::NaturalPlus, var("x"), var("y"))),
        );
        let xs = make_list(vec![natural_lit(1), natural_lit(2), natural_lit(3)]);
        assert_eq!(
            apply(ListFold, vec![nat(), xs, nat(), plus, natural_lit(0)]),
            Some(natural_lit(6))
        );

        let double = lam("x", nat(), binop(BinOp::NaturalTimes, var("x"), natural_lit(2)));
        assert_eq!(
            apply(NaturalFold, vec![natural_lit(3), nat(), double, natural_lit(1)]),
            Some(natural_lit(8))
        );

        let succ = natural_succ();
        let some_five = rc(ExprKind::SomeLit(natural_lit(5)));
        assert_eq!(
            apply(OptionalFold, vec![nat(), some_five, nat(), succ.clone(), natural_lit(0)]),
            Some(natural_lit(6))
        );
        assert_eq!(
            apply(OptionalFold, vec![nat(), none_of(&nat()), nat(), succ, natural_lit(0)]),
            Some(natural_lit(0))
        );
    }

    #[test]
    fn folds_over_nothing_return_the_seed() {
        use Builtin::*;
        let list_t = app(builtin(List), vec![nat()]);
        let empty = rc(ExprKind::EmptyListLit(list_t));
        assert_eq!(
            apply(ListFold, vec![nat(), empty, var("r"), var("cons"), var("nil")]),
            Some(var("nil"))
        );
        assert_eq!(
            apply(NaturalFold, vec![natural_lit(0), nat(), var("f"), var("z")]),
            Some(var("z"))
        );
    }

    #[test]
    fn build_fold_fusion() {
        use Builtin::*;
        let fold = app(builtin(NaturalFold), vec![var("n")]);
        assert_eq!(apply(NaturalBuild, vec![fold]), Some(var("n")));

        let fold = app(builtin(ListFold), vec![nat(), var("l")]);
        assert_eq!(apply(ListBuild, vec![nat(), fold]), Some(var("l")));

        let fold = app(builtin(OptionalFold), vec![nat(), var("o")]);
        assert_eq!(apply(OptionalBuild, vec![nat(), fold]), Some(var("o")));
    }

    #[test]
    fn builds_instantiate_constructors() {
        use Builtin::*;
        // λ(list : Type) → λ(cons : Natural → list → list) → λ(nil : list) → cons 1 nil
        let g = lam(
            "list",
            rc(ExprKind::Const(Const::Type)),
            lam(
                "cons",
                fn_type(vec![nat(), var("list")], var("list")),
                lam(
                    "nil",
                    var("list"),
                    app(var("cons"), vec![natural_lit(1), var("nil")]),
                ),
            ),
        );
        assert_eq!(
            apply(ListBuild, vec![nat(), g]),
            Some(make_list(vec![natural_lit(1)]))
        );

        // λ(natural : Type) → λ(succ : natural → natural) → λ(zero : natural) → succ (succ zero)
        let g = lam(
            "natural",
            rc(ExprKind::Const(Const::Type)),
            lam(
                "succ",
                fn_type(vec![var("natural")], var("natural")),
                lam(
                    "zero",
                    var("natural"),
                    app(var("succ"), vec![app(var("succ"), vec![var("zero")])]),
                ),
            ),
        );
        assert_eq!(apply(NaturalBuild, vec![g]), Some(natural_lit(2)));

        // λ(optional : Type) → λ(some : Natural → optional) → λ(none : optional) → none
        let g = lam(
            "optional",
            rc(ExprKind::Const(Const::Type)),
            lam(
                "some",
                fn_type(vec![nat()], var("optional")),
                lam("none", var("optional"), var("none")),
            ),
        );
        assert_eq!(apply(OptionalBuild, vec![nat(), g]), Some(none_of(&nat())));
    }

    #[test]
    fn cons_shifts_the_element_type() {
        // The element type `a` is captured by the cons binder of the same name.
        let cons = list_cons(&var("a"));
        let expected = lam(
            "a",
            var("a"),
            lam(
                "as",
                list_of(&var_at("a", 1)),
                binop(BinOp::ListAppend, make_list(vec![var("a")]), var("as")),
            ),
        );
        assert_eq_pretty!(cons, expected);
    }
}
