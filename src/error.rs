use crate::syntax::{Expr, Import, Label, V};

/// A broken precondition of the semantic core.
///
/// These never surface as `Err`: each one means an earlier phase (parsing, import
/// resolution, type-checking) let through something it should have rejected. See [`fatal`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvariantViolation {
    /// Shifting `var` by `delta` would make its index negative.
    NegativeShift { var: V, delta: isize },
    /// An import reached a phase that expects resolved expressions.
    UnresolvedImport(Import),
    /// `∧` found a field that is not a record literal on both sides.
    RecordMergeMismatch { field: Label, left: Expr, right: Expr },
    /// `⩓` found a field whose types are neither record types nor equal.
    RecordTypeMergeMismatch { field: Label, left: Expr, right: Expr },
    EmptyLet,
    EmptyList,
}

impl std::fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        use InvariantViolation::*;
        match self {
            NegativeShift { var, delta } => write!(
                f,
                "shift: shifting {} by {} gives a negative index",
                var, delta
            ),
            UnresolvedImport(i) => {
                write!(f, "normalize: unresolved import {}", i)
            }
            RecordMergeMismatch { field, left, right } => write!(
                f,
                "∧: cannot merge field `{}`: {} and {} are not both records",
                field, left, right
            ),
            RecordTypeMergeMismatch { field, left, right } => write!(
                f,
                "⩓: cannot merge field `{}`: types {} and {} are incompatible",
                field, left, right
            ),
            EmptyLet => write!(f, "let: empty let has no bindings"),
            EmptyList => write!(
                f,
                "list: an empty list literal needs an annotation"
            ),
        }
    }
}

impl std::error::Error for InvariantViolation {}

/// Abort on a violated invariant.
#[track_caller]
pub fn fatal(err: InvariantViolation) -> ! {
    panic!("internal error: {}", err)
}
