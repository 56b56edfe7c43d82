#![doc(html_root_url = "https://docs.rs/dhall_semantics/0.1.0")]
#![allow(
    clippy::type_complexity,
    clippy::infallible_destructuring_match,
    clippy::many_single_char_names,
    clippy::match_like_matches_macro
)]

//! The semantic core of the [Dhall][dhall] configuration language: the expression tree, the
//! variable machinery, the normalizer and judgmental equality.
//!
//! Parsing, import resolution and type-checking live elsewhere. This crate expects expressions
//! that have already been through those phases: no imports left, and well-typed.
//!
//! ```
//! use dhall_semantics::syntax::*;
//! use dhall_semantics::semantics::normalize;
//!
//! // (λ(x : Natural) → x + 1) 5
//! let f = lam(
//!     "x",
//!     builtin(Builtin::Natural),
//!     binop(BinOp::NaturalPlus, var("x"), natural_lit(1)),
//! );
//! let e = app(f, vec![natural_lit(5)]);
//! assert_eq!(normalize(&e).to_string(), "6");
//! ```
//!
//! Expressions are immutable and cheap to clone; rewriting builds new nodes and shares the
//! untouched subtrees, so the same expression can be normalized from several threads at once.
//!
//! [dhall]: https://dhall-lang.org/

pub mod error;
pub mod semantics;
pub mod syntax;

pub use semantics::{alpha_normalize, judgmentally_equal, normalize};
pub use syntax::Expr;
