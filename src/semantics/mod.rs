mod alpha;
mod builtins;
mod normalize;
mod var;

pub use alpha::*;
pub(crate) use builtins::apply_builtin;
pub use normalize::*;
pub use var::*;
