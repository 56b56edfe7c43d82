mod expr;
pub use expr::*;
mod import;
pub use import::*;
mod label;
pub use label::*;
mod text;
pub use text::*;
pub mod visitor;
