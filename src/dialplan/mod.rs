//! Line-oriented dialplan model.
//!
//! A [`ContextBlock`] is a bracketed context header followed by [`Line`]s.
//! Generators push [`Step`]s per extension; the first step of an extension
//! renders as a numbered-priority line and the rest as `same => n` lines.

mod block;
mod line;
pub mod naming;

pub use block::{ContextBlock, Generated};
pub use line::{Line, Step};
