//! Dialplan applications: the right-hand side of every `exten =>` and
//! `same =>` line.
//!
//! Each [`App`] renders itself in Asterisk's `Name(args)` syntax through
//! [`Display`](std::fmt::Display).

pub mod applications;
