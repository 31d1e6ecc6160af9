//! Shared resolution steps every generator goes through.

mod destination;
mod recording;

pub use destination::{goto_for, goto_self, Resolver};
pub use recording::{normalize_filename, resolve_filenames};
