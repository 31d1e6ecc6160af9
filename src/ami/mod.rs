//! Minimal Asterisk Manager Interface client.
//!
//! Enough of the protocol to log in, run `dialplan reload` after a deploy and
//! follow queue events for agent status tracking.

pub mod action;
pub mod connection;
pub mod event;

pub(crate) mod protocol;

pub use action::{Action, AmiResponse};
pub use connection::AmiConnection;
pub use event::{AmiEvent, AmiEventType};
