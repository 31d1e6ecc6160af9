//! Agent status tracking.
//!
//! A store is injected wherever status is needed instead of living in a
//! process-wide map; [`AgentStatusTracker`] keeps it current from AMI queue
//! events.

pub mod store;
pub mod tracker;

pub use store::{AgentState, AgentStatus, AgentStatusStore, InMemoryAgentStatusStore};
pub use tracker::{extension_of, AgentStatusTracker};
