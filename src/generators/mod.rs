//! One generator per entity kind.
//!
//! Every generator is a pure function of its entities and the [`Resolver`]
//! and returns [`Generated`]: the context blocks it owns plus the binding
//! lines that expose them in the top-level dial context.
//!
//! [`Resolver`]: crate::resolve::Resolver
//! [`Generated`]: crate::dialplan::Generated

pub mod agent;
pub mod announcement;
pub mod ivr;
pub mod misc;
pub mod monitor;

pub use agent::generate_agents;
pub use announcement::generate_announcements;
pub use ivr::generate_ivrs;
pub use misc::generate_misc_applications;
pub use monitor::generate_monitoring;

use crate::app::applications::App;
use crate::dialplan::Step;

/// Play every file in order; a diagnostic no-op when there is nothing to play.
pub(crate) fn playback_steps<F>(files: &[String], what: &str, play: F) -> Vec<Step>
where
    F: Fn(&str) -> App,
{
    if files.is_empty() {
        return vec![Step::new(App::noop(format!("No recording found for {}", what)))];
    }
    files
        .iter()
        .map(|file| Step::new(play(file)))
        .collect()
}
