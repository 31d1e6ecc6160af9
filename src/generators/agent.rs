//! Direct dial bindings for agents.

use tracing::{debug, warn};

use crate::app::applications::App;
use crate::dialplan::naming::is_dial_pattern;
use crate::dialplan::{ContextBlock, Generated};
use crate::model::Agent;
use crate::resolve::Resolver;

/// `exten => <ext>,1,Dial(<tech>/<ext>,<ring>)` then `Hangup()` per agent.
///
/// Agents without a dialable extension are skipped. Agent bindings have no context
/// block of their own.
pub fn generate_agents(agents: &[Agent], resolver: &Resolver<'_>) -> Generated {
    let mut scratch = ContextBlock::new(&resolver.config.contexts.bindings);
    for agent in agents {
        let Some(ext) = agent.extension() else {
            debug!("Skipping agent {:?}: no extension assigned", agent.display_name);
            continue;
        };
        if !is_dial_pattern(ext) {
            warn!("Skipping agent {:?}: extension {:?} is not dialable", agent.display_name, ext);
            continue;
        }
        scratch.extension(ext, [resolver.dial(ext), App::Hangup]);
    }

    Generated {
        blocks: Vec::new(),
        bindings: scratch.lines,
    }
}
