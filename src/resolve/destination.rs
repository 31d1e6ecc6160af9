use tracing::warn;

use super::resolve_filenames;
use crate::app::applications::{App, Target};
use crate::config::{CompilerConfig, ContextNames};
use crate::constants::START_EXTEN;
use crate::dialplan::naming::{announcement_context, ivr_context};
use crate::model::{Destination, DestinationKind, EntityId, Recording, RecordingRef};

/// The single routing step for "what happens next".
///
/// | kind | step |
/// |---|---|
/// | `hangup`, `none`, unset | `Hangup()` |
/// | `extension` | `Goto(<extensions>,<id>,1)` |
/// | `queue` | `Goto(<queues>,<id>,1)` |
/// | `ivr` | `Goto(ivr_<id>,s,1)` |
/// | `announcement` | `Goto(announcement_<id>,s,1)` |
/// | anything else | `Hangup()` |
///
/// Kinds that need a target but carry an empty id also hang up.
pub fn goto_for(destination: &Destination, contexts: &ContextNames) -> App {
    let target = destination.target();
    let needs_target = matches!(
        destination.kind,
        DestinationKind::Extension
            | DestinationKind::Queue
            | DestinationKind::Ivr
            | DestinationKind::Announcement
    );
    if needs_target && target.is_empty() {
        warn!("{} destination without a target, hanging up", destination.kind);
        return App::Hangup;
    }

    match &destination.kind {
        DestinationKind::Hangup | DestinationKind::None => App::Hangup,
        DestinationKind::Extension => App::goto(Target::start(&contexts.extensions, target)),
        DestinationKind::Queue => App::goto(Target::start(&contexts.queues, target)),
        DestinationKind::Ivr => App::goto(Target::start(
            ivr_context(&EntityId::new(target)),
            START_EXTEN,
        )),
        DestinationKind::Announcement => App::goto(Target::start(
            announcement_context(&EntityId::new(target)),
            START_EXTEN,
        )),
        DestinationKind::Recording | DestinationKind::Unknown(_) => App::Hangup,
    }
}

/// Return-to-self: back to the start of the IVR currently being generated.
pub fn goto_self(current: &EntityId) -> App {
    App::goto(Target::start(ivr_context(current), START_EXTEN))
}

/// Compile-pass view shared by the generators: configuration plus the
/// recordings snapshot.
#[derive(Debug, Clone, Copy)]
pub struct Resolver<'a> {
    pub config: &'a CompilerConfig,
    pub recordings: &'a [Recording],
}

impl<'a> Resolver<'a> {
    pub fn new(config: &'a CompilerConfig, recordings: &'a [Recording]) -> Self {
        Self { config, recordings }
    }

    pub fn goto(&self, destination: &Destination) -> App {
        goto_for(destination, &self.config.contexts)
    }

    /// `goto` for an optional destination; `None` means hang up.
    pub fn goto_opt(&self, destination: Option<&Destination>) -> App {
        destination
            .map(|d| self.goto(d))
            .unwrap_or(App::Hangup)
    }

    pub fn files(&self, reference: Option<&RecordingRef>) -> Vec<String> {
        resolve_filenames(
            reference,
            self.recordings,
            &self.config.recording_namespace,
        )
    }

    /// `Dial(<tech>/<extension>,<ring seconds>)`
    pub fn dial(&self, extension: &str) -> App {
        App::dial(self.config.device(extension), self.config.ring_seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contexts() -> ContextNames {
        ContextNames::default()
    }

    #[test]
    fn dispatch_table() {
        let c = contexts();
        assert_eq!(goto_for(&Destination::hangup(), &c), App::Hangup);
        assert_eq!(goto_for(&Destination::default(), &c), App::Hangup);
        assert_eq!(
            goto_for(&Destination::extension("1001"), &c).to_string(),
            "Goto(internal,1001,1)"
        );
        assert_eq!(
            goto_for(&Destination::queue("Q1"), &c).to_string(),
            "Goto(queues,Q1,1)"
        );
        assert_eq!(
            goto_for(&Destination::ivr("main"), &c).to_string(),
            "Goto(ivr_main,s,1)"
        );
        assert_eq!(
            goto_for(&Destination::announcement("a1"), &c).to_string(),
            "Goto(announcement_a1,s,1)"
        );
    }

    #[test]
    fn unsupported_kinds_hang_up() {
        let c = contexts();
        assert_eq!(goto_for(&Destination::recording("r1"), &c), App::Hangup);
        let unknown = Destination::new(DestinationKind::Unknown("conference".into()), "9");
        assert_eq!(goto_for(&unknown, &c), App::Hangup);
    }

    #[test]
    fn empty_target_hangs_up() {
        let dest = Destination {
            kind: DestinationKind::Queue,
            id: None,
        };
        assert_eq!(goto_for(&dest, &contexts()), App::Hangup);
    }

    #[test]
    fn ivr_target_is_sanitized_like_its_context() {
        let c = contexts();
        assert_eq!(
            goto_for(&Destination::ivr("after hours"), &c).to_string(),
            "Goto(ivr_after_hours,s,1)"
        );
        assert_eq!(
            goto_self(&EntityId::new("after hours")).to_string(),
            "Goto(ivr_after_hours,s,1)"
        );
    }

    #[test]
    fn honours_configured_context_names() {
        let cfg = CompilerConfig {
            contexts: ContextNames {
                extensions: "from-internal".into(),
                queues: "ext-queues".into(),
                ..Default::default()
            },
            ..Default::default()
        };
        let resolver = Resolver::new(&cfg, &[]);
        assert_eq!(
            resolver
                .goto(&Destination::extension("200"))
                .to_string(),
            "Goto(from-internal,200,1)"
        );
        assert_eq!(
            resolver
                .goto(&Destination::queue("400"))
                .to_string(),
            "Goto(ext-queues,400,1)"
        );
        assert_eq!(resolver.goto_opt(None), App::Hangup);
    }
}
