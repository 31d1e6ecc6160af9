//! Feature codes (`*65`, `*97`, ...) bound in one flat context.

use std::collections::HashSet;

use tracing::{debug, warn};

use super::playback_steps;
use crate::app::applications::App;
use crate::dialplan::naming::is_dial_pattern;
use crate::dialplan::{ContextBlock, Generated, Line, Step};
use crate::model::{DestinationKind, MiscApplication, RecordingRef};
use crate::resolve::Resolver;

/// The single action a feature code performs between `Answer()` and `Hangup()`.
fn action_steps(app: &MiscApplication, resolver: &Resolver<'_>) -> Vec<Step> {
    let dest = &app.destination;
    match &dest.kind {
        DestinationKind::Extension if !dest.target().is_empty() => {
            vec![Step::new(resolver.dial(dest.target()))]
        }
        DestinationKind::Queue | DestinationKind::Ivr | DestinationKind::Announcement => {
            vec![Step::new(resolver.goto(dest))]
        }
        DestinationKind::Recording => {
            let reference = dest
                .id
                .clone()
                .map(RecordingRef::new);
            let files = resolver.files(reference.as_ref());
            if files.is_empty() {
                warn!(
                    "Misc application {:?}: recording {} not found",
                    app.name,
                    dest.target()
                );
            }
            playback_steps(&files, &format!("recording {}", dest.target()), |f| {
                App::playback(f)
            })
        }
        DestinationKind::Hangup | DestinationKind::None => Vec::new(),
        DestinationKind::Extension | DestinationKind::Unknown(_) => {
            warn!(
                "Misc application {:?}: unsupported destination {} {:?}",
                app.name,
                dest.kind,
                dest.target()
            );
            vec![Step::new(App::noop(format!(
                "Unsupported destination {} {}",
                dest.kind,
                dest.target()
            )))]
        }
    }
}

/// Flat context of feature codes plus one `include` binding for it.
///
/// Each code answers, performs its action and hangs up. Blank codes are
/// skipped, and only the first application claiming a code is kept.
pub fn generate_misc_applications(apps: &[MiscApplication], resolver: &Resolver<'_>) -> Generated {
    let context = &resolver.config.contexts.misc_applications;
    let mut block = ContextBlock::new(context);
    let mut seen = HashSet::new();

    for app in apps {
        let code = app
            .feature_code
            .trim();
        if code.is_empty() {
            warn!("Misc application {:?} has no feature code, skipping", app.name);
            continue;
        }
        if !is_dial_pattern(code) {
            warn!(
                "Misc application {:?}: feature code {:?} is not dialable, skipping",
                app.name, code
            );
            continue;
        }
        if !seen.insert(code) {
            warn!(
                "Feature code {} already bound, skipping {:?}",
                code, app.name
            );
            continue;
        }
        debug!("Misc application {:?} on {}", app.name, code);

        let mut steps = vec![
            Step::new(App::noop(format!("Misc application: {}", app.name))),
            Step::new(App::Answer),
        ];
        steps.extend(action_steps(app, resolver));
        steps.push(Step::new(App::Hangup));

        if !app
            .name
            .trim()
            .is_empty()
        {
            block.comment(app.name.trim());
        }
        block.extension(code, steps);
    }

    if seen.is_empty() {
        return Generated::default();
    }
    Generated {
        blocks: vec![block],
        bindings: vec![Line::include(context)],
    }
}
