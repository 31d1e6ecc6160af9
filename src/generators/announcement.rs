//! Announcements: play a recording, then move the caller on.
//!
//! ```text
//! [announcement_<id>]
//! exten => s,1,NoOp(Announcement: <description>)
//!  same => n,Answer()                          ; Progress() when not answering
//!  same => n,Wait(1)
//!  same => n,Set(TIMEOUT(response)=5)          ; repeat armed only
//!  same => n(play),Background(custom/<file>)   ; Playback(..,noanswer) when not interruptible
//!  same => n,WaitExten()                       ; repeat armed; otherwise the exit steps
//! exten => <repeat digit>,1,Goto(s,play)
//! exten => _[0-9*#],1,<exit>                   ; skip allowed only
//! exten => t,1,<exit>
//! exten => i,1,<exit>
//! exten => fax,1,Goto(<FAX_DEST split on ^>)
//! ```

use tracing::{debug, warn};

use super::playback_steps;
use crate::app::applications::{App, Target};
use crate::constants::{
    FAX_DEST_VAR, IVR_CONTEXT_VAR, REPEAT_RESPONSE_TIMEOUT, RETURN_EXTEN, START_EXTEN,
};
use crate::dialplan::naming::{announcement_context, is_dial_pattern};
use crate::dialplan::{ContextBlock, Generated, Step};
use crate::model::{Announcement, Destination};
use crate::resolve::Resolver;

/// Pattern matching any single DTMF key pressed to skip playback.
pub const SKIP_PATTERN: &str = "_[0-9*#]";

const PLAY_LABEL: &str = "play";

/// Steps that leave the announcement: back to the calling IVR when asked
/// and one is known, else the post-playback destination.
fn exit_steps(ann: &Announcement, resolver: &Resolver<'_>) -> Vec<Step> {
    let mut steps = Vec::new();
    if ann
        .return_to_ivr
        .is_yes()
    {
        let var = format!("${{{}}}", IVR_CONTEXT_VAR);
        steps.push(Step::new(App::goto_if(
            format!("$[\"{}\" != \"\"]", var),
            Target::expression(var, RETURN_EXTEN, "1"),
        )));
    }
    steps.push(Step::new(resolver.goto(&ann.destination_after_playback)));
    steps
}

fn fax_target() -> Target {
    let part = |n: u8| format!("${{CUT({},^,{})}}", FAX_DEST_VAR, n);
    Target::expression(part(1), part(2), part(3))
}

fn announcement_block(ann: &Announcement, resolver: &Resolver<'_>) -> ContextBlock {
    let context = announcement_context(&ann.id);
    let repeat_digit = ann
        .repeat
        .digit()
        .filter(|digit| {
            let dialable = is_dial_pattern(digit);
            if !dialable {
                warn!("Announcement {}: repeat digit {:?} is not dialable, ignoring", ann.id, digit);
            }
            dialable
        });
    let skippable = ann
        .allow_skip
        .is_yes();
    let interruptible = skippable || repeat_digit.is_some();
    let dont_answer = ann
        .dont_answer_channel
        .is_yes();

    let mut block = ContextBlock::new(&context);
    if !ann
        .description
        .trim()
        .is_empty()
    {
        block.comment(ann.description.trim());
    }

    let mut main = vec![Step::new(App::noop(format!(
        "Announcement: {}",
        ann.description
    )))];
    if dont_answer {
        main.push(Step::new(App::Progress));
    } else {
        main.push(Step::new(App::Answer));
        main.push(Step::new(App::Wait(1)));
    }
    if repeat_digit.is_some() {
        main.push(Step::new(App::set(
            "TIMEOUT(response)",
            REPEAT_RESPONSE_TIMEOUT.to_string(),
        )));
    }

    let files = resolver.files(
        ann.recording
            .as_ref(),
    );
    if files.is_empty() {
        warn!(
            "Announcement {} ({:?}) has no playable recording",
            ann.id, ann.description
        );
    }
    let mut playback = playback_steps(&files, &format!("announcement {}", ann.id), |file| {
        if interruptible {
            let app = App::background(file);
            if dont_answer {
                app.with_options("n")
            } else {
                app
            }
        } else {
            App::playback(file).with_options("noanswer")
        }
    });
    if let Some(first) = playback.first_mut() {
        first.label = Some(PLAY_LABEL.to_string());
    }
    main.extend(playback);

    if repeat_digit.is_some() {
        main.push(Step::new(App::WaitExten(None)));
    } else {
        main.extend(exit_steps(ann, resolver));
    }
    block.extension(START_EXTEN, main);

    if let Some(digit) = repeat_digit {
        block.extension(digit, [App::goto(Target::local(START_EXTEN, PLAY_LABEL))]);
    }
    if skippable {
        block.extension(SKIP_PATTERN, exit_steps(ann, resolver));
    }
    block.extension("t", exit_steps(ann, resolver));
    block.extension("i", exit_steps(ann, resolver));
    block.extension("fax", [App::goto(fax_target())]);
    block
}

/// Context block per active announcement, plus a dial binding for those with
/// an extension.
pub fn generate_announcements(announcements: &[Announcement], resolver: &Resolver<'_>) -> Generated {
    let mut out = Generated::default();
    let mut bindings = ContextBlock::new(&resolver.config.contexts.bindings);

    for ann in announcements {
        if !ann.is_active {
            debug!("Skipping inactive announcement {}", ann.id);
            continue;
        }
        debug!("Generating announcement {} ({:?})", ann.id, ann.description);
        out.blocks
            .push(announcement_block(ann, resolver));

        match ann.dial_code() {
            Some(code) if !is_dial_pattern(code) => {
                warn!("Announcement {}: extension {:?} is not dialable, not binding", ann.id, code);
            }
            Some(code) => {
                bindings.extension(
                    code,
                    [resolver.goto(&Destination::announcement(ann.id.clone()))],
                );
            }
            None => {}
        }
    }

    out.bindings = bindings.lines;
    out
}
