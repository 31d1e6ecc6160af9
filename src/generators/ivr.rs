//! IVR menus.
//!
//! Each menu compiles to its own context with the states
//! Entry → Play Prompt → Await Digit → {Dispatch(digit) | Invalid | Timeout}:
//!
//! ```text
//! [ivr_<id>]
//! exten => s,1,NoOp(IVR: <name>)
//!  same => n,Set(__IVR_CONTEXT=${CONTEXT})
//!  same => n,Answer()
//!  same => n,Set(TIMEOUT(digit)=3)
//!  same => n,Set(TIMEOUT(response)=10)
//!  same => n(prompt),Background(custom/<prompt>)
//!  same => n,WaitExten(10)
//! exten => 1,1,Dial(PJSIP/1000,30)
//!  same => n,Hangup()
//! exten => i,1,...
//! exten => t,1,...
//! exten => return,1,Goto(ivr_<id>,s,1)
//! ```
//!
//! The menu is exposed with `include => ivr_<id>`.

use std::collections::HashSet;

use tracing::{debug, warn};

use super::playback_steps;
use crate::app::applications::{escape, App, Target};
use crate::constants::{DEFAULT_TONE, IVR_CONTEXT_VAR, RETURN_EXTEN, START_EXTEN, VOICEMAIL_CONTEXT};
use crate::dialplan::naming::{counter_var, is_dial_pattern, ivr_context};
use crate::dialplan::{ContextBlock, Generated, Line, Step};
use crate::model::{
    Destination, DtmfConfig, IvrEntry, IvrEntryKind, IvrMenu, RecordingRef, YesNo,
};
use crate::resolve::{goto_self, Resolver};

const PROMPT_LABEL: &str = "prompt";

/// Invalid-input or timeout handling, parameterised by outcome.
struct Fallback<'a> {
    exten: &'static str,
    what: &'static str,
    append_prompt: YesNo,
    retry_recording: Option<&'a RecordingRef>,
    recording: Option<&'a RecordingRef>,
    destination: Option<&'a Destination>,
    return_to_self: YesNo,
    retries: u32,
}

impl<'a> Fallback<'a> {
    fn invalid(dtmf: &'a DtmfConfig) -> Self {
        Self {
            exten: "i",
            what: "invalid",
            append_prompt: dtmf.append_announcement_to_invalid,
            retry_recording: dtmf
                .invalid_retry_recording
                .as_ref(),
            recording: dtmf
                .invalid_recording
                .as_ref(),
            destination: dtmf
                .invalid_destination
                .as_ref(),
            return_to_self: dtmf.return_on_invalid,
            retries: dtmf.invalid_retries,
        }
    }

    fn timeout(dtmf: &'a DtmfConfig) -> Self {
        Self {
            exten: "t",
            what: "timeout",
            append_prompt: dtmf.append_announcement_to_timeout,
            retry_recording: dtmf
                .timeout_retry_recording
                .as_ref(),
            recording: dtmf
                .timeout_recording
                .as_ref(),
            destination: dtmf
                .timeout_destination
                .as_ref(),
            return_to_self: dtmf.return_on_timeout,
            retries: dtmf.timeout_retries,
        }
    }
}

/// Generation state for one menu.
struct MenuCompiler<'r, 'a> {
    ivr: &'a IvrMenu,
    resolver: &'r Resolver<'a>,
    context: String,
}

impl<'r, 'a> MenuCompiler<'r, 'a> {
    fn new(ivr: &'a IvrMenu, resolver: &'r Resolver<'a>) -> Self {
        Self {
            ivr,
            resolver,
            context: ivr_context(&ivr.id),
        }
    }

    fn prompt_files(&self) -> Vec<String> {
        self.resolver
            .files(
                self.ivr
                    .dtmf
                    .announcement
                    .as_ref(),
            )
    }

    fn prompt_steps(&self) -> Vec<Step> {
        playback_steps(
            &self.prompt_files(),
            &format!("IVR {} prompt", self.ivr.id),
            |f| App::background(f),
        )
    }

    fn entry_steps(&self) -> Vec<Step> {
        let dtmf = &self
            .ivr
            .dtmf;
        let mut steps = vec![
            Step::new(App::noop(format!("IVR: {}", self.ivr.name))),
            Step::new(App::set(
                format!("__{}", IVR_CONTEXT_VAR),
                "${CONTEXT}",
            )),
            Step::new(App::Answer),
            Step::new(App::set("TIMEOUT(digit)", dtmf.digit_timeout.to_string())),
            Step::new(App::set("TIMEOUT(response)", dtmf.timeout.to_string())),
        ];
        if let Some(alert) = configured(dtmf.alert_info.as_deref()) {
            steps.push(Step::new(App::set(
                "PJSIP_HEADER(add,Alert-Info)",
                escape(alert),
            )));
        }
        if let Some(volume) = configured(dtmf.ringer_volume_override.as_deref()) {
            steps.push(Step::new(App::set("__RVOL", escape(volume))));
        }

        let mut prompt = self.prompt_steps();
        if let Some(first) = prompt.first_mut() {
            first.label = Some(PROMPT_LABEL.to_string());
        }
        steps.extend(prompt);
        steps.push(Step::new(App::WaitExten(Some(dtmf.timeout))));
        steps
    }

    /// Type-specific action followed by the implicit hangup, except for
    /// `ivr`, `recording` and a voicemail that returns to the menu.
    fn dispatch_steps(&self, entry: &IvrEntry) -> Vec<Step> {
        let value = entry
            .value
            .trim();
        let needs_value = !matches!(
            entry.kind,
            IvrEntryKind::Hangup | IvrEntryKind::Unknown(_)
        );
        if needs_value && value.is_empty() {
            warn!(
                "IVR {} digit {}: {} entry without a value",
                self.ivr.id,
                entry.digit,
                entry
                    .kind
                    .as_str()
            );
            return vec![
                Step::new(App::noop(format!(
                    "IVR entry {} has no {} target",
                    entry.digit,
                    entry
                        .kind
                        .as_str()
                ))),
                Step::new(App::Hangup),
            ];
        }

        match &entry.kind {
            IvrEntryKind::Extension => vec![
                Step::new(
                    self.resolver
                        .dial(value),
                ),
                Step::new(App::Hangup),
            ],
            IvrEntryKind::Queue => vec![
                Step::new(
                    self.resolver
                        .goto(&Destination::queue(value)),
                ),
                Step::new(App::Hangup),
            ],
            IvrEntryKind::Ivr => vec![Step::new(
                self.resolver
                    .goto(&Destination::ivr(value)),
            )],
            IvrEntryKind::Recording => {
                let files = self
                    .resolver
                    .files(Some(&RecordingRef::new(value)));
                if files.is_empty() {
                    warn!(
                        "IVR {} digit {}: recording {} not found",
                        self.ivr.id, entry.digit, value
                    );
                }
                playback_steps(&files, &format!("recording {}", value), |f| {
                    App::playback(f)
                })
            }
            IvrEntryKind::Voicemail => {
                let mut steps = vec![Step::new(
                    App::voicemail(format!("{}@{}", value, VOICEMAIL_CONTEXT)).with_options("u"),
                )];
                if self
                    .ivr
                    .dtmf
                    .return_to_ivr_after_vm
                    .is_yes()
                {
                    steps.push(Step::new(goto_self(&self.ivr.id)));
                } else {
                    steps.push(Step::new(App::Hangup));
                }
                steps
            }
            IvrEntryKind::Hangup => vec![Step::new(App::Hangup)],
            IvrEntryKind::Unknown(kind) => {
                warn!(
                    "IVR {} digit {}: unsupported entry type {:?}",
                    self.ivr.id, entry.digit, kind
                );
                vec![
                    Step::new(App::noop(format!("Unsupported IVR entry type {}", kind))),
                    Step::new(App::Hangup),
                ]
            }
        }
    }

    /// Shared shape of the `i` and `t` handlers.
    ///
    /// Exit precedence: return-to-self, then the explicit destination, then
    /// hangup. With retries configured, return-to-self loops at most that many
    /// times and then hangs up.
    fn fallback_steps(&self, fb: &Fallback<'_>) -> Vec<Step> {
        let counter = counter_var(&self.context, &fb.what.to_ascii_uppercase());
        let counted = fb
            .return_to_self
            .is_yes()
            && fb.retries > 0;

        let mut steps = vec![Step::new(App::noop(format!(
            "IVR {}: {} input",
            self.ivr.name, fb.what
        )))];
        if counted {
            steps.push(Step::new(App::set(
                &counter,
                format!("$[0${{{}}} + 1]", counter),
            )));
        }
        if fb
            .append_prompt
            .is_yes()
        {
            steps.extend(self.prompt_steps());
        }

        let retry = self
            .resolver
            .files(fb.retry_recording);
        let files = if retry.is_empty() {
            self.resolver
                .files(fb.recording)
        } else {
            retry
        };
        if files.is_empty() {
            steps.push(Step::new(App::noop(format!(
                "No {} recording configured",
                fb.what
            ))));
            steps.push(Step::new(App::playback(DEFAULT_TONE)));
        } else {
            steps.extend(
                files
                    .iter()
                    .map(|f| Step::new(App::playback(f))),
            );
        }

        if fb
            .return_to_self
            .is_yes()
        {
            if counted {
                steps.push(Step::new(App::goto_if(
                    format!("$[${{{}}} <= {}]", counter, fb.retries),
                    Target::start(&self.context, START_EXTEN),
                )));
                steps.push(Step::new(App::Hangup));
            } else {
                steps.push(Step::new(goto_self(&self.ivr.id)));
            }
        } else if let Some(dest) = fb
            .destination
            .filter(|d| d.is_set())
        {
            steps.push(Step::new(
                self.resolver
                    .goto(dest),
            ));
        } else {
            steps.push(Step::new(App::Hangup));
        }
        steps
    }

    fn compile(&self) -> ContextBlock {
        let mut block = ContextBlock::new(&self.context);
        if !self
            .ivr
            .name
            .trim()
            .is_empty()
        {
            block.comment(format!("IVR {}", self.ivr.name.trim()));
        }
        if self
            .prompt_files()
            .is_empty()
        {
            warn!("IVR {} has no playable prompt", self.ivr.id);
        }
        block.extension(START_EXTEN, self.entry_steps());

        let mut digits = Vec::new();
        for entry in &self.ivr.entries {
            let digit = entry
                .digit
                .trim();
            if digit.is_empty() {
                warn!("IVR {}: entry without a digit, skipping", self.ivr.id);
                continue;
            }
            if !is_dial_pattern(digit) {
                warn!("IVR {}: digit {:?} is not dialable, skipping", self.ivr.id, digit);
                continue;
            }
            if digits.contains(&digit) {
                warn!("IVR {}: digit {} defined twice, keeping the first", self.ivr.id, digit);
                continue;
            }
            if !entry
                .label
                .trim()
                .is_empty()
            {
                block.comment(format!("{}: {}", digit, entry.label.trim()));
            }
            digits.push(digit);
            block.extension(digit, self.dispatch_steps(entry));
        }

        if self
            .ivr
            .dtmf
            .ignore_trailing_key
            .is_yes()
        {
            for digit in digits
                .iter()
                .filter(|d| !d.ends_with('#'))
            {
                block.extension(
                    &format!("{}#", digit),
                    [App::goto(Target::start(&self.context, *digit))],
                );
            }
        }

        for fallback in [
            Fallback::invalid(&self.ivr.dtmf),
            Fallback::timeout(&self.ivr.dtmf),
        ] {
            block.extension(fallback.exten, self.fallback_steps(&fallback));
        }
        block.extension(RETURN_EXTEN, [goto_self(&self.ivr.id)]);
        block
    }
}

/// `None` for unset, blank, `None` or `default` settings.
fn configured(value: Option<&str>) -> Option<&str> {
    value
        .map(str::trim)
        .filter(|v| {
            !v.is_empty() && !v.eq_ignore_ascii_case("none") && !v.eq_ignore_ascii_case("default")
        })
}

/// Context block per menu plus an `include` binding for each.
///
/// Menus whose ids collapse to an already generated context name are
/// skipped so every name stays unique.
pub fn generate_ivrs(ivrs: &[IvrMenu], resolver: &Resolver<'_>) -> Generated {
    let mut out = Generated::default();
    let mut seen = HashSet::new();

    for ivr in ivrs {
        let compiler = MenuCompiler::new(ivr, resolver);
        if !seen.insert(
            compiler
                .context
                .clone(),
        ) {
            warn!(
                "IVR {} maps to context {} which is already generated, skipping",
                ivr.id, compiler.context
            );
            continue;
        }
        debug!(
            "Generating IVR {} ({:?}) with {} entries",
            ivr.id,
            ivr.name,
            ivr.entries
                .len()
        );
        let block = compiler.compile();
        out.bindings
            .push(Line::include(&block.name));
        out.blocks
            .push(block);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CompilerConfig;
    use crate::model::Recording;

    fn entry(digit: &str, kind: IvrEntryKind, value: &str) -> IvrEntry {
        IvrEntry::new(digit, kind, value)
    }

    fn menu(entries: Vec<IvrEntry>) -> IvrMenu {
        IvrMenu {
            id: "X".into(),
            name: "Main".into(),
            entries,
            dtmf: DtmfConfig {
                announcement: Some(RecordingRef::new("welcome")),
                ..Default::default()
            },
        }
    }

    fn recordings() -> Vec<Recording> {
        vec![
            Recording::new("welcome", &["/up/welcome.wav"]),
            Recording::new("bad", &["/up/invalid.wav"]),
            Recording::new("bad-retry", &["/up/try-again.wav"]),
            Recording::new("promo", &["/up/promo1.wav", "/up/promo2.wav"]),
        ]
    }

    fn render(ivr: IvrMenu) -> ContextBlock {
        let cfg = CompilerConfig::default();
        let recs = recordings();
        let out = generate_ivrs(&[ivr], &Resolver::new(&cfg, &recs));
        out.blocks
            .into_iter()
            .next()
            .unwrap()
    }

    #[test]
    fn entry_state_sets_timeouts_and_plays_prompt() {
        let mut ivr = menu(vec![]);
        ivr.dtmf.timeout = 7;
        ivr.dtmf.digit_timeout = 2;
        let block = render(ivr);
        let text = block.to_string();
        assert!(text.starts_with("[ivr_X]\n; IVR Main\nexten => s,1,NoOp(IVR: Main)\n"));
        assert!(text.contains(" same => n,Set(__IVR_CONTEXT=${CONTEXT})\n"));
        assert!(text.contains(" same => n,Set(TIMEOUT(digit)=2)\n"));
        assert!(text.contains(" same => n,Set(TIMEOUT(response)=7)\n"));
        assert!(text.contains(" same => n(prompt),Background(custom/welcome)\n same => n,WaitExten(7)\n"));
        assert!(!text.contains("Alert-Info"));
        assert!(!text.contains("RVOL"));
    }

    #[test]
    fn optional_headers_only_when_configured() {
        let mut ivr = menu(vec![]);
        ivr.dtmf.alert_info = Some("<http://x>;info=ring2".into());
        ivr.dtmf.ringer_volume_override = Some("None".into());
        let text = render(ivr).to_string();
        assert!(text.contains("Set(PJSIP_HEADER(add,Alert-Info)=<http://x>\\;info=ring2)"));
        assert!(!text.contains("RVOL"));

        let mut ivr = menu(vec![]);
        ivr.dtmf.ringer_volume_override = Some("12".into());
        assert!(render(ivr)
            .to_string()
            .contains(" same => n,Set(__RVOL=12)"));
    }

    #[test]
    fn dispatch_actions() {
        let mut ivr = menu(vec![
            entry("1", IvrEntryKind::Extension, "1000"),
            entry("2", IvrEntryKind::Queue, "Q1"),
            entry("3", IvrEntryKind::Ivr, "sales"),
            entry("4", IvrEntryKind::Recording, "promo"),
            entry("5", IvrEntryKind::Voicemail, "1000"),
            entry("0", IvrEntryKind::Hangup, ""),
        ]);
        ivr.dtmf.return_to_ivr_after_vm = YesNo::NO;
        let block = render(ivr);
        assert_eq!(
            block.steps_of("1"),
            vec![&App::dial("PJSIP/1000", 30), &App::Hangup]
        );
        assert_eq!(
            block.steps_of("2"),
            vec![&App::goto(Target::start("queues", "Q1")), &App::Hangup]
        );
        assert_eq!(
            block.steps_of("3"),
            vec![&App::goto(Target::start("ivr_sales", "s"))]
        );
        assert_eq!(
            block.steps_of("4"),
            vec![
                &App::playback("custom/promo1"),
                &App::playback("custom/promo2")
            ]
        );
        let vm = block.steps_of("5");
        assert_eq!(vm[0].to_string(), "VoiceMail(1000@default,u)");
        assert_eq!(vm[1], &App::Hangup);
        assert_eq!(block.steps_of("0"), vec![&App::Hangup]);
    }

    #[test]
    fn voicemail_can_return_to_menu() {
        let mut ivr = menu(vec![entry("5", IvrEntryKind::Voicemail, "1000")]);
        ivr.dtmf.return_to_ivr_after_vm = YesNo::YES;
        let block = render(ivr);
        let steps = block.steps_of("5");
        assert_eq!(steps.len(), 2);
        assert_eq!(steps[1], &App::goto(Target::start("ivr_X", "s")));
    }

    #[test]
    fn unknown_entry_is_diagnosed_then_hangs_up() {
        let block = render(menu(vec![entry(
            "9",
            IvrEntryKind::Unknown("fax".into()),
            "x",
        )]));
        assert_eq!(
            block.steps_of("9"),
            vec![&App::noop("Unsupported IVR entry type fax"), &App::Hangup]
        );
    }

    #[test]
    fn empty_value_is_diagnosed() {
        let block = render(menu(vec![entry("1", IvrEntryKind::Extension, " ")]));
        let steps = block.steps_of("1");
        assert_eq!(steps.last(), Some(&&App::Hangup));
        assert!(matches!(steps[0], App::NoOp(_)));
    }

    #[test]
    fn invalid_prefers_retry_recording_then_plain_then_tone() {
        let mut ivr = menu(vec![]);
        ivr.dtmf.invalid_retry_recording = Some(RecordingRef::new("bad-retry"));
        ivr.dtmf.invalid_recording = Some(RecordingRef::new("bad"));
        let block = render(ivr);
        let steps = block.steps_of("i");
        assert!(steps.contains(&&App::playback("custom/try-again")));
        assert!(!steps.contains(&&App::playback("custom/invalid")));

        let mut ivr = menu(vec![]);
        ivr.dtmf.invalid_recording = Some(RecordingRef::new("bad"));
        let block = render(ivr);
        let steps = block.steps_of("i");
        assert!(steps.contains(&&App::playback("custom/invalid")));

        let block = render(menu(vec![]));
        let steps = block.steps_of("i");
        assert!(steps.contains(&&App::playback("beep")));
        assert_eq!(steps.last(), Some(&&App::Hangup));
    }

    #[test]
    fn append_prompt_replays_before_recording() {
        let mut ivr = menu(vec![]);
        ivr.dtmf.append_announcement_to_timeout = YesNo::YES;
        ivr.dtmf.timeout_recording = Some(RecordingRef::new("bad"));
        let block = render(ivr);
        let steps = block.steps_of("t");
        let prompt = steps
            .iter()
            .position(|a| **a == App::background("custom/welcome"))
            .unwrap();
        let rec = steps
            .iter()
            .position(|a| **a == App::playback("custom/invalid"))
            .unwrap();
        assert!(prompt < rec);
    }

    #[test]
    fn invalid_destination_used_without_return_flag() {
        let mut ivr = menu(vec![]);
        ivr.dtmf.invalid_destination = Some(Destination::extension("1001"));
        let block = render(ivr);
        let steps = block.steps_of("i");
        assert_eq!(
            steps.last(),
            Some(&&App::goto(Target::start("internal", "1001")))
        );
    }

    #[test]
    fn bounded_retries_count_and_hang_up() {
        let mut ivr = menu(vec![]);
        ivr.dtmf.return_on_timeout = YesNo::YES;
        ivr.dtmf.timeout_retries = 2;
        let text = render(ivr).to_string();
        assert!(text.contains("Set(IVR_ivr_X_TIMEOUT=$[0${IVR_ivr_X_TIMEOUT} + 1])"));
        assert!(text.contains(
            " same => n,GotoIf($[${IVR_ivr_X_TIMEOUT} <= 2]?ivr_X,s,1)\n same => n,Hangup()"
        ));
    }

    #[test]
    fn ignore_trailing_key_maps_hash_suffix() {
        let mut ivr = menu(vec![entry("1", IvrEntryKind::Extension, "1000")]);
        ivr.dtmf.ignore_trailing_key = YesNo::YES;
        let block = render(ivr);
        assert_eq!(
            block.steps_of("1#"),
            vec![&App::goto(Target::start("ivr_X", "1"))]
        );
    }

    #[test]
    fn return_label_for_announcements() {
        let block = render(menu(vec![]));
        assert_eq!(
            block.steps_of("return"),
            vec![&App::goto(Target::start("ivr_X", "s"))]
        );
    }

    #[test]
    fn duplicate_digits_keep_first() {
        let block = render(menu(vec![
            entry("1", IvrEntryKind::Extension, "1000"),
            entry("1", IvrEntryKind::Extension, "2000"),
        ]));
        let text = block.to_string();
        assert!(text.contains("PJSIP/1000"));
        assert!(!text.contains("PJSIP/2000"));
    }

    #[test]
    fn undialable_digits_are_skipped() {
        let block = render(menu(vec![
            entry("1,2", IvrEntryKind::Extension, "1000"),
            entry("3", IvrEntryKind::Voicemail, "2000"),
        ]));
        assert!(block
            .steps_of("1,2")
            .is_empty());
        assert_eq!(
            block.steps_of("3")[0],
            &App::voicemail("2000@default").with_options("u")
        );
    }

    #[test]
    fn colliding_context_names_are_skipped() {
        let cfg = CompilerConfig::default();
        let a = IvrMenu {
            id: "a b".into(),
            ..Default::default()
        };
        let b = IvrMenu {
            id: "a_b".into(),
            ..Default::default()
        };
        let out = generate_ivrs(&[a, b], &Resolver::new(&cfg, &[]));
        assert_eq!(out.blocks.len(), 1);
        assert_eq!(out.bindings, vec![Line::include("ivr_a_b")]);
    }
}
