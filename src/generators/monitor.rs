//! ChanSpy supervision contexts: listen, whisper and barge.

use crate::app::applications::{App, Target};
use crate::dialplan::{ContextBlock, Generated, Line, Step};
use crate::resolve::Resolver;

/// Monitoring mode and the ChanSpy option that selects it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpyMode {
    /// Listen only.
    Listen,
    /// Talk to the agent without the caller hearing.
    Whisper,
    /// Join the conversation with both parties.
    Barge,
}

impl SpyMode {
    pub const ALL: [SpyMode; 3] = [SpyMode::Listen, SpyMode::Whisper, SpyMode::Barge];

    /// `q` keeps ChanSpy from announcing the spied channel.
    pub fn options(self) -> &'static str {
        match self {
            SpyMode::Listen => "q",
            SpyMode::Whisper => "qw",
            SpyMode::Barge => "qB",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SpyMode::Listen => "listen",
            SpyMode::Whisper => "whisper",
            SpyMode::Barge => "barge",
        }
    }
}

fn mode_context<'a>(mode: SpyMode, resolver: &'a Resolver<'_>) -> (&'a str, &'a str) {
    let cfg = resolver.config;
    match mode {
        SpyMode::Listen => (
            cfg.contexts
                .spy_listen
                .as_str(),
            cfg.monitor_prefixes
                .listen
                .as_str(),
        ),
        SpyMode::Whisper => (
            cfg.contexts
                .spy_whisper
                .as_str(),
            cfg.monitor_prefixes
                .whisper
                .as_str(),
        ),
        SpyMode::Barge => (
            cfg.contexts
                .spy_barge
                .as_str(),
            cfg.monitor_prefixes
                .barge
                .as_str(),
        ),
    }
}

/// `_<prefix>X.` context spying on `${EXTEN:<prefix len>}`.
///
/// The supervisor extension is rejected before ChanSpy runs.
fn spy_block(mode: SpyMode, resolver: &Resolver<'_>) -> ContextBlock {
    let (context, prefix) = mode_context(mode, resolver);
    let target = format!("${{EXTEN:{}}}", prefix.len());
    let supervisor = &resolver
        .config
        .supervisor_extension;

    let mut block = ContextBlock::new(context);
    block.comment(format!(
        "Dial {}<extension> to {} an agent",
        prefix,
        mode.as_str()
    ));
    block.extension(
        &format!("_{}X.", prefix),
        [
            Step::new(App::noop(format!("ChanSpy {} on {}", mode.as_str(), target))),
            Step::new(App::goto_if(
                format!("$[\"{}\" = \"{}\"]", target, supervisor),
                Target::label("denied"),
            )),
            Step::new(App::Answer),
            Step::new(App::ChanSpy {
                target: resolver
                    .config
                    .device(&target),
                options: mode
                    .options()
                    .to_string(),
            }),
            Step::new(App::Hangup),
            Step::labeled(
                "denied",
                App::noop(format!("Refusing to monitor supervisor extension {}", supervisor)),
            ),
            Step::new(App::Hangup),
        ],
    );
    block
}

/// Three fixed monitoring contexts, each exposed by an `include` binding.
pub fn generate_monitoring(resolver: &Resolver<'_>) -> Generated {
    let mut out = Generated::default();
    for mode in SpyMode::ALL {
        let block = spy_block(mode, resolver);
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

    #[test]
    fn three_contexts_with_mode_flags() {
        let cfg = CompilerConfig::default();
        let out = generate_monitoring(&Resolver::new(&cfg, &[]));
        let names: Vec<&str> = out
            .blocks
            .iter()
            .map(|b| b.name.as_str())
            .collect();
        assert_eq!(names, vec!["chanspy-listen", "chanspy-whisper", "chanspy-barge"]);
        assert_eq!(out.bindings.len(), 3);

        let whisper = out.blocks[1].to_string();
        assert!(whisper.contains("exten => _556X.,1,NoOp(ChanSpy whisper on ${EXTEN:3})"));
        assert!(whisper.contains(" same => n,ChanSpy(PJSIP/${EXTEN:3},qw)"));
        assert!(out.blocks[2]
            .to_string()
            .contains("ChanSpy(PJSIP/${EXTEN:3},qB)"));
    }

    #[test]
    fn guards_supervisor_before_spying() {
        let cfg = CompilerConfig {
            supervisor_extension: "2000".into(),
            ..Default::default()
        };
        let out = generate_monitoring(&Resolver::new(&cfg, &[]));
        let steps = out.blocks[0].steps_of("_555X.");
        let guard = steps
            .iter()
            .position(|a| matches!(a, App::GotoIf { .. }))
            .unwrap();
        let spy = steps
            .iter()
            .position(|a| matches!(a, App::ChanSpy { .. }))
            .unwrap();
        assert!(guard < spy);
        assert_eq!(
            steps[guard].to_string(),
            "GotoIf($[\"${EXTEN:3}\" = \"2000\"]?denied)"
        );
        assert!(out.blocks[0]
            .to_string()
            .contains(" same => n(denied),NoOp(Refusing to monitor supervisor extension 2000)"));
    }

    #[test]
    fn prefix_length_drives_substring() {
        let mut cfg = CompilerConfig::default();
        cfg.monitor_prefixes.barge = "*88".into();
        let out = generate_monitoring(&Resolver::new(&cfg, &[]));
        let barge = out.blocks[2].to_string();
        assert!(barge.contains("exten => _*88X.,1,"));
        assert!(barge.contains("${EXTEN:3}"));
    }
}
