use std::fmt;

/// Jump target: `priority`, `exten,priority` or `context,exten,priority`.
///
/// Parts are escaped on construction, except through
/// [`expression`](Self::expression).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub context: Option<String>,
    pub exten: Option<String>,
    pub priority: String,
}

impl Target {
    /// Fully qualified target whose parts are dialplan expressions such as `${CUT(VAR,^,1)}`,
    /// kept verbatim.
    pub fn expression(context: impl Into<String>, exten: impl Into<String>, priority: impl Into<String>) -> Self {
        Self {
            context: Some(context.into()),
            exten: Some(exten.into()),
            priority: priority.into(),
        }
    }

    /// Priority 1 of `exten` in `context`.
    pub fn start(context: impl AsRef<str>, exten: impl AsRef<str>) -> Self {
        Self {
            context: Some(escape(context.as_ref())),
            exten: Some(escape(exten.as_ref())),
            priority: "1".to_string(),
        }
    }

    /// `exten,label` within the current context.
    pub fn local(exten: impl AsRef<str>, label: impl AsRef<str>) -> Self {
        Self {
            context: None,
            exten: Some(escape(exten.as_ref())),
            priority: escape(label.as_ref()),
        }
    }

    /// Bare label within the current extension.
    pub fn label(label: impl AsRef<str>) -> Self {
        Self {
            context: None,
            exten: None,
            priority: escape(label.as_ref()),
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ref ctx) = self.context {
            write!(f, "{},", ctx)?;
        }
        if let Some(ref exten) = self.exten {
            write!(f, "{},", exten)?;
        }
        f.write_str(&self.priority)
    }
}

/// One Asterisk dialplan application call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum App {
    Answer,
    Hangup,
    /// Early media without answering the channel.
    Progress,
    Wait(u32),
    NoOp(String),
    Set {
        name: String,
        value: String,
    },
    Dial {
        device: String,
        timeout: u32,
    },
    Goto(Target),
    GotoIf {
        condition: String,
        target: Target,
    },
    /// Interruptible playback; DTMF ends it and is matched against extensions.
    Background {
        file: String,
        options: Option<String>,
    },
    Playback {
        file: String,
        options: Option<String>,
    },
    WaitExten(Option<u32>),
    VoiceMail {
        mailbox: String,
        options: Option<String>,
    },
    ChanSpy {
        target: String,
        options: String,
    },
}

impl App {
    /// Diagnostic no-op. Text is sanitized for a single dialplan line.
    pub fn noop(text: impl AsRef<str>) -> Self {
        App::NoOp(escape(text.as_ref()))
    }

    pub fn set(name: impl Into<String>, value: impl Into<String>) -> Self {
        App::Set {
            name: name.into(),
            value: value.into(),
        }
    }

    pub fn dial(device: impl AsRef<str>, timeout: u32) -> Self {
        App::Dial {
            device: escape(device.as_ref()),
            timeout,
        }
    }

    pub fn goto(target: Target) -> Self {
        App::Goto(target)
    }

    pub fn goto_if(condition: impl Into<String>, target: Target) -> Self {
        App::GotoIf {
            condition: condition.into(),
            target,
        }
    }

    pub fn background(file: impl AsRef<str>) -> Self {
        App::Background {
            file: escape(file.as_ref()),
            options: None,
        }
    }

    pub fn playback(file: impl AsRef<str>) -> Self {
        App::Playback {
            file: escape(file.as_ref()),
            options: None,
        }
    }

    /// `VoiceMail(<mailbox>)`, e.g. `1001@default`.
    pub fn voicemail(mailbox: impl AsRef<str>) -> Self {
        App::VoiceMail {
            mailbox: escape(mailbox.as_ref()),
            options: None,
        }
    }

    /// Attach an option string to `Background`/`Playback`/`VoiceMail`; no-op otherwise.
    pub fn with_options(mut self, opts: impl Into<String>) -> Self {
        let opts = opts.into();
        match &mut self {
            App::Background { options, .. }
            | App::Playback { options, .. }
            | App::VoiceMail { options, .. } => *options = Some(opts),
            _ => {}
        }
        self
    }
}

impl fmt::Display for App {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            App::Answer => f.write_str("Answer()"),
            App::Hangup => f.write_str("Hangup()"),
            App::Progress => f.write_str("Progress()"),
            App::Wait(secs) => write!(f, "Wait({})", secs),
            App::NoOp(text) => write!(f, "NoOp({})", text),
            App::Set { name, value } => write!(f, "Set({}={})", name, value),
            App::Dial { device, timeout } => write!(f, "Dial({},{})", device, timeout),
            App::Goto(target) => write!(f, "Goto({})", target),
            App::GotoIf { condition, target } => write!(f, "GotoIf({}?{})", condition, target),
            App::Background { file, options } => with_opts(f, "Background", file, options),
            App::Playback { file, options } => with_opts(f, "Playback", file, options),
            App::WaitExten(None) => f.write_str("WaitExten()"),
            App::WaitExten(Some(secs)) => write!(f, "WaitExten({})", secs),
            App::VoiceMail { mailbox, options } => with_opts(f, "VoiceMail", mailbox, options),
            App::ChanSpy { target, options } => write!(f, "ChanSpy({},{})", target, options),
        }
    }
}

fn with_opts(f: &mut fmt::Formatter<'_>, name: &str, arg: &str, opts: &Option<String>) -> fmt::Result {
    match opts {
        Some(o) => write!(f, "{}({},{})", name, arg, o),
        None => write!(f, "{}({})", name, arg),
    }
}

/// Make free text safe inside an application argument list.
///
/// `;` starts a comment in `extensions.conf`, line breaks end the line, a
/// comma would split the argument and a backslash escapes the next character.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            ';' => out.push_str("\\;"),
            ',' => out.push_str("\\,"),
            '\r' | '\n' | '\t' => out.push(' '),
            _ => out.push(ch),
        }
    }
    out.trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_bare_applications() {
        assert_eq!(App::Answer.to_string(), "Answer()");
        assert_eq!(App::Hangup.to_string(), "Hangup()");
        assert_eq!(App::Progress.to_string(), "Progress()");
        assert_eq!(App::WaitExten(None).to_string(), "WaitExten()");
        assert_eq!(App::Wait(1).to_string(), "Wait(1)");
    }

    #[test]
    fn renders_dial_and_goto() {
        assert_eq!(App::dial("PJSIP/1000", 30).to_string(), "Dial(PJSIP/1000,30)");
        assert_eq!(
            App::goto(Target::start("queues", "Q1")).to_string(),
            "Goto(queues,Q1,1)"
        );
        assert_eq!(App::goto(Target::label("play")).to_string(), "Goto(play)");
        assert_eq!(
            App::goto(Target::local("s", "play")).to_string(),
            "Goto(s,play)"
        );
    }

    #[test]
    fn renders_goto_if() {
        let app = App::goto_if("$[\"${X}\" = \"1\"]", Target::label("denied"));
        assert_eq!(app.to_string(), "GotoIf($[\"${X}\" = \"1\"]?denied)");
    }

    #[test]
    fn options_attach_only_to_media_apps() {
        assert_eq!(
            App::playback("custom/hello")
                .with_options("noanswer")
                .to_string(),
            "Playback(custom/hello,noanswer)"
        );
        assert_eq!(App::Answer.with_options("x"), App::Answer);
    }

    #[test]
    fn entity_values_are_escaped() {
        assert_eq!(
            App::playback("custom/Sales; closed, v2").to_string(),
            "Playback(custom/Sales\\; closed\\, v2)"
        );
        assert_eq!(
            App::background("custom/a,b").to_string(),
            "Background(custom/a\\,b)"
        );
        assert_eq!(App::dial("PJSIP/100;1", 30).to_string(), "Dial(PJSIP/100\\;1,30)");
        assert_eq!(
            App::goto(Target::start("queues", "support,2")).to_string(),
            "Goto(queues,support\\,2,1)"
        );
        assert_eq!(
            App::voicemail("10;01@default")
                .with_options("u")
                .to_string(),
            "VoiceMail(10\\;01@default,u)"
        );
        assert_eq!(escape("a\\b"), "a\\\\b");
    }

    #[test]
    fn expression_targets_stay_verbatim() {
        let target = Target::expression("${CUT(FAX_DEST,^,1)}", "${CUT(FAX_DEST,^,2)}", "1");
        assert_eq!(
            App::goto(target).to_string(),
            "Goto(${CUT(FAX_DEST,^,1)},${CUT(FAX_DEST,^,2)},1)"
        );
    }

    #[test]
    fn noop_text_is_escaped() {
        assert_eq!(
            App::noop("Sales; after hours,\nweekend").to_string(),
            "NoOp(Sales\\; after hours\\, weekend)"
        );
    }
}
