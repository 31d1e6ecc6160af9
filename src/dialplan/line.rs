use std::fmt;

use crate::app::applications::App;

/// One application in an extension's priority sequence, optionally labelled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub label: Option<String>,
    pub app: App,
}

impl Step {
    pub fn new(app: App) -> Self {
        Self { label: None, app }
    }

    pub fn labeled(label: impl Into<String>, app: App) -> Self {
        Self {
            label: Some(label.into()),
            app,
        }
    }
}

impl From<App> for Step {
    fn from(app: App) -> Self {
        Step::new(app)
    }
}

/// A single line of `extensions.conf`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Line {
    Comment(String),
    /// `exten => pattern,1[(label)],App(...)`
    Exten {
        pattern: String,
        label: Option<String>,
        app: App,
    },
    /// ` same => n[(label)],App(...)`
    Same {
        label: Option<String>,
        app: App,
    },
    /// `include => context`
    Include(String),
}

impl Line {
    pub fn exten(pattern: impl Into<String>, app: App) -> Self {
        Line::Exten {
            pattern: pattern.into(),
            label: None,
            app,
        }
    }

    pub fn include(context: impl Into<String>) -> Self {
        Line::Include(context.into())
    }

    pub fn comment(text: impl Into<String>) -> Self {
        Line::Comment(text.into())
    }

    pub fn app(&self) -> Option<&App> {
        match self {
            Line::Exten { app, .. } | Line::Same { app, .. } => Some(app),
            _ => None,
        }
    }
}

fn priority(f: &mut fmt::Formatter<'_>, prio: &str, label: &Option<String>) -> fmt::Result {
    f.write_str(prio)?;
    if let Some(ref l) = label {
        write!(f, "({})", l)?;
    }
    Ok(())
}

impl fmt::Display for Line {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Line::Comment(text) => {
                let text = text.replace(['\r', '\n'], " ");
                write!(f, "; {}", text.trim_end())
            }
            Line::Exten { pattern, label, app } => {
                write!(f, "exten => {},", pattern)?;
                priority(f, "1", label)?;
                write!(f, ",{}", app)
            }
            Line::Same { label, app } => {
                f.write_str(" same => ")?;
                priority(f, "n", label)?;
                write!(f, ",{}", app)
            }
            Line::Include(ctx) => write!(f, "include => {}", ctx),
        }
    }
}
