use std::fmt;

use super::{Line, Step};
use crate::app::applications::App;

/// `[name]` header plus the lines that belong to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextBlock {
    pub name: String,
    pub lines: Vec<Line>,
}

impl ContextBlock {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            lines: Vec::new(),
        }
    }

    pub fn comment(&mut self, text: impl Into<String>) -> &mut Self {
        self.lines
            .push(Line::comment(text));
        self
    }

    pub fn include(&mut self, context: impl Into<String>) -> &mut Self {
        self.lines
            .push(Line::include(context));
        self
    }

    pub fn push(&mut self, line: Line) -> &mut Self {
        self.lines
            .push(line);
        self
    }

    /// Emit `pattern` with `steps` as its priority sequence.
    ///
    /// An empty sequence emits nothing.
    pub fn extension<I, S>(&mut self, pattern: &str, steps: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Step>,
    {
        let mut first = true;
        for step in steps {
            let Step { label, app } = step.into();
            let line = if first {
                first = false;
                Line::Exten {
                    pattern: pattern.to_string(),
                    label,
                    app,
                }
            } else {
                Line::Same { label, app }
            };
            self.lines
                .push(line);
        }
        self
    }

    /// Every application in order, across all extensions.
    pub fn apps(&self) -> impl Iterator<Item = &App> {
        self.lines
            .iter()
            .filter_map(Line::app)
    }

    /// Steps of a single extension, in priority order.
    pub fn steps_of(&self, pattern: &str) -> Vec<&App> {
        let mut out = Vec::new();
        let mut inside = false;
        for line in &self.lines {
            match line {
                Line::Exten { pattern: p, app, .. } => {
                    inside = p == pattern;
                    if inside {
                        out.push(app);
                    }
                }
                Line::Same { app, .. } if inside => out.push(app),
                Line::Same { .. } | Line::Comment(_) => {}
                Line::Include(_) => inside = false,
            }
        }
        out
    }

    pub fn is_empty(&self) -> bool {
        self.lines
            .is_empty()
    }
}

impl fmt::Display for ContextBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.name)?;
        for line in &self.lines {
            write!(f, "\n{}", line)?;
        }
        Ok(())
    }
}

/// Output of one generator: self-contained context blocks plus the binding
/// lines that expose them in the top-level dial context.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Generated {
    pub blocks: Vec<ContextBlock>,
    pub bindings: Vec<Line>,
}

impl Generated {
    pub fn is_empty(&self) -> bool {
        self.blocks
            .is_empty()
            && self
                .bindings
                .is_empty()
    }

    pub fn block(&self, name: &str) -> Option<&ContextBlock> {
        self.blocks
            .iter()
            .find(|b| b.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_step_is_priority_one() {
        let mut block = ContextBlock::new("internal");
        block.extension(
            "1001",
            [App::dial("PJSIP/1001", 30), App::Hangup],
        );
        assert_eq!(
            block.to_string(),
            "[internal]\nexten => 1001,1,Dial(PJSIP/1001,30)\n same => n,Hangup()"
        );
    }

    #[test]
    fn empty_extension_emits_nothing() {
        let mut block = ContextBlock::new("x");
        block.extension("1", Vec::<App>::new());
        assert!(block.is_empty());
        assert_eq!(block.to_string(), "[x]");
    }

    #[test]
    fn steps_of_selects_one_extension() {
        let mut block = ContextBlock::new("ivr_X");
        block
            .extension("1", [App::dial("PJSIP/1000", 30), App::Hangup])
            .extension("2", [App::Hangup]);
        assert_eq!(
            block.steps_of("1"),
            vec![&App::dial("PJSIP/1000", 30), &App::Hangup]
        );
        assert_eq!(block.steps_of("2"), vec![&App::Hangup]);
        assert!(block
            .steps_of("3")
            .is_empty());
    }
}
