//! Final document assembly.
//!
//! Sections are emitted in a fixed order so the same snapshot always yields the
//! same file. Binding sections reopen the binding context; Asterisk merges
//! repeated context headers.

use std::fmt;

use tracing::info;

use crate::config::CompilerConfig;
use crate::dialplan::{ContextBlock, Generated, Line};
use crate::generators::{
    generate_agents, generate_announcements, generate_ivrs, generate_misc_applications,
    generate_monitoring,
};
use crate::model::World;
use crate::resolve::Resolver;

/// First line of every generated file.
pub const HEADER: &str = "; Generated by asterisk-dialplan. Changes are overwritten on the next deploy.";

/// One chunk of the output file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Section {
    /// Self-contained contexts.
    Blocks(Vec<ContextBlock>),
    /// Lines added to an already named context.
    Bindings { context: String, lines: Vec<Line> },
}

impl Section {
    pub fn bindings(context: impl Into<String>, lines: Vec<Line>) -> Self {
        Section::Bindings {
            context: context.into(),
            lines,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Section::Blocks(blocks) => blocks
                .iter()
                .all(|b| b.is_empty()),
            Section::Bindings { lines, .. } => lines.is_empty(),
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Section::Blocks(blocks) => {
                let mut first = true;
                for block in blocks
                    .iter()
                    .filter(|b| !b.is_empty())
                {
                    if !first {
                        f.write_str("\n\n")?;
                    }
                    first = false;
                    write!(f, "{}", block)?;
                }
                Ok(())
            }
            Section::Bindings { context, lines } => {
                write!(f, "[{}]", context)?;
                for line in lines {
                    write!(f, "\n{}", line)?;
                }
                Ok(())
            }
        }
    }
}

/// Join non-empty sections with one blank line between them.
///
/// Every line is right-trimmed and the result ends with exactly one newline.
pub fn assemble(sections: &[Section]) -> String {
    let mut out = String::from(HEADER);
    out.push('\n');

    for section in sections
        .iter()
        .filter(|s| !s.is_empty())
    {
        let rendered = section.to_string();
        let trimmed: Vec<&str> = rendered
            .trim_end()
            .lines()
            .map(str::trim_end)
            .collect();
        out.push('\n');
        out.push_str(&trimmed.join("\n"));
        out.push('\n');
    }
    out
}

/// Blocks first, then the lines binding them.
fn push_generated(sections: &mut Vec<Section>, generated: Generated, bindings_context: &str) {
    sections.push(Section::Blocks(generated.blocks));
    sections.push(Section::bindings(bindings_context, generated.bindings));
}

/// Every section of the dialplan, in output order.
pub fn sections(world: &World, config: &CompilerConfig) -> Vec<Section> {
    let resolver = Resolver::new(config, &world.recordings);
    let bindings = config
        .contexts
        .bindings
        .as_str();
    let mut sections = Vec::with_capacity(10);

    let agents = generate_agents(&world.agents, &resolver);
    sections.push(Section::bindings(bindings, agents.bindings));

    push_generated(
        &mut sections,
        generate_announcements(&world.announcements, &resolver),
        bindings,
    );
    push_generated(&mut sections, generate_ivrs(&world.ivrs, &resolver), bindings);
    push_generated(
        &mut sections,
        generate_misc_applications(&world.misc_applications, &resolver),
        bindings,
    );
    push_generated(&mut sections, generate_monitoring(&resolver), bindings);
    sections
}

/// Compile a snapshot into the complete dialplan text.
pub fn compile(world: &World, config: &CompilerConfig) -> String {
    let sections = sections(world, config);
    let contexts: usize = sections
        .iter()
        .map(|s| match s {
            Section::Blocks(blocks) => blocks.len(),
            Section::Bindings { .. } => 0,
        })
        .sum();
    let text = assemble(&sections);
    info!(
        "Compiled dialplan: {} agents, {} announcements, {} IVRs, {} misc applications, {} contexts, {} bytes",
        world
            .agents
            .len(),
        world
            .announcements
            .len(),
        world
            .ivrs
            .len(),
        world
            .misc_applications
            .len(),
        contexts,
        text.len()
    );
    text
}
