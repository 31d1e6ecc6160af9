//! Subcommand implementations for dialplan-cli

use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use asterisk_dialplan::{
    compile, deploy, AgentStatus, AgentStatusStore, AgentStatusTracker, AmiConnection,
    AmiSettings, CompilerConfig, InMemoryAgentStatusStore, ReloadStatus, Settings, World,
};
use chrono::Local;
use colored::*;
use tracing::info;

/// Runs subcommands and formats their output
pub struct CommandProcessor {
    no_color: bool,
}

impl CommandProcessor {
    pub fn new(no_color: bool) -> Self {
        Self { no_color }
    }

    fn ok(&self, text: &str) {
        if self.no_color {
            eprintln!("{}", text);
        } else {
            eprintln!("{}", text.green());
        }
    }

    fn warn(&self, text: &str) {
        if self.no_color {
            eprintln!("Warning: {}", text);
        } else {
            eprintln!("{}: {}", "Warning".yellow().bold(), text);
        }
    }

    fn load_world(snapshot: &Path) -> Result<World> {
        World::load(snapshot)
            .with_context(|| format!("Failed to load snapshot {}", snapshot.display()))
    }

    pub async fn compile(
        &self,
        snapshot: &Path,
        output: Option<&Path>,
        config: &CompilerConfig,
    ) -> Result<()> {
        let world = Self::load_world(snapshot)?;
        let text = compile(&world, config);
        match output {
            Some(path) => {
                deploy::install(path, &text)
                    .await
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                self.ok(&format!("✓ Wrote {} bytes to {}", text.len(), path.display()));
            }
            None => print!("{}", text),
        }
        Ok(())
    }

    pub async fn deploy(&self, snapshot: &Path, settings: &Settings) -> Result<()> {
        let world = Self::load_world(snapshot)?;
        let text = compile(&world, &settings.compiler);
        let outcome = deploy::deploy(&text, &settings.deploy)
            .await
            .context("Failed to install dialplan")?;

        self.ok(&format!(
            "✓ Installed {} bytes at {}",
            outcome.bytes,
            outcome
                .path
                .display()
        ));
        match outcome.reload {
            ReloadStatus::Skipped => info!("Reload not requested"),
            ReloadStatus::Reloaded(output) => {
                self.ok("✓ Dialplan reloaded");
                for line in output
                    .iter()
                    .filter(|l| !l.is_empty())
                {
                    println!("{}", line);
                }
            }
            ReloadStatus::Failed(e) => {
                self.warn(&format!("dialplan installed but reload failed: {}", e));
                bail!("reload failed");
            }
        }
        Ok(())
    }

    pub async fn reload(&self, ami: &AmiSettings) -> Result<()> {
        let output = deploy::reload(ami)
            .await
            .with_context(|| format!("Failed to reload dialplan on {}:{}", ami.host, ami.port))?;
        self.ok("✓ Dialplan reloaded");
        for line in output
            .iter()
            .filter(|l| !l.is_empty())
        {
            println!("{}", line);
        }
        Ok(())
    }

    pub async fn ping(&self, ami: &AmiSettings) -> Result<()> {
        let mut connection = AmiConnection::connect(ami)
            .await
            .with_context(|| format!("Failed to connect to {}:{}", ami.host, ami.port))?;
        connection
            .ping()
            .await
            .context("Ping failed")?;
        self.ok(&format!("✓ {} answered", connection.banner()));
        connection
            .logoff()
            .await?;
        Ok(())
    }

    fn print_status(&self, status: &AgentStatus) {
        let when = status
            .updated_at
            .with_timezone(&Local)
            .format("%H:%M:%S");
        let state = status
            .state
            .to_string();
        let state = if self.no_color {
            state
        } else {
            match status.state {
                asterisk_dialplan::AgentState::Available => state
                    .green()
                    .to_string(),
                asterisk_dialplan::AgentState::OnCall | asterisk_dialplan::AgentState::Ringing => {
                    state
                        .yellow()
                        .to_string()
                }
                _ => state
                    .red()
                    .to_string(),
            }
        };
        println!(
            "{} {:>8} {:<12}{}{}",
            when,
            status.extension,
            state,
            status
                .queue
                .as_deref()
                .map(|q| format!(" queue={}", q))
                .unwrap_or_default(),
            if status.paused {
                format!(
                    " paused({})",
                    status
                        .pause_reason
                        .as_deref()
                        .unwrap_or("-")
                )
            } else {
                String::new()
            }
        );
    }

    /// Follow queue events until the server closes the session.
    pub async fn agents(&self, ami: &AmiSettings, json: bool) -> Result<()> {
        let mut connection = AmiConnection::connect(ami)
            .await
            .with_context(|| format!("Failed to connect to {}:{}", ami.host, ami.port))?;
        let tracker = AgentStatusTracker::new(Arc::new(InMemoryAgentStatusStore::new()));
        self.ok("✓ Following queue events, Ctrl-C to stop");

        loop {
            tokio::select! {
                event = connection.recv_event() => {
                    match event? {
                        Some(event) => {
                            if let Some(status) = tracker.apply(&event) {
                                self.print_status(&status);
                            }
                        }
                        None => break,
                    }
                }
                _ = tokio::signal::ctrl_c() => {
                    connection
                        .logoff()
                        .await?;
                    break;
                }
            }
        }

        if json {
            let table = tracker
                .store()
                .enumerate();
            println!("{}", serde_json::to_string_pretty(&table)?);
        }
        Ok(())
    }
}
