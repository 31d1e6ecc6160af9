//! dialplan-cli: compile contact-center configuration into Asterisk dialplan
//!
//! Reads a snapshot exported by the admin backend, writes the generated
//! `extensions_custom.conf` and optionally asks Asterisk to reload it.

use std::path::PathBuf;

use anyhow::{Context, Result};
use asterisk_dialplan::{AmiSettings, Settings};
use clap::{Args as ClapArgs, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

use commands::CommandProcessor;

/// Asterisk dialplan compiler
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Settings file (`{"compiler": {...}, "deploy": {...}}`)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Command,
}

/// Manager connection overrides
#[derive(ClapArgs, Debug, Default)]
struct AmiArgs {
    /// Asterisk hostname or IP address
    #[arg(short = 'H', long)]
    host: Option<String>,

    /// AMI port
    #[arg(short = 'P', long)]
    port: Option<u16>,

    /// AMI username
    #[arg(short, long)]
    user: Option<String>,

    /// AMI secret
    #[arg(short = 's', long, env = "AMI_SECRET")]
    secret: Option<String>,

    /// Connection and response timeout in seconds
    #[arg(short, long)]
    timeout: Option<u64>,
}

impl AmiArgs {
    fn apply(&self, ami: &mut AmiSettings) {
        if let Some(host) = &self.host {
            ami.host = host.clone();
        }
        if let Some(port) = self.port {
            ami.port = port;
        }
        if let Some(user) = &self.user {
            ami.username = user.clone();
        }
        if let Some(secret) = &self.secret {
            ami.secret = secret.clone();
        }
        if let Some(secs) = self.timeout {
            ami.timeout_ms = secs * 1000;
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compile a snapshot and print the dialplan (or write it with --output)
    Compile {
        /// Snapshot JSON exported by the backend
        snapshot: PathBuf,

        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Compile, install atomically and optionally reload Asterisk
    Deploy {
        snapshot: PathBuf,

        /// Target file, overrides the settings file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Run `dialplan reload` after installing
        #[arg(long)]
        reload: bool,

        #[command(flatten)]
        ami: AmiArgs,
    },
    /// Run `dialplan reload` over AMI
    Reload {
        #[command(flatten)]
        ami: AmiArgs,
    },
    /// Check that the manager interface answers
    Ping {
        #[command(flatten)]
        ami: AmiArgs,
    },
    /// Follow queue events and print agent status changes
    Agents {
        /// Print the final table as JSON when the session ends
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        ami: AmiArgs,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    setup_logging(args.verbose);

    let mut settings = match &args.config {
        Some(path) => Settings::load(path)
            .with_context(|| format!("Failed to load settings from {}", path.display()))?,
        None => Settings::default(),
    };

    let processor = CommandProcessor::new(args.no_color);
    match args.command {
        Command::Compile { snapshot, output } => {
            processor
                .compile(&snapshot, output.as_deref(), &settings.compiler)
                .await?;
        }
        Command::Deploy {
            snapshot,
            output,
            reload,
            ami,
        } => {
            if let Some(output) = output {
                settings.deploy.output_path = output;
            }
            settings.deploy.reload |= reload;
            ami.apply(&mut settings.deploy.ami);
            processor
                .deploy(&snapshot, &settings)
                .await?;
        }
        Command::Reload { ami } => {
            ami.apply(&mut settings.deploy.ami);
            processor
                .reload(&settings.deploy.ami)
                .await?;
        }
        Command::Ping { ami } => {
            ami.apply(&mut settings.deploy.ami);
            processor
                .ping(&settings.deploy.ami)
                .await?;
        }
        Command::Agents { json, ami } => {
            ami.apply(&mut settings.deploy.ami);
            processor
                .agents(&settings.deploy.ami, json)
                .await?;
        }
    }

    Ok(())
}

/// `RUST_LOG` wins; otherwise the `-v` count picks the level.
fn setup_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();
}
