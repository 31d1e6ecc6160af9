//! Asterisk dialplan compiler for a contact-center PBX
//!
//! This crate turns the contact center's configuration entities (agents,
//! recordings, announcements, IVR menus and feature codes) into an Asterisk
//! `extensions.conf` fragment, installs it and asks Asterisk to reload it over
//! the Manager Interface (AMI).
//!
//! # Architecture
//!
//! Generation is a pure, single pass over a [`World`] snapshot:
//! - [`resolve`]: recording filenames and the one destination → `Goto` mapping
//!   every generator shares
//! - [`generators`]: one function per entity kind, each returning context
//!   blocks plus the binding lines that expose them
//! - [`assembler`]: fixed section order and final text
//!
//! Delivery happens outside generation:
//! - [`deploy`]: atomic install then `dialplan reload`
//! - [`ami`]: minimal async manager client
//! - [`status`]: injected agent status store fed by AMI queue events
//!
//! # Examples
//!
//! ## Compile a snapshot
//!
//! ```rust
//! use asterisk_dialplan::{compile, CompilerConfig, World};
//!
//! let world = World::from_json(r#"{
//!     "agents": [{ "userExtension": "1000", "displayName": "Ann" }],
//!     "ivrs": [{
//!         "id": "X",
//!         "name": "Main",
//!         "entries": [{ "digit": "1", "type": "extension", "value": "1000" }]
//!     }]
//! }"#).unwrap();
//!
//! let text = compile(&world, &CompilerConfig::default());
//! assert!(text.contains("[ivr_X]"));
//! assert!(text.contains("include => ivr_X"));
//! ```
//!
//! ## Deploy and reload
//!
//! ```rust,no_run
//! use asterisk_dialplan::{compile, deploy, DialplanError, Settings, World};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), DialplanError> {
//!     let settings = Settings::load("/etc/dialplan/settings.json")?;
//!     let world = World::load("/var/lib/dialplan/snapshot.json")?;
//!
//!     let text = compile(&world, &settings.compiler);
//!     let outcome = deploy::deploy(&text, &settings.deploy).await?;
//!     println!("{} bytes at {}", outcome.bytes, outcome.path.display());
//!     Ok(())
//! }
//! ```

pub mod ami;
pub mod app;
pub mod assembler;
pub mod config;
pub mod constants;
pub mod deploy;
pub mod dialplan;
pub mod error;
pub mod generators;
pub mod model;
pub mod resolve;
pub mod status;

pub use ami::{Action, AmiConnection, AmiEvent, AmiEventType, AmiResponse};
pub use app::applications::{App, Target};
pub use assembler::{assemble, compile, Section};
pub use config::{AmiSettings, CompilerConfig, ContextNames, DeploySettings, MonitorPrefixes, Settings};
pub use constants::DEFAULT_AMI_PORT;
pub use deploy::{DeployOutcome, ReloadStatus};
pub use dialplan::{ContextBlock, Generated, Line, Step};
pub use error::{DialplanError, DialplanResult};
pub use generators::{
    generate_agents, generate_announcements, generate_ivrs, generate_misc_applications,
    generate_monitoring,
};
pub use model::{
    Agent, Announcement, Destination, DestinationKind, DtmfConfig, EntityId, IvrEntry,
    IvrEntryKind, IvrMenu, MiscApplication, Recording, RecordingRef, World,
};
pub use resolve::{goto_for, resolve_filenames, Resolver};
pub use status::{
    AgentState, AgentStatus, AgentStatusStore, AgentStatusTracker, InMemoryAgentStatusStore,
};
