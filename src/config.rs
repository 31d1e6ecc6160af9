//! Compiler and manager-connection settings.
//!
//! Both are plain serde structs with a default for every field, so a JSON file
//! only needs to mention what differs from a stock Asterisk install.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::constants::{DEFAULT_AMI_PORT, DEFAULT_TIMEOUT_MS};
use crate::error::{DialplanError, DialplanResult};

/// Names of the contexts generated code jumps into.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextNames {
    /// Top-level dial context every binding is exposed in.
    pub bindings: String,
    /// General extension-routing context.
    pub extensions: String,
    /// Queue-routing context, addressed by queue id.
    pub queues: String,
    /// Flat context holding misc-application feature codes.
    pub misc_applications: String,
    pub spy_listen: String,
    pub spy_whisper: String,
    pub spy_barge: String,
}

impl Default for ContextNames {
    fn default() -> Self {
        Self {
            bindings: "internal".into(),
            extensions: "internal".into(),
            queues: "queues".into(),
            misc_applications: "misc-applications".into(),
            spy_listen: "chanspy-listen".into(),
            spy_whisper: "chanspy-whisper".into(),
            spy_barge: "chanspy-barge".into(),
        }
    }
}

/// Dial prefixes for the three monitoring modes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorPrefixes {
    pub listen: String,
    pub whisper: String,
    pub barge: String,
}

impl Default for MonitorPrefixes {
    fn default() -> Self {
        Self {
            listen: "555".into(),
            whisper: "556".into(),
            barge: "557".into(),
        }
    }
}

/// Everything a compile pass needs besides the entity snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerConfig {
    pub contexts: ContextNames,
    /// Channel technology agents register with (`PJSIP/1001`).
    pub device_technology: String,
    /// Seconds an extension rings before the dial step gives up.
    pub ring_seconds: u32,
    /// Directory token prefixed to every recording filename.
    pub recording_namespace: String,
    /// Extension that can never be a monitoring target.
    pub supervisor_extension: String,
    pub monitor_prefixes: MonitorPrefixes,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            contexts: ContextNames::default(),
            device_technology: "PJSIP".into(),
            ring_seconds: 30,
            recording_namespace: "custom/".into(),
            supervisor_extension: "1000".into(),
            monitor_prefixes: MonitorPrefixes::default(),
        }
    }
}

impl CompilerConfig {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn load(path: impl AsRef<Path>) -> DialplanResult<Self> {
        let path = path.as_ref();
        info!("Loading compiler configuration from {}", path.display());
        let json = fs::read_to_string(path)
            .map_err(|e| DialplanError::config(path, e.to_string()))?;
        Self::from_json(&json).map_err(|e| DialplanError::config(path, e.to_string()))
    }

    /// `PJSIP/<extension>`
    pub fn device(&self, extension: &str) -> String {
        format!("{}/{}", self.device_technology, extension)
    }
}

/// Asterisk Manager Interface login settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AmiSettings {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub secret: String,
    pub timeout_ms: u64,
}

impl Default for AmiSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: DEFAULT_AMI_PORT,
            username: "admin".into(),
            secret: String::new(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

/// Where the generated file goes and how Asterisk is told about it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeploySettings {
    pub output_path: PathBuf,
    pub reload: bool,
    pub ami: AmiSettings,
}

impl Default for DeploySettings {
    fn default() -> Self {
        Self {
            output_path: PathBuf::from("/etc/asterisk/extensions_custom.conf"),
            reload: false,
            ami: AmiSettings::default(),
        }
    }
}

/// Combined configuration file layout: `{ "compiler": {...}, "deploy": {...} }`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub compiler: CompilerConfig,
    pub deploy: DeploySettings,
}

impl Settings {
    pub fn load(path: impl AsRef<Path>) -> DialplanResult<Self> {
        let path = path.as_ref();
        info!("Loading settings from {}", path.display());
        let json = fs::read_to_string(path)
            .map_err(|e| DialplanError::config(path, e.to_string()))?;
        serde_json::from_str(&json).map_err(|e| DialplanError::config(path, e.to_string()))
    }
}
