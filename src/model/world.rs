use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{Agent, Announcement, IvrMenu, MiscApplication, Recording};
use crate::error::{DialplanError, DialplanResult};

/// Consistent snapshot of every entity one compile pass reads.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct World {
    pub agents: Vec<Agent>,
    pub recordings: Vec<Recording>,
    pub announcements: Vec<Announcement>,
    #[serde(alias = "ivrMenus")]
    pub ivrs: Vec<IvrMenu>,
    #[serde(alias = "miscApps")]
    pub misc_applications: Vec<MiscApplication>,
}

impl World {
    pub fn from_json(json: &str) -> DialplanResult<Self> {
        let world: World = serde_json::from_str(json)?;
        debug!(
            "Parsed snapshot: {} agents, {} recordings, {} announcements, {} IVRs, {} misc apps",
            world
                .agents
                .len(),
            world
                .recordings
                .len(),
            world
                .announcements
                .len(),
            world
                .ivrs
                .len(),
            world
                .misc_applications
                .len()
        );
        Ok(world)
    }

    /// Load a snapshot exported by the storage layer.
    pub fn load(path: impl AsRef<Path>) -> DialplanResult<Self> {
        let path = path.as_ref();
        info!("Loading snapshot from {}", path.display());
        let json = fs::read_to_string(path).map_err(|source| DialplanError::Snapshot {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }
}
