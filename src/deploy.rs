//! Installing a compiled dialplan and telling Asterisk about it.
//!
//! The file is written to a temporary sibling and renamed over the target, so
//! Asterisk never reads a half-written dialplan. The reload runs afterwards;
//! its failure is reported without touching the installed file.

use std::path::{Path, PathBuf};

use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use crate::{
    ami::AmiConnection,
    config::{AmiSettings, DeploySettings},
    error::{DialplanError, DialplanResult},
};

/// What happened to the reload request
#[derive(Debug)]
pub enum ReloadStatus {
    /// Not requested
    Skipped,
    /// Asterisk accepted `dialplan reload`; holds the command output
    Reloaded(Vec<String>),
    /// The file is installed but Asterisk was not reloaded
    Failed(DialplanError),
}

impl ReloadStatus {
    pub fn is_failed(&self) -> bool {
        matches!(self, ReloadStatus::Failed(_))
    }
}

#[derive(Debug)]
pub struct DeployOutcome {
    pub path: PathBuf,
    pub bytes: usize,
    pub reload: ReloadStatus,
}

fn temp_sibling(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| {
            n.to_string_lossy()
                .into_owned()
        })
        .unwrap_or_else(|| "dialplan".to_string());
    path.with_file_name(format!(".{}.tmp-{}", name, std::process::id()))
}

async fn write_and_rename(path: &Path, tmp: &Path, contents: &str) -> std::io::Result<()> {
    let mut file = fs::File::create(tmp).await?;
    file.write_all(contents.as_bytes())
        .await?;
    file.sync_all()
        .await?;
    drop(file);
    fs::rename(tmp, path).await
}

/// Atomically replace `path` with `contents`. Returns the number of bytes written.
pub async fn install(path: impl AsRef<Path>, contents: &str) -> DialplanResult<usize> {
    let path = path.as_ref();
    let tmp = temp_sibling(path);
    debug!("Writing {} via {}", path.display(), tmp.display());

    if let Err(source) = write_and_rename(path, &tmp, contents).await {
        match fs::remove_file(&tmp).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!("Could not remove {}: {}", tmp.display(), e),
        }
        return Err(DialplanError::Install {
            path: path.to_path_buf(),
            source,
        });
    }

    info!("Installed dialplan at {} ({} bytes)", path.display(), contents.len());
    Ok(contents.len())
}

/// Log in, run `dialplan reload`, log off.
pub async fn reload(settings: &AmiSettings) -> DialplanResult<Vec<String>> {
    let mut connection = AmiConnection::connect(settings).await?;
    let output = connection
        .reload_dialplan()
        .await;
    if let Err(e) = connection
        .logoff()
        .await
    {
        debug!("Logoff after reload failed: {}", e);
    }
    output
}

/// Install `text` and, when configured, reload the dialplan.
///
/// Only installation errors are returned as `Err`.
pub async fn deploy(text: &str, settings: &DeploySettings) -> DialplanResult<DeployOutcome> {
    let bytes = install(&settings.output_path, text).await?;

    let reload = if settings.reload {
        match reload(&settings.ami).await {
            Ok(output) => ReloadStatus::Reloaded(output),
            Err(e) => {
                warn!("Dialplan installed but reload failed: {}", e);
                ReloadStatus::Failed(e)
            }
        }
    } else {
        ReloadStatus::Skipped
    };

    Ok(DeployOutcome {
        path: settings
            .output_path
            .clone(),
        bytes,
        reload,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn install_replaces_file_without_leftovers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir
            .path()
            .join("extensions_custom.conf");
        std::fs::write(&path, "old").unwrap();

        let written = install(&path, "[internal]\n")
            .await
            .unwrap();
        assert_eq!(written, 11);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "[internal]\n");

        let entries: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .collect();
        assert_eq!(entries.len(), 1);
    }

    #[tokio::test]
    async fn install_into_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir
            .path()
            .join("missing/extensions_custom.conf");
        let err = install(&path, "x")
            .await
            .unwrap_err();
        assert!(matches!(err, DialplanError::Install { .. }));
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn deploy_without_reload() {
        let dir = tempfile::tempdir().unwrap();
        let settings = DeploySettings {
            output_path: dir
                .path()
                .join("out.conf"),
            reload: false,
            ..Default::default()
        };
        let outcome = deploy("; empty\n", &settings)
            .await
            .unwrap();
        assert!(matches!(outcome.reload, ReloadStatus::Skipped));
        assert_eq!(outcome.bytes, 8);
    }
}
