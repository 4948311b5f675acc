pub mod init;
pub mod mkdir;
pub mod move_nodes;
pub mod rename;
pub mod rm;
pub mod show;

pub use init::{init, InitArgs};
pub use mkdir::{mkdir, MkdirArgs};
pub use move_nodes::{move_nodes, MoveArgs};
pub use rename::{rename, RenameArgs};
pub use rm::{rm, RmArgs};
pub use show::{show, ShowArgs};

use crate::config::Config;
use crate::file_remote::FileRemote;
use anyhow::{anyhow, Result};
use casebundle_editor::{SyncCoordinator, TreeService};
use std::sync::Arc;

/// A bundle opened from the working directory's config
pub struct OpenBundle {
    pub config: Config,
    pub sync: Arc<SyncCoordinator<FileRemote>>,
}

impl OpenBundle {
    /// Load the config and the bundle's current tree
    pub async fn open(cwd: &str) -> Result<Self> {
        let config = Config::load(cwd)?;
        let remote = Arc::new(FileRemote::new(config.bundle_path(cwd)));
        if !remote.path().exists() {
            return Err(anyhow!(
                "Bundle file {} not found. Run `casebundle init` first",
                remote.path().display()
            ));
        }

        let service = Arc::new(TreeService::empty(config.bundle_id.clone()));
        let sync = Arc::new(SyncCoordinator::new(
            service,
            Arc::clone(&remote),
            config.sync.clone(),
        ));
        sync.reload().await?;
        tracing::debug!(
            "Opened bundle {} from {} ({} nodes)",
            config.bundle_id,
            remote.path().display(),
            sync.service().snapshot().len()
        );

        Ok(Self { config, sync })
    }

    /// Fail on the first id the bundle does not contain
    pub fn require_ids(&self, ids: &[String]) -> Result<()> {
        let tree = self.sync.service().snapshot();
        match ids.iter().find(|id| !tree.contains(id)) {
            Some(missing) => Err(anyhow!("No such node: {}", missing)),
            None => Ok(()),
        }
    }
}
