use super::OpenBundle;
use anyhow::Result;
use clap::Args;
use colored::Colorize;

#[derive(Debug, Args)]
pub struct RmArgs {
    /// Nodes to delete; folders are removed with everything inside
    #[arg(required = true)]
    pub ids: Vec<String>,
}

pub async fn rm(args: RmArgs, cwd: &str) -> Result<()> {
    let bundle = OpenBundle::open(cwd).await?;
    bundle.require_ids(&args.ids)?;

    let before = bundle.sync.service().snapshot().len();
    bundle.sync.delete(&args.ids).await?;
    let removed = before - bundle.sync.service().snapshot().len();
    tracing::info!("Deleted {:?} ({} nodes) from {}", args.ids, removed, bundle.config.bundle_id);

    println!("{} Removed {} node(s)", "✓".green(), removed);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::init::{init, InitArgs};
    use crate::commands::mkdir::{mkdir, MkdirArgs};
    use crate::commands::rename::{rename, RenameArgs};

    #[tokio::test]
    async fn test_mkdir_rename_rm() {
        let dir = tempfile::tempdir().unwrap();
        let cwd = dir.path().to_str().unwrap();
        init(
            InitArgs {
                name: "Case".to_string(),
                id: "case".to_string(),
                force: false,
            },
            cwd,
        )
        .await
        .unwrap();

        mkdir(
            MkdirArgs {
                name: "Pleadings".to_string(),
                parent: None,
            },
            cwd,
        )
        .await
        .unwrap();
        mkdir(
            MkdirArgs {
                name: "Claim".to_string(),
                parent: Some("folder-1".to_string()),
            },
            cwd,
        )
        .await
        .unwrap();

        rename(
            RenameArgs {
                id: "folder-1".to_string(),
                name: "Statements of case".to_string(),
            },
            cwd,
        )
        .await
        .unwrap();

        let tree = OpenBundle::open(cwd).await.unwrap().sync.service().snapshot();
        assert_eq!(tree.find_node("folder-1").unwrap().name, "Statements of case");
        assert_eq!(tree.find_parent_id("folder-2"), Some("folder-1"));

        rm(
            RmArgs {
                ids: vec!["folder-1".to_string()],
            },
            cwd,
        )
        .await
        .unwrap();

        let tree = OpenBundle::open(cwd).await.unwrap().sync.service().snapshot();
        assert!(tree.is_empty());
    }

    #[tokio::test]
    async fn test_rm_unknown_id_fails() {
        let dir = tempfile::tempdir().unwrap();
        let cwd = dir.path().to_str().unwrap();
        init(
            InitArgs {
                name: "Case".to_string(),
                id: "case".to_string(),
                force: false,
            },
            cwd,
        )
        .await
        .unwrap();

        let result = rm(
            RmArgs {
                ids: vec!["missing".to_string()],
            },
            cwd,
        )
        .await;
        assert!(result.is_err());
    }
}
