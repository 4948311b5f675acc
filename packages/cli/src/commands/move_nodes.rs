use super::OpenBundle;
use anyhow::{anyhow, Result};
use casebundle_editor::{DropPreview, MovePlan, Operation, ROOT_DROP_ZONE};
use clap::Args;
use colored::Colorize;

#[derive(Debug, Args)]
pub struct MoveArgs {
    /// Nodes to move; moved as one block in bundle order
    #[arg(required = true)]
    pub ids: Vec<String>,

    /// Destination folder id, or ROOT for the top level
    #[arg(long)]
    pub into: String,

    /// Position among the destination's current children (defaults to the end)
    #[arg(long)]
    pub index: Option<usize>,
}

pub async fn move_nodes(args: MoveArgs, cwd: &str) -> Result<()> {
    let bundle = OpenBundle::open(cwd).await?;
    bundle.require_ids(&args.ids)?;

    let tree = bundle.sync.service().snapshot();
    let destination = (args.into != ROOT_DROP_ZONE).then_some(args.into.as_str());
    let sibling_count = tree
        .children_of(destination)
        .map(|children| children.len())
        .ok_or_else(|| anyhow!("Not a folder: {}", args.into))?;

    let index = args.index.unwrap_or(sibling_count).min(sibling_count);
    let preview = DropPreview::new(destination, index);

    let pending = bundle
        .sync
        .apply_drop(1, &args.ids, &preview)
        .map_err(|e| anyhow!("Cannot move: {}", e))?;

    let pending = match pending {
        Some(pending) => pending,
        None => {
            tracing::debug!("Move of {:?} into {} changed nothing", args.ids, args.into);
            println!("{} Already in place", "•".dimmed());
            return Ok(());
        }
    };

    bundle.sync.persist(&pending).await?;

    if let Operation::Drop { plan, .. } = &pending.operation {
        tracing::info!("Persisted {} plan to {}", plan.kind(), bundle.config.bundle_file);
        println!("{} {}", "✓".green(), describe(plan));
    }
    Ok(())
}

fn describe(plan: &MovePlan) -> String {
    match plan {
        MovePlan::Reorder { ordered_ids, .. } => {
            format!("Reordered {} siblings", ordered_ids.len())
        }
        MovePlan::Move {
            node_ids,
            destination,
            index,
            ..
        } => format!(
            "Moved {} into {} at {}",
            node_ids.join(", "),
            destination.as_deref().unwrap_or(ROOT_DROP_ZONE),
            index
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::init::{init, InitArgs};
    use crate::config::Config;
    use crate::file_remote::FileRemote;
    use casebundle_editor::{children_in, RemoteStore};

    async fn setup(dir: &tempfile::TempDir) -> (String, FileRemote) {
        let cwd = dir.path().to_str().unwrap().to_string();
        init(
            InitArgs {
                name: "Case".to_string(),
                id: "case".to_string(),
                force: false,
            },
            &cwd,
        )
        .await
        .unwrap();

        let remote = FileRemote::new(Config::load(&cwd).unwrap().bundle_path(&cwd));
        let folder = remote.create_folder("case", "Pleadings", None).await.unwrap();
        assert_eq!(folder.id, "folder-1");
        remote.create_folder("case", "Evidence", None).await.unwrap();
        remote.create_folder("case", "Claim", Some("folder-1")).await.unwrap();
        (cwd, remote)
    }

    fn args(ids: &[&str], into: &str, index: Option<usize>) -> MoveArgs {
        MoveArgs {
            ids: ids.iter().map(|s| s.to_string()).collect(),
            into: into.to_string(),
            index,
        }
    }

    #[tokio::test]
    async fn test_move_to_front_of_folder() {
        let dir = tempfile::tempdir().unwrap();
        let (cwd, remote) = setup(&dir).await;

        move_nodes(args(&["folder-2"], "folder-1", Some(0)), &cwd).await.unwrap();

        let root = remote.load_tree("case").await.unwrap();
        assert_eq!(
            children_in(&root, Some("folder-1")),
            Some(vec!["folder-2".to_string(), "folder-3".to_string()])
        );
    }

    #[tokio::test]
    async fn test_bundle_id_addresses_top_level() {
        let dir = tempfile::tempdir().unwrap();
        let (cwd, remote) = setup(&dir).await;

        move_nodes(args(&["folder-2"], "case", Some(0)), &cwd).await.unwrap();

        let root = remote.load_tree("case").await.unwrap();
        assert_eq!(
            children_in(&root, None),
            Some(vec!["folder-2".to_string(), "folder-1".to_string()])
        );
    }

    #[tokio::test]
    async fn test_move_into_own_descendant_fails() {
        let dir = tempfile::tempdir().unwrap();
        let (cwd, remote) = setup(&dir).await;
        let before = remote.load_tree("case").await.unwrap();

        assert!(move_nodes(args(&["folder-1"], "folder-3", None), &cwd).await.is_err());
        assert_eq!(remote.load_tree("case").await.unwrap(), before);
    }

    #[tokio::test]
    async fn test_unknown_id_fails() {
        let dir = tempfile::tempdir().unwrap();
        let (cwd, _remote) = setup(&dir).await;
        assert!(move_nodes(args(&["nope"], ROOT_DROP_ZONE, None), &cwd).await.is_err());
    }
}
