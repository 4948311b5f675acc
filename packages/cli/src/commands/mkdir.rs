use super::OpenBundle;
use anyhow::Result;
use clap::Args;
use colored::Colorize;

#[derive(Debug, Args)]
pub struct MkdirArgs {
    /// Folder name
    pub name: String,

    /// Parent folder id (defaults to the top level)
    #[arg(short, long)]
    pub parent: Option<String>,
}

pub async fn mkdir(args: MkdirArgs, cwd: &str) -> Result<()> {
    let bundle = OpenBundle::open(cwd).await?;
    if let Some(parent) = &args.parent {
        bundle.require_ids(std::slice::from_ref(parent))?;
    }

    let folder = bundle
        .sync
        .create_folder(&args.name, args.parent.as_deref())
        .await?;
    tracing::info!("Created folder {} under {:?}", folder.id, args.parent);
    println!(
        "{} Created {} {}",
        "✓".green(),
        format!("{}/", folder.name).blue().bold(),
        format!("({})", folder.id).dimmed()
    );
    Ok(())
}
