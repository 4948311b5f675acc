use super::OpenBundle;
use anyhow::{anyhow, Result};
use clap::Args;
use colored::Colorize;

#[derive(Debug, Args)]
pub struct RenameArgs {
    /// Node to rename
    pub id: String,

    /// New display name
    pub name: String,
}

pub async fn rename(args: RenameArgs, cwd: &str) -> Result<()> {
    if args.name.trim().is_empty() {
        return Err(anyhow!("Name cannot be empty"));
    }

    let bundle = OpenBundle::open(cwd).await?;
    bundle.require_ids(std::slice::from_ref(&args.id))?;

    bundle.sync.rename(&args.id, &args.name).await?;
    tracing::info!("Renamed {} to {:?}", args.id, args.name);
    println!(
        "{} Renamed {} to {}",
        "✓".green(),
        args.id.dimmed(),
        args.name.bright_white()
    );
    Ok(())
}
