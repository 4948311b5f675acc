use crate::config::{Config, DEFAULT_CONFIG_NAME};
use crate::file_remote::FileRemote;
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct InitArgs {
    /// Display name of the bundle
    #[arg(short, long, default_value = "Untitled bundle")]
    pub name: String,

    /// Bundle id
    #[arg(long, default_value = "bundle")]
    pub id: String,

    /// Force overwrite existing config and bundle file
    #[arg(short, long)]
    pub force: bool,
}

pub async fn init(args: InitArgs, cwd: &str) -> Result<()> {
    let config_path = PathBuf::from(cwd).join(DEFAULT_CONFIG_NAME);

    if config_path.exists() && !args.force {
        println!(
            "{} {} already exists",
            "⚠️".yellow(),
            DEFAULT_CONFIG_NAME.bright_white()
        );
        println!("Use --force to overwrite");
        return Ok(());
    }

    println!("{}", "📁 Initializing case bundle...".bright_blue().bold());

    let config = Config {
        bundle_id: args.id.clone(),
        ..Config::default()
    };

    let config_json = serde_json::to_string_pretty(&config)?;
    fs::write(&config_path, config_json)?;
    println!("  {} Created {}", "✓".green(), DEFAULT_CONFIG_NAME);

    let bundle_path = config.bundle_path(cwd);
    if bundle_path.exists() && !args.force {
        println!("  {} Kept existing {}", "•".dimmed(), config.bundle_file);
    } else {
        FileRemote::create(&bundle_path, &config.bundle_id, &args.name).await?;
        println!("  {} Created {}", "✓".green(), config.bundle_file);
    }

    println!();
    println!("{}", "✅ Bundle initialized!".green().bold());
    println!();
    println!("Next steps:");
    println!("  1. Run: casebundle mkdir Pleadings");
    println!("  2. Run: casebundle show");

    Ok(())
}
