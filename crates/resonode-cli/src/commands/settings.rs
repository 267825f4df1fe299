//! Settings file commands.

use std::path::PathBuf;

use clap::{Args, Subcommand};
use resonode_config::{EngineSettings, settings_path};

use super::common::load_settings;

#[derive(Args)]
pub struct SettingsArgs {
    #[command(subcommand)]
    command: SettingsCommand,
}

#[derive(Subcommand)]
enum SettingsCommand {
    /// Print the effective settings as TOML
    Show {
        /// Settings file (defaults to the user settings)
        #[arg(long)]
        path: Option<PathBuf>,
    },

    /// Write a settings file with default values
    Init {
        /// Where to write (defaults to the user settings)
        #[arg(long)]
        path: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

pub fn run(args: SettingsArgs) -> anyhow::Result<()> {
    match args.command {
        SettingsCommand::Show { path } => {
            let settings = load_settings(path.as_deref())?;
            print!("{}", settings.to_toml()?);
            Ok(())
        }
        SettingsCommand::Init { path, force } => {
            let path = path.unwrap_or_else(settings_path);
            if path.exists() && !force {
                anyhow::bail!("'{}' already exists. Use --force to overwrite.", path.display());
            }
            EngineSettings::default().save(&path)?;
            println!("Wrote {}", path.display());
            Ok(())
        }
    }
}
