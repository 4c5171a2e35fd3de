use std::path::{Path, PathBuf};

use clap::{Args, Subcommand};
use kitchentimer_core::Config;

type CmdResult = Result<(), Box<dyn std::error::Error>>;

#[derive(Args)]
pub struct ConfigArgs {
    /// Use this file instead of the default location
    #[arg(long, global = true)]
    file: Option<PathBuf>,
    #[command(subcommand)]
    action: ConfigAction,
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print one value by dotted key (e.g. "engine.tick_rate_hz", "main.unit")
    Get { key: String },
    /// Change one value; the new value must parse as the old one's type
    Set { key: String, value: String },
    /// Print the whole configuration as TOML
    Show {
        /// Print JSON instead
        #[arg(long)]
        json: bool,
    },
    /// Print the duration range each kind of timer accepts
    Limits,
    /// Overwrite the file with defaults
    Reset,
    /// Print the config file location
    Path,
}

pub fn run(args: ConfigArgs) -> CmdResult {
    let path = match args.file {
        Some(path) => path,
        None => Config::path()?,
    };

    match args.action {
        ConfigAction::Get { key } => {
            let config = Config::load_from(&path)?;
            let value = config
                .get(&key)
                .ok_or_else(|| format!("unknown key: {key}"))?;
            println!("{value}");
        }
        ConfigAction::Set { key, value } => set(&path, &key, &value)?,
        ConfigAction::Show { json } => {
            let config = Config::load_from(&path)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&config)?);
            } else {
                print!("{}", toml::to_string_pretty(&config)?);
            }
        }
        ConfigAction::Limits => {
            let limits = Config::load_from(&path)?.limits();
            for (kind, limit) in [("main", limits.main), ("extra", limits.extra)] {
                println!("{kind}: 1..={} {}", limit.max, limit.unit);
            }
        }
        ConfigAction::Reset => {
            Config::default().save_to(&path)?;
            println!("wrote defaults to {}", path.display());
        }
        ConfigAction::Path => println!("{}", path.display()),
    }
    Ok(())
}

fn set(path: &Path, key: &str, value: &str) -> CmdResult {
    let mut config = Config::load_from(path)?;
    let before = config.get(key);
    config.apply(key, value)?;
    config.save_to(path)?;

    let after = config.get(key).unwrap_or_default();
    match before {
        Some(before) if before != after => println!("{key}: {before} -> {after}"),
        _ => println!("{key}: {after} (unchanged)"),
    }
    Ok(())
}
