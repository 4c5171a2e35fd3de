mod config;

pub use config::{AlertsConfig, Config, EngineConfig, InputConfig};

use std::path::PathBuf;

/// Returns `~/.config/kitchentimer[-dev]/` based on KITCHENTIMER_ENV.
///
/// Set KITCHENTIMER_ENV=dev to use development data directory.
///
/// # Errors
/// Returns an error if creating the config directory fails.
pub fn data_dir() -> std::io::Result<PathBuf> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("KITCHENTIMER_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("kitchentimer-dev")
    } else {
        base_dir.join("kitchentimer")
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
