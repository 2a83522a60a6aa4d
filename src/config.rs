use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
  pub remote: RemoteConfig,
  #[serde(default)]
  pub store: StoreConfig,
  #[serde(default)]
  pub cache: CacheConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RemoteConfig {
  /// Base URL of the remote service, e.g. "https://api.example.com/v2"
  pub base_url: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StoreConfig {
  /// Object store path override (defaults to the platform data directory)
  pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
  /// Default lifetime for cached third-party entries; 0 means never expire
  #[serde(default)]
  pub ttl_minutes: u64,
}

impl Default for CacheConfig {
  fn default() -> Self {
    Self { ttl_minutes: 0 }
  }
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./stockroom.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/stockroom/config.yaml
  /// 4. ~/.config/stockroom/config.yaml
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    match path {
      Some(p) => Self::load_from_path(&p),
      None => Err(eyre!(
        "No configuration file found. Create one at ~/.config/stockroom/config.yaml"
      )),
    }
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("stockroom.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("stockroom").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    let config: Config = serde_yaml::from_str(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))?;

    Ok(config)
  }

  /// Get the remote API token from environment variables.
  ///
  /// Checks STOCKROOM_API_TOKEN first, then API_TOKEN as fallback.
  pub fn get_api_token() -> Result<String> {
    std::env::var("STOCKROOM_API_TOKEN")
      .or_else(|_| std::env::var("API_TOKEN"))
      .map_err(|_| {
        eyre!("API token not found. Set STOCKROOM_API_TOKEN or API_TOKEN environment variable.")
      })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parses_a_minimal_config() {
    let yaml = "remote:\n  base_url: https://api.example.com/v2\n";
    let config: Config = serde_yaml::from_str(yaml).unwrap();

    assert_eq!(config.remote.base_url, "https://api.example.com/v2");
    assert_eq!(config.store.path, None);
    assert_eq!(config.cache.ttl_minutes, 0);
  }

  #[test]
  fn parses_overrides() {
    let yaml = "remote:\n  base_url: https://api.example.com/v2\nstore:\n  path: /tmp/stockroom.db\ncache:\n  ttl_minutes: 30\n";
    let config: Config = serde_yaml::from_str(yaml).unwrap();

    assert_eq!(config.store.path, Some(PathBuf::from("/tmp/stockroom.db")));
    assert_eq!(config.cache.ttl_minutes, 30);
  }
}
