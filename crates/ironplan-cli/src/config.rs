//! Configuration file management for ironplan.
//!
//! Provides a TOML-based config file at `~/.config/ironplan/config.toml` and a
//! resolution chain: CLI flag > env var > config file > default.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use ironplan_core::identity::TokenConfig;
use ironplan_db::config::DbConfig;

const DATABASE_URL_VAR: &str = "IRONPLAN_DATABASE_URL";
const TOKEN_SECRET_VAR: &str = "IRONPLAN_TOKEN_SECRET";

// -----------------------------------------------------------------------
// Config file types
// -----------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize)]
pub struct ConfigFile {
    pub database: DatabaseSection,
    pub auth: AuthSection,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DatabaseSection {
    pub url: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AuthSection {
    /// Hex-encoded token secret (64 hex chars = 32 bytes).
    pub token_secret: String,
}

// -----------------------------------------------------------------------
// Paths
// -----------------------------------------------------------------------

/// Return the ironplan config directory: `$XDG_CONFIG_HOME/ironplan` or
/// `~/.config/ironplan`, on every platform.
pub fn config_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(xdg).join("ironplan");
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("ironplan")
}

pub fn config_path() -> PathBuf {
    config_dir().join("config.toml")
}

// -----------------------------------------------------------------------
// Read / write
// -----------------------------------------------------------------------

/// Load and parse the config file. Returns an error if it does not exist.
pub fn load_config() -> Result<ConfigFile> {
    let path = config_path();
    let contents = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read config file at {}", path.display()))?;
    let config: ConfigFile = toml::from_str(&contents).context("failed to parse config file")?;
    Ok(config)
}

/// Serialize and write the config file, creating parent dirs as needed.
/// The file is readable by its owner only on Unix.
pub fn save_config(config: &ConfigFile) -> Result<()> {
    let path = config_path();
    let dir = config_dir();
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create config directory {}", dir.display()))?;

    let contents = toml::to_string_pretty(config).context("failed to serialize config")?;
    std::fs::write(&path, &contents)
        .with_context(|| format!("failed to write config file at {}", path.display()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o600);
        std::fs::set_permissions(&path, perms)
            .with_context(|| format!("failed to set permissions on {}", path.display()))?;
    }

    Ok(())
}

/// 32 random bytes, hex-encoded.
pub fn generate_token_secret() -> String {
    use rand::Rng;
    let mut bytes = [0u8; 32];
    rand::rng().fill(&mut bytes);
    hex::encode(bytes)
}

// -----------------------------------------------------------------------
// Resolved config
// -----------------------------------------------------------------------

/// Resolve only the database settings.
///
/// `cli_db_url` > `IRONPLAN_DATABASE_URL` > `database.url` in the config
/// file > [`DbConfig::DEFAULT_URL`].
pub fn resolve_db_config(cli_db_url: Option<&str>) -> DbConfig {
    db_config_from(cli_db_url, load_config().ok().as_ref())
}

fn db_config_from(cli_db_url: Option<&str>, file_config: Option<&ConfigFile>) -> DbConfig {
    let db_url = if let Some(url) = cli_db_url {
        url.to_string()
    } else if let Ok(url) = std::env::var(DATABASE_URL_VAR) {
        url
    } else if let Some(cfg) = file_config {
        cfg.database.url.clone()
    } else {
        DbConfig::DEFAULT_URL.to_string()
    };
    DbConfig::new(db_url)
}

/// Fully resolved configuration for commands that issue or verify tokens.
#[derive(Debug)]
pub struct IronplanConfig {
    pub db_config: DbConfig,
    pub token_config: TokenConfig,
}

impl IronplanConfig {
    /// Resolve the database settings as [`resolve_db_config`] does, plus the
    /// token secret: `IRONPLAN_TOKEN_SECRET` > `auth.token_secret` > error.
    pub fn resolve(cli_db_url: Option<&str>) -> Result<Self> {
        let file_config = load_config().ok();
        let db_config = db_config_from(cli_db_url, file_config.as_ref());

        let token_config = if let Ok(secret_hex) = std::env::var(TOKEN_SECRET_VAR) {
            TokenConfig::from_hex(&secret_hex)
                .with_context(|| format!("{TOKEN_SECRET_VAR} is not a usable secret"))?
        } else if let Some(ref cfg) = file_config {
            TokenConfig::from_hex(&cfg.auth.token_secret)
                .context("invalid token_secret in config file")?
        } else {
            bail!(
                "token secret not found; set {TOKEN_SECRET_VAR} or run `ironplan init` to create a config file"
            );
        };

        Ok(Self {
            db_config,
            token_config,
        })
    }
}
