//! Token storage for the action API.
//!
//! Reads/writes <config_dir>/ledgerbridge/auth.json (0600 on Unix).
//! The environment variable wins over the saved file so CI and headless
//! runs never need to touch disk.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConnectorError;

pub const TOKEN_ENV: &str = "LEDGERBRIDGE_TOKEN";

/// Credentials stored locally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    /// Bearer token for the integration platform
    pub token: String,
    /// Override for the action API base URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,
}

impl Credentials {
    pub fn new(token: impl Into<String>) -> Self {
        Self { token: token.into(), api_base: None }
    }
}

/// Returns the path to the credentials file.
pub fn auth_file_path() -> Option<PathBuf> {
    dirs::config_dir().map(|c| c.join("ledgerbridge").join("auth.json"))
}

/// Load saved credentials. Returns None if none are saved or the file is
/// invalid.
pub fn load_credentials(path: &Path) -> Option<Credentials> {
    let contents = std::fs::read_to_string(path).ok()?;
    match serde_json::from_str(&contents) {
        Ok(creds) => Some(creds),
        Err(e) => {
            log::warn!("ignoring unreadable credentials file {}: {}", path.display(), e);
            None
        }
    }
}

/// Save credentials, creating the parent directory. Sets 0600 permissions
/// on Unix.
pub fn save_credentials(path: &Path, creds: &Credentials) -> Result<(), ConnectorError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| ConnectorError::Io(format!("Failed to create config directory: {}", e)))?;
    }

    let contents = serde_json::to_string_pretty(creds)
        .map_err(|e| ConnectorError::Parse(format!("Failed to serialize credentials: {}", e)))?;

    std::fs::write(path, &contents)
        .map_err(|e| ConnectorError::Io(format!("Failed to write auth file: {}", e)))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let permissions = std::fs::Permissions::from_mode(0o600);
        std::fs::set_permissions(path, permissions)
            .map_err(|e| ConnectorError::Io(format!("Failed to set file permissions: {}", e)))?;
    }

    Ok(())
}

pub fn delete_credentials(path: &Path) -> Result<(), ConnectorError> {
    if path.exists() {
        std::fs::remove_file(path)
            .map_err(|e| ConnectorError::Io(format!("Failed to delete auth file: {}", e)))?;
    }
    Ok(())
}

/// Resolve the bearer token: explicit > `LEDGERBRIDGE_TOKEN` > saved file.
pub fn resolve_token(explicit: Option<&str>) -> Result<String, ConnectorError> {
    let env = std::env::var(TOKEN_ENV).ok();
    let saved = auth_file_path().and_then(|p| load_credentials(&p));
    pick_token(explicit, env.as_deref(), saved.as_ref())
}

fn pick_token(
    explicit: Option<&str>,
    env: Option<&str>,
    saved: Option<&Credentials>,
) -> Result<String, ConnectorError> {
    let non_empty = |s: &&str| !s.trim().is_empty();
    explicit
        .filter(non_empty)
        .or_else(|| env.filter(non_empty))
        .or_else(|| saved.map(|c| c.token.as_str()).filter(non_empty))
        .map(str::to_string)
        .ok_or(ConnectorError::NotAuthenticated)
}
