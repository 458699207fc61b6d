// Application settings
// Loaded from <config_dir>/ledgerbridge/settings.toml

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use ledgerbridge_journal::FetchMode;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Reading or writing the settings file failed.
    Io(String),
    /// The file is not valid TOML for [`Settings`].
    Parse(String),
    /// The file parsed but a value is out of range.
    Validation(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(msg) => write!(f, "settings I/O error: {msg}"),
            Self::Parse(msg) => write!(f, "invalid settings file: {msg}"),
            Self::Validation(msg) => write!(f, "invalid setting: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // Connection
    /// Connection key of the accounting system inside the integration platform.
    pub connection_key: String,
    pub action_api_base: String,
    /// Base URL of the mapping store REST API.
    pub mapping_api_base: String,

    // Action names
    pub journal_action: String,
    pub ledger_accounts_action: String,
    pub invoices_action: String,
    pub create_invoice_action: String,
    /// Account options for category and contractor mapping.
    pub accounts_action: String,
    pub vendors_action: String,
    /// Data collection whose field schema drives the invoice form.
    pub invoices_collection: String,

    // Journal view
    pub page_size: usize,
    pub fetch_mode: FetchMode,
    /// Cursor pages followed per account. 1 = first page only.
    pub max_pages_per_account: usize,

    // HTTP
    /// Retries for lookups and mapping calls. Journal fetches and creates
    /// are always sent once.
    pub max_retries: u32,
    pub timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            // Connection
            connection_key: "netsuite".to_string(),
            action_api_base: "https://api.integration.app".to_string(),
            mapping_api_base: "http://localhost:3000".to_string(),
            // Action names
            journal_action: "list-journal-entries".to_string(),
            ledger_accounts_action: "list-ledger-accounts".to_string(),
            invoices_action: "list-invoices".to_string(),
            create_invoice_action: "create-invoice".to_string(),
            accounts_action: "get-accounts".to_string(),
            vendors_action: "get-vendors".to_string(),
            invoices_collection: "invoices".to_string(),
            // Journal view
            page_size: 10,
            fetch_mode: FetchMode::Sequential,
            max_pages_per_account: 1,
            // HTTP
            max_retries: 3,
            timeout_secs: 30,
        }
    }
}

impl Settings {
    /// Get the settings file path
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|c| c.join("ledgerbridge").join("settings.toml"))
    }

    /// Load settings from the default location. A missing file yields
    /// defaults; an unreadable or invalid one is an error.
    pub fn load() -> Result<Self, ConfigError> {
        match Self::config_path() {
            Some(path) => Self::load_from(&path),
            None => {
                log::debug!("no config directory on this platform, using default settings");
                Ok(Self::default())
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            log::debug!("{} not found, using default settings", path.display());
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("{}: {e}", path.display())))?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        let settings: Self = toml::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Write settings to `path`, creating the parent directory.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        self.validate()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::Io(e.to_string()))?;
        }
        fs::write(path, self.to_toml()?).map_err(|e| ConfigError::Io(e.to_string()))
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        let path = Self::config_path()
            .ok_or_else(|| ConfigError::Io("could not determine config directory".to_string()))?;
        self.save_to(&path)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.page_size == 0 {
            return Err(ConfigError::Validation("page_size must be at least 1".into()));
        }
        if self.max_pages_per_account == 0 {
            return Err(ConfigError::Validation("max_pages_per_account must be at least 1".into()));
        }
        for (name, value) in [
            ("connection_key", &self.connection_key),
            ("journal_action", &self.journal_action),
            ("accounts_action", &self.accounts_action),
            ("vendors_action", &self.vendors_action),
            ("invoices_collection", &self.invoices_collection),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::Validation(format!("{name} must not be empty")));
            }
        }
        for (name, base) in [
            ("action_api_base", &self.action_api_base),
            ("mapping_api_base", &self.mapping_api_base),
        ] {
            if !(base.starts_with("http://") || base.starts_with("https://")) {
                return Err(ConfigError::Validation(format!("{name} must be an http(s) URL, got {base:?}")));
            }
        }
        Ok(())
    }
}
