//! Backend configuration, resolved once at startup.
//!
//! The config file lives at `~/.ravechi/config.json` (camelCase keys). Which
//! backend serves a process is decided exactly once, when the config is
//! loaded: a configured relational backend wins, otherwise the auth/document
//! backend, otherwise local-only. There is no per-request fallback between
//! backends; the only in-flight recovery is the relational adapter's
//! schema-mismatch retry, which stays inside that backend.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::DataError;

/// Connection settings for the relational backend (Supabase/PostgREST).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationalSettings {
    /// Project base URL, e.g. `https://xyzcompany.supabase.co`.
    pub url: String,
    /// The anon/service API key sent as both `apikey` and bearer token.
    pub api_key: String,
}

/// Connection settings for the auth/document backend (Firestore REST).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentSettings {
    pub project_id: String,
    pub api_key: String,
}

/// Which persistence backend this process uses.
#[derive(Debug, Clone)]
pub enum BackendConfig {
    Relational(RelationalSettings),
    AuthDocument(DocumentSettings),
    LocalOnly,
}

impl BackendConfig {
    pub fn is_local_only(&self) -> bool {
        matches!(self, BackendConfig::LocalOnly)
    }

    /// Load from the canonical config file. A missing file means local-only
    /// mode, not an error; an unreadable or unparsable file is an error.
    pub fn load() -> Result<Self, DataError> {
        Self::from_file(&config_path()?)
    }

    pub fn from_file(path: &Path) -> Result<Self, DataError> {
        if !path.exists() {
            log::info!("config: {} not found, running local-only", path.display());
            return Ok(BackendConfig::LocalOnly);
        }

        let content = fs::read_to_string(path)?;
        let file: ConfigFile = serde_json::from_str(&content)
            .map_err(|e| DataError::Config(format!("{}: {}", path.display(), e)))?;
        Ok(file.resolve())
    }
}

/// Raw shape of `~/.ravechi/config.json`. Both backend sections are
/// optional; a section with blank credentials counts as unconfigured.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    #[serde(default)]
    supabase: Option<RelationalSettings>,
    #[serde(default)]
    firebase: Option<DocumentSettings>,
}

impl ConfigFile {
    fn resolve(self) -> BackendConfig {
        if let Some(relational) = self.supabase {
            if !relational.url.trim().is_empty() && !relational.api_key.trim().is_empty() {
                return BackendConfig::Relational(relational);
            }
        }
        if let Some(document) = self.firebase {
            if !document.project_id.trim().is_empty() && !document.api_key.trim().is_empty() {
                return BackendConfig::AuthDocument(document);
            }
        }
        BackendConfig::LocalOnly
    }
}

/// Canonical config file path (`~/.ravechi/config.json`).
pub fn config_path() -> Result<PathBuf, DataError> {
    let home = dirs::home_dir()
        .ok_or_else(|| DataError::Config("could not find home directory".to_string()))?;
    Ok(home.join(".ravechi").join("config.json"))
}
