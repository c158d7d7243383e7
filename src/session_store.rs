//! Named storage states kept on disk between runs

use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::errors::{Error, Result};
use crate::types::StorageState;

const METADATA_FILE: &str = "metadata.json";
const STATE_FILE: &str = "storage_state.json";

/// Metadata about a saved session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionMetadata {
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub last_used: DateTime<Utc>,
    pub cookie_count: usize,
    pub origin_count: usize,
}

/// Directory of saved sessions, one subdirectory per name
pub struct SessionStore {
    sessions_dir: PathBuf,
}

impl SessionStore {
    /// The store under `~/.webprompt/sessions`
    pub fn new() -> Result<Self> {
        let home_dir = dirs::home_dir().context("Unable to determine home directory")?;
        Self::at(home_dir.join(".webprompt").join("sessions"))
    }

    pub fn at(dir: impl Into<PathBuf>) -> Result<Self> {
        let sessions_dir = dir.into();
        fs::create_dir_all(&sessions_dir)?;
        Ok(Self { sessions_dir })
    }

    pub fn dir(&self) -> &Path {
        &self.sessions_dir
    }

    fn session_dir(&self, name: &str) -> Result<PathBuf> {
        let valid = !name.is_empty()
            && name != "."
            && name != ".."
            && !name.contains(['/', '\\']);
        if !valid {
            return Err(Error::config(format!("Invalid session name '{}'", name)));
        }
        Ok(self.sessions_dir.join(name))
    }

    pub fn exists(&self, name: &str) -> bool {
        self.session_dir(name)
            .map(|dir| dir.join(STATE_FILE).exists())
            .unwrap_or(false)
    }

    /// Write `state` under `name`, replacing what was there
    pub fn save(&self, name: &str, state: &StorageState) -> Result<SessionMetadata> {
        let dir = self.session_dir(name)?;
        fs::create_dir_all(&dir)?;

        let created_at = self
            .read_metadata(&dir)
            .map(|m| m.created_at)
            .unwrap_or_else(Utc::now);
        let metadata = SessionMetadata {
            name: name.to_string(),
            created_at,
            last_used: Utc::now(),
            cookie_count: state.cookies.len(),
            origin_count: state.origins.len(),
        };

        fs::write(dir.join(STATE_FILE), serde_json::to_string_pretty(state)?)?;
        fs::write(
            dir.join(METADATA_FILE),
            serde_json::to_string_pretty(&metadata)?,
        )?;

        info!(
            "Saved session '{}' ({} cookies, {} origins)",
            name, metadata.cookie_count, metadata.origin_count
        );
        Ok(metadata)
    }

    /// The state saved under `name`, `None` if there is none
    pub fn load(&self, name: &str) -> Result<Option<StorageState>> {
        let dir = self.session_dir(name)?;
        let path = dir.join(STATE_FILE);
        if !path.exists() {
            debug!("No saved session '{}'", name);
            return Ok(None);
        }

        let state: StorageState = serde_json::from_str(&fs::read_to_string(&path)?)?;

        if let Some(mut metadata) = self.read_metadata(&dir) {
            metadata.last_used = Utc::now();
            fs::write(
                dir.join(METADATA_FILE),
                serde_json::to_string_pretty(&metadata)?,
            )?;
        }

        Ok(Some(state))
    }

    /// Saved sessions, most recently used first
    pub fn list(&self) -> Result<Vec<SessionMetadata>> {
        Ok(self
            .entries()?
            .into_iter()
            .map(|(_, metadata)| metadata)
            .collect())
    }

    /// Session directories with readable metadata, most recently used first
    fn entries(&self) -> Result<Vec<(PathBuf, SessionMetadata)>> {
        let mut sessions = Vec::new();
        for entry in fs::read_dir(&self.sessions_dir)? {
            let path = entry?.path();
            if path.is_dir()
                && let Some(metadata) = self.read_metadata(&path)
            {
                sessions.push((path, metadata));
            }
        }
        sessions.sort_by(|a, b| b.1.last_used.cmp(&a.1.last_used));
        Ok(sessions)
    }

    pub fn delete(&self, name: &str) -> Result<()> {
        let dir = self.session_dir(name)?;
        if !dir.exists() {
            return Err(Error::config(format!("Session '{}' does not exist", name)));
        }
        fs::remove_dir_all(&dir)?;
        info!("Deleted session '{}'", name);
        Ok(())
    }

    /// Delete sessions unused for more than `days` days
    ///
    /// An age reaching past the earliest representable date matches nothing.
    pub fn cleanup(&self, days: u32) -> Result<usize> {
        let Some(cutoff) = chrono::Duration::try_days(i64::from(days))
            .and_then(|age| Utc::now().checked_sub_signed(age))
        else {
            debug!("No session can be older than {} days", days);
            return Ok(0);
        };
        let mut deleted = 0;

        for (dir, metadata) in self.entries()? {
            if metadata.last_used < cutoff {
                fs::remove_dir_all(&dir)?;
                debug!("Removed stale session at {}", dir.display());
                deleted += 1;
            }
        }

        Ok(deleted)
    }

    fn read_metadata(&self, dir: &Path) -> Option<SessionMetadata> {
        let json = fs::read_to_string(dir.join(METADATA_FILE)).ok()?;
        serde_json::from_str(&json).ok()
    }
}

#[cfg(test)]
#[path = "session_store_test.rs"]
mod session_store_test;
