use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::models::{AuthSession, User};
use crate::paths;

const STATE_FILE_NAME: &str = "state.toml";

/// Client state that outlives a single command: the interface language and the
/// signed-in session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Preferences {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session: Option<StoredSession>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredSession {
    pub token: String,
    pub logged_in_at: String,
    pub user: User,
}

impl Preferences {
    pub fn token(&self) -> Option<String> {
        self.session.as_ref().map(|session| session.token.clone())
    }

    pub fn user(&self) -> Option<&User> {
        self.session.as_ref().map(|session| &session.user)
    }
}

#[derive(Debug, Clone)]
pub struct PreferenceStore {
    path: PathBuf,
}

impl PreferenceStore {
    pub fn open_default() -> Self {
        Self::in_dir(paths::base_dir())
    }

    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(STATE_FILE_NAME),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<Preferences> {
        if !self.path.exists() {
            return Ok(Preferences::default());
        }
        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read client state: {}", self.path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("failed to parse client state: {}", self.path.display()))
    }

    pub fn save(&self, preferences: &Preferences) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)
                .with_context(|| format!("failed to create state directory: {}", dir.display()))?;
        }
        let content =
            toml::to_string(preferences).with_context(|| "failed to serialize client state")?;
        fs::write(&self.path, content)
            .with_context(|| format!("failed to write client state: {}", self.path.display()))
    }

    pub fn set_locale(&self, locale: &str) -> Result<()> {
        let mut preferences = self.load()?;
        preferences.locale = Some(locale.trim().to_lowercase());
        self.save(&preferences)
    }

    pub fn store_session(&self, session: &AuthSession) -> Result<StoredSession> {
        let logged_in_at = OffsetDateTime::now_utc()
            .format(&Rfc3339)
            .with_context(|| "failed to format login time")?;
        let stored = StoredSession {
            token: session.token.clone(),
            logged_in_at,
            user: session.user.clone(),
        };
        let mut preferences = self.load()?;
        preferences.session = Some(stored.clone());
        self.save(&preferences)?;
        Ok(stored)
    }

    /// Forgets the signed-in session. Returns whether one was stored.
    pub fn clear_session(&self) -> Result<bool> {
        let mut preferences = self.load()?;
        let had_session = preferences.session.take().is_some();
        if had_session {
            self.save(&preferences)?;
        }
        Ok(had_session)
    }
}
