//! The signed-in accounts, persisted between CLI invocations.

use std::io;
use std::path::{Path, PathBuf};

use guestbook_common::account::AccountId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub account_id: Option<AccountId>,
    /// Accounts signed in so far, in sign-in order.
    #[serde(default)]
    pub accounts: Vec<AccountId>,
}

/// `<config dir>/guestbook/session.json`.
pub fn default_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("guestbook")
        .join("session.json")
}

impl Session {
    /// A missing file is an empty session.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        match std::fs::read(path) {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e.into()),
        }
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_vec_pretty(self)?)?;
        Ok(())
    }
}
