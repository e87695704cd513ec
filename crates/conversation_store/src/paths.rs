use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::ConversationStoreError;

pub const DATA_DIR: [&str; 2] = [".asc", "data"];
pub const SHARE_DIR: [&str; 3] = [".local", "share", "asc"];
pub const APP_DIR_NAME: &str = "asc";
pub const CONVERSATIONS_DIR: &str = "conversations";
pub const STYLE_FILE_NAME: &str = "ggpt_glow_style.json";
pub const CONTEXT_FILE_NAME: &str = "context.txt";

/// Where conversations, the renderer style and the context file live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorePaths {
    data_dir: PathBuf,
    share_dir: PathBuf,
}

impl StorePaths {
    #[must_use]
    pub fn new(data_dir: impl Into<PathBuf>, share_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            share_dir: share_dir.into(),
        }
    }

    /// Data dir under `~/.asc/data`; share dir under `$XDG_DATA_HOME/asc` or
    /// `~/.local/share/asc`.
    pub fn from_env() -> Result<Self, ConversationStoreError> {
        let home = dirs::home_dir();
        let share_dir = share_dir_from(std::env::var_os("XDG_DATA_HOME"), home.as_deref())
            .ok_or(ConversationStoreError::HomeDirUnavailable)?;
        let home = home.ok_or(ConversationStoreError::HomeDirUnavailable)?;
        Ok(Self::new(home.join(DATA_DIR[0]).join(DATA_DIR[1]), share_dir))
    }

    #[must_use]
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    #[must_use]
    pub fn share_dir(&self) -> &Path {
        &self.share_dir
    }

    #[must_use]
    pub fn conversations_dir(&self) -> PathBuf {
        self.data_dir.join(CONVERSATIONS_DIR)
    }

    #[must_use]
    pub fn conversation_file(&self, id: &str) -> PathBuf {
        self.conversations_dir().join(conversation_file_name(id))
    }

    #[must_use]
    pub fn style_file(&self) -> PathBuf {
        self.share_dir.join(STYLE_FILE_NAME)
    }

    /// The style file, only when it exists.
    #[must_use]
    pub fn existing_style_file(&self) -> Option<PathBuf> {
        let path = self.style_file();
        path.is_file().then_some(path)
    }

    #[must_use]
    pub fn context_file(&self) -> PathBuf {
        self.share_dir.join(CONTEXT_FILE_NAME)
    }

    pub fn ensure_share_dir(&self) -> Result<(), ConversationStoreError> {
        fs::create_dir_all(&self.share_dir).map_err(|source| {
            ConversationStoreError::io("creating share directory", &self.share_dir, source)
        })?;
        tracing::debug!(path = %self.share_dir.display(), "share directory ensured");
        Ok(())
    }
}

/// Resolves the share directory from `XDG_DATA_HOME` and the home directory.
///
/// An empty `XDG_DATA_HOME` counts as unset.
#[must_use]
pub fn share_dir_from(xdg_data_home: Option<OsString>, home: Option<&Path>) -> Option<PathBuf> {
    if let Some(xdg) = xdg_data_home.filter(|value| !value.is_empty()) {
        return Some(PathBuf::from(xdg).join(APP_DIR_NAME));
    }
    home.map(|home| home.join(SHARE_DIR[0]).join(SHARE_DIR[1]).join(SHARE_DIR[2]))
}

#[must_use]
pub fn conversation_file_name(id: &str) -> String {
    format!("{id}.json")
}
