use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use time::OffsetDateTime;

use crate::clock::now_local;
use crate::error::ConversationStoreError;
use crate::paths::StorePaths;
use crate::schema::{format_id, format_timestamp, Conversation};

/// Collision suffixes tried before giving up on an id.
const MAX_ID_SUFFIX: u32 = 1000;

#[derive(Debug, Clone)]
pub struct ConversationStore {
    paths: StorePaths,
}

impl ConversationStore {
    #[must_use]
    pub fn new(paths: StorePaths) -> Self {
        Self { paths }
    }

    pub fn from_env() -> Result<Self, ConversationStoreError> {
        StorePaths::from_env().map(Self::new)
    }

    #[must_use]
    pub fn paths(&self) -> &StorePaths {
        &self.paths
    }

    #[must_use]
    pub fn root(&self) -> PathBuf {
        self.paths.conversations_dir()
    }

    /// Persists a finished exchange under the current local time.
    pub fn save_new(
        &self,
        message: &str,
        response: &str,
        context: &str,
    ) -> Result<Conversation, ConversationStoreError> {
        self.save_new_at(now_local(), message, response, context)
    }

    pub fn save_new_at(
        &self,
        at: OffsetDateTime,
        message: &str,
        response: &str,
        context: &str,
    ) -> Result<Conversation, ConversationStoreError> {
        let root = self.root();
        fs::create_dir_all(&root).map_err(|source| {
            ConversationStoreError::io("creating conversations directory", &root, source)
        })?;

        let base_id = format_id(at)?;
        let timestamp = format_timestamp(at)?;

        for attempt in 1..=MAX_ID_SUFFIX {
            let id = if attempt == 1 {
                base_id.clone()
            } else {
                format!("{base_id}-{attempt}")
            };
            let path = self.paths.conversation_file(&id);

            let file = match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(file) => file,
                Err(source) if source.kind() == ErrorKind::AlreadyExists => continue,
                Err(source) => {
                    return Err(ConversationStoreError::io(
                        "creating conversation file",
                        &path,
                        source,
                    ));
                }
            };

            let conversation = Conversation {
                id,
                timestamp,
                message: message.to_string(),
                response: response.to_string(),
                file_path: path.display().to_string(),
                context: context.to_string(),
            };
            write_claimed(&path, file, &conversation)?;

            tracing::debug!(id = %conversation.id, path = %path.display(), "saved conversation");
            return Ok(conversation);
        }

        Err(ConversationStoreError::io(
            "allocating a conversation id",
            root,
            std::io::Error::new(ErrorKind::AlreadyExists, "every id suffix is taken"),
        ))
    }

    /// Every readable conversation, newest first.
    ///
    /// Unreadable or malformed files are skipped with a warning. Records without a `file_path`
    /// get it filled in and written back.
    pub fn list(&self) -> Result<Vec<Conversation>, ConversationStoreError> {
        let root = self.root();
        let entries = match fs::read_dir(&root) {
            Ok(entries) => entries,
            Err(source) if source.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(ConversationStoreError::io(
                    "listing conversations directory",
                    &root,
                    source,
                ));
            }
        };

        let mut conversations = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| {
                ConversationStoreError::io("listing conversations directory", &root, source)
            })?;
            let path = entry.path();
            if !path.is_file() || path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }

            match read_conversation(&path) {
                Ok(conversation) => conversations.push(conversation),
                Err(error) => {
                    tracing::warn!(path = %path.display(), %error, "skipping conversation file");
                }
            }
        }

        conversations.sort_by(|a, b| id_sort_key(&b.id).cmp(&id_sort_key(&a.id)));
        Ok(conversations)
    }

    pub fn latest(&self) -> Result<Conversation, ConversationStoreError> {
        self.list()?
            .into_iter()
            .next()
            .ok_or_else(|| ConversationStoreError::NoConversations { root: self.root() })
    }

    pub fn get(&self, id: &str) -> Result<Conversation, ConversationStoreError> {
        let path = self.checked_path(id)?;
        if !path.is_file() {
            return Err(ConversationStoreError::NotFound {
                id: id.to_string(),
                root: self.root(),
            });
        }
        read_conversation(&path)
    }

    /// Removes the conversation file and returns its path.
    pub fn delete(&self, id: &str) -> Result<PathBuf, ConversationStoreError> {
        let path = self.checked_path(id)?;
        match fs::remove_file(&path) {
            Ok(()) => {
                tracing::debug!(id, path = %path.display(), "deleted conversation");
                Ok(path)
            }
            Err(source) if source.kind() == ErrorKind::NotFound => {
                Err(ConversationStoreError::NotFound {
                    id: id.to_string(),
                    root: self.root(),
                })
            }
            Err(source) => Err(ConversationStoreError::io(
                "deleting conversation file",
                &path,
                source,
            )),
        }
    }

    fn checked_path(&self, id: &str) -> Result<PathBuf, ConversationStoreError> {
        let valid = !id.is_empty()
            && !id.starts_with('.')
            && !id.contains(['/', '\\'])
            && !id.contains("..");
        if !valid {
            return Err(ConversationStoreError::InvalidId { id: id.to_string() });
        }
        Ok(self.paths.conversation_file(id))
    }
}

fn read_conversation(path: &Path) -> Result<Conversation, ConversationStoreError> {
    let data = fs::read_to_string(path)
        .map_err(|source| ConversationStoreError::io("reading conversation file", path, source))?;
    let mut conversation: Conversation = serde_json::from_str(&data)
        .map_err(|source| ConversationStoreError::json_parse(path, source))?;

    if conversation.parsed_timestamp().is_none() {
        return Err(ConversationStoreError::InvalidTimestamp {
            path: path.to_path_buf(),
            value: conversation.timestamp,
        });
    }

    if conversation.file_path.is_empty() {
        conversation.file_path = path.display().to_string();
        if let Err(error) = rewrite(path, &conversation) {
            tracing::warn!(path = %path.display(), %error, "could not back-fill file_path");
        }
    }

    Ok(conversation)
}

/// Fills a file just created with `create_new`. On failure the file is removed again, so a
/// half-written record never holds on to its id.
fn write_claimed<W: Write>(
    path: &Path,
    mut file: W,
    conversation: &Conversation,
) -> Result<(), ConversationStoreError> {
    let written = serde_json::to_string_pretty(conversation)
        .map_err(|source| ConversationStoreError::json_serialize(path, source))
        .and_then(|json| {
            file.write_all(json.as_bytes())
                .and_then(|()| file.flush())
                .map_err(|source| {
                    ConversationStoreError::io("writing conversation file", path, source)
                })
        });
    drop(file);

    if written.is_err() {
        if let Err(error) = fs::remove_file(path) {
            tracing::warn!(path = %path.display(), %error, "could not remove partial conversation file");
        }
    }
    written
}

fn rewrite(path: &Path, conversation: &Conversation) -> Result<(), ConversationStoreError> {
    let json = serde_json::to_string_pretty(conversation)
        .map_err(|source| ConversationStoreError::json_serialize(path, source))?;
    fs::write(path, json)
        .map_err(|source| ConversationStoreError::io("rewriting conversation file", path, source))
}

/// Orders `20250101120000-10` after `20250101120000-9`.
fn id_sort_key(id: &str) -> (&str, u32) {
    match id.rsplit_once('-') {
        Some((base, suffix)) => match suffix.parse() {
            Ok(n) => (base, n),
            Err(_) => (id, 1),
        },
        None => (id, 1),
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::io::{self, Write};

    use super::{id_sort_key, write_claimed};
    use crate::error::ConversationStoreError;
    use crate::schema::Conversation;

    /// Accepts a few bytes, then fails like a full disk.
    struct FullDisk {
        accepted: usize,
    }

    impl Write for FullDisk {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if self.accepted >= 8 {
                return Err(io::Error::other("no space left on device"));
            }
            let take = buf.len().min(8 - self.accepted);
            self.accepted += take;
            Ok(take)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn failed_write_releases_the_claimed_id() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("20250101120000.json");
        fs::write(&path, "").expect("claim file");

        let conversation = Conversation {
            id: "20250101120000".to_string(),
            timestamp: "2025-01-01T12:00:00Z".to_string(),
            message: "m".to_string(),
            response: "r".to_string(),
            file_path: path.display().to_string(),
            context: String::new(),
        };
        let err = write_claimed(&path, FullDisk { accepted: 0 }, &conversation)
            .expect_err("write fails");

        assert!(matches!(
            err,
            ConversationStoreError::Io { operation: "writing conversation file", .. }
        ));
        assert!(!path.exists());
    }

    #[test]
    fn successful_write_keeps_the_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("20250101120000.json");
        let file = fs::File::create(&path).expect("claim file");

        let conversation = Conversation {
            id: "20250101120000".to_string(),
            timestamp: "2025-01-01T12:00:00Z".to_string(),
            message: "m".to_string(),
            response: "r".to_string(),
            file_path: path.display().to_string(),
            context: String::new(),
        };
        write_claimed(&path, file, &conversation).expect("write");

        let saved: Conversation =
            serde_json::from_str(&fs::read_to_string(&path).expect("read")).expect("json");
        assert_eq!(saved, conversation);
    }

    #[test]
    fn suffixed_ids_sort_numerically() {
        assert!(id_sort_key("20250101120000-10") > id_sort_key("20250101120000-9"));
        assert!(id_sort_key("20250101120000-2") > id_sort_key("20250101120000"));
        assert!(id_sort_key("20250101120001") > id_sort_key("20250101120000-3"));
    }
}
