use std::fs;
use std::io::ErrorKind;

use crate::error::ConversationStoreError;
use crate::store::ConversationStore;

impl ConversationStore {
    /// The saved context, or an empty string when none is set.
    pub fn load_context(&self) -> Result<String, ConversationStoreError> {
        let path = self.paths().context_file();
        match fs::read_to_string(&path) {
            Ok(context) => Ok(context),
            Err(source) if source.kind() == ErrorKind::NotFound => Ok(String::new()),
            Err(source) => Err(ConversationStoreError::io(
                "reading context file",
                &path,
                source,
            )),
        }
    }

    pub fn save_context(&self, context: &str) -> Result<(), ConversationStoreError> {
        self.paths().ensure_share_dir()?;
        let path = self.paths().context_file();
        fs::write(&path, context)
            .map_err(|source| ConversationStoreError::io("writing context file", &path, source))?;
        tracing::debug!(path = %path.display(), bytes = context.len(), "saved context");
        Ok(())
    }

    /// Removes the context file. Clearing an unset context is not an error.
    pub fn clear_context(&self) -> Result<(), ConversationStoreError> {
        let path = self.paths().context_file();
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(source) if source.kind() == ErrorKind::NotFound => Ok(()),
            Err(source) => Err(ConversationStoreError::io(
                "removing context file",
                &path,
                source,
            )),
        }
    }
}
