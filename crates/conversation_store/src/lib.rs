mod clock;
mod context;
mod error;
mod paths;
mod schema;
mod store;

pub use clock::{capture_local_offset, now_local};
pub use error::ConversationStoreError;
pub use paths::{
    conversation_file_name, share_dir_from, StorePaths, CONTEXT_FILE_NAME, CONVERSATIONS_DIR,
    STYLE_FILE_NAME,
};
pub use schema::{format_id, Conversation};
pub use store::ConversationStore;
