use serde::{Deserialize, Serialize};
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::OffsetDateTime;

use crate::error::ConversationStoreError;

/// One prompt/response exchange, stored as `<id>.json`.
///
/// Files are read leniently: unknown fields are ignored and `file_path`/`context` may be
/// missing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    /// Local creation time as `YYYYMMDDhhmmss`, with `-N` appended when that second was taken.
    pub id: String,
    /// RFC3339 creation time.
    pub timestamp: String,
    pub message: String,
    pub response: String,
    #[serde(default)]
    pub file_path: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub context: String,
}

impl Conversation {
    pub fn parsed_timestamp(&self) -> Option<OffsetDateTime> {
        OffsetDateTime::parse(&self.timestamp, &Rfc3339).ok()
    }

    /// `YYYY-MM-DD hh:mm:ss` in the offset the conversation was recorded with.
    ///
    /// Falls back to the raw timestamp when it does not parse.
    #[must_use]
    pub fn display_date(&self) -> String {
        let format = format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
        self.parsed_timestamp()
            .and_then(|timestamp| timestamp.format(format).ok())
            .unwrap_or_else(|| self.timestamp.clone())
    }

    /// Markdown transcript used by the history viewer.
    #[must_use]
    pub fn to_transcript(&self) -> String {
        let mut out = format!("# Conversation {}\n\n", self.id);
        if !self.context.is_empty() {
            out.push_str(&format!("## Context\n{}\n\n", self.context));
        }
        out.push_str(&format!("## User\n{}\n\n## AI\n{}", self.message, self.response));
        out
    }

    /// Prompt that carries this exchange forward as context for a follow-up question.
    #[must_use]
    pub fn as_follow_up_context(&self) -> String {
        let mut out = String::new();
        if !self.context.is_empty() {
            out.push_str(&self.context);
            out.push_str("\n\n");
        }
        out.push_str(&format!("## User\n{}\n\n## AI\n{}", self.message, self.response));
        out
    }
}

/// Formats `at` as a conversation id.
pub fn format_id(at: OffsetDateTime) -> Result<String, ConversationStoreError> {
    at.format(format_description!(
        "[year][month][day][hour][minute][second]"
    ))
    .map_err(ConversationStoreError::ClockFormat)
}

pub(crate) fn format_timestamp(at: OffsetDateTime) -> Result<String, ConversationStoreError> {
    at.format(&Rfc3339).map_err(ConversationStoreError::ClockFormat)
}
