//! One question/answer round: query tool -> streaming render -> saved conversation.

use std::io::{self, Write};

use asc_stream::{RenderOptions, Renderer, StreamError, StreamReconciler};
use conversation_store::{Conversation, ConversationStore, ConversationStoreError};
use thiserror::Error;

use crate::source::{Provider, QueryProcess};

#[derive(Debug, Error)]
pub enum ExchangeError {
    #[error("failed to start `{program}`: {source}")]
    Query {
        program: &'static str,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Stream(#[from] StreamError),

    #[error("the answer was shown but could not be saved: {0}")]
    Persist(#[from] ConversationStoreError),
}

/// The prompt sent to the query tool.
///
/// A non-empty context is folded in as `# Context` / `# Question` sections when the provider
/// takes one.
pub fn compose_prompt(provider: Provider, message: &str, context: &str) -> String {
    if context.is_empty() || !provider.accepts_context() {
        return message.to_string();
    }
    format!("# Context\n{context}\n\n# Question\n{message}")
}

pub struct Exchange<'a, R> {
    renderer: R,
    options: RenderOptions,
    held_out_lines: usize,
    store: &'a ConversationStore,
}

impl<'a, R: Renderer> Exchange<'a, R> {
    pub fn new(
        renderer: R,
        options: RenderOptions,
        held_out_lines: usize,
        store: &'a ConversationStore,
    ) -> Self {
        Self {
            renderer,
            options,
            held_out_lines,
            store,
        }
    }

    /// Asks `provider` and streams its answer to `sink`.
    pub fn ask<W: Write>(
        &self,
        provider: Provider,
        message: &str,
        context: &str,
        sink: W,
    ) -> Result<Conversation, ExchangeError> {
        let prompt = compose_prompt(provider, message, context);
        let source = QueryProcess::spawn(provider, &prompt).map_err(|source| {
            ExchangeError::Query {
                program: provider.program(),
                source,
            }
        })?;
        let recorded_context = if provider.accepts_context() { context } else { "" };
        self.run(source, sink, message, recorded_context)
    }

    /// Streams `source` to `sink`, then saves the exchange.
    ///
    /// Nothing is saved when the stream fails.
    pub fn run<I, W>(
        &self,
        source: I,
        sink: W,
        message: &str,
        context: &str,
    ) -> Result<Conversation, ExchangeError>
    where
        I: IntoIterator<Item = io::Result<String>>,
        W: Write,
    {
        let reconciler = StreamReconciler::new(
            &self.renderer,
            sink,
            self.options.clone(),
            self.held_out_lines,
        );
        let response = reconciler.run(source)?;
        let conversation = self.store.save_new(message, &response, context)?;
        tracing::debug!(
            id = %conversation.id,
            path = %conversation.file_path,
            response_bytes = response.len(),
            "exchange saved"
        );
        Ok(conversation)
    }
}

#[cfg(test)]
mod tests {
    use super::compose_prompt;
    use crate::source::Provider;

    #[test]
    fn context_is_prepended_for_sgpt_only() {
        assert_eq!(
            compose_prompt(Provider::Sgpt, "why?", "notes"),
            "# Context\nnotes\n\n# Question\nwhy?"
        );
        assert_eq!(compose_prompt(Provider::Perplexity, "why?", "notes"), "why?");
        assert_eq!(compose_prompt(Provider::Sgpt, "why?", ""), "why?");
    }
}
