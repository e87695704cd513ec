use std::io::{self, Write};

use anyhow::{bail, Context, Result};
use asc_stream::render::prewarm_highlighting;
use asc_stream::{
    render_width, renderer_for, terminal_columns, RenderOptions, RendererKind, StreamConfig,
};
use conversation_store::{Conversation, ConversationStore};

use crate::browser::{self, BrowserOutcome, Viewer};
use crate::cli::{Command, ContextAction};
use crate::editor;
use crate::exchange::Exchange;
use crate::preflight;
use crate::source::Provider;

pub fn version_line() -> String {
    format!("asc version {}", env!("CARGO_PKG_VERSION"))
}

pub struct App {
    store: ConversationStore,
    config: StreamConfig,
}

impl App {
    pub fn new(store: ConversationStore, config: StreamConfig) -> Self {
        Self { store, config }
    }

    pub fn from_env() -> Result<Self> {
        let store = ConversationStore::from_env().context("resolving asc directories")?;
        Ok(Self::new(store, StreamConfig::from_env()))
    }

    pub fn store(&self) -> &ConversationStore {
        &self.store
    }

    pub fn run(&self, command: Command) -> Result<()> {
        match command {
            Command::New(args) => self
                .new_conversation(Provider::from_flag(args.perplexity), &args.message())
                .map(drop),
            Command::Append(args) => self.append(args.id.as_deref(), &args.message()).map(drop),
            Command::Edit(args) => self.edit(args.id.as_deref()).map(drop),
            Command::View => self.view(),
            Command::Context { action } => self.context(action, &mut io::stdout().lock()),
            Command::Version => {
                println!("{}", version_line());
                Ok(())
            }
        }
    }

    fn render_width(&self) -> usize {
        render_width(terminal_columns(), self.config.width_padding)
    }

    pub fn render_options(&self) -> RenderOptions {
        let options = RenderOptions::default().with_width(self.render_width());
        match self.store.paths().existing_style_file() {
            Some(style) => {
                tracing::debug!(path = %style.display(), "using custom style");
                options.with_style(style)
            }
            None => options,
        }
    }

    fn preflight(&self, provider: Option<Provider>, extra: &[&'static str]) -> Result<()> {
        let mut programs = preflight::required_programs(provider, self.config.renderer);
        programs.extend_from_slice(extra);
        preflight::run(self.store.paths(), &programs)?;
        Ok(())
    }

    fn ask(&self, provider: Provider, message: &str, context: &str) -> Result<Conversation> {
        self.preflight(Some(provider), &[])?;
        if self.config.renderer == RendererKind::Builtin {
            let _ = std::thread::Builder::new()
                .name("markdown-highlight-prewarm".to_string())
                .spawn(prewarm_highlighting);
        }
        let exchange = Exchange::new(
            renderer_for(&self.config),
            self.render_options(),
            self.config.held_out_lines,
            &self.store,
        );
        let conversation = exchange.ask(provider, message, context, io::stdout().lock())?;
        tracing::debug!(id = %conversation.id, "conversation saved");
        Ok(conversation)
    }

    pub fn new_conversation(&self, provider: Provider, message: &str) -> Result<Conversation> {
        let context = self.store.load_context()?;
        self.ask(provider, message, &context)
    }

    pub fn append(&self, id: Option<&str>, message: &str) -> Result<Conversation> {
        let previous = self.resolve(id)?;
        tracing::debug!(id = %previous.id, "continuing conversation");
        self.ask(Provider::Sgpt, message, &previous.as_follow_up_context())
    }

    pub fn edit(&self, id: Option<&str>) -> Result<Conversation> {
        let previous = self.resolve(id)?;
        let command = editor::editor_from_env()?;
        let edited = editor::edit_text(&command, &previous.message)?;
        if edited.trim().is_empty() {
            bail!("edited message is empty; nothing sent");
        }
        self.new_conversation(Provider::Sgpt, &edited)
    }

    pub fn view(&self) -> Result<()> {
        self.preflight(None, &["less"])?;

        let viewer = Viewer::new(
            self.config.renderer,
            self.store.paths().existing_style_file(),
            self.render_width(),
        );
        match browser::run(&self.store, &viewer)? {
            BrowserOutcome::Quit => Ok(()),
            BrowserOutcome::Resend(message) => {
                self.new_conversation(Provider::Sgpt, &message).map(drop)
            }
        }
    }

    pub fn context(&self, action: ContextAction, out: &mut impl Write) -> Result<()> {
        match action {
            ContextAction::Set { text } => {
                self.store.save_context(&text.join(" "))?;
                writeln!(out, "Context saved")?;
            }
            ContextAction::Show => {
                let context = self.store.load_context()?;
                if context.is_empty() {
                    writeln!(out, "No context set")?;
                } else {
                    writeln!(out, "{context}")?;
                }
            }
            ContextAction::Clear => {
                self.store.clear_context()?;
                writeln!(out, "Context cleared")?;
            }
        }
        Ok(())
    }

    fn resolve(&self, id: Option<&str>) -> Result<Conversation> {
        let conversation = match id {
            Some(id) => self.store.get(id)?,
            None => self.store.latest()?,
        };
        Ok(conversation)
    }
}
