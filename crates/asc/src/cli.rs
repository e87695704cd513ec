use clap::{Args, Parser, Subcommand};

/// asc - chat with an AI from the shell, rendered as it streams
#[derive(Debug, Parser)]
#[command(name = "asc")]
#[command(about, long_about = None, disable_version_flag = true)]
pub struct Cli {
    /// Report source locations in log lines
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Log at debug level (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Start a new conversation
    #[command(visible_alias = "n")]
    New(NewArgs),

    /// Ask a follow-up to an earlier conversation
    #[command(visible_alias = "a")]
    Append(AppendArgs),

    /// Edit an earlier message in $EDITOR and send it again
    #[command(visible_alias = "e")]
    Edit(EditArgs),

    /// Browse the conversation history
    #[command(visible_alias = "v")]
    View,

    /// Manage the context prepended to new questions
    Context {
        #[command(subcommand)]
        action: ContextAction,
    },

    /// Print the version
    Version,
}

#[derive(Debug, Args)]
pub struct NewArgs {
    /// The question to ask
    #[arg(required = true, num_args = 1..)]
    pub message: Vec<String>,

    /// Ask perplexity instead of sgpt
    #[arg(short, long)]
    pub perplexity: bool,
}

impl NewArgs {
    pub fn message(&self) -> String {
        self.message.join(" ")
    }
}

#[derive(Debug, Args)]
pub struct AppendArgs {
    /// The follow-up question
    #[arg(required = true, num_args = 1..)]
    pub message: Vec<String>,

    /// Conversation to continue (defaults to the most recent)
    #[arg(long)]
    pub id: Option<String>,
}

impl AppendArgs {
    pub fn message(&self) -> String {
        self.message.join(" ")
    }
}

#[derive(Debug, Args)]
pub struct EditArgs {
    /// Conversation whose message to edit (defaults to the most recent)
    #[arg(long)]
    pub id: Option<String>,
}

#[derive(Debug, Subcommand)]
pub enum ContextAction {
    /// Replace the saved context
    Set {
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },
    /// Print the saved context
    Show,
    /// Remove the saved context
    Clear,
}
