use std::process::ExitCode;

use asc::cli::Cli;
use asc::commands::App;
use asc::logging;
use clap::Parser;

fn main() -> ExitCode {
    // Before any thread exists; see `conversation_store::capture_local_offset`.
    conversation_store::capture_local_offset();

    let cli = Cli::parse();
    logging::init(cli.verbose, cli.debug);

    let result = App::from_env().and_then(|app| app.run(cli.command));
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            tracing::error!("{error:#}");
            ExitCode::FAILURE
        }
    }
}
