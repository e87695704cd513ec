use asc_stream::RendererKind;
use conversation_store::StorePaths;
use thiserror::Error;

use crate::source::Provider;

#[derive(Debug, Error)]
pub enum PreflightError {
    #[error("required programs not found on PATH: {}", .0.join(", "))]
    MissingPrograms(Vec<String>),

    #[error(transparent)]
    Store(#[from] conversation_store::ConversationStoreError),
}

/// External programs a command shells out to.
pub fn required_programs(provider: Option<Provider>, renderer: RendererKind) -> Vec<&'static str> {
    let mut programs = Vec::new();
    if renderer == RendererKind::Glow {
        programs.push("glow");
    }
    if let Some(provider) = provider {
        programs.push(provider.program());
    }
    programs
}

pub fn check_programs(
    programs: &[&str],
    is_available: impl Fn(&str) -> bool,
) -> Result<(), PreflightError> {
    let missing: Vec<String> = programs
        .iter()
        .filter(|program| !is_available(program))
        .map(|program| program.to_string())
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(PreflightError::MissingPrograms(missing))
    }
}

/// Verifies `programs` are on PATH and creates the share directory.
pub fn run(paths: &StorePaths, programs: &[&str]) -> Result<(), PreflightError> {
    check_programs(programs, |program| match which::which(program) {
        Ok(path) => {
            tracing::debug!(program, path = %path.display(), "found program");
            true
        }
        Err(_) => false,
    })?;
    paths.ensure_share_dir()?;
    Ok(())
}
