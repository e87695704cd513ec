use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is unset.
pub fn default_directives(debug: bool) -> &'static str {
    if debug {
        "asc=debug,asc_stream=debug,conversation_store=debug"
    } else {
        "asc=info,asc_stream=info,conversation_store=info"
    }
}

/// Installs the stderr subscriber. Stdout carries rendered answers only.
pub fn init(verbose: bool, debug: bool) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(debug)));

    let subscriber = tracing_subscriber::registry().with(env_filter).with(
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(verbose)
            .with_file(verbose)
            .with_line_number(verbose)
            .without_time(),
    );

    if subscriber.try_init().is_err() {
        return;
    }

    let debug_enabled = debug;
    tracing::debug!(verbose, debug = debug_enabled, "tracing initialized");
}

#[cfg(test)]
mod tests {
    use super::default_directives;

    #[test]
    fn debug_raises_every_crate() {
        assert!(default_directives(true).split(',').all(|d| d.ends_with("=debug")));
        assert!(default_directives(false).split(',').all(|d| d.ends_with("=info")));
    }
}
