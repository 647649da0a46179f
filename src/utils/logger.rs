use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

fn env_filter(verbose: bool) -> EnvFilter {
    let default = if verbose {
        "party_invite=debug,info"
    } else {
        "party_invite=info"
    };

    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

pub fn init_logger(format: LogFormat, verbose: bool) {
    let registry = tracing_subscriber::registry().with(env_filter(verbose));

    match format {
        LogFormat::Compact => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false)
                    .compact(),
            )
            .init(),
        // JSON lines for log shippers; span fields (correlation_id) are flattened into each event
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false)
                    .json()
                    .with_current_span(true),
            )
            .init(),
    }
}
