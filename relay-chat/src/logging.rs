use tracing_subscriber::{EnvFilter, fmt::MakeWriter};

/// Installs the global subscriber, honouring `RUST_LOG` (default `info`).
pub fn init_tracing<W>(writer: W)
where
    W: for<'writer> MakeWriter<'writer> + Send + Sync + 'static,
{
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(writer)
        .try_init();
}
