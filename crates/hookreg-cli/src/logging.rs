use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter, Registry};

/// Install the global subscriber: `RUST_LOG` filter (default `info`), stderr,
/// JSON lines when `json` is set.
pub fn init(json: bool) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if json {
        let layer = fmt::layer().json().with_writer(std::io::stderr);
        tracing::subscriber::set_global_default(Registry::default().with(filter).with(layer))?;
    } else {
        let layer = fmt::layer().with_target(false).with_writer(std::io::stderr);
        tracing::subscriber::set_global_default(Registry::default().with(filter).with(layer))?;
    }
    Ok(())
}
