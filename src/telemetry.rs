//! Tracing subscriber setup.

use tracing_subscriber::EnvFilter;

use crate::config::TelemetryConfig;

/// Installs the global fmt subscriber.
///
/// `RUST_LOG` takes precedence over the configured filter. Calling this more
/// than once is harmless: later calls leave the first subscriber in place.
pub fn init(config: &TelemetryConfig) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    let installed = if config.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };

    if installed.is_err() {
        tracing::debug!("Tracing subscriber already installed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_twice_does_not_panic() {
        let config = TelemetryConfig::default();
        init(&config);
        init(&TelemetryConfig {
            json: true,
            ..config
        });
        tracing::info!("still logging");
    }
}
