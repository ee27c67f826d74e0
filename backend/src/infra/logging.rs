use crate::infra::config::LogFormat;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};
use tracing_subscriber::fmt;

/// Installs the global subscriber. `RUST_LOG` overrides the default filter.
pub fn init_logging(format: &LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,hyper=warn,reqwest=warn,libsql=warn"));

    let registry = Registry::default().with(filter);

    match format {
        LogFormat::Json => {
            let json_layer = fmt::layer().json().with_writer(std::io::stderr);
            registry.with(json_layer).init();
        }
        LogFormat::Pretty => {
            let fmt_layer = fmt::layer().with_target(false).with_writer(std::io::stderr);
            registry.with(fmt_layer).init();
        }
    }
}
