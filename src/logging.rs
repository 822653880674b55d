use std::env;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

/// Stderr logging. `RUST_LOG` wins over the `debug` flag when set.
pub fn init_logger(debug: bool) {
    let default = if debug { "debug" } else { "info" };
    let filter = env::var("RUST_LOG").unwrap_or_else(|_| default.to_string());

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .without_time()
                .with_ansi(true),
        )
        .with(EnvFilter::new(filter))
        .init();
}
