//! Tracing initialization and configuration.

use std::sync::Once;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

static INIT: Once = Once::new();

/// Initialize the xref tracing/logging system.
///
/// Reads the `XREF_LOG` environment variable for per-module log levels.
/// Format: `XREF_LOG=xref_observer::claim=debug,xref_observer=info`
///
/// Falls back to `xref=info` if `XREF_LOG` is not set or is invalid.
///
/// Calling this more than once is a no-op.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_env("XREF_LOG")
            .unwrap_or_else(|_| EnvFilter::new("xref=info"));

        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_file(true)
                    .with_line_number(true),
            )
            .with(filter)
            .init();
    });
}
