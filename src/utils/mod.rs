//! Utility functions for the sheet pipelines.
//!
//! This module provides image loading and encoding helpers and logging setup.

pub mod image;

pub use image::{encode_png, load_image};

/// Initializes the tracing subscriber for logging.
///
/// Logs go to stderr so that stdout carries nothing but the command's JSON
/// response. The filter is read from `RUST_LOG` and defaults to `info`.
pub fn init_tracing() {
    use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
