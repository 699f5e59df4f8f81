//! Stuff shared between the hub bots: process startup, the messaging
//! capability the bots send everything through, and name formatting.

use std::future::Future;

pub mod messenger;
pub mod names;

/// Load `.env`, initialize logging and start the `closure` in an async runtime.
/// Logging is enabled by default on level `info` unless overridden
/// by environment variable `RUST_LOG`. This uses the crate
/// [pretty_env_logger][] internally, see its documentation for more details.
///
/// # Panics
///
/// Panics if the tokio runtime can't be built.
///
/// [pretty_env_logger]: https://docs.rs/pretty_env_logger
pub fn start_everything(closure: impl Future<Output = ()>) {
    // A missing .env is fine, the environment may be set up some other way.
    let dotenv_result = dotenvy::dotenv();

    let log_level = std::env::var_os("RUST_LOG")
        .unwrap_or_else(|| std::ffi::OsString::from("info"))
        .into_string()
        .unwrap_or_else(|_| String::from("info"));

    let running_as_systemd_service = std::env::var_os("JOURNAL_STREAM").is_some();

    let mut builder = match running_as_systemd_service {
        true => pretty_env_logger::formatted_builder(),
        false => pretty_env_logger::formatted_timed_builder(),
    };

    builder.parse_filters(&log_level);

    if builder.try_init().is_err() {
        log::error!("Tried to init logger twice!");
    }

    match dotenv_result {
        Ok(path) => log::info!("Loaded environment from {}", path.display()),
        Err(e) if e.not_found() => log::debug!("No .env file, using the plain environment"),
        Err(e) => log::warn!("Failed to read .env file: {e}"),
    }

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .expect("Failed to build the tokio runtime!")
        .block_on(closure);
}
