use std::sync::Mutex;

use slog::Drain;
use slog::Fuse;
use slog_async::Async;
use slog_json::Json;

pub use slog::{debug, error, info, o, trace, warn, Logger};

#[cfg(not(feature = "env_logging"))]
pub fn initialize_logger() -> Logger {
    let drain = Mutex::new(Json::default(std::io::stderr())).map(Fuse);
    let drain = Async::new(drain).build().fuse();

    Logger::root(drain, root_values())
}

/// Builds the root logger behind `slog-envlogger`, so `RUST_LOG`
/// decides what reaches the JSON drain. The scope guard is leaked
/// because the logger lives for the rest of the process.
#[cfg(feature = "env_logging")]
pub fn initialize_logger() -> Logger {
    let drain = Mutex::new(Json::default(std::io::stderr())).map(Fuse);
    let drain = slog_envlogger::new(drain).ignore_res();
    let drain = Async::new(drain).build().fuse();

    let logger = Logger::root(drain, root_values());
    std::mem::forget(slog_scope::set_global_logger(logger.clone()));

    logger
}

/// A logger that drops everything, for tests and helpers that have
/// nowhere to send records.
pub fn discard() -> Logger {
    Logger::root(slog::Discard, o!())
}

fn root_values() -> slog::OwnedKV<impl slog::SendSyncRefUnwindSafeKV> {
    o!("version" => info::VERSION, "revision" => info::REVISION, "build_timestamp" => info::BUILD_TIMESTAMP)
}
