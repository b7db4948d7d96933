use std::{
    path::Path,
    sync::{Once, OnceLock},
};

use tracing_appender::{
    non_blocking::WorkerGuard,
    rolling::{self, Builder},
};
use tracing_subscriber::{fmt::Layer, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

static INIT_LOG: Once = Once::new();
static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

/// Install the global subscriber. Only the first call has any effect.
///
/// `filter` is used unless `RUST_LOG` is set. With `log_path` given, a daily
/// rolling file `fake-nft.<date>.log` is written there in addition to (or,
/// with `disable_terminal`, instead of) the terminal output.
pub fn log_init(filter: String, log_path: Option<&Path>, disable_terminal: bool) {
    INIT_LOG.call_once(|| {
        let file_layer = log_path.and_then(|directory| {
            let file_appender = match Builder::new()
                .rotation(rolling::Rotation::DAILY)
                .filename_prefix("fake-nft")
                .filename_suffix("log")
                .build(directory)
            {
                Ok(appender) => appender,
                Err(err) => {
                    eprintln!("Cannot log into {}: {}", directory.display(), err);
                    return None;
                }
            };
            let (writer, guard) = tracing_appender::non_blocking(file_appender);
            // Dropping the guard would stop the background writer
            let _ = LOG_GUARD.set(guard);
            Some(Layer::new().with_writer(writer).with_ansi(false))
        });

        let terminal_layer = (!disable_terminal).then(|| {
            Layer::new()
                .with_writer(std::io::stdout)
                .with_ansi(true)
        });

        let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into());

        tracing_subscriber::registry()
            .with(env_filter)
            .with(file_layer)
            .with(terminal_layer)
            .init();
    });
}

/// Default initialize tracing log for the calling crate.
///
/// Must also import [`nft_core::core::logging::log_init`] function.
///
/// ```ignore
/// use nft_core::{core::logging::log_init, init_log};
///
/// init_log!();
/// tracing::info!("Loaded order with {} items", 3);
/// ```
///
/// Standard `RUST_LOG` environment variable overrides the default filter:
///
/// ```bash
/// export RUST_LOG="fake_nft=debug"
/// ```
#[macro_export]
macro_rules! init_log {
    () => {
        log_init(format!("{}=info", env!("CARGO_CRATE_NAME")), None, false);
    };
    ($log_path:expr) => {
        log_init(format!("{}=info", env!("CARGO_CRATE_NAME")), $log_path, false);
    };
}

#[cfg(test)]
mod tests {
    use super::log_init;

    #[test]
    fn test_repeated_init_is_harmless() {
        let dir = tempfile::tempdir().unwrap();
        crate::init_log!(Some(dir.path()));
        crate::init_log!();
        tracing::info!("Logging twice initialized");
    }
}
