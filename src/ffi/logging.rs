// In: src/ffi/logging.rs

use log::LevelFilter;
use std::fs::OpenOptions;
use std::sync::Once;

use crate::error::BridgeError;

/// Overrides the default `debug` filter, using `env_logger`'s directive syntax.
pub const LOG_ENV_VAR: &str = "ANIMAL_BRIDGE_LOG";

static INIT_LOGGER: Once = Once::new();

/// Installs the process-wide logger on first call.
///
/// Lines go to stderr, or are appended to `log_file` when one is given. The
/// file is opened before the logger is touched so a bad path is reported to
/// the caller instead of silently dropping logs. Once a logger is installed,
/// asking for a log file fails with `LoggerInstalled`; calling again without
/// one is a no-op.
pub fn enable_verbose_logging(log_file: Option<&str>) -> Result<(), BridgeError> {
    if INIT_LOGGER.is_completed() {
        return already_installed(log_file);
    }

    let file = match log_file {
        Some(path) => Some(OpenOptions::new().append(true).create(true).open(path)?),
        None => None,
    };

    let mut outcome = None;
    INIT_LOGGER.call_once(|| {
        let mut builder = env_logger::Builder::new();

        builder.is_test(false);
        builder.filter_level(LevelFilter::Debug);
        builder.parse_env(env_logger::Env::new().filter(LOG_ENV_VAR));

        // Custom formatter: just print the level and message
        builder.format(|buf, record| {
            use std::io::Write;
            writeln!(buf, "[{}] {}", record.level(), record.args())?;
            buf.flush()?;
            Ok(())
        });

        if let Some(file) = file {
            builder.target(env_logger::Target::Pipe(Box::new(file)));
        }

        outcome = Some(
            builder
                .try_init()
                .map_err(|e| BridgeError::LoggerInstalled(e.to_string())),
        );
    });

    match outcome {
        Some(result) => result,
        // Another thread won the race to install the logger.
        None => already_installed(log_file),
    }
}

fn already_installed(log_file: Option<&str>) -> Result<(), BridgeError> {
    match log_file {
        Some(path) => Err(BridgeError::LoggerInstalled(format!(
            "`{}` was not attached",
            path
        ))),
        None => Ok(()),
    }
}
