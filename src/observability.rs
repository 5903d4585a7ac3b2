//! Diagnostics for the storage engine.
//!
//! Operations and casts choose between several strategies (no-copy retype,
//! unboxed fast path, boxed fallback). The `log_metric!` macro records those
//! choices as structured `key="value"` pairs at `debug` level, so they cost
//! nothing unless a logger is installed and the level is enabled.

use std::fs::OpenOptions;
use std::sync::Once;

use log::LevelFilter;

use crate::error::StoreError;

/// Logs a structured key-value metric line at `debug` level.
///
/// # Example
/// ```
/// use tablestore::log_metric;
/// let rows = 4;
/// log_metric!("event"="cast", "strategy"="retype", "rows"=&rows);
/// ```
#[macro_export]
macro_rules! log_metric {
    ($($key:literal = $value:expr),+ $(,)?) => {
        if $crate::__log::log_enabled!($crate::__log::Level::Debug) {
            let mut parts: Vec<String> = Vec::new();
            $(
                parts.push(format!("{}=\"{}\"", $key, $value));
            )+
            $crate::__log::debug!("TABLESTORE_METRIC: {}", parts.join(" "));
        }
    };
}

static INIT_LOGGER: Once = Once::new();

/// Installs an `env_logger` backend for the whole process.
///
/// Only the first call has an effect; later calls return `Ok(())` without
/// touching the already-installed logger. When `log_file` is given, records
/// are appended to that file instead of stderr.
pub fn enable_verbose_logging(level: LevelFilter, log_file: Option<&str>) -> Result<(), StoreError> {
    let target = match log_file {
        Some(filename) => Some(
            OpenOptions::new()
                .append(true)
                .create(true)
                .open(filename)
                .map_err(|e| {
                    StoreError::InvalidConfig(format!("cannot open log file {filename}: {e}"))
                })?,
        ),
        None => None,
    };

    INIT_LOGGER.call_once(move || {
        let mut builder = env_logger::Builder::new();
        builder.is_test(false);
        builder.filter_level(level);

        builder.format(|buf, record| {
            use std::io::Write;
            writeln!(buf, "[{}] {}", record.level(), record.args())?;
            buf.flush()?;
            Ok(())
        });

        if let Some(file) = target {
            builder.target(env_logger::Target::Pipe(Box::new(file)));
        }

        let _ = builder.try_init();
    });
    Ok(())
}
