//! Logging utilities.
//!
//! Records of the `signstar_pkey` targets are written to the systemd journal when connected to it
//! and to stderr otherwise.
//! Only records of this crate reach stderr, the journal receives all of them.

use log::{LevelFilter, Log, debug};
use simplelog::{ColorChoice, ConfigBuilder, TermLogger, TerminalMode};
use systemd_journal_logger::{JournalLog, connected_to_journal};

/// The log target prefix of this crate.
const LOG_TARGET: &str = env!("CARGO_CRATE_NAME");

/// Logging setup error.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Logger initialization error.
    #[error("Logger initialization error: {0}")]
    Logger(#[from] log::SetLoggerError),
}

/// Creates a logger for the systemd journal, if the process is connected to it.
///
/// Entries are identified by the package name and carry the package version in the
/// `SIGNSTAR_PKEY_VERSION` field.
fn journal_logger() -> Option<Box<dyn Log>> {
    if !connected_to_journal() {
        return None;
    }
    JournalLog::new().ok().map(|log| {
        Box::new(
            log.with_syslog_identifier(env!("CARGO_PKG_NAME").to_string())
                .with_extra_fields(vec![("SIGNSTAR_PKEY_VERSION", env!("CARGO_PKG_VERSION"))]),
        ) as Box<dyn Log>
    })
}

/// Creates the configuration of the terminal logger.
fn terminal_config() -> simplelog::Config {
    ConfigBuilder::new()
        .add_filter_allow_str(LOG_TARGET)
        .set_time_level(LevelFilter::Off)
        .build()
}

/// Sets up logging facilities.
///
/// Logs to the systemd journal if connected to it and to stderr otherwise.
///
/// # Errors
///
/// An error is returned if a logger has already been set.
pub fn setup_logging(max_level: impl Into<LevelFilter>) -> Result<(), Error> {
    let max_level = max_level.into();
    if let Some(log) = journal_logger() {
        log::set_boxed_logger(log)?;
        log::set_max_level(max_level);
        debug!("Logging {max_level} records to the systemd journal");
        return Ok(());
    }
    TermLogger::init(
        max_level,
        terminal_config(),
        // simplelog needs to be explicitly instructed to always use stderr
        TerminalMode::Stderr,
        ColorChoice::Auto,
    )?;
    debug!("Logging {max_level} records to stderr");
    Ok(())
}
