use log::{Level, Metadata, Record};
use once_cell::sync::OnceCell;
use std::fs::{OpenOptions, create_dir_all};
use std::io::Write;
use std::path::PathBuf;

use crate::error::{AppError, Result};

#[derive(Debug)]
struct SimpleLogger {
    log_file: PathBuf,
    level: Level,
}

pub const LOG_FILE: &str = "log.txt";

static LOGGER: OnceCell<SimpleLogger> = OnceCell::new();

impl log::Log for SimpleLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let log_entry = format!(
                "{} {} - {}\n",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.args()
            );

            if let Ok(mut file) = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.log_file)
            {
                let _ = file.write_all(log_entry.as_bytes());
            }
        }
    }

    fn flush(&self) {}
}

/// Installs the file logger. Lines go to [`LOG_FILE`] inside `log_dir`.
pub fn init(log_dir: PathBuf, debug: bool) -> Result<()> {
    create_dir_all(&log_dir)?;

    let level = if debug { Level::Debug } else { Level::Info };
    let logger = LOGGER.get_or_init(|| SimpleLogger {
        log_file: log_dir.join(LOG_FILE),
        level,
    });

    log::set_logger(logger)
        .map(|()| log::set_max_level(logger.level.to_level_filter()))
        .map_err(AppError::from)
}
