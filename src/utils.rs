// Console helpers for the ChatSphere binary: the log sink and stdin reading.
//
// Log lines go to a file when one is configured. Otherwise they go to stderr,
// so they never interleave with the chat transcript printed on stdout.

use anyhow::Result;
use chrono::Local;
use log::{LevelFilter, Log, Metadata, Record};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::sync::Mutex;

pub struct ChatLogger {
    sink: Option<Mutex<File>>,
}

impl ChatLogger {
    /// Open (or create) `path` for appending; `None` logs to stderr
    pub fn new(path: Option<&str>) -> Result<Self> {
        let sink = match path {
            Some(path) => Some(Mutex::new(OpenOptions::new().create(true).append(true).open(path)?)),
            None => None,
        };
        Ok(ChatLogger { sink })
    }
}

/// `[timestamp] LEVEL [file:line] message`
fn format_line(record: &Record) -> String {
    format!(
        "[{}] {} [{}:{}] {}\n",
        Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
        record.level(),
        record.file().unwrap_or("?"),
        record.line().unwrap_or(0),
        record.args()
    )
}

impl Log for ChatLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let line = format_line(record);
        match &self.sink {
            Some(file) => {
                let mut file = file.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
                let _ = file.write_all(line.as_bytes());
            }
            None => eprint!("{}", line),
        }
    }

    fn flush(&self) {
        match &self.sink {
            Some(file) => {
                let mut file = file.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
                let _ = file.flush();
            }
            None => {
                let _ = std::io::stderr().flush();
            }
        }
    }
}

/// One line from stdin without its line ending. `None` once input is exhausted.
pub fn read_line() -> Result<Option<String>> {
    let mut input = String::new();
    if std::io::stdin().read_line(&mut input)? == 0 {
        return Ok(None);
    }
    Ok(Some(input.trim_end_matches(['\r', '\n']).to_string()))
}

/// Install `ChatLogger` as the global logger at `level`
pub fn setup_logging(log_file: Option<&str>, level: LevelFilter) -> Result<()> {
    log::set_boxed_logger(Box::new(ChatLogger::new(log_file)?))?;
    log::set_max_level(level);

    log::info!("Logging at {} to {}", level, log_file.unwrap_or("stderr"));
    log::info!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
    Ok(())
}
