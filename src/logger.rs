//! File-backed logger with a dedicated consumer thread.
//!
//! Callers hand off lines through an unbounded FIFO; a single consumer
//! thread stamps, writes, and rotates the log file. Each record carries a
//! flag selecting the fixed-width timestamp prefix or a raw line.

use crate::error::{Error, Result};
use chrono::Local;
use crossbeam_channel::{unbounded, Receiver, Sender};
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::thread::{self, JoinHandle};

/// Timestamp rendering for stamped lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeFormat {
    /// `YYYY-MM-DD HH:MM:SS`
    DateTimeDash,
    /// `YYYY/MM/DD HH:MM:SS`
    DateTimeSlash,
    /// `YYYY-MM-DD`
    DateDash,
    /// `YYYY/MM/DD`
    DateSlash,
    /// `HH:MM:SS`
    TimeOnly,
}

impl TimeFormat {
    fn pattern(self) -> &'static str {
        match self {
            TimeFormat::DateTimeDash => "%Y-%m-%d %H:%M:%S",
            TimeFormat::DateTimeSlash => "%Y/%m/%d %H:%M:%S",
            TimeFormat::DateDash => "%Y-%m-%d",
            TimeFormat::DateSlash => "%Y/%m/%d",
            TimeFormat::TimeOnly => "%H:%M:%S",
        }
    }
}

/// How the log file is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    Append,
    Truncate,
}

#[derive(Debug, Clone)]
pub struct LoggerConfig {
    /// Directory the log file lives in; created if missing.
    pub dir: PathBuf,
    pub file_name: String,
    /// Rotation threshold in MiB.
    pub max_size_mb: u64,
    pub mode: OpenMode,
    pub time_format: TimeFormat,
    /// Rotate (rename and reopen) when the threshold is hit. When off the
    /// file just keeps growing.
    pub backup: bool,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("log"),
            file_name: "log.txt".to_string(),
            max_size_mb: 2,
            mode: OpenMode::Append,
            time_format: TimeFormat::DateTimeDash,
            backup: true,
        }
    }
}

struct Record {
    line: String,
    with_timestamp: bool,
}

/// Handle to the logger. Cloning is not supported; share it behind an `Arc`
/// when several tasks log to the same file.
pub struct Logger {
    tx: Option<Sender<Record>>,
    thread: Option<JoinHandle<()>>,
}

impl Logger {
    /// Logger with defaults, writing under `dir`.
    pub fn new<P: Into<PathBuf>>(dir: P) -> Result<Self> {
        Self::with_config(LoggerConfig {
            dir: dir.into(),
            ..Default::default()
        })
    }

    pub fn with_config(config: LoggerConfig) -> Result<Self> {
        fs::create_dir_all(&config.dir)?;
        // Open eagerly so a bad path fails construction, not the thread.
        let sink = LogSink::open(config)?;

        let (tx, rx) = unbounded();
        let thread = thread::Builder::new()
            .name("foundry-log".to_string())
            .spawn(move || sink.run(rx))
            .map_err(|e| Error::spawn(e.to_string()))?;

        Ok(Self {
            tx: Some(tx),
            thread: Some(thread),
        })
    }

    /// Queue a line with the fixed-width timestamp prefix.
    pub fn log<S: Into<String>>(&self, line: S) {
        self.send(line.into(), true);
    }

    /// Queue a line without a timestamp.
    pub fn log_raw<S: Into<String>>(&self, line: S) {
        self.send(line.into(), false);
    }

    fn send(&self, line: String, with_timestamp: bool) {
        if let Some(tx) = &self.tx {
            let _ = tx.send(Record {
                line,
                with_timestamp,
            });
        }
    }

    /// Stop accepting lines, drain what is queued, flush, join the thread.
    /// Also runs on drop.
    pub fn close(&mut self) {
        self.tx.take();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

impl Drop for Logger {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for Logger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Logger")
            .field("open", &self.tx.is_some())
            .finish()
    }
}

/// Consumer-thread side: the open file plus rotation bookkeeping.
struct LogSink {
    config: LoggerConfig,
    path: PathBuf,
    file: BufWriter<File>,
}

impl LogSink {
    fn open(config: LoggerConfig) -> Result<Self> {
        let path = config.dir.join(&config.file_name);
        let file = Self::open_file(&path, config.mode)?;
        Ok(Self { config, path, file })
    }

    fn open_file(path: &PathBuf, mode: OpenMode) -> std::io::Result<BufWriter<File>> {
        let mut options = OpenOptions::new();
        options.create(true);
        match mode {
            OpenMode::Append => options.append(true),
            OpenMode::Truncate => options.write(true).truncate(true),
        };
        Ok(BufWriter::new(options.open(path)?))
    }

    // Runs until the producer side hangs up, then drains and flushes.
    fn run(mut self, rx: Receiver<Record>) {
        for record in rx {
            if let Err(e) = self.write(&record) {
                tracing::error!(error = %e, "log write failed");
            }
        }
        let _ = self.file.flush();
    }

    fn write(&mut self, record: &Record) -> std::io::Result<()> {
        self.maybe_rotate()?;

        if record.with_timestamp {
            // Prefix padded to a fixed 20 columns regardless of format.
            let stamp = Local::now()
                .format(self.config.time_format.pattern())
                .to_string();
            writeln!(self.file, "{:<20} --->  {}", stamp, record.line)?;
        } else {
            writeln!(self.file, "{}", record.line)?;
        }
        self.file.flush()
    }

    fn maybe_rotate(&mut self) -> std::io::Result<()> {
        if !self.config.backup {
            return Ok(());
        }

        let size = self.file.get_ref().metadata()?.len();
        if size < self.config.max_size_mb * 1024 * 1024 {
            return Ok(());
        }

        self.file.flush()?;
        let stamp = Local::now().format("%Y%m%d-%H%M%S");
        let rotated = self
            .config
            .dir
            .join(format!("{}.{}", self.config.file_name, stamp));
        fs::rename(&self.path, &rotated)?;
        tracing::info!(to = %rotated.display(), "rotated log file");

        self.file = Self::open_file(&self.path, OpenMode::Append)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir(tag: &str) -> PathBuf {
        std::env::temp_dir().join(format!("foundry-logger-{}-{}", tag, std::process::id()))
    }

    #[test]
    fn test_lines_reach_the_file() {
        let dir = temp_dir("basic");
        let _ = fs::remove_dir_all(&dir);

        let mut logger = Logger::new(&dir).unwrap();
        logger.log("stamped line");
        logger.log_raw("raw line");
        logger.close();

        let contents = fs::read_to_string(dir.join("log.txt")).unwrap();
        assert!(contents.contains("stamped line"));
        assert!(contents.contains("raw line"));

        // stamped lines carry the fixed-width prefix, raw lines don't
        let stamped = contents.lines().find(|l| l.contains("stamped")).unwrap();
        assert!(stamped.contains(" --->  "));
        let raw = contents.lines().find(|l| l.contains("raw line")).unwrap();
        assert!(!raw.contains(" --->  "));

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_truncate_mode_discards_previous_contents() {
        let dir = temp_dir("truncate");
        let _ = fs::remove_dir_all(&dir);

        let mut first = Logger::new(&dir).unwrap();
        first.log_raw("from the first run");
        first.close();

        let mut second = Logger::with_config(LoggerConfig {
            dir: dir.clone(),
            mode: OpenMode::Truncate,
            ..Default::default()
        })
        .unwrap();
        second.log_raw("fresh");
        second.close();

        let contents = fs::read_to_string(dir.join("log.txt")).unwrap();
        assert!(!contents.contains("first run"));
        assert!(contents.contains("fresh"));

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_rotation_renames_and_reopens() {
        let dir = temp_dir("rotate");
        let _ = fs::remove_dir_all(&dir);

        // Threshold of 0 MiB forces a rotation on the second write.
        let mut logger = Logger::with_config(LoggerConfig {
            dir: dir.clone(),
            max_size_mb: 0,
            ..Default::default()
        })
        .unwrap();
        logger.log_raw("first");
        logger.log_raw("second");
        logger.close();

        let entries = fs::read_dir(&dir).unwrap().count();
        assert!(entries >= 2, "expected the live file plus a rotated one");

        let _ = fs::remove_dir_all(&dir);
    }
}
