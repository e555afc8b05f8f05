//! Logging setup and home-directory layout for the Roster binary.

use anyhow::{Context, Result};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Filter used when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "roster=info,roster_config=info,roster_schema=info";
/// Environment variable overriding the home directory.
pub const HOME_ENV: &str = "ROSTER_HOME";

const MAX_LOG_FILES: usize = 5;
const MAX_LOG_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// Logging configuration.
pub struct LogConfig<'a> {
    pub app_name: &'a str,
    /// Mirror the file filter on stderr instead of warnings only
    pub verbose: bool,
    /// Defaults to [`logs_dir`]
    pub log_dir: Option<PathBuf>,
}

/// Initialize tracing with a size-rotated log file and stderr output.
pub fn init_logging(config: LogConfig<'_>) -> Result<()> {
    let log_dir = match config.log_dir {
        Some(dir) => dir,
        None => logs_dir()?,
    };
    fs::create_dir_all(&log_dir)
        .with_context(|| format!("Failed to create logs directory: {}", log_dir.display()))?;
    let file_writer = LogFileWriter::open(log_dir, config.app_name)?;

    let file_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let console_filter = if config.verbose {
        file_filter.clone()
    } else {
        EnvFilter::new("warn")
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(file_writer)
                .with_ansi(false)
                .with_filter(file_filter),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_filter(console_filter),
        )
        .try_init()
        .context("Failed to install tracing subscriber")?;

    Ok(())
}

/// Roster home directory: `$ROSTER_HOME`, else `~/.roster`.
pub fn roster_home() -> Result<PathBuf> {
    if let Ok(override_path) = std::env::var(HOME_ENV) {
        if !override_path.is_empty() {
            return Ok(PathBuf::from(override_path));
        }
    }
    let home = dirs::home_dir().context("Could not determine home directory")?;
    Ok(home.join(".roster"))
}

/// Logs directory: `<home>/logs`
pub fn logs_dir() -> Result<PathBuf> {
    Ok(roster_home()?.join("logs"))
}

/// Settings file: `<home>/settings.json`
pub fn settings_path() -> Result<PathBuf> {
    Ok(roster_home()?.join("settings.json"))
}

/// How large the active file may grow and how many files are kept,
/// counting the active one.
#[derive(Debug, Clone, Copy)]
struct RotationPolicy {
    keep: usize,
    max_bytes: u64,
}

impl Default for RotationPolicy {
    fn default() -> Self {
        Self {
            keep: MAX_LOG_FILES,
            max_bytes: MAX_LOG_FILE_SIZE,
        }
    }
}

/// Append-only `<name>.log`. A write that would push it past the limit
/// first renames it to `<name>.log.1`, older generations move up by one,
/// and whatever falls past `keep` is removed.
struct SizeRotatedLog {
    dir: PathBuf,
    name: String,
    policy: RotationPolicy,
    file: File,
    written: u64,
}

impl SizeRotatedLog {
    fn open(dir: PathBuf, app_name: &str, policy: RotationPolicy) -> io::Result<Self> {
        fs::create_dir_all(&dir)?;
        let name = sanitize_name(app_name);
        let (file, written) = open_append(&dir.join(format!("{}.log", name)))?;
        let mut log = Self {
            dir,
            name,
            policy: RotationPolicy {
                keep: policy.keep.max(1),
                ..policy
            },
            file,
            written,
        };
        if log.written > log.policy.max_bytes {
            log.rotate()?;
        }
        Ok(log)
    }

    fn generation(&self, n: usize) -> PathBuf {
        match n {
            0 => self.dir.join(format!("{}.log", self.name)),
            n => self.dir.join(format!("{}.log.{}", self.name, n)),
        }
    }

    fn rotate(&mut self) -> io::Result<()> {
        self.file.flush()?;
        let oldest = self.policy.keep - 1;
        remove_if_present(&self.generation(oldest))?;
        for n in (0..oldest).rev() {
            let from = self.generation(n);
            if from.exists() {
                fs::rename(&from, self.generation(n + 1))?;
            }
        }
        let (file, written) = open_append(&self.generation(0))?;
        self.file = file;
        self.written = written;
        Ok(())
    }
}

fn open_append(path: &Path) -> io::Result<(File, u64)> {
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let len = file.metadata()?.len();
    Ok((file, len))
}

fn remove_if_present(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
        _ => Ok(()),
    }
}

impl Write for SizeRotatedLog {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.written > 0 && self.written + buf.len() as u64 > self.policy.max_bytes {
            self.rotate()?;
        }
        let n = self.file.write(buf)?;
        self.written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

/// `MakeWriter` handing every event the same rotated log.
#[derive(Clone)]
struct LogFileWriter(Arc<Mutex<SizeRotatedLog>>);

impl LogFileWriter {
    fn open(dir: PathBuf, app_name: &str) -> Result<Self> {
        let log = SizeRotatedLog::open(dir, app_name, RotationPolicy::default())
            .with_context(|| format!("Failed to open log file for {}", app_name))?;
        Ok(Self(Arc::new(Mutex::new(log))))
    }

    fn lock(&self) -> MutexGuard<'_, SizeRotatedLog> {
        self.0.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for LogFileWriter {
    type Writer = LogFileWriter;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

impl Write for LogFileWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.lock().write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.lock().flush()
    }
}

fn sanitize_name(name: &str) -> String {
    name.chars()
        .map(|ch| match ch {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '-' | '_' => ch,
            _ => '_',
        })
        .collect()
}

/// Path of the active log file for `app_name` under `dir`.
pub fn log_file_path(dir: &Path, app_name: &str) -> PathBuf {
    dir.join(format!("{}.log", sanitize_name(app_name)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_name() {
        assert_eq!(sanitize_name("roster cli/v1"), "roster_cli_v1");
        assert_eq!(sanitize_name("roster-cli"), "roster-cli");
    }

    #[test]
    fn test_rotation_keeps_bounded_file_count() {
        let dir = tempfile::tempdir().unwrap();
        let policy = RotationPolicy {
            keep: 3,
            max_bytes: 16,
        };
        let mut appender = SizeRotatedLog::open(dir.path().to_path_buf(), "roster", policy).unwrap();

        for _ in 0..10 {
            appender.write_all(b"0123456789\n").unwrap();
        }
        appender.flush().unwrap();

        let current = log_file_path(dir.path(), "roster");
        assert!(current.exists());
        assert!(dir.path().join("roster.log.1").exists());
        assert!(dir.path().join("roster.log.2").exists());
        assert!(!dir.path().join("roster.log.3").exists());
        assert!(fs::metadata(&current).unwrap().len() <= 16);
    }

    #[test]
    fn test_reopen_appends_to_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        {
            let mut a =
                SizeRotatedLog::open(dir.path().to_path_buf(), "app", RotationPolicy::default())
                    .unwrap();
            a.write_all(b"first\n").unwrap();
        }
        let mut b =
            SizeRotatedLog::open(dir.path().to_path_buf(), "app", RotationPolicy::default())
                .unwrap();
        b.write_all(b"second\n").unwrap();
        b.flush().unwrap();

        let text = fs::read_to_string(log_file_path(dir.path(), "app")).unwrap();
        assert_eq!(text, "first\nsecond\n");
    }
}
