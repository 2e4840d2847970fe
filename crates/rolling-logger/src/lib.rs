//! Rolling file logger with a circular buffer of recent lines.
//!
//! `init_logger` installs a global `tracing` subscriber that writes to
//! `<log_dir>/<app_name>.log` (rolled by size) and to stderr. Records sent
//! through the `log` facade are bridged into the same subscriber. The last
//! few hundred formatted lines are also kept in memory for display.

use std::collections::VecDeque;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock};

use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Roll the active file once it grows past this many bytes
pub const DEFAULT_MAX_BYTES: u64 = 5 * 1024 * 1024;
/// Rolled files kept next to the active one (`.1` is the newest)
pub const DEFAULT_MAX_FILES: usize = 5;
/// Lines kept by the in-memory buffer
pub const DEFAULT_BUFFER_LINES: usize = 500;

static RECENT: OnceLock<Arc<RecentLines>> = OnceLock::new();

/// Bounded buffer of the most recent log lines
#[derive(Debug)]
pub struct RecentLines {
    lines: Mutex<VecDeque<String>>,
    capacity: usize,
}

impl RecentLines {
    pub fn new(capacity: usize) -> Self {
        Self {
            lines: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    fn push(&self, buf: &[u8]) {
        let text = String::from_utf8_lossy(buf);
        let mut lines = match self.lines.lock() {
            Ok(lines) => lines,
            Err(poisoned) => poisoned.into_inner(),
        };
        for line in text.lines().filter(|l| !l.trim().is_empty()) {
            if lines.len() >= self.capacity {
                lines.pop_front();
            }
            lines.push_back(line.to_string());
        }
    }

    /// Oldest first
    pub fn snapshot(&self) -> Vec<String> {
        match self.lines.lock() {
            Ok(lines) => lines.iter().cloned().collect(),
            Err(poisoned) => poisoned.into_inner().iter().cloned().collect(),
        }
    }
}

struct FileState {
    path: PathBuf,
    file: File,
    written: u64,
    max_bytes: u64,
    max_files: usize,
}

impl FileState {
    fn rolled_path(&self, n: usize) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(format!(".{}", n));
        PathBuf::from(name)
    }

    fn rotate(&mut self) -> io::Result<()> {
        self.file.flush()?;
        if self.max_files == 0 {
            self.file = File::create(&self.path)?;
            self.written = 0;
            return Ok(());
        }
        for n in (1..self.max_files).rev() {
            let from = self.rolled_path(n);
            if from.exists() {
                fs::rename(&from, self.rolled_path(n + 1))?;
            }
        }
        fs::rename(&self.path, self.rolled_path(1))?;
        self.file = File::create(&self.path)?;
        self.written = 0;
        Ok(())
    }
}

/// Size-rolled log file. Cheap to clone; clones share the same file.
#[derive(Clone)]
pub struct RollingFile {
    state: Arc<Mutex<FileState>>,
    recent: Arc<RecentLines>,
}

impl RollingFile {
    pub fn open(path: impl Into<PathBuf>, max_bytes: u64, max_files: usize, recent: Arc<RecentLines>) -> io::Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let written = file.metadata()?.len();
        Ok(Self {
            state: Arc::new(Mutex::new(FileState {
                path,
                file,
                written,
                max_bytes,
                max_files,
            })),
            recent,
        })
    }

    pub fn path(&self) -> PathBuf {
        match self.state.lock() {
            Ok(state) => state.path.clone(),
            Err(poisoned) => poisoned.into_inner().path.clone(),
        }
    }
}

impl Write for RollingFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        {
            let mut state = self
                .state
                .lock()
                .map_err(|_| io::Error::other("log file lock poisoned"))?;
            if state.written > 0 && state.written + buf.len() as u64 > state.max_bytes {
                state.rotate()?;
            }
            state.file.write_all(buf)?;
            state.written += buf.len() as u64;
        }
        self.recent.push(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| io::Error::other("log file lock poisoned"))?;
        state.file.flush()
    }
}

impl<'a> MakeWriter<'a> for RollingFile {
    type Writer = RollingFile;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Local wall-clock timestamps with millisecond precision
struct LocalTime;

impl FormatTime for LocalTime {
    fn format_time(&self, w: &mut Writer<'_>) -> std::fmt::Result {
        write!(w, "{}", chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f"))
    }
}

/// Install the global subscriber. `RUST_LOG` overrides the default `info`
/// filter. Fails if the log directory cannot be created or a global
/// subscriber is already set.
pub fn init_logger(log_dir: impl AsRef<Path>, app_name: &str) -> Result<(), String> {
    let log_dir = log_dir.as_ref();
    fs::create_dir_all(log_dir).map_err(|e| format!("failed to create log dir {}: {}", log_dir.display(), e))?;

    let recent = RECENT
        .get_or_init(|| Arc::new(RecentLines::new(DEFAULT_BUFFER_LINES)))
        .clone();
    let file_path = log_dir.join(format!("{}.log", app_name));
    let file = RollingFile::open(&file_path, DEFAULT_MAX_BYTES, DEFAULT_MAX_FILES, recent)
        .map_err(|e| format!("failed to open {}: {}", file_path.display(), e))?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_timer(LocalTime)
                .with_ansi(false)
                .with_writer(file),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_timer(LocalTime)
                .with_writer(io::stderr),
        )
        .try_init()
        .map_err(|e| format!("failed to install logger: {}", e))?;

    tracing::info!(app = app_name, path = %file_path.display(), "logger initialized");
    Ok(())
}

/// Most recent formatted lines, oldest first. Empty before `init_logger`.
pub fn recent() -> Vec<String> {
    RECENT.get().map(|r| r.snapshot()).unwrap_or_default()
}

pub fn info(message: &str) -> Result<(), String> {
    log::info!("{}", message);
    Ok(())
}

pub fn error(message: &str) -> Result<(), String> {
    log::error!("{}", message);
    Ok(())
}
