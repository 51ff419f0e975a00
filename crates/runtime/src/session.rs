//! The computation session.
//!
//! A `Session` owns the worker pool and the memory budgets for one run.
//! It is created once by the job, passed by reference to every stage, and
//! stopped exactly once: explicitly through [`Session::stop`], or by `Drop`
//! if a stage unwinds.

use model_loader::{AlsModel, LoadLimits, UserId};
use recommender::{TopNRecommender, UserTable};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

/// Errors that prevent a session from being created
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Application name must not be empty")]
    EmptyAppName,

    #[error("Invalid memory size for {key}: '{value}'")]
    InvalidMemorySize { key: &'static str, value: String },

    #[error("Unsupported master '{0}', expected local, local[*] or local[N]")]
    InvalidMaster(String),

    #[error("Failed to start worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

// =============================================================================
// MemorySize
// =============================================================================

/// A byte count written the JVM way: `512m`, `4g`, `64k`, `1024`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct MemorySize(u64);

impl MemorySize {
    pub fn from_bytes(bytes: u64) -> Self {
        Self(bytes)
    }

    pub fn bytes(&self) -> u64 {
        self.0
    }
}

impl FromStr for MemorySize {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        let body = lower
            .strip_suffix('b')
            .filter(|rest| !rest.is_empty())
            .unwrap_or(lower.as_str());

        let (digits, shift) = match body.chars().last() {
            Some('k') => (&body[..body.len() - 1], 10),
            Some('m') => (&body[..body.len() - 1], 20),
            Some('g') => (&body[..body.len() - 1], 30),
            Some('t') => (&body[..body.len() - 1], 40),
            _ => (body, 0),
        };

        if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(());
        }
        let value: u64 = digits.parse().map_err(|_| ())?;
        let bytes = value.checked_mul(1u64 << shift).ok_or(())?;
        if bytes == 0 {
            return Err(());
        }
        Ok(Self(bytes))
    }
}

impl fmt::Display for MemorySize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 == 0 {
            return f.write_str("0");
        }
        for (shift, suffix) in [(40, 't'), (30, 'g'), (20, 'm'), (10, 'k')] {
            let unit = 1u64 << shift;
            if self.0 % unit == 0 {
                return write!(f, "{}{}", self.0 / unit, suffix);
            }
        }
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// Master
// =============================================================================

/// Where work runs. Only in-process execution is supported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Master {
    /// One worker per available core
    LocalAllCores,
    /// A fixed number of workers
    Local(usize),
}

impl Master {
    pub fn num_workers(&self) -> usize {
        match self {
            Master::LocalAllCores => std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
            Master::Local(n) => *n,
        }
    }
}

impl FromStr for Master {
    type Err = SessionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || SessionError::InvalidMaster(s.to_string());
        match s.trim() {
            "local" => Ok(Master::Local(1)),
            "local[*]" => Ok(Master::LocalAllCores),
            other => {
                let n: usize = other
                    .strip_prefix("local[")
                    .and_then(|rest| rest.strip_suffix(']'))
                    .ok_or_else(invalid)?
                    .parse()
                    .map_err(|_| invalid())?;
                if n == 0 {
                    return Err(invalid());
                }
                Ok(Master::Local(n))
            }
        }
    }
}

impl fmt::Display for Master {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Master::LocalAllCores => f.write_str("local[*]"),
            Master::Local(n) => write!(f, "local[{n}]"),
        }
    }
}

// =============================================================================
// SessionBuilder
// =============================================================================

/// Collects settings as strings; everything is validated in [`get_or_create`].
///
/// [`get_or_create`]: SessionBuilder::get_or_create
#[derive(Debug, Clone)]
pub struct SessionBuilder {
    app_name: String,
    master: String,
    driver_memory: String,
    executor_memory: String,
    serializer_buffer_max: String,
}

impl SessionBuilder {
    pub fn new() -> Self {
        Self {
            app_name: "recommendations".to_string(),
            master: "local[*]".to_string(),
            driver_memory: "1g".to_string(),
            executor_memory: "1g".to_string(),
            serializer_buffer_max: "64m".to_string(),
        }
    }

    pub fn app_name(mut self, name: impl Into<String>) -> Self {
        self.app_name = name.into();
        self
    }

    pub fn master(mut self, master: impl Into<String>) -> Self {
        self.master = master.into();
        self
    }

    pub fn driver_memory(mut self, size: impl Into<String>) -> Self {
        self.driver_memory = size.into();
        self
    }

    pub fn executor_memory(mut self, size: impl Into<String>) -> Self {
        self.executor_memory = size.into();
        self
    }

    pub fn serializer_buffer_max(mut self, size: impl Into<String>) -> Self {
        self.serializer_buffer_max = size.into();
        self
    }

    /// Validate settings and start the worker pool
    pub fn get_or_create(self) -> Result<Session, SessionError> {
        if self.app_name.trim().is_empty() {
            return Err(SessionError::EmptyAppName);
        }
        let master: Master = self.master.parse()?;
        let driver_memory = parse_memory("driver memory", &self.driver_memory)?;
        let executor_memory = parse_memory("executor memory", &self.executor_memory)?;
        let serializer_buffer_max =
            parse_memory("serializer buffer max", &self.serializer_buffer_max)?;

        let thread_prefix = self.app_name.clone();
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(master.num_workers())
            .thread_name(move |i| format!("{thread_prefix}-worker-{i}"))
            .build()?;

        Ok(Session {
            app_name: self.app_name,
            master,
            driver_memory,
            executor_memory,
            serializer_buffer_max,
            pool,
            stopped: false,
        })
    }
}

impl Default for SessionBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_memory(key: &'static str, value: &str) -> Result<MemorySize, SessionError> {
    value.parse().map_err(|_| SessionError::InvalidMemorySize {
        key,
        value: value.to_string(),
    })
}

// =============================================================================
// Session
// =============================================================================

pub struct Session {
    app_name: String,
    master: Master,
    driver_memory: MemorySize,
    executor_memory: MemorySize,
    serializer_buffer_max: MemorySize,
    pool: rayon::ThreadPool,
    stopped: bool,
}

impl Session {
    pub fn builder() -> SessionBuilder {
        SessionBuilder::new()
    }

    /// Version of the runtime that executes the job
    pub fn version(&self) -> &'static str {
        env!("CARGO_PKG_VERSION")
    }

    pub fn app_name(&self) -> &str {
        &self.app_name
    }

    pub fn master(&self) -> Master {
        self.master
    }

    pub fn num_workers(&self) -> usize {
        self.pool.current_num_threads()
    }

    pub fn driver_memory(&self) -> MemorySize {
        self.driver_memory
    }

    pub fn executor_memory(&self) -> MemorySize {
        self.executor_memory
    }

    pub fn serializer_buffer_max(&self) -> MemorySize {
        self.serializer_buffer_max
    }

    /// Limits a model load must respect in this session
    pub fn load_limits(&self) -> LoadLimits {
        LoadLimits {
            max_model_bytes: Some(self.driver_memory.bytes()),
            max_record_bytes: Some(self.serializer_buffer_max.bytes()),
        }
    }

    /// Load a saved model on the session's workers
    pub fn load_model(&self, path: &Path) -> model_loader::Result<AlsModel> {
        let limits = self.load_limits();
        self.pool.install(|| AlsModel::load_with_limits(path, limits))
    }

    /// One-column table of user ids under `column`
    pub fn create_user_table(
        &self,
        column: &str,
        user_ids: impl IntoIterator<Item = UserId>,
    ) -> UserTable {
        UserTable::new(column, user_ids)
    }

    /// Recommender bound to this session's executor memory
    pub fn recommender(&self, model: Arc<AlsModel>) -> TopNRecommender {
        TopNRecommender::new(model).with_max_task_bytes(self.executor_memory.bytes())
    }

    /// Run `op` on the session's worker pool
    pub fn install<OP, R>(&self, op: OP) -> R
    where
        OP: FnOnce() -> R + Send,
        R: Send,
    {
        self.pool.install(op)
    }

    /// Stop the session and release its workers
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        if !self.stopped {
            self.stopped = true;
            info!("Session {} stopped.", self.app_name);
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("app_name", &self.app_name)
            .field("master", &self.master)
            .field("workers", &self.num_workers())
            .field("driver_memory", &self.driver_memory)
            .field("executor_memory", &self.executor_memory)
            .field("serializer_buffer_max", &self.serializer_buffer_max)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mem(s: &str) -> Option<u64> {
        s.parse::<MemorySize>().ok().map(|m| m.bytes())
    }

    #[test]
    fn test_memory_size_parsing() {
        assert_eq!(mem("4g"), Some(4 << 30));
        assert_eq!(mem("512m"), Some(512 << 20));
        assert_eq!(mem("512MB"), Some(512 << 20));
        assert_eq!(mem("64k"), Some(64 << 10));
        assert_eq!(mem("1024"), Some(1024));
        assert_eq!(mem("1024b"), Some(1024));
        assert_eq!(mem(" 2G "), Some(2 << 30));
    }

    #[test]
    fn test_memory_size_rejects_garbage() {
        assert_eq!(mem(""), None);
        assert_eq!(mem("g"), None);
        assert_eq!(mem("0m"), None);
        assert_eq!(mem("-4g"), None);
        assert_eq!(mem("four gigs"), None);
        assert_eq!(mem("4.5g"), None);
        assert_eq!(mem("99999999999t"), None);
    }

    #[test]
    fn test_memory_size_display() {
        assert_eq!(MemorySize::from_bytes(4 << 30).to_string(), "4g");
        assert_eq!(MemorySize::from_bytes(512 << 20).to_string(), "512m");
        assert_eq!(MemorySize::from_bytes(1000).to_string(), "1000");
    }

    #[test]
    fn test_master_parsing() {
        assert_eq!("local[*]".parse::<Master>().unwrap(), Master::LocalAllCores);
        assert_eq!("local[3]".parse::<Master>().unwrap(), Master::Local(3));
        assert_eq!("local".parse::<Master>().unwrap(), Master::Local(1));
        assert!("local[0]".parse::<Master>().is_err());
        assert!("yarn".parse::<Master>().is_err());
        assert!("local[x]".parse::<Master>().is_err());
    }

    #[test]
    fn test_create_session() {
        let session = Session::builder()
            .app_name("test-app")
            .master("local[2]")
            .driver_memory("4g")
            .executor_memory("2g")
            .serializer_buffer_max("512m")
            .get_or_create()
            .unwrap();

        assert_eq!(session.num_workers(), 2);
        assert_eq!(session.load_limits().max_model_bytes, Some(4 << 30));
        assert_eq!(session.load_limits().max_record_bytes, Some(512 << 20));
        assert_eq!(session.install(|| rayon::current_num_threads()), 2);
        session.stop();
    }

    #[test]
    fn test_invalid_settings_fail_creation() {
        let err = Session::builder().driver_memory("lots").get_or_create().unwrap_err();
        assert!(matches!(
            err,
            SessionError::InvalidMemorySize { key: "driver memory", .. }
        ));

        let err = Session::builder().master("spark://host:7077").get_or_create().unwrap_err();
        assert!(matches!(err, SessionError::InvalidMaster(_)));

        let err = Session::builder().app_name("  ").get_or_create().unwrap_err();
        assert!(matches!(err, SessionError::EmptyAppName));
    }
}
