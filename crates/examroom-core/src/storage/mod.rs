mod config;
pub mod database;
pub mod memory;

pub use config::{AudioConfig, Config, ExamConfig, PomodoroConfig, SchedulerConfig};
pub use database::Database;
pub use memory::MemoryStore;

use std::path::PathBuf;

use crate::error::StorageError;

/// Key holding the JSON exam list.
pub const EXAMS_KEY: &str = "exams";
/// Scalar preference keys, stored beside the exam list.
pub const MUTED_KEY: &str = "soundMuted";
pub const STYLE_KEY: &str = "soundStyle";

/// String key-value persistence shared by every view of the same data.
///
/// Writes from other holders of the same store (another process, another
/// handle) are not pushed; callers poll [`KvStore::poll_external_change`].
pub trait KvStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;

    fn remove(&mut self, key: &str) -> Result<(), StorageError>;

    /// True if someone else wrote to the store since the previous call.
    fn poll_external_change(&mut self) -> Result<bool, StorageError>;
}

/// Returns `~/.config/examroom[-dev]/` based on EXAMROOM_ENV.
///
/// Set EXAMROOM_ENV=dev to use development data directory.
///
/// # Errors
/// Returns an error if creating the config directory fails.
pub fn data_dir() -> Result<PathBuf, StorageError> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("EXAMROOM_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("examroom-dev")
    } else {
        base_dir.join("examroom")
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
