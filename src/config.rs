use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

use crate::app_dirs::AppDirs;
use crate::content::{ContentKey, LoadOptions, Module, Section};
use crate::session::{PlaybackSettings, SessionSettings};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Content document to load when none is given on the command line.
    pub content_path: Option<PathBuf>,
    pub module: Module,
    pub timing: TimingConfig,
    pub writing: WritingConfig,
    pub listening: ListeningConfig,
    pub tick_rate_ms: u64,
    /// Keys a content document must provide; all six when unset.
    pub required_sections: Option<Vec<ContentKey>>,
}

/// Section lengths in seconds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TimingConfig {
    pub listening_secs: u64,
    pub reading_secs: u64,
    pub task1_secs: u64,
    pub task2_secs: u64,
    pub warnings_secs: Vec<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct WritingConfig {
    pub task1_min_words: usize,
    pub task2_min_words: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ListeningConfig {
    pub parts: usize,
    pub part_secs: u64,
    pub question_count: usize,
    pub audio_pause_holds_timer: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            content_path: None,
            module: Module::Academic,
            timing: TimingConfig::default(),
            writing: WritingConfig::default(),
            listening: ListeningConfig::default(),
            tick_rate_ms: 1000,
            required_sections: None,
        }
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            listening_secs: 40 * 60,
            reading_secs: 60 * 60,
            task1_secs: 20 * 60,
            task2_secs: 40 * 60,
            warnings_secs: vec![600, 300],
        }
    }
}

impl Default for WritingConfig {
    fn default() -> Self {
        Self {
            task1_min_words: 150,
            task2_min_words: 250,
        }
    }
}

impl Default for ListeningConfig {
    fn default() -> Self {
        Self {
            parts: 4,
            part_secs: 7 * 60,
            question_count: 40,
            audio_pause_holds_timer: false,
        }
    }
}

impl Config {
    pub fn load_options(&self) -> LoadOptions {
        let base = match &self.required_sections {
            Some(keys) => LoadOptions::requiring(keys.iter().copied()),
            None => LoadOptions::default(),
        };
        LoadOptions {
            listening_questions: self.listening.question_count,
            task1_min_words: self.writing.task1_min_words,
            task2_min_words: self.writing.task2_min_words,
            ..base
        }
    }

    pub fn session_settings(&self, key: ContentKey) -> SessionSettings {
        let secs = match key {
            ContentKey::Listening => self.timing.listening_secs,
            ContentKey::Reading(_) => self.timing.reading_secs,
            ContentKey::Task1(_) => self.timing.task1_secs,
            ContentKey::Task2 => self.timing.task2_secs,
        };
        let playback = (key.section() == Section::Listening).then(|| PlaybackSettings {
            parts: self.listening.parts,
            part_length: Duration::from_secs(self.listening.part_secs),
            pause_holds_timer: self.listening.audio_pause_holds_timer,
        });
        SessionSettings {
            default_duration: Duration::from_secs(secs),
            warnings: self
                .timing
                .warnings_secs
                .iter()
                .map(|&s| Duration::from_secs(s))
                .collect(),
            playback,
        }
    }

    pub fn tick_rate(&self) -> Duration {
        Duration::from_millis(self.tick_rate_ms.max(1))
    }
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> std::io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    pub fn new() -> Self {
        let path = AppDirs::config_path().unwrap_or_else(|| PathBuf::from("examsim_config.json"));
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    /// Reads the stored config; a missing or unreadable file yields defaults.
    fn load(&self) -> Config {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no config file, using defaults");
                return Config::default();
            }
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "cannot read config, using defaults");
                return Config::default();
            }
        };
        match serde_json::from_slice::<Config>(&bytes) {
            Ok(cfg) => cfg,
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "invalid config, using defaults");
                Config::default()
            }
        }
    }

    fn save(&self, cfg: &Config) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg).map_err(std::io::Error::other)?;
        fs::write(&self.path, data)
    }
}
