use directories::ProjectDirs;
use std::path::PathBuf;

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    fn project() -> Option<ProjectDirs> {
        ProjectDirs::from("", "", "examsim")
    }

    pub fn config_path() -> Option<PathBuf> {
        Self::project().map(|pd| pd.config_dir().join("config.json"))
    }

    /// Default content document, checked before the bundled sample.
    pub fn content_path() -> Option<PathBuf> {
        Self::project().map(|pd| pd.data_dir().join("subjects.json"))
    }

    pub fn log_path() -> Option<PathBuf> {
        if let Ok(home) = std::env::var("HOME") {
            let state_dir = PathBuf::from(home)
                .join(".local")
                .join("state")
                .join("examsim");
            Some(state_dir.join("examsim.log"))
        } else {
            Self::project().map(|pd| pd.data_local_dir().join("examsim.log"))
        }
    }
}
