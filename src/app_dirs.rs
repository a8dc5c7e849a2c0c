use directories::ProjectDirs;
use std::path::{Path, PathBuf};

const APP_NAME: &str = "tomato";

/// Centralized application directory resolution
#[derive(Debug, Clone, PartialEq)]
pub struct AppDirs {
    config_dir: PathBuf,
    state_dir: PathBuf,
}

impl AppDirs {
    /// XDG locations, or everything under `root` when given
    pub fn resolve(root: Option<&Path>) -> Self {
        match root {
            Some(root) => Self {
                config_dir: root.to_path_buf(),
                state_dir: root.to_path_buf(),
            },
            None => Self {
                config_dir: Self::default_config_dir(),
                state_dir: Self::default_state_dir(),
            },
        }
    }

    fn default_config_dir() -> PathBuf {
        ProjectDirs::from("", "", APP_NAME)
            .map(|pd| pd.config_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."))
    }

    fn default_state_dir() -> PathBuf {
        if let Ok(home) = std::env::var("HOME") {
            PathBuf::from(home)
                .join(".local")
                .join("state")
                .join(APP_NAME)
        } else {
            ProjectDirs::from("", "", APP_NAME)
                .map(|pd| pd.data_local_dir().to_path_buf())
                .unwrap_or_else(|| PathBuf::from("."))
        }
    }

    pub fn config_path(&self) -> PathBuf {
        self.config_dir.join("config.json")
    }

    pub fn session_path(&self) -> PathBuf {
        self.state_dir.join("current_user.json")
    }

    pub fn accounts_db_path(&self) -> PathBuf {
        self.state_dir.join("accounts.db")
    }

    pub fn log_path(&self) -> PathBuf {
        self.state_dir.join("tomato.log")
    }
}
