//! Shell configuration

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use nyx_navigation::{SearchProvider, DEFAULT_HISTORY_LIMIT};

use crate::error::CoreError;
use crate::timer::{DEFAULT_STUDY_MINUTES, MAX_STUDY_MINUTES};
use crate::Result;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Path to the database file
    pub database_path: PathBuf,
    /// `ecosia`, `google`, `duckduckgo` or a url template containing `%s`
    pub search_engine: String,
    pub study_minutes: u32,
    pub history_limit: usize,
    /// Endpoint that receives a copy of every saved session
    pub session_mirror_url: Option<String>,
}

impl Config {
    pub fn new(data_dir: PathBuf) -> Self {
        Self {
            database_path: data_dir.join("nyx.db"),
            search_engine: SearchProvider::default().to_string(),
            study_minutes: DEFAULT_STUDY_MINUTES,
            history_limit: DEFAULT_HISTORY_LIMIT,
            session_mirror_url: None,
        }
    }

    pub fn data_dir() -> PathBuf {
        dirs::data_local_dir()
            .map(|d| d.join("Nyx"))
            .unwrap_or_else(|| PathBuf::from(".nyx"))
    }

    /// Load from a TOML file. Missing keys take their defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| CoreError::Config(format!("{}: {}", path.display(), e)))?;
        let config: Config =
            toml::from_str(&raw).map_err(|e| CoreError::Config(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.search_provider()?;
        if self.study_minutes == 0 || self.study_minutes > MAX_STUDY_MINUTES {
            return Err(CoreError::Config(format!(
                "study_minutes must be between 1 and {MAX_STUDY_MINUTES}"
            )));
        }
        Ok(())
    }

    pub fn search_provider(&self) -> Result<SearchProvider> {
        self.search_engine
            .parse()
            .map_err(|e: nyx_navigation::NavigationError| CoreError::Config(e.to_string()))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(Self::data_dir())
    }
}
