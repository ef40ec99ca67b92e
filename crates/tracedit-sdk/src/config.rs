use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracedit_session::DEFAULT_DATA_FOLDER_SUFFIX;
use tracedit_tree::SearchOptions;

use crate::error::{SdkError, SdkResult};

/// Editor settings, read from a TOML file.
///
/// ```toml
/// [search]
/// case_sensitive = false
/// wrap = true
///
/// [session]
/// data_folder_suffix = "-sessiondata"
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub search: SearchOptions,
    pub session: SessionConfig,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Appended to the session file stem to name the session-data folder.
    pub data_folder_suffix: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            data_folder_suffix: DEFAULT_DATA_FOLDER_SUFFIX.into(),
        }
    }
}

impl EditorConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(s)
    }

    pub fn load(path: &Path) -> SdkResult<Self> {
        let config_err = |reason: String| SdkError::Config {
            path: path.to_path_buf(),
            reason,
        };
        let text = fs::read_to_string(path).map_err(|e| config_err(e.to_string()))?;
        let config = Self::from_toml_str(&text).map_err(|e| config_err(e.to_string()))?;
        if config.session.data_folder_suffix.is_empty() {
            return Err(config_err("session.data_folder_suffix must not be empty".into()));
        }
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let c = EditorConfig::default();
        assert!(!c.search.case_sensitive);
        assert!(!c.search.wrap);
        assert_eq!(c.session.data_folder_suffix, "-sessiondata");
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let c = EditorConfig::from_toml_str("[search]\nwrap = true\n").unwrap();
        assert!(c.search.wrap);
        assert!(!c.search.case_sensitive);
        assert_eq!(c.session, SessionConfig::default());
    }

    #[test]
    fn toml_roundtrip() {
        let mut c = EditorConfig::default();
        c.search.case_sensitive = true;
        c.session.data_folder_suffix = "-data".into();
        let text = c.to_toml_string().unwrap();
        assert_eq!(EditorConfig::from_toml_str(&text).unwrap(), c);
    }

    #[test]
    fn load_rejects_bad_files() {
        let dir = tempfile::tempdir().unwrap();
        let bad = dir.path().join("bad.toml");
        fs::write(&bad, "search = 3").unwrap();
        assert!(matches!(EditorConfig::load(&bad), Err(SdkError::Config { .. })));

        let empty_suffix = dir.path().join("empty.toml");
        fs::write(&empty_suffix, "[session]\ndata_folder_suffix = \"\"\n").unwrap();
        let err = EditorConfig::load(&empty_suffix).unwrap_err();
        assert!(err.to_string().contains("must not be empty"));

        assert!(EditorConfig::load(&dir.path().join("missing.toml")).is_err());
    }
}
