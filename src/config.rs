//! Backend configuration: a `directory` base path, loaded from a TOML file
//! or supplied directly by a CLI flag.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Error, Result};

/// Configuration accepted by [`crate::backend::Backend::open`].
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Filesystem root under which entry files and subtree directories are
    /// stored. Required; an empty path is a startup error.
    pub directory: PathBuf,
}

impl Config {
    /// Load configuration from a TOML file at `path`.
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .map_err(|e| Error::Other(format!("reading config file {}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }

    /// Parse configuration from a TOML document already in memory.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Config =
            toml::from_str(text).map_err(|e| Error::Other(format!("parsing config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Build configuration directly from a directory path, bypassing TOML
    /// (used by the CLI binary's `--directory` flag).
    pub fn from_directory(directory: PathBuf) -> Result<Self> {
        let config = Config { directory };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.directory.as_os_str().is_empty() {
            return Err(Error::Other("directory option must not be empty".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_directory_from_toml() {
        let config = Config::from_toml_str(r#"directory = "/var/db/ldif""#).unwrap();
        assert_eq!(config.directory, PathBuf::from("/var/db/ldif"));
    }

    #[test]
    fn rejects_empty_directory() {
        assert!(Config::from_directory(PathBuf::new()).is_err());
    }

    #[test]
    fn rejects_missing_directory_key() {
        assert!(Config::from_toml_str("").is_err());
    }
}
