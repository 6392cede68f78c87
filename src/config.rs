use crate::util::cli::{Report, Reportable};
use serde::{Deserialize, Serialize};
use std::{
    fs, io,
    path::{Path, PathBuf},
};
use thiserror::Error;

pub static FILE_NAME: &str = "smisdk.toml";

pub static DEFAULT_TRUSTED_DOMAIN: &str = "cloudmi.datami.com";

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Failed to read settings file at {path:?}: {cause}")]
    ReadFailed { path: PathBuf, cause: io::Error },
    #[error("Failed to parse settings file at {path:?}: {cause}")]
    ParseFailed {
        path: PathBuf,
        cause: toml::de::Error,
    },
}

impl Reportable for LoadError {
    fn report(&self) -> Report {
        Report::error("Failed to load SmiSdk settings", self)
    }
}

/// Values written into the host app's resources.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default, deny_unknown_fields, rename_all = "kebab-case")]
pub struct Settings {
    pub api_key: String,
    pub show_messaging: bool,
    pub start_vpn: bool,
    pub controlled_vpn: bool,
    pub trusted_domain: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            show_messaging: true,
            start_vpn: true,
            controlled_vpn: false,
            trusted_domain: DEFAULT_TRUSTED_DOMAIN.to_owned(),
        }
    }
}

impl Settings {
    /// Loads `path` if given, otherwise `smisdk.toml` in `root` if present.
    /// An explicit path must exist.
    pub fn load(root: &Path, path: Option<&Path>) -> Result<Self, LoadError> {
        let path = match path {
            Some(path) => path.to_owned(),
            None => {
                let path = root.join(FILE_NAME);
                if !path.is_file() {
                    log::info!("no settings file at {:?}; using defaults", path);
                    return Ok(Self::default());
                }
                path
            }
        };
        log::info!("loading settings from {:?}", path);
        let bytes = fs::read(&path).map_err(|cause| LoadError::ReadFailed {
            path: path.clone(),
            cause,
        })?;
        toml::from_slice(&bytes).map_err(|cause| LoadError::ParseFailed { path, cause })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::TempDir::new().unwrap();
        assert_eq!(Settings::load(dir.path(), None).unwrap(), Settings::default());
    }

    #[test]
    fn partial_file_keeps_remaining_defaults() {
        let dir = tempfile::TempDir::new().unwrap();
        fs::write(
            dir.path().join(FILE_NAME),
            "api-key = \"abc123\"\ncontrolled-vpn = true\n",
        )
        .unwrap();
        let settings = Settings::load(dir.path(), None).unwrap();
        assert_eq!(settings.api_key, "abc123");
        assert!(settings.controlled_vpn);
        assert!(settings.show_messaging);
        assert_eq!(settings.trusted_domain, DEFAULT_TRUSTED_DOMAIN);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("custom.toml");
        fs::write(&path, "apikey = \"typo\"\n").unwrap();
        assert!(matches!(
            Settings::load(dir.path(), Some(&path)),
            Err(LoadError::ParseFailed { .. })
        ));
    }

    #[test]
    fn explicit_missing_path_fails() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("nope.toml");
        assert!(matches!(
            Settings::load(dir.path(), Some(&path)),
            Err(LoadError::ReadFailed { .. })
        ));
    }
}
