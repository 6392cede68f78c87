use std::path::{Path, PathBuf};
use thiserror::Error;

// Checked in order.
static CANDIDATES: &[&str] = &["android/app", "android"];

#[derive(Debug, Error)]
#[error("No Android module found in {root:?} (looked for `android/app` and `android`)")]
pub struct ModuleNotFound {
    pub root: PathBuf,
}

/// Where the Android module lives inside a React Native project.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ProjectLayout {
    root: PathBuf,
    module_rel: PathBuf,
}

impl ProjectLayout {
    pub fn resolve(root: impl AsRef<Path>) -> Result<Self, ModuleNotFound> {
        let root = root.as_ref();
        let root = dunce::canonicalize(root).unwrap_or_else(|_| root.to_owned());
        CANDIDATES
            .iter()
            .map(Path::new)
            .find(|rel| root.join(rel).is_dir())
            .map(|rel| {
                log::info!("using Android module at {:?}", root.join(rel));
                Self {
                    module_rel: rel.to_owned(),
                    root: root.clone(),
                }
            })
            .ok_or(ModuleNotFound { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn module_rel(&self) -> &Path {
        &self.module_rel
    }

    pub fn module_dir(&self) -> PathBuf {
        self.root.join(&self.module_rel)
    }

    pub fn main_source_set(&self) -> PathBuf {
        self.module_dir().join("src").join("main")
    }

    pub fn network_security_config(&self) -> PathBuf {
        self.main_source_set()
            .join("res")
            .join("xml")
            .join("network_security_config.xml")
    }
}
