use ignore::{overrides::OverrideBuilder, WalkBuilder};
use std::{
    fmt::{self, Display},
    path::{Path, PathBuf},
};
use thiserror::Error;

// Relative to the directory being searched; leading `!` makes these ignore
// globs rather than whitelist globs.
static EXCLUDED: &[&str] = &[
    "!/node_modules/",
    "!build/",
    "!/Examples/",
    "!/examples/",
    "!debug/",
];

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Artifact {
    Gradle,
    Manifest,
    Strings,
    Source,
}

impl Artifact {
    /// File names tried in order; the first name with any match wins.
    pub fn file_names(self) -> &'static [&'static str] {
        match self {
            Self::Gradle => &["build.gradle", "build.gradle.kts"],
            Self::Manifest => &["AndroidManifest.xml"],
            Self::Strings => &["strings.xml"],
            Self::Source => &[],
        }
    }
}

impl Display for Artifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Gradle => write!(f, "build.gradle"),
            Self::Manifest => write!(f, "AndroidManifest.xml"),
            Self::Strings => write!(f, "strings.xml"),
            Self::Source => write!(f, "application source file"),
        }
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("Failed to build exclusion globs for {dir:?}: {cause}")]
    OverridesInvalid { dir: PathBuf, cause: ignore::Error },
}

fn walk(dir: &Path, mut keep: impl FnMut(&Path) -> bool) -> Result<Vec<PathBuf>, Error> {
    let mut overrides = OverrideBuilder::new(dir);
    for glob in EXCLUDED {
        overrides
            .add(glob)
            .map_err(|cause| Error::OverridesInvalid {
                dir: dir.to_owned(),
                cause,
            })?;
    }
    let overrides = overrides.build().map_err(|cause| Error::OverridesInvalid {
        dir: dir.to_owned(),
        cause,
    })?;
    let mut found = WalkBuilder::new(dir)
        .standard_filters(false)
        .hidden(true)
        .overrides(overrides)
        .build()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(err) => {
                log::warn!("skipping unreadable entry under {:?}: {}", dir, err);
                None
            }
        })
        .filter(|entry| entry.file_type().map_or(false, |ty| ty.is_file()))
        .map(|entry| (entry.depth(), entry.into_path()))
        .filter(|(_, path)| keep(path))
        .collect::<Vec<_>>();
    // Shallowest first, then path order, so the winner doesn't depend on
    // directory enumeration order.
    found.sort();
    Ok(found.into_iter().map(|(_, path)| path).collect())
}

/// Finds the shallowest file named `file_name` under `dir`.
pub fn find_file(dir: &Path, file_name: &str) -> Result<Option<PathBuf>, Error> {
    let found = walk(dir, |path| {
        path.file_name().map_or(false, |name| name == file_name)
    })?;
    if found.len() > 1 {
        log::info!(
            "found {} candidates for {:?} under {:?}; using {:?}",
            found.len(),
            file_name,
            dir,
            found[0]
        );
    }
    Ok(found.into_iter().next())
}

pub fn find_artifact(dir: &Path, artifact: Artifact) -> Result<Option<PathBuf>, Error> {
    for file_name in artifact.file_names() {
        if let Some(path) = find_file(dir, file_name)? {
            log::info!("found {} at {:?}", artifact, path);
            return Ok(Some(path));
        }
    }
    log::info!("no {} found under {:?}", artifact, dir);
    Ok(None)
}

/// Every file under `dir` with the given extension, in search order.
pub fn find_with_extension(dir: &Path, extension: &str) -> Result<Vec<PathBuf>, Error> {
    walk(dir, |path| {
        path.extension().map_or(false, |ext| ext == extension)
    })
}

#[cfg(test)]
mod test {
    use super::*;
    use std::fs;

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "").unwrap();
    }

    #[test]
    fn excluded_directories_are_skipped() {
        let dir = tempfile::TempDir::new().unwrap();
        let root = dir.path();
        touch(root, "node_modules/lib/build.gradle");
        touch(root, "build/generated/build.gradle");
        touch(root, "examples/demo/build.gradle");
        touch(root, "src/debug/build.gradle");
        assert_eq!(find_file(root, "build.gradle").unwrap(), None);
        touch(root, "nested/build.gradle");
        assert_eq!(
            find_file(root, "build.gradle").unwrap(),
            Some(root.join("nested/build.gradle"))
        );
    }

    #[test]
    fn shallowest_match_wins() {
        let dir = tempfile::TempDir::new().unwrap();
        let root = dir.path();
        touch(root, "a/b/AndroidManifest.xml");
        touch(root, "z/AndroidManifest.xml");
        touch(root, "src/main/res/values/strings.xml");
        assert_eq!(
            find_artifact(root, Artifact::Manifest).unwrap(),
            Some(root.join("z/AndroidManifest.xml"))
        );
        assert_eq!(
            find_artifact(root, Artifact::Strings).unwrap(),
            Some(root.join("src/main/res/values/strings.xml"))
        );
    }

    #[test]
    fn groovy_gradle_preferred_over_kotlin_script() {
        let dir = tempfile::TempDir::new().unwrap();
        let root = dir.path();
        touch(root, "build.gradle.kts");
        assert_eq!(
            find_artifact(root, Artifact::Gradle).unwrap(),
            Some(root.join("build.gradle.kts"))
        );
        touch(root, "sub/build.gradle");
        assert_eq!(
            find_artifact(root, Artifact::Gradle).unwrap(),
            Some(root.join("sub/build.gradle"))
        );
    }

    #[test]
    fn extension_search_lists_every_match() {
        let dir = tempfile::TempDir::new().unwrap();
        let root = dir.path();
        touch(root, "java/com/acme/MainApplication.kt");
        touch(root, "java/com/acme/MainActivity.kt");
        touch(root, "java/com/acme/Notes.java");
        let found = find_with_extension(root, "kt").unwrap();
        assert_eq!(
            found,
            vec![
                root.join("java/com/acme/MainActivity.kt"),
                root.join("java/com/acme/MainApplication.kt"),
            ]
        );
    }
}
