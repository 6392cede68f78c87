use crate::android::locate;
use once_cell_regex::{exports::regex::Regex, regex};
use std::{
    fmt::{self, Display},
    fs, io,
    path::{Path, PathBuf},
};
use thiserror::Error;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Language {
    Java,
    Kotlin,
}

impl Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Java => write!(f, "Java"),
            Self::Kotlin => write!(f, "Kotlin"),
        }
    }
}

impl Language {
    /// Searched in this order; a later language is only tried when no files
    /// of the earlier one exist at all.
    pub const ALL: [Self; 2] = [Self::Java, Self::Kotlin];

    pub fn extension(self) -> &'static str {
        match self {
            Self::Java => "java",
            Self::Kotlin => "kt",
        }
    }

    pub(super) fn declaration(self) -> &'static Regex {
        match self {
            Self::Java => regex!(r"class\s+(\w+)\b[^{;]*\bimplements\b[^{;]*\bReactApplication\b"),
            Self::Kotlin => regex!(r"class\s+(\w+)\s*:\s*Application\(\)\s*,\s*ReactApplication\b"),
        }
    }
}

/// The class a React Native app registers its native packages from.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ApplicationClass {
    pub name: String,
    pub language: Language,
    pub path: PathBuf,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    SearchFailed(#[from] locate::Error),
    #[error("Failed to read {path:?}: {cause}")]
    ReadFailed { path: PathBuf, cause: io::Error },
}

pub fn class_name(language: Language, contents: &str) -> Option<String> {
    language
        .declaration()
        .captures(contents)
        .map(|caps| caps[1].to_owned())
}

/// Scans `source_dir` for the application class.
pub fn detect(source_dir: &Path) -> Result<Option<ApplicationClass>, Error> {
    for &language in &Language::ALL {
        let files = locate::find_with_extension(source_dir, language.extension())?;
        if files.is_empty() {
            log::info!("no {} sources under {:?}", language, source_dir);
            continue;
        }
        for path in files {
            let contents = fs::read_to_string(&path).map_err(|cause| Error::ReadFailed {
                path: path.clone(),
                cause,
            })?;
            if let Some(name) = class_name(language, &contents) {
                log::info!("detected {} application class `{}` in {:?}", language, name, path);
                return Ok(Some(ApplicationClass {
                    name,
                    language,
                    path,
                }));
            }
        }
        log::info!("no {} application class under {:?}", language, source_dir);
        return Ok(None);
    }
    Ok(None)
}

#[cfg(test)]
mod test {
    use super::*;
    use rstest::rstest;

    #[rstest(language, contents, expected,
        case(Language::Java, "public class MainApplication extends Application implements ReactApplication {", Some("MainApplication")),
        case(Language::Java, "public class MainApp extends Application\n    implements ReactApplication, Foo {", Some("MainApp")),
        case(Language::Java, "public class MainActivity extends ReactActivity {", None),
        case(Language::Kotlin, "class MainApplication : Application(), ReactApplication {", Some("MainApplication")),
        case(Language::Kotlin, "class MainApplication: Application() , ReactApplication {", Some("MainApplication")),
        case(Language::Kotlin, "class MainActivity : ReactActivity() {", None)
    )]
    fn matches_declarations(language: Language, contents: &str, expected: Option<&str>) {
        assert_eq!(class_name(language, contents).as_deref(), expected);
    }

    fn write(root: &Path, rel: &str, contents: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    #[test]
    fn reports_the_matching_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let root = dir.path();
        write(root, "java/com/acme/AaaActivity.kt", "class AaaActivity : ReactActivity() {}");
        write(
            root,
            "java/com/acme/MainApplication.kt",
            "class MainApplication : Application(), ReactApplication {}",
        );
        let class = detect(root).unwrap().unwrap();
        assert_eq!(class.name, "MainApplication");
        assert_eq!(class.language, Language::Kotlin);
        assert_eq!(class.path, root.join("java/com/acme/MainApplication.kt"));
    }

    #[test]
    fn java_files_shadow_kotlin() {
        let dir = tempfile::TempDir::new().unwrap();
        let root = dir.path();
        write(root, "java/com/acme/Util.java", "class Util {}");
        write(
            root,
            "java/com/acme/MainApplication.kt",
            "class MainApplication : Application(), ReactApplication {}",
        );
        assert_eq!(detect(root).unwrap(), None);
    }

    #[test]
    fn nothing_found_in_empty_tree() {
        let dir = tempfile::TempDir::new().unwrap();
        assert_eq!(detect(dir.path()).unwrap(), None);
    }
}
