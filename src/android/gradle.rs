use once_cell_regex::regex;
use std::{
    fs, io,
    path::{Path, PathBuf},
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Failed to read {path:?}: {cause}")]
    ReadFailed { path: PathBuf, cause: io::Error },
}

/// Package identifiers declared by a gradle build file.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Identifiers {
    /// The last `namespace` or `applicationId`, whichever is declared later.
    pub application_id: Option<String>,
    /// The last `namespace`.
    pub namespace: Option<String>,
}

impl Identifiers {
    /// Where `R` is generated: the namespace if there is one.
    pub fn r_package(&self) -> Option<&str> {
        self.namespace
            .as_deref()
            .or_else(|| self.application_id.as_deref())
    }
}

pub fn identifiers(contents: &str) -> Identifiers {
    let mut found = Identifiers::default();
    for line in contents.lines() {
        if !line.contains("namespace") && !line.contains("applicationId") {
            continue;
        }
        match regex!(r#"^\s*(namespace|applicationId)\b\s*=?\s*["']([^"']+)["']"#).captures(line) {
            Some(caps) => {
                let value = caps[2].to_owned();
                if &caps[1] == "namespace" {
                    found.namespace = Some(value.clone());
                }
                found.application_id = Some(value);
            }
            None => log::debug!("ignoring gradle line {:?}", line.trim()),
        }
    }
    found
}

pub fn read_identifiers(path: &Path) -> Result<Identifiers, Error> {
    let contents = fs::read_to_string(path).map_err(|cause| Error::ReadFailed {
        path: path.to_owned(),
        cause,
    })?;
    let ids = identifiers(&contents);
    log::info!("identifiers from {:?}: {:?}", path, ids);
    Ok(ids)
}

#[cfg(test)]
mod test {
    use super::*;
    use rstest::rstest;

    #[rstest(contents, expected,
        case("android {\n    namespace \"com.acme.app\"\n}\n", Some("com.acme.app")),
        case("android {\n    namespace = 'com.acme.kts'\n}\n", Some("com.acme.kts")),
        case(
            "android {\n    namespace \"com.acme.first\"\n    defaultConfig {\n        applicationId \"com.acme.second\"\n    }\n}\n",
            Some("com.acme.second")
        ),
        case(
            "defaultConfig {\n    applicationId \"com.acme.app\"\n    applicationIdSuffix \".debug\"\n}\n",
            Some("com.acme.app")
        ),
        case("android {\n    namespace computeNamespace()\n}\n", None),
        case("apply plugin: \"com.android.application\"\n", None)
    )]
    fn reads_last_declaration(contents: &str, expected: Option<&str>) {
        assert_eq!(identifiers(contents).application_id.as_deref(), expected);
    }

    #[rstest(contents, expected,
        case(
            "android {\n    namespace \"com.acme.app\"\n    defaultConfig {\n        applicationId \"com.acme.app.prod\"\n    }\n}\n",
            Some("com.acme.app")
        ),
        case("defaultConfig {\n    applicationId \"com.acme.app\"\n}\n", Some("com.acme.app")),
        case("apply plugin: \"com.android.application\"\n", None)
    )]
    fn r_lives_in_the_namespace(contents: &str, expected: Option<&str>) {
        assert_eq!(identifiers(contents).r_package(), expected);
    }
}
