use crate::config::Settings;
use std::path::PathBuf;
use thiserror::Error;

static CLOSING_TAG: &str = "</resources>";
static INDENT: &str = "    ";

#[derive(Debug, Error)]
pub enum Error {
    #[error("{path:?} has no closing `</resources>` tag")]
    ClosingTagMissing { path: PathBuf },
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Entry {
    pub name: &'static str,
    pub declaration: String,
}

fn bool_entry(name: &'static str, value: bool) -> Entry {
    Entry {
        name,
        declaration: format!("<bool name=\"{}\">{}</bool>", name, value),
    }
}

/// The resources the SDK reads at startup, in insertion order.
pub fn entries(settings: &Settings) -> Vec<Entry> {
    vec![
        Entry {
            name: "smisdk_apikey",
            declaration: format!(
                "<string name=\"smisdk_apikey\">{}</string>",
                quick_xml::escape::escape(settings.api_key.as_str())
            ),
        },
        bool_entry("smisdk_show_messaging", settings.show_messaging),
        bool_entry("smisdk_start_vpn", settings.start_vpn),
        bool_entry("smisdk_controlled_vpn", settings.controlled_vpn),
    ]
}

/// Adds every entry whose name doesn't already appear in `contents`.
///
/// Returns `None` when all entries are present.
pub fn patch(
    path: impl Into<PathBuf>,
    contents: &str,
    settings: &Settings,
) -> Result<Option<String>, Error> {
    let missing = entries(settings)
        .into_iter()
        .filter(|entry| {
            let present = contents.contains(entry.name);
            if present {
                log::info!("`{}` already declared", entry.name);
            }
            !present
        })
        .collect::<Vec<_>>();
    if missing.is_empty() {
        return Ok(None);
    }
    let closing = contents
        .rfind(CLOSING_TAG)
        .ok_or_else(|| Error::ClosingTagMissing { path: path.into() })?;
    let at = contents[..closing].trim_end().len();
    let mut insertion = String::new();
    for entry in &missing {
        log::info!("declaring `{}`", entry.name);
        insertion.push('\n');
        insertion.push_str(INDENT);
        insertion.push_str(&entry.declaration);
    }
    let mut patched = String::with_capacity(contents.len() + insertion.len());
    patched.push_str(&contents[..at]);
    patched.push_str(&insertion);
    if at == closing {
        patched.push('\n');
    }
    patched.push_str(&contents[at..]);
    Ok(Some(patched))
}

#[cfg(test)]
mod test {
    use super::*;

    static STRINGS: &str = "<resources>\n    <string name=\"app_name\">Acme</string>\n</resources>\n";

    #[test]
    fn adds_all_entries_before_closing_tag() {
        let patched = patch("strings.xml", STRINGS, &Settings::default())
            .unwrap()
            .unwrap();
        assert_eq!(
            patched,
            "<resources>\n    <string name=\"app_name\">Acme</string>\n    <string name=\"smisdk_apikey\"></string>\n    <bool name=\"smisdk_show_messaging\">true</bool>\n    <bool name=\"smisdk_start_vpn\">true</bool>\n    <bool name=\"smisdk_controlled_vpn\">false</bool>\n</resources>\n"
        );
    }

    #[test]
    fn second_pass_changes_nothing() {
        let patched = patch("strings.xml", STRINGS, &Settings::default())
            .unwrap()
            .unwrap();
        assert_eq!(patch("strings.xml", &patched, &Settings::default()).unwrap(), None);
    }

    #[test]
    fn only_missing_entries_are_added() {
        let contents = "<resources>\n    <bool name=\"smisdk_start_vpn\">false</bool>\n</resources>";
        let patched = patch("strings.xml", contents, &Settings::default())
            .unwrap()
            .unwrap();
        assert_eq!(patched.matches("smisdk_start_vpn").count(), 1);
        assert!(patched.contains("<bool name=\"smisdk_start_vpn\">false</bool>"));
        assert!(patched.contains("smisdk_controlled_vpn"));
        assert!(patched.ends_with("</bool>\n</resources>"));
    }

    #[test]
    fn api_key_is_escaped() {
        let settings = Settings {
            api_key: "a<b&c".to_owned(),
            ..Settings::default()
        };
        let patched = patch("strings.xml", "<resources></resources>", &settings)
            .unwrap()
            .unwrap();
        assert!(patched.contains("<string name=\"smisdk_apikey\">a&lt;b&amp;c</string>"));
        assert!(patched.ends_with("</bool>\n</resources>"));
    }

    #[test]
    fn missing_closing_tag_is_an_error() {
        assert!(patch("strings.xml", "<resources>", &Settings::default()).is_err());
    }
}
