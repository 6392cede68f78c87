use quick_xml::{
    events::{BytesStart, Event},
    Reader, Writer,
};
use std::{
    fs, io,
    path::{Path, PathBuf},
};
use thiserror::Error;

static ANDROID_NAME: &str = "android:name";

#[derive(Debug, Error)]
pub enum Error {
    #[error("Failed to read {path:?}: {cause}")]
    ReadFailed { path: PathBuf, cause: io::Error },
    #[error("Failed to parse manifest {path:?}: {cause}")]
    ParseFailed {
        path: PathBuf,
        cause: quick_xml::Error,
    },
    #[error("Manifest {path:?} has no `<application>` element")]
    ApplicationMissing { path: PathBuf },
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum NameChange {
    Unchanged,
    Added,
    Replaced { previous: String },
}

/// An `AndroidManifest.xml` held in memory.
#[derive(Debug)]
pub struct Manifest {
    path: PathBuf,
    contents: String,
}

impl Manifest {
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, Error> {
        let path = path.into();
        let contents = fs::read_to_string(&path).map_err(|cause| Error::ReadFailed {
            path: path.clone(),
            cause,
        })?;
        Ok(Self::from_contents(path, contents))
    }

    pub fn from_contents(path: impl Into<PathBuf>, contents: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            contents: contents.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn contents(&self) -> &str {
        &self.contents
    }

    fn parse_failed(&self, cause: impl Into<quick_xml::Error>) -> Error {
        Error::ParseFailed {
            path: self.path.clone(),
            cause: cause.into(),
        }
    }

    /// The `package` attribute of the root element, if present and non-empty.
    pub fn package(&self) -> Result<Option<String>, Error> {
        let mut reader = Reader::from_str(&self.contents);
        loop {
            match reader.read_event().map_err(|err| self.parse_failed(err))? {
                Event::Start(e) | Event::Empty(e) => {
                    let package = e
                        .try_get_attribute("package")
                        .map_err(|err| self.parse_failed(err))?
                        .map(|attr| attr.unescape_value().map(|value| value.into_owned()))
                        .transpose()
                        .map_err(|err| self.parse_failed(err))?
                        .filter(|value| !value.is_empty());
                    log::info!("manifest package attribute: {:?}", package);
                    return Ok(package);
                }
                Event::Eof => return Ok(None),
                _ => (),
            }
        }
    }

    /// Points `<application android:name>` at `.{class_name}`.
    ///
    /// Returns the rewritten document only when something changed; the rest
    /// of the document is passed through event by event.
    pub fn set_application_name(
        &self,
        class_name: &str,
    ) -> Result<(NameChange, Option<String>), Error> {
        let wanted = format!(".{}", class_name);
        let mut reader = Reader::from_str(&self.contents);
        let mut writer = Writer::new(Vec::new());
        let mut change = None;
        loop {
            let event = reader.read_event().map_err(|err| self.parse_failed(err))?;
            let event = match event {
                Event::Start(e) if change.is_none() && e.name().as_ref() == b"application" => {
                    let (elem, this_change) = self.with_name(e, &wanted)?;
                    change = Some(this_change);
                    Event::Start(elem)
                }
                Event::Empty(e) if change.is_none() && e.name().as_ref() == b"application" => {
                    let (elem, this_change) = self.with_name(e, &wanted)?;
                    change = Some(this_change);
                    Event::Empty(elem)
                }
                Event::Eof => break,
                event => event,
            };
            writer
                .write_event(event)
                .map_err(|err| self.parse_failed(err))?;
        }
        let change = change.ok_or_else(|| Error::ApplicationMissing {
            path: self.path.clone(),
        })?;
        match &change {
            NameChange::Unchanged => {
                log::info!("application class name already matches {:?}", wanted);
                Ok((change, None))
            }
            _ => {
                log::info!("application class name set to {:?} ({:?})", wanted, change);
                let contents = String::from_utf8(writer.into_inner()).map_err(|err| {
                    self.parse_failed(quick_xml::Error::NonDecodable(Some(err.utf8_error())))
                })?;
                Ok((change, Some(contents)))
            }
        }
    }

    fn with_name<'a>(
        &self,
        elem: BytesStart<'a>,
        wanted: &str,
    ) -> Result<(BytesStart<'a>, NameChange), Error> {
        // Snapshot before touching anything so removal can't disturb iteration.
        let attrs = elem
            .attributes()
            .map(|attr| -> Result<_, Error> {
                let attr = attr.map_err(|err| self.parse_failed(err))?;
                let value = attr
                    .unescape_value()
                    .map_err(|err| self.parse_failed(err))?
                    .into_owned();
                Ok((attr.key.as_ref().to_vec(), attr.value.to_vec(), value))
            })
            .collect::<Result<Vec<_>, Error>>()?;
        match attrs
            .iter()
            .find(|(key, _, _)| key.as_slice() == ANDROID_NAME.as_bytes())
        {
            Some((_, _, value)) if value == wanted => Ok((elem, NameChange::Unchanged)),
            Some((_, _, previous)) => {
                let previous = previous.clone();
                let mut rebuilt = elem.to_owned();
                rebuilt.clear_attributes();
                for (key, raw, _) in &attrs {
                    if key.as_slice() != ANDROID_NAME.as_bytes() {
                        rebuilt.push_attribute((key.as_slice(), raw.as_slice()));
                    }
                }
                rebuilt.push_attribute((ANDROID_NAME, wanted));
                Ok((rebuilt, NameChange::Replaced { previous }))
            }
            None => {
                let mut extended = elem.to_owned();
                extended.push_attribute((ANDROID_NAME, wanted));
                Ok((extended, NameChange::Added))
            }
        }
    }
}
