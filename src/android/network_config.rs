use quick_xml::{
    events::{BytesEnd, BytesStart, BytesText, Event},
    Reader, Writer,
};
use std::path::{Path, PathBuf};
use thiserror::Error;

static DOMAIN_CONFIG: &[u8] = b"domain-config";
static DOMAIN: &[u8] = b"domain";
static CLEARTEXT: &str = "cleartextTrafficPermitted";

#[derive(Debug, Error)]
pub enum Error {
    #[error("Failed to parse network security config {path:?}: {cause}")]
    ParseFailed {
        path: PathBuf,
        cause: quick_xml::Error,
    },
    #[error("Network security config {path:?} has no `<domain-config>` element")]
    DomainConfigMissing { path: PathBuf },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Change {
    Created,
    Amended {
        cleartext_enabled: bool,
        domain_added: bool,
    },
    Unchanged,
}

pub fn skeleton(domain: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="utf-8"?>
<network-security-config>
    <domain-config cleartextTrafficPermitted="true">
        <domain includeSubdomains="true">{}</domain>
    </domain-config>
</network-security-config>
"#,
        quick_xml::escape::escape(domain)
    )
}

#[derive(Debug, Default)]
struct Survey {
    has_domain_config: bool,
    cleartext_enabled: bool,
    domain_present: bool,
}

struct Patcher<'a> {
    path: &'a Path,
    domain: &'a str,
}

impl<'a> Patcher<'a> {
    fn parse_failed(&self, cause: impl Into<quick_xml::Error>) -> Error {
        Error::ParseFailed {
            path: self.path.to_owned(),
            cause: cause.into(),
        }
    }

    fn cleartext_enabled(&self, elem: &BytesStart<'_>) -> Result<bool, Error> {
        Ok(elem
            .try_get_attribute(CLEARTEXT)
            .map_err(|err| self.parse_failed(err))?
            .map(|attr| attr.value.as_ref() == b"true")
            .unwrap_or(false))
    }

    fn survey(&self, contents: &str) -> Result<Survey, Error> {
        let mut survey = Survey::default();
        let mut reader = Reader::from_str(contents);
        let mut in_domain = false;
        loop {
            match reader.read_event().map_err(|err| self.parse_failed(err))? {
                Event::Start(e) | Event::Empty(e)
                    if !survey.has_domain_config && e.name().as_ref() == DOMAIN_CONFIG =>
                {
                    survey.has_domain_config = true;
                    survey.cleartext_enabled = self.cleartext_enabled(&e)?;
                }
                Event::Start(e) if e.name().as_ref() == DOMAIN => in_domain = true,
                Event::End(e) if e.name().as_ref() == DOMAIN => in_domain = false,
                Event::Text(e) if in_domain => {
                    let text = e.unescape().map_err(|err| self.parse_failed(err))?;
                    if text.trim() == self.domain {
                        survey.domain_present = true;
                    }
                }
                Event::Eof => break,
                _ => (),
            }
        }
        Ok(survey)
    }

    fn with_cleartext(&self, elem: &BytesStart<'_>) -> Result<BytesStart<'static>, Error> {
        let attrs = elem
            .attributes()
            .map(|attr| {
                attr.map(|attr| (attr.key.as_ref().to_vec(), attr.value.to_vec()))
                    .map_err(|err| self.parse_failed(err))
            })
            .collect::<Result<Vec<_>, Error>>()?;
        let mut rebuilt = elem.to_owned();
        rebuilt.clear_attributes();
        let mut replaced = false;
        for (key, value) in &attrs {
            if key.as_slice() == CLEARTEXT.as_bytes() {
                rebuilt.push_attribute((CLEARTEXT, "true"));
                replaced = true;
            } else {
                rebuilt.push_attribute((key.as_slice(), value.as_slice()));
            }
        }
        if !replaced {
            rebuilt.push_attribute((CLEARTEXT, "true"));
        }
        Ok(rebuilt)
    }

    fn write_domain(
        &self,
        writer: &mut Writer<Vec<u8>>,
        child_indent: &str,
        closing_indent: &str,
    ) -> Result<(), Error> {
        let mut start = BytesStart::new("domain");
        start.push_attribute(("includeSubdomains", "true"));
        let events = vec![
            Event::Text(BytesText::from_escaped(child_indent)),
            Event::Start(start),
            Event::Text(BytesText::new(self.domain)),
            Event::End(BytesEnd::new("domain")),
            Event::Text(BytesText::from_escaped(closing_indent)),
        ];
        for event in events {
            writer
                .write_event(event)
                .map_err(|err| self.parse_failed(err))?;
        }
        Ok(())
    }

    fn rewrite(&self, contents: &str, survey: &Survey) -> Result<String, Error> {
        let mut reader = Reader::from_str(contents);
        let mut writer = Writer::new(Vec::new());
        let add_domain = !survey.domain_present;
        // depth inside the first `<domain-config>`, 0 when outside it
        let mut depth = 0usize;
        let mut seen = false;
        let mut child_indent = "\n        ".to_owned();
        // whitespace directly inside `<domain-config>`, held back until we
        // know whether the closing tag comes next
        let mut pending: Option<String> = None;
        loop {
            let event = reader.read_event().map_err(|err| self.parse_failed(err))?;
            if depth == 1 {
                if let Event::Text(e) = &event {
                    let raw = std::str::from_utf8(e).map_err(|err| {
                        self.parse_failed(quick_xml::Error::NonDecodable(Some(err)))
                    })?;
                    if raw.trim().is_empty() {
                        if let Some(flushed) = pending.replace(raw.to_owned()) {
                            writer
                                .write_event(Event::Text(BytesText::from_escaped(flushed)))
                                .map_err(|err| self.parse_failed(err))?;
                        }
                        continue;
                    }
                }
                let closing =
                    matches!(&event, Event::End(e) if e.name().as_ref() == DOMAIN_CONFIG);
                if let Some(ws) = pending.take() {
                    if closing && add_domain {
                        self.write_domain(&mut writer, &child_indent, &ws)?;
                    } else {
                        if matches!(&event, Event::Start(_) | Event::Empty(_)) {
                            child_indent = ws.clone();
                        }
                        writer
                            .write_event(Event::Text(BytesText::from_escaped(ws)))
                            .map_err(|err| self.parse_failed(err))?;
                    }
                } else if closing && add_domain {
                    self.write_domain(&mut writer, &child_indent, "")?;
                }
            }
            let event = match event {
                Event::Start(e) if !seen && e.name().as_ref() == DOMAIN_CONFIG => {
                    seen = true;
                    depth = 1;
                    if survey.cleartext_enabled {
                        Event::Start(e)
                    } else {
                        Event::Start(self.with_cleartext(&e)?)
                    }
                }
                Event::Empty(e) if !seen && e.name().as_ref() == DOMAIN_CONFIG => {
                    seen = true;
                    let elem = if survey.cleartext_enabled {
                        e.to_owned()
                    } else {
                        self.with_cleartext(&e)?
                    };
                    if add_domain {
                        let end = BytesEnd::new(
                            String::from_utf8_lossy(elem.name().as_ref()).into_owned(),
                        );
                        writer
                            .write_event(Event::Start(elem))
                            .map_err(|err| self.parse_failed(err))?;
                        self.write_domain(&mut writer, &child_indent, "\n    ")?;
                        Event::End(end)
                    } else {
                        Event::Empty(elem)
                    }
                }
                Event::Start(e) => {
                    if depth > 0 {
                        depth += 1;
                    }
                    Event::Start(e)
                }
                Event::End(e) => {
                    if depth > 0 {
                        depth -= 1;
                    }
                    Event::End(e)
                }
                Event::Eof => break,
                event => event,
            };
            writer
                .write_event(event)
                .map_err(|err| self.parse_failed(err))?;
        }
        String::from_utf8(writer.into_inner()).map_err(|err| {
            self.parse_failed(quick_xml::Error::NonDecodable(Some(err.utf8_error())))
        })
    }
}

/// Creates or amends the network security config so `domain` may use
/// clear-text traffic.
///
/// `existing` is the current file contents, if the file exists. Returns the
/// new contents when they differ.
pub fn patch(
    path: &Path,
    existing: Option<&str>,
    domain: &str,
) -> Result<(Change, Option<String>), Error> {
    let contents = match existing {
        Some(contents) => contents,
        None => {
            log::info!("creating network security config at {:?}", path);
            return Ok((Change::Created, Some(skeleton(domain))));
        }
    };
    let patcher = Patcher { path, domain };
    let survey = patcher.survey(contents)?;
    log::info!("network security config {:?}: {:?}", path, survey);
    if !survey.has_domain_config {
        return Err(Error::DomainConfigMissing {
            path: path.to_owned(),
        });
    }
    if survey.cleartext_enabled && survey.domain_present {
        return Ok((Change::Unchanged, None));
    }
    let rewritten = patcher.rewrite(contents, &survey)?;
    Ok((
        Change::Amended {
            cleartext_enabled: !survey.cleartext_enabled,
            domain_added: !survey.domain_present,
        },
        Some(rewritten),
    ))
}
