//! The boilerplate spliced into application classes, as handlebars templates.

use super::detect::Language;
use handlebars::{to_json, Handlebars};
use serde::Serialize;
use serde_json::value::{Map, Value as Json};
use thiserror::Error;

static SOURCES: &[(&str, &str)] = &[
    ("java/imports", include_str!("../../templates/source/java/imports.hbs")),
    ("java/interface", include_str!("../../templates/source/java/interface.hbs")),
    ("java/init", include_str!("../../templates/source/java/init.hbs")),
    ("java/on-create", include_str!("../../templates/source/java/on-create.hbs")),
    ("java/on-change", include_str!("../../templates/source/java/on-change.hbs")),
    (
        "java/register-legacy",
        include_str!("../../templates/source/java/register-legacy.hbs"),
    ),
    (
        "java/register-packages-add",
        include_str!("../../templates/source/java/register-packages-add.hbs"),
    ),
    ("kotlin/imports", include_str!("../../templates/source/kotlin/imports.hbs")),
    ("kotlin/interface", include_str!("../../templates/source/kotlin/interface.hbs")),
    ("kotlin/init", include_str!("../../templates/source/kotlin/init.hbs")),
    ("kotlin/on-create", include_str!("../../templates/source/kotlin/on-create.hbs")),
    ("kotlin/on-change", include_str!("../../templates/source/kotlin/on-change.hbs")),
    (
        "kotlin/register-legacy",
        include_str!("../../templates/source/kotlin/register-legacy.hbs"),
    ),
    (
        "kotlin/register-package-list-apply",
        include_str!("../../templates/source/kotlin/register-package-list-apply.hbs"),
    ),
    (
        "kotlin/register-package-list-return",
        include_str!("../../templates/source/kotlin/register-package-list-return.hbs"),
    ),
];

/// Map of template variable names and values.
#[derive(Clone, Debug, Default)]
pub struct JsonMap(Map<String, Json>);

impl JsonMap {
    pub fn insert(&mut self, name: &str, value: impl Serialize) {
        self.0.insert(name.to_owned(), to_json(value));
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("Template {name:?} is invalid: {cause}")]
    TemplateInvalid {
        name: &'static str,
        #[source]
        cause: Box<handlebars::TemplateError>,
    },
    #[error("Failed to render template {name:?}: {cause}")]
    RenderingFailed {
        name: String,
        #[source]
        cause: Box<handlebars::RenderError>,
    },
}

#[derive(Debug)]
pub struct Templates {
    handlebars: Handlebars<'static>,
}

impl Templates {
    pub fn new() -> Result<Self, Error> {
        let mut handlebars = Handlebars::new();
        handlebars.set_strict_mode(true);
        handlebars.register_escape_fn(handlebars::no_escape);
        for &(name, source) in SOURCES {
            // the newline ending each file isn't part of the payload
            handlebars
                .register_template_string(name, source.trim_end_matches(&['\n', '\r'][..]))
                .map_err(|cause| Error::TemplateInvalid {
                    name,
                    cause: Box::new(cause),
                })?;
        }
        Ok(Self { handlebars })
    }

    pub fn render(&self, language: Language, name: &str, data: &JsonMap) -> Result<String, Error> {
        let name = format!("{}/{}", dir(language), name);
        log::debug!("rendering template {:?}", name);
        self.handlebars
            .render(&name, &data.0)
            .map_err(|cause| Error::RenderingFailed {
                name,
                cause: Box::new(cause),
            })
    }
}

fn dir(language: Language) -> &'static str {
    match language {
        Language::Java => "java",
        Language::Kotlin => "kotlin",
    }
}
