use crate::util::list_display;
use std::{
    fmt::{self, Display},
    path::PathBuf,
};
use thiserror::Error;

// https://docs.oracle.com/javase/tutorial/java/nutsandbolts/_keywords.html
static RESERVED_JAVA_KEYWORDS: [&str; 53] = [
    "abstract",
    "assert",
    "boolean",
    "break",
    "byte",
    "case",
    "catch",
    "char",
    "class",
    "const",
    "continue",
    "default",
    "do",
    "double",
    "else",
    "enum",
    "extends",
    "false",
    "final",
    "finally",
    "float",
    "for",
    "goto",
    "if",
    "implements",
    "import",
    "instanceof",
    "int",
    "interface",
    "long",
    "native",
    "new",
    "null",
    "package",
    "private",
    "protected",
    "public",
    "return",
    "short",
    "static",
    "strictfp",
    "super",
    "switch",
    "synchronized",
    "this",
    "throw",
    "throws",
    "transient",
    "true",
    "try",
    "void",
    "volatile",
    "while",
];

#[derive(Debug, Error, Eq, PartialEq)]
pub enum PackageIdError {
    #[error("Package identifier can't be empty.")]
    Empty,
    #[error("Package identifier can't start or end with a dot.")]
    StartsOrEndsWithADot,
    #[error("Package identifier labels can't be empty.")]
    EmptyLabel,
    #[error("\"{label}\" label starts with a digit, which is not allowed in java/kotlin packages.")]
    StartsWithDigit { label: String },
    #[error("\"{keyword}\" is a reserved keyword in java/kotlin and can't be used in a package identifier.")]
    ReservedKeyword { keyword: String },
    #[error("{} characters were used in package identifier, but only ASCII letters, numbers and underscores are allowed.", quoted(.bad_chars))]
    InvalidChars { bad_chars: Vec<char> },
}

fn quoted(chars: &[char]) -> String {
    list_display(&chars.iter().map(|c| format!("'{}'", c)).collect::<Vec<_>>())
}

/// A dotted Java package name, e.g. `com.acme.app`.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct PackageId(String);

impl Display for PackageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl PackageId {
    pub fn parse(id: impl Into<String>) -> Result<Self, PackageIdError> {
        let id = id.into();
        if id.is_empty() {
            return Err(PackageIdError::Empty);
        }
        if id.starts_with('.') || id.ends_with('.') {
            return Err(PackageIdError::StartsOrEndsWithADot);
        }
        for label in id.split('.') {
            let first = label.chars().next().ok_or(PackageIdError::EmptyLabel)?;
            if RESERVED_JAVA_KEYWORDS.contains(&label) {
                return Err(PackageIdError::ReservedKeyword {
                    keyword: label.to_owned(),
                });
            }
            if first.is_ascii_digit() {
                return Err(PackageIdError::StartsWithDigit {
                    label: label.to_owned(),
                });
            }
            let mut bad_chars = Vec::new();
            for c in label.chars() {
                if !(c.is_ascii_alphanumeric() || c == '_') && !bad_chars.contains(&c) {
                    bad_chars.push(c);
                }
            }
            if !bad_chars.is_empty() {
                return Err(PackageIdError::InvalidChars { bad_chars });
            }
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `com.acme.app` becomes `com/acme/app` (with the platform separator).
    pub fn to_path(&self) -> PathBuf {
        self.0.split('.').collect()
    }
}
