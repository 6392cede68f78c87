use super::{detect::Language, edit::Placement};
use once_cell_regex::{exports::regex::Regex, regex};
use std::{
    fmt::{self, Display},
    ops::Range,
};

/// The ways a React Native app builds its package list, oldest first.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Layout {
    /// `new MainReactPackage()` passed straight into the list.
    Legacy,
    /// 0.62's `packages.add(...)` before `return packages;`.
    PackagesAdd,
    /// 0.74+'s `PackageList(this).packages.apply { ... }`.
    PackageListApply,
    /// 0.73's bare `return PackageList(this).packages`.
    PackageListReturn,
}

impl Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Legacy => write!(f, "legacy `MainReactPackage`"),
            Self::PackagesAdd => write!(f, "React Native 0.62 `packages.add`"),
            Self::PackageListApply => write!(f, "React Native 0.74+ `PackageList.apply`"),
            Self::PackageListReturn => write!(f, "React Native 0.73 `PackageList`"),
        }
    }
}

impl Layout {
    /// Candidates in the order they're tried. The apply form has to come
    /// before the return form, since the latter's anchor is a prefix of the
    /// former's.
    pub fn candidates(language: Language) -> &'static [Self] {
        match language {
            Language::Java => &[Self::Legacy, Self::PackagesAdd],
            Language::Kotlin => &[
                Self::Legacy,
                Self::PackageListApply,
                Self::PackageListReturn,
            ],
        }
    }

    fn anchor(self, language: Language) -> Option<&'static Regex> {
        match (language, self) {
            (Language::Java, Self::Legacy) => Some(regex!(r"\bnew\s+MainReactPackage\(\)")),
            (Language::Java, Self::PackagesAdd) => Some(regex!(r"\breturn\s+packages\s*;")),
            (Language::Kotlin, Self::Legacy) => Some(regex!(r"\bMainReactPackage\(\)")),
            (Language::Kotlin, Self::PackageListApply) => {
                Some(regex!(r"\bPackageList\(this\)\.packages\.apply\s*\{"))
            }
            (Language::Kotlin, Self::PackageListReturn) => {
                Some(regex!(r"\breturn\s+PackageList\(this\)\.packages\b"))
            }
            _ => None,
        }
    }

    /// Where the registration payload goes relative to the anchor.
    pub fn placement(self) -> Placement {
        match self {
            Self::Legacy | Self::PackageListApply => Placement::After,
            Self::PackagesAdd => Placement::Before,
            Self::PackageListReturn => Placement::Replace,
        }
    }

    pub fn template_name(self) -> &'static str {
        match self {
            Self::Legacy => "register-legacy",
            Self::PackagesAdd => "register-packages-add",
            Self::PackageListApply => "register-package-list-apply",
            Self::PackageListReturn => "register-package-list-return",
        }
    }

    /// Imports this layout needs beyond the SDK's own.
    pub fn extra_import(self, language: Language) -> Option<&'static str> {
        match (language, self) {
            (Language::Java, Self::PackagesAdd) => Some("import java.util.Arrays;"),
            _ => None,
        }
    }

    /// Picks the first candidate whose anchor occurs in `text`.
    pub fn detect(language: Language, text: &str) -> Option<(Self, Range<usize>)> {
        Self::candidates(language).iter().find_map(|&layout| {
            layout
                .anchor(language)
                .and_then(|anchor| anchor.find(text))
                .map(|found| (layout, found.range()))
        })
    }
}
