use crate::android::locate::Artifact;
use std::fmt::{self, Display};

/// One patcher's slot in the run, in the order they run.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Step {
    Source,
    Manifest,
    Strings,
    NetworkConfig,
}

impl Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Source => write!(f, "Application class"),
            Self::Manifest => write!(f, "AndroidManifest.xml"),
            Self::Strings => write!(f, "strings.xml"),
            Self::NetworkConfig => write!(f, "Network security config"),
        }
    }
}

/// Why a step didn't touch anything. None of these abort the run.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Skip {
    ArtifactNotFound(Artifact),
    ApplicationClassNotDetected,
    AnchorNotMatched { anchor: &'static str },
    PatchAlreadyApplied,
}

impl Display for Skip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ArtifactNotFound(artifact) => write!(f, "no {} found", artifact),
            Self::ApplicationClassNotDetected => write!(
                f,
                "no class implementing `ReactApplication` found; create one and point `android:name` at it"
            ),
            Self::AnchorNotMatched { anchor } => write!(
                f,
                "the {} didn't match any known React Native layout",
                anchor
            ),
            Self::PatchAlreadyApplied => write!(f, "already integrated"),
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Outcome {
    Patched(String),
    Unchanged(String),
    Skipped(Skip),
}

impl Outcome {
    /// Skips that leave the app without a working integration.
    pub fn needs_attention(&self) -> bool {
        match self {
            Self::Skipped(Skip::PatchAlreadyApplied) => false,
            Self::Skipped(_) => true,
            _ => false,
        }
    }
}

impl Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Patched(detail) => write!(f, "patched: {}", detail),
            Self::Unchanged(detail) => write!(f, "unchanged: {}", detail),
            Self::Skipped(skip) => write!(f, "skipped: {}", skip),
        }
    }
}
