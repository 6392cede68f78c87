#[derive(Clone, Copy, Debug, Eq, Ord, PartialEq, PartialOrd)]
pub enum NoiseLevel {
    Polite,
    LoudAndProud,
    FranklyQuitePedantic,
}

impl Default for NoiseLevel {
    fn default() -> Self {
        Self::Polite
    }
}

impl NoiseLevel {
    pub fn from_occurrences(occurrences: u64) -> Self {
        match occurrences {
            0 => Self::Polite,
            1 => Self::LoudAndProud,
            _ => Self::FranklyQuitePedantic,
        }
    }
}

/// Whether planned changes are written to disk.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum WriteMode {
    Apply,
    DryRun,
}

impl Default for WriteMode {
    fn default() -> Self {
        Self::Apply
    }
}

impl WriteMode {
    pub fn from_flag(flag: bool) -> Self {
        if flag {
            Self::DryRun
        } else {
            Self::Apply
        }
    }

    pub fn dry_run(self) -> bool {
        matches!(self, Self::DryRun)
    }
}

/// Whether the network security config step runs.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum NetworkConfig {
    Skip,
    Patch,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self::Skip
    }
}

impl NetworkConfig {
    pub fn from_flag(flag: bool) -> Self {
        if flag {
            Self::Patch
        } else {
            Self::Skip
        }
    }

    pub fn patch(self) -> bool {
        matches!(self, Self::Patch)
    }
}
