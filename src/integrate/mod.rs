//! The whole run: plan every change in memory, then write them all at once.

mod apply;
mod outcome;
mod summary;

pub use self::{
    apply::{apply, ApplyFailed, FileChange},
    outcome::{Outcome, Skip, Step},
    summary::Summary,
};

use crate::{
    android::{
        gradle,
        locate::{self, Artifact},
        manifest::{self, Manifest, NameChange},
        network_config,
        package::{PackageId, PackageIdError},
        project::{ModuleNotFound, ProjectLayout},
        strings,
    },
    config::{self, Settings},
    opts,
    source::{self, detect, patch, ApplicationClass, Templates},
    util::{
        self,
        cli::{Report, Reportable, TextWrapper},
    },
};
use std::{
    fs, io,
    path::{Path, PathBuf},
};

#[derive(Debug)]
pub enum Error {
    ModuleNotFound(ModuleNotFound),
    SettingsLoadFailed(config::LoadError),
    LocateFailed(locate::Error),
    DetectFailed(detect::Error),
    ReadFailed { path: PathBuf, cause: io::Error },
    GradleReadFailed(gradle::Error),
    ManifestFailed(manifest::Error),
    PackageIdUnreadable { manifest: PathBuf },
    PackageIdInvalid { id: String, cause: PackageIdError },
    TemplatesInvalid(source::templates::Error),
    SourcePatchFailed { path: PathBuf, cause: patch::Error },
    StringsPatchFailed(strings::Error),
    NetworkConfigPatchFailed(network_config::Error),
    ApplyFailed(ApplyFailed),
}

impl Reportable for Error {
    fn report(&self) -> Report {
        match self {
            Self::ModuleNotFound(err) => Report::error("Couldn't find the Android module", err),
            Self::SettingsLoadFailed(err) => err.report(),
            Self::LocateFailed(err) => Report::error("Failed to search the Android module", err),
            Self::DetectFailed(err) => Report::error("Failed to scan for the application class", err),
            Self::ReadFailed { path, cause } => Report::error(format!("Failed to read {:?}", path), cause),
            Self::GradleReadFailed(err) => Report::error("Failed to read the gradle build file", err),
            Self::ManifestFailed(err) => Report::error("Failed to process the Android manifest", err),
            Self::PackageIdUnreadable { manifest } => Report::error(
                "Couldn't determine the application's package identifier",
                format!("{:?} has no `package` attribute and no build.gradle declares a `namespace` or `applicationId`", manifest),
            ),
            Self::PackageIdInvalid { id, cause } => Report::error(format!("Package identifier {:?} is invalid", id), cause),
            Self::TemplatesInvalid(err) => Report::error("Failed to load source templates", err),
            Self::SourcePatchFailed { path, cause } => Report::error(format!("Failed to patch application class {:?}", path), cause),
            Self::StringsPatchFailed(err) => Report::error("Failed to patch strings.xml", err),
            Self::NetworkConfigPatchFailed(err) => Report::error("Failed to patch the network security config", err),
            Self::ApplyFailed(err) if err.rollback_failures.is_empty() => Report::error("Failed to write changes; every file was restored", err),
            Self::ApplyFailed(err) => Report::action_request(
                format!("Failed to write changes, and {} couldn't be restored", util::list_display(&err.rollback_failures.iter().map(|failed| format!("{:?}", failed.path)).collect::<Vec<_>>())),
                err,
            ),
        }
    }
}

/// Everything a run would change.
#[derive(Debug, Default)]
pub struct Plan {
    changes: Vec<FileChange>,
    steps: Vec<(Step, Outcome)>,
}

impl Plan {
    pub fn changes(&self) -> &[FileChange] {
        &self.changes
    }

    pub fn steps(&self) -> &[(Step, Outcome)] {
        &self.steps
    }

    pub fn outcome(&self, step: Step) -> Option<&Outcome> {
        self.steps
            .iter()
            .find(|(this, _)| *this == step)
            .map(|(_, outcome)| outcome)
    }

    fn record(&mut self, step: Step, outcome: Outcome) {
        log::info!("{}: {}", step, outcome);
        self.steps.push((step, outcome));
    }

    fn change(&mut self, change: FileChange) {
        debug_assert!(change.original.as_deref() != Some(change.contents.as_str()));
        self.changes.push(change);
    }

    pub fn apply(&self) -> Result<(), Error> {
        apply(&self.changes).map_err(Error::ApplyFailed)
    }
}

fn read(path: &Path) -> Result<String, Error> {
    fs::read_to_string(path).map_err(|cause| Error::ReadFailed {
        path: path.to_owned(),
        cause,
    })
}

fn find(dir: &Path, artifact: Artifact) -> Result<Option<PathBuf>, Error> {
    locate::find_artifact(dir, artifact).map_err(Error::LocateFailed)
}

/// Packages the source patch works with.
#[derive(Debug)]
struct Packages {
    app_id: PackageId,
    /// Where `R` is generated, which can differ from `app_id`.
    r_package: PackageId,
}

fn parse_package(id: Option<String>, manifest: &Manifest) -> Result<PackageId, Error> {
    let id = id.ok_or_else(|| Error::PackageIdUnreadable {
        manifest: manifest.path().to_owned(),
    })?;
    PackageId::parse(id.as_str()).map_err(|cause| Error::PackageIdInvalid { id, cause })
}

/// The manifest's `package` serves as both. Otherwise the gradle file's last
/// `namespace`/`applicationId` is the identifier, and `R` comes from its
/// `namespace` when it declares one.
fn packages(module_dir: &Path, manifest: &Manifest) -> Result<Packages, Error> {
    let (app_id, r_package) = match manifest.package().map_err(Error::ManifestFailed)? {
        Some(id) => (Some(id.clone()), Some(id)),
        None => match find(module_dir, Artifact::Gradle)? {
            Some(gradle) => {
                let ids = gradle::read_identifiers(&gradle).map_err(Error::GradleReadFailed)?;
                let r_package = ids.r_package().map(ToOwned::to_owned);
                (ids.application_id, r_package)
            }
            None => {
                log::warn!("no build.gradle found under {:?}", module_dir);
                (None, None)
            }
        },
    };
    let packages = Packages {
        app_id: parse_package(app_id, manifest)?,
        r_package: parse_package(r_package, manifest)?,
    };
    log::info!(
        "package identifier: {}, `R` package: {}",
        packages.app_id,
        packages.r_package
    );
    Ok(packages)
}

/// `src/main/java/<package path>/<Class>.<ext>` when it exists, otherwise
/// wherever the class was found.
fn source_path(layout: &ProjectLayout, class: &ApplicationClass, id: &PackageId) -> PathBuf {
    let conventional = layout
        .main_source_set()
        .join("java")
        .join(id.to_path())
        .join(format!("{}.{}", class.name, class.language.extension()));
    if conventional.is_file() {
        conventional
    } else {
        log::info!(
            "{:?} doesn't exist; patching {:?} instead",
            conventional,
            class.path
        );
        class.path.clone()
    }
}

fn plan_source(
    plan: &mut Plan,
    templates: &Templates,
    path: PathBuf,
    class: &ApplicationClass,
    r_package: &PackageId,
) -> Result<(), Error> {
    let original = read(&path)?;
    let outcome = patch::patch(templates, class.language, &original, r_package)
        .map_err(|cause| Error::SourcePatchFailed {
            path: path.clone(),
            cause,
        })?;
    match outcome {
        patch::Outcome::Patched(patched) => {
            plan.record(
                Step::Source,
                Outcome::Patched(format!(
                    "`{}` registered for the {} layout, {}",
                    class.name, patched.layout, patched.lifecycle
                )),
            );
            plan.change(FileChange::new(path, Some(original), patched.contents));
        }
        patch::Outcome::AlreadyApplied => {
            plan.record(Step::Source, Outcome::Skipped(Skip::PatchAlreadyApplied))
        }
        patch::Outcome::AnchorNotMatched { anchor } => {
            log::warn!("left {:?} untouched: no {} anchor matched", path, anchor);
            plan.record(Step::Source, Outcome::Skipped(Skip::AnchorNotMatched { anchor }))
        }
    }
    Ok(())
}

fn plan_manifest(plan: &mut Plan, manifest: Manifest, class: &ApplicationClass) -> Result<(), Error> {
    let (change, contents) = manifest
        .set_application_name(&class.name)
        .map_err(Error::ManifestFailed)?;
    let outcome = match &change {
        NameChange::Unchanged => {
            Outcome::Unchanged(format!("`android:name` is already \".{}\"", class.name))
        }
        NameChange::Added => {
            Outcome::Patched(format!("`android:name` set to \".{}\"", class.name))
        }
        NameChange::Replaced { previous } => Outcome::Patched(format!(
            "`android:name` changed from {:?} to \".{}\"",
            previous, class.name
        )),
    };
    plan.record(Step::Manifest, outcome);
    if let Some(contents) = contents {
        let path = manifest.path().to_owned();
        plan.change(FileChange::new(path, Some(manifest.contents().to_owned()), contents));
    }
    Ok(())
}

fn plan_strings(plan: &mut Plan, module_dir: &Path, settings: &Settings) -> Result<(), Error> {
    let path = match find(module_dir, Artifact::Strings)? {
        Some(path) => path,
        None => {
            plan.record(
                Step::Strings,
                Outcome::Skipped(Skip::ArtifactNotFound(Artifact::Strings)),
            );
            return Ok(());
        }
    };
    let original = read(&path)?;
    match strings::patch(&path, &original, settings).map_err(Error::StringsPatchFailed)? {
        Some(contents) => {
            plan.record(
                Step::Strings,
                Outcome::Patched("SmiSdk resources declared".to_owned()),
            );
            plan.change(FileChange::new(path, Some(original), contents));
        }
        None => plan.record(
            Step::Strings,
            Outcome::Unchanged("SmiSdk resources already declared".to_owned()),
        ),
    }
    Ok(())
}

fn plan_network_config(plan: &mut Plan, layout: &ProjectLayout, settings: &Settings) -> Result<(), Error> {
    let path = layout.network_security_config();
    let existing = if path.is_file() {
        Some(read(&path)?)
    } else {
        None
    };
    let (change, contents) =
        network_config::patch(&path, existing.as_deref(), &settings.trusted_domain)
            .map_err(Error::NetworkConfigPatchFailed)?;
    let outcome = match change {
        network_config::Change::Created => {
            Outcome::Patched(format!("created, trusting {}", settings.trusted_domain))
        }
        network_config::Change::Amended {
            cleartext_enabled,
            domain_added,
        } => {
            let mut amendments = Vec::new();
            if cleartext_enabled {
                amendments.push("clear-text traffic permitted".to_owned());
            }
            if domain_added {
                amendments.push(format!("{} trusted", settings.trusted_domain));
            }
            Outcome::Patched(util::list_display(&amendments))
        }
        network_config::Change::Unchanged => {
            Outcome::Unchanged(format!("{} already trusted", settings.trusted_domain))
        }
    };
    plan.record(Step::NetworkConfig, outcome);
    if let Some(contents) = contents {
        plan.change(FileChange::new(path, existing, contents));
    }
    Ok(())
}

/// Reads and plans everything without touching the disk.
pub fn plan(
    layout: &ProjectLayout,
    settings: &Settings,
    network_config: opts::NetworkConfig,
) -> Result<Plan, Error> {
    let mut plan = Plan::default();
    let module_dir = layout.module_dir();
    let templates = Templates::new().map_err(Error::TemplatesInvalid)?;

    let manifest_path = match find(&module_dir, Artifact::Manifest)? {
        Some(path) => path,
        None => {
            log::warn!("no AndroidManifest.xml under {:?}", module_dir);
            for &step in &[Step::Source, Step::Manifest, Step::Strings] {
                plan.record(step, Outcome::Skipped(Skip::ArtifactNotFound(Artifact::Manifest)));
            }
            if network_config.patch() {
                plan_network_config(&mut plan, layout, settings)?;
            }
            return Ok(plan);
        }
    };
    log::info!("found manifest at {:?}", manifest_path);

    let source_set = layout.main_source_set();
    let class = if source_set.is_dir() {
        detect::detect(&source_set).map_err(Error::DetectFailed)?
    } else {
        log::warn!("no source set at {:?}", source_set);
        None
    };
    match class {
        Some(class) => {
            let manifest = Manifest::load(&manifest_path).map_err(Error::ManifestFailed)?;
            let packages = packages(&module_dir, &manifest)?;
            let path = source_path(layout, &class, &packages.app_id);
            plan_source(&mut plan, &templates, path, &class, &packages.r_package)?;
            plan_manifest(&mut plan, manifest, &class)?;
        }
        None => {
            let skip = if source_set.is_dir() {
                log::info!("application class not available; only strings.xml will be patched");
                Skip::ApplicationClassNotDetected
            } else {
                Skip::ArtifactNotFound(Artifact::Source)
            };
            plan.record(Step::Source, Outcome::Skipped(skip.clone()));
            plan.record(Step::Manifest, Outcome::Skipped(skip));
        }
    }
    plan_strings(&mut plan, &module_dir, settings)?;
    if network_config.patch() {
        plan_network_config(&mut plan, layout, settings)?;
    }
    Ok(plan)
}

/// Resolves, plans, applies (unless it's a dry run) and prints the summary.
pub fn exec(
    wrapper: &TextWrapper,
    root: &Path,
    settings_path: Option<&Path>,
    write_mode: opts::WriteMode,
    network_config: opts::NetworkConfig,
) -> Result<Plan, Error> {
    let layout = ProjectLayout::resolve(root).map_err(Error::ModuleNotFound)?;
    let settings =
        Settings::load(layout.root(), settings_path).map_err(Error::SettingsLoadFailed)?;
    let plan = plan(&layout, &settings, network_config)?;
    let title = if write_mode.dry_run() {
        log::info!("dry run; {} file(s) would change", plan.changes().len());
        "SmiSdk Android integration (dry run, nothing written)"
    } else {
        plan.apply()?;
        "SmiSdk Android integration"
    };
    Summary::new(title, plan.steps()).print(wrapper);
    Ok(plan)
}
