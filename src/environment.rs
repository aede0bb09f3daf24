//! conda environment inspection
//!
//! Reads the JSON produced by `conda env export --json --no-builds` (installed
//! and `--from-history` requested packages) and `conda config --show --json`
//! (pinned packages) into three [`PackageMap`]s.

use crate::domain::{CheckKind, CheckReport, FindingStatus, Installer, Package, PackageMap};
use crate::error::EnvironmentError;
use serde::Deserialize;
use serde_json::{Map, Value};

/// One entry of an `env export` dependency list
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum DependencyEntry {
    /// A conda package, `name=version`
    Spec(String),
    /// The nested list of pip-installed packages, `name==version`
    Pip { pip: Vec<String> },
}

/// `conda env export --json` document
#[derive(Debug, Deserialize)]
struct EnvExport {
    #[serde(default)]
    dependencies: Vec<DependencyEntry>,
}

/// `conda config --show --json` document
#[derive(Debug, Default, Deserialize)]
struct CondaConfig {
    #[serde(default)]
    pinned_packages: Option<Vec<String>>,
    #[serde(flatten)]
    rest: Map<String, Value>,
}

fn parse_document<'a, T: Deserialize<'a>>(document: &str, json: &'a str) -> Result<T, EnvironmentError> {
    serde_json::from_str(json).map_err(|e| EnvironmentError::json(document, e.to_string()))
}

fn insert_all<'a>(
    map: &mut PackageMap,
    document: &str,
    specs: impl IntoIterator<Item = &'a str>,
    installer: Installer,
) -> Result<(), EnvironmentError> {
    for spec in specs {
        let package =
            Package::parse(spec, installer).map_err(|e| EnvironmentError::package(document, e))?;
        map.insert(package)
            .map_err(|e| EnvironmentError::package(document, e))?;
    }
    Ok(())
}

/// Installed, requested, and pinned packages of a conda environment
#[derive(Debug, Clone, Default)]
pub struct CondaEnvironment {
    installed: PackageMap,
    requested: PackageMap,
    pinned: PackageMap,
    config: Map<String, Value>,
}

impl CondaEnvironment {
    /// Build from the three raw JSON documents
    pub fn from_json(installed: &str, requested: &str, config: &str) -> Result<Self, EnvironmentError> {
        let installed_doc: EnvExport = parse_document("installed packages", installed)?;
        let requested_doc: EnvExport = parse_document("requested packages", requested)?;
        let config_doc: CondaConfig = parse_document("conda config", config)?;

        let mut env = Self {
            config: config_doc.rest,
            ..Self::default()
        };

        for entry in &installed_doc.dependencies {
            match entry {
                DependencyEntry::Spec(spec) => insert_all(
                    &mut env.installed,
                    "installed packages",
                    [spec.as_str()],
                    Installer::Conda,
                )?,
                DependencyEntry::Pip { pip } => insert_all(
                    &mut env.installed,
                    "installed packages",
                    pip.iter().map(String::as_str),
                    Installer::Pip,
                )?,
            }
        }

        for entry in &requested_doc.dependencies {
            match entry {
                DependencyEntry::Spec(spec) => insert_all(
                    &mut env.requested,
                    "requested packages",
                    [spec.as_str()],
                    Installer::Conda,
                )?,
                DependencyEntry::Pip { pip } => {
                    tracing::debug!(count = pip.len(), "ignoring pip entries in requested packages")
                }
            }
        }

        insert_all(
            &mut env.pinned,
            "conda config",
            config_doc
                .pinned_packages
                .iter()
                .flatten()
                .map(String::as_str),
            Installer::Unspecified,
        )?;

        tracing::debug!(
            installed = env.installed.len(),
            requested = env.requested.len(),
            pinned = env.pinned.len(),
            "parsed conda environment"
        );
        Ok(env)
    }

    pub fn installed(&self) -> &PackageMap {
        &self.installed
    }

    pub fn requested(&self) -> &PackageMap {
        &self.requested
    }

    pub fn pinned(&self) -> &PackageMap {
        &self.pinned
    }

    /// Any other `conda config` setting, as raw JSON
    pub fn config_value(&self, key: &str) -> Option<&Value> {
        self.config.get(key)
    }

    /// Every pinned constraint is installed at a matching version
    pub fn check_pinned(&self) -> CheckReport {
        self.check_against(CheckKind::Pinned, &self.pinned)
    }

    /// Every explicitly requested package is installed at a matching version
    pub fn check_requested(&self) -> CheckReport {
        self.check_against(CheckKind::Requested, &self.requested)
    }

    fn check_against(&self, kind: CheckKind, constraints: &PackageMap) -> CheckReport {
        let mut report = CheckReport::new(kind);

        for (name, constraint) in constraints {
            match self.installed.get(name) {
                None => report.fail(name, constraint.to_string(), None, FindingStatus::Missing),
                Some(installed) if !installed.matches_version(constraint) => report.fail(
                    name,
                    constraint.to_string(),
                    installed.version_string(),
                    FindingStatus::Mismatch,
                ),
                Some(_) => report.pass(),
            }
        }

        report
    }
}
