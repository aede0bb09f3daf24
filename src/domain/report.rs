//! Check report types
//!
//! Collects the outcome of comparing an image's installed packages against
//! its pinned, requested, or expected sets.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which set of expectations was checked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckKind {
    /// conda `pinned_packages`
    Pinned,
    /// packages requested explicitly (`--from-history`)
    Requested,
    /// apt packages expected to be installed manually
    Apt,
}

impl CheckKind {
    pub fn label(&self) -> &'static str {
        match self {
            CheckKind::Pinned => "pinned",
            CheckKind::Requested => "requested",
            CheckKind::Apt => "apt",
        }
    }
}

impl fmt::Display for CheckKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// What went wrong for a single package
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FindingStatus {
    /// Not installed at all
    Missing,
    /// Installed at a version outside the constraint
    Mismatch,
    /// Installed only as a dependency of another package
    Automatic,
}

impl fmt::Display for FindingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FindingStatus::Missing => write!(f, "not installed"),
            FindingStatus::Mismatch => write!(f, "version mismatch"),
            FindingStatus::Automatic => write!(f, "installed automatically, not manually"),
        }
    }
}

/// A failed expectation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    /// Package name
    pub package: String,
    /// The expectation as written (e.g. `python=3.8`)
    pub constraint: String,
    /// What is actually installed, if anything
    #[serde(skip_serializing_if = "Option::is_none")]
    pub installed: Option<String>,
    pub status: FindingStatus,
}

/// Result of one check over a set of expectations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckReport {
    pub kind: CheckKind,
    /// Number of expectations examined
    pub checked: usize,
    pub findings: Vec<Finding>,
}

impl CheckReport {
    pub fn new(kind: CheckKind) -> Self {
        Self {
            kind,
            checked: 0,
            findings: Vec::new(),
        }
    }

    /// Record an expectation that held
    pub fn pass(&mut self) {
        self.checked += 1;
    }

    /// Record an expectation that failed
    pub fn fail(
        &mut self,
        package: impl Into<String>,
        constraint: impl Into<String>,
        installed: Option<String>,
        status: FindingStatus,
    ) {
        self.checked += 1;
        self.findings.push(Finding {
            package: package.into(),
            constraint: constraint.into(),
            installed,
            status,
        });
    }

    pub fn is_ok(&self) -> bool {
        self.findings.is_empty()
    }
}
