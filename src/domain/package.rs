//! Package model built from a single package-manager specifier

use super::version_spec::{split_specifier, Operator, VersionSpec};
use crate::error::PackageError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which tool reported the package
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Installer {
    Conda,
    Pip,
    #[default]
    Unspecified,
}

impl fmt::Display for Installer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Installer::Conda => write!(f, "conda"),
            Installer::Pip => write!(f, "pip"),
            Installer::Unspecified => write!(f, "unspecified"),
        }
    }
}

/// A package name with an optional version constraint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Package {
    name: String,
    version: Option<VersionSpec>,
    installer: Installer,
}

impl Package {
    /// Parse a raw `name[delim]version` specifier
    pub fn parse(raw: &str, installer: Installer) -> Result<Self, PackageError> {
        let spec = split_specifier(raw)?;
        Ok(Self {
            name: spec.name.to_string(),
            version: spec
                .constraint
                .map(|(op, version)| VersionSpec::new(op, version)),
            installer,
        })
    }

    /// Coerce a raw string into a package for comparison
    ///
    /// A bare version such as `3.8` (as found in Dockerfile build args) has
    /// no delimiter and would otherwise parse as a name; it is read as an
    /// equality constraint on an unnamed package instead.
    pub fn coerce(raw: &str) -> Result<Self, PackageError> {
        let raw = raw.trim();
        let bare_version = Operator::find_in(raw).is_none()
            && raw.starts_with(|c: char| c.is_ascii_digit() || c == '*');

        if bare_version {
            Ok(Self {
                name: String::new(),
                version: Some(VersionSpec::new(Operator::Eq, raw)),
                installer: Installer::Unspecified,
            })
        } else {
            Self::parse(raw, Installer::Unspecified)
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> Option<&VersionSpec> {
        self.version.as_ref()
    }

    pub fn installer(&self) -> Installer {
        self.installer
    }

    /// Rendered version string without operator, if any
    pub fn version_string(&self) -> Option<String> {
        self.version.as_ref().map(VersionSpec::render)
    }

    /// Returns true if this package's version satisfies `other`'s constraint
    ///
    /// `other` is the specification, `self` the candidate. An unconstrained
    /// `other` matches anything; a candidate without a version matches only
    /// an unconstrained specification.
    pub fn matches_version(&self, other: &Package) -> bool {
        let Some(ref constraint) = other.version else {
            return true;
        };
        if constraint.effective_specifier().is_none() {
            return true;
        }

        match self.version {
            Some(ref candidate) => constraint.contains(&candidate.render()),
            None => false,
        }
    }

    /// Like [`matches_version`](Self::matches_version), coercing a raw specifier first
    pub fn matches_version_str(&self, other: &str) -> Result<bool, PackageError> {
        let other = Self::coerce(other)?;
        Ok(self.matches_version(&other))
    }
}

impl fmt::Display for Package {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.version {
            Some(ref version) => write!(f, "{}{}", self.name, version),
            None => write!(f, "{}", self.name),
        }
    }
}
