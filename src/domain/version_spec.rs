//! Package version specifications as reported by conda and pip
//!
//! Handles specifier strings like:
//! - conda: `python=3.8`, `numpy=1.19.2`, `openssl=1.1.1g`
//! - pip: `requests==2.25.1`, `jupyter>=1.0`
//! - pinned: `python=3.8.*`, `notebook<7`
//!
//! A version is kept as textual components (major, minor, patch, extra) so it
//! renders exactly as written; containment tests defer to PEP 440 semantics.

use super::pep440::Specifier;
use crate::error::PackageError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Comparison operator of a specifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    /// `==`
    Eq,
    /// `!=`
    Ne,
    /// `<=`
    Le,
    /// `>=`
    Ge,
    /// `~=`
    Compatible,
    /// `<`
    Lt,
    /// `>`
    Gt,
    /// conda-style `=`, compared as `==`
    CondaEq,
    /// No operator: a bare name or bare version
    Unspecified,
}

impl Operator {
    /// Delimiters in the order they are searched for in a raw specifier
    pub const DELIMITERS: [Operator; 8] = [
        Operator::Eq,
        Operator::Le,
        Operator::Ge,
        Operator::Ne,
        Operator::Compatible,
        Operator::Lt,
        Operator::Gt,
        Operator::CondaEq,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Eq => "==",
            Operator::Ne => "!=",
            Operator::Le => "<=",
            Operator::Ge => ">=",
            Operator::Compatible => "~=",
            Operator::Lt => "<",
            Operator::Gt => ">",
            Operator::CondaEq => "=",
            Operator::Unspecified => "",
        }
    }

    /// The operator used for comparison (`=` becomes `==`)
    pub fn normalized(self) -> Self {
        match self {
            Operator::CondaEq => Operator::Eq,
            other => other,
        }
    }

    /// Returns true for `==`, `!=` and `=`
    pub fn is_equality(self) -> bool {
        matches!(self.normalized(), Operator::Eq | Operator::Ne)
    }

    /// First delimiter, in precedence order, that occurs anywhere in `raw`
    pub fn find_in(raw: &str) -> Option<Operator> {
        Self::DELIMITERS
            .into_iter()
            .find(|op| raw.contains(op.as_str()))
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A raw specifier split into name and optional constraint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawSpecifier<'a> {
    pub name: &'a str,
    pub constraint: Option<(Operator, &'a str)>,
}

/// Split `name<op>version` on the first recognized delimiter
///
/// Fails when the chosen delimiter occurs more than once, e.g. a conda
/// build string left in `numpy=1.19.2=py38h54aff64_0`.
pub fn split_specifier(raw: &str) -> Result<RawSpecifier<'_>, PackageError> {
    let raw = raw.trim();
    let Some(op) = Operator::find_in(raw) else {
        return Ok(RawSpecifier {
            name: raw,
            constraint: None,
        });
    };

    let delimiter = op.as_str();
    if raw.matches(delimiter).count() > 1 {
        return Err(PackageError::malformed_spec(raw, delimiter));
    }

    match raw.split_once(delimiter) {
        Some((name, version)) => Ok(RawSpecifier {
            name: name.trim(),
            constraint: Some((op, version.trim())),
        }),
        None => Ok(RawSpecifier {
            name: raw,
            constraint: None,
        }),
    }
}

/// A version decomposed into textual components plus its operator
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VersionSpec {
    /// First dot-separated component (always present)
    pub major: String,
    /// Second dot-separated component
    pub minor: Option<String>,
    /// Leading `*` and/or digits of the remaining components
    pub patch: Option<String>,
    /// Everything after the patch digits (e.g. `rc1`, `.4`, `g`)
    pub extra: Option<String>,
    /// Comparison operator
    pub operator: Operator,
}

impl VersionSpec {
    /// Decompose a version string under the given operator
    pub fn new(operator: Operator, version: &str) -> Self {
        let mut parts = version.split('.');
        let major = parts.next().unwrap_or_default().to_string();
        let minor = parts.next().map(str::to_string);

        let remaining = parts.collect::<Vec<_>>().join(".");
        let mut patch = String::new();
        let mut rest = remaining.as_str();
        if let Some(stripped) = rest.strip_prefix('*') {
            patch.push('*');
            rest = stripped;
        }
        let digits = rest.len() - rest.trim_start_matches(|c: char| c.is_ascii_digit()).len();
        patch.push_str(&rest[..digits]);
        let extra = &rest[digits..];

        Self {
            major,
            minor,
            patch: (!patch.is_empty()).then_some(patch),
            extra: (!extra.is_empty()).then(|| extra.to_string()),
            operator,
        }
    }

    /// A bare version with no operator, e.g. an installed package's version
    pub fn bare(version: &str) -> Self {
        Self::new(Operator::Unspecified, version)
    }

    /// Parse a specifier and return its version part, if any
    ///
    /// `"numpy>=1.19"` yields `>=1.19`; `"numpy"` yields `None`.
    pub fn parse(raw: &str) -> Result<Option<Self>, PackageError> {
        let spec = split_specifier(raw)?;
        Ok(spec
            .constraint
            .map(|(op, version)| Self::new(op, version)))
    }

    /// Full version rendering: major[.minor][.patch][extra]
    pub fn render(&self) -> String {
        let mut full = self.major.clone();
        if let Some(ref minor) = self.minor {
            full.push('.');
            full.push_str(minor);
        }
        if let Some(ref patch) = self.patch {
            full.push('.');
            full.push_str(patch);
        }
        if let Some(ref extra) = self.extra {
            full.push_str(extra);
        }
        full
    }

    /// Returns true if any component is the `*` wildcard
    pub fn is_wildcard(&self) -> bool {
        self.render() == "*" || self.render().ends_with(".*")
    }

    /// The clause actually compared: `=` promoted to `==`, under-specified
    /// equality widened to `.*`, and `.*` dropped for ordering operators
    pub fn effective_specifier(&self) -> Option<String> {
        let version = self.render();
        if self.operator == Operator::Unspecified || version == "*" {
            return None;
        }

        let op = self.operator.normalized();
        let version = if op.is_equality()
            && (self.minor.is_none() || self.patch.is_none())
            && !version.ends_with(".*")
        {
            format!("{}.*", version)
        } else if !op.is_equality() && version.ends_with(".*") {
            version.split(".*").next().unwrap_or_default().to_string()
        } else {
            version
        };

        Some(format!("{}{}", op.as_str(), version))
    }

    /// Whether `candidate` satisfies this specification
    pub fn contains(&self, candidate: &str) -> bool {
        let Some(clause) = self.effective_specifier() else {
            return true;
        };

        let op = self.operator.normalized();
        let version = &clause[op.as_str().len()..];
        match Specifier::new(op, version) {
            Some(spec) => spec.contains(candidate),
            None => {
                tracing::warn!(specifier = %clause, "not a valid PEP 440 specifier, treating as no match");
                false
            }
        }
    }
}

impl fmt::Display for VersionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.operator, self.render())
    }
}
