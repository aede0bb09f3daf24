//! PEP 440 versions and single-clause specifier containment
//!
//! Implements the comparison rules pip and conda's Python tooling use:
//! - Release segments compared numerically, trailing zeros ignored
//! - Pre-releases (`a`, `b`, `rc`) sort before the final release,
//!   dev releases before pre-releases, post-releases after
//! - `==X.*` / `!=X.*` prefix matching
//! - `~=` compatible release
//! - Pre-release candidates only match when the specifier itself names a pre-release

use super::Operator;
use regex::Regex;
use std::cmp::Ordering;
use std::fmt;
use std::sync::LazyLock;

static VERSION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?ix)^\s*v?
        (?:(?P<epoch>[0-9]+)!)?
        (?P<release>[0-9]+(?:\.[0-9]+)*)
        (?:[-_.]?(?P<pre_l>alpha|a|beta|b|preview|pre|c|rc)[-_.]?(?P<pre_n>[0-9]+)?)?
        (?:-(?P<post_implicit>[0-9]+)|[-_.]?(?P<post_l>post|rev|r)[-_.]?(?P<post_n>[0-9]+)?)?
        (?:[-_.]?(?P<dev_l>dev)[-_.]?(?P<dev_n>[0-9]+)?)?
        (?:\+(?P<local>[a-z0-9]+(?:[-_.][a-z0-9]+)*))?
        \s*$",
    )
    .unwrap()
});

/// Pre-release phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PreRelease {
    /// `a`, `alpha`
    Alpha,
    /// `b`, `beta`
    Beta,
    /// `rc`, `c`, `pre`, `preview`
    Rc,
}

impl PreRelease {
    fn from_label(label: &str) -> Self {
        match label.to_ascii_lowercase().as_str() {
            "a" | "alpha" => PreRelease::Alpha,
            "b" | "beta" => PreRelease::Beta,
            _ => PreRelease::Rc,
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            PreRelease::Alpha => "a",
            PreRelease::Beta => "b",
            PreRelease::Rc => "rc",
        }
    }
}

/// One dot-separated segment of a local version label
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LocalSegment {
    Numeric(u64),
    Text(String),
}

impl Ord for LocalSegment {
    fn cmp(&self, other: &Self) -> Ordering {
        // numeric segments always sort after alphanumeric ones
        match (self, other) {
            (LocalSegment::Numeric(a), LocalSegment::Numeric(b)) => a.cmp(b),
            (LocalSegment::Text(a), LocalSegment::Text(b)) => a.cmp(b),
            (LocalSegment::Numeric(_), LocalSegment::Text(_)) => Ordering::Greater,
            (LocalSegment::Text(_), LocalSegment::Numeric(_)) => Ordering::Less,
        }
    }
}

impl PartialOrd for LocalSegment {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A parsed PEP 440 version
#[derive(Debug, Clone)]
pub struct Pep440Version {
    epoch: u64,
    release: Vec<u64>,
    pre: Option<(PreRelease, u64)>,
    post: Option<u64>,
    dev: Option<u64>,
    local: Option<Vec<LocalSegment>>,
}

impl Pep440Version {
    /// Parse a version string, returning None when it is not PEP 440 compliant
    pub fn parse(input: &str) -> Option<Self> {
        let caps = VERSION_RE.captures(input)?;
        let number = |name: &str| -> Option<Option<u64>> {
            match caps.name(name) {
                Some(m) => m.as_str().parse().ok().map(Some),
                None => Some(None),
            }
        };

        let epoch = number("epoch")?.unwrap_or(0);
        let release = caps
            .name("release")?
            .as_str()
            .split('.')
            .map(|part| part.parse().ok())
            .collect::<Option<Vec<u64>>>()?;

        let pre = match caps.name("pre_l") {
            Some(label) => Some((PreRelease::from_label(label.as_str()), number("pre_n")?.unwrap_or(0))),
            None => None,
        };

        let post = if caps.name("post_implicit").is_some() {
            number("post_implicit")?
        } else if caps.name("post_l").is_some() {
            Some(number("post_n")?.unwrap_or(0))
        } else {
            None
        };

        let dev = if caps.name("dev_l").is_some() {
            Some(number("dev_n")?.unwrap_or(0))
        } else {
            None
        };

        let local = caps.name("local").map(|m| {
            m.as_str()
                .split(['.', '-', '_'])
                .map(|seg| match seg.parse() {
                    Ok(n) => LocalSegment::Numeric(n),
                    Err(_) => LocalSegment::Text(seg.to_ascii_lowercase()),
                })
                .collect()
        });

        Some(Self {
            epoch,
            release,
            pre,
            post,
            dev,
            local,
        })
    }

    /// Release segments, e.g. `[3, 8, 1]` for `3.8.1`
    pub fn release(&self) -> &[u64] {
        &self.release
    }

    pub fn is_prerelease(&self) -> bool {
        self.pre.is_some() || self.dev.is_some()
    }

    pub fn is_postrelease(&self) -> bool {
        self.post.is_some()
    }

    pub fn has_local(&self) -> bool {
        self.local.is_some()
    }

    /// The version without its local label
    pub fn public(&self) -> Self {
        Self {
            local: None,
            ..self.clone()
        }
    }

    /// Epoch and release only
    pub fn base(&self) -> Self {
        Self {
            epoch: self.epoch,
            release: self.release.clone(),
            pre: None,
            post: None,
            dev: None,
            local: None,
        }
    }

    fn trimmed_release(&self) -> &[u64] {
        let len = self
            .release
            .iter()
            .rposition(|&n| n != 0)
            .map_or(0, |i| i + 1);
        &self.release[..len]
    }

    /// True when `self` starts with the release segments of `prefix`,
    /// padding missing segments with zeros
    fn has_prefix(&self, prefix: &Pep440Version) -> bool {
        if self.epoch != prefix.epoch {
            return false;
        }

        let padded = (0..prefix.release.len()).map(|i| self.release.get(i).copied().unwrap_or(0));
        if !padded.eq(prefix.release.iter().copied()) {
            return false;
        }

        if prefix.pre.is_none() && prefix.post.is_none() && prefix.dev.is_none() {
            return true;
        }

        self.trimmed_release() == prefix.trimmed_release()
            && self.pre == prefix.pre
            && (prefix.post.is_none() || self.post == prefix.post)
            && (prefix.dev.is_none() || self.dev == prefix.dev)
    }
}

/// Sort key for the pre-release slot
#[derive(PartialEq, Eq, PartialOrd, Ord)]
enum PreKey {
    DevOnly,
    Pre(PreRelease, u64),
    Final,
}

impl Pep440Version {
    fn pre_key(&self) -> PreKey {
        match self.pre {
            Some((phase, n)) => PreKey::Pre(phase, n),
            None if self.post.is_none() && self.dev.is_some() => PreKey::DevOnly,
            None => PreKey::Final,
        }
    }

    fn dev_key(&self) -> (u8, u64) {
        match self.dev {
            Some(n) => (0, n),
            None => (1, 0),
        }
    }
}

impl Ord for Pep440Version {
    fn cmp(&self, other: &Self) -> Ordering {
        self.epoch
            .cmp(&other.epoch)
            .then_with(|| self.trimmed_release().cmp(other.trimmed_release()))
            .then_with(|| self.pre_key().cmp(&other.pre_key()))
            .then_with(|| self.post.cmp(&other.post))
            .then_with(|| self.dev_key().cmp(&other.dev_key()))
            .then_with(|| self.local.cmp(&other.local))
    }
}

impl PartialOrd for Pep440Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Pep440Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Pep440Version {}

impl fmt::Display for Pep440Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.epoch != 0 {
            write!(f, "{}!", self.epoch)?;
        }
        let release: Vec<String> = self.release.iter().map(|n| n.to_string()).collect();
        write!(f, "{}", release.join("."))?;
        if let Some((phase, n)) = self.pre {
            write!(f, "{}{}", phase.as_str(), n)?;
        }
        if let Some(n) = self.post {
            write!(f, ".post{}", n)?;
        }
        if let Some(n) = self.dev {
            write!(f, ".dev{}", n)?;
        }
        if let Some(ref local) = self.local {
            let parts: Vec<String> = local
                .iter()
                .map(|seg| match seg {
                    LocalSegment::Numeric(n) => n.to_string(),
                    LocalSegment::Text(s) => s.clone(),
                })
                .collect();
            write!(f, "+{}", parts.join("."))?;
        }
        Ok(())
    }
}

/// A single `<operator><version>` clause
#[derive(Debug, Clone)]
pub struct Specifier {
    operator: Operator,
    version: Pep440Version,
    wildcard: bool,
}

impl Specifier {
    /// Build a specifier from an operator and a version that may end in `.*`
    ///
    /// Returns None for combinations pip rejects: wildcards outside `==`/`!=`,
    /// local labels on ordering operators, `~=` with a single release segment.
    pub fn new(operator: Operator, version: &str) -> Option<Self> {
        let operator = operator.normalized();
        if operator == Operator::Unspecified {
            return None;
        }

        let (text, wildcard) = match version.strip_suffix(".*") {
            Some(prefix) => (prefix, true),
            None => (version, false),
        };
        if wildcard && !operator.is_equality() {
            return None;
        }

        let version = Pep440Version::parse(text)?;
        if version.has_local() && (wildcard || !operator.is_equality()) {
            return None;
        }
        if operator == Operator::Compatible && version.release.len() < 2 {
            return None;
        }

        Some(Self {
            operator,
            version,
            wildcard,
        })
    }

    /// Whether candidates that are pre-releases may match
    fn allows_prereleases(&self) -> bool {
        matches!(
            self.operator,
            Operator::Eq | Operator::Ge | Operator::Le | Operator::Compatible
        ) && self.version.is_prerelease()
    }

    /// Test a candidate version string against this clause
    pub fn contains(&self, candidate: &str) -> bool {
        match Pep440Version::parse(candidate) {
            Some(candidate) => self.contains_version(&candidate),
            None => false,
        }
    }

    pub fn contains_version(&self, candidate: &Pep440Version) -> bool {
        if candidate.is_prerelease() && !self.allows_prereleases() {
            return false;
        }

        let spec = &self.version;
        match self.operator {
            Operator::Eq => self.equals(candidate),
            Operator::Ne => !self.equals(candidate),
            Operator::Le => candidate.public() <= *spec,
            Operator::Ge => candidate.public() >= *spec,
            Operator::Lt => {
                *candidate < *spec
                    && !(!spec.is_prerelease()
                        && candidate.is_prerelease()
                        && candidate.base() == spec.base())
            }
            Operator::Gt => {
                if *candidate <= *spec {
                    return false;
                }
                let same_base = candidate.base() == spec.base();
                !(same_base && !spec.is_postrelease() && candidate.is_postrelease())
                    && !(same_base && candidate.has_local())
            }
            Operator::Compatible => {
                let mut prefix = spec.base();
                prefix.release.pop();
                candidate >= spec && candidate.public().has_prefix(&prefix)
            }
            Operator::CondaEq | Operator::Unspecified => true,
        }
    }

    fn equals(&self, candidate: &Pep440Version) -> bool {
        if self.wildcard {
            candidate.public().has_prefix(&self.version)
        } else if self.version.has_local() {
            *candidate == self.version
        } else {
            candidate.public() == self.version
        }
    }
}

impl fmt::Display for Specifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.operator.as_str(), self.version)?;
        if self.wildcard {
            write!(f, ".*")?;
        }
        Ok(())
    }
}
