//! apt `history.log` parser
//!
//! Handles lines like:
//! `Install: vim:amd64 (2:8.1.0875-5), vim-runtime:amd64 (2:8.1.0875-5, automatic)`

use crate::domain::{CheckKind, CheckReport, FindingStatus};
use serde::Serialize;
use std::collections::BTreeMap;

/// How apt recorded a package installation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InstallMethod {
    /// Requested explicitly
    Manual,
    /// Pulled in as a dependency
    Automatic,
}

/// Map every installed package name to how it was installed
pub fn parse_apt_history(log: &str) -> BTreeMap<String, InstallMethod> {
    let mut packages = BTreeMap::new();

    for line in log.lines() {
        let Some(entries) = line.strip_prefix("Install: ") else {
            continue;
        };

        for entry in entries.split("), ") {
            let entry = entry.trim();
            let Some(name) = entry.split(':').next().filter(|name| !name.is_empty()) else {
                continue;
            };
            let method = if entry.trim_end_matches(')').ends_with("automatic") {
                InstallMethod::Automatic
            } else {
                InstallMethod::Manual
            };
            packages.insert(name.to_string(), method);
        }
    }

    packages
}

/// Check that every expected package was installed manually
pub fn check_apt_packages(
    history: &BTreeMap<String, InstallMethod>,
    expected: &[String],
) -> CheckReport {
    let mut report = CheckReport::new(CheckKind::Apt);

    for name in expected {
        match history.get(name) {
            Some(InstallMethod::Manual) => report.pass(),
            Some(InstallMethod::Automatic) => report.fail(
                name,
                name,
                Some("automatic".to_string()),
                FindingStatus::Automatic,
            ),
            None => report.fail(name, name, None, FindingStatus::Missing),
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOG: &str = "\
Start-Date: 2020-11-02  18:41:20
Commandline: apt-get install -y --no-install-recommends vim git
Install: vim:amd64 (2:8.1.0875-5), git:amd64 (1:2.20.1-2+deb10u3), vim-runtime:amd64 (2:8.1.0875-5, automatic), git-man:amd64 (1:2.20.1-2+deb10u3, automatic)
End-Date: 2020-11-02  18:41:30

Start-Date: 2020-11-02  18:42:00
Install: htop:amd64 (2.2.0-1+b1)
End-Date: 2020-11-02  18:42:05
";

    #[test]
    fn test_parse_apt_history() {
        let packages = parse_apt_history(LOG);
        assert_eq!(packages.len(), 5);
        assert_eq!(packages.get("vim"), Some(&InstallMethod::Manual));
        assert_eq!(packages.get("git"), Some(&InstallMethod::Manual));
        assert_eq!(packages.get("htop"), Some(&InstallMethod::Manual));
        assert_eq!(packages.get("vim-runtime"), Some(&InstallMethod::Automatic));
        assert_eq!(packages.get("git-man"), Some(&InstallMethod::Automatic));
    }

    #[test]
    fn test_parse_ignores_other_lines() {
        assert!(parse_apt_history("Upgrade: libc6:amd64 (2.28-10, 2.28-10+deb10u1)\n").is_empty());
    }

    #[test]
    fn test_check_apt_packages() {
        let history = parse_apt_history(LOG);
        let expected = vec!["vim".to_string(), "git-man".to_string(), "emacs".to_string()];
        let report = check_apt_packages(&history, &expected);
        assert_eq!(report.checked, 3);
        assert_eq!(report.findings.len(), 2);
        assert_eq!(report.findings[0].status, FindingStatus::Automatic);
        assert_eq!(report.findings[1].package, "emacs");
        assert_eq!(report.findings[1].status, FindingStatus::Missing);
    }
}
