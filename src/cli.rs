//! CLI argument parsing module for imgdep

use crate::output::OutputFormat;
use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::PathBuf;

/// Docker image dependency planner for CI
#[derive(Parser, Debug, Clone)]
#[command(name = "imgdep", version, about = "Docker image dependency planner for CI")]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Command,

    /// Enable debug logging on stderr
    #[arg(long, global = true)]
    pub verbose: bool,

    /// Output format
    #[arg(long, value_enum, global = true, default_value_t = OutputFormat::Lines)]
    pub format: OutputFormat,
}

/// Where to find the image tree
#[derive(Args, Debug, Clone)]
pub struct TreeArgs {
    /// Repository root to scan for Dockerfiles
    #[arg(long, env = "GITHUB_WORKSPACE", default_value = ".")]
    pub root: PathBuf,

    /// Python version of the current build-matrix leg (e.g. 3.8)
    #[arg(long, env = "IMAGE_PYTHON")]
    pub python_version: Option<String>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Images to rebuild after Dockerfiles changed, in build order
    Rebuilds {
        /// Changed Dockerfile paths or image names; read from stdin when omitted
        paths: Vec<String>,

        #[command(flatten)]
        tree: TreeArgs,

        /// Also write the list to <DATA_DIR>/to_rebuild.txt
        #[arg(long, env = "DATA_DIR")]
        data_dir: Option<PathBuf>,

        /// Rebuild every image instead of only those affected by changes
        #[arg(long, conflicts_with = "paths")]
        all: bool,
    },

    /// Ancestor chain of an image, from below the root down to the image
    Ancestors {
        /// Image name
        #[arg(env = "IMAGE_NAME")]
        image: String,

        #[command(flatten)]
        tree: TreeArgs,
    },

    /// Check pinned and requested conda packages against the installed set
    CheckEnv {
        /// Output of `conda env export --json --no-builds`
        #[arg(long)]
        installed: PathBuf,

        /// Output of `conda env export --json --no-builds --from-history`
        #[arg(long)]
        requested: PathBuf,

        /// Output of `conda config --show --json`
        #[arg(long)]
        config: PathBuf,
    },

    /// Check that apt packages were installed manually
    CheckApt {
        /// apt history log
        #[arg(long, default_value = "/var/log/apt/history.log")]
        history: PathBuf,

        /// Packages expected to be installed
        #[arg(required = true)]
        packages: Vec<String>,
    },

    /// Attributes an image build is expected to have
    Attrs {
        /// Image name
        #[arg(env = "IMAGE_NAME")]
        image: String,

        /// Image tag; tags ending in "custom" also read ci/custom-args.sh
        #[arg(long)]
        tag: Option<String>,

        /// Repository root to scan for Dockerfiles
        #[arg(long, env = "GITHUB_WORKSPACE", default_value = ".")]
        root: PathBuf,
    },

    /// Whether a test from one image's suite runs against an image
    SelectTest {
        /// Image under test
        #[arg(long, env = "IMAGE_NAME")]
        image: String,

        /// Image whose test suite the test belongs to
        #[arg(long)]
        test_image: String,

        /// Markers set on the test (can be specified multiple times)
        #[arg(long = "marker", action = ArgAction::Append)]
        markers: Vec<String>,

        /// Build style of the image under test
        #[arg(long, env = "BUILD_STYLE")]
        build_style: Option<String>,

        #[command(flatten)]
        tree: TreeArgs,
    },
}

impl CliArgs {
    /// Default log filter when RUST_LOG is not set
    pub fn log_level(&self) -> &'static str {
        if self.verbose {
            "debug"
        } else {
            "warn"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_rebuilds_paths() {
        let args = CliArgs::parse_from([
            "imgdep",
            "rebuilds",
            "--root",
            "/repo",
            "cdl-python/Dockerfile",
            "cdl-base/Dockerfile",
        ]);
        let Command::Rebuilds { paths, tree, all, .. } = args.command else {
            panic!("expected rebuilds");
        };
        assert_eq!(paths, vec!["cdl-python/Dockerfile", "cdl-base/Dockerfile"]);
        assert_eq!(tree.root, PathBuf::from("/repo"));
        assert!(!all);
    }

    #[test]
    fn test_rebuilds_all_conflicts_with_paths() {
        let result = CliArgs::try_parse_from(["imgdep", "rebuilds", "--all", "cdl-base"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_python_version_and_data_dir() {
        let args = CliArgs::parse_from([
            "imgdep",
            "rebuilds",
            "--python-version",
            "3.8",
            "--data-dir",
            "/data",
        ]);
        let Command::Rebuilds { tree, data_dir, .. } = args.command else {
            panic!("expected rebuilds");
        };
        assert_eq!(tree.python_version.as_deref(), Some("3.8"));
        assert_eq!(data_dir, Some(PathBuf::from("/data")));
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let args = CliArgs::parse_from(["imgdep", "ancestors", "cdl-jupyter", "--verbose", "--format", "json"]);
        assert!(args.verbose);
        assert_eq!(args.format, OutputFormat::Json);
        assert_eq!(args.log_level(), "debug");
    }

    #[test]
    fn test_default_format() {
        let args = CliArgs::parse_from(["imgdep", "ancestors", "cdl-jupyter"]);
        assert!(!args.verbose);
        assert_eq!(args.format, OutputFormat::Lines);
        assert_eq!(args.log_level(), "warn");
    }

    #[test]
    fn test_invalid_format() {
        let result = CliArgs::try_parse_from(["imgdep", "--format", "xml", "ancestors", "x"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_check_env_requires_documents() {
        assert!(CliArgs::try_parse_from(["imgdep", "check-env", "--installed", "a.json"]).is_err());
        let args = CliArgs::parse_from([
            "imgdep",
            "check-env",
            "--installed",
            "a.json",
            "--requested",
            "b.json",
            "--config",
            "c.json",
        ]);
        assert!(matches!(args.command, Command::CheckEnv { .. }));
    }

    #[test]
    fn test_check_apt_requires_packages() {
        assert!(CliArgs::try_parse_from(["imgdep", "check-apt"]).is_err());
        let args = CliArgs::parse_from(["imgdep", "check-apt", "vim", "wget"]);
        let Command::CheckApt { history, packages } = args.command else {
            panic!("expected check-apt");
        };
        assert_eq!(history, PathBuf::from("/var/log/apt/history.log"));
        assert_eq!(packages, vec!["vim", "wget"]);
    }

    #[test]
    fn test_select_test_markers() {
        let args = CliArgs::parse_from([
            "imgdep",
            "select-test",
            "--image",
            "cdl-jupyter",
            "--test-image",
            "cdl-python",
            "--marker",
            "no_inherit_test",
            "--marker",
            "custom_build_test",
            "--build-style",
            "custom",
        ]);
        let Command::SelectTest {
            image,
            test_image,
            markers,
            build_style,
            ..
        } = args.command
        else {
            panic!("expected select-test");
        };
        assert_eq!(image, "cdl-jupyter");
        assert_eq!(test_image, "cdl-python");
        assert_eq!(markers, vec!["no_inherit_test", "custom_build_test"]);
        assert_eq!(build_style.as_deref(), Some("custom"));
    }

    #[test]
    fn test_attrs_tag() {
        let args = CliArgs::parse_from(["imgdep", "attrs", "cdl-python", "--tag", "3.8-custom"]);
        let Command::Attrs { image, tag, .. } = args.command else {
            panic!("expected attrs");
        };
        assert_eq!(image, "cdl-python");
        assert_eq!(tag.as_deref(), Some("3.8-custom"));
    }
}
