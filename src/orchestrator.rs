//! Command workflows
//!
//! Each subcommand is a short pipeline over the library:
//! - rebuilds: changed paths → image names → tree → ordered rebuild set
//! - ancestors / select-test: tree → ancestor chain → selection rule
//! - check-env / check-apt: raw documents → packages → check reports
//! - attrs: Dockerfile + custom-args script → expected attributes

use crate::cli::{CliArgs, Command, TreeArgs};
use crate::domain::CheckReport;
use crate::environment::CondaEnvironment;
use crate::error::{AppError, IoError};
use crate::image_tree::ImageTree;
use crate::parser::{check_apt_packages, is_custom_tag, parse_apt_history, ExpectedAttrs};
use crate::selection::{select_test, TestDecision};
use crate::source::{FsSource, DOCKERFILE_NAME};
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// File the rebuild list is written to inside the data directory
pub const REBUILD_LIST_FILE: &str = "to_rebuild.txt";

/// Script holding the build args of a custom build, relative to the image directory
pub const CUSTOM_ARGS_PATH: &str = "ci/custom-args.sh";

/// What a command produced
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// An ordered list of image names
    Images(Vec<String>),
    /// Results of package checks
    Reports(Vec<CheckReport>),
    /// Expected attributes of an image build
    Attrs(ExpectedAttrs),
    /// Whether a test runs
    Decision(TestDecision),
}

impl Outcome {
    /// False when any check found a problem
    pub fn is_success(&self) -> bool {
        match self {
            Outcome::Reports(reports) => reports.iter().all(CheckReport::is_ok),
            _ => true,
        }
    }
}

/// Map changed paths to image names
///
/// Each input may hold several newline-separated paths (as printed by
/// `git diff-tree --name-only`). `<dir>/<image>/Dockerfile` maps to
/// `<image>`; anything else is taken as an image name. Duplicates are
/// dropped, first occurrence wins.
pub fn changed_images<S: AsRef<str>>(inputs: &[S]) -> Vec<String> {
    let mut images: Vec<String> = Vec::new();

    for line in inputs.iter().flat_map(|input| input.as_ref().lines()) {
        let line = line.trim().trim_end_matches('/');
        if line.is_empty() {
            continue;
        }

        let path = Path::new(line);
        let name = if path.file_name().is_some_and(|f| f == DOCKERFILE_NAME) {
            match path
                .parent()
                .and_then(Path::file_name)
                .and_then(|n| n.to_str())
            {
                Some(dir) => dir.to_string(),
                None => {
                    warn!(path = line, "Dockerfile outside an image directory, ignoring");
                    continue;
                }
            }
        } else {
            line.to_string()
        };

        if !images.contains(&name) {
            images.push(name);
        }
    }

    images
}

/// Write the rebuild list, one image per line, to `<data_dir>/to_rebuild.txt`
pub fn write_rebuild_list(data_dir: &Path, images: &[String]) -> Result<PathBuf, IoError> {
    std::fs::create_dir_all(data_dir).map_err(|e| IoError::generic(data_dir, e))?;
    let path = data_dir.join(REBUILD_LIST_FILE);
    std::fs::write(&path, images.join("\n")).map_err(|e| IoError::generic(&path, e))?;
    debug!(path = %path.display(), "wrote rebuild list");
    Ok(path)
}

fn read_file(path: &Path) -> Result<String, IoError> {
    std::fs::read_to_string(path).map_err(|e| IoError::generic(path, e))
}

/// Runs one subcommand
pub struct Orchestrator {
    args: CliArgs,
}

impl Orchestrator {
    pub fn new(args: CliArgs) -> Self {
        Self { args }
    }

    /// Run the selected command, reading changed paths from stdin if needed
    pub fn run(&self) -> Result<Outcome, AppError> {
        self.run_with_stdin(std::io::stdin())
    }

    /// Run the selected command with an explicit stdin
    pub fn run_with_stdin<R: Read>(&self, stdin: R) -> Result<Outcome, AppError> {
        match &self.args.command {
            Command::Rebuilds {
                paths,
                tree,
                data_dir,
                all,
            } => self.rebuilds(paths, tree, data_dir.as_deref(), *all, stdin),
            Command::Ancestors { image, tree } => {
                let tree = build_tree(tree)?;
                Ok(Outcome::Images(tree.ancestor_names(image)?))
            }
            Command::CheckEnv {
                installed,
                requested,
                config,
            } => {
                let env = CondaEnvironment::from_json(
                    &read_file(installed)?,
                    &read_file(requested)?,
                    &read_file(config)?,
                )?;
                Ok(Outcome::Reports(vec![env.check_pinned(), env.check_requested()]))
            }
            Command::CheckApt { history, packages } => {
                let history = parse_apt_history(&read_file(history)?);
                Ok(Outcome::Reports(vec![check_apt_packages(&history, packages)]))
            }
            Command::Attrs { image, tag, root } => self.attrs(image, tag.as_deref(), root),
            Command::SelectTest {
                image,
                test_image,
                markers,
                build_style,
                tree,
            } => {
                let tree = build_tree(tree)?;
                let ancestors = tree.ancestor_names(image)?;
                let decision =
                    select_test(&ancestors, image, test_image, markers, build_style.as_deref());
                debug!(image = %image, test_image = %test_image, %decision, "selected test");
                Ok(Outcome::Decision(decision))
            }
        }
    }

    fn rebuilds<R: Read>(
        &self,
        paths: &[String],
        tree_args: &TreeArgs,
        data_dir: Option<&Path>,
        all: bool,
        mut stdin: R,
    ) -> Result<Outcome, AppError> {
        let tree = build_tree(tree_args)?;

        let to_rebuild = if all {
            tree.all_images()
        } else {
            let edited = if paths.is_empty() {
                let mut input = String::new();
                stdin
                    .read_to_string(&mut input)
                    .map_err(|e| IoError::generic("<stdin>", e))?;
                changed_images(&[input])
            } else {
                changed_images(paths)
            };
            info!(edited = ?edited, "changed images");
            tree.get_dependents(&edited)?
        };

        if let Some(data_dir) = data_dir {
            write_rebuild_list(data_dir, &to_rebuild)?;
        }
        Ok(Outcome::Images(to_rebuild))
    }

    fn attrs(&self, image: &str, tag: Option<&str>, root: &Path) -> Result<Outcome, AppError> {
        let source = FsSource::scan(root)?;
        let dockerfile_path = source
            .dockerfile_path(image)
            .unwrap_or_else(|| root.join(image).join(DOCKERFILE_NAME));
        let dockerfile = read_file(&dockerfile_path)?;

        let custom_args = match tag {
            Some(tag) if is_custom_tag(tag) => {
                let script = dockerfile_path
                    .parent()
                    .unwrap_or(root)
                    .join(CUSTOM_ARGS_PATH);
                Some(read_file(&script)?)
            }
            _ => None,
        };

        Ok(Outcome::Attrs(ExpectedAttrs::load(
            &dockerfile,
            custom_args.as_deref(),
        )))
    }
}

fn build_tree(args: &TreeArgs) -> Result<ImageTree, AppError> {
    ImageTree::build(&args.root, args.python_version.as_deref())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TreeError;
    use crate::selection::SkipReason;
    use clap::Parser;
    use std::fs;

    fn make_args(args: &[&str]) -> CliArgs {
        CliArgs::parse_from(std::iter::once("imgdep").chain(args.iter().copied()))
    }

    fn write(root: &Path, relative: &str, text: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, text).unwrap();
    }

    fn repo() -> tempfile::TempDir {
        let temp = tempfile::tempdir().unwrap();
        write(temp.path(), "cdl-base/Dockerfile", "FROM debian:buster-slim\n");
        write(temp.path(), "cdl-python/Dockerfile", "FROM contextlab/cdl-base\nARG PYTHON_VERSION=3.8\n");
        write(
            temp.path(),
            "cdl-jupyter/Dockerfile",
            "ARG BASE_IMAGE=contextlab/cdl-python:3.8\nFROM $BASE_IMAGE\nARG NOTEBOOK_IP=0.0.0.0\nARG PORT=8888\n",
        );
        write(temp.path(), "cdl-jupyter/ci/custom-args.sh", "export PORT=9999\n");
        write(temp.path(), "cdl-pytorch/Dockerfile", "FROM contextlab/cdl-python:3.7\n");
        temp
    }

    fn run(args: &[&str], stdin: &str) -> Result<Outcome, AppError> {
        Orchestrator::new(make_args(args)).run_with_stdin(stdin.as_bytes())
    }

    #[test]
    fn test_changed_images() {
        let inputs = ["cdl-python/Dockerfile\ncdl-jupyter/Dockerfile\n", "cdl-base", ""];
        assert_eq!(
            changed_images(&inputs),
            vec!["cdl-python", "cdl-jupyter", "cdl-base"]
        );
    }

    #[test]
    fn test_changed_images_nested_and_duplicates() {
        let inputs = ["images/cdl-python/Dockerfile", "  cdl-python/  ", "Dockerfile"];
        assert_eq!(changed_images(&inputs), vec!["cdl-python"]);
    }

    #[test]
    fn test_rebuilds_from_args() {
        let temp = repo();
        let root = temp.path().to_str().unwrap();
        let outcome = run(
            &["rebuilds", "--root", root, "--python-version", "3.8", "cdl-python/Dockerfile"],
            "",
        )
        .unwrap();
        assert_eq!(
            outcome,
            Outcome::Images(vec!["cdl-python".to_string(), "cdl-jupyter".to_string()])
        );
    }

    #[test]
    fn test_rebuilds_from_stdin() {
        let temp = repo();
        let root = temp.path().to_str().unwrap();
        let outcome = run(
            &["rebuilds", "--root", root, "--python-version", "3.7"],
            "cdl-python/Dockerfile\n",
        )
        .unwrap();
        assert_eq!(
            outcome,
            Outcome::Images(vec!["cdl-python".to_string(), "cdl-pytorch".to_string()])
        );
    }

    #[test]
    fn test_rebuilds_all() {
        let temp = repo();
        let root = temp.path().to_str().unwrap();
        let outcome = run(&["rebuilds", "--root", root, "--python-version", "3.8", "--all"], "").unwrap();
        assert_eq!(
            outcome,
            Outcome::Images(vec![
                "cdl-base".to_string(),
                "cdl-python".to_string(),
                "cdl-jupyter".to_string()
            ])
        );
    }

    #[test]
    fn test_rebuilds_writes_data_dir() {
        let temp = repo();
        let data = tempfile::tempdir().unwrap();
        let root = temp.path().to_str().unwrap();
        let data_dir = data.path().join("data");
        run(
            &[
                "rebuilds",
                "--root",
                root,
                "--python-version",
                "3.8",
                "--data-dir",
                data_dir.to_str().unwrap(),
                "cdl-base/Dockerfile",
            ],
            "",
        )
        .unwrap();

        let written = fs::read_to_string(data_dir.join(REBUILD_LIST_FILE)).unwrap();
        assert_eq!(written, "cdl-base\ncdl-python\ncdl-jupyter");
    }

    #[test]
    fn test_rebuilds_unknown_image() {
        let temp = repo();
        let root = temp.path().to_str().unwrap();
        let err = run(&["rebuilds", "--root", root, "cdl-missing/Dockerfile"], "").unwrap_err();
        assert!(matches!(err, AppError::Tree(TreeError::ImageNotFound { .. })));
    }

    #[test]
    fn test_ancestors() {
        let temp = repo();
        let root = temp.path().to_str().unwrap();
        let outcome = run(&["ancestors", "--root", root, "cdl-jupyter"], "").unwrap();
        assert_eq!(
            outcome,
            Outcome::Images(vec![
                "cdl-base".to_string(),
                "cdl-python".to_string(),
                "cdl-jupyter".to_string()
            ])
        );
    }

    #[test]
    fn test_select_test() {
        let temp = repo();
        let root = temp.path().to_str().unwrap();
        let outcome = run(
            &[
                "select-test",
                "--root",
                root,
                "--image",
                "cdl-python",
                "--test-image",
                "cdl-jupyter",
            ],
            "",
        )
        .unwrap();
        assert_eq!(outcome, Outcome::Decision(TestDecision::Skip(SkipReason::ChildImage)));
    }

    #[test]
    fn test_attrs_default_build() {
        let temp = repo();
        let root = temp.path().to_str().unwrap();
        let Outcome::Attrs(attrs) = run(&["attrs", "--root", root, "cdl-jupyter"], "").unwrap() else {
            panic!("expected attrs");
        };
        assert!(attrs.get("notebook_ip").is_none());
        assert_eq!(attrs.get("port").and_then(|v| v.as_text()), Some("8888"));
    }

    #[test]
    fn test_attrs_custom_build() {
        let temp = repo();
        let root = temp.path().to_str().unwrap();
        let Outcome::Attrs(attrs) =
            run(&["attrs", "--root", root, "--tag", "3.8-custom", "cdl-jupyter"], "").unwrap()
        else {
            panic!("expected attrs");
        };
        assert_eq!(attrs.get("port").and_then(|v| v.as_text()), Some("9999"));
    }

    #[test]
    fn test_check_apt_outcome() {
        let temp = tempfile::tempdir().unwrap();
        write(
            temp.path(),
            "history.log",
            "Install: vim:amd64 (2:8.1.0875-5), vim-runtime:amd64 (2:8.1.0875-5, automatic)\n",
        );
        let history = temp.path().join("history.log");
        let outcome = run(
            &["check-apt", "--history", history.to_str().unwrap(), "vim", "vim-runtime"],
            "",
        )
        .unwrap();
        assert!(!outcome.is_success());
    }

    #[test]
    fn test_outcome_success() {
        assert!(Outcome::Images(Vec::new()).is_success());
        assert!(Outcome::Reports(vec![CheckReport::new(crate::domain::CheckKind::Pinned)]).is_success());
    }
}
