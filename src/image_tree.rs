//! Image dependency forest
//!
//! Images are created lazily: the first time a name is seen (either because
//! its directory holds a Dockerfile, or because another image builds `FROM`
//! it) a node is pushed into the arena and immediately linked under its
//! parent, creating the parent first if needed.
//!
//! Depth (the length of the root-exclusive ancestor chain) strictly increases
//! along every parent to child edge, so sorting by depth gives a valid build
//! order.

use crate::domain::{Image, ImageId};
use crate::error::{AppError, TreeError};
use crate::parser::parse_parent;
use crate::source::{DockerfileSource, FsSource};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use tracing::{debug, info, warn};

/// Forest of images, indexed by name
#[derive(Debug, Clone, Default)]
pub struct ImageTree {
    images: Vec<Image>,
    index: HashMap<String, ImageId>,
    root: Option<ImageId>,
    /// Python version of the current build-matrix leg
    python_version: Option<String>,
}

impl ImageTree {
    /// Create an empty tree for the given Python version target
    pub fn new(python_version: Option<&str>) -> Self {
        Self {
            python_version: python_version.map(str::to_string),
            ..Self::default()
        }
    }

    /// Scan `root_dir` for Dockerfiles and build the forest
    pub fn build(root_dir: &Path, python_version: Option<&str>) -> Result<Self, AppError> {
        let source = FsSource::scan(root_dir)?;
        Self::from_source(&source, python_version)
    }

    /// Build the forest from any Dockerfile source
    pub fn from_source<S>(source: &S, python_version: Option<&str>) -> Result<Self, AppError>
    where
        S: DockerfileSource + ?Sized,
    {
        let mut tree = Self::new(python_version);
        for name in source.image_names() {
            tree.get_or_create(source, &name)?;
        }
        tree.propagate_compat();

        debug!(
            images = tree.images.len(),
            root = tree.root().map(Image::name).unwrap_or("<none>"),
            "built image tree"
        );
        Ok(tree)
    }

    /// Look up `name`, creating and linking it (and its ancestors) if unknown
    fn get_or_create<S>(&mut self, source: &S, name: &str) -> Result<ImageId, AppError>
    where
        S: DockerfileSource + ?Sized,
    {
        if let Some(&id) = self.index.get(name) {
            return Ok(id);
        }

        let id = ImageId(self.images.len());
        self.images.push(Image::new(name));
        self.index.insert(name.to_string(), id);
        debug!(image = name, "created image");

        self.add_to_tree(source, id)?;
        Ok(id)
    }

    /// Resolve the parent of `id` from its Dockerfile and attach it
    fn add_to_tree<S>(&mut self, source: &S, id: ImageId) -> Result<(), AppError>
    where
        S: DockerfileSource + ?Sized,
    {
        let name = self.images[id.0].name().to_string();

        let Some(dockerfile) = source.read(&name)? else {
            self.images[id.0].mark_root();
            match self.root {
                None => self.root = Some(id),
                Some(existing) => warn!(
                    image = %name,
                    root = %self.images[existing.0].name(),
                    "more than one image without a Dockerfile, keeping the first as root"
                ),
            }
            debug!(image = %name, "recorded as root image");
            return Ok(());
        };

        let parent_ref = parse_parent(&name, &dockerfile)?;
        let parent = self.get_or_create(source, &parent_ref.name)?;
        self.link(parent, id)?;

        if parent_ref.pins_other_version(self.python_version.as_deref()) {
            debug!(
                image = %name,
                tag = parent_ref.tag.as_deref().unwrap_or_default(),
                "parent tag pins another Python version"
            );
            self.images[id.0].mark_incompatible();
        }
        Ok(())
    }

    /// Attach `child` under `parent`
    fn link(&mut self, parent: ImageId, child: ImageId) -> Result<(), TreeError> {
        let mut current = Some(parent);
        while let Some(id) = current {
            if id == child {
                return Err(TreeError::cycle(
                    self.images[child.0].name(),
                    self.images[parent.0].name(),
                ));
            }
            current = self.images[id.0].parent();
        }

        if !self.images[parent.0].python_compat() {
            self.images[child.0].mark_incompatible();
        }
        self.images[parent.0].add_child(child);
        self.images[child.0].set_parent(parent);
        debug!(
            parent = %self.images[parent.0].name(),
            child = %self.images[child.0].name(),
            "linked images"
        );
        Ok(())
    }

    /// Mark every descendant of an incompatible image incompatible too
    fn propagate_compat(&mut self) {
        let incompatible: Vec<ImageId> = self
            .ids()
            .filter(|&id| !self.images[id.0].python_compat())
            .collect();

        for id in incompatible {
            for descendant in self.descendants(id) {
                self.images[descendant.0].mark_incompatible();
            }
        }
    }

    fn ids(&self) -> impl Iterator<Item = ImageId> {
        (0..self.images.len()).map(ImageId)
    }

    pub fn image(&self, id: ImageId) -> &Image {
        &self.images[id.0]
    }

    pub fn id_of(&self, name: &str) -> Option<ImageId> {
        self.index.get(name).copied()
    }

    pub fn get(&self, name: &str) -> Option<&Image> {
        self.id_of(name).map(|id| self.image(id))
    }

    /// Like [`id_of`](Self::id_of), failing with the list of known names
    pub fn require(&self, name: &str) -> Result<ImageId, TreeError> {
        self.id_of(name)
            .ok_or_else(|| TreeError::image_not_found(name, self.names()))
    }

    /// All image names, in creation order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.images.iter().map(Image::name)
    }

    pub fn images(&self) -> impl Iterator<Item = &Image> {
        self.images.iter()
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    /// The external base image the forest grows from
    pub fn root(&self) -> Option<&Image> {
        self.root.map(|id| self.image(id))
    }

    pub fn python_version(&self) -> Option<&str> {
        self.python_version.as_deref()
    }

    /// Chain from the first image below the root down to `id`, inclusive
    ///
    /// Empty for an image without a Dockerfile.
    pub fn ancestors(&self, id: ImageId) -> Vec<ImageId> {
        let mut chain = Vec::new();
        let mut current = Some(id);
        while let Some(id) = current {
            let image = &self.images[id.0];
            if !image.has_dockerfile() {
                break;
            }
            chain.push(id);
            current = image.parent();
        }
        chain.reverse();
        chain
    }

    /// `id` followed by every image built from it, parents before children
    pub fn descendants(&self, id: ImageId) -> Vec<ImageId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.images[id.0].children().iter().rev());
        }
        out
    }

    /// Names of the ancestor chain of `name`, root-exclusive, ending with `name`
    pub fn ancestor_names(&self, name: &str) -> Result<Vec<String>, TreeError> {
        let id = self.require(name)?;
        Ok(self
            .ancestors(id)
            .into_iter()
            .map(|id| self.images[id.0].name().to_string())
            .collect())
    }

    /// Images to rebuild after `edited` images changed, in build order
    ///
    /// Every edited image must exist. Images excluded from the current
    /// Python version's build are left out.
    pub fn get_dependents<S: AsRef<str>>(&self, edited: &[S]) -> Result<Vec<String>, TreeError> {
        let mut seen = HashSet::new();
        let mut dependents = Vec::new();
        for name in edited {
            let id = self.require(name.as_ref())?;
            for descendant in self.descendants(id) {
                if seen.insert(descendant) {
                    dependents.push(descendant);
                }
            }
        }

        // stable: images at the same depth keep discovery order
        dependents.sort_by_key(|&id| self.ancestors(id).len());

        let to_rebuild: Vec<String> = dependents
            .into_iter()
            .filter(|&id| self.images[id.0].python_compat())
            .map(|id| self.images[id.0].name().to_string())
            .collect();

        info!(edited = edited.len(), rebuild = ?to_rebuild, "computed rebuild set");
        Ok(to_rebuild)
    }

    /// Every buildable image, in build order
    pub fn all_images(&self) -> Vec<String> {
        let Some(root) = self.root else {
            return Vec::new();
        };
        let children: Vec<&str> = self.images[root.0]
            .children()
            .iter()
            .map(|&id| self.images[id.0].name())
            .collect();
        // names come from the tree itself
        self.get_dependents(&children).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::LinkState;
    use crate::error::DockerfileError;
    use crate::source::MemorySource;

    fn scenario() -> MemorySource {
        MemorySource::new()
            .with_dockerfile("python", "FROM contextlab/base\n")
            .with_dockerfile("jupyter", "ARG BASE=contextlab/python:3.8\nFROM $BASE\n")
            .with_dockerfile("pytorch", "FROM contextlab/python:3.7\n")
    }

    fn chain() -> MemorySource {
        MemorySource::new()
            .with_dockerfile("c", "FROM b\n")
            .with_dockerfile("a", "FROM root\n")
            .with_dockerfile("b", "FROM a:latest\n")
    }

    #[test]
    fn test_build_scenario() {
        let tree = ImageTree::from_source(&scenario(), Some("3.8")).unwrap();
        assert_eq!(tree.len(), 4);
        assert_eq!(tree.root().map(Image::name), Some("base"));

        let python = tree.get("python").unwrap();
        assert_eq!(python.children().len(), 2);
        assert!(tree.get("jupyter").unwrap().python_compat());
        assert!(!tree.get("pytorch").unwrap().python_compat());
    }

    #[test]
    fn test_get_dependents_scenario() {
        let tree = ImageTree::from_source(&scenario(), Some("3.8")).unwrap();
        assert_eq!(tree.get_dependents(&["python"]).unwrap(), vec!["python", "jupyter"]);
    }

    #[test]
    fn test_get_dependents_other_python_leg() {
        let tree = ImageTree::from_source(&scenario(), Some("3.7")).unwrap();
        assert_eq!(tree.get_dependents(&["python"]).unwrap(), vec!["python", "pytorch"]);
    }

    #[test]
    fn test_no_python_target_keeps_everything() {
        let tree = ImageTree::from_source(&scenario(), None).unwrap();
        assert_eq!(
            tree.get_dependents(&["python"]).unwrap(),
            vec!["python", "jupyter", "pytorch"]
        );
    }

    #[test]
    fn test_chain_order() {
        let tree = ImageTree::from_source(&chain(), None).unwrap();
        assert_eq!(tree.get_dependents(&["a"]).unwrap(), vec!["a", "b", "c"]);
        assert_eq!(tree.get_dependents(&["b"]).unwrap(), vec!["b", "c"]);
        assert_eq!(tree.get_dependents(&["c"]).unwrap(), vec!["c"]);
    }

    #[test]
    fn test_overlapping_edits_deduplicated() {
        let tree = ImageTree::from_source(&chain(), None).unwrap();
        assert_eq!(tree.get_dependents(&["c", "a", "b"]).unwrap(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_get_dependents_unknown_image() {
        let tree = ImageTree::from_source(&chain(), None).unwrap();
        let err = tree.get_dependents(&["d"]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "couldn't find an image named \"d\" in: c, b, a, root"
        );
    }

    #[test]
    fn test_forest_invariant() {
        let tree = ImageTree::from_source(&scenario(), Some("3.8")).unwrap();
        for image in tree.images() {
            assert_eq!(image.state(), LinkState::Linked);
            if image.is_root() {
                assert!(image.parent().is_none());
            } else {
                assert!(image.parent().is_some());
            }
        }

        for id in tree.ids() {
            let ancestors = tree.ancestors(id);
            for descendant in tree.descendants(id).into_iter().skip(1) {
                assert!(!ancestors.contains(&descendant));
            }
        }
    }

    #[test]
    fn test_compat_propagates_to_descendants() {
        let source = scenario()
            .with_dockerfile("pytorch-notebook", "FROM pytorch\n")
            .with_dockerfile("pytorch-lab", "FROM pytorch-notebook\n");
        let tree = ImageTree::from_source(&source, Some("3.8")).unwrap();

        let pytorch = tree.id_of("pytorch").unwrap();
        for id in tree.descendants(pytorch) {
            assert!(!tree.image(id).python_compat(), "{}", tree.image(id));
        }
        assert_eq!(tree.get_dependents(&["pytorch"]).unwrap(), Vec::<String>::new());
    }

    #[test]
    fn test_compat_propagates_when_child_seen_first() {
        let source = MemorySource::new()
            .with_dockerfile("lab", "FROM notebook\n")
            .with_dockerfile("notebook", "FROM python:3.6\n")
            .with_dockerfile("python", "FROM base\n");
        let tree = ImageTree::from_source(&source, Some("3.8")).unwrap();
        assert!(!tree.get("notebook").unwrap().python_compat());
        assert!(!tree.get("lab").unwrap().python_compat());
        assert!(tree.get("python").unwrap().python_compat());
    }

    #[test]
    fn test_ancestors() {
        let tree = ImageTree::from_source(&chain(), None).unwrap();
        assert_eq!(tree.ancestor_names("c").unwrap(), vec!["a", "b", "c"]);
        assert_eq!(tree.ancestor_names("a").unwrap(), vec!["a"]);
        assert!(tree.ancestor_names("root").unwrap().is_empty());
    }

    #[test]
    fn test_descendants_preorder() {
        let tree = ImageTree::from_source(&scenario(), Some("3.8")).unwrap();
        let root = tree.id_of("base").unwrap();
        let names: Vec<&str> = tree
            .descendants(root)
            .into_iter()
            .map(|id| tree.image(id).name())
            .collect();
        assert_eq!(names, vec!["base", "python", "jupyter", "pytorch"]);
    }

    #[test]
    fn test_all_images() {
        let tree = ImageTree::from_source(&scenario(), Some("3.8")).unwrap();
        assert_eq!(tree.all_images(), vec!["python", "jupyter"]);
        assert!(ImageTree::new(None).all_images().is_empty());
    }

    #[test]
    fn test_cycle_detected() {
        let source = MemorySource::new()
            .with_dockerfile("a", "FROM b\n")
            .with_dockerfile("b", "FROM a\n");
        let err = ImageTree::from_source(&source, None).unwrap_err();
        assert!(matches!(err, AppError::Tree(TreeError::Cycle { .. })));
    }

    #[test]
    fn test_self_reference_detected() {
        let source = MemorySource::new().with_dockerfile("a", "FROM a:latest\n");
        let err = ImageTree::from_source(&source, None).unwrap_err();
        assert!(matches!(err, AppError::Tree(TreeError::Cycle { .. })));
    }

    #[test]
    fn test_missing_from_is_error() {
        let source = MemorySource::new().with_dockerfile("a", "RUN true\n");
        let err = ImageTree::from_source(&source, None).unwrap_err();
        assert!(matches!(err, AppError::Dockerfile(DockerfileError::MissingFrom { .. })));
    }

    #[test]
    fn test_independent_trees() {
        let first = ImageTree::from_source(&scenario(), Some("3.8")).unwrap();
        let second = ImageTree::from_source(&chain(), None).unwrap();
        assert!(first.get("a").is_none());
        assert!(second.get("python").is_none());
        assert_eq!(first.python_version(), Some("3.8"));
        assert_eq!(second.python_version(), None);
    }
}
