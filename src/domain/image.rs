//! A node in the image dependency forest
//!
//! Nodes live in an arena owned by [`ImageTree`](crate::image_tree::ImageTree)
//! and refer to each other by [`ImageId`]. The parent link is a plain index,
//! the child list is the owning side of the edge.

use serde::Serialize;
use std::fmt;

/// Index of an image inside its tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ImageId(pub(crate) usize);

impl ImageId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Whether an image has been attached to the forest yet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkState {
    /// Created, parent not resolved
    Unlinked,
    /// Attached under its parent, or recorded as a root
    Linked,
}

/// One buildable image (or the external base it ultimately derives from)
#[derive(Debug, Clone, Serialize)]
pub struct Image {
    name: String,
    parent: Option<ImageId>,
    children: Vec<ImageId>,
    /// CI builds run as a job matrix split by Python version; some images
    /// only get built for one entry of that matrix
    python_compat: bool,
    has_dockerfile: bool,
    state: LinkState,
}

impl Image {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent: None,
            children: Vec::new(),
            python_compat: true,
            has_dockerfile: false,
            state: LinkState::Unlinked,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent(&self) -> Option<ImageId> {
        self.parent
    }

    pub fn children(&self) -> &[ImageId] {
        &self.children
    }

    pub fn python_compat(&self) -> bool {
        self.python_compat
    }

    pub fn has_dockerfile(&self) -> bool {
        self.has_dockerfile
    }

    pub fn state(&self) -> LinkState {
        self.state
    }

    /// True for an image with no Dockerfile of its own (an external base)
    pub fn is_root(&self) -> bool {
        self.state == LinkState::Linked && !self.has_dockerfile
    }

    pub(crate) fn set_parent(&mut self, parent: ImageId) {
        self.parent = Some(parent);
        self.has_dockerfile = true;
        self.state = LinkState::Linked;
    }

    pub(crate) fn add_child(&mut self, child: ImageId) {
        if !self.children.contains(&child) {
            self.children.push(child);
        }
    }

    pub(crate) fn mark_root(&mut self) {
        self.parent = None;
        self.has_dockerfile = false;
        self.state = LinkState::Linked;
    }

    pub(crate) fn mark_incompatible(&mut self) {
        self.python_compat = false;
    }
}

impl fmt::Display for Image {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}
