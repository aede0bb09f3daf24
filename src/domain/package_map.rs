//! Insert-once mapping from package name to package

use super::Package;
use crate::error::PackageError;
use std::collections::BTreeMap;

/// Package mapping that refuses to overwrite an existing entry
///
/// Seeing the same name twice means the package manager reported one
/// dependency under two forms (e.g. from both conda and pip).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageMap {
    packages: BTreeMap<String, Package>,
}

impl PackageMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a package under its name, failing if the name is already present
    pub fn insert(&mut self, package: Package) -> Result<(), PackageError> {
        if self.packages.contains_key(package.name()) {
            return Err(PackageError::duplicate(package.name()));
        }
        self.packages.insert(package.name().to_string(), package);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Package> {
        self.packages.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.packages.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    /// Iterate over packages in name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Package)> {
        self.packages.iter().map(|(name, pkg)| (name.as_str(), pkg))
    }
}

impl<'a> IntoIterator for &'a PackageMap {
    type Item = (&'a String, &'a Package);
    type IntoIter = std::collections::btree_map::Iter<'a, String, Package>;

    fn into_iter(self) -> Self::IntoIter {
        self.packages.iter()
    }
}
