use indexmap::IndexMap;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

use crate::transformation_engine::{TransformationWarning, TransformationWarningType};
use crate::uml_model::{ObjectId, Package, PackageId};

/// Package forest indexed by id
#[derive(Debug, Clone, Default)]
pub struct PackageTree {
    packages: IndexMap<PackageId, Package>,
}

/// A built class or enum and the package that owns it
#[derive(Debug, Clone, PartialEq)]
pub struct OwnedElement {
    pub id: ObjectId,
    pub name: String,
    pub package_id: Option<PackageId>,
}

/// The classes and enums that land in one package's schema
#[derive(Debug, Clone, PartialEq)]
pub struct PackagePartition {
    pub package: Package,
    pub path: Vec<String>,
    pub class_ids: Vec<ObjectId>,
    pub enum_ids: Vec<ObjectId>,
}

impl PackagePartition {
    /// `A/B/C` becomes `A/B/C.yml`.
    pub fn relative_path(&self) -> PathBuf {
        let mut path: PathBuf = self.path[..self.path.len().saturating_sub(1)].iter().collect();
        let file_name = self.path.last().unwrap_or(&self.package.name);
        path.push(format!("{}.yml", file_name));
        path
    }

    pub fn output_path(&self, output_dir: &Path) -> PathBuf {
        output_dir.join(self.relative_path())
    }
}

impl PackageTree {
    /// The first record for an id wins.
    pub fn new<I: IntoIterator<Item = Package>>(packages: I) -> Self {
        let mut by_id = IndexMap::new();
        for package in packages {
            by_id.entry(package.id).or_insert(package);
        }
        Self { packages: by_id }
    }

    pub fn get(&self, id: PackageId) -> Option<&Package> {
        self.packages.get(&id)
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    /// Names from the first package below the model root down to `id`.
    ///
    /// The top-level package (whose parent is the root sentinel) is the
    /// model container and is not part of the path.
    pub fn path(&self, id: PackageId) -> Result<Vec<String>, PackageError> {
        let mut current = self.get(id).ok_or(PackageError::UnknownPackage(id))?;
        let mut names = Vec::new();

        // A well-formed chain visits each package at most once.
        for _ in 0..=self.packages.len() {
            let parent_id = match current.parent_id {
                None | Some(0) => {
                    names.reverse();
                    return Ok(names);
                }
                Some(parent_id) => parent_id,
            };

            names.push(current.name.clone());
            current = self.get(parent_id).ok_or(PackageError::MissingParent {
                package: current.id,
                parent: parent_id,
            })?;
        }

        Err(PackageError::UnterminatedChain(id))
    }
}

/// Assign classes and enums to the schema of their direct owning package.
///
/// `classes` and `enums` must be in build order; that order is kept inside
/// each partition. Every package path is computed before anything is
/// returned, so a broken package chain fails the whole split.
pub fn partition(
    tree: &PackageTree,
    classes: &[OwnedElement],
    enums: &[OwnedElement],
) -> Result<(Vec<PackagePartition>, Vec<TransformationWarning>), PackageError> {
    let mut warnings = Vec::new();
    let mut by_package: HashMap<PackageId, (Vec<&OwnedElement>, Vec<&OwnedElement>)> = HashMap::new();

    for (elements, is_class) in [(classes, true), (enums, false)] {
        for element in elements {
            let Some(package_id) = element.package_id else {
                warnings.push(unpartitioned(&element.name, "it has no owning package"));
                continue;
            };
            if tree.get(package_id).is_none() {
                return Err(PackageError::UnknownPackage(package_id));
            }

            let entry = by_package.entry(package_id).or_default();
            if is_class {
                entry.0.push(element);
            } else {
                entry.1.push(element);
            }
        }
    }

    let mut partitions = Vec::new();
    for package in tree.packages.values() {
        let Some((owned_classes, owned_enums)) = by_package.remove(&package.id) else {
            continue;
        };

        let path = tree.path(package.id)?;
        if path.is_empty() {
            for element in owned_classes.iter().chain(&owned_enums) {
                warnings.push(unpartitioned(&element.name, "its package is the model root"));
            }
            continue;
        }

        debug!(
            package = %package.name,
            path = %path.join("/"),
            classes = owned_classes.len(),
            enums = owned_enums.len(),
            "Partitioned package"
        );
        partitions.push(PackagePartition {
            package: package.clone(),
            path,
            class_ids: owned_classes.iter().map(|e| e.id).collect(),
            enum_ids: owned_enums.iter().map(|e| e.id).collect(),
        });
    }

    Ok((partitions, warnings))
}

fn unpartitioned(name: &str, reason: &str) -> TransformationWarning {
    warn!(element = name, reason, "Element left out of per-package schemas");
    TransformationWarning::new(
        format!("`{}` is not written to any package schema because {}", name, reason),
        TransformationWarningType::UnpartitionedElement,
    )
    .with_field_path(name.to_string())
}

#[derive(Debug, Error)]
pub enum PackageError {
    #[error("Package {0} does not exist")]
    UnknownPackage(PackageId),

    #[error("Package {package} refers to missing parent {parent}")]
    MissingParent { package: PackageId, parent: PackageId },

    #[error("Parent chain of package {0} does not reach the model root")]
    UnterminatedChain(PackageId),
}
