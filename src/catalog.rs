//! Lookups and bookkeeping over the stored catalog: name listings,
//! directory-type resolution and seeding.

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::info;

use crate::config::SeedConfig;
use crate::model::Entity;
use crate::store::{EntityStore, StoreError};
use crate::{ActionStatus, Directory, DirectoryType, ServiceDispatch};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("unknown directory type {0:?}")]
    UnknownDirectoryType(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

fn sorted_names<'a>(names: impl Iterator<Item = Option<&'a str>>) -> Vec<String> {
    let mut names: Vec<String> = names.flatten().map(str::to_string).collect();
    names.sort();
    names
}

pub fn directory_type_names(store: &EntityStore) -> Vec<String> {
    sorted_names(store.table::<DirectoryType>().iter().map(DirectoryType::name))
}

pub fn directory_names(store: &EntityStore) -> Vec<String> {
    sorted_names(store.table::<Directory>().iter().map(Directory::name))
}

pub fn action_status_names(store: &EntityStore) -> Vec<String> {
    sorted_names(store.table::<ActionStatus>().iter().map(ActionStatus::name))
}

pub fn find_directory_type_by_name<'a>(
    store: &'a EntityStore,
    name: &str,
) -> Option<&'a DirectoryType> {
    store
        .table::<DirectoryType>()
        .iter()
        .find(|t| t.name() == Some(name))
}

pub fn find_directory_by_name<'a>(store: &'a EntityStore, name: &str) -> Option<&'a Directory> {
    store
        .table::<Directory>()
        .iter()
        .find(|d| d.name() == Some(name))
}

/// Resolve a directory's type through its foreign key.
pub fn directory_type_of<'a>(
    store: &'a EntityStore,
    directory: &Directory,
) -> Option<&'a DirectoryType> {
    directory
        .directory_type_id()
        .and_then(|id| store.find::<DirectoryType>(id))
}

pub fn directories_of_type<'a>(store: &'a EntityStore, type_name: &str) -> Vec<&'a Directory> {
    let Some(type_id) = find_directory_type_by_name(store, type_name).and_then(|t| t.id()) else {
        return Vec::new();
    };
    store
        .table::<Directory>()
        .iter()
        .filter(|d| d.directory_type_id() == Some(type_id))
        .collect()
}

/// Directories effective at `at`, in id order.
pub fn active_directories(store: &EntityStore, at: DateTime<Utc>) -> Vec<&Directory> {
    store
        .table::<Directory>()
        .iter()
        .filter(|d| d.is_effective_at(at))
        .collect()
}

/// Dispatch records of a category, ordered by display name.
pub fn dispatch_targets<'a>(store: &'a EntityStore, category: &str) -> Vec<&'a ServiceDispatch> {
    let mut targets: Vec<_> = store
        .table::<ServiceDispatch>()
        .iter()
        .filter(|d| d.category() == Some(category))
        .collect();
    targets.sort_by_key(|d| d.instance_name());
    targets
}

/// Assign a type to the directory at `path`, creating an active directory
/// when none exists. Returns the stored directory.
pub fn set_directory_type(
    store: &mut EntityStore,
    path: &str,
    type_name: &str,
) -> Result<Directory, CatalogError> {
    let type_id = find_directory_type_by_name(store, type_name)
        .and_then(|t| t.id())
        .ok_or_else(|| CatalogError::UnknownDirectoryType(type_name.to_string()))?;

    match find_directory_by_name(store, path).cloned() {
        None => {
            info!(path, type_name, "adding directory");
            let mut directory = Directory::new(path);
            directory.set_directory_type_id(Some(type_id));
            directory.set_active_flag(true);
            Ok(store.insert(directory)?)
        }
        Some(directory) if directory.directory_type_id() == Some(type_id) => Ok(directory),
        Some(mut directory) => {
            info!(path, type_name, "changing directory type");
            directory.set_directory_type_id(Some(type_id));
            Ok(store.update(directory)?)
        }
    }
}

/// Insert configured directory types and action statuses that are missing.
/// Returns how many rows were added.
pub fn seed(store: &mut EntityStore, config: &SeedConfig) -> Result<usize, CatalogError> {
    let mut added = 0;
    for name in &config.directory_types {
        if find_directory_type_by_name(store, name).is_none() {
            store.insert(DirectoryType::new(name.as_str()))?;
            added += 1;
        }
    }
    for name in &config.action_statuses {
        let exists = store
            .table::<ActionStatus>()
            .iter()
            .any(|s| s.name() == Some(name.as_str()));
        if !exists {
            store.insert(ActionStatus::new(name.as_str()))?;
            added += 1;
        }
    }
    info!(added, "seeded catalog");
    Ok(added)
}
