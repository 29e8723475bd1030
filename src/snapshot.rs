use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::config::StoreConfig;
use crate::model::Entity;
use crate::store::{EntityStore, StoreError, StoredEntity};
use crate::{ActionStatus, Directory, DirectoryType, OpRecordParamType, ServiceDispatch};

/// Every row of every table, keyed by table name.
///
/// Rows carry their ids, versions and audit timestamps so an export can be
/// imported back unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default, rename = "action_status")]
    pub action_statuses: Vec<ActionStatus>,
    #[serde(default, rename = "directory_type")]
    pub directory_types: Vec<DirectoryType>,
    #[serde(default, rename = "directory")]
    pub directories: Vec<Directory>,
    #[serde(default, rename = "op_record_param_type")]
    pub op_record_param_types: Vec<OpRecordParamType>,
    #[serde(default, rename = "service_dispatch")]
    pub service_dispatches: Vec<ServiceDispatch>,
}

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot io on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed snapshot: {0}")]
    Json(#[from] serde_json::Error),
    #[error("snapshot row rejected: {0}")]
    Store(#[from] StoreError),
}

impl Snapshot {
    pub fn from_json_str(s: &str) -> Result<Self, SnapshotError> {
        Ok(serde_json::from_str(s)?)
    }

    pub fn to_json_string(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, SnapshotError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| SnapshotError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&content)
    }

    pub fn save_json(&self, path: impl AsRef<Path>) -> Result<(), SnapshotError> {
        let path = path.as_ref();
        let content = self.to_json_string()?;
        std::fs::write(path, content).map_err(|source| SnapshotError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn row_count(&self) -> usize {
        self.action_statuses.len()
            + self.directory_types.len()
            + self.directories.len()
            + self.op_record_param_types.len()
            + self.service_dispatches.len()
    }
}

fn export<E: StoredEntity>(store: &EntityStore) -> Vec<E> {
    store.table::<E>().iter().cloned().collect()
}

/// Rows with ids go in first so id-less rows cannot claim a key a later row
/// of the same table asks for.
fn import<E: StoredEntity>(store: &mut EntityStore, rows: Vec<E>) -> Result<(), StoreError> {
    let (keyed, unkeyed): (Vec<E>, Vec<E>) = rows.into_iter().partition(|row| row.id().is_some());
    keyed
        .into_iter()
        .chain(unkeyed)
        .try_for_each(|row| store.restore(row).map(drop))
}

impl EntityStore {
    /// Export every row.
    pub fn snapshot(&self) -> Snapshot {
        let snapshot = Snapshot {
            action_statuses: export(self),
            directory_types: export(self),
            directories: export(self),
            op_record_param_types: export(self),
            service_dispatches: export(self),
        };
        info!(rows = snapshot.row_count(), "exported snapshot");
        snapshot
    }

    /// Build a store from a snapshot, checking every row like `insert`.
    ///
    /// Tables load referenced-first so foreign keys resolve.
    pub fn from_snapshot(config: StoreConfig, snapshot: Snapshot) -> Result<Self, SnapshotError> {
        let rows = snapshot.row_count();
        let mut store = EntityStore::new(config);
        import(&mut store, snapshot.action_statuses)?;
        import(&mut store, snapshot.directory_types)?;
        import(&mut store, snapshot.directories)?;
        import(&mut store, snapshot.op_record_param_types)?;
        import(&mut store, snapshot.service_dispatches)?;
        info!(rows, "imported snapshot");
        Ok(store)
    }
}
